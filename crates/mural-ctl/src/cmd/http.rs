//! HTTP ledger gateway client.

use serde::{Deserialize, Serialize};

use mural_services::{Ledger, LedgerError, Receipt, Submission, Target};

/// `Ledger` backed by a JSON gateway at `{endpoint}/estimate` and `{endpoint}/submit`.
pub struct HttpLedger {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpLedger {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post<R>(&self, path: &str, body: &SubmissionBody<'_>) -> Result<R, LedgerError>
    where
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/{}", self.endpoint, path);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| LedgerError::Network(format!("{url}: {e}")))?;

        let status = resp.status();
        if status.is_server_error() {
            return Err(LedgerError::Network(format!("{url}: HTTP {status}")));
        }
        resp.json::<R>()
            .await
            .map_err(|e| LedgerError::Rejected(format!("{url}: unreadable response ({status}): {e}")))
    }
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct SubmissionBody<'a> {
    target: &'a Target,
    kind: &'static str,
    records: Vec<RecordBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gas_limit: Option<u64>,
}

#[derive(Serialize)]
struct RecordBody {
    base: String,
    overflow: String,
}

impl<'a> From<&'a Submission> for SubmissionBody<'a> {
    fn from(s: &'a Submission) -> Self {
        Self {
            target: &s.target,
            kind: s.kind.as_str(),
            records: s
                .records
                .iter()
                .map(|r| RecordBody {
                    base: r.base_hex(),
                    overflow: r.overflow_hex(),
                })
                .collect(),
            gas_limit: s.gas_limit,
        }
    }
}

#[derive(Deserialize)]
struct EstimateResponse {
    gas: u64,
}

#[derive(Deserialize)]
struct SubmitResponse {
    ok: bool,
    tx_ref: Option<String>,
    gas_used: Option<u64>,
    error: Option<GatewayError>,
}

#[derive(Deserialize)]
struct GatewayError {
    code: String,
    #[serde(default)]
    message: String,
}

// ── Ledger impl ───────────────────────────────────────────────────────────────

impl Ledger for HttpLedger {
    async fn estimate(&self, submission: &Submission) -> Result<u64, LedgerError> {
        let resp: EstimateResponse = self.post("estimate", &SubmissionBody::from(submission)).await?;
        Ok(resp.gas)
    }

    async fn submit(&self, submission: &Submission) -> Result<Receipt, LedgerError> {
        let resp: SubmitResponse = self.post("submit", &SubmissionBody::from(submission)).await?;
        if !resp.ok {
            return Err(match resp.error {
                Some(e) => LedgerError::from_code(&e.code, e.message),
                None => LedgerError::Rejected("gateway returned ok=false".into()),
            });
        }
        let tx_ref = resp
            .tx_ref
            .ok_or_else(|| LedgerError::Rejected("accepted submission has no tx_ref".into()))?;
        Ok(Receipt {
            tx_ref,
            gas_used: resp.gas_used.unwrap_or(0),
        })
    }
}
