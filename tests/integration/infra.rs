//! In-process ledger fixture.

use std::collections::HashMap;
use std::sync::Mutex;

use mural_core::{Codec, DrawingObject};
use mural_services::{Ledger, LedgerError, Receipt, Submission, SubmissionKind, Target};

/// Ledger that keeps one canvas per target and applies submissions to it.
///
/// Submit calls are numbered from 0 across the fixture's lifetime. Individual
/// calls can be scripted to fail or to never return.
#[derive(Default)]
pub struct MockLedger {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    canvases: HashMap<Target, Vec<DrawingObject>>,
    submissions: Vec<Submission>,
    failures: HashMap<usize, LedgerError>,
    stall_on: Option<usize>,
    /// `None` makes every estimate call fail.
    estimate: Option<u64>,
    estimate_calls: usize,
}

impl MockLedger {
    pub fn new() -> Self {
        let ledger = Self::default();
        ledger.inner.lock().unwrap().estimate = Some(100_000);
        ledger
    }

    /// Every estimate call fails with a network error.
    pub fn failing_estimates() -> Self {
        Self::default()
    }

    /// Submit call number `call` fails with `err`.
    pub fn fail_call(&self, call: usize, err: LedgerError) {
        self.inner.lock().unwrap().failures.insert(call, err);
    }

    /// Submit call number `call` never completes.
    pub fn stall_call(&self, call: usize) {
        self.inner.lock().unwrap().stall_on = Some(call);
    }

    /// Pre-existing drawing on `target`.
    pub fn seed(&self, target: Target, objects: Vec<DrawingObject>) {
        self.inner.lock().unwrap().canvases.insert(target, objects);
    }

    pub fn canvas(&self, target: &Target) -> Vec<DrawingObject> {
        self.inner
            .lock()
            .unwrap()
            .canvases
            .get(target)
            .cloned()
            .unwrap_or_default()
    }

    /// Every submit call received, in order, including failed ones.
    pub fn submissions(&self) -> Vec<Submission> {
        self.inner.lock().unwrap().submissions.clone()
    }

    pub fn estimate_calls(&self) -> usize {
        self.inner.lock().unwrap().estimate_calls
    }
}

impl Ledger for MockLedger {
    async fn estimate(&self, _submission: &Submission) -> Result<u64, LedgerError> {
        let mut inner = self.inner.lock().unwrap();
        inner.estimate_calls += 1;
        inner
            .estimate
            .ok_or_else(|| LedgerError::Network("estimator offline".into()))
    }

    async fn submit(&self, submission: &Submission) -> Result<Receipt, LedgerError> {
        let call = {
            let mut inner = self.inner.lock().unwrap();
            let call = inner.submissions.len();
            inner.submissions.push(submission.clone());

            if let Some(err) = inner.failures.remove(&call) {
                return Err(err);
            }
            if inner.stall_on == Some(call) {
                None
            } else {
                apply(&mut inner, submission)?;
                Some(call)
            }
        };

        // A stalled call never lands, like an unanswered wallet prompt.
        let Some(call) = call else {
            std::future::pending::<()>().await;
            unreachable!()
        };

        Ok(Receipt {
            tx_ref: format!("0x{call:064x}"),
            gas_used: 21_000 + 1_000 * submission.records.len() as u64,
        })
    }
}

fn apply(inner: &mut Inner, submission: &Submission) -> Result<(), LedgerError> {
    if submission.gas_limit.is_none() {
        return Err(LedgerError::Rejected("missing gas limit".into()));
    }
    let decoded = submission
        .records
        .iter()
        .map(|r| Codec::new().decode(r))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| LedgerError::Reverted(e.to_string()))?;

    let canvas = inner.canvases.entry(submission.target).or_default();
    if submission.kind == SubmissionKind::Replace {
        canvas.clear();
    }
    canvas.extend(decoded);
    Ok(())
}
