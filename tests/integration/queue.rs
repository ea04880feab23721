use crate::*;

use std::time::Duration;

use mural_core::Codec;
use mural_services::{
    ChunkStatus, GasBudget, LedgerError, NoProgress, Progress, QueueError, QueueStore,
    SubmissionKind, SubmissionQueue,
};

fn make_queue(token_id: u64, objects: &[mural_core::DrawingObject], kind: SubmissionKind) -> SubmissionQueue {
    SubmissionQueue::new(target(token_id), objects, Codec::new(), &rect_planner(4), kind).unwrap()
}

#[tokio::test]
async fn run_all_writes_whole_drawing_in_order() {
    let ledger = MockLedger::new();
    let objects: Vec<_> = (0..10).map(rect).collect();
    ledger.seed(target(1), vec![path(7)]);

    let mut queue = make_queue(1, &objects, SubmissionKind::Replace);
    assert_eq!(queue.len(), 3);

    let progress = queue
        .run_all(&ledger, &GasBudget::default(), &mut NoProgress)
        .await
        .unwrap();
    assert_eq!(progress, Progress { completed: 3, total: 3 });
    assert!(queue.is_complete());

    assert_eq!(ledger.canvas(&target(1)), objects);
    let kinds: Vec<_> = ledger.submissions().iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![SubmissionKind::Replace, SubmissionKind::Append, SubmissionKind::Append]
    );
}

#[tokio::test]
async fn append_mode_keeps_existing_drawing() {
    let ledger = MockLedger::new();
    let existing = vec![path(7), polygon(5)];
    ledger.seed(target(2), existing.clone());

    let objects = mixed(9);
    let mut queue = SubmissionQueue::new(
        target(2),
        &objects,
        Codec::new(),
        &rect_planner(8),
        SubmissionKind::Append,
    )
    .unwrap();
    queue
        .run_all(&ledger, &GasBudget::default(), &mut NoProgress)
        .await
        .unwrap();

    let mut expected = existing;
    expected.extend(objects);
    assert_eq!(ledger.canvas(&target(2)), expected);
    assert!(ledger
        .submissions()
        .iter()
        .all(|s| s.kind == SubmissionKind::Append));
}

#[tokio::test]
async fn failure_halts_then_retry_and_resume_finish_without_duplicates() {
    let ledger = MockLedger::new();
    ledger.fail_call(1, LedgerError::InsufficientFunds);
    let objects: Vec<_> = (0..14).map(rect).collect();
    let mut queue = make_queue(3, &objects, SubmissionKind::Replace);
    assert_eq!(queue.len(), 4);
    let budget = GasBudget::default();

    let err = queue.run_all(&ledger, &budget, &mut NoProgress).await.unwrap_err();
    assert_eq!(
        err,
        QueueError::ChunkFailed {
            index: 1,
            source: LedgerError::InsufficientFunds
        }
    );
    let statuses: Vec<_> = queue.chunks().iter().map(|c| c.status()).collect();
    assert_eq!(
        statuses,
        vec![
            ChunkStatus::Completed,
            ChunkStatus::Failed,
            ChunkStatus::Pending,
            ChunkStatus::Pending
        ]
    );
    assert_eq!(ledger.canvas(&target(3)).len(), 4);

    // Later chunks wait for the failed one.
    assert_eq!(
        queue.run_chunk(2, &ledger, &budget, &mut NoProgress).await,
        Err(QueueError::OutOfOrder { index: 2, blocking: 1 })
    );

    let progress = queue.run_chunk(1, &ledger, &budget, &mut NoProgress).await.unwrap();
    assert_eq!(progress, Progress { completed: 2, total: 4 });

    queue.run_all(&ledger, &budget, &mut NoProgress).await.unwrap();
    assert_eq!(ledger.canvas(&target(3)), objects);

    // Chunk 0 once, chunk 1 twice, chunks 2 and 3 once.
    assert_eq!(ledger.submissions().len(), 5);
}

#[tokio::test]
async fn observer_sees_every_transition() {
    let ledger = MockLedger::new();
    let objects: Vec<_> = (0..8).map(rect).collect();
    let mut queue = make_queue(4, &objects, SubmissionKind::Replace);

    let mut log = Vec::new();
    let mut observer = |p: Progress, c: &mural_services::Chunk| log.push((p.to_string(), c.ordinal(), c.status()));
    queue
        .run_all(&ledger, &GasBudget::default(), &mut observer)
        .await
        .unwrap();

    assert_eq!(
        log,
        vec![
            ("0/2".to_string(), 0, ChunkStatus::Processing),
            ("1/2".to_string(), 0, ChunkStatus::Completed),
            ("1/2".to_string(), 1, ChunkStatus::Processing),
            ("2/2".to_string(), 1, ChunkStatus::Completed),
        ]
    );
}

#[tokio::test]
async fn gas_limit_comes_from_padded_estimate_or_fallback() {
    let objects: Vec<_> = (0..4).map(rect).collect();

    let ledger = MockLedger::new();
    let mut queue = make_queue(5, &objects, SubmissionKind::Replace);
    queue
        .run_all(&ledger, &GasBudget::new(777, 20), &mut NoProgress)
        .await
        .unwrap();
    assert_eq!(ledger.submissions()[0].gas_limit, Some(120_000));
    assert_eq!(queue.chunks()[0].gas_limit(), Some(120_000));

    let offline = MockLedger::failing_estimates();
    let mut queue = make_queue(5, &objects, SubmissionKind::Replace);
    queue
        .run_all(&offline, &GasBudget::new(777, 20), &mut NoProgress)
        .await
        .unwrap();
    assert_eq!(offline.estimate_calls(), 1);
    assert_eq!(offline.submissions()[0].gas_limit, Some(777));
    assert!(queue.is_complete());
}

#[tokio::test]
async fn cancelled_run_leaves_chunk_processing_and_resume_redispatches_it() {
    let ledger = MockLedger::new();
    ledger.stall_call(1);
    let objects: Vec<_> = (0..12).map(rect).collect();
    let mut queue = make_queue(6, &objects, SubmissionKind::Replace);
    let budget = GasBudget::default();

    let mut quiet = NoProgress;
    let run = queue.run_all(&ledger, &budget, &mut quiet);
    assert!(tokio::time::timeout(Duration::from_millis(50), run).await.is_err());

    assert!(queue.is_processing());
    assert_eq!(queue.current(), Some(1));
    assert_eq!(queue.chunks()[1].status(), ChunkStatus::Processing);
    assert_eq!(queue.chunks()[0].status(), ChunkStatus::Completed);

    queue.run_all(&ledger, &budget, &mut NoProgress).await.unwrap();
    assert!(!queue.is_processing());
    assert_eq!(ledger.canvas(&target(6)), objects);
}

#[tokio::test]
async fn persisted_queue_resumes_in_a_new_store() {
    let dir = temp_dir("resume");
    let ledger = MockLedger::new();
    ledger.fail_call(2, LedgerError::Declined);
    let objects = mixed(12);
    let budget = GasBudget::default();

    {
        let store = QueueStore::open(&dir).unwrap();
        let mut queue = SubmissionQueue::new(
            target(7),
            &objects,
            Codec::new(),
            &rect_planner(4),
            SubmissionKind::Replace,
        )
        .unwrap();
        let _ = queue.run_all(&ledger, &budget, &mut NoProgress).await;
        store.put(&queue).unwrap();
        assert!(!store.discard_if_complete(&target(7)).unwrap());
    }

    let store = QueueStore::open(&dir).unwrap();
    assert_eq!(store.targets(), vec![target(7)]);
    let mut queue = store.get(&target(7)).unwrap();
    let failed = queue.next_pending().unwrap();
    assert_eq!(queue.chunks()[failed].error(), Some("transaction declined by signer"));

    queue.run_all(&ledger, &budget, &mut NoProgress).await.unwrap();
    store.put(&queue).unwrap();
    assert_eq!(ledger.canvas(&target(7)), objects);

    assert!(store.discard_if_complete(&target(7)).unwrap());
    assert!(QueueStore::open(&dir).unwrap().targets().is_empty());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn regenerated_queue_has_identical_chunk_ids() {
    let objects = mixed(20);
    let a = make_queue(8, &objects, SubmissionKind::Replace);
    let b = make_queue(8, &objects, SubmissionKind::Replace);
    let c = make_queue(9, &objects, SubmissionKind::Replace);

    let ids = |q: &SubmissionQueue| q.chunks().iter().map(|c| c.id().to_string()).collect::<Vec<_>>();
    assert_eq!(ids(&a), ids(&b));
    assert_ne!(ids(&a), ids(&c));
}

#[test]
fn snapshot_with_misplaced_replace_is_rejected() {
    let queue = make_queue(10, &mixed(12), SubmissionKind::Replace);
    let mut value = serde_json::to_value(&queue).unwrap();
    value["chunks"][0]["role"] = serde_json::json!({ "role": "continuation" });
    assert!(serde_json::from_value::<SubmissionQueue>(value).is_err());

    let mut value = serde_json::to_value(&queue).unwrap();
    value["chunks"][1]["ordinal"] = serde_json::json!(5);
    assert!(serde_json::from_value::<SubmissionQueue>(value).is_err());
}
