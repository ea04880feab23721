//! Ledger commands: submit, resume, retry, status.

use anyhow::{bail, Context, Result};
use std::path::Path;

use mural_core::config::MuralConfig;
use mural_services::{
    Chunk, ChunkStatus, GasBudget, Ledger, Progress, QueueStore, SubmissionKind, SubmissionQueue,
    Target,
};

use super::http::HttpLedger;
use super::{budget, planner, read_drawing, target};

fn open_store(config: &MuralConfig) -> Result<QueueStore> {
    QueueStore::open(&config.storage.queue_dir).context("failed to open queue store")
}

fn print_transition(progress: Progress, chunk: &Chunk) {
    let status = match chunk.status() {
        ChunkStatus::Pending => "pending",
        ChunkStatus::Processing => "submitting",
        ChunkStatus::Completed => "done",
        ChunkStatus::Failed => "FAILED",
    };
    println!(
        "  [{}] chunk {}/{} {} {}",
        progress,
        chunk.ordinal() + 1,
        chunk.total(),
        chunk.kind().as_str(),
        status
    );
}

/// Run every remaining chunk, snapshotting after each one. A completed chunk
/// must never be submitted twice, even if this process is killed.
async fn drive<L: Ledger>(
    queue: &mut SubmissionQueue,
    store: &QueueStore,
    ledger: &L,
    budget: &GasBudget,
) -> Result<()> {
    let mut observer = print_transition;
    while let Some(index) = queue.next_pending() {
        let result = queue.run_chunk(index, ledger, budget, &mut observer).await;
        store.put(queue)?;
        if let Err(e) = result {
            println!();
            println!("  Stopped at chunk {}. Fix the cause, then run:", index);
            println!("    mural-ctl retry --token {} {}", queue.target().token_id, index);
            return Err(e.into());
        }
    }
    Ok(())
}

fn finish(store: &QueueStore, queue: &SubmissionQueue) -> Result<()> {
    let target = queue.target();
    let gas: u64 = queue.chunks().iter().filter_map(Chunk::gas_used).sum();
    println!();
    println!("  Drawing written to {} in {} submission(s), {} gas.", target, queue.len(), gas);
    if queue.is_complete() {
        store.discard_if_complete(&target)?;
    }
    Ok(())
}

fn load_queue(store: &QueueStore, target: &Target) -> Result<SubmissionQueue> {
    store
        .get(target)
        .with_context(|| format!("no queue stored for {target}"))
}

pub async fn cmd_submit(config: &MuralConfig, path: &Path, token_id: u64, append: bool) -> Result<()> {
    let drawing = read_drawing(path)?;
    let target = target(config, token_id)?;
    let store = open_store(config)?;

    if let Some(existing) = store.get(&target) {
        if !existing.is_complete() {
            bail!(
                "{target} has an unfinished queue ({}); use `resume` or `retry`",
                existing.progress()
            );
        }
    }

    let kind = if append {
        SubmissionKind::Append
    } else {
        SubmissionKind::Replace
    };
    let mut queue = SubmissionQueue::new(
        target,
        &drawing.objects,
        drawing.codec(),
        &planner(config, None),
        kind,
    )?;
    store.put(&queue)?;

    println!("═══════════════════════════════════════");
    println!("  Submitting to {}", target);
    println!("═══════════════════════════════════════");
    println!("  Objects : {}", drawing.objects.len());
    println!("  Chunks  : {}", queue.len());
    println!("  Mode    : {}", kind.as_str());
    println!();

    let ledger = HttpLedger::new(&config.ledger.endpoint);
    drive(&mut queue, &store, &ledger, &budget(config)).await?;
    finish(&store, &queue)
}

pub async fn cmd_resume(config: &MuralConfig, token_id: u64) -> Result<()> {
    let target = target(config, token_id)?;
    let store = open_store(config)?;
    let mut queue = load_queue(&store, &target)?;

    if queue.is_complete() {
        println!("  {} is already complete.", target);
        return finish(&store, &queue);
    }

    println!("  Resuming {} at {}", target, queue.progress());
    let ledger = HttpLedger::new(&config.ledger.endpoint);
    drive(&mut queue, &store, &ledger, &budget(config)).await?;
    finish(&store, &queue)
}

pub async fn cmd_retry(config: &MuralConfig, token_id: u64, index: usize) -> Result<()> {
    let target = target(config, token_id)?;
    let store = open_store(config)?;
    let mut queue = load_queue(&store, &target)?;

    let ledger = HttpLedger::new(&config.ledger.endpoint);
    let mut observer = print_transition;
    let result = queue
        .run_chunk(index, &ledger, &budget(config), &mut observer)
        .await;
    store.put(&queue)?;
    let progress = result?;

    if progress.is_done() {
        finish(&store, &queue)?;
    } else {
        let left = progress.total - progress.completed;
        println!("  {} chunk(s) left; run `mural-ctl resume --token {}`", left, token_id);
    }
    Ok(())
}

pub fn cmd_status(config: &MuralConfig, token_id: u64) -> Result<()> {
    let target = target(config, token_id)?;
    let store = open_store(config)?;
    let Some(queue) = store.get(&target) else {
        println!("No queue stored for {}.", target);
        return Ok(());
    };

    println!("═══════════════════════════════════════");
    println!("  Queue {}", target);
    println!("═══════════════════════════════════════");
    println!("  Progress   : {} ({:.0}%)", queue.progress(), queue.progress().fraction() * 100.0);
    println!("  Processing : {}", queue.is_processing());

    for chunk in queue.chunks() {
        println!("  ┌─ chunk {} ({})", chunk.ordinal(), chunk.short_id());
        println!("  │  kind    : {}", chunk.kind().as_str());
        println!("  │  objects : {}", chunk.objects().len());
        println!("  │  status  : {:?}", chunk.status());
        if let Some(limit) = chunk.gas_limit() {
            println!("  │  limit   : {}", limit);
        }
        if let Some(tx) = chunk.tx_ref() {
            println!("  │  tx      : {} ({} gas)", tx, chunk.gas_used().unwrap_or(0));
        }
        match chunk.error() {
            Some(err) => println!("  └─ error   : {}", err),
            None => println!("  └─"),
        }
    }
    Ok(())
}
