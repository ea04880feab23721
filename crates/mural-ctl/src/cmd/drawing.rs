//! Offline commands: encode, inspect, plan.

use anyhow::{Context, Result};
use std::path::Path;

use mural_core::config::MuralConfig;
use mural_core::{Codec, PackedRecord};

use super::{planner, read_drawing};

pub fn cmd_encode(path: &Path) -> Result<()> {
    let drawing = read_drawing(path)?;
    let records = drawing.codec().encode_many(&drawing.objects)?;

    println!("═══════════════════════════════════════");
    println!("  Packed Records ({})", records.len());
    println!("═══════════════════════════════════════");
    for (i, (obj, record)) in drawing.objects.iter().zip(&records).enumerate() {
        println!("  ┌─ #{} {} {} stroke {}", i, obj.shape, obj.color, obj.stroke_weight);
        println!("  │  points   : {}", record.point_count());
        println!("  │  base     : {}", record.base_hex());
        println!("  └─ overflow : {} ({} bytes)", record.overflow_hex(), record.overflow.len());
    }
    Ok(())
}

pub fn cmd_inspect(base: &str, overflow: Option<&str>) -> Result<()> {
    let record = PackedRecord::from_hex(base, overflow.unwrap_or("")).context("invalid record hex")?;
    let obj = Codec::new().decode(&record).context("record does not decode")?;

    println!("═══════════════════════════════════════");
    println!("  Record");
    println!("═══════════════════════════════════════");
    println!("  Shape  : {} (id {})", obj.shape, obj.shape.id());
    println!("  Color  : {}", obj.color);
    println!("  Stroke : {}", obj.stroke_weight);
    println!("  Points : {}", obj.points.len());
    for (i, p) in obj.points.iter().enumerate() {
        let slot = if i < mural_core::codec::EMBEDDED_POINTS { "word" } else { "overflow" };
        println!("    {:>5}  ({:>6}, {:>6})  {}", i, p.x, p.y, slot);
    }
    Ok(())
}

pub fn cmd_plan(config: &MuralConfig, path: &Path, ceiling: Option<u64>) -> Result<()> {
    let drawing = read_drawing(path)?;
    drawing.codec().encode_many(&drawing.objects)?;

    let planner = planner(config, ceiling);
    let plan = planner.plan(&drawing.objects)?;
    let savings = planner.model().comparative_savings(&drawing.objects);

    println!("═══════════════════════════════════════");
    println!("  Chunk Plan");
    println!("═══════════════════════════════════════");
    println!("  Objects    : {}", drawing.objects.len());
    println!("  Ceiling    : {}", planner.ceiling());
    println!("  Strategy   : {:?}", plan.strategy);
    println!("  Chunk size : {}", plan.chunk_size);
    println!("  Chunks     : {}", plan.chunk_count);
    println!();
    println!("  Packed cost : {}", savings.packed);
    println!("  Naive cost  : {}", savings.naive);
    println!("  Savings     : {} ({:.1}%)", savings.absolute, savings.percent);

    println!("\n  Chunks:");
    for (i, range) in plan.bounds().iter().enumerate() {
        let cost = planner.model().batch_cost(&drawing.objects[range.clone()]);
        println!("  ├─ {:>3}  objects {:>5}..{:<5}  cost {}", i, range.start, range.end, cost);
    }

    let over = planner.audit(&drawing.objects, &plan);
    if !over.is_empty() {
        println!("\n  Warning: {} chunk(s) exceed the ceiling:", over.len());
        for o in &over {
            println!("    chunk {} costs {} > {}", o.ordinal, o.cost, o.ceiling);
        }
        println!("  Set [planner] strategy = \"adaptive\" to re-plan each remainder.");
    }
    Ok(())
}
