//! CLI command modules.

pub mod config;
pub mod drawing;
pub mod http;
pub mod queue;

use anyhow::{Context, Result};
use std::path::Path;

use mural_core::config::MuralConfig;
use mural_core::Drawing;
use mural_services::{GasBudget, Planner, Target};

pub fn read_drawing(path: &Path) -> Result<Drawing> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Drawing::from_json(&text).with_context(|| format!("invalid drawing in {}", path.display()))
}

pub fn planner(config: &MuralConfig, ceiling: Option<u64>) -> Planner {
    Planner::new(config.cost, ceiling.unwrap_or(config.gas.ceiling))
        .with_strategy(config.planner.strategy)
}

pub fn budget(config: &MuralConfig) -> GasBudget {
    GasBudget::new(config.gas.fallback_gas_limit, config.gas.estimate_margin_percent)
}

pub fn target(config: &MuralConfig, token_id: u64) -> Result<Target> {
    Target::parse(&config.ledger.contract, token_id)
        .with_context(|| format!("invalid [ledger] contract {:?}", config.ledger.contract))
}
