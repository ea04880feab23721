//! mural-ctl — encode drawings and submit them to the ledger in chunks.

use anyhow::{Context, Result};
use std::path::Path;

use mural_core::config::MuralConfig;

mod cmd;

use cmd::config::cmd_config;
use cmd::drawing::{cmd_encode, cmd_inspect, cmd_plan};
use cmd::queue::{cmd_resume, cmd_retry, cmd_status, cmd_submit};

fn print_usage() {
    println!("Usage: mural-ctl [options] <command>");
    println!();
    println!("Commands:");
    println!("  encode <drawing.json>              Print each object's packed record");
    println!("  inspect <word-hex> [overflow-hex]  Decode one packed record");
    println!("  plan <drawing.json>                Show the chunk plan and packing savings");
    println!("  submit <drawing.json>              Create and run a submission queue");
    println!("  resume                             Continue the stored queue");
    println!("  retry <index>                      Retry one failed chunk");
    println!("  status                             Show per-chunk status of the stored queue");
    println!("  config                             Print the effective configuration");
    println!();
    println!("Options:");
    println!("  --token <id>     Token to write (submit, resume, retry, status)");
    println!("  --append         Add to the token's drawing instead of replacing it");
    println!("  --ceiling <gas>  Override [gas] ceiling (plan)");
    println!();
    println!("Config: {}", MuralConfig::file_path().display());
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = MuralConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        MuralConfig::default()
    });

    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut token: Option<u64> = None;
    let mut ceiling: Option<u64> = None;
    let mut append = false;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--token" => {
                i += 1;
                token = Some(
                    args.get(i)
                        .context("--token requires a value")?
                        .parse()
                        .context("--token must be a number")?,
                );
            }
            "--ceiling" => {
                i += 1;
                ceiling = Some(
                    args.get(i)
                        .context("--ceiling requires a value")?
                        .parse()
                        .context("--ceiling must be a number")?,
                );
            }
            "--append" => append = true,
            other => remaining.push(other),
        }
        i += 1;
    }

    let need_token = || token.context("this command needs --token <id>");

    match remaining.as_slice() {
        ["encode", path] => cmd_encode(Path::new(path)),
        ["inspect", word] => cmd_inspect(word, None),
        ["inspect", word, overflow] => cmd_inspect(word, Some(*overflow)),
        ["plan", path] => cmd_plan(&config, Path::new(path), ceiling),
        ["submit", path] => cmd_submit(&config, Path::new(path), need_token()?, append).await,
        ["resume"] => cmd_resume(&config, need_token()?).await,
        ["retry", index] => {
            let index = index.parse().context("chunk index must be a number")?;
            cmd_retry(&config, need_token()?, index).await
        }
        ["status"] => cmd_status(&config, need_token()?),
        ["config"] => cmd_config(&config),
        ["help"] | ["--help"] | ["-h"] | [] => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
