//! Transfer inspection commands: list, cancel.

use anyhow::{Context, Result};
use import1::{Manager, TransferInfo};

use crate::OutputFormat;

/// Arguments for `importctl list`.
#[derive(clap::Args)]
pub struct ListArgs {
    /// Print the manager's reply as-is instead of decoding it.
    #[arg(long)]
    pub raw: bool,

    /// Only display transfer IDs.
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

/// Arguments for `importctl cancel`.
#[derive(clap::Args)]
pub struct CancelArgs {
    /// Transfer IDs to cancel.
    #[arg(required = true, num_args = 1..)]
    pub ids: Vec<u32>,
}

pub fn list(manager: &Manager, args: &ListArgs, format: OutputFormat) -> Result<()> {
    if args.raw {
        let reply = manager.list_transfers()?;
        if matches!(format, OutputFormat::Json) {
            println!("{}", serde_json::to_string_pretty(&reply)?);
        } else {
            for value in &reply {
                println!("{value}");
            }
        }
        return Ok(());
    }

    let transfers = manager.transfers()?;

    if args.quiet {
        for t in &transfers {
            println!("{}", t.id);
        }
        return Ok(());
    }

    if matches!(format, OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(&transfers)?);
        return Ok(());
    }

    if transfers.is_empty() {
        println!("No transfers.");
        return Ok(());
    }
    println!(
        "{:<6} {:<18} {:>8}  {:<24} REMOTE",
        "ID", "TYPE", "PROGRESS", "LOCAL"
    );
    for t in &transfers {
        println!(
            "{:<6} {:<18} {:>8}  {:<24} {}",
            t.id,
            t.kind,
            percent(t),
            t.local,
            t.remote
        );
    }
    Ok(())
}

pub fn cancel(manager: &Manager, args: &CancelArgs) -> Result<()> {
    for &id in &args.ids {
        manager
            .cancel_transfer(id)
            .with_context(|| format!("cancel transfer {id}"))?;
        println!("{id}");
    }
    Ok(())
}

/// Renders progress as a percentage; out-of-range values mean "unknown".
fn percent(t: &TransferInfo) -> String {
    if (0.0..=1.0).contains(&t.progress) {
        format!("{:.0}%", t.progress * 100.0)
    } else {
        "n/a".to_owned()
    }
}
