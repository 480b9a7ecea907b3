use std::io::Write;

use anyhow::Result;

use roster_ingest::ingest::Rejection;
use roster_ingest::NameCandidate;

use crate::OutputFormat;

pub fn print_names(names: &[NameCandidate], format: OutputFormat) -> Result<()> {
    let mut out = std::io::stdout().lock();

    match format {
        OutputFormat::Lines => {
            for name in names {
                writeln!(out, "{name}")?;
            }
        }
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string(names)?)?;
        }
    }

    Ok(())
}

pub fn print_rejected(rejected: &[Rejection]) {
    for rejection in rejected {
        eprintln!("   ✗ {:?} ({})", rejection.text, rejection.reason);
    }
}

pub fn print_recall(found: usize, expected: usize, missing: &[&str]) {
    eprintln!("🎯 Recall: {found}/{expected}");
    for name in missing {
        eprintln!("   missing: {name}");
    }
}
