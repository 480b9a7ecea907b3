use std::io::Read;

use anyhow::{Context, Result};

use roster_ingest::from_manual_text;

use super::output::print_names;
use crate::OutputFormat;

pub fn cmd_text(raw: Option<&str>, format: OutputFormat) -> Result<()> {
    let names = match raw {
        Some(raw) => from_manual_text(raw),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("failed to read names from stdin")?;
            from_manual_text(&input)
        }
    };

    print_names(&names, format)
}
