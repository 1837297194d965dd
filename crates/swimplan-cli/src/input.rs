//! Reading request and plan documents from files or stdin.

use std::io::Read;

use anyhow::{Context, Result};

use swimplan_core::PlannerInput;

/// Read a whole document. `None` or `"-"` means stdin.
pub fn read_text(path: Option<&str>) -> Result<String> {
    match path {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read from stdin")?;
            Ok(buf)
        }
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
        }
    }
}

/// Parse a planner input object.
pub fn parse_request(text: &str, origin: &str) -> Result<PlannerInput> {
    serde_json::from_str(text).with_context(|| format!("invalid planner input in {origin}"))
}

/// Read and parse a planner input object.
pub fn read_request(path: Option<&str>) -> Result<PlannerInput> {
    let text = read_text(path)?;
    parse_request(&text, path.unwrap_or("stdin"))
}
