//! Loading declaration files.

use std::path::Path;

use anyhow::Context;
use scriptkeeper_core::declared::DeclaredStoredScript;

/// Read a JSON declaration from `path`; `-` reads standard input.
pub fn load(path: &Path) -> anyhow::Result<DeclaredStoredScript> {
    let raw = if path == Path::new("-") {
        std::io::read_to_string(std::io::stdin()).context("Failed to read declaration from stdin")?
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read declaration {}", path.display()))?
    };
    parse(&raw).with_context(|| format!("Invalid declaration in {}", path.display()))
}

fn parse(raw: &str) -> anyhow::Result<DeclaredStoredScript> {
    let declared: DeclaredStoredScript = serde_json::from_str(raw)?;
    // Surface shape errors here rather than halfway through a remote call.
    declared.encode_script()?;
    Ok(declared)
}
