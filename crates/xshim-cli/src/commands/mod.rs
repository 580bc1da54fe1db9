//! Subcommands.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use xshim::{Kernel, KernelBuilder};

use crate::OutputFormat;

pub mod call;
pub mod exports;
pub mod layouts;

/// Build a kernel from an optional configuration file.
pub(crate) fn build_kernel(config: Option<&Path>) -> Result<Kernel> {
    let mut builder = KernelBuilder::new();
    if let Some(path) = config {
        builder = builder
            .with_config_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    }
    builder.build().context("Failed to build kernel")
}

/// Print `value` as JSON in the requested flavour.
pub(crate) fn print_json<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let json = match format {
        OutputFormat::JsonCompact => serde_json::to_string(value)?,
        _ => serde_json::to_string_pretty(value)?,
    };
    println!("{}", json);
    Ok(())
}

/// Parse a 32-bit value written in decimal or `0x` hex.
pub(crate) fn parse_u32(text: &str) -> Result<u32, String> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|e| format!("invalid 32-bit value '{text}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u32() {
        assert_eq!(parse_u32("0"), Ok(0));
        assert_eq!(parse_u32("4096"), Ok(4096));
        assert_eq!(parse_u32("0x1000"), Ok(0x1000));
        assert_eq!(parse_u32("0XFF"), Ok(0xFF));
        assert!(parse_u32("0x1_0000_0000").is_err());
        assert!(parse_u32("-1").is_err());
        assert!(parse_u32("pad").is_err());
    }
}
