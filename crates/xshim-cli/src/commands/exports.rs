//! Exports command - list the export table.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::OutputFormat;

/// Arguments for the exports command.
#[derive(Args)]
pub struct ExportsArgs {
    /// Only list exports of this guest module
    #[arg(short, long)]
    pub module: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExportDisplay {
    module: String,
    name: String,
    params: Vec<&'static str>,
}

/// Execute the exports command.
pub fn execute(args: ExportsArgs, config: Option<&Path>, format: OutputFormat) -> Result<()> {
    let kernel = super::build_kernel(config)?;

    let exports: Vec<ExportDisplay> = kernel
        .resolver()
        .exports()
        .filter(|record| args.module.as_deref().is_none_or(|m| m == record.module()))
        .map(|record| ExportDisplay {
            module: record.module().to_string(),
            name: record.name().to_string(),
            params: record.params().to_vec(),
        })
        .collect();

    match format {
        OutputFormat::Human => {
            println!("Exports ({}):", exports.len());
            for export in &exports {
                println!(
                    "  {}!{}({})",
                    export.module,
                    export.name,
                    export.params.join(", ")
                );
            }
        }
        OutputFormat::Json | OutputFormat::JsonCompact => super::print_json(&exports, format)?,
    }

    Ok(())
}
