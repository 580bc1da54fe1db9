//! Call command - invoke an export against scratch guest memory.

use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Args;
use serde::Serialize;

use xshim::prelude::*;
use xshim_observe::MetricsSnapshot;

use super::parse_u32;
use crate::OutputFormat;

/// Arguments for the call command.
#[derive(Args)]
pub struct CallArgs {
    /// Export name, optionally qualified as `module!name`
    #[arg(required = true)]
    pub export: String,

    /// 32-bit arguments in call order (decimal or 0x hex)
    #[arg(value_parser = parse_u32)]
    pub args: Vec<u32>,

    /// Guest module to resolve unqualified names in
    #[arg(short, long, default_value = xshim::xshim_xam::INPUT_MODULE)]
    pub module: String,

    /// Store a big-endian 32-bit word before the call (ADDR=VALUE)
    #[arg(long, value_parser = parse_poke)]
    pub poke: Vec<(u32, u32)>,

    /// Dump guest memory after the call (ADDR:LEN)
    #[arg(long, value_parser = parse_dump)]
    pub dump: Vec<(u32, u32)>,

    /// Show per-export metrics
    #[arg(long)]
    pub metrics: bool,
}

#[derive(Debug, Serialize)]
struct CallOutput {
    module: String,
    name: String,
    args: Vec<ArgDisplay>,
    result: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    result_name: Option<&'static str>,
    dumps: Vec<DumpDisplay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics: Option<MetricsSnapshot>,
}

#[derive(Debug, Serialize)]
struct ArgDisplay {
    name: String,
    value: u32,
}

#[derive(Debug, Serialize)]
struct DumpDisplay {
    address: u32,
    bytes: String,
}

/// Execute the call command.
pub fn execute(
    args: CallArgs,
    config: Option<&Path>,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let kernel = super::build_kernel(config)?;

    let (module, name) = match args.export.split_once('!') {
        Some((module, name)) => (module, name),
        None => (args.module.as_str(), args.export.as_str()),
    };
    let dispatcher = kernel
        .bind(module, name)
        .with_context(|| format!("Cannot bind {}!{}", module, name))?;

    let params = dispatcher.export().params();
    if args.args.len() != params.len() {
        bail!(
            "{} takes {} argument(s) ({}), got {}",
            name,
            params.len(),
            params.join(", "),
            args.args.len()
        );
    }

    let mut memory = kernel.new_memory();
    for &(address, value) in &args.poke {
        memory
            .write_u32(address, value)
            .with_context(|| format!("Cannot poke {:#x}", address))?;
    }

    if !quiet {
        tracing::info!(module = module, name = name, args = ?args.args, "Invoking export");
    }

    let mut ctx = PpcContext::with_args(&args.args);
    let result = dispatcher.dispatch(&mut ctx, &mut memory);

    let mut dumps = Vec::with_capacity(args.dump.len());
    for &(address, len) in &args.dump {
        let bytes = memory
            .slice(address, len as usize)
            .with_context(|| format!("Cannot dump {:#x}:{}", address, len))?;
        dumps.push(DumpDisplay {
            address,
            bytes: hex(bytes),
        });
    }

    let output = CallOutput {
        module: dispatcher.module().to_string(),
        name: dispatcher.name().to_string(),
        args: params
            .iter()
            .zip(&args.args)
            .map(|(name, &value)| ArgDisplay {
                name: name.to_string(),
                value,
            })
            .collect(),
        result: result.as_u32(),
        result_name: result.name(),
        dumps,
        metrics: args.metrics.then(|| kernel.metrics().snapshot()),
    };

    match format {
        OutputFormat::Human => print_human(&output),
        OutputFormat::Json | OutputFormat::JsonCompact => super::print_json(&output, format)?,
    }

    Ok(())
}

fn print_human(output: &CallOutput) {
    let args: Vec<String> = output
        .args
        .iter()
        .map(|a| format!("{}={:#x}", a.name, a.value))
        .collect();
    println!("{}!{}({})", output.module, output.name, args.join(", "));
    match output.result_name {
        Some(name) => println!("  result: {:#x} ({})", output.result, name),
        None => println!("  result: {:#x}", output.result),
    }

    for dump in &output.dumps {
        println!();
        println!("Memory at {:#010x}:", dump.address);
        let bytes: Vec<&str> = dump.bytes.split(' ').filter(|b| !b.is_empty()).collect();
        for (row, chunk) in bytes.chunks(16).enumerate() {
            println!(
                "  {:08x}  {}",
                dump.address as usize + row * 16,
                chunk.join(" ")
            );
        }
    }

    if let Some(metrics) = &output.metrics {
        println!();
        println!("Metrics:");
        for (export, stats) in &metrics.exports {
            println!(
                "  {}: calls={} failures={} bad_arguments={} time={:?}",
                export, stats.calls, stats.failures, stats.bad_arguments, stats.total_duration
            );
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_poke(text: &str) -> Result<(u32, u32), String> {
    let (address, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected ADDR=VALUE, got '{text}'"))?;
    Ok((parse_u32(address)?, parse_u32(value)?))
}

fn parse_dump(text: &str) -> Result<(u32, u32), String> {
    let (address, len) = text
        .split_once(':')
        .ok_or_else(|| format!("expected ADDR:LEN, got '{text}'"))?;
    Ok((parse_u32(address)?, parse_u32(len)?))
}
