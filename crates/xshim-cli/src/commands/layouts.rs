//! Layouts command - show guest record layouts.

use anyhow::Result;

use crate::OutputFormat;

/// Execute the layouts command.
pub fn execute(format: OutputFormat) -> Result<()> {
    let layouts = xshim_codec::layouts();

    match format {
        OutputFormat::Human => {
            println!("{:<24} {:>5} {:>6}", "RECORD", "SIZE", "ALIGN");
            for layout in &layouts {
                println!("{:<24} {:>5} {:>6}", layout.name, layout.size, layout.align);
            }
        }
        OutputFormat::Json | OutputFormat::JsonCompact => super::print_json(&layouts, format)?,
    }

    Ok(())
}
