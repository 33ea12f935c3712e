use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tabwriter::TabWriter;
use tracing::info;

use cyme_cli::cli::ConvertArgs;
use cyme_convert::{run, ConvertConfig, RunOptions, RunSummary};
use cyme_core::Severity;

pub fn handle(args: &ConvertArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            info!("Loading conversion settings from {}", path.display());
            ConvertConfig::load(path)
                .with_context(|| format!("loading config '{}'", path.display()))?
        }
        None => ConvertConfig::default(),
    };

    let mut options = RunOptions::new(&args.data, &args.output);
    options.dot = args.dot;
    options.input_dir = match (&args.input, &args.config) {
        (Some(input), _) => input.clone(),
        (None, Some(config)) => config
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
        (None, None) => PathBuf::from("."),
    };

    info!(
        "Converting CYME export {} to {}",
        args.data.display(),
        args.output.display()
    );
    let summary = run(&options, config)?;
    print_summary(&summary)?;

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&summary)
            .context("serializing conversion report to JSON")?;
        fs::write(path, json)
            .with_context(|| format!("writing report '{}'", path.display()))?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "NETWORK\tOBJECTS\tASSUMPTIONS\tOUTPUT")?;
    for network in &summary.networks {
        let output = match &network.glm_path {
            Some(path) => path.display().to_string(),
            None => "failed".to_string(),
        };
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            network.network_id,
            network.stats.object_count(),
            network.stats.assumptions,
            output
        )?;
    }
    writer.flush()?;

    for issue in summary
        .diagnostics
        .issues
        .iter()
        .filter(|issue| issue.severity == Severity::Error)
    {
        eprintln!("{issue}");
    }
    println!(
        "{} of {} networks converted, {}",
        summary.converted(),
        summary.processed(),
        summary.diagnostics.summary()
    );
    Ok(())
}
