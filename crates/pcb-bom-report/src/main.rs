use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use env_logger::Env;
use pcb_bom_report::{
    OutputFormat, Overrides, Report, ReportConfig, Settings, read_bom, resolve_lines, summary,
    write_report,
};
use pcb_digikey::{Credentials, DigikeyClient};

#[derive(Parser)]
#[command(name = "pcb-bom-report")]
#[command(about = "Generate a component report with pricing from a BOM CSV", long_about = None)]
#[command(version)]
struct Cli {
    /// BOM CSV file with a `Designator` column
    #[arg(value_hint = clap::ValueHint::FilePath)]
    bom_file: PathBuf,

    /// Directory to write the report bundle and archive into
    #[arg(long, alias = "output_path", default_value = ".", value_hint = clap::ValueHint::DirPath)]
    output_path: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "html")]
    format: OutputFormat,

    /// Comma-separated PCB build quantities for cost analysis (e.g. 10,100,1000)
    #[arg(long, value_delimiter = ',', value_parser = clap::value_parser!(u64).range(1..))]
    qty: Option<Vec<u64>>,

    /// TOML file with default quantities, retries and locale
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Zip of static assets to unpack into the HTML bundle
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    assets: Option<PathBuf>,

    /// Extra attempts per search after a transport error, 429 or 5xx
    #[arg(long)]
    retries: Option<u32>,

    /// Digi-Key locale site (default US)
    #[arg(long)]
    locale_site: Option<String>,

    /// Digi-Key locale language (default en)
    #[arg(long)]
    locale_language: Option<String>,

    /// Currency for returned prices (default USD)
    #[arg(long)]
    locale_currency: Option<String>,

    /// Digi-Key customer id (default 0)
    #[arg(long)]
    customer_id: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Default level depends on --debug (overridden by RUST_LOG)
    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("warn")
    };
    env_logger::Builder::from_env(env).init();

    let config = match &cli.config {
        Some(path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };
    let settings = Settings::resolve(
        config,
        Overrides {
            quantities: cli.qty,
            retries: cli.retries,
            locale_site: cli.locale_site,
            locale_language: cli.locale_language,
            locale_currency: cli.locale_currency,
            customer_id: cli.customer_id,
        },
    );

    let lines = read_bom(&cli.bom_file)
        .with_context(|| format!("Failed to read BOM {}", cli.bom_file.display()))?;
    if lines.is_empty() {
        anyhow::bail!("No part numbers found in {}", cli.bom_file.display());
    }

    // Authentication problems stop the run before any lookup
    let credentials = Credentials::from_env()?;
    let base_url = pcb_digikey::get_api_base_url();
    let client = DigikeyClient::connect(
        &base_url,
        &credentials,
        settings.locale.clone(),
        settings.attempts,
    )
    .context("Failed to authenticate with Digi-Key")?;
    println!("  {} Authenticated with Digi-Key", "✓".green());

    let resolved = resolve_lines(&client, &lines, &settings.quantities);
    println!(
        "  {} Fetched {} line item{}",
        "✓".green(),
        resolved.len(),
        if resolved.len() == 1 { "" } else { "s" }
    );

    let report = Report::new(&resolved, &settings.quantities, &settings.locale.currency);
    let output = write_report(&report, cli.format, &cli.output_path, cli.assets.as_deref())?;

    println!("{}", summary::lines_table(&report));
    if let Some(builds) = summary::builds_table(&report) {
        println!("{}", "Build cost".bold());
        println!("{builds}");
    }

    let unresolved = summary::unresolved(&resolved);
    if !unresolved.is_empty() {
        eprintln!(
            "{} {} line item{} could not be resolved: {}",
            "Warning:".yellow(),
            unresolved.len(),
            if unresolved.len() == 1 { "" } else { "s" },
            unresolved
                .iter()
                .map(|l| l.keyword.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    println!(
        "  {} Report written to {} ({})",
        "✓".green(),
        output.bundle_dir.display(),
        output.archive.display()
    );
    Ok(())
}
