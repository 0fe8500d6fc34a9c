//! CLI command definitions, routing, and tracing setup.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use pathscout_core::{EnrichedGene, Pipeline, ProgressReporter};
use pathscout_shared::{
    AppConfig, HUMAN_GENE_PREFIX, ScanConfig, UNKNOWN_NAME, init_config, load_config,
};
use pathscout_store::CacheStore;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// pathscout — related-gene and drug discovery over KEGG pathways.
#[derive(Parser)]
#[command(
    name = "pathscout",
    version,
    about = "Find genes related to a query gene through KEGG pathways, with the drugs that target them.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Scan pathways for a gene and report related genes with their drugs.
    Scan {
        /// KEGG gene code, e.g. hsa:5747 (a bare number is taken as human).
        gene: String,

        /// Maximum simultaneous in-flight requests.
        #[arg(long)]
        concurrency: Option<usize>,

        /// Pathway documents fetched per batch.
        #[arg(long)]
        batch_size: Option<usize>,

        /// Stop scanning once this many relations are found.
        #[arg(long)]
        min_relations: Option<usize>,

        /// Never fetch more than this many pathway documents.
        #[arg(long)]
        max_pathways: Option<usize>,

        /// Number of top-ranked genes to report.
        #[arg(long)]
        top: Option<usize>,

        /// Directory for the durable cache database.
        #[arg(long)]
        cache_dir: Option<String>,

        /// KEGG REST base URL.
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "pathscout=info",
        1 => "pathscout=debug",
        _ => "pathscout=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Scan {
            gene,
            concurrency,
            batch_size,
            min_relations,
            max_pathways,
            top,
            cache_dir,
            base_url,
        } => {
            let overrides = ScanOverrides {
                concurrency,
                batch_size,
                min_relations,
                max_pathways,
                top,
                cache_dir,
                base_url,
            };
            cmd_scan(&gene, overrides).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// Scan-tuning flags that override config file values.
struct ScanOverrides {
    concurrency: Option<usize>,
    batch_size: Option<usize>,
    min_relations: Option<usize>,
    max_pathways: Option<usize>,
    top: Option<usize>,
    cache_dir: Option<String>,
    base_url: Option<String>,
}

impl ScanOverrides {
    fn apply(self, config: &mut AppConfig) {
        if let Some(v) = self.concurrency {
            config.defaults.max_concurrency = v;
        }
        if let Some(v) = self.batch_size {
            config.defaults.batch_size = v;
        }
        if let Some(v) = self.min_relations {
            config.defaults.min_relations = v;
        }
        if let Some(v) = self.max_pathways {
            config.defaults.max_pathways = v;
        }
        if let Some(v) = self.top {
            config.defaults.top_genes = v;
        }
        if let Some(v) = self.cache_dir {
            config.cache.dir = v;
        }
        if let Some(v) = self.base_url {
            config.kegg.base_url = v;
        }
    }
}

// ---------------------------------------------------------------------------
// Scan command
// ---------------------------------------------------------------------------

async fn cmd_scan(gene: &str, overrides: ScanOverrides) -> Result<()> {
    let mut config = load_config()?;
    overrides.apply(&mut config);

    // A bare numeric id is taken as a human gene.
    let gene_code = if gene.contains(':') {
        gene.to_string()
    } else {
        format!("{HUMAN_GENE_PREFIX}{gene}")
    };

    let cache = Arc::new(CacheStore::open(&config.cache.db_path()?).await);
    let scan_config = ScanConfig::from(&config);
    let pipeline = Pipeline::new(scan_config, cache)?;

    info!(gene = %gene_code, "starting pathway scan");

    let reporter = CliProgress::new();
    let display_name = pipeline.gene_display_name(&gene_code).await;
    let report = pipeline.related_drugs(&gene_code, &reporter).await;
    reporter.finish();

    print_report(&gene_code, &display_name, &report);
    Ok(())
}

/// Print the scan report. An empty report is an answer, not an error.
fn print_report(gene_code: &str, display_name: &str, report: &[EnrichedGene]) {
    println!();
    if display_name == UNKNOWN_NAME {
        println!("GENE NAME: {UNKNOWN_NAME} ({gene_code})");
    } else {
        println!("GENE NAME: {display_name}");
    }
    println!();

    if report.is_empty() {
        println!("No similar genes found.");
        return;
    }

    println!("SIMILAR GENES AND THEIR COMPATIBLE DRUGS:");
    println!();
    for (rank, gene) in report.iter().enumerate() {
        println!("{}. {} ({})", rank + 1, gene.name, gene.gene_code);
        println!("   Relation: {} (seen in {})", gene.relation_type, gene.pathway);
        if gene.drugs.is_empty() {
            println!("   No compatible drugs found");
        } else {
            println!("   Compatible drugs ({}):", gene.drugs.len());
            for drug in &gene.drugs {
                println!("     - {drug}");
            }
        }
        println!();
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, message: &str) {
        self.spinner.set_message(message.to_string());
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
