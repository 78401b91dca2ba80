//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use wikicorpus_core::{CategoryState, HarvestSummary, ProgressReporter, harvest};
use wikicorpus_mediawiki::MediaWikiClient;
use wikicorpus_shared::{
    AppConfig, HarvestConfig, OutputFormat, init_config, load_category_groups, load_config,
    load_config_from,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// wikicorpus: harvest a text corpus from Wikipedia categories.
#[derive(Parser)]
#[command(
    name = "wikicorpus",
    version,
    about = "Harvest the articles of curated Wikipedia categories into a JSON or CSV corpus.",
    long_about = None,
    args_conflicts_with_subcommands = true,
)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub harvest: HarvestArgs,

    /// Config file (defaults to ~/.wikicorpus/wikicorpus.toml).
    #[arg(long = "config", global = true)]
    pub config_file: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Options of a harvest run. Unset options fall back to the config file.
#[derive(Args, Debug)]
pub(crate) struct HarvestArgs {
    /// JSON file mapping group labels to lists of category names.
    pub path: Option<PathBuf>,

    /// Wikipedia language edition [default: de].
    #[arg(short, long)]
    pub lang: Option<String>,

    /// Maximum articles admitted per category [default: 1000].
    #[arg(long = "max_articles", alias = "max-articles")]
    pub max_articles: Option<usize>,

    /// Truncate articles to this many characters, 0 for no limit [default: 10000].
    #[arg(long = "max_article_length", alias = "max-article-length")]
    pub max_article_length: Option<usize>,

    /// Drop articles shorter than this many characters [default: 0].
    #[arg(long = "min_article_length", alias = "min-article-length")]
    pub min_article_length: Option<usize>,

    /// Output format: json or csv [default: json].
    #[arg(long = "output_format", alias = "output-format")]
    pub output_format: Option<OutputFormat>,

    /// Output file [default: articles.<format>].
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Articles fetched concurrently [default: 1].
    #[arg(long)]
    pub concurrency: Option<usize>,
}

impl HarvestArgs {
    /// Override config values with the flags that were given.
    fn apply(&self, config: &mut HarvestConfig) {
        if let Some(lang) = &self.lang {
            config.lang = lang.clone();
        }
        if let Some(max) = self.max_articles {
            config.max_articles = max;
        }
        if let Some(max) = self.max_article_length {
            config.max_article_length = (max > 0).then_some(max);
        }
        if let Some(min) = self.min_article_length {
            config.min_article_length = min;
        }
        if let Some(format) = self.output_format {
            config.output_format = format;
        }
        if let Some(n) = self.concurrency {
            config.fetch_concurrency = n;
        }
    }
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
        0 => "wikicorpus=info",
        1 => "wikicorpus=debug",
        _ => "wikicorpus=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Command::Config { action }) => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(cli.config_file.as_deref()),
        },
        None => cmd_harvest(&cli.harvest, cli.config_file.as_deref()).await,
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

/// Load the config file, then apply CLI flags on top.
fn resolve_config(args: &HarvestArgs, config_path: Option<&Path>) -> Result<HarvestConfig> {
    let app_config = match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    let mut config = HarvestConfig::from(&app_config);
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

async fn cmd_harvest(args: &HarvestArgs, config_path: Option<&Path>) -> Result<()> {
    let path = args
        .path
        .as_deref()
        .ok_or_else(|| eyre!("missing category file: wikicorpus <PATH> (see --help)"))?;

    let config = resolve_config(args, config_path)?;
    let groups = load_category_groups(path)?;
    let output = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(format!("articles.{}", config.output_format.extension()))
    });

    let client = MediaWikiClient::new(&config)?;

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                stop.store(true, Ordering::Relaxed);
            }
        });
    }

    info!(
        path = %path.display(),
        api = %client.api_url(),
        output = %output.display(),
        format = %config.output_format,
        "harvesting categories"
    );

    let reporter = CliProgress::new();
    let outcome = harvest(&client, &groups, &config, &reporter, Some(&*stop)).await?;

    outcome.corpus.write_to(&output, config.output_format)?;

    print_summary(&outcome.summary, &output);
    Ok(())
}

fn print_summary(summary: &HarvestSummary, output: &Path) {
    println!();
    if summary.stopped {
        println!("  Harvest stopped early, partial corpus written.");
    } else {
        println!("  Harvest complete!");
    }
    println!("  Started:    {}", summary.started_at.to_rfc3339());
    println!(
        "  Categories: {} done, {} aborted",
        summary.categories_done, summary.categories_aborted
    );
    println!(
        "  Articles:   {} attempted, {} accepted, {} rejected, {} not found, {} failed",
        summary.attempted, summary.accepted, summary.rejected, summary.not_found, summary.failed
    );
    println!(
        "  Skipped:    {} duplicates, {} excluded titles",
        summary.duplicates_skipped, summary.excluded
    );
    println!("  Output:     {}", output.display());
    println!("  Time:       {:.1}s", summary.elapsed.as_secs_f64());
    println!();
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
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn category_started(&self, group: &str, category: &str, index: usize, total: usize) {
        self.spinner
            .set_message(format!("[{index}/{total}] {group}: {category}"));
    }

    fn article_processed(&self, id: &str, accepted: usize) {
        self.spinner
            .set_message(format!("{accepted} accepted, fetched {id}"));
    }

    fn category_finished(&self, category: &str, state: CategoryState) {
        if state == CategoryState::Aborted {
            self.spinner
                .suspend(|| warn!(category, "category incomplete"));
        }
    }

    fn done(&self, _summary: &HarvestSummary) {
        self.spinner.finish_and_clear();
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config: AppConfig = match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_harvest_flags() {
        let cli = Cli::try_parse_from([
            "wikicorpus",
            "categories.json",
            "-l",
            "en",
            "--max_articles",
            "5",
            "--max_article_length",
            "0",
            "--min_article_length",
            "100",
            "--output_format",
            "csv",
        ])
        .unwrap();

        assert!(cli.command.is_none());
        assert_eq!(cli.harvest.path, Some(PathBuf::from("categories.json")));

        let mut config = HarvestConfig::default();
        cli.harvest.apply(&mut config);
        assert_eq!(config.lang, "en");
        assert_eq!(config.max_articles, 5);
        assert_eq!(config.max_article_length, None);
        assert_eq!(config.min_article_length, 100);
        assert_eq!(config.output_format, OutputFormat::Csv);
    }

    #[test]
    fn unset_flags_keep_config_values() {
        let cli = Cli::try_parse_from(["wikicorpus", "categories.json"]).unwrap();
        let mut config = HarvestConfig::default();
        cli.harvest.apply(&mut config);

        assert_eq!(config.lang, "de");
        assert_eq!(config.max_articles, 1000);
        assert_eq!(config.max_article_length, Some(10000));
        assert_eq!(config.output_format, OutputFormat::Json);
    }

    #[test]
    fn flags_override_config_file() {
        let path = std::env::temp_dir().join(format!(
            "wikicorpus-cli-test-{}.toml",
            std::process::id()
        ));
        std::fs::write(
            &path,
            "[defaults]\nlang = \"en\"\nmax_articles = 5\nmin_article_length = 20\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from(["wikicorpus", "c.json", "--max_articles", "7"]).unwrap();
        let config = resolve_config(&cli.harvest, Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.lang, "en");
        assert_eq!(config.max_articles, 7);
        assert_eq!(config.min_article_length, 20);
        assert_eq!(config.max_article_length, Some(10000));
    }

    #[test]
    fn invalid_resolved_config_is_rejected() {
        let path = std::env::temp_dir().join(format!(
            "wikicorpus-cli-invalid-test-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[remote]\ntimeout_secs = 0\n").unwrap();

        let cli = Cli::try_parse_from(["wikicorpus", "c.json"]).unwrap();
        let result = resolve_config(&cli.harvest, Some(&path));
        std::fs::remove_file(&path).ok();

        assert!(result.is_err());
    }

    #[test]
    fn rejects_unknown_output_format() {
        assert!(Cli::try_parse_from(["wikicorpus", "c.json", "--output_format", "xml"]).is_err());
    }

    #[test]
    fn parses_config_subcommand() {
        let cli = Cli::try_parse_from(["wikicorpus", "config", "show"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Config {
                action: ConfigAction::Show
            })
        ));
    }
}
