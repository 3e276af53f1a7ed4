use std::{path::PathBuf, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs;
use tracing::{Level, debug};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use tubescore_core::{
    DateBound, DateRange, FilterCriteria, SearchBatch, SearchOutcome, SearchQuery, SearchSession,
    StaticSource, format_ranked_table, format_report_readable, parse_channels_response,
    parse_videos_response,
};

/// A captured `videos.list` response, tagged with the keyword that produced it.
#[derive(Clone, Debug)]
struct InputSpec {
    keyword: String,
    path: PathBuf,
}

impl FromStr for InputSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (keyword, path) = match s.split_once('=') {
            Some((keyword, path)) => (keyword.trim().to_string(), PathBuf::from(path)),
            None => {
                let path = PathBuf::from(s);
                let stem = path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default();
                (stem, path)
            }
        };
        if keyword.is_empty() {
            return Err(format!("cannot derive a keyword from '{}'", s));
        }
        Ok(Self { keyword, path })
    }
}

#[derive(Parser)]
#[command(name = "tubescore")]
#[command(about = "Rank captured YouTube search results by engagement and report content trends")]
struct Cli {
    /// Captured videos.list response. KEYWORD defaults to the file name.
    #[arg(short, long = "input", value_name = "[KEYWORD=]PATH", required = true)]
    inputs: Vec<InputSpec>,

    /// Captured channels.list response with subscriber counts
    #[arg(short, long, value_name = "PATH")]
    channels: Option<PathBuf>,

    /// Videos taken from each keyword's results
    #[arg(long, default_value_t = 50)]
    max_results: usize,

    /// Free-text match on title, description, keyword and channel name
    #[arg(short = 'k', long = "match")]
    keyword: Option<String>,

    /// Minimum duration in seconds
    #[arg(long)]
    min_duration: Option<u64>,

    /// Maximum duration in seconds
    #[arg(long)]
    max_duration: Option<u64>,

    #[arg(long)]
    min_subscribers: Option<u64>,

    #[arg(long)]
    max_subscribers: Option<u64>,

    #[arg(long)]
    min_views: Option<u64>,

    #[arg(long)]
    max_views: Option<u64>,

    /// Minimum engagement rate, in percent
    #[arg(long)]
    min_engagement: Option<f64>,

    /// Published on or after: RFC 3339, YYYY-MM-DD or <N>d
    #[arg(long)]
    after: Option<DateBound>,

    /// Published on or before: RFC 3339, YYYY-MM-DD or <N>d
    #[arg(long)]
    before: Option<DateBound>,

    /// Publish window: today, yesterday, 7d, 30d or <N>d
    #[arg(long)]
    within: Option<DateRange>,

    /// Show only the top N videos
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Print results and analysis as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            min_duration: self.min_duration,
            max_duration: self.max_duration,
            min_subscribers: self.min_subscribers,
            max_subscribers: self.max_subscribers,
            min_views: self.min_views,
            max_views: self.max_views,
            min_engagement: self.min_engagement,
            published_after: self.after,
            published_before: self.before,
            published_within: self.within,
            keyword: self.keyword.clone(),
        }
    }

    /// Search keywords in first-seen order.
    fn keywords(&self) -> Vec<String> {
        let mut keywords: Vec<String> = Vec::new();
        for input in &self.inputs {
            if !keywords.contains(&input.keyword) {
                keywords.push(input.keyword.clone());
            }
        }
        keywords
    }
}

fn init_logging(verbose: bool, quiet: bool) -> Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(verbose)
                .with_writer(std::io::stderr),
        )
        .try_init()?;
    Ok(())
}

fn create_spinner(msg: &str, hidden: bool) -> Result<ProgressBar> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")?,
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    Ok(pb)
}

async fn load_source(cli: &Cli, spinner: &ProgressBar) -> Result<StaticSource> {
    let mut source = StaticSource::new("captured");

    for input in &cli.inputs {
        spinner.set_message(format!("Loading {}...", input.path.display()));
        let body = fs::read_to_string(&input.path)
            .await
            .with_context(|| format!("Failed to read {}", input.path.display()))?;
        let videos = parse_videos_response(&body)
            .with_context(|| format!("Failed to decode videos from {}", input.path.display()))?;
        debug!(keyword = input.keyword.as_str(), videos = videos.len(), "loaded search results");
        source = source.with_batch(SearchBatch::new(input.keyword.clone(), videos));
    }

    if let Some(path) = &cli.channels {
        spinner.set_message(format!("Loading {}...", path.display()));
        let body = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let channels = parse_channels_response(&body)
            .with_context(|| format!("Failed to decode channels from {}", path.display()))?;
        debug!(channels = channels.len(), "loaded channel statistics");
        source = source.with_channels(channels);
    }

    Ok(source)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet)?;

    let spinner = create_spinner("Loading captured responses...", cli.json || cli.quiet)?;
    let source = load_source(&cli, &spinner).await?;

    spinner.set_message("Scoring videos...");
    let query = SearchQuery::new(cli.keywords())
        .with_max_results(cli.max_results)
        .with_criteria(cli.criteria());
    let mut session = SearchSession::new();
    let records = session.search(&source, &query)?;

    let mut outcome = SearchOutcome::from_records(records.to_vec());
    if let Some(limit) = cli.limit {
        outcome.truncate(limit);
    }
    spinner.finish_and_clear();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!(
        "\n{}  {}\n",
        style("tubescore").cyan().bold(),
        style("Engagement Ranking").dim()
    );
    println!(
        "{} Scored {} videos for {} {}",
        style("✓").green().bold(),
        style(outcome.analysis.record_count).cyan().bold(),
        style(cli.keywords().join(", ")).yellow(),
        style(format!("[session {}]", session.id())).dim()
    );
    println!("{}", style("─".repeat(60)).dim());

    if outcome.videos.is_empty() {
        println!("{}", style("No videos matched the given filters.").dim());
    } else {
        print!("{}", format_ranked_table(&outcome.videos));
    }

    println!("{}", style("─".repeat(60)).dim());
    println!("{}", format_report_readable(&outcome.analysis));

    Ok(())
}
