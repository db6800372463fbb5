use std::path::PathBuf;

use anyhow::Result;
use brandpulse_core::{DataLoad, PeriodSelection};
use brandpulse_engine::{
    aggregate, demo_outcome, fmt_count, load_once, narrative, write_brief, AggregateResult,
    LoadOutcome,
};
use brandpulse_source::{FileSource, HttpConfig, HttpSource};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "brandpulse-cli")]
#[command(about = "Brand Pulse command-line interface")]
struct Cli {
    /// Published spreadsheet export URL.
    #[arg(long, global = true)]
    url: Option<String>,
    /// Local CSV export path.
    #[arg(long, global = true)]
    file: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch and normalize one snapshot, then print the load summary.
    Load,
    /// Aggregate under a filter selection and print totals and rankings.
    Summary(FilterArgs),
    /// Write the markdown brief and aggregate dump for one load.
    Brief {
        #[command(flatten)]
        filter: FilterArgs,
        /// Output directory for the per-run report.
        #[arg(long, default_value = "reports")]
        out: PathBuf,
    },
}

#[derive(Debug, Args)]
struct FilterArgs {
    /// Restrict to these categories (repeatable).
    #[arg(long)]
    category: Vec<String>,
    /// Restrict to these brands (repeatable).
    #[arg(long)]
    brand: Vec<String>,
    /// Select a single period, e.g. 16-Nov.
    #[arg(long, conflicts_with = "compare")]
    period: Option<String>,
    /// Compare two periods: current then previous.
    #[arg(long, num_args = 2, value_names = ["CURRENT", "PREVIOUS"])]
    compare: Option<Vec<String>>,
    /// Drop records below this engagement level.
    #[arg(long, default_value_t = 0.0)]
    min_engagement: f64,
    /// Ranking depth.
    #[arg(long, default_value_t = 5)]
    top: usize,
}

impl FilterArgs {
    fn apply(&self, outcome: &mut LoadOutcome) {
        if !self.category.is_empty() {
            outcome.filter.categories = self.category.iter().cloned().collect();
        }
        if !self.brand.is_empty() {
            outcome.filter.brands = self.brand.iter().cloned().collect();
        }
        if let Some(period) = &self.period {
            outcome.filter.periods = PeriodSelection::Single(period.clone());
        }
        if let Some(pair) = &self.compare {
            outcome.filter.periods = PeriodSelection::Compare {
                current: pair[0].clone(),
                previous: pair[1].clone(),
            };
        }
        outcome.filter.min_engagement = self.min_engagement;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let outcome = load_data(&cli).await?;

    match cli.command.unwrap_or(Commands::Load) {
        Commands::Load => print_load(&outcome),
        Commands::Summary(filter) => {
            let mut outcome = outcome;
            filter.apply(&mut outcome);
            let result = aggregate(outcome.data.records(), &outcome.filter);
            print_load(&outcome);
            print_summary(&result, filter.top);
        }
        Commands::Brief { filter, out } => {
            let mut outcome = outcome;
            filter.apply(&mut outcome);
            let result = aggregate(outcome.data.records(), &outcome.filter);
            let path = write_brief(&out, &outcome, &result).await?;
            println!("brief written: {}", path.display());
        }
    }

    Ok(())
}

async fn load_data(cli: &Cli) -> Result<LoadOutcome> {
    if let Some(url) = &cli.url {
        let source = HttpSource::new(
            url.clone(),
            HttpConfig {
                user_agent: Some("brandpulse/0.1".to_string()),
                ..Default::default()
            },
        )?;
        return Ok(load_once(&source).await);
    }
    if let Some(path) = &cli.file {
        let source = FileSource::new(path);
        return Ok(load_once(&source).await);
    }
    eprintln!("no --url or --file given; using the demonstration dataset");
    Ok(demo_outcome("no source specified"))
}

fn print_load(outcome: &LoadOutcome) {
    println!(
        "load complete: run_id={} origin={} records={} brands={} categories={} periods={}",
        outcome.run_id,
        outcome.summary.origin,
        outcome.summary.record_count,
        outcome.summary.brand_count,
        outcome.summary.category_count,
        outcome.summary.period_count,
    );
    if let DataLoad::FallbackDemo { reason, .. } = &outcome.data {
        eprintln!("warning: showing demonstration data ({reason})");
    }
}

fn print_summary(result: &AggregateResult, top: usize) {
    println!();
    println!("{}", narrative(result));
    println!();
    println!("categories:");
    for rollup in &result.category_rollups {
        println!(
            "  {:<12} engagement={:<12} posts={:<8} followers={:<12} share={:.1}%",
            rollup.category,
            fmt_count(rollup.engagement),
            fmt_count(rollup.posts),
            fmt_count(rollup.followers),
            rollup.share_pct,
        );
    }
    println!();
    println!("top {top} by engagement:");
    for row in result.top_by_engagement(top) {
        println!(
            "  {:<16} {:<12} {:+.1}% wow",
            row.record.brand,
            fmt_count(row.record.engagement),
            row.wow_engagement_pct,
        );
    }
    println!();
    println!("top {top} decliners by week-over-week change:");
    for row in result.top_decline(top) {
        println!(
            "  {:<16} {:+.1}% ({} engagement)",
            row.record.brand,
            row.wow_engagement_pct,
            fmt_count(row.record.engagement),
        );
    }
}
