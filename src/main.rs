use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use disclosure_radar::{
    load_disclosures, load_summary, parse_date, run_daily, setup_database, AnnotatedRecord,
    DailyRun, Group, RunOptions, ScoringRules, DEFAULT_TOP_N,
};

#[derive(Parser)]
#[command(name = "disclosure-radar", version, about = "Score daily disclosures and track entities across runs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify a batch file and merge it into the summary
    Run {
        /// Batch file (.csv or .json)
        #[arg(long)]
        input: PathBuf,

        /// Run date (YYYY-MM-DD or YYYYMMDD); defaults to today
        #[arg(long)]
        date: Option<String>,

        #[arg(long, default_value = "summary.db")]
        db: PathBuf,

        /// Rules JSON; built-in tables when omitted
        #[arg(long)]
        rules: Option<PathBuf>,

        #[arg(long, default_value_t = DEFAULT_TOP_N)]
        top: usize,

        /// Skip entities already seen after the run date instead of aborting
        #[arg(long)]
        skip_stale: bool,
    },

    /// Print the stored summary
    Summary {
        #[arg(long, default_value = "summary.db")]
        db: PathBuf,

        #[arg(long, default_value_t = 50)]
        limit: usize,
    },

    /// Print the effective rule tables as JSON
    Rules {
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            input,
            date,
            db,
            rules,
            top,
            skip_stale,
        } => {
            let options = RunOptions {
                top_n: top,
                skip_out_of_order: skip_stale,
            };
            run_command(&input, date.as_deref(), &db, rules.as_deref(), &options)
        }
        Command::Summary { db, limit } => summary_command(&db, limit),
        Command::Rules { rules } => {
            let rules = load_rules(rules.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&rules)?);
            Ok(())
        }
    }
}

/// Console logging; RUST_LOG overrides the default `info` level
fn init_logging() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

fn load_rules(path: Option<&Path>) -> Result<ScoringRules> {
    match path {
        Some(path) => ScoringRules::from_file(path),
        None => Ok(ScoringRules::default()),
    }
}

fn open_store(db: &Path) -> Result<Connection> {
    let conn = Connection::open(db).with_context(|| format!("Failed to open database: {:?}", db))?;
    setup_database(&conn)?;
    Ok(conn)
}

fn run_command(
    input: &Path,
    date: Option<&str>,
    db: &Path,
    rules: Option<&Path>,
    options: &RunOptions,
) -> Result<()> {
    let run_date: NaiveDate = match date {
        Some(d) => parse_date(d).with_context(|| format!("Invalid --date '{}'", d))?,
        None => Local::now().date_naive(),
    };

    let rules = load_rules(rules)?;
    let records = load_disclosures(input)?;
    println!("📂 Loaded {} disclosures from {:?}", records.len(), input);

    let mut conn = open_store(db)?;
    let run = run_daily(&mut conn, &records, run_date, &rules, options)?;

    print_run(&run);
    Ok(())
}

fn print_run(run: &DailyRun) {
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📅 Run {} ({})", run.run_date, run.run_id);

    for group in Group::ALL {
        let rows = run.report.group(group);
        println!("\n{} ({} shown)", group, rows.len());
        for record in rows {
            print_annotated(record);
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "✓ New: {}  Updated: {}  Refreshed: {}  Carried: {}  (summary: {} entities)",
        run.stats.created, run.stats.updated, run.stats.refreshed, run.stats.carried, run.summary_size
    );

    if !run.rejected.is_empty() {
        println!("⚠️  Rejected {} records:", run.rejected.len());
        for err in &run.rejected {
            println!("   {}", err);
        }
    }
    if !run.skipped.is_empty() {
        let ids: Vec<&str> = run.skipped.iter().map(|id| id.as_str()).collect();
        println!("⚠️  Skipped (already seen later): {}", ids.join(", "));
    }
    if !run.replay_of.is_empty() {
        println!("ℹ️  Same batch was already merged for this date");
    }
}

fn print_annotated(record: &AnnotatedRecord) {
    println!(
        "  {:>3} {:<2} {:<8} {:<16} {:<12} {:<10} {}",
        record.composite_score,
        record.tier.symbol(),
        record.record.entity_id,
        record.record.entity_name,
        record.sector,
        record.industry,
        record.record.title,
    );
}

fn summary_command(db: &Path, limit: usize) -> Result<()> {
    let conn = open_store(db)?;
    let summary = load_summary(&conn)?;

    let mut rows: Vec<_> = summary.values().collect();
    rows.sort_by(|a, b| {
        b.appearance_count
            .cmp(&a.appearance_count)
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });

    println!("📊 {} entities in summary", rows.len());
    for row in rows.into_iter().take(limit) {
        println!(
            "  {:<8} {:<16} {:<12} {:<8} x{:<3} {} → {}",
            row.entity_id,
            row.entity_name,
            row.sector,
            row.tier,
            row.appearance_count,
            row.first_seen,
            row.last_seen,
        );
    }

    Ok(())
}
