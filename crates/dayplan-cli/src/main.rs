//! Dayplan CLI - plan a day from a list of tasks.

mod config;
mod output;

use std::collections::BTreeSet;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveTime, TimeZone};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dayplan_companion::{
    derive_reminders, render_schedule, review_progress, ProgressReview, ReflectionGenerator,
    ReminderStore, RuleBasedReflector,
};
use dayplan_core::{BatchPolicy, DayplanConfig, Pipeline, PlanContext, SessionId, TaskId};

use config::{load_config, to_toml};
use output::{plan_records, write_json_lines, PlanReport, Record};

/// Dayplan - prioritize tasks and lay them out on a timeline
#[derive(Parser)]
#[command(name = "dayplan")]
#[command(about = "Prioritize tasks and build a daily schedule", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a schedule from a task list
    Plan {
        /// Task file (JSON or one task per line); stdin when omitted or "-"
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Day to plan (YYYY-MM-DD), today by default
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Start time (HH:MM), overrides the configured day start
        #[arg(long)]
        start: Option<String>,

        /// UTC offset such as +02:00, the local offset by default
        #[arg(long, allow_hyphen_values = true)]
        offset: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Also write schedule, reminders and summary files here
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Fail the whole batch if any task is invalid
        #[arg(long)]
        all_or_nothing: bool,

        /// Append a rule-based reflection on the plan
        #[arg(long)]
        reflect: bool,

        /// Personal daily work limit used by the reflection
        #[arg(long, default_value = "8")]
        max_hours: i64,
    },

    /// Review progress against a saved plan
    Review {
        /// Saved schedule file (schedule_<session>.json)
        #[arg(short, long)]
        plan: PathBuf,

        /// Completed task ids, comma separated
        #[arg(long, value_delimiter = ',')]
        completed: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Jsonl,
}

struct PlanArgs {
    input: Option<PathBuf>,
    date: Option<NaiveDate>,
    start: Option<String>,
    offset: Option<String>,
    format: OutputFormat,
    out_dir: Option<PathBuf>,
    all_or_nothing: bool,
    reflect: bool,
    max_hours: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the plan.
    let default_directive = if cli.verbose { "dayplan=debug" } else { "dayplan=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_directive.parse()?))
        .with_writer(io::stderr)
        .with_target(true)
        .init();

    let loaded = load_config(cli.config.as_deref())?;
    if let Some(path) = &loaded.path {
        info!(path = %path.display(), "Using config file");
    }

    match cli.command {
        Commands::Plan {
            input,
            date,
            start,
            offset,
            format,
            out_dir,
            all_or_nothing,
            reflect,
            max_hours,
        } => {
            let args = PlanArgs {
                input,
                date,
                start,
                offset,
                format,
                out_dir,
                all_or_nothing,
                reflect,
                max_hours,
            };
            plan(loaded.config, args).await?;
        }
        Commands::Review {
            plan,
            completed,
            format,
        } => {
            review(&plan, completed, format).await?;
        }
        Commands::Config => {
            print!("{}", to_toml(&loaded.config)?);
        }
    }

    Ok(())
}

async fn plan(config: DayplanConfig, args: PlanArgs) -> Result<()> {
    let raw = read_input(args.input.as_deref())?;

    let offset = match args.offset.as_deref() {
        Some(s) => parse_offset(s)?,
        None => *Local::now().offset(),
    };
    let now = Local::now().with_timezone(&offset);
    let date = args.date.unwrap_or_else(|| now.date_naive());
    let day_start = match args.start.as_deref() {
        Some(s) => start_on(date, s, offset)?,
        None => config.day_start_on(date, offset)?,
    };

    let policy = if args.all_or_nothing {
        BatchPolicy::AllOrNothing
    } else {
        BatchPolicy::PartialSuccess
    };
    let pipeline = Pipeline::new(config)?.with_policy(policy);
    let outcome = pipeline.plan_text(&raw, &PlanContext::new(day_start, now))?;

    let session = SessionId::generate();
    let reminders = derive_reminders(&outcome.schedule, &pipeline.config().reminders);
    let mut summary = render_schedule(&outcome, &reminders);

    let reflection = if args.reflect {
        Some(
            RuleBasedReflector::new(args.max_hours)
                .generate_reflection(&outcome.schedule, &outcome.ranked.breakdowns)
                .await?,
        )
    } else {
        None
    };
    if let Some(text) = &reflection {
        summary.push('\n');
        summary.push_str(text);
    }

    match args.format {
        OutputFormat::Text => print!("{}", summary),
        OutputFormat::Json => {
            let report = PlanReport {
                session_id: &session,
                summary: outcome.summary(),
                outcome: &outcome,
                reminders: &reminders,
                reflection: reflection.as_deref(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Jsonl => {
            write_json_lines(io::stdout().lock(), &plan_records(&session, &outcome, &reminders))?;
        }
    }

    if let Some(dir) = args.out_dir {
        let files = ReminderStore::new(&dir)
            .persist(&session, &outcome, &reminders, &summary)
            .await
            .with_context(|| format!("Failed to write plan files to {}", dir.display()))?;
        info!(
            session_id = %session,
            schedule = %files.schedule.display(),
            reminders = %files.reminders.display(),
            summary = %files.summary.display(),
            "Saved plan"
        );
    }

    Ok(())
}

async fn review(path: &Path, completed: Vec<String>, format: OutputFormat) -> Result<()> {
    let outcome = ReminderStore::load_plan(path)
        .await
        .with_context(|| format!("Failed to load plan {}", path.display()))?;

    let completed: BTreeSet<TaskId> = completed
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .map(TaskId::new)
        .collect();
    let review = review_progress(&outcome.schedule.tasks, &completed);

    match format {
        OutputFormat::Text => print_review(&review),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&review)?),
        OutputFormat::Jsonl => write_json_lines(io::stdout().lock(), &[Record::Review(&review)])?,
    }
    Ok(())
}

fn print_review(review: &ProgressReview) {
    println!("Progress review:");
    println!("  Planned:    {}", review.planned);
    println!("  Completed:  {}", review.completed.len());
    println!("  Rate:       {:.1}%", review.completion_rate);
    println!("  Status:     {}", review.status);
    println!(
        "  Replan:     {}",
        if review.replan_needed { "yes" } else { "no" }
    );

    if !review.incomplete.is_empty() {
        let open: Vec<&str> = review.incomplete.iter().map(TaskId::as_str).collect();
        println!("  Open:       {}", open.join(", "));
    }
    for reason in &review.reasons {
        println!("    - {}", reason);
    }
    for rec in &review.recommendations {
        println!("  * {}", rec);
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => std::fs::read_to_string(p)
            .with_context(|| format!("Failed to read task file {}", p.display())),
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read tasks from stdin")?;
            Ok(buf)
        }
    }
}

fn start_on(date: NaiveDate, start: &str, offset: FixedOffset) -> Result<DateTime<FixedOffset>> {
    let time = NaiveTime::parse_from_str(start.trim(), "%H:%M")
        .with_context(|| format!("Invalid start time '{}', expected HH:MM", start))?;
    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .with_context(|| format!("Start time '{}' does not exist on {}", start, date))
}

/// Parse `Z`, `UTC`, `+HH:MM`, `-HH:MM` or `+HH`.
fn parse_offset(s: &str) -> Result<FixedOffset> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).context("Invalid offset");
    }

    let (sign, rest) = if let Some(rest) = s.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = s.strip_prefix('-') {
        (-1, rest)
    } else {
        bail!("Invalid offset '{}', expected +HH:MM or -HH:MM", s);
    };
    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    let hours: i32 = hours
        .parse()
        .with_context(|| format!("Invalid offset hours in '{}'", s))?;
    let minutes: i32 = minutes
        .parse()
        .with_context(|| format!("Invalid offset minutes in '{}'", s))?;
    if !(0..60).contains(&minutes) {
        bail!("Invalid offset minutes in '{}'", s);
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .with_context(|| format!("Offset out of range: '{}'", s))
}
