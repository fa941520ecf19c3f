//! habitgrid-stats - relative-performance analytics for logged habits
//!
//! Prints the dashboard overview, a goal's duration percentiles, or streaks.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use habitgrid_core::analytics::{IntensityLevel, Period, StreakScope};
use habitgrid_core::format::{format_days, format_minutes};
use habitgrid_core::{Config, Database, StatsService};

#[derive(Parser)]
#[command(name = "habitgrid-stats")]
#[command(about = "Show habit analytics: overview, percentiles and streaks")]
#[command(version)]
struct Args {
    /// Output format: text (default) or json
    #[arg(short, long, default_value = "text", global = true)]
    format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Active goals, completed records this month and the current streak
    Overview {
        /// Let the streak end yesterday if today is not logged yet
        #[arg(long)]
        grace: bool,
    },

    /// p25/p50/p75 of a goal's completed session durations
    Percentiles {
        /// Goal id, name, or id prefix
        #[arg(short, long)]
        goal: String,

        /// 1month, 3months, 6months or 1year (defaults to config)
        #[arg(short, long)]
        period: Option<Period>,
    },

    /// Current and longest streak for one goal or all goals
    Streak {
        /// Goal id, name, or id prefix; all goals if omitted
        #[arg(short, long)]
        goal: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();

    let config = Config::load().context("failed to load configuration")?;

    let _log_guard =
        habitgrid_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let db_path = Config::database_path();
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    let today = Local::now().date_naive();
    let mut service = StatsService::new(&db, config.user.id.as_str(), today);
    let json = args.format == "json";
    tracing::debug!(format = %args.format, %today, "Running habitgrid-stats");

    match args.command {
        Command::Overview { grace } => {
            let overview = service.overview(grace || config.analytics.grace_day)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&overview)?);
            } else {
                println!("Overview ({})", today.format("%B %Y"));
                println!("  Active goals:        {}", overview.total_goals);
                println!("  Completed this month: {}", overview.monthly_records);
                println!(
                    "  Current streak:      {}",
                    format_days(overview.current_streak)
                );
            }
        }
        Command::Percentiles { goal, period } => {
            let goal = service.resolve_goal(&goal)?;
            let period = period.unwrap_or(config.analytics.default_period);
            let set = service.percentiles(&goal.id, period)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&set)?);
            } else {
                println!("{} - last {}", goal.name, period.label());
                if set.is_empty() {
                    println!("  No completed sessions in this period.");
                } else {
                    println!("  p25: {}", format_minutes(set.p25));
                    println!("  p50: {}", format_minutes(set.p50));
                    println!("  p75: {}", format_minutes(set.p75));
                    println!("  based on {} session(s)", set.total_records);
                    println!();
                    for level in IntensityLevel::ALL.iter().skip(1) {
                        println!("  {} {}", level.shade(), level.description());
                    }
                }
            }
        }
        Command::Streak { goal } => {
            let goal = goal.map(|key| service.resolve_goal(&key)).transpose()?;
            let scope = match &goal {
                Some(g) => StreakScope::Goal(&g.id),
                None => StreakScope::All,
            };
            let stats = service.streaks(scope)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                let title = goal.as_ref().map(|g| g.name.as_str()).unwrap_or("All goals");
                println!("{}", title);
                println!("  Current streak: {}", format_days(stats.current_streak));
                match (stats.longest_start, stats.longest_end) {
                    (Some(start), Some(end)) => println!(
                        "  Longest streak: {} ({} to {})",
                        format_days(stats.longest_streak),
                        start,
                        end
                    ),
                    _ => println!("  Longest streak: {}", format_days(stats.longest_streak)),
                }
                println!("  Active days:    {}", stats.active_days);
            }
        }
    }

    Ok(())
}
