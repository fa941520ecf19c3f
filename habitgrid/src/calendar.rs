//! habitgrid-calendar - year-at-a-glance contribution grid
//!
//! Renders one column per week and one row per weekday, shaded by intensity.

use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use clap::Parser;
use habitgrid_core::analytics::{CalendarDay, IntensityLevel, YearGrid};
use habitgrid_core::format::format_minutes;
use habitgrid_core::{Config, Database, StatsService};

#[derive(Parser)]
#[command(name = "habitgrid-calendar")]
#[command(about = "Show a year of habit activity as a grid")]
#[command(version)]
struct Args {
    /// Calendar year, defaults to the current year
    #[arg(short, long)]
    year: Option<i32>,

    /// Goal id, name, or id prefix; all goals merged if omitted
    #[arg(short, long)]
    goal: Option<String>,

    /// Output format: text (default) or json
    #[arg(short, long, default_value = "text")]
    format: String,
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
    let year = args.year.unwrap_or_else(|| today.year());
    let mut service = StatsService::new(&db, config.user.id.as_str(), today);

    let goal = args
        .goal
        .as_deref()
        .map(|key| service.resolve_goal(key))
        .transpose()?;
    let title = goal
        .as_ref()
        .map(|g| g.name.clone())
        .unwrap_or_else(|| "All goals".to_string());

    let grid = service.calendar(year, goal.as_ref().map(|g| g.id.as_str()))?;
    tracing::debug!(year, goal = %title, active_days = grid.active_days(), "Rendering calendar");

    if args.format == "json" {
        let days: Vec<CalendarDay<'_>> = grid.days().collect();
        println!("{}", serde_json::to_string_pretty(&days)?);
        return Ok(());
    }

    println!("{} - {}", title, year);
    println!();
    print_grid(&grid);
    println!();
    println!(
        "{} active day(s), {} total",
        grid.active_days(),
        format_minutes(u32::try_from(grid.total_minutes()).unwrap_or(u32::MAX))
    );
    println!();
    for level in IntensityLevel::ALL {
        println!("  {} {}", level.shade(), level.description());
    }

    Ok(())
}

/// Seven rows (Sunday first), one column per week.
fn print_grid(grid: &YearGrid<'_>) {
    const WEEKDAYS: [&str; 7] = ["Sun", "   ", "Tue", "   ", "Thu", "   ", "Sat"];

    let days: Vec<CalendarDay<'_>> = grid.days().collect();
    let Some(first) = days.first() else {
        return;
    };
    let lead = first.date.weekday().num_days_from_sunday() as usize;
    let weeks = (lead + days.len() + 6) / 7;

    println!("    {}", month_header(first.date, lead, weeks));

    for (row, label) in WEEKDAYS.iter().enumerate() {
        let mut line = String::with_capacity(weeks + 4);
        line.push_str(label);
        line.push(' ');
        for week in 0..weeks {
            let cell = (week * 7 + row)
                .checked_sub(lead)
                .and_then(|index| days.get(index));
            line.push(cell.map(|d| d.level.shade()).unwrap_or(' '));
        }
        println!("{}", line.trim_end());
    }
}

/// Month abbreviations placed over the week each month starts in.
fn month_header(jan1: NaiveDate, lead: usize, weeks: usize) -> String {
    let mut header = vec![' '; weeks + 3];
    for month in 1..=12 {
        let Some(first) = NaiveDate::from_ymd_opt(jan1.year(), month, 1) else {
            continue;
        };
        let week = (lead + first.ordinal0() as usize) / 7;
        let name = first.format("%b").to_string();
        for (offset, ch) in name.chars().enumerate() {
            if let Some(slot) = header.get_mut(week + offset) {
                *slot = ch;
            }
        }
    }
    header.into_iter().collect::<String>().trim_end().to_string()
}
