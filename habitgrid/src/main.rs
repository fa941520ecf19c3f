//! habitgrid - track daily habits from the command line
//!
//! Manages goals and their daily records. Analytics live in
//! `habitgrid-stats` and `habitgrid-calendar`.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use habitgrid_core::format::format_minutes;
use habitgrid_core::validation::{parse_date, parse_duration_minutes};
use habitgrid_core::{
    Config, Database, Goal, GoalInput, GoalUpdate, Record, RecordFilter, RecordInput,
    RecordStatus, RecordUpdate, StatsService,
};

#[derive(Parser)]
#[command(name = "habitgrid")]
#[command(about = "Track daily habits and how much time you put into them")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage goals
    #[command(subcommand)]
    Goal(GoalCommand),

    /// Log a day for a goal (replaces any existing record for that day)
    Log {
        /// Goal id, name, or id prefix
        goal: String,

        /// Day to log (YYYY-MM-DD or YYYYMMDD), defaults to today
        #[arg(short, long)]
        date: Option<String>,

        /// Minutes spent
        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        minutes: i64,

        /// Mark the day as skipped instead of completed
        #[arg(long, conflicts_with = "minutes")]
        skipped: bool,

        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List records, newest first
    Records {
        /// Only records for this goal
        #[arg(short, long)]
        goal: Option<String>,

        /// Only records on this day
        #[arg(short, long)]
        date: Option<String>,

        /// Only records on or after this day
        #[arg(long)]
        since: Option<String>,

        /// Only records on or before this day
        #[arg(long)]
        until: Option<String>,

        /// Output format: text (default) or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Change or remove a single record
    #[command(subcommand)]
    Record(RecordCommand),
}

#[derive(Subcommand)]
enum GoalCommand {
    /// Create a goal
    Add {
        name: String,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        color: Option<String>,
    },

    /// List goals
    List {
        /// Include archived goals
        #[arg(short, long)]
        all: bool,

        /// Output format: text (default) or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show one goal
    Show { goal: String },

    /// Edit a goal
    Edit {
        goal: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,

        /// Remove the description
        #[arg(long)]
        clear_description: bool,

        #[arg(long)]
        color: Option<String>,

        /// Hide the goal from listings and the overview
        #[arg(long, conflicts_with = "unarchive")]
        archive: bool,

        #[arg(long)]
        unarchive: bool,
    },

    /// Delete a goal and all of its records
    Rm { goal: String },
}

#[derive(Subcommand)]
enum RecordCommand {
    /// Edit a record
    Edit {
        id: String,

        #[arg(short, long, allow_negative_numbers = true)]
        minutes: Option<i64>,

        /// COMPLETED or SKIPPED
        #[arg(short, long)]
        status: Option<RecordStatus>,

        #[arg(short, long, conflicts_with = "clear_notes")]
        notes: Option<String>,

        #[arg(long)]
        clear_notes: bool,
    },

    /// Delete a record
    Rm { id: String },
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

    match args.command {
        Command::Goal(cmd) => run_goal(&db, &mut service, cmd),
        Command::Log {
            goal,
            date,
            minutes,
            skipped,
            notes,
        } => {
            let goal = service.resolve_goal(&goal)?;
            let date = match date {
                Some(d) => parse_date(&d)?,
                None => today,
            };
            let mut input = if skipped {
                RecordInput::skipped(&goal.id, date)
            } else {
                RecordInput::completed(&goal.id, date, parse_duration_minutes(minutes)?)
            };
            input.notes = notes;

            let record = service.log_record(&input)?;
            tracing::info!(
                goal_id = %goal.id,
                date = %record.date,
                status = %record.status,
                minutes = record.duration_minutes,
                "Logged record from CLI"
            );
            println!(
                "Logged {} for {} on {} ({})",
                describe(&record),
                goal.name,
                record.date,
                short_id(&record.id)
            );
            Ok(())
        }
        Command::Records {
            goal,
            date,
            since,
            until,
            format,
        } => {
            let goal_id = match goal {
                Some(key) => Some(service.resolve_goal(&key)?.id),
                None => None,
            };
            let filter = RecordFilter {
                goal_id,
                date: date.as_deref().map(parse_date).transpose()?,
                since: since.as_deref().map(parse_date).transpose()?,
                until: until.as_deref().map(parse_date).transpose()?,
            };
            let records = service.list_records(&filter)?;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&records)?);
                return Ok(());
            }

            if records.is_empty() {
                println!("No records found.");
                return Ok(());
            }
            let goals = service.goals()?.to_vec();
            for record in &records {
                let goal_name = goals
                    .iter()
                    .find(|g| g.id == record.goal_id)
                    .map(|g| g.name.as_str())
                    .unwrap_or("?");
                println!(
                    "{}  {}  {:<20} {:<10} {}",
                    short_id(&record.id),
                    record.date,
                    goal_name,
                    describe(record),
                    record.notes.as_deref().unwrap_or("")
                );
            }
            Ok(())
        }
        Command::Record(cmd) => run_record(&mut service, cmd),
    }
}

fn run_goal(db: &Database, service: &mut StatsService<'_>, cmd: GoalCommand) -> Result<()> {
    let user_id = service.user_id().to_string();

    match cmd {
        GoalCommand::Add {
            name,
            description,
            color,
        } => {
            let goal = db.create_goal(
                &user_id,
                &GoalInput {
                    name,
                    description,
                    color,
                },
            )?;
            println!("Created goal {} ({})", goal.name, short_id(&goal.id));
        }
        GoalCommand::List { all, format } => {
            let goals = db.list_goals(&user_id, all)?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&goals)?);
            } else if goals.is_empty() {
                println!("No goals yet. Create one with 'habitgrid goal add <name>'.");
            } else {
                for goal in &goals {
                    print_goal_line(goal);
                }
            }
        }
        GoalCommand::Show { goal } => {
            let goal = service.resolve_goal(&goal)?;
            print_goal_line(&goal);
            if let Some(description) = &goal.description {
                println!("  {}", description);
            }
            println!("  color:   {}", goal.color);
            println!("  created: {}", goal.created_at.format("%Y-%m-%d %H:%M"));
        }
        GoalCommand::Edit {
            goal,
            name,
            description,
            clear_description,
            color,
            archive,
            unarchive,
        } => {
            let goal = service.resolve_goal(&goal)?;
            let update = GoalUpdate {
                name,
                description: if clear_description {
                    Some(None)
                } else {
                    description.map(Some)
                },
                color,
                is_active: match (archive, unarchive) {
                    (true, _) => Some(false),
                    (_, true) => Some(true),
                    _ => None,
                },
            };
            if update.is_empty() {
                anyhow::bail!("nothing to change; pass at least one option");
            }
            let updated = db
                .update_goal(&user_id, &goal.id, &update)?
                .ok_or_else(|| habitgrid_core::Error::GoalNotFound(goal.id.clone()))?;
            println!("Updated goal {}", updated.name);
        }
        GoalCommand::Rm { goal } => {
            let goal = service.resolve_goal(&goal)?;
            db.delete_goal(&user_id, &goal.id)?;
            println!("Deleted goal {} and its records", goal.name);
        }
    }
    Ok(())
}

fn run_record(service: &mut StatsService<'_>, cmd: RecordCommand) -> Result<()> {
    match cmd {
        RecordCommand::Edit {
            id,
            minutes,
            status,
            notes,
            clear_notes,
        } => {
            let id = resolve_record_id(service, &id)?;
            let update = RecordUpdate {
                status,
                duration_minutes: minutes.map(parse_duration_minutes).transpose()?,
                notes: if clear_notes { Some(None) } else { notes.map(Some) },
            };
            let record = service.update_record(&id, &update)?;
            println!("Updated record {} ({})", short_id(&record.id), describe(&record));
        }
        RecordCommand::Rm { id } => {
            let id = resolve_record_id(service, &id)?;
            let record = service.delete_record(&id)?;
            println!("Deleted record {} on {}", short_id(&record.id), record.date);
        }
    }
    Ok(())
}

/// Expand a unique id prefix to a full record id.
fn resolve_record_id(service: &mut StatsService<'_>, key: &str) -> Result<String> {
    let matches: Vec<&Record> = service
        .records()?
        .iter()
        .filter(|r| r.id.starts_with(key))
        .collect();
    match matches.as_slice() {
        [record] => Ok(record.id.clone()),
        [] => Err(habitgrid_core::Error::RecordNotFound(key.to_string()).into()),
        _ => anyhow::bail!("'{}' matches more than one record", key),
    }
}

fn print_goal_line(goal: &Goal) {
    let archived = if goal.is_active { "" } else { " (archived)" };
    println!("{}  {}{}", short_id(&goal.id), goal.name, archived);
}

fn describe(record: &Record) -> String {
    match record.status {
        RecordStatus::Completed => format_minutes(record.duration_minutes),
        RecordStatus::Skipped => "skipped".to_string(),
    }
}

fn short_id(id: &str) -> &str {
    &id[..8.min(id.len())]
}
