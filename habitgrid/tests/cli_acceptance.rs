use chrono::{Duration, Local, NaiveDate};
use habitgrid_core::{Database, RecordFilter};
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
        }
    }

    fn db_path(&self) -> PathBuf {
        self.xdg_data.join("habitgrid/data.db")
    }

    fn write_config(&self, contents: &str) {
        let dir = self.xdg_config.join("habitgrid");
        fs::create_dir_all(&dir).expect("failed to create config dir");
        fs::write(dir.join("config.toml"), contents).expect("failed to write config");
    }
}

fn run_bin(env: &CliTestEnv, bin_name: &str, args: &[&str]) -> Output {
    let bin_path = match bin_name {
        "habitgrid" => PathBuf::from(assert_cmd::cargo::cargo_bin!("habitgrid")),
        "habitgrid-stats" => PathBuf::from(assert_cmd::cargo::cargo_bin!("habitgrid-stats")),
        "habitgrid-calendar" => PathBuf::from(assert_cmd::cargo::cargo_bin!("habitgrid-calendar")),
        _ => panic!("unsupported binary in test harness: {bin_name}"),
    };

    let mut command = Command::new(bin_path);

    command
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("failed to execute {bin_name}: {e}"))
}

fn assert_success(bin_name: &str, args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "{bin_name} {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

fn run_ok(env: &CliTestEnv, bin_name: &str, args: &[&str]) -> String {
    let output = run_bin(env, bin_name, args);
    assert_success(bin_name, args, &output);
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn run_json(env: &CliTestEnv, bin_name: &str, args: &[&str]) -> serde_json::Value {
    let stdout = run_ok(env, bin_name, args);
    serde_json::from_str(&stdout)
        .unwrap_or_else(|e| panic!("{bin_name} did not print JSON ({e}):\n{stdout}"))
}

fn days_ago(today: NaiveDate, n: i64) -> String {
    (today - Duration::days(n)).format("%Y-%m-%d").to_string()
}

/// Logs the last `durations.len()` days for `goal`, oldest first, ending today.
fn log_days(env: &CliTestEnv, goal: &str, today: NaiveDate, durations: &[u32]) {
    for (i, minutes) in durations.iter().enumerate() {
        let date = days_ago(today, (durations.len() - 1 - i) as i64);
        let minutes = minutes.to_string();
        run_ok(
            env,
            "habitgrid",
            &["log", goal, "--date", &date, "--minutes", &minutes],
        );
    }
}

#[test]
fn goals_and_records_round_trip_through_db() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, "habitgrid", &["goal", "add", "Piano", "-d", "scales"]);
    assert!(stdout.contains("Created goal Piano"));

    run_ok(
        &env,
        "habitgrid",
        &["log", "piano", "--date", "2024-03-01", "--minutes", "45"],
    );
    run_ok(&env, "habitgrid", &["log", "Piano", "--date", "20240302", "--skipped"]);

    let db_path = env.db_path();
    assert!(
        db_path.exists(),
        "database file should exist at {}",
        db_path.display()
    );

    let db = Database::open(&db_path).expect("failed to open db");
    db.migrate().expect("failed to migrate db");
    let records = db
        .list_records("local", &RecordFilter::default())
        .expect("failed to list records");
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].duration_minutes, 45);

    let listing = run_ok(&env, "habitgrid", &["records", "--goal", "Piano"]);
    assert!(listing.contains("2024-03-01"));
    assert!(listing.contains("45m"));
    assert!(listing.contains("skipped"));
}

#[test]
fn invalid_input_is_rejected() {
    let env = CliTestEnv::new();
    run_ok(&env, "habitgrid", &["goal", "add", "Piano"]);

    let negative = run_bin(&env, "habitgrid", &["log", "Piano", "--minutes", "-5"]);
    assert!(!negative.status.success());
    assert!(String::from_utf8_lossy(&negative.stderr).contains("cannot be negative"));

    let bad_date = run_bin(&env, "habitgrid", &["log", "Piano", "--date", "2024-13-40"]);
    assert!(!bad_date.status.success());

    let bad_period = run_bin(
        &env,
        "habitgrid-stats",
        &["percentiles", "--goal", "Piano", "--period", "2weeks"],
    );
    assert!(!bad_period.status.success());
}

#[test]
fn stats_report_percentiles_streaks_and_overview() {
    let env = CliTestEnv::new();
    let today = Local::now().date_naive();

    run_ok(&env, "habitgrid", &["goal", "add", "Piano"]);
    log_days(&env, "Piano", today, &[10, 20, 30, 40]);

    let set = run_json(
        &env,
        "habitgrid-stats",
        &["--format", "json", "percentiles", "--goal", "Piano", "--period", "1month"],
    );
    assert_eq!(set["p25"], 20);
    assert_eq!(set["p50"], 30);
    assert_eq!(set["p75"], 40);
    assert_eq!(set["totalRecords"], 4);

    let streak = run_json(
        &env,
        "habitgrid-stats",
        &["--format", "json", "streak", "--goal", "Piano"],
    );
    assert_eq!(streak["currentStreak"], 4);
    assert_eq!(streak["longestStreak"], 4);

    let overview = run_json(&env, "habitgrid-stats", &["--format", "json", "overview"]);
    assert_eq!(overview["totalGoals"], 1);
    assert_eq!(overview["currentStreak"], 4);
    assert!(overview["monthlyRecords"].as_u64().unwrap() >= 1);

    let text = run_ok(&env, "habitgrid-stats", &["percentiles", "--goal", "Piano"]);
    assert!(text.contains("p50: 30m"));
}

#[test]
fn unknown_goal_is_reported() {
    let env = CliTestEnv::new();
    let output = run_bin(&env, "habitgrid-stats", &["percentiles", "--goal", "missing"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("goal not found"));
}

#[test]
fn grace_day_from_config_applies_to_overview() {
    let env = CliTestEnv::new();
    env.write_config("[analytics]\ngrace_day = true\n");
    let today = Local::now().date_naive();

    run_ok(&env, "habitgrid", &["goal", "add", "Run"]);
    let yesterday = days_ago(today, 1);
    run_ok(
        &env,
        "habitgrid",
        &["log", "Run", "--date", &yesterday, "--minutes", "20"],
    );

    let overview = run_json(&env, "habitgrid-stats", &["--format", "json", "overview"]);
    assert_eq!(overview["currentStreak"], 1);

    let strict = run_json(
        &env,
        "habitgrid-stats",
        &["--format", "json", "streak"],
    );
    assert_eq!(strict["currentStreak"], 0);
}

#[test]
fn calendar_covers_whole_year() {
    let env = CliTestEnv::new();
    run_ok(&env, "habitgrid", &["goal", "add", "Piano"]);
    run_ok(
        &env,
        "habitgrid",
        &["log", "Piano", "--date", "2024-02-29", "--minutes", "30"],
    );

    let days = run_json(
        &env,
        "habitgrid-calendar",
        &["--year", "2024", "--format", "json"],
    );
    let days = days.as_array().expect("calendar JSON should be an array");
    assert_eq!(days.len(), 366);
    assert_eq!(days[0]["date"], "2024-01-01");
    assert_eq!(days[365]["date"], "2024-12-31");

    let leap_day = &days[59];
    assert_eq!(leap_day["date"], "2024-02-29");
    assert_eq!(leap_day["level"], 1);
    assert_eq!(leap_day["record"]["duration_minutes"], 30);

    let common = run_json(
        &env,
        "habitgrid-calendar",
        &["--year", "2023", "--format", "json"],
    );
    assert_eq!(common.as_array().map(Vec::len), Some(365));

    let text = run_ok(&env, "habitgrid-calendar", &["--year", "2024", "--goal", "Piano"]);
    assert!(text.contains("Piano - 2024"));
    assert!(text.contains("top 25%"));
}

#[test]
fn logs_rotate_into_dated_files() {
    let env = CliTestEnv::new();
    run_ok(&env, "habitgrid", &["goal", "add", "Piano"]);

    let log_dir = env.xdg_state.join("habitgrid");
    let names: Vec<String> = fs::read_dir(&log_dir)
        .expect("log dir should exist")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();

    assert!(
        names.iter().any(|n| n.starts_with("habitgrid.log.")
            && NaiveDate::parse_from_str(&n["habitgrid.log.".len()..], "%Y-%m-%d").is_ok()),
        "expected a dated log file, found {names:?}"
    );
    assert!(!names.iter().any(|n| n == "habitgrid.log"));
}
