use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use runkcal_core::config::{parse_time_zone, DataPaths};
use runkcal_core::normalize::{date_key, parse_date_text};
use runkcal_core::tracker::{AppData, RunSaved};
use runkcal_core::*;
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "runkcal")]
#[command(about = "Running calorie tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// IANA time zone for date-keys (overrides config)
    #[arg(long, global = true)]
    tz: Option<String>,

    /// Treat this RFC 3339 instant as the current time (for testing)
    #[arg(long, global = true, value_parser = parse_instant, hide = true)]
    now: Option<DateTime<Utc>>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's runs and the monthly report (default)
    Status,

    /// Log a run
    Log {
        /// Distance in km
        #[arg(long)]
        distance: String,

        /// Duration in minutes
        #[arg(long)]
        duration: Option<String>,

        /// Body weight in kg (defaults to the stored default weight)
        #[arg(long)]
        weight: Option<String>,

        /// Date of the run, e.g. 2024-06-01 (defaults to now)
        #[arg(long)]
        date: Option<String>,

        /// Free-text note
        #[arg(long)]
        memo: Option<String>,
    },

    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },

    /// Show the summary for one day
    Day {
        /// Date, e.g. 2024-06-01
        date: String,
    },

    /// Estimate calories for a run without logging it
    Estimate {
        /// Distance in km
        #[arg(long)]
        distance: f64,

        /// Duration in minutes
        #[arg(long, default_value_t = 0.0)]
        duration: f64,

        /// Body weight in kg
        #[arg(long)]
        weight: f64,
    },

    /// Roll up the record log into the CSV archive
    Rollup {
        /// Clean up processed log files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Show current settings (default)
    Show,

    /// Change settings; fields not given keep their current value
    Set {
        /// Default body weight in kg
        #[arg(long)]
        weight: Option<String>,

        /// Daily intake target in kcal
        #[arg(long)]
        target: Option<String>,

        /// male / female (m, f, 男性, 女性)
        #[arg(long)]
        gender: Option<String>,

        /// Age in years
        #[arg(long)]
        age: Option<String>,

        /// Monthly goal in kg: negative to lose, positive to gain
        #[arg(long, allow_hyphen_values = true)]
        goal: Option<String>,

        /// low / medium / high (低い, 標準, 高い)
        #[arg(long)]
        activity: Option<String>,
    },
}

fn parse_instant(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {}", e))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    runkcal_core::logging::init(cli.verbose);

    let config = Config::load()?;
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());
    let tz = match &cli.tz {
        Some(name) => parse_time_zone(name)?,
        None => config.time_zone()?,
    };
    let now = cli.now.unwrap_or_else(Utc::now);
    let out = Output { json: cli.json };
    tracing::debug!("Using data dir {:?}, time zone {}", data_dir, tz);

    let mut tracker = FileTracker::open(&data_dir, tz);

    match cli.command.unwrap_or(Commands::Status) {
        Commands::Status => cmd_status(&mut tracker, now, out),
        Commands::Log {
            distance,
            duration,
            weight,
            date,
            memo,
        } => {
            let payload = RunPayload {
                date: DateInput::from(date),
                distance_km: Value::String(distance),
                duration_min: duration.map(Value::String).unwrap_or(Value::Null),
                weight_kg: weight.map(Value::String).unwrap_or(Value::Null),
                memo,
            };
            cmd_log(&mut tracker, payload, now, out)
        }
        Commands::Settings { action } => match action.unwrap_or(SettingsAction::Show) {
            SettingsAction::Show => {
                let settings = tracker.init()?;
                out.settings(&settings)
            }
            SettingsAction::Set {
                weight,
                target,
                gender,
                age,
                goal,
                activity,
            } => {
                let current = tracker.init()?;
                let mut update = SettingsUpdate::from(&current);
                let fields = [
                    (&mut update.default_weight_kg, weight),
                    (&mut update.daily_target_kcal, target),
                    (&mut update.gender, gender),
                    (&mut update.age, age),
                    (&mut update.monthly_goal_kg, goal),
                    (&mut update.activity_level, activity),
                ];
                for (field, value) in fields {
                    if let Some(value) = value {
                        *field = Value::String(value);
                    }
                }

                let saved = tracker.save_settings(&update, now)?;
                if out.json {
                    return print_json(&saved);
                }
                println!("✓ Settings saved");
                out.settings(&saved.settings)?;
                println!();
                out.monthly(&saved.monthly_summary)
            }
        },
        Commands::Day { date } => {
            let key = parse_date_text(&date, tz)
                .map(|instant| date_key(instant, tz))
                .ok_or_else(|| Error::Other(format!("Invalid date: {}", date)))?;
            let summary = tracker.daily_summary(&key)?;
            out.daily(&summary)
        }
        Commands::Estimate {
            distance,
            duration,
            weight,
        } => {
            let kcal = estimate_calories(distance, duration, weight);
            if out.json {
                return print_json(&serde_json::json!({
                    "calories": kcal.round() as i64,
                    "estimate": kcal,
                }));
            }
            if kcal == 0.0 {
                println!("Not enough input to estimate (distance and weight are required)");
            } else {
                println!("Estimated burn: {} kcal", kcal.round() as i64);
            }
            Ok(())
        }
        Commands::Rollup { cleanup } => cmd_rollup(data_dir, tz, cleanup),
    }
}

fn cmd_status(tracker: &mut FileTracker, now: DateTime<Utc>, out: Output) -> Result<()> {
    let data: AppData = tracker.app_data(now)?;
    if out.json {
        return print_json(&data);
    }

    out.daily(&data.today_summary)?;
    println!();
    out.monthly(&data.monthly_summary)
}

fn cmd_log(
    tracker: &mut FileTracker,
    mut payload: RunPayload,
    now: DateTime<Utc>,
    out: Output,
) -> Result<()> {
    // Weight is prefilled from settings the way a form would be
    if payload.weight_kg.is_null() {
        let settings = tracker.init()?;
        payload.weight_kg = Value::from(settings.default_weight_kg);
    }

    let saved: RunSaved = tracker.save_run_record(payload, now)?;
    if out.json {
        return print_json(&saved);
    }

    if saved.calories == 0 {
        println!("✓ Run logged (not enough input to estimate calories)");
    } else {
        println!("✓ Run logged: {} kcal", saved.calories);
    }
    out.daily(&saved.summary)?;
    println!();
    out.monthly(&saved.monthly_summary)
}

fn cmd_rollup(data_dir: PathBuf, tz: Tz, cleanup: bool) -> Result<()> {
    let paths = DataPaths::under(&data_dir);

    if !paths.live_log.exists() {
        println!("No record log found - nothing to roll up.");
        return Ok(());
    }

    let count = runkcal_core::archive::rollup_to_csv(&paths.live_log, &paths.archive, tz)?;

    if count == 0 {
        println!("Record log is empty - nothing to roll up.");
    } else {
        println!("✓ Rolled up {} records to CSV", count);
        println!("  CSV: {}", paths.archive.display());
    }

    if cleanup {
        let cleaned = runkcal_core::archive::cleanup_processed_logs(&paths.log_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed log files", cleaned);
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Clone, Copy)]
struct Output {
    json: bool,
}

impl Output {
    fn daily(&self, summary: &DailySummary) -> Result<()> {
        if self.json {
            return print_json(summary);
        }
        let runs = if summary.count == 1 { "run" } else { "runs" };
        println!(
            "{}: {} {}, {} kcal",
            summary.date, summary.count, runs, summary.total_calories
        );
        Ok(())
    }

    fn monthly(&self, m: &MonthlySummary) -> Result<()> {
        if self.json {
            return print_json(m);
        }
        println!("Month {} (day {} of {})", m.month_key, m.days_elapsed, m.days_in_month);
        println!("  Activity       {} (x{})", m.activity_level, m.activity_factor);
        println!(
            "  BMR            {} kcal/day, {} kcal so far",
            m.bmr_per_day, m.bmr_total
        );
        println!(
            "  Daily energy   {} kcal/day, {} kcal so far",
            m.energy_per_day, m.energy_total
        );
        println!("  Running        {} kcal", m.running_total);
        println!("  Total burn     {} kcal", m.total_burn);
        println!("  Target intake  {} kcal", m.target_intake_total);
        println!("  Balance        {} kcal", m.deficit);
        println!(
            "  Goal           {} kg ({}), {} kcal",
            m.goal_kg, m.goal_type, m.target_amount
        );
        println!(
            "  Progress       {} / {} kcal, {} remaining",
            m.progress_amount, m.target_amount, m.remaining
        );
        println!("  Target burn    {} kcal", m.target_total_burn);
        Ok(())
    }

    fn settings(&self, s: &Settings) -> Result<()> {
        if self.json {
            return print_json(s);
        }
        println!("Settings");
        println!("  Default weight {} kg", s.default_weight_kg);
        println!("  Daily target   {} kcal", s.daily_target_kcal);
        println!("  Gender         {}", s.gender);
        println!("  Age            {}", s.age);
        println!("  Monthly goal   {} kg", s.monthly_goal_kg);
        println!("  Activity       {}", s.activity_level);
        Ok(())
    }
}
