use bmi_core::metric::parse_positive;
use bmi_core::store::DATE_FORMAT;
use bmi_core::*;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

const CHART_WIDTH: usize = 40;

#[derive(Parser)]
#[command(name = "bmi")]
#[command(about = "Track body-mass-index measurements per user", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List known users (default)
    Users,

    /// Add a new user
    AddUser {
        /// Display name, unique and case-sensitive
        name: String,
    },

    /// Compute a BMI without saving it
    Compute {
        /// Weight in kilograms
        #[arg(long, value_parser = parse_positive)]
        weight: f64,

        /// Height in centimeters
        #[arg(long, value_parser = parse_positive)]
        height: f64,
    },

    /// Compute a BMI and save it for a user
    Record {
        #[arg(long)]
        user: String,

        /// Weight in kilograms
        #[arg(long, value_parser = parse_positive)]
        weight: f64,

        /// Height in centimeters
        #[arg(long, value_parser = parse_positive)]
        height: f64,
    },

    /// Show a user's measurements, newest first
    History {
        #[arg(long)]
        user: String,
    },

    /// Chart a user's BMI over time
    Trend {
        #[arg(long)]
        user: String,
    },
}

// ExitCode rather than `-> Result<()>` so errors print with Display, not Debug
fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        bmi_core::logging::init_with_level("debug");
    } else {
        bmi_core::logging::init();
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let data_dir = cli.data_dir;

    match cli.command {
        Some(Commands::Compute { weight, height }) => cmd_compute(weight, height),
        Some(Commands::AddUser { name }) => cmd_add_user(&open_store(data_dir)?, &name),
        Some(Commands::Record {
            user,
            weight,
            height,
        }) => cmd_record(&open_store(data_dir)?, user.trim(), weight, height),
        Some(Commands::History { user }) => cmd_history(&open_store(data_dir)?, user.trim()),
        Some(Commands::Trend { user }) => cmd_trend(&open_store(data_dir)?, user.trim()),
        Some(Commands::Users) | None => cmd_users(&open_store(data_dir)?),
    }
}

/// Load config and open the database it points at
fn open_store(data_dir: Option<PathBuf>) -> Result<RecordStore> {
    let mut config = Config::load()?;
    if let Some(data_dir) = data_dir {
        config.data.data_dir = data_dir;
    }
    tracing::debug!("Using database at {:?}", config.database_path());

    RecordStore::open(config.database_path())
}

fn cmd_users(store: &RecordStore) -> Result<()> {
    let users = store.list_users()?;
    if users.is_empty() {
        println!("No users yet. Add one with `bmi add-user <NAME>`.");
        return Ok(());
    }

    for user in users {
        match store.latest_measurement(&user.name)? {
            Some(latest) => println!(
                "{}: BMI {} ({}) on {}",
                user.name,
                latest.bmi,
                latest.category,
                latest.recorded_at.format(DATE_FORMAT)
            ),
            None => println!("{}: no measurements", user.name),
        }
    }
    Ok(())
}

fn cmd_add_user(store: &RecordStore, name: &str) -> Result<()> {
    let user = store.add_user(name.trim())?;
    println!("User '{}' added.", user.name);
    Ok(())
}

fn cmd_compute(weight: f64, height: f64) -> Result<()> {
    let reading = compute(weight, height)?;
    println!("BMI: {} ({})", reading.bmi(), reading.category());
    Ok(())
}

fn cmd_record(store: &RecordStore, user: &str, weight: f64, height: f64) -> Result<()> {
    let reading = compute(weight, height)?;
    let saved = store.record_measurement(user, &reading)?;

    println!("BMI: {} ({})", saved.bmi, saved.category);
    println!(
        "✓ Saved for {} at {}",
        user,
        saved.recorded_at.format(DATE_FORMAT)
    );
    Ok(())
}

fn cmd_history(store: &RecordStore, user: &str) -> Result<()> {
    let history = store.get_history(user)?;
    if history.is_empty() {
        println!("No history available.");
        return Ok(());
    }

    println!("History for {}:", user);
    for measurement in &history {
        println!("  {}", describe(measurement));
    }
    Ok(())
}

fn cmd_trend(store: &RecordStore, user: &str) -> Result<()> {
    let history = store.get_history(user)?;
    let Some(series) = TrendSeries::from_history(&history) else {
        println!("Not enough data for trends.");
        return Ok(());
    };

    display_trend(user, &series);
    Ok(())
}

fn display_trend(user: &str, series: &TrendSeries) {
    let min = series.min_bmi();
    let max = series.max_bmi();
    let span = max - min;

    println!("\nBMI Trend for {}", user);
    println!("─────────────────────────────────────────");
    for point in series.points() {
        let width = if span > 0.0 {
            1 + ((point.bmi - min) / span * (CHART_WIDTH - 1) as f64).round() as usize
        } else {
            CHART_WIDTH
        };
        println!(
            "  {} │{} {:.2}",
            point.at.format(DATE_FORMAT),
            "█".repeat(width),
            point.bmi
        );
    }
    println!("─────────────────────────────────────────");
    println!(
        "  First: {:.2}  Latest: {:.2}  Change: {:+.2}",
        series.first().bmi,
        series.latest().bmi,
        series.change()
    );
    println!("  Range: {:.2} - {:.2}", min, max);
}
