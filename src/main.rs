use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use tracing::info;

mod alert;
mod config;
mod display;
mod driver;
mod logger;
mod pomodoro;

use alert::alert::{AlertKind, build_alert};
use config::config::Overrides;
use config::duration::parse_duration;
use display::display::format_clock;
use driver::command::{Command, HELP};
use driver::driver::{Driver, create_command_channel, spawn_command_reader};

#[derive(Parser, Debug)]
#[command(author, version, about = "☕ brew_timer - Pomodoro timer with a filling coffee cup")]
struct Args {
    /// Work duration (e.g. "25m", "1h", "90s"; a bare number means minutes)
    #[arg(short, long, value_parser = parse_duration)]
    work: Option<u64>,

    /// Short break duration
    #[arg(short, long, value_parser = parse_duration)]
    short_break: Option<u64>,

    /// Long break duration
    #[arg(short, long, value_parser = parse_duration)]
    long_break: Option<u64>,

    /// Work sessions before a long break
    #[arg(short, long)]
    cycles: Option<u32>,

    /// Config file (defaults to <config dir>/brew_timer/config.toml)
    #[arg(long, env = "BREW_TIMER_CONFIG")]
    config: Option<PathBuf>,

    /// How to alert at the end of a phase
    #[arg(long, value_enum)]
    alert: Option<AlertKind>,

    /// Pause after each phase instead of rolling into the next one
    #[arg(long)]
    no_auto_advance: bool,

    /// Start the countdown immediately
    #[arg(long)]
    start: bool,

    /// Print the resolved settings as JSON and exit
    #[arg(long)]
    print_config: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Log file (defaults to <data dir>/brew_timer/brew_timer.log)
    #[arg(long, env = "BREW_TIMER_LOG_FILE")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            work: self.work,
            short_break: self.short_break,
            long_break: self.long_break,
            cycles_before_long_break: self.cycles,
            alert: self.alert,
            no_auto_advance: self.no_auto_advance,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let file = config::config::load_file(args.config.as_deref())
        .context("Failed to load configuration")?;
    let settings =
        config::config::resolve(file, &args.overrides()).context("Invalid configuration")?;

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    let log_path = logger::init_logging(args.verbose, args.log_file.clone())?;

    println!("☕ Brew Timer - Pomodoro");
    println!("======================================================");
    println!(
        "Settings: {} work / {} short break / {} long break, long break every {} sessions",
        format_clock(settings.durations.work),
        format_clock(settings.durations.short_break),
        format_clock(settings.durations.long_break),
        settings.cycles_before_long_break
    );
    if let Some(ref path) = log_path {
        println!("Logging to: {}", path.display());
    }
    println!("{}\n", HELP);

    info!(?settings, "Starting");

    let mut driver = Driver::new(settings.clone(), build_alert(settings.alert))
        .context("Failed to build timer")?;
    if args.start {
        let _ = driver.apply(Command::Start);
    }

    let (command_tx, command_rx) = create_command_channel();
    spawn_command_reader(command_tx);

    driver.run(command_rx).await;
    Ok(())
}
