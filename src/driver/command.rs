use std::str::FromStr;
use thiserror::Error;

use crate::config::duration::parse_duration;

pub const HELP: &str = "\
Commands:
  s, start                      start or resume the countdown
  p, pause                      pause the countdown
  r, reset                      back to Work, session count cleared
  rp, restart                   restart the current phase only
  c, config WORK SHORT LONG [N] set durations (e.g. c 25m 5m 15m 4) and reset
  v, view                       draw the cup
  hist, history                 show completed sessions
  h, help                       show this help
  q, quit                       print a summary and exit";

/// A control line typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Reset,
    Restart,
    Configure {
        work: u64,
        short_break: u64,
        long_break: u64,
        cycles: Option<u32>,
    },
    View,
    History,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("invalid duration '{0}'")]
    InvalidDuration(String),
    #[error("invalid cycle count '{0}'")]
    InvalidCycles(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(CommandError::Empty)?.to_lowercase();
        let args: Vec<&str> = words.collect();

        let simple = |cmd: Command| {
            if args.is_empty() {
                Ok(cmd)
            } else {
                Err(CommandError::Usage("this command takes no arguments"))
            }
        };

        match name.as_str() {
            "s" | "start" => simple(Command::Start),
            "p" | "pause" => simple(Command::Pause),
            "r" | "reset" => simple(Command::Reset),
            "rp" | "restart" => simple(Command::Restart),
            "v" | "view" => simple(Command::View),
            "hist" | "history" => simple(Command::History),
            "h" | "help" | "?" => simple(Command::Help),
            "q" | "quit" | "exit" => simple(Command::Quit),
            "c" | "config" => parse_configure(&args),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn parse_configure(args: &[&str]) -> Result<Command, CommandError> {
    const USAGE: &str = "config WORK SHORT LONG [CYCLES]";
    if !(3..=4).contains(&args.len()) {
        return Err(CommandError::Usage(USAGE));
    }
    let duration =
        |s: &str| parse_duration(s).map_err(|_| CommandError::InvalidDuration(s.to_string()));

    let cycles = match args.get(3) {
        Some(raw) => Some(
            raw.parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| CommandError::InvalidCycles(raw.to_string()))?,
        ),
        None => None,
    };

    Ok(Command::Configure {
        work: duration(args[0])?,
        short_break: duration(args[1])?,
        long_break: duration(args[2])?,
        cycles,
    })
}
