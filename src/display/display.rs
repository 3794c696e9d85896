//! Text rendering of the timer state. Nothing here mutates the timer.

use crate::pomodoro::history::SessionHistory;
use crate::pomodoro::pomodoro::Phase;
use crate::pomodoro::timer::PhaseTimer;

const GAUGE_WIDTH: usize = 20;
const CUP_WIDTH: usize = 10;
pub const CUP_HEIGHT: usize = 8;

/// Read-only copy of what the display needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub phase: Phase,
    pub time_left: u64,
    pub fill_ratio: f64,
    pub completed_work_cycles: u32,
    pub is_running: bool,
}

impl Snapshot {
    pub fn of(timer: &PhaseTimer) -> Self {
        Self {
            phase: timer.current_phase(),
            time_left: timer.time_left(),
            fill_ratio: timer.fill_ratio(),
            completed_work_cycles: timer.completed_work_cycles(),
            is_running: timer.is_running(),
        }
    }
}

pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// "5-minute" for whole minutes, "90-second" otherwise.
pub fn format_length(secs: u64) -> String {
    if secs % 60 == 0 {
        format!("{}-minute", secs / 60)
    } else {
        format!("{}-second", secs)
    }
}

fn filled(ratio: f64, slots: usize) -> usize {
    ((ratio.clamp(0.0, 1.0) * slots as f64).round() as usize).min(slots)
}

pub fn render_gauge(ratio: f64, width: usize) -> String {
    let n = filled(ratio, width);
    format!("[{}{}]", "#".repeat(n), ".".repeat(width - n))
}

/// The cup, top row first, filling from the bottom as the phase elapses.
pub fn render_cup(ratio: f64, height: usize) -> Vec<String> {
    let n = filled(ratio, height);
    let mut rows: Vec<String> = (0..height)
        .map(|row| {
            let fill = if row >= height - n { "~" } else { " " };
            format!("|{}|", fill.repeat(CUP_WIDTH))
        })
        .collect();
    rows.push(format!("\\{}/", "_".repeat(CUP_WIDTH)));
    rows
}

pub fn render_status(snapshot: &Snapshot) -> String {
    format!(
        "{} {:<11} {} {} {:>3}%  sessions: {}  {}",
        snapshot.phase.emoji(),
        snapshot.phase.as_str(),
        format_clock(snapshot.time_left),
        render_gauge(snapshot.fill_ratio, GAUGE_WIDTH),
        (snapshot.fill_ratio * 100.0).round() as u32,
        snapshot.completed_work_cycles,
        if snapshot.is_running { "▶" } else { "⏸" }
    )
}

pub fn render_history(history: &SessionHistory) -> Vec<String> {
    let mut lines = vec![format!(
        "Session History (last {}):",
        history.capacity()
    )];
    if history.is_empty() {
        lines.push("  (no completed sessions yet)".to_string());
    }
    lines.extend(history.iter().map(|entry| format!("  {}", entry.label())));
    lines
}
