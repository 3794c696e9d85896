pub const POMODORO_WORK_MINUTES: u64 = 25; // Default Pomodoro work time
pub const POMODORO_SHORT_BREAK_MINUTES: u64 = 5; // Default short break time
pub const POMODORO_LONG_BREAK_MINUTES: u64 = 15; // Default long break time
pub const CYCLES_BEFORE_LONG_BREAK: u32 = 4;
pub const SESSION_HISTORY_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub(crate) fn as_str(&self) -> &str {
        match self {
            Phase::Work => "WORK",
            Phase::ShortBreak => "SHORT BREAK",
            Phase::LongBreak => "LONG BREAK",
        }
    }

    pub(crate) fn emoji(&self) -> &str {
        match self {
            Phase::Work => "💼",
            Phase::ShortBreak => "☕",
            Phase::LongBreak => "🛋",
        }
    }

    pub fn is_break(&self) -> bool {
        !matches!(self, Phase::Work)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
