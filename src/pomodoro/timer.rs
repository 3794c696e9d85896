//! Phase state machine driving the work / break rotation.
//!
//! The timer is a plain state object. It never sleeps and never spawns; the
//! caller delivers one [`PhaseTimer::tick`] per elapsed second while running
//! and reads the accessors to refresh whatever display it owns.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};

use super::pomodoro::{
    CYCLES_BEFORE_LONG_BREAK, POMODORO_LONG_BREAK_MINUTES, POMODORO_SHORT_BREAK_MINUTES,
    POMODORO_WORK_MINUTES, Phase,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("invalid duration for {field}: {value} (must be greater than zero)")]
    InvalidDuration { field: &'static str, value: u64 },
}

/// Callback fired with the new phase and the updated work cycle count.
pub type PhaseCompleteHook = Box<dyn FnMut(Phase, u32) + Send>;

/// Configured phase lengths, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Durations {
    pub work: u64,
    pub short_break: u64,
    pub long_break: u64,
}

impl Durations {
    pub fn of(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Work => self.work,
            Phase::ShortBreak => self.short_break,
            Phase::LongBreak => self.long_break,
        }
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            work: POMODORO_WORK_MINUTES * 60,
            short_break: POMODORO_SHORT_BREAK_MINUTES * 60,
            long_break: POMODORO_LONG_BREAK_MINUTES * 60,
        }
    }
}

/// What a completing tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: Phase,
    pub to: Phase,
    pub completed_work_cycles: u32,
}

pub struct PhaseTimer {
    durations: Durations,
    cycles_before_long_break: u32,
    current_phase: Phase,
    time_left: u64,
    completed_work_cycles: u32,
    is_running: bool,
    on_phase_complete: Option<PhaseCompleteHook>,
}

impl PhaseTimer {
    pub fn new() -> Self {
        let durations = Durations::default();
        Self {
            durations,
            cycles_before_long_break: CYCLES_BEFORE_LONG_BREAK,
            current_phase: Phase::Work,
            time_left: durations.work,
            completed_work_cycles: 0,
            is_running: false,
            on_phase_complete: None,
        }
    }

    /// Build a timer with explicit durations (seconds), validated like
    /// [`PhaseTimer::configure`].
    pub fn with_durations(
        work: u64,
        short_break: u64,
        long_break: u64,
        cycles_before_long_break: Option<u32>,
    ) -> Result<Self, TimerError> {
        let mut timer = Self::new();
        timer.configure(work, short_break, long_break, cycles_before_long_break)?;
        timer.time_left = timer.durations.work;
        Ok(timer)
    }

    /// Replace the configured durations. Nothing is applied unless every
    /// value is valid. Phase and remaining time are kept; `time_left` is only
    /// clamped when the current phase became shorter than what is left.
    pub fn configure(
        &mut self,
        work: u64,
        short_break: u64,
        long_break: u64,
        cycles_before_long_break: Option<u32>,
    ) -> Result<(), TimerError> {
        let cycles = cycles_before_long_break.unwrap_or(CYCLES_BEFORE_LONG_BREAK);

        for (field, value) in [
            ("work", work),
            ("short_break", short_break),
            ("long_break", long_break),
            ("cycles_before_long_break", u64::from(cycles)),
        ] {
            if value == 0 {
                return Err(TimerError::InvalidDuration { field, value });
            }
        }

        self.durations = Durations {
            work,
            short_break,
            long_break,
        };
        self.cycles_before_long_break = cycles;
        self.time_left = self.time_left.min(self.duration_of(self.current_phase));

        debug!(work, short_break, long_break, cycles, "Timer durations configured");
        Ok(())
    }

    /// Register the completion observer. A later call replaces the earlier one.
    pub fn set_on_phase_complete<F>(&mut self, hook: F)
    where
        F: FnMut(Phase, u32) + Send + 'static,
    {
        self.on_phase_complete = Some(Box::new(hook));
    }

    pub fn start(&mut self) {
        self.is_running = true;
    }

    pub fn pause(&mut self) {
        self.is_running = false;
    }

    /// Back to a fresh Work phase with the cycle count discarded.
    pub fn reset(&mut self) {
        self.is_running = false;
        self.current_phase = Phase::Work;
        self.time_left = self.durations.work;
        self.completed_work_cycles = 0;
    }

    /// Rewind the current phase only; cycle progress is kept.
    pub fn restart_phase(&mut self) {
        self.is_running = false;
        self.time_left = self.duration_of(self.current_phase);
    }

    /// Advance the countdown by one second.
    ///
    /// A tick that finds `time_left` already at zero performs the phase
    /// transition instead of decrementing, so the boundary consumes one call.
    pub fn tick(&mut self) -> Option<PhaseTransition> {
        if !self.is_running {
            return None;
        }
        if self.time_left > 0 {
            self.time_left -= 1;
            trace!(time_left = self.time_left, phase = %self.current_phase, "tick");
            return None;
        }
        Some(self.complete_phase())
    }

    fn complete_phase(&mut self) -> PhaseTransition {
        let from = self.current_phase;
        self.current_phase = match from {
            Phase::Work => {
                self.completed_work_cycles += 1;
                if self.completed_work_cycles % self.cycles_before_long_break == 0 {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                }
            }
            Phase::ShortBreak | Phase::LongBreak => Phase::Work,
        };
        self.time_left = self.duration_of(self.current_phase);

        debug!(
            %from,
            to = %self.current_phase,
            cycles = self.completed_work_cycles,
            "Phase complete"
        );

        if let Some(hook) = self.on_phase_complete.as_mut() {
            hook(self.current_phase, self.completed_work_cycles);
        }

        PhaseTransition {
            from,
            to: self.current_phase,
            completed_work_cycles: self.completed_work_cycles,
        }
    }

    pub fn current_phase(&self) -> Phase {
        self.current_phase
    }

    pub fn time_left(&self) -> u64 {
        self.time_left
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn completed_work_cycles(&self) -> u32 {
        self.completed_work_cycles
    }

    pub fn cycles_before_long_break(&self) -> u32 {
        self.cycles_before_long_break
    }

    pub fn durations(&self) -> Durations {
        self.durations
    }

    pub fn duration_of(&self, phase: Phase) -> u64 {
        self.durations.of(phase)
    }

    /// Elapsed fraction of the current phase in `[0, 1]`.
    pub fn fill_ratio(&self) -> f64 {
        let total = self.duration_of(self.current_phase);
        if total == 0 {
            return 0.0;
        }
        (1.0 - self.time_left as f64 / total as f64).clamp(0.0, 1.0)
    }
}

impl Default for PhaseTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PhaseTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseTimer")
            .field("durations", &self.durations)
            .field("cycles_before_long_break", &self.cycles_before_long_break)
            .field("current_phase", &self.current_phase)
            .field("time_left", &self.time_left)
            .field("completed_work_cycles", &self.completed_work_cycles)
            .field("is_running", &self.is_running)
            .field("on_phase_complete", &self.on_phase_complete.is_some())
            .finish()
    }
}
