use chrono::{DateTime, Local};
use std::io::{BufRead, Write};
use std::ops::ControlFlow;
use tokio::sync::mpsc;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use super::command::{Command, HELP};
use crate::alert::alert::Alert;
use crate::config::config::{ConfigError, Settings, validate_durations};
use crate::display::display::{
    CUP_HEIGHT, Snapshot, format_length, render_cup, render_history, render_status,
};
use crate::pomodoro::history::{SessionEntry, SessionHistory};
use crate::pomodoro::pomodoro::Phase;
use crate::pomodoro::timer::{Durations, PhaseTimer, TimerError};

const TICK_INTERVAL_MS: u64 = 1000;
const ALERT_TITLE: &str = "Brew Timer - Pomodoro Alert";

/// Payload of the timer's completion hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseEvent {
    pub phase: Phase,
    pub completed_work_cycles: u32,
}

pub type EventSender = mpsc::UnboundedSender<PhaseEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<PhaseEvent>;
pub type CommandSender = mpsc::UnboundedSender<Command>;
pub type CommandReceiver = mpsc::UnboundedReceiver<Command>;

pub fn create_command_channel() -> (CommandSender, CommandReceiver) {
    mpsc::unbounded_channel()
}

/// Read control lines from stdin on a plain thread and forward parsed
/// commands. Bad lines are reported and skipped.
pub fn spawn_command_reader(tx: CommandSender) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Command>() {
                Ok(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    println!("{}", e);
                    debug!(line = %line, error = %e, "Rejected command");
                }
            }
        }
        debug!("Command reader finished");
    })
}

/// Owns the timer and everything layered on top of it: the one-second
/// clock, auto-advance, history, alerts and the terminal display.
pub struct Driver {
    timer: PhaseTimer,
    events: EventReceiver,
    history: SessionHistory,
    alert: Box<dyn Alert>,
    settings: Settings,
    started_at: DateTime<Local>,
}

impl Driver {
    pub fn new(settings: Settings, alert: Box<dyn Alert>) -> Result<Self, TimerError> {
        let mut timer = settings.build_timer()?;
        let (tx, events): (EventSender, EventReceiver) = mpsc::unbounded_channel();
        timer.set_on_phase_complete(move |phase, completed_work_cycles| {
            // Receiver is owned by the same driver as the timer.
            let _ = tx.send(PhaseEvent {
                phase,
                completed_work_cycles,
            });
        });

        Ok(Self {
            timer,
            events,
            history: SessionHistory::with_capacity(settings.history_size),
            alert,
            settings,
            started_at: Local::now(),
        })
    }

    pub fn timer(&self) -> &PhaseTimer {
        &self.timer
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    /// Run until `quit` or Ctrl-C.
    pub async fn run(&mut self, mut commands: CommandReceiver) {
        let mut ticker = interval(Duration::from_millis(TICK_INTERVAL_MS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of an interval fires immediately.
        ticker.tick().await;

        self.print_view();
        let mut commands_open = true;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.handle_tick(),
                command = commands.recv(), if commands_open => match command {
                    Some(command) => {
                        if self.apply(command).is_break() {
                            break;
                        }
                    }
                    None => {
                        debug!("Command channel closed");
                        commands_open = false;
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted");
                    break;
                }
            }
        }

        println!("\n{}", self.summary());
    }

    /// One second elapsed.
    pub fn handle_tick(&mut self) {
        if !self.timer.is_running() {
            return;
        }
        if let Some(t) = self.timer.tick() {
            debug!(
                from = %t.from,
                to = %t.to,
                cycles = t.completed_work_cycles,
                "Transition"
            );
        }
        while let Ok(event) = self.events.try_recv() {
            self.on_phase_complete(event);
        }
        self.print_status();
    }

    fn on_phase_complete(&mut self, event: PhaseEvent) {
        let durations = self.timer.durations();
        let message = if event.phase.is_break() {
            self.history.push(SessionEntry {
                finished_at: Local::now(),
                cycle: event.completed_work_cycles,
                duration_secs: durations.work,
            });
            format!(
                "Work session complete! Time for a {} {}.",
                format_length(durations.of(event.phase)),
                event.phase.as_str().to_lowercase()
            )
        } else {
            format!(
                "Break is over! Starting {} work session.",
                format_length(durations.work)
            )
        };

        info!(
            phase = %event.phase,
            cycles = event.completed_work_cycles,
            "{}", message
        );
        println!("\n🔔 {}", message);
        if event.phase.is_break() {
            self.print_history();
        }

        if let Err(e) = self.alert.notify(ALERT_TITLE, &message) {
            warn!(error = %e, "Failed to send alert");
        }

        if self.settings.auto_advance {
            self.timer.start();
        } else {
            self.timer.pause();
            println!("Paused. Type 'start' when you are ready.");
        }
    }

    /// Apply one user command. `Break` means the user asked to quit.
    pub fn apply(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Start => {
                self.timer.start();
                info!(phase = %self.timer.current_phase(), "Timer started");
            }
            Command::Pause => {
                self.timer.pause();
                info!(time_left = self.timer.time_left(), "Timer paused");
            }
            Command::Reset => {
                self.timer.reset();
                info!("Timer reset");
            }
            Command::Restart => {
                self.timer.restart_phase();
                info!(phase = %self.timer.current_phase(), "Phase restarted");
            }
            Command::Configure {
                work,
                short_break,
                long_break,
                cycles,
            } => {
                if let Err(e) = self.configure(work, short_break, long_break, cycles) {
                    warn!(error = %e, "Rejected configuration");
                    println!("Rejected: {}", e);
                    return ControlFlow::Continue(());
                }
            }
            Command::View => {
                self.print_view();
                return ControlFlow::Continue(());
            }
            Command::History => {
                self.print_history();
                return ControlFlow::Continue(());
            }
            Command::Help => {
                println!("{}", HELP);
                return ControlFlow::Continue(());
            }
            Command::Quit => return ControlFlow::Break(()),
        }
        self.print_status();
        ControlFlow::Continue(())
    }

    /// Validate, apply and restart from a fresh Work phase. Omitted cycles
    /// keep the current setting. Nothing changes on error.
    fn configure(
        &mut self,
        work: u64,
        short_break: u64,
        long_break: u64,
        cycles: Option<u32>,
    ) -> Result<(), ConfigError> {
        let durations = Durations {
            work,
            short_break,
            long_break,
        };
        let cycles = cycles.unwrap_or(self.settings.cycles_before_long_break);
        validate_durations(&durations, cycles)?;

        self.timer
            .configure(work, short_break, long_break, Some(cycles))?;
        self.timer.reset();
        self.settings.durations = durations;
        self.settings.cycles_before_long_break = cycles;

        info!(work, short_break, long_break, cycles, "Durations updated");
        Ok(())
    }

    pub fn summary(&self) -> String {
        let minutes = (Local::now() - self.started_at).num_minutes();
        let mut lines = vec![
            "--- Session Statistics ---".to_string(),
            format!("Session duration: {} minutes", minutes),
            format!(
                "Work sessions completed: {}",
                self.timer.completed_work_cycles()
            ),
        ];
        lines.extend(render_history(&self.history));
        lines.push("--------------------------".to_string());
        lines.join("\n")
    }

    fn print_status(&self) {
        let mut out = std::io::stdout().lock();
        let _ = write!(out, "\r\x1b[2K{}", render_status(&Snapshot::of(&self.timer)));
        let _ = out.flush();
    }

    fn print_view(&self) {
        println!();
        for row in render_cup(self.timer.fill_ratio(), CUP_HEIGHT) {
            println!("  {}", row);
        }
        println!("{}", render_status(&Snapshot::of(&self.timer)));
    }

    fn print_history(&self) {
        println!("{}", render_history(&self.history).join("\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::alert::{AlertError, AlertKind};
    use crate::config::config::MAX_WORK_SECS;
    use std::sync::{Arc, Mutex};

    struct RecordingAlert(Arc<Mutex<Vec<String>>>);

    impl Alert for RecordingAlert {
        fn notify(&self, _title: &str, body: &str) -> Result<(), AlertError> {
            self.0.lock().unwrap().push(body.to_string());
            Ok(())
        }
    }

    struct FailingAlert;

    impl Alert for FailingAlert {
        fn notify(&self, _title: &str, _body: &str) -> Result<(), AlertError> {
            Err(AlertError::Io(std::io::Error::other("no speaker")))
        }
    }

    fn settings(auto_advance: bool, history_size: usize) -> Settings {
        Settings {
            durations: Durations {
                work: 3,
                short_break: 1,
                long_break: 2,
            },
            cycles_before_long_break: 2,
            auto_advance,
            alert: AlertKind::None,
            history_size,
        }
    }

    fn driver(auto_advance: bool) -> (Driver, Arc<Mutex<Vec<String>>>) {
        let alerts = Arc::new(Mutex::new(Vec::new()));
        let alert = Box::new(RecordingAlert(Arc::clone(&alerts)));
        let driver = Driver::new(settings(auto_advance, 5), alert).unwrap();
        (driver, alerts)
    }

    fn tick_n(driver: &mut Driver, n: usize) {
        for _ in 0..n {
            driver.handle_tick();
        }
    }

    #[test]
    fn test_auto_advance_runs_through_phases() {
        let (mut driver, alerts) = driver(true);
        let _ = driver.apply(Command::Start);

        tick_n(&mut driver, 4);
        assert_eq!(driver.timer().current_phase(), Phase::ShortBreak);
        assert!(driver.timer().is_running());
        assert_eq!(driver.history().len(), 1);
        assert_eq!(
            alerts.lock().unwrap().as_slice(),
            ["Work session complete! Time for a 1-second short break."]
        );

        tick_n(&mut driver, 2);
        assert_eq!(driver.timer().current_phase(), Phase::Work);
        assert_eq!(driver.history().len(), 1);
        assert!(alerts.lock().unwrap()[1].starts_with("Break is over!"));

        tick_n(&mut driver, 4);
        assert_eq!(driver.timer().current_phase(), Phase::LongBreak);
        assert_eq!(driver.history().len(), 2);
        assert_eq!(alerts.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_without_auto_advance_pauses_after_completion() {
        let (mut driver, alerts) = driver(false);
        let _ = driver.apply(Command::Start);

        tick_n(&mut driver, 4);
        assert_eq!(driver.timer().current_phase(), Phase::ShortBreak);
        assert!(!driver.timer().is_running());

        tick_n(&mut driver, 10);
        assert_eq!(driver.timer().time_left(), 1);
        assert_eq!(alerts.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_history_is_bounded() {
        let alert = Box::new(RecordingAlert(Arc::default()));
        let mut driver = Driver::new(settings(true, 2), alert).unwrap();
        let _ = driver.apply(Command::Start);
        // work(4) + short(2) + work(4) + long(3) + work(4)
        tick_n(&mut driver, 17);
        assert_eq!(driver.timer().completed_work_cycles(), 3);
        assert_eq!(driver.history().len(), 2);
        let cycles: Vec<u32> = driver.history().iter().map(|e| e.cycle).collect();
        assert_eq!(cycles, vec![2, 3]);
    }

    #[test]
    fn test_failing_alert_does_not_stop_timer() {
        let mut driver = Driver::new(settings(true, 5), Box::new(FailingAlert)).unwrap();
        let _ = driver.apply(Command::Start);
        tick_n(&mut driver, 4);
        assert_eq!(driver.timer().current_phase(), Phase::ShortBreak);
        assert!(driver.timer().is_running());
    }

    #[test]
    fn test_configure_command_applies_and_resets() {
        let (mut driver, _) = driver(true);
        let _ = driver.apply(Command::Start);
        tick_n(&mut driver, 5);

        let flow = driver.apply(Command::Configure {
            work: 600,
            short_break: 120,
            long_break: 300,
            cycles: None,
        });
        assert!(flow.is_continue());
        let timer = driver.timer();
        assert_eq!(timer.current_phase(), Phase::Work);
        assert_eq!(timer.time_left(), 600);
        assert_eq!(timer.completed_work_cycles(), 0);
        assert_eq!(timer.cycles_before_long_break(), 2);
        assert!(!timer.is_running());
    }

    #[test]
    fn test_out_of_range_configure_changes_nothing() {
        let (mut driver, _) = driver(true);
        let _ = driver.apply(Command::Start);
        tick_n(&mut driver, 2);

        let _ = driver.apply(Command::Configure {
            work: MAX_WORK_SECS + 1,
            short_break: 60,
            long_break: 60,
            cycles: Some(3),
        });
        let timer = driver.timer();
        assert_eq!(timer.durations().work, 3);
        assert_eq!(timer.time_left(), 1);
        assert_eq!(timer.cycles_before_long_break(), 2);
        assert!(timer.is_running());
    }

    #[test]
    fn test_restart_and_reset_commands() {
        let (mut driver, _) = driver(true);
        let _ = driver.apply(Command::Start);
        tick_n(&mut driver, 4);
        assert_eq!(driver.timer().current_phase(), Phase::ShortBreak);

        let _ = driver.apply(Command::Restart);
        assert_eq!(driver.timer().current_phase(), Phase::ShortBreak);
        assert_eq!(driver.timer().completed_work_cycles(), 1);

        let _ = driver.apply(Command::Reset);
        assert_eq!(driver.timer().current_phase(), Phase::Work);
        assert_eq!(driver.timer().completed_work_cycles(), 0);
    }

    #[test]
    fn test_quit_breaks() {
        let (mut driver, _) = driver(true);
        assert!(driver.apply(Command::Quit).is_break());
        assert!(driver.apply(Command::Help).is_continue());
        assert!(driver.summary().contains("Work sessions completed: 0"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ticks_once_per_second_until_quit() {
        let (mut driver, _) = driver(true);
        let (tx, rx) = create_command_channel();
        tx.send(Command::Start).unwrap();

        let quitter = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(4_500)).await;
            tx.send(Command::Quit).unwrap();
        });

        driver.run(rx).await;
        quitter.await.unwrap();

        assert_eq!(driver.timer().current_phase(), Phase::ShortBreak);
        assert_eq!(driver.history().len(), 1);
    }
}
