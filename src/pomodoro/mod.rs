pub mod history;
pub mod pomodoro;
pub mod timer;
