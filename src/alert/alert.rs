use notify_rust::Notification;
use serde::{Deserialize, Serialize};
use std::io::Write;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("desktop notification failed: {0}")]
    Notification(#[from] notify_rust::error::Error),
    #[error("failed to write alert: {0}")]
    Io(#[from] std::io::Error),
}

/// Something that gets the user's attention when a phase ends.
pub trait Alert: Send + Sync {
    fn notify(&self, title: &str, body: &str) -> Result<(), AlertError>;
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    #[default]
    Desktop,
    Bell,
    None,
}

pub fn build_alert(kind: AlertKind) -> Box<dyn Alert> {
    match kind {
        AlertKind::Desktop => Box::new(DesktopAlert),
        AlertKind::Bell => Box::new(BellAlert),
        AlertKind::None => Box::new(SilentAlert),
    }
}

/// Desktop notification that stays until dismissed, followed by a bell.
pub struct DesktopAlert;

impl Alert for DesktopAlert {
    fn notify(&self, title: &str, body: &str) -> Result<(), AlertError> {
        Notification::new()
            .summary(title)
            .body(body)
            .timeout(0) // No auto-dismiss
            .show()?;
        ring_bell(&mut std::io::stdout())
    }
}

/// Terminal bell only; the driver already prints the message.
pub struct BellAlert;

impl Alert for BellAlert {
    fn notify(&self, _title: &str, _body: &str) -> Result<(), AlertError> {
        ring_bell(&mut std::io::stdout().lock())
    }
}

pub struct SilentAlert;

impl Alert for SilentAlert {
    fn notify(&self, _title: &str, _body: &str) -> Result<(), AlertError> {
        Ok(())
    }
}

fn ring_bell(out: &mut impl Write) -> Result<(), AlertError> {
    out.write_all(b"\x07")?;
    out.flush()?;
    Ok(())
}
