//! Recording doubles for the display and radio seams, used by the unit
//! and integration tests to drive the core on the host.

use crate::config::DISPLAY_BODY_LINES;
use crate::error::{BleError, Error};
use crate::gatt::characteristic::{CharacteristicId, Value};
use crate::peripheral::Transport;
use crate::ui::status::{text_line, DisplaySink, Line};

/// How many transport calls of each kind are retained.
pub const HISTORY: usize = 32;

/// Keeps the most recently shown screen.
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    pub screen: heapless::Vec<Line, { DISPLAY_BODY_LINES + 1 }>,
    pub refreshes: u32,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self) -> Option<&str> {
        self.screen.first().map(|l| l.as_str())
    }

    /// `true` if any line on the current screen contains `text`.
    pub fn contains(&self, text: &str) -> bool {
        self.screen.iter().any(|l| l.contains(text))
    }
}

impl DisplaySink for RecordingDisplay {
    fn show(&mut self, lines: &[&str]) {
        self.screen.clear();
        for line in lines {
            let _ = self.screen.push(text_line(line));
        }
        self.refreshes += 1;
    }
}

/// Records every request; advertising and notifications can be made
/// to fail.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    /// Accepted advertising requests.
    pub advertise_requests: u32,
    /// Refuse this many upcoming advertising requests with a full queue.
    pub fail_advertising: u32,
    pub values: heapless::Vec<(CharacteristicId, Value), HISTORY>,
    pub notifications: heapless::Vec<Value, HISTORY>,
    pub reject_notifications: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notified payloads as text, oldest first.
    pub fn notified_text(&self) -> impl Iterator<Item = &str> {
        self.notifications
            .iter()
            .map(|v| core::str::from_utf8(v).unwrap_or("<binary>"))
    }
}

fn record<T, const N: usize>(log: &mut heapless::Vec<T, N>, item: T) {
    if log.is_full() {
        log.remove(0);
    }
    let _ = log.push(item);
}

impl Transport for RecordingTransport {
    fn start_advertising(&mut self) -> Result<(), Error> {
        if self.fail_advertising > 0 {
            self.fail_advertising -= 1;
            return Err(BleError::QueueFull.into());
        }
        self.advertise_requests += 1;
        Ok(())
    }

    fn set_value(&mut self, id: CharacteristicId, value: &[u8]) -> Result<(), Error> {
        let value = Value::from_slice(value).map_err(|_| Error::ValueTooLong)?;
        record(&mut self.values, (id, value));
        Ok(())
    }

    fn notify(&mut self, value: &[u8]) -> Result<(), Error> {
        if self.reject_notifications {
            return Err(BleError::NotifyFailed.into());
        }
        let value = Value::from_slice(value).map_err(|_| Error::ValueTooLong)?;
        record(&mut self.notifications, value);
        Ok(())
    }
}
