//! Unified error type for blesim.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (behind the `defmt` feature) for efficient
//! on-target logging.

use core::fmt;

/// Top-level error type used across the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // BLE
    /// The radio stack (or the queue in front of it) rejected a request.
    Ble(BleError),

    /// A transmission was requested while no central is connected.
    NotConnected,

    // GATT
    /// Payload exceeds the characteristic value capacity.
    ValueTooLong,

    // UI / Display
    /// I²C transaction to the display failed.
    Display,

    // Generic
    /// Buffer too small for the requested operation.
    BufferOverflow,
}

/// Subset of BLE errors we propagate (keeps the enum `Copy`-friendly).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BleError {
    /// The notification was not accepted for transmission.
    NotifyFailed,
    /// Updating the attribute table failed.
    SetValueFailed,
    /// The command queue towards the BLE task is full.
    QueueFull,
}

// Convenience conversions

impl From<BleError> for Error {
    fn from(e: BleError) -> Self {
        Error::Ble(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Ble(e) => write!(f, "ble: {}", e),
            Error::NotConnected => f.write_str("not connected"),
            Error::ValueTooLong => f.write_str("value too long"),
            Error::Display => f.write_str("display error"),
            Error::BufferOverflow => f.write_str("buffer overflow"),
        }
    }
}

impl fmt::Display for BleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BleError::NotifyFailed => f.write_str("notify failed"),
            BleError::SetValueFailed => f.write_str("set value failed"),
            BleError::QueueFull => f.write_str("queue full"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;

    #[test]
    fn ble_error_converts_into_error() {
        let e: Error = BleError::QueueFull.into();
        assert_eq!(e, Error::Ble(BleError::QueueFull));
    }

    #[test]
    fn display_is_human_readable() {
        let mut s: heapless::String<32> = heapless::String::new();
        write!(s, "{}", Error::Ble(BleError::QueueFull)).unwrap();
        assert_eq!(s.as_str(), "ble: queue full");

        s.clear();
        write!(s, "{}", Error::ValueTooLong).unwrap();
        assert_eq!(s.as_str(), "value too long");
    }
}
