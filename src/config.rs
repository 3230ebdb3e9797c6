//! Application-wide constants and runtime policy configuration.
//!
//! All identity, timing and protocol constants live here so they can be
//! tuned in one place.  The behavioural choices the peripheral supports
//! (how writes and reads behave, what happens when the display fails to
//! come up) are collected in [`PeripheralConfig`].

use crate::error::Error;
use crate::gatt::uuid::Uuid;

// Identity

/// Advertised GAP device name.
pub const DEVICE_NAME: &str = "BLESim";

/// Test service UUID.
///
/// The `gatt_service` attributes in `ble/server.rs` must use the same
/// literals as the four UUIDs below.
pub const SERVICE_UUID: Uuid = Uuid::parse("5a1d0000-8f3c-4b8e-9b2a-6c1f0e7d4a10");

/// Write characteristic UUID (write).
pub const WRITE_CHAR_UUID: Uuid = Uuid::parse("5a1d0001-8f3c-4b8e-9b2a-6c1f0e7d4a10");

/// Read characteristic UUID (read).
pub const READ_CHAR_UUID: Uuid = Uuid::parse("5a1d0002-8f3c-4b8e-9b2a-6c1f0e7d4a10");

/// Notify characteristic UUID (notify, with CCCD).
pub const NOTIFY_CHAR_UUID: Uuid = Uuid::parse("5a1d0003-8f3c-4b8e-9b2a-6c1f0e7d4a10");

// GATT

/// ATT MTU configured in the SoftDevice.
pub const ATT_MTU: u16 = 67;

/// Largest characteristic value: ATT MTU minus the 3-byte ATT header.
pub const VALUE_CAPACITY: usize = ATT_MTU as usize - 3;

// Timing (milliseconds)

/// Period of the tick notification while connected.
pub const NOTIFY_INTERVAL_MS: u64 = 2000;

/// Wait after a disconnect before advertising again.
pub const RECONNECT_GRACE_MS: u64 = 500;

/// Cadence of the cooperative main loop.
pub const LOOP_TICK_MS: u64 = 50;

/// Depth of the event and command queues between the radio task and the
/// main loop.
pub const BLE_QUEUE_DEPTH: usize = 8;

// BLE GAP parameters

/// Advertising interval (in 0.625 ms units). 160 = 100 ms.
pub const ADV_INTERVAL: u32 = 160;

/// Preferred connection interval range (in 1.25 ms units). 24-48 = 30-60 ms.
pub const BLE_CONN_INTERVAL_MIN: u16 = 24;
pub const BLE_CONN_INTERVAL_MAX: u16 = 48;

/// BLE slave latency (number of connection events the peripheral can skip).
pub const BLE_SLAVE_LATENCY: u16 = 0;

/// BLE supervision timeout (in 10 ms units). 400 = 4 s.
pub const BLE_SUP_TIMEOUT: u16 = 400;

// Display (SSD1306 128x64, FONT_6X10)

/// Characters that fit on one display row.
pub const DISPLAY_COLUMNS: usize = 21;

/// Body rows below the status header.
pub const DISPLAY_BODY_LINES: usize = 3;

/// 7-bit I²C address of the OLED.
pub const DISPLAY_I2C_ADDR: u8 = 0x3C;

/// What happens to the Read characteristic when the central writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WritePolicy {
    /// Mirror the written bytes into the Read characteristic.
    #[default]
    Echo,
    /// Push the written bytes out on the Notify characteristic at once.
    ImmediateNotify,
}

/// How the Read characteristic answers a read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadPolicy {
    /// Return the last value explicitly set.
    #[default]
    Static,
    /// Bump the shared counter on every access and return it as text.
    Computed,
}

/// Reaction to a display or transport that fails to initialise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitFailurePolicy {
    /// Stop: the failure is fatal.
    Halt,
    /// Log it and run without the failed collaborator.
    #[default]
    Continue,
}

impl InitFailurePolicy {
    /// Apply the policy to an initialisation failure.
    ///
    /// `Halt` hands the error back for the caller to treat as fatal;
    /// `Continue` logs it and swallows it.
    pub fn resolve(self, err: Error) -> Result<(), Error> {
        match self {
            InitFailurePolicy::Halt => {
                error!("init failed ({:?}), halting", err);
                Err(err)
            }
            InitFailurePolicy::Continue => {
                warn!("init failed ({:?}), continuing without it", err);
                Ok(())
            }
        }
    }
}

/// Runtime configuration of the peripheral core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeripheralConfig {
    pub write_policy: WritePolicy,
    pub read_policy: ReadPolicy,
    pub notify_interval_ms: u64,
    pub reconnect_grace_ms: u64,
    pub display_init: InitFailurePolicy,
}

impl Default for PeripheralConfig {
    fn default() -> Self {
        Self {
            write_policy: WritePolicy::default(),
            read_policy: ReadPolicy::default(),
            notify_interval_ms: NOTIFY_INTERVAL_MS,
            reconnect_grace_ms: RECONNECT_GRACE_MS,
            display_init: InitFailurePolicy::default(),
        }
    }
}

impl PeripheralConfig {
    pub fn with_write_policy(mut self, policy: WritePolicy) -> Self {
        self.write_policy = policy;
        self
    }

    pub fn with_read_policy(mut self, policy: ReadPolicy) -> Self {
        self.read_policy = policy;
        self
    }

    pub fn with_notify_interval_ms(mut self, ms: u64) -> Self {
        self.notify_interval_ms = ms;
        self
    }

    pub fn with_reconnect_grace_ms(mut self, ms: u64) -> Self {
        self.reconnect_grace_ms = ms;
        self
    }

    pub fn with_display_init(mut self, policy: InitFailurePolicy) -> Self {
        self.display_init = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let cfg = PeripheralConfig::default();
        assert_eq!(cfg.write_policy, WritePolicy::Echo);
        assert_eq!(cfg.read_policy, ReadPolicy::Static);
        assert_eq!(cfg.notify_interval_ms, NOTIFY_INTERVAL_MS);
        assert_eq!(cfg.reconnect_grace_ms, RECONNECT_GRACE_MS);
        assert_eq!(cfg.display_init, InitFailurePolicy::Continue);
    }

    #[test]
    fn value_capacity_tracks_mtu() {
        assert_eq!(VALUE_CAPACITY, 64);
    }

    #[test]
    fn halt_policy_surfaces_the_error() {
        assert_eq!(
            InitFailurePolicy::Halt.resolve(Error::Display),
            Err(Error::Display)
        );
    }

    #[test]
    fn continue_policy_swallows_the_error() {
        assert_eq!(InitFailurePolicy::Continue.resolve(Error::Display), Ok(()));
    }

    #[test]
    fn characteristic_uuids_share_the_service_base() {
        let svc = SERVICE_UUID.as_bytes();
        for uuid in [WRITE_CHAR_UUID, READ_CHAR_UUID, NOTIFY_CHAR_UUID] {
            assert_eq!(uuid.as_bytes()[4..], svc[4..]);
            assert_ne!(uuid, SERVICE_UUID);
        }
    }
}
