//! Host-testable core of blesim.
//!
//! Everything here is hardware-independent: the connection state machine,
//! the characteristic store, the notification scheduler and the status
//! screen composition.  The embedded binary (`src/main.rs`, feature
//! `embedded`) wires these to the SoftDevice and the SSD1306 through the
//! [`peripheral::Transport`] and [`ui::status::DisplaySink`] seams.
//!
//! Usage: `cargo test` on the host, `cargo run --release --features
//! embedded` on an nRF52840 with probe-rs.

#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to later modules.
mod fmt;

pub mod config;
pub mod connection;
pub mod error;
pub mod peripheral;
pub mod scheduler;
pub mod testing;

pub mod gatt {
    pub mod characteristic;
    pub mod store;
    pub mod uuid;
}

pub mod ble {
    pub mod adv;
}

pub mod ui {
    pub mod status;
}

pub use config::PeripheralConfig;
pub use connection::{ConnectionManager, ConnectionState};
pub use error::{BleError, Error};
pub use peripheral::{EventHandler, Peripheral, PeripheralEvent, Transport};
pub use scheduler::NotificationScheduler;

// ═══════════════════════════════════════════════════════════════════════════
// Cross-module tests
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NOTIFY_INTERVAL_MS, RECONNECT_GRACE_MS, SERVICE_UUID};
    use crate::testing::{RecordingDisplay, RecordingTransport};

    fn started() -> Peripheral<RecordingDisplay, RecordingTransport> {
        let mut p = Peripheral::new(
            PeripheralConfig::default(),
            RecordingDisplay::new(),
            RecordingTransport::new(),
        );
        p.start(0);
        p
    }

    // ════════════════════════════════════════════════════════════════════════
    // Display tracks the connection
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn header_follows_every_transition() {
        let mut p = started();
        assert_eq!(p.display().header(), Some("BLESim Advertising"));

        p.on_connect(0);
        assert_eq!(p.display().header(), Some("BLESim Connected"));

        p.on_disconnect(100);
        assert_eq!(p.display().header(), Some("BLESim Disconnected"));

        p.poll(100 + RECONNECT_GRACE_MS);
        assert_eq!(p.display().header(), Some("BLESim Advertising"));
        assert!(p.display().contains("Advertising again"));
    }

    #[test]
    fn tick_shows_on_display_with_count() {
        let mut p = started();
        p.on_connect(0);
        p.poll(NOTIFY_INTERVAL_MS);
        assert!(p.display().contains("TX: tick:1"));
        assert!(p.display().contains("Count: 1"));
    }

    // ════════════════════════════════════════════════════════════════════════
    // Advertising payload
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn advertised_service_is_the_test_service() {
        let adv = ble::adv::advertising_data(SERVICE_UUID, config::DEVICE_NAME).unwrap();
        assert!(ble::adv::contains_service(&adv, SERVICE_UUID));
    }

    // ════════════════════════════════════════════════════════════════════════
    // Event queue dispatch
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn queued_events_replay_in_order() {
        let mut p = started();
        let events = [
            PeripheralEvent::Connected,
            PeripheralEvent::Write(gatt::characteristic::Value::from_slice(b"abc").unwrap()),
            PeripheralEvent::Disconnected,
        ];
        for (t, ev) in events.into_iter().enumerate() {
            ev.dispatch(&mut p, t as u64);
        }
        assert_eq!(p.connection_state(), ConnectionState::Disconnected);
        assert_eq!(p.state().store.last_written(), b"abc");
    }
}
