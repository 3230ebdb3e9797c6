//! Connection manager - lifecycle of the single central link.
//!
//! ```text
//!   Advertising --connect--> Connected --disconnect--> Disconnected
//!        ^                                                  |
//!        +----------------- grace delay elapsed ------------+
//! ```
//!
//! The grace delay is polled from the main loop rather than slept, so
//! other periodic work keeps running while the peripheral waits to
//! advertise again.

/// Link state. Exactly one instance exists per peripheral.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    Disconnected,
    Advertising,
    Connected,
}

impl ConnectionState {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Advertising => "Advertising",
            ConnectionState::Connected => "Connected",
        }
    }
}

pub struct ConnectionManager {
    state: ConnectionState,
    /// When the last disconnect happened; `Some` only while a
    /// re-advertise is pending.
    disconnected_at: Option<u64>,
    grace_ms: u64,
}

impl ConnectionManager {
    /// Start in `Advertising`: the radio advertises from power-up.
    pub const fn new(grace_ms: u64) -> Self {
        Self {
            state: ConnectionState::Advertising,
            disconnected_at: None,
            grace_ms,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// A re-advertise is scheduled and advertising has not restarted yet.
    pub fn readvertise_pending(&self) -> bool {
        self.disconnected_at.is_some()
    }

    /// Central connected. Returns `true` if the state changed.
    ///
    /// A connect arriving during the grace delay cancels the pending
    /// re-advertise.
    pub fn on_connect(&mut self) -> bool {
        if self.state == ConnectionState::Connected {
            debug!("connect while already connected - ignored");
            return false;
        }
        if self.disconnected_at.take().is_some() {
            info!("connect during grace delay, re-advertise cancelled");
        }
        self.transition(ConnectionState::Connected);
        true
    }

    /// Central disconnected at `now`. Returns `true` if the state changed.
    pub fn on_disconnect(&mut self, now: u64) -> bool {
        if self.state != ConnectionState::Connected {
            debug!("disconnect in {:?} - ignored", self.state);
            return false;
        }
        self.disconnected_at = Some(now);
        self.transition(ConnectionState::Disconnected);
        true
    }

    /// Enter `Advertising`. No-op if already advertising or connected.
    pub fn start_advertising(&mut self) -> bool {
        if self.state != ConnectionState::Disconnected {
            return false;
        }
        self.disconnected_at = None;
        self.transition(ConnectionState::Advertising);
        true
    }

    /// Drive the reconnection path. Returns `true` while the grace delay
    /// has elapsed and advertising still has to be restarted.
    ///
    /// The state does not change here; the caller confirms with
    /// [`start_advertising`](Self::start_advertising) once the radio has
    /// accepted the request, so a refused request is retried on the next
    /// poll.
    pub fn poll(&self, now: u64) -> bool {
        match self.disconnected_at {
            Some(at) => now.saturating_sub(at) >= self.grace_ms,
            None => false,
        }
    }

    /// The radio refused to advertise at `now`. Fall back to
    /// `Disconnected` and try again after the grace delay.
    pub fn advertising_failed(&mut self, now: u64) {
        if self.state != ConnectionState::Advertising {
            return;
        }
        self.disconnected_at = Some(now);
        self.transition(ConnectionState::Disconnected);
    }

    fn transition(&mut self, next: ConnectionState) {
        info!("connection: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
