//! The peripheral core: one owned state aggregate driven by radio
//! callbacks and by the cooperative main loop.
//!
//! Radio events (connect, disconnect, write, read) arrive through the
//! [`EventHandler`] trait, usually via a [`PeripheralEvent`] taken off a
//! single-consumer queue.  Periodic work (notification ticks and the
//! reconnection grace delay) happens in [`Peripheral::poll`].  The core
//! talks to the radio only through [`Transport`] and to the screen only
//! through [`DisplaySink`].
//!
//! Safety property: [`Transport::notify`] is never called unless the
//! connection state is `Connected`.

use crate::config::{PeripheralConfig, ReadPolicy};
use crate::connection::{ConnectionManager, ConnectionState};
use crate::error::Error;
use crate::gatt::characteristic::{CharacteristicId, Value};
use crate::gatt::store::{CharacteristicStore, Counter, WriteOutcome};
use crate::scheduler::NotificationScheduler;
use crate::ui::status::{counter_line, payload_line, text_line, DisplaySink, Line, StatusScreen};

/// Outbound requests to the radio stack.
pub trait Transport {
    /// (Re)start connectable advertising.
    fn start_advertising(&mut self) -> Result<(), Error>;

    /// Update a characteristic's value in the attribute table.
    fn set_value(&mut self, id: CharacteristicId, value: &[u8]) -> Result<(), Error>;

    /// Send a notification of the Notify characteristic to the central.
    fn notify(&mut self, value: &[u8]) -> Result<(), Error>;
}

/// Entry points the radio stack calls into.
pub trait EventHandler {
    fn on_connect(&mut self, now: u64);
    fn on_disconnect(&mut self, now: u64);
    fn on_write(&mut self, value: &[u8]);
    fn on_read(&mut self) -> Value;
}

/// A radio event, as queued from the radio context to the main loop.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PeripheralEvent {
    Connected,
    Disconnected,
    Write(Value),
    Read,
}

impl PeripheralEvent {
    /// Deliver this event to `handler`. Returns the read value for
    /// [`PeripheralEvent::Read`].
    pub fn dispatch<H: EventHandler + ?Sized>(self, handler: &mut H, now: u64) -> Option<Value> {
        match self {
            PeripheralEvent::Connected => handler.on_connect(now),
            PeripheralEvent::Disconnected => handler.on_disconnect(now),
            PeripheralEvent::Write(value) => handler.on_write(&value),
            PeripheralEvent::Read => return Some(handler.on_read()),
        }
        None
    }
}

/// Per-connection counters, reset on connect and logged on disconnect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionStats {
    pub writes: u32,
    pub ignored_writes: u32,
    pub reads: u32,
    pub notifications: u32,
    pub rejected: u32,
}

/// Everything the peripheral mutates, in one place.
pub struct PeripheralState {
    pub connection: ConnectionManager,
    pub store: CharacteristicStore,
    pub scheduler: NotificationScheduler,
    pub counter: Counter,
    pub stats: SessionStats,
    /// Most recent event line, kept across state-only refreshes.
    activity: Line,
}

impl PeripheralState {
    pub fn new(config: &PeripheralConfig) -> Self {
        Self {
            connection: ConnectionManager::new(config.reconnect_grace_ms),
            store: CharacteristicStore::new(config.write_policy, config.read_policy),
            scheduler: NotificationScheduler::new(config.notify_interval_ms),
            counter: Counter::new(),
            stats: SessionStats::default(),
            activity: text_line("Waiting for client"),
        }
    }

    /// Compose the status screen for the current state.
    pub fn screen(&self) -> StatusScreen {
        let mut screen = StatusScreen::new(self.connection.state());
        screen.push(self.activity.clone());
        if !self.store.last_written().is_empty() {
            screen.push(payload_line("Last: ", self.store.last_written()));
        }
        screen.push(counter_line("Count: ", self.counter.value()));
        screen
    }
}

pub struct Peripheral<D, T> {
    state: PeripheralState,
    display: D,
    transport: T,
}

impl<D: DisplaySink, T: Transport> Peripheral<D, T> {
    pub fn new(config: PeripheralConfig, display: D, transport: T) -> Self {
        info!("peripheral config: {:?}", config);
        Self {
            state: PeripheralState::new(&config),
            display,
            transport,
        }
    }

    pub fn state(&self) -> &PeripheralState {
        &self.state
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state.connection.state()
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Power-up at `now`: the peripheral starts out advertising. If the
    /// radio refuses, advertising is retried after the grace delay.
    pub fn start(&mut self, now: u64) {
        info!("starting in {:?}", self.state.connection.state());
        if let Err(e) = self.transport.start_advertising() {
            warn!("could not start advertising: {:?}", e);
            self.state.connection.advertising_failed(now);
        }
        self.refresh(text_line("Waiting for client"));
    }

    /// One iteration of the cooperative loop.
    pub fn poll(&mut self, now: u64) {
        if self.state.connection.poll(now) {
            match self.transport.start_advertising() {
                Ok(()) => {
                    self.state.connection.start_advertising();
                    self.refresh(text_line("Advertising again"));
                }
                Err(e) => warn!("could not restart advertising: {:?}, retrying", e),
            }
        }

        let connected = self.state.connection.is_connected();
        if self.state.scheduler.poll(now, connected) {
            let n = self.state.counter.increment();
            let message = self.state.store.handle_notify_tick(n);
            self.transmit(&message);
            self.refresh(payload_line("TX: ", &message));
        }
    }

    /// Send a notification if, and only if, the link is up.
    ///
    /// A rejected transmission is counted and logged but otherwise
    /// treated like a sent one.
    fn transmit(&mut self, value: &[u8]) {
        match self.try_transmit(value) {
            Ok(()) => {}
            Err(Error::NotConnected) => {
                debug!("notify suppressed while {:?}", self.state.connection.state());
            }
            Err(e) => {
                self.state.stats.rejected += 1;
                warn!("notify not accepted: {:?}", e);
            }
        }
    }

    fn try_transmit(&mut self, value: &[u8]) -> Result<(), Error> {
        if !self.state.connection.is_connected() {
            return Err(Error::NotConnected);
        }
        info!("notify {:?}", value);
        self.state.stats.notifications += 1;
        self.transport.notify(value)
    }

    fn refresh(&mut self, activity: Line) {
        self.state.activity = activity;
        self.state.screen().show_on(&mut self.display);
    }
}

impl<D: DisplaySink, T: Transport> EventHandler for Peripheral<D, T> {
    fn on_connect(&mut self, now: u64) {
        if !self.state.connection.on_connect() {
            return;
        }
        self.state.scheduler.on_connect(now);
        self.state.stats = SessionStats::default();
        info!("central connected");
        self.refresh(text_line("Client connected"));
    }

    fn on_disconnect(&mut self, now: u64) {
        if !self.state.connection.on_disconnect(now) {
            return;
        }
        self.state.scheduler.on_disconnect();
        info!("central disconnected: {:?}", self.state.stats);
        self.refresh(text_line("Client disconnected"));
    }

    fn on_write(&mut self, value: &[u8]) {
        // A write needs a link; anything else is a stray event.
        if !self.state.connection.is_connected() {
            warn!("write while {:?} - dropped", self.state.connection.state());
            return;
        }

        match self.state.store.handle_write(value) {
            WriteOutcome::Ignored => {
                self.state.stats.ignored_writes += 1;
            }
            WriteOutcome::Echoed => {
                self.state.stats.writes += 1;
                info!("write echoed ({} bytes)", value.len());
                let echoed = self.state.store.characteristic(CharacteristicId::Read);
                if let Err(e) = self.transport.set_value(CharacteristicId::Read, echoed.value()) {
                    warn!("could not update read value: {:?}", e);
                }
                self.refresh(payload_line("RX: ", value));
            }
            WriteOutcome::Notify(echo) => {
                self.state.stats.writes += 1;
                info!("write forwarded as notify ({} bytes)", value.len());
                self.transmit(&echo);
                self.refresh(payload_line("RX: ", value));
            }
        }
    }

    fn on_read(&mut self) -> Value {
        let value = self.state.store.handle_read(&mut self.state.counter);
        self.state.stats.reads += 1;
        if self.state.store.read_policy() == ReadPolicy::Computed {
            if let Err(e) = self.transport.set_value(CharacteristicId::Read, &value) {
                warn!("could not update read value: {:?}", e);
            }
        }
        value
    }
}
