//! Characteristic store - values of the Write, Read and Notify
//! characteristics and the read/write handlers that mutate them.
//!
//! The store itself knows nothing about the connection; the peripheral
//! decides whether an outcome is transmitted.

use core::fmt::Write as _;

use crate::config::{
    ReadPolicy, WritePolicy, NOTIFY_CHAR_UUID, READ_CHAR_UUID, VALUE_CAPACITY, WRITE_CHAR_UUID,
};
use crate::gatt::characteristic::{Characteristic, CharacteristicId, Properties, Value};

/// Process-wide monotonically increasing counter, shared by the
/// notification scheduler and the computed read policy.
///
/// Saturates at `u32::MAX`: from there on every increment returns the
/// same value instead of wrapping back to zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Counter(u32);

impl Counter {
    pub const fn new() -> Self {
        Self(0)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// Advance by one and return the new value.
    pub fn increment(&mut self) -> u32 {
        self.0 = self.0.saturating_add(1);
        self.0
    }
}

/// Result of [`CharacteristicStore::handle_write`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Empty or oversized payload; nothing changed.
    Ignored,
    /// Payload stored and mirrored into the Read characteristic.
    Echoed,
    /// Payload stored and set as the Notify value; transmit it now.
    Notify(Value),
}

pub struct CharacteristicStore {
    write: Characteristic,
    read: Characteristic,
    notify: Characteristic,
    last_written: Value,
    write_policy: WritePolicy,
    read_policy: ReadPolicy,
}

impl CharacteristicStore {
    pub fn new(write_policy: WritePolicy, read_policy: ReadPolicy) -> Self {
        Self {
            write: Characteristic::new(WRITE_CHAR_UUID, Properties::WRITE),
            read: Characteristic::new(READ_CHAR_UUID, Properties::READ),
            notify: Characteristic::new(NOTIFY_CHAR_UUID, Properties::NOTIFY),
            last_written: Value::new(),
            write_policy,
            read_policy,
        }
    }

    pub fn characteristic(&self, id: CharacteristicId) -> &Characteristic {
        match id {
            CharacteristicId::Write => &self.write,
            CharacteristicId::Read => &self.read,
            CharacteristicId::Notify => &self.notify,
        }
    }

    pub fn last_written(&self) -> &[u8] {
        &self.last_written
    }

    pub fn write_policy(&self) -> WritePolicy {
        self.write_policy
    }

    pub fn read_policy(&self) -> ReadPolicy {
        self.read_policy
    }

    /// Accept a payload written to the Write characteristic.
    ///
    /// Empty payloads are dropped silently.  Payloads beyond
    /// [`VALUE_CAPACITY`] cannot come from a conforming central and are
    /// dropped with a warning.
    pub fn handle_write(&mut self, raw: &[u8]) -> WriteOutcome {
        if raw.is_empty() {
            return WriteOutcome::Ignored;
        }
        let Ok(value) = Value::from_slice(raw) else {
            warn!(
                "write of {} bytes exceeds capacity {}",
                raw.len(),
                VALUE_CAPACITY
            );
            return WriteOutcome::Ignored;
        };

        // Capacity was checked above, so these cannot fail.
        let _ = self.write.set_value(&value);
        self.last_written = value.clone();
        debug!("write accepted: {:?}", raw);

        match self.write_policy {
            WritePolicy::Echo => {
                let _ = self.read.set_value(&value);
                WriteOutcome::Echoed
            }
            WritePolicy::ImmediateNotify => {
                let _ = self.notify.set_value(&value);
                WriteOutcome::Notify(value)
            }
        }
    }

    /// Serve a read of the Read characteristic.
    pub fn handle_read(&mut self, counter: &mut Counter) -> Value {
        match self.read_policy {
            ReadPolicy::Static => Value::from_slice(self.read.value()).unwrap_or_default(),
            ReadPolicy::Computed => {
                let n = counter.increment();
                let text = decimal(n);
                let _ = self.read.set_value(&text);
                info!("read #{} served", n);
                text
            }
        }
    }

    /// Compose the tick message for `counter` and make it the Notify value.
    pub fn handle_notify_tick(&mut self, counter: u32) -> Value {
        let mut msg: heapless::String<VALUE_CAPACITY> = heapless::String::new();
        let _ = write!(msg, "tick:{}", counter);
        let value = Value::from_slice(msg.as_bytes()).unwrap_or_default();
        let _ = self.notify.set_value(&value);
        value
    }
}

fn decimal(n: u32) -> Value {
    let mut s: heapless::String<10> = heapless::String::new();
    let _ = write!(s, "{}", n);
    Value::from_slice(s.as_bytes()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_store() -> CharacteristicStore {
        CharacteristicStore::new(WritePolicy::Echo, ReadPolicy::Static)
    }

    #[test]
    fn characteristics_have_expected_properties() {
        let store = echo_store();
        assert_eq!(
            store.characteristic(CharacteristicId::Write).properties(),
            Properties::WRITE
        );
        assert_eq!(
            store.characteristic(CharacteristicId::Read).properties(),
            Properties::READ
        );
        assert_eq!(
            store.characteristic(CharacteristicId::Notify).properties(),
            Properties::NOTIFY
        );
        assert_eq!(
            store.characteristic(CharacteristicId::Notify).uuid(),
            NOTIFY_CHAR_UUID
        );
    }

    #[test]
    fn echo_write_is_returned_by_read() {
        let mut store = echo_store();
        let mut counter = Counter::new();
        assert_eq!(store.handle_write(b"Hello"), WriteOutcome::Echoed);
        assert_eq!(store.handle_read(&mut counter).as_slice(), b"Hello");
        assert_eq!(store.last_written(), b"Hello");
        assert_eq!(counter.value(), 0);
    }

    #[test]
    fn echo_holds_for_every_length_up_to_capacity() {
        let mut store = echo_store();
        let mut counter = Counter::new();
        let payload = [0xA5u8; VALUE_CAPACITY];
        for len in 1..=VALUE_CAPACITY {
            let w = &payload[..len];
            store.handle_write(w);
            assert_eq!(store.handle_read(&mut counter).as_slice(), w);
        }
    }

    #[test]
    fn empty_write_changes_nothing() {
        let mut store = echo_store();
        store.handle_write(b"first");
        assert_eq!(store.handle_write(b""), WriteOutcome::Ignored);
        assert_eq!(store.last_written(), b"first");
        assert_eq!(store.characteristic(CharacteristicId::Read).value(), b"first");
    }

    #[test]
    fn oversized_write_changes_nothing() {
        let mut store = echo_store();
        store.handle_write(b"first");
        let big = [1u8; VALUE_CAPACITY + 1];
        assert_eq!(store.handle_write(&big), WriteOutcome::Ignored);
        assert_eq!(store.last_written(), b"first");
    }

    #[test]
    fn immediate_notify_policy_leaves_read_untouched() {
        let mut store = CharacteristicStore::new(WritePolicy::ImmediateNotify, ReadPolicy::Static);
        match store.handle_write(b"ping") {
            WriteOutcome::Notify(v) => assert_eq!(v.as_slice(), b"ping"),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(store.characteristic(CharacteristicId::Notify).value(), b"ping");
        assert!(store.characteristic(CharacteristicId::Read).value().is_empty());
        assert_eq!(store.last_written(), b"ping");
    }

    #[test]
    fn computed_read_counts_each_access() {
        let mut store = CharacteristicStore::new(WritePolicy::Echo, ReadPolicy::Computed);
        let mut counter = Counter::new();
        assert_eq!(store.handle_read(&mut counter).as_slice(), b"1");
        assert_eq!(store.handle_read(&mut counter).as_slice(), b"2");
        assert_eq!(store.characteristic(CharacteristicId::Read).value(), b"2");
        assert_eq!(counter.value(), 2);
    }

    #[test]
    fn computed_read_continues_from_shared_counter() {
        let mut store = CharacteristicStore::new(WritePolicy::Echo, ReadPolicy::Computed);
        let mut counter = Counter::new();
        counter.increment(); // scheduler tick
        counter.increment(); // scheduler tick
        assert_eq!(store.handle_read(&mut counter).as_slice(), b"3");
    }

    #[test]
    fn computed_read_holds_at_saturated_counter() {
        let mut store = CharacteristicStore::new(WritePolicy::Echo, ReadPolicy::Computed);
        let mut counter = Counter(u32::MAX - 1);
        assert_eq!(store.handle_read(&mut counter).as_slice(), b"4294967295");
        assert_eq!(store.handle_read(&mut counter).as_slice(), b"4294967295");
        assert_eq!(counter.value(), u32::MAX);
    }

    #[test]
    fn notify_tick_composes_message() {
        let mut store = echo_store();
        assert_eq!(store.handle_notify_tick(7).as_slice(), b"tick:7");
        assert_eq!(store.characteristic(CharacteristicId::Notify).value(), b"tick:7");
        assert_eq!(store.handle_notify_tick(u32::MAX).as_slice(), b"tick:4294967295");
    }

    #[test]
    fn counter_saturates() {
        let mut c = Counter(u32::MAX - 1);
        assert_eq!(c.increment(), u32::MAX);
        assert_eq!(c.increment(), u32::MAX);
    }
}
