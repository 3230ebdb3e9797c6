//! GATT characteristics of the test service.

use core::ops::BitOr;

use crate::config::VALUE_CAPACITY;
use crate::error::Error;
use crate::gatt::uuid::Uuid;

/// A characteristic value, bounded by the negotiated ATT payload size.
pub type Value = heapless::Vec<u8, VALUE_CAPACITY>;

/// Characteristic property bits, as carried in the characteristic
/// declaration (Core Spec Vol 3, Part G, 3.3.1.1).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Properties(u8);

impl Properties {
    pub const READ: Self = Self(0x02);
    pub const WRITE: Self = Self(0x08);
    pub const NOTIFY: Self = Self(0x10);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Properties {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// The three characteristics the service owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CharacteristicId {
    /// Accepts arbitrary payloads from the central.
    Write,
    /// Serves the echoed write or a computed counter.
    Read,
    /// Carries tick messages and immediate write echoes.
    Notify,
}

/// A characteristic: UUID, property set and current value.
#[derive(Clone, Debug)]
pub struct Characteristic {
    uuid: Uuid,
    properties: Properties,
    value: Value,
}

impl Characteristic {
    pub const fn new(uuid: Uuid, properties: Properties) -> Self {
        Self {
            uuid,
            properties,
            value: Value::new(),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn properties(&self) -> Properties {
        self.properties
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Replace the current value. Fails without modifying the value when
    /// `bytes` exceeds [`VALUE_CAPACITY`].
    pub fn set_value(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let value = Value::from_slice(bytes).map_err(|_| Error::ValueTooLong)?;
        self.value = value;
        Ok(())
    }
}
