//! 128-bit GATT UUIDs.
//!
//! UUIDs are stored in canonical (big-endian, textual) byte order.  The
//! radio sends them little-endian, see [`Uuid::to_le_bytes`].

use core::fmt;

/// Bluetooth Base UUID: `00000000-0000-1000-8000-00805f9b34fb`.
pub const BLUETOOTH_BASE: Uuid = Uuid([
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0x80, 0x5f, 0x9b, 0x34, 0xfb,
]);

/// A 128-bit UUID.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Uuid([u8; 16]);

impl Uuid {
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Expand a 16-bit assigned number onto the Bluetooth Base UUID.
    pub const fn from_u16(short: u16) -> Self {
        let mut bytes = BLUETOOTH_BASE.0;
        let be = short.to_be_bytes();
        bytes[2] = be[0];
        bytes[3] = be[1];
        Self(bytes)
    }

    /// Parse the canonical `8-4-4-4-12` form (either case).
    ///
    /// Returns `None` for anything else, including the braced or
    /// hyphen-less variants.
    pub const fn try_parse(s: &str) -> Option<Self> {
        let s = s.as_bytes();
        if s.len() != 36 {
            return None;
        }

        let mut bytes = [0u8; 16];
        let mut out = 0;
        let mut i = 0;
        while i < s.len() {
            if i == 8 || i == 13 || i == 18 || i == 23 {
                if s[i] != b'-' {
                    return None;
                }
                i += 1;
                continue;
            }
            let (hi, lo) = match (hex_nibble(s[i]), hex_nibble(s[i + 1])) {
                (Some(hi), Some(lo)) => (hi, lo),
                _ => return None,
            };
            bytes[out] = (hi << 4) | lo;
            out += 1;
            i += 2;
        }
        Some(Self(bytes))
    }

    /// Parse a UUID literal; invalid input fails const evaluation.
    pub const fn parse(s: &str) -> Self {
        match Self::try_parse(s) {
            Some(uuid) => uuid,
            None => panic!("invalid UUID literal"),
        }
    }

    /// Canonical byte order.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Over-the-air (little-endian) byte order.
    pub fn to_le_bytes(&self) -> [u8; 16] {
        let mut le = self.0;
        le.reverse();
        le
    }

    /// The 16-bit short form, if this UUID lies on the Bluetooth Base UUID.
    pub fn short(&self) -> Option<u16> {
        let on_base = self.0[..2] == [0, 0] && self.0[4..] == BLUETOOTH_BASE.0[4..];
        on_base.then(|| u16::from_be_bytes([self.0[2], self.0[3]]))
    }
}

const fn hex_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if matches!(i, 4 | 6 | 8 | 10) {
                f.write_str("-")?;
            }
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}
