//! Advertising payload construction.
//!
//! Legacy advertising carries at most 31 bytes of AD structures, each laid
//! out as `[len, type, data...]` with `len` covering type and data.  The
//! builder fills that budget in order and reports anything that does not
//! fit.  The parse helpers at the bottom walk the same format.

use heapless::{String, Vec};

use crate::error::Error;
use crate::gatt::uuid::Uuid;

/// Legacy advertising / scan response payload limit.
pub const ADV_DATA_MAX: usize = 31;

pub type AdvData = Vec<u8, ADV_DATA_MAX>;

// AD types (Assigned Numbers, 2.3)
pub const AD_FLAGS: u8 = 0x01;
pub const AD_INCOMPLETE_16: u8 = 0x02;
pub const AD_COMPLETE_16: u8 = 0x03;
pub const AD_INCOMPLETE_128: u8 = 0x06;
pub const AD_COMPLETE_128: u8 = 0x07;
pub const AD_SHORT_NAME: u8 = 0x08;
pub const AD_COMPLETE_NAME: u8 = 0x09;

/// LE General Discoverable, BR/EDR not supported.
pub const FLAGS_GENERAL_DISC_NO_BREDR: u8 = 0x06;

pub struct AdvBuilder {
    buf: AdvData,
}

impl Default for AdvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AdvBuilder {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn remaining(&self) -> usize {
        ADV_DATA_MAX - self.buf.len()
    }

    pub fn flags(self, flags: u8) -> Result<Self, Error> {
        self.field(AD_FLAGS, &[flags])
    }

    /// Add the complete local name, or as much of it as fits as a
    /// shortened name. A shortened name never ends in a partial UTF-8
    /// sequence.
    pub fn name(self, name: &str) -> Result<Self, Error> {
        let room = self.remaining().saturating_sub(2);
        if name.len() <= room {
            return self.field(AD_COMPLETE_NAME, name.as_bytes());
        }
        let mut cut = room;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }
        if cut == 0 {
            return Err(Error::BufferOverflow);
        }
        self.field(AD_SHORT_NAME, &name.as_bytes()[..cut])
    }

    /// Add a complete list holding one service UUID, using the 16-bit
    /// form when the UUID sits on the Bluetooth base.
    pub fn service(self, uuid: Uuid) -> Result<Self, Error> {
        match uuid.short() {
            Some(short) => self.field(AD_COMPLETE_16, &short.to_le_bytes()),
            None => self.field(AD_COMPLETE_128, &uuid.to_le_bytes()),
        }
    }

    pub fn field(mut self, ad_type: u8, data: &[u8]) -> Result<Self, Error> {
        if data.len() + 2 > self.remaining() {
            return Err(Error::BufferOverflow);
        }
        // Length fits in u8: bounded by ADV_DATA_MAX above.
        let _ = self.buf.push(data.len() as u8 + 1);
        let _ = self.buf.push(ad_type);
        let _ = self.buf.extend_from_slice(data);
        Ok(self)
    }

    pub fn build(self) -> AdvData {
        self.buf
    }
}

/// Advertising data for the peripheral: flags, the service UUID and as
/// much of the name as still fits.
pub fn advertising_data(service: Uuid, name: &str) -> Result<AdvData, Error> {
    Ok(AdvBuilder::new()
        .flags(FLAGS_GENERAL_DISC_NO_BREDR)?
        .service(service)?
        .name(name)?
        .build())
}

/// Scan response: the service UUID again, for scanners that only look
/// there.
pub fn scan_response(service: Uuid) -> Result<AdvData, Error> {
    Ok(AdvBuilder::new().service(service)?.build())
}

/// Iterate over `(ad_type, data)` fields, stopping at the first
/// malformed one.
pub fn fields(data: &[u8]) -> impl Iterator<Item = (u8, &[u8])> {
    let mut i = 0;
    core::iter::from_fn(move || {
        let len = *data.get(i)? as usize;
        if len == 0 || i + len >= data.len() {
            return None;
        }
        let field = (data[i + 1], &data[i + 2..i + 1 + len]);
        i += len + 1;
        Some(field)
    })
}

/// Does the payload list `uuid` in any 16- or 128-bit service UUID field?
pub fn contains_service(data: &[u8], uuid: Uuid) -> bool {
    let long = uuid.to_le_bytes();
    let short = uuid.short().map(u16::to_le_bytes);
    fields(data).any(|(ad_type, body)| match ad_type {
        AD_INCOMPLETE_16 | AD_COMPLETE_16 => short
            .map(|s| body.chunks_exact(2).any(|c| c == s))
            .unwrap_or(false),
        AD_INCOMPLETE_128 | AD_COMPLETE_128 => body.chunks_exact(16).any(|c| c == long),
        _ => false,
    })
}

/// Local name carried in the payload, complete or shortened.
///
/// Names that are not valid UTF-8 come back with every non-ASCII byte
/// replaced by `.`.
pub fn device_name(data: &[u8]) -> Option<String<ADV_DATA_MAX>> {
    let (_, body) =
        fields(data).find(|(t, _)| *t == AD_COMPLETE_NAME || *t == AD_SHORT_NAME)?;
    // A field body is at most ADV_DATA_MAX - 2 bytes, so pushes cannot fail.
    let mut name = String::new();
    match core::str::from_utf8(body) {
        Ok(text) => {
            let _ = name.push_str(text);
        }
        Err(_) => {
            for &b in body {
                let _ = name.push(if b.is_ascii() { b as char } else { '.' });
            }
        }
    }
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEVICE_NAME, SERVICE_UUID};

    #[test]
    fn advertising_data_layout() {
        let adv = advertising_data(SERVICE_UUID, DEVICE_NAME).unwrap();
        assert_eq!(adv.len(), 3 + 18 + 2 + DEVICE_NAME.len());
        assert_eq!(&adv[..3], &[0x02, AD_FLAGS, FLAGS_GENERAL_DISC_NO_BREDR]);
        assert_eq!(&adv[3..5], &[17, AD_COMPLETE_128]);
        assert_eq!(&adv[5..21], &SERVICE_UUID.to_le_bytes());
        assert_eq!(adv[22], AD_COMPLETE_NAME);
        assert!(contains_service(&adv, SERVICE_UUID));
        assert_eq!(device_name(&adv).unwrap().as_str(), DEVICE_NAME);
    }

    #[test]
    fn scan_response_repeats_service() {
        let sr = scan_response(SERVICE_UUID).unwrap();
        assert!(contains_service(&sr, SERVICE_UUID));
        assert!(device_name(&sr).is_none());
    }

    #[test]
    fn long_name_is_shortened() {
        let name = "A-very-long-peripheral-name";
        let adv = advertising_data(SERVICE_UUID, name).unwrap();
        assert_eq!(adv.len(), ADV_DATA_MAX);
        assert_eq!(adv[22], AD_SHORT_NAME);
        assert_eq!(device_name(&adv).unwrap().as_str(), &name[..8]);
    }

    #[test]
    fn utf8_name_round_trips() {
        let adv = advertising_data(SERVICE_UUID, "Café").unwrap();
        assert_eq!(adv[22], AD_COMPLETE_NAME);
        assert_eq!(device_name(&adv).unwrap().as_str(), "Café");
    }

    #[test]
    fn shortened_name_keeps_whole_characters() {
        // 8 bytes of room, which would split the last 'é'.
        let adv = advertising_data(SERVICE_UUID, "aéééé").unwrap();
        assert_eq!(adv[22], AD_SHORT_NAME);
        assert_eq!(device_name(&adv).unwrap().as_str(), "aééé");
    }

    #[test]
    fn invalid_utf8_name_is_masked() {
        let adv = [0x05, AD_COMPLETE_NAME, b'A', 0xFF, 0xC3, b'z'];
        assert_eq!(device_name(&adv).unwrap().as_str(), "A..z");
    }

    #[test]
    fn short_uuid_uses_16_bit_list() {
        let battery = Uuid::from_u16(0x180F);
        let adv = AdvBuilder::new().service(battery).unwrap().build();
        assert_eq!(adv.as_slice(), &[0x03, AD_COMPLETE_16, 0x0F, 0x18]);
        assert!(contains_service(&adv, battery));
        assert!(!contains_service(&adv, SERVICE_UUID));
    }

    #[test]
    fn overflow_is_reported() {
        let full = AdvBuilder::new().field(0xFF, &[0; 29]).unwrap();
        assert_eq!(full.remaining(), 0);
        assert_eq!(full.flags(0x06).err(), Some(Error::BufferOverflow));
    }

    #[test]
    fn parser_stops_on_malformed_lengths() {
        assert_eq!(fields(&[0x00]).count(), 0);
        assert_eq!(fields(&[0x05, 0x03, 0x12]).count(), 0);
        assert!(device_name(&[0x02, 0x01, 0x06]).is_none());
    }
}
