// Binary header: parsing and validation.

use fstkit_core::{FstError, SemiringKind};

/// Header magic constants (little-endian).
const COOKIE1: u32 = 0x4B54_5346;
const COOKIE2: u32 = 0x0001_0A17;

/// Size of the binary header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Header flag: an input symbol table follows the arc table.
pub const FLAG_ISYMBOLS: u8 = 0x01;
/// Header flag: an output symbol table follows (after the input table).
pub const FLAG_OSYMBOLS: u8 = 0x02;

/// Parsed binary header.
///
/// Layout of the first 16 bytes:
/// - bytes 0..4: cookie1
/// - bytes 4..8: cookie2
/// - byte 8: semiring type code (1 = tropical, 2 = log)
/// - byte 9: symbol table flags
/// - bytes 10..16: reserved (zero)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FstHeader {
    pub semiring: SemiringKind,
    pub flags: u8,
}

impl FstHeader {
    pub fn to_bytes(self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[..4].copy_from_slice(&COOKIE1.to_le_bytes());
        buf[4..8].copy_from_slice(&COOKIE2.to_le_bytes());
        buf[8] = self.semiring.type_code();
        buf[9] = self.flags;
        buf
    }
}

/// Parse and validate the 16-byte header.
pub fn parse_header(data: &[u8]) -> Result<FstHeader, FstError> {
    if data.len() < HEADER_SIZE {
        return Err(FstError::TooShort {
            expected: HEADER_SIZE,
            actual: data.len(),
        });
    }

    let cookie1 = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let cookie2 = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if cookie1 != COOKIE1 || cookie2 != COOKIE2 {
        return Err(FstError::InvalidMagic);
    }

    let semiring =
        SemiringKind::from_type_code(data[8]).ok_or_else(|| FstError::IncompatibleSemiring {
            expected: "tropical or log".to_string(),
            actual: format!("type code {}", data[8]),
        })?;
    Ok(FstHeader {
        semiring,
        flags: data[9],
    })
}
