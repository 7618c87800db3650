pub const MAGIC: [u8; 5] = *b"weav\0";
/// `u16 major, minor, patch` (6) + 5-byte magic + 5-byte padding, aligning
/// the three trailing `u64` fields to an 8-byte boundary.
pub const HEADER_LEN: usize = 40;

/// Fixed little-endian file header. `str_loc`/`sym_loc` are offsets within
/// the `data_len`-byte payload that immediately follows: code, then
/// strings, then symbols. `sym_loc == 0` means the symbol section is absent
/// (the embedder supplied its own `SymbolContext` at compile time).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
    pub data_len: u64,
    pub str_loc: u64,
    pub sym_loc: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum HeaderError {
    #[error("file too short to contain a header ({0} bytes)")]
    TooShort(usize),
    #[error("bad magic bytes: expected \"weav\"")]
    BadMagic,
}

impl Header {
    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..2].copy_from_slice(&self.major.to_le_bytes());
        buf[2..4].copy_from_slice(&self.minor.to_le_bytes());
        buf[4..6].copy_from_slice(&self.patch.to_le_bytes());
        buf[6..11].copy_from_slice(&MAGIC);
        buf[16..24].copy_from_slice(&self.data_len.to_le_bytes());
        buf[24..32].copy_from_slice(&self.str_loc.to_le_bytes());
        buf[32..40].copy_from_slice(&self.sym_loc.to_le_bytes());
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Header, HeaderError> {
        if bytes.len() < HEADER_LEN {
            return Err(HeaderError::TooShort(bytes.len()));
        }
        if bytes[6..11] != MAGIC {
            return Err(HeaderError::BadMagic);
        }
        let u16_at = |lo: usize| u16::from_le_bytes(bytes[lo..lo + 2].try_into().unwrap());
        let u64_at = |lo: usize| u64::from_le_bytes(bytes[lo..lo + 8].try_into().unwrap());
        Ok(Header {
            major: u16_at(0),
            minor: u16_at(2),
            patch: u16_at(4),
            data_len: u64_at(16),
            str_loc: u64_at(24),
            sym_loc: u64_at(32),
        })
    }
}
