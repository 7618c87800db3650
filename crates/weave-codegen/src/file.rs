use std::io;
use std::path::Path;

use crate::header::{Header, HeaderError, HEADER_LEN};

/// A compiled artifact: header plus the `data_len`-byte payload (code,
/// strings, and an optional symbol section back to back). Owns its bytes;
/// dropping a `CompiledFile` frees them.
#[derive(Debug, Clone)]
pub struct CompiledFile {
    header: Header,
    data: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error("header declares {declared} data bytes but the file has {actual}")]
    Truncated { declared: u64, actual: usize },
}

impl CompiledFile {
    pub fn new(header: Header, data: Vec<u8>) -> Self {
        Self { header, data }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Just the code section, bounds-checking helper for tests and
    /// inspection. String/symbol operands inside it are offsets into the
    /// full payload, not into this slice — pass [`CompiledFile::data`] to
    /// the VM or disassembler instead.
    pub fn code(&self) -> &[u8] {
        &self.data[..self.header.str_loc as usize]
    }

    pub fn strings(&self) -> &[u8] {
        let end = if self.header.sym_loc != 0 {
            self.header.sym_loc as usize
        } else {
            self.data.len()
        };
        &self.data[self.header.str_loc as usize..end]
    }

    pub fn symbols(&self) -> Option<&[u8]> {
        if self.header.sym_loc == 0 {
            None
        } else {
            Some(&self.data[self.header.sym_loc as usize..])
        }
    }

    /// Reads a whole file into an owned buffer. Memory-mapped loading is
    /// out of scope: a single contiguous read is sufficient for every
    /// artifact this compiler produces.
    pub fn load(path: impl AsRef<Path>) -> Result<CompiledFile, LoadError> {
        let bytes = std::fs::read(path)?;
        Self::from_raw(bytes)
    }

    pub fn from_raw(bytes: Vec<u8>) -> Result<CompiledFile, LoadError> {
        let header = Header::from_bytes(&bytes)?;
        let data = &bytes[HEADER_LEN..];
        if (data.len() as u64) < header.data_len {
            return Err(LoadError::Truncated {
                declared: header.data_len,
                actual: data.len(),
            });
        }
        let data = data[..header.data_len as usize].to_vec();
        Ok(CompiledFile { header, data })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.data.len());
        out.extend_from_slice(&self.header.to_bytes());
        out.extend_from_slice(&self.data);
        std::fs::write(path, out)
    }
}
