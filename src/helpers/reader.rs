use crate::error::RustyPlanError;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;

/// A unified reader over workbook bytes on disk or already in memory
pub(crate) enum UnifiedReader {
    /// Local file reader
    Local(BufReader<File>),
    /// In-memory buffer
    #[cfg(test)]
    Memory(std::io::Cursor<Vec<u8>>),
}

impl UnifiedReader {
    /// Opens a local file
    ///
    /// # Arguments
    /// * `file_name` - Path to the file
    ///
    /// # Returns
    /// * `Result<UnifiedReader, RustyPlanError>` - Reader for the file content
    pub(crate) fn new(file_name: &str) -> Result<UnifiedReader, RustyPlanError> {
        let file = File::open(file_name)?;
        Ok(UnifiedReader::Local(BufReader::new(file)))
    }

    /// Wraps workbook bytes that were loaded elsewhere
    #[cfg(test)]
    pub(crate) fn from_bytes(bytes: Vec<u8>) -> UnifiedReader {
        UnifiedReader::Memory(std::io::Cursor::new(bytes))
    }
}

impl Read for UnifiedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            UnifiedReader::Local(reader) => reader.read(buf),
            #[cfg(test)]
            UnifiedReader::Memory(reader) => reader.read(buf),
        }
    }
}

impl Seek for UnifiedReader {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        match self {
            UnifiedReader::Local(reader) => reader.seek(pos),
            #[cfg(test)]
            UnifiedReader::Memory(reader) => reader.seek(pos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_local_file() {
        // Cargo.toml should exist
        let result = UnifiedReader::new("Cargo.toml");
        assert!(result.is_ok(), "Failed to open local file: {:?}", result.err());

        let result = UnifiedReader::new("non_existent_file.xlsx");
        assert!(result.is_err(), "Should fail to open non-existent file");
    }

    #[test]
    fn test_read_memory() {
        let mut reader = UnifiedReader::from_bytes(b"PK\x03\x04".to_vec());
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer).unwrap();
        assert_eq!(buffer, b"PK\x03\x04");
    }
}
