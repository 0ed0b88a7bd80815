//! Rail file format (.rail)
//!
//! One file per text field holding, for every document, the term id found
//! at each token position.
//!
//! ## File Format
//!
//! ```text
//! HEADER (16 + 4 × doc_count bytes):
//!   format_version         i32 LE
//!   source_generation      i64 LE    → generation of the index it was built from
//!   doc_count              i32 LE
//!   doc_length             i32 LE × doc_count
//!
//! PAYLOAD (Σ doc_length × 4 bytes, in doc id order):
//!   per document:
//!     term_id              i32 LE × doc_length[d]
//! ```
//!
//! There is no magic and no trailer: a file is well formed exactly when
//! `header_bytes + Σ doc_length × 4 == file_size`.

use std::io::{self, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use railstat_core::{Generation, RailError, RailResult};

/// Current format version
pub const RAIL_FORMAT_VERSION: i32 = 1;
/// Bytes before the doc length table
pub const FIXED_HEADER_BYTES: usize = 16;
/// Bytes per stored term id and per doc length
pub const SLOT_BYTES: usize = 4;

/// Decoded rail header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RailHeader {
    /// Generation of the index the rail was built from
    pub generation: Generation,
    /// Token count per document, indexed by doc id
    pub doc_lengths: Vec<u32>,
}

impl RailHeader {
    /// Size in bytes of a header describing `doc_count` documents.
    pub fn byte_len(doc_count: usize) -> usize {
        FIXED_HEADER_BYTES + doc_count * SLOT_BYTES
    }

    /// Number of documents described.
    pub fn doc_count(&self) -> usize {
        self.doc_lengths.len()
    }

    /// Sum of all document lengths.
    pub fn total_tokens(&self) -> u64 {
        self.doc_lengths.iter().map(|&l| l as u64).sum()
    }

    /// Expected file size for this header.
    pub fn expected_file_len(&self) -> u64 {
        Self::byte_len(self.doc_count()) as u64 + self.total_tokens() * SLOT_BYTES as u64
    }

    /// Write the header.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let doc_count = i32::try_from(self.doc_count())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "doc count exceeds i32"))?;
        out.write_i32::<LittleEndian>(RAIL_FORMAT_VERSION)?;
        out.write_i64::<LittleEndian>(self.generation.as_u64() as i64)?;
        out.write_i32::<LittleEndian>(doc_count)?;
        for &len in &self.doc_lengths {
            let len = i32::try_from(len).map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidInput, "doc length exceeds i32")
            })?;
            out.write_i32::<LittleEndian>(len)?;
        }
        Ok(())
    }

    /// Parse and validate the header of a whole rail file.
    ///
    /// `bytes` must be the complete file: the size invariant is checked here.
    /// `path` is only used in error messages.
    pub fn parse(bytes: &[u8], path: &Path) -> RailResult<RailHeader> {
        if bytes.len() < FIXED_HEADER_BYTES {
            return Err(RailError::format(
                path,
                format!("file too small for header: {} bytes", bytes.len()),
            ));
        }

        let mut cursor = bytes;
        let version = read_i32(&mut cursor, path)?;
        if version != RAIL_FORMAT_VERSION {
            return Err(RailError::format(
                path,
                format!("unsupported format version: {}", version),
            ));
        }
        let generation = Generation::new(read_i64(&mut cursor, path)? as u64);
        let doc_count = read_i32(&mut cursor, path)?;
        if doc_count < 0 {
            return Err(RailError::format(
                path,
                format!("negative doc count: {}", doc_count),
            ));
        }
        let doc_count = doc_count as usize;

        let header_len = Self::byte_len(doc_count);
        if bytes.len() < header_len {
            return Err(RailError::format(
                path,
                format!(
                    "doc length table truncated: {} docs need {} bytes, file has {}",
                    doc_count,
                    header_len,
                    bytes.len()
                ),
            ));
        }

        let mut doc_lengths = Vec::with_capacity(doc_count);
        for doc in 0..doc_count {
            let len = read_i32(&mut cursor, path)?;
            if len < 0 {
                return Err(RailError::format(
                    path,
                    format!("negative length {} for doc {}", len, doc),
                ));
            }
            doc_lengths.push(len as u32);
        }

        let header = RailHeader {
            generation,
            doc_lengths,
        };
        let expected = header.expected_file_len();
        if expected != bytes.len() as u64 {
            return Err(RailError::format(
                path,
                format!("file size {} != expected {}", bytes.len(), expected),
            ));
        }
        Ok(header)
    }

    /// Prefix sums of doc lengths: `offsets[d]..offsets[d + 1]` are the
    /// payload slots of document `d`. Length is `doc_count + 1`.
    pub fn slot_offsets(&self) -> Vec<u64> {
        let mut offsets = Vec::with_capacity(self.doc_count() + 1);
        let mut acc = 0u64;
        offsets.push(acc);
        for &len in &self.doc_lengths {
            acc += len as u64;
            offsets.push(acc);
        }
        offsets
    }
}

fn read_i32(cursor: &mut &[u8], path: &Path) -> RailResult<i32> {
    cursor
        .read_i32::<LittleEndian>()
        .map_err(|e| RailError::format(path, format!("truncated header: {}", e)))
}

fn read_i64(cursor: &mut &[u8], path: &Path) -> RailResult<i64> {
    cursor
        .read_i64::<LittleEndian>()
        .map_err(|e| RailError::format(path, format!("truncated header: {}", e)))
}
