//! Flattens per-term position lists into per-document rails
//!
//! ```text
//! FieldPostings ──visit_doc_terms(d)──▶ rail[p] = t ──▶ <field>.rail.tmp ──fsync/rename──▶ <field>.rail
//! ```
//!
//! The payload is streamed: header space is reserved first, every document
//! is written as soon as it is flattened, and the doc length table is
//! written last by seeking back to the start of the file.

use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use byteorder::{LittleEndian, WriteBytesExt};
use railstat_core::{
    DocId, FieldPostings, Generation, RailError, RailResult, TermId, HOLE_TERM_ID,
};
use tracing::info;

use super::format::RailHeader;

/// Builds the rail file of one field.
pub struct RailBuilder<'a> {
    field: &'a str,
    postings: &'a dyn FieldPostings,
    doc_count: u32,
    generation: Generation,
    sync: bool,
}

impl<'a> RailBuilder<'a> {
    /// Builder over `postings` for documents `0..doc_count`, stamped with
    /// `generation`.
    pub fn new(
        field: &'a str,
        postings: &'a dyn FieldPostings,
        doc_count: u32,
        generation: Generation,
    ) -> Self {
        RailBuilder {
            field,
            postings,
            doc_count,
            generation,
            sync: true,
        }
    }

    /// Whether to fsync before the rename (default true).
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Write the rail file to `path` atomically.
    ///
    /// Any error leaves the previous file (or no file) in place; the temp
    /// file is removed. The caller is responsible for holding the build lock.
    pub fn build(&self, path: &Path) -> RailResult<RailHeader> {
        self.check_field()?;
        let started = Instant::now();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let tmp_path = tmp_path_for(path);

        let result = self.write_file(&tmp_path);
        let header = match result {
            Ok(header) => header,
            Err(e) => {
                let _ = std::fs::remove_file(&tmp_path);
                return Err(e);
            }
        };
        if let Err(e) = std::fs::rename(&tmp_path, path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        info!(
            target: "railstat::rail",
            field = self.field,
            path = %path.display(),
            generation = %self.generation,
            docs = header.doc_count(),
            tokens = header.total_tokens(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Built rail"
        );
        Ok(header)
    }

    /// Encode the rail into memory, for stores that never touch disk.
    pub fn build_in_memory(&self) -> RailResult<Vec<u8>> {
        self.check_field()?;
        let mut cursor = Cursor::new(Vec::new());
        self.write_rails(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    fn check_field(&self) -> RailResult<()> {
        if !self.postings.has_positions() {
            return Err(RailError::FieldNotIndexed {
                field: self.field.to_string(),
                reason: "field was indexed without positions".to_string(),
            });
        }
        Ok(())
    }

    fn write_file(&self, tmp_path: &Path) -> RailResult<RailHeader> {
        let file = File::create(tmp_path)?;
        let mut out = BufWriter::new(file);
        let header = self.write_rails(&mut out)?;
        let file = out.into_inner().map_err(|e| e.into_error())?;
        if self.sync {
            file.sync_all()?;
        }
        Ok(header)
    }

    fn write_rails<W: Write + Seek>(&self, out: &mut W) -> RailResult<RailHeader> {
        let placeholder = RailHeader {
            generation: self.generation,
            doc_lengths: vec![0; self.doc_count as usize],
        };
        placeholder.write_to(out)?;

        let mut doc_lengths = Vec::with_capacity(self.doc_count as usize);
        let mut rail = Vec::new();
        for doc in 0..self.doc_count {
            self.flatten(doc, &mut rail)?;
            for &term in &rail {
                out.write_u32::<LittleEndian>(term)?;
            }
            doc_lengths.push(rail.len() as u32);
        }

        let header = RailHeader {
            generation: self.generation,
            doc_lengths,
        };
        out.seek(SeekFrom::Start(0))?;
        header.write_to(out)?;
        out.flush()?;
        Ok(header)
    }

    /// Fill `rail` with the term ids of `doc`, holes as [`HOLE_TERM_ID`].
    ///
    /// The rail is sized from the token count when the provider has one and
    /// grown to the highest position otherwise; growth is fallible.
    fn flatten(&self, doc: DocId, rail: &mut Vec<TermId>) -> RailResult<()> {
        rail.clear();
        let count = match self.postings.token_count(doc) {
            Some(count) => {
                grow(rail, count as usize)?;
                Some(count as usize)
            }
            None => None,
        };

        let mut failure = None;
        self.postings.visit_doc_terms(doc, &mut |term, positions| {
            if failure.is_some() {
                return;
            }
            for &pos in positions {
                let pos = pos as usize;
                match count {
                    Some(count) if pos >= count => {
                        failure = Some(RailError::invalid_input(format!(
                            "field '{}' doc {}: position {} beyond token count {}",
                            self.field, doc, pos, count
                        )));
                        return;
                    }
                    None if pos >= rail.len() => {
                        if let Err(e) = grow(rail, pos + 1) {
                            failure = Some(e);
                            return;
                        }
                    }
                    _ => {}
                }
                rail[pos] = term;
            }
        });
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Extend `rail` with holes up to `len` slots.
///
/// A doc length is stored as i32, so longer rails are a capacity overflow,
/// as is a failed reservation.
fn grow(rail: &mut Vec<TermId>, len: usize) -> RailResult<()> {
    let overflow = || RailError::CapacityOverflow {
        requested: len as u64,
    };
    if len > i32::MAX as usize {
        return Err(overflow());
    }
    if len > rail.len() {
        rail.try_reserve_exact(len - rail.len())
            .map_err(|_| overflow())?;
        rail.resize(len, HOLE_TERM_ID);
    }
    Ok(())
}

/// Temp path a build writes before renaming into `path`.
pub fn tmp_path_for(path: &Path) -> PathBuf {
    path.with_extension("rail.tmp")
}
