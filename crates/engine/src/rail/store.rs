//! Loaded rail of one field and its build-or-load state machine
//!
//! ```text
//! UNLOADED ──file exists ∧ generation matches──▶ LOADED
//!     │
//!     └──missing / Format / VersionMismatch──▶ BUILDING (under <field>.rail.lock) ──▶ LOADED
//! ```
//!
//! Rail files are caches: they can always be rebuilt from the index, so a
//! rail that fails validation is rebuilt rather than reported. A `LOADED`
//! store is immutable and shared by reader threads without locking.

use std::path::{Path, PathBuf};

use railstat_core::{
    DocId, FieldPostings, Generation, IndexSnapshot, RailError, RailResult, TermDictionary,
    TermId, HOLE_TERM_ID,
};
use tracing::{debug, info, warn};

use super::builder::RailBuilder;
use super::format::{RailHeader, SLOT_BYTES};
use super::lock::BuildLock;
use super::mapped::{RailData, RailSlice};
use crate::config::RailConfig;

/// How a store handle came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RailOrigin {
    /// Valid file found on disk
    Loaded,
    /// Rebuilt from the index by this call
    Built,
}

/// The rail of one field, ready for scanning.
#[derive(Debug)]
pub struct RailStore {
    field: String,
    path: Option<PathBuf>,
    generation: Generation,
    dictionary_size: usize,
    /// Prefix sums of doc lengths in slots, `doc_count + 1` entries
    offsets: Vec<u64>,
    /// Byte offset of the payload
    payload_start: usize,
    data: RailData,
    origin: RailOrigin,
}

impl RailStore {
    /// Build-or-load the rail of `field` with the default configuration.
    pub fn for_field(field: &str, index: &dyn IndexSnapshot) -> RailResult<RailStore> {
        Self::for_field_with_config(field, index, &RailConfig::default())
    }

    /// Build-or-load the rail of `field`.
    ///
    /// Returns a loaded store whose generation equals the live generation.
    /// Stale or malformed files are rebuilt under the build lock; after the
    /// lock is taken the file is checked again, since another builder may
    /// have produced it meanwhile.
    ///
    /// # Errors
    ///
    /// - [`RailError::FieldNotIndexed`] if the field is missing or has no positions
    /// - [`RailError::LockContention`] under the fail-fast lock policy
    /// - I/O errors while building
    pub fn for_field_with_config(
        field: &str,
        index: &dyn IndexSnapshot,
        config: &RailConfig,
    ) -> RailResult<RailStore> {
        let postings = field_postings(field, index)?;
        let path = config.rail_path(index.directory(), field)?;
        let live = index.generation();
        let dictionary_size = postings.dictionary().size();

        // Fast path: valid file on disk
        if let Some(store) = Self::try_open(&path, live, dictionary_size)? {
            info!(
                target: "railstat::rail",
                field,
                path = %path.display(),
                generation = %live,
                docs = store.doc_count(),
                "Loaded rail"
            );
            return Ok(store);
        }

        // Slow path: build under the lock
        let lock = BuildLock::acquire(&BuildLock::path_for(&path), config.lock_policy()?)?;
        if let Some(store) = Self::try_open(&path, live, dictionary_size)? {
            info!(
                target: "railstat::rail",
                field,
                path = %path.display(),
                "Loaded rail built by another builder"
            );
            return Ok(store);
        }

        info!(target: "railstat::rail", field, generation = %live, "Building rail");
        RailBuilder::new(field, postings, index.doc_count(), live)
            .sync(config.sync)
            .build(&path)?;
        drop(lock);

        let mut store = Self::open(&path, live, dictionary_size)?;
        store.origin = RailOrigin::Built;
        Ok(store)
    }

    /// Load an existing rail file without building.
    ///
    /// # Errors
    ///
    /// - [`RailError::Format`] if the header disagrees with the file size
    /// - [`RailError::VersionMismatch`] if the file was built from another generation
    pub fn open(
        path: &Path,
        live_generation: Generation,
        dictionary_size: usize,
    ) -> RailResult<RailStore> {
        let data = RailData::map(path)?;
        let field = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut store = Self::from_data(data, path, field, live_generation, dictionary_size)?;
        store.path = Some(path.to_path_buf());
        Ok(store)
    }

    /// Build the rail of `field` straight into memory; no file, no lock.
    pub fn in_memory(field: &str, index: &dyn IndexSnapshot) -> RailResult<RailStore> {
        let postings = field_postings(field, index)?;
        let live = index.generation();
        let bytes = RailBuilder::new(field, postings, index.doc_count(), live).build_in_memory()?;
        let mut store = Self::from_data(
            RailData::Owned(bytes),
            Path::new(field),
            field.to_string(),
            live,
            postings.dictionary().size(),
        )?;
        store.origin = RailOrigin::Built;
        Ok(store)
    }

    /// Wrap an encoded rail held in memory.
    pub fn from_bytes(
        field: &str,
        bytes: Vec<u8>,
        live_generation: Generation,
        dictionary_size: usize,
    ) -> RailResult<RailStore> {
        Self::from_data(
            RailData::Owned(bytes),
            Path::new(field),
            field.to_string(),
            live_generation,
            dictionary_size,
        )
    }

    fn from_data(
        data: RailData,
        path: &Path,
        field: String,
        live_generation: Generation,
        dictionary_size: usize,
    ) -> RailResult<RailStore> {
        let header = RailHeader::parse(data.as_bytes(), path)?;
        if header.generation != live_generation {
            return Err(RailError::VersionMismatch {
                stored: header.generation,
                live: live_generation,
            });
        }
        let offsets = header.slot_offsets();
        let payload_start = RailHeader::byte_len(header.doc_count());
        debug!(
            target: "railstat::rail",
            field = %field,
            docs = header.doc_count(),
            tokens = header.total_tokens(),
            mapped = data.is_mapped(),
            "Rail header validated"
        );
        Ok(RailStore {
            field,
            path: None,
            generation: header.generation,
            dictionary_size,
            offsets,
            payload_start,
            data,
            origin: RailOrigin::Loaded,
        })
    }

    /// `Ok(None)` when the file is missing or must be rebuilt.
    fn try_open(
        path: &Path,
        live: Generation,
        dictionary_size: usize,
    ) -> RailResult<Option<RailStore>> {
        match Self::open(path, live, dictionary_size) {
            Ok(store) => Ok(Some(store)),
            Err(RailError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(target: "railstat::rail", path = %path.display(), "No rail on disk");
                Ok(None)
            }
            Err(e) if e.is_stale() => {
                warn!(
                    target: "railstat::rail",
                    path = %path.display(),
                    error = %e,
                    "Rail is stale, rebuilding"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Number of positions of `doc`; 0 for documents outside the rail.
    #[inline]
    pub fn rail_length(&self, doc: DocId) -> usize {
        let d = doc as usize;
        match (self.offsets.get(d), self.offsets.get(d + 1)) {
            (Some(&start), Some(&end)) => (end - start) as usize,
            _ => 0,
        }
    }

    /// Term id at `position` of `doc`, or `None` out of range.
    #[inline]
    pub fn rail_term_at(&self, doc: DocId, position: usize) -> Option<TermId> {
        self.rail_slice(doc).get(position)
    }

    /// View of the rail of `doc`; empty for documents outside the rail.
    #[inline]
    pub fn rail_slice(&self, doc: DocId) -> RailSlice<'_> {
        let d = doc as usize;
        let (start, end) = match (self.offsets.get(d), self.offsets.get(d + 1)) {
            (Some(&start), Some(&end)) => (start as usize, end as usize),
            _ => return RailSlice::new(&[]),
        };
        let bytes = self.data.as_bytes();
        let from = self.payload_start + start * SLOT_BYTES;
        let to = self.payload_start + end * SLOT_BYTES;
        RailSlice::new(&bytes[from..to])
    }

    /// Number of documents in the rail.
    pub fn doc_count(&self) -> u32 {
        (self.offsets.len() - 1) as u32
    }

    /// Total positions across all documents.
    pub fn total_tokens(&self) -> u64 {
        self.offsets.last().copied().unwrap_or(0)
    }

    /// Generation stamped in the file.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Size of the dictionary scans run against.
    pub fn dictionary_size(&self) -> usize {
        self.dictionary_size
    }

    /// Field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Backing file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether this handle was loaded or rebuilt.
    pub fn origin(&self) -> RailOrigin {
        self.origin
    }

    /// True if the index has moved to another generation.
    pub fn is_stale(&self, index: &dyn IndexSnapshot) -> bool {
        self.generation != index.generation()
    }

    /// Space-separated terms of `doc`, holes omitted.
    ///
    /// At most `limit` positions are rendered; longer rails end with `[…]`.
    pub fn render(
        &self,
        doc: DocId,
        dictionary: &dyn TermDictionary,
        limit: usize,
    ) -> RailResult<String> {
        let slice = self.rail_slice(doc);
        let mut words = Vec::new();
        for (position, term) in slice.iter().take(limit).enumerate() {
            if term == HOLE_TERM_ID {
                continue;
            }
            let bytes = dictionary
                .bytes_of(term)
                .ok_or_else(|| RailError::UnknownTermId {
                    term_id: term,
                    dictionary_size: dictionary.size(),
                    doc_id: doc,
                    position: position as u32,
                })?;
            words.push(String::from_utf8_lossy(bytes).into_owned());
        }
        if slice.len() > limit {
            words.push("[…]".to_string());
        }
        Ok(words.join(" "))
    }
}

fn field_postings<'a>(
    field: &str,
    index: &'a dyn IndexSnapshot,
) -> RailResult<&'a dyn FieldPostings> {
    let postings = index.field(field).ok_or_else(|| RailError::FieldNotIndexed {
        field: field.to_string(),
        reason: "no such field in the index".to_string(),
    })?;
    if !postings.has_positions() {
        return Err(RailError::FieldNotIndexed {
            field: field.to_string(),
            reason: "field was indexed without positions".to_string(),
        });
    }
    Ok(postings)
}
