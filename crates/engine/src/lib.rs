//! Rail engine for railstat
//!
//! This crate turns a sealed index snapshot into scannable rails:
//! - Config: `rail.toml` settings (lock policy, scan strategy, rail directory)
//! - Rail: file format, builder, memory-mapped store, in-process cache
//! - Scan: term frequencies, windowed co-occurrences, term×term edges,
//!   association scores
//!
//! The engine is the only component that touches rail files; scanners only
//! read a loaded `RailStore`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod rail;
pub mod scan;

pub use config::{LockPolicy, RailConfig, CONFIG_FILE_NAME};
pub use rail::{
    BuildLock, RailBuilder, RailCache, RailHeader, RailOrigin, RailSlice, RailStore,
    RAIL_FORMAT_VERSION,
};
pub use scan::{
    score, AssocMeasure, CancellationToken, CooccurrenceScanner, Cooccurrences, Counter,
    EdgeCounts, EdgeScanner, FrequencyScanner, ScanOptions, ScanStrategy,
};
