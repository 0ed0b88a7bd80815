//! Railstat - co-occurrence analytics over memory-mapped term rails
//!
//! For one text field of a sealed full-text index, railstat persists the
//! term id found at every token position of every document (the *rail*)
//! and answers two kinds of analytic queries over arbitrary document
//! subsets: raw term frequencies and windowed co-occurrence counts around
//! pivot terms.
//!
//! # Quick Start
//!
//! ```no_run
//! use railstat::{
//!     CooccurrenceScanner, IndexSnapshot, MemoryDocument, MemoryIndexBuilder, RailStore,
//!     ScanOptions, TermDictionary,
//! };
//!
//! # fn main() -> railstat::RailResult<()> {
//! let mut builder = MemoryIndexBuilder::new("/var/lib/index");
//! builder.add_document(MemoryDocument::new().text("text", "a rose is a rose"));
//! let index = builder.commit();
//!
//! // Build or load the rail of the "text" field
//! let store = RailStore::for_field("text", &index)?;
//!
//! let field = index.field("text").expect("indexed field");
//! let rose = field.dictionary().id_of(b"rose").expect("known term");
//! let result = CooccurrenceScanner::scan(&store, field, &[rose], 2, 2, &ScanOptions::new())?;
//! println!("{} context tokens", result.context_tokens);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - `railstat-core`: ids, errors, bit sets, sparse counters and the
//!   interfaces of the surrounding index
//! - `railstat-engine`: rail files, the build-or-load store and the scanners

pub use railstat_core::*;
pub use railstat_engine::*;
