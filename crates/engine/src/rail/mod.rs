//! Rails: per-document term id arrays persisted next to the index
//!
//! - `format`: bit-exact header layout and validation
//! - `mapped`: owned or memory-mapped bytes and the `RailSlice` view
//! - `lock`: exclusive build lock
//! - `builder`: flattening position lists into a rail file
//! - `store`: build-or-load state machine and O(1) accessors
//! - `cache`: in-process registry of loaded stores

pub mod builder;
pub mod cache;
pub mod format;
pub mod lock;
pub mod mapped;
pub mod store;

pub use builder::RailBuilder;
pub use cache::RailCache;
pub use format::{RailHeader, RAIL_FORMAT_VERSION};
pub use lock::BuildLock;
pub use mapped::RailSlice;
pub use store::{RailOrigin, RailStore};
