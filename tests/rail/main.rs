#[path = "../common/mod.rs"]
mod common;

mod concurrency;
mod locking;
mod staleness;
