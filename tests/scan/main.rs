#[path = "../common/mod.rs"]
mod common;

mod cooccurrence;
mod frequency;
mod properties;
