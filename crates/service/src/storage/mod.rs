//! Storage abstractions for service layer
//!
//! File-backed stores that keep a small map in memory and rewrite the whole
//! JSON document on every mutation.

pub mod json_map_store;
