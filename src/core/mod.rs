// CrashSleuth - core/mod.rs
//
// Core business logic layer.
// Must NOT depend on: platform or app. File contents arrive as strings;
// the only I/O here is discovery metadata and the FormID databases.

pub mod analyzer;
pub mod discovery;
pub mod export;
pub mod formid;
pub mod load_order;
pub mod lookup;
pub mod model;
pub mod segmenter;
