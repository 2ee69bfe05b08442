// CrashSleuth - app/mod.rs
//
// Application layer: orchestrates platform reads and core analysis.

pub mod scan;
