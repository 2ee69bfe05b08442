// CrashSleuth - platform/mod.rs
//
// Platform abstraction layer: directories, config.toml, file reads.
// Must NOT depend on: app.

pub mod config;
pub mod fs;
