// CrashSleuth - lib.rs
//
// Library entry point, exposing all modules for integration testing and
// for hosts that embed the crash log analysis.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
