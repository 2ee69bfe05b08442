// CrashSleuth - platform/fs.rs
//
// Crash log reading. Logs are decoded lossily: crash loggers copy raw
// bytes from game memory into the dump, so invalid UTF-8 is routine.

use std::io;
use std::path::Path;

/// Read a crash log as text.
///
/// Files at or above `large_threshold` bytes are memory-mapped instead of
/// copied into a heap buffer before decoding.
pub fn read_crash_log(path: &Path, large_threshold: u64) -> io::Result<String> {
    let size = std::fs::metadata(path)?.len();
    if size >= large_threshold && size > 0 {
        read_mapped_lossy(path)
    } else {
        read_file_lossy(path)
    }
}

/// Read the full content of a file, replacing invalid UTF-8.
pub fn read_file_lossy(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn read_mapped_lossy(path: &Path) -> io::Result<String> {
    let file = std::fs::File::open(path)?;
    // SAFETY: the map is read-only and dropped before returning. Crash logs
    // are written once by the game and not modified afterwards.
    let mmap = unsafe { memmap2::Mmap::map(&file)? };
    tracing::debug!(file = %path.display(), bytes = mmap.len(), "Reading memory-mapped crash log");
    Ok(String::from_utf8_lossy(&mmap).into_owned())
}
