// CrashSleuth - core/export.rs
//
// CSV and JSON export of analysis results.
// Core layer: writes to any Write trait object.

use crate::core::model::SuspectMatch;
use crate::util::error::ExportError;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Export suspect matches to CSV.
///
/// Writes: form_id, plugin, description, count
pub fn export_csv<W: Write>(
    matches: &[SuspectMatch],
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let csv_err = |source| ExportError::Csv {
        path: export_path.to_path_buf(),
        source,
    };

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer
        .write_record(["form_id", "plugin", "description", "count"])
        .map_err(csv_err)?;

    for m in matches {
        csv_writer
            .write_record([
                m.form_id.as_str(),
                m.plugin.as_str(),
                m.description.as_deref().unwrap_or(""),
                m.count.to_string().as_str(),
            ])
            .map_err(csv_err)?;
    }

    csv_writer.flush().map_err(|source| ExportError::Io {
        path: export_path.to_path_buf(),
        source,
    })?;

    Ok(matches.len())
}

/// Export any serialisable report as pretty-printed JSON.
pub fn export_json<W: Write, T: Serialize + ?Sized>(
    report: &T,
    writer: W,
    export_path: &Path,
) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, report).map_err(|source| ExportError::Json {
        path: export_path.to_path_buf(),
        source,
    })
}
