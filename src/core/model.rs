// CrashSleuth - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no platform
// dependencies. These types are the shared vocabulary across all layers.

use crate::util::constants;
use crate::util::error::ConfigError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Game
// =============================================================================

/// Target game whose crash logs and FormID database are being analysed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Game {
    Fallout4,
    Skyrim,
}

impl Game {
    /// Tag used on the command line and in config files.
    pub fn tag(&self) -> &'static str {
        match self {
            Game::Fallout4 => "fallout4",
            Game::Skyrim => "skyrim",
        }
    }

    /// Name of the single table inside this game's FormID database.
    pub fn table_name(&self) -> &'static str {
        match self {
            Game::Fallout4 => "Fallout4",
            Game::Skyrim => "Skyrim",
        }
    }

    /// File name of the shipped FormID database.
    pub fn main_store_file(&self) -> String {
        format!("{} {}", self.table_name(), constants::MAIN_STORE_SUFFIX)
    }

    /// File name of the user-maintained FormID database.
    pub fn local_store_file(&self) -> String {
        format!("{} {}", self.table_name(), constants::LOCAL_STORE_SUFFIX)
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Game {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fallout4" | "fo4" => Ok(Game::Fallout4),
            "skyrim" | "skyrimse" | "sse" => Ok(Game::Skyrim),
            _ => Err(ConfigError::UnknownGame { tag: s.to_string() }),
        }
    }
}

// =============================================================================
// Segmentation
// =============================================================================

/// Typed region of a crash log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SegmentKind {
    Header,
    CallStack,
    Registers,
    ModuleList,
    LoadOrder,
    /// Classification of a line with no marker past the header region. Used
    /// only for transitions: such lines join the open segment and never start
    /// one.
    Unknown,
}

/// A contiguous run of lines sharing one segment kind.
///
/// Lines borrow from the source text; the segmenter owns the boundaries and
/// downstream components only read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub kind: SegmentKind,
    /// Zero-based index of the first line of this segment in the document.
    pub start_line: usize,
    pub lines: Vec<&'a str>,
}

/// Crash log generator identified from the header (e.g. `Buffout 4 v1.26.2`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratorInfo {
    pub name: String,
    pub version: String,
}

impl fmt::Display for GeneratorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// Output of the log segmenter.
#[derive(Debug, Clone)]
pub struct SegmentedLog<'a> {
    /// Ordered segments covering every line exactly once.
    pub segments: Vec<Segment<'a>>,
    /// Line count of the whole document. A trailing line terminator yields a
    /// trailing empty line that is counted too.
    pub total_lines: usize,
    pub generator: Option<GeneratorInfo>,
    /// Game version line from the header, e.g. `Fallout 4 v1.10.163`.
    pub game_version: Option<String>,
}

impl<'a> SegmentedLog<'a> {
    /// First segment of the given kind.
    pub fn first(&self, kind: SegmentKind) -> Option<&Segment<'a>> {
        self.segments.iter().find(|s| s.kind == kind)
    }

    /// All call-stack lines in document order. A log may carry both a
    /// probable call stack and a raw stack dump; both are returned.
    pub fn call_stack_lines(&self) -> Vec<&'a str> {
        self.segments
            .iter()
            .filter(|s| s.kind == SegmentKind::CallStack)
            .flat_map(|s| s.lines.iter().copied())
            .collect()
    }
}

// =============================================================================
// FormIDs
// =============================================================================

/// A FormID found in crash log text.
///
/// `full_hex` is always `plugin_index_to_hex(module_index) + record_index`,
/// uppercase throughout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedIdentifier {
    pub full_hex: String,
    pub module_index: u8,
    pub record_index: String,
    /// One-based line number within the lines handed to the extractor.
    pub line_number: usize,
}

// =============================================================================
// Load order
// =============================================================================

/// One `[XX] Plugin.esp` line from the crash log's plugin list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadOrderEntry {
    /// `"0A"` for standard entries, `"FE:01C"` for light entries.
    pub index: String,
    pub filename: String,
    pub is_light: bool,
}

/// Index to filename mapping parsed from one crash log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadOrderTable {
    /// Keys `"00"`..`"FD"`.
    pub standard: BTreeMap<String, String>,
    /// Keys `"FE:000"`..`"FE:FFF"`.
    pub light: BTreeMap<String, String>,
    pub total: usize,
}

impl LoadOrderTable {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

// =============================================================================
// Lookup and analysis output
// =============================================================================

/// A row of the FormID database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupEntry {
    pub module: String,
    pub identifier_key: String,
    pub description: String,
}

/// A distinct FormID from the call stack with its owning plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspectMatch {
    pub form_id: String,
    /// Owning plugin filename, or `Unknown [XX]` when unresolved.
    pub plugin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub count: usize,
}

/// Externally visible output of the forensic pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Ordered by `count`, highest first.
    pub matches: Vec<SuspectMatch>,
    pub store_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_from_tag() {
        assert_eq!("fallout4".parse::<Game>().unwrap(), Game::Fallout4);
        assert_eq!(" Skyrim ".parse::<Game>().unwrap(), Game::Skyrim);
        assert!(matches!(
            "morrowind".parse::<Game>(),
            Err(ConfigError::UnknownGame { .. })
        ));
    }

    #[test]
    fn test_store_file_names() {
        assert_eq!(Game::Fallout4.main_store_file(), "Fallout4 FormIDs Main.db");
        assert_eq!(Game::Skyrim.local_store_file(), "Skyrim FormIDs Local.db");
    }

    #[test]
    fn test_suspect_match_json_shape() {
        let m = SuspectMatch {
            form_id: "000EAFB6".to_string(),
            plugin: "Fallout4.esm".to_string(),
            description: None,
            count: 2,
        };
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["formId"], "000EAFB6");
        assert_eq!(json["count"], 2);
        assert!(json.get("description").is_none());
    }
}
