// CrashSleuth - core/load_order.rs
//
// Load order table parsing and FormID module resolution.
//
// Plugin list lines look like:
//   [00]     Fallout4.esm
//   [FE:01C] ccBGSFO4044-HellfirePowerArmor.esl
// Lines that do not fit this shape (the `PLUGINS:` marker, blank lines) are
// skipped silently.

use crate::core::formid::plugin_index_to_hex;
use crate::core::model::{ExtractedIdentifier, LoadOrderEntry, LoadOrderTable, Segment, SegmentKind};
use regex::Regex;
use std::sync::OnceLock;

/// Module index shared by every light plugin.
pub const LIGHT_MODULE_INDEX: &str = "FE";

fn load_order_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*\[([0-9A-Fa-f]{2}(?::[0-9A-Fa-f]{3})?)\][ \t]+(.+)$")
            .expect("load_order: invalid regex")
    })
}

/// Parse one plugin list line.
pub fn parse_load_order_line(line: &str) -> Option<LoadOrderEntry> {
    let caps = load_order_regex().captures(line)?;
    let filename = caps[2].trim();
    if filename.is_empty() {
        return None;
    }
    let index = caps[1].to_uppercase();
    Some(LoadOrderEntry {
        is_light: index.contains(':'),
        index,
        filename: filename.to_string(),
    })
}

/// Build the load order table from the plugin list segment.
///
/// A missing segment, a segment of another kind, or an empty segment all
/// produce an empty table.
pub fn parse_load_order(segment: Option<&Segment<'_>>) -> LoadOrderTable {
    let mut table = LoadOrderTable::default();

    let Some(segment) = segment.filter(|s| s.kind == SegmentKind::LoadOrder) else {
        return table;
    };

    for entry in segment.lines.iter().filter_map(|l| parse_load_order_line(l)) {
        let map = if entry.is_light {
            &mut table.light
        } else {
            &mut table.standard
        };
        map.insert(entry.index, entry.filename);
        table.total += 1;
    }

    tracing::debug!(
        standard = table.standard.len(),
        light = table.light.len(),
        total = table.total,
        "Load order parsed"
    );
    table
}

/// Filename of the plugin owning `id`, if the load order names it.
///
/// Light plugins (`FE`) are never resolved: which light plugin owns a
/// FormID depends on a sub-index packed into the record bits, which is
/// not decoded here.
pub fn resolve_module<'t>(id: &ExtractedIdentifier, table: &'t LoadOrderTable) -> Option<&'t str> {
    let key = plugin_index_to_hex(id.module_index);
    if key == LIGHT_MODULE_INDEX {
        return None;
    }
    table.standard.get(&key).map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::formid::extract_form_ids;

    fn segment<'a>(kind: SegmentKind, lines: &[&'a str]) -> Segment<'a> {
        Segment {
            kind,
            start_line: 0,
            lines: lines.to_vec(),
        }
    }

    fn sample_table() -> LoadOrderTable {
        let seg = segment(
            SegmentKind::LoadOrder,
            &[
                "PLUGINS:",
                "\t[00]     Fallout4.esm",
                "\t[01]     DLCRobot.esm",
                "\t[0a]\tUnofficial Fallout 4 Patch.esp  ",
                "\t[FE:000] ccBGSFO4001-PipBoy(Black).esl",
                "\t[fe:01c] ccBGSFO4044-HellfirePowerArmor.esl",
                "",
                "\tnot a plugin line",
            ],
        );
        parse_load_order(Some(&seg))
    }

    #[test]
    fn test_parse_standard_and_light_entries() {
        let table = sample_table();
        assert_eq!(table.total, 5);
        assert_eq!(table.standard.len(), 3);
        assert_eq!(table.light.len(), 2);
        assert_eq!(table.standard["0A"], "Unofficial Fallout 4 Patch.esp");
        assert_eq!(table.light["FE:01C"], "ccBGSFO4044-HellfirePowerArmor.esl");
    }

    #[test]
    fn test_missing_or_wrong_segment_gives_empty_table() {
        assert!(parse_load_order(None).is_empty());
        let wrong = segment(SegmentKind::ModuleList, &["[00] Fallout4.esm"]);
        assert!(parse_load_order(Some(&wrong)).is_empty());
        let empty = segment(SegmentKind::LoadOrder, &[]);
        assert_eq!(parse_load_order(Some(&empty)).total, 0);
    }

    #[test]
    fn test_line_grammar() {
        assert!(parse_load_order_line("[00] Fallout4.esm").is_some());
        assert!(parse_load_order_line("[00]Fallout4.esm").is_none());
        assert!(parse_load_order_line("[0] Fallout4.esm").is_none());
        assert!(parse_load_order_line("[FE:01] Light.esl").is_none());
        assert!(parse_load_order_line("[00]    ").is_none());
        let entry = parse_load_order_line("  [FE:abc]\tSome Light.esl").unwrap();
        assert_eq!(entry.index, "FE:ABC");
        assert!(entry.is_light);
    }

    #[test]
    fn test_resolve_standard_module() {
        let table = sample_table();
        let ids = extract_form_ids(&["FormID: 0x0A001234", "FormID: 0x02000001"]);
        assert_eq!(
            resolve_module(&ids[0], &table),
            Some("Unofficial Fallout 4 Patch.esp")
        );
        assert_eq!(resolve_module(&ids[1], &table), None);
    }

    #[test]
    fn test_light_modules_are_not_resolved() {
        let table = sample_table();
        let ids = extract_form_ids(&["FormID: 0xFE01C800"]);
        assert_eq!(resolve_module(&ids[0], &table), None);
    }
}
