// CrashSleuth - core/formid.rs
//
// FormID extraction from crash log lines.
//
// Grammar: `Form ID`/`FormID`, optional colon and space, `0x`, exactly eight
// hex digits, word boundary. Case-insensitive. Identifiers in the dynamic
// `FF` range are dropped; the null FormID `00000000` is always kept because
// a null reference is itself a useful clue.

use crate::core::model::ExtractedIdentifier;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Module index reserved for runtime-created (non-persistent) forms.
const DYNAMIC_MODULE_INDEX: u8 = 0xFF;

/// The null FormID.
const NULL_FORM_ID: &str = "00000000";

fn form_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)Form ?ID:? ?0x([0-9A-F]{8})\b").expect("formid: invalid regex")
    })
}

/// Extract every FormID from `lines`, in line order and left to right.
pub fn extract_form_ids<L: AsRef<str>>(lines: &[L]) -> Vec<ExtractedIdentifier> {
    let re = form_id_regex();
    let mut found = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        for caps in re.captures_iter(line.as_ref()) {
            let full_hex = caps[1].to_uppercase();
            let Some(module_index) = parse_plugin_index(&full_hex) else {
                continue;
            };
            if module_index == DYNAMIC_MODULE_INDEX && full_hex != NULL_FORM_ID {
                continue;
            }
            found.push(ExtractedIdentifier {
                record_index: full_hex[2..].to_string(),
                full_hex,
                module_index,
                line_number: idx + 1,
            });
        }
    }

    tracing::trace!(lines = lines.len(), form_ids = found.len(), "FormIDs extracted");
    found
}

/// Count how often each distinct FormID occurs.
pub fn count_occurrences(ids: &[ExtractedIdentifier]) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for id in ids {
        *counts.entry(id.full_hex.clone()).or_insert(0) += 1;
    }
    counts
}

/// Module index encoded in the first two hex digits of `hex`.
pub fn parse_plugin_index(hex: &str) -> Option<u8> {
    hex.get(..2).and_then(|h| u8::from_str_radix(h, 16).ok())
}

/// Two-digit uppercase hex form of a module index.
pub fn plugin_index_to_hex(index: u8) -> String {
    format!("{index:02X}")
}
