use std::sync::LazyLock;

use regex::Regex;

const FINAL_RANKING_MARKER: &str = "FINAL RANKING:";

/// Numbered-list entry, e.g. "1. Response A". The printed number is ignored;
/// order of appearance is authoritative.
static NUMBERED_ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\s*Response [A-Z]").expect("numbered entry pattern"));

/// Bare anonymized label, e.g. "Response C".
static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Response [A-Z]").expect("label pattern"));

/// Extracts an ordered list of anonymized labels from free-form ranking text.
///
/// The format is deliberately tolerant because models do not always follow
/// instructions:
/// 1. Text after a literal `FINAL RANKING:` marker is the ranking section;
///    without the marker the whole text is scanned instead.
/// 2. Numbered entries win when present; otherwise any bare label in the
///    section counts, in document order. The no-marker path goes straight
///    to the bare-label scan, so numbered entries carry no special weight
///    there (matching the original protocol, not a stricter grammar).
/// 3. A marker whose section yields nothing parses as empty; the whole-text
///    scan applies only when the marker is absent.
///
/// Duplicate label mentions are kept as-is, and letters outside the actual
/// label set pass through; the aggregator drops unknown labels later.
pub fn parse_ranking_from_text(ranking_text: &str) -> Vec<String> {
    if let Some((_, ranking_section)) = ranking_text.split_once(FINAL_RANKING_MARKER) {
        let numbered: Vec<String> = NUMBERED_ENTRY_RE
            .find_iter(ranking_section)
            .filter_map(|entry| LABEL_RE.find(entry.as_str()))
            .map(|label| label.as_str().to_string())
            .collect();
        if !numbered.is_empty() {
            return numbered;
        }

        return scan_labels(ranking_section);
    }

    scan_labels(ranking_text)
}

fn scan_labels(text: &str) -> Vec<String> {
    LABEL_RE
        .find_iter(text)
        .map(|label| label.as_str().to_string())
        .collect()
}
