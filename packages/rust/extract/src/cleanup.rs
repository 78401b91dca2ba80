//! Post-extraction cleanup pipeline for plain article text.
//!
//! Each cleanup pass is a function `&str -> String` applied in sequence.
//! The pipeline removes citation leftovers and normalizes whitespace so that
//! character counts reflect readable prose only.

use std::sync::LazyLock;

use regex::Regex;

/// Run the full cleanup pipeline on extracted text.
pub(crate) fn run_pipeline(text: &str) -> String {
    let mut result = text.to_string();

    result = strip_citation_markers(&result);
    result = strip_empty_brackets(&result);
    result = collapse_inline_whitespace(&result);
    result = fix_space_before_punctuation(&result);
    result = drop_blank_lines(&result);

    result
}

// ---------------------------------------------------------------------------
// Pass 1: Citation markers
// ---------------------------------------------------------------------------

/// Remove reference markers such as `[1]`, `[a]` or `[Anm. 3]` that survived
/// outside of `<sup class="reference">`.
fn strip_citation_markers(text: &str) -> String {
    static CITE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\[\s*(?:\d{1,3}|[a-z]|Anm\.\s*\d{1,3}|Anmerkung\s*\d{1,3}|citation needed)\s*\]")
            .expect("valid regex")
    });

    CITE_RE.replace_all(text, "").to_string()
}

// ---------------------------------------------------------------------------
// Pass 2: Empty brackets
// ---------------------------------------------------------------------------

/// Remove brackets left empty after pronunciation or audio widgets were dropped.
fn strip_empty_brackets(text: &str) -> String {
    static EMPTY_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\(\s*[,;]?\s*\)").expect("valid regex"));

    EMPTY_RE.replace_all(text, "").to_string()
}

// ---------------------------------------------------------------------------
// Pass 3: Inline whitespace
// ---------------------------------------------------------------------------

/// Collapse runs of spaces/tabs within each line and trim line ends.
fn collapse_inline_whitespace(text: &str) -> String {
    static WS_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[ \t\u{a0}]{2,}").expect("valid regex"));

    text.lines()
        .map(|line| WS_RE.replace_all(line.trim(), " ").to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Pass 4: Space before punctuation
// ---------------------------------------------------------------------------

/// `Wort , Wort .` → `Wort, Wort.` (typical after removing inline markers).
fn fix_space_before_punctuation(text: &str) -> String {
    static PUNCT_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r" +([,.;:!?])").expect("valid regex"));

    PUNCT_RE.replace_all(text, "$1").to_string()
}

// ---------------------------------------------------------------------------
// Pass 5: Blank lines
// ---------------------------------------------------------------------------

/// Drop lines that became empty; paragraphs are separated by a single newline.
fn drop_blank_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
