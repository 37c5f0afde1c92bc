//! Plain-text helpers shared by the extractors.

use std::sync::LazyLock;

use regex::Regex;

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}']+").expect("word regex"));

/// Replace NBSP and other unicode spaces with a plain space; drop BOM and zero-width chars.
pub fn normalize_spaces(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '\u{feff}' | '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{2060}'))
        .map(|c| match c {
            '\u{00a0}' | '\u{2000}'..='\u{200a}' | '\u{202f}' | '\u{205f}' | '\u{3000}' => ' ',
            c => c,
        })
        .collect()
}

/// Collapse every whitespace run into one space and trim.
pub fn collapse_ws(s: &str) -> String {
    normalize_spaces(s).split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trim each line and squeeze blank-line runs to a single blank line.
pub fn clean_paragraphs(s: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    for line in normalize_spaces(s).lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            if out.last().is_some_and(|l| !l.is_empty()) {
                out.push(String::new());
            }
            continue;
        }
        out.push(line);
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

/// Lowercased words of at least `min_len` letters, in order.
pub fn significant_words(text: &str, min_len: usize) -> Vec<String> {
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().trim_matches('\'').to_lowercase())
        .filter(|w| w.chars().count() >= min_len && w.chars().any(char::is_alphabetic))
        .collect()
}

/// At least `needed` of the first `window` significant words occur in `html`.
/// With fewer words than `needed`, all of them must occur.
pub fn words_found_in(html: &str, text: &str, window: usize, needed: usize) -> bool {
    let words: Vec<String> = significant_words(text, 4).into_iter().take(window).collect();
    if words.is_empty() {
        return false;
    }
    let haystack = html.to_lowercase();
    let hits = words.iter().filter(|w| haystack.contains(w.as_str())).count();
    hits >= needed.min(words.len())
}

/// Cap at `max` chars, preferring the last paragraph break past the halfway
/// point, then the last whitespace.
pub fn cap_length(text: &str, max: usize) -> String {
    let text = text.trim();
    let Some((cut, _)) = text.char_indices().nth(max) else {
        return text.to_string();
    };
    let head = &text[..cut];
    if let Some(idx) = head.rfind("\n\n") {
        if head[..idx].chars().count() > max / 2 {
            return head[..idx].trim_end().to_string();
        }
    }
    match head.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => head[..idx].trim_end().to_string(),
        _ => head.to_string(),
    }
}

/// Case-folded, whitespace-collapsed form used for title comparisons.
/// Leading bullets/dashes, surrounding quotes and markdown emphasis, and
/// trailing punctuation are dropped.
pub fn comparable(text: &str) -> String {
    let lowered = collapse_ws(text).to_lowercase();
    let mut s = lowered.as_str();
    s = s.trim_start_matches(|c: char| "-–—•:*#".contains(c) || c.is_whitespace());
    s = s.trim_start_matches(|c: char| "*_\"'«»„“”".contains(c) || c.is_whitespace());
    s = s.trim_end_matches(|c: char| "*_\"'«»„“”.!?:;…,".contains(c) || c.is_whitespace());
    s.to_string()
}
