//! Cleanup of the header lines drafts tend to repeat.

use std::sync::LazyLock;

use radar_web::dates::looks_like_ua_date;
use radar_web::text::comparable;
use regex::Regex;

/// Drop leading lines that are blank, repeat the title, or are just a date.
pub fn strip_redundant_preamble(text: &str, title: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let title = comparable(title);
    let mut kept: Vec<&str> = Vec::new();
    let mut in_header = true;
    for line in text.lines() {
        if in_header {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let key = comparable(trimmed);
            if (!title.is_empty() && key == title) || looks_like_ua_date(&key) {
                continue;
            }
            in_header = false;
        }
        kept.push(line);
    }
    kept.join("\n").trim().to_string()
}

/// Keep one `**title**` line and a trailing promo, dropping the repeated
/// title/date lines that sit between them.
pub fn rebuild_draft_body(body_md: &str, title: &str, promo_md: Option<&str>) -> String {
    let text = body_md.trim();
    if text.is_empty() {
        return String::new();
    }
    let title = title.trim();
    let title_line = (!title.is_empty()).then(|| format!("**{title}**"));
    let promo = promo_md.map(str::trim).filter(|p| !p.is_empty());

    let mut rest = text;
    if let Some(line) = title_line.as_deref() {
        if let Some(after) = rest.strip_prefix(line) {
            rest = after.trim_start_matches(['\n', ' ']);
        }
    }
    let mut promo_present = false;
    if let Some(promo) = promo {
        if let Some(before) = rest.strip_suffix(promo) {
            rest = before.trim_end();
            promo_present = true;
        }
    }

    let core = strip_redundant_preamble(rest, title);
    let mut parts: Vec<&str> = Vec::new();
    if let Some(line) = title_line.as_deref() {
        parts.push(line);
    }
    if !core.is_empty() {
        parts.push(&core);
    }
    if let (true, Some(promo)) = (promo_present, promo) {
        parts.push(promo);
    }
    parts.join("\n\n")
}

/// Drop every line that carries the subscribe promo, in any wrapping.
pub fn remove_subscribe_promos(text: &str, promo_text: &str) -> String {
    let promo_text = promo_text.trim();
    if promo_text.is_empty() {
        return text.trim().to_string();
    }
    static WRAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\[(*_\-\s]*").expect("wrap regex"));
    let needle = promo_text.to_lowercase();
    text.lines()
        .filter(|line| {
            let unwrapped = WRAP.replace(line, "");
            !unwrapped.to_lowercase().starts_with(&needle)
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
