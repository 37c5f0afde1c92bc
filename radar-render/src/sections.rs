//! Splitting rewritten drafts into their long and short posts.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Long,
    Short,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSections {
    pub long: String,
    pub short: Option<String>,
}

const HEADER_SEPARATORS: &[char] = &[':', '—', '-', '–'];

fn section_for(label: &str) -> Option<Section> {
    let label = label.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    match label.as_str() {
        "довгий пост" | "довгий допис" => Some(Section::Long),
        "короткий пост" | "короткий допис" => Some(Section::Short),
        _ => None,
    }
}

/// A header line and whatever follows its separator on the same line.
fn match_header(line: &str) -> Option<(Section, &str)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (label, rest) = HEADER_SEPARATORS
        .iter()
        .find_map(|sep| line.split_once(*sep))
        .map(|(label, rest)| (label.trim(), rest.trim()))
        .unwrap_or((line, ""));
    section_for(label).map(|section| (section, rest))
}

fn normalize_lines(lines: &[&str]) -> String {
    let mut out: Vec<&str> = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            if out.last().is_some_and(|l| !l.is_empty()) {
                out.push("");
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

/// Split on "Довгий пост"/"Короткий пост" headers (or "допис").
///
/// Text before any header belongs to the long post; a lone short post also
/// serves as the long one.
pub fn split_post_sections(raw: &str) -> PostSections {
    if raw.trim().is_empty() {
        return PostSections {
            long: String::new(),
            short: None,
        };
    }

    let mut preamble: Vec<&str> = Vec::new();
    let mut long: Option<Vec<&str>> = None;
    let mut short: Option<Vec<&str>> = None;
    let mut current: Option<Section> = None;
    let mut buffer: Vec<&str> = Vec::new();

    for line in raw.lines() {
        if let Some((section, rest)) = match_header(line) {
            let taken = std::mem::take(&mut buffer);
            match current {
                Some(Section::Long) => long = Some(taken),
                Some(Section::Short) => short = Some(taken),
                None => preamble.extend(taken),
            }
            current = Some(section);
            if !rest.is_empty() {
                buffer.push(rest);
            }
            continue;
        }
        buffer.push(line);
    }
    match current {
        Some(Section::Long) => long = Some(buffer),
        Some(Section::Short) => short = Some(buffer),
        None => preamble.extend(buffer),
    }

    let long_lines = long.filter(|l| !l.is_empty()).unwrap_or(preamble);
    let long_text = normalize_lines(&long_lines);
    let short_text = short
        .map(|lines| normalize_lines(&lines))
        .filter(|s| !s.is_empty());

    PostSections {
        long: if long_text.is_empty() {
            short_text.clone().unwrap_or_default()
        } else {
            long_text
        },
        short: short_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiline_sections() {
        let payload = "Довгий пост:\n    Перший абзац.\n\n    Другий абзац.\n\n    Короткий пост:\n    Стислий підсумок.";
        let sections = split_post_sections(payload);
        assert_eq!(sections.long, "Перший абзац.\n\nДругий абзац.");
        assert_eq!(sections.short.as_deref(), Some("Стислий підсумок."));
    }

    #[test]
    fn inline_headers() {
        let sections = split_post_sections("Довгий пост: Деталі рішення.\nКороткий пост – Коротко.");
        assert_eq!(sections.long, "Деталі рішення.");
        assert_eq!(sections.short.as_deref(), Some("Коротко."));
    }

    #[test]
    fn plain_text_is_the_long_post() {
        let sections = split_post_sections("Просто текст без структурованих розділів.");
        assert_eq!(sections.long, "Просто текст без структурованих розділів.");
        assert_eq!(sections.short, None);
    }

    #[test]
    fn short_only_doubles_as_long() {
        let sections = split_post_sections("Короткий допис: Лаконічний варіант.");
        assert_eq!(sections.long, "Лаконічний варіант.");
        assert_eq!(sections.short.as_deref(), Some("Лаконічний варіант."));
    }

    #[test]
    fn ordinary_lines_with_dashes_are_not_headers() {
        let sections = split_post_sections("ПДФО - 18%\nВЗ - 5%");
        assert_eq!(sections.long, "ПДФО - 18%\nВЗ - 5%");
    }
}
