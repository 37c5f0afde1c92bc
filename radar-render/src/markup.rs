//! The markdown subset drafts are written in, rendered to channel HTML.
//!
//! Supported: `**bold**`/`__bold__`, `*italic*`/`_italic_`, `` `code` ``,
//! `[text](url)`, `-`/`*`/`•` bullets, `1.` numbered items and `#` headings.
//! Anything else is literal text and gets escaped.

use std::sync::LazyLock;

use regex::Regex;

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#{1,6}\s+(.*)$").expect("heading regex"));
static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*•]\s+(.*)$").expect("bullet regex"));

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

pub fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;").replace('\'', "&#x27;")
}

/// Render a markdown draft to HTML, line by line.
///
/// ```
/// use radar_render::markup::markdown_to_html;
///
/// assert_eq!(
///     markdown_to_html("**ПДВ** & [ДПС](https://tax.gov.ua)\n- пункт"),
///     "<b>ПДВ</b> &amp; <a href=\"https://tax.gov.ua\">ДПС</a>\n• пункт",
/// );
/// ```
pub fn markdown_to_html(markdown: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for raw in markdown.lines() {
        let line = raw.trim();
        if line.is_empty() {
            if lines.last().is_some_and(|l| !l.is_empty()) {
                lines.push(String::new());
            }
            continue;
        }
        let rendered = if let Some(caps) = HEADING_RE.captures(line) {
            format!("<b>{}</b>", inline(&caps[1]))
        } else if let Some(caps) = BULLET_RE.captures(line).filter(|_| !line.starts_with("**")) {
            format!("• {}", inline(&caps[1]))
        } else {
            inline(line)
        };
        lines.push(rendered);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

/// Inline spans of one line.
pub fn inline(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::new();
    render_span(&chars, &mut out);
    out
}

fn render_span(chars: &[char], out: &mut String) {
    let mut i = 0;
    while i < chars.len() {
        if let Some(consumed) = try_code(chars, i, out)
            .or_else(|| try_link(chars, i, out))
            .or_else(|| try_emphasis(chars, i, out))
        {
            i += consumed;
            continue;
        }
        push_escaped(chars[i], out);
        i += 1;
    }
}

fn push_escaped(c: char, out: &mut String) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        c => out.push(c),
    }
}

fn find(chars: &[char], from: usize, needle: &[char]) -> Option<usize> {
    if needle.is_empty() || from > chars.len() {
        return None;
    }
    (from..=chars.len().saturating_sub(needle.len())).find(|&j| chars[j..].starts_with(needle))
}

fn try_code(chars: &[char], i: usize, out: &mut String) -> Option<usize> {
    if chars[i] != '`' {
        return None;
    }
    let end = find(chars, i + 1, &['`'])?;
    if end == i + 1 {
        return None;
    }
    out.push_str("<code>");
    chars[i + 1..end].iter().for_each(|c| push_escaped(*c, out));
    out.push_str("</code>");
    Some(end + 1 - i)
}

fn try_link(chars: &[char], i: usize, out: &mut String) -> Option<usize> {
    if chars[i] != '[' {
        return None;
    }
    let label_end = find(chars, i + 1, &[']', '('])?;
    let url_end = find(chars, label_end + 2, &[')'])?;
    let url: String = chars[label_end + 2..url_end].iter().collect();
    let url = url.trim();
    if url.is_empty() || url.contains(char::is_whitespace) {
        return None;
    }
    out.push_str(&format!("<a href=\"{}\">", escape_attr(url)));
    render_span(&chars[i + 1..label_end], out);
    out.push_str("</a>");
    Some(url_end + 1 - i)
}

fn try_emphasis(chars: &[char], i: usize, out: &mut String) -> Option<usize> {
    let c = chars[i];
    if c != '*' && c != '_' {
        return None;
    }
    // Underscores inside words (snake_case) are literal.
    if c == '_' && i > 0 && chars[i - 1].is_alphanumeric() {
        return None;
    }
    let double = chars.get(i + 1) == Some(&c);
    let (delim, tag): (&[char], &str) = match (c, double) {
        ('*', true) => (&['*', '*'], "b"),
        ('_', true) => (&['_', '_'], "b"),
        ('*', false) => (&['*'], "i"),
        _ => (&['_'], "i"),
    };
    let start = i + delim.len();
    if chars.get(start).is_none_or(|c| c.is_whitespace()) {
        return None;
    }
    let end = find(chars, start + 1, delim)?;
    if end <= start || chars[end - 1].is_whitespace() {
        return None;
    }
    out.push('<');
    out.push_str(tag);
    out.push('>');
    render_span(&chars[start..end], out);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
    Some(end + delim.len() - i)
}
