//! Visible-length accounting for channel HTML.
//!
//! The channel counts what the reader sees: tags are free and an entity such
//! as `&amp;` is one character. All counts are Unicode scalar values.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Tag(&'a str),
    /// Source slice (a char or a whole entity) and what it displays as.
    Text(&'a str, char),
}

fn decode_entity(entity: &str) -> char {
    match entity {
        "&amp;" => '&',
        "&lt;" => '<',
        "&gt;" => '>',
        "&quot;" => '"',
        "&#39;" | "&#x27;" | "&apos;" => '\'',
        "&nbsp;" => ' ',
        _ => entity
            .strip_prefix("&#")
            .and_then(|e| e.strip_suffix(';'))
            .and_then(|num| match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => num.parse().ok(),
            })
            .and_then(char::from_u32)
            .unwrap_or('\u{fffd}'),
    }
}

const NAMED_ENTITIES: &[&str] = &["amp", "lt", "gt", "quot", "apos", "nbsp"];

fn entity_len(rest: &str) -> Option<usize> {
    let end = rest.char_indices().take(12).find(|(_, c)| *c == ';')?.0;
    let body = &rest[1..end];
    let valid = match body.strip_prefix('#') {
        Some(num) => match num.strip_prefix(['x', 'X']) {
            Some(hex) => !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()),
            None => !num.is_empty() && num.chars().all(|c| c.is_ascii_digit()),
        },
        None => NAMED_ENTITIES.contains(&body),
    };
    valid.then_some(end + 1)
}

fn tokens(html: &str) -> Vec<Token<'_>> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < html.len() {
        let rest = &html[i..];
        let step = if rest.starts_with('<') {
            match rest.find('>') {
                Some(end) => {
                    out.push(Token::Tag(&rest[..=end]));
                    end + 1
                }
                None => {
                    out.push(Token::Text(&rest[..1], '<'));
                    1
                }
            }
        } else if let Some(len) = rest.starts_with('&').then(|| entity_len(rest)).flatten() {
            out.push(Token::Text(&rest[..len], decode_entity(&rest[..len])));
            len
        } else {
            let c = rest.chars().next().unwrap_or(' ');
            out.push(Token::Text(&rest[..c.len_utf8()], c));
            c.len_utf8()
        };
        i += step;
    }
    out
}

fn tag_name(tag: &str) -> (&str, bool) {
    let inner = tag.trim_start_matches('<').trim_end_matches('>');
    let closing = inner.starts_with('/');
    let name = inner
        .trim_start_matches('/')
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or_default();
    (name, closing)
}

fn is_void(tag: &str, name: &str) -> bool {
    tag.ends_with("/>") || matches!(name, "br" | "img" | "hr")
}

/// Characters a reader sees once tags are rendered away.
///
/// ```
/// use radar_render::visible::visible_length;
///
/// assert_eq!(visible_length("<b>Tom &amp; Jerry</b>"), 11);
/// ```
pub fn visible_length(html: &str) -> usize {
    tokens(html)
        .iter()
        .filter(|t| matches!(t, Token::Text(..)))
        .count()
}

/// Decoded visible text.
pub fn visible_text(html: &str) -> String {
    tokens(html)
        .into_iter()
        .filter_map(|t| match t {
            Token::Text(_, c) => Some(c),
            Token::Tag(_) => None,
        })
        .collect()
}

/// The shortest prefix of `html` holding `keep` visible characters, with
/// every tag left open by the cut closed again.
pub fn html_prefix(html: &str, keep: usize) -> String {
    let mut out = String::new();
    let mut open: Vec<&str> = Vec::new();
    let mut count = 0;
    for token in tokens(html) {
        match token {
            Token::Tag(tag) => {
                let (name, closing) = tag_name(tag);
                if closing {
                    if let Some(pos) = open.iter().rposition(|o| *o == name) {
                        open.truncate(pos);
                        out.push_str(tag);
                    }
                } else if count < keep {
                    if !is_void(tag, name) {
                        open.push(name);
                    }
                    out.push_str(tag);
                }
            }
            Token::Text(src, _) => {
                if count == keep {
                    if open.is_empty() {
                        break;
                    }
                    continue;
                }
                out.push_str(src);
                count += 1;
            }
        }
    }
    for name in open.iter().rev() {
        out.push_str("</");
        out.push_str(name);
        out.push('>');
    }
    out
}

/// Every opening tag has a matching close in the right order and no bare
/// `<` remains.
pub fn is_balanced(html: &str) -> bool {
    let mut open: Vec<&str> = Vec::new();
    for token in tokens(html) {
        match token {
            Token::Text("<", _) => return false,
            Token::Text(..) => {}
            Token::Tag(tag) => {
                let (name, closing) = tag_name(tag);
                if closing {
                    if open.pop() != Some(name) {
                        return false;
                    }
                } else if !is_void(tag, name) {
                    open.push(name);
                }
            }
        }
    }
    open.is_empty()
}

/// Hard cut to at most `limit` visible characters, ending with `…` when
/// anything was dropped.
pub fn truncate_html(html: &str, limit: usize) -> String {
    if visible_length(html) <= limit {
        return html.to_string();
    }
    if limit == 0 {
        return String::new();
    }
    let mut cut = html_prefix(html, limit - 1);
    cut.push('…');
    cut
}
