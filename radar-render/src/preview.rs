//! Channel previews in two sizes.
//!
//! A preview is `title`, `body`, `link`, `tags` and the subscribe promo,
//! separated by blank lines. The photo caption variant must stay within
//! [`PreviewSettings::with_image_limit`] visible characters and the plain
//! message within [`PreviewSettings::without_image_limit`]. The body gives way
//! first; after that tags go word by word; only then is the title/link text
//! cut, and the promo is shortened only when nothing else is left.

use radar_common::settings::{PreviewSettings, UtmSettings};
use radar_web::urls::with_utm;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::markup::{escape_attr, escape_text, markdown_to_html};
use crate::preamble::{remove_subscribe_promos, strip_redundant_preamble};
use crate::visible::{html_prefix, truncate_html, visible_length, visible_text};

const SEPARATOR: &str = "\n\n";
const SEPARATOR_LEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewKind {
    WithImage,
    WithoutImage,
}

impl PreviewKind {
    pub fn ceiling(self, settings: &PreviewSettings) -> usize {
        match self {
            PreviewKind::WithImage => settings.with_image_limit,
            PreviewKind::WithoutImage => settings.without_image_limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewVariant {
    pub kind: PreviewKind,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewVariants {
    pub with_image: PreviewVariant,
    pub without_image: PreviewVariant,
}

impl PreviewVariants {
    /// The variant to send: the caption when a photo goes along, else the message.
    pub fn pick(&self, has_image: bool) -> &PreviewVariant {
        if has_image {
            &self.with_image
        } else {
            &self.without_image
        }
    }
}

/// Rendered pieces of one preview before fitting.
struct Blocks {
    header: String,
    body: String,
    link: String,
    tags: Vec<String>,
    promo: String,
}

#[derive(Debug, Clone, Default)]
pub struct PreviewRenderer {
    settings: PreviewSettings,
    utm: Option<UtmSettings>,
}

impl PreviewRenderer {
    pub fn new(settings: PreviewSettings) -> Self {
        Self { settings, utm: None }
    }

    /// Tag the "read more" link with campaign parameters.
    pub fn with_utm(mut self, utm: Option<UtmSettings>) -> Self {
        self.utm = utm;
        self
    }

    /// Render both variants. Never fails and never returns an empty text.
    ///
    /// ```
    /// use radar_render::{visible::visible_length, PreviewRenderer};
    ///
    /// let variants = PreviewRenderer::default().render(
    ///     "Новий порядок сплати ЄСВ",
    ///     "**Новий порядок сплати ЄСВ**\n\nДПС пояснює, що змінилося.",
    ///     "https://tax.gov.ua/media-tsentr/novini/945326.html",
    ///     "#ЄСВ #ФОП",
    /// );
    /// assert!(variants.with_image.text.starts_with("<b>Новий порядок сплати ЄСВ</b>\n\nДПС пояснює"));
    /// assert!(visible_length(&variants.with_image.text) <= 1024);
    /// ```
    pub fn render(&self, title: &str, body_md: &str, link_url: &str, tags: &str) -> PreviewVariants {
        let blocks = self.blocks(title, body_md, link_url, tags);
        let with_image = self.fit(&blocks, PreviewKind::WithImage);
        let without_image = self.fit(&blocks, PreviewKind::WithoutImage);
        debug!(
            with_image = visible_length(&with_image.text),
            without_image = visible_length(&without_image.text),
            "preview.render"
        );
        PreviewVariants {
            with_image,
            without_image,
        }
    }

    fn blocks(&self, title: &str, body_md: &str, link_url: &str, tags: &str) -> Blocks {
        let title = title.trim();
        let s = &self.settings;

        let body = remove_subscribe_promos(body_md, &s.promo_text);
        let body = markdown_to_html(&strip_redundant_preamble(&body, title));

        let header = if title.is_empty() {
            String::new()
        } else {
            format!("<b>{}</b>", escape_text(title))
        };
        let link_url = with_utm(link_url.trim(), self.utm.as_ref());
        let link = if link_url.is_empty() {
            String::new()
        } else {
            format!("<a href=\"{}\">{}</a>", escape_attr(&link_url), escape_text(&s.link_label))
        };
        let promo = match (s.promo_url.trim(), s.promo_text.trim()) {
            (_, "") => String::new(),
            ("", text) => format!("<b>{}</b>", escape_text(text)),
            (url, text) => format!("<a href=\"{}\"><b>{}</b></a>", escape_attr(url), escape_text(text)),
        };

        Blocks {
            header,
            body,
            link,
            tags: tags.split_whitespace().map(escape_text).collect(),
            promo,
        }
    }

    fn fit(&self, blocks: &Blocks, kind: PreviewKind) -> PreviewVariant {
        let ceiling = kind.ceiling(&self.settings);
        let text = fit_blocks(blocks, ceiling);
        let text = if text.is_empty() { "…".to_string() } else { text };
        PreviewVariant { kind, text }
    }
}

fn assemble(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

fn fit_blocks(blocks: &Blocks, ceiling: usize) -> String {
    let mut tags = blocks.tags.clone();
    loop {
        let tags_line = tags.join(" ");
        let fixed = assemble(&[&blocks.header, &blocks.link, &tags_line, &blocks.promo]);
        let fixed_len = visible_length(&fixed);
        if fixed_len <= ceiling {
            let separator = if fixed.is_empty() { 0 } else { SEPARATOR_LEN };
            let budget = ceiling.saturating_sub(fixed_len + separator);
            let body = smart_cut(&blocks.body, budget);
            return assemble(&[&blocks.header, &body, &blocks.link, &tags_line, &blocks.promo]);
        }
        if tags.pop().is_none() {
            break;
        }
    }

    debug!(ceiling, "preview.shrink.last_resort");
    let main = assemble(&[&blocks.header, &blocks.link]);
    let promo_len = visible_length(&blocks.promo);
    if blocks.promo.is_empty() {
        return truncate_html(&main, ceiling);
    }
    // At least one visible character plus the ellipsis must fit beside the promo.
    if !main.is_empty() && promo_len + SEPARATOR_LEN + 2 <= ceiling {
        let room = ceiling - promo_len - SEPARATOR_LEN;
        return assemble(&[&truncate_html(&main, room), &blocks.promo]);
    }
    truncate_html(&blocks.promo, ceiling)
}

fn ends_sentence(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '…')
}

/// Cut `html` to at most `budget` visible characters, preferring a sentence
/// end at least 40% in, then a line break at least 30% in, then a space.
/// A cut that does not end a sentence gets `…`.
pub fn smart_cut(html: &str, budget: usize) -> String {
    let visible: Vec<char> = visible_text(html).chars().collect();
    if visible.len() <= budget {
        return html.to_string();
    }
    if budget < 2 {
        return String::new();
    }
    let limit = budget - 1;
    let window = &visible[..limit];

    let sentence = window
        .iter()
        .rposition(|c| ends_sentence(*c))
        .filter(|idx| *idx >= budget * 2 / 5)
        .map(|idx| idx + 1);
    let newline = || {
        window
            .iter()
            .rposition(|c| *c == '\n')
            .filter(|idx| *idx >= budget * 3 / 10)
    };
    let space = || window.iter().rposition(|c| c.is_whitespace()).filter(|idx| *idx > 0);
    let mut keep = sentence.or_else(newline).or_else(space).unwrap_or(limit);

    while keep > 0 && matches!(visible[keep - 1], ' ' | '\n' | '\t' | '-' | '•') {
        keep -= 1;
    }
    if keep == 0 {
        return String::new();
    }
    let mut out = html_prefix(html, keep);
    if !ends_sentence(visible[keep - 1]) {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visible::is_balanced;

    const PROMO: &str = r#"<a href="https://t.me/ITTaxRadar"><b>Підпишись на IT Tax Radar</b></a>"#;

    fn render(title: &str, body: &str, tags: &str) -> PreviewVariants {
        PreviewRenderer::default().render(title, body, "https://example.com/article", tags)
    }

    #[test]
    fn both_variants_carry_the_promo() {
        let variants = render("Test title", "**Test title**\n\nSome body text.", "#example");
        for variant in [&variants.with_image, &variants.without_image] {
            assert!(variant.text.contains(PROMO));
            assert_eq!(
                variant.text,
                format!(
                    "<b>Test title</b>\n\nSome body text.\n\n<a href=\"https://example.com/article\">читати далі</a>\n\n#example\n\n{PROMO}"
                )
            );
        }
    }

    #[test]
    fn duplicated_header_lines_are_dropped() {
        let title = "ДПС і НБУ впроваджують новий підхід";
        let body = format!(
            "**{title}**\n\n27 жовтня 2025\n{title}\n\n27 жовтня 2025\n{title}\n\nОсновний текст про ініціативу."
        );
        let variants = render(title, &body, "#UkraineTax");
        for variant in [&variants.with_image, &variants.without_image] {
            assert_eq!(variant.text.matches("27 жовтня 2025").count(), 0);
            assert_eq!(variant.text.matches(title).count(), 1);
        }
    }

    #[test]
    fn long_body_is_cut_at_a_sentence() {
        let body = "Перше речення про податки. ".repeat(100);
        let variants = render("Заголовок", &body, "#ПДФО");
        let text = &variants.with_image.text;
        assert!(visible_length(text) <= 1024);
        assert!(text.contains("податки.\n\n<a href"));
        assert!(text.ends_with(PROMO));
        assert!(visible_length(&variants.without_image.text) <= 4096);
        assert!(variants.without_image.text.len() > variants.with_image.text.len());
    }

    #[test]
    fn cut_without_sentence_end_gets_ellipsis() {
        let cut = smart_cut(&"слово ".repeat(50), 40);
        assert!(cut.ends_with("слово…"));
        assert!(visible_length(&cut) <= 40);
        let cut = smart_cut("<b>дуже довгий жирний текст без крапок</b>", 12);
        assert!(is_balanced(&cut));
        assert!(visible_length(&cut) <= 12);
        assert_eq!(smart_cut("коротко", 40), "коротко");
        assert_eq!(smart_cut("будь-що", 1), "");
    }

    #[test]
    fn trailing_bullets_are_not_left_dangling() {
        let html = format!("{}\n• {}", "а".repeat(30), "б".repeat(40));
        let cut = smart_cut(&html, 35);
        assert!(cut.ends_with("а…"), "{cut}");
    }

    #[test]
    fn pick_follows_image_presence() {
        let variants = render("Т", "Текст.", "");
        assert_eq!(variants.pick(true).kind, PreviewKind::WithImage);
        assert_eq!(variants.pick(false).kind, PreviewKind::WithoutImage);
    }
}
