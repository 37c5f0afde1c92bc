//! Article body extraction.
//!
//! The extractor finds the headline (or the block that repeats the feed
//! title), walks the document in pre-order from that point, and collects
//! paragraphs, sub-headings, list items and table rows until a share/related
//! marker or a stop phrase ends the article. Two fallbacks follow when that
//! produces nothing usable: the best-scoring content container, then every
//! paragraph in the document.

use std::collections::HashSet;
use std::sync::LazyLock;

use radar_common::settings::ExtractSettings;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::dates::is_date_only;
use crate::dom::{self, Noise};
use crate::text::{cap_length, comparable, words_found_in};

static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").expect("h1 selector"));
static ANCHOR_CANDIDATES: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("body h1, body h2, body h3, body p, body div, body strong, body b, body span")
        .expect("anchor selector")
});
static CONTAINERS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        ".article__content",
        ".article__body",
        ".article__text",
        ".news__content",
        ".news__text",
        "[itemprop=articleBody]",
        "main article",
        "article",
        "main",
        "[role=main]",
        "section",
    ]
    .into_iter()
    .map(|css| Selector::parse(css).expect("container selector"))
    .collect()
});
static PARAGRAPHS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p, div").expect("paragraph selector"));

/// Bonus for a container that also holds the headline.
const HEADLINE_BONUS: usize = 50;
const MAX_ANCESTOR_HOPS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    ListItem,
    Heading,
    TableRow,
}

impl BlockKind {
    fn is_line_item(self) -> bool {
        matches!(self, BlockKind::ListItem | BlockKind::TableRow)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentBlock {
    pub text: String,
    pub kind: BlockKind,
}

#[derive(Debug, Clone, Copy)]
enum Pass {
    Headline,
    Container,
    Paragraphs,
}

/// How extracted text must look before it is accepted.
#[derive(Debug, Clone, Copy)]
enum Gate {
    Standard,
    Reliable,
}

#[derive(Debug, Clone, Default)]
pub struct BodyExtractor {
    settings: ExtractSettings,
}

impl BodyExtractor {
    pub fn new(settings: ExtractSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ExtractSettings {
        &self.settings
    }

    /// Body text, or `None` when no pass produced text that passes the
    /// validity gate. Never returns an empty string.
    pub fn extract(&self, html: &str, title: Option<&str>) -> Option<String> {
        self.run(html, title, Gate::Standard)
    }

    /// Stricter variant for critical sites: a minimum length and a word
    /// match against the source are both required.
    pub fn extract_reliable(&self, html: &str, title: Option<&str>) -> Option<String> {
        self.run(html, title, Gate::Reliable)
    }

    /// Blocks from the headline walk alone, without fallbacks or gating.
    pub fn extract_blocks(&self, html: &str, title: Option<&str>) -> Vec<ContentBlock> {
        let doc = Html::parse_document(html);
        let title_key = title_key(title);
        self.primary_pass(&doc, title_key.as_deref())
    }

    fn run(&self, html: &str, title: Option<&str>, gate: Gate) -> Option<String> {
        let doc = Html::parse_document(html);
        let title_key = title_key(title);
        let title_key = title_key.as_deref();

        for pass in [Pass::Headline, Pass::Container, Pass::Paragraphs] {
            let blocks = match pass {
                Pass::Headline => self.primary_pass(&doc, title_key),
                Pass::Container => self.container_pass(&doc, title_key),
                Pass::Paragraphs => self.paragraph_pass(&doc, title_key),
            };
            if blocks.is_empty() {
                continue;
            }
            let text = join_blocks(&blocks);
            if self.passes_gate(html, &text, blocks.len(), gate) {
                debug!(?pass, blocks = blocks.len(), chars = text.chars().count(), "extract.body");
                let body = cap_length(&text, self.settings.max_body_chars);
                return (!body.is_empty()).then_some(body);
            }
            debug!(?pass, ?gate, blocks = blocks.len(), "extract.body.rejected");
        }
        None
    }

    fn passes_gate(&self, html: &str, text: &str, blocks: usize, gate: Gate) -> bool {
        let s = &self.settings;
        let chars = text.chars().count();
        let words = words_found_in(html, text, s.word_window, s.word_matches);
        match gate {
            Gate::Standard => (chars >= s.min_body_chars && blocks >= s.min_blocks) || words,
            Gate::Reliable => chars >= s.critical_min_chars && words,
        }
    }

    fn primary_pass(&self, doc: &Html, title: Option<&str>) -> Vec<ContentBlock> {
        let Some(anchor) = find_anchor(doc, title) else {
            return Vec::new();
        };
        let mut walk = Walk::new(&self.settings, title, Some(anchor));
        walk.visit(doc.root_element());
        walk.blocks
    }

    fn container_pass(&self, doc: &Html, title: Option<&str>) -> Vec<ContentBlock> {
        let headline = doc.select(&H1).next();
        let mut candidates: Vec<ElementRef<'_>> = Vec::new();
        for selector in CONTAINERS.iter() {
            if let Some(el) = doc.select(selector).next() {
                push_unique(&mut candidates, el);
            }
        }
        if let Some(h1) = headline {
            for el in h1
                .ancestors()
                .filter_map(ElementRef::wrap)
                .filter(|el| !matches!(dom::name(el), "body" | "html"))
                .take(MAX_ANCESTOR_HOPS)
            {
                push_unique(&mut candidates, el);
            }
        }

        let mut best: Option<(usize, Vec<ContentBlock>)> = None;
        for container in candidates {
            let mut walk = Walk::new(&self.settings, title, None);
            walk.visit(container);
            if walk.blocks.is_empty() {
                continue;
            }
            let mut score: usize = walk.blocks.iter().map(|b| b.text.chars().count()).sum();
            if headline.is_some_and(|h1| dom::is_within(h1, container)) {
                score += HEADLINE_BONUS;
            }
            if best.as_ref().is_none_or(|(top, _)| score > *top) {
                best = Some((score, walk.blocks));
            }
        }
        best.map(|(_, blocks)| blocks).unwrap_or_default()
    }

    fn paragraph_pass(&self, doc: &Html, title: Option<&str>) -> Vec<ContentBlock> {
        let mut seen = HashSet::new();
        let mut blocks = Vec::new();
        for el in doc.select(&PARAGRAPHS) {
            if dom::name(&el) == "div" && !dom::is_atomic_div(el) {
                continue;
            }
            if dom::inside_noise(el) || dom::noise(&el) == Some(Noise::Skip) {
                continue;
            }
            let text = dom::text_of(el);
            if text.is_empty()
                || is_date_only(&text)
                || self.has_stop_phrase(&text)
                || title.is_some_and(|t| comparable(&text) == t)
            {
                continue;
            }
            if seen.insert(text.clone()) {
                blocks.push(ContentBlock {
                    text,
                    kind: BlockKind::Paragraph,
                });
            }
        }
        blocks
    }

    fn has_stop_phrase(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.settings
            .stop_phrases
            .iter()
            .any(|phrase| lower.contains(&phrase.to_lowercase()))
    }
}

fn push_unique<'a>(list: &mut Vec<ElementRef<'a>>, el: ElementRef<'a>) {
    if !list.iter().any(|c| c.id() == el.id()) {
        list.push(el);
    }
}

fn title_key(title: Option<&str>) -> Option<String> {
    title.map(comparable).filter(|t| !t.is_empty())
}

/// The first `h1`, unless a title is given and some other block repeats it.
fn find_anchor<'a>(doc: &'a Html, title: Option<&str>) -> Option<ElementRef<'a>> {
    let h1 = doc.select(&H1).next();
    let Some(title) = title else {
        return h1;
    };
    if h1.is_some_and(|h| comparable(&dom::text_of(h)) == title) {
        return h1;
    }
    doc.select(&ANCHOR_CANDIDATES)
        .find(|el| comparable(&dom::text_of(*el)) == title)
        .or(h1)
}

/// Blocks joined with blank lines; consecutive list items and table rows
/// stay on adjacent lines.
pub fn join_blocks(blocks: &[ContentBlock]) -> String {
    let mut out = String::new();
    let mut previous: Option<BlockKind> = None;
    for block in blocks {
        if let Some(prev) = previous {
            if prev.is_line_item() && block.kind.is_line_item() {
                out.push('\n');
            } else {
                out.push_str("\n\n");
            }
        }
        out.push_str(&block.text);
        previous = Some(block.kind);
    }
    out
}

/// Pre-order walk that starts collecting after the anchor subtree.
struct Walk<'a, 's> {
    settings: &'s ExtractSettings,
    title: Option<&'s str>,
    anchor: Option<ElementRef<'a>>,
    started: bool,
    stopped: bool,
    blocks: Vec<ContentBlock>,
    seen: HashSet<String>,
}

impl<'a, 's> Walk<'a, 's> {
    fn new(
        settings: &'s ExtractSettings,
        title: Option<&'s str>,
        anchor: Option<ElementRef<'a>>,
    ) -> Self {
        Self {
            settings,
            title,
            started: anchor.is_none(),
            anchor,
            stopped: false,
            blocks: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn visit(&mut self, el: ElementRef<'a>) {
        if self.stopped {
            return;
        }
        if self.anchor.is_some_and(|a| a.id() == el.id()) {
            self.started = true;
            return;
        }
        if !self.started {
            self.descend(el);
            return;
        }

        let tag = dom::name(&el);
        if dom::SKIP_TAGS.contains(&tag) {
            return;
        }
        match dom::noise(&el) {
            Some(Noise::Terminal) => {
                if !self.blocks.is_empty() {
                    self.stopped = true;
                }
                return;
            }
            Some(Noise::Skip) => return,
            None => {}
        }

        match tag {
            "p" | "blockquote" => self.push(dom::text_of(el), BlockKind::Paragraph),
            "h2" | "h3" | "h4" | "h5" | "h6" => self.push(dom::text_of(el), BlockKind::Heading),
            "ul" | "ol" => {
                for li in el
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|c| dom::name(c) == "li")
                {
                    self.push_item(dom::text_of(li));
                    if self.stopped {
                        return;
                    }
                }
            }
            "li" => self.push_item(dom::text_of(el)),
            "tr" => {
                let cells: Vec<String> = el
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|c| matches!(dom::name(c), "td" | "th"))
                    .map(dom::text_of)
                    .filter(|t| !t.is_empty())
                    .collect();
                self.push(cells.join(" — "), BlockKind::TableRow);
            }
            "div" if dom::is_atomic_div(el) => self.push(dom::text_of(el), BlockKind::Paragraph),
            "h1" => {}
            _ => self.descend(el),
        }
    }

    fn descend(&mut self, el: ElementRef<'a>) {
        for child in el.children().filter_map(ElementRef::wrap) {
            self.visit(child);
            if self.stopped {
                return;
            }
        }
    }

    fn push_item(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        self.push(format!("• {text}"), BlockKind::ListItem);
    }

    fn push(&mut self, text: String, kind: BlockKind) {
        if text.is_empty() {
            return;
        }
        let plain = text.trim_start_matches("• ");
        if self.is_stop(plain) {
            self.stopped = true;
            return;
        }
        if self.title.is_some_and(|t| comparable(plain) == t) {
            return;
        }
        if self.blocks.is_empty() && is_date_only(plain) {
            return;
        }
        if self.seen.insert(text.clone()) {
            self.blocks.push(ContentBlock { text, kind });
        }
    }

    fn is_stop(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.settings
            .stop_phrases
            .iter()
            .any(|phrase| lower.contains(&phrase.to_lowercase()))
    }
}
