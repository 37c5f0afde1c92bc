//! Small DOM predicates over `scraper` trees.

use scraper::{ElementRef, Node};

use crate::text::collapse_ws;

/// Tags the body walker collects or descends into as content.
pub const CONTENT_TAGS: &[&str] = &[
    "p", "div", "h2", "h3", "h4", "ul", "ol", "li", "blockquote", "table", "tr", "td",
];

/// Never collected and never descended into.
pub const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "nav", "footer", "aside", "form", "button",
    "svg", "iframe", "select",
];

const BLOCK_BREAKS: &[&str] = &[
    "p", "div", "br", "li", "tr", "td", "th", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote",
    "section", "article", "ul", "ol", "table",
];

const TERMINAL_MARKERS: &[&str] = &["share", "sharing", "social", "related", "tags", "comments"];
const SKIPPED_MARKERS: &[&str] = &["banner", "advert", "adv", "ads", "breadcrumbs", "breadcrumb", "sidebar"];

/// What a class/id marker says about an element's subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Noise {
    /// Share/related/tags blocks: article content has ended.
    Terminal,
    /// Ads and banners: ignore the subtree and keep walking.
    Skip,
}

pub fn name<'a>(el: &ElementRef<'a>) -> &'a str {
    el.value().name()
}

/// A `div` with no content-tag descendants. Such a div is collected whole;
/// any other div is a wrapper to descend into.
pub fn is_atomic_div(el: ElementRef<'_>) -> bool {
    name(&el) == "div" && !has_content_descendant(el)
}

fn has_content_descendant(el: ElementRef<'_>) -> bool {
    el.children().filter_map(ElementRef::wrap).any(|child| {
        CONTENT_TAGS.contains(&name(&child)) || has_content_descendant(child)
    })
}

/// Class and id split into lowercase tokens on `-`, `_` and whitespace.
pub fn marker_tokens(el: &ElementRef<'_>) -> Vec<String> {
    let value = el.value();
    value
        .attr("class")
        .into_iter()
        .chain(value.attr("id"))
        .flat_map(|attr| attr.split(|c: char| c == '-' || c == '_' || c.is_whitespace()))
        .filter(|token| !token.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

pub fn noise(el: &ElementRef<'_>) -> Option<Noise> {
    let tokens = marker_tokens(el);
    if tokens.iter().any(|t| TERMINAL_MARKERS.contains(&t.as_str())) {
        Some(Noise::Terminal)
    } else if tokens.iter().any(|t| SKIPPED_MARKERS.contains(&t.as_str())) {
        Some(Noise::Skip)
    } else {
        None
    }
}

/// Visible text with block boundaries turned into spaces, whitespace collapsed.
pub fn text_of(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    push_text(el, &mut out);
    collapse_ws(&out)
}

fn push_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                let tag = name(&child);
                if SKIP_TAGS.contains(&tag) {
                    continue;
                }
                let block = BLOCK_BREAKS.contains(&tag);
                if block {
                    out.push(' ');
                }
                push_text(child, out);
                if block {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

/// `el` is `ancestor` or lies inside it.
pub fn is_within(el: ElementRef<'_>, ancestor: ElementRef<'_>) -> bool {
    el.id() == ancestor.id() || el.ancestors().any(|node| node.id() == ancestor.id())
}

/// Some ancestor is a skipped tag or carries a noise marker.
pub fn inside_noise(el: ElementRef<'_>) -> bool {
    el.ancestors().filter_map(ElementRef::wrap).any(|a| {
        SKIP_TAGS.contains(&name(&a)) || noise(&a).is_some()
    })
}
