//! Plain-text extraction from rendered MediaWiki article HTML.
//!
//! Takes the HTML of an article body (as returned by the `parse` API), keeps
//! the readable prose and drops everything that is not running text:
//! infoboxes, navigation boxes, tables, figures, reference lists, edit links,
//! and whole boilerplate sections such as "Weblinks" or "Einzelnachweise".
//! A cleanup pipeline then normalizes the remaining text.

mod cleanup;

use scraper::node::{Element, Node};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Options for the HTML-to-text extraction.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Section titles whose content, including subsections, is dropped.
    pub skip_sections: Vec<String>,
    /// Emit section headings as their own lines.
    pub include_headings: bool,
}

// ---------------------------------------------------------------------------
// Ignore lists
// ---------------------------------------------------------------------------

const IGNORE_TAGS: &[&str] = &[
    "script", "style", "table", "noscript", "figure", "math", "link", "meta", "nav", "aside",
    "audio", "video", "img",
];

const IGNORE_CLASSES: &[&str] = &[
    "ambox",
    "catlinks",
    "gallery",
    "hatnote",
    "infobox",
    "metadata",
    "mw-editsection",
    "mw-empty-elt",
    "mw-references-wrap",
    "mwe-math-element",
    "navbox",
    "navigation-not-searchable",
    "noprint",
    "reference",
    "references",
    "reflist",
    "sidebar",
    "thumb",
    "toc",
];

/// Blocks whose text becomes one line of output.
const BLOCK_SELECTOR: &str = "p, h2, h3, h4, h5, h6, li, dd, dt, pre";

const BLOCK_TAGS: &[&str] = &["p", "h2", "h3", "h4", "h5", "h6", "li", "dd", "dt", "pre"];

/// Elements that separate words even when the markup has no whitespace.
const SPACED_TAGS: &[&str] = &["ul", "ol", "li", "dl", "dd", "dt", "div", "p", "blockquote"];

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract the readable plain text of an article.
///
/// Paragraphs and list items become lines joined by `\n`. Headings start or
/// end skipped sections and are only emitted when
/// [`ExtractOptions::include_headings`] is set.
#[instrument(skip_all, fields(html_len = html.len()))]
pub fn extract_text(html: &str, opts: &ExtractOptions) -> String {
    let document = Html::parse_document(html);
    let root = select_content_root(&document).unwrap_or_else(|| document.root_element());
    let selector = Selector::parse(BLOCK_SELECTOR).expect("valid block selector");

    let mut lines: Vec<String> = Vec::new();
    // Heading level of the section currently being skipped.
    let mut skip_level: Option<u8> = None;

    for node in root.select(&selector) {
        if has_ignored_ancestor(&node) || has_block_ancestor(&node) {
            continue;
        }

        let name = node.value().name();

        if let Some(level) = heading_level(name) {
            let mut buf = String::new();
            collect_text(&node, &mut buf);
            let title = normalize_whitespace(&buf);

            if skip_level.is_some_and(|skipped| level <= skipped) {
                skip_level = None;
            }
            if skip_level.is_some() {
                continue;
            }
            if opts.skip_sections.iter().any(|s| s == &title) {
                debug!(section = %title, "skipping section");
                skip_level = Some(level);
                continue;
            }
            if opts.include_headings && !title.is_empty() {
                lines.push(title);
            }
            continue;
        }

        if skip_level.is_some() {
            continue;
        }

        let mut buf = String::new();
        collect_text(&node, &mut buf);
        let text = if name == "pre" {
            buf.trim_matches('\n').to_string()
        } else {
            normalize_whitespace(&buf)
        };

        if !text.is_empty() {
            lines.push(text);
        }
    }

    let text = cleanup::run_pipeline(&lines.join("\n"));
    debug!(chars = text.chars().count(), "extraction complete");
    text
}

/// Find the element holding the article body.
fn select_content_root(document: &Html) -> Option<ElementRef<'_>> {
    let selectors = [
        ".mw-parser-output",
        "#mw-content-text",
        "#bodyContent",
        "body",
    ];
    for sel_str in selectors {
        if let Ok(selector) = Selector::parse(sel_str) {
            if let Some(el) = document.select(&selector).next() {
                return Some(el);
            }
        }
    }
    None
}

/// Append all visible text below `el`, skipping ignored subtrees.
fn collect_text(el: &ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => {
                if should_ignore_element(element) {
                    continue;
                }
                if element.name() == "br" {
                    out.push(' ');
                    continue;
                }
                let spaced = SPACED_TAGS.contains(&element.name());
                if spaced {
                    out.push(' ');
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(&child_el, out);
                }
                if spaced {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn should_ignore_element(element: &Element) -> bool {
    if IGNORE_TAGS.contains(&element.name()) {
        return true;
    }
    if element.attr("role") == Some("navigation") {
        return true;
    }
    element.classes().any(|class| IGNORE_CLASSES.contains(&class))
}

fn has_ignored_ancestor(node: &ElementRef<'_>) -> bool {
    if should_ignore_element(node.value()) {
        return true;
    }
    node.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| should_ignore_element(ancestor.value()))
}

/// Nested blocks (a list inside a list item) are already covered by the outer block.
fn has_block_ancestor(node: &ElementRef<'_>) -> bool {
    node.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| BLOCK_TAGS.contains(&ancestor.value().name()))
}

fn heading_level(name: &str) -> Option<u8> {
    match name {
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn german_opts() -> ExtractOptions {
        ExtractOptions {
            skip_sections: vec![
                "Literatur".into(),
                "Weblinks".into(),
                "Einzelnachweise".into(),
                "Siehe auch".into(),
            ],
            include_headings: false,
        }
    }

    const ARTICLE: &str = r##"<div class="mw-parser-output">
<table class="infobox"><tr><td>Hauptstadt</td><td>Hattuša</td></tr></table>
<p>Die <b>Hethiter</b> waren ein Volk<sup id="cite_ref-1" class="reference"><a href="#cite_note-1">[1]</a></sup> in Anatolien.</p>
<div class="mw-heading mw-heading2"><h2 id="Geschichte">Geschichte</h2><span class="mw-editsection">[<a href="/edit">Bearbeiten</a>]</span></div>
<p>Das Reich entstand um 1600 v. Chr.</p>
<ul><li>Althethitisches Reich<ul><li>Telipinu</li></ul></li><li>Großreich</li></ul>
<div class="mw-heading mw-heading3"><h3 id="Sprache">Sprache</h3></div>
<p>Hethitisch ist eine indogermanische Sprache.</p>
<div class="mw-heading mw-heading2"><h2 id="Literatur">Literatur</h2></div>
<ul><li>Trevor Bryce: The Kingdom of the Hittites.</li></ul>
<div class="mw-heading mw-heading3"><h3 id="Aufsätze">Aufsätze</h3></div>
<p>Ein Aufsatz.</p>
<div class="mw-heading mw-heading2"><h2 id="Rezeption">Rezeption</h2></div>
<p>Die Hethiter wurden im 19. Jahrhundert wiederentdeckt.</p>
<div class="mw-heading mw-heading2"><h2 id="Einzelnachweise">Einzelnachweise</h2></div>
<div class="mw-references-wrap"><ol class="references"><li>Bryce 2005, S. 1.</li></ol></div>
<div role="navigation" class="navbox"><p>Navigationsleiste Alter Orient</p></div>
</div>"##;

    #[test]
    fn extracts_prose_without_noise() {
        let text = extract_text(ARTICLE, &german_opts());

        assert!(text.starts_with("Die Hethiter waren ein Volk in Anatolien."));
        assert!(text.contains("Das Reich entstand um 1600 v. Chr."));
        assert!(text.contains("Hethitisch ist eine indogermanische Sprache."));
        assert!(!text.contains("Hauptstadt"), "infobox must be dropped");
        assert!(!text.contains("[1]"), "reference markers must be dropped");
        assert!(!text.contains("Bearbeiten"), "edit links must be dropped");
        assert!(!text.contains("Navigationsleiste"), "navboxes must be dropped");
    }

    #[test]
    fn skips_configured_sections_with_subsections() {
        let text = extract_text(ARTICLE, &german_opts());

        assert!(!text.contains("Trevor Bryce"));
        assert!(!text.contains("Ein Aufsatz."), "subsection of a skipped section");
        assert!(!text.contains("Bryce 2005"));
        assert!(
            text.contains("wiederentdeckt"),
            "section after a skipped one is kept"
        );
    }

    #[test]
    fn nested_list_items_are_not_duplicated() {
        let text = extract_text(ARTICLE, &german_opts());
        assert_eq!(text.matches("Telipinu").count(), 1);
        assert!(text.contains("Althethitisches Reich Telipinu"));
        assert!(text.contains("Großreich"));
    }

    #[test]
    fn headings_are_omitted_by_default() {
        let text = extract_text(ARTICLE, &german_opts());
        assert!(!text.lines().any(|l| l == "Geschichte"));
    }

    #[test]
    fn headings_can_be_included() {
        let opts = ExtractOptions {
            include_headings: true,
            ..german_opts()
        };
        let text = extract_text(ARTICLE, &opts);
        assert!(text.lines().any(|l| l == "Geschichte"));
        assert!(text.lines().any(|l| l == "Rezeption"));
        assert!(!text.lines().any(|l| l == "Literatur"));
    }

    #[test]
    fn legacy_headline_markup() {
        let html = r#"<div class="mw-parser-output">
<p>Einleitung.</p>
<h2><span class="mw-headline" id="Weblinks">Weblinks</span><span class="mw-editsection">[Bearbeiten]</span></h2>
<ul><li><a href="https://example.org">Offizielle Seite</a></li></ul>
</div>"#;
        let text = extract_text(html, &german_opts());
        assert_eq!(text, "Einleitung.");
    }

    #[test]
    fn paragraphs_are_newline_separated() {
        let html = r#"<div class="mw-parser-output"><p>Eins.</p><p>  Zwei
        drei. </p></div>"#;
        let text = extract_text(html, &ExtractOptions::default());
        assert_eq!(text, "Eins.\nZwei drei.");
    }

    #[test]
    fn empty_body_yields_empty_text() {
        let text = extract_text("<div class=\"mw-parser-output\"></div>", &german_opts());
        assert!(text.is_empty());
    }
}
