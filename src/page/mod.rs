/// Read-only page model built from an HTML snapshot.
///
/// Wraps a `scraper` document and turns matched elements into
/// [`CandidateNode`]s carrying their trimmed text and the structural flags
/// the review locator filters on.
pub mod source;

use std::sync::LazyLock;

use scraper::node::Element;
use scraper::{ElementRef, Html, Selector};

pub use source::{ContentWatcher, PageSource, Source};

/// Id fragment carried by every element this tool injects into a page.
pub const OWN_UI_MARKER: &str = "sentiment-";

const INTERACTIVE_TAGS: &[&str] = &["button", "a", "input", "select", "option"];
const NAVIGATION_TAGS: &[&str] = &["nav", "header", "footer"];
const SCRIPT_TAGS: &[&str] = &["script", "style"];
const UNRENDERED_TAGS: &[&str] = &["head", "template", "noscript", "title", "meta", "link"];

/// Structural facts about a node, relative to its position in the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeFlags {
    /// Inside (or is) a `nav`, `header` or `footer` element.
    pub in_navigation: bool,
    /// The node itself is a button, link or form control.
    pub interactive: bool,
    /// Inside (or is) a `script` or `style` element.
    pub in_script: bool,
    /// Would not be rendered: hidden by attribute, inline style or an
    /// unrendered ancestor.
    pub hidden: bool,
    /// Part of this tool's own injected UI.
    pub own_ui: bool,
}

/// A node provisionally considered as holding review text.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateNode {
    pub text: String,
    pub tag: String,
    pub id: Option<String>,
    pub flags: NodeFlags,
}

impl CandidateNode {
    fn from_element(el: ElementRef<'_>) -> Self {
        let element = el.value();
        let tag = element.name().to_ascii_lowercase();
        let id = element.id().map(str::to_string);

        let mut flags = NodeFlags {
            interactive: INTERACTIVE_TAGS.contains(&tag.as_str()),
            own_ui: id.as_deref().is_some_and(|id| id.contains(OWN_UI_MARKER)),
            ..NodeFlags::default()
        };

        let lineage = std::iter::once(el).chain(el.ancestors().filter_map(ElementRef::wrap));
        for node in lineage {
            let name = node.value().name();
            if NAVIGATION_TAGS.contains(&name) {
                flags.in_navigation = true;
            }
            if SCRIPT_TAGS.contains(&name) {
                flags.in_script = true;
            }
            if conceals(node.value()) {
                flags.hidden = true;
            }
        }

        Self {
            text: el.text().collect::<String>().trim().to_string(),
            tag,
            id,
            flags,
        }
    }
}

/// Whether `element` keeps itself and its subtree from being rendered.
fn conceals(element: &Element) -> bool {
    if UNRENDERED_TAGS.contains(&element.name()) {
        return true;
    }
    if element.attr("hidden").is_some() {
        return true;
    }
    if element
        .attr("aria-hidden")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    {
        return true;
    }
    match element.attr("style") {
        Some(style) => {
            let compact: String = style
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_ascii_lowercase();
            compact.contains("display:none") || compact.contains("visibility:hidden")
        }
        None => false,
    }
}

/// A parsed snapshot of a page.
pub struct Page {
    html: Html,
}

impl Page {
    /// Parse an HTML document. Malformed markup is recovered, never rejected.
    #[must_use]
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// Every element matching `selector`, in document order.
    #[must_use]
    pub fn select(&self, selector: &Selector) -> Vec<CandidateNode> {
        self.html
            .select(selector)
            .map(CandidateNode::from_element)
            .collect()
    }

    /// Every element in the document, in document order.
    #[must_use]
    pub fn elements(&self) -> Vec<CandidateNode> {
        static ANY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("*").unwrap());
        self.select(&ANY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'a>(nodes: &'a [CandidateNode], text: &str) -> &'a CandidateNode {
        nodes
            .iter()
            .find(|n| n.text == text)
            .unwrap_or_else(|| panic!("no node with text {text:?}"))
    }

    #[test]
    fn test_text_is_trimmed_and_concatenated() {
        let page = Page::parse("<div id='r'>  <b>Great</b> <i>food</i>  </div>");
        let sel = Selector::parse("#r").unwrap();
        let nodes = page.select(&sel);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].text, "Great food");
        assert_eq!(nodes[0].tag, "div");
        assert_eq!(nodes[0].id.as_deref(), Some("r"));
    }

    #[test]
    fn test_navigation_and_script_flags() {
        let page = Page::parse(
            "<header><p>in header</p></header>\
             <footer><span>in footer</span></footer>\
             <script>var inScript = 1;</script>\
             <p>plain</p>",
        );
        let nodes = page.elements();
        assert!(find(&nodes, "in header").flags.in_navigation);
        assert!(find(&nodes, "in footer").flags.in_navigation);
        assert!(find(&nodes, "var inScript = 1;").flags.in_script);
        let plain = find(&nodes, "plain");
        assert_eq!(plain.flags, NodeFlags::default());
    }

    #[test]
    fn test_interactive_flag_is_own_tag_only() {
        let page = Page::parse("<div><a href='#'>link text</a></div>");
        let nodes = page.elements();
        let link = nodes.iter().find(|n| n.tag == "a").unwrap();
        let div = nodes.iter().find(|n| n.tag == "div").unwrap();
        assert!(link.flags.interactive);
        assert!(!div.flags.interactive);
    }

    #[test]
    fn test_hidden_flag() {
        let page = Page::parse(
            "<div style='display: none'><p>styled away</p></div>\
             <p hidden>attribute hidden</p>\
             <div aria-hidden='true'><span>aria hidden</span></div>\
             <p style='color: red'>visible</p>",
        );
        let nodes = page.elements();
        assert!(find(&nodes, "styled away").flags.hidden);
        assert!(find(&nodes, "attribute hidden").flags.hidden);
        assert!(find(&nodes, "aria hidden").flags.hidden);
        assert!(!find(&nodes, "visible").flags.hidden);
    }

    #[test]
    fn test_head_is_hidden() {
        let page = Page::parse("<html><head><title>Page title</title></head><body></body></html>");
        let nodes = page.elements();
        let title = nodes.iter().find(|n| n.tag == "title").unwrap();
        assert!(title.flags.hidden);
    }

    #[test]
    fn test_own_ui_flag() {
        let page = Page::parse("<button id='sentiment-analyze-btn'>Analyze</button>");
        let nodes = page.elements();
        let button = nodes.iter().find(|n| n.tag == "button").unwrap();
        assert!(button.flags.own_ui);
        assert!(button.flags.interactive);
    }

    #[test]
    fn test_elements_in_document_order() {
        let page = Page::parse("<p>one</p><p>two</p>");
        let tags: Vec<String> = page.elements().into_iter().map(|n| n.tag).collect();
        assert_eq!(tags, vec!["html", "head", "body", "p", "p"]);
    }
}
