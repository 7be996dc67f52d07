use crate::condition::{AttributeResolver, TreeResolver};
use crate::factory::ResourceLoader;
use crate::media::MediaList;
use crate::stylesheet::{CssOrigin, StylesheetInfo};
use kuchiki::NodeRef;
use kuchiki::traits::TendrilSink;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Identity handle for an element node. Equality and hashing use node identity.
#[derive(Clone)]
pub struct ElementRef(pub NodeRef);

impl ElementRef {
    pub fn node(&self) -> &NodeRef {
        &self.0
    }

    pub fn name(&self) -> String {
        self.0
            .as_element()
            .map(|element| element.name.local.to_ascii_lowercase().to_string())
            .unwrap_or_default()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        let element = self.0.as_element()?;
        let attrs = element.attributes.borrow();
        attrs.get(name).map(str::to_string)
    }
}

impl PartialEq for ElementRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0 .0, &other.0 .0)
    }
}

impl Eq for ElementRef {}

impl Hash for ElementRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.0 .0).hash(state);
    }
}

impl std::fmt::Debug for ElementRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}>", self.name())
    }
}

fn element_of(node: NodeRef) -> Option<ElementRef> {
    node.as_element().is_some().then(|| ElementRef(node))
}

/// A parsed HTML document plus its base URI.
pub struct Document {
    root: NodeRef,
    uri: String,
}

impl Document {
    pub fn parse(html: &str, uri: impl Into<String>) -> Self {
        Self {
            root: kuchiki::parse_html().one(html),
            uri: uri.into(),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn root_element(&self) -> Option<ElementRef> {
        self.root.children().find_map(element_of)
    }

    /// Every element in document order.
    pub fn elements(&self) -> Vec<ElementRef> {
        self.root.descendants().filter_map(element_of).collect()
    }

    pub fn select(&self, selectors: &str) -> Vec<ElementRef> {
        match self.root.select(selectors) {
            Ok(found) => found.map(|element| ElementRef(element.as_node().clone())).collect(),
            Err(()) => Vec::new(),
        }
    }

    pub fn select_first(&self, selectors: &str) -> Option<ElementRef> {
        self.select(selectors).into_iter().next()
    }

    /// `<style>` and `<link rel="stylesheet">` sheets in document order, as author sheets.
    pub fn stylesheets(&self, loader: &dyn ResourceLoader) -> Vec<StylesheetInfo> {
        let mut out = Vec::new();
        let mut inline_index = 0usize;
        for element in self.elements() {
            let media = element
                .attribute("media")
                .map(|media| MediaList::from_types(&media))
                .unwrap_or_default();
            let title = element.attribute("title");
            let info = match element.name().as_str() {
                "style" => {
                    inline_index += 1;
                    StylesheetInfo::inline(
                        CssOrigin::Author,
                        format!("{}#style-{inline_index}", self.uri),
                        element.node().text_contents(),
                    )
                }
                "link" => {
                    let rel = element.attribute("rel").unwrap_or_default().to_ascii_lowercase();
                    let Some(href) = element.attribute("href") else {
                        continue;
                    };
                    if !rel.split_whitespace().any(|token| token == "stylesheet")
                        || rel.split_whitespace().any(|token| token == "alternate")
                    {
                        continue;
                    }
                    StylesheetInfo::new(CssOrigin::Author, loader.resolve_uri(&self.uri, &href))
                }
                _ => continue,
            };
            let info = info.with_media(media);
            out.push(match title {
                Some(title) => info.with_title(title),
                None => info,
            });
        }
        out
    }
}

/// Answers tree and attribute queries for kuchiki documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct DomResolver;

impl TreeResolver for DomResolver {
    type Element = ElementRef;

    fn parent_element(&self, element: &ElementRef) -> Option<ElementRef> {
        element.0.parent().and_then(element_of)
    }

    fn previous_sibling_element(&self, element: &ElementRef) -> Option<ElementRef> {
        element.0.preceding_siblings().find_map(element_of)
    }

    fn element_name(&self, element: &ElementRef) -> String {
        element.name()
    }

    fn is_first_child_element(&self, element: &ElementRef) -> bool {
        self.previous_sibling_element(element).is_none()
    }

    fn is_last_child_element(&self, element: &ElementRef) -> bool {
        !element
            .0
            .following_siblings()
            .any(|node| node.as_element().is_some())
    }

    fn position_of_element(&self, element: &ElementRef) -> usize {
        element
            .0
            .preceding_siblings()
            .filter(|node| node.as_element().is_some())
            .count()
    }
}

impl AttributeResolver<ElementRef> for DomResolver {
    fn attribute_value(
        &self,
        element: &ElementRef,
        _namespace: Option<&str>,
        name: &str,
    ) -> Option<String> {
        element.attribute(name)
    }

    fn class(&self, element: &ElementRef) -> Option<String> {
        element.attribute("class")
    }

    fn id(&self, element: &ElementRef) -> Option<String> {
        element.attribute("id")
    }

    fn lang(&self, element: &ElementRef) -> Option<String> {
        element.0.inclusive_ancestors().find_map(|node| {
            let element = node.as_element()?;
            let attrs = element.attributes.borrow();
            attrs
                .get("lang")
                .or_else(|| attrs.get("xml:lang"))
                .map(str::to_string)
        })
    }

    fn element_styling(&self, element: &ElementRef) -> Option<String> {
        element.attribute("style")
    }

    /// HTML presentational attributes mapped to declarations.
    fn non_css_styling(&self, element: &ElementRef) -> Option<String> {
        let name = element.name();
        let mut css = String::new();
        if let Some(color) = element.attribute("bgcolor") {
            css.push_str(&format!("background-color: {color};"));
        }
        if name == "font" {
            if let Some(color) = element.attribute("color") {
                css.push_str(&format!("color: {color};"));
            }
        }
        if let Some(align) = element.attribute("align") {
            let align = align.to_ascii_lowercase();
            match (name.as_str(), align.as_str()) {
                ("img" | "table", "left" | "right") => css.push_str(&format!("float: {align};")),
                (_, "left" | "right" | "center" | "justify") => {
                    css.push_str(&format!("text-align: {align};"))
                }
                _ => {}
            }
        }
        if let Some(valign) = element.attribute("valign") {
            css.push_str(&format!("vertical-align: {};", valign.to_ascii_lowercase()));
        }
        if matches!(name.as_str(), "img" | "table" | "td" | "th" | "col") {
            for dimension in ["width", "height"] {
                if let Some(value) = element.attribute(dimension) {
                    css.push_str(&format!("{dimension}: {};", html_length(&value)));
                }
            }
        }
        if name == "table" {
            if let Some(border) = element.attribute("border") {
                css.push_str(&format!("border: {} outset;", html_length(&border)));
            }
            if let Some(spacing) = element.attribute("cellspacing") {
                css.push_str(&format!("border-spacing: {};", html_length(&spacing)));
            }
        }
        (!css.is_empty()).then_some(css)
    }

    fn is_link(&self, element: &ElementRef) -> bool {
        element.name() == "a" && element.attribute("href").is_some()
    }
}

/// HTML dimension attributes are pixels unless they carry a percent sign.
fn html_length(raw: &str) -> String {
    let raw = raw.trim();
    if raw.ends_with('%') || raw.parse::<f32>().is_err() {
        raw.to_string()
    } else {
        format!("{raw}px")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::MemoryResourceLoader;

    const HTML: &str = r##"<!doctype html>
<html lang="en-GB"><head>
<style media="print">p { color: red }</style>
<link rel="stylesheet" href="css/site.css" title="main">
<link rel="alternate stylesheet" href="alt.css">
</head><body>
<table bgcolor="#eee" width="50%" border="1"><tr><td align="center">x</td></tr></table>
<ul><li>a</li><li id="second">b</li><li>c</li></ul>
<a href="/x">link</a>
</body></html>"##;

    #[test]
    fn sibling_queries_skip_text_nodes() {
        let doc = Document::parse(HTML, "https://example.com/doc/index.html");
        let second = doc.select_first("#second").expect("li");
        let resolver = DomResolver;
        assert_eq!(resolver.position_of_element(&second), 1);
        assert!(!resolver.is_first_child_element(&second));
        assert!(!resolver.is_last_child_element(&second));
        let prev = resolver.previous_sibling_element(&second).expect("prev");
        assert_eq!(prev.name(), "li");
        assert_eq!(resolver.parent_element(&second).map(|p| p.name()), Some("ul".into()));
        let root = doc.root_element().expect("root");
        assert_eq!(root.name(), "html");
        assert!(resolver.parent_element(&root).is_none());
    }

    #[test]
    fn attributes_and_lang_inheritance() {
        let doc = Document::parse(HTML, "https://example.com/doc/index.html");
        let resolver = DomResolver;
        let link = doc.select_first("a").expect("a");
        assert!(resolver.is_link(&link));
        assert_eq!(resolver.lang(&link).as_deref(), Some("en-GB"));
        let table = doc.select_first("table").expect("table");
        let hints = resolver.non_css_styling(&table).expect("hints");
        assert!(hints.contains("background-color: #eee;"));
        assert!(hints.contains("width: 50%;"));
        assert!(hints.contains("border: 1px outset;"));
        let cell = doc.select_first("td").expect("td");
        assert_eq!(
            resolver.non_css_styling(&cell).as_deref(),
            Some("text-align: center;")
        );
    }

    #[test]
    fn collects_document_stylesheets() {
        let doc = Document::parse(HTML, "https://example.com/doc/index.html");
        let sheets = doc.stylesheets(&MemoryResourceLoader::new());
        assert_eq!(sheets.len(), 2);
        assert!(sheets[0].content.as_deref().is_some_and(|c| c.contains("color: red")));
        assert!(sheets[0].applies_to("print", None));
        assert!(!sheets[0].applies_to("screen", None));
        assert_eq!(sheets[1].uri, "https://example.com/doc/css/site.css");
        assert_eq!(sheets[1].title.as_deref(), Some("main"));
    }

    #[test]
    fn element_identity_is_node_identity() {
        let doc = Document::parse(HTML, "about:blank");
        let a = doc.select_first("#second").expect("li");
        let b = doc.select_first("li#second").expect("li");
        let other = doc.select_first("li").expect("li");
        assert_eq!(a, b);
        assert_ne!(a, other);
    }
}
