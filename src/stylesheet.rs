use crate::cascaded::CascadedStyle;
use crate::media::MediaList;
use crate::property::PropertyName;
use crate::selector::Selector;
use crate::types::Size;
use crate::value::{PropertyValue, Separator};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Where a declaration came from. Ordered from weakest to strongest for normal declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CssOrigin {
    UserAgent,
    User,
    Author,
}

impl CssOrigin {
    pub fn name(self) -> &'static str {
        match self {
            CssOrigin::UserAgent => "user-agent",
            CssOrigin::User => "user",
            CssOrigin::Author => "author",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: PropertyName,
    pub value: PropertyValue,
    pub important: bool,
    pub origin: CssOrigin,
}

impl Declaration {
    pub fn new(
        property: PropertyName,
        value: PropertyValue,
        important: bool,
        origin: CssOrigin,
    ) -> Self {
        Self {
            property,
            value,
            important,
            origin,
        }
    }

    /// Cascade bucket: user-agent < user < author < user !important < author !important.
    /// User-agent `!important` stays in the user-agent bucket.
    pub fn precedence(&self) -> u8 {
        match (self.origin, self.important) {
            (CssOrigin::UserAgent, _) => 0,
            (CssOrigin::User, false) => 1,
            (CssOrigin::Author, false) => 2,
            (CssOrigin::User, true) => 3,
            (CssOrigin::Author, true) => 4,
        }
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property, self.value)?;
        if self.important {
            f.write_str(" !important")?;
        }
        Ok(())
    }
}

/// Selector alternatives sharing one declaration block. Inline styles have no selectors.
#[derive(Debug, Clone, PartialEq)]
pub struct Ruleset {
    pub selectors: Vec<Selector>,
    pub declarations: Vec<Declaration>,
    pub origin: CssOrigin,
}

impl Ruleset {
    pub fn new(origin: CssOrigin) -> Self {
        Self {
            selectors: Vec::new(),
            declarations: Vec::new(),
            origin,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn selector_text(&self) -> String {
        self.selectors
            .iter()
            .map(|selector| selector.text.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaRule {
    pub media: MediaList,
    pub rules: Vec<StylesheetRule>,
}

/// An `@page` rule for one page selector.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRule {
    pub name: Option<String>,
    pub pseudo_page: Option<String>,
    pub declarations: Vec<Declaration>,
    pub margin_boxes: BTreeMap<String, Vec<Declaration>>,
    pub origin: CssOrigin,
    /// Position among the page rules of the sheet.
    pub position: u32,
}

const PAGE_NAME_BIT: u64 = 1 << 32;
const PAGE_FIRST_BIT: u64 = 1 << 24;
const PAGE_OTHER_BIT: u64 = 1 << 16;

impl PageRule {
    pub fn new(name: Option<String>, pseudo_page: Option<String>, origin: CssOrigin) -> Self {
        Self {
            name,
            pseudo_page: pseudo_page.map(|p| p.to_ascii_lowercase()),
            declarations: Vec::new(),
            margin_boxes: BTreeMap::new(),
            origin,
            position: 0,
        }
    }

    /// Page specificity packed for sorting: named pages beat `:first`, which beats other
    /// pseudo-pages, which beat the universal rule; source position breaks ties.
    pub fn order(&self) -> u64 {
        let mut order = u64::from(self.position);
        if self.name.is_some() {
            order |= PAGE_NAME_BIT;
        }
        match self.pseudo_page.as_deref() {
            Some("first") => order |= PAGE_FIRST_BIT,
            Some(_) => order |= PAGE_OTHER_BIT,
            None => {}
        }
        order
    }

    /// The first page is treated as a right-hand page, so `:right` rules also apply to it.
    pub fn applies(&self, page_name: Option<&str>, pseudo_page: Option<&str>) -> bool {
        match (&self.name, &self.pseudo_page) {
            (None, None) => true,
            (None, Some(own)) => pseudo_page.is_some_and(|requested| {
                own == requested || (own == "right" && requested == "first")
            }),
            (Some(name), None) => page_name == Some(name.as_str()),
            (Some(name), Some(own)) => {
                page_name == Some(name.as_str()) && pseudo_page == Some(own.as_str())
            }
        }
    }
}

/// `@font-face` descriptors, kept as declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct FontFaceRule {
    pub declarations: Vec<Declaration>,
    pub origin: CssOrigin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontSource {
    pub uri: Option<String>,
    pub local: Option<String>,
    pub format: Option<String>,
}

impl FontFaceRule {
    /// The descriptors folded like an element cascade: the last declaration of each wins.
    pub fn cascaded_style(&self) -> CascadedStyle {
        CascadedStyle::from_sorted(self.declarations.iter().cloned())
    }

    fn descriptor(&self, property: PropertyName) -> Option<&PropertyValue> {
        self.declarations
            .iter()
            .rev()
            .find(|declaration| declaration.property == property)
            .map(|declaration| &declaration.value)
    }

    pub fn family(&self) -> Option<String> {
        let value = self.descriptor(PropertyName::FontFamily)?;
        match value {
            PropertyValue::List {
                separator: Separator::Space,
                items,
            } => Some(
                items
                    .iter()
                    .filter_map(PropertyValue::as_string)
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            other => other.items().first()?.as_string().map(str::to_string),
        }
    }

    pub fn sources(&self) -> Vec<FontSource> {
        let Some(value) = self.descriptor(PropertyName::Src) else {
            return Vec::new();
        };
        let groups: Vec<&PropertyValue> = match value {
            PropertyValue::List {
                separator: Separator::Comma,
                items,
            } => items.iter().collect(),
            other => vec![other],
        };
        groups
            .into_iter()
            .filter_map(|group| {
                let mut source = FontSource {
                    uri: None,
                    local: None,
                    format: None,
                };
                for item in group.items() {
                    match item {
                        PropertyValue::Uri(uri) => source.uri = Some(uri.clone()),
                        PropertyValue::Function(function) if function.name == "local" => {
                            source.local = function
                                .params
                                .first()
                                .and_then(PropertyValue::as_string)
                                .map(str::to_string);
                        }
                        PropertyValue::Function(function) if function.name == "format" => {
                            source.format = function
                                .params
                                .first()
                                .and_then(PropertyValue::as_string)
                                .map(str::to_string);
                        }
                        _ => {}
                    }
                }
                (source.uri.is_some() || source.local.is_some()).then_some(source)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportRule {
    pub href: String,
    pub media: MediaList,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StylesheetRule {
    Ruleset(Arc<Ruleset>),
    Media(MediaRule),
    Page(PageRule),
    FontFace(FontFaceRule),
}

/// A parsed stylesheet. A sheet with no rules is a valid, merely ineffective, result.
#[derive(Debug, Clone, PartialEq)]
pub struct Stylesheet {
    uri: String,
    origin: CssOrigin,
    contents: Vec<StylesheetRule>,
    imports: Vec<ImportRule>,
}

impl Stylesheet {
    pub fn new(uri: impl Into<String>, origin: CssOrigin) -> Self {
        Self {
            uri: uri.into(),
            origin,
            contents: Vec::new(),
            imports: Vec::new(),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn origin(&self) -> CssOrigin {
        self.origin
    }

    pub fn contents(&self) -> &[StylesheetRule] {
        &self.contents
    }

    pub fn imports(&self) -> &[ImportRule] {
        &self.imports
    }

    pub fn push(&mut self, rule: StylesheetRule) {
        self.contents.push(rule);
    }

    pub fn push_import(&mut self, import: ImportRule) {
        self.imports.push(import);
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty() && self.imports.is_empty()
    }

    /// Number of rulesets, including those nested in `@media`.
    pub fn ruleset_count(&self) -> usize {
        fn count(rules: &[StylesheetRule]) -> usize {
            rules
                .iter()
                .map(|rule| match rule {
                    StylesheetRule::Ruleset(_) => 1,
                    StylesheetRule::Media(media) => count(&media.rules),
                    _ => 0,
                })
                .sum()
        }
        count(&self.contents)
    }
}

/// Where a stylesheet lives and how it was attached to the document.
#[derive(Debug, Clone, PartialEq)]
pub struct StylesheetInfo {
    pub uri: String,
    pub origin: CssOrigin,
    pub media: MediaList,
    pub title: Option<String>,
    /// Inline `<style>` text. Such sheets are parsed directly and never cached.
    pub content: Option<String>,
}

impl StylesheetInfo {
    pub fn new(origin: CssOrigin, uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            origin,
            media: MediaList::all(),
            title: None,
            content: None,
        }
    }

    pub fn inline(origin: CssOrigin, uri: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::new(origin, uri)
        }
    }

    pub fn with_media(mut self, media: MediaList) -> Self {
        self.media = media;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn applies_to(&self, medium: &str, viewport: Option<Size>) -> bool {
        self.media.matches(medium, viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{ValueOptions, parse_value, parse_value_for};

    fn page(name: Option<&str>, pseudo: Option<&str>, position: u32) -> PageRule {
        let mut rule = PageRule::new(
            name.map(str::to_string),
            pseudo.map(str::to_string),
            CssOrigin::Author,
        );
        rule.position = position;
        rule
    }

    #[test]
    fn page_rule_applicability() {
        assert!(page(Some("chapter"), None, 0).applies(Some("chapter"), Some("first")));
        assert!(page(None, Some("first"), 0).applies(Some("chapter"), Some("first")));
        assert!(page(None, Some("right"), 0).applies(Some("chapter"), Some("first")));
        assert!(!page(Some("other"), None, 0).applies(Some("chapter"), Some("first")));
        assert!(page(None, None, 0).applies(None, None));
        assert!(!page(None, Some("left"), 0).applies(None, Some("first")));
        assert!(page(Some("chapter"), Some("left"), 0).applies(Some("chapter"), Some("left")));
        assert!(!page(Some("chapter"), Some("left"), 0).applies(Some("chapter"), Some("right")));
    }

    #[test]
    fn page_order_packs_specificity_bits() {
        let universal = page(None, None, 7);
        let left = page(None, Some("left"), 1);
        let first = page(None, Some("first"), 0);
        let named = page(Some("chapter"), None, 0);
        assert_eq!(universal.order(), 7);
        assert_eq!(left.order(), (1 << 16) | 1);
        assert!(universal.order() < left.order());
        assert!(left.order() < first.order());
        assert!(first.order() < named.order());
    }

    #[test]
    fn precedence_buckets_follow_origin_and_importance() {
        let decl = |origin, important| {
            Declaration::new(
                PropertyName::Color,
                PropertyValue::ident("red"),
                important,
                origin,
            )
        };
        assert!(
            decl(CssOrigin::UserAgent, true).precedence()
                < decl(CssOrigin::User, false).precedence()
        );
        assert!(
            decl(CssOrigin::Author, false).precedence() < decl(CssOrigin::User, true).precedence()
        );
        assert!(
            decl(CssOrigin::User, true).precedence() < decl(CssOrigin::Author, true).precedence()
        );
    }

    #[test]
    fn font_face_descriptors() {
        let options = ValueOptions::default();
        let rule = FontFaceRule {
            declarations: vec![
                Declaration::new(
                    PropertyName::FontFamily,
                    parse_value("\"Inter Display\"", options),
                    false,
                    CssOrigin::Author,
                ),
                Declaration::new(
                    PropertyName::Src,
                    parse_value_for(
                        PropertyName::Src,
                        "url(\"inter.woff2\") format(\"woff2\"), local(Inter)",
                        options,
                    ),
                    false,
                    CssOrigin::Author,
                ),
            ],
            origin: CssOrigin::Author,
        };
        assert_eq!(rule.family().as_deref(), Some("Inter Display"));
        assert!(rule.cascaded_style().has_property(PropertyName::Src));
        let sources = rule.sources();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].uri.as_deref(), Some("inter.woff2"));
        assert_eq!(sources[0].format.as_deref(), Some("woff2"));
        assert_eq!(sources[1].local.as_deref(), Some("Inter"));
    }

    #[test]
    fn empty_sheet_keeps_identity() {
        let sheet = Stylesheet::new("file:///missing.css", CssOrigin::User);
        assert!(sheet.is_empty());
        assert_eq!(sheet.ruleset_count(), 0);
        assert_eq!(sheet.uri(), "file:///missing.css");
        assert_eq!(sheet.origin(), CssOrigin::User);
    }
}
