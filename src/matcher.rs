use crate::cascaded::CascadedStyle;
use crate::condition::{AttributeResolver, MatchMode, TreeResolver};
use crate::debug::{DebugLogger, json_string};
use crate::factory::StylesheetFactory;
use crate::selector::{IndexKey, PseudoElement, Selector, Specificity};
use crate::stylesheet::{
    CssOrigin, Declaration, FontFaceRule, PageRule, Ruleset, Stylesheet, StylesheetRule,
};
use crate::types::Size;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

struct MatchRule {
    selector: Selector,
    ruleset: Arc<Ruleset>,
    /// Position of the ruleset across all sheets, in origin order.
    order: usize,
}

#[derive(Default)]
struct RuleIndex {
    by_tag: HashMap<String, Vec<usize>>,
    by_id: HashMap<String, Vec<usize>>,
    by_class: HashMap<String, Vec<usize>>,
    universal: Vec<usize>,
}

impl RuleIndex {
    fn insert(&mut self, idx: usize, selector: &Selector) {
        match selector.index_key() {
            IndexKey::Id(id) => self.by_id.entry(id).or_default().push(idx),
            IndexKey::Class(class) => self.by_class.entry(class).or_default().push(idx),
            IndexKey::Tag(tag) => self.by_tag.entry(tag).or_default().push(idx),
            IndexKey::Universal => self.universal.push(idx),
        }
    }

    fn candidates(&self, tag: &str, id: Option<&str>, classes: Option<&str>) -> Vec<usize> {
        let mut out: Vec<usize> = Vec::new();
        if let Some(v) = id.and_then(|id| self.by_id.get(id)) {
            out.extend(v);
        }
        for class in classes.unwrap_or("").split_whitespace() {
            if let Some(v) = self.by_class.get(class) {
                out.extend(v);
            }
        }
        if let Some(v) = self.by_tag.get(tag) {
            out.extend(v);
        }
        out.extend(&self.universal);
        out.sort_unstable();
        out.dedup();
        out
    }
}

/// Sort key of one matched declaration, compared lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct CascadeKey {
    precedence: u8,
    /// `style` attribute declarations beat every selector of their bucket.
    inline: bool,
    specificity: Specificity,
    order: usize,
    index: usize,
}

/// Folded `@page` cascade for one page, plus its margin boxes.
#[derive(Debug, Clone, PartialEq)]
pub struct PageInfo {
    pub page_name: Option<String>,
    pub pseudo_page: Option<String>,
    pub style: CascadedStyle,
    pub margin_boxes: BTreeMap<String, Vec<Declaration>>,
}

impl PageInfo {
    pub fn margin_box_style(&self, name: &str) -> Option<CascadedStyle> {
        self.margin_boxes
            .get(name)
            .map(|declarations| CascadedStyle::from_sorted(declarations.iter().cloned()))
    }
}

/// Matches rules against elements and caches the cascaded result per element.
pub struct Matcher<T: TreeResolver> {
    tree: T,
    attributes: Option<Box<dyn AttributeResolver<T::Element>>>,
    factory: Arc<StylesheetFactory>,
    medium: String,
    viewport: Option<Size>,
    rules: Vec<MatchRule>,
    index: RuleIndex,
    next_order: usize,
    page_rules: Vec<PageRule>,
    font_faces: Vec<FontFaceRule>,
    revision: u64,
    cascade_cache: HashMap<T::Element, Arc<CascadedStyle>>,
    pseudo_cache: HashMap<(T::Element, PseudoElement), Option<Arc<CascadedStyle>>>,
    hover_cache: HashMap<T::Element, bool>,
    inline_cache: HashMap<String, Option<Arc<Ruleset>>>,
    debug: Option<Arc<DebugLogger>>,
}

impl<T: TreeResolver> Matcher<T> {
    pub fn new(
        tree: T,
        attributes: Option<Box<dyn AttributeResolver<T::Element>>>,
        factory: Arc<StylesheetFactory>,
        medium: impl Into<String>,
        viewport: Option<Size>,
    ) -> Self {
        Self {
            tree,
            attributes,
            factory,
            medium: medium.into(),
            viewport,
            rules: Vec::new(),
            index: RuleIndex::default(),
            // Order 0 is reserved for presentational hints.
            next_order: 1,
            page_rules: Vec::new(),
            font_faces: Vec::new(),
            revision: 0,
            cascade_cache: HashMap::new(),
            pseudo_cache: HashMap::new(),
            hover_cache: HashMap::new(),
            inline_cache: HashMap::new(),
            debug: None,
        }
    }

    pub fn with_debug(mut self, debug: Option<Arc<DebugLogger>>) -> Self {
        self.debug = debug;
        self
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    pub fn attributes(&self) -> Option<&dyn AttributeResolver<T::Element>> {
        self.attributes.as_deref()
    }

    pub fn medium(&self) -> &str {
        &self.medium
    }

    /// Adds a sheet whose imports are already flattened. Sheets must arrive in origin order.
    pub fn add_stylesheet(&mut self, sheet: &Stylesheet) {
        let medium = self.medium.clone();
        self.add_rules(sheet.contents(), &medium);
        self.revision += 1;
        self.cascade_cache.clear();
        self.pseudo_cache.clear();
        self.hover_cache.clear();
    }

    fn add_rules(&mut self, rules: &[StylesheetRule], medium: &str) {
        for rule in rules {
            match rule {
                StylesheetRule::Ruleset(ruleset) => {
                    let order = self.next_order;
                    self.next_order += 1;
                    for selector in &ruleset.selectors {
                        let idx = self.rules.len();
                        self.index.insert(idx, selector);
                        self.rules.push(MatchRule {
                            selector: selector.clone(),
                            ruleset: ruleset.clone(),
                            order,
                        });
                    }
                }
                StylesheetRule::Media(media) => {
                    if media.media.matches(medium, self.viewport) {
                        self.add_rules(&media.rules, medium);
                    }
                }
                StylesheetRule::Page(page) => {
                    let mut page = page.clone();
                    page.position = self.page_rules.len() as u32;
                    self.page_rules.push(page);
                }
                StylesheetRule::FontFace(font_face) => self.font_faces.push(font_face.clone()),
            }
        }
    }

    /// Bumped every time rules are added.
    pub fn rules_revision(&self) -> u64 {
        self.revision
    }

    pub fn has_rules_changed(&self, since_revision: u64) -> bool {
        self.revision != since_revision
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn get_cascaded_style(
        &mut self,
        element: &T::Element,
        force_rematch: bool,
    ) -> Arc<CascadedStyle> {
        if !force_rematch {
            if let Some(hit) = self.cascade_cache.get(element) {
                return hit.clone();
            }
        }
        let declarations = self.cascade(element, None);
        let style = Arc::new(CascadedStyle::from_sorted(declarations));
        if let Some(logger) = &self.debug {
            logger.record(
                "css.match",
                &[
                    ("element", json_string(&self.tree.element_name(element))),
                    ("properties", style.len().to_string()),
                    ("fingerprint", json_string(style.fingerprint())),
                ],
            );
        }
        self.cascade_cache.insert(element.clone(), style.clone());
        style
    }

    /// Cascade for a pseudo-element of `element`, or `None` when no rule targets it.
    pub fn get_pseudo_element_style(
        &mut self,
        element: &T::Element,
        pseudo: PseudoElement,
    ) -> Option<Arc<CascadedStyle>> {
        let key = (element.clone(), pseudo);
        if let Some(hit) = self.pseudo_cache.get(&key) {
            return hit.clone();
        }
        let declarations = self.cascade(element, Some(pseudo));
        let style =
            (!declarations.is_empty()).then(|| Arc::new(CascadedStyle::from_sorted(declarations)));
        self.pseudo_cache.insert(key, style.clone());
        style
    }

    /// Whether some rule would apply to `element` if it were hovered, whatever the pointer does.
    pub fn is_hover_styled(&mut self, element: &T::Element) -> bool {
        if let Some(hit) = self.hover_cache.get(element) {
            return *hit;
        }
        let styled = self.candidates(element).into_iter().any(|idx| {
            let rule = &self.rules[idx];
            rule.selector.has_hover()
                && rule.selector.pseudo_element.is_none()
                && rule.selector.matches_with_mode(
                    element,
                    self.attributes.as_deref(),
                    &self.tree,
                    MatchMode::AssumeHover,
                )
        });
        self.hover_cache.insert(element.clone(), styled);
        styled
    }

    /// Drops every cached cascade for `element`.
    pub fn remove_style(&mut self, element: &T::Element) {
        self.cascade_cache.remove(element);
        self.hover_cache.remove(element);
        self.pseudo_cache.retain(|(cached, _), _| cached != element);
    }

    /// The single most specific applicable `@page` rule.
    pub fn get_page_rule(
        &self,
        page_name: Option<&str>,
        pseudo_page: Option<&str>,
    ) -> Option<&PageRule> {
        self.page_rules
            .iter()
            .filter(|rule| rule.applies(page_name, pseudo_page))
            .max_by_key(|rule| rule.order())
    }

    /// Folds every applicable `@page` rule, most specific last, so each property comes from
    /// the highest-ordered rule that declares it.
    pub fn get_page_style(&self, page_name: Option<&str>, pseudo_page: Option<&str>) -> PageInfo {
        let mut applicable: Vec<&PageRule> = self
            .page_rules
            .iter()
            .filter(|rule| rule.applies(page_name, pseudo_page))
            .collect();
        applicable.sort_by_key(|rule| rule.order());

        let mut entries: Vec<((u8, u64, usize), &Declaration)> = Vec::new();
        let mut margin_entries: BTreeMap<String, Vec<((u8, u64, usize), &Declaration)>> =
            BTreeMap::new();
        for rule in &applicable {
            for (idx, declaration) in rule.declarations.iter().enumerate() {
                entries.push(((declaration.precedence(), rule.order(), idx), declaration));
            }
            for (name, declarations) in &rule.margin_boxes {
                let slot = margin_entries.entry(name.clone()).or_default();
                for (idx, declaration) in declarations.iter().enumerate() {
                    slot.push(((declaration.precedence(), rule.order(), idx), declaration));
                }
            }
        }
        entries.sort_by_key(|(key, _)| *key);
        let style = CascadedStyle::from_sorted(entries.into_iter().map(|(_, d)| d.clone()));
        let margin_boxes = margin_entries
            .into_iter()
            .map(|(name, mut slot)| {
                slot.sort_by_key(|(key, _)| *key);
                let folded = CascadedStyle::from_sorted(slot.into_iter().map(|(_, d)| d.clone()));
                (name, folded.declarations().cloned().collect())
            })
            .collect();
        if let Some(logger) = &self.debug {
            logger.record(
                "css.page",
                &[
                    ("name", json_string(page_name.unwrap_or(""))),
                    ("pseudo", json_string(pseudo_page.unwrap_or(""))),
                    ("rules", applicable.len().to_string()),
                ],
            );
        }
        PageInfo {
            page_name: page_name.map(str::to_string),
            pseudo_page: pseudo_page.map(str::to_string),
            style,
            margin_boxes,
        }
    }

    pub fn get_font_face_rules(&self) -> &[FontFaceRule] {
        &self.font_faces
    }

    fn candidates(&self, element: &T::Element) -> Vec<usize> {
        let tag = self.tree.element_name(element).to_ascii_lowercase();
        let (id, classes) = match self.attributes.as_deref() {
            Some(attrs) => (attrs.id(element), attrs.class(element)),
            None => (None, None),
        };
        self.index
            .candidates(&tag, id.as_deref(), classes.as_deref())
    }

    /// Matched declarations in cascade order: later entries win.
    fn cascade(&mut self, element: &T::Element, pseudo: Option<PseudoElement>) -> Vec<Declaration> {
        let mut entries: Vec<(CascadeKey, Declaration)> = Vec::new();

        if pseudo.is_none() {
            let hints = self
                .attributes
                .as_deref()
                .and_then(|attrs| attrs.non_css_styling(element));
            if let Some(ruleset) = hints.and_then(|text| self.inline_ruleset(&text)) {
                push_declarations(&mut entries, &ruleset, false, Specificity::default(), 0);
            }
        }

        for idx in self.candidates(element) {
            let rule = &self.rules[idx];
            if rule.selector.pseudo_element != pseudo {
                continue;
            }
            if !rule
                .selector
                .matches(element, self.attributes.as_deref(), &self.tree)
            {
                continue;
            }
            push_declarations(
                &mut entries,
                &rule.ruleset,
                false,
                rule.selector.specificity,
                rule.order,
            );
        }

        if pseudo.is_none() {
            let styling = self
                .attributes
                .as_deref()
                .and_then(|attrs| attrs.element_styling(element));
            if let Some(ruleset) = styling.and_then(|text| self.inline_ruleset(&text)) {
                push_declarations(
                    &mut entries,
                    &ruleset,
                    true,
                    Specificity::default(),
                    self.next_order,
                );
            }
        }

        entries.sort_by_key(|(key, _)| *key);
        entries.into_iter().map(|(_, declaration)| declaration).collect()
    }

    fn inline_ruleset(&mut self, text: &str) -> Option<Arc<Ruleset>> {
        if let Some(hit) = self.inline_cache.get(text) {
            return hit.clone();
        }
        let parsed = match self.factory.parse_declarations(CssOrigin::Author, text) {
            Ok(ruleset) => Some(Arc::new(ruleset)),
            Err(err) => {
                log::debug!("ignoring unparsable inline style `{text}`: {err}");
                None
            }
        };
        self.inline_cache.insert(text.to_string(), parsed.clone());
        parsed
    }
}

fn push_declarations(
    entries: &mut Vec<(CascadeKey, Declaration)>,
    ruleset: &Ruleset,
    inline: bool,
    specificity: Specificity,
    order: usize,
) {
    for (index, declaration) in ruleset.declarations.iter().enumerate() {
        entries.push((
            CascadeKey {
                precedence: declaration.precedence(),
                inline,
                specificity,
                order,
                index,
            },
            declaration.clone(),
        ));
    }
}
