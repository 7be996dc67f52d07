use crate::calculated::{StyleArena, StyleId};
use crate::cascaded::CascadedStyle;
use crate::condition::{AttributeResolver, TreeResolver};
use crate::config::StyleConfig;
use crate::content::ContentFunctionRegistry;
use crate::debug::{DebugLogger, json_string};
use crate::dom::{Document, DomResolver};
use crate::error::Result;
use crate::factory::{ResourceLoader, StylesheetFactory};
use crate::matcher::{Matcher, PageInfo};
use crate::selector::PseudoElement;
use crate::stylesheet::{CssOrigin, FontFaceRule, StylesheetInfo};
use std::collections::HashMap;
use std::sync::Arc;

const UA_SHEET_URI: &str = "pagestyle:user-agent.css";
const USER_SHEET_URI: &str = "pagestyle:user.css";

/// Style state of one document: the rule set, cascaded styles and calculated styles.
///
/// Sheets are added in origin order: the user agent sheet and the user sheet at construction,
/// author sheets afterwards.
pub struct StyleReference<T: TreeResolver> {
    config: StyleConfig,
    factory: Arc<StylesheetFactory>,
    matcher: Matcher<T>,
    arena: StyleArena,
    registry: ContentFunctionRegistry,
    styles: HashMap<T::Element, StyleId>,
    styles_revision: u64,
    debug: Option<Arc<DebugLogger>>,
}

impl<T: TreeResolver> StyleReference<T> {
    pub fn new(
        config: StyleConfig,
        tree: T,
        attributes: Option<Box<dyn AttributeResolver<T::Element>>>,
        loader: Arc<dyn ResourceLoader>,
    ) -> Result<Self> {
        let debug = match &config.debug_path {
            Some(path) => Some(Arc::new(DebugLogger::new(path)?)),
            None => None,
        };
        let factory = StylesheetFactory::new(
            loader,
            config.stylesheet_cache_capacity,
            config.value_options(),
        )
        .with_debug(debug.clone());
        Ok(Self::with_factory(config, tree, attributes, Arc::new(factory), debug))
    }

    /// Builds a reference on a factory shared with other documents.
    pub fn with_factory(
        config: StyleConfig,
        tree: T,
        attributes: Option<Box<dyn AttributeResolver<T::Element>>>,
        factory: Arc<StylesheetFactory>,
        debug: Option<Arc<DebugLogger>>,
    ) -> Self {
        let matcher = Matcher::new(
            tree,
            attributes,
            factory.clone(),
            config.medium.clone(),
            config.viewport,
        )
        .with_debug(debug.clone());
        let arena = StyleArena::new(config.value_options()).with_debug(debug.clone());
        let mut reference = Self {
            config,
            factory,
            matcher,
            arena,
            registry: ContentFunctionRegistry::new(),
            styles: HashMap::new(),
            styles_revision: 0,
            debug,
        };
        let ua = StylesheetInfo::inline(
            CssOrigin::UserAgent,
            UA_SHEET_URI,
            reference.config.user_agent_css.clone(),
        );
        reference.add_stylesheet(&ua);
        if let Some(css) = reference.config.user_css.clone() {
            reference.add_stylesheet(&StylesheetInfo::inline(CssOrigin::User, USER_SHEET_URI, css));
        }
        reference
    }

    pub fn config(&self) -> &StyleConfig {
        &self.config
    }

    pub fn factory(&self) -> &Arc<StylesheetFactory> {
        &self.factory
    }

    pub fn matcher(&self) -> &Matcher<T> {
        &self.matcher
    }

    pub fn arena(&self) -> &StyleArena {
        &self.arena
    }

    pub fn content_registry(&self) -> &ContentFunctionRegistry {
        &self.registry
    }

    pub fn content_registry_mut(&mut self) -> &mut ContentFunctionRegistry {
        &mut self.registry
    }

    /// Adds `info` and its imports when its media applies to the configured medium.
    pub fn add_stylesheet(&mut self, info: &StylesheetInfo) -> bool {
        if !info.applies_to(&self.config.medium, self.config.viewport) {
            log::debug!("skipping stylesheet {} for medium {}", info.uri, self.config.medium);
            return false;
        }
        let sheets = self.factory.get_stylesheet_with_imports(
            info,
            &self.config.medium,
            self.config.viewport,
        );
        for sheet in sheets {
            self.matcher.add_stylesheet(&sheet);
        }
        true
    }

    pub fn add_stylesheets(&mut self, infos: &[StylesheetInfo]) {
        for info in infos {
            self.add_stylesheet(info);
        }
    }

    pub fn rules_revision(&self) -> u64 {
        self.matcher.rules_revision()
    }

    pub fn has_rules_changed(&self, since_revision: u64) -> bool {
        self.matcher.has_rules_changed(since_revision)
    }

    pub fn get_cascaded_style(
        &mut self,
        element: &T::Element,
        force_rematch: bool,
    ) -> Arc<CascadedStyle> {
        self.matcher.get_cascaded_style(element, force_rematch)
    }

    pub fn get_pseudo_element_style(
        &mut self,
        element: &T::Element,
        pseudo: PseudoElement,
    ) -> Option<Arc<CascadedStyle>> {
        self.matcher.get_pseudo_element_style(element, pseudo)
    }

    pub fn is_hover_styled(&mut self, element: &T::Element) -> bool {
        self.matcher.is_hover_styled(element)
    }

    pub fn get_page_style(&self, page_name: Option<&str>, pseudo_page: Option<&str>) -> PageInfo {
        self.matcher.get_page_style(page_name, pseudo_page)
    }

    pub fn get_font_face_rules(&self) -> &[FontFaceRule] {
        self.matcher.get_font_face_rules()
    }

    /// Forgets the cascade and calculated style of `element` and of every descendant whose
    /// calculated style was derived from it.
    pub fn remove_style(&mut self, element: &T::Element) {
        self.matcher.remove_style(element);
        let Some(removed) = self.styles.remove(element) else {
            return;
        };
        let arena = &self.arena;
        self.styles
            .retain(|_, id| !descends_from(arena, *id, removed));
    }

    /// Calculated style of `element`, deriving its ancestors first when needed.
    pub fn calculated_style(&mut self, element: &T::Element) -> StyleId {
        if self.styles_revision != self.matcher.rules_revision() {
            self.styles.clear();
            self.styles_revision = self.matcher.rules_revision();
        }
        let mut chain = vec![element.clone()];
        let mut parent_style = self.arena.root();
        while let Some(current) = chain.last() {
            if let Some(id) = self.styles.get(current) {
                parent_style = *id;
                chain.pop();
                break;
            }
            match self.matcher.tree().parent_element(current) {
                Some(parent) => chain.push(parent),
                None => break,
            }
        }
        for current in chain.into_iter().rev() {
            let cascaded = self.matcher.get_cascaded_style(&current, false);
            let id = self.arena.derive_style(parent_style, cascaded);
            self.styles.insert(current, id);
            parent_style = id;
        }
        parent_style
    }

    /// Calculated style of a pseudo-element, parented on its element.
    pub fn pseudo_element_style(
        &mut self,
        element: &T::Element,
        pseudo: PseudoElement,
    ) -> Option<StyleId> {
        let cascaded = self.matcher.get_pseudo_element_style(element, pseudo)?;
        let parent = self.calculated_style(element);
        Some(self.arena.derive_style(parent, cascaded))
    }

    /// Calculated style of a page box. Page styles inherit from the root style only.
    pub fn page_style(&mut self, page_name: Option<&str>, pseudo_page: Option<&str>) -> StyleId {
        let info = self.matcher.get_page_style(page_name, pseudo_page);
        let root = self.arena.root();
        self.arena.derive_style(root, Arc::new(info.style))
    }

    /// Calculated style of one margin box of a page, parented on the page style.
    pub fn margin_box_style(
        &mut self,
        page_name: Option<&str>,
        pseudo_page: Option<&str>,
        margin_box: &str,
    ) -> Option<StyleId> {
        let info = self.matcher.get_page_style(page_name, pseudo_page);
        let cascaded = info.margin_box_style(margin_box)?;
        let root = self.arena.root();
        let page = self.arena.derive_style(root, Arc::new(info.style));
        Some(self.arena.derive_style(page, Arc::new(cascaded)))
    }
}

impl StyleReference<DomResolver> {
    /// Reference for a kuchiki document with its `<style>` and `<link>` sheets already added.
    pub fn for_document(
        config: StyleConfig,
        document: &Document,
        loader: Arc<dyn ResourceLoader>,
    ) -> Result<Self> {
        let sheets = document.stylesheets(loader.as_ref());
        let mut reference = Self::new(config, DomResolver, Some(Box::new(DomResolver)), loader)?;
        reference.add_stylesheets(&sheets);
        if let Some(logger) = &reference.debug {
            logger.record(
                "css.document",
                &[
                    ("uri", json_string(document.uri())),
                    ("sheets", sheets.len().to_string()),
                    ("rules", reference.matcher.rule_count().to_string()),
                ],
            );
        }
        Ok(reference)
    }
}

impl<T: TreeResolver> Drop for StyleReference<T> {
    fn drop(&mut self) {
        if let Some(logger) = self.debug.as_deref() {
            logger.emit_summary("style_reference");
            logger.flush();
        }
    }
}

fn descends_from(arena: &StyleArena, mut id: StyleId, ancestor: StyleId) -> bool {
    loop {
        if id == ancestor {
            return true;
        }
        match arena.parent(id) {
            Some(parent) => id = parent,
            None => return false,
        }
    }
}
