use crate::debug::{DebugLogger, json_array, json_string};
use crate::error::{Result, StyleError};
use crate::media::MediaList;
use crate::property::PropertyName;
use crate::selector::{Selector, split_selector_list};
use crate::stylesheet::{
    CssOrigin, Declaration, FontFaceRule, ImportRule, MediaRule, PageRule, Ruleset, Stylesheet,
    StylesheetInfo, StylesheetRule,
};
use crate::types::Size;
use crate::value::{ValueOptions, parse_value, parse_value_for};
use lightningcss::declaration::DeclarationBlock;
use lightningcss::properties::{Property, PropertyId};
use lightningcss::rules::page::PagePseudoClass;
use lightningcss::rules::{CssRule, CssRuleList};
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleAttribute, StyleSheet};
use lightningcss::traits::ToCss;
use lru::LruCache;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Read;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Supplies stylesheet bytes and resolves relative references.
pub trait ResourceLoader: Send + Sync {
    fn open_stylesheet(&self, uri: &str) -> Result<Box<dyn Read + Send>>;

    fn resolve_uri(&self, base: &str, href: &str) -> String {
        if let Ok(absolute) = url::Url::parse(href) {
            return absolute.to_string();
        }
        match url::Url::parse(base).and_then(|base| base.join(href)) {
            Ok(resolved) => resolved.to_string(),
            Err(_) => {
                let parent = Path::new(base).parent().unwrap_or_else(|| Path::new(""));
                parent.join(href).to_string_lossy().into_owned()
            }
        }
    }
}

/// Reads `file:` URLs and plain filesystem paths.
#[derive(Debug, Default, Clone)]
pub struct FileResourceLoader;

impl ResourceLoader for FileResourceLoader {
    fn open_stylesheet(&self, uri: &str) -> Result<Box<dyn Read + Send>> {
        let path = match url::Url::parse(uri) {
            Ok(url) if url.scheme() == "file" => {
                url.to_file_path().map_err(|_| StyleError::Resource {
                    uri: uri.to_string(),
                    message: "not a local file path".to_string(),
                })?
            }
            Ok(url) if url.scheme().len() > 1 => {
                return Err(StyleError::Resource {
                    uri: uri.to_string(),
                    message: format!("unsupported scheme `{}`", url.scheme()),
                });
            }
            _ => PathBuf::from(uri),
        };
        let file = std::fs::File::open(&path).map_err(|err| StyleError::Resource {
            uri: uri.to_string(),
            message: err.to_string(),
        })?;
        Ok(Box::new(file))
    }
}

/// Serves stylesheets registered up front, keyed by URI.
#[derive(Debug, Default, Clone)]
pub struct MemoryResourceLoader {
    sheets: HashMap<String, String>,
}

impl MemoryResourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, uri: impl Into<String>, css: impl Into<String>) -> Self {
        self.sheets.insert(uri.into(), css.into());
        self
    }
}

impl ResourceLoader for MemoryResourceLoader {
    fn open_stylesheet(&self, uri: &str) -> Result<Box<dyn Read + Send>> {
        match self.sheets.get(uri) {
            Some(css) => Ok(Box::new(std::io::Cursor::new(css.clone().into_bytes()))),
            None => Err(StyleError::Resource {
                uri: uri.to_string(),
                message: "not found".to_string(),
            }),
        }
    }
}

/// Parses CSS into the cascade model and caches sheets by URI.
///
/// The factory may be shared between documents. One lock guards both the parser and the cache,
/// so a cache miss is checked, loaded, parsed and inserted as a single step.
pub struct StylesheetFactory {
    loader: Arc<dyn ResourceLoader>,
    cache: Mutex<LruCache<String, Arc<Stylesheet>>>,
    options: ValueOptions,
    debug: Option<Arc<DebugLogger>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl StylesheetFactory {
    pub fn new(loader: Arc<dyn ResourceLoader>, capacity: usize, options: ValueOptions) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            loader,
            cache: Mutex::new(LruCache::new(capacity)),
            options,
            debug: None,
        }
    }

    pub fn with_debug(mut self, debug: Option<Arc<DebugLogger>>) -> Self {
        self.debug = debug;
        self
    }

    pub fn loader(&self) -> &Arc<dyn ResourceLoader> {
        &self.loader
    }

    pub fn value_options(&self) -> ValueOptions {
        self.options
    }

    /// Parses the body of a `style` attribute (or presentational hints) into a selector-less
    /// ruleset.
    pub fn parse_declarations(&self, origin: CssOrigin, text: &str) -> Result<Ruleset> {
        let _guard = lock(&self.cache);
        let mut options = ParserOptions::default();
        options.error_recovery = true;
        let attribute = StyleAttribute::parse(text, options).map_err(|err| {
            let (line, column) = err
                .loc
                .as_ref()
                .map(|loc| (Some(loc.line), Some(loc.column)))
                .unwrap_or((None, None));
            StyleError::Parse {
                message: err.kind.to_string(),
                line,
                column,
            }
        })?;
        let mut ruleset = Ruleset::new(origin);
        ruleset.declarations = self.convert_block(&attribute.declarations, origin);
        Ok(ruleset)
    }

    /// Reads and parses one sheet. Failures produce an empty sheet for the same URI and origin.
    pub fn parse(&self, reader: impl Read, info: &StylesheetInfo) -> Stylesheet {
        let _guard = lock(&self.cache);
        self.read_and_parse(reader, info)
    }

    pub fn parse_text(&self, text: &str, info: &StylesheetInfo) -> Stylesheet {
        let _guard = lock(&self.cache);
        self.parse_locked(text, info)
    }

    fn read_and_parse(&self, mut reader: impl Read, info: &StylesheetInfo) -> Stylesheet {
        let mut text = String::new();
        if let Err(err) = reader.read_to_string(&mut text) {
            log::warn!("failed to read stylesheet {}: {err}", info.uri);
            return Stylesheet::new(info.uri.clone(), info.origin);
        }
        self.parse_locked(&text, info)
    }

    /// Parses with the factory lock already held by the caller.
    fn parse_locked(&self, text: &str, info: &StylesheetInfo) -> Stylesheet {
        let mut options = ParserOptions::default();
        options.filename = info.uri.clone();
        options.error_recovery = true;
        let parsed = match StyleSheet::parse(text, options) {
            Ok(parsed) => parsed,
            Err(err) => {
                log::warn!("failed to parse stylesheet {}: {err}", info.uri);
                return Stylesheet::new(info.uri.clone(), info.origin);
            }
        };
        let mut sheet = Stylesheet::new(info.uri.clone(), info.origin);
        let mut page_position = 0u32;
        let mut contents = Vec::new();
        let mut imports = Vec::new();
        self.convert_rule_list(
            &parsed.rules,
            info.origin,
            &mut contents,
            &mut imports,
            &mut page_position,
        );
        for import in imports {
            sheet.push_import(import);
        }
        for rule in contents {
            sheet.push(rule);
        }
        if let Some(logger) = &self.debug {
            logger.record(
                "css.sheet",
                &[
                    ("uri", json_string(&info.uri)),
                    ("origin", json_string(info.origin.name())),
                    ("rulesets", sheet.ruleset_count().to_string()),
                    (
                        "imports",
                        json_array(
                            &sheet
                                .imports()
                                .iter()
                                .map(|import| import.href.clone())
                                .collect::<Vec<_>>(),
                        ),
                    ),
                ],
            );
        }
        sheet
    }

    /// Returns the sheet for `info`, parsing and caching it on a miss. Inline sheets are parsed
    /// every time and never enter the cache.
    pub fn get_stylesheet(&self, info: &StylesheetInfo) -> Arc<Stylesheet> {
        if let Some(content) = &info.content {
            return Arc::new(self.parse_text(content, info));
        }
        let mut cache = lock(&self.cache);
        if let Some(hit) = cache.get(&info.uri).cloned() {
            if let Some(logger) = &self.debug {
                logger.increment("stylesheet.cache_hit", 1);
            }
            return hit;
        }
        if let Some(logger) = &self.debug {
            logger.increment("stylesheet.cache_miss", 1);
        }
        let sheet = match self.loader.open_stylesheet(&info.uri) {
            Ok(reader) => self.read_and_parse(reader, info),
            Err(err) => {
                log::warn!("failed to load stylesheet {}: {err}", info.uri);
                Stylesheet::new(info.uri.clone(), info.origin)
            }
        };
        let sheet = Arc::new(sheet);
        cache.put(info.uri.clone(), sheet.clone());
        sheet
    }

    /// Loads `info` and everything it imports. Imported sheets come first, filtered by their
    /// `@import` media, and each URI is visited at most once.
    pub fn get_stylesheet_with_imports(
        &self,
        info: &StylesheetInfo,
        medium: &str,
        viewport: Option<Size>,
    ) -> Vec<Arc<Stylesheet>> {
        let mut out = Vec::new();
        let mut visiting = HashSet::new();
        self.collect_imports(info, medium, viewport, &mut visiting, &mut out);
        out
    }

    fn collect_imports(
        &self,
        info: &StylesheetInfo,
        medium: &str,
        viewport: Option<Size>,
        visiting: &mut HashSet<String>,
        out: &mut Vec<Arc<Stylesheet>>,
    ) {
        if info.content.is_none() && !visiting.insert(info.uri.clone()) {
            log::debug!("skipping cyclic import of {}", info.uri);
            return;
        }
        let sheet = self.get_stylesheet(info);
        for import in sheet.imports() {
            if !import.media.matches(medium, viewport) {
                continue;
            }
            let uri = self.loader.resolve_uri(&info.uri, &import.href);
            let imported = StylesheetInfo::new(info.origin, uri).with_media(import.media.clone());
            self.collect_imports(&imported, medium, viewport, visiting, out);
        }
        out.push(sheet);
    }

    pub fn put_cached(&self, sheet: Arc<Stylesheet>) {
        lock(&self.cache).put(sheet.uri().to_string(), sheet);
    }

    pub fn cached(&self, uri: &str) -> Option<Arc<Stylesheet>> {
        lock(&self.cache).peek(uri).cloned()
    }

    pub fn remove_cached(&self, uri: &str) -> Option<Arc<Stylesheet>> {
        lock(&self.cache).pop(uri)
    }

    pub fn flush_cache(&self) {
        lock(&self.cache).clear();
    }

    fn convert_rule_list(
        &self,
        rules: &CssRuleList,
        origin: CssOrigin,
        out: &mut Vec<StylesheetRule>,
        imports: &mut Vec<ImportRule>,
        page_position: &mut u32,
    ) {
        for rule in &rules.0 {
            match rule {
                CssRule::Style(style) => {
                    let text = style
                        .selectors
                        .to_css_string(PrinterOptions::default())
                        .unwrap_or_default();
                    let selectors = self.parse_selectors(&text);
                    if selectors.is_empty() {
                        continue;
                    }
                    let declarations = self.convert_block(&style.declarations, origin);
                    out.push(StylesheetRule::Ruleset(Arc::new(Ruleset {
                        selectors,
                        declarations,
                        origin,
                    })));
                }
                CssRule::Media(media) => {
                    let mut nested = Vec::new();
                    self.convert_rule_list(&media.rules, origin, &mut nested, imports, page_position);
                    out.push(StylesheetRule::Media(MediaRule {
                        media: MediaList::from_css(&media.query),
                        rules: nested,
                    }));
                }
                CssRule::Import(import) => imports.push(ImportRule {
                    href: import.url.to_string(),
                    media: MediaList::from_css(&import.media),
                }),
                CssRule::Page(page) => {
                    let declarations = self.convert_block(&page.declarations, origin);
                    let mut margin_boxes: BTreeMap<String, Vec<Declaration>> = BTreeMap::new();
                    for margin in &page.rules {
                        let name = margin
                            .margin_box
                            .to_css_string(PrinterOptions::default())
                            .unwrap_or_default();
                        margin_boxes
                            .entry(name)
                            .or_default()
                            .extend(self.convert_block(&margin.declarations, origin));
                    }
                    let mut targets: Vec<(Option<String>, Option<String>)> = Vec::new();
                    if page.selectors.is_empty() {
                        targets.push((None, None));
                    }
                    for selector in &page.selectors {
                        let name = selector.name.as_ref().map(|name| name.to_string());
                        let Some(pseudo) = page_pseudo(&selector.pseudo_classes) else {
                            continue;
                        };
                        targets.push((name, pseudo.map(str::to_string)));
                    }
                    for (name, pseudo) in targets {
                        let mut rule = PageRule::new(name, pseudo, origin);
                        rule.declarations = declarations.clone();
                        rule.margin_boxes = margin_boxes.clone();
                        rule.position = *page_position;
                        *page_position += 1;
                        out.push(StylesheetRule::Page(rule));
                    }
                }
                CssRule::FontFace(font_face) => {
                    let mut declarations = Vec::new();
                    for property in &font_face.properties {
                        let Ok(text) = property.to_css_string(PrinterOptions::default()) else {
                            continue;
                        };
                        let Some((name, value)) = text.split_once(':') else {
                            continue;
                        };
                        match PropertyName::from_alias(name) {
                            Some(property) => declarations.push(Declaration::new(
                                property,
                                parse_value_for(property, value.trim(), self.options),
                                false,
                                origin,
                            )),
                            None => log::trace!("ignoring @font-face descriptor {name}"),
                        }
                    }
                    out.push(StylesheetRule::FontFace(FontFaceRule {
                        declarations,
                        origin,
                    }));
                }
                _ => log::trace!("ignoring unsupported at-rule"),
            }
        }
    }

    fn parse_selectors(&self, text: &str) -> Vec<Selector> {
        let mut selectors = Vec::new();
        for alternative in split_selector_list(text) {
            let parsed = Selector::parse(&alternative);
            if let Some(logger) = &self.debug {
                logger.record(
                    "css.rule",
                    &[
                        ("selector", json_string(&alternative)),
                        ("parsed", parsed.is_ok().to_string()),
                    ],
                );
            }
            match parsed {
                Ok(selector) => {
                    if selector.is_unsupported() {
                        if let Some(logger) = &self.debug {
                            logger.increment("css.selector_unsupported", 1);
                        }
                    }
                    selectors.push(selector);
                }
                Err(err) => {
                    log::debug!("dropping selector `{alternative}`: {err}");
                    if let Some(logger) = &self.debug {
                        logger.increment("css.selector_unsupported", 1);
                    }
                }
            }
        }
        selectors
    }

    fn convert_block(&self, block: &DeclarationBlock, origin: CssOrigin) -> Vec<Declaration> {
        let mut out = Vec::new();
        for property in &block.declarations {
            self.expand_property(property, false, origin, &mut out);
        }
        for property in &block.important_declarations {
            self.expand_property(property, true, origin, &mut out);
        }
        out
    }

    /// Maps one parsed property onto modelled longhands, expanding shorthands recursively.
    fn expand_property(
        &self,
        property: &Property,
        important: bool,
        origin: CssOrigin,
        out: &mut Vec<Declaration>,
    ) {
        let id = property.property_id();
        let name = id.name().to_string();
        let target = match PropertyName::from_name(&name) {
            Some(target) => Some(target),
            None => {
                if let Some(longhands) = id.longhands() {
                    if let Property::Unparsed(unparsed) = property {
                        let keyword = property
                            .value_to_css_string(PrinterOptions::default())
                            .unwrap_or_default();
                        if is_wide_keyword(&keyword) {
                            self.expand_keyword(&unparsed.property_id, &keyword, important, origin, out);
                        } else {
                            log::debug!("dropping unparsed shorthand {name}: {keyword}");
                        }
                        return;
                    }
                    for longhand in longhands {
                        if let Some(expanded) = property.longhand(&longhand) {
                            self.expand_property(&expanded, important, origin, out);
                        }
                    }
                    return;
                }
                PropertyName::from_alias(&name)
            }
        };
        let Some(target) = target else {
            log::trace!("dropping unsupported property {name}");
            return;
        };
        let Ok(text) = property.value_to_css_string(PrinterOptions::default()) else {
            return;
        };
        if text.contains("var(") {
            log::debug!("dropping {name}: custom property references are not resolved");
            return;
        }
        out.push(Declaration::new(
            target,
            parse_value_for(target, &text, self.options),
            important,
            origin,
        ));
    }

    /// Gives every modelled longhand of `id` the same `inherit`/`initial` keyword.
    fn expand_keyword(
        &self,
        id: &PropertyId,
        keyword: &str,
        important: bool,
        origin: CssOrigin,
        out: &mut Vec<Declaration>,
    ) {
        let name = id.name();
        let target = match PropertyName::from_name(name) {
            Some(target) => Some(target),
            None => {
                if let Some(longhands) = id.longhands() {
                    for longhand in &longhands {
                        self.expand_keyword(longhand, keyword, important, origin, out);
                    }
                    return;
                }
                PropertyName::from_alias(name)
            }
        };
        match target {
            Some(target) => out.push(Declaration::new(
                target,
                parse_value(keyword, self.options),
                important,
                origin,
            )),
            None => log::trace!("dropping unsupported property {name}"),
        }
    }
}

/// Folds the pseudo-classes of one `@page` selector into a single pseudo-page. The first page
/// counts as a right page, so `:first:right` is `:first` and `:first:left` never applies.
/// Returns `None` when the selector can never match.
fn page_pseudo(classes: &[PagePseudoClass]) -> Option<Option<&'static str>> {
    let mut names: Vec<&'static str> = Vec::new();
    for class in classes {
        let name = match class {
            PagePseudoClass::First => "first",
            PagePseudoClass::Left => "left",
            PagePseudoClass::Right => "right",
            _ => {
                log::debug!("ignoring @page selector with unsupported pseudo-page");
                return None;
            }
        };
        if !names.contains(&name) {
            names.push(name);
        }
    }
    match names.as_slice() {
        [] => Some(None),
        [single] => Some(Some(*single)),
        [_, _] if names.contains(&"first") && names.contains(&"right") => Some(Some("first")),
        _ => {
            log::debug!("dropping @page selector :{} that no page satisfies", names.join(":"));
            None
        }
    }
}

fn is_wide_keyword(text: &str) -> bool {
    let text = text.trim();
    text.eq_ignore_ascii_case("inherit") || text.eq_ignore_ascii_case("initial")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::PropertyValue;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    fn factory(loader: MemoryResourceLoader) -> StylesheetFactory {
        StylesheetFactory::new(Arc::new(loader), 8, ValueOptions::default())
    }

    fn rulesets(sheet: &Stylesheet) -> Vec<Arc<Ruleset>> {
        sheet
            .contents()
            .iter()
            .filter_map(|rule| match rule {
                StylesheetRule::Ruleset(ruleset) => Some(ruleset.clone()),
                _ => None,
            })
            .collect()
    }

    fn find<'a>(declarations: &'a [Declaration], property: PropertyName) -> Option<&'a Declaration> {
        declarations.iter().find(|d| d.property == property)
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        }
    }

    #[test]
    fn failed_read_yields_empty_sheet_with_identity() {
        let factory = factory(MemoryResourceLoader::new());
        let info = StylesheetInfo::new(CssOrigin::Author, "file:///broken.css");
        let sheet = factory.parse(FailingReader, &info);
        assert_eq!(sheet.ruleset_count(), 0);
        assert_eq!(sheet.uri(), "file:///broken.css");
        assert_eq!(sheet.origin(), CssOrigin::Author);
    }

    #[test]
    fn missing_resource_yields_empty_sheet() {
        let factory = factory(MemoryResourceLoader::new());
        let info = StylesheetInfo::new(CssOrigin::User, "mem://nowhere.css");
        let sheet = factory.get_stylesheet(&info);
        assert!(sheet.is_empty());
        assert_eq!(sheet.origin(), CssOrigin::User);
    }

    #[test]
    fn shorthands_expand_to_longhands() {
        let factory = factory(MemoryResourceLoader::new());
        let info = StylesheetInfo::inline(
            CssOrigin::Author,
            "inline:test",
            "p { margin: 1px 2px; border: 3px solid red; color: blue !important }",
        );
        let sheet = factory.get_stylesheet(&info);
        let rules = rulesets(&sheet);
        assert_eq!(rules.len(), 1);
        let declarations = &rules[0].declarations;
        assert_eq!(
            find(declarations, PropertyName::MarginTop).map(|d| &d.value),
            Some(&PropertyValue::px(1.0))
        );
        assert_eq!(
            find(declarations, PropertyName::MarginLeft).map(|d| &d.value),
            Some(&PropertyValue::px(2.0))
        );
        assert_eq!(
            find(declarations, PropertyName::BorderBottomStyle).map(|d| &d.value),
            Some(&PropertyValue::ident("solid"))
        );
        assert!(find(declarations, PropertyName::Color).is_some_and(|d| d.important));
    }

    #[test]
    fn unknown_properties_and_var_references_are_dropped() {
        let factory = factory(MemoryResourceLoader::new());
        let ruleset = factory
            .parse_declarations(
                CssOrigin::Author,
                "--accent: red; color: var(--accent); content: \"x\"; break-before: page",
            )
            .expect("inline style");
        assert_eq!(ruleset.declarations.len(), 2);
        assert!(find(&ruleset.declarations, PropertyName::Content).is_some());
        assert_eq!(
            find(&ruleset.declarations, PropertyName::PageBreakBefore).map(|d| &d.value),
            Some(&PropertyValue::ident("page"))
        );
    }

    #[test]
    fn cache_hits_return_the_same_sheet() {
        let loader = MemoryResourceLoader::new().with("mem://a.css", "h1 { color: red }");
        let factory = factory(loader);
        let info = StylesheetInfo::new(CssOrigin::Author, "mem://a.css");
        let first = factory.get_stylesheet(&info);
        let second = factory.get_stylesheet(&info);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(factory.remove_cached("mem://a.css").is_some());
        let third = factory.get_stylesheet(&info);
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(*first, *third);
    }

    #[test]
    fn imports_are_flattened_ahead_and_cycles_cut() {
        let loader = MemoryResourceLoader::new()
            .with("mem:///main.css", "@import \"base.css\"; @import url(screen.css) screen; p { color: red }")
            .with("mem:///base.css", "@import \"main.css\"; body { margin: 0 }")
            .with("mem:///screen.css", "p { color: blue }");
        let factory = factory(loader);
        let info = StylesheetInfo::new(CssOrigin::Author, "mem:///main.css");
        let sheets = factory.get_stylesheet_with_imports(&info, "print", None);
        let uris: Vec<&str> = sheets.iter().map(|sheet| sheet.uri()).collect();
        assert_eq!(uris, vec!["mem:///base.css", "mem:///main.css"]);
    }

    #[test]
    fn at_rules_are_modelled() {
        let factory = factory(MemoryResourceLoader::new());
        let css = r#"
            @media print { .a { color: red } }
            @page { margin: 1in }
            @page chapter:first { @top-center { content: "Title" } }
            @font-face { font-family: "Body"; src: url(body.woff2) format("woff2") }
        "#;
        let info = StylesheetInfo::inline(CssOrigin::Author, "inline:at", css);
        let sheet = factory.get_stylesheet(&info);
        let mut pages = Vec::new();
        let mut media = 0;
        let mut fonts = Vec::new();
        for rule in sheet.contents() {
            match rule {
                StylesheetRule::Media(rule) => {
                    media += 1;
                    assert!(rule.media.matches("print", None));
                    assert_eq!(rule.rules.len(), 1);
                }
                StylesheetRule::Page(rule) => pages.push(rule.clone()),
                StylesheetRule::FontFace(rule) => fonts.push(rule.clone()),
                StylesheetRule::Ruleset(_) => {}
            }
        }
        assert_eq!(media, 1);
        assert_eq!(pages.len(), 2);
        assert!(find(&pages[0].declarations, PropertyName::MarginTop).is_some());
        assert_eq!(pages[1].name.as_deref(), Some("chapter"));
        assert_eq!(pages[1].pseudo_page.as_deref(), Some("first"));
        assert!(pages[1].margin_boxes.contains_key("top-center"));
        assert_eq!(pages[1].position, 1);
        assert_eq!(fonts.len(), 1);
        assert!(
            fonts[0]
                .family()
                .is_some_and(|family| family == "Body")
        );
        assert_eq!(fonts[0].sources()[0].uri.as_deref(), Some("body.woff2"));
    }

    #[test]
    fn wide_keywords_on_shorthands_reach_longhands() {
        let factory = factory(MemoryResourceLoader::new());
        let margin = factory
            .parse_declarations(CssOrigin::Author, "margin: inherit")
            .expect("margin");
        assert_eq!(margin.declarations.len(), 4);
        assert!(margin.declarations.iter().all(|d| d.value.is_inherit()));
        assert!(find(&margin.declarations, PropertyName::MarginLeft).is_some());

        let border = factory
            .parse_declarations(CssOrigin::Author, "border: initial !important")
            .expect("border");
        for property in [
            PropertyName::BorderTopWidth,
            PropertyName::BorderRightStyle,
            PropertyName::BorderLeftColor,
        ] {
            let declaration = find(&border.declarations, property).expect("longhand");
            assert!(declaration.value.is_initial());
            assert!(declaration.important);
        }

        let font = factory
            .parse_declarations(CssOrigin::Author, "font: inherit")
            .expect("font");
        for property in [PropertyName::FontSize, PropertyName::FontFamily, PropertyName::LineHeight] {
            assert!(find(&font.declarations, property).expect("longhand").value.is_inherit());
        }
    }

    #[test]
    fn inline_declarations_recover_from_bad_tokens() {
        let factory = factory(MemoryResourceLoader::new());
        let ruleset = factory
            .parse_declarations(CssOrigin::Author, "color: red; margin: 1px; {")
            .expect("recovered");
        assert!(find(&ruleset.declarations, PropertyName::Color).is_some());
        assert!(find(&ruleset.declarations, PropertyName::MarginTop).is_some());
    }

    struct SlowLoader {
        opens: AtomicUsize,
    }

    impl ResourceLoader for SlowLoader {
        fn open_stylesheet(&self, _uri: &str) -> Result<Box<dyn Read + Send>> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(50));
            Ok(Box::new(io::Cursor::new(b"p { color: red }".to_vec())))
        }
    }

    #[test]
    fn concurrent_misses_load_the_sheet_once() {
        let loader = Arc::new(SlowLoader {
            opens: AtomicUsize::new(0),
        });
        let factory = Arc::new(StylesheetFactory::new(
            loader.clone(),
            8,
            ValueOptions::default(),
        ));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let factory = factory.clone();
                thread::spawn(move || {
                    factory.get_stylesheet(&StylesheetInfo::new(CssOrigin::Author, "mem:a.css"))
                })
            })
            .collect();
        let sheets: Vec<Arc<Stylesheet>> = handles
            .into_iter()
            .map(|handle| handle.join().expect("worker"))
            .collect();
        assert_eq!(loader.opens.load(Ordering::SeqCst), 1);
        assert!(sheets.iter().all(|sheet| Arc::ptr_eq(sheet, &sheets[0])));
        assert_eq!(sheets[0].ruleset_count(), 1);
    }

    #[test]
    fn page_selectors_fold_pseudo_classes() {
        let factory = factory(MemoryResourceLoader::new());
        let css = "@page :first:right { margin: 1in } @page :first:left { margin: 2in } @page :left:left { margin: 3in }";
        let sheet = factory.parse_text(css, &StylesheetInfo::inline(CssOrigin::Author, "inline:pages", css));
        let pages: Vec<Option<String>> = sheet
            .contents()
            .iter()
            .filter_map(|rule| match rule {
                StylesheetRule::Page(rule) => Some(rule.pseudo_page.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(pages, vec![Some("first".to_string()), Some("left".to_string())]);
    }

    #[test]
    fn file_loader_resolves_relative_uris() {
        let loader = FileResourceLoader;
        assert_eq!(
            loader.resolve_uri("https://example.com/css/main.css", "../base.css"),
            "https://example.com/base.css"
        );
        assert_eq!(
            loader.resolve_uri("/srv/site/main.css", "print.css"),
            "/srv/site/print.css"
        );
        assert!(loader.open_stylesheet("https://example.com/a.css").is_err());
    }
}
