use crate::cascaded::CascadedStyle;
use crate::debug::DebugLogger;
use crate::derived::DerivedCache;
use crate::error::{Result, StyleError};
use crate::property::PropertyName;
use crate::types::Pt;
use crate::value::{parse_value, PropertyValue, Unit, ValueOptions};
use std::cell::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;

/// Index of a calculated style inside its [`StyleArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StyleId(usize);

impl StyleId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Initial font size: the UA `medium` of 16px.
pub const MEDIUM_FONT_SIZE: Pt = Pt::from_whole(12);

const FONT_SIZE_KEYWORDS: [(&str, f32); 7] = [
    ("xx-small", 0.6),
    ("x-small", 0.75),
    ("small", 8.0 / 9.0),
    ("medium", 1.0),
    ("large", 1.2),
    ("x-large", 1.5),
    ("xx-large", 2.0),
];

/// Alias chains longer than this are treated as a broken property table.
const MAX_ALIAS_DEPTH: usize = 8;

/// One element's resolved property table. Slots fill lazily and never change once set.
pub struct CalculatedStyle {
    parent: Option<StyleId>,
    cascaded: Arc<CascadedStyle>,
    slots: Vec<OnceCell<PropertyValue>>,
    pub(crate) derived: DerivedCache,
}

impl CalculatedStyle {
    fn new(parent: Option<StyleId>, cascaded: Arc<CascadedStyle>) -> Self {
        Self {
            parent,
            cascaded,
            slots: (0..PropertyName::count()).map(|_| OnceCell::new()).collect(),
            derived: DerivedCache::default(),
        }
    }

    pub fn parent(&self) -> Option<StyleId> {
        self.parent
    }

    pub fn cascaded(&self) -> &Arc<CascadedStyle> {
        &self.cascaded
    }
}

/// Owns every calculated style of one layout pass. Children with equal cascades under the
/// same parent share one entry.
pub struct StyleArena {
    styles: Vec<CalculatedStyle>,
    children: HashMap<(StyleId, String), StyleId>,
    options: ValueOptions,
    debug: Option<Arc<DebugLogger>>,
}

impl StyleArena {
    pub fn new(options: ValueOptions) -> Self {
        Self {
            styles: vec![CalculatedStyle::new(None, Arc::new(CascadedStyle::empty()))],
            children: HashMap::new(),
            options,
            debug: None,
        }
    }

    pub fn with_debug(mut self, debug: Option<Arc<DebugLogger>>) -> Self {
        self.debug = debug;
        self
    }

    /// The parentless style every document root derives from. It holds initial values only.
    pub fn root(&self) -> StyleId {
        StyleId(0)
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    pub fn get(&self, id: StyleId) -> &CalculatedStyle {
        &self.styles[id.0]
    }

    pub fn parent(&self, id: StyleId) -> Option<StyleId> {
        self.get(id).parent
    }

    pub fn derive_style(&mut self, parent: StyleId, cascaded: Arc<CascadedStyle>) -> StyleId {
        let key = (parent, cascaded.fingerprint().to_string());
        if let Some(existing) = self.children.get(&key) {
            if let Some(logger) = &self.debug {
                logger.increment("style.derive.cache_hit", 1);
            }
            return *existing;
        }
        if let Some(logger) = &self.debug {
            logger.increment("style.derive.cache_miss", 1);
        }
        let id = StyleId(self.styles.len());
        self.styles.push(CalculatedStyle::new(Some(parent), cascaded));
        self.children.insert(key, id);
        id
    }

    /// Resolved value of `property`: explicit value, then inheritance, then the initial value.
    pub fn value(&self, id: StyleId, property: PropertyName) -> Result<&PropertyValue> {
        let slot = &self.get(id).slots[property.id()];
        if let Some(value) = slot.get() {
            return Ok(value);
        }
        let resolved = self.resolve(id, property)?;
        Ok(slot.get_or_init(|| resolved))
    }

    pub fn value_by_name(&self, id: StyleId, name: &str) -> Result<Option<&PropertyValue>> {
        match PropertyName::from_alias(name) {
            Some(property) => self.value(id, property).map(Some),
            None => Ok(None),
        }
    }

    fn resolve(&self, id: StyleId, property: PropertyName) -> Result<PropertyValue> {
        let style = self.get(id);
        if let Some(declaration) = style.cascaded.property(property) {
            let value = &declaration.value;
            if value.is_inherit() {
                return match style.parent {
                    Some(parent) => self.value(parent, property).cloned(),
                    None => self.initial(id, property, 0),
                };
            }
            if !value.is_initial() {
                return self.compute(id, property, value);
            }
            return self.initial(id, property, 0);
        }
        if property.is_inherited() {
            if let Some(parent) = style.parent {
                return self.value(parent, property).cloned();
            }
        }
        self.initial(id, property, 0)
    }

    fn initial(&self, id: StyleId, property: PropertyName, depth: usize) -> Result<PropertyValue> {
        self.initial_from_text(id, property, property.initial_value(), depth)
    }

    fn initial_from_text(
        &self,
        id: StyleId,
        property: PropertyName,
        text: &str,
        depth: usize,
    ) -> Result<PropertyValue> {
        let Some(alias) = text.strip_prefix('=') else {
            if text.trim().is_empty() {
                return Err(StyleError::Configuration(format!(
                    "property {property} has no initial value"
                )));
            }
            return Ok(parse_value(text, self.options));
        };
        if depth >= MAX_ALIAS_DEPTH {
            return Err(StyleError::Configuration(format!(
                "initial value alias chain of {property} does not terminate"
            )));
        }
        let Some(target) = PropertyName::from_name(alias) else {
            return Err(StyleError::Configuration(format!(
                "property {property} aliases unknown property {alias}"
            )));
        };
        if target == property {
            return self.initial(id, target, depth + 1);
        }
        self.value(id, target).cloned()
    }

    /// Turns specified values into computed ones where descendants must not recompute them.
    fn compute(
        &self,
        id: StyleId,
        property: PropertyName,
        value: &PropertyValue,
    ) -> Result<PropertyValue> {
        match property {
            PropertyName::FontSize => self.compute_font_size(id, value),
            PropertyName::FontWeight => self.compute_font_weight(id, value),
            _ if has_font_relative_length(value) => {
                let font_size = self.font_size(id)?;
                let root_font_size = if self.parent(id) == Some(self.root()) {
                    font_size
                } else {
                    self.root_font_size(id)?
                };
                Ok(absolutise(value, font_size, root_font_size))
            }
            _ => Ok(value.clone()),
        }
    }

    fn parent_font_size(&self, id: StyleId) -> Result<Pt> {
        match self.parent(id) {
            Some(parent) => self.font_size(parent),
            None => Ok(MEDIUM_FONT_SIZE),
        }
    }

    /// Font size of the topmost element ancestor, used by `rem`.
    fn root_font_size(&self, id: StyleId) -> Result<Pt> {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            if parent == self.root() {
                if current == id {
                    break;
                }
                return self.font_size(current);
            }
            current = parent;
        }
        Ok(MEDIUM_FONT_SIZE)
    }

    fn compute_font_size(&self, id: StyleId, value: &PropertyValue) -> Result<PropertyValue> {
        if let Some(keyword) = value.as_ident() {
            return Ok(match keyword {
                "smaller" | "larger" => self.step_font_size(id, keyword == "larger")?,
                _ => value.clone(),
            });
        }
        let Some((amount, unit)) = value.as_length() else {
            return Ok(value.clone());
        };
        let parent = self.parent_font_size(id)?;
        let pt = match unit {
            Unit::Percent => parent * (amount / 100.0),
            Unit::Rem => self.root_font_size(id)? * amount,
            other => match other.to_pt(amount, parent, parent) {
                Some(pt) => pt,
                None => return Ok(value.clone()),
            },
        };
        Ok(pt_value(pt))
    }

    /// `smaller`/`larger` step through the keyword table when the parent size is a keyword,
    /// and scale by 1.2 otherwise.
    fn step_font_size(&self, id: StyleId, larger: bool) -> Result<PropertyValue> {
        let parent_value = match self.parent(id) {
            Some(parent) => self.value(parent, PropertyName::FontSize)?.clone(),
            None => PropertyValue::ident("medium"),
        };
        if let Some(keyword) = parent_value.as_ident() {
            if let Some(idx) = FONT_SIZE_KEYWORDS.iter().position(|(name, _)| *name == keyword) {
                let next = if larger { idx + 1 } else { idx.wrapping_sub(1) };
                if let Some((name, _)) = FONT_SIZE_KEYWORDS.get(next) {
                    return Ok(PropertyValue::ident(name));
                }
            }
        }
        let parent = self.parent_font_size(id)?;
        Ok(pt_value(if larger { parent * 1.2 } else { parent / 1.2 }))
    }

    fn compute_font_weight(&self, id: StyleId, value: &PropertyValue) -> Result<PropertyValue> {
        let parent = match self.parent(id) {
            Some(parent) => self.font_weight(parent)?,
            None => 400,
        };
        let weight = match value.as_ident() {
            Some("normal") => 400,
            Some("bold") => 700,
            Some("bolder") => match parent {
                0..=349 => 400,
                350..=549 => 700,
                _ => 900,
            },
            Some("lighter") => match parent {
                0..=549 => 100,
                550..=749 => 400,
                _ => 700,
            },
            _ => match value.as_number() {
                Some(number) => number.clamp(1.0, 1000.0) as u16,
                None => return Ok(value.clone()),
            },
        };
        Ok(PropertyValue::number(weight as f32))
    }

    pub fn font_size(&self, id: StyleId) -> Result<Pt> {
        let value = self.value(id, PropertyName::FontSize)?;
        if let Some(keyword) = value.as_ident() {
            if let Some((_, scale)) = FONT_SIZE_KEYWORDS.iter().find(|(name, _)| *name == keyword)
            {
                return Ok(MEDIUM_FONT_SIZE * *scale);
            }
            log::debug!("unknown font-size keyword `{keyword}`, using medium");
            return Ok(MEDIUM_FONT_SIZE);
        }
        match value.as_length() {
            Some((amount, unit)) => {
                let parent = self.parent_font_size(id)?;
                Ok(unit.to_pt(amount, parent, parent).unwrap_or(MEDIUM_FONT_SIZE))
            }
            None => Ok(MEDIUM_FONT_SIZE),
        }
    }

    pub fn font_weight(&self, id: StyleId) -> Result<u16> {
        let value = self.value(id, PropertyName::FontWeight)?;
        Ok(match value.as_ident() {
            Some("bold") => 700,
            _ => value.as_number().map(|n| n as u16).unwrap_or(400),
        })
    }
}

fn pt_value(pt: Pt) -> PropertyValue {
    PropertyValue::Length {
        value: pt.to_f32(),
        unit: Unit::Pt,
    }
}

fn has_font_relative_length(value: &PropertyValue) -> bool {
    match value {
        PropertyValue::Length { unit, .. } => unit.is_font_relative(),
        PropertyValue::List { items, .. } => items.iter().any(has_font_relative_length),
        _ => false,
    }
}

fn absolutise(value: &PropertyValue, font_size: Pt, root_font_size: Pt) -> PropertyValue {
    match value {
        PropertyValue::Length { value: amount, unit } if unit.is_font_relative() => {
            match unit.to_pt(*amount, font_size, root_font_size) {
                Some(pt) => pt_value(pt),
                None => value.clone(),
            }
        }
        PropertyValue::List { separator, items } => PropertyValue::List {
            separator: *separator,
            items: items
                .iter()
                .map(|item| absolutise(item, font_size, root_font_size))
                .collect(),
        },
        other => other.clone(),
    }
}
