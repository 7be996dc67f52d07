use crate::property::PropertyName;
use crate::stylesheet::{CssOrigin, Declaration};
use crate::value::PropertyValue;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::Write;

/// The winning declaration per property for one element, folded from a cascade-sorted list.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadedStyle {
    declarations: BTreeMap<PropertyName, Declaration>,
    fingerprint: String,
}

impl CascadedStyle {
    /// Folds declarations that are already in cascade order: later entries win.
    pub fn from_sorted(declarations: impl IntoIterator<Item = Declaration>) -> Self {
        let mut folded = BTreeMap::new();
        for declaration in declarations {
            folded.insert(declaration.property, declaration);
        }
        let fingerprint = fingerprint(&folded);
        Self {
            declarations: folded,
            fingerprint,
        }
    }

    pub fn empty() -> Self {
        Self::from_sorted(std::iter::empty())
    }

    /// Style for a generated box that has no element of its own.
    pub fn anonymous(display: &str) -> Self {
        Self::from_sorted([Declaration::new(
            PropertyName::Display,
            PropertyValue::ident(display),
            false,
            CssOrigin::UserAgent,
        )])
    }

    /// Returns a new style where `overrides` win over this one.
    pub fn with_overrides(&self, overrides: impl IntoIterator<Item = Declaration>) -> Self {
        Self::from_sorted(self.declarations.values().cloned().chain(overrides))
    }

    pub fn property(&self, property: PropertyName) -> Option<&Declaration> {
        self.declarations.get(&property)
    }

    pub fn value(&self, property: PropertyName) -> Option<&PropertyValue> {
        self.property(property).map(|declaration| &declaration.value)
    }

    pub fn has_property(&self, property: PropertyName) -> bool {
        self.declarations.contains_key(&property)
    }

    /// Winning declarations in property id order.
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.values()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Stable identity of the folded declarations. Equal cascades have equal fingerprints.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

impl Default for CascadedStyle {
    fn default() -> Self {
        Self::empty()
    }
}

fn fingerprint(declarations: &BTreeMap<PropertyName, Declaration>) -> String {
    let mut hasher = Sha256::new();
    for declaration in declarations.values() {
        hasher.update(
            format!(
                "{}:{}:{};",
                declaration.property.id(),
                declaration.value,
                declaration.important
            )
            .as_bytes(),
        );
    }
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(property: PropertyName, value: &str, origin: CssOrigin) -> Declaration {
        Declaration::new(property, PropertyValue::ident(value), false, origin)
    }

    #[test]
    fn later_declarations_win() {
        let style = CascadedStyle::from_sorted([
            decl(PropertyName::Color, "red", CssOrigin::UserAgent),
            decl(PropertyName::Display, "block", CssOrigin::Author),
            decl(PropertyName::Color, "blue", CssOrigin::Author),
        ]);
        assert_eq!(style.len(), 2);
        assert_eq!(
            style.value(PropertyName::Color),
            Some(&PropertyValue::ident("blue"))
        );
    }

    #[test]
    fn fingerprint_depends_on_winners_only() {
        let a = CascadedStyle::from_sorted([
            decl(PropertyName::Color, "red", CssOrigin::UserAgent),
            decl(PropertyName::Color, "blue", CssOrigin::Author),
        ]);
        let b = CascadedStyle::from_sorted([decl(PropertyName::Color, "blue", CssOrigin::User)]);
        let c = CascadedStyle::from_sorted([decl(PropertyName::Color, "green", CssOrigin::User)]);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn anonymous_and_overrides() {
        let anon = CascadedStyle::anonymous("table-row");
        assert_eq!(
            anon.value(PropertyName::Display),
            Some(&PropertyValue::ident("table-row"))
        );
        let overridden = anon.with_overrides([decl(PropertyName::Display, "block", CssOrigin::Author)]);
        assert_eq!(
            overridden.value(PropertyName::Display),
            Some(&PropertyValue::ident("block"))
        );
        assert!(CascadedStyle::empty().is_empty());
        assert_ne!(CascadedStyle::empty().fingerprint(), anon.fingerprint());
    }
}
