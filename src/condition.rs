use crate::error::{Result, StyleError};
use regex::Regex;
use std::hash::Hash;
use std::sync::OnceLock;

/// Tree navigation supplied by the markup collaborator.
pub trait TreeResolver {
    type Element: Clone + Eq + Hash;

    fn parent_element(&self, element: &Self::Element) -> Option<Self::Element>;
    fn previous_sibling_element(&self, element: &Self::Element) -> Option<Self::Element>;
    fn element_name(&self, element: &Self::Element) -> String;
    fn is_first_child_element(&self, element: &Self::Element) -> bool;
    fn is_last_child_element(&self, element: &Self::Element) -> bool;
    /// Zero-based index among element siblings.
    fn position_of_element(&self, element: &Self::Element) -> usize;

    fn matches_element(&self, element: &Self::Element, name: &str) -> bool {
        name == "*" || self.element_name(element).eq_ignore_ascii_case(name)
    }
}

/// Attribute and state queries supplied by the markup collaborator.
pub trait AttributeResolver<E> {
    fn attribute_value(&self, element: &E, namespace: Option<&str>, name: &str) -> Option<String>;
    fn class(&self, element: &E) -> Option<String>;
    fn id(&self, element: &E) -> Option<String>;
    fn lang(&self, element: &E) -> Option<String>;
    /// Contents of the `style` attribute.
    fn element_styling(&self, element: &E) -> Option<String>;
    /// Presentational hints expressed as CSS declarations (`bgcolor`, `align`...).
    fn non_css_styling(&self, _element: &E) -> Option<String> {
        None
    }
    fn is_link(&self, element: &E) -> bool;
    fn is_visited(&self, _element: &E) -> bool {
        false
    }
    fn is_hover(&self, _element: &E) -> bool {
        false
    }
    fn is_active(&self, _element: &E) -> bool {
        false
    }
    fn is_focus(&self, _element: &E) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicState {
    Visited,
    Hover,
    Active,
    Focus,
}

/// One clause of a compound selector.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    AttributeExists {
        namespace: Option<String>,
        name: String,
    },
    AttributeEquals {
        namespace: Option<String>,
        name: String,
        value: String,
    },
    AttributePrefix {
        namespace: Option<String>,
        name: String,
        value: String,
    },
    AttributeSuffix {
        namespace: Option<String>,
        name: String,
        value: String,
    },
    AttributeSubstring {
        namespace: Option<String>,
        name: String,
        value: String,
    },
    /// `[name~=value]`
    AttributeMatchesList {
        namespace: Option<String>,
        name: String,
        value: String,
    },
    /// `[name|=value]`
    AttributeMatchesFirstPart {
        namespace: Option<String>,
        name: String,
        value: String,
    },
    Class(String),
    Id(String),
    Lang(String),
    FirstChild,
    LastChild,
    NthChild(NthChild),
    Link,
    Dynamic(DynamicState),
    Root,
    Not(Vec<Condition>, Option<String>),
    Unsupported(String),
}

/// How dynamic pseudo-classes are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    Live,
    /// `:hover` is assumed to hold. Used to find rules an element could pick up on hover.
    AssumeHover,
}

impl Condition {
    pub fn matches<T: TreeResolver>(
        &self,
        element: &T::Element,
        attributes: Option<&dyn AttributeResolver<T::Element>>,
        tree: &T,
    ) -> bool {
        self.matches_with_mode(element, attributes, tree, MatchMode::Live)
    }

    pub fn matches_with_mode<T: TreeResolver>(
        &self,
        element: &T::Element,
        attributes: Option<&dyn AttributeResolver<T::Element>>,
        tree: &T,
        mode: MatchMode,
    ) -> bool {
        match self {
            Condition::AttributeExists { namespace, name } => {
                attribute(attributes, element, namespace, name).is_some()
            }
            Condition::AttributeEquals {
                namespace,
                name,
                value,
            } => attribute(attributes, element, namespace, name).is_some_and(|v| v == *value),
            Condition::AttributePrefix {
                namespace,
                name,
                value,
            } => attribute(attributes, element, namespace, name)
                .is_some_and(|v| v.starts_with(value.as_str())),
            Condition::AttributeSuffix {
                namespace,
                name,
                value,
            } => attribute(attributes, element, namespace, name)
                .is_some_and(|v| v.ends_with(value.as_str())),
            Condition::AttributeSubstring {
                namespace,
                name,
                value,
            } => attribute(attributes, element, namespace, name)
                .is_some_and(|v| v.contains(value.as_str())),
            Condition::AttributeMatchesList {
                namespace,
                name,
                value,
            } => attribute(attributes, element, namespace, name)
                .is_some_and(|v| v.split_whitespace().any(|part| part == value)),
            Condition::AttributeMatchesFirstPart {
                namespace,
                name,
                value,
            } => attribute(attributes, element, namespace, name).is_some_and(|v| {
                v.split('-').next().is_some_and(|first| first == value)
            }),
            Condition::Class(class) => attributes
                .and_then(|resolver| resolver.class(element))
                .is_some_and(|classes| classes.split_whitespace().any(|c| c == class)),
            Condition::Id(id) => attributes
                .and_then(|resolver| resolver.id(element))
                .is_some_and(|value| value == *id),
            Condition::Lang(lang) => attributes
                .and_then(|resolver| resolver.lang(element))
                .is_some_and(|value| lang_matches(&value, lang)),
            Condition::FirstChild => tree.is_first_child_element(element),
            Condition::LastChild => tree.is_last_child_element(element),
            Condition::NthChild(nth) => nth.matches(tree.position_of_element(element)),
            Condition::Link => attributes.is_some_and(|resolver| resolver.is_link(element)),
            Condition::Dynamic(state) => {
                if mode == MatchMode::AssumeHover && *state == DynamicState::Hover {
                    return true;
                }
                attributes.is_some_and(|resolver| match state {
                    DynamicState::Visited => resolver.is_visited(element),
                    DynamicState::Hover => resolver.is_hover(element),
                    DynamicState::Active => resolver.is_active(element),
                    DynamicState::Focus => resolver.is_focus(element),
                })
            }
            Condition::Root => tree.parent_element(element).is_none(),
            Condition::Not(inner, name) => {
                let name_matches = name
                    .as_deref()
                    .is_none_or(|name| tree.matches_element(element, name));
                !(name_matches
                    && inner
                        .iter()
                        .all(|c| c.matches_with_mode(element, attributes, tree, mode)))
            }
            Condition::Unsupported(_) => false,
        }
    }

    pub fn is_hover(&self) -> bool {
        matches!(self, Condition::Dynamic(DynamicState::Hover))
    }

    /// (ids, classes/attributes/pseudo-classes, types) contributed by this clause.
    pub fn specificity(&self) -> (u16, u16, u16) {
        match self {
            Condition::Id(_) => (1, 0, 0),
            Condition::Not(inner, name) => {
                let mut total = (0, 0, u16::from(name.is_some()));
                for condition in inner {
                    let (a, b, c) = condition.specificity();
                    total.0 += a;
                    total.1 += b;
                    total.2 += c;
                }
                total
            }
            _ => (0, 1, 0),
        }
    }
}

fn attribute<E>(
    attributes: Option<&dyn AttributeResolver<E>>,
    element: &E,
    namespace: &Option<String>,
    name: &str,
) -> Option<String> {
    attributes?.attribute_value(element, namespace.as_deref(), name)
}

fn lang_matches(value: &str, lang: &str) -> bool {
    if value.eq_ignore_ascii_case(lang) {
        return true;
    }
    value.len() > lang.len()
        && value.as_bytes()[lang.len()] == b'-'
        && value[..lang.len()].eq_ignore_ascii_case(lang)
}

/// `:nth-child(an+b)` with one-based positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NthChild {
    pub a: i32,
    pub b: i32,
}

fn nth_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^([-+]?)(\d*)n(\s*([-+])\s*(\d+))?$").ok())
        .as_ref()
}

impl NthChild {
    pub fn new(a: i32, b: i32) -> Self {
        Self { a, b }
    }

    pub fn from_str(raw: &str) -> Result<Self> {
        let text = raw.trim().to_ascii_lowercase();
        if text == "even" {
            return Ok(Self::new(2, 0));
        }
        if text == "odd" {
            return Ok(Self::new(2, 1));
        }
        if let Ok(b) = text.parse::<i32>() {
            return Ok(Self::new(0, b));
        }
        let captures = nth_pattern()
            .and_then(|pattern| pattern.captures(&text))
            .ok_or_else(|| StyleError::parse(format!("invalid nth-child expression `{raw}`")))?;
        let negative = captures.get(1).is_some_and(|m| m.as_str() == "-");
        let a = match captures.get(2).map(|m| m.as_str()).unwrap_or("") {
            "" => 1,
            digits => digits
                .parse::<i32>()
                .map_err(|_| StyleError::parse(format!("nth-child step out of range `{raw}`")))?,
        };
        let a = if negative { -a } else { a };
        let b = match captures.get(5) {
            Some(digits) => {
                let b = digits.as_str().parse::<i32>().map_err(|_| {
                    StyleError::parse(format!("nth-child offset out of range `{raw}`"))
                })?;
                if captures.get(4).is_some_and(|m| m.as_str() == "-") {
                    -b
                } else {
                    b
                }
            }
            None => 0,
        };
        Ok(Self::new(a, b))
    }

    /// `position` is the zero-based sibling index reported by the tree resolver.
    pub fn matches(&self, position: usize) -> bool {
        let position = position as i64 + 1;
        let diff = position - self.b as i64;
        let a = self.a as i64;
        if a == 0 {
            diff == 0
        } else if a < 0 {
            diff <= 0 && diff % a == 0
        } else {
            diff >= 0 && diff % a == 0
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    /// A flat list of siblings under one parent, enough to exercise every condition.
    pub(crate) struct Siblings {
        pub attrs: Vec<HashMap<String, String>>,
    }

    impl Siblings {
        pub fn new(count: usize) -> Self {
            Self {
                attrs: vec![HashMap::new(); count],
            }
        }

        pub fn with_attr(mut self, index: usize, name: &str, value: &str) -> Self {
            self.attrs[index].insert(name.to_string(), value.to_string());
            self
        }
    }

    impl TreeResolver for Siblings {
        type Element = usize;

        fn parent_element(&self, _element: &usize) -> Option<usize> {
            None
        }
        fn previous_sibling_element(&self, element: &usize) -> Option<usize> {
            element.checked_sub(1)
        }
        fn element_name(&self, _element: &usize) -> String {
            "li".to_string()
        }
        fn is_first_child_element(&self, element: &usize) -> bool {
            *element == 0
        }
        fn is_last_child_element(&self, element: &usize) -> bool {
            *element + 1 == self.attrs.len()
        }
        fn position_of_element(&self, element: &usize) -> usize {
            *element
        }
    }

    impl AttributeResolver<usize> for Siblings {
        fn attribute_value(&self, element: &usize, _ns: Option<&str>, name: &str) -> Option<String> {
            self.attrs.get(*element)?.get(name).cloned()
        }
        fn class(&self, element: &usize) -> Option<String> {
            self.attribute_value(element, None, "class")
        }
        fn id(&self, element: &usize) -> Option<String> {
            self.attribute_value(element, None, "id")
        }
        fn lang(&self, element: &usize) -> Option<String> {
            self.attribute_value(element, None, "lang")
        }
        fn element_styling(&self, element: &usize) -> Option<String> {
            self.attribute_value(element, None, "style")
        }
        fn is_link(&self, element: &usize) -> bool {
            self.attribute_value(element, None, "href").is_some()
        }
    }

    fn check(condition: &Condition, tree: &Siblings, element: usize) -> bool {
        condition.matches(&element, Some(tree as &dyn AttributeResolver<usize>), tree)
    }

    fn attr_value(name: &str, value: &str) -> (Option<String>, String, String) {
        (None, name.to_string(), value.to_string())
    }

    #[test]
    fn list_membership_needs_whole_word() {
        let tree = Siblings::new(1).with_attr(0, "class", "a b c");
        let (namespace, name, _) = attr_value("class", "");
        let hit = Condition::AttributeMatchesList {
            namespace: namespace.clone(),
            name: name.clone(),
            value: "b".into(),
        };
        let miss = Condition::AttributeMatchesList {
            namespace,
            name,
            value: "ab".into(),
        };
        assert!(check(&hit, &tree, 0));
        assert!(!check(&miss, &tree, 0));
        assert!(check(&Condition::Class("c".into()), &tree, 0));
        assert!(!check(&Condition::Class("B".into()), &tree, 0));
    }

    #[test]
    fn attribute_operators_compare_case_sensitively() {
        let tree = Siblings::new(1)
            .with_attr(0, "href", "https://example.com/Doc.pdf")
            .with_attr(0, "hreflang", "en-US");
        let (ns, name, value) = attr_value("href", "https://");
        assert!(check(
            &Condition::AttributePrefix {
                namespace: ns.clone(),
                name: name.clone(),
                value
            },
            &tree,
            0
        ));
        assert!(check(
            &Condition::AttributeSuffix {
                namespace: ns.clone(),
                name: name.clone(),
                value: ".pdf".into()
            },
            &tree,
            0
        ));
        assert!(!check(
            &Condition::AttributeSubstring {
                namespace: ns.clone(),
                name: name.clone(),
                value: "doc".into()
            },
            &tree,
            0
        ));
        assert!(check(
            &Condition::AttributeMatchesFirstPart {
                namespace: ns.clone(),
                name: "hreflang".into(),
                value: "en".into()
            },
            &tree,
            0
        ));
        assert!(!check(
            &Condition::AttributeExists {
                namespace: ns,
                name: "title".into()
            },
            &tree,
            0
        ));
    }

    #[test]
    fn attribute_conditions_fail_without_resolver() {
        let tree = Siblings::new(1).with_attr(0, "id", "x");
        let condition = Condition::Id("x".into());
        assert!(check(&condition, &tree, 0));
        assert!(!condition.matches(&0usize, None, &tree));
    }

    #[test]
    fn lang_matches_primary_subtag_ignoring_case() {
        let tree = Siblings::new(3)
            .with_attr(0, "lang", "en-GB")
            .with_attr(1, "lang", "EN")
            .with_attr(2, "lang", "english");
        let condition = Condition::Lang("en".into());
        assert!(check(&condition, &tree, 0));
        assert!(check(&condition, &tree, 1));
        assert!(!check(&condition, &tree, 2));
    }

    #[test]
    fn structural_conditions_use_tree_resolver() {
        let tree = Siblings::new(3);
        assert!(check(&Condition::FirstChild, &tree, 0));
        assert!(!check(&Condition::FirstChild, &tree, 1));
        assert!(check(&Condition::LastChild, &tree, 2));
        assert!(check(&Condition::Root, &tree, 1));
        assert!(!check(&Condition::Unsupported("checked".into()), &tree, 0));
    }

    #[test]
    fn hover_only_matches_when_assumed() {
        let tree = Siblings::new(1);
        let hover = Condition::Dynamic(DynamicState::Hover);
        let attrs: &dyn AttributeResolver<usize> = &tree;
        assert!(!hover.matches(&0usize, Some(attrs), &tree));
        assert!(hover.matches_with_mode(&0usize, Some(attrs), &tree, MatchMode::AssumeHover));
        assert!(hover.is_hover());
    }

    #[test]
    fn not_negates_inner_compound() {
        let tree = Siblings::new(2).with_attr(1, "class", "skip");
        let condition = Condition::Not(vec![Condition::Class("skip".into())], None);
        assert!(check(&condition, &tree, 0));
        assert!(!check(&condition, &tree, 1));
        assert_eq!(condition.specificity(), (0, 1, 0));
    }

    fn matching_positions(nth: NthChild, count: usize) -> Vec<usize> {
        (0..count).filter(|p| nth.matches(*p)).map(|p| p + 1).collect()
    }

    #[test]
    fn nth_keywords_equal_their_formulas() {
        let even = NthChild::from_str("even").expect("even");
        let two_n = NthChild::from_str("2n").expect("2n");
        assert_eq!(even, two_n);
        assert_eq!(matching_positions(even, 7), vec![2, 4, 6]);

        let odd = NthChild::from_str("odd").expect("odd");
        let formula = NthChild::from_str("2n+1").expect("2n+1");
        assert_eq!(odd, formula);
        assert_eq!(matching_positions(odd, 6), vec![1, 3, 5]);
    }

    #[test]
    fn bare_integer_matches_single_position() {
        let third = NthChild::from_str("3").expect("3");
        assert_eq!(third, NthChild::new(0, 3));
        assert_eq!(matching_positions(third, 10), vec![3]);
    }

    #[test]
    fn formula_variants_parse() {
        assert_eq!(NthChild::from_str("-n + 3").expect("-n+3"), NthChild::new(-1, 3));
        assert_eq!(NthChild::from_str("+3n - 2").expect("3n-2"), NthChild::new(3, -2));
        assert_eq!(NthChild::from_str("n").expect("n"), NthChild::new(1, 0));
        assert_eq!(matching_positions(NthChild::new(-1, 3), 6), vec![1, 2, 3]);
        assert_eq!(matching_positions(NthChild::new(3, -2), 8), vec![1, 4, 7]);
    }

    #[test]
    fn positive_step_starts_at_offset() {
        let nth = NthChild::from_str("2n+5").expect("2n+5");
        assert_eq!(matching_positions(nth, 10), vec![5, 7, 9]);
    }

    #[test]
    fn malformed_expression_is_a_parse_error() {
        let err = NthChild::from_str("not-a-valid-expr").expect_err("must fail");
        assert!(err.is_parse_error());
        assert!(NthChild::from_str("2x+1").is_err());
    }
}
