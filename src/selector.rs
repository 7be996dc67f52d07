use crate::condition::{
    AttributeResolver, Condition, DynamicState, MatchMode, NthChild, TreeResolver,
};
use crate::error::{Result, StyleError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Specificity(pub u16, pub u16, pub u16);

impl Specificity {
    fn into_tuple(self) -> (u16, u16, u16) {
        (self.0, self.1, self.2)
    }

    fn add(&mut self, (a, b, c): (u16, u16, u16)) {
        self.0 = self.0.saturating_add(a);
        self.1 = self.1.saturating_add(b);
        self.2 = self.2.saturating_add(c);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PseudoElement {
    Before,
    After,
    FirstLine,
    FirstLetter,
}

impl PseudoElement {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim_start_matches(':').to_ascii_lowercase().as_str() {
            "before" => Some(PseudoElement::Before),
            "after" => Some(PseudoElement::After),
            "first-line" => Some(PseudoElement::FirstLine),
            "first-letter" => Some(PseudoElement::FirstLetter),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PseudoElement::Before => "before",
            PseudoElement::After => "after",
            PseudoElement::FirstLine => "first-line",
            PseudoElement::FirstLetter => "first-letter",
        }
    }
}

/// A type selector plus its conjunction of conditions, evaluated left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundSelector {
    /// Lowercase element name, `None` for the universal selector.
    pub name: Option<String>,
    pub conditions: Vec<Condition>,
}

impl CompoundSelector {
    fn matches<T: TreeResolver>(
        &self,
        element: &T::Element,
        attributes: Option<&dyn AttributeResolver<T::Element>>,
        tree: &T,
        mode: MatchMode,
    ) -> bool {
        if let Some(name) = &self.name {
            if !tree.matches_element(element, name) {
                return false;
            }
        }
        self.conditions
            .iter()
            .all(|condition| condition.matches_with_mode(element, attributes, tree, mode))
    }

    fn specificity(&self) -> Specificity {
        let mut spec = Specificity(0, 0, u16::from(self.name.is_some()));
        for condition in &self.conditions {
            spec.add(condition.specificity());
        }
        spec
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexKey {
    Id(String),
    Class(String),
    Tag(String),
    Universal,
}

/// One selector alternative: compounds joined by combinators, left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub text: String,
    pub parts: Vec<CompoundSelector>,
    pub combinators: Vec<Combinator>,
    pub pseudo_element: Option<PseudoElement>,
    pub specificity: Specificity,
}

impl Selector {
    pub fn parse(text: &str) -> Result<Selector> {
        parse_selector(text)
    }

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
        match self.parts.len() {
            0 => false,
            len => self.match_from(len - 1, element, attributes, tree, mode),
        }
    }

    fn match_from<T: TreeResolver>(
        &self,
        index: usize,
        element: &T::Element,
        attributes: Option<&dyn AttributeResolver<T::Element>>,
        tree: &T,
        mode: MatchMode,
    ) -> bool {
        if !self.parts[index].matches(element, attributes, tree, mode) {
            return false;
        }
        if index == 0 {
            return true;
        }
        let next = index - 1;
        match self.combinators[next] {
            Combinator::Child => tree
                .parent_element(element)
                .is_some_and(|parent| self.match_from(next, &parent, attributes, tree, mode)),
            Combinator::Descendant => {
                let mut current = tree.parent_element(element);
                while let Some(ancestor) = current {
                    if self.match_from(next, &ancestor, attributes, tree, mode) {
                        return true;
                    }
                    current = tree.parent_element(&ancestor);
                }
                false
            }
            Combinator::AdjacentSibling => tree
                .previous_sibling_element(element)
                .is_some_and(|prev| self.match_from(next, &prev, attributes, tree, mode)),
            Combinator::GeneralSibling => {
                let mut current = tree.previous_sibling_element(element);
                while let Some(sibling) = current {
                    if self.match_from(next, &sibling, attributes, tree, mode) {
                        return true;
                    }
                    current = tree.previous_sibling_element(&sibling);
                }
                false
            }
        }
    }

    pub fn has_hover(&self) -> bool {
        self.parts
            .iter()
            .any(|part| part.conditions.iter().any(Condition::is_hover))
    }

    pub fn is_unsupported(&self) -> bool {
        self.parts.iter().any(|part| {
            part.conditions
                .iter()
                .any(|c| matches!(c, Condition::Unsupported(_)))
        })
    }

    /// Bucket used by the rule index: the most selective clause of the subject compound.
    pub fn index_key(&self) -> IndexKey {
        let Some(subject) = self.parts.last() else {
            return IndexKey::Universal;
        };
        for condition in &subject.conditions {
            if let Condition::Id(id) = condition {
                return IndexKey::Id(id.clone());
            }
        }
        for condition in &subject.conditions {
            if let Condition::Class(class) = condition {
                return IndexKey::Class(class.clone());
            }
        }
        match &subject.name {
            Some(name) => IndexKey::Tag(name.clone()),
            None => IndexKey::Universal,
        }
    }
}

/// Splits a selector list on top-level commas.
pub fn split_selector_list(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for ch in text.chars() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            current.push(ch);
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                if !current.trim().is_empty() {
                    out.push(current.trim().to_string());
                }
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    if !current.trim().is_empty() {
        out.push(current.trim().to_string());
    }
    out
}

fn parse_selector(text: &str) -> Result<Selector> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(StyleError::parse("empty selector"));
    }
    let mut parts = Vec::new();
    let mut combinators = Vec::new();
    let mut pseudo_element = None;
    let mut pending: Option<Combinator> = None;
    let mut buf = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    let mut flush = |buf: &mut String,
                     pending: &mut Option<Combinator>,
                     parts: &mut Vec<CompoundSelector>,
                     combinators: &mut Vec<Combinator>|
     -> Result<()> {
        let raw = buf.trim();
        if raw.is_empty() {
            buf.clear();
            return Ok(());
        }
        if pseudo_element.is_some() {
            return Err(StyleError::parse(format!(
                "pseudo-element must end the selector `{trimmed}`"
            )));
        }
        let (compound, pseudo) = parse_compound(raw)?;
        if !parts.is_empty() {
            combinators.push(pending.take().unwrap_or(Combinator::Descendant));
        }
        parts.push(compound);
        pseudo_element = pseudo;
        *pending = None;
        buf.clear();
        Ok(())
    };

    for ch in trimmed.chars() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            buf.push(ch);
            continue;
        }
        if depth == 0 {
            let combinator = match ch {
                '>' => Some(Combinator::Child),
                '+' => Some(Combinator::AdjacentSibling),
                '~' => Some(Combinator::GeneralSibling),
                _ => None,
            };
            if let Some(combinator) = combinator {
                flush(&mut buf, &mut pending, &mut parts, &mut combinators)?;
                if parts.is_empty() {
                    return Err(StyleError::parse(format!(
                        "selector starts with a combinator `{trimmed}`"
                    )));
                }
                pending = Some(combinator);
                continue;
            }
            if ch.is_whitespace() {
                if !buf.trim().is_empty() {
                    flush(&mut buf, &mut pending, &mut parts, &mut combinators)?;
                    pending = Some(Combinator::Descendant);
                }
                continue;
            }
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
        buf.push(ch);
    }
    flush(&mut buf, &mut pending, &mut parts, &mut combinators)?;

    if parts.is_empty() {
        return Err(StyleError::parse(format!("empty selector `{trimmed}`")));
    }
    if matches!(
        pending,
        Some(Combinator::Child | Combinator::AdjacentSibling | Combinator::GeneralSibling)
    ) {
        return Err(StyleError::parse(format!(
            "selector ends with a combinator `{trimmed}`"
        )));
    }

    let mut specificity = Specificity::default();
    for part in &parts {
        specificity.add(part.specificity().into_tuple());
    }
    if pseudo_element.is_some() {
        specificity.add((0, 0, 1));
    }
    Ok(Selector {
        text: trimmed.to_string(),
        parts,
        combinators,
        pseudo_element,
        specificity,
    })
}

struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> String {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '-' || ch == '_' || ch == '\\' || !ch.is_ascii() {
                self.pos += ch.len_utf8();
            } else {
                break;
            }
        }
        self.text[start..self.pos].replace('\\', "")
    }

    /// Reads up to the matching `close`, honoring nesting and quotes. The opener is consumed.
    fn balanced(&mut self, open: char, close: char) -> Result<String> {
        let start = self.pos;
        let mut depth = 1usize;
        let mut quote: Option<char> = None;
        while let Some(ch) = self.bump() {
            if let Some(q) = quote {
                if ch == q {
                    quote = None;
                }
                continue;
            }
            if ch == '"' || ch == '\'' {
                quote = Some(ch);
            } else if ch == open {
                depth += 1;
            } else if ch == close {
                depth -= 1;
                if depth == 0 {
                    return Ok(self.text[start..self.pos - close.len_utf8()].to_string());
                }
            }
        }
        Err(StyleError::parse(format!(
            "unterminated `{open}` in selector `{}`",
            self.text
        )))
    }
}

fn parse_compound(raw: &str) -> Result<(CompoundSelector, Option<PseudoElement>)> {
    let mut scanner = Scanner::new(raw);
    let mut name = None;
    let universal = scanner.eat('*');
    if !universal
        && scanner
            .peek()
            .is_some_and(|ch| ch.is_alphabetic() || ch == '_' || ch == '-' || ch == '\\')
    {
        name = Some(scanner.ident().to_ascii_lowercase());
    }
    if scanner.eat('|') {
        // `ns|name` or `*|name`: namespaces are not tracked for element names.
        if scanner.eat('*') {
            name = None;
        } else {
            name = Some(scanner.ident().to_ascii_lowercase());
        }
    }

    let mut conditions = Vec::new();
    let mut pseudo_element = None;
    while let Some(ch) = scanner.bump() {
        if pseudo_element.is_some() {
            return Err(StyleError::parse(format!(
                "pseudo-element must end the selector `{raw}`"
            )));
        }
        match ch {
            '.' => {
                let class = scanner.ident();
                if class.is_empty() {
                    return Err(StyleError::parse(format!("empty class in selector `{raw}`")));
                }
                conditions.push(Condition::Class(class));
            }
            '#' => {
                let id = scanner.ident();
                if id.is_empty() {
                    return Err(StyleError::parse(format!("empty id in selector `{raw}`")));
                }
                conditions.push(Condition::Id(id));
            }
            '[' => {
                let body = scanner.balanced('[', ']')?;
                conditions.push(parse_attribute(&body)?);
            }
            ':' => {
                let double = scanner.eat(':');
                let pseudo = scanner.ident().to_ascii_lowercase();
                let args = if scanner.eat('(') {
                    Some(scanner.balanced('(', ')')?)
                } else {
                    None
                };
                if pseudo.is_empty() {
                    return Err(StyleError::parse(format!("empty pseudo-class in `{raw}`")));
                }
                if double {
                    match PseudoElement::from_name(&pseudo) {
                        Some(element) => pseudo_element = Some(element),
                        None => {
                            log::debug!("unsupported pseudo-element ::{pseudo}");
                            conditions.push(Condition::Unsupported(format!("::{pseudo}")));
                        }
                    }
                    continue;
                }
                if args.is_none() {
                    if let Some(element) = PseudoElement::from_name(&pseudo) {
                        pseudo_element = Some(element);
                        continue;
                    }
                }
                conditions.push(parse_pseudo_class(&pseudo, args.as_deref())?);
            }
            other => {
                return Err(StyleError::parse(format!(
                    "unexpected `{other}` in selector `{raw}`"
                )));
            }
        }
    }
    Ok((CompoundSelector { name, conditions }, pseudo_element))
}

fn parse_pseudo_class(name: &str, args: Option<&str>) -> Result<Condition> {
    let condition = match (name, args) {
        ("first-child", None) => Condition::FirstChild,
        ("last-child", None) => Condition::LastChild,
        ("link", None) => Condition::Link,
        ("visited", None) => Condition::Dynamic(DynamicState::Visited),
        ("hover", None) => Condition::Dynamic(DynamicState::Hover),
        ("active", None) => Condition::Dynamic(DynamicState::Active),
        ("focus", None) => Condition::Dynamic(DynamicState::Focus),
        ("root", None) => Condition::Root,
        ("nth-child", Some(args)) => Condition::NthChild(NthChild::from_str(args)?),
        ("lang", Some(args)) => Condition::Lang(unquote(args.trim()).to_string()),
        ("not", Some(args)) => {
            let (inner, pseudo) = parse_compound(args.trim())?;
            if pseudo.is_some() {
                return Err(StyleError::parse(format!(
                    "pseudo-element inside :not({args})"
                )));
            }
            Condition::Not(inner.conditions, inner.name)
        }
        _ => {
            log::debug!("unsupported pseudo-class :{name}");
            let text = match args {
                Some(args) => format!(":{name}({args})"),
                None => format!(":{name}"),
            };
            Condition::Unsupported(text)
        }
    };
    Ok(condition)
}

fn parse_attribute(body: &str) -> Result<Condition> {
    let body = body.trim();
    let mut quote: Option<char> = None;
    let mut eq_at = None;
    for (idx, ch) in body.char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '=' => {
                eq_at = Some(idx);
                break;
            }
            _ => {}
        }
    }

    let Some(eq_at) = eq_at else {
        let (namespace, name) = split_namespace(body)?;
        return Ok(Condition::AttributeExists { namespace, name });
    };
    let (head, op) = match body[..eq_at].chars().last() {
        Some(op @ ('~' | '|' | '^' | '$' | '*')) => (&body[..eq_at - 1], Some(op)),
        _ => (&body[..eq_at], None),
    };
    let (namespace, name) = split_namespace(head)?;
    let mut value_raw = body[eq_at + 1..].trim();
    // Drop a trailing case-sensitivity flag (`[type=a i]`).
    if let Some((value, flag)) = value_raw.rsplit_once(char::is_whitespace) {
        if flag.eq_ignore_ascii_case("i") || flag.eq_ignore_ascii_case("s") {
            value_raw = value.trim();
        }
    }
    let value = unquote(value_raw).to_string();
    Ok(match op {
        None => Condition::AttributeEquals {
            namespace,
            name,
            value,
        },
        Some('~') => Condition::AttributeMatchesList {
            namespace,
            name,
            value,
        },
        Some('|') => Condition::AttributeMatchesFirstPart {
            namespace,
            name,
            value,
        },
        Some('^') => Condition::AttributePrefix {
            namespace,
            name,
            value,
        },
        Some('$') => Condition::AttributeSuffix {
            namespace,
            name,
            value,
        },
        _ => Condition::AttributeSubstring {
            namespace,
            name,
            value,
        },
    })
}

fn split_namespace(raw: &str) -> Result<(Option<String>, String)> {
    let raw = raw.trim();
    let (namespace, name) = match raw.split_once('|') {
        Some(("*", name)) | Some(("", name)) => (None, name),
        Some((ns, name)) => (Some(ns.to_string()), name),
        None => (None, raw),
    };
    if name.is_empty() {
        return Err(StyleError::parse(format!("empty attribute name `[{raw}]`")));
    }
    Ok((namespace, name.to_ascii_lowercase()))
}

fn unquote(raw: &str) -> &str {
    let raw = raw.trim();
    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Tiny tree: (name, parent, attributes) rows in document order.
    struct Tree {
        nodes: Vec<(&'static str, Option<usize>, HashMap<&'static str, &'static str>)>,
    }

    impl Tree {
        fn siblings(&self, element: usize) -> Vec<usize> {
            let parent = self.nodes[element].1;
            (0..self.nodes.len())
                .filter(|idx| self.nodes[*idx].1 == parent)
                .collect()
        }
    }

    impl TreeResolver for Tree {
        type Element = usize;

        fn parent_element(&self, element: &usize) -> Option<usize> {
            self.nodes[*element].1
        }
        fn previous_sibling_element(&self, element: &usize) -> Option<usize> {
            let siblings = self.siblings(*element);
            let pos = siblings.iter().position(|s| s == element)?;
            pos.checked_sub(1).map(|p| siblings[p])
        }
        fn element_name(&self, element: &usize) -> String {
            self.nodes[*element].0.to_string()
        }
        fn is_first_child_element(&self, element: &usize) -> bool {
            self.siblings(*element).first() == Some(element)
        }
        fn is_last_child_element(&self, element: &usize) -> bool {
            self.siblings(*element).last() == Some(element)
        }
        fn position_of_element(&self, element: &usize) -> usize {
            self.siblings(*element)
                .iter()
                .position(|s| s == element)
                .unwrap_or(0)
        }
    }

    impl AttributeResolver<usize> for Tree {
        fn attribute_value(&self, element: &usize, _ns: Option<&str>, name: &str) -> Option<String> {
            self.nodes[*element].2.get(name).map(|v| v.to_string())
        }
        fn class(&self, element: &usize) -> Option<String> {
            self.attribute_value(element, None, "class")
        }
        fn id(&self, element: &usize) -> Option<String> {
            self.attribute_value(element, None, "id")
        }
        fn lang(&self, _element: &usize) -> Option<String> {
            None
        }
        fn element_styling(&self, _element: &usize) -> Option<String> {
            None
        }
        fn is_link(&self, element: &usize) -> bool {
            self.attribute_value(element, None, "href").is_some()
        }
    }

    fn sample() -> Tree {
        let attrs = |pairs: &[(&'static str, &'static str)]| -> HashMap<&'static str, &'static str> {
            pairs.iter().copied().collect()
        };
        Tree {
            nodes: vec![
                ("html", None, attrs(&[])),
                ("body", Some(0), attrs(&[("class", "doc")])),
                ("div", Some(1), attrs(&[("id", "main"), ("class", "box wide")])),
                ("p", Some(2), attrs(&[])),
                ("p", Some(2), attrs(&[("class", "note")])),
                ("a", Some(4), attrs(&[("href", "#x")])),
            ],
        }
    }

    fn hits(selector: &str, tree: &Tree) -> Vec<usize> {
        let selector = Selector::parse(selector).expect("selector");
        (0..tree.nodes.len())
            .filter(|e| selector.matches(e, Some(tree as &dyn AttributeResolver<usize>), tree))
            .collect()
    }

    #[test]
    fn specificity_counts_ids_classes_types() {
        let spec = |text: &str| Selector::parse(text).expect("selector").specificity;
        assert_eq!(spec("p"), Specificity(0, 0, 1));
        assert_eq!(spec("div#main.box > p:first-child"), Specificity(1, 2, 2));
        assert_eq!(spec("*[href]"), Specificity(0, 1, 0));
        assert_eq!(spec("p::before"), Specificity(0, 0, 2));
        assert_eq!(spec("p:not(.note)"), Specificity(0, 1, 1));
    }

    #[test]
    fn combinators_walk_the_tree() {
        let tree = sample();
        assert_eq!(hits("body p", &tree), vec![3, 4]);
        assert_eq!(hits("body > p", &tree), Vec::<usize>::new());
        assert_eq!(hits("div > p + p", &tree), vec![4]);
        assert_eq!(hits("p ~ p", &tree), vec![4]);
        assert_eq!(hits(".doc .note a[href^='#']", &tree), vec![5]);
        assert_eq!(hits("#main p:last-child", &tree), vec![4]);
    }

    #[test]
    fn descendant_matching_backtracks() {
        let tree = sample();
        // `p a` binds the inner `p`, then `div` and `body` are found further up.
        assert_eq!(hits("body div p a", &tree), vec![5]);
        assert_eq!(hits("html > body .box a", &tree), vec![5]);
    }

    #[test]
    fn pseudo_elements_are_split_off() {
        let selector = Selector::parse("p.note:after").expect("selector");
        assert_eq!(selector.pseudo_element, Some(PseudoElement::After));
        let selector = Selector::parse("p::first-line").expect("selector");
        assert_eq!(selector.pseudo_element, Some(PseudoElement::FirstLine));
        assert!(Selector::parse("p::before span").is_err());
    }

    #[test]
    fn unknown_pseudo_classes_stay_inert() {
        let tree = sample();
        let selector = Selector::parse("p:checked").expect("selector");
        assert!(selector.is_unsupported());
        assert_eq!(hits("p:checked", &tree), Vec::<usize>::new());
    }

    #[test]
    fn malformed_selectors_are_parse_errors() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("> p").is_err());
        assert!(Selector::parse("p >").is_err());
        assert!(Selector::parse("li:nth-child(foo)").is_err());
        assert!(Selector::parse("a[href").is_err());
    }

    #[test]
    fn attribute_selectors_parse_operators() {
        let selector = Selector::parse("a[hreflang|=\"en\"][rel~=next][data-x]").expect("selector");
        let conditions = &selector.parts[0].conditions;
        assert!(matches!(&conditions[0], Condition::AttributeMatchesFirstPart { value, .. } if value == "en"));
        assert!(matches!(&conditions[1], Condition::AttributeMatchesList { name, .. } if name == "rel"));
        assert!(matches!(&conditions[2], Condition::AttributeExists { .. }));
    }

    #[test]
    fn hover_and_index_keys() {
        let selector = Selector::parse("ul li.item:hover").expect("selector");
        assert!(selector.has_hover());
        assert_eq!(selector.index_key(), IndexKey::Class("item".into()));
        assert_eq!(
            Selector::parse("#x.y").expect("selector").index_key(),
            IndexKey::Id("x".into())
        );
        assert_eq!(Selector::parse("*").expect("selector").index_key(), IndexKey::Universal);
    }

    #[test]
    fn selector_lists_split_at_top_level() {
        assert_eq!(
            split_selector_list("h1, a[title='x,y'], li:not(.a)"),
            vec!["h1", "a[title='x,y']", "li:not(.a)"]
        );
    }
}
