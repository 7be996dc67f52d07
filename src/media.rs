use crate::types::{Pt, Size};
use lightningcss::media_query::{
    MediaCondition, MediaFeature, MediaFeatureComparison, MediaFeatureId, MediaFeatureName,
    MediaFeatureValue, MediaList as CssMediaList, MediaQuery as CssMediaQuery, MediaType,
    Operator, Qualifier,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
}

impl From<MediaFeatureComparison> for Comparison {
    fn from(value: MediaFeatureComparison) -> Self {
        match value {
            MediaFeatureComparison::Equal => Comparison::Equal,
            MediaFeatureComparison::GreaterThan => Comparison::GreaterThan,
            MediaFeatureComparison::GreaterThanEqual => Comparison::GreaterThanEqual,
            MediaFeatureComparison::LessThan => Comparison::LessThan,
            MediaFeatureComparison::LessThanEqual => Comparison::LessThanEqual,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaExpr {
    Feature {
        axis: Axis,
        comparison: Comparison,
        value: Pt,
    },
    Not(Box<MediaExpr>),
    And(Vec<MediaExpr>),
    Or(Vec<MediaExpr>),
    /// A feature this engine does not evaluate. Never matches.
    Unknown(String),
}

impl MediaExpr {
    fn evaluate(&self, viewport: Option<Size>) -> bool {
        match self {
            MediaExpr::Feature {
                axis,
                comparison,
                value,
            } => {
                let Some(viewport) = viewport else {
                    return true;
                };
                let target = match axis {
                    Axis::Width => viewport.width,
                    Axis::Height => viewport.height,
                };
                match comparison {
                    Comparison::Equal => target == *value,
                    Comparison::GreaterThan => target > *value,
                    Comparison::GreaterThanEqual => target >= *value,
                    Comparison::LessThan => target < *value,
                    Comparison::LessThanEqual => target <= *value,
                }
            }
            MediaExpr::Not(inner) => !inner.evaluate(viewport),
            MediaExpr::And(items) => items.iter().all(|item| item.evaluate(viewport)),
            MediaExpr::Or(items) => items.iter().any(|item| item.evaluate(viewport)),
            MediaExpr::Unknown(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaQuery {
    pub negated: bool,
    /// Lowercase media type, `None` for `all`.
    pub media_type: Option<String>,
    pub condition: Option<MediaExpr>,
}

impl MediaQuery {
    pub fn for_type(media_type: &str) -> Self {
        let media_type = media_type.trim().to_ascii_lowercase();
        Self {
            negated: false,
            media_type: (media_type != "all" && !media_type.is_empty()).then_some(media_type),
            condition: None,
        }
    }

    pub fn matches(&self, medium: &str, viewport: Option<Size>) -> bool {
        let type_matches = self
            .media_type
            .as_deref()
            .is_none_or(|media_type| media_type.eq_ignore_ascii_case(medium));
        let result = type_matches
            && self
                .condition
                .as_ref()
                .is_none_or(|condition| condition.evaluate(viewport));
        result != self.negated
    }
}

/// Media query list attached to a stylesheet, `@media` or `@import`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MediaList {
    pub queries: Vec<MediaQuery>,
}

impl MediaList {
    pub fn all() -> Self {
        Self::default()
    }

    /// Parses a comma separated list of media types as found in a `media` attribute.
    pub fn from_types(text: &str) -> Self {
        let queries = text
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| {
                let mut words = item.split_whitespace();
                let first = words.next().unwrap_or("all").to_ascii_lowercase();
                match first.as_str() {
                    "not" => MediaQuery {
                        negated: true,
                        ..MediaQuery::for_type(words.next().unwrap_or("all"))
                    },
                    "only" => MediaQuery::for_type(words.next().unwrap_or("all")),
                    _ => MediaQuery::for_type(&first),
                }
            })
            .collect();
        Self { queries }
    }

    pub fn from_css(list: &CssMediaList) -> Self {
        Self {
            queries: list.media_queries.iter().map(convert_query).collect(),
        }
    }

    pub fn is_all(&self) -> bool {
        self.queries.is_empty()
    }

    /// An empty list applies to every medium.
    pub fn matches(&self, medium: &str, viewport: Option<Size>) -> bool {
        self.queries.is_empty()
            || self
                .queries
                .iter()
                .any(|query| query.matches(medium, viewport))
    }
}

fn convert_query(query: &CssMediaQuery) -> MediaQuery {
    let media_type = match &query.media_type {
        MediaType::All => None,
        MediaType::Print => Some("print".to_string()),
        MediaType::Screen => Some("screen".to_string()),
        MediaType::Custom(name) => Some(name.to_ascii_lowercase()),
    };
    MediaQuery {
        negated: matches!(query.qualifier, Some(Qualifier::Not)),
        media_type,
        condition: query.condition.as_ref().map(convert_condition),
    }
}

fn convert_condition(condition: &MediaCondition) -> MediaExpr {
    match condition {
        MediaCondition::Feature(feature) => convert_feature(feature),
        MediaCondition::Not(inner) => MediaExpr::Not(Box::new(convert_condition(inner))),
        MediaCondition::Operation {
            operator,
            conditions,
        } => {
            let items = conditions.iter().map(convert_condition).collect();
            match operator {
                Operator::And => MediaExpr::And(items),
                Operator::Or => MediaExpr::Or(items),
            }
        }
        MediaCondition::Unknown(_) => MediaExpr::Unknown("unparsed condition".to_string()),
    }
}

fn convert_feature(feature: &MediaFeature) -> MediaExpr {
    match feature {
        MediaFeature::Plain { name, value } => {
            feature_expr(name, MediaFeatureComparison::Equal, value)
        }
        MediaFeature::Range {
            name,
            operator,
            value,
        } => feature_expr(name, *operator, value),
        MediaFeature::Interval {
            name,
            start,
            start_operator,
            end,
            end_operator,
        } => MediaExpr::And(vec![
            // `400px < width` reads right to left for the start bound.
            feature_expr(name, flip(*start_operator), start),
            feature_expr(name, *end_operator, end),
        ]),
        MediaFeature::Boolean { .. } => MediaExpr::Unknown("boolean feature".to_string()),
    }
}

fn flip(operator: MediaFeatureComparison) -> MediaFeatureComparison {
    match operator {
        MediaFeatureComparison::GreaterThan => MediaFeatureComparison::LessThan,
        MediaFeatureComparison::GreaterThanEqual => MediaFeatureComparison::LessThanEqual,
        MediaFeatureComparison::LessThan => MediaFeatureComparison::GreaterThan,
        MediaFeatureComparison::LessThanEqual => MediaFeatureComparison::GreaterThanEqual,
        MediaFeatureComparison::Equal => MediaFeatureComparison::Equal,
    }
}

fn feature_expr(
    name: &MediaFeatureName<MediaFeatureId>,
    operator: MediaFeatureComparison,
    value: &MediaFeatureValue,
) -> MediaExpr {
    let axis = match name {
        MediaFeatureName::Standard(MediaFeatureId::Width | MediaFeatureId::DeviceWidth) => {
            Axis::Width
        }
        MediaFeatureName::Standard(MediaFeatureId::Height | MediaFeatureId::DeviceHeight) => {
            Axis::Height
        }
        _ => return MediaExpr::Unknown("unsupported feature".to_string()),
    };
    let px = match value {
        MediaFeatureValue::Length(length) => length.to_px(),
        _ => None,
    };
    match px {
        Some(px) => MediaExpr::Feature {
            axis,
            comparison: operator.into(),
            value: Pt::from_px(px),
        },
        None => MediaExpr::Unknown("non-length value".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightningcss::rules::CssRule;
    use lightningcss::stylesheet::{ParserOptions, StyleSheet};

    fn first_media_list(css: &str) -> MediaList {
        let sheet = StyleSheet::parse(css, ParserOptions::default()).expect("parse css");
        for rule in &sheet.rules.0 {
            if let CssRule::Media(media) = rule {
                return MediaList::from_css(&media.query);
            }
        }
        panic!("no @media rule in {css}");
    }

    #[test]
    fn media_types_filter_by_medium() {
        let list = first_media_list("@media print { p { color: red } }");
        assert!(list.matches("print", None));
        assert!(!list.matches("screen", None));
        let negated = first_media_list("@media not print { p { color: red } }");
        assert!(!negated.matches("print", None));
        assert!(negated.matches("screen", None));
    }

    #[test]
    fn width_features_use_viewport_when_present() {
        let list = first_media_list("@media (min-width: 600px) { p { color: red } }");
        let wide = Size {
            width: Pt::from_px(800.0),
            height: Pt::from_px(600.0),
        };
        let narrow = Size {
            width: Pt::from_px(400.0),
            height: Pt::from_px(600.0),
        };
        assert!(list.matches("print", Some(wide)));
        assert!(!list.matches("print", Some(narrow)));
        assert!(list.matches("print", None));
    }

    #[test]
    fn unknown_features_never_match() {
        let list = first_media_list("@media (color) { p { color: red } }");
        assert!(!list.matches("print", None));
    }

    #[test]
    fn attribute_type_lists() {
        assert!(MediaList::from_types("").matches("print", None));
        assert!(MediaList::from_types("screen, print").matches("print", None));
        assert!(!MediaList::from_types("screen").matches("print", None));
        assert!(MediaList::from_types("all").matches("print", None));
        assert!(MediaList::from_types("only print").matches("print", None));
    }
}
