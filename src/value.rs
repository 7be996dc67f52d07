use crate::property::PropertyName;
use crate::types::{CmykColor, Color, PaintColor, Pt};
use cssparser::{ParseError, Parser, ParserInput, Token};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValueOptions {
    pub cmyk_colors: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Unit {
    Number,
    Percent,
    Px,
    Pt,
    Pc,
    In,
    Cm,
    Mm,
    Em,
    Ex,
    Rem,
    Other(String),
}

impl Unit {
    fn from_css(unit: &str) -> Unit {
        match unit.to_ascii_lowercase().as_str() {
            "px" => Unit::Px,
            "pt" => Unit::Pt,
            "pc" => Unit::Pc,
            "in" => Unit::In,
            "cm" => Unit::Cm,
            "mm" => Unit::Mm,
            "em" => Unit::Em,
            "ex" => Unit::Ex,
            "rem" => Unit::Rem,
            other => Unit::Other(other.to_string()),
        }
    }

    fn suffix(&self) -> &str {
        match self {
            Unit::Number => "",
            Unit::Percent => "%",
            Unit::Px => "px",
            Unit::Pt => "pt",
            Unit::Pc => "pc",
            Unit::In => "in",
            Unit::Cm => "cm",
            Unit::Mm => "mm",
            Unit::Em => "em",
            Unit::Ex => "ex",
            Unit::Rem => "rem",
            Unit::Other(unit) => unit,
        }
    }

    pub fn is_font_relative(&self) -> bool {
        matches!(self, Unit::Em | Unit::Ex | Unit::Rem)
    }

    /// Converts to points. Percentages, bare numbers and unknown units need more context.
    pub fn to_pt(&self, value: f32, font_size: Pt, root_font_size: Pt) -> Option<Pt> {
        let pt = match self {
            Unit::Pt => value,
            Unit::Px => value * 0.75,
            Unit::Pc => value * 12.0,
            Unit::In => value * 72.0,
            Unit::Cm => value * 72.0 / 2.54,
            Unit::Mm => value * 72.0 / 25.4,
            Unit::Em => value * font_size.to_f32(),
            Unit::Ex => value * font_size.to_f32() * 0.5,
            Unit::Rem => value * root_font_size.to_f32(),
            Unit::Number | Unit::Percent | Unit::Other(_) => return None,
        };
        Some(Pt::from_f32(pt))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    Space,
    Comma,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionValue {
    pub name: String,
    pub params: Vec<PropertyValue>,
}

impl FunctionValue {
    pub fn new(name: impl Into<String>, params: Vec<PropertyValue>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            params,
        }
    }

    pub fn param_ident(&self, index: usize) -> Option<&str> {
        self.params.get(index).and_then(PropertyValue::as_ident)
    }
}

/// A parsed property value. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Ident(String),
    Length { value: f32, unit: Unit },
    String(String),
    Color(PaintColor),
    Uri(String),
    Function(FunctionValue),
    List {
        separator: Separator,
        items: Vec<PropertyValue>,
    },
}

impl PropertyValue {
    pub fn ident(value: &str) -> Self {
        PropertyValue::Ident(value.to_ascii_lowercase())
    }

    pub fn px(value: f32) -> Self {
        PropertyValue::Length {
            value,
            unit: Unit::Px,
        }
    }

    pub fn number(value: f32) -> Self {
        PropertyValue::Length {
            value,
            unit: Unit::Number,
        }
    }

    pub fn as_ident(&self) -> Option<&str> {
        match self {
            PropertyValue::Ident(ident) => Some(ident),
            _ => None,
        }
    }

    pub fn is_ident(&self, ident: &str) -> bool {
        self.as_ident()
            .is_some_and(|value| value.eq_ignore_ascii_case(ident))
    }

    pub fn is_inherit(&self) -> bool {
        self.is_ident("inherit")
    }

    pub fn is_initial(&self) -> bool {
        self.is_ident("initial")
    }

    pub fn as_length(&self) -> Option<(f32, &Unit)> {
        match self {
            PropertyValue::Length { value, unit } => Some((*value, unit)),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f32> {
        match self {
            PropertyValue::Length {
                value,
                unit: Unit::Number,
            } => Some(*value),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            PropertyValue::String(value) | PropertyValue::Uri(value) => Some(value),
            PropertyValue::Ident(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionValue> {
        match self {
            PropertyValue::Function(function) => Some(function),
            _ => None,
        }
    }

    /// The value itself for scalars, the members for lists.
    pub fn items(&self) -> &[PropertyValue] {
        match self {
            PropertyValue::List { items, .. } => items,
            other => std::slice::from_ref(other),
        }
    }

    pub fn contains_function(&self) -> bool {
        match self {
            PropertyValue::Function(_) => true,
            PropertyValue::List { items, .. } => items.iter().any(PropertyValue::contains_function),
            _ => false,
        }
    }

    pub fn contains_function_named(&self, name: &str) -> bool {
        match self {
            PropertyValue::Function(function) => {
                function.name.eq_ignore_ascii_case(name)
                    || function
                        .params
                        .iter()
                        .any(|param| param.contains_function_named(name))
            }
            PropertyValue::List { items, .. } => {
                items.iter().any(|item| item.contains_function_named(name))
            }
            _ => false,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Ident(ident) => f.write_str(ident),
            PropertyValue::Length { value, unit } => write!(f, "{}{}", value, unit.suffix()),
            PropertyValue::String(value) => write!(f, "\"{}\"", value.replace('"', "\\\"")),
            PropertyValue::Color(PaintColor::Rgb(color)) => write!(
                f,
                "rgba({},{},{},{})",
                (color.r * 255.0).round(),
                (color.g * 255.0).round(),
                (color.b * 255.0).round(),
                color.a
            ),
            PropertyValue::Color(PaintColor::Cmyk(color)) => {
                write!(f, "cmyk({},{},{},{})", color.c, color.m, color.y, color.k)
            }
            PropertyValue::Uri(uri) => write!(f, "url(\"{}\")", uri),
            PropertyValue::Function(function) => {
                write!(f, "{}(", function.name)?;
                for (idx, param) in function.params.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{param}")?;
                }
                f.write_str(")")
            }
            PropertyValue::List { separator, items } => {
                let joiner = match separator {
                    Separator::Space => " ",
                    Separator::Comma => ", ",
                };
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(joiner)?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

/// Builds the value model from serialized CSS value text. Never fails: tokens the model has
/// no variant for are kept as identifiers holding their source text.
pub fn parse_value(text: &str, options: ValueOptions) -> PropertyValue {
    parse_value_cased(text, options, false)
}

/// Like [`parse_value`], but keeps identifier case for properties whose identifiers are names
/// (`font-family`, `src`).
pub fn parse_value_for(property: PropertyName, text: &str, options: ValueOptions) -> PropertyValue {
    let preserve_case = matches!(property, PropertyName::FontFamily | PropertyName::Src);
    parse_value_cased(text, options, preserve_case)
}

fn parse_value_cased(text: &str, options: ValueOptions, preserve_case: bool) -> PropertyValue {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let groups = parse_comma_groups(&mut parser, options, preserve_case);
    let value = collapse_groups(groups);
    value.unwrap_or_else(|| {
        let text = text.trim();
        PropertyValue::Ident(if preserve_case {
            text.to_string()
        } else {
            text.to_ascii_lowercase()
        })
    })
}

fn collapse_groups(groups: Vec<Vec<PropertyValue>>) -> Option<PropertyValue> {
    let mut collapsed: Vec<PropertyValue> = groups
        .into_iter()
        .filter(|group| !group.is_empty())
        .map(|mut group| {
            if group.len() == 1 {
                group.remove(0)
            } else {
                PropertyValue::List {
                    separator: Separator::Space,
                    items: group,
                }
            }
        })
        .collect();
    match collapsed.len() {
        0 => None,
        1 => Some(collapsed.remove(0)),
        _ => Some(PropertyValue::List {
            separator: Separator::Comma,
            items: collapsed,
        }),
    }
}

fn parse_comma_groups<'i>(
    parser: &mut Parser<'i, '_>,
    options: ValueOptions,
    preserve_case: bool,
) -> Vec<Vec<PropertyValue>> {
    let mut groups: Vec<Vec<PropertyValue>> = vec![Vec::new()];
    loop {
        let start = parser.position();
        let token = match parser.next() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        let value = match token {
            Token::Comma => {
                groups.push(Vec::new());
                continue;
            }
            Token::Ident(ident) if preserve_case && !is_wide_keyword(&ident) => {
                PropertyValue::Ident(ident.to_string())
            }
            Token::Ident(ident) => PropertyValue::ident(&ident),
            Token::QuotedString(value) => PropertyValue::String(value.to_string()),
            Token::Number { value, .. } => PropertyValue::number(value),
            Token::Percentage { unit_value, .. } => PropertyValue::Length {
                value: unit_value * 100.0,
                unit: Unit::Percent,
            },
            Token::Dimension { value, unit, .. } => PropertyValue::Length {
                value,
                unit: Unit::from_css(&unit),
            },
            Token::Hash(hash) | Token::IDHash(hash) => match parse_color(&format!("#{hash}")) {
                Some(color) => PropertyValue::Color(color),
                None => PropertyValue::Ident(format!("#{}", hash.to_ascii_lowercase())),
            },
            Token::UnquotedUrl(url) => PropertyValue::Uri(url.to_string()),
            Token::Function(name) => {
                let name = name.to_ascii_lowercase();
                let params = parser
                    .parse_nested_block(|nested| {
                        Ok::<_, ParseError<'i, ()>>(parse_comma_groups(nested, options, preserve_case))
                    })
                    .unwrap_or_default();
                let raw = parser.slice_from(start).to_string();
                function_value(name, params, &raw, options)
            }
            Token::Delim(ch) => PropertyValue::Ident(ch.to_string()),
            _ => PropertyValue::Ident(parser.slice_from(start).trim().to_ascii_lowercase()),
        };
        if let Some(group) = groups.last_mut() {
            group.push(value);
        }
    }
    groups
}

fn function_value(
    name: String,
    params: Vec<Vec<PropertyValue>>,
    raw: &str,
    options: ValueOptions,
) -> PropertyValue {
    match name.as_str() {
        "url" => {
            if let Some(PropertyValue::String(uri)) = params.first().and_then(|g| g.first()) {
                return PropertyValue::Uri(uri.clone());
            }
        }
        "rgb" | "rgba" | "hsl" | "hsla" | "hwb" => {
            if let Some(color) = parse_color(raw) {
                return PropertyValue::Color(color);
            }
        }
        "cmyk" if options.cmyk_colors => {
            if let Some(color) = cmyk_from_params(&params) {
                return PropertyValue::Color(PaintColor::Cmyk(color));
            }
        }
        _ => {}
    }
    let params = params
        .into_iter()
        .filter_map(|group| collapse_groups(vec![group]))
        .collect();
    PropertyValue::Function(FunctionValue::new(name, params))
}

fn is_wide_keyword(ident: &str) -> bool {
    ["inherit", "initial"]
        .iter()
        .any(|keyword| ident.eq_ignore_ascii_case(keyword))
}

fn cmyk_from_params(params: &[Vec<PropertyValue>]) -> Option<CmykColor> {
    let mut components = Vec::with_capacity(4);
    for group in params {
        let [value] = group.as_slice() else {
            return None;
        };
        let component = match value {
            PropertyValue::Length {
                value,
                unit: Unit::Number,
            } => *value,
            PropertyValue::Length {
                value,
                unit: Unit::Percent,
            } => *value / 100.0,
            _ => return None,
        };
        if !(0.0..=1.0).contains(&component) {
            return None;
        }
        components.push(component);
    }
    match components.as_slice() {
        [c, m, y, k] => Some(CmykColor {
            c: *c,
            m: *m,
            y: *y,
            k: *k,
        }),
        _ => None,
    }
}

/// Parses hex, functional and named colors.
pub fn parse_color(text: &str) -> Option<PaintColor> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("transparent") {
        return Some(PaintColor::Rgb(Color::TRANSPARENT));
    }
    let parsed = csscolorparser::parse(trimmed).ok()?;
    let [r, g, b, a] = parsed.to_rgba8();
    Some(PaintColor::Rgb(Color::rgba8(r, g, b, a)))
}
