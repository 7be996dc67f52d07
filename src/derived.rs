//! Aggregates computed from a calculated style on first use and cached on it.

use crate::calculated::{StyleArena, StyleId};
use crate::error::Result;
use crate::property::PropertyName;
use crate::types::{Color, PaintColor, Pt, Size};
use crate::value::{parse_color, PropertyValue, Separator, Unit};
use std::cell::OnceCell;

/// A used length before layout supplies the percentage base.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Pt(Pt),
    Percent(f32),
    Auto,
}

impl Length {
    pub fn resolve(self, base: Pt) -> Option<Pt> {
        match self {
            Length::Pt(pt) => Some(pt),
            Length::Percent(percent) => Some(base * (percent / 100.0)),
            Length::Auto => None,
        }
    }

    pub fn is_auto(self) -> bool {
        matches!(self, Length::Auto)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edges<T> {
    pub top: T,
    pub right: T,
    pub bottom: T,
    pub left: T,
}

impl<T: Copy> Edges<T> {
    pub fn uniform(value: T) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderStyle {
    None,
    Hidden,
    Dotted,
    Dashed,
    Solid,
    Double,
    Groove,
    Ridge,
    Inset,
    Outset,
}

impl BorderStyle {
    fn from_ident(ident: &str) -> BorderStyle {
        match ident {
            "hidden" => BorderStyle::Hidden,
            "dotted" => BorderStyle::Dotted,
            "dashed" => BorderStyle::Dashed,
            "solid" => BorderStyle::Solid,
            "double" => BorderStyle::Double,
            "groove" => BorderStyle::Groove,
            "ridge" => BorderStyle::Ridge,
            "inset" => BorderStyle::Inset,
            "outset" => BorderStyle::Outset,
            _ => BorderStyle::None,
        }
    }

    pub fn is_visible(self) -> bool {
        !matches!(self, BorderStyle::None | BorderStyle::Hidden)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderSide {
    pub width: Pt,
    pub style: BorderStyle,
    pub color: PaintColor,
}

impl BorderSide {
    pub fn none() -> Self {
        Self {
            width: Pt::ZERO,
            style: BorderStyle::None,
            color: PaintColor::Rgb(Color::TRANSPARENT),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner {
    pub horizontal: Length,
    pub vertical: Length,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Radii {
    pub top_left: Corner,
    pub top_right: Corner,
    pub bottom_right: Corner,
    pub bottom_left: Corner,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundSize {
    Cover,
    Contain,
    Explicit { width: Length, height: Length },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub families: Vec<String>,
    pub size: Pt,
    pub weight: u16,
    pub italic: bool,
    pub small_caps: bool,
}

#[derive(Default)]
pub(crate) struct DerivedCache {
    margin: OnceCell<Edges<Length>>,
    padding: OnceCell<Edges<Length>>,
    border: OnceCell<Edges<BorderSide>>,
    radii: OnceCell<Radii>,
    font: OnceCell<FontSpec>,
    line_height: OnceCell<Pt>,
    background_size: OnceCell<BackgroundSize>,
}

fn cached<T>(cell: &OnceCell<T>, compute: impl FnOnce() -> Result<T>) -> Result<&T> {
    if let Some(value) = cell.get() {
        return Ok(value);
    }
    let value = compute()?;
    Ok(cell.get_or_init(|| value))
}

fn length_of(value: &PropertyValue, font_size: Pt) -> Length {
    if value.is_ident("auto") || value.is_ident("none") {
        return Length::Auto;
    }
    match value.as_length() {
        Some((percent, Unit::Percent)) => Length::Percent(percent),
        Some((number, Unit::Number)) if number == 0.0 => Length::Pt(Pt::ZERO),
        Some((amount, unit)) => unit
            .to_pt(amount, font_size, font_size)
            .map(Length::Pt)
            .unwrap_or(Length::Auto),
        None => Length::Auto,
    }
}

const MARGIN: [PropertyName; 4] = [
    PropertyName::MarginTop,
    PropertyName::MarginRight,
    PropertyName::MarginBottom,
    PropertyName::MarginLeft,
];
const PADDING: [PropertyName; 4] = [
    PropertyName::PaddingTop,
    PropertyName::PaddingRight,
    PropertyName::PaddingBottom,
    PropertyName::PaddingLeft,
];
/// (width, style, color) per side, top first.
const BORDER: [[PropertyName; 3]; 4] = [
    [
        PropertyName::BorderTopWidth,
        PropertyName::BorderTopStyle,
        PropertyName::BorderTopColor,
    ],
    [
        PropertyName::BorderRightWidth,
        PropertyName::BorderRightStyle,
        PropertyName::BorderRightColor,
    ],
    [
        PropertyName::BorderBottomWidth,
        PropertyName::BorderBottomStyle,
        PropertyName::BorderBottomColor,
    ],
    [
        PropertyName::BorderLeftWidth,
        PropertyName::BorderLeftStyle,
        PropertyName::BorderLeftColor,
    ],
];

impl StyleArena {
    pub fn ident(&self, id: StyleId, property: PropertyName) -> Result<Option<&str>> {
        Ok(self.value(id, property)?.as_ident())
    }

    /// Numbers as-is, absolute lengths in points.
    pub fn as_float(&self, id: StyleId, property: PropertyName) -> Result<Option<f32>> {
        let value = self.value(id, property)?;
        if let Some(number) = value.as_number() {
            return Ok(Some(number));
        }
        Ok(match value.as_length() {
            Some((amount, unit)) => {
                let font_size = self.font_size(id)?;
                unit.to_pt(amount, font_size, font_size).map(Pt::to_f32)
            }
            None => None,
        })
    }

    pub fn length(&self, id: StyleId, property: PropertyName) -> Result<Length> {
        let font_size = self.font_size(id)?;
        Ok(length_of(self.value(id, property)?, font_size))
    }

    /// Color value of `property`; `currentcolor` resolves through `color`.
    pub fn as_color(&self, id: StyleId, property: PropertyName) -> Result<PaintColor> {
        let value = self.value(id, property)?;
        if let PropertyValue::Color(color) = value {
            return Ok(*color);
        }
        if value.is_ident("currentcolor") {
            if property == PropertyName::Color {
                return match self.parent(id) {
                    Some(parent) => self.as_color(parent, PropertyName::Color),
                    None => Ok(PaintColor::Rgb(Color::BLACK)),
                };
            }
            return self.as_color(id, PropertyName::Color);
        }
        if let Some(color) = value.as_ident().and_then(parse_color) {
            return Ok(color);
        }
        log::debug!("unusable {property} value `{value}`");
        Ok(if property == PropertyName::Color {
            PaintColor::Rgb(Color::BLACK)
        } else {
            PaintColor::Rgb(Color::TRANSPARENT)
        })
    }

    pub fn color(&self, id: StyleId) -> Result<PaintColor> {
        self.as_color(id, PropertyName::Color)
    }

    pub fn display(&self, id: StyleId) -> Result<&str> {
        Ok(self.ident(id, PropertyName::Display)?.unwrap_or("inline"))
    }

    /// Row-level table boxes carry no margins or borders.
    pub fn is_table_internal(&self, id: StyleId) -> Result<bool> {
        Ok(matches!(
            self.display(id)?,
            "table-row" | "table-row-group" | "table-header-group" | "table-footer-group"
        ))
    }

    fn collapses_borders(&self, id: StyleId) -> Result<bool> {
        Ok(self.ident(id, PropertyName::BorderCollapse)? == Some("collapse"))
    }

    fn edges(&self, id: StyleId, properties: [PropertyName; 4]) -> Result<Edges<Length>> {
        let font_size = self.font_size(id)?;
        let [top, right, bottom, left] = properties;
        Ok(Edges {
            top: length_of(self.value(id, top)?, font_size),
            right: length_of(self.value(id, right)?, font_size),
            bottom: length_of(self.value(id, bottom)?, font_size),
            left: length_of(self.value(id, left)?, font_size),
        })
    }

    pub fn margin_rect(&self, id: StyleId) -> Result<Edges<Length>> {
        cached(&self.get(id).derived.margin, || {
            if self.is_table_internal(id)? {
                return Ok(Edges::uniform(Length::Pt(Pt::ZERO)));
            }
            self.edges(id, MARGIN)
        })
        .copied()
    }

    pub fn padding_rect(&self, id: StyleId) -> Result<Edges<Length>> {
        cached(&self.get(id).derived.padding, || {
            if self.is_table_internal(id)? && self.collapses_borders(id)? {
                return Ok(Edges::uniform(Length::Pt(Pt::ZERO)));
            }
            self.edges(id, PADDING)
        })
        .copied()
    }

    pub fn border(&self, id: StyleId) -> Result<Edges<BorderSide>> {
        cached(&self.get(id).derived.border, || {
            if self.is_table_internal(id)? {
                return Ok(Edges::uniform(BorderSide::none()));
            }
            let [top, right, bottom, left] = BORDER;
            Ok(Edges {
                top: self.border_side(id, top)?,
                right: self.border_side(id, right)?,
                bottom: self.border_side(id, bottom)?,
                left: self.border_side(id, left)?,
            })
        })
        .copied()
    }

    fn border_side(&self, id: StyleId, [width, style, color]: [PropertyName; 3]) -> Result<BorderSide> {
        let style = BorderStyle::from_ident(self.ident(id, style)?.unwrap_or("none"));
        if !style.is_visible() {
            return Ok(BorderSide {
                style,
                ..BorderSide::none()
            });
        }
        let value = self.value(id, width)?;
        let width = match value.as_ident() {
            Some("thin") => Pt::from_px(1.0),
            Some("thick") => Pt::from_px(5.0),
            Some(_) => Pt::from_px(3.0),
            None => self
                .length(id, width)?
                .resolve(Pt::ZERO)
                .unwrap_or(Pt::ZERO),
        };
        Ok(BorderSide {
            width,
            style,
            color: self.as_color(id, color)?,
        })
    }

    pub fn border_radii(&self, id: StyleId) -> Result<Radii> {
        cached(&self.get(id).derived.radii, || {
            Ok(Radii {
                top_left: self.corner(id, PropertyName::BorderTopLeftRadius)?,
                top_right: self.corner(id, PropertyName::BorderTopRightRadius)?,
                bottom_right: self.corner(id, PropertyName::BorderBottomRightRadius)?,
                bottom_left: self.corner(id, PropertyName::BorderBottomLeftRadius)?,
            })
        })
        .copied()
    }

    fn corner(&self, id: StyleId, property: PropertyName) -> Result<Corner> {
        let font_size = self.font_size(id)?;
        let value = self.value(id, property)?;
        let items = value.items();
        let horizontal = items
            .first()
            .map(|item| length_of(item, font_size))
            .unwrap_or(Length::Pt(Pt::ZERO));
        let vertical = items
            .get(1)
            .map(|item| length_of(item, font_size))
            .unwrap_or(horizontal);
        Ok(Corner {
            horizontal,
            vertical,
        })
    }

    pub fn font(&self, id: StyleId) -> Result<&FontSpec> {
        cached(&self.get(id).derived.font, || {
            let families = self
                .value(id, PropertyName::FontFamily)?
                .items()
                .iter()
                .filter_map(|item| match item {
                    PropertyValue::List { .. } => Some(item.to_string()),
                    other => other.as_string().map(str::to_string),
                })
                .collect();
            Ok(FontSpec {
                families,
                size: self.font_size(id)?,
                weight: self.font_weight(id)?,
                italic: matches!(
                    self.ident(id, PropertyName::FontStyle)?,
                    Some("italic" | "oblique")
                ),
                small_caps: self.ident(id, PropertyName::FontVariant)? == Some("small-caps"),
            })
        })
    }

    pub fn line_height(&self, id: StyleId) -> Result<Pt> {
        cached(&self.get(id).derived.line_height, || {
            let font_size = self.font_size(id)?;
            let value = self.value(id, PropertyName::LineHeight)?;
            if let Some(number) = value.as_number() {
                return Ok(font_size * number);
            }
            Ok(match length_of(value, font_size) {
                Length::Pt(pt) => pt,
                Length::Percent(percent) => font_size * (percent / 100.0),
                Length::Auto => font_size * 1.2,
            })
        })
        .copied()
    }

    pub fn background_size(&self, id: StyleId) -> Result<BackgroundSize> {
        cached(&self.get(id).derived.background_size, || {
            let value = self.value(id, PropertyName::BackgroundSize)?;
            // Only the first layer of a comma list is modelled.
            let first = match value {
                PropertyValue::List {
                    separator: Separator::Comma,
                    items,
                } => items.first().unwrap_or(value),
                other => other,
            };
            if first.is_ident("cover") {
                return Ok(BackgroundSize::Cover);
            }
            if first.is_ident("contain") {
                return Ok(BackgroundSize::Contain);
            }
            let font_size = self.font_size(id)?;
            let items = first.items();
            let width = items
                .first()
                .map(|item| length_of(item, font_size))
                .unwrap_or(Length::Auto);
            let height = items
                .get(1)
                .map(|item| length_of(item, font_size))
                .unwrap_or(Length::Auto);
            Ok(BackgroundSize::Explicit { width, height })
        })
        .copied()
    }

    /// Page box size from `size`, or `None` for `auto`.
    pub fn page_size(&self, id: StyleId) -> Result<Option<Size>> {
        let value = self.value(id, PropertyName::Size)?;
        let mut orientation = None;
        let mut parts = Vec::new();
        for item in value.items() {
            match item.as_ident() {
                Some(keyword @ ("landscape" | "portrait")) => orientation = Some(keyword),
                _ => parts.push(item),
            }
        }
        let size = match parts.as_slice() {
            [] => orientation.map(|_| Size::a4()),
            [single] => match single.as_ident() {
                Some("auto") => None,
                Some(name) => named_page_size(name),
                None => {
                    let side = self.page_length(id, single)?;
                    side.map(|side| Size {
                        width: side,
                        height: side,
                    })
                }
            },
            [width, height] => match (self.page_length(id, width)?, self.page_length(id, height)?) {
                (Some(width), Some(height)) => Some(Size { width, height }),
                _ => None,
            },
            _ => None,
        };
        Ok(size.map(|size| match orientation {
            Some(orientation) => orient(size, orientation),
            None => size,
        }))
    }

    fn page_length(&self, id: StyleId, value: &PropertyValue) -> Result<Option<Pt>> {
        let font_size = self.font_size(id)?;
        Ok(match length_of(value, font_size) {
            Length::Pt(pt) => Some(pt),
            _ => None,
        })
    }
}

fn mm(value: f32) -> Pt {
    Pt::from_f32(value * 72.0 / 25.4)
}

fn inches(value: f32) -> Pt {
    Pt::from_f32(value * 72.0)
}

fn named_page_size(name: &str) -> Option<Size> {
    let (width, height) = match name {
        "a5" => (mm(148.0), mm(210.0)),
        "a4" => (mm(210.0), mm(297.0)),
        "a3" => (mm(297.0), mm(420.0)),
        "b5" => (mm(176.0), mm(250.0)),
        "b4" => (mm(250.0), mm(353.0)),
        "letter" => (inches(8.5), inches(11.0)),
        "legal" => (inches(8.5), inches(14.0)),
        "ledger" => (inches(11.0), inches(17.0)),
        _ => return None,
    };
    Some(Size { width, height })
}

fn orient(size: Size, orientation: &str) -> Size {
    let landscape = orientation == "landscape";
    if (landscape && size.width < size.height) || (!landscape && size.width > size.height) {
        Size {
            width: size.height,
            height: size.width,
        }
    } else {
        size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascaded::CascadedStyle;
    use crate::factory::{MemoryResourceLoader, StylesheetFactory};
    use crate::stylesheet::CssOrigin;
    use crate::value::ValueOptions;
    use std::sync::Arc;

    fn cascade(css: &str) -> Arc<CascadedStyle> {
        let factory = StylesheetFactory::new(
            Arc::new(MemoryResourceLoader::new()),
            4,
            ValueOptions::default(),
        );
        let ruleset = factory
            .parse_declarations(CssOrigin::Author, css)
            .expect("declarations");
        Arc::new(CascadedStyle::from_sorted(ruleset.declarations))
    }

    fn derive(arena: &mut StyleArena, parent: StyleId, css: &str) -> StyleId {
        arena.derive_style(parent, cascade(css))
    }

    #[test]
    fn margins_padding_and_borders() {
        let mut arena = StyleArena::new(ValueOptions::default());
        let root = arena.root();
        let div = derive(
            &mut arena,
            root,
            "margin: 8px auto; padding: 10%; border: 2px solid red; border-left-style: none",
        );
        let margin = arena.margin_rect(div).unwrap();
        assert_eq!(margin.top, Length::Pt(Pt::from_px(8.0)));
        assert!(margin.right.is_auto());
        let padding = arena.padding_rect(div).unwrap();
        assert_eq!(padding.left, Length::Percent(10.0));
        assert_eq!(padding.left.resolve(Pt::from_f32(200.0)), Some(Pt::from_f32(20.0)));
        let border = arena.border(div).unwrap();
        assert_eq!(border.top.width, Pt::from_px(2.0));
        assert_eq!(border.top.style, BorderStyle::Solid);
        assert_eq!(border.top.color, PaintColor::Rgb(Color::rgba8(255, 0, 0, 255)));
        assert_eq!(border.left.width, Pt::ZERO);
    }

    #[test]
    fn border_keywords_and_current_color() {
        let mut arena = StyleArena::new(ValueOptions::default());
        let root = arena.root();
        let div = derive(
            &mut arena,
            root,
            "color: #00ff00; border-top-style: solid; border-top-width: thick; \
             border-bottom-style: dashed; border-bottom-width: thin",
        );
        let border = arena.border(div).unwrap();
        assert_eq!(border.top.width, Pt::from_px(5.0));
        assert_eq!(border.bottom.width, Pt::from_px(1.0));
        assert_eq!(border.top.color, arena.color(div).unwrap());
    }

    #[test]
    fn table_rows_drop_margins_and_borders() {
        let mut arena = StyleArena::new(ValueOptions::default());
        let root = arena.root();
        let table = derive(&mut arena, root, "display: table; border-collapse: collapse");
        let row = derive(
            &mut arena,
            table,
            "display: table-row; margin: 4px; padding: 3px; border: 1px solid black",
        );
        assert_eq!(arena.margin_rect(row).unwrap(), Edges::uniform(Length::Pt(Pt::ZERO)));
        assert_eq!(arena.border(row).unwrap(), Edges::uniform(BorderSide::none()));
        assert_eq!(arena.padding_rect(row).unwrap(), Edges::uniform(Length::Pt(Pt::ZERO)));

        let separate = derive(&mut arena, root, "display: table");
        let row = derive(&mut arena, separate, "display: table-row; padding: 3px");
        assert_eq!(arena.padding_rect(row).unwrap().top, Length::Pt(Pt::from_px(3.0)));
    }

    #[test]
    fn font_and_line_height() {
        let mut arena = StyleArena::new(ValueOptions::default());
        let root = arena.root();
        let body = derive(
            &mut arena,
            root,
            "font-family: \"Open Sans\", Arial, sans-serif; font-size: 20px; line-height: 1.5",
        );
        let em = derive(&mut arena, body, "font-style: italic; font-weight: bold");
        let font = arena.font(em).unwrap();
        let families: Vec<String> = font.families.iter().map(|f| f.to_ascii_lowercase()).collect();
        assert_eq!(families, vec!["open sans", "arial", "sans-serif"]);
        assert_eq!(font.size, Pt::from_f32(15.0));
        assert_eq!(font.weight, 700);
        assert!(font.italic);
        assert_eq!(arena.line_height(em).unwrap(), Pt::from_f32(22.5));

        let normal = derive(&mut arena, root, "font-size: 10pt");
        assert_eq!(arena.line_height(normal).unwrap(), Pt::from_f32(12.0));
    }

    #[test]
    fn radii_and_background_size() {
        let mut arena = StyleArena::new(ValueOptions::default());
        let root = arena.root();
        let boxed = derive(
            &mut arena,
            root,
            "border-top-left-radius: 4px 8px; background-size: cover",
        );
        let radii = arena.border_radii(boxed).unwrap();
        assert_eq!(radii.top_left.horizontal, Length::Pt(Pt::from_px(4.0)));
        assert_eq!(radii.top_left.vertical, Length::Pt(Pt::from_px(8.0)));
        assert_eq!(radii.top_right.horizontal, Length::Pt(Pt::ZERO));
        assert_eq!(arena.background_size(boxed).unwrap(), BackgroundSize::Cover);
        assert_eq!(
            arena.background_size(root).unwrap(),
            BackgroundSize::Explicit {
                width: Length::Auto,
                height: Length::Auto
            }
        );
    }

    #[test]
    fn page_sizes() {
        let mut arena = StyleArena::new(ValueOptions::default());
        let root = arena.root();
        let a4 = derive(&mut arena, root, "size: A4 landscape");
        let size = arena.page_size(a4).unwrap().expect("size");
        assert!(size.width > size.height);
        let explicit = derive(&mut arena, root, "size: 4in 6in");
        assert_eq!(
            arena.page_size(explicit).unwrap(),
            Some(Size {
                width: Pt::from_f32(288.0),
                height: Pt::from_f32(432.0)
            })
        );
        assert_eq!(arena.page_size(root).unwrap(), None);
    }
}
