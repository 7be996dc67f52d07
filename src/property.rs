macro_rules! properties {
    ($($variant:ident => $name:literal, $inherited:literal, $initial:literal;)+) => {
        /// Every CSS property the engine resolves. The discriminant doubles as the slot index
        /// of a calculated style.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum PropertyName {
            $($variant,)+
        }

        impl PropertyName {
            pub const ALL: &'static [PropertyName] = &[$(PropertyName::$variant,)+];

            pub fn name(self) -> &'static str {
                match self {
                    $(PropertyName::$variant => $name,)+
                }
            }

            pub fn is_inherited(self) -> bool {
                match self {
                    $(PropertyName::$variant => $inherited,)+
                }
            }

            /// Initial value text. A leading `=` names another property whose value is used
            /// instead (`border-top-color` starts as the element's `color`).
            pub fn initial_value(self) -> &'static str {
                match self {
                    $(PropertyName::$variant => $initial,)+
                }
            }

            pub fn from_name(name: &str) -> Option<PropertyName> {
                let lower = name.trim().to_ascii_lowercase();
                match lower.as_str() {
                    $($name => Some(PropertyName::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

properties! {
    BackgroundAttachment => "background-attachment", false, "scroll";
    BackgroundColor => "background-color", false, "transparent";
    BackgroundImage => "background-image", false, "none";
    BackgroundPosition => "background-position", false, "0% 0%";
    BackgroundRepeat => "background-repeat", false, "repeat";
    BackgroundSize => "background-size", false, "auto auto";
    BorderCollapse => "border-collapse", true, "separate";
    BorderSpacing => "border-spacing", true, "0";
    BorderTopColor => "border-top-color", false, "=color";
    BorderRightColor => "border-right-color", false, "=color";
    BorderBottomColor => "border-bottom-color", false, "=color";
    BorderLeftColor => "border-left-color", false, "=color";
    BorderTopStyle => "border-top-style", false, "none";
    BorderRightStyle => "border-right-style", false, "none";
    BorderBottomStyle => "border-bottom-style", false, "none";
    BorderLeftStyle => "border-left-style", false, "none";
    BorderTopWidth => "border-top-width", false, "medium";
    BorderRightWidth => "border-right-width", false, "medium";
    BorderBottomWidth => "border-bottom-width", false, "medium";
    BorderLeftWidth => "border-left-width", false, "medium";
    BorderTopLeftRadius => "border-top-left-radius", false, "0";
    BorderTopRightRadius => "border-top-right-radius", false, "0";
    BorderBottomRightRadius => "border-bottom-right-radius", false, "0";
    BorderBottomLeftRadius => "border-bottom-left-radius", false, "0";
    Bottom => "bottom", false, "auto";
    BoxSizing => "box-sizing", false, "content-box";
    CaptionSide => "caption-side", true, "top";
    Clear => "clear", false, "none";
    Color => "color", true, "black";
    Content => "content", false, "normal";
    CounterIncrement => "counter-increment", false, "none";
    CounterReset => "counter-reset", false, "none";
    Direction => "direction", true, "ltr";
    Display => "display", false, "inline";
    EmptyCells => "empty-cells", true, "show";
    Float => "float", false, "none";
    FontFamily => "font-family", true, "serif";
    FontSize => "font-size", true, "medium";
    FontStretch => "font-stretch", false, "normal";
    FontStyle => "font-style", true, "normal";
    FontVariant => "font-variant", true, "normal";
    FontWeight => "font-weight", true, "normal";
    Height => "height", false, "auto";
    Left => "left", false, "auto";
    LetterSpacing => "letter-spacing", true, "normal";
    LineHeight => "line-height", true, "normal";
    ListStyleImage => "list-style-image", true, "none";
    ListStylePosition => "list-style-position", true, "outside";
    ListStyleType => "list-style-type", true, "disc";
    MarginTop => "margin-top", false, "0";
    MarginRight => "margin-right", false, "0";
    MarginBottom => "margin-bottom", false, "0";
    MarginLeft => "margin-left", false, "0";
    MaxHeight => "max-height", false, "none";
    MaxWidth => "max-width", false, "none";
    MinHeight => "min-height", false, "0";
    MinWidth => "min-width", false, "0";
    Opacity => "opacity", false, "1";
    Orphans => "orphans", true, "2";
    Overflow => "overflow", false, "visible";
    PaddingTop => "padding-top", false, "0";
    PaddingRight => "padding-right", false, "0";
    PaddingBottom => "padding-bottom", false, "0";
    PaddingLeft => "padding-left", false, "0";
    Page => "page", true, "auto";
    PageBreakAfter => "page-break-after", false, "auto";
    PageBreakBefore => "page-break-before", false, "auto";
    PageBreakInside => "page-break-inside", false, "auto";
    Position => "position", false, "static";
    Quotes => "quotes", true, "none";
    Right => "right", false, "auto";
    Size => "size", false, "auto";
    Src => "src", false, "none";
    TableLayout => "table-layout", false, "auto";
    TextAlign => "text-align", true, "start";
    TextDecorationLine => "text-decoration-line", false, "none";
    TextIndent => "text-indent", true, "0";
    TextTransform => "text-transform", true, "none";
    Top => "top", false, "auto";
    UnicodeRange => "unicode-range", false, "U+0-10FFFF";
    VerticalAlign => "vertical-align", false, "baseline";
    Visibility => "visibility", true, "visible";
    WhiteSpace => "white-space", true, "normal";
    Widows => "widows", true, "2";
    Width => "width", false, "auto";
    WordSpacing => "word-spacing", true, "normal";
    ZIndex => "z-index", false, "auto";
}

impl PropertyName {
    pub fn id(self) -> usize {
        self as usize
    }

    pub fn count() -> usize {
        Self::ALL.len()
    }

    /// Legacy names that map onto a modelled longhand.
    pub fn from_alias(name: &str) -> Option<PropertyName> {
        let lower = name.trim().to_ascii_lowercase();
        match lower.as_str() {
            "text-decoration" => Some(PropertyName::TextDecorationLine),
            "break-before" => Some(PropertyName::PageBreakBefore),
            "break-after" => Some(PropertyName::PageBreakAfter),
            "break-inside" => Some(PropertyName::PageBreakInside),
            "overflow-x" | "overflow-y" => Some(PropertyName::Overflow),
            "font-variant-caps" => Some(PropertyName::FontVariant),
            _ => PropertyName::from_name(&lower),
        }
    }
}

impl std::fmt::Display for PropertyName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_table_order() {
        for (idx, property) in PropertyName::ALL.iter().enumerate() {
            assert_eq!(property.id(), idx);
            assert_eq!(PropertyName::from_name(property.name()), Some(*property));
        }
        assert_eq!(PropertyName::count(), PropertyName::ALL.len());
    }

    #[test]
    fn alias_chains_terminate_in_concrete_values() {
        for property in PropertyName::ALL {
            let mut current = *property;
            let mut hops = 0;
            while let Some(target) = current.initial_value().strip_prefix('=') {
                current = PropertyName::from_name(target)
                    .unwrap_or_else(|| panic!("{property} aliases unknown {target}"));
                hops += 1;
                assert!(hops < 8, "alias cycle starting at {property}");
            }
            assert!(!current.initial_value().is_empty());
        }
    }

    #[test]
    fn lookup_is_case_insensitive_and_knows_aliases() {
        assert_eq!(PropertyName::from_name("COLOR"), Some(PropertyName::Color));
        assert_eq!(
            PropertyName::from_alias("break-before"),
            Some(PropertyName::PageBreakBefore)
        );
        assert_eq!(PropertyName::from_name("--custom"), None);
        assert!(PropertyName::FontSize.is_inherited());
        assert!(!PropertyName::MarginTop.is_inherited());
    }
}
