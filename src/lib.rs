//! CSS cascade, inheritance and paged-media style resolution.
//!
//! Stylesheets are parsed by a shared [`StylesheetFactory`], matched against a document by a
//! [`Matcher`], and folded into per-element calculated styles held in a [`StyleArena`].
//! [`StyleReference`] wires these together for one document.

mod calculated;
mod cascaded;
mod condition;
mod config;
mod content;
mod counter_style;
mod debug;
mod derived;
mod dom;
mod error;
mod factory;
mod matcher;
mod media;
mod property;
mod reference;
mod selector;
mod stylesheet;
mod types;
mod value;

pub use calculated::{CalculatedStyle, MEDIUM_FONT_SIZE, StyleArena, StyleId};
pub use cascaded::CascadedStyle;
pub use condition::{
    AttributeResolver, Condition, DynamicState, MatchMode, NthChild, TreeResolver,
};
pub use config::{DEFAULT_UA_CSS, StyleConfig};
pub use content::{
    BuiltinFunction, ContentContext, ContentFunction, ContentFunctionRegistry, ContentHandler,
    LayoutContext, LayoutMode, RenderContext, TextMeasure,
};
pub use counter_style::CounterStyle;
pub use debug::DebugLogger;
pub use derived::{
    BackgroundSize, BorderSide, BorderStyle, Corner, Edges, FontSpec, Length, Radii,
};
pub use dom::{Document, DomResolver, ElementRef};
pub use error::{Result, StyleError};
pub use factory::{FileResourceLoader, MemoryResourceLoader, ResourceLoader, StylesheetFactory};
pub use matcher::{Matcher, PageInfo};
pub use media::{Axis, Comparison, MediaExpr, MediaList, MediaQuery};
pub use property::PropertyName;
pub use reference::StyleReference;
pub use selector::{
    Combinator, CompoundSelector, IndexKey, PseudoElement, Selector, Specificity,
    split_selector_list,
};
pub use stylesheet::{
    CssOrigin, Declaration, FontFaceRule, FontSource, ImportRule, MediaRule, PageRule, Ruleset,
    Stylesheet, StylesheetInfo, StylesheetRule,
};
pub use types::{CmykColor, Color, PaintColor, Pt, Size};
pub use value::{
    FunctionValue, PropertyValue, Separator, Unit, ValueOptions, parse_color, parse_value,
    parse_value_for,
};
