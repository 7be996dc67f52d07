use crate::counter_style::CounterStyle;
use crate::types::Pt;
use crate::value::{FunctionValue, PropertyValue};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutMode {
    #[default]
    Screen,
    Print,
}

/// Pagination state visible to content functions.
#[derive(Debug, Clone, Default)]
pub struct LayoutContext {
    pub mode: LayoutMode,
    /// 1-based number of the page being laid out.
    pub page_number: u32,
    pub page_count: u32,
    /// Page of each anchor id, filled by a previous layout pass.
    pub target_pages: HashMap<String, u32>,
    /// Values of named counters in scope, for plain `counter(name)`.
    pub counters: HashMap<String, i32>,
}

impl LayoutContext {
    pub fn print(page_number: u32, page_count: u32) -> Self {
        Self {
            mode: LayoutMode::Print,
            page_number,
            page_count,
            ..Self::default()
        }
    }

    pub fn is_print(&self) -> bool {
        self.mode == LayoutMode::Print
    }

    pub fn with_target(mut self, anchor: impl Into<String>, page: u32) -> Self {
        self.target_pages.insert(anchor.into(), page);
        self
    }
}

/// Text measurement supplied by the rendering stage.
pub trait TextMeasure {
    fn text_width(&self, text: &str) -> Pt;
}

/// Line geometry for functions that fill space.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub measure: &'a dyn TextMeasure,
    pub available_width: Pt,
}

/// Everything a content function may read while producing its text.
#[derive(Clone, Copy)]
pub struct ContentContext<'a> {
    pub layout: &'a LayoutContext,
    pub attribute: Option<&'a dyn Fn(&str) -> Option<String>>,
    pub render: Option<RenderContext<'a>>,
}

impl<'a> ContentContext<'a> {
    pub fn new(layout: &'a LayoutContext) -> Self {
        Self {
            layout,
            attribute: None,
            render: None,
        }
    }

    pub fn with_attributes(mut self, attribute: &'a dyn Fn(&str) -> Option<String>) -> Self {
        self.attribute = Some(attribute);
        self
    }

    pub fn with_render(mut self, render: RenderContext<'a>) -> Self {
        self.render = Some(render);
        self
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attribute.and_then(|lookup| lookup(name))
    }
}

/// Caller-provided content function.
pub trait ContentFunction: Send + Sync {
    fn can_handle(&self, layout: &LayoutContext, function: &FunctionValue) -> bool;

    /// Static functions resolve once; dynamic ones are recomputed after pagination.
    fn is_static(&self) -> bool;

    /// Placeholder measured during layout before the real text is known.
    fn layout_replacement_text(&self) -> &str;

    fn calculate(&self, context: &ContentContext<'_>, function: &FunctionValue) -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFunction {
    PageCounter,
    PagesCounter,
    TargetCounter,
    Leader,
}

impl BuiltinFunction {
    const ALL: [BuiltinFunction; 4] = [
        BuiltinFunction::PageCounter,
        BuiltinFunction::PagesCounter,
        BuiltinFunction::TargetCounter,
        BuiltinFunction::Leader,
    ];

    fn can_handle(self, layout: &LayoutContext, function: &FunctionValue) -> bool {
        match self {
            BuiltinFunction::PageCounter => page_counter_named(layout, function, "page"),
            BuiltinFunction::PagesCounter => page_counter_named(layout, function, "pages"),
            BuiltinFunction::TargetCounter => {
                function.name == "target-counter"
                    && layout.is_print()
                    && (2..=3).contains(&function.params.len())
                    && is_attr_href(&function.params[0])
                    && function.param_ident(1) == Some("page")
                    && function.params.get(2).map_or(true, |p| p.as_ident().is_some())
            }
            BuiltinFunction::Leader => {
                function.name == "leader"
                    && layout.is_print()
                    && function.params.len() == 1
                    && leader_pattern(&function.params[0]).is_some()
            }
        }
    }

    fn layout_replacement_text(self) -> &'static str {
        match self {
            BuiltinFunction::Leader => " . ",
            _ => "999",
        }
    }

    fn calculate(self, context: &ContentContext<'_>, function: &FunctionValue) -> Option<String> {
        match self {
            BuiltinFunction::PageCounter => {
                let style = counter_style_param(function, 1);
                Some(style.format(context.layout.page_number as i32))
            }
            BuiltinFunction::PagesCounter => {
                let style = counter_style_param(function, 1);
                Some(style.format(context.layout.page_count as i32))
            }
            BuiltinFunction::TargetCounter => {
                let href = context.attribute("href")?;
                let anchor = href.rsplit_once('#').map(|(_, id)| id).unwrap_or(&href);
                let page = context.layout.target_pages.get(anchor)?;
                Some(counter_style_param(function, 2).format(*page as i32))
            }
            BuiltinFunction::Leader => {
                let pattern = leader_pattern(function.params.first()?)?;
                let render = context.render?;
                Some(fill_leader(&pattern, render))
            }
        }
    }
}

fn page_counter_named(layout: &LayoutContext, function: &FunctionValue, counter: &str) -> bool {
    function.name == "counter"
        && layout.is_print()
        && (1..=2).contains(&function.params.len())
        && function.param_ident(0) == Some(counter)
        && function.params.get(1).map_or(true, |p| p.as_ident().is_some())
}

fn is_attr_href(value: &PropertyValue) -> bool {
    value
        .as_function()
        .is_some_and(|attr| attr.name == "attr" && attr.params.len() == 1 && attr.param_ident(0) == Some("href"))
}

fn counter_style_param(function: &FunctionValue, index: usize) -> CounterStyle {
    function
        .param_ident(index)
        .map(CounterStyle::from_name)
        .unwrap_or(CounterStyle::Decimal)
}

fn leader_pattern(value: &PropertyValue) -> Option<String> {
    match value {
        PropertyValue::String(text) if !text.is_empty() => Some(text.clone()),
        PropertyValue::Ident(ident) => match ident.as_str() {
            "dotted" => Some(". ".to_string()),
            "solid" => Some("_".to_string()),
            "space" => Some(" ".to_string()),
            _ => None,
        },
        _ => None,
    }
}

/// Repeats `pattern` as often as it fits, then pads the remainder with spaces.
fn fill_leader(pattern: &str, render: RenderContext<'_>) -> String {
    let pattern_width = render.measure.text_width(pattern);
    if pattern_width <= Pt::ZERO || render.available_width <= Pt::ZERO {
        return String::new();
    }
    let count = (render.available_width.to_f32() / pattern_width.to_f32()).floor() as usize;
    let mut out = pattern.repeat(count);
    let remainder = render.available_width - pattern_width * count as f32;
    let space_width = render.measure.text_width(" ");
    if space_width > Pt::ZERO {
        let spaces = (remainder.to_f32() / space_width.to_f32()).floor() as usize;
        out.push_str(&" ".repeat(spaces));
    }
    out
}

/// A registered handler: a built-in or a caller extension.
#[derive(Clone)]
pub enum ContentHandler {
    Builtin(BuiltinFunction),
    Custom(Arc<dyn ContentFunction>),
}

impl ContentHandler {
    fn can_handle(&self, layout: &LayoutContext, function: &FunctionValue) -> bool {
        match self {
            ContentHandler::Builtin(builtin) => builtin.can_handle(layout, function),
            ContentHandler::Custom(custom) => custom.can_handle(layout, function),
        }
    }

    pub fn is_static(&self) -> bool {
        match self {
            ContentHandler::Builtin(_) => false,
            ContentHandler::Custom(custom) => custom.is_static(),
        }
    }

    pub fn layout_replacement_text(&self) -> &str {
        match self {
            ContentHandler::Builtin(builtin) => builtin.layout_replacement_text(),
            ContentHandler::Custom(custom) => custom.layout_replacement_text(),
        }
    }

    pub fn calculate(&self, context: &ContentContext<'_>, function: &FunctionValue) -> Option<String> {
        match self {
            ContentHandler::Builtin(builtin) => builtin.calculate(context, function),
            ContentHandler::Custom(custom) => custom.calculate(context, function),
        }
    }
}

impl fmt::Debug for ContentHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentHandler::Builtin(builtin) => write!(f, "Builtin({builtin:?})"),
            ContentHandler::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Ordered content function handlers. The first handler that accepts a function wins.
#[derive(Debug, Clone)]
pub struct ContentFunctionRegistry {
    handlers: Vec<ContentHandler>,
}

impl Default for ContentFunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentFunctionRegistry {
    pub fn new() -> Self {
        Self {
            handlers: BuiltinFunction::ALL
                .into_iter()
                .map(ContentHandler::Builtin)
                .collect(),
        }
    }

    /// Appends a handler. It is consulted after every handler registered before it.
    pub fn register(&mut self, function: Arc<dyn ContentFunction>) {
        self.handlers.push(ContentHandler::Custom(function));
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn lookup_function(
        &self,
        layout: &LayoutContext,
        function: &FunctionValue,
    ) -> Option<&ContentHandler> {
        self.handlers
            .iter()
            .find(|handler| handler.can_handle(layout, function))
    }

    /// Whether `value` holds a function that must be recomputed after layout.
    pub fn is_dynamic(&self, layout: &LayoutContext, value: &PropertyValue) -> bool {
        value.items().iter().any(|item| match item {
            PropertyValue::Function(function) => self
                .lookup_function(layout, function)
                .is_some_and(|handler| !handler.is_static()),
            _ => false,
        })
    }

    /// Generated text for a `content` value. With `measuring` set, dynamic functions yield their
    /// placeholder instead of their value.
    pub fn content_text(
        &self,
        context: &ContentContext<'_>,
        value: &PropertyValue,
        measuring: bool,
    ) -> String {
        let mut out = String::new();
        if value.is_ident("normal") || value.is_ident("none") {
            return out;
        }
        for item in value.items() {
            match item {
                PropertyValue::String(text) => out.push_str(text),
                PropertyValue::Function(function) => {
                    out.push_str(&self.function_text(context, function, measuring))
                }
                PropertyValue::Ident(ident) if ident == "open-quote" => out.push('\u{201c}'),
                PropertyValue::Ident(ident) if ident == "close-quote" => out.push('\u{201d}'),
                _ => {}
            }
        }
        out
    }

    fn function_text(
        &self,
        context: &ContentContext<'_>,
        function: &FunctionValue,
        measuring: bool,
    ) -> String {
        if let Some(handler) = self.lookup_function(context.layout, function) {
            if measuring && !handler.is_static() {
                return handler.layout_replacement_text().to_string();
            }
            return handler.calculate(context, function).unwrap_or_default();
        }
        match function.name.as_str() {
            "attr" => function
                .param_ident(0)
                .and_then(|name| context.attribute(name))
                .unwrap_or_default(),
            "counter" => {
                let value = function
                    .param_ident(0)
                    .and_then(|name| context.layout.counters.get(name))
                    .copied()
                    .unwrap_or(0);
                counter_style_param(function, 1).format(value)
            }
            other => {
                log::debug!("no content handler for {other}()");
                String::new()
            }
        }
    }
}
