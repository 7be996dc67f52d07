use crate::types::Size;
use crate::value::ValueOptions;
use std::path::PathBuf;

/// Built-in user agent sheet for HTML documents.
pub const DEFAULT_UA_CSS: &str = r#"
html, body, div, p, section, article, header, footer, aside, nav, main, blockquote,
h1, h2, h3, h4, h5, h6, ul, ol, dl, dt, dd, pre, hr, address, figure, figcaption { display: block; }
head, style, script, link, meta, title { display: none; }
li { display: list-item; }
table { display: table; border-collapse: separate; border-spacing: 2px; }
caption { display: table-caption; text-align: center; }
thead { display: table-header-group; vertical-align: middle; }
tbody { display: table-row-group; vertical-align: middle; }
tfoot { display: table-footer-group; vertical-align: middle; }
tr { display: table-row; }
td, th { display: table-cell; padding: 1px; vertical-align: inherit; }
th { font-weight: bold; text-align: center; }
col { display: table-column; }
colgroup { display: table-column-group; }
img, svg { display: inline-block; }
body { margin: 8px; line-height: 1.2; }
p, blockquote, dl, figure { margin-top: 1em; margin-bottom: 1em; }
h1 { font-size: 2em; margin-top: 0.67em; margin-bottom: 0.67em; font-weight: bold; }
h2 { font-size: 1.5em; margin-top: 0.83em; margin-bottom: 0.83em; font-weight: bold; }
h3 { font-size: 1.17em; margin-top: 1em; margin-bottom: 1em; font-weight: bold; }
h4 { font-size: 1em; margin-top: 1.33em; margin-bottom: 1.33em; font-weight: bold; }
h5 { font-size: 0.83em; margin-top: 1.67em; margin-bottom: 1.67em; font-weight: bold; }
h6 { font-size: 0.67em; margin-top: 2.33em; margin-bottom: 2.33em; font-weight: bold; }
ul, ol { margin-top: 1em; margin-bottom: 1em; padding-left: 40px; }
ol { list-style-type: decimal; }
ul ul { list-style-type: circle; }
dd { margin-left: 40px; }
pre, code, kbd, samp, tt { font-family: monospace; }
pre { white-space: pre; }
b, strong { font-weight: bolder; }
i, em, cite, var, address { font-style: italic; }
u, ins { text-decoration: underline; }
s, strike, del { text-decoration: line-through; }
small { font-size: smaller; }
big { font-size: larger; }
sub { vertical-align: sub; font-size: smaller; }
sup { vertical-align: super; font-size: smaller; }
a:link { color: blue; text-decoration: underline; }
hr { border: 1px inset; margin-top: 0.5em; margin-bottom: 0.5em; }
table { break-inside: avoid; }
thead { break-inside: avoid; }
"#;

/// Options consumed when a [`crate::StyleReference`] is built.
#[derive(Debug, Clone)]
pub struct StyleConfig {
    pub medium: String,
    pub viewport: Option<Size>,
    pub cmyk_colors: bool,
    pub user_agent_css: String,
    pub user_css: Option<String>,
    pub stylesheet_cache_capacity: usize,
    pub debug_path: Option<PathBuf>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleConfig {
    pub fn new() -> Self {
        Self {
            medium: "print".to_string(),
            viewport: None,
            cmyk_colors: false,
            user_agent_css: DEFAULT_UA_CSS.to_string(),
            user_css: None,
            stylesheet_cache_capacity: 64,
            debug_path: None,
        }
    }

    pub fn medium(mut self, medium: impl Into<String>) -> Self {
        self.medium = medium.into().to_ascii_lowercase();
        self
    }

    /// Size that `width`/`height` media features compare against.
    pub fn viewport(mut self, viewport: Size) -> Self {
        self.viewport = Some(viewport);
        self
    }

    pub fn cmyk_colors(mut self, enabled: bool) -> Self {
        self.cmyk_colors = enabled;
        self
    }

    pub fn user_agent_css(mut self, css: impl Into<String>) -> Self {
        self.user_agent_css = css.into();
        self
    }

    pub fn user_css(mut self, css: impl Into<String>) -> Self {
        self.user_css = Some(css.into());
        self
    }

    pub fn stylesheet_cache_capacity(mut self, capacity: usize) -> Self {
        self.stylesheet_cache_capacity = capacity;
        self
    }

    /// Writes a JSON-lines trace of rule indexing, matching and style caching to `path`.
    pub fn debug_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    pub fn value_options(&self) -> ValueOptions {
        ValueOptions {
            cmyk_colors: self.cmyk_colors,
        }
    }

    pub fn is_print(&self) -> bool {
        self.medium == "print"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_print() {
        let config = StyleConfig::default();
        assert!(config.is_print());
        assert_eq!(config.stylesheet_cache_capacity, 64);
        assert!(!config.value_options().cmyk_colors);
        assert!(config.user_agent_css.contains("display: table-row"));
    }

    #[test]
    fn setters_chain() {
        let config = StyleConfig::new()
            .medium("Screen")
            .cmyk_colors(true)
            .user_css("p { color: red }")
            .viewport(Size::letter())
            .debug_log("/tmp/cascade.jsonl");
        assert_eq!(config.medium, "screen");
        assert!(!config.is_print());
        assert!(config.value_options().cmyk_colors);
        assert_eq!(config.user_css.as_deref(), Some("p { color: red }"));
        assert!(config.viewport.is_some());
        assert!(config.debug_path.is_some());
    }
}
