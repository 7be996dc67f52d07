use thiserror::Error;

pub type Result<T> = std::result::Result<T, StyleError>;

#[derive(Debug, Error)]
pub enum StyleError {
    /// Malformed CSS text or malformed function arguments.
    #[error("{}", format_parse_error(.message, .line, .column))]
    Parse {
        message: String,
        line: Option<u32>,
        column: Option<u32>,
    },

    /// A stylesheet could not be fetched or decoded.
    #[error("resource error for {uri}: {message}")]
    Resource { uri: String, message: String },

    /// The property table cannot produce a value. This is an engine bug, not bad input.
    #[error("style configuration error: {0}")]
    Configuration(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StyleError {
    pub fn parse(message: impl Into<String>) -> Self {
        StyleError::Parse {
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub fn parse_at(message: impl Into<String>, line: u32, column: u32) -> Self {
        StyleError::Parse {
            message: message.into(),
            line: Some(line),
            column: Some(column),
        }
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(self, StyleError::Parse { .. })
    }
}

fn format_parse_error(message: &str, line: &Option<u32>, column: &Option<u32>) -> String {
    match (*line, *column) {
        (Some(line), Some(column)) => format!("parse error at {line}:{column}: {message}"),
        (Some(line), None) => format!("parse error at line {line}: {message}"),
        _ => format!("parse error: {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_includes_position_when_known() {
        let err = StyleError::parse_at("unexpected token", 3, 14);
        assert_eq!(err.to_string(), "parse error at 3:14: unexpected token");
        assert!(err.is_parse_error());
        assert_eq!(
            StyleError::parse("bad nth").to_string(),
            "parse error: bad nth"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: StyleError = io.into();
        assert!(matches!(err, StyleError::Io(_)));
        assert!(!err.is_parse_error());
    }
}
