use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoverageError {
    #[error("XML parse error at position {position}: {source}")]
    Xml {
        source: quick_xml::Error,
        position: usize,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    /// Well-formed XML that lacks something a Clover report must carry.
    #[error("Malformed report: {message}")]
    MalformedReport {
        file: Option<String>,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CoverageError {
    /// Build a `MalformedReport`, naming the offending file when known.
    pub fn malformed(file: Option<&str>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let message = match file {
            Some(f) => format!("{reason} (file '{f}')"),
            None => reason,
        };
        CoverageError::MalformedReport {
            file: file.map(str::to_owned),
            message,
        }
    }

    /// True for errors caused by input that is not well-formed XML.
    #[must_use]
    pub fn is_parse_error(&self) -> bool {
        matches!(self, CoverageError::Xml { .. } | CoverageError::Parse(_))
    }
}

pub type Result<T> = std::result::Result<T, CoverageError>;
