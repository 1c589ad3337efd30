//! Multi-format output emitters (§4.10): a factory producing a
//! [`Formatter`] by name, each deterministic given a frozen
//! [`reglet_types::ExecutionResult`].

mod json;
mod junit;
mod sarif;
mod table;
mod yaml;

use std::io::Write;
use std::path::PathBuf;

use reglet_types::{ExecutionResult, RegletError};

pub use json::JsonFormatter;
pub use junit::JunitFormatter;
pub use sarif::SarifFormatter;
pub use table::TableFormatter;
pub use yaml::YamlFormatter;

/// Every supported formatter name, in the order the factory checks them.
pub const SUPPORTED_FORMATS: &[&str] = &["table", "json", "yaml", "junit", "sarif"];

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Format-wide options: which formatters consume which fields is noted on
/// each formatter's constructor.
#[derive(Debug, Clone, Default)]
pub struct FormatOptions {
    /// `json`/`yaml`: pretty-print with a 2-space indent instead of compact.
    pub indent: bool,
    /// `table`: emit ANSI color; when false output is pure ASCII.
    pub color: bool,
    /// `sarif`: working directory artifacts are relativized against, and
    /// small artifact files under it may be embedded.
    pub profile_path: Option<PathBuf>,
}

pub trait Formatter {
    fn format(&self, result: &ExecutionResult, writer: &mut dyn Write) -> Result<(), FormatError>;
}

/// Builds the formatter named `name`, or `UnsupportedFormat` listing the
/// formatters that are actually supported.
pub fn formatter(name: &str, options: FormatOptions) -> Result<Box<dyn Formatter>, RegletError> {
    match name {
        "table" => Ok(Box::new(TableFormatter::new(options))),
        "json" => Ok(Box::new(JsonFormatter::new(options))),
        "yaml" => Ok(Box::new(YamlFormatter::new(options))),
        "junit" => Ok(Box::new(JunitFormatter::new(options))),
        "sarif" => Ok(Box::new(SarifFormatter::new(options))),
        other => Err(RegletError::UnsupportedFormat(other.to_string(), SUPPORTED_FORMATS.to_vec())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_format_name_lists_supported_formats() {
        let err = formatter("xml", FormatOptions::default()).unwrap_err();
        assert!(err.to_string().contains("xml"));
        assert!(err.to_string().contains("sarif"));
    }

    #[test]
    fn every_supported_name_constructs() {
        for name in SUPPORTED_FORMATS {
            assert!(formatter(name, FormatOptions::default()).is_ok());
        }
    }
}
