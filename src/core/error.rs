//! Error types for XML view operations
//!
//! Every variant is recoverable. The facade reports them as warnings and
//! turns lookups that miss into `None` rather than errors.

use thiserror::Error;

/// Error types for XML view operations
#[derive(Debug, Error)]
pub enum XmlError {
    /// The addressed node or attribute no longer exists (or never did)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed element or attribute name on creation
    #[error("Invalid name: '{0}'")]
    InvalidName(String),

    /// A namespace was given for an attribute whose name has no prefix
    #[error("Adding attributes with namespaces requires attribute name with a prefix: '{0}'")]
    NamespaceRequiresPrefix(String),

    /// Text cannot be represented in the target encoding
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unparseable path expression
    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    /// Parse error (XML input malformed)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Operation not supported by this kind of view
    #[error("Operation not supported: {0}")]
    NotSupported(String),
}

/// Result type alias for XML view operations
pub type XmlResult<T> = Result<T, XmlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = XmlError::InvalidName("1abc".to_string());
        assert!(err.to_string().contains("Invalid name: '1abc'"));

        let err = XmlError::NamespaceRequiresPrefix("a".to_string());
        assert!(err.to_string().contains("requires attribute name with a prefix"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let xml_err: XmlError = io_err.into();
        assert!(matches!(xml_err, XmlError::Io(_)));
    }
}
