//! Error types for the CMS model

/// Errors raised while interpreting model values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Indexing directive outside the controlled vocabulary
    #[error("unknown indexing option: '{0}'")]
    UnknownIndexing(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_display() {
        let err = ModelError::UnknownIndexing("sometimes".to_string());
        assert_eq!(err.to_string(), "unknown indexing option: 'sometimes'");
    }
}
