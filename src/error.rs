use thiserror::Error;

/// Errors returned by the classifier and its persistence layer.
///
/// Nothing is retried internally. A failed `train` or `classify` leaves the
/// trained state exactly as it was before the call.
#[derive(Debug, Error)]
pub enum KnnError {
    /// A construction-time option is out of range.
    #[error("invalid configuration: {param} = {value} ({constraint})")]
    Configuration {
        param: &'static str,
        value: String,
        constraint: &'static str,
    },

    /// No category can be produced for the document.
    #[error("document not classified: {0}")]
    NotClassified(&'static str),

    /// Category labels are opaque but must not be empty.
    #[error("category label must not be empty")]
    EmptyCategory,

    /// Reading the document source failed.
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding a saved model failed.
    #[error("failed to encode or decode model: {0}")]
    Serialization(#[from] serde_cbor::Error),

    /// A decoded model breaks a structural invariant.
    #[error("corrupt model: {0}")]
    CorruptModel(String),
}

pub type Result<T> = std::result::Result<T, KnnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_message_names_param() {
        let err = KnnError::Configuration {
            param: "k",
            value: "0".to_string(),
            constraint: "must be at least 1",
        };
        assert_eq!(err.to_string(), "invalid configuration: k = 0 (must be at least 1)");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err: KnnError = io.into();
        assert!(matches!(err, KnnError::Io(_)));
    }
}
