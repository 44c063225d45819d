//! Error types for the upload-and-generate form.

/// Errors that can occur while editing or submitting the form.
#[derive(Debug, thiserror::Error)]
pub enum GenFormError {
    /// Form input rejected before any network activity (e.g. empty prompt).
    #[error("{0}")]
    Validation(String),

    /// The service answered with a non-success status.
    #[error("Error: {message}")]
    Request {
        /// HTTP status code.
        status: u16,
        /// Status text of the response.
        message: String,
    },

    /// Network or HTTP transport error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A selected file could not be decoded as an image.
    #[error("could not read image: {0}")]
    Decode(String),

    /// Slot index outside the selectable range.
    #[error("slot {index} is out of range ({len} of {max} images selected)")]
    SlotOutOfRange {
        /// Requested slot.
        index: usize,
        /// Images currently selected.
        len: usize,
        /// Slot limit.
        max: usize,
    },

    /// A size or quality value that is not one of the enumerated options.
    #[error("invalid {field}: {value}")]
    InvalidValue {
        /// Which option (`size` or `quality`).
        field: &'static str,
        /// The rejected input.
        value: String,
    },

    /// Service configuration is unusable (e.g. malformed base URL).
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error (e.g. reading an upload or saving the result).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GenFormError {
    /// Returns true for errors raised by local input checks rather than the service.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::Decode(_)
                | Self::SlotOutOfRange { .. }
                | Self::InvalidValue { .. }
        )
    }

    /// Returns the HTTP status if the service rejected the request.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for form operations.
pub type Result<T> = std::result::Result<T, GenFormError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_validation() {
        assert!(GenFormError::Validation("Please enter a prompt".into()).is_validation());
        assert!(GenFormError::Decode("bad header".into()).is_validation());
        assert!(GenFormError::SlotOutOfRange {
            index: 5,
            len: 1,
            max: 4
        }
        .is_validation());

        assert!(!GenFormError::Request {
            status: 500,
            message: "Internal Server Error".into()
        }
        .is_validation());
        assert!(!GenFormError::Config("bad url".into()).is_validation());
    }

    #[test]
    fn test_status() {
        let err = GenFormError::Request {
            status: 404,
            message: "Not Found".into(),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(GenFormError::Validation("x".into()).status(), None);
    }

    #[test]
    fn test_error_display() {
        let err = GenFormError::Request {
            status: 500,
            message: "Internal Server Error".into(),
        };
        assert_eq!(err.to_string(), "Error: Internal Server Error");

        let err = GenFormError::Validation("Please enter a prompt".into());
        assert_eq!(err.to_string(), "Please enter a prompt");

        let err = GenFormError::InvalidValue {
            field: "size",
            value: "800x600".into(),
        };
        assert_eq!(err.to_string(), "invalid size: 800x600");
    }
}
