//! Declared-type validation for uploaded parts
//!
//! This is a declared-type check only: the client's extension and `Content-Type` are
//! trusted as stated and file bytes are never sniffed. A part passes when its
//! extension is allowed, its media type is allowed, and the two agree with each other.

/// Reasons a part is rejected
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid file extension: '{extension}' (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Invalid content type: '{content_type}' (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Content-Type '{content_type}' does not match extension '{extension}'")]
    ExtensionContentTypeMismatch {
        extension: String,
        content_type: String,
    },
}

/// Normalize MIME type by stripping parameters (e.g. "image/jpeg; q=1" -> "image/jpeg").
fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
        .to_lowercase()
}

/// Media types an extension may be declared as. An extension without an entry has
/// no valid pairing and is always a mismatch.
fn expected_content_types(extension: &str) -> &'static [&'static str] {
    match extension {
        ".jpg" | ".jpeg" => &["image/jpeg"],
        ".png" => &["image/png"],
        ".pdf" => &["application/pdf"],
        _ => &[],
    }
}

/// Extension and media type allowlists
#[derive(Debug, Clone)]
pub struct TypePolicy {
    allowed_extensions: Vec<String>,
    allowed_content_types: Vec<String>,
}

impl TypePolicy {
    /// Both lists are compared case-insensitively; extensions include the leading dot.
    pub fn new(allowed_extensions: Vec<String>, allowed_content_types: Vec<String>) -> Self {
        Self {
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|e| e.to_lowercase())
                .collect(),
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|c| c.to_lowercase())
                .collect(),
        }
    }

    /// Validate extension
    pub fn check_extension(&self, extension: &str) -> Result<(), ValidationError> {
        let extension = extension.to_lowercase();
        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::InvalidExtension {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }
        Ok(())
    }

    /// Validate declared media type, including its agreement with the extension
    pub fn check_content_type(
        &self,
        extension: &str,
        content_type: &str,
    ) -> Result<(), ValidationError> {
        let normalized = normalize_mime_type(content_type);

        if !self.allowed_content_types.contains(&normalized) {
            return Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        let extension = extension.to_lowercase();
        if !expected_content_types(&extension).contains(&normalized.as_str()) {
            return Err(ValidationError::ExtensionContentTypeMismatch {
                extension,
                content_type: content_type.to_string(),
            });
        }

        Ok(())
    }

    /// Run every check in order: extension first, then media type.
    pub fn check(&self, extension: &str, content_type: &str) -> Result<(), ValidationError> {
        self.check_extension(extension)?;
        self.check_content_type(extension, content_type)
    }
}

impl Default for TypePolicy {
    fn default() -> Self {
        Self::new(
            crate::config::DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            crate::config::DEFAULT_ALLOWED_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_consistent_pairs() {
        let policy = TypePolicy::default();
        assert!(policy.check(".jpg", "image/jpeg").is_ok());
        assert!(policy.check(".jpeg", "image/jpeg").is_ok());
        assert!(policy.check(".png", "image/png").is_ok());
        assert!(policy.check(".pdf", "application/pdf").is_ok());
    }

    #[test]
    fn rejects_unlisted_extension() {
        let policy = TypePolicy::default();
        assert!(matches!(
            policy.check(".exe", "application/pdf"),
            Err(ValidationError::InvalidExtension { .. })
        ));
        assert!(matches!(
            policy.check("", "image/png"),
            Err(ValidationError::InvalidExtension { .. })
        ));
    }

    #[test]
    fn rejects_unlisted_content_type() {
        let policy = TypePolicy::default();
        assert!(matches!(
            policy.check(".png", "image/gif"),
            Err(ValidationError::InvalidContentType { .. })
        ));
    }

    #[test]
    fn rejects_mismatched_pair() {
        let policy = TypePolicy::default();
        assert_eq!(
            policy.check(".pdf", "image/png"),
            Err(ValidationError::ExtensionContentTypeMismatch {
                extension: ".pdf".to_string(),
                content_type: "image/png".to_string(),
            })
        );
        assert!(policy.check(".jpg", "image/png").is_err());
    }

    #[test]
    fn configured_extension_without_pairing_is_rejected() {
        let policy = TypePolicy::new(
            vec![".png".to_string(), ".txt".to_string()],
            vec!["image/png".to_string(), "text/plain".to_string()],
        );
        assert!(policy.check(".png", "image/png").is_ok());
        assert!(matches!(
            policy.check(".txt", "image/png"),
            Err(ValidationError::ExtensionContentTypeMismatch { .. })
        ));
        assert!(matches!(
            policy.check(".txt", "text/plain"),
            Err(ValidationError::ExtensionContentTypeMismatch { .. })
        ));
    }

    #[test]
    fn content_type_parameters_and_case_are_ignored() {
        let policy = TypePolicy::default();
        assert!(policy.check(".PNG", "Image/PNG; charset=binary").is_ok());
    }
}
