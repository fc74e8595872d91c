//! Filename sanitization and unique name generation
//!
//! Client filenames are untrusted. [`sanitize_filename`] reduces any input to a base
//! name drawn from `[A-Za-z0-9._-]` plus a lowercased extension, and
//! [`SanitizedName::unique_name`] appends a collision-resistant token so two parts
//! with the same client filename never share a destination.

use uuid::Uuid;

/// Result of sanitizing a client-supplied filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedName {
    /// File stem without directory components or extension; may be empty
    pub base: String,
    /// Lowercased extension including the leading dot, or empty
    pub extension: String,
}

impl SanitizedName {
    /// Build the storage name `{base}-{token}{ext}`, or `{token}{ext}` for an empty base.
    pub fn unique_name(&self, token: &str) -> String {
        if self.base.is_empty() {
            format!("{}{}", token, self.extension)
        } else {
            format!("{}-{}{}", self.base, token, self.extension)
        }
    }
}

fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_'
}

/// Sanitize a raw filename. Never fails.
///
/// Directory components are stripped for both `/` and `\` separators since browsers
/// on Windows may send full paths. The extension starts at the last dot unless that
/// dot is the first character (`.pdf` alone has no extension).
pub fn sanitize_filename(raw: &str) -> SanitizedName {
    let last_component = raw.rsplit(['/', '\\']).next().unwrap_or(raw);

    let sanitized: String = last_component.chars().filter(|c| is_safe_char(*c)).collect();

    match sanitized.rfind('.') {
        Some(idx) if idx > 0 => SanitizedName {
            base: sanitized[..idx].to_string(),
            extension: sanitized[idx..].to_lowercase(),
        },
        _ => SanitizedName {
            base: sanitized,
            extension: String::new(),
        },
    }
}

/// Capability yielding collision-resistant name tokens
pub trait NameTokenSource: Send + Sync {
    fn next_token(&self) -> String;
}

/// Random UUID v4 tokens
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidTokens;

impl NameTokenSource for UuidTokens {
    fn next_token(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
