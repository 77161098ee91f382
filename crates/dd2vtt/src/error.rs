//! Error type for the DD2VTT codec.
//!
//! Each failure mode gets its own variant so batch callers can tell a broken
//! JSON file apart from a map whose image simply failed to decode. Metadata
//! problems never appear here: [`crate::describe`] cannot fail.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the DD2VTT codec.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The input bytes are not a JSON object.
    #[error("Malformed DD2VTT document: {source}")]
    MalformedDocument {
        #[source]
        source: serde_json::Error,
    },

    /// The `image` field is absent, empty, or not a string.
    #[error("DD2VTT document has no embedded image (missing or empty 'image' field)")]
    MissingImageField,

    /// The `image` field is not valid base64.
    #[error("DD2VTT 'image' field is not valid base64: {source}")]
    InvalidEncoding {
        #[source]
        source: base64::DecodeError,
    },

    /// The decoded bytes are not a raster image any enabled codec can read.
    #[error("Embedded image is unsupported or corrupt: {detail}")]
    UnsupportedOrCorruptImage { detail: String },

    /// Could not write the exported raster file.
    #[error("Failed to write image to '{path}': {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not read the DD2VTT file from disk.
    #[error("Failed to read DD2VTT file '{path}': {source}")]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CodecError {
    /// Short, stable identifier for the failure kind.
    ///
    /// Handy for summaries that group failures without printing the full
    /// message for each file.
    pub fn kind(&self) -> &'static str {
        match self {
            CodecError::MalformedDocument { .. } => "malformed-document",
            CodecError::MissingImageField => "missing-image-field",
            CodecError::InvalidEncoding { .. } => "invalid-encoding",
            CodecError::UnsupportedOrCorruptImage { .. } => "unsupported-or-corrupt-image",
            CodecError::WriteFailure { .. } => "write-failure",
            CodecError::ReadFailure { .. } => "read-failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_failure_display_mentions_path() {
        let e = CodecError::WriteFailure {
            path: PathBuf::from("/nope/map.png"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = e.to_string();
        assert!(msg.contains("/nope/map.png"), "got: {msg}");
        assert!(msg.contains("denied"), "got: {msg}");
    }

    #[test]
    fn kinds_are_distinct() {
        let missing = CodecError::MissingImageField;
        let corrupt = CodecError::UnsupportedOrCorruptImage {
            detail: "bad".into(),
        };
        assert_eq!(missing.kind(), "missing-image-field");
        assert_ne!(missing.kind(), corrupt.kind());
    }
}
