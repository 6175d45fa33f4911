use crate::asset::AssetKind;
use crate::tag::TagName;
use thiserror::Error;

/// Caller-facing, synchronously-returned errors from the domain layer.
///
/// These fail immediately at the call site rather than settling an
/// activation's observing promise.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// `markLoaded`/`isLoaded` called with a kind outside `{script, stylesheet}`.
    #[error("unknown asset kind: {found:?}")]
    BadKind { found: String },

    /// A tag descriptor's `tag` field mismatches the operation it was passed to.
    #[error("expected a {expected} tag descriptor, found {found}")]
    BadTag { expected: AssetKind, found: TagName },

    /// An envelope's base64 or JSON payload failed to decode.
    #[error("failed to decode envelope field `{field}`: {reason}")]
    EnvelopeDecode { field: String, reason: String },
}

impl AssetKind {
    /// Parses a wire-level kind string, rejecting anything outside the
    /// closed `{script, stylesheet}` set with [`DomainError::BadKind`].
    pub fn parse(kind: &str) -> Result<Self, DomainError> {
        match kind {
            "script" => Ok(Self::Script),
            "stylesheet" => Ok(Self::Stylesheet),
            other => Err(DomainError::BadKind {
                found: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_known_kinds() {
        assert_eq!(AssetKind::parse("script"), Ok(AssetKind::Script));
        assert_eq!(AssetKind::parse("stylesheet"), Ok(AssetKind::Stylesheet));
    }

    #[test]
    fn parse_rejects_unknown_kind() {
        let err = AssetKind::parse("font").unwrap_err();
        assert_eq!(
            err,
            DomainError::BadKind {
                found: "font".to_string()
            }
        );
    }
}
