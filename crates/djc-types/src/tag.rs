use crate::asset::AssetKind;
use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single HTML attribute value as carried on the wire.
///
/// `Bool(true)` renders as a valueless attribute (`disabled`), `Bool(false)`
/// omits the attribute entirely, and `Str` renders as-is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Str(String),
    Bool(bool),
}

/// Which tag kind a [`TagDescriptor`] carries: `"script"` or `"link"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagName {
    Script,
    Link,
}

/// A server-authored descriptor for one `<script>` or `<link>` element:
/// `{tag, attrs, content}` exactly as it arrives on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TagDescriptor {
    pub tag: TagName,
    #[serde(default)]
    pub attrs: BTreeMap<String, AttrValue>,
    #[serde(default)]
    pub content: String,
}

impl TagDescriptor {
    /// Validates the descriptor's `tag` field matches the expected kind.
    pub fn expect(&self, kind: AssetKind) -> Result<(), DomainError> {
        let matches = match (kind, self.tag) {
            (AssetKind::Script, TagName::Script) => true,
            (AssetKind::Stylesheet, TagName::Link) => true,
            _ => false,
        };
        if matches {
            Ok(())
        } else {
            Err(DomainError::BadTag {
                expected: kind,
                found: self.tag,
            })
        }
    }

    /// The attribute name carrying the asset's source URL for this tag kind:
    /// `src` for scripts, `href` for stylesheets.
    fn url_attr_name(&self) -> &'static str {
        match self.tag {
            TagName::Script => "src",
            TagName::Link => "href",
        }
    }

    /// The descriptor's source URL, if present and a string.
    ///
    /// A descriptor missing this attribute (or carrying a boolean there) is
    /// inline-only.
    pub fn source_url(&self) -> Option<&str> {
        match self.attrs.get(self.url_attr_name()) {
            Some(AttrValue::Str(url)) => Some(url.as_str()),
            _ => None,
        }
    }
}

impl std::fmt::Display for TagName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Script => f.write_str("script"),
            Self::Link => f.write_str("link"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(tag: TagName, attrs: &[(&str, AttrValue)]) -> TagDescriptor {
        TagDescriptor {
            tag,
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            content: String::new(),
        }
    }

    #[test]
    fn expect_accepts_matching_kind() {
        let d = descriptor(TagName::Script, &[]);
        assert!(d.expect(AssetKind::Script).is_ok());
    }

    #[test]
    fn expect_rejects_mismatched_kind() {
        let d = descriptor(TagName::Link, &[]);
        let err = d.expect(AssetKind::Script).unwrap_err();
        assert!(matches!(err, DomainError::BadTag { .. }));
    }

    #[test]
    fn source_url_reads_src_for_script() {
        let d = descriptor(
            TagName::Script,
            &[("src", AttrValue::Str("/a.js".to_string()))],
        );
        assert_eq!(d.source_url(), Some("/a.js"));
    }

    #[test]
    fn source_url_reads_href_for_link() {
        let d = descriptor(
            TagName::Link,
            &[("href", AttrValue::Str("/a.css".to_string()))],
        );
        assert_eq!(d.source_url(), Some("/a.css"));
    }

    #[test]
    fn source_url_absent_when_attr_missing_or_boolean() {
        let inline = descriptor(TagName::Script, &[("defer", AttrValue::Bool(true))]);
        assert_eq!(inline.source_url(), None);
    }

    #[test]
    fn deserializes_wire_schema() {
        let json = r#"{"tag":"script","attrs":{"src":"/a.js","defer":true,"async":false},"content":""}"#;
        let d: TagDescriptor = serde_json::from_str(json).unwrap();
        let expected = descriptor(
            TagName::Script,
            &[
                ("src", AttrValue::Str("/a.js".to_string())),
                ("defer", AttrValue::Bool(true)),
                ("async", AttrValue::Bool(false)),
            ],
        );
        similar_asserts::assert_eq!(d, expected);
    }
}
