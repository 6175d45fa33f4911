use crate::error::DomainError;
use crate::tag::TagDescriptor;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

/// The activation envelope exactly as it arrives on the wire: every string
/// field is base64-encoded, including the tag descriptors and JSON data-var
/// payloads nested inside the arrays.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEnvelope {
    #[serde(default, rename = "cssUrls__markAsLoaded")]
    pub css_urls_mark_as_loaded: Vec<String>,
    #[serde(default, rename = "jsUrls__markAsLoaded")]
    pub js_urls_mark_as_loaded: Vec<String>,
    #[serde(default, rename = "cssTags__toFetch")]
    pub css_tags_to_fetch: Vec<String>,
    #[serde(default, rename = "jsTags__toFetch")]
    pub js_tags_to_fetch: Vec<String>,
    #[serde(default)]
    pub component_js_vars: Vec<[String; 3]>,
    #[serde(default)]
    pub component_js_calls: Vec<(String, String, Option<String>)>,
}

/// One `(class_id, data_hash, json_text)` data-var binding, decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JsVar {
    pub class_id: String,
    pub data_hash: String,
    pub json_text: String,
}

/// One `(class_id, instance_id, data_hash?)` activation request, decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JsCall {
    pub class_id: String,
    pub instance_id: String,
    pub data_hash: Option<String>,
}

/// An envelope after every base64 field has been decoded and every nested
/// tag descriptor parsed.
#[derive(Clone, Debug, Default)]
pub struct DecodedEnvelope {
    pub css_urls_mark_as_loaded: Vec<String>,
    pub js_urls_mark_as_loaded: Vec<String>,
    pub css_tags_to_fetch: Vec<TagDescriptor>,
    pub js_tags_to_fetch: Vec<TagDescriptor>,
    pub js_vars: Vec<JsVar>,
    pub js_calls: Vec<JsCall>,
}

fn decode_b64(field: &str, value: &str) -> Result<Vec<u8>, DomainError> {
    BASE64
        .decode(value)
        .map_err(|err| DomainError::EnvelopeDecode {
            field: field.to_string(),
            reason: err.to_string(),
        })
}

fn decode_b64_utf8(field: &str, value: &str) -> Result<String, DomainError> {
    let bytes = decode_b64(field, value)?;
    String::from_utf8(bytes).map_err(|err| DomainError::EnvelopeDecode {
        field: field.to_string(),
        reason: err.to_string(),
    })
}

fn decode_b64_tag(field: &str, value: &str) -> Result<TagDescriptor, DomainError> {
    let text = decode_b64_utf8(field, value)?;
    serde_json::from_str(&text).map_err(|err| DomainError::EnvelopeDecode {
        field: field.to_string(),
        reason: err.to_string(),
    })
}

impl RawEnvelope {
    /// Decode every base64 field, parsing nested tag descriptors and JS-vars
    /// tuples along the way.
    pub fn decode(&self) -> Result<DecodedEnvelope, DomainError> {
        let css_urls_mark_as_loaded = self
            .css_urls_mark_as_loaded
            .iter()
            .map(|v| decode_b64_utf8("cssUrls__markAsLoaded", v))
            .collect::<Result<_, _>>()?;
        let js_urls_mark_as_loaded = self
            .js_urls_mark_as_loaded
            .iter()
            .map(|v| decode_b64_utf8("jsUrls__markAsLoaded", v))
            .collect::<Result<_, _>>()?;
        let css_tags_to_fetch = self
            .css_tags_to_fetch
            .iter()
            .map(|v| decode_b64_tag("cssTags__toFetch", v))
            .collect::<Result<_, _>>()?;
        let js_tags_to_fetch = self
            .js_tags_to_fetch
            .iter()
            .map(|v| decode_b64_tag("jsTags__toFetch", v))
            .collect::<Result<_, _>>()?;
        let js_vars = self
            .component_js_vars
            .iter()
            .map(|[class_id, data_hash, json_text]| {
                Ok(JsVar {
                    class_id: decode_b64_utf8("componentJsVars[].classId", class_id)?,
                    data_hash: decode_b64_utf8("componentJsVars[].dataHash", data_hash)?,
                    json_text: decode_b64_utf8("componentJsVars[].jsonText", json_text)?,
                })
            })
            .collect::<Result<_, DomainError>>()?;
        let js_calls = self
            .component_js_calls
            .iter()
            .map(|(class_id, instance_id, data_hash)| {
                Ok(JsCall {
                    class_id: decode_b64_utf8("componentJsCalls[].classId", class_id)?,
                    instance_id: decode_b64_utf8("componentJsCalls[].instanceId", instance_id)?,
                    data_hash: data_hash
                        .as_deref()
                        .map(|h| decode_b64_utf8("componentJsCalls[].dataHash", h))
                        .transpose()?,
                })
            })
            .collect::<Result<_, DomainError>>()?;

        Ok(DecodedEnvelope {
            css_urls_mark_as_loaded,
            js_urls_mark_as_loaded,
            css_tags_to_fetch,
            js_tags_to_fetch,
            js_vars,
            js_calls,
        })
    }
}

/// Base64-encodes a string, the inverse of the decode helpers above. Used by
/// round-trip tests and by anything constructing envelopes for fixtures.
pub fn encode_b64(value: &str) -> String {
    BASE64.encode(value.as_bytes())
}
