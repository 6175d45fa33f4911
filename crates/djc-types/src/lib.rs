mod asset;
mod envelope;
mod error;
mod identity;
mod tag;

pub use asset::AssetKind;
pub use envelope::{DecodedEnvelope, JsCall, JsVar, RawEnvelope, encode_b64};
pub use error::DomainError;
pub use identity::ActivationIdentity;
pub use tag::{AttrValue, TagDescriptor, TagName};
