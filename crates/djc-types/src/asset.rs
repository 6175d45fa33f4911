use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of asset kinds the registry tracks.
///
/// Closed by design: every operation that takes a kind validates against
/// exactly these two variants and nothing else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    Script,
    Stylesheet,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Stylesheet => "stylesheet",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
