#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The connection settings consumed by every client constructor.
///
/// A client owns exactly one set of options for its lifetime. Every header in
/// `headers` is attached to every call the client makes, which is how hosted
/// nodes receive their API keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub struct ClientOptions {
    /// Base URI of the node, e.g. `http://localhost:50051`. `https` enables TLS.
    pub uri: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub headers: HashMap<String, String>,
}

impl ClientOptions {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            headers: HashMap::new(),
        }
    }

    /// Adds a header sent with every call, replacing any previous value for `key`.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}
