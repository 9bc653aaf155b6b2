//! Opaque, URL-safe cursor tokens.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Errors raised while encoding or decoding a [`Cursor`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    /// The token is not valid unpadded URL-safe base64.
    #[error("cursor is not valid base64: {message}")]
    Encoding {
        /// Decoder failure description.
        message: String,
    },
    /// The decoded bytes do not describe the expected key shape.
    #[error("cursor payload is malformed: {message}")]
    Payload {
        /// Deserialiser failure description.
        message: String,
    },
    /// The key could not be serialised.
    #[error("cursor key could not be serialised: {message}")]
    Serialize {
        /// Serialiser failure description.
        message: String,
    },
}

/// Keyset position carried between pages.
///
/// The token handed to clients is the JSON form of `K` encoded as unpadded
/// URL-safe base64, so clients must treat it as opaque.
///
/// # Examples
/// ```
/// use pagination::Cursor;
///
/// let token = Cursor::new((42_i64, "b".to_owned())).encode().expect("encode");
/// let decoded: Cursor<(i64, String)> = Cursor::decode(&token).expect("decode");
/// assert_eq!(decoded.key(), &(42, "b".to_owned()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor<K> {
    key: K,
}

impl<K> Cursor<K> {
    /// Wrap an ordering key.
    pub const fn new(key: K) -> Self {
        Self { key }
    }

    /// Borrow the ordering key.
    pub const fn key(&self) -> &K {
        &self.key
    }

    /// Consume the cursor, returning the ordering key.
    pub fn into_inner(self) -> K {
        self.key
    }
}

impl<K: Serialize> Cursor<K> {
    /// Encode the cursor as an opaque token.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::Serialize`] when `K` cannot be represented as
    /// JSON (for example a map with non-string keys).
    pub fn encode(&self) -> Result<String, CursorError> {
        let bytes = serde_json::to_vec(&self.key).map_err(|err| CursorError::Serialize {
            message: err.to_string(),
        })?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}

impl<K: DeserializeOwned> Cursor<K> {
    /// Decode a token previously produced by [`Cursor::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::Encoding`] for invalid base64 and
    /// [`CursorError::Payload`] when the payload does not match `K`.
    pub fn decode(token: &str) -> Result<Self, CursorError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|err| CursorError::Encoding {
                message: err.to_string(),
            })?;
        let key = serde_json::from_slice(&bytes).map_err(|err| CursorError::Payload {
            message: err.to_string(),
        })?;
        Ok(Self { key })
    }
}
