//! User-info decoders.
//!
//! A decoder translates a provider's raw userinfo response body into the canonical
//! [`User`]. Decoders are registered by name in a [`Registry`] and each provider
//! picks one through its configuration.

mod auth0;
mod json;
mod surf;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{decoder_error, DecoderErrorKind, Error};
use crate::user::User;

pub use auth0::Auth0Decoder;
pub use json::JsonDecoder;
pub use surf::SurfDecoder;

/// Name of the generic field-mapping decoder.
pub const JSON: &str = "json";

/// Trait for translating a provider's userinfo payload into a [`User`].
///
/// Implementations must not fail because expected fields are absent; they fail
/// only when the body cannot be parsed as structured data.
pub trait Decoder: Send + Sync {
    fn decode(&self, body: &[u8]) -> Result<User, Error>;
}

/// Name-keyed table of decoders, populated at startup.
#[derive(Clone)]
pub struct Registry {
    decoders: HashMap<String, Arc<dyn Decoder>>,
}

impl Registry {
    /// Create a registry holding only the built-in decoders.
    pub fn new() -> Self {
        let mut registry = Self {
            decoders: HashMap::new(),
        };
        registry.register(JSON, Arc::new(JsonDecoder));
        registry.register("auth0", Arc::new(Auth0Decoder));
        registry.register("oauth0", Arc::new(Auth0Decoder));
        registry.register("surf", Arc::new(SurfDecoder));
        registry
    }

    /// Register a decoder under `name`, replacing any previous one.
    pub fn register(&mut self, name: &str, decoder: Arc<dyn Decoder>) {
        self.decoders.insert(name.to_string(), decoder);
    }

    /// Look up a decoder by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Decoder>, Error> {
        self.decoders.get(name).cloned().ok_or_else(|| {
            decoder_error(
                DecoderErrorKind::UnknownDecoder,
                &format!("unknown user info decoder \"{}\"", name),
            )
            .with_field("decoder", name)
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.decoders.contains_key(name)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a body into a JSON object, the only shape any decoder accepts.
pub(crate) fn parse_object(body: &[u8]) -> Result<Map<String, Value>, Error> {
    let value: Value = serde_json::from_slice(body).map_err(|e| Error {
        source: Some(Box::new(e)),
        error_kind: crate::error::ErrorKind::Decoder(DecoderErrorKind::MalformedPayload),
        fields: Vec::new(),
    })?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(decoder_error(
            DecoderErrorKind::MalformedPayload,
            &format!("expected a JSON object, got {}", json_type(&other)),
        )),
    }
}

/// String claim, or empty when absent or not a string.
pub(crate) fn string_claim(claims: &Map<String, Value>, key: &str) -> String {
    claims
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Identifier claim; numeric ids are rendered in decimal.
pub(crate) fn id_claim(claims: &Map<String, Value>, key: &str) -> String {
    match claims.get(key) {
        Some(Value::Number(number)) => number.to_string(),
        _ => string_claim(claims, key),
    }
}

/// List of string claims; non-string entries are skipped.
pub(crate) fn string_list_claim(claims: &Map<String, Value>, key: &str) -> Vec<String> {
    claims
        .get(key)
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedDecoder;

    impl Decoder for FixedDecoder {
        fn decode(&self, _body: &[u8]) -> Result<User, Error> {
            Ok(User {
                id: "fixed".to_string(),
                ..User::default()
            })
        }
    }

    #[test]
    fn test_builtin_decoders_registered() {
        let registry = Registry::new();
        for name in ["json", "auth0", "oauth0", "surf"] {
            assert!(registry.contains(name), "{} should be registered", name);
        }
    }

    #[test]
    fn test_unknown_decoder() {
        let registry = Registry::new();
        let err = registry.get("ldap").err().unwrap();
        assert_eq!(
            err.error_kind,
            crate::error::ErrorKind::Decoder(DecoderErrorKind::UnknownDecoder)
        );
        assert_eq!(err.field("decoder"), Some("ldap"));
    }

    #[test]
    fn test_register_custom_decoder() {
        let mut registry = Registry::new();
        registry.register("fixed", Arc::new(FixedDecoder));

        let user = registry.get("fixed").unwrap().decode(b"ignored").unwrap();
        assert_eq!(user.id, "fixed");
    }

    #[test]
    fn test_id_claim_accepts_strings_and_numbers() {
        let claims = parse_object(br#"{"a": "x1", "b": 583231, "c": true}"#).unwrap();
        assert_eq!(id_claim(&claims, "a"), "x1");
        assert_eq!(id_claim(&claims, "b"), "583231");
        assert_eq!(id_claim(&claims, "c"), "");
        assert_eq!(id_claim(&claims, "missing"), "");
    }

    #[test]
    fn test_parse_object_rejects_non_objects() {
        assert!(parse_object(b"invalid json").is_err());
        assert!(parse_object(b"[1, 2]").is_err());
        assert!(parse_object(b"\"string\"").is_err());
        assert!(parse_object(b"{}").is_ok());
    }
}
