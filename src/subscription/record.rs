//! Proxy record extraction and field coercion.
//!
//! Upstream documents are loosely typed: a port may arrive as an integer or
//! a quoted string, `tls` as a bool or the text `"true"`. Each recognized key
//! is coerced once here — native typed value preferred, rendered text as the
//! fallback — so the rest of the pipeline works with plain Rust types.

use serde_yaml::{Mapping, Value};

use crate::subscription::error::ConvertError;

/// One proxy entry from the upstream document.
///
/// Fields default to empty/zero when the document omits them; whether that is
/// acceptable is decided by validation, not here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProxyRecord {
    pub name: String,
    pub username: String,
    pub password: String,
    pub server: String,
    pub port: i64,
    pub sni: String,
    pub tls: bool,
    /// The document's `type` key.
    pub kind: String,
}

impl ProxyRecord {
    /// Extracts the recognized keys from one mapping element.
    ///
    /// Unknown keys are ignored. A `port` or `tls` value that cannot be
    /// coerced is a fatal error for the whole batch.
    pub fn from_mapping(mapping: &Mapping) -> Result<Self, ConvertError> {
        let mut record = Self::default();
        for (key, value) in mapping {
            let Some(key) = key.as_str() else { continue };
            match key.trim() {
                "name" => record.name = scalar_text(value),
                "username" => record.username = scalar_text(value),
                "password" => record.password = scalar_text(value),
                "server" => record.server = scalar_text(value),
                "sni" => record.sni = scalar_text(value),
                "port" => {
                    record.port =
                        scalar_int(value).map_err(|reason| field_error("port", &reason))?
                }
                "tls" => {
                    record.tls =
                        scalar_bool(value).map_err(|reason| field_error("tls", &reason))?
                }
                "type" => record.kind = scalar_text(value),
                _ => {} // unknown keys are ignored
            }
        }
        Ok(record)
    }
}

fn field_error(key: &str, reason: &str) -> ConvertError {
    ConvertError::malformed(format!("value for key `{key}`: {reason}"))
}

/// String coercion: native strings are trimmed, other scalars render to
/// text, null and collections normalize to the empty string (the record is
/// then rejected by required-field validation rather than killing the batch).
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn scalar_int(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(n) => n.as_i64().ok_or_else(|| format!("`{n}` is not an integer")),
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|err| format!("`{}`: {err}", text.trim())),
        other => Err(format!("{} is not an integer", type_name(other))),
    }
}

fn scalar_bool(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(text) => text
            .trim()
            .parse::<bool>()
            .map_err(|_| format!("`{}` is not a boolean", text.trim())),
        other => Err(format!("{} is not a boolean", type_name(other))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(yaml: &str) -> Mapping {
        let value: Value = serde_yaml::from_str(yaml).unwrap();
        value.as_mapping().unwrap().clone()
    }

    #[test]
    fn extracts_typed_fields() {
        let record = ProxyRecord::from_mapping(&mapping(
            "username: user\npassword: pass\nserver: a.example\nport: 4433\ntls: true\ntype: http\nsni: s1\nname: home\n",
        ))
        .unwrap();
        assert_eq!(record.username, "user");
        assert_eq!(record.port, 4433);
        assert!(record.tls);
        assert_eq!(record.kind, "http");
        assert_eq!(record.name, "home");
    }

    #[test]
    fn string_port_and_tls_are_coerced() {
        let record =
            ProxyRecord::from_mapping(&mapping("port: ' 4433 '\ntls: 'true'\n")).unwrap();
        assert_eq!(record.port, 4433);
        assert!(record.tls);
    }

    #[test]
    fn numeric_scalars_render_into_string_fields() {
        let record = ProxyRecord::from_mapping(&mapping("username: 12345\nsni: true\n")).unwrap();
        assert_eq!(record.username, "12345");
        assert_eq!(record.sni, "true");
    }

    #[test]
    fn null_and_collections_normalize_to_empty_strings() {
        let record =
            ProxyRecord::from_mapping(&mapping("username: null\nserver: [a, b]\n")).unwrap();
        assert_eq!(record.username, "");
        assert_eq!(record.server, "");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let record =
            ProxyRecord::from_mapping(&mapping("server: a.example\nudp: true\nextra: {x: 1}\n"))
                .unwrap();
        assert_eq!(record.server, "a.example");
    }

    #[test]
    fn unparseable_port_is_fatal() {
        let err = ProxyRecord::from_mapping(&mapping("port: not-a-number\n")).unwrap_err();
        assert!(matches!(err, ConvertError::Malformed(_)));
        assert!(err.to_string().contains("port"));

        let err = ProxyRecord::from_mapping(&mapping("port: 44.5\n")).unwrap_err();
        assert!(matches!(err, ConvertError::Malformed(_)));
    }

    #[test]
    fn unparseable_tls_is_fatal() {
        let err = ProxyRecord::from_mapping(&mapping("tls: maybe\n")).unwrap_err();
        assert!(matches!(err, ConvertError::Malformed(_)));
        assert!(err.to_string().contains("tls"));
    }
}
