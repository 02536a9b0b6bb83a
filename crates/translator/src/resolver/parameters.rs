//! Parameter serialization: path substitution, the nested-key query-string
//! form, and the percent-encoding applied to the assembled query.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::ResolveError;
use crate::naming;

// Characters that survive percent-encoding of the assembled query string:
// the RFC 3986 unreserved set plus the sub-delimiters that are legal inside
// a path segment. Brackets are escaped, ampersands and equals signs are not.
const QUERY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b':')
    .remove(b'=')
    .remove(b'@');

pub(crate) fn escape_query(query: &str) -> String {
    utf8_percent_encode(query, QUERY_ESCAPE).to_string()
}

/// Replaces the first `{name}` template occurrence with the primitive-cast
/// string of the value.
pub(crate) fn substitute_path_parameter(
    endpoint: &str,
    name: &str,
    value: &serde_json::Value,
) -> String {
    endpoint.replacen(&format!("{{{name}}}"), &naming::cast_to_string(value), 1)
}

/// Serializes a value under a key prefix into `key=value` pairs joined by
/// `&`. Lists and maps flatten with bracketed suffixes: `k[0]=a`,
/// `k[field]=b`, recursively.
pub(crate) fn serialize(value: &serde_json::Value, key: &str) -> Result<String, ResolveError> {
    use serde_json::Value;

    match value {
        Value::String(_) | Value::Bool(_) | Value::Number(_) => {
            Ok(format!("{key}={}", naming::cast_to_string(value)))
        }
        Value::Array(values) => values
            .iter()
            .enumerate()
            .map(|(index, value)| serialize(value, &format!("{key}[{index}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(|parts| parts.join("&")),
        Value::Object(map) => map
            .iter()
            .map(|(name, value)| serialize(value, &format!("{key}[{name}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(|parts| parts.join("&")),
        Value::Null => Err(ResolveError::UnsupportedValue("null")),
    }
}
