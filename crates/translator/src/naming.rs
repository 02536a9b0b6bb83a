//! Name derivation: GraphQL identifiers out of OpenAPI refs, titles, paths
//! and parameter names.

use inflector::Inflector;
use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new("[^a-zA-Z0-9]+").unwrap());

// Matches an `{id}`-style path template variable: braced content ending in
// id, name or key.
static ID_TEMPLATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\{.*(id|name|key)\}$").unwrap());

/// Strips everything that is not valid inside a GraphQL identifier.
pub fn sanitize(s: &str) -> String {
    NON_ALPHANUMERIC.replace_all(s, "").into_owned()
}

pub fn to_pascal_case(s: &str) -> String {
    sanitize(&s.to_pascal_case())
}

pub fn to_camel_case(s: &str) -> String {
    sanitize(&s.to_camel_case())
}

/// Derives a resource name from a URL path, for operations and schemas that
/// don't carry one themselves.
///
/// Template segments are dropped, the other segments are title-cased and
/// concatenated. A segment immediately followed by an `{id}`/`{name}`/`{key}`
/// variable, or by the variable spelling its own singular form, is
/// singularised: `/pets/{id}` names `Pet`, `/pets` names `Pets`.
pub fn infer_resource_name_from_path(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').collect();
    let mut result = String::new();

    for (i, part) in parts.iter().enumerate() {
        if part.starts_with('{') {
            continue;
        }
        let singularise = parts
            .get(i + 1)
            .filter(|next| !next.is_empty())
            .is_some_and(|next| ID_TEMPLATE.is_match(next) || is_singular_template(part, next));
        if singularise {
            result.push_str(&part.to_singular().to_pascal_case());
        } else {
            result.push_str(&part.to_pascal_case());
        }
    }

    result
}

fn is_singular_template(part: &str, next: &str) -> bool {
    *next == format!("{{{}}}", part.to_singular())
}

/// String form of a primitive JSON value, as it appears in a URL.
///
/// Anything that is not a string, boolean or number casts to the empty
/// string.
pub fn cast_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}
