//! URL-encoded parameter serialization for query strings and form bodies.

use std::collections::BTreeMap;

/// Query or form parameters. Keys are unique; the sorted map gives a
/// deterministic serialization order.
pub type HttpParams = BTreeMap<String, String>;

/// Serialize `params` as `k1=v1&k2=v2`, percent-encoding every byte outside
/// `A-Za-z0-9-_.~`. An empty map yields an empty string.
pub fn serialize(params: &HttpParams) -> String {
    let mut out = String::new();
    for (name, value) in params {
        if !out.is_empty() {
            out.push('&');
        }
        out.push_str(&urlencoding::encode(name));
        out.push('=');
        out.push_str(&urlencoding::encode(value));
    }
    out
}

/// Append `params` to `base` as a query string. `base` is returned unchanged
/// when there is nothing to append.
pub fn build_query_url(base: &str, params: &HttpParams) -> String {
    if params.is_empty() {
        return base.to_string();
    }
    format!("{base}?{}", serialize(params))
}
