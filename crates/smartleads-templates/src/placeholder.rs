//! Single-pass `{token}` substitution.
//!
//! Tokens are matched left to right without overlap. A token whose name is
//! not in the value map is copied through verbatim. Substituted values are
//! never rescanned, so a value that itself contains `{other}` comes out
//! unchanged; rendering twice can therefore differ from rendering once.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::sync::LazyLock;

use regex::{Captures, Regex};

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").expect("valid regex"));

/// Replaces every `{name}` in `template` whose `name` is a key of `values`.
///
/// Token names are case-sensitive. An empty map returns the template as is.
#[must_use]
pub fn render<K, V, S>(template: &str, values: &HashMap<K, V, S>) -> String
where
    K: Borrow<str> + Hash + Eq,
    V: AsRef<str>,
    S: BuildHasher,
{
    if values.is_empty() {
        return template.to_string();
    }

    TOKEN_RE
        .replace_all(template, |caps: &Captures<'_>| match values.get(&caps[1]) {
            Some(value) => value.as_ref().to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Distinct token names in `template`, in order of first appearance.
#[must_use]
pub fn tokens(template: &str) -> Vec<&str> {
    let mut seen = Vec::new();
    for caps in TOKEN_RE.captures_iter(template) {
        if let Some(name) = caps.get(1).map(|m| m.as_str()) {
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
    }
    seen
}
