use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Failure to resolve a `{{ ... }}` placeholder
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExpandError {
    /// Variable is unset and the placeholder has no default
    #[error("environment variable not found: `{0}`")]
    MissingVar(String),
    /// Placeholder key is not of the form `env.NAME`
    #[error("only variables scoped with 'env.' are supported: `{0}`")]
    UnsupportedScope(String),
}

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\{\{\s*(?<key>[a-zA-Z0-9_.]+)\s*(?:\|\s*default\("(?<default>[^"]*)"\))?\s*\}\}"#)
            .expect("placeholder pattern is valid")
    })
}

/// Expand `{{ env.VAR }}` and `{{ env.VAR | default("x") }}` placeholders
///
/// Operates on raw TOML text before deserialization. Comment lines are left
/// untouched.
pub fn expand_env(input: &str) -> Result<String, ExpandError> {
    let mut output = String::with_capacity(input.len());
    for line in input.split_inclusive('\n') {
        output.push_str(&expand_line(line)?);
    }
    Ok(output)
}

fn expand_line(line: &str) -> Result<Cow<'_, str>, ExpandError> {
    if line.trim_start().starts_with('#') || !line.contains("{{") {
        return Ok(Cow::Borrowed(line));
    }

    let mut expanded = String::with_capacity(line.len());
    let mut cursor = 0;
    for captures in placeholder().captures_iter(line) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        expanded.push_str(&line[cursor..whole.start()]);
        expanded.push_str(&resolve(&captures["key"], captures.name("default").map(|m| m.as_str()))?);
        cursor = whole.end();
    }
    expanded.push_str(&line[cursor..]);

    Ok(Cow::Owned(expanded))
}

fn resolve(key: &str, default: Option<&str>) -> Result<String, ExpandError> {
    let var = key
        .strip_prefix("env.")
        .filter(|name| !name.is_empty() && !name.contains('.'))
        .ok_or_else(|| ExpandError::UnsupportedScope(key.to_owned()))?;

    match (std::env::var(var), default) {
        (Ok(value), _) => Ok(value),
        (Err(_), Some(default)) => Ok(default.to_owned()),
        (Err(_), None) => Err(ExpandError::MissingVar(var.to_owned())),
    }
}
