//! Placeholder substitution.
//! Replaces `${name}` tokens with bound variable values. Substitution is a
//! single textual pass: inserted values are never scanned again.

use regex::{Captures, Regex};
use std::path::Path;
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::variables::Variables;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^{}\s]+)\}").expect("placeholder pattern is valid"));

/// What to do with a placeholder that has no bound value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnboundPolicy {
    /// Leave the token untouched.
    Keep,
    /// Fail with [`Error::UnboundVariable`].
    Fail,
}

/// Dotted names (`project.version`, `java.release.version`) are build tool
/// properties, not template variables, and are kept when unbound under
/// either policy.
pub fn is_build_property(name: &str) -> bool {
    name.contains('.')
}

/// Names of all placeholders in `content`, in order of appearance.
pub fn placeholders(content: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(content)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Substitutes every bound placeholder in `content`.
///
/// `source` only names the template in errors.
pub fn substitute(
    content: &str,
    variables: &Variables,
    policy: UnboundPolicy,
    source: &Path,
) -> Result<String> {
    if policy == UnboundPolicy::Fail {
        if let Some(name) = placeholders(content)
            .into_iter()
            .find(|name| variables.get(name).is_none() && !is_build_property(name))
        {
            return Err(Error::UnboundVariable {
                name: name.to_string(),
                path: source.display().to_string(),
            });
        }
    }

    let rendered = PLACEHOLDER.replace_all(content, |caps: &Captures| match variables.get(&caps[1]) {
        Some(value) => value.to_string(),
        None => caps[0].to_string(),
    });
    Ok(rendered.into_owned())
}
