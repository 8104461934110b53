//! Pattern extraction for `{{name}}` placeholders and `$(command)` shell
//! expressions.
//!
//! Both patterns are compiled once at first use and shared by every
//! resolution call.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)]
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.\-]*)\s*\}\}")
        .expect("placeholder pattern is valid")
});

#[allow(clippy::expect_used)]
static SHELL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\(([^)]*)\)").expect("shell pattern is valid"));

/// A parsed placeholder reference in a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderRef {
    /// The variable name (whitespace trimmed, without `{{ }}`).
    pub name: String,
    /// Byte range of the full `{{...}}` token in the original string.
    pub span: Range<usize>,
}

/// A parsed shell expression in a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellRef {
    /// The command text (without `$(` `)`).
    pub command: String,
    /// Byte range of the full `$(...)` token in the original string.
    pub span: Range<usize>,
}

/// Extracts all `{{name}}` references with their spans.
///
/// Unbalanced braces produce no reference; the surrounding text is left for
/// the caller to pass through untouched.
#[must_use]
pub fn placeholder_refs(input: &str) -> Vec<PlaceholderRef> {
    PLACEHOLDER_RE
        .captures_iter(input)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?.as_str().to_string();
            Some(PlaceholderRef {
                name,
                span: whole.start()..whole.end(),
            })
        })
        .collect()
}

/// Extracts all `$(command)` expressions with their spans.
///
/// Nesting is not supported; an unbalanced `$(` never matches and stays
/// literal text.
#[must_use]
pub fn shell_refs(input: &str) -> Vec<ShellRef> {
    SHELL_RE
        .captures_iter(input)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let command = caps.get(1)?.as_str().to_string();
            Some(ShellRef {
                command,
                span: whole.start()..whole.end(),
            })
        })
        .collect()
}

/// Returns true if the input contains either pattern.
#[must_use]
pub fn has_substitutions(input: &str) -> bool {
    PLACEHOLDER_RE.is_match(input) || SHELL_RE.is_match(input)
}
