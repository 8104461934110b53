//! Escape-sequence parsing for response bodies.
//!
//! This is deliberately a separate, explicitly-invoked step rather than
//! part of execution: callers that also apply a filter/query transform must
//! run that transform first and this one strictly after.

/// Parses backslash escape sequences in `input`.
///
/// Handles `\n`, `\t`, `\r`, `\"`, `\\`, and `\uXXXX` (four hex digits).
/// Unknown escapes and malformed `\u` sequences pass through unchanged.
#[must_use]
pub fn parse_escapes(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.peek() {
            Some('n') => {
                chars.next();
                result.push('\n');
            }
            Some('t') => {
                chars.next();
                result.push('\t');
            }
            Some('r') => {
                chars.next();
                result.push('\r');
            }
            Some('"') => {
                chars.next();
                result.push('"');
            }
            Some('\\') => {
                chars.next();
                result.push('\\');
            }
            Some('u') => {
                let mut lookahead = chars.clone();
                lookahead.next(); // consume 'u'
                let digits: String = lookahead.by_ref().take(4).collect();
                let parsed = (digits.len() == 4)
                    .then(|| u32::from_str_radix(&digits, 16).ok())
                    .flatten()
                    .and_then(char::from_u32);
                if let Some(decoded) = parsed {
                    result.push(decoded);
                    chars = lookahead;
                } else {
                    result.push('\\');
                }
            }
            _ => result.push('\\'),
        }
    }

    result
}
