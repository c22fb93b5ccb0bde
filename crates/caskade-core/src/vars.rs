//! `{{token}}` substitution for script commands.

use std::collections::HashMap;

/// Replace `{{identifier}}` tokens in `command` with entries from `values`.
///
/// Identifiers are trimmed before lookup. Unknown tokens are left exactly
/// as written: a variable the caller forgot to supply should surface as
/// literal text in the executed command, not vanish silently.
pub fn substitute(command: &str, values: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(command.len());
    let mut rest = command;

    while let Some(start) = rest.find("{{") {
        let (before, open) = rest.split_at(start);
        out.push_str(before);
        let body = &open[2..];

        // A token body runs up to the first `}` and must be closed by `}}`.
        match body.find('}') {
            Some(end) if body[end..].starts_with("}}") => {
                let token = &body[..end];
                match values.get(token.trim()) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(token);
                        out.push_str("}}");
                    }
                }
                rest = &body[end + 2..];
            }
            _ => {
                out.push_str("{{");
                rest = body;
            }
        }
    }

    out.push_str(rest);
    out
}
