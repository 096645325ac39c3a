//! `{field}` placeholder scanning and substitution.
//!
//! A token is `{` + field name + `}` matched literally: no trimming and no
//! case folding. Substitution is a single left-to-right pass, so a rendered
//! value that itself looks like a token is never expanded again.

use crate::Record;
use regex::Regex;
use std::sync::LazyLock;

/// Matches a `{name}` token whose name holds no braces.
static TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([^{}]+)\}").unwrap());

/// Build the literal token for a field name.
pub fn token(name: &str) -> String {
    format!("{{{}}}", name)
}

/// List the field names of every token in `text`, in order, repeats included.
pub fn placeholders_in(text: &str) -> Vec<String> {
    TOKEN_REGEX
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Replace every token naming a field of `record` with the rendered value.
///
/// Returns `None` when no token matched, so callers can skip the write and
/// leave the original text untouched.
pub fn substitute(text: &str, record: &Record) -> Option<String> {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;
    let mut changed = false;

    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match after.find(['{', '}']) {
            Some(close) if after.as_bytes()[close] == b'}' => {
                let name = &after[..close];
                output.push_str(&rest[..open]);
                match record.get(name) {
                    Some(value) => {
                        output.push_str(&value.render());
                        changed = true;
                    }
                    None => {
                        output.push('{');
                        output.push_str(name);
                        output.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            // Unterminated, or another `{` opens first: this brace is literal.
            _ => {
                output.push_str(&rest[..=open]);
                rest = after;
            }
        }
    }
    output.push_str(rest);

    changed.then_some(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldValue;

    fn acme(rev: FieldValue) -> Record {
        Record::new().with("Client", "Acme").with("Rev", rev)
    }

    #[test]
    fn test_substitute_basic() {
        let out = substitute("Client: {Client}, Revenue: {Rev}", &acme(FieldValue::Int(1000)));
        assert_eq!(out.as_deref(), Some("Client: Acme, Revenue: 1000"));
    }

    #[test]
    fn test_substitute_null_renders_empty() {
        let out = substitute("Client: {Client}, Revenue: {Rev}", &acme(FieldValue::Null));
        assert_eq!(out.as_deref(), Some("Client: Acme, Revenue: "));
    }

    #[test]
    fn test_substitute_repeated_tokens() {
        let out = substitute("{Client}/{Client}", &acme(FieldValue::Null));
        assert_eq!(out.as_deref(), Some("Acme/Acme"));
    }

    #[test]
    fn test_unmatched_tokens_pass_through() {
        let out = substitute("{Client} {Project} {client} { Client}", &acme(FieldValue::Null));
        assert_eq!(out.as_deref(), Some("Acme {Project} {client} { Client}"));
    }

    #[test]
    fn test_no_match_returns_none() {
        assert_eq!(substitute("Quarterly {Summary}", &acme(FieldValue::Null)), None);
        assert_eq!(substitute("no tokens at all", &acme(FieldValue::Null)), None);
        assert_eq!(substitute("", &acme(FieldValue::Null)), None);
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let record = Record::new().with("A", "{B}").with("B", "x");
        assert_eq!(substitute("{A}", &record).as_deref(), Some("{B}"));
    }

    #[test]
    fn test_stray_braces() {
        let record = Record::new().with("Client", "Acme");
        assert_eq!(substitute("{{Client}}", &record).as_deref(), Some("{Acme}"));
        assert_eq!(substitute("{ {Client", &record), None);
        assert_eq!(substitute("}{Client}{", &record).as_deref(), Some("}Acme{"));
    }

    #[test]
    fn test_names_with_spaces_and_symbols() {
        let record = Record::new().with("Total GP $", "$9.00").with("Average GP %", "41.0%");
        let out = substitute("GP: {Total GP $} ({Average GP %})", &record);
        assert_eq!(out.as_deref(), Some("GP: $9.00 (41.0%)"));
    }

    #[test]
    fn test_placeholders_in() {
        assert_eq!(
            placeholders_in("{Client_1} and {Revenue_1} and {Client_1} {}"),
            vec!["Client_1", "Revenue_1", "Client_1"]
        );
        assert_eq!(token("Rev"), "{Rev}");
    }
}
