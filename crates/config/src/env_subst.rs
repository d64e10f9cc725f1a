//! `${VAR}` expansion applied to the raw config text before parsing.

/// Expand `${VAR}` from the process environment. Unset variables and
/// malformed placeholders stay in the text untouched.
pub fn substitute_env(input: &str) -> String {
    expand(input, |name| std::env::var(name).ok())
}

/// Letters, digits and `_`, at least one.
fn is_var_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn expand(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find("${") {
        out.push_str(&rest[..open]);
        let body = &rest[open + 2..];
        let Some(close) = body.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let name = &body[..close];
        match is_var_name(name).then(|| lookup(name)).flatten() {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[open..open + close + 3]),
        }
        rest = &body[close + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_api_key_placeholder() {
        let lookup = |name: &str| match name {
            "DEEPSEEK_API_KEY" => Some("sk-test".to_string()),
            _ => None,
        };
        assert_eq!(
            expand("api_key = \"${DEEPSEEK_API_KEY}\"", lookup),
            "api_key = \"sk-test\""
        );
    }

    #[test]
    fn leaves_unknown_var() {
        let lookup = |_: &str| None;
        assert_eq!(
            expand("${BEELINE_NONEXISTENT_XYZ}", lookup),
            "${BEELINE_NONEXISTENT_XYZ}"
        );
    }

    #[test]
    fn keeps_keyword_templates_intact() {
        // `{q}` has no leading `$`, so it is not a placeholder.
        let lookup = |_: &str| Some("oops".to_string());
        assert_eq!(
            expand("gh = \"https://github.com/{q}\"", lookup),
            "gh = \"https://github.com/{q}\""
        );
    }

    #[test]
    fn unterminated_placeholder_is_literal() {
        let lookup = |_: &str| Some("x".to_string());
        assert_eq!(expand("a ${B", lookup), "a ${B");
    }

    #[test]
    fn malformed_names_are_not_looked_up() {
        let lookup = |_: &str| Some("x".to_string());
        assert_eq!(expand("${} ${A B} ${OK_1}", lookup), "${} ${A B} x");
    }
}
