/// Writes each value through `f`, pushing `separator` between non empty outputs.
pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Escapes a value to use it in a LIKE pattern without unexpected wildcards.
///
/// Add the wildcards you need after escaping:
/// ```rust
/// let pattern = format!("{}%", keel_core::escape_like("50%_off"));
/// assert_eq!(pattern, r"50\%\_off%");
/// ```
pub fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 4);
    for c in value.chars() {
        if c == '%' || c == '_' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Backtick quotes an identifier, doubling the inner backticks.
pub fn write_identifier_quoted(out: &mut String, value: &str) {
    out.push('`');
    let mut position = 0;
    for (i, c) in value.char_indices() {
        if c == '`' {
            out.push_str(&value[position..i]);
            out.push_str("``");
            position = i + 1;
        }
    }
    out.push_str(&value[position..]);
    out.push('`');
}

pub fn quote_identifier(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    write_identifier_quoted(&mut out, value);
    out
}

/// Longest prefix of `value` not exceeding `len` bytes that ends on a char boundary.
pub fn truncate_at(value: &str, len: usize) -> &str {
    if value.len() <= len {
        return value;
    }
    let mut end = len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            $crate::truncate_at(&$query, 497).trim_end(),
            if $query.len() > 497 { "..." } else { "" },
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting() {
        assert_eq!(quote_identifier("code"), "`code`");
        assert_eq!(quote_identifier("we`ird"), "`we``ird`");
    }

    #[test]
    fn like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("a%b_c"), r"a\%b\_c");
    }

    #[test]
    fn truncate() {
        assert_eq!(truncate_at("short", 497), "short");
        assert_eq!(truncate_at("àèì", 3), "à");
        let long = "x".repeat(600);
        assert_eq!(format!("{}", truncate_long!(long)).len(), 500);
    }

    #[test]
    fn separated() {
        let mut out = String::from("(");
        separated_by(&mut out, ["a", "b", "c"], |out, v| out.push_str(v), ", ");
        out.push(')');
        assert_eq!(out, "(a, b, c)");
    }
}
