/// Escape `%`, `_`, and `escape` itself so `value` matches literally in a
/// `LIKE` pattern using `escape` as its escape character.
#[must_use]
pub fn escape_like(value: &str, escape: char) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '%' || c == '_' || c == escape {
            escaped.push(escape);
        }
        escaped.push(c);
    }

    escaped
}
