//! Helpers for taking type names apart.

/// Bring a type name into the form registry keys are stored in: no
/// whitespace, and no `T::` or `<T as Trait>::` qualifiers.
pub(crate) fn normalize(name: &str) -> String {
    let mut name = name.to_string();
    while let Some(start) = name.find("<T as ") {
        match name[start..].find(">::") {
            Some(end) => name.replace_range(start..start + end + 3, ""),
            None => break,
        }
    }
    let name: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    strip_self_paths(&name)
}

fn strip_self_paths(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut rest = name;
    while let Some(pos) = rest.find("T::") {
        out.push_str(&rest[..pos]);
        let at_token_start = out
            .chars()
            .last()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_'));
        if !at_token_start {
            out.push_str("T::");
        }
        rest = &rest[pos + 3..];
    }
    out.push_str(rest);
    out
}

/// Split on `sep` where it is not nested inside `<>`, `()` or `[]`.
pub(crate) fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

/// `Vec<Foo>` becomes `("Vec", ["Foo"])`.
pub(crate) fn split_generic(name: &str) -> Option<(&str, Vec<&str>)> {
    let open = name.find('<')?;
    let inner = name.strip_suffix('>')?.get(open + 1..)?;
    Some((&name[..open], split_top_level(inner, ',')))
}
