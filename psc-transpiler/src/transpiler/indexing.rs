use crate::lexical::{is_ident_continue, smart_split_args};

/// Lua words that may precede a bracket literal.
const LITERAL_LEADING_WORDS: &[&str] = &[
    "return", "and", "or", "not", "then", "do", "else", "in", "local",
];

/// Index of the `]` closing the `[` at `open`, skipping string literals.
fn find_matching_bracket(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (offset, ch) in text[open..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Whether a `[` preceded by `before` indexes a value rather than opening a
/// literal.
fn is_index(before: &str) -> bool {
    let trimmed = before.trim_end();
    let Some(prev) = trimmed.chars().next_back() else {
        return false;
    };
    if prev == ']' || prev == ')' {
        return true;
    }
    if !is_ident_continue(prev) {
        return false;
    }
    let word_len: usize = trimmed
        .chars()
        .rev()
        .take_while(|ch| is_ident_continue(*ch))
        .map(char::len_utf8)
        .sum();
    let word = &trimmed[trimmed.len() - word_len..];
    !LITERAL_LEADING_WORDS.contains(&word)
}

/// Walks every bracket pair innermost first, letting `rewrite` produce the
/// replacement from (is-index, already rewritten contents).
fn rewrite_brackets<F>(text: &str, rewrite: &F) -> String
where
    F: Fn(bool, &str) -> String,
{
    let mut out = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut idx = 0usize;
    while idx < text.len() {
        let Some(ch) = text[idx..].chars().next() else {
            break;
        };
        if let Some(q) = quote {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            idx += ch.len_utf8();
            continue;
        }
        if ch == '"' || ch == '\'' {
            quote = Some(ch);
            out.push(ch);
            idx += 1;
            continue;
        }
        if ch == '[' {
            let Some(close) = find_matching_bracket(text, idx) else {
                out.push_str(&text[idx..]);
                break;
            };
            let inner = rewrite_brackets(&text[idx + 1..close], rewrite);
            out.push_str(&rewrite(is_index(&out), &inner));
            idx = close + 1;
            continue;
        }
        out.push(ch);
        idx += ch.len_utf8();
    }
    out
}

/// `a[i, j]` -> `a[i][j]`
pub(crate) fn flatten_multi_index(text: &str) -> String {
    rewrite_brackets(text, &|is_index, inner| {
        let parts = smart_split_args(inner);
        if is_index && parts.len() > 1 {
            parts.iter().map(|part| format!("[{part}]")).collect()
        } else {
            format!("[{inner}]")
        }
    })
}

/// `a[i]` -> `a[(i) + 1]`; a bracket that indexes nothing becomes a table
/// literal.
pub(crate) fn shift_indices(text: &str) -> String {
    rewrite_brackets(text, &|is_index, inner| {
        if is_index && !inner.trim().is_empty() {
            format!("[({}) + 1]", inner.trim())
        } else {
            format!("{{{inner}}}")
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_index_is_flattened_then_shifted() {
        let flat = flatten_multi_index("m[i, j + 1] = 0");
        assert_eq!(flat, "m[i][j + 1] = 0");
        assert_eq!(shift_indices(&flat), "m[(i) + 1][(j + 1) + 1] = 0");
    }

    #[test]
    fn nested_index_expressions_are_shifted() {
        assert_eq!(shift_indices("t[p[0]]"), "t[(p[(0) + 1]) + 1]");
    }

    #[test]
    fn literals_become_tables() {
        assert_eq!(shift_indices("t = [1, 2, 3]"), "t = {1, 2, 3}");
        assert_eq!(shift_indices("return [a, b]"), "return {a, b}");
        assert_eq!(shift_indices("s = \"[0]\""), "s = \"[0]\"");
    }
}
