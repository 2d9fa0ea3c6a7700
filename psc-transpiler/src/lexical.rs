use regex::Regex;

use crate::definitions::Definitions;

const MAX_MASK_PASSES: usize = 16;

pub fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

pub fn is_ident_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// A bare identifier: no indexing, no field access, no operator.
pub fn is_simple_identifier(text: &str) -> bool {
    let mut chars = text.trim().chars();
    match chars.next() {
        Some(first) if is_ident_start(first) => chars.all(is_ident_continue),
        _ => false,
    }
}

pub fn leading_indentation(line: &str) -> &str {
    let trimmed = line.trim_start();
    &line[..line.len() - trimmed.len()]
}

/// Returns the byte index of the `)` closing the `(` at `open`.
///
/// Quoted parentheses are counted like any other.
pub fn find_matching_paren(text: &str, open: usize) -> Option<usize> {
    if text.as_bytes().get(open) != Some(&b'(') {
        return None;
    }
    let mut depth = 0usize;
    for (idx, ch) in text[open..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits an argument list on top-level commas.
pub fn smart_split_args(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in text.chars() {
        if let Some(open_quote) = quote {
            current.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open_quote {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                current.push(ch);
            }
            '(' | '[' | '{' => {
                depth += 1;
                current.push(ch);
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                out.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    out.push(current.trim().to_string());
    out
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CommentState {
    #[default]
    Normal,
    InBlock,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CleanedLine {
    pub text: String,
    /// Text following `//`, untouched.
    pub line_comment: Option<String>,
    pub state: CommentState,
}

/// Length in bytes of a `'x'` or `'\x'` character literal starting at `start`.
fn char_literal_len(text: &str, start: usize) -> Option<usize> {
    let mut chars = text[start..].char_indices().skip(1);
    let (_, first) = chars.next()?;
    let (close_at, close) = if first == '\\' {
        chars.next()?;
        chars.next()?
    } else {
        chars.next()?
    };
    (close == '\'').then_some(close_at + 1)
}

/// Removes `//` and `/* */` comments from one line, carrying an unterminated
/// block comment over to the next call through `state`.
pub fn clean_line_from_comments(line: &str, state: CommentState) -> CleanedLine {
    let mut text = String::with_capacity(line.len());
    let mut rest = line;

    if state == CommentState::InBlock {
        match rest.find("*/") {
            Some(end) => rest = &rest[end + 2..],
            None => {
                return CleanedLine {
                    text,
                    line_comment: None,
                    state: CommentState::InBlock,
                };
            }
        }
    }

    let mut in_string = false;
    let mut escaped = false;
    let mut idx = 0usize;
    while idx < rest.len() {
        let Some(ch) = rest[idx..].chars().next() else {
            break;
        };
        if in_string {
            text.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            idx += ch.len_utf8();
            continue;
        }
        match ch {
            '"' => {
                in_string = true;
                text.push(ch);
            }
            '\'' => {
                if let Some(len) = char_literal_len(rest, idx) {
                    text.push_str(&rest[idx..idx + len]);
                    idx += len;
                    continue;
                }
                text.push(ch);
            }
            '/' if rest[idx..].starts_with("//") => {
                return CleanedLine {
                    text: text.trim_end().to_string(),
                    line_comment: Some(rest[idx + 2..].to_string()),
                    state: CommentState::Normal,
                };
            }
            '/' if rest[idx..].starts_with("/*") => match rest[idx + 2..].find("*/") {
                Some(end) => {
                    idx += 2 + end + 2;
                    continue;
                }
                None => {
                    return CleanedLine {
                        text: text.trim_end().to_string(),
                        line_comment: None,
                        state: CommentState::InBlock,
                    };
                }
            },
            _ => text.push(ch),
        }
        idx += ch.len_utf8();
    }

    CleanedLine {
        text: text.trim_end().to_string(),
        line_comment: None,
        state: CommentState::Normal,
    }
}

fn blank(out: &mut String, ch: char) {
    for _ in 0..ch.len_utf8() {
        out.push(' ');
    }
}

/// Blanks the contents of string and character literals, keeping the quotes
/// and the byte length of the input.
pub fn mask_strings(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut idx = 0usize;
    while idx < text.len() {
        let Some(ch) = text[idx..].chars().next() else {
            break;
        };
        if ch == '\'' {
            if let Some(len) = char_literal_len(text, idx) {
                out.push('\'');
                for inner in text[idx + 1..idx + len - 1].chars() {
                    blank(&mut out, inner);
                }
                out.push('\'');
                idx += len;
                continue;
            }
            out.push(ch);
            idx += 1;
            continue;
        }
        if ch != '"' {
            out.push(ch);
            idx += ch.len_utf8();
            continue;
        }
        out.push('"');
        idx += 1;
        let mut escaped = false;
        while idx < text.len() {
            let Some(inner) = text[idx..].chars().next() else {
                break;
            };
            idx += inner.len_utf8();
            if escaped {
                escaped = false;
            } else if inner == '\\' {
                escaped = true;
            } else if inner == '"' {
                out.push('"');
                break;
            }
            blank(&mut out, inner);
        }
    }
    out
}

fn mask_field_access_once(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    let mut masking = false;
    let mut started = false;
    for ch in text.chars() {
        if masking {
            if is_ident_continue(ch) && (started || is_ident_start(ch)) {
                blank(&mut out, ch);
                started = true;
                prev = Some(ch);
                continue;
            }
            masking = false;
        }
        if ch == '.'
            && prev.is_some_and(|p| is_ident_continue(p) || p == ')' || p == ']')
        {
            masking = true;
            started = false;
        }
        out.push(ch);
        prev = Some(ch);
    }
    out
}

/// Blanks field names in `obj.field.sub` chains, keeping byte length.
pub fn mask_field_access(text: &str) -> String {
    let mut current = text.to_string();
    for _ in 0..MAX_MASK_PASSES {
        let next = mask_field_access_once(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Canonical name for a declared type; unknown names (composite types) are
/// returned trimmed, case preserved.
pub fn normalize_type(defs: &Definitions, raw: &str) -> String {
    let trimmed = raw.trim();
    let base = trimmed.split(['[', '(']).next().unwrap_or(trimmed);
    defs.canonical_type(base)
        .map(str::to_string)
        .unwrap_or_else(|| trimmed.to_string())
}

/// Replaces typographic double quotes with ASCII ones.
pub fn normalize_quotes(text: &str) -> String {
    text.replace(['\u{201C}', '\u{201D}', '\u{201E}'], "\"")
}

/// Rewrites every call matched by `pattern` (which must end at the opening
/// parenthesis and capture the callee in group 1), innermost call first.
///
/// Calls inside strings and after a `.` are skipped. An unmatched
/// parenthesis stops the scan and leaves the remaining calls untouched.
pub(crate) fn rewrite_calls<F>(text: &str, pattern: &Regex, mut rewrite: F) -> String
where
    F: FnMut(&str, &[String]) -> Option<String>,
{
    let masked = mask_strings(text);
    let starts: Vec<(usize, usize, usize)> = pattern
        .captures_iter(&masked)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?;
            let preceded_by_dot = masked[..whole.start()]
                .chars()
                .next_back()
                .is_some_and(|p| p == '.' || is_ident_continue(p));
            (!preceded_by_dot).then_some((name.start(), name.end(), whole.end() - 1))
        })
        .collect();

    let mut current = text.to_string();
    for (name_start, name_end, open) in starts.into_iter().rev() {
        let masked_now = mask_strings(&current);
        let Some(close) = find_matching_paren(&masked_now, open) else {
            break;
        };
        let name = current[name_start..name_end].to_string();
        let args = smart_split_args(&current[open + 1..close]);
        if let Some(replacement) = rewrite(&name, &args) {
            current.replace_range(name_start..=close, &replacement);
        }
    }
    current
}
