use std::collections::HashMap;

use crate::definitions::Definitions;
use crate::lexical::{is_ident_continue, is_ident_start};

/// Where an expression sits; decides how a bare `=` is read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ExprContext {
    /// A whole statement: a spaced top-level `=` is an assignment.
    Statement,
    /// `if`/`elseif`/`while` condition: every `=` compares.
    Condition,
    /// Returned value: every `=` compares.
    Return,
    /// `for` bounds.
    LoopBound,
}

impl ExprContext {
    pub(crate) fn starts_after_keyword(self) -> bool {
        !matches!(self, ExprContext::Statement)
    }
}

/// Word and glyph substitutions applied outside string literals.
#[derive(Clone, Debug)]
pub(crate) struct OperatorTable {
    words: HashMap<String, &'static str>,
    glyphs: Vec<(char, &'static str)>,
}

impl OperatorTable {
    pub(crate) fn new(defs: &Definitions) -> Self {
        let words = defs
            .substitutions()
            .map(|(name, lua)| (name.to_lowercase(), lua))
            .collect();
        let glyphs = defs
            .symbols()
            .iter()
            .filter_map(|symbol| {
                let mut chars = symbol.glyph.chars();
                let glyph = chars.next()?;
                chars.next().is_none().then_some((glyph, symbol.lua))
            })
            .collect();
        Self { words, glyphs }
    }

    pub(crate) fn substitute(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut chars = text.char_indices().peekable();
        let mut quote: Option<char> = None;
        let mut escaped = false;
        let mut prev: Option<char> = None;

        while let Some((idx, ch)) = chars.next() {
            if let Some(open) = quote {
                out.push(ch);
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == open {
                    quote = None;
                }
                prev = Some(ch);
                continue;
            }
            if ch == '"' || ch == '\'' {
                quote = Some(ch);
                out.push(ch);
                prev = Some(ch);
                continue;
            }
            if is_ident_start(ch) && !prev.is_some_and(|p| is_ident_continue(p) || p == '.') {
                let mut end = idx + ch.len_utf8();
                while let Some(&(next_idx, next)) = chars.peek() {
                    if !is_ident_continue(next) {
                        break;
                    }
                    end = next_idx + next.len_utf8();
                    chars.next();
                }
                let word = &text[idx..end];
                match self.words.get(&word.to_lowercase()) {
                    Some(lua) => out.push_str(lua),
                    None => out.push_str(word),
                }
                prev = word.chars().next_back();
                continue;
            }
            match self.glyphs.iter().find(|(glyph, _)| *glyph == ch) {
                Some((_, lua)) => out.push_str(lua),
                None => out.push(ch),
            }
            prev = Some(ch);
        }
        out
    }
}

/// `name =` directly after `{` or `,` is a table field key.
fn is_field_key(before: &str) -> bool {
    let trimmed = before.trim_end();
    let word_len: usize = trimmed
        .chars()
        .rev()
        .take_while(|ch| is_ident_continue(*ch))
        .map(char::len_utf8)
        .sum();
    if word_len == 0 {
        return false;
    }
    let rest = trimmed[..trimmed.len() - word_len].trim_end();
    rest.ends_with('{') || rest.ends_with(',')
}

/// Rewrites comparison `=` into `==`, leaving `==`, `~=`, `<=`, `>=`, table
/// field keys and the statement's own assignment untouched.
pub(crate) fn disambiguate_equality(text: &str, ctx: ExprContext) -> String {
    let has_arrow = text.contains('←');
    let mut allow_assignment = ctx == ExprContext::Statement && !has_arrow;
    let mut out = String::with_capacity(text.len() + 8);
    let mut openers: Vec<char> = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let chars: Vec<(usize, char)> = text.char_indices().collect();

    let mut i = 0usize;
    while i < chars.len() {
        let (idx, ch) = chars[i];
        if let Some(open) = quote {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open {
                quote = None;
            }
            i += 1;
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' | '[' | '{' => openers.push(ch),
            ')' | ']' | '}' => {
                openers.pop();
            }
            '=' => {
                let prev = i.checked_sub(1).map(|p| chars[p].1);
                let next = chars.get(i + 1).map(|(_, c)| *c);
                if next == Some('=') {
                    out.push_str("==");
                    i += 2;
                    continue;
                }
                if prev.is_some_and(|p| matches!(p, '<' | '>' | '~' | '!' | '=')) {
                    out.push('=');
                    i += 1;
                    continue;
                }
                let before = &text[..idx];
                if openers.last() == Some(&'{') && is_field_key(before) {
                    out.push('=');
                    i += 1;
                    continue;
                }
                let spaced = prev.is_some_and(char::is_whitespace)
                    && next.is_some_and(char::is_whitespace);
                if allow_assignment && openers.is_empty() && spaced {
                    allow_assignment = false;
                    out.push('=');
                    i += 1;
                    continue;
                }
                out.push_str("==");
                i += 1;
                continue;
            }
            _ => {}
        }
        out.push(ch);
        i += 1;
    }
    out
}

/// `←` becomes Lua assignment and a bare `lire()` the auto-coercing reader.
pub(crate) fn rewrite_assignment_arrow(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if let Some(open) = quote {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                out.push(ch);
            }
            '←' => {
                while out.ends_with(char::is_whitespace) {
                    out.pop();
                }
                out.push_str(" = ");
                while chars.peek().is_some_and(|(_, next)| next.is_whitespace()) {
                    chars.next();
                }
            }
            'l' | 'L'
                if !out.chars().next_back().is_some_and(|p| is_ident_continue(p) || p == '.')
                    && is_empty_read_call(&text[idx..]) =>
            {
                let len = text[idx..].find(')').map(|close| close + 1).unwrap_or(0);
                out.push_str("__psc_lire()");
                while chars.peek().is_some_and(|(next_idx, _)| *next_idx < idx + len) {
                    chars.next();
                }
            }
            _ => out.push(ch),
        }
    }
    out
}

fn is_empty_read_call(text: &str) -> bool {
    let Some(prefix) = text.get(..4) else {
        return false;
    };
    if !prefix.eq_ignore_ascii_case("lire") {
        return false;
    }
    let rest = text[4..].trim_start();
    let Some(inner) = rest.strip_prefix('(') else {
        return false;
    };
    inner.trim_start().starts_with(')')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_equality_becomes_comparison() {
        assert_eq!(
            disambiguate_equality("a = b and c <= d", ExprContext::Condition),
            "a == b and c <= d"
        );
    }

    #[test]
    fn statement_keeps_first_spaced_assignment() {
        assert_eq!(
            disambiguate_equality("x = a=b", ExprContext::Statement),
            "x = a==b"
        );
        assert_eq!(
            disambiguate_equality("x ← a = b", ExprContext::Statement),
            "x ← a == b"
        );
    }

    #[test]
    fn table_field_keys_are_protected() {
        assert_eq!(
            disambiguate_equality("p ← {x = 3, y = a = b}", ExprContext::Statement),
            "p ← {x = 3, y = a == b}"
        );
    }

    #[test]
    fn keywords_skip_strings_and_fields() {
        let table = OperatorTable::new(&Definitions::standard());
        assert_eq!(
            table.substitute("si vrai et \"et\" ou p.non"),
            "si true and \"et\" or p.non"
        );
        assert_eq!(table.substitute("a ≠ b ÷ 2"), "a ~= b // 2");
    }

    #[test]
    fn arrow_and_read() {
        assert_eq!(rewrite_assignment_arrow("x←lire()"), "x = __psc_lire()");
        assert_eq!(rewrite_assignment_arrow("s ← \"a ← b\""), "s = \"a ← b\"");
    }
}
