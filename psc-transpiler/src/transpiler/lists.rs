use std::sync::OnceLock;

use regex::Regex;

use crate::lexical::{
    find_matching_paren, is_ident_continue, is_simple_identifier, mask_strings, rewrite_calls,
    smart_split_args,
};

/// Words after which a parenthesis groups a condition or operand, never a list.
const GROUPING_WORDS: &[&str] = &[
    "si", "sinon", "tant", "que", "pour", "retourner", "retourne", "non", "et", "ou", "mod",
    "alors", "faire", "if", "elseif", "while", "for", "return", "function", "local", "not",
    "and", "or", "then", "do", "else",
];

fn is_simple_atom(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    if is_simple_identifier(text) || text.starts_with("__psc_liste_from_table(") {
        return true;
    }
    if text.len() >= 2
        && ((text.starts_with('"') && text.ends_with('"'))
            || (text.starts_with('\'') && text.ends_with('\''))
            || (text.starts_with('{') && text.ends_with('}')))
    {
        return true;
    }
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty()
        && digits.chars().all(|ch| ch.is_ascii_digit() || ch == '.')
        && digits.chars().next().is_some_and(|ch| ch.is_ascii_digit())
}

/// Whether a `(` preceded by `before` may open a list literal holding
/// `items` elements. Directly after a control keyword only a tuple of two or
/// more items is a list; `(x)` there stays a grouping.
fn may_open_list(before: &str, after_keyword: bool, items: usize) -> bool {
    let trimmed = before.trim_end();
    let Some(prev) = trimmed.chars().next_back() else {
        return !after_keyword || items > 1;
    };
    if is_ident_continue(prev) {
        return false;
    }
    if prev == ')' || prev == ']' {
        return false;
    }
    if prev == '>' {
        return trimmed.ends_with("->");
    }
    matches!(prev, '=' | '←' | '→' | ',' | '(' | '[' | '{' | ':' | ';')
}

fn preceding_word(before: &str) -> Option<String> {
    let trimmed = before.trim_end();
    let start = trimmed
        .char_indices()
        .rev()
        .take_while(|(_, ch)| is_ident_continue(*ch))
        .last()
        .map(|(index, _)| index)?;
    Some(trimmed[start..].to_lowercase())
}

/// `(a, b, c)` and `(x)` outside a call become linked-list literals;
/// `(a + b)` stays an arithmetic group.
///
/// `grouping_start` marks text that directly follows a control keyword, so a
/// parenthesis at its very start is a grouping.
pub(crate) fn transform_paren_literals(text: &str, grouping_start: bool) -> String {
    let masked = mask_strings(text);
    let mut out = String::with_capacity(text.len());
    let mut idx = 0usize;
    while idx < text.len() {
        let Some(ch) = masked[idx..].chars().next() else {
            break;
        };
        if ch == '"' || ch == '\'' {
            let close = masked[idx + 1..]
                .find(ch)
                .map(|offset| idx + 1 + offset)
                .unwrap_or(text.len() - 1);
            out.push_str(&text[idx..=close]);
            idx = close + 1;
            continue;
        }
        if ch != '(' {
            out.push_str(&text[idx..idx + ch.len_utf8()]);
            idx += ch.len_utf8();
            continue;
        }
        let Some(close) = find_matching_paren(&masked, idx) else {
            out.push_str(&text[idx..]);
            break;
        };
        let before = &text[..idx];
        let inner = transform_paren_literals(&text[idx + 1..close], false);
        let is_grouping_word = preceding_word(before)
            .is_some_and(|word| GROUPING_WORDS.contains(&word.as_str()));
        let args = smart_split_args(&inner);
        let is_list = !is_grouping_word
            && may_open_list(before, grouping_start, args.len())
            && (args.len() > 1 || (args.len() == 1 && is_simple_atom(&args[0])));
        if is_list {
            out.push_str(&format!("__psc_liste_from_table({{{}}})", args.join(", ")));
        } else {
            out.push('(');
            out.push_str(&inner);
            out.push(')');
        }
        idx = close + 1;
    }
    out
}

fn adt_constructor() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(listeSym|liste|pile|file|Table)\s*\(").expect("adt constructor pattern")
    })
}

fn table_pair(arg: &str) -> String {
    let split = arg
        .split_once('→')
        .or_else(|| arg.split_once("->"));
    match split {
        Some((key, value)) => format!("{}, {}", key.trim(), value.trim()),
        None => arg.to_string(),
    }
}

/// `liste(..)`, `listeSym(..)`, `pile(..)`, `file(..)` and `Table(k → v, ..)`
/// become runtime constructor calls.
pub(crate) fn transform_adt_constructors(text: &str) -> String {
    rewrite_calls(text, adt_constructor(), |name, args| {
        let joined = args.join(", ");
        let lowered = name.to_lowercase();
        let call = match (lowered.as_str(), args.is_empty()) {
            ("liste", _) => format!("__psc_liste_from_table({{{joined}}})"),
            ("listesym", _) => format!("__psc_listesym_from_table({{{joined}}})"),
            ("pile", true) => "__psc_pile_vide()".to_string(),
            ("pile", false) => format!("__psc_pile_from_values({{{joined}}})"),
            ("file", true) => "__psc_file_vide()".to_string(),
            ("file", false) => format!("__psc_file_from_values({{{joined}}})"),
            ("table", true) => "__psc_table_vide()".to_string(),
            ("table", false) => {
                let pairs: Vec<String> = args.iter().map(|arg| table_pair(arg)).collect();
                format!("__psc_table_from_pairs({})", pairs.join(", "))
            }
            _ => return None,
        };
        Some(call)
    })
}
