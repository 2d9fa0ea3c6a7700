use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::lexical::{
    CommentState, clean_line_from_comments, is_ident_continue, is_simple_identifier,
    rewrite_calls, smart_split_args,
};

/// Words after which `<` opens a literal even though they are identifiers.
const LITERAL_LEADING_WORDS: &[&str] = &[
    "retourner",
    "retourne",
    "return",
    "et",
    "ou",
    "non",
    "and",
    "or",
    "not",
    "alors",
    "then",
    "faire",
    "do",
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CompositeField {
    pub name: String,
    pub declared_type: String,
}

/// A record type declared as `Name = <field: type, ...>`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CompositeType {
    pub name: String,
    pub fields: Vec<CompositeField>,
}

impl CompositeType {
    /// Table literal assigning `args` to the fields in declaration order.
    /// Missing arguments become `nil`.
    pub fn table_literal(&self, args: &[String]) -> String {
        let assignments: Vec<String> = self
            .fields
            .iter()
            .enumerate()
            .map(|(index, field)| {
                let value = args
                    .get(index)
                    .map(String::as_str)
                    .filter(|value| !value.is_empty())
                    .unwrap_or("nil");
                format!("{} = {}", field.name, value)
            })
            .collect();
        format!("{{{}}}", assignments.join(", "))
    }
}

fn declaration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*([\p{L}_][\p{L}0-9_]*)\s*(?:=\s*)?<\s*(.+?)\s*>\s*$")
            .expect("composite declaration pattern")
    })
}

/// Parses `Name = <field: type, ...>`; every field needs a name and a type.
pub fn parse_declaration(line: &str) -> Option<CompositeType> {
    let caps = declaration_pattern().captures(line)?;
    let name = caps.get(1)?.as_str().to_string();
    let mut fields = Vec::new();
    for raw in smart_split_args(caps.get(2)?.as_str()) {
        let (field, ty) = raw.split_once(':')?;
        let field = field.trim();
        let ty = ty.trim();
        if !is_simple_identifier(field) || ty.is_empty() {
            return None;
        }
        fields.push(CompositeField {
            name: field.to_string(),
            declared_type: ty.to_string(),
        });
    }
    if fields.is_empty() {
        return None;
    }
    Some(CompositeType { name, fields })
}

pub fn is_declaration(line: &str) -> bool {
    parse_declaration(line).is_some()
}

/// Record types declared in one source text, in declaration order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CompositeRegistry {
    types: Vec<CompositeType>,
    #[serde(skip)]
    constructor_pattern: Option<Regex>,
}

impl CompositeRegistry {
    pub fn collect(source: &str) -> Self {
        let mut types: Vec<CompositeType> = Vec::new();
        let mut state = CommentState::Normal;
        for line in source.lines() {
            let cleaned = clean_line_from_comments(line, state);
            state = cleaned.state;
            let Some(declared) = parse_declaration(&cleaned.text) else {
                continue;
            };
            let key = declared.name.to_lowercase();
            match types.iter_mut().find(|ty| ty.name.to_lowercase() == key) {
                Some(existing) => *existing = declared,
                None => types.push(declared),
            }
        }
        Self::from_types(types)
    }

    pub fn from_types(types: Vec<CompositeType>) -> Self {
        let mut names: Vec<&str> = types.iter().map(|ty| ty.name.as_str()).collect();
        names.sort_by_key(|name| std::cmp::Reverse(name.len()));
        let constructor_pattern = if names.is_empty() {
            None
        } else {
            let alternation: Vec<String> = names.iter().map(|name| regex::escape(name)).collect();
            Regex::new(&format!(r"(?i)\b({})\s*\(", alternation.join("|"))).ok()
        };
        Self {
            types,
            constructor_pattern,
        }
    }

    pub fn get(&self, name: &str) -> Option<&CompositeType> {
        let key = name.to_lowercase();
        self.types.iter().find(|ty| ty.name.to_lowercase() == key)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompositeType> {
        self.types.iter()
    }

    /// First declared type with exactly `count` fields.
    pub fn find_by_field_count(&self, count: usize) -> Option<&CompositeType> {
        self.types.iter().find(|ty| ty.fields.len() == count)
    }

    /// `Name(a, b)` -> `{f1 = a, f2 = b}`, nested calls resolved innermost first.
    pub fn transform_constructors(&self, expr: &str) -> String {
        let Some(pattern) = &self.constructor_pattern else {
            return expr.to_string();
        };
        rewrite_calls(expr, pattern, |name, args| {
            self.get(name).map(|ty| ty.table_literal(args))
        })
    }

    /// `<a, b>` -> named table for the type with that many fields, or a
    /// positional table when no type matches.
    pub fn transform_literals(&self, expr: &str) -> String {
        let mut out = String::with_capacity(expr.len());
        let mut idx = 0usize;
        let mut in_string: Option<char> = None;
        let mut escaped = false;

        while idx < expr.len() {
            let Some(ch) = expr[idx..].chars().next() else {
                break;
            };
            if let Some(quote) = in_string {
                out.push(ch);
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == quote {
                    in_string = None;
                }
                idx += ch.len_utf8();
                continue;
            }
            if ch == '"' {
                in_string = Some(ch);
                out.push(ch);
                idx += 1;
                continue;
            }
            if ch == '<'
                && opens_literal(&expr[..idx], &expr[idx + 1..])
                && let Some(close) = find_literal_close(expr, idx)
            {
                let content = expr[idx + 1..close].trim();
                if is_structural(content) {
                    let inner = self.transform_literals(content);
                    out.push_str(&self.literal_table(&inner));
                    idx = close + 1;
                    continue;
                }
            }
            out.push(ch);
            idx += ch.len_utf8();
        }
        out
    }

    fn literal_table(&self, content: &str) -> String {
        let args = smart_split_args(content);
        match self.find_by_field_count(args.len()) {
            Some(ty) => ty.table_literal(&args),
            None => format!("{{{}}}", args.join(", ")),
        }
    }

    pub fn transform(&self, expr: &str) -> String {
        self.transform_literals(&self.transform_constructors(expr))
    }
}

fn opens_literal(before: &str, after: &str) -> bool {
    if after.starts_with(['=', '>']) {
        return false;
    }
    let before = before.trim_end();
    let Some(prev) = before.chars().next_back() else {
        return true;
    };
    if prev == ')' || prev == ']' {
        return false;
    }
    if !is_ident_continue(prev) {
        return true;
    }
    let word_start = before
        .char_indices()
        .rev()
        .take_while(|(_, ch)| is_ident_continue(*ch))
        .last()
        .map(|(index, _)| index)
        .unwrap_or(0);
    let word = before[word_start..].to_lowercase();
    LITERAL_LEADING_WORDS.contains(&word.as_str())
}

/// Index of the `>` closing the literal opened at `open`.
fn find_literal_close(expr: &str, open: usize) -> Option<usize> {
    let mut angle = 0usize;
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;
    for (offset, ch) in expr[open..].char_indices() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                in_string = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => in_string = Some(ch),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            '<' if depth == 0 => angle += 1,
            '>' if depth == 0 => {
                angle = angle.saturating_sub(1);
                if angle == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_structural(content: &str) -> bool {
    if content.is_empty() {
        return false;
    }
    if smart_split_args(content).len() > 1 {
        return true;
    }
    if content.starts_with(['"', '\'', '{']) {
        return true;
    }
    let ident_len: usize = content
        .chars()
        .take_while(|ch| is_ident_continue(*ch))
        .map(char::len_utf8)
        .sum();
    ident_len > 0 && content[ident_len..].trim_start().starts_with('(')
}
