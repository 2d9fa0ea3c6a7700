use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::definitions::Definitions;
use crate::functions::parse_function_header;
use crate::lexical::{CommentState, clean_line_from_comments, normalize_type};

/// Lua helper reading one value from stdin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadHelper {
    Number,
    Text,
    Auto,
}

impl ReadHelper {
    pub fn lua_name(self) -> &'static str {
        match self {
            ReadHelper::Number => "__psc_lire_nombre",
            ReadHelper::Text => "__psc_lire_chaine",
            ReadHelper::Auto => "__psc_lire",
        }
    }
}

fn declaration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*([\p{L}0-9_,\s]+?)\s*:\s*([\p{L}0-9_]+(?:\s*\[[^\]]*\])?(?:\([^()]*\))?)")
            .expect("variable declaration pattern")
    })
}

/// A `a, b : type` line: the declared names and the raw type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableDeclaration {
    pub names: Vec<String>,
    pub declared_type: String,
}

pub fn parse_variable_declaration(line: &str, defs: &Definitions) -> Option<VariableDeclaration> {
    let caps = declaration_pattern().captures(line)?;
    let names: Vec<String> = caps
        .get(1)?
        .as_str()
        .split(',')
        .map(|name| name.trim().to_string())
        .collect();
    let valid = names.iter().all(|name| {
        !name.is_empty()
            && !name.contains(char::is_whitespace)
            && !name.starts_with(|ch: char| ch.is_ascii_digit())
            && defs.keyword(name).is_none()
    });
    if !valid {
        return None;
    }
    Some(VariableDeclaration {
        names,
        declared_type: caps.get(2)?.as_str().trim().to_string(),
    })
}

/// Declared type of each variable and parameter, by lowercase name.
///
/// Only used to pick a read helper; later declarations overwrite earlier ones.
#[derive(Clone, Debug, Default, Serialize)]
pub struct VariableTypes {
    types: BTreeMap<String, String>,
}

impl VariableTypes {
    pub fn collect(source: &str, defs: &Definitions) -> Self {
        let mut types = BTreeMap::new();
        let mut state = CommentState::Normal;
        for line in source.lines() {
            let cleaned = clean_line_from_comments(line, state);
            state = cleaned.state;
            if let Some(info) = parse_function_header(&cleaned.text) {
                for param in info.params {
                    if let Some(ty) = param.declared_type {
                        types.insert(param.name.to_lowercase(), normalize_type(defs, &ty));
                    }
                }
                continue;
            }
            if let Some(declaration) = parse_variable_declaration(&cleaned.text, defs) {
                let ty = normalize_type(defs, &declaration.declared_type);
                for name in declaration.names {
                    types.insert(name.to_lowercase(), ty.clone());
                }
            }
        }
        Self { types }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.types.get(&name.trim().to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn read_helper(&self, name: &str) -> ReadHelper {
        match self.get(name) {
            Some("entier" | "réel") => ReadHelper::Number,
            Some("chaîne" | "caractère") => ReadHelper::Text,
            _ => ReadHelper::Auto,
        }
    }
}
