use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::lexical::{
    CommentState, clean_line_from_comments, find_matching_paren, is_simple_identifier,
    smart_split_args,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParamInfo {
    pub name: String,
    pub is_in_out: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<String>,
}

/// A user function declared with `Fonction name(params) [: type]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FunctionInfo {
    pub name: String,
    pub params: Vec<ParamInfo>,
    pub in_out_param_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
}

impl FunctionInfo {
    pub fn has_in_out(&self) -> bool {
        !self.in_out_param_names.is_empty()
    }

    pub fn returns_value(&self) -> bool {
        self.return_type.is_some()
    }

    pub fn param_names(&self) -> Vec<&str> {
        self.params.iter().map(|param| param.name.as_str()).collect()
    }
}

fn function_header() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^\s*fonction\s+([\p{L}_][\p{L}0-9_]*)\s*\(")
            .expect("function header pattern")
    })
}

fn in_out_prefix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^inout\s+").expect("inout prefix pattern"))
}

fn parse_param(raw: &str) -> Option<ParamInfo> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let (is_in_out, bare) = match in_out_prefix().find(raw) {
        Some(found) => (true, &raw[found.end()..]),
        None => (false, raw),
    };
    let (name, declared_type) = match bare.split_once(':') {
        Some((name, ty)) => (name.trim(), Some(ty.trim().to_string())),
        None => (bare.trim(), None),
    };
    Some(ParamInfo {
        name: name.to_string(),
        is_in_out,
        declared_type: declared_type.filter(|ty| !ty.is_empty()),
    })
}

/// Parses a comment-free `Fonction` header line.
///
/// The parameter list ends at the parenthesis matching the one after the
/// name, so a return type such as `tableau(entier)` is never mistaken for a
/// parameter.
pub fn parse_function_header(line: &str) -> Option<FunctionInfo> {
    let caps = function_header().captures(line)?;
    let name = caps.get(1)?.as_str().to_string();
    let open = caps.get(0)?.end() - 1;
    let close = find_matching_paren(line, open)?;

    let params: Vec<ParamInfo> = smart_split_args(&line[open + 1..close])
        .iter()
        .filter_map(|raw| parse_param(raw))
        .collect();
    let in_out_param_names = params
        .iter()
        .filter(|param| param.is_in_out)
        .map(|param| param.name.clone())
        .collect();
    let return_type = line[close + 1..]
        .trim()
        .strip_prefix(':')
        .map(|ty| ty.trim().to_string())
        .filter(|ty| !ty.is_empty());

    Some(FunctionInfo {
        name,
        params,
        in_out_param_names,
        return_type,
    })
}

/// Functions declared in one source text, keyed case-insensitively.
#[derive(Clone, Debug, Default, Serialize)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, FunctionInfo>,
}

impl FunctionRegistry {
    pub fn collect(source: &str) -> Self {
        let mut functions = BTreeMap::new();
        let mut state = CommentState::Normal;
        for line in source.lines() {
            let cleaned = clean_line_from_comments(line, state);
            state = cleaned.state;
            if let Some(info) = parse_function_header(&cleaned.text) {
                functions.insert(info.name.to_lowercase(), info);
            }
        }
        Self { functions }
    }

    pub fn get(&self, name: &str) -> Option<&FunctionInfo> {
        self.functions.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionInfo> {
        self.functions.values()
    }

    /// Call-site arguments that receive the InOut outputs of `name`, in
    /// parameter order. Arguments that are not plain identifiers are skipped.
    pub fn in_out_args_to_reassign(&self, name: &str, args: &[String]) -> Vec<String> {
        let Some(info) = self.get(name) else {
            return Vec::new();
        };
        info.params
            .iter()
            .zip(args)
            .filter(|(param, arg)| param.is_in_out && is_simple_identifier(arg))
            .map(|(_, arg)| arg.trim().to_string())
            .collect()
    }

    /// Assignment targets for the InOut outputs of a call, one per InOut
    /// parameter. Positions whose argument cannot be reassigned hold `_`,
    /// trailing placeholders are dropped.
    pub fn in_out_targets(&self, name: &str, args: &[String]) -> Vec<String> {
        let Some(info) = self.get(name) else {
            return Vec::new();
        };
        let mut targets: Vec<String> = info
            .params
            .iter()
            .enumerate()
            .filter(|(_, param)| param.is_in_out)
            .map(|(index, _)| match args.get(index) {
                Some(arg) if is_simple_identifier(arg) => arg.trim().to_string(),
                _ => "_".to_string(),
            })
            .collect();
        while targets.last().is_some_and(|target| target == "_") {
            targets.pop();
        }
        targets
    }
}
