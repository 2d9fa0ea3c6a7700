use std::sync::OnceLock;

use regex::Regex;

use crate::definitions::Definitions;
use crate::lexical::smart_split_args;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct DimensionRange {
    pub lo: String,
    pub hi: String,
}

/// `t ← tableau entier[0..9, 0..4]`
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ArrayDeclaration {
    pub name: String,
    pub element_type: String,
    pub dimensions: Vec<DimensionRange>,
}

fn array_declaration() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)^([\p{L}_][\p{L}0-9_]*)\s*(?:=|←)\s*tableau\s+(?:de\s+)?([\p{L}_][\p{L}0-9_]*)\s*\[(.+)\]\s*;?$",
        )
        .expect("array declaration pattern")
    })
}

fn parse_range(raw: &str) -> DimensionRange {
    match raw.split_once("..") {
        Some((lo, hi)) => DimensionRange {
            lo: lo.trim().to_string(),
            hi: hi.trim().to_string(),
        },
        None => DimensionRange {
            lo: "0".to_string(),
            hi: format!("{} - 1", raw.trim()),
        },
    }
}

pub(crate) fn parse_array_declaration(line: &str) -> Option<ArrayDeclaration> {
    let caps = array_declaration().captures(line)?;
    let dimensions: Vec<DimensionRange> = smart_split_args(&caps[3].replace("][", ","))
        .iter()
        .filter(|raw| !raw.is_empty())
        .map(|raw| parse_range(raw))
        .collect();
    if dimensions.is_empty() {
        return None;
    }
    Some(ArrayDeclaration {
        name: caps[1].to_string(),
        element_type: caps[2].to_string(),
        dimensions,
    })
}

/// Lua literal every cell of a fresh array of `element_type` starts with.
fn zero_value(defs: &Definitions, element_type: &str) -> Option<&'static str> {
    match defs.canonical_type(element_type)? {
        "entier" | "réel" => Some("0"),
        "booléen" => Some("false"),
        "chaîne" | "caractère" => Some("\"\""),
        _ => None,
    }
}

/// Emits the nested loops allocating every dimension. Storage is 1-based:
/// cell `lo` of a dimension lives at Lua index `lo + 1`.
pub(crate) fn lower_array_declaration(
    array: &ArrayDeclaration,
    defs: &Definitions,
    indent: &str,
) -> Vec<String> {
    let zero = zero_value(defs, &array.element_type);
    let depth = array.dimensions.len();
    let mut lines = vec![format!("{indent}{} = {{}}", array.name)];
    let mut path = array.name.clone();
    let mut loop_indent = indent.to_string();
    let mut opened = 0usize;

    for (index, range) in array.dimensions.iter().enumerate() {
        let innermost = index + 1 == depth;
        if innermost && zero.is_none() {
            break;
        }
        let var = format!("__i{}", index + 1);
        lines.push(format!(
            "{loop_indent}for {var} = (({})) + 1, (({})) + 1, 1 do",
            range.lo, range.hi
        ));
        opened += 1;
        loop_indent.push('\t');
        match (innermost, zero) {
            (true, Some(value)) => lines.push(format!("{loop_indent}{path}[{var}] = {value}")),
            _ => lines.push(format!("{loop_indent}{path}[{var}] = {{}}")),
        }
        path.push_str(&format!("[{var}]"));
    }

    for level in (0..opened).rev() {
        lines.push(format!("{indent}{}end", "\t".repeat(level)));
    }
    lines
}
