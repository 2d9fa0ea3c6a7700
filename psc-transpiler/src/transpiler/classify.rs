use std::sync::OnceLock;

use regex::Regex;

use super::arrays::{ArrayDeclaration, parse_array_declaration};
use crate::composite;
use crate::definitions::Definitions;
use crate::functions::{FunctionInfo, parse_function_header};
use crate::lexical::{find_matching_paren, smart_split_args};
use crate::variables::{VariableDeclaration, parse_variable_declaration};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Control {
    If {
        condition: String,
    },
    ElseIf {
        condition: String,
    },
    Else,
    While {
        condition: String,
    },
    For {
        var: String,
        start: String,
        end: String,
        decreasing: bool,
    },
    ForEach {
        var: String,
        collection: String,
    },
    Return {
        value: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum StatementKind {
    AlgorithmHeader,
    Begin,
    Lexicon,
    CompositeDeclaration,
    ArrayDeclaration(ArrayDeclaration),
    BlockClose { keyword: String },
    Read { target: String },
    FunctionHeader(FunctionInfo),
    VariableDeclaration(VariableDeclaration),
    Control(Control),
    Assignment,
    Expression,
}

macro_rules! pattern {
    ($name:ident, $source:expr) => {
        fn $name() -> &'static Regex {
            static PATTERN: OnceLock<Regex> = OnceLock::new();
            PATTERN.get_or_init(|| Regex::new($source).expect(stringify!($name)))
        }
    };
}

pattern!(algorithm_header, r"(?i)^algorithme\b");
pattern!(begin_marker, r"(?i)^d[ée]but\b");
pattern!(lexicon_marker, r"(?i)^lexique\b");
pattern!(block_close, r"(?i)^(fin|fsi|fpour|ftq|ftant)\b");
pattern!(
    read_assignment,
    r"(?i)^([\p{L}_][\p{L}0-9_]*)\s*←\s*lire\s*\(\s*\)\s*;?$"
);
pattern!(read_call, r"(?i)^lire\s*\(\s*([\p{L}_][\p{L}0-9_]*)\s*\)\s*;?$");
pattern!(
    if_header,
    r"(?i)^si\b\s*(.*?)\s*(?:\balors\b)?\s*:?\s*$"
);
pattern!(
    else_if_header,
    r"(?i)^sinon\s+si\b\s*(.*?)\s*(?:\balors\b)?\s*:?\s*$"
);
pattern!(else_header, r"(?i)^sinon\s*:?\s*$");
pattern!(
    while_header,
    r"(?i)^tant\s+que\b\s*(.*?)\s*(?:\bfaire\b)?\s*:?\s*$"
);
pattern!(for_keyword, r"(?i)^pour\b");
pattern!(decreasing, r"(?i)\s*\bd[ée]croissant\b");
pattern!(
    for_each_header,
    r"(?i)^pour\s+([\p{L}_][\p{L}0-9_]*)\s+de\s+([\p{L}_][\p{L}0-9_.]*)\s+faire\s*:?\s*$"
);
pattern!(
    for_header,
    r"(?i)^pour\s+([\p{L}_][\p{L}0-9_]*)\s+(?:allant\s+de|de)\s+(.+)\s+à\s+(.+?)\s*(?:\bfaire\b)?\s*:?\s*$"
);
// Plain `a` as the bound separator, tried only when no `à` separator matched.
pattern!(
    for_header_unaccented,
    r"(?i)^pour\s+([\p{L}_][\p{L}0-9_]*)\s+(?:allant\s+de|de)\s+(.+?)\s+a\s+(.+?)\s*(?:\bfaire\b)?\s*:?\s*$"
);
pattern!(return_statement, r"(?i)^retourner?\b\s*(.*?)\s*;?$");

/// Classifies one comment-free, trimmed line. Variants are tried in the
/// order the rewrite rules take precedence.
pub(crate) fn classify(line: &str, defs: &Definitions) -> StatementKind {
    if algorithm_header().is_match(line) {
        return StatementKind::AlgorithmHeader;
    }
    if begin_marker().is_match(line) {
        return StatementKind::Begin;
    }
    if lexicon_marker().is_match(line) {
        return StatementKind::Lexicon;
    }
    if composite::is_declaration(line) {
        return StatementKind::CompositeDeclaration;
    }
    if let Some(array) = parse_array_declaration(line) {
        return StatementKind::ArrayDeclaration(array);
    }
    if let Some(caps) = block_close().captures(line) {
        return StatementKind::BlockClose {
            keyword: caps[1].to_lowercase(),
        };
    }
    if let Some(caps) = read_assignment()
        .captures(line)
        .or_else(|| read_call().captures(line))
    {
        return StatementKind::Read {
            target: caps[1].to_string(),
        };
    }
    if let Some(info) = parse_function_header(line) {
        return StatementKind::FunctionHeader(info);
    }
    if let Some(declaration) = parse_variable_declaration(line, defs) {
        return StatementKind::VariableDeclaration(declaration);
    }
    if let Some(control) = classify_control(line) {
        return StatementKind::Control(control);
    }
    if split_assignment(line).is_some() {
        return StatementKind::Assignment;
    }
    StatementKind::Expression
}

fn classify_control(line: &str) -> Option<Control> {
    if let Some(caps) = else_if_header().captures(line) {
        return Some(Control::ElseIf {
            condition: caps[1].to_string(),
        });
    }
    if else_header().is_match(line) {
        return Some(Control::Else);
    }
    if let Some(caps) = if_header().captures(line) {
        return Some(Control::If {
            condition: caps[1].to_string(),
        });
    }
    if let Some(caps) = while_header().captures(line) {
        return Some(Control::While {
            condition: caps[1].to_string(),
        });
    }
    if for_keyword().is_match(line) {
        if let Some(caps) = for_each_header().captures(line) {
            return Some(Control::ForEach {
                var: caps[1].to_string(),
                collection: caps[2].to_string(),
            });
        }
        let is_decreasing = decreasing().is_match(line);
        let header = decreasing().replace_all(line, "");
        if let Some(caps) = for_header()
            .captures(&header)
            .or_else(|| for_header_unaccented().captures(&header))
        {
            return Some(Control::For {
                var: caps[1].to_string(),
                start: caps[2].trim().to_string(),
                end: caps[3].trim().to_string(),
                decreasing: is_decreasing,
            });
        }
        return None;
    }
    if let Some(caps) = return_statement().captures(line) {
        return Some(Control::Return {
            value: return_value(&caps[1]),
        });
    }
    None
}

/// `retourner(x)` and `retourner x` both return `x`; `retourner (a, b)`
/// keeps its parentheses and returns a list.
fn return_value(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.starts_with('(') && find_matching_paren(raw, 0) == Some(raw.len() - 1) {
        let inner = raw[1..raw.len() - 1].trim();
        if inner.is_empty() {
            return None;
        }
        if smart_split_args(inner).len() == 1 {
            return Some(inner.to_string());
        }
    }
    Some(raw.to_string())
}

/// Splits `lhs ← rhs` at the first `←` outside strings and brackets.
pub(crate) fn split_assignment(line: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (idx, ch) in line.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            '←' if depth == 0 => {
                return Some((line[..idx].trim(), line[idx + '←'.len_utf8()..].trim()));
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(line: &str) -> StatementKind {
        classify(line, &Definitions::standard())
    }

    #[test]
    fn classifies_loop_headers() {
        assert_eq!(
            kind("Pour i de 0 à n - 1 Faire :"),
            StatementKind::Control(Control::For {
                var: "i".to_string(),
                start: "0".to_string(),
                end: "n - 1".to_string(),
                decreasing: false,
            })
        );
        assert_eq!(
            kind("Pour i de n à 1 décroissant Faire"),
            StatementKind::Control(Control::For {
                var: "i".to_string(),
                start: "n".to_string(),
                end: "1".to_string(),
                decreasing: true,
            })
        );
        assert_eq!(
            kind("Pour i de n - a à 10 Faire"),
            StatementKind::Control(Control::For {
                var: "i".to_string(),
                start: "n - a".to_string(),
                end: "10".to_string(),
                decreasing: false,
            })
        );
        assert_eq!(
            kind("pour i de 1 a n faire"),
            StatementKind::Control(Control::For {
                var: "i".to_string(),
                start: "1".to_string(),
                end: "n".to_string(),
                decreasing: false,
            })
        );
        assert_eq!(
            kind("Pour k de annuaire Faire"),
            StatementKind::Control(Control::ForEach {
                var: "k".to_string(),
                collection: "annuaire".to_string(),
            })
        );
    }

    #[test]
    fn else_if_wins_over_else() {
        assert_eq!(
            kind("Sinon si x > 3 alors"),
            StatementKind::Control(Control::ElseIf {
                condition: "x > 3".to_string(),
            })
        );
        assert_eq!(kind("Sinon :"), StatementKind::Control(Control::Else));
    }

    #[test]
    fn return_strips_wrapping_parens_only() {
        assert_eq!(
            kind("retourner(a + b)"),
            StatementKind::Control(Control::Return {
                value: Some("a + b".to_string()),
            })
        );
        assert_eq!(
            kind("retourner (a) + 1"),
            StatementKind::Control(Control::Return {
                value: Some("(a) + 1".to_string()),
            })
        );
        assert_eq!(
            kind("retourner (1, 2, 3)"),
            StatementKind::Control(Control::Return {
                value: Some("(1, 2, 3)".to_string()),
            })
        );
        assert_eq!(
            kind("retourner"),
            StatementKind::Control(Control::Return { value: None })
        );
    }

    #[test]
    fn closers_do_not_match_longer_words() {
        assert_eq!(
            kind("Fin"),
            StatementKind::BlockClose {
                keyword: "fin".to_string()
            }
        );
        assert_eq!(kind("finListe(l, p)"), StatementKind::Expression);
        assert_eq!(kind("x ← FIN_LIGNE"), StatementKind::Assignment);
    }

    #[test]
    fn assignment_split_ignores_nested_arrows() {
        assert_eq!(split_assignment("x ← f(a)"), Some(("x", "f(a)")));
        assert_eq!(split_assignment("écrire(\"a ← b\")"), None);
    }
}
