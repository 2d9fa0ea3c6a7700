use regex::Regex;

use super::classify::split_assignment;
use crate::definitions::{BuiltinDef, Definitions};
use crate::functions::FunctionRegistry;
use crate::lexical::{find_matching_paren, is_simple_identifier, rewrite_calls, smart_split_args};

/// Precompiled call patterns for the built-ins of one [`Definitions`].
#[derive(Clone, Debug)]
pub(crate) struct BuiltinPatterns {
    inline: Option<Regex>,
    helpers: Option<Regex>,
}

fn call_pattern<'a>(defs: impl Iterator<Item = &'a BuiltinDef>) -> Option<Regex> {
    let names: Vec<String> = defs.map(|def| regex::escape(def.name)).collect();
    if names.is_empty() {
        return None;
    }
    Regex::new(&format!(r"(?i)\b({})\s*\(", names.join("|"))).ok()
}

impl BuiltinPatterns {
    pub(crate) fn new(defs: &Definitions) -> Self {
        let sorted = defs.functions_longest_first();
        Self {
            inline: call_pattern(sorted.iter().copied().filter(|def| def.is_inline())),
            helpers: call_pattern(sorted.iter().copied().filter(|def| !def.is_inline())),
        }
    }
}

fn wrap_operand(arg: &str) -> String {
    if is_simple_identifier(arg) {
        arg.to_string()
    } else {
        format!("({arg})")
    }
}

fn inline_call(def: &BuiltinDef, args: &[String]) -> Option<String> {
    if args.len() != def.arity {
        return None;
    }
    match (def.helper, def.arity) {
        ("#", 1) => Some(format!("#{}", wrap_operand(&args[0]))),
        ("..", 2) => Some(format!("({} .. {})", args[0], args[1])),
        (helper, 2) => Some(format!("{helper}({}, {}, {})", args[0], args[1], args[1])),
        (helper, _) => Some(format!("{helper}({})", args.join(", "))),
    }
}

/// Length, concatenation, character and substring built-ins, which map to
/// Lua operators or reordered `string.sub` calls.
pub(crate) fn rewrite_inline(
    text: &str,
    patterns: &BuiltinPatterns,
    defs: &Definitions,
    functions: &FunctionRegistry,
) -> String {
    let Some(pattern) = &patterns.inline else {
        return text.to_string();
    };
    rewrite_calls(text, pattern, |name, args| {
        if functions.contains(name) {
            return None;
        }
        inline_call(defs.function(name)?, args)
    })
}

/// A statement consisting of a single mutator call stores the updated
/// container back into its first argument.
pub(crate) fn rewrite_mutator_statement(
    statement: &str,
    defs: &Definitions,
    functions: &FunctionRegistry,
) -> Option<String> {
    let statement = statement.trim().trim_end_matches(';').trim_end();
    if split_assignment(statement).is_some() {
        return None;
    }
    let open = statement.find('(')?;
    let name = statement[..open].trim();
    if !is_simple_identifier(name) || functions.contains(name) {
        return None;
    }
    let def = defs.function(name).filter(|def| def.mutator)?;
    if find_matching_paren(statement, open)? != statement.len() - 1 {
        return None;
    }
    let args = smart_split_args(&statement[open + 1..statement.len() - 1]);
    let target = args.first()?;
    Some(format!("{target} ← {}({})", def.helper, args.join(", ")))
}

/// Every remaining built-in call is renamed to its runtime helper.
pub(crate) fn rewrite_helpers(
    text: &str,
    patterns: &BuiltinPatterns,
    defs: &Definitions,
    functions: &FunctionRegistry,
) -> String {
    let Some(pattern) = &patterns.helpers else {
        return text.to_string();
    };
    rewrite_calls(text, pattern, |name, args| {
        if functions.contains(name) {
            return None;
        }
        let def = defs.function(name)?;
        Some(format!("{}({})", def.helper, args.join(", ")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inline(text: &str) -> String {
        let defs = Definitions::standard();
        let patterns = BuiltinPatterns::new(&defs);
        rewrite_inline(text, &patterns, &defs, &FunctionRegistry::default())
    }

    #[test]
    fn string_builtins_become_lua_operators() {
        assert_eq!(inline("n ← longueur(s)"), "n ← #s");
        assert_eq!(inline("n ← longueur(concat(a, b))"), "n ← #((a .. b))");
        assert_eq!(inline("c ← ième(s, i)"), "c ← string.sub(s, i, i)");
        assert_eq!(
            inline("m ← sousChaîne(s, 1, 3)"),
            "m ← string.sub(s, 1, 3)"
        );
    }

    #[test]
    fn mutator_statement_assigns_first_argument() {
        let defs = Definitions::standard();
        assert_eq!(
            rewrite_mutator_statement("ajoutTeteListe(l, 3)", &defs, &FunctionRegistry::default()),
            Some("l ← __psc_liste_ajout_tete(l, 3)".to_string())
        );
        assert_eq!(
            rewrite_mutator_statement("empiler(p, 3)", &defs, &FunctionRegistry::default()),
            None
        );
    }
}
