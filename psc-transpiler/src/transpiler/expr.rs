use super::builtins::{self, BuiltinPatterns};
use super::indexing::{flatten_multi_index, shift_indices};
use super::lists::{transform_adt_constructors, transform_paren_literals};
use super::operators::{
    ExprContext, OperatorTable, disambiguate_equality, rewrite_assignment_arrow,
};
use super::Declarations;
use crate::definitions::Definitions;

/// Expression-level rewrites shared by statements and control headers.
pub(super) struct ExprRewriter<'a> {
    pub(super) defs: &'a Definitions,
    pub(super) builtins: &'a BuiltinPatterns,
    pub(super) operators: &'a OperatorTable,
    pub(super) decls: &'a Declarations,
}

impl ExprRewriter<'_> {
    pub(super) fn rewrite(&self, text: &str, ctx: ExprContext) -> String {
        let functions = &self.decls.functions;

        let text = self.decls.composites.transform(text);
        let text = transform_paren_literals(&text, ctx.starts_after_keyword());
        let text = transform_adt_constructors(&text);
        let text = builtins::rewrite_inline(&text, self.builtins, self.defs, functions);
        let text = match ctx {
            ExprContext::Statement => {
                builtins::rewrite_mutator_statement(&text, self.defs, functions).unwrap_or(text)
            }
            _ => text,
        };
        let text = builtins::rewrite_helpers(&text, self.builtins, self.defs, functions);
        let text = self.operators.substitute(&text);
        let text = disambiguate_equality(&text, ctx);
        let text = rewrite_assignment_arrow(&text);
        let text = flatten_multi_index(&text);
        shift_indices(&text)
    }
}
