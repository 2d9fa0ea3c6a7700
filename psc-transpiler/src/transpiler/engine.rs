use std::sync::OnceLock;

use regex::Regex;
use tracing::trace;

use super::arrays::lower_array_declaration;
use super::classify::{Control, StatementKind, classify, split_assignment};
use super::expr::ExprRewriter;
use super::operators::ExprContext;
use super::{Declarations, Transpiler};
use crate::functions::FunctionInfo;
use crate::lexical::{
    CommentState, clean_line_from_comments, find_matching_paren, is_simple_identifier,
    leading_indentation, normalize_quotes, smart_split_args,
};

const WRITE_HELPER: &str = "__psc_write";

fn write_call() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^[ée]crire\s*\(").expect("write call pattern"))
}

#[derive(Debug)]
enum Block {
    If,
    While,
    For,
    Function(FunctionInfo),
}

/// Line-by-line rewriter holding the state of one transpilation.
pub(super) struct LineEngine<'a> {
    transpiler: &'a Transpiler,
    decls: &'a Declarations,
    expr: ExprRewriter<'a>,
    comments: CommentState,
    in_algorithm_header: bool,
    in_lexicon: bool,
    blocks: Vec<Block>,
    last_code: String,
    line_number: usize,
    out: Vec<String>,
}

impl<'a> LineEngine<'a> {
    pub(super) fn new(transpiler: &'a Transpiler, decls: &'a Declarations) -> Self {
        Self {
            transpiler,
            decls,
            expr: ExprRewriter {
                defs: &transpiler.defs,
                builtins: &transpiler.builtins,
                operators: &transpiler.operators,
                decls,
            },
            comments: CommentState::Normal,
            in_algorithm_header: false,
            in_lexicon: false,
            blocks: Vec::new(),
            last_code: String::new(),
            line_number: 0,
            out: Vec::new(),
        }
    }

    pub(super) fn finish(self) -> String {
        let mut body = self.out.join("\n");
        if !body.is_empty() {
            body.push('\n');
        }
        body
    }

    pub(super) fn process_line(&mut self, line: &str) {
        self.line_number += 1;
        let indent = leading_indentation(line).to_string();
        let cleaned = clean_line_from_comments(line, self.comments);
        self.comments = cleaned.state;
        let comment = cleaned
            .line_comment
            .filter(|_| self.transpiler.config.emit_comments)
            .map(|content| lua_comment(&content));

        let code = normalize_quotes(cleaned.text.trim());
        let code = code.trim();
        let lines = if is_blank(code) {
            Vec::new()
        } else {
            self.lower_statement(code, &indent)
        };

        match (lines.is_empty(), comment) {
            (true, Some(comment)) => self.out.push(format!("{indent}{comment}")),
            (true, None) => {}
            (false, comment) => {
                let last = lines.len() - 1;
                for (index, text) in lines.into_iter().enumerate() {
                    self.last_code = text.trim().to_string();
                    match (&comment, index == last) {
                        (Some(comment), true) => self.out.push(format!("{text} {comment}")),
                        _ => self.out.push(text),
                    }
                }
            }
        }
    }

    /// Output lines for one comment-free statement, indentation included.
    fn lower_statement(&mut self, code: &str, indent: &str) -> Vec<String> {
        let kind = classify(code, &self.transpiler.defs);
        trace!(line = self.line_number, kind = ?kind, "classified");

        if self.in_algorithm_header {
            if matches!(&kind, StatementKind::BlockClose { keyword } if keyword == "fin") {
                self.in_algorithm_header = false;
            }
            return Vec::new();
        }
        if self.in_lexicon {
            match &kind {
                StatementKind::Begin
                | StatementKind::FunctionHeader(_)
                | StatementKind::AlgorithmHeader => self.in_lexicon = false,
                StatementKind::VariableDeclaration(declaration) => {
                    return self.local_declaration(&declaration.names, indent);
                }
                _ => return Vec::new(),
            }
        }

        match kind {
            StatementKind::AlgorithmHeader => {
                self.in_algorithm_header = true;
                Vec::new()
            }
            StatementKind::Lexicon => {
                self.in_lexicon = true;
                Vec::new()
            }
            StatementKind::Begin | StatementKind::CompositeDeclaration => Vec::new(),
            StatementKind::ArrayDeclaration(array) => {
                lower_array_declaration(&array, &self.transpiler.defs, indent)
            }
            StatementKind::BlockClose { .. } => self.close_block(indent),
            StatementKind::Read { target } => {
                let helper = self.decls.variables.read_helper(&target).lua_name();
                vec![format!("{indent}{target} = {helper}()")]
            }
            StatementKind::FunctionHeader(info) => {
                let line = format!("{indent}function {}({})", info.name, info.param_names().join(", "));
                self.blocks.push(Block::Function(info));
                vec![line]
            }
            StatementKind::VariableDeclaration(declaration) => {
                self.local_declaration(&declaration.names, indent)
            }
            StatementKind::Control(control) => vec![format!("{indent}{}", self.lower_control(control))],
            StatementKind::Assignment | StatementKind::Expression => {
                vec![format!("{indent}{}", self.lower_simple(code))]
            }
        }
    }

    fn local_declaration(&self, names: &[String], indent: &str) -> Vec<String> {
        if self.in_function() {
            vec![format!("{indent}local {}", names.join(", "))]
        } else {
            Vec::new()
        }
    }

    fn in_function(&self) -> bool {
        self.blocks
            .iter()
            .any(|block| matches!(block, Block::Function(_)))
    }

    fn current_function(&self) -> Option<&FunctionInfo> {
        self.blocks.iter().rev().find_map(|block| match block {
            Block::Function(info) => Some(info),
            _ => None,
        })
    }

    fn close_block(&mut self, indent: &str) -> Vec<String> {
        let Some(block) = self.blocks.pop() else {
            return Vec::new();
        };
        let mut lines = Vec::new();
        if let Block::Function(info) = &block {
            if info.has_in_out() && !starts_with_word(&self.last_code, "return") {
                lines.push(format!(
                    "{indent}\treturn {}",
                    info.in_out_param_names.join(", ")
                ));
            }
        }
        lines.push(format!("{indent}end"));
        lines
    }

    fn lower_control(&mut self, control: Control) -> String {
        match control {
            Control::If { condition } => {
                self.blocks.push(Block::If);
                format!("if {} then", self.expr.rewrite(&condition, ExprContext::Condition))
            }
            Control::ElseIf { condition } => {
                format!("elseif {} then", self.expr.rewrite(&condition, ExprContext::Condition))
            }
            Control::Else => "else".to_string(),
            Control::While { condition } => {
                self.blocks.push(Block::While);
                format!("while {} do", self.expr.rewrite(&condition, ExprContext::Condition))
            }
            Control::For {
                var,
                start,
                end,
                decreasing,
            } => {
                self.blocks.push(Block::For);
                let step = if decreasing { "-1" } else { "1" };
                format!(
                    "for {var} = {}, {}, {step} do",
                    self.expr.rewrite(&start, ExprContext::LoopBound),
                    self.expr.rewrite(&end, ExprContext::LoopBound)
                )
            }
            Control::ForEach { var, collection } => {
                self.blocks.push(Block::For);
                format!("for {var}, _ in pairs({collection}._data) do")
            }
            Control::Return { value } => {
                let value = value.map(|value| self.expr.rewrite(&value, ExprContext::Return));
                let in_out = self
                    .current_function()
                    .filter(|info| info.has_in_out())
                    .map(|info| info.in_out_param_names.join(", "));
                match (value, in_out) {
                    (Some(value), Some(names)) => format!("return {value}, {names}"),
                    (Some(value), None) => format!("return {value}"),
                    (None, Some(names)) => format!("return {names}"),
                    (None, None) => "return".to_string(),
                }
            }
        }
    }

    /// Assignments and bare expression statements.
    fn lower_simple(&self, code: &str) -> String {
        let statement = self
            .unpack_in_out(code)
            .unwrap_or_else(|| code.to_string());
        let lowered = self.expr.rewrite(&statement, ExprContext::Statement);
        match write_call().find(&lowered) {
            Some(found) => format!("{}({}", self.write_helper(), &lowered[found.end()..]),
            None => lowered,
        }
    }

    fn write_helper(&self) -> &'static str {
        self.transpiler
            .defs
            .keyword("écrire")
            .and_then(|keyword| keyword.lua)
            .unwrap_or(WRITE_HELPER)
    }

    /// A statement that is a call to a declared function with InOut
    /// parameters also assigns the InOut outputs back to the arguments.
    fn unpack_in_out(&self, code: &str) -> Option<String> {
        let code = code.trim_end_matches(';').trim_end();
        let (lhs, call) = match split_assignment(code) {
            Some((lhs, rhs)) => (Some(lhs), rhs),
            None => (None, code),
        };
        let (name, args) = whole_call(call)?;
        let info = self.decls.functions.get(name)?;
        if !info.has_in_out() {
            return None;
        }
        let mut targets = self.decls.functions.in_out_targets(name, &args);
        if targets.is_empty() {
            return None;
        }

        let mut names = Vec::with_capacity(targets.len() + 1);
        match lhs {
            Some(lhs) => {
                for target in &mut targets {
                    if target.eq_ignore_ascii_case(lhs) {
                        *target = "_".to_string();
                    }
                }
                while targets.last().is_some_and(|target| target == "_") {
                    targets.pop();
                }
                names.push(lhs.to_string());
            }
            None if info.returns_value() => names.push("_".to_string()),
            None => {}
        }
        names.extend(targets);
        Some(format!("{} ← {call}", names.join(", ")))
    }
}

/// `name(args)` spanning the whole text.
fn whole_call(text: &str) -> Option<(&str, Vec<String>)> {
    let text = text.trim();
    let open = text.find('(')?;
    let name = text[..open].trim();
    if !is_simple_identifier(name) {
        return None;
    }
    if find_matching_paren(text, open)? != text.len() - 1 {
        return None;
    }
    Some((name, smart_split_args(&text[open + 1..text.len() - 1])))
}

fn lua_comment(content: &str) -> String {
    if content.starts_with('[') {
        format!("-- {content}")
    } else {
        format!("--{content}")
    }
}

/// Empty, or nothing but separators left over from a stripped construct.
fn is_blank(code: &str) -> bool {
    code.chars()
        .all(|ch| ch.is_whitespace() || matches!(ch, ';' | ':' | ',' | '/' | '*'))
}

fn starts_with_word(text: &str, word: &str) -> bool {
    text.strip_prefix(word)
        .is_some_and(|rest| !rest.starts_with(|ch: char| ch.is_alphanumeric() || ch == '_'))
}
