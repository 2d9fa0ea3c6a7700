use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::composite::CompositeRegistry;
use crate::config::TranspileConfig;
use crate::definitions::Definitions;
use crate::functions::FunctionRegistry;
use crate::runtime::RUNTIME_LIBRARY;
use crate::variables::VariableTypes;

mod arrays;
mod builtins;
mod classify;
mod engine;
mod expr;
mod indexing;
mod lists;
mod operators;

use builtins::BuiltinPatterns;
use engine::LineEngine;
use operators::OperatorTable;

const SOURCE_EXTENSIONS: &[&str] = &["psc", "algo"];

#[derive(Debug)]
pub enum SourcePathError {
    Io(std::io::Error),
    MissingExtension,
    UnsupportedExtension(String),
}

impl std::fmt::Display for SourcePathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourcePathError::Io(err) => write!(f, "{err}"),
            SourcePathError::MissingExtension => write!(f, "source file must have an extension"),
            SourcePathError::UnsupportedExtension(ext) => write!(
                f,
                "unsupported source extension '.{ext}', expected .psc or .algo"
            ),
        }
    }
}

impl std::error::Error for SourcePathError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourcePathError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SourcePathError {
    fn from(value: std::io::Error) -> Self {
        SourcePathError::Io(value)
    }
}

fn check_extension(path: &Path) -> Result<(), SourcePathError> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .ok_or(SourcePathError::MissingExtension)?;
    if SOURCE_EXTENSIONS
        .iter()
        .any(|accepted| accepted.eq_ignore_ascii_case(ext))
    {
        Ok(())
    } else {
        Err(SourcePathError::UnsupportedExtension(ext.to_string()))
    }
}

/// A text-to-text rewrite run before or after the main transpilation.
pub trait SourcePass: Send + Sync {
    fn apply(&self, source: &str) -> String;
}

impl<F> SourcePass for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn apply(&self, source: &str) -> String {
        self(source)
    }
}

/// Everything the read-only scans find in one source text.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Declarations {
    pub functions: FunctionRegistry,
    pub composites: CompositeRegistry,
    pub variables: VariableTypes,
}

impl Declarations {
    pub fn collect(source: &str, defs: &Definitions) -> Self {
        let declarations = Self {
            functions: FunctionRegistry::collect(source),
            composites: CompositeRegistry::collect(source),
            variables: VariableTypes::collect(source, defs),
        };
        debug!(
            functions = declarations.functions.len(),
            composites = declarations.composites.len(),
            variables = declarations.variables.len(),
            "collected declarations"
        );
        declarations
    }
}

/// PSC to Lua transpiler.
///
/// Holds the injected [`Definitions`] and the patterns derived from them;
/// every call to [`Transpiler::transpile`] builds fresh registries, so one
/// value can be shared between threads.
pub struct Transpiler {
    defs: Definitions,
    config: TranspileConfig,
    builtins: BuiltinPatterns,
    operators: OperatorTable,
    pre_passes: Vec<Box<dyn SourcePass>>,
    post_passes: Vec<Box<dyn SourcePass>>,
}

impl Default for Transpiler {
    fn default() -> Self {
        Self::new(Definitions::standard(), TranspileConfig::default())
    }
}

impl std::fmt::Debug for Transpiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transpiler")
            .field("config", &self.config)
            .field("pre_passes", &self.pre_passes.len())
            .field("post_passes", &self.post_passes.len())
            .finish_non_exhaustive()
    }
}

impl Transpiler {
    pub fn new(defs: Definitions, config: TranspileConfig) -> Self {
        let builtins = BuiltinPatterns::new(&defs);
        let operators = OperatorTable::new(&defs);
        Self {
            defs,
            config,
            builtins,
            operators,
            pre_passes: Vec::new(),
            post_passes: Vec::new(),
        }
    }

    /// Runs `pass` on the PSC source before declarations are collected.
    pub fn with_pre_pass(mut self, pass: impl SourcePass + 'static) -> Self {
        self.pre_passes.push(Box::new(pass));
        self
    }

    /// Runs `pass` on the generated program, runtime library excluded.
    pub fn with_post_pass(mut self, pass: impl SourcePass + 'static) -> Self {
        self.post_passes.push(Box::new(pass));
        self
    }

    pub fn definitions(&self) -> &Definitions {
        &self.defs
    }

    pub fn config(&self) -> TranspileConfig {
        self.config
    }

    pub fn declarations(&self, source: &str) -> Declarations {
        Declarations::collect(&self.preprocess(source), &self.defs)
    }

    fn preprocess(&self, source: &str) -> String {
        self.pre_passes
            .iter()
            .fold(source.to_string(), |acc, pass| pass.apply(&acc))
    }

    /// Translates a whole PSC program. Never fails: malformed constructs are
    /// passed through as unmodified as possible.
    pub fn transpile(&self, source: &str) -> String {
        let source = self.preprocess(source);
        let decls = Declarations::collect(&source, &self.defs);
        let mut engine = LineEngine::new(self, &decls);
        for line in source.lines() {
            engine.process_line(line);
        }
        let body = self
            .post_passes
            .iter()
            .fold(engine.finish(), |acc, pass| pass.apply(&acc));

        let mut output = String::with_capacity(RUNTIME_LIBRARY.len() + body.len() + 1);
        if self.config.include_runtime {
            output.push_str(RUNTIME_LIBRARY);
            if !output.ends_with('\n') {
                output.push('\n');
            }
        }
        output.push_str(&body);
        output
    }

    pub fn transpile_file(&self, path: impl AsRef<Path>) -> Result<String, SourcePathError> {
        let path = path.as_ref();
        check_extension(path)?;
        let source = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), bytes = source.len(), "transpiling file");
        Ok(self.transpile(&source))
    }
}
