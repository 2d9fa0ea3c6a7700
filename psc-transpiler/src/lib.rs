pub mod composite;
pub mod config;
pub mod definitions;
pub mod functions;
pub mod lexical;
#[cfg(feature = "cli")]
pub mod logging;
pub mod runtime;
pub mod transpiler;
pub mod variables;

use std::path::Path;

pub use composite::{CompositeField, CompositeRegistry, CompositeType};
pub use config::TranspileConfig;
pub use definitions::{BuiltinDef, Definitions, KeywordDef, KeywordKind, SymbolDef, TypeDef};
pub use functions::{FunctionInfo, FunctionRegistry, ParamInfo, parse_function_header};
pub use runtime::RUNTIME_LIBRARY;
pub use transpiler::{Declarations, SourcePass, SourcePathError, Transpiler};
pub use variables::{ReadHelper, VariableTypes};

/// Transpiles `source` with the standard definitions and default options.
pub fn transpile(source: &str) -> String {
    Transpiler::default().transpile(source)
}

/// Reads and transpiles a `.psc` or `.algo` file.
pub fn transpile_file(path: impl AsRef<Path>) -> Result<String, SourcePathError> {
    Transpiler::default().transpile_file(path)
}
