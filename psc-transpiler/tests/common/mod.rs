#![allow(dead_code, unused_imports)]

pub use psc::{
    CompositeRegistry, Declarations, Definitions, FunctionRegistry, RUNTIME_LIBRARY,
    TranspileConfig, Transpiler, VariableTypes, transpile,
};

use mlua::Lua;

const CAPTURE_PRINT: &str = r##"
__captured = {}
print = function(...)
    local parts = {}
    for i = 1, select("#", ...) do
        parts[i] = tostring((select(i, ...)))
    end
    __captured[#__captured + 1] = table.concat(parts, "\t")
end
"##;

/// Generated statements only, no runtime library.
pub fn lua_body(source: &str) -> String {
    Transpiler::new(
        Definitions::standard(),
        TranspileConfig::default().without_runtime(),
    )
    .transpile(source)
}

/// Non-empty output lines with indentation removed.
pub fn body_lines(source: &str) -> Vec<String> {
    lua_body(source)
        .lines()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Runs Lua source and returns every line passed to `print`.
pub fn run_lua(lua_source: &str) -> Vec<String> {
    let lua = Lua::new();
    lua.load(CAPTURE_PRINT)
        .exec()
        .expect("print capture should install");
    if let Err(err) = lua.load(lua_source).set_name("psc").exec() {
        panic!("generated lua failed: {err}\n--- source ---\n{lua_source}");
    }
    let captured: mlua::Table = lua
        .globals()
        .get("__captured")
        .expect("captured output should exist");
    captured
        .sequence_values::<String>()
        .collect::<mlua::Result<Vec<_>>>()
        .expect("captured output should be strings")
}

/// Transpiles with the runtime library and runs the result.
pub fn run_psc(source: &str) -> Vec<String> {
    run_lua(&transpile(source))
}
