//! Lua support library prepended to every transpiled program.

/// Helpers for lists, symmetric lists, stacks, queues, tables, file handles,
/// input reads and the `écrire` serializer. Every helper is a `local`
/// prefixed with `__psc_`.
pub const RUNTIME_LIBRARY: &str = include_str!("runtime/prelude.lua");

/// Name of every helper the library defines, in definition order.
pub fn helper_names() -> impl Iterator<Item = &'static str> {
    RUNTIME_LIBRARY.lines().filter_map(|line| {
        let rest = line
            .strip_prefix("local function ")
            .or_else(|| line.strip_prefix("local "))?;
        let end = rest
            .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
            .unwrap_or(rest.len());
        let name = &rest[..end];
        name.starts_with("__psc_").then_some(name)
    })
}

pub fn defines_helper(name: &str) -> bool {
    helper_names().any(|helper| helper == name)
}
