/// Output options for one [`crate::Transpiler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TranspileConfig {
    /// Prepend the Lua runtime library.
    pub include_runtime: bool,
    /// Keep `//` comments as `--` comments.
    pub emit_comments: bool,
}

impl Default for TranspileConfig {
    fn default() -> Self {
        Self {
            include_runtime: true,
            emit_comments: true,
        }
    }
}

impl TranspileConfig {
    pub fn without_runtime(mut self) -> Self {
        self.include_runtime = false;
        self
    }

    pub fn without_comments(mut self) -> Self {
        self.emit_comments = false;
        self
    }
}
