use owo_colors::OwoColorize;
use std::sync::OnceLock;
use supports_color::Stream;
use tracing_subscriber::EnvFilter;

static ANSI_ENABLED: OnceLock<bool> = OnceLock::new();

/// How much of the transpiler's own tracing reaches stderr when `RUST_LOG`
/// is unset. Each `-v` on the command line moves one step up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    /// Registry sizes per transpile.
    Verbose,
    /// Plus one event per classified line.
    Trace,
}

impl Verbosity {
    pub fn louder(self) -> Self {
        match self {
            Verbosity::Quiet => Verbosity::Normal,
            Verbosity::Normal => Verbosity::Verbose,
            Verbosity::Verbose | Verbosity::Trace => Verbosity::Trace,
        }
    }

    pub fn directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "warn,psc=debug,psc_run=info",
            Verbosity::Trace => "warn,psc=trace,psc_run=info",
        }
    }
}

/// Labels prefixed to the binary's own log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Source,
    Declarations,
    Output,
    Dump,
}

impl Category {
    pub fn name(self) -> &'static str {
        match self {
            Category::Source => "SOURCE",
            Category::Declarations => "DECLS",
            Category::Output => "OUTPUT",
            Category::Dump => "DUMP",
        }
    }

    fn paint(self, ansi: bool) -> String {
        let name = self.name();
        if !ansi {
            return name.to_string();
        }
        match self {
            Category::Source => format!("{}", name.bright_cyan().bold()),
            Category::Declarations => format!("{}", name.bright_yellow().bold()),
            Category::Output => format!("{}", name.bright_green().bold()),
            Category::Dump => format!("{}", name.bright_magenta().bold()),
        }
    }
}

/// Installs the global subscriber on stderr, leaving stdout to the Lua.
/// `RUST_LOG` overrides `verbosity`.
pub fn init(verbosity: Verbosity) -> Result<(), Box<dyn std::error::Error>> {
    let ansi = detect_ansi();
    let _ = ANSI_ENABLED.set(ansi);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(ansi)
        .with_target(verbosity >= Verbosity::Trace)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|err| std::io::Error::other(err.to_string()))?;
    Ok(())
}

pub fn label(category: Category) -> String {
    category.paint(ansi_enabled())
}

fn ansi_enabled() -> bool {
    *ANSI_ENABLED.get_or_init(detect_ansi)
}

fn detect_ansi() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }

    if std::env::var_os("FORCE_COLOR").is_some() {
        let _ = enable_ansi_support();
        return true;
    }

    let windows_vt = enable_ansi_support().is_ok();
    windows_vt || supports_color::on_cached(Stream::Stderr).is_some()
}

#[cfg(windows)]
fn enable_ansi_support() -> windows::core::Result<()> {
    use windows::Win32::Foundation::HANDLE;
    use windows::Win32::System::Console::{
        ENABLE_VIRTUAL_TERMINAL_PROCESSING, GetConsoleMode, GetStdHandle, STD_ERROR_HANDLE,
        SetConsoleMode,
    };

    unsafe {
        let handle = GetStdHandle(STD_ERROR_HANDLE)?;
        if handle == HANDLE::default() {
            return Ok(());
        }

        let mut mode = std::mem::zeroed();
        GetConsoleMode(handle, &mut mode)?;
        SetConsoleMode(handle, mode | ENABLE_VIRTUAL_TERMINAL_PROCESSING)?;
        Ok(())
    }
}

#[cfg(not(windows))]
fn enable_ansi_support() -> Result<(), ()> {
    Err(())
}
