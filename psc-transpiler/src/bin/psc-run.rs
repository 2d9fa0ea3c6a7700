use std::io::{self, Write};

use psc::logging::{self, Category, Verbosity};
use psc::{Definitions, TranspileConfig, Transpiler};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliConfig {
    source: Option<String>,
    output_path: Option<String>,
    include_runtime: bool,
    emit_comments: bool,
    dump_definitions: bool,
    dump_declarations: bool,
    verbosity: Verbosity,
    help: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            source: None,
            output_path: None,
            include_runtime: true,
            emit_comments: true,
            dump_definitions: false,
            dump_declarations: false,
            verbosity: Verbosity::Normal,
            help: false,
        }
    }
}

impl CliConfig {
    fn transpile_config(&self) -> TranspileConfig {
        let mut config = TranspileConfig::default();
        if !self.include_runtime {
            config = config.without_runtime();
        }
        if !self.emit_comments {
            config = config.without_comments();
        }
        config
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_cli_args(&args).map_err(io::Error::other)?;
    logging::init(cli.verbosity)?;
    if cli.help {
        print_usage();
        return Ok(());
    }

    let transpiler = Transpiler::new(Definitions::standard(), cli.transpile_config());
    if cli.dump_definitions {
        info!("{} definitions", logging::label(Category::Dump));
        println!("{}", serde_json::to_string_pretty(transpiler.definitions())?);
        return Ok(());
    }

    let source_path = cli
        .source
        .as_deref()
        .ok_or_else(|| io::Error::other("missing source path (see --help)"))?;
    info!("{} {source_path}", logging::label(Category::Source));

    if cli.dump_declarations {
        let source = std::fs::read_to_string(source_path)?;
        let declarations = transpiler.declarations(&source);
        info!(
            "{} {} functions, {} composite types, {} typed variables",
            logging::label(Category::Declarations),
            declarations.functions.len(),
            declarations.composites.len(),
            declarations.variables.len()
        );
        println!("{}", serde_json::to_string_pretty(&declarations)?);
        return Ok(());
    }

    let lua = transpiler.transpile_file(source_path)?;
    match cli.output_path.as_deref() {
        Some(output_path) => {
            std::fs::write(output_path, &lua)?;
            info!(
                "{} {output_path} ({} bytes)",
                logging::label(Category::Output),
                lua.len()
            );
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(lua.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn parse_cli_args(args: &[String]) -> Result<CliConfig, String> {
    let mut cfg = CliConfig::default();
    let mut index = 0usize;

    while index < args.len() {
        match args[index].as_str() {
            "-h" | "--help" => {
                cfg.help = true;
                index += 1;
            }
            "-o" | "--output" => {
                let path = args
                    .get(index + 1)
                    .ok_or_else(|| format!("missing value for {}", args[index]))?;
                cfg.output_path = Some(path.clone());
                index += 2;
            }
            "--no-runtime" => {
                cfg.include_runtime = false;
                index += 1;
            }
            "--no-comments" => {
                cfg.emit_comments = false;
                index += 1;
            }
            "--dump-definitions" => {
                cfg.dump_definitions = true;
                index += 1;
            }
            "--dump-declarations" => {
                cfg.dump_declarations = true;
                index += 1;
            }
            "-v" | "--verbose" => {
                cfg.verbosity = cfg.verbosity.louder();
                index += 1;
            }
            "-vv" => {
                cfg.verbosity = Verbosity::Trace;
                index += 1;
            }
            "-q" | "--quiet" => {
                cfg.verbosity = Verbosity::Quiet;
                index += 1;
            }
            value if value.starts_with('-') => {
                return Err(format!("unknown option '{value}'"));
            }
            value => {
                if cfg.source.is_some() {
                    return Err(format!("unexpected extra argument '{value}'"));
                }
                cfg.source = Some(value.to_string());
                index += 1;
            }
        }
    }

    Ok(cfg)
}

fn print_usage() {
    println!("Usage:");
    println!("  psc-run <source.psc>                   (Lua on stdout)");
    println!("  psc-run -o <output.lua> <source.psc>");
    println!("  psc-run [--no-runtime] [--no-comments] <source.psc>");
    println!("  psc-run --dump-declarations <source.psc>");
    println!("  psc-run --dump-definitions");
    println!();
    println!();
    println!("  -v, --verbose   registry sizes (repeat or -vv for every classified line)");
    println!("  -q, --quiet     errors only");
    println!("RUST_LOG overrides -v/-q (default: warn).");
}

#[cfg(test)]
mod tests {
    use super::parse_cli_args;
    use psc::logging::Verbosity;

    fn s(value: &str) -> String {
        value.to_string()
    }

    #[test]
    fn parse_cli_defaults() {
        let cfg = parse_cli_args(&[]).expect("parse should succeed");
        assert!(cfg.source.is_none());
        assert!(cfg.output_path.is_none());
        assert!(cfg.include_runtime);
        assert!(cfg.emit_comments);
        assert!(!cfg.dump_definitions);
        assert!(!cfg.dump_declarations);
        assert!(!cfg.help);
        assert_eq!(cfg.verbosity, Verbosity::Normal);
    }

    #[test]
    fn parse_cli_verbosity_flags() {
        let cfg = parse_cli_args(&[s("-v"), s("demos/somme.psc")]).expect("parse should succeed");
        assert_eq!(cfg.verbosity, Verbosity::Verbose);

        let cfg = parse_cli_args(&[s("--verbose"), s("-v")]).expect("parse should succeed");
        assert_eq!(cfg.verbosity, Verbosity::Trace);

        let cfg = parse_cli_args(&[s("-vv"), s("-q")]).expect("parse should succeed");
        assert_eq!(cfg.verbosity, Verbosity::Quiet);
    }

    #[test]
    fn parse_cli_output_and_flags() {
        let cfg = parse_cli_args(&[
            s("--no-runtime"),
            s("-o"),
            s("out.lua"),
            s("--no-comments"),
            s("demos/somme.psc"),
        ])
        .expect("parse should succeed");
        assert_eq!(cfg.output_path.as_deref(), Some("out.lua"));
        assert_eq!(cfg.source.as_deref(), Some("demos/somme.psc"));
        let config = cfg.transpile_config();
        assert!(!config.include_runtime);
        assert!(!config.emit_comments);
    }

    #[test]
    fn parse_cli_rejects_missing_output_value() {
        let err = parse_cli_args(&[s("--output")]).expect_err("parse should fail");
        assert_eq!(err, "missing value for --output");
    }

    #[test]
    fn parse_cli_rejects_unknown_option_and_extra_source() {
        let err = parse_cli_args(&[s("--jit")]).expect_err("parse should fail");
        assert_eq!(err, "unknown option '--jit'");

        let err = parse_cli_args(&[s("a.psc"), s("b.psc")]).expect_err("parse should fail");
        assert_eq!(err, "unexpected extra argument 'b.psc'");
    }

    #[test]
    fn parse_cli_dump_definitions_needs_no_source() {
        let cfg = parse_cli_args(&[s("--dump-definitions")]).expect("parse should succeed");
        assert!(cfg.dump_definitions);
        assert!(cfg.source.is_none());
    }
}
