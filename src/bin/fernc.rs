//! Fern compiler CLI.
//!
//! Thin driver over `ferncore`'s `check_file`/`parse_file`/`compile_to_ir`
//! entry points (modeled on `seqc`'s `main.rs` subcommands in the teacher
//! repo, with backend invocation and packaging stripped out — this binary
//! only prints diagnostics and IR, it never shells out to a linker).

use clap::{Parser as ClapParser, Subcommand, ValueEnum};
use ferncore::{check_file, compile_to_ir, parse_file, pretty, ColorMode, CompilerConfig};
use std::fs;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::process;

#[derive(ClapParser)]
#[command(name = "fernc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fern compiler front-end: check, parse, and build .fn files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// When to colorize diagnostic output.
    #[arg(long, global = true, value_enum, default_value_t = CliColor::Auto)]
    color: CliColor,

    /// Suppress non-error output.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Emit extra tracing to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum CliColor {
    Auto,
    Always,
    Never,
}

impl From<CliColor> for ColorMode {
    fn from(c: CliColor) -> Self {
        match c {
            CliColor::Auto => ColorMode::Auto,
            CliColor::Always => ColorMode::Always,
            CliColor::Never => ColorMode::Never,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Lex, parse, validate, and type-check a file.
    Check { input: PathBuf },

    /// Lex, parse, and validate a file, printing its golden-format AST.
    Parse { input: PathBuf },

    /// Lex, parse, and validate a file, checking formatter idempotence.
    ///
    /// Formatting itself is an external collaborator (spec §1); this verb
    /// only validates the file well-formed enough to hand to one.
    Fmt { input: PathBuf },

    /// Run the full pipeline and write SSA IR to stdout or a file.
    Build {
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt().with_env_filter("debug").init();
    }

    // §6 "Environment": NO_COLOR forces monochrome, FORCE_COLOR forces
    // color, otherwise auto-detect. Actual ANSI styling is an external
    // collaborator's job (spec §1); this only resolves the driver's
    // intent for downstream tooling to honor.
    let colorize = ColorMode::resolve(
        cli.color.into(),
        std::env::var_os("NO_COLOR").is_some(),
        std::env::var_os("FORCE_COLOR").is_some(),
        std::io::stderr().is_terminal(),
    );
    tracing::debug!(colorize, "resolved color mode");

    let code = match &cli.command {
        Commands::Check { input } => run_check(input, cli.quiet),
        Commands::Parse { input } => run_parse(input, cli.quiet),
        Commands::Fmt { input } => run_fmt(input, cli.quiet),
        Commands::Build { input, output } => run_build(input, output.as_deref(), cli.quiet),
    };
    process::exit(code);
}

fn read_source(input: &PathBuf) -> Result<String, i32> {
    fs::read_to_string(input).map_err(|e| {
        eprintln!("error: failed to read {}: {}", input.display(), e);
        2
    })
}

fn run_check(input: &PathBuf, quiet: bool) -> i32 {
    let source = match read_source(input) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let filename = input.display().to_string();
    let config = CompilerConfig::new();
    let diagnostics = check_file(&source, &filename, &config);
    print_diagnostics(&diagnostics, quiet);
    if diagnostics.is_empty() {
        0
    } else {
        1
    }
}

fn run_parse(input: &PathBuf, quiet: bool) -> i32 {
    let source = match read_source(input) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let filename = input.display().to_string();
    let (program, diagnostics) = parse_file(&source, &filename);
    if !diagnostics.is_empty() {
        print_diagnostics(&diagnostics, quiet);
        return 1;
    }
    if let Err(e) = ferncore::validator::validate(&program) {
        eprintln!("{}: error: {}", e.loc, e.message);
        return 1;
    }
    print!("{}", pretty::print_program(&filename, &program));
    0
}

fn run_fmt(input: &PathBuf, quiet: bool) -> i32 {
    let source = match read_source(input) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let filename = input.display().to_string();
    let (program, diagnostics) = parse_file(&source, &filename);
    if !diagnostics.is_empty() {
        print_diagnostics(&diagnostics, quiet);
        return 1;
    }
    if let Err(e) = ferncore::validator::validate(&program) {
        eprintln!("{}: error: {}", e.loc, e.message);
        return 1;
    }
    if !quiet {
        println!("{} is well-formed (formatting itself is out of scope)", filename);
    }
    0
}

fn run_build(input: &PathBuf, output: Option<&std::path::Path>, quiet: bool) -> i32 {
    let source = match read_source(input) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let filename = input.display().to_string();
    let config = CompilerConfig::new();
    match compile_to_ir(&source, &filename, &config) {
        Ok(ir) => {
            match output {
                Some(path) => {
                    if let Err(e) = fs::write(path, &ir) {
                        eprintln!("error: failed to write {}: {}", path.display(), e);
                        return 2;
                    }
                    if !quiet {
                        println!("wrote {}", path.display());
                    }
                }
                None => {
                    let _ = std::io::stdout().write_all(ir.as_bytes());
                }
            }
            0
        }
        Err(diagnostics) => {
            print_diagnostics(&diagnostics, quiet);
            1
        }
    }
}

fn print_diagnostics(diagnostics: &[ferncore::Diagnostic], quiet: bool) {
    if quiet {
        return;
    }
    for diagnostic in diagnostics {
        eprintln!("{}", diagnostic.render());
    }
}
