// File: src/main.rs
//
// CLI driver: run/repl/disasm/build/exec subcommands over the
// compiler, VM, disassembler, and chunk serializer.

use std::path::PathBuf;
use std::rc::Rc;

use clap::{Parser, Subcommand};
use colored::Colorize;

use izi::compiler::compile_source;
use izi::config::Config;
use izi::disassembler::disassemble;
use izi::interpreter::Interpreter;
use izi::serializer::{deserialize_chunk, serialize_chunk};
use izi::vm::Vm;

#[derive(Parser)]
#[command(name = "izi", version, about = "A small, embeddable scripting language")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile and execute a source file.
    Run {
        file: PathBuf,
        /// Use the tree-walking interpreter instead of the bytecode VM.
        #[arg(long)]
        interpreter: bool,
        #[arg(long, default_value_t = 256)]
        max_call_depth: usize,
        /// Arguments forwarded to the running program (visible via `process.args()`).
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Start an interactive read-compile-run loop.
    Repl,
    /// Compile a file and print its disassembly.
    Disasm { file: PathBuf },
    /// Compile a source file to a binary chunk file (.izb).
    Build {
        file: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Execute a previously-serialized chunk file.
    Exec { file: PathBuf },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { file, interpreter, max_call_depth, args } => run_file(file, interpreter, max_call_depth, args),
        Commands::Repl => {
            let config = Config::default();
            izi::repl::run(config).map_err(|e| e.to_string())
        }
        Commands::Disasm { file } => disasm_file(file),
        Commands::Build { file, output } => build_file(file, output),
        Commands::Exec { file } => exec_file(file),
    };

    if let Err(message) = result {
        eprintln!("{} {}", "error:".red().bold(), message);
        std::process::exit(1);
    }
}

fn run_file(file: PathBuf, use_interpreter: bool, max_call_depth: usize, script_args: Vec<String>) -> Result<(), String> {
    let source = std::fs::read_to_string(&file).map_err(|e| format!("cannot read {}: {}", file.display(), e))?;
    // Forwarded so `process.args()` sees them via std::env::args in the
    // natives module; re-exec semantics are out of scope, so script
    // arguments are appended to the process's own argv via env var
    // instead of a second process spawn.
    std::env::set_var("IZI_SCRIPT_ARGS", script_args.join("\u{1f}"));

    let mut config = Config::default();
    config.max_call_frames = max_call_depth;

    if use_interpreter {
        let tokens = izi::lexer::tokenize(&source);
        let stmts = izi::parser::Parser::new(tokens).parse().map_err(|e| e.to_string())?;
        let mut interp = Interpreter::new(config);
        interp.run(&stmts).map_err(|e| e.to_string())?;
    } else {
        let chunk = compile_source(&source, Some(&file), config).map_err(|e| e.to_string())?;
        let mut vm = Vm::new(config);
        vm.run_chunk(Rc::new(chunk)).map_err(|e| e.to_string())?;
    }
    Ok(())
}

fn disasm_file(file: PathBuf) -> Result<(), String> {
    let source = std::fs::read_to_string(&file).map_err(|e| format!("cannot read {}: {}", file.display(), e))?;
    let chunk = compile_source(&source, Some(&file), Config::default()).map_err(|e| e.to_string())?;
    print!("{}", disassemble(&chunk, &file.display().to_string()));
    Ok(())
}

fn build_file(file: PathBuf, output: PathBuf) -> Result<(), String> {
    let source = std::fs::read_to_string(&file).map_err(|e| format!("cannot read {}: {}", file.display(), e))?;
    let chunk = compile_source(&source, Some(&file), Config::default()).map_err(|e| e.to_string())?;
    let bytes = serialize_chunk(&chunk);
    std::fs::write(&output, bytes).map_err(|e| format!("cannot write {}: {}", output.display(), e))?;
    Ok(())
}

fn exec_file(file: PathBuf) -> Result<(), String> {
    let bytes = std::fs::read(&file).map_err(|e| format!("cannot read {}: {}", file.display(), e))?;
    let chunk = deserialize_chunk(&bytes).map_err(|e| e.to_string())?;
    let mut vm = Vm::new(Config::default());
    vm.run_chunk(Rc::new(chunk)).map_err(|e| e.to_string())?;
    Ok(())
}
