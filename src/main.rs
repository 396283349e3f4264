use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{self, Command};

use clap::{Parser, Subcommand};

use rox::error::CompilerError;

#[derive(Parser)]
#[command(name = "rox", version, about = "The rox compiler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a rox source file to C++
    Generate {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
    /// Generate, then build a native binary with the system C++ compiler
    Compile {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
    /// Compile, then execute the produced binary
    Run {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
    /// Print the source reformatted from its token stream
    Format {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
    /// Dump the token stream (debug aid)
    Tokenize {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate { input } => cmd_generate(&input).map(|_| 0),
        Commands::Compile { input } => cmd_compile(&input).map(|_| 0),
        Commands::Run { input } => cmd_run(&input),
        Commands::Format { input } => cmd_format(&input).map(|_| 0),
        Commands::Tokenize { input } => cmd_tokenize(&input).map(|_| 0),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(error) => {
            eprintln!("{error}");
            process::exit(1);
        }
    }
}

fn io_error(message: String) -> CompilerError {
    CompilerError::Io { message }
}

fn read_source(path: &Path) -> Result<String, CompilerError> {
    fs::read_to_string(path)
        .map_err(|e| io_error(format!("Could not open file {}: {e}", path.display())))
}

fn output_stem(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

fn cmd_generate(input: &Path) -> Result<PathBuf, CompilerError> {
    let source = read_source(input)?;
    let cc = rox::generate(&source)?;

    fs::create_dir_all("generated")
        .map_err(|e| io_error(format!("Could not create generated/: {e}")))?;
    let out_path = Path::new("generated").join(format!("{}.cc", output_stem(input)));
    fs::write(&out_path, cc)
        .map_err(|e| io_error(format!("Could not write to file {}: {e}", out_path.display())))?;

    println!("Generated {}", out_path.display());
    Ok(out_path)
}

fn cmd_compile(input: &Path) -> Result<PathBuf, CompilerError> {
    let cc_path = cmd_generate(input)?;
    let binary_path = Path::new("generated").join(output_stem(input));

    let cxx = env::var("CXX").unwrap_or_else(|_| "c++".to_string());
    let status = Command::new(&cxx)
        .args(["-w", "-std=c++20", "-o"])
        .arg(&binary_path)
        .arg(&cc_path)
        .status()
        .map_err(|e| io_error(format!("Could not invoke {cxx}: {e}")))?;
    if !status.success() {
        return Err(io_error("Compilation failed.".to_string()));
    }

    println!("Compiled {}", binary_path.display());
    Ok(binary_path)
}

fn cmd_run(input: &Path) -> Result<i32, CompilerError> {
    let binary_path = cmd_compile(input)?;
    let status = Command::new(&binary_path)
        .status()
        .map_err(|e| io_error(format!("Could not execute {}: {e}", binary_path.display())))?;
    Ok(status.code().unwrap_or(1))
}

fn cmd_format(input: &Path) -> Result<(), CompilerError> {
    let source = read_source(input)?;
    let formatted = rox::format(&source)?;
    print!("{formatted}");
    Ok(())
}

fn cmd_tokenize(input: &Path) -> Result<(), CompilerError> {
    let source = read_source(input)?;
    let tokens = rox::lexer::Lexer::new(&source).scan_tokens()?;
    for token in tokens {
        println!("{:>4}  {:<14} {}", token.line, format!("{:?}", token.kind), token.lexeme);
    }
    Ok(())
}
