use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum CompilerError {
    #[error("[line {line}] Error at '{lexeme}': {message}")]
    Lex {
        line: usize,
        lexeme: String,
        message: String,
    },
    #[error("[line {line}] Error at '{lexeme}': {message}")]
    Parse {
        line: usize,
        lexeme: String,
        message: String,
    },
    #[error("[line {line}] Error at '{lexeme}': {message}")]
    Codegen {
        line: usize,
        lexeme: String,
        message: String,
    },
    #[error("{message}")]
    Io { message: String },
    #[error("Internal Compiler Error: {message}")]
    Internal { message: String },
}
