pub mod ast;
pub mod codegen;
pub mod error;
pub mod formatter;
pub mod lexer;
pub mod parser;

use codegen::Codegen;
use error::CompilerError;
use formatter::Formatter;
use lexer::{Lexer, TokenKind};
use parser::Parser;

/// Translates rox source text into a self-contained C++ translation
/// unit. Returns the generated text on success, the first diagnostic on
/// failure.
pub fn generate(source: &str) -> Result<String, CompilerError> {
    let tokens = Lexer::new(source).scan_tokens()?;
    let tokens = tokens
        .into_iter()
        .filter(|t| t.kind != TokenKind::Comment)
        .collect();

    let mut parser = Parser::new(tokens);
    let program = parser.parse_program()?;

    let mut codegen = Codegen::new();
    codegen.generate(&program)
}

/// Reformats rox source text from its token stream.
pub fn format(source: &str) -> Result<String, CompilerError> {
    let tokens = Lexer::new(source).scan_tokens()?;
    Ok(Formatter::new(tokens).format())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_is_idempotent_on_compiling_sources() {
        let source = "function main() -> none {\n    print(\"hi\");\n    return none;\n}\n";
        let first = generate(source).unwrap();
        let second = generate(source).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn comments_are_invisible_to_the_parser() {
        let source = "function main() -> none {\n    // a note\n    return none;\n}\n";
        assert!(generate(source).is_ok());
    }

    #[test]
    fn lex_errors_stop_the_pipeline() {
        assert!(generate("int64 roxv26_bad = 1;").is_err());
    }
}
