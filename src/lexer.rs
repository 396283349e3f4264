use logos::Logos;
use phf::phf_set;

use crate::error::CompilerError;

/// Identifier prefix reserved for generated code. User identifiers
/// starting with it are rejected at lex time, which is what lets the
/// generator prepend it without ever colliding.
pub const RESERVED_PREFIX: &str = "roxv26_";

/// Language keywords. The generator emits these unchanged.
pub static KEYWORDS: phf::Set<&'static str> = phf_set! {
    "and", "or", "not", "if", "else", "for", "function", "const", "none",
    "true", "false", "return", "break", "continue", "type", "default",
    "print", "read_line", "int64", "float64", "bool", "char", "string",
    "list", "dictionary", "rox_result",
};

/// Names the runtime preamble defines. These must stay reachable as bare
/// identifiers in generated code, so the generator never rewrites them.
pub static BUILTINS: phf::Set<&'static str> = phf_set! {
    "isOk", "getValue", "getError", "ok", "error", "range", "pi", "e",
    "EOF", "main",
    "int64_abs", "int64_min", "int64_max", "int64_pow",
    "float64_abs", "float64_min", "float64_max", "float64_pow",
    "float64_sqrt", "float64_sin", "float64_cos", "float64_tan",
    "float64_log", "float64_exp", "float64_floor", "float64_ceil",
    "rox_at", "rox_get", "rox_set", "rox_remove", "rox_has", "rox_keys",
    "rox_div", "rox_mod", "rox_str", "RoxString", "RoxRange", "None",
};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum TokenKind {
    // Single-character tokens.
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("-")]
    Minus,
    #[token("+")]
    Plus,
    #[token(";")]
    Semicolon,
    #[token("/")]
    Slash,
    #[token("*")]
    Star,
    #[token("%")]
    Percent,

    // One or two character tokens.
    #[token("!")]
    Bang,
    #[token("!=")]
    BangEqual,
    #[token("=")]
    Equal,
    #[token("==")]
    EqualEqual,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEqual,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEqual,

    // Literals. String and char lexemes keep their quotes; downstream
    // stages re-parse values from the lexeme when they need them.
    #[regex(r"[A-Za-z][A-Za-z0-9_]*")]
    Identifier,
    #[regex(r#""[^"]*""#)]
    Str,
    #[regex(r"[0-9]+")]
    NumberInt,
    #[regex(r"[0-9]+\.[0-9]+")]
    NumberFloat,
    #[regex(r"'([^'\\]|\\.)'")]
    CharLiteral,

    // Keywords.
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("function")]
    Function,
    #[token("const")]
    Const,
    #[token("none")]
    None,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("return")]
    Return,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("type")]
    Type,
    #[token("default")]
    Default,
    #[token("print")]
    Print,
    #[token("read_line")]
    ReadLine,

    // Type keywords.
    #[token("int64")]
    TypeInt64,
    #[token("float64")]
    TypeFloat64,
    #[token("bool")]
    TypeBool,
    #[token("char")]
    TypeChar,
    #[token("string")]
    TypeString,
    #[token("list")]
    TypeList,
    #[token("dictionary")]
    TypeDict,
    #[token("rox_result")]
    TypeResult,

    // Line comments survive as tokens: the parser filters them, the
    // formatter keeps them.
    #[regex(r"//[^\n]*")]
    Comment,

    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
}

pub struct Lexer<'a> {
    source: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer { source }
    }

    /// Scans the whole source into tokens, ending with a single `Eof`
    /// token. The first lexical error aborts the scan.
    pub fn scan_tokens(&self) -> Result<Vec<Token>, CompilerError> {
        let mut tokens = Vec::new();
        let mut lexer = TokenKind::lexer(self.source);
        let mut line = 1usize;
        let mut cursor = 0usize;

        while let Some(result) = lexer.next() {
            let span = lexer.span();
            let slice = lexer.slice();
            line += count_newlines(&self.source[cursor..span.start]);
            cursor = span.end;

            let kind = match result {
                Ok(kind) => kind,
                Err(()) => {
                    let offending = self.source[span.start..].chars().next().unwrap_or('\0');
                    let message = match offending {
                        '"' => "Unterminated string.",
                        '\'' => "Unterminated character literal.",
                        _ => "Unexpected character.",
                    };
                    return Err(CompilerError::Lex {
                        line,
                        lexeme: offending.to_string(),
                        message: message.to_string(),
                    });
                }
            };

            if kind == TokenKind::Identifier && slice.starts_with(RESERVED_PREFIX) {
                return Err(CompilerError::Lex {
                    line,
                    lexeme: slice.to_string(),
                    message: format!("The '{RESERVED_PREFIX}' prefix is reserved."),
                });
            }

            tokens.push(Token {
                kind,
                lexeme: slice.to_string(),
                line,
            });

            // String literals may span lines.
            line += count_newlines(slice);
        }

        line += count_newlines(&self.source[cursor..]);
        tokens.push(Token {
            kind: TokenKind::Eof,
            lexeme: String::new(),
            line,
        });
        Ok(tokens)
    }
}

fn count_newlines(s: &str) -> usize {
    s.bytes().filter(|&b| b == b'\n').count()
}
