use crate::lexer::{Token, TokenKind};

/// Token-stream pretty-printer. Works on the unfiltered stream, so line
/// comments come along for the ride.
pub struct Formatter {
    tokens: Vec<Token>,
}

impl Formatter {
    pub fn new(tokens: Vec<Token>) -> Self {
        Formatter { tokens }
    }

    pub fn format(&self) -> String {
        let mut out = String::new();
        let mut indent: usize = 0;
        let mut start_of_line = true;

        for (i, token) in self.tokens.iter().enumerate() {
            if token.kind == TokenKind::Eof {
                break;
            }

            // A closing brace opening a line dedents itself.
            if token.kind == TokenKind::RightBrace && start_of_line && indent > 0 {
                indent -= 1;
            }

            // Collapse blank-line runs in the input to a single blank line.
            if i > 0 {
                let gap = token.line.saturating_sub(self.tokens[i - 1].line);
                if gap > 1 {
                    if !start_of_line {
                        out.push('\n');
                        start_of_line = true;
                    }
                    out.push('\n');
                }
            }

            if start_of_line {
                for _ in 0..indent {
                    out.push_str("    ");
                }
                start_of_line = false;
            }

            out.push_str(&token.lexeme);

            let mut newline_after = false;
            let mut space_after = false;
            match token.kind {
                TokenKind::LeftBrace => {
                    newline_after = true;
                    indent += 1;
                }
                TokenKind::RightBrace | TokenKind::Semicolon | TokenKind::Comment => {
                    newline_after = true;
                }
                _ => {
                    if let Some(next) = self.tokens.get(i + 1) {
                        space_after = !matches!(
                            next.kind,
                            TokenKind::Semicolon
                                | TokenKind::Comma
                                | TokenKind::Dot
                                | TokenKind::RightParen
                                | TokenKind::RightBracket
                                | TokenKind::Eof
                        ) && !matches!(
                            token.kind,
                            TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::Dot
                        );

                        // Call syntax hugs its paren; indexing-style
                        // brackets hug their subject.
                        if matches!(
                            token.kind,
                            TokenKind::Identifier | TokenKind::Print | TokenKind::ReadLine
                        ) && next.kind == TokenKind::LeftParen
                        {
                            space_after = false;
                        }
                        if matches!(
                            token.kind,
                            TokenKind::Identifier
                                | TokenKind::TypeList
                                | TokenKind::TypeDict
                                | TokenKind::TypeResult
                        ) && next.kind == TokenKind::LeftBracket
                        {
                            space_after = false;
                        }
                        // The two halves of '->' stay glued.
                        if token.kind == TokenKind::Minus && next.kind == TokenKind::Greater {
                            space_after = false;
                        }
                        if matches!(token.kind, TokenKind::If | TokenKind::For)
                            && next.kind == TokenKind::LeftParen
                        {
                            space_after = true;
                        }
                    }
                }
            }

            if newline_after {
                out.push('\n');
                start_of_line = true;
            } else if space_after {
                out.push(' ');
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::lexer::Lexer;

    use super::Formatter;

    fn fmt(source: &str) -> String {
        let tokens = Lexer::new(source).scan_tokens().unwrap();
        Formatter::new(tokens).format()
    }

    #[test]
    fn reflows_a_squashed_function() {
        let formatted = fmt("function main()->none{print(1);return none;}");
        assert_eq!(
            formatted,
            "function main() -> none {\n    print(1);\n    return none;\n}\n"
        );
    }

    #[test]
    fn keeps_comments_on_their_own_lines() {
        let formatted = fmt("// header\nint64 x = 1;");
        assert_eq!(formatted, "// header\nint64 x = 1;\n");
    }

    #[test]
    fn collapses_blank_line_runs() {
        let formatted = fmt("int64 a = 1;\n\n\n\nint64 b = 2;\n");
        assert_eq!(formatted, "int64 a = 1;\n\nint64 b = 2;\n");
    }

    #[test]
    fn nested_blocks_indent_by_four() {
        let formatted = fmt("function main()->none{if(true){print(1);}return none;}");
        assert_eq!(
            formatted,
            "function main() -> none {\n    if (true) {\n        print(1);\n    }\n    return none;\n}\n"
        );
    }

    #[test]
    fn list_types_and_literals_stay_tight() {
        let formatted = fmt("list[int64] xs=[1,2];");
        assert_eq!(formatted, "list[int64] xs = [1, 2];\n");
    }
}
