use crate::ast::Expr;
use crate::error::CompilerError;
use crate::lexer::{Token, TokenKind};

use super::Parser;

impl Parser {
    pub(super) fn parse_expression(&mut self) -> Result<Expr, CompilerError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr, CompilerError> {
        let expr = self.parse_precedence(0)?;

        if self.match_token(TokenKind::Equal) {
            let equals = self.previous().clone();
            let value = self.parse_assignment()?;
            return match expr {
                Expr::Variable(name) => Ok(Expr::Assignment {
                    name,
                    value: Box::new(value),
                }),
                _ => Err(self.error_at(&equals, "Invalid assignment target.")),
            };
        }

        Ok(expr)
    }

    fn infix_binding_power(kind: TokenKind) -> Option<(u8, u8)> {
        match kind {
            TokenKind::Or => Some((1, 2)),
            TokenKind::And => Some((3, 4)),
            TokenKind::EqualEqual | TokenKind::BangEqual => Some((5, 6)),
            TokenKind::Less
            | TokenKind::LessEqual
            | TokenKind::Greater
            | TokenKind::GreaterEqual => Some((7, 8)),
            TokenKind::Plus | TokenKind::Minus => Some((9, 10)),
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some((11, 12)),
            _ => None,
        }
    }

    fn parse_precedence(&mut self, min_bp: u8) -> Result<Expr, CompilerError> {
        let mut left = self.parse_unary()?;

        loop {
            let Some((l_bp, r_bp)) = Self::infix_binding_power(self.peek().kind) else {
                break;
            };
            if l_bp < min_bp {
                break;
            }

            let op = self.advance();
            let right = self.parse_precedence(r_bp)?;

            // Booleans are used directly, never compared against.
            if op.kind == TokenKind::EqualEqual
                && (Self::is_bool_literal(&left) || Self::is_bool_literal(&right))
            {
                return Err(self.error_at(
                    &op,
                    "Invalid comparison. Do not use '== true' or '== false'. Use 'if (cond)' or 'if (not cond)'.",
                ));
            }

            left = match op.kind {
                TokenKind::And | TokenKind::Or => Expr::Logical {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                _ => Expr::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
            };
        }

        Ok(left)
    }

    fn is_bool_literal(expr: &Expr) -> bool {
        matches!(expr, Expr::Literal(tok) if matches!(tok.kind, TokenKind::True | TokenKind::False))
    }

    fn parse_unary(&mut self) -> Result<Expr, CompilerError> {
        if self.match_any(&[TokenKind::Not, TokenKind::Minus, TokenKind::Bang]) {
            let op = self.previous().clone();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }
        self.parse_call()
    }

    fn parse_call(&mut self) -> Result<Expr, CompilerError> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.match_token(TokenKind::LeftParen) {
                let (args, paren) = self.parse_arguments()?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    paren,
                    args,
                };
            } else if self.match_token(TokenKind::Dot) {
                let name = self.consume(TokenKind::Identifier, "Expect method name after '.'.")?;
                self.consume(TokenKind::LeftParen, "Expect '(' after method name.")?;
                let (args, _) = self.parse_arguments()?;
                expr = Expr::MethodCall {
                    object: Box::new(expr),
                    name,
                    args,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_arguments(&mut self) -> Result<(Vec<Expr>, Token), CompilerError> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        let paren = self.consume(TokenKind::RightParen, "Expect ')' after arguments.")?;
        Ok((args, paren))
    }

    fn parse_primary(&mut self) -> Result<Expr, CompilerError> {
        if self.match_any(&[
            TokenKind::True,
            TokenKind::False,
            TokenKind::None,
            TokenKind::NumberInt,
            TokenKind::NumberFloat,
            TokenKind::Str,
            TokenKind::CharLiteral,
        ]) {
            return Ok(Expr::Literal(self.previous().clone()));
        }

        // `print` and `read_line` are keywords but callable by name.
        if self.match_any(&[TokenKind::Identifier, TokenKind::Print, TokenKind::ReadLine]) {
            return Ok(Expr::Variable(self.previous().clone()));
        }

        if self.match_token(TokenKind::LeftBracket) {
            let mut elements = Vec::new();
            if !self.check(TokenKind::RightBracket) {
                loop {
                    elements.push(self.parse_expression()?);
                    if !self.match_token(TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.consume(TokenKind::RightBracket, "Expect ']' after list elements.")?;
            return Ok(Expr::ListLiteral(elements));
        }

        if self.match_token(TokenKind::LeftParen) {
            let expr = self.parse_expression()?;
            self.consume(TokenKind::RightParen, "Expect ')' after expression.")?;
            return Ok(expr);
        }

        Err(self.error_at(self.peek(), "Expect expression."))
    }
}
