use crate::ast::{Param, Stmt};
use crate::error::CompilerError;
use crate::lexer::TokenKind;

use super::Parser;

/// Tokens that can open a variable declaration's type annotation.
const TYPE_STARTERS: &[TokenKind] = &[
    TokenKind::TypeInt64,
    TokenKind::TypeFloat64,
    TokenKind::TypeBool,
    TokenKind::TypeChar,
    TokenKind::TypeString,
    TokenKind::TypeList,
    TokenKind::TypeDict,
    TokenKind::TypeResult,
    TokenKind::None,
];

impl Parser {
    pub(super) fn parse_declaration(&mut self) -> Result<Stmt, CompilerError> {
        if self.match_token(TokenKind::Function) {
            return self.parse_function_declaration();
        }
        if self.match_token(TokenKind::Const) {
            return self.parse_var_declaration(true);
        }
        if self.check(TokenKind::Type) {
            return Err(self.error_at(self.peek(), "User-defined types are not supported."));
        }
        if TYPE_STARTERS.iter().any(|&kind| self.check(kind)) {
            return self.parse_var_declaration(false);
        }
        self.parse_statement()
    }

    fn parse_function_declaration(&mut self) -> Result<Stmt, CompilerError> {
        let name = self.consume(TokenKind::Identifier, "Expect function name.")?;
        self.consume(TokenKind::LeftParen, "Expect '(' after function name.")?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                let ty = self.parse_type()?;
                let param_name = self.consume(TokenKind::Identifier, "Expect parameter name.")?;
                params.push(Param { name: param_name, ty });
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.")?;

        // The arrow arrives as two adjacent tokens.
        self.consume(TokenKind::Minus, "Expect '->' before return type.")?;
        self.consume(TokenKind::Greater, "Expect '->' before return type.")?;
        let return_type = self.parse_type()?;

        self.consume(TokenKind::LeftBrace, "Expect '{' before function body.")?;
        let body = self.parse_block_statements()?;

        Ok(Stmt::Function {
            name,
            params,
            return_type,
            body,
        })
    }

    fn parse_var_declaration(&mut self, is_const: bool) -> Result<Stmt, CompilerError> {
        let ty = self.parse_type()?;
        let name = self.consume(TokenKind::Identifier, "Expect variable name.")?;
        let initializer = if self.match_token(TokenKind::Equal) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Let {
            name,
            ty,
            initializer,
            is_const,
        })
    }

    pub(super) fn parse_statement(&mut self) -> Result<Stmt, CompilerError> {
        if self.match_token(TokenKind::If) {
            return self.parse_if_statement();
        }
        if self.match_token(TokenKind::For) {
            return self.parse_for_statement();
        }
        if self.match_token(TokenKind::Return) {
            return self.parse_return_statement();
        }
        if self.match_token(TokenKind::Break) {
            let keyword = self.previous().clone();
            self.consume(TokenKind::Semicolon, "Expect ';' after 'break'.")?;
            return Ok(Stmt::Break(keyword));
        }
        if self.match_token(TokenKind::Continue) {
            let keyword = self.previous().clone();
            self.consume(TokenKind::Semicolon, "Expect ';' after 'continue'.")?;
            return Ok(Stmt::Continue(keyword));
        }
        if self.match_token(TokenKind::LeftBrace) {
            return Ok(Stmt::Block(self.parse_block_statements()?));
        }

        let expr = self.parse_expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expr(expr))
    }

    fn parse_block_statements(&mut self) -> Result<Vec<Stmt>, CompilerError> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.at_end() {
            statements.push(self.parse_declaration()?);
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn parse_if_statement(&mut self) -> Result<Stmt, CompilerError> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.match_token(TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_for_statement(&mut self) -> Result<Stmt, CompilerError> {
        let iterator = self.consume(TokenKind::Identifier, "Expect loop variable after 'for'.")?;
        // `in` is not in the keyword table; it arrives as an identifier.
        let keyword = self.consume(TokenKind::Identifier, "Expect 'in' after loop variable.")?;
        if keyword.lexeme != "in" {
            return Err(self.error_at(&keyword, "Expect 'in' after loop variable."));
        }
        let iterable = self.parse_expression()?;
        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::For {
            iterator,
            iterable,
            body,
        })
    }

    fn parse_return_statement(&mut self) -> Result<Stmt, CompilerError> {
        let keyword = self.previous().clone();
        let value = if !self.check(TokenKind::Semicolon) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }
}
