use crate::ast::TypeAnn;
use crate::error::CompilerError;
use crate::lexer::TokenKind;

use super::Parser;

impl Parser {
    pub(super) fn parse_type(&mut self) -> Result<TypeAnn, CompilerError> {
        if self.match_any(&[
            TokenKind::TypeInt64,
            TokenKind::TypeFloat64,
            TokenKind::TypeBool,
            TokenKind::TypeChar,
            TokenKind::TypeString,
            TokenKind::None,
        ]) {
            return Ok(TypeAnn::Primitive(self.previous().clone()));
        }

        if self.match_token(TokenKind::TypeList) {
            self.consume(TokenKind::LeftBracket, "Expect '[' after 'list'.")?;
            let element = self.parse_type()?;
            self.consume(TokenKind::RightBracket, "Expect ']' after list element type.")?;
            return Ok(TypeAnn::List(Box::new(element)));
        }

        if self.match_token(TokenKind::TypeDict) {
            self.consume(TokenKind::LeftBracket, "Expect '[' after 'dictionary'.")?;
            let key = self.parse_type()?;
            self.consume(TokenKind::Comma, "Expect ',' after key type.")?;
            let value = self.parse_type()?;
            self.consume(
                TokenKind::RightBracket,
                "Expect ']' after dictionary value type.",
            )?;
            return Ok(TypeAnn::Dictionary(Box::new(key), Box::new(value)));
        }

        if self.match_token(TokenKind::TypeResult) {
            self.consume(TokenKind::LeftBracket, "Expect '[' after 'rox_result'.")?;
            let value = self.parse_type()?;
            self.consume(TokenKind::RightBracket, "Expect ']' after result value type.")?;
            return Ok(TypeAnn::Result(Box::new(value)));
        }

        Err(self.error_at(self.peek(), "Expect type."))
    }
}
