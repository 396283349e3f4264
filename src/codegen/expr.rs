use crate::ast::{Expr, TypeAnn};
use crate::error::CompilerError;
use crate::lexer::{Token, TokenKind};

use super::Codegen;

impl Codegen {
    pub(super) fn gen_expr(&mut self, expr: &Expr) -> Result<(), CompilerError> {
        match expr {
            Expr::Literal(token) => {
                self.gen_literal(token);
                Ok(())
            }
            Expr::Variable(name) => {
                let emitted = self.sanitize(&name.lexeme);
                self.emit(&emitted);
                Ok(())
            }
            Expr::ListLiteral(elements) => self.gen_list_literal(elements),
            Expr::Unary { op, operand } => self.gen_unary(op, operand),
            Expr::Binary { left, op, right } => self.gen_binary(left, op, right),
            Expr::Logical { left, op, right } => self.gen_logical(left, op, right),
            Expr::Assignment { name, value } => self.gen_assignment(name, value),
            Expr::Call { callee, paren, args } => self.gen_call(callee, paren, args),
            Expr::MethodCall { object, name, args } => self.gen_method_call(object, name, args),
        }
    }

    fn gen_literal(&mut self, token: &Token) {
        match token.kind {
            // The lexeme still carries its quotes.
            TokenKind::Str => {
                self.emit("rox_str(");
                self.emit(&token.lexeme);
                self.emit(")");
            }
            // Explicit 64-bit signedness keeps container element
            // deduction stable across hosts.
            TokenKind::NumberInt => {
                self.emit("((int64_t)");
                self.emit(&token.lexeme);
                self.emit(")");
            }
            TokenKind::None => self.emit("none"),
            _ => self.emit(&token.lexeme),
        }
    }

    fn gen_list_literal(&mut self, elements: &[Expr]) -> Result<(), CompilerError> {
        self.emit("std::vector{");
        for (i, element) in elements.iter().enumerate() {
            if i > 0 {
                self.emit(", ");
            }
            self.gen_expr(element)?;
        }
        self.emit("}");
        Ok(())
    }

    fn gen_unary(&mut self, op: &Token, operand: &Expr) -> Result<(), CompilerError> {
        match op.kind {
            TokenKind::Not | TokenKind::Bang => self.emit("(!"),
            _ => {
                self.emit("(");
                self.emit(&op.lexeme);
            }
        }
        self.gen_expr(operand)?;
        self.emit(")");
        Ok(())
    }

    fn gen_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> Result<(), CompilerError> {
        // `/` and `%` are fallible in the source language. They always go
        // through the checked helpers, which yield a result.
        let helper = match op.kind {
            TokenKind::Slash => Some("rox_div("),
            TokenKind::Percent => Some("rox_mod("),
            _ => None,
        };
        if let Some(helper) = helper {
            self.emit(helper);
            self.gen_expr(left)?;
            self.emit(", ");
            self.gen_expr(right)?;
            self.emit(")");
            return Ok(());
        }

        self.emit("(");
        self.gen_expr(left)?;
        self.emit(" ");
        self.emit(&op.lexeme);
        self.emit(" ");
        self.gen_expr(right)?;
        self.emit(")");
        Ok(())
    }

    fn gen_logical(&mut self, left: &Expr, op: &Token, right: &Expr) -> Result<(), CompilerError> {
        self.emit("(");
        self.gen_expr(left)?;
        self.emit(if op.kind == TokenKind::Or { " || " } else { " && " });
        self.gen_expr(right)?;
        self.emit(")");
        Ok(())
    }

    fn gen_assignment(&mut self, name: &Token, value: &Expr) -> Result<(), CompilerError> {
        // Any write invalidates an earlier isOk proof.
        self.invalidate_var(&name.lexeme);
        self.emit("(");
        let target = self.sanitize(&name.lexeme);
        self.emit(&target);
        self.emit(" = ");
        self.gen_expr(value)?;
        self.emit(")");
        Ok(())
    }

    fn gen_call(&mut self, callee: &Expr, paren: &Token, args: &[Expr]) -> Result<(), CompilerError> {
        if let Expr::Variable(callee_name) = callee {
            if callee_name.lexeme == "getValue" && args.len() == 1 {
                if let Expr::Variable(arg) = &args[0] {
                    if !self.proven_ok(&arg.lexeme) {
                        return Err(CompilerError::Codegen {
                            line: arg.line,
                            lexeme: arg.lexeme.clone(),
                            message: format!(
                                "getValue({0}) is unsafe. Variable '{0}' is not proven to be Ok in this scope. Wrap it in 'if (isOk({0}))'.",
                                arg.lexeme
                            ),
                        });
                    }
                }
            }
            if callee_name.lexeme == "range" {
                return self.gen_range(paren, args);
            }
        }

        self.gen_expr(callee)?;
        self.emit("(");
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.emit(", ");
            }
            self.gen_expr(arg)?;
        }
        self.emit(")");
        Ok(())
    }

    fn gen_range(&mut self, paren: &Token, args: &[Expr]) -> Result<(), CompilerError> {
        if args.len() != 3 {
            return Err(CompilerError::Codegen {
                line: paren.line,
                lexeme: "range".to_string(),
                message: "range() requires exactly 3 arguments: range(start, end, step).".to_string(),
            });
        }
        if let Expr::Literal(step) = &args[2] {
            if step.kind == TokenKind::NumberInt && step.lexeme == "0" {
                return Err(CompilerError::Codegen {
                    line: step.line,
                    lexeme: step.lexeme.clone(),
                    message: "range() step cannot be 0.".to_string(),
                });
            }
        }

        self.emit("RoxRange(");
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.emit(", ");
            }
            self.gen_expr(arg)?;
        }
        self.emit(")");
        Ok(())
    }

    fn gen_method_call(
        &mut self,
        object: &Expr,
        name: &Token,
        args: &[Expr],
    ) -> Result<(), CompilerError> {
        match name.lexeme.as_str() {
            "at" => self.gen_helper_call("rox_at", object, args),
            "get" => self.gen_helper_call("rox_get", object, args),
            "set" => {
                self.check_dict_set(object, name, args)?;
                self.gen_helper_call("rox_set", object, args)
            }
            "remove" => self.gen_helper_call("rox_remove", object, args),
            "has" => self.gen_helper_call("rox_has", object, args),
            "getKeys" => self.gen_helper_call("rox_keys", object, args),
            "getValue" => {
                if let Expr::Variable(var) = object {
                    if !self.proven_ok(&var.lexeme) {
                        return Err(CompilerError::Codegen {
                            line: var.line,
                            lexeme: var.lexeme.clone(),
                            message: format!(
                                "{0}.getValue() is unsafe. Variable '{0}' is not proven to be Ok in this scope. Wrap it in 'if (isOk({0}))'.",
                                var.lexeme
                            ),
                        });
                    }
                }
                self.emit("getValue(");
                self.gen_expr(object)?;
                self.emit(")");
                Ok(())
            }
            "append" => {
                self.check_list_append(object, name, args)?;
                self.gen_expr(object)?;
                self.emit(".push_back(");
                if let Some(arg) = args.first() {
                    self.gen_expr(arg)?;
                }
                self.emit(")");
                Ok(())
            }
            "pop" => {
                self.gen_expr(object)?;
                self.emit(".pop_back()");
                Ok(())
            }
            "size" => {
                self.emit("((int64_t)");
                self.gen_expr(object)?;
                self.emit(".size())");
                Ok(())
            }
            _ => {
                self.gen_expr(object)?;
                self.emit(".");
                let method = self.sanitize(&name.lexeme);
                self.emit(&method);
                self.emit("(");
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.emit(", ");
                    }
                    self.gen_expr(arg)?;
                }
                self.emit(")");
                Ok(())
            }
        }
    }

    fn gen_helper_call(
        &mut self,
        helper: &str,
        object: &Expr,
        args: &[Expr],
    ) -> Result<(), CompilerError> {
        self.emit(helper);
        self.emit("(");
        self.gen_expr(object)?;
        for arg in args {
            self.emit(", ");
            self.gen_expr(arg)?;
        }
        self.emit(")");
        Ok(())
    }

    fn check_list_append(
        &self,
        object: &Expr,
        name: &Token,
        args: &[Expr],
    ) -> Result<(), CompilerError> {
        let Some(TypeAnn::List(element_ty)) = self.infer_type(object) else {
            return Ok(());
        };
        if args.is_empty() {
            return Err(CompilerError::Codegen {
                line: name.line,
                lexeme: name.lexeme.clone(),
                message: "list.append expects 1 argument.".to_string(),
            });
        }
        if let Some(arg_ty) = self.infer_type(&args[0]) {
            if arg_ty != *element_ty {
                return Err(CompilerError::Codegen {
                    line: name.line,
                    lexeme: name.lexeme.clone(),
                    message: format!(
                        "List append type mismatch. Expected {element_ty} but got {arg_ty}."
                    ),
                });
            }
        }
        Ok(())
    }

    fn check_dict_set(
        &self,
        object: &Expr,
        name: &Token,
        args: &[Expr],
    ) -> Result<(), CompilerError> {
        let Some(TypeAnn::Dictionary(key_ty, value_ty)) = self.infer_type(object) else {
            return Ok(());
        };
        if args.len() < 2 {
            return Err(CompilerError::Codegen {
                line: name.line,
                lexeme: name.lexeme.clone(),
                message: "dictionary.set expects 2 arguments.".to_string(),
            });
        }
        if let Some(arg_ty) = self.infer_type(&args[0]) {
            if arg_ty != *key_ty {
                return Err(CompilerError::Codegen {
                    line: name.line,
                    lexeme: name.lexeme.clone(),
                    message: format!(
                        "Dictionary key type mismatch. Expected {key_ty} but got {arg_ty}."
                    ),
                });
            }
        }
        if let Some(arg_ty) = self.infer_type(&args[1]) {
            if arg_ty != *value_ty {
                return Err(CompilerError::Codegen {
                    line: name.line,
                    lexeme: name.lexeme.clone(),
                    message: format!(
                        "Dictionary value type mismatch. Expected {value_ty} but got {arg_ty}."
                    ),
                });
            }
        }
        Ok(())
    }

    /// Conservative, local inference: just enough to validate method-call
    /// arguments. Anything it cannot see returns None, which the checks
    /// treat as "unknown, let it through".
    pub(super) fn infer_type(&self, expr: &Expr) -> Option<TypeAnn> {
        match expr {
            Expr::Literal(token) => {
                let (kind, lexeme) = match token.kind {
                    TokenKind::NumberInt => (TokenKind::TypeInt64, "int64"),
                    TokenKind::NumberFloat => (TokenKind::TypeFloat64, "float64"),
                    TokenKind::Str => (TokenKind::TypeString, "string"),
                    TokenKind::CharLiteral => (TokenKind::TypeChar, "char"),
                    TokenKind::True | TokenKind::False => (TokenKind::TypeBool, "bool"),
                    TokenKind::None => (TokenKind::None, "none"),
                    _ => return None,
                };
                Some(TypeAnn::Primitive(Token {
                    kind,
                    lexeme: lexeme.to_string(),
                    line: token.line,
                }))
            }
            Expr::Variable(name) => self.resolve_var(&name.lexeme).and_then(|info| info.ty.clone()),
            _ => None,
        }
    }
}
