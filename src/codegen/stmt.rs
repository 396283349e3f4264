use crate::ast::{Expr, Param, Stmt, TypeAnn};
use crate::error::CompilerError;
use crate::lexer::{Token, TokenKind};

use super::{Codegen, VarInfo};

impl Codegen {
    pub(super) fn gen_stmt(&mut self, stmt: &Stmt) -> Result<(), CompilerError> {
        match stmt {
            Stmt::Block(statements) => self.gen_block(statements),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => self.gen_if(condition, then_branch, else_branch.as_deref()),
            Stmt::For {
                iterator,
                iterable,
                body,
            } => self.gen_for(iterator, iterable, body),
            Stmt::Function {
                name,
                params,
                return_type,
                body,
            } => self.gen_function(name, params, return_type, body),
            Stmt::Return { keyword, value } => self.gen_return(keyword, value.as_ref()),
            Stmt::Break(_) => {
                self.emit_line("break;");
                Ok(())
            }
            Stmt::Continue(_) => {
                self.emit_line("continue;");
                Ok(())
            }
            Stmt::Let {
                name,
                ty,
                initializer,
                is_const,
            } => self.gen_let(name, ty, initializer.as_ref(), *is_const),
            Stmt::Expr(expr) => {
                self.gen_expr(expr)?;
                self.emit_line(";");
                Ok(())
            }
        }
    }

    fn gen_block(&mut self, statements: &[Stmt]) -> Result<(), CompilerError> {
        self.emit_line("{");
        self.indent += 1;
        self.enter_scope();
        for stmt in statements {
            self.gen_stmt(stmt)?;
        }
        self.exit_scope()?;
        self.indent -= 1;
        self.emit_line("}");
        Ok(())
    }

    fn gen_if(
        &mut self,
        condition: &Expr,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
    ) -> Result<(), CompilerError> {
        // An `if (isOk(v))` condition with a bare variable argument
        // proves `v` inside the then branch, and only there.
        let refined = match condition {
            Expr::Call { callee, args, .. } if args.len() == 1 => {
                match (callee.as_ref(), &args[0]) {
                    (Expr::Variable(callee_name), Expr::Variable(arg))
                        if callee_name.lexeme == "isOk" =>
                    {
                        Some(arg.lexeme.clone())
                    }
                    _ => None,
                }
            }
            _ => None,
        };

        self.emit("if (");
        self.gen_expr(condition)?;
        self.emit(") ");

        self.enter_scope();
        if let Some(name) = refined {
            if let Some(outer) = self.resolve_var(&name) {
                let ty = outer.ty.clone();
                if let Some(scope) = self.scopes.last_mut() {
                    scope.insert(name, VarInfo { ty, proven_ok: true });
                }
            }
        }
        self.gen_stmt(then_branch)?;
        self.exit_scope()?;

        if let Some(else_branch) = else_branch {
            self.emit("else ");
            self.gen_stmt(else_branch)?;
        }
        Ok(())
    }

    fn gen_for(
        &mut self,
        iterator: &Token,
        iterable: &Expr,
        body: &Stmt,
    ) -> Result<(), CompilerError> {
        self.emit("for (auto ");
        let name = self.sanitize(&iterator.lexeme);
        self.emit(&name);
        self.emit(" : ");
        // The range() arity and literal-zero-step checks fire while the
        // iterable itself is generated.
        self.gen_expr(iterable)?;
        self.emit(") ");

        self.enter_scope();
        let element_ty = self.iterable_element_type(iterable);
        self.declare_var(&iterator.lexeme, element_ty)?;
        self.gen_stmt(body)?;
        self.exit_scope()?;
        Ok(())
    }

    fn iterable_element_type(&self, iterable: &Expr) -> Option<TypeAnn> {
        if let Expr::Call { callee, .. } = iterable {
            if let Expr::Variable(name) = callee.as_ref() {
                if name.lexeme == "range" {
                    return Some(TypeAnn::Primitive(Token {
                        kind: TokenKind::TypeInt64,
                        lexeme: "int64".to_string(),
                        line: name.line,
                    }));
                }
            }
        }
        match self.infer_type(iterable) {
            Some(TypeAnn::List(element)) => Some(*element),
            _ => None,
        }
    }

    fn gen_function(
        &mut self,
        name: &Token,
        params: &[Param],
        return_type: &TypeAnn,
        body: &[Stmt],
    ) -> Result<(), CompilerError> {
        let old_name = std::mem::replace(&mut self.current_function, name.lexeme.clone());
        let old_return = self.current_return_type.replace(return_type.clone());

        if name.lexeme == "main" {
            // main always becomes the host entry point.
            self.emit_line("int main() {");
            self.indent += 1;
            self.emit_line("std::cout << std::boolalpha;");
            self.enter_scope();
            for stmt in body {
                self.gen_stmt(stmt)?;
            }
            self.exit_scope()?;
            self.emit_line("return 0;");
            self.indent -= 1;
            self.emit_line("}");
        } else {
            self.gen_type(return_type);
            self.emit(" ");
            let fn_name = self.sanitize(&name.lexeme);
            self.emit(&fn_name);
            self.emit("(");
            for (i, param) in params.iter().enumerate() {
                if i > 0 {
                    self.emit(", ");
                }
                self.gen_type(&param.ty);
                self.emit(" ");
                let param_name = self.sanitize(&param.name.lexeme);
                self.emit(&param_name);
            }
            self.emit_line(") {");
            self.indent += 1;
            self.enter_scope();
            for param in params {
                self.declare_var(&param.name.lexeme, Some(param.ty.clone()))?;
            }
            for stmt in body {
                self.gen_stmt(stmt)?;
            }
            if return_type.is_none_type() {
                self.emit_line("return none;");
            }
            self.exit_scope()?;
            self.indent -= 1;
            self.emit_line("}");
        }

        self.current_function = old_name;
        self.current_return_type = old_return;
        Ok(())
    }

    fn gen_return(&mut self, keyword: &Token, value: Option<&Expr>) -> Result<(), CompilerError> {
        if self.current_function == "main" {
            // main lowers to `int main()`, so `return none;` becomes
            // `return 0;` and any other value is sequenced away.
            match value {
                None => self.emit_line("return 0;"),
                Some(Expr::Literal(tok)) if tok.kind == TokenKind::None => {
                    self.emit_line("return 0;")
                }
                Some(expr) => {
                    self.emit("return (");
                    self.gen_expr(expr)?;
                    self.emit_line(", 0);");
                }
            }
            return Ok(());
        }

        match value {
            Some(expr) => {
                self.emit("return ");
                self.gen_expr(expr)?;
                self.emit_line(";");
            }
            None => {
                let returns_none = self
                    .current_return_type
                    .as_ref()
                    .is_some_and(|ty| ty.is_none_type());
                if !returns_none {
                    return Err(CompilerError::Codegen {
                        line: keyword.line,
                        lexeme: keyword.lexeme.clone(),
                        message: "A bare 'return;' is only allowed in a function returning none."
                            .to_string(),
                    });
                }
                self.emit_line("return none;");
            }
        }
        Ok(())
    }

    fn gen_let(
        &mut self,
        name: &Token,
        ty: &TypeAnn,
        initializer: Option<&Expr>,
        is_const: bool,
    ) -> Result<(), CompilerError> {
        if is_const {
            self.emit("const ");
        }
        self.gen_type(ty);
        self.emit(" ");
        let var_name = self.sanitize(&name.lexeme);
        self.emit(&var_name);

        self.declare_var(&name.lexeme, Some(ty.clone()))?;

        let Some(init) = initializer else {
            self.emit_line("{};");
            return Ok(());
        };

        self.emit(" = ");

        // A list literal borrows its element type from the declaration,
        // so empty lists still deduce.
        if let (Expr::ListLiteral(elements), TypeAnn::List(element_ty)) = (init, ty) {
            self.emit("std::vector<");
            self.gen_type(element_ty);
            self.emit(">{");
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    self.emit(", ");
                }
                self.gen_expr(element)?;
            }
            self.emit_line("};");
            return Ok(());
        }

        self.gen_expr(init)?;
        self.emit_line(";");
        Ok(())
    }
}
