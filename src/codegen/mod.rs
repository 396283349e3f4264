mod expr;
mod preamble;
mod stmt;

use std::collections::HashMap;

use crate::ast::{Program, TypeAnn};
use crate::error::CompilerError;
use crate::lexer::{BUILTINS, KEYWORDS, RESERVED_PREFIX};

use preamble::PREAMBLE;

/// Per-variable facts tracked while walking the tree. `proven_ok` is the
/// flow-sensitive bit: true only inside a then-branch guarded by
/// `isOk(v)`, and cleared again by any assignment to the variable.
struct VarInfo {
    ty: Option<TypeAnn>,
    proven_ok: bool,
}

type Scope = HashMap<String, VarInfo>;

pub struct Codegen {
    out: String,
    indent: usize,
    current_function: String,
    current_return_type: Option<TypeAnn>,
    scopes: Vec<Scope>,
}

impl Codegen {
    pub fn new() -> Self {
        Codegen {
            out: String::new(),
            indent: 0,
            current_function: String::new(),
            current_return_type: None,
            scopes: vec![Scope::new()],
        }
    }

    pub fn generate(&mut self, program: &Program) -> Result<String, CompilerError> {
        self.out.push_str(PREAMBLE);
        for stmt in &program.statements {
            self.gen_stmt(stmt)?;
        }
        Ok(std::mem::take(&mut self.out))
    }

    fn enter_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    fn exit_scope(&mut self) -> Result<(), CompilerError> {
        match self.scopes.pop() {
            Some(_) => Ok(()),
            None => Err(CompilerError::Internal {
                message: "unbalanced scope exit".to_string(),
            }),
        }
    }

    fn declare_var(&mut self, name: &str, ty: Option<TypeAnn>) -> Result<(), CompilerError> {
        match self.scopes.last_mut() {
            Some(scope) => {
                scope.insert(name.to_string(), VarInfo { ty, proven_ok: false });
                Ok(())
            }
            None => Err(CompilerError::Internal {
                message: "declaration outside of any scope".to_string(),
            }),
        }
    }

    fn resolve_var(&self, name: &str) -> Option<&VarInfo> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Clears the refinement bit on the nearest binding of `name`.
    fn invalidate_var(&mut self, name: &str) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(info) = scope.get_mut(name) {
                info.proven_ok = false;
                return;
            }
        }
    }

    fn proven_ok(&self, name: &str) -> bool {
        self.resolve_var(name).map(|info| info.proven_ok).unwrap_or(false)
    }

    /// Appends text, indenting first when at the start of a line.
    fn emit(&mut self, s: &str) {
        if self.out.ends_with('\n') {
            for _ in 0..self.indent {
                self.out.push_str("  ");
            }
        }
        self.out.push_str(s);
    }

    fn emit_line(&mut self, s: &str) {
        self.emit(s);
        self.out.push('\n');
    }

    /// Keywords and builtins pass through; every other identifier gets
    /// the reserved prefix. The lexer already rejected user identifiers
    /// carrying it, so the two namespaces cannot collide.
    fn sanitize(&self, name: &str) -> String {
        if KEYWORDS.contains(name) || BUILTINS.contains(name) {
            name.to_string()
        } else {
            format!("{RESERVED_PREFIX}{name}")
        }
    }

    fn gen_type(&mut self, ty: &TypeAnn) {
        match ty {
            TypeAnn::Primitive(tok) => match tok.lexeme.as_str() {
                "int64" => self.emit("int64_t"),
                "float64" => self.emit("double"),
                "string" => self.emit("RoxString"),
                "none" => self.emit("None"),
                // bool and char match their host spellings.
                "bool" => self.emit("bool"),
                "char" => self.emit("char"),
                other => {
                    let fallback = other.to_string();
                    self.emit(&fallback);
                }
            },
            TypeAnn::List(element) => {
                self.emit("std::vector<");
                self.gen_type(element);
                self.emit(">");
            }
            TypeAnn::Dictionary(key, value) => {
                self.emit("std::unordered_map<");
                self.gen_type(key);
                self.emit(", ");
                self.gen_type(value);
                self.emit(">");
            }
            TypeAnn::Result(value) => {
                self.emit("rox_result<");
                self.gen_type(value);
                self.emit(">");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::CompilerError;
    use crate::generate;

    fn gen(source: &str) -> String {
        generate(source).unwrap()
    }

    fn gen_err(source: &str) -> CompilerError {
        generate(source).unwrap_err()
    }

    fn user_code(cc: &str) -> &str {
        cc.split("// End Runtime").nth(1).unwrap()
    }

    #[test]
    fn main_is_lowered_specially() {
        let cc = gen("function main() -> none {\n    print(\"hi\");\n    return none;\n}\n");
        let body = user_code(&cc);
        assert!(body.contains("int main() {"));
        assert!(body.contains("std::cout << std::boolalpha;"));
        assert!(body.contains("print(rox_str(\"hi\"));"));
        assert!(body.contains("return 0;"));
        assert!(!body.contains("return none;"));
    }

    #[test]
    fn user_identifiers_get_the_reserved_prefix() {
        let cc = gen("function main() -> none { int64 count = 1; print(count); return none; }");
        assert!(cc.contains("int64_t roxv26_count = ((int64_t)1);"));
        assert!(cc.contains("print(roxv26_count);"));
    }

    #[test]
    fn builtins_and_keywords_pass_through() {
        let cc = gen("function main() -> none { float64 x = pi; print(float64_sqrt(x)); return none; }");
        assert!(cc.contains("double roxv26_x = pi;"));
        assert!(cc.contains("float64_sqrt(roxv26_x)"));
    }

    #[test]
    fn division_and_modulo_become_checked_helpers() {
        let cc = gen("function main() -> none { int64 q = getValue(10 / 0); print(q % 3); return none; }");
        assert!(cc.contains("getValue(rox_div(((int64_t)10), ((int64_t)0)))"));
        assert!(cc.contains("rox_mod(roxv26_q, ((int64_t)3))"));
    }

    #[test]
    fn guarded_get_value_is_accepted() {
        let cc = gen(
            "function main() -> none {\n\
             list[int64] xs = [10, 20, 30];\n\
             rox_result[int64] r = xs.at(1);\n\
             if (isOk(r)) { print(getValue(r)); }\n\
             return none;\n}\n",
        );
        assert!(cc.contains("rox_at(roxv26_xs, ((int64_t)1))"));
        assert!(cc.contains("if (isOk(roxv26_r)) {"));
        assert!(cc.contains("print(getValue(roxv26_r));"));
    }

    #[test]
    fn unguarded_get_value_is_rejected() {
        let err = gen_err(
            "function main() -> none {\n\
             list[int64] xs = [10, 20, 30];\n\
             rox_result[int64] r = xs.at(1);\n\
             print(getValue(r));\n\
             return none;\n}\n",
        );
        let message = err.to_string();
        assert!(message.contains("'r' is not proven to be Ok"), "{message}");
        assert!(message.contains("if (isOk(r))"), "{message}");
    }

    #[test]
    fn refinement_does_not_reach_the_else_branch() {
        let err = gen_err(
            "function main() -> none {\n\
             rox_result[int64] r = ok(1);\n\
             if (isOk(r)) { print(1); } else { print(getValue(r)); }\n\
             return none;\n}\n",
        );
        assert!(err.to_string().contains("not proven to be Ok"));
    }

    #[test]
    fn nested_guards_stay_proven() {
        let cc = gen(
            "function main() -> none {\n\
             rox_result[int64] v = ok(1);\n\
             if (isOk(v)) { if (isOk(v)) { print(getValue(v)); } }\n\
             return none;\n}\n",
        );
        assert!(cc.contains("print(getValue(roxv26_v));"));
    }

    #[test]
    fn assignment_clears_the_refinement() {
        let err = gen_err(
            "function main() -> none {\n\
             list[int64] xs = [1];\n\
             rox_result[int64] v = xs.at(0);\n\
             if (isOk(v)) { v = xs.at(9); print(getValue(v)); }\n\
             return none;\n}\n",
        );
        assert!(err.to_string().contains("'v' is not proven to be Ok"));
    }

    #[test]
    fn method_form_of_get_value_is_checked_too() {
        let err = gen_err(
            "function main() -> none {\n\
             rox_result[int64] v = ok(1);\n\
             print(v.getValue());\n\
             return none;\n}\n",
        );
        assert!(err.to_string().contains("v.getValue() is unsafe"));
    }

    #[test]
    fn range_arity_is_enforced() {
        let err = gen_err("function main() -> none { for i in range(0, 5) { print(i); } return none; }");
        assert!(err
            .to_string()
            .contains("range() requires exactly 3 arguments"));
    }

    #[test]
    fn literal_zero_step_fails_at_generation_time() {
        let err = gen_err("function main() -> none { for i in range(0, 5, 0) { print(i); } return none; }");
        assert!(err.to_string().contains("range() step cannot be 0."));
    }

    #[test]
    fn non_literal_zero_step_is_left_to_the_runtime() {
        let cc = gen(
            "function main() -> none { int64 st = 0; for i in range(0, 5, st) { print(i); } return none; }",
        );
        assert!(cc.contains("RoxRange(((int64_t)0), ((int64_t)5), roxv26_st)"));
    }

    #[test]
    fn empty_list_initializer_takes_the_declared_element_type() {
        let cc = gen("function main() -> none { list[int64] xs = []; print(xs.size()); return none; }");
        assert!(cc.contains("std::vector<int64_t> roxv26_xs = std::vector<int64_t>{};"));
        assert!(cc.contains("((int64_t)roxv26_xs.size())"));
    }

    #[test]
    fn list_append_type_mismatch_is_fatal() {
        let err = gen_err(
            "function main() -> none { list[int64] xs = []; xs.append(1.5); return none; }",
        );
        assert_eq!(
            err.to_string(),
            "[line 1] Error at 'append': List append type mismatch. Expected int64 but got float64."
        );
    }

    #[test]
    fn dictionary_set_type_mismatch_is_fatal() {
        let err = gen_err(
            "function main() -> none { dictionary[string, int64] d; d.set(1, 2); return none; }",
        );
        assert!(err.to_string().contains("Dictionary key type mismatch."));

        let err = gen_err(
            "function main() -> none { dictionary[string, int64] d; d.set(\"k\", 1.5); return none; }",
        );
        assert!(err.to_string().contains("Dictionary value type mismatch."));
    }

    #[test]
    fn container_methods_lower_to_helpers() {
        let cc = gen(
            "function main() -> none {\n\
             dictionary[string, int64] ages;\n\
             ages.set(\"ada\", 36);\n\
             if (ages.has(\"ada\")) { print(getValue(ages.get(\"ada\"))); }\n\
             ages.remove(\"ada\");\n\
             list[string] names = ages.getKeys();\n\
             return none;\n}\n",
        );
        assert!(cc.contains("rox_set(roxv26_ages, rox_str(\"ada\"), ((int64_t)36))"));
        assert!(cc.contains("rox_has(roxv26_ages, rox_str(\"ada\"))"));
        assert!(cc.contains("rox_remove(roxv26_ages, rox_str(\"ada\"))"));
        assert!(cc.contains("rox_keys(roxv26_ages)"));
    }

    #[test]
    fn get_value_on_a_computed_result_is_not_flow_checked() {
        // Only bare variables carry refinement; expressions defer to the
        // runtime check inside getValue.
        let cc = gen("function main() -> none { print(getValue(rox_div(1, 1))); return none; }");
        assert!(cc.contains("getValue(rox_div("));
    }

    #[test]
    fn bare_return_outside_none_function_is_rejected() {
        let err = gen_err("function f() -> int64 { return; }\nfunction main() -> none { return none; }");
        assert!(err
            .to_string()
            .contains("A bare 'return;' is only allowed in a function returning none."));
    }

    #[test]
    fn none_functions_get_an_implicit_return() {
        let cc = gen("function shout() -> none { print(\"!\"); }\nfunction main() -> none { shout(); return none; }");
        let body = user_code(&cc);
        assert!(body.contains("None roxv26_shout() {"));
        assert!(body.contains("return none;"));
    }

    #[test]
    fn function_parameters_are_typed_and_prefixed() {
        let cc = gen(
            "function add(int64 a, int64 b) -> int64 { return a + b; }\n\
             function main() -> none { print(add(1, 2)); return none; }",
        );
        assert!(cc.contains("int64_t roxv26_add(int64_t roxv26_a, int64_t roxv26_b) {"));
        assert!(cc.contains("return (roxv26_a + roxv26_b);"));
        assert!(cc.contains("roxv26_add(((int64_t)1), ((int64_t)2))"));
    }

    #[test]
    fn result_params_need_their_own_guard() {
        let err = gen_err(
            "function unwrap(rox_result[int64] r) -> int64 { return getValue(r); }\n\
             function main() -> none { return none; }",
        );
        assert!(err.to_string().contains("'r' is not proven to be Ok"));

        let cc = gen(
            "function unwrap(rox_result[int64] r) -> int64 {\n\
             if (isOk(r)) { return getValue(r); }\n\
             return 0;\n}\n\
             function main() -> none { return none; }",
        );
        assert!(cc.contains("if (isOk(roxv26_r)) {"));
    }

    #[test]
    fn loop_variables_are_scoped_and_refinable() {
        let cc = gen(
            "function main() -> none {\n\
             list[rox_result[int64]] results = [];\n\
             for r in results { if (isOk(r)) { print(getValue(r)); } }\n\
             return none;\n}\n",
        );
        assert!(cc.contains("for (auto roxv26_r : roxv26_results) {"));
        assert!(cc.contains("print(getValue(roxv26_r));"));
    }

    #[test]
    fn logical_operators_short_circuit_in_the_host() {
        let cc = gen("function main() -> none { bool x = true and false or true; return none; }");
        assert!(cc.contains("((true && false) || true)"));
    }

    #[test]
    fn unary_not_lowers_to_bang() {
        let cc = gen("function main() -> none { bool x = not false; int64 y = -3; return none; }");
        assert!(cc.contains("(!false)"));
        assert!(cc.contains("(-((int64_t)3))"));
    }

    #[test]
    fn output_is_deterministic() {
        let source = "function main() -> none {\n\
                      dictionary[string, int64] d;\n\
                      d.set(\"a\", 1);\n\
                      return none;\n}\n";
        assert_eq!(generate(source).unwrap(), generate(source).unwrap());
    }

    #[test]
    fn generated_output_starts_with_the_preamble() {
        let cc = gen("function main() -> none { return none; }");
        assert!(cc.starts_with("#include <iostream>"));
        let body = cc.split("// End Runtime").nth(1).unwrap();
        assert!(body.contains("int main() {"));
    }
}
