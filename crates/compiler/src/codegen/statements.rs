//! Statement lowering
//!
//! Each statement generator returns whether it terminated the current block
//! (a `return` did); compound statements stop emitting after the first
//! terminating statement. Control flow follows the block shapes:
//! if → `then`/`else`/`ifcont`, while → `while.cond`/`while.body`/
//! `while.after`, for → `for.cond`/`for.body`/`for.incr`/`for.after`,
//! switch → `switch.case*`/`switch.default`/`switch.after`.
//!
//! Switch keeps fall-to-default semantics: a case body that does not
//! terminate branches to the default block. The `switch.after` block exists
//! so every block still ends in exactly one terminator.

use super::types::{float_rank, is_float_type, is_int_type, wrap_array_type};
use super::{CodeGen, LocalSlot};
use crate::ast::{Statement, VarDecl};
use crate::error::CodeGenError;

impl CodeGen {
    pub(super) fn gen_statement(&mut self, stmt: &Statement) -> Result<bool, CodeGenError> {
        match stmt {
            Statement::Compound(stmts) => {
                self.push_scope();
                let mut terminated = false;
                for s in stmts {
                    terminated = self.gen_statement(s)?;
                    if terminated {
                        break;
                    }
                }
                self.pop_scope();
                Ok(terminated)
            }
            Statement::Expression(expr) => {
                self.gen_expression(expr)?;
                Ok(false)
            }
            Statement::VarDecl(var) => {
                self.gen_local_decl(var)?;
                Ok(false)
            }
            Statement::MultiVarDecl(vars) => {
                for var in vars {
                    self.gen_local_decl(var)?;
                }
                Ok(false)
            }
            Statement::Declaration(_) => {
                // Local enums were folded into the registry during analysis;
                // nothing to emit.
                Ok(false)
            }
            Statement::Return(expr) => self.gen_return(expr.as_ref()),
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let cond = self.gen_expression(condition)?;
                let cond = self.to_bool(cond)?;
                let then_bb = self.new_block("then");
                let else_bb = self.new_block("else");
                let merge_bb = self.new_block("ifcont");
                self.terminate(format!(
                    "br i1 {}, label %{}, label %{}",
                    cond.text, then_bb, else_bb
                ));

                self.position_at(&then_bb);
                let then_terminated = self.gen_statement(then_branch)?;
                if !then_terminated {
                    self.terminate(format!("br label %{}", merge_bb));
                }

                self.position_at(&else_bb);
                let else_terminated = match else_branch {
                    Some(else_branch) => self.gen_statement(else_branch)?,
                    None => false,
                };
                if !else_terminated {
                    self.terminate(format!("br label %{}", merge_bb));
                }

                self.position_at(&merge_bb);
                Ok(false)
            }
            Statement::While { condition, body } => {
                let cond_bb = self.new_block("while.cond");
                let body_bb = self.new_block("while.body");
                let after_bb = self.new_block("while.after");
                self.terminate(format!("br label %{}", cond_bb));

                self.position_at(&cond_bb);
                let cond = self.gen_expression(condition)?;
                let cond = self.to_bool(cond)?;
                self.terminate(format!(
                    "br i1 {}, label %{}, label %{}",
                    cond.text, body_bb, after_bb
                ));

                self.position_at(&body_bb);
                let body_terminated = self.gen_statement(body)?;
                if !body_terminated {
                    self.terminate(format!("br label %{}", cond_bb));
                }

                self.position_at(&after_bb);
                Ok(false)
            }
            Statement::For {
                init,
                condition,
                step,
                body,
            } => {
                self.push_scope();
                self.gen_statement(init)?;

                let cond_bb = self.new_block("for.cond");
                let body_bb = self.new_block("for.body");
                let incr_bb = self.new_block("for.incr");
                let after_bb = self.new_block("for.after");
                self.terminate(format!("br label %{}", cond_bb));

                self.position_at(&cond_bb);
                let cond = match condition {
                    Some(condition) => {
                        let value = self.gen_expression(condition)?;
                        self.to_bool(value)?
                    }
                    // No condition: loop forever.
                    None => super::Value::new("true", "i1"),
                };
                self.terminate(format!(
                    "br i1 {}, label %{}, label %{}",
                    cond.text, body_bb, after_bb
                ));

                self.position_at(&body_bb);
                let body_terminated = self.gen_statement(body)?;
                if !body_terminated {
                    self.terminate(format!("br label %{}", incr_bb));
                }

                self.position_at(&incr_bb);
                if let Some(step) = step {
                    self.gen_expression(step)?;
                }
                self.terminate(format!("br label %{}", cond_bb));

                self.position_at(&after_bb);
                self.pop_scope();
                Ok(false)
            }
            Statement::Switch {
                scrutinee,
                cases,
                default,
            } => self.gen_switch(scrutinee, cases, default.as_deref()),
        }
    }

    fn gen_return(&mut self, expr: Option<&crate::ast::Expression>) -> Result<bool, CodeGenError> {
        let ret_decl = self.current_ret_decl.clone();
        let expected = self.lower_type(&ret_decl)?;
        match expr {
            None => {
                if expected != "void" {
                    return Err(CodeGenError::mismatch(
                        "return value type does not match function return type",
                    ));
                }
                self.terminate("ret void".to_string());
            }
            Some(expr) => {
                let mut value = self.gen_expression(expr)?;
                if value.ty != expected {
                    if value.ty == "i1" && expected == "i32" {
                        let widened = self.fresh_temp();
                        self.emit(format!("{} = zext i1 {} to i32", widened, value.text));
                        value = super::Value::new(widened, "i32");
                    } else if is_int_type(&value.ty) && is_int_type(&expected) {
                        value = self.int_cast(value, &expected)?;
                    } else {
                        return Err(CodeGenError::mismatch(
                            "return value type does not match function return type",
                        ));
                    }
                }
                self.terminate(format!("ret {} {}", value.ty, value.text));
            }
        }
        Ok(true)
    }

    fn gen_switch(
        &mut self,
        scrutinee: &crate::ast::Expression,
        cases: &[(crate::ast::Expression, Statement)],
        default: Option<&Statement>,
    ) -> Result<bool, CodeGenError> {
        let value = self.gen_expression(scrutinee)?;
        if !is_int_type(&value.ty) {
            return Err(CodeGenError::mismatch(
                "switch expression must be of integer type",
            ));
        }

        // Fold every label before creating blocks; labels must be
        // compile-time integer constants.
        let mut labels = Vec::with_capacity(cases.len());
        for (label_expr, _) in cases {
            let folded = self
                .fold_int_const(label_expr)
                .ok_or(CodeGenError::CaseNotConst)?;
            labels.push(folded);
        }

        let default_bb = self.new_block("switch.default");
        let case_bbs: Vec<String> = (0..cases.len())
            .map(|_| self.new_block("switch.case"))
            .collect();
        let after_bb = self.new_block("switch.after");

        let pairs = labels
            .iter()
            .zip(case_bbs.iter())
            .map(|(label, bb)| format!("{} {}, label %{}", value.ty, label, bb))
            .collect::<Vec<_>>()
            .join(" ");
        self.terminate(format!(
            "switch {} {}, label %{} [ {} ]",
            value.ty, value.text, default_bb, pairs
        ));

        for ((_, body), case_bb) in cases.iter().zip(case_bbs.iter()) {
            self.position_at(case_bb);
            let terminated = self.gen_statement(body)?;
            if !terminated {
                // Unterminated case bodies fall through to the default
                // block.
                self.terminate(format!("br label %{}", default_bb));
            }
        }

        self.position_at(&default_bb);
        match default {
            Some(body) => {
                let terminated = self.gen_statement(body)?;
                if !terminated {
                    self.terminate(format!("br label %{}", after_bb));
                }
            }
            None => {
                self.terminate("unreachable".to_string());
            }
        }

        self.position_at(&after_bb);
        Ok(false)
    }

    fn gen_local_decl(&mut self, var: &VarDecl) -> Result<(), CodeGenError> {
        if var.ty == "void" {
            return Err(CodeGenError::UnsupportedType {
                ty: "void".to_string(),
            });
        }
        let element_ty = self.lower_type(&var.ty)?;
        let dims = self.fold_dimensions(&var.dims)?;
        let llvm_ty = wrap_array_type(&element_ty, &dims);
        let slot = self.fresh_slot(&var.name);
        self.emit(format!("{} = alloca {}", slot, llvm_ty));
        self.insert_local(
            &var.name,
            LocalSlot {
                reg: slot.clone(),
                decl_ty: var.ty.clone(),
                llvm_ty: llvm_ty.clone(),
                dims: dims.clone(),
            },
        );

        match &var.init {
            None => {}
            Some(crate::ast::Expression::InitializerList(elements)) => {
                self.init_local_array(var, &slot, &element_ty, &dims, elements)?;
            }
            Some(init) => {
                let value = self.gen_expression(init)?;
                let value = self.convert_initializer(value, &llvm_ty, &var.name)?;
                self.emit(format!("store {} {}, ptr {}", value.ty, value.text, slot));
            }
        }
        Ok(())
    }

    /// Store each list element into its slot; trailing missing elements are
    /// zeroed, extra elements are an error.
    fn init_local_array(
        &mut self,
        var: &VarDecl,
        slot: &str,
        element_ty: &str,
        dims: &[u64],
        elements: &[crate::ast::Expression],
    ) -> Result<(), CodeGenError> {
        if dims.len() != 1 {
            return Err(CodeGenError::mismatch(format!(
                "initializer list for '{}' requires a single-dimension array",
                var.name
            )));
        }
        let size = dims[0] as usize;
        if elements.len() > size {
            return Err(CodeGenError::mismatch(format!(
                "too many initializer elements for '{}' (expected at most {}, got {})",
                var.name,
                size,
                elements.len()
            )));
        }
        let array_ty = wrap_array_type(element_ty, dims);
        for i in 0..size {
            let value = match elements.get(i) {
                Some(element) => {
                    let value = self.gen_expression(element)?;
                    self.convert_initializer(value, element_ty, &var.name)?
                }
                None => super::Value::new(
                    super::globals::zero_value(element_ty),
                    element_ty.to_string(),
                ),
            };
            let element_ptr = self.fresh_temp();
            self.emit(format!(
                "{} = getelementptr inbounds {}, ptr {}, i32 0, i32 {}",
                element_ptr, array_ty, slot, i
            ));
            self.emit(format!(
                "store {} {}, ptr {}",
                value.ty, value.text, element_ptr
            ));
        }
        Ok(())
    }

    /// Float initializers widen or narrow to the declared type; any other
    /// mismatch is an error.
    fn convert_initializer(
        &mut self,
        value: super::Value,
        target_ty: &str,
        name: &str,
    ) -> Result<super::Value, CodeGenError> {
        if value.ty == target_ty {
            return Ok(value);
        }
        if is_float_type(&value.ty) && is_float_type(target_ty) {
            let converted = self.fresh_temp();
            let inst = if float_rank(&value.ty) > float_rank(target_ty) {
                "fptrunc"
            } else {
                "fpext"
            };
            self.emit(format!(
                "{} = {} {} {} to {}",
                converted, inst, value.ty, value.text, target_ty
            ));
            return Ok(super::Value::new(converted, target_ty.to_string()));
        }
        Err(CodeGenError::mismatch(format!(
            "incompatible initializer type in local variable declaration '{}'",
            name
        )))
    }
}

#[cfg(test)]
mod tests {
    use crate::codegen::CodeGen;
    use crate::error::CodeGenError;
    use crate::parser::parse_source;
    use crate::sema::SemanticAnalyzer;

    fn lower(source: &str) -> Result<String, CodeGenError> {
        let mut program = parse_source(source).unwrap();
        let registry = SemanticAnalyzer::new().analyze(&mut program).unwrap();
        CodeGen::new(registry).codegen_program(&program)
    }

    #[test]
    fn test_if_else_blocks() {
        let ir = lower("int main() { if (1 < 2) { return 1; } else { return 2; } }").unwrap();
        assert!(ir.contains("br i1"));
        assert!(ir.contains("then.0:"));
        assert!(ir.contains("else.1:"));
        assert!(ir.contains("ifcont.2:"));
        assert!(ir.contains("ret i32 1"));
        assert!(ir.contains("ret i32 2"));
    }

    #[test]
    fn test_if_non_bool_condition_compared_to_zero() {
        let ir = lower("int main() { int x = 3; if (x) { return 1; } return 0; }").unwrap();
        assert!(ir.contains("icmp ne i32"));
    }

    #[test]
    fn test_while_loop_shape() {
        let ir = lower(
            "int main() { int i = 0; while (i < 10) { i = i + 1; } return i; }",
        )
        .unwrap();
        assert!(ir.contains("while.cond.0:"));
        assert!(ir.contains("while.body.1:"));
        assert!(ir.contains("while.after.2:"));
        assert!(ir.contains("icmp slt i32"));
    }

    #[test]
    fn test_for_loop_shape() {
        let ir = lower(
            "int main() { int s = 0; for (int i = 0; i < 4; i++) { s += i; } return s; }",
        )
        .unwrap();
        assert!(ir.contains("for.cond."));
        assert!(ir.contains("for.body."));
        assert!(ir.contains("for.incr."));
        assert!(ir.contains("for.after."));
    }

    #[test]
    fn test_for_absent_condition_is_true() {
        let ir = lower("int main() { for (int i = 0; ; i++) { return i; } }").unwrap();
        assert!(ir.contains("br i1 true"));
    }

    #[test]
    fn test_switch_emits_switch_instruction() {
        let ir = lower(
            "int main() { int x = 1; switch (x) { case 0: return 10; case 1: return 11; default: return 12; } }",
        )
        .unwrap();
        assert!(ir.contains("switch i32"));
        assert!(ir.contains("i32 0, label %switch.case."));
        assert!(ir.contains("i32 1, label %switch.case."));
        assert!(ir.contains("switch.default."));
    }

    #[test]
    fn test_switch_case_labels_must_fold() {
        let err = lower(
            "int main() { int x = 1; int y = 2; switch (x) { case y: return 1; default: return 0; } }",
        )
        .unwrap_err();
        assert!(matches!(err, CodeGenError::CaseNotConst));
    }

    #[test]
    fn test_switch_enum_labels_fold() {
        let ir = lower(
            "enum Op { ADD, SUB };\nint main() { enum Op o = SUB; switch (o) { case ADD: return 1; case SUB: return 2; default: return 0; } }",
        )
        .unwrap();
        assert!(ir.contains("i32 1, label %switch.case."));
    }

    #[test]
    fn test_switch_only_default() {
        let ir =
            lower("int main() { int x = 5; switch (x) { default: return 9; } return 0; }").unwrap();
        assert!(ir.contains("switch i32"));
        assert!(ir.contains("ret i32 9"));
    }

    #[test]
    fn test_unterminated_case_falls_to_default() {
        let ir = lower(
            "int main() { int r = 0; switch (r) { case 0: r = 1; default: r = 2; } return r; }",
        )
        .unwrap();
        // The case body branches to the default block, not past the switch.
        assert!(ir.contains("br label %switch.default."));
    }

    #[test]
    fn test_local_float_narrowing_initializer() {
        let ir = lower("int main() { float f = 1.5; return 0; }").unwrap();
        assert!(ir.contains("fptrunc double"));
    }

    #[test]
    fn test_return_bool_widens_to_int() {
        let ir = lower("int main() { return 1 < 2; }").unwrap();
        assert!(ir.contains("zext i1"));
    }

    #[test]
    fn test_return_in_void_function_with_value_rejected() {
        let err = lower("void f() { return 1; }").unwrap_err();
        assert!(matches!(err, CodeGenError::TypeMismatch { .. }));
    }

    #[test]
    fn test_local_array_initializer_list() {
        let ir = lower("int main() { int src[5] = {1, 2, 3}; return src[0]; }").unwrap();
        assert!(ir.contains("alloca [5 x i32]"));
        assert!(ir.contains("store i32 1"));
        assert!(ir.contains("store i32 3"));
        // Trailing elements zero-fill.
        assert!(ir.contains("store i32 0"));
    }

    #[test]
    fn test_local_array_initializer_excess_rejected() {
        let err = lower("int main() { int src[2] = {1, 2, 3}; return 0; }").unwrap_err();
        assert!(matches!(err, CodeGenError::TypeMismatch { .. }));
    }

    #[test]
    fn test_local_array_alloca() {
        let ir = lower("int main() { int arr[5]; arr[2] = 7; return arr[2]; }").unwrap();
        assert!(ir.contains("alloca [5 x i32]"));
        assert!(ir.contains("getelementptr inbounds [5 x i32]"));
    }
}
