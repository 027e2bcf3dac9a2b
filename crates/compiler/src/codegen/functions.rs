//! Function lowering
//!
//! A prototype only records a signature (printed later as `declare` if no
//! body ever arrives). A definition opens an entry block, gives every
//! parameter a stack slot holding the incoming argument, lowers the body,
//! and synthesizes a default return when the last reachable block does not
//! already end in a terminator.

use super::globals::zero_value;
use super::{CodeGen, FnSig, FunctionIr, LocalSlot};
use crate::ast::FunctionDecl;
use crate::error::CodeGenError;

impl CodeGen {
    pub(super) fn gen_function(&mut self, func: &FunctionDecl) -> Result<(), CodeGenError> {
        let ret_ty = self.lower_type(&func.return_type)?;
        let mut param_tys = Vec::with_capacity(func.params.len());
        for (ty, _) in &func.params {
            param_tys.push(self.lower_type(ty)?);
        }
        let has_body = func.body.is_some();

        match self.fn_sigs.get(&func.name).cloned() {
            None => {
                self.fn_sigs.insert(
                    func.name.clone(),
                    FnSig {
                        ret_ty: ret_ty.clone(),
                        param_tys: param_tys.clone(),
                        defined: has_body,
                    },
                );
                self.fn_order.push(func.name.clone());
            }
            Some(existing) => {
                if existing.ret_ty != ret_ty || existing.param_tys != param_tys {
                    return Err(CodeGenError::mismatch(format!(
                        "conflicting signature for '{}'",
                        func.name
                    )));
                }
                if existing.defined && has_body {
                    return Err(CodeGenError::mismatch(format!(
                        "function '{}' is already defined",
                        func.name
                    )));
                }
                if has_body {
                    if let Some(sig) = self.fn_sigs.get_mut(&func.name) {
                        sig.defined = true;
                    }
                }
            }
        }

        let body = match &func.body {
            Some(body) => body,
            None => return Ok(()),
        };

        self.start_function(&func.return_type);

        // Parameters land in stack slots so they are addressable like any
        // other local.
        for (i, (param_ty, param_name)) in func.params.iter().enumerate() {
            let llvm_ty = param_tys[i].clone();
            let slot = self.fresh_slot(param_name);
            self.emit(format!("{} = alloca {}", slot, llvm_ty));
            self.emit(format!("store {} %{}, ptr {}", llvm_ty, param_name, slot));
            self.insert_local(
                param_name,
                LocalSlot {
                    reg: slot,
                    decl_ty: param_ty.clone(),
                    llvm_ty,
                    dims: Vec::new(),
                },
            );
        }

        for stmt in body {
            if self.gen_statement(stmt)? {
                break;
            }
        }

        if !self.current_terminated() {
            self.synthesize_default_return(&func.return_type)?;
        }

        let blocks = std::mem::take(&mut self.blocks);
        self.functions.push(FunctionIr {
            name: func.name.clone(),
            ret_ty,
            params: func
                .params
                .iter()
                .enumerate()
                .map(|(i, (_, name))| (param_tys[i].clone(), name.clone()))
                .collect(),
            blocks,
        });
        Ok(())
    }

    /// `ret void` for void functions, a typed zero for primitives.
    fn synthesize_default_return(&mut self, return_decl: &str) -> Result<(), CodeGenError> {
        match return_decl {
            "void" => self.terminate("ret void".to_string()),
            "int" => self.terminate("ret i32 0".to_string()),
            "char" => self.terminate("ret i8 0".to_string()),
            "bool" => self.terminate("ret i1 false".to_string()),
            "float" => self.terminate(format!("ret float {}", zero_value("float"))),
            "double" => self.terminate(format!("ret double {}", zero_value("double"))),
            other => {
                return Err(CodeGenError::UnsupportedType {
                    ty: other.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::codegen::CodeGen;
    use crate::parser::parse_source;
    use crate::sema::SemanticAnalyzer;

    fn lower(source: &str) -> String {
        let mut program = parse_source(source).unwrap();
        let registry = SemanticAnalyzer::new().analyze(&mut program).unwrap();
        CodeGen::new(registry).codegen_program(&program).unwrap()
    }

    #[test]
    fn test_parameters_get_slots() {
        let ir = lower("int add(int a, int b) { return a + b; }");
        assert!(ir.contains("define i32 @add(i32 %a, i32 %b)"));
        assert!(ir.contains("%a.addr = alloca i32"));
        assert!(ir.contains("store i32 %a, ptr %a.addr"));
        assert!(ir.contains("load i32, ptr %a.addr"));
    }

    #[test]
    fn test_pointer_parameters() {
        let ir = lower("void set(int *p) { *p = 1; }");
        assert!(ir.contains("define void @set(ptr %p)"));
        assert!(ir.contains("%p.addr = alloca ptr"));
    }

    #[test]
    fn test_statements_after_return_are_dropped() {
        let ir = lower("int f() { return 1; return 2; }");
        assert!(ir.contains("ret i32 1"));
        assert!(!ir.contains("ret i32 2"));
    }

    #[test]
    fn test_bool_default_return() {
        let ir = lower("bool f() { int x = 0; }");
        assert!(ir.contains("ret i1 false"));
    }
}
