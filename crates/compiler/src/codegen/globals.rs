//! Global variables and enumerator constants
//!
//! Module-scope variables get external linkage and either their literal
//! initializer, a zero-filled literal list (arrays), or zero-initialization.
//! Every enumerator becomes a `constant i32`.

use super::types::wrap_array_type;
use super::{CodeGen, GlobalInfo, Value};
use crate::ast::{Declaration, Expression, Literal, Program, VarDecl};
use crate::error::CodeGenError;
use crate::types as ty;
use std::fmt::Write as _;

impl CodeGen {
    pub(super) fn gen_globals(&mut self, program: &Program) -> Result<(), CodeGenError> {
        for decl in &program.declarations {
            match decl {
                Declaration::Variable(var) => self.gen_global_var(var)?,
                Declaration::MultiVariable(vars) => {
                    for var in vars {
                        self.gen_global_var(var)?;
                    }
                }
                Declaration::Enum(decl) => {
                    for (i, (name, _)) in decl.enumerators.iter().enumerate() {
                        let value = decl.values[i];
                        writeln!(self.globals_text, "@{} = constant i32 {}", name, value)?;
                    }
                }
                Declaration::Struct(decl) => {
                    // Emit the identified type even if no value uses it yet.
                    if let Some(tag) = &decl.tag {
                        let tag = tag.clone();
                        self.struct_type(&tag)?;
                    }
                }
                Declaration::Union(_) | Declaration::Function(_) => {}
            }
        }
        Ok(())
    }

    fn gen_global_var(&mut self, var: &VarDecl) -> Result<(), CodeGenError> {
        if var.ty == "void" {
            return Err(CodeGenError::UnsupportedType {
                ty: "void".to_string(),
            });
        }
        let element_ty = self.lower_type(&var.ty)?;
        let dims = self.fold_dimensions(&var.dims)?;
        let full_ty = wrap_array_type(&element_ty, &dims);

        let init = match &var.init {
            None => self.zero_initializer(&var.ty, &element_ty, &dims),
            Some(Expression::InitializerList(elements)) => {
                self.array_initializer(var, &element_ty, &dims, elements)?
            }
            Some(Expression::Literal(lit)) => {
                if !dims.is_empty() {
                    return Err(CodeGenError::mismatch(format!(
                        "array variable '{}' requires an initializer list",
                        var.name
                    )));
                }
                self.scalar_initializer(&var.name, lit, &element_ty)?
            }
            Some(_) => {
                return Err(CodeGenError::mismatch(format!(
                    "global initializer for '{}' must be a literal or initializer list",
                    var.name
                )));
            }
        };

        writeln!(self.globals_text, "@{} = global {} {}", var.name, full_ty, init)?;
        self.globals_info.insert(
            var.name.clone(),
            GlobalInfo {
                decl_ty: var.ty.clone(),
                llvm_ty: full_ty,
                dims,
            },
        );
        Ok(())
    }

    fn zero_initializer(&self, decl_ty: &str, element_ty: &str, dims: &[u64]) -> String {
        if !dims.is_empty()
            || ty::struct_tag(decl_ty).is_some()
            || ty::union_tag(decl_ty).is_some()
        {
            return "zeroinitializer".to_string();
        }
        zero_value(element_ty).to_string()
    }

    fn scalar_initializer(
        &self,
        name: &str,
        lit: &Literal,
        target_ty: &str,
    ) -> Result<String, CodeGenError> {
        let value = literal_value(lit);
        if value.ty == target_ty {
            return Ok(value.text);
        }
        // Literal float constants convert freely between float and double.
        match (lit, target_ty) {
            (Literal::Double(v), "float") => Ok(float_constant(*v as f32)),
            (Literal::Float(v), "double") => Ok(double_constant(*v as f64)),
            _ => Err(CodeGenError::mismatch(format!(
                "incompatible initializer type in global variable declaration '{}'",
                name
            ))),
        }
    }

    fn array_initializer(
        &mut self,
        var: &VarDecl,
        element_ty: &str,
        dims: &[u64],
        elements: &[Expression],
    ) -> Result<String, CodeGenError> {
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
        let mut parts = Vec::with_capacity(size);
        for i in 0..size {
            let text = match elements.get(i) {
                Some(Expression::Literal(lit)) => {
                    self.scalar_initializer(&var.name, lit, element_ty)?
                }
                Some(_) => {
                    return Err(CodeGenError::mismatch(format!(
                        "initializer list for '{}' must contain literals",
                        var.name
                    )));
                }
                // Trailing missing elements zero-fill.
                None => zero_value(element_ty).to_string(),
            };
            parts.push(format!("{} {}", element_ty, text));
        }
        Ok(format!("[{}]", parts.join(", ")))
    }
}

/// The printable constant for a literal, with its LLVM type.
pub(super) fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Int(v) => Value::new(v.to_string(), "i32"),
        Literal::Float(v) => Value::new(float_constant(*v), "float"),
        Literal::Double(v) => Value::new(double_constant(*v), "double"),
        Literal::Char(c) => Value::new((*c as u32 as u8).to_string(), "i8"),
        Literal::Bool(b) => Value::new(if *b { "true" } else { "false" }, "i1"),
    }
}

/// Float constants print as 64-bit hex so the textual IR is always exact.
/// A `float` constant must be a double that round-trips through f32, which
/// `as f64` guarantees.
pub(super) fn float_constant(v: f32) -> String {
    format!("0x{:016X}", (v as f64).to_bits())
}

pub(super) fn double_constant(v: f64) -> String {
    format!("0x{:016X}", v.to_bits())
}

pub(super) fn zero_value(llvm_ty: &str) -> &'static str {
    match llvm_ty {
        "i1" => "false",
        "float" | "double" => "0x0000000000000000",
        _ => "0",
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
    fn test_scalar_globals() {
        let ir = lower("int x = 5;\nbool flag = true;\nchar c = 'A';").unwrap();
        assert!(ir.contains("@x = global i32 5"));
        assert!(ir.contains("@flag = global i1 true"));
        assert!(ir.contains("@c = global i8 65"));
    }

    #[test]
    fn test_float_globals_are_hex() {
        let ir = lower("double d = 1.5;\nfloat f = 2.5f;").unwrap();
        assert!(ir.contains("@d = global double 0x3FF8000000000000"));
        assert!(ir.contains("@f = global float 0x4004000000000000"));
    }

    #[test]
    fn test_float_double_cross_initializer() {
        let ir = lower("float f = 1.5;\ndouble d = 2.5f;").unwrap();
        assert!(ir.contains("@f = global float 0x3FF8000000000000"));
        assert!(ir.contains("@d = global double 0x4004000000000000"));
    }

    #[test]
    fn test_int_to_float_global_rejected() {
        let err = lower("float f = 1;").unwrap_err();
        assert!(matches!(err, CodeGenError::TypeMismatch { .. }));
    }

    #[test]
    fn test_array_initializer_zero_fill() {
        let ir = lower("int arr[4] = {1, 2};").unwrap();
        assert!(ir.contains("@arr = global [4 x i32] [i32 1, i32 2, i32 0, i32 0]"));
    }

    #[test]
    fn test_array_initializer_excess_rejected() {
        let err = lower("int arr[2] = {1, 2, 3};").unwrap_err();
        assert!(matches!(err, CodeGenError::TypeMismatch { .. }));
    }

    #[test]
    fn test_array_zero_init() {
        let ir = lower("int arr[3];").unwrap();
        assert!(ir.contains("@arr = global [3 x i32] zeroinitializer"));
    }

    #[test]
    fn test_enumerator_constants() {
        let ir = lower("enum Op { ADD, SUB, MUL = 5 };").unwrap();
        assert!(ir.contains("@ADD = constant i32 0"));
        assert!(ir.contains("@SUB = constant i32 1"));
        assert!(ir.contains("@MUL = constant i32 5"));
    }

    #[test]
    fn test_struct_type_emitted_for_declaration() {
        let ir = lower("struct Point { int x; int y; };").unwrap();
        assert!(ir.contains("%struct.Point = type { i32, i32 }"));
    }
}
