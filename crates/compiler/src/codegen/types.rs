//! Type lowering
//!
//! Canonical type strings lower to LLVM types: primitives map directly,
//! every pointer is an opaque `ptr`, enums are `i32`, structs become
//! identified `%struct.Tag` types emitted once at module top, and unions
//! become byte arrays sized to their largest member. Array dimensions wrap
//! the element type outermost dimension first.

use super::CodeGen;
use crate::ast::Expression;
use crate::error::CodeGenError;
use crate::types as ty;

impl CodeGen {
    pub(super) fn lower_type(&mut self, decl_ty: &str) -> Result<String, CodeGenError> {
        if ty::is_pointer(decl_ty) {
            return Ok("ptr".to_string());
        }
        match decl_ty {
            "int" => return Ok("i32".to_string()),
            "float" => return Ok("float".to_string()),
            "char" => return Ok("i8".to_string()),
            "double" => return Ok("double".to_string()),
            "bool" => return Ok("i1".to_string()),
            "void" => return Ok("void".to_string()),
            _ => {}
        }
        if ty::enum_tag(decl_ty).is_some() {
            return Ok("i32".to_string());
        }
        if let Some(tag) = ty::struct_tag(decl_ty) {
            let tag = tag.to_string();
            return self.struct_type(&tag);
        }
        if let Some(tag) = ty::union_tag(decl_ty) {
            let tag = tag.to_string();
            let size = self.union_size(&tag)?;
            return Ok(format!("[{} x i8]", size));
        }
        Err(CodeGenError::UnsupportedType {
            ty: decl_ty.to_string(),
        })
    }

    /// The identified type name for a struct tag, emitting its definition
    /// on first use.
    pub(super) fn struct_type(&mut self, tag: &str) -> Result<String, CodeGenError> {
        let name = format!("%struct.{}", tag);
        if self.declared_structs.contains(tag) {
            return Ok(name);
        }
        self.declared_structs.insert(tag.to_string());

        let members = match self.registry.lookup_struct(tag) {
            Some(decl) => decl.members.clone(),
            None => {
                return Err(CodeGenError::UnsupportedType {
                    ty: format!("struct {}", tag),
                });
            }
        };
        let mut lowered = Vec::with_capacity(members.len());
        for member in &members {
            let base = self.lower_type(&member.ty)?;
            let dims = self.fold_dimensions(&member.dims)?;
            lowered.push(wrap_array_type(&base, &dims));
        }
        self.struct_defs
            .push((name.clone(), format!("{{ {} }}", lowered.join(", "))));
        Ok(name)
    }

    /// Byte size of a union: the maximum member size, computed once per tag.
    pub(super) fn union_size(&mut self, tag: &str) -> Result<u64, CodeGenError> {
        if let Some(size) = self.union_sizes.get(tag) {
            return Ok(*size);
        }
        let members = match self.registry.lookup_union(tag) {
            Some(decl) => decl.members.clone(),
            None => {
                return Err(CodeGenError::UnsupportedType {
                    ty: format!("union {}", tag),
                });
            }
        };
        let mut max = 1u64;
        for member in &members {
            let size = self.type_size(&member.ty)?;
            max = max.max(size);
        }
        self.union_sizes.insert(tag.to_string(), max);
        Ok(max)
    }

    /// Allocation size of a canonical type, with C-style struct layout.
    pub(super) fn type_size(&mut self, decl_ty: &str) -> Result<u64, CodeGenError> {
        if ty::is_pointer(decl_ty) {
            return Ok(8);
        }
        match decl_ty {
            "int" | "float" => return Ok(4),
            "char" | "bool" => return Ok(1),
            "double" => return Ok(8),
            _ => {}
        }
        if ty::enum_tag(decl_ty).is_some() {
            return Ok(4);
        }
        if let Some(tag) = ty::struct_tag(decl_ty) {
            let members = match self.registry.lookup_struct(tag) {
                Some(decl) => decl.members.clone(),
                None => {
                    return Err(CodeGenError::UnsupportedType {
                        ty: decl_ty.to_string(),
                    });
                }
            };
            let mut offset = 0u64;
            let mut max_align = 1u64;
            for member in &members {
                let size = self.type_size(&member.ty)?;
                let align = self.type_align(&member.ty)?;
                let count: u64 = {
                    let dims = self.fold_dimensions(&member.dims)?;
                    dims.iter().product::<u64>().max(1)
                };
                offset = align_to(offset, align);
                offset += size * count;
                max_align = max_align.max(align);
            }
            return Ok(align_to(offset, max_align));
        }
        if let Some(tag) = ty::union_tag(decl_ty) {
            let tag = tag.to_string();
            return self.union_size(&tag);
        }
        Err(CodeGenError::UnsupportedType {
            ty: decl_ty.to_string(),
        })
    }

    fn type_align(&mut self, decl_ty: &str) -> Result<u64, CodeGenError> {
        if ty::is_pointer(decl_ty) {
            return Ok(8);
        }
        match decl_ty {
            "int" | "float" => return Ok(4),
            "char" | "bool" => return Ok(1),
            "double" => return Ok(8),
            _ => {}
        }
        if ty::enum_tag(decl_ty).is_some() {
            return Ok(4);
        }
        if let Some(tag) = ty::struct_tag(decl_ty) {
            let members = match self.registry.lookup_struct(tag) {
                Some(decl) => decl.members.clone(),
                None => {
                    return Err(CodeGenError::UnsupportedType {
                        ty: decl_ty.to_string(),
                    });
                }
            };
            let mut max_align = 1u64;
            for member in &members {
                max_align = max_align.max(self.type_align(&member.ty)?);
            }
            return Ok(max_align);
        }
        if ty::union_tag(decl_ty).is_some() {
            // Unions lower to byte arrays.
            return Ok(1);
        }
        Err(CodeGenError::UnsupportedType {
            ty: decl_ty.to_string(),
        })
    }

    /// Fold declarator dimensions to constants. Every dimension expression
    /// must be a compile-time integer.
    pub(super) fn fold_dimensions(&self, dims: &[Expression]) -> Result<Vec<u64>, CodeGenError> {
        dims.iter()
            .map(|dim| {
                self.fold_int_const(dim)
                    .and_then(|v| u64::try_from(v).ok())
                    .ok_or_else(|| {
                        CodeGenError::mismatch("array dimension must be a constant integer")
                    })
            })
            .collect()
    }
}

/// `[d0 x [d1 x T]]` wrapping, outer dimension outermost.
pub(super) fn wrap_array_type(element: &str, dims: &[u64]) -> String {
    let mut ty = element.to_string();
    for dim in dims.iter().rev() {
        ty = format!("[{} x {}]", dim, ty);
    }
    ty
}

/// Peel the outermost dimension off an array type built by
/// `wrap_array_type`.
pub(super) fn peel_array_type(element: &str, dims: &[u64]) -> String {
    wrap_array_type(element, &dims[1..])
}

fn align_to(offset: u64, align: u64) -> u64 {
    debug_assert!(align > 0);
    offset.div_ceil(align) * align
}

pub(super) fn is_int_type(ty: &str) -> bool {
    matches!(ty, "i1" | "i8" | "i32")
}

pub(super) fn is_float_type(ty: &str) -> bool {
    matches!(ty, "float" | "double")
}

pub(super) fn int_width(ty: &str) -> u32 {
    match ty {
        "i1" => 1,
        "i8" => 8,
        _ => 32,
    }
}

/// Floating-point rank for widening decisions.
pub(super) fn float_rank(ty: &str) -> u32 {
    if ty == "double" { 2 } else { 1 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use crate::sema::SemanticAnalyzer;

    fn codegen_for(source: &str) -> CodeGen {
        let mut program = parse_source(source).unwrap();
        let registry = SemanticAnalyzer::new().analyze(&mut program).unwrap();
        CodeGen::new(registry)
    }

    #[test]
    fn test_primitive_lowering() {
        let mut cg = codegen_for("int main() { return 0; }");
        assert_eq!(cg.lower_type("int").unwrap(), "i32");
        assert_eq!(cg.lower_type("char").unwrap(), "i8");
        assert_eq!(cg.lower_type("bool").unwrap(), "i1");
        assert_eq!(cg.lower_type("float").unwrap(), "float");
        assert_eq!(cg.lower_type("double").unwrap(), "double");
        assert_eq!(cg.lower_type("void").unwrap(), "void");
        assert_eq!(cg.lower_type("int*").unwrap(), "ptr");
        assert_eq!(cg.lower_type("int**").unwrap(), "ptr");
    }

    #[test]
    fn test_enum_lowering() {
        let mut cg = codegen_for("enum E { A };");
        assert_eq!(cg.lower_type("enum E").unwrap(), "i32");
    }

    #[test]
    fn test_struct_identified_type() {
        let mut cg = codegen_for("struct Point { int x; int y; };");
        assert_eq!(cg.lower_type("struct Point").unwrap(), "%struct.Point");
        assert_eq!(
            cg.struct_defs,
            vec![(
                "%struct.Point".to_string(),
                "{ i32, i32 }".to_string()
            )]
        );
        // Second use does not re-emit.
        cg.lower_type("struct Point").unwrap();
        assert_eq!(cg.struct_defs.len(), 1);
    }

    #[test]
    fn test_nested_struct_type() {
        let mut cg = codegen_for(
            "struct Point { int x; int y; };\nstruct Rect { struct Point tl; struct Point br; };",
        );
        assert_eq!(cg.lower_type("struct Rect").unwrap(), "%struct.Rect");
        let rect = cg
            .struct_defs
            .iter()
            .find(|(name, _)| name == "%struct.Rect")
            .unwrap();
        assert_eq!(rect.1, "{ %struct.Point, %struct.Point }");
    }

    #[test]
    fn test_union_size_is_max_member() {
        let mut cg = codegen_for("union U { int i; int j; };");
        assert_eq!(cg.lower_type("union U").unwrap(), "[4 x i8]");
        let mut cg = codegen_for("union V { char c; double d; };");
        assert_eq!(cg.lower_type("union V").unwrap(), "[8 x i8]");
    }

    #[test]
    fn test_union_with_struct_member() {
        let mut cg = codegen_for(
            "struct P { int x; int y; };\nunion U { struct P p; char c; };",
        );
        assert_eq!(cg.lower_type("union U").unwrap(), "[8 x i8]");
    }

    #[test]
    fn test_struct_size_with_padding() {
        let mut cg = codegen_for("struct S { char c; int i; double d; };");
        // char at 0, int at 4, double at 8; total 16.
        assert_eq!(cg.type_size("struct S").unwrap(), 16);
    }

    #[test]
    fn test_array_wrapping() {
        assert_eq!(wrap_array_type("i32", &[4]), "[4 x i32]");
        assert_eq!(wrap_array_type("i32", &[2, 3]), "[2 x [3 x i32]]");
        assert_eq!(peel_array_type("i32", &[2, 3]), "[3 x i32]");
    }

    #[test]
    fn test_unknown_tag_is_unsupported() {
        let mut cg = codegen_for("int main() { return 0; }");
        assert!(matches!(
            cg.lower_type("struct Nope"),
            Err(CodeGenError::UnsupportedType { .. })
        ));
    }
}
