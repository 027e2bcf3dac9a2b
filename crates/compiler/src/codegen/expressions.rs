//! Expression and lvalue lowering
//!
//! Identifiers resolve local slot → global → enumerator constant. Binary
//! operands promote int↔float through signed conversion before selecting
//! the integer or floating instruction; comparisons yield `i1`. `&&`/`||`
//! evaluate both operands eagerly and combine the `i1`-coerced results with
//! `and`/`or`.
//!
//! An lvalue is an identifier (its slot), a member access (struct GEP by
//! member ordinal, or the base pointer itself for unions under opaque
//! pointers), a dereference, or an array index. Anything else is rejected.

use super::globals::{double_constant, literal_value};
use super::types::{
    float_rank, int_width, is_float_type, is_int_type, peel_array_type, wrap_array_type,
};
use super::{CodeGen, Place, Value};
use crate::ast::{BinaryOp, Expression, Literal, PostfixOp, UnaryOp};
use crate::error::CodeGenError;
use crate::types as ty;

impl CodeGen {
    pub(super) fn gen_expression(&mut self, expr: &Expression) -> Result<Value, CodeGenError> {
        match expr {
            Expression::Literal(lit) => Ok(literal_value(lit)),
            Expression::Identifier(name) => self.gen_identifier(name),
            Expression::Binary { op, left, right } => self.gen_binary(*op, left, right),
            Expression::Unary { op, operand } => self.gen_unary(*op, operand),
            Expression::Postfix { operand, op } => self.gen_postfix(operand, *op),
            Expression::MemberAccess { .. } | Expression::ArrayIndex { .. } => {
                let place = self.lvalue(expr)?;
                let loaded = self.fresh_temp();
                self.emit(format!(
                    "{} = load {}, ptr {}",
                    loaded, place.llvm_ty, place.ptr
                ));
                Ok(Value::new(loaded, place.llvm_ty))
            }
            Expression::Assignment { target, value } => {
                let place = self.lvalue(target)?;
                let value = self.gen_expression(value)?;
                self.emit(format!(
                    "store {} {}, ptr {}",
                    value.ty, value.text, place.ptr
                ));
                Ok(value)
            }
            Expression::Cast { ty, operand } => self.gen_cast(ty, operand),
            Expression::Call { callee, args } => self.gen_call(callee, args),
            Expression::InitializerList(_) => Err(CodeGenError::mismatch(
                "initializer list is only valid as an array initializer",
            )),
        }
    }

    fn gen_identifier(&mut self, name: &str) -> Result<Value, CodeGenError> {
        if let Some(slot) = self.lookup_local(name).cloned() {
            let loaded = self.fresh_temp();
            self.emit(format!("{} = load {}, ptr {}", loaded, slot.llvm_ty, slot.reg));
            return Ok(Value::new(loaded, slot.llvm_ty));
        }
        if let Some(global) = self.globals_info.get(name).cloned() {
            let loaded = self.fresh_temp();
            self.emit(format!(
                "{} = load {}, ptr @{}",
                loaded, global.llvm_ty, name
            ));
            return Ok(Value::new(loaded, global.llvm_ty));
        }
        if let Some(value) = self.registry.enumerator_value(name) {
            return Ok(Value::new(value.to_string(), "i32"));
        }
        Err(CodeGenError::mismatch(format!(
            "undefined variable '{}'",
            name
        )))
    }

    fn gen_unary(&mut self, op: UnaryOp, operand: &Expression) -> Result<Value, CodeGenError> {
        match op {
            UnaryOp::AddrOf => {
                let place = self.lvalue(operand)?;
                Ok(Value::new(place.ptr, "ptr"))
            }
            UnaryOp::Deref => {
                let pointee = self.deref_pointee_type(operand)?;
                let llvm_ty = self.lower_type(&pointee)?;
                let pointer = self.gen_expression(operand)?;
                if pointer.ty != "ptr" {
                    return Err(CodeGenError::mismatch(
                        "cannot dereference a non-pointer value",
                    ));
                }
                let loaded = self.fresh_temp();
                self.emit(format!("{} = load {}, ptr {}", loaded, llvm_ty, pointer.text));
                Ok(Value::new(loaded, llvm_ty))
            }
            UnaryOp::Neg => {
                let value = self.gen_expression(operand)?;
                let result = self.fresh_temp();
                if is_float_type(&value.ty) {
                    self.emit(format!("{} = fneg {} {}", result, value.ty, value.text));
                } else if is_int_type(&value.ty) {
                    self.emit(format!("{} = sub {} 0, {}", result, value.ty, value.text));
                } else {
                    return Err(CodeGenError::mismatch("cannot negate this operand"));
                }
                Ok(Value::new(result, value.ty))
            }
            UnaryOp::Not => {
                let value = self.gen_expression(operand)?;
                let value = self.to_bool(value)?;
                let result = self.fresh_temp();
                self.emit(format!("{} = xor i1 {}, true", result, value.text));
                Ok(Value::new(result, "i1"))
            }
            UnaryOp::BitNot => {
                let value = self.gen_expression(operand)?;
                if !is_int_type(&value.ty) {
                    return Err(CodeGenError::mismatch(
                        "bitwise complement requires an integer operand",
                    ));
                }
                let result = self.fresh_temp();
                self.emit(format!("{} = xor {} {}, -1", result, value.ty, value.text));
                Ok(Value::new(result, value.ty))
            }
        }
    }

    fn gen_binary(
        &mut self,
        op: BinaryOp,
        left: &Expression,
        right: &Expression,
    ) -> Result<Value, CodeGenError> {
        let lhs = self.gen_expression(left)?;
        let rhs = self.gen_expression(right)?;

        if matches!(op, BinaryOp::LogAnd | BinaryOp::LogOr) {
            // Both operands are evaluated eagerly; the result is the
            // bitwise combination of the i1-coerced values.
            let lhs = self.to_bool(lhs)?;
            let rhs = self.to_bool(rhs)?;
            let inst = if op == BinaryOp::LogAnd { "and" } else { "or" };
            let result = self.fresh_temp();
            self.emit(format!(
                "{} = {} i1 {}, {}",
                result, inst, lhs.text, rhs.text
            ));
            return Ok(Value::new(result, "i1"));
        }

        let (lhs, rhs) = self.promote_operands(lhs, rhs)?;
        let float = is_float_type(&lhs.ty);
        let result = self.fresh_temp();

        let comparison = |int_cond: &str, float_cond: &str| {
            if float {
                format!("fcmp {}", float_cond)
            } else {
                format!("icmp {}", int_cond)
            }
        };

        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
                let inst = match (op, float) {
                    (BinaryOp::Add, false) => "add",
                    (BinaryOp::Add, true) => "fadd",
                    (BinaryOp::Sub, false) => "sub",
                    (BinaryOp::Sub, true) => "fsub",
                    (BinaryOp::Mul, false) => "mul",
                    (BinaryOp::Mul, true) => "fmul",
                    (BinaryOp::Div, false) => "sdiv",
                    (BinaryOp::Div, true) => "fdiv",
                    (BinaryOp::Rem, false) => "srem",
                    (BinaryOp::Rem, true) => "frem",
                    _ => unreachable!(),
                };
                self.emit(format!(
                    "{} = {} {} {}, {}",
                    result, inst, lhs.ty, lhs.text, rhs.text
                ));
                Ok(Value::new(result, lhs.ty))
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Eq
            | BinaryOp::Ne => {
                let inst = match op {
                    BinaryOp::Lt => comparison("slt", "olt"),
                    BinaryOp::Le => comparison("sle", "ole"),
                    BinaryOp::Gt => comparison("sgt", "ogt"),
                    BinaryOp::Ge => comparison("sge", "oge"),
                    BinaryOp::Eq => comparison("eq", "oeq"),
                    BinaryOp::Ne => comparison("ne", "one"),
                    _ => unreachable!(),
                };
                self.emit(format!(
                    "{} = {} {} {}, {}",
                    result, inst, lhs.ty, lhs.text, rhs.text
                ));
                Ok(Value::new(result, "i1"))
            }
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl
            | BinaryOp::Shr => {
                if float {
                    return Err(CodeGenError::mismatch(format!(
                        "operator '{}' requires integer operands",
                        op.symbol()
                    )));
                }
                let inst = match op {
                    BinaryOp::BitAnd => "and",
                    BinaryOp::BitOr => "or",
                    BinaryOp::BitXor => "xor",
                    BinaryOp::Shl => "shl",
                    BinaryOp::Shr => "ashr",
                    _ => unreachable!(),
                };
                self.emit(format!(
                    "{} = {} {} {}, {}",
                    result, inst, lhs.ty, lhs.text, rhs.text
                ));
                Ok(Value::new(result, lhs.ty))
            }
            BinaryOp::LogAnd | BinaryOp::LogOr => unreachable!("handled above"),
        }
    }

    /// Bring both operands to a common type: int↔float promotes the integer
    /// side through `sitofp`; anything else must already match.
    fn promote_operands(&mut self, lhs: Value, rhs: Value) -> Result<(Value, Value), CodeGenError> {
        if lhs.ty == rhs.ty {
            return Ok((lhs, rhs));
        }
        if is_int_type(&lhs.ty) && is_float_type(&rhs.ty) {
            let converted = self.fresh_temp();
            self.emit(format!(
                "{} = sitofp {} {} to {}",
                converted, lhs.ty, lhs.text, rhs.ty
            ));
            return Ok((Value::new(converted, rhs.ty.clone()), rhs));
        }
        if is_float_type(&lhs.ty) && is_int_type(&rhs.ty) {
            let converted = self.fresh_temp();
            self.emit(format!(
                "{} = sitofp {} {} to {}",
                converted, rhs.ty, rhs.text, lhs.ty
            ));
            return Ok((lhs.clone(), Value::new(converted, lhs.ty)));
        }
        Err(CodeGenError::mismatch(
            "incompatible types in binary expression",
        ))
    }

    fn gen_postfix(&mut self, operand: &Expression, op: PostfixOp) -> Result<Value, CodeGenError> {
        // Postfix ++/-- applies to named variables only.
        let Expression::Identifier(_) = operand else {
            return Err(CodeGenError::mismatch(
                "postfix operator applied to a non-identifier",
            ));
        };
        let place = self.lvalue(operand)?;
        let old = self.fresh_temp();
        self.emit(format!("{} = load {}, ptr {}", old, place.llvm_ty, place.ptr));

        let (inst, one) = if is_float_type(&place.llvm_ty) {
            let direction = if op == PostfixOp::Increment {
                "fadd"
            } else {
                "fsub"
            };
            (direction, double_constant(1.0))
        } else if is_int_type(&place.llvm_ty) {
            let direction = if op == PostfixOp::Increment { "add" } else { "sub" };
            (direction, "1".to_string())
        } else {
            return Err(CodeGenError::mismatch(
                "unsupported type for postfix operator",
            ));
        };
        let new = self.fresh_temp();
        self.emit(format!(
            "{} = {} {} {}, {}",
            new, inst, place.llvm_ty, old, one
        ));
        self.emit(format!("store {} {}, ptr {}", place.llvm_ty, new, place.ptr));
        Ok(Value::new(old, place.llvm_ty))
    }

    fn gen_cast(&mut self, target_decl: &str, operand: &Expression) -> Result<Value, CodeGenError> {
        let value = self.gen_expression(operand)?;
        let target = self.lower_type(target_decl)?;
        if value.ty == target {
            return Ok(value);
        }
        let result = self.fresh_temp();
        if is_float_type(&value.ty) && is_int_type(&target) {
            self.emit(format!(
                "{} = fptosi {} {} to {}",
                result, value.ty, value.text, target
            ));
        } else if is_int_type(&value.ty) && is_float_type(&target) {
            self.emit(format!(
                "{} = sitofp {} {} to {}",
                result, value.ty, value.text, target
            ));
        } else if is_int_type(&value.ty) && is_int_type(&target) {
            return self.int_cast(value, &target);
        } else if is_float_type(&value.ty) && is_float_type(&target) {
            let inst = if float_rank(&value.ty) > float_rank(&target) {
                "fptrunc"
            } else {
                "fpext"
            };
            self.emit(format!(
                "{} = {} {} {} to {}",
                result, inst, value.ty, value.text, target
            ));
        } else {
            return Err(CodeGenError::mismatch("unsupported cast conversion"));
        }
        Ok(Value::new(result, target))
    }

    /// Width-adjusting integer conversion (zero-extends when widening).
    pub(super) fn int_cast(&mut self, value: Value, target: &str) -> Result<Value, CodeGenError> {
        if value.ty == target {
            return Ok(value);
        }
        let result = self.fresh_temp();
        let inst = if int_width(&value.ty) < int_width(target) {
            "zext"
        } else {
            "trunc"
        };
        self.emit(format!(
            "{} = {} {} {} to {}",
            result, inst, value.ty, value.text, target
        ));
        Ok(Value::new(result, target.to_string()))
    }

    fn gen_call(&mut self, callee: &str, args: &[Expression]) -> Result<Value, CodeGenError> {
        let sig = match self.fn_sigs.get(callee) {
            Some(sig) => sig.clone(),
            None => {
                return Err(CodeGenError::mismatch(format!(
                    "undefined function '{}'",
                    callee
                )));
            }
        };
        if sig.param_tys.len() != args.len() {
            return Err(CodeGenError::mismatch(format!(
                "function '{}' called with an incorrect number of arguments",
                callee
            )));
        }
        let mut lowered = Vec::with_capacity(args.len());
        for arg in args {
            let value = self.gen_expression(arg)?;
            lowered.push(format!("{} {}", value.ty, value.text));
        }
        let arg_list = lowered.join(", ");
        if sig.ret_ty == "void" {
            self.emit(format!("call void @{}({})", callee, arg_list));
            Ok(Value::new("", "void"))
        } else {
            let result = self.fresh_temp();
            self.emit(format!(
                "{} = call {} @{}({})",
                result, sig.ret_ty, callee, arg_list
            ));
            Ok(Value::new(result, sig.ret_ty))
        }
    }

    // ---- lvalues ---------------------------------------------------------

    pub(super) fn lvalue(&mut self, expr: &Expression) -> Result<Place, CodeGenError> {
        match expr {
            Expression::Identifier(name) => {
                if let Some(slot) = self.lookup_local(name).cloned() {
                    return Ok(Place {
                        ptr: slot.reg,
                        decl_ty: slot.decl_ty,
                        llvm_ty: slot.llvm_ty,
                        dims: slot.dims,
                    });
                }
                if let Some(global) = self.globals_info.get(name).cloned() {
                    return Ok(Place {
                        ptr: format!("@{}", name),
                        decl_ty: global.decl_ty,
                        llvm_ty: global.llvm_ty,
                        dims: global.dims,
                    });
                }
                if self.registry.enumerator_value(name).is_some() {
                    // Enumerator constants have no address.
                    return Err(CodeGenError::NotLvalue);
                }
                Err(CodeGenError::mismatch(format!(
                    "undefined variable '{}'",
                    name
                )))
            }
            Expression::MemberAccess { base, member } => {
                let base_place = self.lvalue(base)?;
                if !base_place.dims.is_empty() {
                    return Err(CodeGenError::mismatch(
                        "member access applied to an array value",
                    ));
                }
                if let Some(tag) = ty::struct_tag(&base_place.decl_ty).map(str::to_string) {
                    let members = match self.registry.lookup_struct(&tag) {
                        Some(decl) => decl.members.clone(),
                        None => {
                            return Err(CodeGenError::UnsupportedType {
                                ty: base_place.decl_ty.clone(),
                            });
                        }
                    };
                    let ordinal = members
                        .iter()
                        .position(|m| m.name == *member)
                        .ok_or_else(|| {
                            CodeGenError::mismatch(format!(
                                "struct '{}' has no member named '{}'",
                                tag, member
                            ))
                        })?;
                    let member_decl = &members[ordinal];
                    let struct_ty = self.struct_type(&tag)?;
                    let element = self.lower_type(&member_decl.ty)?;
                    let dims = self.fold_dimensions(&member_decl.dims)?;
                    let result = self.fresh_temp();
                    self.emit(format!(
                        "{} = getelementptr inbounds {}, ptr {}, i32 0, i32 {}",
                        result, struct_ty, base_place.ptr, ordinal
                    ));
                    return Ok(Place {
                        ptr: result,
                        decl_ty: member_decl.ty.clone(),
                        llvm_ty: wrap_array_type(&element, &dims),
                        dims,
                    });
                }
                if let Some(tag) = ty::union_tag(&base_place.decl_ty).map(str::to_string) {
                    let member_decl = match self
                        .registry
                        .lookup_union(&tag)
                        .and_then(|decl| decl.members.iter().find(|m| m.name == *member))
                    {
                        Some(decl) => decl.clone(),
                        None => {
                            return Err(CodeGenError::mismatch(format!(
                                "union '{}' has no member named '{}'",
                                tag, member
                            )));
                        }
                    };
                    // Under opaque pointers every union member aliases the
                    // storage directly; no cast instruction is needed.
                    let llvm_ty = self.lower_type(&member_decl.ty)?;
                    return Ok(Place {
                        ptr: base_place.ptr,
                        decl_ty: member_decl.ty,
                        llvm_ty,
                        dims: Vec::new(),
                    });
                }
                Err(CodeGenError::mismatch(format!(
                    "member access on non-aggregate type '{}'",
                    base_place.decl_ty
                )))
            }
            Expression::Unary {
                op: UnaryOp::Deref,
                operand,
            } => {
                let pointee = self.deref_pointee_type(operand)?;
                let llvm_ty = self.lower_type(&pointee)?;
                let pointer = self.gen_expression(operand)?;
                if pointer.ty != "ptr" {
                    return Err(CodeGenError::mismatch(
                        "cannot dereference a non-pointer value",
                    ));
                }
                Ok(Place {
                    ptr: pointer.text,
                    decl_ty: pointee,
                    llvm_ty,
                    dims: Vec::new(),
                })
            }
            Expression::ArrayIndex { base, index } => {
                let base_place = self.lvalue(base)?;
                let idx = self.gen_expression(index)?;
                if !is_int_type(&idx.ty) {
                    return Err(CodeGenError::mismatch("array index must be an integer"));
                }
                if !base_place.dims.is_empty() {
                    let element = self.lower_type(&base_place.decl_ty)?;
                    let result = self.fresh_temp();
                    self.emit(format!(
                        "{} = getelementptr inbounds {}, ptr {}, i32 0, {} {}",
                        result,
                        wrap_array_type(&element, &base_place.dims),
                        base_place.ptr,
                        idx.ty,
                        idx.text
                    ));
                    let remaining: Vec<u64> = base_place.dims[1..].to_vec();
                    return Ok(Place {
                        ptr: result,
                        decl_ty: base_place.decl_ty,
                        llvm_ty: peel_array_type(&element, &base_place.dims),
                        dims: remaining,
                    });
                }
                if ty::is_pointer(&base_place.decl_ty) {
                    // Pointer indexing: load the pointer, then offset it.
                    let pointee = ty::pointee(&base_place.decl_ty)
                        .expect("pointer type strips to its pointee");
                    let element = self.lower_type(&pointee)?;
                    let loaded = self.fresh_temp();
                    self.emit(format!("{} = load ptr, ptr {}", loaded, base_place.ptr));
                    let result = self.fresh_temp();
                    self.emit(format!(
                        "{} = getelementptr inbounds {}, ptr {}, {} {}",
                        result, element, loaded, idx.ty, idx.text
                    ));
                    return Ok(Place {
                        ptr: result,
                        decl_ty: pointee,
                        llvm_ty: element,
                        dims: Vec::new(),
                    });
                }
                Err(CodeGenError::mismatch("cannot index a non-array value"))
            }
            _ => Err(CodeGenError::NotLvalue),
        }
    }

    /// The declared pointee type for a dereference of `operand`.
    fn deref_pointee_type(&self, operand: &Expression) -> Result<String, CodeGenError> {
        let operand_ty = self.effective_type(operand)?;
        ty::pointee(&operand_ty).ok_or_else(|| {
            CodeGenError::mismatch(format!(
                "cannot dereference value of type '{}'",
                operand_ty
            ))
        })
    }

    /// The canonical declared type of an expression, for the shapes that can
    /// appear under `*` or as aggregate bases.
    fn effective_type(&self, expr: &Expression) -> Result<String, CodeGenError> {
        match expr {
            Expression::Identifier(name) => {
                if let Some(slot) = self.lookup_local(name) {
                    return Ok(slot.decl_ty.clone());
                }
                if let Some(global) = self.globals_info.get(name) {
                    return Ok(global.decl_ty.clone());
                }
                if self.registry.enumerator_value(name).is_some() {
                    return Ok("int".to_string());
                }
                Err(CodeGenError::mismatch(format!(
                    "declared type for variable '{}' not found",
                    name
                )))
            }
            Expression::Unary {
                op: UnaryOp::Deref,
                operand,
            } => {
                let inner = self.effective_type(operand)?;
                ty::pointee(&inner).ok_or_else(|| {
                    CodeGenError::mismatch(format!(
                        "cannot dereference value of type '{}'",
                        inner
                    ))
                })
            }
            Expression::Unary {
                op: UnaryOp::AddrOf,
                operand,
            } => Ok(ty::pointer_to(&self.effective_type(operand)?)),
            Expression::MemberAccess { base, member } => {
                let base_ty = self.effective_type(base)?;
                self.registry
                    .member_type(&base_ty, member)
                    .map(|decl| decl.ty.clone())
                    .ok_or_else(|| {
                        CodeGenError::mismatch(format!(
                            "type '{}' has no member named '{}'",
                            base_ty, member
                        ))
                    })
            }
            Expression::ArrayIndex { base, .. } => self.effective_type(base),
            Expression::Cast { ty, .. } => Ok(ty.clone()),
            Expression::Literal(lit) => Ok(match lit {
                Literal::Int(_) => "int".to_string(),
                Literal::Float(_) => "float".to_string(),
                Literal::Double(_) => "double".to_string(),
                Literal::Char(_) => "char".to_string(),
                Literal::Bool(_) => "bool".to_string(),
            }),
            _ => Err(CodeGenError::mismatch(
                "unable to determine effective type for expression",
            )),
        }
    }

    /// Coerce to `i1` by comparing against zero.
    pub(super) fn to_bool(&mut self, value: Value) -> Result<Value, CodeGenError> {
        if value.ty == "i1" {
            return Ok(value);
        }
        let result = self.fresh_temp();
        if is_int_type(&value.ty) {
            self.emit(format!(
                "{} = icmp ne {} {}, 0",
                result, value.ty, value.text
            ));
        } else if is_float_type(&value.ty) {
            self.emit(format!(
                "{} = fcmp one {} {}, {}",
                result,
                value.ty,
                value.text,
                double_constant(0.0)
            ));
        } else {
            return Err(CodeGenError::mismatch(
                "condition is not a scalar value",
            ));
        }
        Ok(Value::new(result, "i1"))
    }

    /// Fold a compile-time integer constant: literals, enumerators, unary
    /// and binary integer arithmetic.
    pub(super) fn fold_int_const(&self, expr: &Expression) -> Option<i64> {
        match expr {
            Expression::Literal(Literal::Int(v)) => Some(*v as i64),
            Expression::Literal(Literal::Char(c)) => Some(*c as u8 as i64),
            Expression::Literal(Literal::Bool(b)) => Some(*b as i64),
            Expression::Identifier(name) => {
                self.registry.enumerator_value(name).map(|v| v as i64)
            }
            Expression::Unary { op, operand } => {
                let value = self.fold_int_const(operand)?;
                match op {
                    UnaryOp::Neg => Some(value.wrapping_neg()),
                    UnaryOp::Not => Some((value == 0) as i64),
                    UnaryOp::BitNot => Some(!value),
                    _ => None,
                }
            }
            Expression::Binary { op, left, right } => {
                let lhs = self.fold_int_const(left)?;
                let rhs = self.fold_int_const(right)?;
                match op {
                    BinaryOp::Add => Some(lhs.wrapping_add(rhs)),
                    BinaryOp::Sub => Some(lhs.wrapping_sub(rhs)),
                    BinaryOp::Mul => Some(lhs.wrapping_mul(rhs)),
                    BinaryOp::Div => lhs.checked_div(rhs),
                    BinaryOp::Rem => lhs.checked_rem(rhs),
                    BinaryOp::Shl => u32::try_from(rhs).ok().and_then(|s| lhs.checked_shl(s)),
                    BinaryOp::Shr => u32::try_from(rhs).ok().and_then(|s| lhs.checked_shr(s)),
                    BinaryOp::BitAnd => Some(lhs & rhs),
                    BinaryOp::BitOr => Some(lhs | rhs),
                    BinaryOp::BitXor => Some(lhs ^ rhs),
                    BinaryOp::Lt => Some((lhs < rhs) as i64),
                    BinaryOp::Gt => Some((lhs > rhs) as i64),
                    BinaryOp::Le => Some((lhs <= rhs) as i64),
                    BinaryOp::Ge => Some((lhs >= rhs) as i64),
                    BinaryOp::Eq => Some((lhs == rhs) as i64),
                    BinaryOp::Ne => Some((lhs != rhs) as i64),
                    BinaryOp::LogAnd => Some(((lhs != 0) && (rhs != 0)) as i64),
                    BinaryOp::LogOr => Some(((lhs != 0) || (rhs != 0)) as i64),
                }
            }
            _ => None,
        }
    }
}
