//! Structural module verification
//!
//! Runs after lowering, before printing. Three checks:
//!
//! 1. Every basic block ends in exactly one terminator.
//! 2. Every register is defined before its first textual use (parameters
//!    and block labels are definitions; the generator emits blocks in
//!    an order where this implies dominance for the structured control
//!    flow it produces).
//! 3. Every call site matches the callee's signature in the module
//!    function table: name, return type, arity and argument types.

use super::{CodeGen, FunctionIr};
use crate::error::CodeGenError;
use std::collections::HashSet;

impl CodeGen {
    pub(super) fn verify_module(&self) -> Result<(), CodeGenError> {
        for func in &self.functions {
            self.verify_function(func)?;
        }
        Ok(())
    }

    fn verify_function(&self, func: &FunctionIr) -> Result<(), CodeGenError> {
        let mut defined: HashSet<String> = HashSet::new();
        for (_, name) in &func.params {
            defined.insert(name.clone());
        }
        // Labels share the `%` namespace with values in branch operands, and
        // identified struct types appear as `%struct.T` in GEPs and allocas.
        for block in &func.blocks {
            defined.insert(block.label.clone());
        }
        for (type_name, _) in &self.struct_defs {
            if let Some(stripped) = type_name.strip_prefix('%') {
                defined.insert(stripped.to_string());
            }
        }

        for block in &func.blocks {
            let terminator = block.terminator.as_ref().ok_or_else(|| {
                CodeGenError::Verify(format!(
                    "block '{}' in function '{}' has no terminator",
                    block.label, func.name
                ))
            })?;

            for inst in &block.insts {
                self.verify_inst(func, inst, &mut defined)?;
            }
            // The terminator only uses registers, it defines none.
            for reg in register_uses(terminator) {
                if !defined.contains(&reg) {
                    return Err(CodeGenError::Verify(format!(
                        "use of undefined value '%{}' in function '{}'",
                        reg, func.name
                    )));
                }
            }
        }
        Ok(())
    }

    fn verify_inst(
        &self,
        func: &FunctionIr,
        inst: &str,
        defined: &mut HashSet<String>,
    ) -> Result<(), CodeGenError> {
        let (lhs, rest) = match split_definition(inst) {
            Some((lhs, rest)) => (Some(lhs), rest),
            None => (None, inst),
        };

        for reg in register_uses(rest) {
            if !defined.contains(&reg) {
                return Err(CodeGenError::Verify(format!(
                    "use of undefined value '%{}' in function '{}'",
                    reg, func.name
                )));
            }
        }
        if let Some(lhs) = lhs {
            defined.insert(lhs.to_string());
        }

        if let Some(call) = parse_call(rest) {
            self.verify_call(func, &call)?;
        }
        Ok(())
    }

    fn verify_call(&self, func: &FunctionIr, call: &CallSite) -> Result<(), CodeGenError> {
        let sig = self.fn_sigs.get(&call.callee).ok_or_else(|| {
            CodeGenError::Verify(format!(
                "call to unknown function '@{}' in '{}'",
                call.callee, func.name
            ))
        })?;
        if sig.ret_ty != call.ret_ty {
            return Err(CodeGenError::Verify(format!(
                "call to '@{}' in '{}' returns {} but the function is declared {}",
                call.callee, func.name, call.ret_ty, sig.ret_ty
            )));
        }
        if sig.param_tys.len() != call.arg_tys.len() {
            return Err(CodeGenError::Verify(format!(
                "call to '@{}' in '{}' passes {} argument(s) but the function takes {}",
                call.callee,
                func.name,
                call.arg_tys.len(),
                sig.param_tys.len()
            )));
        }
        for (i, (expected, got)) in sig.param_tys.iter().zip(call.arg_tys.iter()).enumerate() {
            if expected != got {
                return Err(CodeGenError::Verify(format!(
                    "argument {} of call to '@{}' in '{}' has type {} but the function takes {}",
                    i, call.callee, func.name, got, expected
                )));
            }
        }
        Ok(())
    }
}

/// Split `%x = rest` into the defined register and the remainder.
fn split_definition(inst: &str) -> Option<(&str, &str)> {
    let rest = inst.strip_prefix('%')?;
    let eq = rest.find(" = ")?;
    Some((&rest[..eq], &rest[eq + 3..]))
}

/// Every `%name` occurrence in an operand position.
fn register_uses(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut uses = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let start = i + 1;
            let mut j = start;
            while j < bytes.len() && is_ident_byte(bytes[j]) {
                j += 1;
            }
            if j > start {
                uses.push(text[start..j].to_string());
            }
            i = j;
        } else {
            i += 1;
        }
    }
    uses
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b'$'
}

struct CallSite {
    callee: String,
    ret_ty: String,
    arg_tys: Vec<String>,
}

/// Parse `call RET @name(ARGS)` out of an instruction body.
fn parse_call(rest: &str) -> Option<CallSite> {
    let after = rest.strip_prefix("call ")?;
    let at = after.find('@')?;
    let ret_ty = after[..at].trim().to_string();
    let after_name = &after[at + 1..];
    let open = after_name.find('(')?;
    let callee = after_name[..open].to_string();
    let args_text = after_name[open + 1..].strip_suffix(')')?;
    let mut arg_tys = Vec::new();
    if !args_text.trim().is_empty() {
        for arg in split_top_level(args_text) {
            // Each argument is `TYPE VALUE`; aggregate types contain no
            // top-level commas in the forms this generator emits.
            let ty = arg
                .trim()
                .rsplit_once(' ')
                .map(|(ty, _)| ty.trim().to_string())
                .unwrap_or_else(|| arg.trim().to_string());
            arg_tys.push(ty);
        }
    }
    Some(CallSite {
        callee,
        ret_ty,
        arg_tys,
    })
}

/// Split on commas outside brackets/parens (array types carry none of the
/// latter, but stay safe).
fn split_top_level(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in text.chars() {
        match c {
            '[' | '(' | '{' => {
                depth += 1;
                current.push(c);
            }
            ']' | ')' | '}' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}
