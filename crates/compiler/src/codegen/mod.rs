//! LLVM IR generation via text
//!
//! Lowers the analyzed AST to textual LLVM IR (the opaque-pointer surface,
//! LLVM 15+): identified struct types at the top, then globals and enum
//! constants, `declare` lines for prototypes that never get a body, and
//! function definitions made of named basic blocks.
//!
//! Emission is structured: each function is a list of blocks, each holding
//! its instructions and exactly one terminator, so the module can be
//! structurally verified before printing.
//!
//! # Module structure
//!
//! - `types.rs`: type-string lowering, union sizing, struct type emission
//! - `globals.rs`: global variables and enumerator constants
//! - `functions.rs`: declarations, definitions, parameter slots
//! - `statements.rs`: statement lowering (control flow, locals)
//! - `expressions.rs`: expression and lvalue lowering, constant folding
//! - `verify.rs`: structural verification

mod expressions;
mod functions;
mod globals;
mod statements;
mod types;
mod verify;

use crate::ast::Program;
use crate::error::CodeGenError;
use crate::types::TypeRegistry;
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

/// An SSA value: its printable text (register or immediate) and LLVM type.
#[derive(Debug, Clone)]
pub(super) struct Value {
    pub text: String,
    pub ty: String,
}

impl Value {
    pub fn new(text: impl Into<String>, ty: impl Into<String>) -> Self {
        Value {
            text: text.into(),
            ty: ty.into(),
        }
    }
}

/// A resolved lvalue: a pointer register plus what it points at.
#[derive(Debug, Clone)]
pub(super) struct Place {
    /// Pointer text (`%x.addr`, `@g`, or a GEP result).
    pub ptr: String,
    /// Canonical declared type string of the pointee.
    pub decl_ty: String,
    /// Lowered LLVM type of the pointee.
    pub llvm_ty: String,
    /// Remaining array dimensions (outer first); empty for scalars.
    pub dims: Vec<u64>,
}

#[derive(Debug)]
pub(super) struct Block {
    pub label: String,
    pub insts: Vec<String>,
    pub terminator: Option<String>,
}

impl Block {
    fn new(label: String) -> Self {
        Block {
            label,
            insts: Vec::new(),
            terminator: None,
        }
    }
}

#[derive(Debug)]
pub(super) struct FunctionIr {
    pub name: String,
    pub ret_ty: String,
    /// (LLVM type, parameter name) pairs.
    pub params: Vec<(String, String)>,
    pub blocks: Vec<Block>,
}

/// Module-level function signature, in LLVM types.
#[derive(Debug, Clone)]
pub(super) struct FnSig {
    pub ret_ty: String,
    pub param_tys: Vec<String>,
    pub defined: bool,
}

/// A local slot: where it lives and what it holds.
#[derive(Debug, Clone)]
pub(super) struct LocalSlot {
    pub reg: String,
    pub decl_ty: String,
    pub llvm_ty: String,
    pub dims: Vec<u64>,
}

/// Shape of a module-level global, for identifier lowering.
#[derive(Debug, Clone)]
pub(super) struct GlobalInfo {
    pub decl_ty: String,
    pub llvm_ty: String,
    pub dims: Vec<u64>,
}

pub struct CodeGen {
    pub(super) registry: TypeRegistry,

    // Module-level output
    pub(super) struct_defs: Vec<(String, String)>,
    pub(super) declared_structs: HashSet<String>,
    pub(super) union_sizes: HashMap<String, u64>,
    pub(super) globals_text: String,
    pub(super) globals_info: HashMap<String, GlobalInfo>,
    pub(super) fn_sigs: HashMap<String, FnSig>,
    pub(super) fn_order: Vec<String>,
    pub(super) functions: Vec<FunctionIr>,

    // Per-function state, reset by `start_function`
    pub(super) blocks: Vec<Block>,
    pub(super) current_block: usize,
    pub(super) temp_counter: usize,
    pub(super) block_counter: usize,
    pub(super) scopes: Vec<HashMap<String, LocalSlot>>,
    pub(super) used_slot_names: HashSet<String>,
    pub(super) current_ret_decl: String,
}

impl CodeGen {
    pub fn new(registry: TypeRegistry) -> Self {
        CodeGen {
            registry,
            struct_defs: Vec::new(),
            declared_structs: HashSet::new(),
            union_sizes: HashMap::new(),
            globals_text: String::new(),
            globals_info: HashMap::new(),
            fn_sigs: HashMap::new(),
            fn_order: Vec::new(),
            functions: Vec::new(),
            blocks: Vec::new(),
            current_block: 0,
            temp_counter: 0,
            block_counter: 0,
            scopes: Vec::new(),
            used_slot_names: HashSet::new(),
            current_ret_decl: String::new(),
        }
    }

    /// Lower the whole program and return the printed module.
    pub fn codegen_program(&mut self, program: &Program) -> Result<String, CodeGenError> {
        self.gen_globals(program)?;
        for decl in &program.declarations {
            if let crate::ast::Declaration::Function(func) = decl {
                self.gen_function(func)?;
            }
        }
        self.verify_module()?;
        self.print_module()
    }

    fn print_module(&self) -> Result<String, CodeGenError> {
        let mut out = String::new();
        writeln!(out, "; ModuleID = 'mica'")?;
        writeln!(out)?;

        for (name, body) in &self.struct_defs {
            writeln!(out, "{} = type {}", name, body)?;
        }
        if !self.struct_defs.is_empty() {
            writeln!(out)?;
        }

        if !self.globals_text.is_empty() {
            out.push_str(&self.globals_text);
            writeln!(out)?;
        }

        for name in &self.fn_order {
            let sig = &self.fn_sigs[name];
            if !sig.defined {
                writeln!(
                    out,
                    "declare {} @{}({})",
                    sig.ret_ty,
                    name,
                    sig.param_tys.join(", ")
                )?;
            }
        }

        for func in &self.functions {
            writeln!(out)?;
            let params = func
                .params
                .iter()
                .map(|(ty, name)| format!("{} %{}", ty, name))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(out, "define {} @{}({}) {{", func.ret_ty, func.name, params)?;
            for (i, block) in func.blocks.iter().enumerate() {
                if i > 0 {
                    writeln!(out)?;
                    writeln!(out, "{}:", block.label)?;
                }
                for inst in &block.insts {
                    writeln!(out, "  {}", inst)?;
                }
                if let Some(term) = &block.terminator {
                    writeln!(out, "  {}", term)?;
                }
            }
            writeln!(out, "}}")?;
        }
        Ok(out)
    }

    // ---- block and register plumbing -------------------------------------

    pub(super) fn start_function(&mut self, ret_decl: &str) {
        self.blocks = vec![Block::new("entry".to_string())];
        self.current_block = 0;
        self.temp_counter = 0;
        self.block_counter = 0;
        self.scopes = vec![HashMap::new()];
        self.used_slot_names.clear();
        self.current_ret_decl = ret_decl.to_string();
    }

    /// Create a block (printed in creation order) and return its label.
    pub(super) fn new_block(&mut self, prefix: &str) -> String {
        let label = format!("{}.{}", prefix, self.block_counter);
        self.block_counter += 1;
        self.blocks.push(Block::new(label.clone()));
        label
    }

    pub(super) fn position_at(&mut self, label: &str) {
        let idx = self
            .blocks
            .iter()
            .position(|b| b.label == label)
            .expect("positioning at a block that was created");
        self.current_block = idx;
    }

    pub(super) fn emit(&mut self, inst: String) {
        let block = &mut self.blocks[self.current_block];
        debug_assert!(
            block.terminator.is_none(),
            "emitting into a terminated block"
        );
        block.insts.push(inst);
    }

    pub(super) fn terminate(&mut self, terminator: String) {
        let block = &mut self.blocks[self.current_block];
        if block.terminator.is_none() {
            block.terminator = Some(terminator);
        }
    }

    pub(super) fn current_terminated(&self) -> bool {
        self.blocks[self.current_block].terminator.is_some()
    }

    /// Fresh temporary register. User identifiers never contain dots, so
    /// `%t.N` cannot collide with parameters or slots.
    pub(super) fn fresh_temp(&mut self) -> String {
        let name = format!("%t.{}", self.temp_counter);
        self.temp_counter += 1;
        name
    }

    /// A stack-slot register for a named local, unique within the function.
    pub(super) fn fresh_slot(&mut self, name: &str) -> String {
        let mut candidate = format!("{}.addr", name);
        let mut n = 0usize;
        while self.used_slot_names.contains(&candidate) {
            n += 1;
            candidate = format!("{}.addr.{}", name, n);
        }
        self.used_slot_names.insert(candidate.clone());
        format!("%{}", candidate)
    }

    pub(super) fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub(super) fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub(super) fn insert_local(&mut self, name: &str, slot: LocalSlot) {
        self.scopes
            .last_mut()
            .expect("function scope present")
            .insert(name.to_string(), slot);
    }

    pub(super) fn lookup_local(&self, name: &str) -> Option<&LocalSlot> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use crate::sema::SemanticAnalyzer;

    fn lower(source: &str) -> String {
        let mut program = parse_source(source).unwrap();
        let registry = SemanticAnalyzer::new().analyze(&mut program).unwrap();
        CodeGen::new(registry).codegen_program(&mut program).unwrap()
    }

    #[test]
    fn test_minimal_main() {
        let ir = lower("int main() { return 0; }");
        assert!(ir.contains("define i32 @main()"));
        assert!(ir.contains("ret i32 0"));
    }

    #[test]
    fn test_global_zero_init() {
        let ir = lower("int counter;\nint main() { return counter; }");
        assert!(ir.contains("@counter = global i32 0"));
        assert!(ir.contains("load i32, ptr @counter"));
    }

    #[test]
    fn test_prototype_emits_declare() {
        let ir = lower("int external(int a);\nint main() { return external(3); }");
        assert!(ir.contains("declare i32 @external(i32)"));
        assert!(ir.contains("call i32 @external(i32 3)"));
    }

    #[test]
    fn test_prototype_then_definition_emits_single_define() {
        let ir = lower("int f(int a);\nint f(int a) { return a; }\nint main() { return f(1); }");
        assert!(!ir.contains("declare i32 @f"));
        assert_eq!(ir.matches("define i32 @f(i32 %a)").count(), 1);
    }

    #[test]
    fn test_default_return_synthesized() {
        let ir = lower("int f() { int x = 1; }\nint main() { return f(); }");
        assert!(ir.contains("ret i32 0"));
    }

    #[test]
    fn test_void_function() {
        let ir = lower("void f() { return; }\nint main() { f(); return 0; }");
        assert!(ir.contains("define void @f()"));
        assert!(ir.contains("ret void"));
        assert!(ir.contains("call void @f()"));
    }
}
