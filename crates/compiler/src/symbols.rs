//! Scoped symbol table
//!
//! A last-in/first-out stack of name → symbol maps. Shadowing across scopes
//! is allowed; redeclaration within one scope is reported by `declare`
//! returning false so the analyzer can attach the right error.

use std::collections::HashMap;

/// A variable or function binding. Variables use only `name` and `ty`;
/// functions also carry their parameter types and whether a body has been
/// seen (prototype vs definition).
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub ty: String,
    pub is_function: bool,
    pub param_types: Vec<String>,
    pub is_defined: bool,
}

impl Symbol {
    pub fn variable(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Symbol {
            name: name.into(),
            ty: ty.into(),
            is_function: false,
            param_types: Vec::new(),
            is_defined: false,
        }
    }

    pub fn function(
        name: impl Into<String>,
        return_type: impl Into<String>,
        param_types: Vec<String>,
        is_defined: bool,
    ) -> Self {
        Symbol {
            name: name.into(),
            ty: return_type.into(),
            is_function: true,
            param_types,
            is_defined,
        }
    }
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    scopes: Vec<HashMap<String, Symbol>>,
}

impl SymbolTable {
    /// A fresh table with the global scope already entered.
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn exit_scope(&mut self) {
        self.scopes.pop();
    }

    /// Declare in the innermost scope. Returns false if the name already
    /// exists in that scope.
    pub fn declare(&mut self, symbol: Symbol) -> bool {
        let scope = self
            .scopes
            .last_mut()
            .expect("symbol table always has a scope");
        if scope.contains_key(&symbol.name) {
            return false;
        }
        scope.insert(symbol.name.clone(), symbol);
        true
    }

    /// Replace an existing binding in the innermost scope that contains it
    /// (used to upgrade a prototype to a definition).
    pub fn replace(&mut self, symbol: Symbol) {
        for scope in self.scopes.iter_mut().rev() {
            if scope.contains_key(&symbol.name) {
                scope.insert(symbol.name.clone(), symbol);
                return;
            }
        }
    }

    /// Search from the innermost scope outward.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}
