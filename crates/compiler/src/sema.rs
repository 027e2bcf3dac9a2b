//! Semantic analysis
//!
//! Walks top-level declarations in file order, validating names, function
//! signatures, aggregate member accesses, enum initializers and call arity
//! against a scoped symbol table. Struct/union declarations and enumerator
//! values are recorded in the type registry, which the IR generator reads.
//!
//! Argument types are deliberately not checked here; mismatches surface
//! during IR verification.

use crate::ast::{
    Declaration, EnumDecl, Expression, Literal, Program, Statement, StructDecl, UnionDecl, VarDecl,
};
use crate::error::SemaError;
use crate::symbols::{Symbol, SymbolTable};
use crate::types::{self, TypeRegistry};

pub struct SemanticAnalyzer {
    symbols: SymbolTable,
    registry: TypeRegistry,
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        SemanticAnalyzer {
            symbols: SymbolTable::new(),
            registry: TypeRegistry::new(),
        }
    }

    /// Analyze the whole program. Enum declarations get their values
    /// computed in place; on success the populated registry is handed to
    /// the IR generator.
    pub fn analyze(mut self, program: &mut Program) -> Result<TypeRegistry, SemaError> {
        for decl in &mut program.declarations {
            self.analyze_declaration(decl)?;
        }
        Ok(self.registry)
    }

    fn analyze_declaration(&mut self, decl: &mut Declaration) -> Result<(), SemaError> {
        match decl {
            Declaration::Variable(var) => self.analyze_variable(var),
            Declaration::MultiVariable(vars) => {
                for var in vars {
                    self.analyze_variable(var)?;
                }
                Ok(())
            }
            Declaration::Function(func) => {
                let name = func.name.clone();
                let return_type = func.return_type.clone();
                let params = func.params.clone();
                self.analyze_function(&name, &return_type, &params, func.body.as_mut())
            }
            Declaration::Struct(decl) => self.analyze_struct(decl),
            Declaration::Union(decl) => self.analyze_union(decl),
            Declaration::Enum(decl) => self.analyze_enum(decl),
        }
    }

    fn analyze_variable(&mut self, var: &VarDecl) -> Result<(), SemaError> {
        if !self.symbols.declare(Symbol::variable(&var.name, &var.ty)) {
            return Err(SemaError::Redeclaration {
                name: var.name.clone(),
            });
        }
        for dim in &var.dims {
            self.analyze_expression(dim)?;
        }
        if let Some(init) = &var.init {
            self.analyze_expression(init)?;
        }
        Ok(())
    }

    fn analyze_function(
        &mut self,
        name: &str,
        return_type: &str,
        params: &[(String, String)],
        body: Option<&mut Vec<Statement>>,
    ) -> Result<(), SemaError> {
        let param_types: Vec<String> = params.iter().map(|(ty, _)| ty.clone()).collect();
        let has_body = body.is_some();

        match self.symbols.lookup(name) {
            None => {
                self.symbols.declare(Symbol::function(
                    name,
                    return_type,
                    param_types.clone(),
                    has_body,
                ));
            }
            Some(existing) => {
                if !existing.is_function {
                    return Err(SemaError::ConflictingDeclaration {
                        name: name.to_string(),
                    });
                }
                if existing.ty != return_type || existing.param_types != param_types {
                    return Err(SemaError::ConflictingDeclaration {
                        name: name.to_string(),
                    });
                }
                if existing.is_defined && has_body {
                    return Err(SemaError::Redefinition {
                        name: name.to_string(),
                    });
                }
                if has_body {
                    // Prototype followed by a definition: upgrade in place.
                    self.symbols.replace(Symbol::function(
                        name,
                        return_type,
                        param_types.clone(),
                        true,
                    ));
                }
            }
        }

        if let Some(body) = body {
            self.symbols.enter_scope();
            for (ty, param_name) in params {
                if !self.symbols.declare(Symbol::variable(param_name, ty)) {
                    return Err(SemaError::Redeclaration {
                        name: param_name.clone(),
                    });
                }
            }
            for stmt in body {
                self.analyze_statement(stmt)?;
            }
            self.symbols.exit_scope();
        }
        Ok(())
    }

    fn analyze_struct(&mut self, decl: &StructDecl) -> Result<(), SemaError> {
        if let Some(tag) = &decl.tag {
            self.registry.register_struct(tag, decl.clone());
        }
        Ok(())
    }

    fn analyze_union(&mut self, decl: &UnionDecl) -> Result<(), SemaError> {
        if let Some(tag) = &decl.tag {
            for member in &decl.members {
                if types::union_tag(&member.ty).is_some() {
                    return Err(SemaError::NestedUnion { tag: tag.clone() });
                }
            }
            self.registry.register_union(tag, decl.clone());
        }
        Ok(())
    }

    /// Enumerators auto-increment from the previous value, starting at 0;
    /// an explicit integer initializer resets the running counter to
    /// `value + 1`.
    fn analyze_enum(&mut self, decl: &mut EnumDecl) -> Result<(), SemaError> {
        let mut next_value = 0i32;
        decl.values.clear();
        for (name, init) in &decl.enumerators {
            let value = match init {
                Some(Expression::Literal(Literal::Int(v))) => {
                    next_value = v.wrapping_add(1);
                    *v
                }
                Some(_) => {
                    return Err(SemaError::EnumInitializer { name: name.clone() });
                }
                None => {
                    let v = next_value;
                    next_value = next_value.wrapping_add(1);
                    v
                }
            };
            decl.values.push(value);
            if !self.symbols.declare(Symbol::variable(name, "int")) {
                return Err(SemaError::Redeclaration { name: name.clone() });
            }
            self.registry.register_enumerator(name, value);
        }
        Ok(())
    }

    fn analyze_statement(&mut self, stmt: &mut Statement) -> Result<(), SemaError> {
        match stmt {
            Statement::Compound(stmts) => {
                self.symbols.enter_scope();
                for s in stmts {
                    self.analyze_statement(s)?;
                }
                self.symbols.exit_scope();
                Ok(())
            }
            Statement::Expression(expr) => self.analyze_expression(expr),
            Statement::Return(expr) => {
                if let Some(expr) = expr {
                    self.analyze_expression(expr)?;
                }
                Ok(())
            }
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.analyze_expression(condition)?;
                self.analyze_statement(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.analyze_statement(else_branch)?;
                }
                Ok(())
            }
            Statement::While { condition, body } => {
                self.analyze_expression(condition)?;
                self.analyze_statement(body)
            }
            Statement::For {
                init,
                condition,
                step,
                body,
            } => {
                // The init declarator binds in the loop's own scope.
                self.symbols.enter_scope();
                self.analyze_statement(init)?;
                if let Some(condition) = condition {
                    self.analyze_expression(condition)?;
                }
                if let Some(step) = step {
                    self.analyze_expression(step)?;
                }
                self.analyze_statement(body)?;
                self.symbols.exit_scope();
                Ok(())
            }
            Statement::Switch {
                scrutinee,
                cases,
                default,
            } => {
                self.analyze_expression(scrutinee)?;
                for (label, body) in cases {
                    self.analyze_expression(label)?;
                    self.analyze_statement(body)?;
                }
                if let Some(default) = default {
                    self.analyze_statement(default)?;
                }
                Ok(())
            }
            Statement::VarDecl(var) => self.analyze_variable(var),
            Statement::MultiVarDecl(vars) => {
                for var in vars {
                    self.analyze_variable(var)?;
                }
                Ok(())
            }
            Statement::Declaration(decl) => self.analyze_declaration(decl),
        }
    }

    fn analyze_expression(&mut self, expr: &Expression) -> Result<(), SemaError> {
        match expr {
            Expression::Literal(_) => Ok(()),
            Expression::Identifier(name) => {
                if self.symbols.contains(name) {
                    Ok(())
                } else {
                    Err(SemaError::Undefined { name: name.clone() })
                }
            }
            Expression::Binary { left, right, .. } => {
                self.analyze_expression(left)?;
                self.analyze_expression(right)
            }
            Expression::Unary { operand, .. } => self.analyze_expression(operand),
            Expression::Postfix { operand, .. } => self.analyze_expression(operand),
            Expression::Cast { operand, .. } => self.analyze_expression(operand),
            Expression::MemberAccess { base, member } => {
                self.analyze_expression(base)?;
                let base_ty = self.expression_aggregate_type(base)?;
                if self.registry.member_type(&base_ty, member).is_none() {
                    return Err(SemaError::NoSuchMember {
                        ty: base_ty,
                        member: member.clone(),
                    });
                }
                Ok(())
            }
            Expression::ArrayIndex { base, index } => {
                self.analyze_expression(base)?;
                self.analyze_expression(index)
            }
            Expression::Call { callee, args } => {
                let symbol = match self.symbols.lookup(callee) {
                    None => {
                        return Err(SemaError::Undefined {
                            name: callee.clone(),
                        });
                    }
                    Some(symbol) => symbol,
                };
                if !symbol.is_function {
                    return Err(SemaError::NotCallable {
                        name: callee.clone(),
                    });
                }
                if symbol.param_types.len() != args.len() {
                    return Err(SemaError::ArgumentCount {
                        name: callee.clone(),
                        expected: symbol.param_types.len(),
                        got: args.len(),
                    });
                }
                for arg in args {
                    self.analyze_expression(arg)?;
                }
                Ok(())
            }
            Expression::Assignment { target, value } => {
                match target.as_ref() {
                    Expression::Identifier(name) => {
                        if !self.symbols.contains(name) {
                            return Err(SemaError::Undefined { name: name.clone() });
                        }
                    }
                    Expression::MemberAccess { .. }
                    | Expression::ArrayIndex { .. }
                    | Expression::Unary {
                        op: crate::ast::UnaryOp::Deref,
                        ..
                    } => {
                        self.analyze_expression(target)?;
                    }
                    _ => return Err(SemaError::InvalidAssignTarget),
                }
                self.analyze_expression(value)
            }
            Expression::InitializerList(elements) => {
                for element in elements {
                    self.analyze_expression(element)?;
                }
                Ok(())
            }
        }
    }

    /// The aggregate type string a member access base resolves to.
    fn expression_aggregate_type(&self, base: &Expression) -> Result<String, SemaError> {
        let ty = self.expression_declared_type(base)?;
        if types::struct_tag(&ty).is_some() || types::union_tag(&ty).is_some() {
            let known = types::struct_tag(&ty)
                .map(|tag| self.registry.lookup_struct(tag).is_some())
                .or_else(|| types::union_tag(&ty).map(|tag| self.registry.lookup_union(tag).is_some()))
                .unwrap_or(false);
            if known {
                return Ok(ty);
            }
        }
        Err(SemaError::NotAggregate {
            name: describe_expression(base),
        })
    }

    /// Declared type of expressions that can appear as member-access bases.
    fn expression_declared_type(&self, expr: &Expression) -> Result<String, SemaError> {
        match expr {
            Expression::Identifier(name) => match self.symbols.lookup(name) {
                Some(symbol) => Ok(symbol.ty.clone()),
                None => Err(SemaError::Undefined { name: name.clone() }),
            },
            Expression::MemberAccess { base, member } => {
                let base_ty = self.expression_aggregate_type(base)?;
                match self.registry.member_type(&base_ty, member) {
                    Some(member_decl) => Ok(member_decl.ty.clone()),
                    None => Err(SemaError::NoSuchMember {
                        ty: base_ty,
                        member: member.clone(),
                    }),
                }
            }
            Expression::ArrayIndex { base, .. } => self.expression_declared_type(base),
            other => Err(SemaError::NotAggregate {
                name: describe_expression(other),
            }),
        }
    }
}

fn describe_expression(expr: &Expression) -> String {
    match expr {
        Expression::Identifier(name) => name.clone(),
        Expression::MemberAccess { member, .. } => member.clone(),
        Expression::Call { callee, .. } => callee.clone(),
        _ => "expression".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    fn analyze(source: &str) -> Result<TypeRegistry, SemaError> {
        let mut program = parse_source(source).unwrap();
        SemanticAnalyzer::new().analyze(&mut program)
    }

    #[test]
    fn test_redeclaration_in_scope() {
        let err = analyze("int main() { int x; int x; return 0; }").unwrap_err();
        assert!(matches!(err, SemaError::Redeclaration { .. }));
    }

    #[test]
    fn test_shadowing_allowed() {
        assert!(analyze("int x; int main() { int x; { int x; } return 0; }").is_ok());
    }

    #[test]
    fn test_undefined_identifier() {
        let err = analyze("int main() { return y; }").unwrap_err();
        assert!(matches!(err, SemaError::Undefined { .. }));
    }

    #[test]
    fn test_assignment_to_literal_rejected() {
        let err = analyze("int main() { 3 = 4; return 0; }").unwrap_err();
        assert!(matches!(err, SemaError::InvalidAssignTarget));
    }

    #[test]
    fn test_prototype_then_matching_definition() {
        assert!(analyze("int f(int a);\nint f(int a) { return a; }\nint main() { return f(1); }").is_ok());
    }

    #[test]
    fn test_conflicting_signature() {
        let err = analyze("int f(int a);\nint f(float a) { return 0; }").unwrap_err();
        assert!(matches!(err, SemaError::ConflictingDeclaration { .. }));
    }

    #[test]
    fn test_double_definition() {
        let err = analyze("int f() { return 0; }\nint f() { return 1; }").unwrap_err();
        assert!(matches!(err, SemaError::Redefinition { .. }));
    }

    #[test]
    fn test_call_arity() {
        let err = analyze("int f(int a) { return a; }\nint main() { return f(1, 2); }").unwrap_err();
        assert!(matches!(err, SemaError::ArgumentCount { .. }));
    }

    #[test]
    fn test_not_callable() {
        let err = analyze("int x;\nint main() { return x(); }").unwrap_err();
        assert!(matches!(err, SemaError::NotCallable { .. }));
    }

    #[test]
    fn test_enum_values_dense() {
        let mut program =
            parse_source("enum E { A, B, C = 10, D };\nint main() { return B; }").unwrap();
        let registry = SemanticAnalyzer::new().analyze(&mut program).unwrap();
        assert_eq!(registry.enumerator_value("A"), Some(0));
        assert_eq!(registry.enumerator_value("B"), Some(1));
        assert_eq!(registry.enumerator_value("C"), Some(10));
        assert_eq!(registry.enumerator_value("D"), Some(11));
        match &program.declarations[0] {
            Declaration::Enum(e) => assert_eq!(e.values, vec![0, 1, 10, 11]),
            other => panic!("expected enum, got {:?}", other),
        }
    }

    #[test]
    fn test_enum_initializer_must_be_int_literal() {
        let err = analyze("enum E { A = 1.5 };").unwrap_err();
        assert!(matches!(err, SemaError::EnumInitializer { .. }));
    }

    #[test]
    fn test_member_access_on_non_aggregate() {
        let err = analyze("int main() { int x; return x.field; }").unwrap_err();
        assert!(matches!(err, SemaError::NotAggregate { .. }));
    }

    #[test]
    fn test_unknown_member() {
        let err = analyze(
            "struct P { int x; };\nint main() { struct P p; return p.z; }",
        )
        .unwrap_err();
        assert!(matches!(err, SemaError::NoSuchMember { .. }));
    }

    #[test]
    fn test_nested_member_access() {
        assert!(analyze(
            "struct P { int x; int y; };\nstruct R { struct P tl; };\nint main() { struct R r; r.tl.x = 1; return r.tl.x; }",
        )
        .is_ok());
    }

    #[test]
    fn test_union_member_access() {
        assert!(analyze(
            "union U { int i; int j; };\nint main() { union U u; u.i = 10; return u.i; }",
        )
        .is_ok());
    }

    #[test]
    fn test_nested_union_rejected() {
        let err = analyze("union Inner { int i; };\nunion Outer { union Inner inner; };").unwrap_err();
        assert!(matches!(err, SemaError::NestedUnion { .. }));
    }

    #[test]
    fn test_for_init_binds_in_loop_scope() {
        assert!(analyze(
            "int main() { for (int i = 0; i < 3; i++) { int i2 = i; } int i = 9; return i; }",
        )
        .is_ok());
    }
}
