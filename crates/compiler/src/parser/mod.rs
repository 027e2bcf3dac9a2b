//! Recursive-descent parser
//!
//! A predictive parser over the token stream with expression parsing layered
//! by precedence. The first error is fatal: there is no resynchronization,
//! and every error carries the offending token's position and lexeme.
//!
//! The grammar is split across submodules the same way the phases are:
//! `declarations` (top level, aggregates, functions), `statements` and
//! `expressions` (the precedence ladder).

mod declarations;
mod expressions;
mod statements;

use crate::ast::Program;
use crate::error::ParseError;
use crate::lexer::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, current: 0 }
    }

    /// Read top-level declarations until end of input.
    pub fn parse(&mut self) -> Result<Program, ParseError> {
        let mut program = Program::new();
        while !self.is_at_end() {
            let decl = self.parse_declaration()?;
            program.declarations.push(decl);
        }
        Ok(program)
    }

    pub(super) fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len() || self.tokens[self.current].kind == TokenKind::Eof
    }

    pub(super) fn peek(&self) -> &Token {
        if self.current < self.tokens.len() {
            &self.tokens[self.current]
        } else {
            // The lexer always terminates the stream with EOF.
            self.tokens.last().expect("token stream is never empty")
        }
    }

    pub(super) fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    pub(super) fn peek_next_kind(&self) -> Option<TokenKind> {
        self.tokens.get(self.current + 1).map(|t| t.kind)
    }

    pub(super) fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    pub(super) fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.tokens[self.current - 1].clone()
    }

    pub(super) fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    pub(super) fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            return true;
        }
        false
    }

    pub(super) fn consume(
        &mut self,
        kind: TokenKind,
        message: &str,
    ) -> Result<Token, ParseError> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        Err(self.unexpected(message))
    }

    /// Build an unexpected-token error at the current position.
    pub(super) fn unexpected(&self, message: &str) -> ParseError {
        let token = self.peek();
        ParseError::UnexpectedToken {
            expected: message.to_string(),
            found: token.lexeme.clone(),
            line: token.line,
            column: token.column,
        }
    }

    /// Same, anchored at the token just consumed (for literal conversion
    /// failures).
    pub(super) fn unexpected_at_previous(&self, message: &str) -> ParseError {
        let token = self.previous();
        ParseError::UnexpectedToken {
            expected: message.to_string(),
            found: token.lexeme.clone(),
            line: token.line,
            column: token.column,
        }
    }

    pub(super) fn expected_expression(&self) -> ParseError {
        let token = self.peek();
        ParseError::ExpectedExpression {
            found: token.lexeme.clone(),
            line: token.line,
            column: token.column,
        }
    }

    pub(super) fn save(&self) -> usize {
        self.current
    }

    pub(super) fn restore(&mut self, position: usize) {
        self.current = position;
    }
}

/// Convenience: lex and parse a source string.
pub fn parse_source(source: &str) -> Result<Program, crate::error::CompileError> {
    let tokens = crate::lexer::tokenize(source)?;
    let mut parser = Parser::new(tokens);
    Ok(parser.parse()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;

    fn parse(source: &str) -> Program {
        parse_source(source).unwrap()
    }

    #[test]
    fn test_global_variable() {
        let program = parse("int x = 5;");
        assert_eq!(program.declarations.len(), 1);
        match &program.declarations[0] {
            Declaration::Variable(v) => {
                assert_eq!(v.ty, "int");
                assert_eq!(v.name, "x");
                assert!(v.init.is_some());
            }
            other => panic!("expected variable, got {:?}", other),
        }
    }

    #[test]
    fn test_multi_variable_declaration() {
        let program = parse("int x = 1, y, z[4];");
        match &program.declarations[0] {
            Declaration::MultiVariable(decls) => {
                assert_eq!(decls.len(), 3);
                assert_eq!(decls[2].name, "z");
                assert_eq!(decls[2].dims.len(), 1);
            }
            other => panic!("expected multi variable, got {:?}", other),
        }
    }

    #[test]
    fn test_prototype_and_definition() {
        let program = parse("int add(int a, int b);\nint add(int a, int b) { return a + b; }");
        match (&program.declarations[0], &program.declarations[1]) {
            (Declaration::Function(proto), Declaration::Function(def)) => {
                assert!(proto.body.is_none());
                assert!(def.body.is_some());
                assert_eq!(proto.params, def.params);
            }
            other => panic!("expected two functions, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_parameter_list() {
        let program = parse("int main() { return 0; }");
        match &program.declarations[0] {
            Declaration::Function(f) => assert!(f.params.is_empty()),
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_void_function_with_pointer_params() {
        let program = parse("void swap(int *a, int *b) { *a = *b; }");
        match &program.declarations[0] {
            Declaration::Function(f) => {
                assert_eq!(f.return_type, "void");
                assert_eq!(f.params[0].0, "int*");
                assert_eq!(f.params[1].0, "int*");
            }
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_struct_declaration() {
        let program = parse("struct Point { int x; int y; };");
        match &program.declarations[0] {
            Declaration::Struct(s) => {
                assert_eq!(s.tag.as_deref(), Some("Point"));
                assert_eq!(s.members.len(), 2);
            }
            other => panic!("expected struct, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_struct_member_type() {
        let program = parse("struct Rect { struct Point tl; struct Point br; };");
        match &program.declarations[0] {
            Declaration::Struct(s) => {
                assert_eq!(s.members[0].ty, "struct Point");
            }
            other => panic!("expected struct, got {:?}", other),
        }
    }

    #[test]
    fn test_bitfield_rejected() {
        let err = parse_source("struct S { int flags : 3; };").unwrap_err();
        assert!(err.to_string().contains("bit-field"));
    }

    #[test]
    fn test_union_declaration() {
        let program = parse("union U { int i; float f; };");
        match &program.declarations[0] {
            Declaration::Union(u) => {
                assert_eq!(u.tag.as_deref(), Some("U"));
                assert_eq!(u.members.len(), 2);
            }
            other => panic!("expected union, got {:?}", other),
        }
    }

    #[test]
    fn test_enum_declaration() {
        let program = parse("enum Color { RED, GREEN = 5, BLUE };");
        match &program.declarations[0] {
            Declaration::Enum(e) => {
                assert_eq!(e.enumerators.len(), 3);
                assert!(e.enumerators[1].1.is_some());
                assert!(e.values.is_empty());
            }
            other => panic!("expected enum, got {:?}", other),
        }
    }

    #[test]
    fn test_enum_variable_vs_definition() {
        // `enum Color c;` is a variable of an enum type, not a definition.
        let program = parse("enum Color { RED };\nint main() { enum Color c; return 0; }");
        assert_eq!(program.declarations.len(), 2);
    }

    #[test]
    fn test_missing_semicolon() {
        let err = parse_source("int x = 5").unwrap_err();
        assert!(err.to_string().contains("';'"));
    }

    #[test]
    fn test_expected_expression() {
        let err = parse_source("int main() { int x = ; }").unwrap_err();
        assert!(matches!(
            err,
            crate::error::CompileError::Parse(ParseError::ExpectedExpression { .. })
        ));
    }

    #[test]
    fn test_bare_return_parses() {
        // `return;` is the only way to leave a void function early.
        let program = parse("void f() { return; }");
        match &program.declarations[0] {
            Declaration::Function(f) => {
                assert_eq!(f.body.as_ref().unwrap()[0], Statement::Return(None));
            }
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_top_level_names_in_order() {
        let program = parse("int g;\nint f();\nint main() { return 0; }");
        let names: Vec<String> = program
            .declarations
            .iter()
            .map(|d| match d {
                Declaration::Variable(v) => v.name.clone(),
                Declaration::Function(f) => f.name.clone(),
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(names, vec!["g", "f", "main"]);
    }
}
