//! Statement parsing
//!
//! Control-flow keywords are dispatched first; a type specifier in statement
//! position starts a local declaration; everything else is an expression
//! statement. Local enum definitions are wrapped in a declaration statement.

use super::declarations::primitive_name;
use super::Parser;
use crate::ast::{Statement, VarDecl};
use crate::error::ParseError;
use crate::lexer::TokenKind;

impl Parser {
    pub(super) fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        if self.match_kind(TokenKind::KwIf) {
            return self.parse_if_statement();
        }
        if self.match_kind(TokenKind::KwReturn) {
            return self.parse_return_statement();
        }
        if self.match_kind(TokenKind::KwWhile) {
            return self.parse_while_statement();
        }
        if self.match_kind(TokenKind::KwFor) {
            return self.parse_for_statement();
        }
        if self.match_kind(TokenKind::KwSwitch) {
            return self.parse_switch_statement();
        }
        if self.match_kind(TokenKind::LBrace) {
            return Ok(Statement::Compound(self.parse_block_statements()?));
        }

        // A local enum definition becomes a declaration statement.
        if self.check(TokenKind::KwEnum) && self.enum_definition_ahead() {
            let decl = self.parse_enum_declaration()?;
            return Ok(Statement::Declaration(Box::new(decl)));
        }

        if self.statement_starts_declaration() {
            return self.parse_variable_declaration_statement();
        }

        self.parse_expression_statement()
    }

    fn enum_definition_ahead(&self) -> bool {
        match self.peek_next_kind() {
            Some(TokenKind::LBrace) => true,
            Some(TokenKind::Identifier) => matches!(
                self.tokens.get(self.current + 2).map(|t| t.kind),
                Some(TokenKind::LBrace)
            ),
            _ => false,
        }
    }

    fn statement_starts_declaration(&self) -> bool {
        primitive_name(self.peek_kind()).is_some()
            || self.check(TokenKind::KwEnum)
            || self.check(TokenKind::KwUnion)
            || self.check(TokenKind::KwStruct)
    }

    /// Statements until the closing `}` (already-open block).
    pub(super) fn parse_block_statements(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }
        self.consume(TokenKind::RBrace, "expected '}' after compound statement")?;
        Ok(statements)
    }

    fn parse_if_statement(&mut self) -> Result<Statement, ParseError> {
        self.consume(TokenKind::LParen, "expected '(' after 'if'")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RParen, "expected ')' after 'if' condition")?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.match_kind(TokenKind::KwElse) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_while_statement(&mut self) -> Result<Statement, ParseError> {
        self.consume(TokenKind::LParen, "expected '(' after 'while'")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RParen, "expected ')' after 'while' condition")?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::While { condition, body })
    }

    fn parse_for_statement(&mut self) -> Result<Statement, ParseError> {
        self.consume(TokenKind::LParen, "expected '(' after 'for'")?;
        let init = if self.match_kind(TokenKind::Semicolon) {
            // `for (;;)`: no init clause.
            Box::new(Statement::Compound(Vec::new()))
        } else if self.statement_starts_declaration() {
            Box::new(self.parse_variable_declaration_statement()?)
        } else {
            Box::new(self.parse_expression_statement()?)
        };
        // An absent condition is treated as constant true during lowering.
        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::Semicolon, "expected ';' after for-loop condition")?;
        let step = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::RParen, "expected ')' after for-loop increment")?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::For {
            init,
            condition,
            step,
            body,
        })
    }

    fn parse_switch_statement(&mut self) -> Result<Statement, ParseError> {
        self.consume(TokenKind::LParen, "expected '(' after 'switch'")?;
        let scrutinee = self.parse_expression()?;
        self.consume(TokenKind::RParen, "expected ')' after switch expression")?;
        self.consume(TokenKind::LBrace, "expected '{' to begin switch block")?;

        let mut cases: Vec<(crate::ast::Expression, Statement)> = Vec::new();
        let mut default = None;
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            if self.match_kind(TokenKind::KwCase) {
                // One or more consecutive labels share the statement that
                // follows them.
                let mut labels = Vec::new();
                loop {
                    let label = self.parse_expression()?;
                    self.consume(TokenKind::Colon, "expected ':' after case label")?;
                    labels.push(label);
                    if !self.match_kind(TokenKind::KwCase) {
                        break;
                    }
                }
                let body = self.parse_statement()?;
                for label in labels {
                    cases.push((label, body.clone()));
                }
            } else if self.match_kind(TokenKind::KwDefault) {
                self.consume(TokenKind::Colon, "expected ':' after 'default'")?;
                default = Some(Box::new(self.parse_statement()?));
            } else {
                return Err(self.unexpected("expected 'case' or 'default' in switch statement"));
            }
        }
        self.consume(TokenKind::RBrace, "expected '}' after switch block")?;
        Ok(Statement::Switch {
            scrutinee,
            cases,
            default,
        })
    }

    fn parse_return_statement(&mut self) -> Result<Statement, ParseError> {
        if self.match_kind(TokenKind::Semicolon) {
            return Ok(Statement::Return(None));
        }
        let expr = self.parse_expression()?;
        self.consume(TokenKind::Semicolon, "expected ';' after return statement")?;
        Ok(Statement::Return(Some(expr)))
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, ParseError> {
        let expr = self.parse_expression()?;
        self.consume(TokenKind::Semicolon, "expected ';' after expression")?;
        Ok(Statement::Expression(expr))
    }

    /// Local declarations, with scalar or initializer-list initializers.
    fn parse_variable_declaration_statement(&mut self) -> Result<Statement, ParseError> {
        if self.check(TokenKind::KwEnum) && self.enum_definition_ahead() {
            let decl = self.parse_enum_declaration()?;
            return Ok(Statement::Declaration(Box::new(decl)));
        }
        let base = self.parse_type_specifier()?;
        let mut decls = Vec::new();
        loop {
            let mut ty = base.clone();
            while self.match_kind(TokenKind::Multiply) {
                ty.push('*');
            }
            let name = self
                .consume(
                    TokenKind::Identifier,
                    "expected variable name in variable declaration",
                )?
                .lexeme;
            let dims = self.parse_array_dimensions()?;
            let init = if self.match_kind(TokenKind::Assign) {
                if self.check(TokenKind::LBrace) {
                    Some(self.parse_initializer_list()?)
                } else {
                    Some(self.parse_expression()?)
                }
            } else {
                None
            };
            decls.push(VarDecl {
                ty,
                name,
                dims,
                init,
            });
            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }
        self.consume(
            TokenKind::Semicolon,
            "expected ';' after variable declaration",
        )?;
        if decls.len() == 1 {
            Ok(Statement::VarDecl(decls.pop().expect("one declarator")))
        } else {
            Ok(Statement::MultiVarDecl(decls))
        }
    }
}
