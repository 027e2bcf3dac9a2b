//! Top-level declarations: variables, functions, struct/union/enum
//!
//! Disambiguation at the top level is done with bounded lookahead: a
//! primitive specifier followed by an identifier and `(` is a function,
//! anything else is a (possibly multi-declarator) variable declaration.
//! `enum`/`struct`/`union` followed by `{` (directly or after a tag) open a
//! type definition; followed by a tag and a declarator they are type
//! specifiers.

use super::Parser;
use crate::ast::{
    Declaration, EnumDecl, Expression, FunctionDecl, StructDecl, UnionDecl, VarDecl,
};
use crate::error::ParseError;
use crate::lexer::TokenKind;

/// The primitive type keyword spelling, if `kind` is one.
pub(super) fn primitive_name(kind: TokenKind) -> Option<&'static str> {
    match kind {
        TokenKind::KwInt => Some("int"),
        TokenKind::KwFloat => Some("float"),
        TokenKind::KwChar => Some("char"),
        TokenKind::KwDouble => Some("double"),
        TokenKind::KwBool => Some("bool"),
        _ => None,
    }
}

impl Parser {
    pub(super) fn parse_declaration(&mut self) -> Result<Declaration, ParseError> {
        if self.check(TokenKind::KwStruct) {
            if self.aggregate_definition_ahead() {
                return self.parse_struct_declaration();
            }
            return self.parse_variable_declaration();
        }
        if self.check(TokenKind::KwUnion) {
            if self.aggregate_definition_ahead() {
                return self.parse_union_declaration();
            }
            return self.parse_variable_declaration();
        }
        if self.check(TokenKind::KwEnum) {
            if self.aggregate_definition_ahead() {
                return self.parse_enum_declaration();
            }
            return self.parse_variable_declaration();
        }
        if primitive_name(self.peek_kind()).is_some() || self.check(TokenKind::KwVoid) {
            // Lookahead: type, stars, identifier, then '(' means function.
            let save = self.save();
            self.advance();
            while self.check(TokenKind::Multiply) {
                self.advance();
            }
            if self.check(TokenKind::Identifier) {
                self.advance();
                let is_function = self.check(TokenKind::LParen);
                self.restore(save);
                if is_function {
                    return self.parse_function_declaration();
                }
                return self.parse_variable_declaration();
            }
            self.restore(save);
            return Err(self.unexpected("expected identifier after type"));
        }
        Err(self.unexpected("expected declaration"))
    }

    /// True when the keyword at the cursor starts a type *definition*
    /// (`kw {` or `kw Tag {`) rather than a type specifier.
    fn aggregate_definition_ahead(&self) -> bool {
        match self.peek_next_kind() {
            Some(TokenKind::LBrace) => true,
            Some(TokenKind::Identifier) => {
                matches!(
                    self.tokens.get(self.current + 2).map(|t| t.kind),
                    Some(TokenKind::LBrace)
                )
            }
            _ => false,
        }
    }

    /// A type specifier for declarators: primitive, `enum Tag`, `union Tag`
    /// or `struct Tag`.
    pub(super) fn parse_type_specifier(&mut self) -> Result<String, ParseError> {
        if let Some(name) = primitive_name(self.peek_kind()) {
            self.advance();
            return Ok(name.to_string());
        }
        if self.match_kind(TokenKind::KwEnum) {
            let tag = self
                .consume(
                    TokenKind::Identifier,
                    "expected enum tag after 'enum' in variable declaration",
                )?
                .lexeme;
            return Ok(format!("enum {}", tag));
        }
        if self.match_kind(TokenKind::KwUnion) {
            let tag = self
                .consume(
                    TokenKind::Identifier,
                    "expected union tag after 'union' in variable declaration",
                )?
                .lexeme;
            return Ok(format!("union {}", tag));
        }
        if self.match_kind(TokenKind::KwStruct) {
            let tag = self
                .consume(
                    TokenKind::Identifier,
                    "expected struct tag after 'struct' in variable declaration",
                )?
                .lexeme;
            return Ok(format!("struct {}", tag));
        }
        Err(self.unexpected("expected type specifier in variable declaration"))
    }

    /// `[ constExpr ]*` after a declarator name, outer dimension first.
    pub(super) fn parse_array_dimensions(&mut self) -> Result<Vec<Expression>, ParseError> {
        let mut dims = Vec::new();
        while self.match_kind(TokenKind::LBracket) {
            let dim = self.parse_expression()?;
            self.consume(TokenKind::RBracket, "expected ']' after array dimension")?;
            dims.push(dim);
        }
        Ok(dims)
    }

    /// One or more declarators sharing a specifier, with optional array
    /// dimensions and initializers, ending in `;`.
    pub(super) fn parse_variable_declaration(&mut self) -> Result<Declaration, ParseError> {
        let base = self.parse_type_specifier()?;
        let mut decls = Vec::new();
        loop {
            let mut ty = base.clone();
            while self.match_kind(TokenKind::Multiply) {
                ty.push('*');
            }
            let name = self
                .consume(TokenKind::Identifier, "expected identifier after type")?
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
            Ok(Declaration::Variable(decls.pop().expect("one declarator")))
        } else {
            Ok(Declaration::MultiVariable(decls))
        }
    }

    pub(super) fn parse_function_declaration(&mut self) -> Result<Declaration, ParseError> {
        let mut return_type = if self.match_kind(TokenKind::KwVoid) {
            "void".to_string()
        } else if let Some(name) = primitive_name(self.peek_kind()) {
            self.advance();
            name.to_string()
        } else {
            return Err(self.unexpected("expected return type for function declaration"));
        };
        while self.match_kind(TokenKind::Multiply) {
            return_type.push('*');
        }
        let name = self
            .consume(
                TokenKind::Identifier,
                "expected function name after return type",
            )?
            .lexeme;
        self.consume(TokenKind::LParen, "expected '(' after function name")?;
        let params = self.parse_parameters()?;
        self.consume(TokenKind::RParen, "expected ')' after parameter list")?;

        if self.match_kind(TokenKind::Semicolon) {
            return Ok(Declaration::Function(FunctionDecl {
                return_type,
                name,
                params,
                body: None,
            }));
        }
        self.consume(TokenKind::LBrace, "expected '{' to begin function body")?;
        let body = self.parse_block_statements()?;
        Ok(Declaration::Function(FunctionDecl {
            return_type,
            name,
            params,
            body: Some(body),
        }))
    }

    /// Comma-separated `(primitive-type stars? identifier)` pairs; an empty
    /// list is allowed.
    fn parse_parameters(&mut self) -> Result<Vec<(String, String)>, ParseError> {
        let mut params = Vec::new();
        if primitive_name(self.peek_kind()).is_none() {
            return Ok(params);
        }
        loop {
            let mut ty = match primitive_name(self.peek_kind()) {
                Some(name) => {
                    self.advance();
                    name.to_string()
                }
                None => return Err(self.unexpected("expected parameter type")),
            };
            while self.match_kind(TokenKind::Multiply) {
                ty.push('*');
            }
            let name = self
                .consume(TokenKind::Identifier, "expected parameter name after type")?
                .lexeme;
            params.push((ty, name));
            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }
        Ok(params)
    }

    pub(super) fn parse_struct_declaration(&mut self) -> Result<Declaration, ParseError> {
        self.consume(TokenKind::KwStruct, "expected 'struct' keyword")?;
        let tag = if self.check(TokenKind::Identifier) {
            Some(self.advance().lexeme)
        } else {
            None
        };
        self.consume(TokenKind::LBrace, "expected '{' to begin struct declaration")?;
        let mut members = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let ty = self.parse_member_type_specifier("struct")?;
            let name = self
                .consume(
                    TokenKind::Identifier,
                    "expected member name in struct declaration",
                )?
                .lexeme;
            let dims = self.parse_array_dimensions()?;
            if self.check(TokenKind::Colon) {
                return Err(self.unexpected("bit-field members are not supported"));
            }
            self.consume(
                TokenKind::Semicolon,
                "expected ';' after struct member declaration",
            )?;
            members.push(VarDecl {
                ty,
                name,
                dims,
                init: None,
            });
        }
        self.consume(TokenKind::RBrace, "expected '}' to close struct declaration")?;
        self.consume(TokenKind::Semicolon, "expected ';' after struct declaration")?;
        Ok(Declaration::Struct(StructDecl { tag, members }))
    }

    pub(super) fn parse_union_declaration(&mut self) -> Result<Declaration, ParseError> {
        self.consume(TokenKind::KwUnion, "expected 'union' keyword")?;
        let tag = if self.check(TokenKind::Identifier) {
            Some(self.advance().lexeme)
        } else {
            None
        };
        self.consume(TokenKind::LBrace, "expected '{' to begin union declaration")?;
        let mut members = Vec::new();
        let mut anon_counter = 0usize;
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let ty = self.parse_member_type_specifier("union")?;
            let name = if self.check(TokenKind::Identifier) {
                self.advance().lexeme
            } else {
                // Anonymous members still need a registry name.
                let generated = format!("anon_{}_{}", ty.replace(' ', "_"), anon_counter);
                anon_counter += 1;
                generated
            };
            if self.check(TokenKind::Colon) {
                return Err(self.unexpected("bit-field members are not supported"));
            }
            self.consume(
                TokenKind::Semicolon,
                "expected ';' after union member declaration",
            )?;
            members.push(VarDecl {
                ty,
                name,
                dims: Vec::new(),
                init: None,
            });
        }
        self.consume(TokenKind::RBrace, "expected '}' to close union declaration")?;
        self.consume(TokenKind::Semicolon, "expected ';' after union declaration")?;
        Ok(Declaration::Union(UnionDecl { tag, members }))
    }

    /// Member types may be primitives or tagged enum/struct references.
    fn parse_member_type_specifier(&mut self, context: &str) -> Result<String, ParseError> {
        if let Some(name) = primitive_name(self.peek_kind()) {
            self.advance();
            return Ok(name.to_string());
        }
        if self.match_kind(TokenKind::KwStruct) {
            let tag = self.consume(
                TokenKind::Identifier,
                &format!("expected struct tag after 'struct' in {} member declaration", context),
            )?;
            return Ok(format!("struct {}", tag.lexeme));
        }
        if self.match_kind(TokenKind::KwEnum) {
            let tag = self.consume(
                TokenKind::Identifier,
                &format!("expected enum tag after 'enum' in {} member declaration", context),
            )?;
            return Ok(format!("enum {}", tag.lexeme));
        }
        if self.match_kind(TokenKind::KwUnion) {
            let tag = self.consume(
                TokenKind::Identifier,
                &format!("expected union tag after 'union' in {} member declaration", context),
            )?;
            return Ok(format!("union {}", tag.lexeme));
        }
        Err(self.unexpected(&format!(
            "expected type specifier in {} member declaration",
            context
        )))
    }

    pub(super) fn parse_enum_declaration(&mut self) -> Result<Declaration, ParseError> {
        self.consume(TokenKind::KwEnum, "expected 'enum' keyword")?;
        let tag = if self.check(TokenKind::Identifier) {
            Some(self.advance().lexeme)
        } else {
            None
        };
        self.consume(TokenKind::LBrace, "expected '{' to start enum body")?;
        let mut enumerators = Vec::new();
        let mut first = true;
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            if !first
                && !self.match_kind(TokenKind::Comma)
            {
                return Err(
                    self.unexpected("expected ',' between enumerators in enum declaration")
                );
            }
            first = false;
            // Allow a trailing comma before '}'.
            if self.check(TokenKind::RBrace) {
                break;
            }
            let name = self
                .consume(
                    TokenKind::Identifier,
                    "expected enumerator name in enum declaration",
                )?
                .lexeme;
            let init = if self.match_kind(TokenKind::Assign) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            enumerators.push((name, init));
        }
        self.consume(TokenKind::RBrace, "expected '}' to close enum declaration")?;
        self.consume(TokenKind::Semicolon, "expected ';' after enum declaration")?;
        Ok(Declaration::Enum(EnumDecl {
            tag,
            enumerators,
            values: Vec::new(),
        }))
    }
}
