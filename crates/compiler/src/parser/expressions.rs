//! Expression parsing: the precedence ladder
//!
//! assignment > logical-or > logical-and > bitwise-or > bitwise-xor >
//! bitwise-and > equality > relational > shift > additive > multiplicative >
//! unary > postfix > primary. Assignment is right-associative, everything
//! else is left-associative.
//!
//! The unary parser recognizes prefix `&` and `*` by lexeme, since the
//! scanner hands them over as bitwise-and and multiply. Parenthesized forms
//! disambiguate cast from grouping by peeking for a primitive type keyword
//! right after `(`. Postfix `++`/`--` are adjacent `+ +`/`- -` token pairs.

use super::declarations::primitive_name;
use super::Parser;
use crate::ast::{BinaryOp, Expression, Literal, PostfixOp, UnaryOp};
use crate::error::ParseError;
use crate::lexer::TokenKind;

impl Parser {
    pub(super) fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expression, ParseError> {
        let expr = self.parse_logical_or()?;
        let compound = match self.peek_kind() {
            TokenKind::PlusAssign => Some(BinaryOp::Add),
            TokenKind::MinusAssign => Some(BinaryOp::Sub),
            TokenKind::MultiplyAssign => Some(BinaryOp::Mul),
            TokenKind::DivideAssign => Some(BinaryOp::Div),
            _ => None,
        };
        if let Some(op) = compound {
            self.advance();
            let rhs = self.parse_assignment()?;
            // `a += b` desugars to `a = a + b`.
            let value = Expression::Binary {
                op,
                left: Box::new(expr.clone()),
                right: Box::new(rhs),
            };
            return Ok(Expression::Assignment {
                target: Box::new(expr),
                value: Box::new(value),
            });
        }
        if self.match_kind(TokenKind::Assign) {
            let value = self.parse_assignment()?;
            return Ok(Expression::Assignment {
                target: Box::new(expr),
                value: Box::new(value),
            });
        }
        Ok(expr)
    }

    fn parse_binary_level<F>(
        &mut self,
        ops: &[(TokenKind, BinaryOp)],
        mut next: F,
    ) -> Result<Expression, ParseError>
    where
        F: FnMut(&mut Self) -> Result<Expression, ParseError>,
    {
        let mut expr = next(self)?;
        'outer: loop {
            for (kind, op) in ops {
                if self.match_kind(*kind) {
                    let right = next(self)?;
                    expr = Expression::Binary {
                        op: *op,
                        left: Box::new(expr),
                        right: Box::new(right),
                    };
                    continue 'outer;
                }
            }
            break;
        }
        Ok(expr)
    }

    fn parse_logical_or(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary_level(&[(TokenKind::LogicalOr, BinaryOp::LogOr)], |p| {
            p.parse_logical_and()
        })
    }

    fn parse_logical_and(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary_level(&[(TokenKind::LogicalAnd, BinaryOp::LogAnd)], |p| {
            p.parse_bitwise_or()
        })
    }

    fn parse_bitwise_or(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary_level(&[(TokenKind::BitOr, BinaryOp::BitOr)], |p| {
            p.parse_bitwise_xor()
        })
    }

    fn parse_bitwise_xor(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary_level(&[(TokenKind::BitXor, BinaryOp::BitXor)], |p| {
            p.parse_bitwise_and()
        })
    }

    fn parse_bitwise_and(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary_level(&[(TokenKind::BitAnd, BinaryOp::BitAnd)], |p| {
            p.parse_equality()
        })
    }

    fn parse_equality(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary_level(
            &[
                (TokenKind::Equal, BinaryOp::Eq),
                (TokenKind::NotEqual, BinaryOp::Ne),
            ],
            |p| p.parse_relational(),
        )
    }

    fn parse_relational(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary_level(
            &[
                (TokenKind::Less, BinaryOp::Lt),
                (TokenKind::LessEqual, BinaryOp::Le),
                (TokenKind::Greater, BinaryOp::Gt),
                (TokenKind::GreaterEqual, BinaryOp::Ge),
            ],
            |p| p.parse_shift(),
        )
    }

    fn parse_shift(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary_level(
            &[
                (TokenKind::LeftShift, BinaryOp::Shl),
                (TokenKind::RightShift, BinaryOp::Shr),
            ],
            |p| p.parse_term(),
        )
    }

    fn parse_term(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary_level(
            &[
                (TokenKind::Plus, BinaryOp::Add),
                (TokenKind::Minus, BinaryOp::Sub),
            ],
            |p| p.parse_factor(),
        )
    }

    fn parse_factor(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary_level(
            &[
                (TokenKind::Multiply, BinaryOp::Mul),
                (TokenKind::Divide, BinaryOp::Div),
                (TokenKind::Modulo, BinaryOp::Rem),
            ],
            |p| p.parse_unary(),
        )
    }

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        if !self.is_at_end() && self.peek().lexeme == "&" {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expression::Unary {
                op: UnaryOp::AddrOf,
                operand: Box::new(operand),
            });
        }
        if !self.is_at_end() && self.peek().lexeme == "*" {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expression::Unary {
                op: UnaryOp::Deref,
                operand: Box::new(operand),
            });
        }
        if self.match_kind(TokenKind::Minus) {
            let operand = self.parse_unary()?;
            return Ok(Expression::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            });
        }
        if self.match_kind(TokenKind::LogicalNot) {
            let operand = self.parse_unary()?;
            return Ok(Expression::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        if self.match_kind(TokenKind::BitNot) {
            let operand = self.parse_unary()?;
            return Ok(Expression::Unary {
                op: UnaryOp::BitNot,
                operand: Box::new(operand),
            });
        }
        if self.match_kind(TokenKind::LParen) {
            // `( primitive )` is a cast; anything else is grouping.
            if let Some(ty) = primitive_name(self.peek_kind()) {
                self.advance();
                self.consume(TokenKind::RParen, "expected ')' after cast type")?;
                let operand = self.parse_unary()?;
                return Ok(Expression::Cast {
                    ty: ty.to_string(),
                    operand: Box::new(operand),
                });
            }
            let expr = self.parse_expression()?;
            self.consume(TokenKind::RParen, "expected ')' after expression")?;
            return Ok(expr);
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.match_kind(TokenKind::Dot) {
                let member = self
                    .consume(
                        TokenKind::Identifier,
                        "expected identifier after '.' for member access",
                    )?
                    .lexeme;
                expr = Expression::MemberAccess {
                    base: Box::new(expr),
                    member,
                };
            } else if self.match_kind(TokenKind::LBracket) {
                let index = self.parse_expression()?;
                self.consume(TokenKind::RBracket, "expected ']' after array index")?;
                expr = Expression::ArrayIndex {
                    base: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.peek_kind() == TokenKind::Plus
                && self.peek_next_kind() == Some(TokenKind::Plus)
            {
                self.advance();
                self.advance();
                expr = Expression::Postfix {
                    operand: Box::new(expr),
                    op: PostfixOp::Increment,
                };
            } else if self.peek_kind() == TokenKind::Minus
                && self.peek_next_kind() == Some(TokenKind::Minus)
            {
                self.advance();
                self.advance();
                expr = Expression::Postfix {
                    operand: Box::new(expr),
                    op: PostfixOp::Decrement,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        if self.match_kind(TokenKind::IntLiteral) {
            let lexeme = self.previous().lexeme.clone();
            let digits = lexeme.trim_end_matches(['f', 'F']);
            let value: i32 = digits
                .parse()
                .map_err(|_| self.unexpected_at_previous("integer literal out of range"))?;
            return Ok(Expression::Literal(Literal::Int(value)));
        }
        if self.match_kind(TokenKind::FloatLiteral) {
            let lexeme = self.previous().lexeme.clone();
            let digits = lexeme.trim_end_matches(['f', 'F']);
            let value: f32 = digits
                .parse()
                .map_err(|_| self.unexpected_at_previous("invalid float literal"))?;
            return Ok(Expression::Literal(Literal::Float(value)));
        }
        if self.match_kind(TokenKind::DoubleLiteral) {
            let value: f64 = self
                .previous()
                .lexeme
                .parse()
                .map_err(|_| self.unexpected_at_previous("invalid double literal"))?;
            return Ok(Expression::Literal(Literal::Double(value)));
        }
        if self.match_kind(TokenKind::CharLiteral) {
            let ch = self
                .previous()
                .lexeme
                .chars()
                .next()
                .ok_or_else(|| self.unexpected_at_previous("empty char literal"))?;
            return Ok(Expression::Literal(Literal::Char(ch)));
        }
        if self.match_kind(TokenKind::Identifier) {
            let name = self.previous().lexeme.clone();
            if name == "true" {
                return Ok(Expression::Literal(Literal::Bool(true)));
            }
            if name == "false" {
                return Ok(Expression::Literal(Literal::Bool(false)));
            }
            if self.match_kind(TokenKind::LParen) {
                let mut args = Vec::new();
                if !self.check(TokenKind::RParen) {
                    loop {
                        args.push(self.parse_expression()?);
                        if !self.match_kind(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.consume(TokenKind::RParen, "expected ')' after function arguments")?;
                return Ok(Expression::Call { callee: name, args });
            }
            return Ok(Expression::Identifier(name));
        }
        if self.match_kind(TokenKind::LParen) {
            let expr = self.parse_expression()?;
            self.consume(TokenKind::RParen, "expected ')' after expression")?;
            return Ok(expr);
        }
        Err(self.expected_expression())
    }

    /// `{ expr, expr, ... }` — array initializers.
    pub(super) fn parse_initializer_list(&mut self) -> Result<Expression, ParseError> {
        self.consume(TokenKind::LBrace, "expected '{' to start initializer list")?;
        let mut elements = Vec::new();
        if !self.check(TokenKind::RBrace) {
            elements.push(self.parse_expression()?);
            while self.match_kind(TokenKind::Comma) {
                if self.check(TokenKind::RBrace) {
                    break;
                }
                elements.push(self.parse_expression()?);
            }
        }
        self.consume(TokenKind::RBrace, "expected '}' to end initializer list")?;
        Ok(Expression::InitializerList(elements))
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse_source;
    use crate::ast::*;

    fn first_expr(source: &str) -> Expression {
        let program = parse_source(&format!("int main() {{ {} }}", source)).unwrap();
        match &program.declarations[0] {
            Declaration::Function(f) => match &f.body.as_ref().unwrap()[0] {
                Statement::Expression(e) => e.clone(),
                Statement::Return(Some(e)) => e.clone(),
                other => panic!("expected expression statement, got {:?}", other),
            },
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence_mul_over_add() {
        match first_expr("return 1 + 2 * 3;") {
            Expression::Binary { op, right, .. } => {
                assert_eq!(op, BinaryOp::Add);
                assert!(matches!(
                    *right,
                    Expression::Binary {
                        op: BinaryOp::Mul,
                        ..
                    }
                ));
            }
            other => panic!("expected binary, got {:?}", other),
        }
    }

    #[test]
    fn test_left_associativity() {
        // (1 - 2) - 3
        match first_expr("return 1 - 2 - 3;") {
            Expression::Binary { op, left, .. } => {
                assert_eq!(op, BinaryOp::Sub);
                assert!(matches!(
                    *left,
                    Expression::Binary {
                        op: BinaryOp::Sub,
                        ..
                    }
                ));
            }
            other => panic!("expected binary, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_right_associative() {
        match first_expr("a = b = 1;") {
            Expression::Assignment { value, .. } => {
                assert!(matches!(*value, Expression::Assignment { .. }));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_compound_assignment_desugars() {
        match first_expr("a += 2;") {
            Expression::Assignment { target, value } => {
                assert!(matches!(*target, Expression::Identifier(ref n) if n == "a"));
                assert!(matches!(
                    *value,
                    Expression::Binary {
                        op: BinaryOp::Add,
                        ..
                    }
                ));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_address_of_and_deref() {
        match first_expr("return *p + *q;") {
            Expression::Binary { left, .. } => {
                assert!(matches!(
                    *left,
                    Expression::Unary {
                        op: UnaryOp::Deref,
                        ..
                    }
                ));
            }
            other => panic!("expected binary, got {:?}", other),
        }
        match first_expr("swap(&x, &y);") {
            Expression::Call { args, .. } => {
                assert!(matches!(
                    args[0],
                    Expression::Unary {
                        op: UnaryOp::AddrOf,
                        ..
                    }
                ));
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_cast_vs_grouping() {
        assert!(matches!(
            first_expr("return (int)x;"),
            Expression::Cast { ref ty, .. } if ty == "int"
        ));
        assert!(matches!(
            first_expr("return (x);"),
            Expression::Identifier(ref n) if n == "x"
        ));
    }

    #[test]
    fn test_postfix_chain() {
        match first_expr("return rect.topLeft.x;") {
            Expression::MemberAccess { base, member } => {
                assert_eq!(member, "x");
                assert!(matches!(*base, Expression::MemberAccess { .. }));
            }
            other => panic!("expected member access, got {:?}", other),
        }
    }

    #[test]
    fn test_postfix_increment() {
        assert!(matches!(
            first_expr("i++;"),
            Expression::Postfix {
                op: PostfixOp::Increment,
                ..
            }
        ));
        assert!(matches!(
            first_expr("i--;"),
            Expression::Postfix {
                op: PostfixOp::Decrement,
                ..
            }
        ));
    }

    #[test]
    fn test_array_indexing() {
        match first_expr("return a[i + 1];") {
            Expression::ArrayIndex { index, .. } => {
                assert!(matches!(
                    *index,
                    Expression::Binary {
                        op: BinaryOp::Add,
                        ..
                    }
                ));
            }
            other => panic!("expected array index, got {:?}", other),
        }
    }

    #[test]
    fn test_bool_literals() {
        assert!(matches!(
            first_expr("return true;"),
            Expression::Literal(Literal::Bool(true))
        ));
        assert!(matches!(
            first_expr("return false;"),
            Expression::Literal(Literal::Bool(false))
        ));
    }

    #[test]
    fn test_char_literal_value() {
        assert!(matches!(
            first_expr("return 'a';"),
            Expression::Literal(Literal::Char('a'))
        ));
    }

    #[test]
    fn test_unary_not_and_neg() {
        assert!(matches!(
            first_expr("return !x;"),
            Expression::Unary {
                op: UnaryOp::Not,
                ..
            }
        ));
        assert!(matches!(
            first_expr("return -x;"),
            Expression::Unary {
                op: UnaryOp::Neg,
                ..
            }
        ));
        assert!(matches!(
            first_expr("return ~x;"),
            Expression::Unary {
                op: UnaryOp::BitNot,
                ..
            }
        ));
    }
}
