//! Scanner for the Mica C subset
//!
//! Produces a token stream terminated by an explicit end-of-input token.
//! Operators are disambiguated with maximal munch: two-character operators
//! are preferred over their single-character prefixes. `++` and `--` are
//! left as adjacent `+ +` / `- -` pairs for the parser to recognize, which
//! keeps the scanner context-free.

use crate::error::LexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    KwInt,
    KwFloat,
    KwChar,
    KwDouble,
    KwBool,
    KwVoid,
    KwReturn,
    KwIf,
    KwElse,
    KwWhile,
    KwFor,
    KwSwitch,
    KwCase,
    KwDefault,
    KwEnum,
    KwUnion,
    KwStruct,
    // Operators
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Assign,
    PlusAssign,
    MinusAssign,
    MultiplyAssign,
    DivideAssign,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    LogicalAnd,
    LogicalOr,
    LogicalNot,
    BitAnd,
    BitOr,
    BitXor,
    BitNot,
    LeftShift,
    RightShift,
    // Delimiters
    Semicolon,
    Comma,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Dot,
    // Literals
    IntLiteral,
    FloatLiteral,
    DoubleLiteral,
    CharLiteral,
    // Everything else
    Identifier,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize, column: usize) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            line,
            column,
        }
    }
}

fn keyword_kind(lexeme: &str) -> Option<TokenKind> {
    let kind = match lexeme {
        "int" => TokenKind::KwInt,
        "float" => TokenKind::KwFloat,
        "char" => TokenKind::KwChar,
        "double" => TokenKind::KwDouble,
        "bool" => TokenKind::KwBool,
        "void" => TokenKind::KwVoid,
        "return" => TokenKind::KwReturn,
        "if" => TokenKind::KwIf,
        "else" => TokenKind::KwElse,
        "while" => TokenKind::KwWhile,
        "for" => TokenKind::KwFor,
        "switch" => TokenKind::KwSwitch,
        "case" => TokenKind::KwCase,
        "default" => TokenKind::KwDefault,
        "enum" => TokenKind::KwEnum,
        "union" => TokenKind::KwUnion,
        "struct" => TokenKind::KwStruct,
        _ => return None,
    };
    Some(kind)
}

pub struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            if self.is_at_end() {
                break;
            }
            let c = self.peek();
            let token = if c.is_ascii_alphabetic() || c == b'_' {
                self.identifier()
            } else if c.is_ascii_digit() {
                self.number()
            } else if c == b'\'' {
                self.char_literal()?
            } else {
                self.op_or_delim()?
            };
            tokens.push(token);
        }
        tokens.push(Token::new(TokenKind::Eof, "EOF", self.line, self.column));
        Ok(tokens)
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() { 0 } else { self.source[self.pos] }
    }

    fn peek_next(&self) -> u8 {
        if self.pos + 1 >= self.source.len() {
            0
        } else {
            self.source[self.pos + 1]
        }
    }

    fn get(&mut self) -> u8 {
        if self.is_at_end() {
            return 0;
        }
        let c = self.source[self.pos];
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    /// Skip whitespace (carriage returns included) and `//` comments.
    fn skip_whitespace_and_comments(&mut self) {
        while !self.is_at_end() {
            let c = self.peek();
            if c.is_ascii_whitespace() {
                self.get();
            } else if c == b'/' && self.peek_next() == b'/' {
                while self.peek() != b'\n' && !self.is_at_end() {
                    self.get();
                }
            } else {
                break;
            }
        }
    }

    fn identifier(&mut self) -> Token {
        let (line, column) = (self.line, self.column);
        let mut lexeme = String::new();
        while !self.is_at_end() && (self.peek().is_ascii_alphanumeric() || self.peek() == b'_') {
            lexeme.push(self.get() as char);
        }
        let kind = keyword_kind(&lexeme).unwrap_or(TokenKind::Identifier);
        Token::new(kind, lexeme, line, column)
    }

    /// One or more digits, an optional fraction, an optional `f`/`F` marker.
    /// `12` is an int, `1.5f` a float, `1.5` a double.
    fn number(&mut self) -> Token {
        let (line, column) = (self.line, self.column);
        let mut lexeme = String::new();
        let mut saw_dot = false;
        while !self.is_at_end() && self.peek().is_ascii_digit() {
            lexeme.push(self.get() as char);
        }
        if self.peek() == b'.' {
            saw_dot = true;
            lexeme.push(self.get() as char);
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                lexeme.push(self.get() as char);
            }
        }
        let mut float_suffix = false;
        if self.peek() == b'f' || self.peek() == b'F' {
            float_suffix = true;
            lexeme.push(self.get() as char);
        }
        let kind = if !saw_dot {
            TokenKind::IntLiteral
        } else if float_suffix {
            TokenKind::FloatLiteral
        } else {
            TokenKind::DoubleLiteral
        };
        Token::new(kind, lexeme, line, column)
    }

    /// `'c'` — exactly one character between single quotes; no escapes.
    fn char_literal(&mut self) -> Result<Token, LexError> {
        let (line, column) = (self.line, self.column);
        self.get(); // opening quote
        if self.is_at_end() || self.peek() == b'\n' {
            return Err(LexError::UnterminatedChar { line, column });
        }
        let ch = self.get() as char;
        if self.peek() != b'\'' {
            return Err(LexError::UnterminatedChar { line, column });
        }
        self.get(); // closing quote
        Ok(Token::new(TokenKind::CharLiteral, ch.to_string(), line, column))
    }

    fn op_or_delim(&mut self) -> Result<Token, LexError> {
        let (line, column) = (self.line, self.column);
        let c = self.get();
        let (kind, lexeme): (TokenKind, String) = match c {
            b'+' => {
                if self.peek() == b'=' {
                    self.get();
                    (TokenKind::PlusAssign, "+=".into())
                } else {
                    (TokenKind::Plus, "+".into())
                }
            }
            b'-' => {
                if self.peek() == b'=' {
                    self.get();
                    (TokenKind::MinusAssign, "-=".into())
                } else {
                    (TokenKind::Minus, "-".into())
                }
            }
            b'*' => {
                if self.peek() == b'=' {
                    self.get();
                    (TokenKind::MultiplyAssign, "*=".into())
                } else {
                    (TokenKind::Multiply, "*".into())
                }
            }
            b'/' => {
                if self.peek() == b'=' {
                    self.get();
                    (TokenKind::DivideAssign, "/=".into())
                } else {
                    (TokenKind::Divide, "/".into())
                }
            }
            b'%' => (TokenKind::Modulo, "%".into()),
            b'=' => {
                if self.peek() == b'=' {
                    self.get();
                    (TokenKind::Equal, "==".into())
                } else {
                    (TokenKind::Assign, "=".into())
                }
            }
            b'!' => {
                if self.peek() == b'=' {
                    self.get();
                    (TokenKind::NotEqual, "!=".into())
                } else {
                    (TokenKind::LogicalNot, "!".into())
                }
            }
            b'<' => {
                if self.peek() == b'<' {
                    self.get();
                    (TokenKind::LeftShift, "<<".into())
                } else if self.peek() == b'=' {
                    self.get();
                    (TokenKind::LessEqual, "<=".into())
                } else {
                    (TokenKind::Less, "<".into())
                }
            }
            b'>' => {
                if self.peek() == b'>' {
                    self.get();
                    (TokenKind::RightShift, ">>".into())
                } else if self.peek() == b'=' {
                    self.get();
                    (TokenKind::GreaterEqual, ">=".into())
                } else {
                    (TokenKind::Greater, ">".into())
                }
            }
            b'&' => {
                if self.peek() == b'&' {
                    self.get();
                    (TokenKind::LogicalAnd, "&&".into())
                } else {
                    (TokenKind::BitAnd, "&".into())
                }
            }
            b'|' => {
                if self.peek() == b'|' {
                    self.get();
                    (TokenKind::LogicalOr, "||".into())
                } else {
                    (TokenKind::BitOr, "|".into())
                }
            }
            b'^' => (TokenKind::BitXor, "^".into()),
            b'~' => (TokenKind::BitNot, "~".into()),
            b';' => (TokenKind::Semicolon, ";".into()),
            b',' => (TokenKind::Comma, ",".into()),
            b'(' => (TokenKind::LParen, "(".into()),
            b')' => (TokenKind::RParen, ")".into()),
            b'{' => (TokenKind::LBrace, "{".into()),
            b'}' => (TokenKind::RBrace, "}".into()),
            b'[' => (TokenKind::LBracket, "[".into()),
            b']' => (TokenKind::RBracket, "]".into()),
            b':' => (TokenKind::Colon, ":".into()),
            b'.' => (TokenKind::Dot, ".".into()),
            other => {
                return Err(LexError::UnknownChar {
                    ch: other as char,
                    line,
                    column,
                });
            }
        };
        Ok(Token::new(kind, lexeme, line, column))
    }
}

/// Convenience wrapper used by the pipeline and tests.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).tokenize()
}
