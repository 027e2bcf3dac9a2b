//! Error types for each compiler stage
//!
//! Each stage owns a closed error enum; `CompileError` wraps them and
//! prefixes the stage name so CLI output always identifies where a
//! compilation failed. Line/column information is carried in the variants
//! that have a source position to report.

use thiserror::Error;

/// Errors raised while resolving includes, conditionals and macros.
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("circular include detected for file: {path}")]
    Cycle { path: String },

    #[error("cannot find header '{name}'")]
    HeaderNotFound { name: String },

    #[error("malformed directive: {line}")]
    MalformedDirective { line: String },

    #[error("unterminated conditional directive in {path}")]
    Unbalanced { path: String },

    #[error("macro '{name}' expects {expected} argument(s), but got {got}")]
    MacroArity {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("unable to open file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Errors raised by the scanner.
#[derive(Debug, Error)]
pub enum LexError {
    #[error("unterminated char literal at line {line}, column {column}")]
    UnterminatedChar { line: usize, column: usize },

    #[error("unknown character '{ch}' at line {line}, column {column}")]
    UnknownChar { ch: char, line: usize, column: usize },
}

/// Errors raised by the recursive-descent parser. The first error is fatal;
/// there is no resynchronization.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("at line {line}, column {column} (token: '{found}'): {expected}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
        column: usize,
    },

    #[error("at line {line}, column {column} (token: '{found}'): expected expression")]
    ExpectedExpression {
        found: String,
        line: usize,
        column: usize,
    },
}

/// Errors raised while validating declarations and expressions.
#[derive(Debug, Error)]
pub enum SemaError {
    #[error("'{name}' is already declared in this scope")]
    Redeclaration { name: String },

    #[error("undefined variable or function '{name}'")]
    Undefined { name: String },

    #[error("invalid assignment target")]
    InvalidAssignTarget,

    #[error("conflicting declaration for function '{name}': the parameter list or return type does not match the previous declaration")]
    ConflictingDeclaration { name: String },

    #[error("function '{name}' is already defined")]
    Redefinition { name: String },

    #[error("'{name}' is not of a struct or union type")]
    NotAggregate { name: String },

    #[error("type '{ty}' does not contain a member named '{member}'")]
    NoSuchMember { ty: String, member: String },

    #[error("enum initializer for '{name}' must be an integer literal")]
    EnumInitializer { name: String },

    #[error("'{name}' is not callable")]
    NotCallable { name: String },

    #[error("function '{name}' called with an incorrect number of arguments (expected {expected}, got {got})")]
    ArgumentCount {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("union '{tag}' contains a member of union type; nested unions are not supported")]
    NestedUnion { tag: String },
}

/// Errors raised while lowering the AST to IR or verifying the module.
#[derive(Debug, Error)]
pub enum CodeGenError {
    #[error("case label must be a constant integer expression")]
    CaseNotConst,

    #[error("expression is not a valid lvalue")]
    NotLvalue,

    #[error("{message}")]
    TypeMismatch { message: String },

    #[error("unsupported type '{ty}'")]
    UnsupportedType { ty: String },

    #[error("module verification failed: {0}")]
    Verify(String),

    #[error("IR emission error: {0}")]
    Format(#[from] std::fmt::Error),
}

impl CodeGenError {
    /// Shorthand for the free-text type mismatch variant.
    pub fn mismatch(message: impl Into<String>) -> Self {
        CodeGenError::TypeMismatch {
            message: message.into(),
        }
    }
}

/// A failure in any stage of the pipeline, tagged with the stage name.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Preprocessor Error: {0}")]
    Preprocess(#[from] PreprocessError),

    #[error("Lexer Error: {0}")]
    Lex(#[from] LexError),

    #[error("Parser Error: {0}")]
    Parse(#[from] ParseError),

    #[error("Semantic Analysis Error: {0}")]
    Sema(#[from] SemaError),

    #[error("CodeGen Error: {0}")]
    CodeGen(#[from] CodeGenError),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    /// The human-readable stage tag for this error.
    pub fn stage(&self) -> &'static str {
        match self {
            CompileError::Preprocess(_) => "Preprocessor",
            CompileError::Lex(_) => "Lexer",
            CompileError::Parse(_) => "Parser",
            CompileError::Sema(_) => "Semantic",
            CompileError::CodeGen(_) => "CodeGen",
            CompileError::Io(_) => "IO",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_tags() {
        let err = CompileError::from(SemaError::Undefined {
            name: "x".to_string(),
        });
        assert_eq!(err.stage(), "Semantic");
        assert!(err.to_string().contains("undefined variable or function 'x'"));
    }

    #[test]
    fn test_parse_error_position() {
        let err = ParseError::UnexpectedToken {
            expected: "expected ';' after expression".to_string(),
            found: ")".to_string(),
            line: 3,
            column: 14,
        };
        let msg = err.to_string();
        assert!(msg.contains("line 3"));
        assert!(msg.contains("column 14"));
        assert!(msg.contains("(token: ')')"));
    }

    #[test]
    fn test_codegen_mismatch_helper() {
        let err = CodeGenError::mismatch("incompatible types in binary expression");
        assert!(matches!(err, CodeGenError::TypeMismatch { .. }));
        assert_eq!(
            err.to_string(),
            "incompatible types in binary expression"
        );
    }

    #[test]
    fn test_preprocess_arity_message() {
        let err = PreprocessError::MacroArity {
            name: "PAIR".to_string(),
            expected: 2,
            got: 1,
        };
        assert!(err.to_string().contains("'PAIR'"));
        assert!(err.to_string().contains("2 argument(s)"));
    }
}
