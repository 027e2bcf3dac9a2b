//! Mica compiler library
//!
//! One-shot ahead-of-time compilation of a small, statically typed C subset
//! into textual LLVM IR. The pipeline is strictly left to right:
//!
//! ```text
//! source path → Preprocessor → Lexer → Parser → SemanticAnalyzer → CodeGen → IR text
//! ```
//!
//! Each phase consumes the complete output of its predecessor; the only
//! shared state is the type registry, written by the analyzer and read by
//! the generator. The first error aborts the pipeline with a stage-tagged
//! [`CompileError`].
//!
//! ```rust,ignore
//! use micac::compile_to_ir;
//!
//! let ir = compile_to_ir("int main() { return 0; }")?;
//! assert!(ir.contains("define i32 @main()"));
//! ```

pub mod ast;
pub mod codegen;
pub mod config;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod preprocessor;
pub mod sema;
pub mod symbols;
pub mod types;

pub use codegen::CodeGen;
pub use config::CompilerConfig;
pub use error::CompileError;
pub use parser::Parser;
pub use preprocessor::Preprocessor;
pub use sema::SemanticAnalyzer;
pub use symbols::{Symbol, SymbolTable};
pub use types::TypeRegistry;

use std::fs;
use std::path::Path;
use tracing::debug;

/// Compile a source file to IR text and write it to `output`.
///
/// Nothing is written unless every stage, including verification,
/// succeeds.
pub fn compile_file(
    source: &Path,
    output: &Path,
    config: &CompilerConfig,
) -> Result<(), CompileError> {
    let ir = compile_path_to_ir(source, config)?;
    fs::write(output, ir)?;
    Ok(())
}

/// Compile a source file (with include resolution) to IR text.
pub fn compile_path_to_ir(source: &Path, config: &CompilerConfig) -> Result<String, CompileError> {
    let mut preprocessor = Preprocessor::new(
        config.system_include_dirs.clone(),
        config.user_include_dirs.clone(),
    );
    let expanded = preprocessor.preprocess(source)?;
    debug!(file = %source.display(), bytes = expanded.len(), "preprocessed");
    compile_expanded(&expanded)
}

/// Compile an in-memory source string to IR text. `#include "..."`
/// resolves against the configured search paths only.
pub fn compile_to_ir_with_config(
    source: &str,
    config: &CompilerConfig,
) -> Result<String, CompileError> {
    let mut preprocessor = Preprocessor::new(
        config.system_include_dirs.clone(),
        config.user_include_dirs.clone(),
    );
    let expanded = preprocessor.preprocess_source(source, None)?;
    compile_expanded(&expanded)
}

/// Compile an in-memory source string to IR text (no include paths).
pub fn compile_to_ir(source: &str) -> Result<String, CompileError> {
    compile_to_ir_with_config(source, &CompilerConfig::default())
}

/// Run the front half of the pipeline only: preprocess, lex, parse and
/// analyze, discarding the IR. Used by `micac check`.
pub fn check_path(source: &Path, config: &CompilerConfig) -> Result<(), CompileError> {
    let mut preprocessor = Preprocessor::new(
        config.system_include_dirs.clone(),
        config.user_include_dirs.clone(),
    );
    let expanded = preprocessor.preprocess(source)?;
    let tokens = lexer::tokenize(&expanded)?;
    let mut parser = Parser::new(tokens);
    let mut program = parser.parse()?;
    SemanticAnalyzer::new().analyze(&mut program)?;
    Ok(())
}

/// Parse a source file to its AST without analyzing it. Used by
/// `micac build --emit-ast`.
pub fn parse_path(source: &Path, config: &CompilerConfig) -> Result<ast::Program, CompileError> {
    let mut preprocessor = Preprocessor::new(
        config.system_include_dirs.clone(),
        config.user_include_dirs.clone(),
    );
    let expanded = preprocessor.preprocess(source)?;
    let tokens = lexer::tokenize(&expanded)?;
    let mut parser = Parser::new(tokens);
    Ok(parser.parse()?)
}

fn compile_expanded(expanded: &str) -> Result<String, CompileError> {
    let tokens = lexer::tokenize(expanded)?;
    debug!(tokens = tokens.len(), "lexed");

    let mut parser = Parser::new(tokens);
    let mut program = parser.parse()?;
    debug!(declarations = program.declarations.len(), "parsed");

    let registry = SemanticAnalyzer::new().analyze(&mut program)?;
    debug!("analyzed");

    let ir = CodeGen::new(registry).codegen_program(&program)?;
    debug!(bytes = ir.len(), "lowered and verified");
    Ok(ir)
}
