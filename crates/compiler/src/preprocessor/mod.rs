//! Preprocessor: includes, guards, conditionals and macro expansion
//!
//! Resolves `#include`, `#define`/`#undef`, the conditional directives and
//! `#pragma once` into a single expanded source string. Each file is
//! processed line by line with a per-file conditional stack and include-guard
//! tracker; the macro table is shared across the whole translation unit.
//!
//! Include handling keeps three pieces of state for the duration of one
//! `preprocess` call: a stack of files currently being expanded (cycle
//! detection), a cache of finished expansions keyed by canonical path, and
//! the set of files known to be fully guarded — a guarded file expands to
//! nothing on second and later inclusions.

mod conditional;
mod macros;

use crate::error::PreprocessError;
use conditional::ConditionalStack;
use macros::MacroTable;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Tracks the `#ifndef X / #define X` pair and `#pragma once` for one file.
#[derive(Debug, Default)]
struct GuardTracker {
    pending_ifndef: Option<String>,
    matched_define: bool,
    pragma_once: bool,
}

impl GuardTracker {
    fn on_ifndef(&mut self, macro_name: &str) {
        self.pending_ifndef = Some(macro_name.to_string());
        self.matched_define = false;
    }

    fn on_define(&mut self, macro_name: &str) {
        if self.pending_ifndef.as_deref() == Some(macro_name) {
            self.matched_define = true;
        }
    }

    fn on_pragma_once(&mut self) {
        self.pragma_once = true;
    }

    fn is_guarded(&self) -> bool {
        self.pragma_once || (self.pending_ifndef.is_some() && self.matched_define)
    }
}

pub struct Preprocessor {
    system_paths: Vec<PathBuf>,
    user_paths: Vec<PathBuf>,
    file_cache: HashMap<PathBuf, String>,
    fully_guarded: HashSet<PathBuf>,
    include_stack: Vec<PathBuf>,
    macros: MacroTable,
}

impl Preprocessor {
    pub fn new(system_paths: Vec<PathBuf>, user_paths: Vec<PathBuf>) -> Self {
        Preprocessor {
            system_paths,
            user_paths,
            file_cache: HashMap::new(),
            fully_guarded: HashSet::new(),
            include_stack: Vec::new(),
            macros: MacroTable::new(),
        }
    }

    /// Preprocess the translation unit rooted at `path` into one expanded
    /// string. All per-call state is reset first, so expansion depends only
    /// on the source text and the configured search paths.
    pub fn preprocess(&mut self, path: &Path) -> Result<String, PreprocessError> {
        self.file_cache.clear();
        self.fully_guarded.clear();
        self.include_stack.clear();
        self.macros = MacroTable::new();
        self.expand_file(path)
    }

    /// Preprocess an in-memory source. `#include "..."` resolves against
    /// `base_dir` (if given) and then the configured search paths.
    pub fn preprocess_source(
        &mut self,
        source: &str,
        base_dir: Option<&Path>,
    ) -> Result<String, PreprocessError> {
        self.file_cache.clear();
        self.fully_guarded.clear();
        self.include_stack.clear();
        self.macros = MacroTable::new();
        let pseudo = base_dir
            .map(|d| d.join("<source>"))
            .unwrap_or_else(|| PathBuf::from("<source>"));
        let (expanded, _guarded) = self.process_content(&pseudo, source)?;
        Ok(expanded)
    }

    fn expand_file(&mut self, path: &Path) -> Result<String, PreprocessError> {
        let abs = fs::canonicalize(path).map_err(|e| PreprocessError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        // A fully guarded file is a no-op on every inclusion after the first.
        if self.fully_guarded.contains(&abs) {
            return Ok(String::new());
        }
        if let Some(cached) = self.file_cache.get(&abs) {
            return Ok(cached.clone());
        }
        if self.include_stack.contains(&abs) {
            return Err(PreprocessError::Cycle {
                path: abs.display().to_string(),
            });
        }

        let content = fs::read_to_string(&abs).map_err(|e| PreprocessError::Io {
            path: abs.display().to_string(),
            source: e,
        })?;

        self.include_stack.push(abs.clone());
        let result = self.process_content(&abs, &content);
        self.include_stack.pop();

        let (expanded, guarded) = result?;
        if guarded {
            self.fully_guarded.insert(abs.clone());
        }
        self.file_cache.insert(abs, expanded.clone());
        Ok(expanded)
    }

    /// Process one file's lines. Returns the expansion and whether the file
    /// turned out to be fully guarded.
    fn process_content(
        &mut self,
        path: &Path,
        content: &str,
    ) -> Result<(String, bool), PreprocessError> {
        let mut out = String::with_capacity(content.len());
        let mut conditionals = ConditionalStack::new();
        let mut guard = GuardTracker::default();

        for raw_line in content.split('\n') {
            let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
            let trimmed = line.trim_start();

            if let Some(directive) = trimmed.strip_prefix('#') {
                let directive = directive.trim_start();
                let name_end = directive
                    .find(|c: char| !c.is_ascii_alphabetic())
                    .unwrap_or(directive.len());
                let (name, rest) = directive.split_at(name_end);
                match name {
                    "include" => {
                        if conditionals.active() {
                            let expanded = self.handle_include(rest.trim(), line, path)?;
                            out.push_str(&expanded);
                        }
                    }
                    "define" => {
                        if conditionals.active() {
                            let macro_name = self.macros.define(rest, line)?;
                            guard.on_define(&macro_name);
                        }
                    }
                    "undef" => {
                        if conditionals.active() {
                            self.macros.undef(rest.trim());
                        }
                    }
                    "ifdef" => {
                        let macro_name = rest.trim();
                        conditionals.push(self.macros.is_defined(macro_name));
                    }
                    "ifndef" => {
                        let macro_name = rest.trim();
                        guard.on_ifndef(macro_name);
                        conditionals.push(!self.macros.is_defined(macro_name));
                    }
                    "if" => {
                        let value = if conditionals.active() {
                            self.eval_condition(rest, line)? != 0
                        } else {
                            false
                        };
                        conditionals.push(value);
                    }
                    "elif" => {
                        let value = if conditionals.parent_active() {
                            self.eval_condition(rest, line)? != 0
                        } else {
                            false
                        };
                        conditionals
                            .elif(value)
                            .map_err(|_| self.unbalanced(path))?;
                    }
                    "else" => {
                        conditionals
                            .toggle_else()
                            .map_err(|_| self.unbalanced(path))?;
                    }
                    "endif" => {
                        conditionals.endif().map_err(|_| self.unbalanced(path))?;
                    }
                    "pragma" => {
                        if rest.trim() == "once" {
                            guard.on_pragma_once();
                        }
                        // Other pragmas are silently dropped.
                    }
                    _ => {
                        return Err(PreprocessError::MalformedDirective {
                            line: line.to_string(),
                        });
                    }
                }
                // Directive lines never appear in the expansion, but the
                // newline is kept so line numbers stay citable downstream.
                out.push('\n');
            } else if conditionals.active() {
                out.push_str(&self.macros.expand(line)?);
                out.push('\n');
            } else {
                out.push('\n');
            }
        }

        if !conditionals.is_balanced() {
            return Err(self.unbalanced(path));
        }
        Ok((out, guard.is_guarded()))
    }

    fn unbalanced(&self, path: &Path) -> PreprocessError {
        PreprocessError::Unbalanced {
            path: path.display().to_string(),
        }
    }

    /// Evaluate the controlling expression of `#if`/`#elif`: substitute
    /// `defined`, expand macros, then fold the constant expression.
    fn eval_condition(&self, expr: &str, line: &str) -> Result<i64, PreprocessError> {
        let substituted = self.substitute_defined(expr, line)?;
        let expanded = self.macros.expand(&substituted)?;
        conditional::evaluate(&expanded, line)
    }

    /// Replace `defined(X)` and `defined X` with 1 or 0 before expansion.
    fn substitute_defined(&self, expr: &str, line: &str) -> Result<String, PreprocessError> {
        let bytes = expr.as_bytes();
        let mut out = String::with_capacity(expr.len());
        let mut i = 0;
        while i < bytes.len() {
            let c = bytes[i] as char;
            if c.is_ascii_alphabetic() || c == '_' {
                let start = i;
                while i < bytes.len() && ((bytes[i] as char).is_ascii_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                let ident = &expr[start..i];
                if ident == "defined" {
                    while i < bytes.len() && (bytes[i] as char).is_ascii_whitespace() {
                        i += 1;
                    }
                    let parenthesized = i < bytes.len() && bytes[i] == b'(';
                    if parenthesized {
                        i += 1;
                        while i < bytes.len() && (bytes[i] as char).is_ascii_whitespace() {
                            i += 1;
                        }
                    }
                    let name_start = i;
                    while i < bytes.len()
                        && ((bytes[i] as char).is_ascii_alphanumeric() || bytes[i] == b'_')
                    {
                        i += 1;
                    }
                    if name_start == i {
                        return Err(PreprocessError::MalformedDirective {
                            line: line.to_string(),
                        });
                    }
                    let name = &expr[name_start..i];
                    if parenthesized {
                        while i < bytes.len() && (bytes[i] as char).is_ascii_whitespace() {
                            i += 1;
                        }
                        if i >= bytes.len() || bytes[i] != b')' {
                            return Err(PreprocessError::MalformedDirective {
                                line: line.to_string(),
                            });
                        }
                        i += 1;
                    }
                    out.push_str(if self.macros.is_defined(name) { "1" } else { "0" });
                } else {
                    out.push_str(ident);
                }
            } else {
                out.push(c);
                i += c.len_utf8();
            }
        }
        Ok(out)
    }

    /// Resolve one `#include` directive and expand the target.
    ///
    /// `#include "X"` searches the including file's directory, then user
    /// paths, then system paths. `#include <X>` searches system paths, then
    /// user paths.
    fn handle_include(
        &mut self,
        spec: &str,
        line: &str,
        current_file: &Path,
    ) -> Result<String, PreprocessError> {
        if let Some(rest) = spec.strip_prefix('<') {
            let end = rest.find('>').ok_or_else(|| PreprocessError::MalformedDirective {
                line: line.to_string(),
            })?;
            let name = rest[..end].trim();
            let mut dirs: Vec<PathBuf> = self.system_paths.clone();
            dirs.extend(self.user_paths.clone());
            let target = locate_header(name, &dirs).ok_or_else(|| {
                PreprocessError::HeaderNotFound {
                    name: name.to_string(),
                }
            })?;
            self.expand_file(&target)
        } else if let Some(rest) = spec.strip_prefix('"') {
            let end = rest.find('"').ok_or_else(|| PreprocessError::MalformedDirective {
                line: line.to_string(),
            })?;
            let name = &rest[..end];
            let mut dirs: Vec<PathBuf> = Vec::new();
            if let Some(parent) = current_file.parent() {
                dirs.push(parent.to_path_buf());
            }
            dirs.extend(self.user_paths.clone());
            dirs.extend(self.system_paths.clone());
            let target = locate_header(name, &dirs).ok_or_else(|| {
                PreprocessError::HeaderNotFound {
                    name: name.to_string(),
                }
            })?;
            self.expand_file(&target)
        } else {
            Err(PreprocessError::MalformedDirective {
                line: line.to_string(),
            })
        }
    }
}

fn locate_header(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    for dir in dirs {
        let trial = dir.join(name);
        if trial.is_file() {
            return Some(trial);
        }
    }
    None
}
