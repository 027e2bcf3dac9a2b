//! Macro table and expansion
//!
//! Object-like and function-like macros, variadic tails (`__VA_ARGS__`),
//! stringification (`#param`) and token pasting (`##`). Expansion is
//! recursive: each substituted replacement is rescanned once, with a
//! disable-set of macro names already expanding on the current path so a
//! self-referential macro expands to itself instead of looping.

use crate::error::PreprocessError;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub(super) struct Macro {
    /// `None` for object-like macros; parameter names otherwise.
    pub params: Option<Vec<String>>,
    /// Collects surplus arguments into `__VA_ARGS__`.
    pub variadic: bool,
    pub replacement: String,
}

#[derive(Debug, Default)]
pub(super) struct MacroTable {
    macros: HashMap<String, Macro>,
}

impl MacroTable {
    pub fn new() -> Self {
        MacroTable::default()
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn undef(&mut self, name: &str) {
        self.macros.remove(name);
    }

    /// Record a definition from the text after `#define`. Returns the macro
    /// name so the include-guard tracker can observe it.
    pub fn define(&mut self, rest: &str, directive_line: &str) -> Result<String, PreprocessError> {
        let rest = rest.trim();
        let name_end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        let name = &rest[..name_end];
        if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(PreprocessError::MalformedDirective {
                line: directive_line.to_string(),
            });
        }
        let after_name = &rest[name_end..];

        // A '(' immediately after the name (no whitespace) opens a parameter
        // list; otherwise everything after the name is the replacement.
        if let Some(after_paren) = after_name.strip_prefix('(') {
            let close = after_paren.find(')').ok_or_else(|| PreprocessError::MalformedDirective {
                line: directive_line.to_string(),
            })?;
            let mut params = Vec::new();
            let mut variadic = false;
            let param_list = &after_paren[..close];
            if !param_list.trim().is_empty() {
                for raw in param_list.split(',') {
                    let param = raw.trim();
                    if param == "..." {
                        variadic = true;
                    } else if param.is_empty() {
                        return Err(PreprocessError::MalformedDirective {
                            line: directive_line.to_string(),
                        });
                    } else {
                        params.push(param.to_string());
                    }
                }
            }
            let replacement = after_paren[close + 1..].trim().to_string();
            self.macros.insert(
                name.to_string(),
                Macro {
                    params: Some(params),
                    variadic,
                    replacement,
                },
            );
        } else {
            self.macros.insert(
                name.to_string(),
                Macro {
                    params: None,
                    variadic: false,
                    replacement: after_name.trim().to_string(),
                },
            );
        }
        Ok(name.to_string())
    }

    /// Expand all macros in `text`.
    pub fn expand(&self, text: &str) -> Result<String, PreprocessError> {
        self.expand_with(text, &HashSet::new())
    }

    fn expand_with(
        &self,
        text: &str,
        disabled: &HashSet<String>,
    ) -> Result<String, PreprocessError> {
        let bytes = text.as_bytes();
        let mut out = String::with_capacity(text.len());
        let mut i = 0;
        while i < bytes.len() {
            let c = bytes[i] as char;
            if c == '"' {
                // Never expand inside string literals (stringified arguments).
                let end = find_string_end(text, i);
                out.push_str(&text[i..end]);
                i = end;
                continue;
            }
            if c.is_ascii_alphabetic() || c == '_' {
                let start = i;
                while i < bytes.len()
                    && ((bytes[i] as char).is_ascii_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                let ident = &text[start..i];
                match self.macros.get(ident) {
                    Some(mac) if !disabled.contains(ident) => {
                        let mut inner = disabled.clone();
                        inner.insert(ident.to_string());
                        match &mac.params {
                            None => {
                                let substituted =
                                    self.substitute(mac, ident, &[], disabled)?;
                                out.push_str(&self.expand_with(&substituted, &inner)?);
                            }
                            Some(_) => {
                                // Function-like macros only expand when a call
                                // follows; a bare name passes through.
                                let mut j = i;
                                while j < bytes.len() && (bytes[j] as char).is_ascii_whitespace() {
                                    j += 1;
                                }
                                if j < bytes.len() && bytes[j] == b'(' {
                                    match split_arguments(text, j) {
                                        Some((args, after)) => {
                                            let substituted =
                                                self.substitute(mac, ident, &args, disabled)?;
                                            out.push_str(
                                                &self.expand_with(&substituted, &inner)?,
                                            );
                                            i = after;
                                        }
                                        // Unbalanced on this line: leave the
                                        // call unexpanded.
                                        None => out.push_str(ident),
                                    }
                                } else {
                                    out.push_str(ident);
                                }
                            }
                        }
                    }
                    _ => out.push_str(ident),
                }
            } else {
                out.push(c);
                i += c.len_utf8();
            }
        }
        Ok(out)
    }

    /// Build the replacement text for one invocation: bind arguments, apply
    /// `#` stringification and `##` pasting. Arguments are substituted as
    /// written; the caller rescans the result.
    fn substitute(
        &self,
        mac: &Macro,
        name: &str,
        args: &[String],
        _disabled: &HashSet<String>,
    ) -> Result<String, PreprocessError> {
        let mut bindings: HashMap<&str, String> = HashMap::new();
        if let Some(params) = &mac.params {
            if mac.variadic {
                if args.len() < params.len() {
                    return Err(PreprocessError::MacroArity {
                        name: name.to_string(),
                        expected: params.len(),
                        got: args.len(),
                    });
                }
                for (param, arg) in params.iter().zip(args.iter()) {
                    bindings.insert(param.as_str(), arg.clone());
                }
                bindings.insert("__VA_ARGS__", args[params.len()..].join(", "));
            } else {
                // `M()` with one empty argument counts as zero arguments.
                let effective = if params.is_empty()
                    && args.len() == 1
                    && args[0].trim().is_empty()
                {
                    &args[..0]
                } else {
                    args
                };
                if effective.len() != params.len() {
                    return Err(PreprocessError::MacroArity {
                        name: name.to_string(),
                        expected: params.len(),
                        got: effective.len(),
                    });
                }
                for (param, arg) in params.iter().zip(effective.iter()) {
                    bindings.insert(param.as_str(), arg.clone());
                }
            }
        }

        let tokens = replacement_tokens(&mac.replacement);
        let mut pieces: Vec<String> = Vec::with_capacity(tokens.len());
        let mut idx = 0;
        while idx < tokens.len() {
            match &tokens[idx] {
                RepToken::Stringify(param) => {
                    let arg = bindings.get(param.as_str()).cloned().unwrap_or_else(|| {
                        // '#' before a non-parameter is kept verbatim.
                        format!("#{}", param)
                    });
                    if bindings.contains_key(param.as_str()) {
                        pieces.push(format!("\"{}\"", normalize_whitespace(&arg)));
                    } else {
                        pieces.push(arg);
                    }
                }
                RepToken::Paste => {
                    // Whitespace around ## is dropped; the neighbors fuse.
                    while matches!(pieces.last(), Some(p) if p.trim().is_empty()) {
                        pieces.pop();
                    }
                    let left = pieces.pop().unwrap_or_default();
                    idx += 1;
                    while matches!(tokens.get(idx), Some(RepToken::Other(t)) if t.trim().is_empty())
                    {
                        idx += 1;
                    }
                    let right = match tokens.get(idx) {
                        Some(tok) => token_text(tok, &bindings),
                        None => String::new(),
                    };
                    pieces.push(format!("{}{}", left.trim_end(), right.trim_start()));
                }
                other => pieces.push(token_text(other, &bindings)),
            }
            idx += 1;
        }
        Ok(pieces.concat())
    }
}

#[derive(Debug)]
enum RepToken {
    Ident(String),
    /// `#param`
    Stringify(String),
    /// `##`
    Paste,
    Other(String),
}

fn token_text(tok: &RepToken, bindings: &HashMap<&str, String>) -> String {
    match tok {
        RepToken::Ident(name) => bindings
            .get(name.as_str())
            .cloned()
            .unwrap_or_else(|| name.clone()),
        RepToken::Stringify(name) => format!("#{}", name),
        RepToken::Paste => String::new(),
        RepToken::Other(text) => text.clone(),
    }
}

/// Split a replacement into identifiers, `#param`, `##` and everything else,
/// preserving the in-between text verbatim.
fn replacement_tokens(replacement: &str) -> Vec<RepToken> {
    let bytes = replacement.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c == '#' {
            if i + 1 < bytes.len() && bytes[i + 1] == b'#' {
                tokens.push(RepToken::Paste);
                i += 2;
            } else {
                let mut j = i + 1;
                while j < bytes.len() && (bytes[j] as char).is_ascii_whitespace() {
                    j += 1;
                }
                let start = j;
                while j < bytes.len()
                    && ((bytes[j] as char).is_ascii_alphanumeric() || bytes[j] == b'_')
                {
                    j += 1;
                }
                if start == j {
                    tokens.push(RepToken::Other("#".to_string()));
                    i += 1;
                } else {
                    tokens.push(RepToken::Stringify(replacement[start..j].to_string()));
                    i = j;
                }
            }
        } else if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < bytes.len() && ((bytes[i] as char).is_ascii_alphanumeric() || bytes[i] == b'_')
            {
                i += 1;
            }
            tokens.push(RepToken::Ident(replacement[start..i].to_string()));
        } else {
            let start = i;
            while i < bytes.len() {
                let ch = bytes[i] as char;
                if ch == '#' || ch.is_ascii_alphabetic() || ch == '_' {
                    break;
                }
                i += 1;
            }
            tokens.push(RepToken::Other(replacement[start..i].to_string()));
        }
    }
    tokens
}

/// Parse a parenthesized argument list starting at the `(` at `open`.
/// Commas only split at the top nesting level. Returns the raw argument
/// texts and the index just past the closing `)`, or `None` when the list
/// does not close within the text.
fn split_arguments(text: &str, open: usize) -> Option<(Vec<String>, usize)> {
    let bytes = text.as_bytes();
    debug_assert_eq!(bytes[open], b'(');
    let mut depth = 1;
    let mut args = Vec::new();
    let mut current = String::new();
    let mut i = open + 1;
    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    args.push(current.trim().to_string());
                    return Some((args, i + 1));
                }
                current.push(c);
            }
            ',' if depth == 1 => {
                args.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(c),
        }
        i += 1;
    }
    None
}

/// Index just past the closing quote of the string starting at `open`.
fn find_string_end(text: &str, open: usize) -> usize {
    let bytes = text.as_bytes();
    let mut i = open + 1;
    while i < bytes.len() {
        if bytes[i] == b'"' {
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

/// Collapse interior whitespace runs to single spaces and trim the ends.
fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(defs: &[&str]) -> MacroTable {
        let mut t = MacroTable::new();
        for def in defs {
            t.define(def, def).unwrap();
        }
        t
    }

    #[test]
    fn test_object_macro() {
        let t = table(&["PI 3.14"]);
        assert_eq!(t.expand("double x = PI;").unwrap(), "double x = 3.14;");
        // Identifier boundaries are respected.
        assert_eq!(t.expand("int PIN = 0;").unwrap(), "int PIN = 0;");
    }

    #[test]
    fn test_function_macro() {
        let t = table(&["SQR(x) ((x) * (x))"]);
        assert_eq!(t.expand("SQR(4)").unwrap(), "((4) * (4))");
    }

    #[test]
    fn test_nested_expansion() {
        let t = table(&[
            "INC(x) ((x) + 1)",
            "DOUBLE(x) ((x) + (x))",
            "COMPOSE(x) DOUBLE(INC(x))",
        ]);
        // Arguments substitute as written and the result rescans, so each
        // INC(5) expands inside DOUBLE's parentheses.
        assert_eq!(
            t.expand("COMPOSE(5)").unwrap(),
            "((((5) + 1)) + (((5) + 1)))"
        );
    }

    #[test]
    fn test_commas_inside_parens_do_not_split() {
        let t = table(&["FIRST(a, b) a"]);
        assert_eq!(t.expand("FIRST(f(1, 2), 3)").unwrap(), "f(1, 2)");
    }

    #[test]
    fn test_arity_mismatch() {
        let t = table(&["PAIR(a, b) a b"]);
        assert!(matches!(
            t.expand("PAIR(1)"),
            Err(PreprocessError::MacroArity {
                expected: 2,
                got: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_self_reference_does_not_loop() {
        let t = table(&["LOOP LOOP + 1"]);
        assert_eq!(t.expand("LOOP").unwrap(), "LOOP + 1");
    }

    #[test]
    fn test_stringify() {
        let t = table(&["STR(x) #x"]);
        assert_eq!(t.expand("STR(a +  b)").unwrap(), "\"a + b\"");
    }

    #[test]
    fn test_paste() {
        let t = table(&["GLUE(a, b) a ## b"]);
        assert_eq!(t.expand("GLUE(foo, bar)").unwrap(), "foobar");
    }

    #[test]
    fn test_variadic() {
        let t = table(&["CALL(f, ...) f(__VA_ARGS__)"]);
        assert_eq!(t.expand("CALL(sum, 1, 2, 3)").unwrap(), "sum(1, 2, 3)");
    }

    #[test]
    fn test_undef() {
        let mut t = table(&["X 1"]);
        assert!(t.is_defined("X"));
        t.undef("X");
        assert!(!t.is_defined("X"));
        assert_eq!(t.expand("X").unwrap(), "X");
    }

    #[test]
    fn test_bare_function_macro_name_passes_through() {
        let t = table(&["F(x) x"]);
        assert_eq!(t.expand("int F;").unwrap(), "int F;");
    }

    #[test]
    fn test_unclosed_call_passes_through() {
        let t = table(&["F(x) x"]);
        assert_eq!(t.expand("F(1").unwrap(), "F(1");
    }
}
