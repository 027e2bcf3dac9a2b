//! Canonical type strings and the aggregate type registry
//!
//! Types travel through the compiler as canonical strings: the primitives
//! (`int`, `float`, `char`, `double`, `bool`, `void`), pointers (`T*`,
//! stripped right-to-left), and tagged aggregates (`struct T`, `union T`,
//! `enum T`). Array dimensions never appear in type strings; they are a
//! per-declarator attribute.
//!
//! The registry is populated during semantic analysis and read-only during
//! IR generation. It is an owned value threaded between the two phases so
//! each test can build an isolated instance.

use crate::ast::{StructDecl, UnionDecl, VarDecl};
use std::collections::HashMap;

pub fn is_pointer(ty: &str) -> bool {
    ty.trim_end().ends_with('*')
}

/// Strip one level of pointer: `"int**"` → `"int*"`, `"int*"` → `"int"`.
pub fn pointee(ty: &str) -> Option<String> {
    let trimmed = ty.trim_end();
    trimmed
        .strip_suffix('*')
        .map(|base| base.trim_end().to_string())
}

pub fn pointer_to(ty: &str) -> String {
    format!("{}*", ty)
}

pub fn struct_tag(ty: &str) -> Option<&str> {
    ty.strip_prefix("struct ")
}

pub fn union_tag(ty: &str) -> Option<&str> {
    ty.strip_prefix("union ")
}

pub fn enum_tag(ty: &str) -> Option<&str> {
    ty.strip_prefix("enum ")
}

/// Struct and union declarations indexed by tag, plus the enumerator table.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    structs: HashMap<String, StructDecl>,
    unions: HashMap<String, UnionDecl>,
    enums: HashMap<String, i32>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        TypeRegistry::default()
    }

    pub fn register_struct(&mut self, tag: &str, decl: StructDecl) {
        self.structs.insert(tag.to_string(), decl);
    }

    pub fn register_union(&mut self, tag: &str, decl: UnionDecl) {
        self.unions.insert(tag.to_string(), decl);
    }

    pub fn register_enumerator(&mut self, name: &str, value: i32) {
        self.enums.insert(name.to_string(), value);
    }

    pub fn lookup_struct(&self, tag: &str) -> Option<&StructDecl> {
        self.structs.get(tag)
    }

    pub fn lookup_union(&self, tag: &str) -> Option<&UnionDecl> {
        self.unions.get(tag)
    }

    pub fn enumerator_value(&self, name: &str) -> Option<i32> {
        self.enums.get(name).copied()
    }

    /// Iterate enumerators in a stable order (used for constant emission).
    pub fn enumerators(&self) -> impl Iterator<Item = (&str, i32)> {
        let mut pairs: Vec<(&str, i32)> = self.enums.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        pairs.sort_by_key(|(_, v)| *v);
        pairs.into_iter()
    }

    /// The declared type of `member` within the aggregate type `ty`
    /// (`struct T` or `union T`), if both exist.
    pub fn member_type(&self, ty: &str, member: &str) -> Option<&VarDecl> {
        if let Some(tag) = struct_tag(ty) {
            self.lookup_struct(tag)?
                .members
                .iter()
                .find(|m| m.name == member)
        } else if let Some(tag) = union_tag(ty) {
            self.lookup_union(tag)?
                .members
                .iter()
                .find(|m| m.name == member)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_stripping() {
        assert!(is_pointer("int*"));
        assert!(is_pointer("int**"));
        assert!(!is_pointer("int"));
        assert_eq!(pointee("int**"), Some("int*".to_string()));
        assert_eq!(pointee("int*"), Some("int".to_string()));
        assert_eq!(pointee("int"), None);
        assert_eq!(pointer_to("int"), "int*");
    }

    #[test]
    fn test_tags() {
        assert_eq!(struct_tag("struct Point"), Some("Point"));
        assert_eq!(union_tag("union U"), Some("U"));
        assert_eq!(enum_tag("enum Color"), Some("Color"));
        assert_eq!(struct_tag("int"), None);
    }

    #[test]
    fn test_member_lookup() {
        let mut registry = TypeRegistry::new();
        registry.register_struct(
            "Point",
            StructDecl {
                tag: Some("Point".to_string()),
                members: vec![
                    VarDecl {
                        ty: "int".to_string(),
                        name: "x".to_string(),
                        dims: vec![],
                        init: None,
                    },
                    VarDecl {
                        ty: "int".to_string(),
                        name: "y".to_string(),
                        dims: vec![],
                        init: None,
                    },
                ],
            },
        );
        assert_eq!(
            registry.member_type("struct Point", "y").map(|m| m.ty.as_str()),
            Some("int")
        );
        assert!(registry.member_type("struct Point", "z").is_none());
        assert!(registry.member_type("int", "x").is_none());
    }

    #[test]
    fn test_enumerator_order() {
        let mut registry = TypeRegistry::new();
        registry.register_enumerator("B", 1);
        registry.register_enumerator("A", 0);
        let names: Vec<&str> = registry.enumerators().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["A", "B"]);
    }
}
