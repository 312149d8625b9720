//! Class-name resolution and `\documentclass` rewriting.
//!
//! When a request carries its own class file, the name written to disk and the name
//! referenced by the document must be the same string. Both come from a single call
//! to `resolve_class_name`.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::compile::request::CompilationRequest;

/// Used when a template name sanitizes to nothing.
pub const EMPTY_TEMPLATE_CLASS: &str = "custom";
/// Used when neither a template name nor a `\documentclass` argument is available.
pub const FALLBACK_CLASS: &str = "resume";

lazy_static! {
    /// `\documentclass`, optional `[options]`, then `{name}`. Group 1 keeps the
    /// command and options verbatim; group 2 is the class name.
    static ref DOCUMENT_CLASS_DECL: Regex =
        Regex::new(r"(\\documentclass(?:\[.*?\])?)\{(.*?)\}").expect("valid documentclass pattern");
}

/// Strips every character that is not an ASCII letter or digit.
pub fn sanitize_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Argument of the first `\documentclass{...}`, trimmed. `None` if absent or blank.
pub fn declared_class(source: &str) -> Option<&str> {
    DOCUMENT_CLASS_DECL
        .captures(source)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().trim())
        .filter(|name| !name.is_empty())
}

/// Both branches sanitize, so the result is always a bare file stem that cannot
/// name a path outside the workspace.
pub fn resolve_class_name(source: &str, template_identifier: Option<&str>) -> String {
    match template_identifier {
        Some(identifier) => {
            let sanitized = sanitize_identifier(identifier);
            if sanitized.is_empty() {
                EMPTY_TEMPLATE_CLASS.to_string()
            } else {
                sanitized
            }
        }
        None => declared_class(source)
            .map(sanitize_identifier)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| FALLBACK_CLASS.to_string()),
    }
}

/// Replaces the argument of the first `\documentclass` with `class_name`. Bracketed
/// options are kept as written. Later declarations are left alone.
pub fn rewrite_document_class<'a>(source: &'a str, class_name: &str) -> Cow<'a, str> {
    DOCUMENT_CLASS_DECL.replacen(source, 1, |caps: &Captures| {
        format!("{}{{{}}}", &caps[1], class_name)
    })
}

/// A class file to place next to the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile<'a> {
    pub class_name: String,
    pub contents: &'a str,
}

impl ClassFile<'_> {
    pub fn file_name(&self) -> String {
        format!("{}.cls", self.class_name)
    }
}

/// Source text ready to be written into a workspace, plus the class file if the
/// request supplied one.
#[derive(Debug, Clone)]
pub struct PreparedDocument<'a> {
    pub source: Cow<'a, str>,
    pub class_file: Option<ClassFile<'a>>,
}

pub fn prepare_document(request: &CompilationRequest) -> PreparedDocument<'_> {
    let Some(class_source) = request.class_override() else {
        return PreparedDocument {
            source: Cow::Borrowed(&request.source),
            class_file: None,
        };
    };

    let class_name = resolve_class_name(&request.source, request.template_identifier());
    let source = rewrite_document_class(&request.source, &class_name);

    PreparedDocument {
        source,
        class_file: Some(ClassFile {
            class_name,
            contents: class_source,
        }),
    }
}
