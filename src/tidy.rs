//! Mechanical code quality checks over `src/`, run as an ordinary unit test.
//!
//! `rustfmt` and `clippy` cover formatting and common lints. This module checks
//! the project rules they cannot express:
//!
//! **Critical** (fail the test)
//! - No `.unwrap()` or `.expect()` outside test code; handlers propagate errors.
//! - Public free functions and structs are documented.
//! - Public parameters spell out transport fields (`sequence_number`, not `sn`).
//! - No catch-all modules such as `utils.rs`.
//! - No `FIXME` markers.
//!
//! **Ratchet** (fail the test, raise the limit consciously)
//! - Largest module size.
//! - Struct field count.

use std::fs;
use std::path::{Path, PathBuf};

use proc_macro2::Span;
use syn::spanned::Spanned;
use syn::visit::{self, Visit};
use syn::{Attribute, ExprMethodCall, FnArg, ItemFn, ItemMod, ItemStruct, Pat, Visibility};

// --- Limits ---

/// Max fields in any struct. Continuity state is the widest.
const STRUCT_FIELD_COUNT_MAX: usize = 16;

/// Max lines in any single module, tests included.
const MODULE_SIZE_HIGH_WATER_MARK: usize = 900;

/// Parameter names that hide which transport field they carry.
const ABBREVIATED_PARAMETERS: &[(&str, &str)] = &[
    ("ctx", "context"),
    ("sn", "sequence_number"),
    ("seq_num", "sequence_number"),
    ("ts", "timestamp"),
    ("sid", "stream_id"),
];

/// Module names that invite unrelated code to pile up.
const ANTI_PATTERN_MODULES: &[&str] = &["utils.rs", "helpers.rs", "misc.rs", "common.rs"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Severity {
    Ratchet,
    Critical,
}

#[derive(Debug)]
struct Violation {
    severity: Severity,
    path: String,
    line: usize,
    message: String,
}

impl Violation {
    fn at(severity: Severity, path: &Path, line: usize, message: impl Into<String>) -> Self {
        Violation {
            severity,
            path: path.display().to_string(),
            line,
            message: message.into(),
        }
    }
}

fn is_cfg_test(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path().is_ident("cfg")
            && attr
                .parse_args::<syn::Ident>()
                .is_ok_and(|ident| ident == "test")
    })
}

fn has_doc(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident("doc"))
}

/// Walks one parsed file, skipping `#[cfg(test)]` modules and `#[test]` functions.
struct RuleVisitor<'a> {
    path: &'a Path,
    violations: Vec<Violation>,
}

impl RuleVisitor<'_> {
    fn flag(&mut self, severity: Severity, span: Span, message: impl Into<String>) {
        self.violations
            .push(Violation::at(severity, self.path, span.start().line, message));
    }
}

impl<'ast> Visit<'ast> for RuleVisitor<'_> {
    fn visit_item_mod(&mut self, item: &'ast ItemMod) {
        if is_cfg_test(&item.attrs) {
            return;
        }
        visit::visit_item_mod(self, item);
    }

    fn visit_item_fn(&mut self, item: &'ast ItemFn) {
        let is_test = item.attrs.iter().any(|attr| attr.path().is_ident("test"));
        if is_test || is_cfg_test(&item.attrs) {
            return;
        }

        if matches!(item.vis, Visibility::Public(_)) {
            if !has_doc(&item.attrs) {
                self.flag(
                    Severity::Critical,
                    item.sig.ident.span(),
                    format!("Public function '{}' must have documentation.", item.sig.ident),
                );
            }
            for arg in &item.sig.inputs {
                let FnArg::Typed(typed) = arg else { continue };
                let Pat::Ident(pat) = typed.pat.as_ref() else {
                    continue;
                };
                let name = pat.ident.to_string();
                if let Some((_, preferred)) =
                    ABBREVIATED_PARAMETERS.iter().find(|(short, _)| *short == name)
                {
                    self.flag(
                        Severity::Critical,
                        pat.ident.span(),
                        format!("Public parameter '{}' must be named '{}'.", name, preferred),
                    );
                }
            }
        }

        visit::visit_item_fn(self, item);
    }

    fn visit_item_struct(&mut self, item: &'ast ItemStruct) {
        if item.fields.len() > STRUCT_FIELD_COUNT_MAX {
            self.flag(
                Severity::Ratchet,
                item.ident.span(),
                format!(
                    "Struct '{}' has {} fields, exceeding the max of {}.",
                    item.ident,
                    item.fields.len(),
                    STRUCT_FIELD_COUNT_MAX
                ),
            );
        }
        if matches!(item.vis, Visibility::Public(_)) && !has_doc(&item.attrs) {
            self.flag(
                Severity::Critical,
                item.struct_token.span(),
                format!("Public struct '{}' must have documentation.", item.ident),
            );
        }
        visit::visit_item_struct(self, item);
    }

    fn visit_expr_method_call(&mut self, call: &'ast ExprMethodCall) {
        if call.method == "unwrap" || call.method == "expect" {
            self.flag(
                Severity::Critical,
                call.method.span(),
                format!(
                    "Do not use .{}() in production code; return a DepacketizeError.",
                    call.method
                ),
            );
        }
        visit::visit_expr_method_call(self, call);
    }
}

fn list_rust_files() -> Vec<PathBuf> {
    walkdir::WalkDir::new("src")
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| {
            entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "rs")
        })
        .map(|entry| entry.path().to_path_buf())
        .collect()
}

fn check_file(path: &Path, violations: &mut Vec<Violation>) -> usize {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            violations.push(Violation::at(Severity::Critical, path, 0, e.to_string()));
            return 0;
        }
    };

    for (i, line) in text.lines().enumerate() {
        if line.contains("FIXME") {
            violations.push(Violation::at(
                Severity::Critical,
                path,
                i + 1,
                "FIXME markers are not allowed; fix it or describe the followup.",
            ));
        }
    }

    let file_name = path.file_name().map(|name| name.to_string_lossy());
    if let Some(name) = file_name {
        if ANTI_PATTERN_MODULES.contains(&name.as_ref()) {
            violations.push(Violation::at(
                Severity::Critical,
                path,
                0,
                "Catch-all module name; use a focused, descriptive module name.",
            ));
        }
    }

    match syn::parse_file(&text) {
        Ok(ast) => {
            let mut visitor = RuleVisitor {
                path,
                violations: Vec::new(),
            };
            visitor.visit_file(&ast);
            violations.extend(visitor.violations);
        }
        Err(e) => violations.push(Violation::at(
            Severity::Critical,
            path,
            e.span().start().line,
            format!("Failed to parse file: {}", e),
        )),
    }

    text.lines().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Reverse;

    #[test]
    fn tidy_main() {
        let mut violations = Vec::new();
        let mut largest = (0, PathBuf::new());

        for path in list_rust_files() {
            if path.ends_with("tidy.rs") {
                continue;
            }
            let lines = check_file(&path, &mut violations);
            if lines > largest.0 {
                largest = (lines, path);
            }
        }

        if largest.0 > MODULE_SIZE_HIGH_WATER_MARK {
            violations.push(Violation::at(
                Severity::Ratchet,
                &largest.1,
                0,
                format!(
                    "Module has {} lines, exceeding the high-water mark of {}. Split it or justify and raise the limit.",
                    largest.0, MODULE_SIZE_HIGH_WATER_MARK
                ),
            ));
        }

        if violations.is_empty() {
            return;
        }
        violations.sort_by_key(|v| (Reverse(v.severity), v.path.clone(), v.line));
        panic!(
            "\n--- Tidy Failures ---\n{}\n",
            violations
                .iter()
                .map(|v| format!("[{:?}] {}:{}: {}", v.severity, v.path, v.line, v.message))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    #[test]
    fn visitor_flags_production_unwrap_but_not_test_code() {
        let source = r#"
            /// Documented.
            pub fn parse(sn: u16) -> u8 { Some(1).unwrap() }

            #[cfg(test)]
            mod tests {
                pub fn helper() { Some(1).unwrap(); }
            }
        "#;
        let ast = syn::parse_file(source).unwrap();
        let mut visitor = RuleVisitor {
            path: Path::new("src/example.rs"),
            violations: Vec::new(),
        };
        visitor.visit_file(&ast);

        let messages: Vec<_> = visitor.violations.iter().map(|v| v.message.as_str()).collect();
        assert_eq!(messages.len(), 2, "{:?}", messages);
        assert!(messages.iter().any(|m| m.contains("sequence_number")));
        assert!(messages.iter().any(|m| m.contains(".unwrap()")));
    }
}
