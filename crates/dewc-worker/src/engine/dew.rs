//! CommonJS to dew module rewriting.
//!
//! A dew module defers execution of the CommonJS body until its `dew()`
//! export is first called, and turns every literal `require` into an import
//! of the resolved target:
//!
//! ```text
//! import { dew as _aDew } from "./a.dew.js";
//! import _fs from "fs";
//! var exports = {}, _dewExec = false;
//! var module = { exports: exports };
//! export function dew() {
//!   if (_dewExec) return module.exports;
//!   _dewExec = true;
//! <body>
//!   return module.exports;
//! }
//! ```

use super::deps::{is_global, require_resolve_target, require_target};
use super::esm::string;
use super::SpecifierLookup;
use dewc_core::is_native_module;
use std::collections::HashSet;
use std::fmt::Write as _;
use swc_common::{Span, Spanned, SyntaxContext};
use swc_ecma_ast::{
    ArrowExpr, Callee, Class, Constructor, Expr, Function, GetterProp, Ident, IdentName, Lit,
    MemberExpr, MemberProp, ReturnStmt, Script, SeqExpr, SetterProp,
};
use swc_ecma_visit::{Visit, VisitMut, VisitMutWith, VisitWith};

/// Closes the `dew()` function opened by the prologue.
pub(crate) const EPILOGUE: &str = "  return module.exports;\n}\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImportKind {
    /// `import { dew as _xDew }`, called in place of `require`.
    Dew,
    /// `import _x`, for builtins and native binaries.
    Default,
}

#[derive(Debug)]
struct DewImport {
    local: String,
    target: String,
    kind: ImportKind,
}

pub(crate) struct DewRewriter<'a> {
    lookup: SpecifierLookup<'a>,
    node_env: &'static str,
    imports: Vec<DewImport>,
    taken: HashSet<String>,
    unresolved: SyntaxContext,
    /// Nesting of scopes with their own `this`.
    this_depth: usize,
    /// Nesting of function bodies.
    return_depth: usize,
}

impl<'a> DewRewriter<'a> {
    pub(crate) fn new(
        script: &Script,
        lookup: SpecifierLookup<'a>,
        production: bool,
        unresolved: SyntaxContext,
    ) -> Self {
        let mut names = IdentNames::default();
        script.visit_with(&mut names);
        names.taken.extend(
            ["exports", "module", "dew", "_dewExec", "require"]
                .into_iter()
                .map(String::from),
        );

        Self {
            lookup,
            node_env: if production { "production" } else { "development" },
            imports: Vec::new(),
            taken: names.taken,
            unresolved,
            this_depth: 0,
            return_depth: 0,
        }
    }

    /// Rewrite `script` in place.
    pub(crate) fn rewrite(&mut self, script: &mut Script) {
        script.shebang = None;
        script.visit_mut_with(self);
    }

    /// Imports and wrapper opening that precede the body.
    pub(crate) fn prologue(&self) -> String {
        let mut out = String::new();
        for import in &self.imports {
            let target = quote(&import.target);
            // Writing to a String cannot fail.
            let _ = match import.kind {
                ImportKind::Dew => {
                    writeln!(out, "import {{ dew as {} }} from {target};", import.local)
                }
                ImportKind::Default => writeln!(out, "import {} from {target};", import.local),
            };
        }
        out.push_str("var exports = {}, _dewExec = false;\n");
        out.push_str("var module = { exports: exports };\n");
        out.push_str("export function dew() {\n");
        out.push_str("  if (_dewExec) return module.exports;\n");
        out.push_str("  _dewExec = true;\n");
        out
    }

    fn import_for(&mut self, specifier: &str) -> (String, ImportKind) {
        let target = self.lookup.resolve(specifier);
        if let Some(existing) = self.imports.iter().find(|i| i.target == target) {
            return (existing.local.clone(), existing.kind);
        }

        let kind = if is_native_module(target, None) {
            ImportKind::Default
        } else {
            ImportKind::Dew
        };
        let stem = identifier_stem(specifier);
        let base = match kind {
            ImportKind::Dew => format!("_{stem}Dew"),
            ImportKind::Default => format!("_{stem}"),
        };
        let mut local = base.clone();
        let mut n = 2;
        while self.taken.contains(&local) {
            local = format!("{base}{n}");
            n += 1;
        }
        self.taken.insert(local.clone());

        self.imports.push(DewImport {
            local: local.clone(),
            target: target.to_string(),
            kind,
        });
        (local, kind)
    }
}

impl VisitMut for DewRewriter<'_> {
    fn visit_mut_expr(&mut self, expr: &mut Expr) {
        expr.visit_mut_children_with(self);

        match expr {
            Expr::This(this) if self.this_depth == 0 => {
                let span = this.span;
                *expr = Expr::Ident(ident("exports", span));
            }
            Expr::Call(call) => {
                if let Some(specifier) = require_resolve_target(call, self.unresolved) {
                    let span = call.span;
                    let target = self.lookup.resolve(&specifier).to_string();
                    *expr = Expr::Lit(Lit::Str(string(&target, span)));
                } else if let Some(specifier) = require_target(call, self.unresolved) {
                    let span = call.span;
                    let (local, kind) = self.import_for(&specifier);
                    match kind {
                        ImportKind::Dew => {
                            call.callee = Callee::Expr(Box::new(Expr::Ident(ident(&local, span))));
                            call.args.clear();
                        }
                        ImportKind::Default => *expr = Expr::Ident(ident(&local, span)),
                    }
                }
            }
            Expr::Member(member) if is_node_env(member, self.unresolved) => {
                let span = member.span;
                *expr = Expr::Lit(Lit::Str(string(self.node_env, span)));
            }
            _ => {}
        }
    }

    fn visit_mut_return_stmt(&mut self, ret: &mut ReturnStmt) {
        ret.visit_mut_children_with(self);
        if self.return_depth > 0 {
            return;
        }
        let exports = Box::new(module_exports(ret.span));
        ret.arg = Some(match ret.arg.take() {
            None => exports,
            Some(arg) => Box::new(Expr::Seq(SeqExpr {
                span: arg.span(),
                exprs: vec![arg, exports],
            })),
        });
    }

    fn visit_mut_function(&mut self, function: &mut Function) {
        self.this_depth += 1;
        self.return_depth += 1;
        function.visit_mut_children_with(self);
        self.this_depth -= 1;
        self.return_depth -= 1;
    }

    fn visit_mut_arrow_expr(&mut self, arrow: &mut ArrowExpr) {
        self.return_depth += 1;
        arrow.visit_mut_children_with(self);
        self.return_depth -= 1;
    }

    fn visit_mut_class(&mut self, class: &mut Class) {
        self.this_depth += 1;
        class.visit_mut_children_with(self);
        self.this_depth -= 1;
    }

    fn visit_mut_constructor(&mut self, constructor: &mut Constructor) {
        self.return_depth += 1;
        constructor.visit_mut_children_with(self);
        self.return_depth -= 1;
    }

    fn visit_mut_getter_prop(&mut self, getter: &mut GetterProp) {
        self.this_depth += 1;
        self.return_depth += 1;
        getter.visit_mut_children_with(self);
        self.this_depth -= 1;
        self.return_depth -= 1;
    }

    fn visit_mut_setter_prop(&mut self, setter: &mut SetterProp) {
        self.this_depth += 1;
        self.return_depth += 1;
        setter.visit_mut_children_with(self);
        self.this_depth -= 1;
        self.return_depth -= 1;
    }
}

#[derive(Default)]
struct IdentNames {
    taken: HashSet<String>,
}

impl Visit for IdentNames {
    fn visit_ident(&mut self, ident: &Ident) {
        self.taken.insert(ident.sym.to_string());
    }
}

fn ident(name: &str, span: Span) -> Ident {
    Ident::new_no_ctxt(name.into(), span)
}

fn module_exports(span: Span) -> Expr {
    Expr::Member(MemberExpr {
        span,
        obj: Box::new(Expr::Ident(ident("module", span))),
        prop: MemberProp::Ident(IdentName::new("exports".into(), span)),
    })
}

/// `process.env.NODE_ENV`
fn is_node_env(member: &MemberExpr, unresolved: SyntaxContext) -> bool {
    let MemberProp::Ident(prop) = &member.prop else {
        return false;
    };
    if &*prop.sym != "NODE_ENV" {
        return false;
    }
    let Expr::Member(env) = &*member.obj else {
        return false;
    };
    let MemberProp::Ident(env_prop) = &env.prop else {
        return false;
    };
    is_global(&env.obj, "process", unresolved) && &*env_prop.sym == "env"
}

/// JavaScript string literal for `value`.
fn quote(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\""))
}

/// Identifier-safe stem for a binding named after `specifier`.
///
/// `./lib/string-utils.js` gives `stringUtils`, `fs` gives `fs`.
pub(crate) fn identifier_stem(specifier: &str) -> String {
    let segment = specifier
        .rsplit('/')
        .find(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or_default();
    let name = segment.split('.').next().unwrap_or_default();

    let mut stem = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
            if upper && !stem.is_empty() {
                stem.push(c.to_ascii_uppercase());
            } else {
                stem.push(c);
            }
            upper = false;
        } else {
            upper = true;
        }
    }

    if stem.is_empty() {
        "dep".to_string()
    } else {
        stem
    }
}
