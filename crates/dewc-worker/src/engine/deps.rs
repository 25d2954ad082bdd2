//! Dependency visitors and the call-shape matchers shared with the
//! transforms.

use super::{CjsDependencies, ModuleImports};
use swc_common::SyntaxContext;
use swc_ecma_ast::{
    CallExpr, Callee, Expr, ExprOrSpread, Lit, MemberProp, ModuleDecl, ModuleItem, Program,
};
use swc_ecma_visit::{Visit, VisitWith};

/// Value of a string literal or an interpolation-free template literal.
pub(crate) fn string_literal(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(Lit::Str(s)) => Some(s.value.to_string()),
        Expr::Tpl(tpl) if tpl.exprs.is_empty() && tpl.quasis.len() == 1 => {
            tpl.quasis[0].cooked.as_ref().map(ToString::to_string)
        }
        _ => None,
    }
}

fn literal_arg(arg: &ExprOrSpread) -> Option<String> {
    if arg.spread.is_some() {
        return None;
    }
    string_literal(&arg.expr)
}

/// Whether `expr` is the free identifier `name`.
///
/// `unresolved` is the context the resolver gives identifiers with no
/// binding in the file, so a parameter or variable that shadows the global
/// does not match.
pub(crate) fn is_global(expr: &Expr, name: &str, unresolved: SyntaxContext) -> bool {
    matches!(expr, Expr::Ident(ident) if &*ident.sym == name && ident.ctxt == unresolved)
}

/// Target of `require("x")` where `require` is the global.
pub(crate) fn require_target(call: &CallExpr, unresolved: SyntaxContext) -> Option<String> {
    let Callee::Expr(callee) = &call.callee else {
        return None;
    };
    if !is_global(callee, "require", unresolved) || call.args.len() != 1 {
        return None;
    }
    literal_arg(&call.args[0])
}

/// Target of `require.resolve("x")` where `require` is the global.
pub(crate) fn require_resolve_target(call: &CallExpr, unresolved: SyntaxContext) -> Option<String> {
    let Callee::Expr(callee) = &call.callee else {
        return None;
    };
    let Expr::Member(member) = &**callee else {
        return None;
    };
    let MemberProp::Ident(prop) = &member.prop else {
        return None;
    };
    if !is_global(&member.obj, "require", unresolved)
        || &*prop.sym != "resolve"
        || call.args.len() != 1
    {
        return None;
    }
    literal_arg(&call.args[0])
}

/// Literal first argument of `import(…)`.
pub(crate) fn dynamic_import_target(call: &CallExpr) -> Option<String> {
    if !matches!(call.callee, Callee::Import(_)) {
        return None;
    }
    call.args.first().and_then(literal_arg)
}

pub(crate) fn module_imports(program: &Program) -> ModuleImports {
    let mut imports = ModuleImports::default();

    if let Program::Module(module) = program {
        for item in &module.body {
            let ModuleItem::ModuleDecl(decl) = item else {
                continue;
            };
            let src = match decl {
                ModuleDecl::Import(import) => &import.src,
                ModuleDecl::ExportAll(export) => &export.src,
                ModuleDecl::ExportNamed(export) => match &export.src {
                    Some(src) => src,
                    None => continue,
                },
                _ => continue,
            };
            let value = src.value.to_string();
            if !imports.static_sources.contains(&value) {
                imports.static_sources.push(value);
            }
        }
    }

    let mut collector = DynamicImports::default();
    program.visit_with(&mut collector);
    imports.dynamic = collector.found;
    imports
}

pub(crate) fn cjs_dependencies(program: &Program, unresolved: SyntaxContext) -> CjsDependencies {
    let mut collector = CjsCalls {
        unresolved,
        deps: CjsDependencies::default(),
    };
    program.visit_with(&mut collector);
    collector.deps
}

#[derive(Default)]
struct DynamicImports {
    found: Vec<String>,
}

impl Visit for DynamicImports {
    fn visit_call_expr(&mut self, call: &CallExpr) {
        if let Some(target) = dynamic_import_target(call) {
            self.found.push(target);
        }
        call.visit_children_with(self);
    }
}

struct CjsCalls {
    unresolved: SyntaxContext,
    deps: CjsDependencies,
}

impl Visit for CjsCalls {
    fn visit_call_expr(&mut self, call: &CallExpr) {
        if let Some(target) = require_target(call, self.unresolved) {
            self.deps.requires.push(target);
        } else if let Some(target) = require_resolve_target(call, self.unresolved) {
            self.deps.resolves.push(target);
        }
        call.visit_children_with(self);
    }
}
