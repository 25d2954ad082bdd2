//! Import source rewriting for ES modules.

use super::deps::string_literal;
use super::SpecifierLookup;
use swc_common::{Span, Spanned};
use swc_ecma_ast::{CallExpr, Callee, ExportAll, Expr, ImportDecl, Lit, NamedExport, Str};
use swc_ecma_visit::{VisitMut, VisitMutWith};

pub(crate) struct EsmRewriter<'a> {
    lookup: SpecifierLookup<'a>,
}

impl<'a> EsmRewriter<'a> {
    pub(crate) fn new(lookup: SpecifierLookup<'a>) -> Self {
        Self { lookup }
    }

    fn rewrite_src(&self, src: &mut Str) {
        if let Some(target) = self.lookup.get(&src.value) {
            *src = string(target, src.span);
        }
    }
}

pub(crate) fn string(value: &str, span: Span) -> Str {
    Str {
        span,
        value: value.into(),
        raw: None,
    }
}

impl VisitMut for EsmRewriter<'_> {
    fn visit_mut_import_decl(&mut self, decl: &mut ImportDecl) {
        self.rewrite_src(&mut decl.src);
    }

    fn visit_mut_export_all(&mut self, export: &mut ExportAll) {
        self.rewrite_src(&mut export.src);
    }

    fn visit_mut_named_export(&mut self, export: &mut NamedExport) {
        if let Some(src) = &mut export.src {
            self.rewrite_src(src);
        }
    }

    fn visit_mut_call_expr(&mut self, call: &mut CallExpr) {
        call.visit_mut_children_with(self);

        if !matches!(call.callee, Callee::Import(_)) {
            return;
        }
        let Some(arg) = call.args.first_mut() else {
            return;
        };
        if arg.spread.is_some() {
            return;
        }
        let Some(value) = string_literal(&arg.expr) else {
            return;
        };
        if let Some(target) = self.lookup.get(&value) {
            let span = arg.expr.span();
            arg.expr = Box::new(Expr::Lit(Lit::Str(string(target, span))));
        }
    }
}
