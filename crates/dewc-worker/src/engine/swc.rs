//! SWC-backed AST engine.
//!
//! Every parse gets its own `SourceMap` and comment store, kept with the
//! tree so the transforms can emit code and source maps later without any
//! engine-level state. SWC's `Lrc` is not `Send`, so trees stay on the thread
//! that parsed them.

#![allow(clippy::default_trait_access)]

use super::deps;
use super::dew::{DewRewriter, EPILOGUE};
use super::esm::EsmRewriter;
use super::{AstEngine, CjsDependencies, Emitted, EngineError, ModuleImports, SpecifierLookup};
use crate::session::{GrammarMode, LoadedSource};
use crate::source_map;
use std::path::PathBuf;
use swc_common::{
    comments::SingleThreadedComments, sync::Lrc, FileName, Globals, Mark, SourceMap, Spanned,
    SyntaxContext, GLOBALS,
};
use swc_ecma_ast::{EsVersion, Program};
use swc_ecma_codegen::{text_writer::JsWriter, Emitter};
use swc_ecma_parser::{error::Error as ParseError, lexer::Lexer, EsSyntax, Parser, StringInput, Syntax};
use swc_ecma_transforms_base::resolver;
use swc_ecma_visit::{FoldWith, VisitMutWith};

/// A parsed file together with the state needed to print it again.
pub struct SwcTree {
    cm: Lrc<SourceMap>,
    comments: SingleThreadedComments,
    program: Program,
    /// Context carried by identifiers with no binding in the file.
    unresolved: SyntaxContext,
}

/// SWC implementation of [`AstEngine`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SwcEngine;

impl SwcEngine {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl AstEngine for SwcEngine {
    type Tree = SwcTree;

    fn parse(&self, source: &LoadedSource, mode: GrammarMode) -> Result<SwcTree, EngineError> {
        let cm: Lrc<SourceMap> = Default::default();
        let fm = cm.new_source_file(
            Lrc::new(FileName::Real(PathBuf::from(&source.filename))),
            source.text.clone(),
        );

        let syntax = Syntax::Es(EsSyntax {
            allow_return_outside_function: mode == GrammarMode::Script,
            ..Default::default()
        });
        let comments = SingleThreadedComments::default();

        let program = {
            let lexer = Lexer::new(
                syntax,
                EsVersion::EsNext,
                StringInput::from(&*fm),
                Some(&comments),
            );
            let mut parser = Parser::new_from(lexer);

            let parsed = match mode {
                GrammarMode::Module => parser.parse_module().map(Program::Module),
                GrammarMode::Script => parser.parse_script().map(Program::Script),
            };
            let program = parsed.map_err(|e| syntax_error(&cm, &e))?;

            if let Some(e) = parser.take_errors().first() {
                return Err(syntax_error(&cm, e));
            }
            program
        };

        let (program, unresolved) = GLOBALS.set(&Globals::default(), || {
            let unresolved_mark = Mark::new();
            let top_level_mark = Mark::new();
            let program = program.fold_with(&mut resolver(unresolved_mark, top_level_mark, false));
            (program, SyntaxContext::empty().apply_mark(unresolved_mark))
        });

        Ok(SwcTree {
            cm,
            comments,
            program,
            unresolved,
        })
    }

    fn module_imports(&self, tree: &SwcTree) -> ModuleImports {
        deps::module_imports(&tree.program)
    }

    fn cjs_dependencies(&self, tree: &SwcTree) -> CjsDependencies {
        deps::cjs_dependencies(&tree.program, tree.unresolved)
    }

    fn transform_dew(
        &self,
        tree: SwcTree,
        source: &LoadedSource,
        lookup: SpecifierLookup<'_>,
    ) -> Result<Emitted, EngineError> {
        let SwcTree {
            cm,
            comments,
            program,
            unresolved,
        } = tree;
        let Program::Script(mut script) = program else {
            return Err(EngineError::Parse(
                "dew transform requires a script parse".to_string(),
            ));
        };

        let mut rewriter = DewRewriter::new(&script, lookup, source.production, unresolved);
        rewriter.rewrite(&mut script);
        let prologue = rewriter.prologue();

        let tree = SwcTree {
            cm,
            comments,
            program: Program::Script(script),
            unresolved,
        };
        let (body, mut map) = emit(&tree)?;

        let mut code = prologue;
        let prologue_lines = code.matches('\n').count();
        code.push_str(&body);
        if !code.ends_with('\n') {
            code.push('\n');
        }
        code.push_str(EPILOGUE);

        source_map::prepend_lines(&mut map, prologue_lines);
        source_map::set_file(&mut map, &format!("{}?dew", source.filename));

        Ok(Emitted {
            code,
            source_map: map.to_string(),
        })
    }

    fn transform_esm(
        &self,
        mut tree: SwcTree,
        source: &LoadedSource,
        lookup: SpecifierLookup<'_>,
    ) -> Result<Emitted, EngineError> {
        tree.program.visit_mut_with(&mut EsmRewriter::new(lookup));

        let (code, mut map) = emit(&tree)?;
        source_map::set_file(&mut map, &source.filename);

        Ok(Emitted {
            code,
            source_map: map.to_string(),
        })
    }
}

/// Convert a parser error into a located syntax error.
///
/// Errors without a real span cannot be located and become plain parse
/// failures.
fn syntax_error(cm: &SourceMap, err: &ParseError) -> EngineError {
    let span = err.span();
    let message = err.kind().msg().into_owned();
    if span.is_dummy() {
        return EngineError::Parse(message);
    }
    let loc = cm.lookup_char_pos(span.lo);
    EngineError::syntax(
        u32::try_from(loc.line).unwrap_or(u32::MAX),
        u32::try_from(loc.col.0).unwrap_or(u32::MAX),
        message,
    )
}

/// Print a tree, returning the code and its raw source map.
fn emit(tree: &SwcTree) -> Result<(String, serde_json::Value), EngineError> {
    let mut buf = Vec::new();
    let mut src_map_buf = Vec::new();

    {
        let writer = JsWriter::new(tree.cm.clone(), "\n", &mut buf, Some(&mut src_map_buf));

        let mut emitter = Emitter {
            cfg: swc_ecma_codegen::Config::default().with_target(EsVersion::EsNext),
            cm: tree.cm.clone(),
            comments: Some(&tree.comments),
            wr: writer,
        };

        match &tree.program {
            Program::Module(module) => emitter.emit_module(module),
            Program::Script(script) => emitter.emit_script(script),
        }
        .map_err(EngineError::Emit)?;
    }

    let code = String::from_utf8(buf)?;

    let srcmap = tree.cm.build_source_map(&src_map_buf);
    let mut map_buf = Vec::new();
    srcmap
        .to_writer(&mut map_buf)
        .map_err(|e| EngineError::SourceMap(e.to_string()))?;
    let map = serde_json::from_slice(&map_buf).map_err(|e| EngineError::SourceMap(e.to_string()))?;

    Ok((code, map))
}
