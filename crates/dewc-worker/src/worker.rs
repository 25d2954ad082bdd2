//! Transform worker command handling.
//!
//! [`TransformWorker::handle`] runs one command to completion against the
//! session and always produces exactly one reply; failures never escape as
//! errors or panics.

use crate::engine::{AstEngine, EngineError, SpecifierLookup, SwcEngine};
use crate::session::{GrammarMode, LoadedSource, Session, SessionPhase};
use crate::source_map;
use dewc_proto::{Command, FailureKind, Location, ResolveMap, Reply, SourceFile, TransformOutput};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

/// Message of the precondition failure for commands that need a source.
pub const NO_SOURCE_MESSAGE: &str = "Source not passed to worker.";

/// Why a command could not produce its normal reply.
#[derive(Debug, thiserror::Error)]
pub enum WorkerFailure {
    #[error("Source not passed to worker.")]
    NoSource,

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Failed to embed source content: {0}")]
    SourceMap(#[from] serde_json::Error),
}

impl WorkerFailure {
    /// Convert into the reply reported to the caller.
    pub fn into_reply(self) -> Reply {
        match self {
            Self::NoSource => Reply::error(FailureKind::Precondition, NO_SOURCE_MESSAGE, ""),
            Self::Engine(EngineError::Syntax { loc, message }) => {
                let Location { line, column } = loc;
                Reply::syntax_error(line, column, message)
            }
            other => {
                let trace = error_trace(&other);
                Reply::error(FailureKind::Internal, other.to_string(), trace)
            }
        }
    }
}

/// Render an error and its source chain, one cause per line.
fn error_trace(err: &dyn std::error::Error) -> String {
    let mut trace = format!("Error: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        trace.push_str("\n  caused by: ");
        trace.push_str(&cause.to_string());
        source = cause.source();
    }
    trace
}

/// A single-file transform worker.
///
/// Not `Sync`: one worker handles one command at a time. Run several workers
/// for parallelism.
pub struct TransformWorker<E: AstEngine = SwcEngine> {
    engine: E,
    session: Session<E::Tree>,
}

impl TransformWorker<SwcEngine> {
    /// Create a worker backed by SWC.
    #[must_use]
    pub fn swc() -> Self {
        Self::new(SwcEngine::new())
    }
}

impl<E: AstEngine> TransformWorker<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            session: Session::new(),
        }
    }

    /// Current session phase.
    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    /// Handle one command.
    pub fn handle(&mut self, command: Command) -> Reply {
        let kind = command.kind();
        debug!(
            command = kind,
            filename = self.session.source().map_or("", |s| s.filename.as_str()),
            "handling command"
        );

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(command)));

        match result {
            Ok(Ok(reply)) => reply,
            Ok(Err(failure)) => {
                let reply = failure.into_reply();
                match &reply {
                    Reply::SyntaxError { loc, msg } => {
                        warn!(command = kind, line = loc.line, column = loc.column, error = %msg, "syntax error");
                    }
                    Reply::Error(report) => {
                        warn!(command = kind, failure = ?report.kind, error = %report.message, "command failed");
                    }
                    _ => {}
                }
                reply
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(command = kind, error = %message, "command panicked");
                self.session.discard_tree();
                Reply::error(
                    FailureKind::Internal,
                    format!("{kind} panicked: {message}"),
                    format!("panic: {message}"),
                )
            }
        }
    }

    fn dispatch(&mut self, command: Command) -> Result<Reply, WorkerFailure> {
        match command {
            Command::LoadSource(SourceFile {
                source,
                filename,
                production,
            }) => {
                self.session
                    .load(LoadedSource::new(source, filename, production));
                Ok(Reply::Source)
            }
            Command::AnalyzeEsm => {
                self.ensure_parsed(GrammarMode::Module)?;
                let tree = self.cached_tree(GrammarMode::Module)?;
                let deps = self.engine.module_imports(tree).into_deps();
                Ok(Reply::deps(deps))
            }
            Command::AnalyzeCjs => {
                self.ensure_parsed(GrammarMode::Script)?;
                let tree = self.cached_tree(GrammarMode::Script)?;
                let deps = self.engine.cjs_dependencies(tree).merged();
                Ok(Reply::deps(deps))
            }
            Command::TransformDew(map) => self
                .transform(GrammarMode::Script, map.as_ref())
                .map(Reply::TransformDew),
            Command::TransformEsm(map) => self
                .transform(GrammarMode::Module, map.as_ref())
                .map(Reply::TransformEsm),
        }
    }

    /// Parse the loaded source under `mode` unless such a tree is cached.
    fn ensure_parsed(&mut self, mode: GrammarMode) -> Result<(), WorkerFailure> {
        if self.session.phase() == SessionPhase::Parsed(mode) {
            return Ok(());
        }
        let source = self.session.source().ok_or(WorkerFailure::NoSource)?;
        let tree = self.engine.parse(source, mode)?;
        self.session.store_tree(mode, tree);
        Ok(())
    }

    fn cached_tree(&self, mode: GrammarMode) -> Result<&E::Tree, WorkerFailure> {
        self.session.tree(mode).ok_or(WorkerFailure::NoSource)
    }

    /// Run a transform and consume the session.
    ///
    /// On success the session returns to `Empty`; on failure the tree is gone
    /// but the source stays loaded.
    fn transform(
        &mut self,
        mode: GrammarMode,
        map: Option<&ResolveMap>,
    ) -> Result<TransformOutput, WorkerFailure> {
        let source = self.session.source().cloned().ok_or(WorkerFailure::NoSource)?;
        let tree = match self.session.take_tree(mode) {
            Some(tree) => tree,
            None => self.engine.parse(&source, mode)?,
        };

        let lookup = SpecifierLookup::from_map(map);
        let emitted = match mode {
            GrammarMode::Script => self.engine.transform_dew(tree, &source, lookup)?,
            GrammarMode::Module => self.engine.transform_esm(tree, &source, lookup)?,
        };
        let source_map = source_map::embed_source(&emitted.source_map, &source.text)?;

        self.session.clear();
        Ok(TransformOutput {
            source: emitted.code,
            source_map,
        })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CjsDependencies, Emitted, ModuleImports};

    fn load(text: &str) -> Command {
        Command::load_source(text, "/pkg/lib/index.js", false)
    }

    #[test]
    fn test_load_source_acknowledges() {
        let mut worker = TransformWorker::swc();
        assert_eq!(worker.handle(load("x")), Reply::Source);
        assert_eq!(worker.phase(), SessionPhase::Loaded);
    }

    #[test]
    fn test_analyze_esm_lists_static_sources() {
        let mut worker = TransformWorker::swc();
        worker.handle(load("import a from './a'; import b from './b'; import c from './a';"));
        assert_eq!(
            worker.handle(Command::AnalyzeEsm),
            Reply::deps(vec!["./a".into(), "./b".into()])
        );
        assert_eq!(worker.phase(), SessionPhase::Parsed(GrammarMode::Module));
    }

    #[test]
    fn test_transform_before_load_is_precondition_failure() {
        let mut worker = TransformWorker::swc();
        for command in [Command::TransformDew(None), Command::TransformEsm(None)] {
            let Reply::Error(report) = worker.handle(command) else {
                panic!("expected error reply");
            };
            assert_eq!(report.kind, FailureKind::Precondition);
            assert_eq!(report.message, NO_SOURCE_MESSAGE);
        }
    }

    #[test]
    fn test_analyze_before_load_is_precondition_failure() {
        let mut worker = TransformWorker::swc();
        let reply = worker.handle(Command::AnalyzeCjs);
        assert!(matches!(
            reply,
            Reply::Error(ref report) if report.kind == FailureKind::Precondition
        ));
    }

    #[test]
    fn test_syntax_error_has_location() {
        let mut worker = TransformWorker::swc();
        worker.handle(load("function("));
        let Reply::SyntaxError { loc, msg } = worker.handle(Command::AnalyzeCjs) else {
            panic!("expected syntax error");
        };
        assert_eq!(loc.line, 1);
        assert!(!msg.is_empty());
        assert_eq!(worker.phase(), SessionPhase::Loaded);
    }

    #[test]
    fn test_syntax_error_recovers_after_reload() {
        let mut worker = TransformWorker::swc();
        worker.handle(load("function("));
        assert!(worker.handle(Command::AnalyzeCjs).is_failure());

        worker.handle(load("require('./a');"));
        assert_eq!(
            worker.handle(Command::AnalyzeCjs),
            Reply::deps(vec!["./a".into()])
        );
    }

    #[test]
    fn test_transform_dew_consumes_session() {
        let mut worker = TransformWorker::swc();
        let text = "var a = require('./a');\nmodule.exports = a;\n";
        worker.handle(load(text));
        assert_eq!(
            worker.handle(Command::AnalyzeCjs),
            Reply::deps(vec!["./a".into()])
        );

        let map: ResolveMap = [("./a".to_string(), "./a.dew.js".to_string())].into();
        let Reply::TransformDew(output) = worker.handle(Command::TransformDew(Some(map))) else {
            panic!("expected transform-dew reply");
        };
        assert!(output.source.contains("from \"./a.dew.js\""));

        let map: serde_json::Value = serde_json::from_str(&output.source_map).unwrap();
        assert_eq!(map["sourcesContent"], serde_json::json!([text]));
        assert_eq!(map["file"], "/pkg/lib/index.js?dew");

        assert_eq!(worker.phase(), SessionPhase::Empty);
        let Reply::Error(report) = worker.handle(Command::TransformDew(None)) else {
            panic!("expected error reply");
        };
        assert_eq!(report.kind, FailureKind::Precondition);
    }

    #[test]
    fn test_transform_esm_reparses_module_tree() {
        let mut worker = TransformWorker::swc();
        worker.handle(load("const m = import('./m');"));
        worker.handle(Command::AnalyzeEsm);

        let map: ResolveMap = [("./m".to_string(), "./m.dew.js".to_string())].into();
        let Reply::TransformEsm(output) = worker.handle(Command::TransformEsm(Some(map))) else {
            panic!("expected transform-esm reply");
        };
        assert!(output.source.contains("import(\"./m.dew.js\")"));
        assert_eq!(worker.phase(), SessionPhase::Empty);
    }

    #[test]
    fn test_failed_transform_keeps_source() {
        let mut worker = TransformWorker::swc();
        worker.handle(load("export default 1;"));
        let reply = worker.handle(Command::TransformDew(None));
        assert!(matches!(reply, Reply::SyntaxError { .. }));
        assert_eq!(worker.phase(), SessionPhase::Loaded);
    }

    #[test]
    fn test_mode_switch_reparses() {
        let mut worker = TransformWorker::swc();
        worker.handle(load("require('./a');"));
        worker.handle(Command::AnalyzeCjs);
        assert_eq!(worker.phase(), SessionPhase::Parsed(GrammarMode::Script));

        assert_eq!(
            worker.handle(Command::AnalyzeEsm),
            Reply::deps(vec![])
        );
        assert_eq!(worker.phase(), SessionPhase::Parsed(GrammarMode::Module));
    }

    struct PanickingEngine;

    impl AstEngine for PanickingEngine {
        type Tree = ();

        fn parse(&self, _: &LoadedSource, _: GrammarMode) -> Result<(), EngineError> {
            Ok(())
        }

        fn module_imports(&self, _: &()) -> ModuleImports {
            panic!("visitor exploded")
        }

        fn cjs_dependencies(&self, _: &()) -> CjsDependencies {
            CjsDependencies::default()
        }

        fn transform_dew(
            &self,
            _: (),
            _: &LoadedSource,
            _: SpecifierLookup<'_>,
        ) -> Result<Emitted, EngineError> {
            Err(EngineError::SourceMap("broken".into()))
        }

        fn transform_esm(
            &self,
            _: (),
            _: &LoadedSource,
            _: SpecifierLookup<'_>,
        ) -> Result<Emitted, EngineError> {
            Ok(Emitted {
                code: String::new(),
                source_map: "not json".into(),
            })
        }
    }

    #[test]
    fn test_panic_becomes_internal_error() {
        let mut worker = TransformWorker::new(PanickingEngine);
        worker.handle(load("x"));
        let Reply::Error(report) = worker.handle(Command::AnalyzeEsm) else {
            panic!("expected error reply");
        };
        assert_eq!(report.kind, FailureKind::Internal);
        assert!(report.message.contains("visitor exploded"));

        assert_eq!(worker.handle(Command::AnalyzeCjs), Reply::deps(vec![]));
    }

    #[test]
    fn test_engine_failure_is_internal_with_trace() {
        let mut worker = TransformWorker::new(PanickingEngine);
        worker.handle(load("x"));
        let Reply::Error(report) = worker.handle(Command::TransformDew(None)) else {
            panic!("expected error reply");
        };
        assert_eq!(report.kind, FailureKind::Internal);
        assert!(report.trace.contains("broken"));
    }

    #[test]
    fn test_invalid_source_map_is_internal() {
        let mut worker = TransformWorker::new(PanickingEngine);
        worker.handle(load("x"));
        let Reply::Error(report) = worker.handle(Command::TransformEsm(None)) else {
            panic!("expected error reply");
        };
        assert_eq!(report.kind, FailureKind::Internal);
        assert!(report.message.starts_with("Failed to embed source content"));
    }
}
