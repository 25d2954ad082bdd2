//! AST engine interface.
//!
//! The worker never touches syntax trees directly. It asks an [`AstEngine`]
//! to parse, to list dependencies, and to run one of the two transforms, and
//! only sequences those calls against the session state.

mod deps;
mod dew;
mod esm;
mod swc;

pub use self::swc::{SwcEngine, SwcTree};

use crate::session::{GrammarMode, LoadedSource};
use dewc_proto::{Location, ResolveMap};
use thiserror::Error;

/// Failures raised by an engine.
///
/// `Syntax` is the only location-bearing variant; everything else is an
/// internal failure for the file being processed.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{message} ({}:{})", .loc.line, .loc.column)]
    Syntax { loc: Location, message: String },

    #[error("Failed to parse: {0}")]
    Parse(String),

    #[error("Failed to emit code: {0}")]
    Emit(#[source] std::io::Error),

    #[error("Failed to build source map: {0}")]
    SourceMap(String),

    #[error("Generated code is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl EngineError {
    /// Create a syntax error at a 1-based line and 0-based column.
    pub fn syntax(line: u32, column: u32, message: impl Into<String>) -> Self {
        Self::Syntax {
            loc: Location { line, column },
            message: message.into(),
        }
    }
}

/// Import sources of an ES module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleImports {
    /// Distinct `import`/`export … from` sources in first-occurrence order.
    pub static_sources: Vec<String>,
    /// Literal `import()` arguments in tree order. May repeat.
    pub dynamic: Vec<String>,
}

impl ModuleImports {
    /// Static sources followed by dynamic ones.
    pub fn into_deps(self) -> Vec<String> {
        let mut deps = self.static_sources;
        deps.extend(self.dynamic);
        deps
    }
}

/// Dependency targets of a CommonJS file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CjsDependencies {
    /// Literal `require()` targets.
    pub requires: Vec<String>,
    /// Literal `require.resolve()` targets.
    pub resolves: Vec<String>,
}

impl CjsDependencies {
    /// Both lists merged without duplicates, first occurrence wins.
    pub fn merged(self) -> Vec<String> {
        let mut deps: Vec<String> = Vec::with_capacity(self.requires.len() + self.resolves.len());
        for dep in self.requires.into_iter().chain(self.resolves) {
            if !deps.contains(&dep) {
                deps.push(dep);
            }
        }
        deps
    }
}

/// Generated code and its source map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    pub code: String,
    /// Source map v3 JSON.
    pub source_map: String,
}

/// How a transform renames import specifiers.
#[derive(Debug, Clone, Copy)]
pub enum SpecifierLookup<'a> {
    /// No map was supplied; specifiers are kept as written.
    Passthrough,
    /// Specifiers present in the map are replaced by their target.
    Map(&'a ResolveMap),
}

impl<'a> SpecifierLookup<'a> {
    pub fn from_map(map: Option<&'a ResolveMap>) -> Self {
        map.map_or(Self::Passthrough, Self::Map)
    }

    /// The mapped name, if the map has one.
    pub fn get(&self, specifier: &str) -> Option<&'a str> {
        match self {
            Self::Passthrough => None,
            Self::Map(map) => map
                .get(specifier)
                .map(String::as_str)
                .filter(|target| !target.is_empty()),
        }
    }

    /// The mapped name, falling back to `specifier` itself.
    pub fn resolve<'s>(&self, specifier: &'s str) -> &'s str
    where
        'a: 's,
    {
        self.get(specifier).unwrap_or(specifier)
    }
}

/// External AST engine used by the transform worker.
///
/// Trees are opaque to the worker; it only caches them between commands.
pub trait AstEngine {
    type Tree;

    /// Parse the loaded file under `mode`.
    fn parse(&self, source: &LoadedSource, mode: GrammarMode) -> Result<Self::Tree, EngineError>;

    /// Collect static and dynamic import sources of a module tree.
    fn module_imports(&self, tree: &Self::Tree) -> ModuleImports;

    /// Collect `require` and `require.resolve` targets of a script tree.
    fn cjs_dependencies(&self, tree: &Self::Tree) -> CjsDependencies;

    /// Compile a script tree into a dew module.
    fn transform_dew(
        &self,
        tree: Self::Tree,
        source: &LoadedSource,
        lookup: SpecifierLookup<'_>,
    ) -> Result<Emitted, EngineError>;

    /// Rewrite the import sources of a module tree.
    fn transform_esm(
        &self,
        tree: Self::Tree,
        source: &LoadedSource,
        lookup: SpecifierLookup<'_>,
    ) -> Result<Emitted, EngineError>;
}
