//! Per-file worker session.
//!
//! A session holds the file currently loaded into a worker and, once parsed,
//! the cached tree tagged with the grammar it was parsed under. Loading a new
//! file always discards everything held for the previous one.

/// Grammar a tree was parsed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarMode {
    /// ES module grammar with dynamic `import()`.
    Module,
    /// Script grammar with top-level `return`, no module syntax.
    Script,
}

impl std::fmt::Display for GrammarMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Module => write!(f, "module"),
            Self::Script => write!(f, "script"),
        }
    }
}

/// The file a session is working on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSource {
    pub text: String,
    pub filename: String,
    pub production: bool,
}

impl LoadedSource {
    #[must_use]
    pub fn new(text: impl Into<String>, filename: impl Into<String>, production: bool) -> Self {
        Self {
            text: text.into(),
            filename: filename.into(),
            production,
        }
    }
}

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Nothing loaded.
    Empty,
    /// Source loaded, no tree cached.
    Loaded,
    /// A tree for the current source is cached.
    Parsed(GrammarMode),
}

/// Session state owned by exactly one worker.
#[derive(Debug)]
pub struct Session<T> {
    source: Option<LoadedSource>,
    tree: Option<(GrammarMode, T)>,
}

impl<T> Default for Session<T> {
    fn default() -> Self {
        Self {
            source: None,
            tree: None,
        }
    }
}

impl<T> Session<T> {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        match (&self.source, &self.tree) {
            (None, _) => SessionPhase::Empty,
            (Some(_), None) => SessionPhase::Loaded,
            (Some(_), Some((mode, _))) => SessionPhase::Parsed(*mode),
        }
    }

    /// Replace the session with a new file, dropping any cached tree.
    pub fn load(&mut self, source: LoadedSource) {
        self.source = Some(source);
        self.tree = None;
    }

    /// The loaded file, if any.
    pub fn source(&self) -> Option<&LoadedSource> {
        self.source.as_ref()
    }

    /// Remove the cached tree if it was parsed under `mode`.
    ///
    /// A tree cached under the other grammar is dropped, since it cannot be
    /// reused.
    pub fn take_tree(&mut self, mode: GrammarMode) -> Option<T> {
        match self.tree.take() {
            Some((cached, tree)) if cached == mode => Some(tree),
            _ => None,
        }
    }

    /// Cache a tree for the current source.
    pub fn store_tree(&mut self, mode: GrammarMode, tree: T) {
        if self.source.is_some() {
            self.tree = Some((mode, tree));
        }
    }

    /// Borrow the cached tree if it was parsed under `mode`.
    pub fn tree(&self, mode: GrammarMode) -> Option<&T> {
        match &self.tree {
            Some((cached, tree)) if *cached == mode => Some(tree),
            _ => None,
        }
    }

    /// Drop the cached tree, keeping the source.
    pub fn discard_tree(&mut self) {
        self.tree = None;
    }

    /// Return to `Empty`.
    pub fn clear(&mut self) {
        self.source = None;
        self.tree = None;
    }
}
