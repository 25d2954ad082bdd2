#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::new_without_default)]

//! Transform worker for dewc.
//!
//! A worker compiles one file at a time: it receives ordered commands
//! (`load-source`, `analyze-esm`, `analyze-cjs`, `transform-dew`,
//! `transform-esm`), keeps the loaded source and its parse tree between them,
//! and answers each with exactly one reply. See `dewc-proto` for message
//! types.
//!
//! Workers are strictly sequential. Parallelism comes from running several of
//! them, either in-process with [`spawn_worker`] or as `dewc worker` child
//! processes speaking length-prefixed frames over stdio.

pub mod actor;
pub mod engine;
pub mod serve;
pub mod session;
mod source_map;
pub mod worker;

pub use actor::{spawn_worker, WorkerError, WorkerHandle};
pub use engine::{AstEngine, EngineError, SpecifierLookup, SwcEngine};
pub use serve::{serve, serve_stdio};
pub use session::{GrammarMode, LoadedSource, Session, SessionPhase};
pub use worker::{TransformWorker, WorkerFailure};
