use clap::ValueEnum;
use dewc_core::{resolve_map, resolve_with_reason, Config, PackageDescriptor, Resolution};
use dewc_proto::{Command, Reply, TransformOutput};
use dewc_worker::{spawn_worker, SwcEngine, WorkerHandle};
use miette::{miette, IntoDiagnostic, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How the input file is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModuleFormat {
    /// CommonJS, compiled into a dew module.
    Cjs,
    /// ES module, import sources rewritten in place.
    Esm,
}

impl ModuleFormat {
    /// Guess the format from the file extension: `.mjs` is ESM, all else CommonJS.
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("mjs") => Self::Esm,
            _ => Self::Cjs,
        }
    }
}

/// Options for the compile command.
#[derive(Debug)]
pub struct CompileOptions {
    pub file: PathBuf,
    pub format: Option<ModuleFormat>,
    pub outfile: Option<PathBuf>,
    pub json: bool,
}

/// Result of compiling one file.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Compiled {
    /// Dependencies reported by the analysis step, in source order.
    pub deps: Vec<String>,
    /// The resolved subset of `deps`.
    pub resolved: BTreeMap<String, String>,
    #[serde(flatten)]
    pub output: TransformOutput,
}

/// Run the compile command.
pub fn run(options: CompileOptions, pkg: &PackageDescriptor, config: &Config) -> Result<()> {
    let file = super::absolute(config, &options.file);
    let source = std::fs::read_to_string(&file)
        .map_err(|e| miette!("Failed to read {}: {}", file.display(), e))?;
    let format = options.format.unwrap_or_else(|| ModuleFormat::detect(&file));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;
    let compiled = runtime.block_on(async {
        let mut handle = spawn_worker(SwcEngine::new).into_diagnostic()?;
        let compiled = compile(&mut handle, pkg, &file, source, format, config.production).await;
        handle.shutdown().into_diagnostic()?;
        compiled
    })?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&compiled).into_diagnostic()?);
        return Ok(());
    }

    match &options.outfile {
        Some(outfile) => {
            let outfile = super::absolute(config, outfile);
            let map_file = PathBuf::from(format!("{}.map", outfile.display()));
            std::fs::write(&outfile, &compiled.output.source)
                .map_err(|e| miette!("Failed to write {}: {}", outfile.display(), e))?;
            std::fs::write(&map_file, &compiled.output.source_map)
                .map_err(|e| miette!("Failed to write {}: {}", map_file.display(), e))?;
            info!(file = %outfile.display(), deps = compiled.deps.len(), "compiled");
        }
        None => print!("{}", compiled.output.source),
    }

    Ok(())
}

/// Compile one file on `handle`.
///
/// Loads the source, asks the worker for its dependencies, resolves them
/// against `pkg` and sends the resulting map back for the transform.
pub async fn compile(
    handle: &mut WorkerHandle,
    pkg: &PackageDescriptor,
    file: &Path,
    source: String,
    format: ModuleFormat,
    production: bool,
) -> Result<Compiled> {
    let filename = file.display().to_string();

    match handle
        .request(Command::load_source(source, filename.clone(), production))
        .await
        .into_diagnostic()?
    {
        Reply::Source => {}
        other => return Err(failure(&filename, other)),
    }

    let analyze = match format {
        ModuleFormat::Cjs => Command::AnalyzeCjs,
        ModuleFormat::Esm => Command::AnalyzeEsm,
    };
    let deps = match handle.request(analyze).await.into_diagnostic()? {
        Reply::Deps { deps } => deps,
        other => return Err(failure(&filename, other)),
    };
    debug!(file = %filename, deps = deps.len(), "analyzed");

    let map = resolve_map(&deps, file, pkg);
    for dep in deps.iter().filter(|d| !map.contains_key(*d)) {
        if let Resolution::Unresolved(reason) = resolve_with_reason(dep, file, pkg) {
            warn!(file = %filename, specifier = %dep, %reason, "unresolved dependency");
        }
    }
    let resolved: BTreeMap<String, String> =
        map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();

    let transform = match format {
        ModuleFormat::Cjs => Command::TransformDew(Some(map)),
        ModuleFormat::Esm => Command::TransformEsm(Some(map)),
    };
    let output = match handle.request(transform).await.into_diagnostic()? {
        Reply::TransformDew(output) | Reply::TransformEsm(output) => output,
        other => return Err(failure(&filename, other)),
    };

    Ok(Compiled {
        deps,
        resolved,
        output,
    })
}

/// Turn an unexpected reply into a diagnostic.
fn failure(filename: &str, reply: Reply) -> miette::Report {
    match reply {
        Reply::SyntaxError { loc, msg } => {
            miette!("{}:{}:{}: {}", filename, loc.line, loc.column, msg)
        }
        Reply::Error(report) => {
            if !report.trace.is_empty() {
                debug!(trace = %report.trace, "worker error trace");
            }
            miette!("Failed to compile {}: {}", filename, report.message)
        }
        other => miette!("Unexpected {} reply for {}", other.kind(), filename),
    }
}
