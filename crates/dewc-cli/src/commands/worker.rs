use dewc_worker::serve_stdio;
use miette::{IntoDiagnostic, Result};
use tracing::debug;

/// Run the worker command.
///
/// Serves the worker protocol on stdin/stdout until stdin closes. The parent
/// process owns scheduling; one `dewc worker` handles one file at a time.
pub fn run() -> Result<()> {
    debug!(pid = std::process::id(), "worker ready");
    let handled = serve_stdio().into_diagnostic()?;
    debug!(handled, "worker exiting");
    Ok(())
}
