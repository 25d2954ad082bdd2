use dewc_core::{resolve_with_reason, PackageDescriptor, Resolution};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::Path;

/// Resolve result for JSON output.
#[derive(Debug, Serialize)]
struct ResolveResult<'a> {
    specifier: &'a str,
    importer: String,
    resolved: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

/// Run the resolve command.
///
/// Prints the dew name `specifier` maps to when imported from `importer`.
/// An unresolved specifier is reported, not treated as a failure.
pub fn run(specifier: &str, importer: &Path, pkg: &PackageDescriptor, json: bool) -> Result<()> {
    let result = match resolve_with_reason(specifier, importer, pkg) {
        Resolution::Resolved(name) => ResolveResult {
            specifier,
            importer: importer.display().to_string(),
            resolved: Some(name),
            reason: None,
        },
        Resolution::Unresolved(reason) => ResolveResult {
            specifier,
            importer: importer.display().to_string(),
            resolved: None,
            reason: Some(reason.to_string()),
        },
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result).into_diagnostic()?);
    } else {
        match (&result.resolved, &result.reason) {
            (Some(name), _) => println!("{name}"),
            (None, Some(reason)) => println!("(unresolved: {reason})"),
            (None, None) => println!("(unresolved)"),
        }
    }

    Ok(())
}
