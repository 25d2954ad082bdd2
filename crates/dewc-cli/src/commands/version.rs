use dewc_core::version::version_string;
use dewc_core::VERSION;
use dewc_proto::PROTO_SCHEMA_VERSION;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

#[derive(Serialize)]
struct VersionInfo {
    version: &'static str,
    protocol: u32,
}

pub fn run(json: bool) -> Result<()> {
    if json {
        let info = VersionInfo {
            version: VERSION,
            protocol: PROTO_SCHEMA_VERSION,
        };
        println!("{}", serde_json::to_string(&info).into_diagnostic()?);
    } else {
        println!("{}", version_string());
    }
    Ok(())
}
