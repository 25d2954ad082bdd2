#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Protocol types for the dewc transform worker.
//!
//! This crate defines the command/reply messages exchanged between a compile
//! pipeline and a transform worker. Every message is a `{ "type", "data" }`
//! object; `type` names the command or reply kind in kebab-case.
//!
//! ## Wire format
//! Between processes, messages use length-prefixed JSON:
//! - 4-byte little-endian u32 length prefix
//! - JSON payload bytes

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::io::{self, Read, Write};

/// Protocol schema version. Bump when changing message format.
pub const PROTO_SCHEMA_VERSION: u32 = 1;

/// Specifier → resolved name, as produced by the resolver for one file.
pub type ResolveMap = HashMap<String, String>;

/// A command sent to a transform worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum Command {
    /// Replace the session with a new file.
    #[serde(alias = "source")]
    LoadSource(SourceFile),

    /// List the static and dynamic import sources of an ES module.
    AnalyzeEsm,

    /// List the `require` and `require.resolve` targets of a CommonJS file.
    AnalyzeCjs,

    /// Compile the loaded CommonJS file into a dew module.
    ///
    /// Without a map, specifiers are kept as written.
    TransformDew(#[serde(deserialize_with = "resolve_map_if_object")] Option<ResolveMap>),

    /// Rewrite the import sources of the loaded ES module.
    TransformEsm(#[serde(deserialize_with = "resolve_map_if_object")] Option<ResolveMap>),
}

/// Any `data` that is not an object means "no map". Non-string entries are
/// dropped.
fn resolve_map_if_object<'de, D>(deserializer: D) -> Result<Option<ResolveMap>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Object(map) => Some(
            map.into_iter()
                .filter_map(|(specifier, target)| match target {
                    serde_json::Value::String(target) => Some((specifier, target)),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}

impl Command {
    /// Build a `load-source` command.
    #[must_use]
    pub fn load_source(
        source: impl Into<String>,
        filename: impl Into<String>,
        production: bool,
    ) -> Self {
        Self::LoadSource(SourceFile {
            source: source.into(),
            filename: filename.into(),
            production,
        })
    }

    /// The wire name of this command.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LoadSource(_) => "load-source",
            Self::AnalyzeEsm => "analyze-esm",
            Self::AnalyzeCjs => "analyze-cjs",
            Self::TransformDew(_) => "transform-dew",
            Self::TransformEsm(_) => "transform-esm",
        }
    }
}

/// Payload of `load-source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Full text of the file.
    pub source: String,
    /// Path used for diagnostics and the source map.
    pub filename: String,
    /// Build mode; selects the `process.env.NODE_ENV` substitution.
    #[serde(default)]
    pub production: bool,
}

/// A reply from a transform worker.
///
/// Exactly one reply is produced per command, in command order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum Reply {
    /// Acknowledges `load-source`.
    Source,

    /// Dependency list from an analysis command.
    Deps {
        deps: Vec<String>,
    },

    /// Output of `transform-dew`.
    TransformDew(TransformOutput),

    /// Output of `transform-esm`.
    TransformEsm(TransformOutput),

    /// Malformed input. Recoverable after a fresh `load-source`.
    SyntaxError {
        loc: Location,
        msg: String,
    },

    /// Any other failure. Fatal for the current file.
    Error(ErrorReport),
}

impl Reply {
    /// Create a dependency list reply.
    #[must_use]
    pub fn deps(deps: Vec<String>) -> Self {
        Self::Deps { deps }
    }

    /// Create a syntax error reply.
    #[must_use]
    pub fn syntax_error(line: u32, column: u32, msg: impl Into<String>) -> Self {
        Self::SyntaxError {
            loc: Location { line, column },
            msg: msg.into(),
        }
    }

    /// Create an error reply.
    #[must_use]
    pub fn error(kind: FailureKind, message: impl Into<String>, trace: impl Into<String>) -> Self {
        Self::Error(ErrorReport {
            kind,
            message: message.into(),
            trace: trace.into(),
        })
    }

    /// The wire name of this reply.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Deps { .. } => "deps",
            Self::TransformDew(_) => "transform-dew",
            Self::TransformEsm(_) => "transform-esm",
            Self::SyntaxError { .. } => "syntax-error",
            Self::Error(_) => "error",
        }
    }

    /// Check whether this reply reports a failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::SyntaxError { .. } | Self::Error(_))
    }
}

/// Transformed code with its source map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOutput {
    /// Generated JavaScript.
    pub source: String,
    /// Source map v3, serialized as a JSON string.
    pub source_map: String,
}

/// Position of a syntax error. Lines are 1-based, columns 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

/// Classification of an `error` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The caller broke the protocol contract, e.g. transform with no source.
    Precondition,
    /// Unexpected failure while handling the command.
    Internal,
}

/// Payload of an `error` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: FailureKind,
    pub message: String,
    /// Diagnostic detail: error source chain or panic payload.
    #[serde(default)]
    pub trace: String,
}

/// Encode a frame to bytes with length prefix.
///
/// Format: 4-byte little-endian length + JSON bytes
///
/// # Errors
/// Returns an error if serialization fails.
pub fn encode_frame<T: Serialize>(frame: &T) -> io::Result<Vec<u8>> {
    let json =
        serde_json::to_vec(frame).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let len = u32::try_from(json.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "frame too large"))?;

    let mut buf = Vec::with_capacity(4 + json.len());
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(&json);

    Ok(buf)
}

/// Decode a frame from bytes (without length prefix).
///
/// # Errors
/// Returns an error if deserialization fails.
pub fn decode_frame<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> io::Result<T> {
    serde_json::from_slice(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Write a length-prefixed frame to a writer.
///
/// # Errors
/// Returns an error if encoding or writing fails.
pub fn write_frame<W: Write, T: Serialize>(writer: &mut W, frame: &T) -> io::Result<()> {
    let encoded = encode_frame(frame)?;
    writer.write_all(&encoded)?;
    writer.flush()
}

/// Maximum frame size for sanity checking (16 MiB).
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Read a length-prefixed frame from a reader.
///
/// Returns `Ok(None)` on a clean end of stream before the length prefix.
///
/// # Errors
/// Returns an error if reading or decoding fails, or the stream ends inside
/// a frame.
pub fn read_frame<R: Read, T: for<'de> Deserialize<'de>>(reader: &mut R) -> io::Result<Option<T>> {
    match read_frame_bytes(reader)? {
        Some(bytes) => decode_frame(&bytes).map(Some),
        None => Ok(None),
    }
}

/// Read the payload of one length-prefixed frame without decoding it.
///
/// After a successful read the stream is positioned at the next frame, so a
/// payload that fails to decode does not desynchronize the reader.
///
/// # Errors
/// Returns an error if reading fails, the frame exceeds [`MAX_FRAME_SIZE`],
/// or the stream ends inside a frame.
pub fn read_frame_bytes<R: Read>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    let mut filled = 0;
    while filled < len_buf.len() {
        match reader.read(&mut len_buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    let len = u32::from_le_bytes(len_buf) as usize;

    if len > MAX_FRAME_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame too large: {len} bytes"),
        ));
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(Some(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_proto_schema_version_is_stable() {
        assert_eq!(PROTO_SCHEMA_VERSION, 1);
    }

    #[test]
    fn test_load_source_wire_shape() {
        let cmd = Command::load_source("module.exports = 1;", "/pkg/a.js", true);
        let value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "load-source",
                "data": { "source": "module.exports = 1;", "filename": "/pkg/a.js", "production": true }
            })
        );
    }

    #[test]
    fn test_load_source_accepts_legacy_name() {
        let cmd: Command = serde_json::from_value(json!({
            "type": "source",
            "data": { "source": "x", "filename": "a.js" }
        }))
        .unwrap();
        assert_eq!(cmd, Command::load_source("x", "a.js", false));
    }

    #[test]
    fn test_unit_commands() {
        let cmd: Command = serde_json::from_value(json!({ "type": "analyze-esm" })).unwrap();
        assert_eq!(cmd, Command::AnalyzeEsm);
        let cmd: Command = serde_json::from_value(json!({ "type": "analyze-cjs" })).unwrap();
        assert_eq!(cmd.kind(), "analyze-cjs");
    }

    #[test]
    fn test_transform_with_and_without_map() {
        let cmd: Command = serde_json::from_value(json!({
            "type": "transform-dew",
            "data": { "./a": "./a.dew.js" }
        }))
        .unwrap();
        let Command::TransformDew(Some(map)) = cmd else {
            panic!("expected transform-dew with map");
        };
        assert_eq!(map["./a"], "./a.dew.js");

        let cmd: Command =
            serde_json::from_value(json!({ "type": "transform-esm", "data": null })).unwrap();
        assert_eq!(cmd, Command::TransformEsm(None));
    }

    #[test]
    fn test_transform_non_object_data_is_passthrough() {
        for data in [json!(false), json!("map"), json!(3), json!(["./a"])] {
            let cmd: Command =
                serde_json::from_value(json!({ "type": "transform-dew", "data": data })).unwrap();
            assert_eq!(cmd, Command::TransformDew(None), "{data}");
        }

        let cmd: Command = serde_json::from_value(json!({ "type": "transform-esm" })).unwrap();
        assert_eq!(cmd, Command::TransformEsm(None));
    }

    #[test]
    fn test_transform_map_drops_non_string_targets() {
        let cmd: Command = serde_json::from_value(json!({
            "type": "transform-dew",
            "data": { "./a": "./a.dew.js", "./b": null, "./c": 1 }
        }))
        .unwrap();
        let Command::TransformDew(Some(map)) = cmd else {
            panic!("expected transform-dew with map");
        };
        assert_eq!(map.len(), 1);
        assert_eq!(map["./a"], "./a.dew.js");
    }

    #[test]
    fn test_read_frame_bytes_keeps_stream_in_sync() {
        let mut buf = Vec::new();
        let garbage = br#"{"type":"nope"}"#;
        buf.extend_from_slice(&u32::try_from(garbage.len()).unwrap().to_le_bytes());
        buf.extend_from_slice(garbage);
        write_frame(&mut buf, &Command::AnalyzeCjs).unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let bytes = read_frame_bytes(&mut cursor).unwrap().unwrap();
        assert!(decode_frame::<Command>(&bytes).is_err());
        let next: Option<Command> = read_frame(&mut cursor).unwrap();
        assert_eq!(next, Some(Command::AnalyzeCjs));
    }

    #[test]
    fn test_reply_wire_shapes() {
        assert_eq!(
            serde_json::to_value(Reply::deps(vec!["./a".into()])).unwrap(),
            json!({ "type": "deps", "data": { "deps": ["./a"] } })
        );
        assert_eq!(
            serde_json::to_value(Reply::syntax_error(1, 9, "Unexpected token")).unwrap(),
            json!({
                "type": "syntax-error",
                "data": { "loc": { "line": 1, "column": 9 }, "msg": "Unexpected token" }
            })
        );
        assert_eq!(
            serde_json::to_value(Reply::TransformDew(TransformOutput {
                source: "code".into(),
                source_map: "{}".into(),
            }))
            .unwrap(),
            json!({ "type": "transform-dew", "data": { "source": "code", "sourceMap": "{}" } })
        );
        assert_eq!(
            serde_json::to_value(Reply::error(FailureKind::Precondition, "no source", "")).unwrap(),
            json!({
                "type": "error",
                "data": { "kind": "precondition", "message": "no source", "trace": "" }
            })
        );
    }

    #[test]
    fn test_reply_kind_matches_wire_name() {
        let replies = [
            Reply::Source,
            Reply::deps(vec![]),
            Reply::syntax_error(1, 0, "x"),
            Reply::error(FailureKind::Internal, "x", "y"),
        ];
        for reply in replies {
            let value = serde_json::to_value(&reply).unwrap();
            assert_eq!(value["type"], reply.kind());
        }
    }

    #[test]
    fn test_is_failure() {
        assert!(!Reply::Source.is_failure());
        assert!(Reply::syntax_error(1, 0, "x").is_failure());
        assert!(Reply::error(FailureKind::Internal, "x", "").is_failure());
    }

    #[test]
    fn test_write_read_frames() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &Command::AnalyzeCjs).unwrap();
        write_frame(&mut buf, &Command::TransformDew(None)).unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let first: Option<Command> = read_frame(&mut cursor).unwrap();
        let second: Option<Command> = read_frame(&mut cursor).unwrap();
        let end: Option<Command> = read_frame(&mut cursor).unwrap();

        assert_eq!(first, Some(Command::AnalyzeCjs));
        assert_eq!(second, Some(Command::TransformDew(None)));
        assert_eq!(end, None);
    }

    #[test]
    fn test_read_frame_truncated() {
        let encoded = encode_frame(&Command::AnalyzeEsm).unwrap();
        let mut cursor = std::io::Cursor::new(&encoded[..encoded.len() - 1]);
        let err = read_frame::<_, Command>(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        let mut cursor = std::io::Cursor::new(&encoded[..2]);
        let err = read_frame::<_, Command>(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_read_frame_rejects_oversized() {
        let len = u32::try_from(MAX_FRAME_SIZE + 1).unwrap();
        let mut cursor = std::io::Cursor::new(len.to_le_bytes().to_vec());
        let err = read_frame::<_, Command>(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
