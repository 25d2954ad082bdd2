//! Frame transport for running a worker as a child process.
//!
//! Commands arrive as length-prefixed JSON frames on the reader and each
//! reply is written as one frame before the next command is read. A frame
//! that does not decode to a command is answered with a precondition error.
//! A clean end of input stops the loop; I/O errors, truncated frames and
//! oversized frames end it with an error.

use crate::engine::AstEngine;
use crate::worker::TransformWorker;
use dewc_proto::{decode_frame, read_frame_bytes, write_frame, Command, FailureKind, Reply};
use std::io::{self, Read, Write};
use tracing::{debug, warn};

/// Serve a worker over `reader`/`writer` until the input ends.
///
/// Returns the number of frames answered.
pub fn serve<E, R, W>(worker: &mut TransformWorker<E>, reader: &mut R, writer: &mut W) -> io::Result<usize>
where
    E: AstEngine,
    R: Read,
    W: Write,
{
    let mut handled = 0;
    loop {
        let bytes = match read_frame_bytes(reader) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "unreadable frame");
                return Err(e);
            }
        };
        let reply = match decode_frame::<Command>(&bytes) {
            Ok(command) => worker.handle(command),
            Err(e) => {
                warn!(error = %e, "invalid command");
                Reply::error(FailureKind::Precondition, format!("Invalid command: {e}"), "")
            }
        };
        write_frame(writer, &reply)?;
        handled += 1;
    }
    debug!(handled, "input closed");
    Ok(handled)
}

/// Serve an SWC-backed worker on stdin/stdout.
pub fn serve_stdio() -> io::Result<usize> {
    let mut worker = TransformWorker::swc();
    let stdin = io::stdin();
    let stdout = io::stdout();
    serve(&mut worker, &mut stdin.lock(), &mut stdout.lock())
}
