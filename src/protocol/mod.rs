//! Memcached-style ASCII GET protocol.
//!
//! Recognizes `"get "` and `"gets "` request lines, splits the
//! remainder on single spaces into keys, and formats per-key
//! `VALUE` replies terminated by `END`.

mod errors;

pub use errors::{ProtocolError, ProtocolResult};

use tokio::io::{AsyncWrite, AsyncWriteExt};

const PREFIXES: [&[u8]; 2] = [b"gets ", b"get "];

/// Parses one request line (without its trailing CRLF) into an
/// ordered list of key byte-strings.
///
/// First matching prefix wins; a line matching neither fails with
/// `ProtocolError::InvalidCommand`. An empty key list (e.g. `"get "`
/// with nothing after it, or `"get"` without a trailing space being
/// rejected as no match) is a valid parse.
pub fn parse(line: &[u8]) -> ProtocolResult<Vec<Vec<u8>>> {
    for prefix in PREFIXES {
        if let Some(rest) = line.strip_prefix(prefix) {
            if rest.is_empty() {
                return Ok(Vec::new());
            }
            return Ok(rest.split(|&b| b == b' ').map(|w| w.to_vec()).collect());
        }
    }
    Err(ProtocolError::InvalidCommand(String::from_utf8_lossy(line).into_owned()))
}

/// Writes one `VALUE` record for a hit.
pub async fn reply<W: AsyncWrite + Unpin>(w: &mut W, key: &[u8], value: &[u8]) -> std::io::Result<()> {
    w.write_all(b"VALUE ").await?;
    w.write_all(key).await?;
    w.write_all(b" 0 ").await?;
    w.write_all(value.len().to_string().as_bytes()).await?;
    w.write_all(b"\r\n").await?;
    w.write_all(value).await?;
    w.write_all(b"\r\n").await?;
    Ok(())
}

/// Writes the terminating `END` line.
pub async fn finish<W: AsyncWrite + Unpin>(w: &mut W) -> std::io::Result<()> {
    w.write_all(b"END\r\n").await?;
    Ok(())
}
