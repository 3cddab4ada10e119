//! Accept loop and per-connection request loop.
//!
//! The server's only synchronization with the reload pipeline is
//! through `Storage`'s atomic pointer swap: a reload in progress never
//! blocks a reader, and a reader never delays a reload.

mod errors;

pub use errors::{ServerError, ServerResult};

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tokio::net::{TcpListener, UnixListener};

use crate::observability::Logger;
use crate::protocol;
use crate::storage::Storage;

/// Which socket family to listen on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Tcp,
    Unix,
}

/// Binds `addr` on `network` and serves requests against `storage`
/// forever. Returns only on a bind/listen failure; accept errors and
/// per-connection errors are logged and otherwise swallowed.
pub async fn serve(
    network: Network,
    addr: &str,
    storage: Arc<dyn Storage>,
    logger: Arc<Logger>,
) -> ServerResult<()> {
    match network {
        Network::Tcp => serve_tcp(addr, storage, logger).await,
        Network::Unix => serve_unix(addr, storage, logger).await,
    }
}

async fn serve_tcp(addr: &str, storage: Arc<dyn Storage>, logger: Arc<Logger>) -> ServerResult<()> {
    let listener = TcpListener::bind(addr).await.map_err(|source| ServerError::Listen {
        addr: addr.to_string(),
        source,
    })?;
    logger.info("SERVER_LISTENING", &[("network", "tcp"), ("addr", addr)]);
    serve_with_listener(listener, storage, logger).await;
    Ok(())
}

/// Runs the TCP accept loop against an already-bound listener. Exposed
/// so tests (and callers binding to an ephemeral port) can obtain the
/// bound address before the accept loop takes over.
pub async fn serve_with_listener(listener: TcpListener, storage: Arc<dyn Storage>, logger: Arc<Logger>) {
    loop {
        match listener.accept().await {
            Ok((stream, _peer)) => {
                let storage = storage.clone();
                let logger = logger.clone();
                tokio::spawn(async move { handle_conn(stream, storage, logger).await });
            }
            Err(e) => logger.error("SERVER_ACCEPT_FAILED", &[("error", &e.to_string())]),
        }
    }
}

async fn serve_unix(addr: &str, storage: Arc<dyn Storage>, logger: Arc<Logger>) -> ServerResult<()> {
    let _ = std::fs::remove_file(addr);
    let listener = UnixListener::bind(addr).map_err(|source| ServerError::Listen {
        addr: addr.to_string(),
        source,
    })?;
    logger.info("SERVER_LISTENING", &[("network", "unix"), ("addr", addr)]);

    loop {
        match listener.accept().await {
            Ok((stream, _peer)) => {
                let storage = storage.clone();
                let logger = logger.clone();
                tokio::spawn(async move { handle_conn(stream, storage, logger).await });
            }
            Err(e) => logger.error("SERVER_ACCEPT_FAILED", &[("error", &e.to_string())]),
        }
    }
}

/// Runs the request loop for one connection until EOF or an I/O
/// error, or the connection is closed by the peer.
async fn handle_conn<C>(conn: C, storage: Arc<dyn Storage>, logger: Arc<Logger>)
where
    C: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(conn);
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        line.clear();
        let n = match reader.read_until(b'\n', &mut line).await {
            Ok(0) => return, // EOF
            Ok(n) => n,
            Err(e) => {
                logger.error("SERVER_READ_FAILED", &[("error", &e.to_string())]);
                return;
            }
        };
        let _ = n;

        // Strip trailing LF and an optional preceding CR.
        if line.last() == Some(&b'\n') {
            line.pop();
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }

        match protocol::parse(&line) {
            Ok(keys) => {
                for key in &keys {
                    if let Some(value) = storage.get(key) {
                        if protocol::reply(&mut writer, key, &value).await.is_err() {
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                logger.warn("SERVER_PARSE_FAILED", &[("error", &e.to_string())]);
                // Still emit the terminator below: every request yields
                // exactly one END line, even an unrecognized one.
            }
        }

        if protocol::finish(&mut writer).await.is_err() {
            return;
        }
        if tokio::io::AsyncWriteExt::flush(&mut writer).await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::Severity;
    use crate::storage::JsonStorage;
    use std::collections::HashMap;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn storage_with(entries: &[(&str, &str)]) -> Arc<dyn Storage> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let mut map = HashMap::new();
        for (k, v) in entries {
            map.insert(k.to_string(), v.to_string());
        }
        std::fs::write(&path, serde_json::to_vec(&map).unwrap()).unwrap();

        let storage = JsonStorage::new(false);
        storage.load(&path).await.unwrap();
        // Keep the tempdir alive for the duration of the test by leaking it;
        // the snapshot has already been parsed into memory by this point.
        std::mem::forget(dir);
        Arc::new(storage)
    }

    async fn spawn_test_server(storage: Arc<dyn Storage>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let logger = Arc::new(Logger::stderr(Severity::Trace));

        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let storage = storage.clone();
                let logger = logger.clone();
                tokio::spawn(async move { handle_conn(stream, storage, logger).await });
            }
        });
        addr
    }

    /// Reads until the response's trailing `END\r\n`, since a single
    /// `read()` call is not guaranteed to return a whole reply.
    async fn read_reply(conn: &mut TcpStream) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 256];
        while !buf.ends_with(b"END\r\n") {
            let n = conn.read(&mut chunk).await.unwrap();
            assert_ne!(n, 0, "connection closed before END\\r\\n");
            buf.extend_from_slice(&chunk[..n]);
        }
        buf
    }

    #[tokio::test]
    async fn hit_and_miss_and_multi_key() {
        let storage = storage_with(&[("hoge", "hoge!"), ("foo", "foo!"), ("bar", "bar!!")]).await;
        let addr = spawn_test_server(storage).await;

        let mut conn = TcpStream::connect(&addr).await.unwrap();
        conn.write_all(b"get hoge\r\n").await.unwrap();
        assert_eq!(read_reply(&mut conn).await, b"VALUE hoge 0 5\r\nhoge!\r\nEND\r\n");

        conn.write_all(b"get hogehoge\r\n").await.unwrap();
        assert_eq!(read_reply(&mut conn).await, b"END\r\n");

        conn.write_all(b"get foo bar\r\n").await.unwrap();
        assert_eq!(
            read_reply(&mut conn).await,
            b"VALUE foo 0 4\r\nfoo!\r\nVALUE bar 0 5\r\nbar!!\r\nEND\r\n"
        );
    }

    #[tokio::test]
    async fn unrecognized_command_still_terminates() {
        let storage = storage_with(&[]).await;
        let addr = spawn_test_server(storage).await;

        let mut conn = TcpStream::connect(&addr).await.unwrap();
        conn.write_all(b"ping\r\n").await.unwrap();
        assert_eq!(read_reply(&mut conn).await, b"END\r\n");
    }

    #[tokio::test]
    async fn per_connection_ordering_for_three_keys() {
        let storage = storage_with(&[("a", "A"), ("c", "C")]).await;
        let addr = spawn_test_server(storage).await;

        let mut conn = TcpStream::connect(&addr).await.unwrap();
        conn.write_all(b"get a b c\r\n").await.unwrap();
        assert_eq!(
            read_reply(&mut conn).await,
            b"VALUE a 0 1\r\nA\r\nVALUE c 0 1\r\nC\r\nEND\r\n"
        );
    }
}
