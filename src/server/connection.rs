// Connection handling module
// Serves one accepted TCP connection with hyper HTTP/1.1

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::handler::{self, ServerContext};
use crate::logger;

/// Hand an accepted connection off to its own task
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    context: &Arc<ServerContext>,
) {
    handle_connection(stream, peer_addr, Arc::clone(context));
}

/// Serve a single connection in a spawned task.
///
/// Wraps the stream in `TokioIo`, enables HTTP/1.1 keep-alive and serves
/// requests through the static file handler. Connection-level errors are
/// logged and do not affect the accept loop.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    context: Arc<ServerContext>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let conn = http1::Builder::new().keep_alive(true).serve_connection(
            io,
            service_fn(move |req| {
                let context = Arc::clone(&context);
                async move { handler::handle_request(req, peer_addr, context).await }
            }),
        );

        if let Err(err) = conn.await {
            logger::log_connection_error(&err);
        }
    });
}
