// Server loop module
// Accepts connections until a shutdown notification arrives

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::accept_connection;
use crate::handler::ServerContext;
use crate::logger;

/// Run the accept loop until `shutdown` is notified.
///
/// Each accepted connection is served in its own task. When the shutdown
/// notification arrives the loop exits and the listener is dropped, which
/// closes the socket; connections already accepted finish on their own.
pub async fn run_accept_loop(
    listener: TcpListener,
    context: Arc<ServerContext>,
    shutdown: Arc<Notify>,
) {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &context);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = shutdown.notified() => {
                break;
            }
        }
    }

    drop(listener);
}
