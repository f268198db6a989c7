//! Request handler module
//!
//! Entry point for HTTP request processing: method validation, then static
//! file resolution under the document root.

pub mod static_files;

use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared server state: the resolved document root.
///
/// The root is passed explicitly instead of mutating the process working
/// directory, so file lookups never depend on process-wide state.
pub struct ServerContext {
    pub document_root: PathBuf,
}

impl ServerContext {
    pub const fn new(document_root: PathBuf) -> Self {
        Self { document_root }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    peer_addr: SocketAddr,
    context: Arc<ServerContext>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let is_head = method == Method::HEAD;

    let response = if method == Method::GET || is_head {
        static_files::serve(&context.document_root, &path, is_head).await
    } else {
        logger::log_warning(&format!("Method not allowed: {method}"));
        http::build_405_response()
    };

    let mut entry = AccessLogEntry::new(peer_addr.ip().to_string(), method.to_string(), path);
    entry.status = response.status().as_u16();
    entry.body_bytes = body_bytes_sent(&response, is_head);
    logger::log_access(&entry);

    Ok(response)
}

/// Bytes actually sent on the wire
///
/// HEAD responses carry Content-Length but an empty body, so they log 0.
fn body_bytes_sent(response: &Response<Full<Bytes>>, is_head: bool) -> usize {
    if is_head {
        return 0;
    }
    response
        .headers()
        .get(hyper::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}
