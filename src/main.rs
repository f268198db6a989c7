use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Notify;

mod handler;
mod http;
mod logger;
mod server;

/// Fixed listening port; there is no configuration surface.
const PORT: u16 = 8000;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let document_root = resolve_document_root()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main(document_root))
}

async fn async_main(document_root: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), PORT);

    // Bind before printing the banner: once the banner is visible the
    // socket is already accepting. A bind failure is fatal, not retried.
    let listener = server::bind_listener(addr)?;

    let context = Arc::new(handler::ServerContext::new(document_root));
    let shutdown = Arc::new(Notify::new());

    logger::log_server_start(PORT, &context.document_root);

    let signals = Arc::new(server::signal::SignalHandler::new());
    server::signal::start_signal_handler(Arc::clone(&signals));

    let serve_task = tokio::spawn(server::run_accept_loop(
        listener,
        Arc::clone(&context),
        Arc::clone(&shutdown),
    ));

    // The main task does exactly one blocking wait: for the interrupt.
    signals.shutdown.notified().await;

    logger::log_shutdown();
    shutdown.notify_one();
    serve_task.await?;

    Ok(())
}

/// Resolve the document root: the directory containing the executable.
///
/// Resolved once at startup, independent of the launch-time working
/// directory. The path is canonicalized so later containment checks work
/// against an absolute, symlink-free root.
fn resolve_document_root() -> std::io::Result<PathBuf> {
    let exe = std::env::current_exe()?.canonicalize()?;
    exe.parent().map(Path::to_path_buf).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "executable has no parent directory",
        )
    })
}
