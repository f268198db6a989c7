//! Logger module
//!
//! Console logging for the server: startup banner, access lines in Common
//! Log Format, and timestamped error/warning output. Info goes to stdout,
//! errors to stderr.

mod format;

pub use format::AccessLogEntry;

use chrono::Local;
use std::path::Path;

fn write_info(message: &str) {
    println!("{message}");
}

fn write_error(message: &str) {
    eprintln!("{message}");
}

fn timestamp() -> String {
    Local::now().format("%d/%b/%Y:%H:%M:%S %z").to_string()
}

pub fn log_server_start(port: u16, document_root: &Path) {
    write_info("======================================");
    write_info(&format!(
        "Serving HTTP on port {port} (http://localhost:{port}/) ..."
    ));
    write_info(&format!("Document root: {}", document_root.display()));
    write_info("======================================\n");
}

pub fn log_shutdown() {
    write_info("\nShutting down server...");
}

/// Log one completed request in Common Log Format
pub fn log_access(entry: &AccessLogEntry) {
    write_info(&entry.format_common());
}

pub fn log_error(message: &str) {
    write_error(&format!("[{}] [ERROR] {message}", timestamp()));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[{}] [WARN] {message}", timestamp()));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    log_error(&format!("Failed to serve connection: {err:?}"));
}
