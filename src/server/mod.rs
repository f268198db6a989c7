// Server module entry
// Listener creation, accept loop, connection handling and signal handling

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the file is mounted as server_loop
#[path = "loop.rs"]
pub mod server_loop;

// Re-export commonly used items
pub use listener::bind_listener;
pub use server_loop::run_accept_loop;
