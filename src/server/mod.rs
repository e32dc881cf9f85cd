// Server module entry point
// Listener setup, per-connection tasks, the accept loop and signal handling

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the module is exposed as server_loop
#[path = "loop.rs"]
pub mod server_loop;

pub use listener::create_listener;
pub use server_loop::{serve, ServerError};
pub use signal::start_signal_handler;
