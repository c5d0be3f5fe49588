// Server module entry
// Listener setup, connection handling, request service and shutdown

pub mod connection;
pub mod listener;
pub mod service;
pub mod signal;

// `loop` is a keyword, so the file is mounted under another name
#[path = "loop.rs"]
pub mod server_loop;

pub use listener::create_reusable_listener;
pub use server_loop::start_server_loop;
pub use signal::start_signal_handler;
