pub mod core;
pub mod engine;
pub mod server;
pub mod state;
