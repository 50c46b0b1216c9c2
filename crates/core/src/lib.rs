pub mod cognition;
pub mod config;
pub mod engagement;
pub mod io;
pub mod memory;
pub mod moderation;
pub mod routing;
pub mod runtime;
pub mod session;
pub mod types;
