mod assistant_client;
mod connection_monitor;
#[cfg(test)]
pub mod fakes;
mod persistent_store;
mod role_context;
mod session_controller;
mod timeline;

pub use assistant_client::*;
pub use connection_monitor::*;
pub use persistent_store::*;
pub use role_context::*;
pub use session_controller::*;
pub use timeline::*;
