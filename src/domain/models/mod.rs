mod assistant;
mod backend;
mod connection;
mod export;
mod message;
mod notification;
mod role;
mod sender;
mod settings;
mod slash_commands;
mod storage;

pub use assistant::*;
pub use backend::*;
pub use connection::*;
pub use export::*;
pub use message::*;
pub use notification::*;
pub use role::*;
pub use sender::*;
pub use settings::*;
pub use slash_commands::*;
pub use storage::*;
