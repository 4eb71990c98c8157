pub mod client;
pub mod protocol;
pub mod server;

pub use client::ClientSession;
pub use protocol::{Message, MessageType, Packet};
pub use server::{serve, start_server, Lobby};
