//! Checkers rules engine plus the JSON-lines client/server used to play it over TCP.

pub mod config;
pub mod core;
pub mod error;
pub mod game;
pub mod logic;
pub mod network;


pub use config::NetConfig;
pub use error::{BoardError, SessionError};
pub use game::Game;
