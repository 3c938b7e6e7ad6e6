pub mod bridge;
pub mod broadcast;
pub mod commands;
pub mod events;
pub mod poller;

pub use spotify_remote_client::{Error, Result};
