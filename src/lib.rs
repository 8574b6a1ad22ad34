pub mod config;
pub mod control;
pub mod error;
pub mod perception;
pub mod protocol;
pub mod ptu;
pub mod transport;
