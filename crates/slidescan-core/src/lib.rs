pub mod acquire;
pub mod catalog;
pub mod compare;
pub mod config;
pub mod consts;
pub mod error;
pub mod io;
pub mod motion;
pub mod naming;
pub mod progress;
pub mod pyramid;
pub mod reconstruct;
pub mod tile;
