/// Background-removal API module
pub mod client;

pub use client::{BackgroundRemover, RemoveBgClient};
