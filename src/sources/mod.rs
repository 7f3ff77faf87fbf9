pub mod strategy;
pub mod youtube;

pub use strategy::*;
