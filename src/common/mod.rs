pub mod banner;
pub mod clock;
pub mod errors;
pub mod http;
pub mod logger;
pub mod rotation;
#[cfg(test)]
pub mod testing;
pub mod types;

pub use clock::*;
pub use errors::*;
pub use http::*;
pub use rotation::*;
pub use types::*;
