mod component;
mod config;
pub mod constants;
mod errors;
pub mod reactive;
mod services;
pub mod utils;
mod wire;

pub use component::*;
pub use config::*;
pub use errors::*;
pub use services::*;
pub use wire::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
