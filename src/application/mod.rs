pub mod ports;
pub mod state;
pub mod usecases;

pub use ports::*;
pub use state::*;
