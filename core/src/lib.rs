pub use cell::*;
pub use error::*;
pub use grid::*;
pub use session::*;
pub use types::*;

mod cell;
mod error;
mod grid;
mod session;
mod types;
