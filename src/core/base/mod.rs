//! Identity of the protected resources and the call outcomes reported against them.

mod outcome;
mod resource;

pub use outcome::*;
pub use resource::*;
