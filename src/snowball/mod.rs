//! The snowball consensus core: counters and the decision tree built from them.
mod binary;
mod constants;
mod factory;
mod parameters;
mod tree;
mod unary;

pub use binary::BinarySnowball;
pub use constants::*;
pub use factory::{Factory, SnowballFactory};
pub use parameters::Parameters;
pub use tree::{Consensus, Tree};
pub use unary::UnarySnowball;
