use super::{Parameters, UnarySnowball};

/// Builds the fresh counters a [Tree](super::Tree) attaches to new branches.
///
/// Binary counters are never built directly: they only arise by
/// [extending](UnarySnowball::extend) a unary counter at a split.
pub trait Factory {
    fn new_unary(&self, params: Parameters) -> UnarySnowball;
}

/// The production [Factory]: plain snowball counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnowballFactory;

impl Factory for SnowballFactory {
    fn new_unary(&self, params: Parameters) -> UnarySnowball {
        UnarySnowball::new(params)
    }
}
