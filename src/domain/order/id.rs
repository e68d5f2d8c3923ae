use rand::Rng;

use super::value_objects::OrderId;

/// Source of fresh order identifiers.
///
/// Ids are uniform over the whole 64-bit space; the store's create-if-absent
/// insert is what actually guarantees uniqueness.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> OrderId;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next_id(&self) -> OrderId {
        rand::thread_rng().gen()
    }
}
