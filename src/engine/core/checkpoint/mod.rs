pub mod checkpointer;
pub mod data_pointer;

pub use checkpointer::{CheckpointInfo, CheckpointResult, Checkpointer};
pub use data_pointer::DataPointer;

#[cfg(test)]
mod checkpointer_test;
