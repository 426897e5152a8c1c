pub mod transaction;
pub mod update_overlay;

pub use transaction::{TRANSACTION_ID_START, TransactionData};
pub use update_overlay::UpdateOverlay;

#[cfg(test)]
mod update_overlay_test;
