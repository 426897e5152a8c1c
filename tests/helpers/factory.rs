pub use super::factories::{
    BlockManagerFactory, ColumnDataFactory, StorageConfigFactory, VectorFactory,
};

use crate::engine::core::update::{TRANSACTION_ID_START, TransactionData};

pub struct Factory;

impl Factory {
    pub fn storage_config() -> StorageConfigFactory {
        StorageConfigFactory::new()
    }

    pub fn block_manager() -> BlockManagerFactory {
        BlockManagerFactory::new()
    }

    pub fn column_data() -> ColumnDataFactory {
        ColumnDataFactory::new()
    }

    pub fn vector() -> VectorFactory {
        VectorFactory::new()
    }

    /// Transaction `n` with the given snapshot time.
    pub fn transaction(n: u64, start_time: u64) -> TransactionData {
        TransactionData::new(TRANSACTION_ID_START + n, start_time)
    }
}
