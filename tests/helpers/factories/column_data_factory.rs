use std::sync::Arc;

use tempfile::TempDir;

use super::block_manager_factory::BlockManagerFactory;
use super::storage_config_factory::StorageConfigFactory;
use crate::engine::core::block::FileBlockManager;
use crate::engine::core::column::{ColumnData, ColumnRole};
use crate::engine::core::storage_config::StorageConfig;
use crate::engine::core::vector::{LogicalType, RowId};

/// Builds flat `ColumnData` instances over a fresh block manager.
pub struct ColumnDataFactory {
    config: StorageConfig,
    ty: LogicalType,
    start: RowId,
    column_index: usize,
    role: ColumnRole,
}

impl ColumnDataFactory {
    pub fn new() -> Self {
        Self {
            config: StorageConfigFactory::new().create(),
            ty: LogicalType::BigInt,
            start: 0,
            column_index: 0,
            role: ColumnRole::Root,
        }
    }

    pub fn with_config(mut self, config: StorageConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_type(mut self, ty: LogicalType) -> Self {
        self.ty = ty;
        self
    }

    pub fn with_start(mut self, start: RowId) -> Self {
        self.start = start;
        self
    }

    pub fn with_column_index(mut self, column_index: usize) -> Self {
        self.column_index = column_index;
        self
    }

    pub fn as_child(mut self) -> Self {
        self.role = ColumnRole::Child;
        self
    }

    pub fn create_with(self, block_manager: Arc<FileBlockManager>) -> ColumnData {
        ColumnData::new(
            block_manager,
            self.config,
            self.column_index,
            self.start,
            self.ty,
            self.role,
        )
        .expect("create column data")
    }

    pub fn create(self) -> (ColumnData, Arc<FileBlockManager>, TempDir) {
        let (manager, dir) = BlockManagerFactory::new()
            .with_block_size(self.config.block_size)
            .create();
        let column = ColumnData::new(
            manager.clone(),
            self.config,
            self.column_index,
            self.start,
            self.ty,
            self.role,
        )
        .expect("create column data");
        (column, manager, dir)
    }
}
