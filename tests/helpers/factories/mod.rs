pub mod block_manager_factory;
pub mod column_data_factory;
pub mod storage_config_factory;
pub mod vector_factory;

pub use block_manager_factory::BlockManagerFactory;
pub use column_data_factory::ColumnDataFactory;
pub use storage_config_factory::StorageConfigFactory;
pub use vector_factory::VectorFactory;
