//! File system storage management
//!
//! Handles name allocation, the date-partitioned layout, and path validation.

pub mod allocator;
pub mod operations;
pub mod results;
pub mod validation;

// Re-export commonly used items
pub use allocator::PathAllocator;
pub use operations::{prepare_file_retrieval, prepare_file_storage};
pub use results::{AllocatedPath, RetrieveResult, StoreResult};
pub use validation::resolve_and_validate_file_path;
