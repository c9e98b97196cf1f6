use ash::vk;

use crate::object::ObjectKind;

/// Failures surfaced by driver operations. Every variant maps onto the
/// `VkResult` the entry point returns.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DriverError {
    #[error("out of host memory")]
    OutOfHostMemory,

    #[error("extension not present: {0}")]
    ExtensionNotPresent(String),

    #[error("output array too small")]
    Incomplete,

    #[error("initialization failed: {0}")]
    InitializationFailed(String),

    #[error("memory map failed")]
    MemoryMapFailed,

    #[error("{0:?} objects have no memory requirements")]
    NoStorageRequirement(ObjectKind),

    #[error("null {0:?} handle")]
    NullHandle(ObjectKind),
}

impl From<DriverError> for vk::Result {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::OutOfHostMemory => vk::Result::ERROR_OUT_OF_HOST_MEMORY,
            DriverError::ExtensionNotPresent(_) => vk::Result::ERROR_EXTENSION_NOT_PRESENT,
            DriverError::Incomplete => vk::Result::INCOMPLETE,
            DriverError::InitializationFailed(_) => vk::Result::ERROR_INITIALIZATION_FAILED,
            DriverError::MemoryMapFailed => vk::Result::ERROR_MEMORY_MAP_FAILED,
            DriverError::NoStorageRequirement(_) | DriverError::NullHandle(_) => {
                vk::Result::ERROR_UNKNOWN
            }
        }
    }
}

/// Collapse an operation result into the code an entry point returns.
pub fn to_vk_result(result: Result<(), DriverError>) -> vk::Result {
    match result {
        Ok(()) => vk::Result::SUCCESS,
        Err(err) => {
            if err != DriverError::Incomplete {
                tracing::debug!("{err}");
            }
            err.into()
        }
    }
}
