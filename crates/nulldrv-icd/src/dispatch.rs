//! Loader dispatch slot for the Vulkan ICD.
//!
//! The Vulkan loader requires that dispatchable handles (VkInstance,
//! VkPhysicalDevice, VkDevice, VkQueue, VkCommandBuffer) start with a
//! pointer-sized slot. The ICD fills it with `ICD_LOADER_MAGIC`; the loader
//! checks the magic and then overwrites the slot with its dispatch table.
//! Every object record starts with this slot, dispatchable or not.

/// The ICD loader magic value. The loader expects this in new dispatchable handles.
pub const ICD_LOADER_MAGIC: usize = 0x01CDC0DE;

#[repr(C)]
pub struct LoaderSlot {
    /// The loader will overwrite this with its dispatch table pointer.
    loader_data: usize,
}

impl LoaderSlot {
    pub const fn stamped() -> Self {
        Self {
            loader_data: ICD_LOADER_MAGIC,
        }
    }

    pub fn loader_data(&self) -> usize {
        self.loader_data
    }

    /// True until the loader claims the slot.
    pub fn is_stamped(&self) -> bool {
        self.loader_data == ICD_LOADER_MAGIC
    }
}
