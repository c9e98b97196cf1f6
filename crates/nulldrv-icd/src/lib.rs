//! nulldrv Vulkan ICD (Installable Client Driver)
//!
//! This cdylib implements the full Vulkan 1.0 and `VK_KHR_swapchain` call
//! surface with no hardware behind it. Objects are real heap records with
//! loader-compatible headers; everything else succeeds without effect, which
//! lets loaders, layers and applications be exercised end to end.

use std::ffi::{c_char, CStr};
use std::sync::OnceLock;

use ash::vk;
use ash::vk::Handle;
use tracing::{info, warn};

use nulldrv_core::{default_config_path, NulldrvConfig};

pub mod command;
pub mod descriptor;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod extension;
pub mod format;
pub mod handle_store;
pub mod heap;
pub mod image;
pub mod instance;
pub mod memory;
pub mod object;
pub mod physical_device;
pub mod pipeline;
pub mod renderpass;
pub mod swapchain;
pub mod sync;
pub mod util;

/// Highest loader/ICD interface version this driver speaks.
pub const ICD_INTERFACE_VERSION: u32 = 5;

// ── Driver configuration ────────────────────────────────────

static CONFIG: OnceLock<NulldrvConfig> = OnceLock::new();

/// Driver configuration, loaded on first use. Loading also installs the
/// log subscriber and arms the configured allocation fault.
pub fn config() -> &'static NulldrvConfig {
    CONFIG.get_or_init(|| {
        let path = default_config_path();
        let loaded = NulldrvConfig::load_optional(&path);
        let config = match &loaded {
            Ok(Some(config)) => config.clone(),
            _ => NulldrvConfig::default(),
        };

        nulldrv_common::init_driver_logging(&config.logging.filter);
        if let Err(e) = loaded {
            warn!(path = %path.display(), "ignoring configuration: {e}");
        }
        if let Some(successes) = config.faults.fail_allocation_after {
            heap::fail_allocation_after(successes);
        }
        info!(device = %config.device.name, "nulldrv loaded");
        config
    })
}

// ── ICD Negotiation ─────────────────────────────────────────

/// Negotiate the ICD interface version with the Vulkan loader.
#[no_mangle]
pub unsafe extern "system" fn vk_icdNegotiateLoaderICDInterfaceVersion(
    p_supported_version: *mut u32,
) -> vk::Result {
    if p_supported_version.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    config();
    let requested = *p_supported_version;
    *p_supported_version = std::cmp::min(requested, ICD_INTERFACE_VERSION);
    vk::Result::SUCCESS
}

/// Returns function pointers for Vulkan functions.
/// The Vulkan loader calls this to resolve all Vulkan entry points.
#[no_mangle]
pub unsafe extern "system" fn vk_icdGetInstanceProcAddr(
    _instance: vk::Instance,
    p_name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    lookup_c_name(p_name)
}

/// Resolve physical-device-level functions the loader does not know about.
#[no_mangle]
pub unsafe extern "system" fn vk_icdGetPhysicalDeviceProcAddr(
    _instance: vk::Instance,
    p_name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    if p_name.is_null() {
        return None;
    }
    let name = CStr::from_ptr(p_name).to_str().ok()?;
    if !name.starts_with("vkGetPhysicalDevice") && !name.starts_with("vkEnumerateDevice") {
        return None;
    }
    lookup_entry_point(name)
}

#[no_mangle]
pub unsafe extern "system" fn vkGetInstanceProcAddr(
    _instance: vk::Instance,
    p_name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    lookup_c_name(p_name)
}

/// Device-level lookup. Swapchain functions resolve only on devices that
/// enabled `VK_KHR_swapchain`.
#[no_mangle]
pub unsafe extern "system" fn vkGetDeviceProcAddr(
    device: vk::Device,
    p_name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    if p_name.is_null() {
        return None;
    }
    let name = CStr::from_ptr(p_name).to_str().ok()?;
    if swapchain::is_swapchain_entry_point(name) && !device.is_null() {
        let dev = object::decode::<device::Device>(device);
        if !dev.body.extensions.contains(extension::Extension::KhrSwapchain) {
            return None;
        }
    }
    lookup_entry_point(name)
}

unsafe fn lookup_c_name(p_name: *const c_char) -> vk::PFN_vkVoidFunction {
    if p_name.is_null() {
        return None;
    }
    let name = CStr::from_ptr(p_name).to_str().ok()?;
    lookup_entry_point(name)
}

macro_rules! entry_points {
    ($($path:path => $name:ident),* $(,)?) => {
        /// Every entry point this driver exports, by Vulkan name.
        pub const ENTRY_POINT_NAMES: &[&str] = &[$(stringify!($name)),*];

        /// Resolve a Vulkan entry point by name.
        pub fn lookup_entry_point(name: &str) -> vk::PFN_vkVoidFunction {
            match name {
                $(stringify!($name) => Some(unsafe {
                    std::mem::transmute::<*const (), unsafe extern "system" fn()>($path as *const ())
                }),)*
                _ => None,
            }
        }
    };
}

entry_points! {
    // ── ICD entry points ────────────────────────────────
    vk_icdNegotiateLoaderICDInterfaceVersion => vk_icdNegotiateLoaderICDInterfaceVersion,
    vk_icdGetInstanceProcAddr => vk_icdGetInstanceProcAddr,
    vk_icdGetPhysicalDeviceProcAddr => vk_icdGetPhysicalDeviceProcAddr,
    vkGetInstanceProcAddr => vkGetInstanceProcAddr,
    vkGetDeviceProcAddr => vkGetDeviceProcAddr,

    // ── Instance ────────────────────────────────────────
    instance::vkCreateInstance => vkCreateInstance,
    instance::vkDestroyInstance => vkDestroyInstance,
    instance::vkEnumeratePhysicalDevices => vkEnumeratePhysicalDevices,
    instance::vkEnumerateInstanceExtensionProperties => vkEnumerateInstanceExtensionProperties,
    instance::vkEnumerateInstanceLayerProperties => vkEnumerateInstanceLayerProperties,
    instance::vkEnumerateInstanceVersion => vkEnumerateInstanceVersion,

    // ── Physical device ─────────────────────────────────
    physical_device::vkGetPhysicalDeviceProperties => vkGetPhysicalDeviceProperties,
    physical_device::vkGetPhysicalDeviceProperties2 => vkGetPhysicalDeviceProperties2,
    physical_device::vkGetPhysicalDeviceFeatures => vkGetPhysicalDeviceFeatures,
    physical_device::vkGetPhysicalDeviceFeatures2 => vkGetPhysicalDeviceFeatures2,
    physical_device::vkGetPhysicalDeviceFormatProperties => vkGetPhysicalDeviceFormatProperties,
    physical_device::vkGetPhysicalDeviceFormatProperties2 => vkGetPhysicalDeviceFormatProperties2,
    physical_device::vkGetPhysicalDeviceImageFormatProperties => vkGetPhysicalDeviceImageFormatProperties,
    physical_device::vkGetPhysicalDeviceQueueFamilyProperties => vkGetPhysicalDeviceQueueFamilyProperties,
    physical_device::vkGetPhysicalDeviceQueueFamilyProperties2 => vkGetPhysicalDeviceQueueFamilyProperties2,
    physical_device::vkGetPhysicalDeviceMemoryProperties => vkGetPhysicalDeviceMemoryProperties,
    physical_device::vkGetPhysicalDeviceMemoryProperties2 => vkGetPhysicalDeviceMemoryProperties2,
    physical_device::vkGetPhysicalDeviceSparseImageFormatProperties => vkGetPhysicalDeviceSparseImageFormatProperties,
    physical_device::vkEnumerateDeviceExtensionProperties => vkEnumerateDeviceExtensionProperties,
    physical_device::vkEnumerateDeviceLayerProperties => vkEnumerateDeviceLayerProperties,

    // ── Device ──────────────────────────────────────────
    device::vkCreateDevice => vkCreateDevice,
    device::vkDestroyDevice => vkDestroyDevice,
    device::vkGetDeviceQueue => vkGetDeviceQueue,
    device::vkDeviceWaitIdle => vkDeviceWaitIdle,
    device::vkQueueSubmit => vkQueueSubmit,
    device::vkQueueWaitIdle => vkQueueWaitIdle,
    device::vkQueueBindSparse => vkQueueBindSparse,

    // ── Memory and buffers ──────────────────────────────
    memory::vkAllocateMemory => vkAllocateMemory,
    memory::vkFreeMemory => vkFreeMemory,
    memory::vkMapMemory => vkMapMemory,
    memory::vkUnmapMemory => vkUnmapMemory,
    memory::vkFlushMappedMemoryRanges => vkFlushMappedMemoryRanges,
    memory::vkInvalidateMappedMemoryRanges => vkInvalidateMappedMemoryRanges,
    memory::vkGetDeviceMemoryCommitment => vkGetDeviceMemoryCommitment,
    memory::vkCreateBuffer => vkCreateBuffer,
    memory::vkDestroyBuffer => vkDestroyBuffer,
    memory::vkGetBufferMemoryRequirements => vkGetBufferMemoryRequirements,
    memory::vkBindBufferMemory => vkBindBufferMemory,
    memory::vkCreateBufferView => vkCreateBufferView,
    memory::vkDestroyBufferView => vkDestroyBufferView,

    // ── Images and samplers ─────────────────────────────
    image::vkCreateImage => vkCreateImage,
    image::vkDestroyImage => vkDestroyImage,
    image::vkGetImageMemoryRequirements => vkGetImageMemoryRequirements,
    image::vkBindImageMemory => vkBindImageMemory,
    image::vkGetImageSparseMemoryRequirements => vkGetImageSparseMemoryRequirements,
    image::vkGetImageSubresourceLayout => vkGetImageSubresourceLayout,
    image::vkCreateImageView => vkCreateImageView,
    image::vkDestroyImageView => vkDestroyImageView,
    image::vkCreateSampler => vkCreateSampler,
    image::vkDestroySampler => vkDestroySampler,

    // ── Pipelines ───────────────────────────────────────
    pipeline::vkCreateShaderModule => vkCreateShaderModule,
    pipeline::vkDestroyShaderModule => vkDestroyShaderModule,
    pipeline::vkCreatePipelineCache => vkCreatePipelineCache,
    pipeline::vkDestroyPipelineCache => vkDestroyPipelineCache,
    pipeline::vkGetPipelineCacheData => vkGetPipelineCacheData,
    pipeline::vkMergePipelineCaches => vkMergePipelineCaches,
    pipeline::vkCreatePipelineLayout => vkCreatePipelineLayout,
    pipeline::vkDestroyPipelineLayout => vkDestroyPipelineLayout,
    pipeline::vkCreateGraphicsPipelines => vkCreateGraphicsPipelines,
    pipeline::vkCreateComputePipelines => vkCreateComputePipelines,
    pipeline::vkDestroyPipeline => vkDestroyPipeline,

    // ── Descriptors ─────────────────────────────────────
    descriptor::vkCreateDescriptorSetLayout => vkCreateDescriptorSetLayout,
    descriptor::vkDestroyDescriptorSetLayout => vkDestroyDescriptorSetLayout,
    descriptor::vkCreateDescriptorPool => vkCreateDescriptorPool,
    descriptor::vkDestroyDescriptorPool => vkDestroyDescriptorPool,
    descriptor::vkResetDescriptorPool => vkResetDescriptorPool,
    descriptor::vkAllocateDescriptorSets => vkAllocateDescriptorSets,
    descriptor::vkFreeDescriptorSets => vkFreeDescriptorSets,
    descriptor::vkUpdateDescriptorSets => vkUpdateDescriptorSets,

    // ── Render passes ───────────────────────────────────
    renderpass::vkCreateRenderPass => vkCreateRenderPass,
    renderpass::vkDestroyRenderPass => vkDestroyRenderPass,
    renderpass::vkCreateFramebuffer => vkCreateFramebuffer,
    renderpass::vkDestroyFramebuffer => vkDestroyFramebuffer,
    renderpass::vkGetRenderAreaGranularity => vkGetRenderAreaGranularity,

    // ── Synchronization and queries ─────────────────────
    sync::vkCreateFence => vkCreateFence,
    sync::vkDestroyFence => vkDestroyFence,
    sync::vkResetFences => vkResetFences,
    sync::vkGetFenceStatus => vkGetFenceStatus,
    sync::vkWaitForFences => vkWaitForFences,
    sync::vkCreateSemaphore => vkCreateSemaphore,
    sync::vkDestroySemaphore => vkDestroySemaphore,
    sync::vkCreateEvent => vkCreateEvent,
    sync::vkDestroyEvent => vkDestroyEvent,
    sync::vkGetEventStatus => vkGetEventStatus,
    sync::vkSetEvent => vkSetEvent,
    sync::vkResetEvent => vkResetEvent,
    sync::vkCreateQueryPool => vkCreateQueryPool,
    sync::vkDestroyQueryPool => vkDestroyQueryPool,
    sync::vkGetQueryPoolResults => vkGetQueryPoolResults,

    // ── Command pools and buffers ───────────────────────
    command::vkCreateCommandPool => vkCreateCommandPool,
    command::vkDestroyCommandPool => vkDestroyCommandPool,
    command::vkResetCommandPool => vkResetCommandPool,
    command::vkAllocateCommandBuffers => vkAllocateCommandBuffers,
    command::vkFreeCommandBuffers => vkFreeCommandBuffers,
    command::vkBeginCommandBuffer => vkBeginCommandBuffer,
    command::vkEndCommandBuffer => vkEndCommandBuffer,
    command::vkResetCommandBuffer => vkResetCommandBuffer,
    command::vkCmdBindPipeline => vkCmdBindPipeline,
    command::vkCmdSetViewport => vkCmdSetViewport,
    command::vkCmdSetScissor => vkCmdSetScissor,
    command::vkCmdSetLineWidth => vkCmdSetLineWidth,
    command::vkCmdSetDepthBias => vkCmdSetDepthBias,
    command::vkCmdSetBlendConstants => vkCmdSetBlendConstants,
    command::vkCmdSetDepthBounds => vkCmdSetDepthBounds,
    command::vkCmdSetStencilCompareMask => vkCmdSetStencilCompareMask,
    command::vkCmdSetStencilWriteMask => vkCmdSetStencilWriteMask,
    command::vkCmdSetStencilReference => vkCmdSetStencilReference,
    command::vkCmdBindDescriptorSets => vkCmdBindDescriptorSets,
    command::vkCmdBindIndexBuffer => vkCmdBindIndexBuffer,
    command::vkCmdBindVertexBuffers => vkCmdBindVertexBuffers,
    command::vkCmdDraw => vkCmdDraw,
    command::vkCmdDrawIndexed => vkCmdDrawIndexed,
    command::vkCmdDrawIndirect => vkCmdDrawIndirect,
    command::vkCmdDrawIndexedIndirect => vkCmdDrawIndexedIndirect,
    command::vkCmdDispatch => vkCmdDispatch,
    command::vkCmdDispatchIndirect => vkCmdDispatchIndirect,
    command::vkCmdCopyBuffer => vkCmdCopyBuffer,
    command::vkCmdCopyImage => vkCmdCopyImage,
    command::vkCmdBlitImage => vkCmdBlitImage,
    command::vkCmdCopyBufferToImage => vkCmdCopyBufferToImage,
    command::vkCmdCopyImageToBuffer => vkCmdCopyImageToBuffer,
    command::vkCmdUpdateBuffer => vkCmdUpdateBuffer,
    command::vkCmdFillBuffer => vkCmdFillBuffer,
    command::vkCmdClearColorImage => vkCmdClearColorImage,
    command::vkCmdClearDepthStencilImage => vkCmdClearDepthStencilImage,
    command::vkCmdClearAttachments => vkCmdClearAttachments,
    command::vkCmdResolveImage => vkCmdResolveImage,
    command::vkCmdSetEvent => vkCmdSetEvent,
    command::vkCmdResetEvent => vkCmdResetEvent,
    command::vkCmdWaitEvents => vkCmdWaitEvents,
    command::vkCmdPipelineBarrier => vkCmdPipelineBarrier,
    command::vkCmdBeginQuery => vkCmdBeginQuery,
    command::vkCmdEndQuery => vkCmdEndQuery,
    command::vkCmdResetQueryPool => vkCmdResetQueryPool,
    command::vkCmdWriteTimestamp => vkCmdWriteTimestamp,
    command::vkCmdCopyQueryPoolResults => vkCmdCopyQueryPoolResults,
    command::vkCmdPushConstants => vkCmdPushConstants,
    command::vkCmdBeginRenderPass => vkCmdBeginRenderPass,
    command::vkCmdNextSubpass => vkCmdNextSubpass,
    command::vkCmdEndRenderPass => vkCmdEndRenderPass,
    command::vkCmdExecuteCommands => vkCmdExecuteCommands,

    // ── Surface and swapchain ───────────────────────────
    swapchain::vkDestroySurfaceKHR => vkDestroySurfaceKHR,
    swapchain::vkGetPhysicalDeviceSurfaceSupportKHR => vkGetPhysicalDeviceSurfaceSupportKHR,
    swapchain::vkGetPhysicalDeviceSurfaceCapabilitiesKHR => vkGetPhysicalDeviceSurfaceCapabilitiesKHR,
    swapchain::vkGetPhysicalDeviceSurfaceFormatsKHR => vkGetPhysicalDeviceSurfaceFormatsKHR,
    swapchain::vkGetPhysicalDeviceSurfacePresentModesKHR => vkGetPhysicalDeviceSurfacePresentModesKHR,
    swapchain::vkCreateSwapchainKHR => vkCreateSwapchainKHR,
    swapchain::vkDestroySwapchainKHR => vkDestroySwapchainKHR,
    swapchain::vkGetSwapchainImagesKHR => vkGetSwapchainImagesKHR,
    swapchain::vkAcquireNextImageKHR => vkAcquireNextImageKHR,
    swapchain::vkQueuePresentKHR => vkQueuePresentKHR,
}
