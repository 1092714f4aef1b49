// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
//! Vulkan frame-rendering core: device, buffers, swap chain and the
//! begin/end-frame renderer, all on top of the [`Gpu`] seam.

mod ash_gpu;
mod buffer;
mod descriptors;
mod device;
mod error;
mod gpu;
mod memory;
mod renderer;
mod select;
mod swapchain;

#[cfg(test)]
mod testing;

pub use ash;
pub use ash::vk;

pub use ash_gpu::{AshGpu, GpuConfig};
pub use buffer::Buffer;
pub use descriptors::{
    DescriptorPool, DescriptorPoolBuilder, DescriptorSetLayout, DescriptorSetLayoutBuilder,
    DescriptorWriter,
};
pub use device::Device;
pub use error::{RenderError, Result, VkResultExt};
pub use gpu::{Gpu, SurfaceSupport};
pub use memory::{aligned_size, find_memory_type};
pub use renderer::{FrameBegin, Renderer, RendererConfig};
pub use select::{QueueFamilyIndices, Unsuitable, DEPTH_FORMAT_CANDIDATES};
pub use swapchain::{
    Acquire, PresentOutcome, SwapChain, SwapChainConfig, VsyncMode, MAX_FRAMES_IN_FLIGHT,
};
