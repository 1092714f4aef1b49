// SPDX-License-Identifier: CEPL-1.0
//! The one boundary between the frame core and the explicit graphics API.
//!
//! Everything [`Device`](crate::Device), [`Buffer`](crate::Buffer),
//! [`SwapChain`](crate::SwapChain) and [`Renderer`](crate::Renderer) ask of the
//! driver goes through [`Gpu`]. [`AshGpu`](crate::AshGpu) is the real thing;
//! tests swap in an in-memory double.
//!
//! Result codes pass through untouched (`VkResult`), callers attach context.

use std::ffi::c_void;

use ash::prelude::VkResult;
use ash::vk;

use crate::select::QueueFamilyIndices;

/// Surface capabilities as queried right now. The caps change with the window,
/// so this is re-queried on every swap-chain build.
#[derive(Clone, Debug, Default)]
pub struct SurfaceSupport {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

/// # Safety
///
/// Every `unsafe fn` forwards to the matching Vulkan entry point. Callers must
/// uphold that entry point's valid-usage rules: handles were created by this
/// `Gpu` and are still alive, objects are not destroyed while the GPU may
/// still reference them, and host access to a command buffer or queue is
/// externally synchronized.
pub trait Gpu {
    // --- Queries ---

    fn queue_families(&self) -> QueueFamilyIndices;
    fn properties(&self) -> &vk::PhysicalDeviceProperties;
    fn memory_properties(&self) -> &vk::PhysicalDeviceMemoryProperties;
    fn format_properties(&self, format: vk::Format) -> vk::FormatProperties;
    fn surface(&self) -> vk::SurfaceKHR;
    fn surface_support(&self) -> VkResult<SurfaceSupport>;

    // --- Buffers, images, memory ---

    unsafe fn create_buffer(&self, info: &vk::BufferCreateInfo<'_>) -> VkResult<vk::Buffer>;
    unsafe fn destroy_buffer(&self, buffer: vk::Buffer);
    unsafe fn buffer_memory_requirements(&self, buffer: vk::Buffer) -> vk::MemoryRequirements;
    unsafe fn bind_buffer_memory(
        &self,
        buffer: vk::Buffer,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> VkResult<()>;

    unsafe fn create_image(&self, info: &vk::ImageCreateInfo<'_>) -> VkResult<vk::Image>;
    unsafe fn destroy_image(&self, image: vk::Image);
    unsafe fn image_memory_requirements(&self, image: vk::Image) -> vk::MemoryRequirements;
    unsafe fn bind_image_memory(
        &self,
        image: vk::Image,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> VkResult<()>;

    unsafe fn allocate_memory(&self, info: &vk::MemoryAllocateInfo<'_>)
        -> VkResult<vk::DeviceMemory>;
    unsafe fn free_memory(&self, memory: vk::DeviceMemory);

    /// Maps `size` bytes at `offset`; `vk::WHOLE_SIZE` maps to the end of the allocation.
    unsafe fn map_memory(
        &self,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
    ) -> VkResult<*mut c_void>;
    unsafe fn unmap_memory(&self, memory: vk::DeviceMemory);
    unsafe fn flush_mapped_range(&self, range: &vk::MappedMemoryRange<'_>) -> VkResult<()>;
    unsafe fn invalidate_mapped_range(&self, range: &vk::MappedMemoryRange<'_>) -> VkResult<()>;

    unsafe fn create_image_view(&self, info: &vk::ImageViewCreateInfo<'_>)
        -> VkResult<vk::ImageView>;
    unsafe fn destroy_image_view(&self, view: vk::ImageView);

    // --- Render pass objects ---

    unsafe fn create_render_pass(&self, info: &vk::RenderPassCreateInfo<'_>)
        -> VkResult<vk::RenderPass>;
    unsafe fn destroy_render_pass(&self, render_pass: vk::RenderPass);
    unsafe fn create_framebuffer(&self, info: &vk::FramebufferCreateInfo<'_>)
        -> VkResult<vk::Framebuffer>;
    unsafe fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer);

    // --- Synchronization ---

    unsafe fn create_semaphore(&self) -> VkResult<vk::Semaphore>;
    unsafe fn destroy_semaphore(&self, semaphore: vk::Semaphore);
    unsafe fn create_fence(&self, signaled: bool) -> VkResult<vk::Fence>;
    unsafe fn destroy_fence(&self, fence: vk::Fence);
    /// `Err(vk::Result::TIMEOUT)` when `timeout_ns` runs out first.
    unsafe fn wait_for_fence(&self, fence: vk::Fence, timeout_ns: u64) -> VkResult<()>;
    unsafe fn reset_fence(&self, fence: vk::Fence) -> VkResult<()>;

    // --- Command pools and recording ---

    unsafe fn create_command_pool(&self, info: &vk::CommandPoolCreateInfo<'_>)
        -> VkResult<vk::CommandPool>;
    unsafe fn destroy_command_pool(&self, pool: vk::CommandPool);
    unsafe fn allocate_command_buffers(
        &self,
        pool: vk::CommandPool,
        count: u32,
    ) -> VkResult<Vec<vk::CommandBuffer>>;
    unsafe fn free_command_buffers(&self, pool: vk::CommandPool, buffers: &[vk::CommandBuffer]);
    unsafe fn begin_command_buffer(
        &self,
        cmd: vk::CommandBuffer,
        flags: vk::CommandBufferUsageFlags,
    ) -> VkResult<()>;
    unsafe fn end_command_buffer(&self, cmd: vk::CommandBuffer) -> VkResult<()>;

    unsafe fn cmd_copy_buffer(
        &self,
        cmd: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Buffer,
        regions: &[vk::BufferCopy],
    );
    unsafe fn cmd_copy_buffer_to_image(
        &self,
        cmd: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Image,
        dst_layout: vk::ImageLayout,
        regions: &[vk::BufferImageCopy],
    );
    unsafe fn cmd_pipeline_barrier(
        &self,
        cmd: vk::CommandBuffer,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
        image_barriers: &[vk::ImageMemoryBarrier<'_>],
    );
    unsafe fn cmd_begin_render_pass(
        &self,
        cmd: vk::CommandBuffer,
        info: &vk::RenderPassBeginInfo<'_>,
    );
    unsafe fn cmd_end_render_pass(&self, cmd: vk::CommandBuffer);
    unsafe fn cmd_set_viewport(&self, cmd: vk::CommandBuffer, viewport: vk::Viewport);
    unsafe fn cmd_set_scissor(&self, cmd: vk::CommandBuffer, scissor: vk::Rect2D);

    // --- Queues ---

    /// Submits to the graphics queue.
    unsafe fn queue_submit(&self, submit: &vk::SubmitInfo<'_>, fence: vk::Fence) -> VkResult<()>;
    unsafe fn graphics_queue_wait_idle(&self) -> VkResult<()>;
    unsafe fn device_wait_idle(&self) -> VkResult<()>;

    // --- Swap chain ---

    unsafe fn create_swapchain(&self, info: &vk::SwapchainCreateInfoKHR<'_>)
        -> VkResult<vk::SwapchainKHR>;
    unsafe fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>>;
    unsafe fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR);
    /// `Ok((index, suboptimal))`, out-of-date arrives as an `Err`.
    unsafe fn acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        timeout_ns: u64,
        semaphore: vk::Semaphore,
    ) -> VkResult<(u32, bool)>;
    /// Presents on the present queue. `Ok(true)` means suboptimal.
    unsafe fn queue_present(&self, info: &vk::PresentInfoKHR<'_>) -> VkResult<bool>;

    // --- Descriptors ---

    unsafe fn create_descriptor_set_layout(
        &self,
        info: &vk::DescriptorSetLayoutCreateInfo<'_>,
    ) -> VkResult<vk::DescriptorSetLayout>;
    unsafe fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout);
    unsafe fn create_descriptor_pool(&self, info: &vk::DescriptorPoolCreateInfo<'_>)
        -> VkResult<vk::DescriptorPool>;
    unsafe fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool);
    unsafe fn allocate_descriptor_sets(
        &self,
        info: &vk::DescriptorSetAllocateInfo<'_>,
    ) -> VkResult<Vec<vk::DescriptorSet>>;
    unsafe fn free_descriptor_sets(
        &self,
        pool: vk::DescriptorPool,
        sets: &[vk::DescriptorSet],
    ) -> VkResult<()>;
    unsafe fn reset_descriptor_pool(&self, pool: vk::DescriptorPool) -> VkResult<()>;
    unsafe fn update_descriptor_sets(&self, writes: &[vk::WriteDescriptorSet<'_>]);
}
