// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use tracing::debug;

use crate::ash_gpu::AshGpu;
use crate::error::{RenderError, Result, VkResultExt};
use crate::gpu::Gpu;
use crate::memory::find_memory_type;
use crate::select::{select_format, QueueFamilyIndices};

/// Owns the GPU connection and the command pool every command buffer comes from.
///
/// Shared as `Rc<Device<G>>` by buffers, the swap chain and the renderer. The
/// pool is destroyed first on drop, then the [`Gpu`] tears down the logical
/// device, surface and instance, so the device outlives everything built on it.
pub struct Device<G: Gpu = AshGpu> {
    command_pool: vk::CommandPool,
    gpu: G,
}

impl<G: Gpu> Device<G> {
    pub fn new(gpu: G) -> Result<Self> {
        let families = gpu.queue_families();
        let pool_info = vk::CommandPoolCreateInfo {
            s_type: vk::StructureType::COMMAND_POOL_CREATE_INFO,
            queue_family_index: families.graphics,
            flags: vk::CommandPoolCreateFlags::TRANSIENT
                | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
            ..Default::default()
        };
        let command_pool =
            unsafe { gpu.create_command_pool(&pool_info) }.call("vkCreateCommandPool")?;
        debug!(family = families.graphics, "command pool created");
        Ok(Self { command_pool, gpu })
    }

    pub fn gpu(&self) -> &G {
        &self.gpu
    }

    pub fn command_pool(&self) -> vk::CommandPool {
        self.command_pool
    }

    pub fn queue_families(&self) -> QueueFamilyIndices {
        self.gpu.queue_families()
    }

    pub fn properties(&self) -> &vk::PhysicalDeviceProperties {
        self.gpu.properties()
    }

    pub fn limits(&self) -> &vk::PhysicalDeviceLimits {
        &self.gpu.properties().limits
    }

    pub fn find_memory_type(
        &self,
        type_filter: u32,
        properties: vk::MemoryPropertyFlags,
    ) -> Option<u32> {
        find_memory_type(self.gpu.memory_properties(), type_filter, properties)
    }

    /// First of `candidates` supporting `features` with `tiling`, or `vk::Format::UNDEFINED`.
    pub fn find_supported_format(
        &self,
        candidates: &[vk::Format],
        tiling: vk::ImageTiling,
        features: vk::FormatFeatureFlags,
    ) -> vk::Format {
        select_format(candidates, tiling, features, |f| {
            self.gpu.format_properties(f)
        })
    }

    /// Creates a buffer and binds freshly allocated memory of a matching type to it.
    ///
    /// Nothing is left behind on failure: the buffer is destroyed again if no
    /// memory type fits or allocation/binding fails.
    pub fn create_buffer(
        &self,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> Result<(vk::Buffer, vk::DeviceMemory)> {
        let info = vk::BufferCreateInfo {
            s_type: vk::StructureType::BUFFER_CREATE_INFO,
            size,
            usage,
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            ..Default::default()
        };
        let buffer = unsafe { self.gpu.create_buffer(&info) }.call("vkCreateBuffer")?;

        let requirements = unsafe { self.gpu.buffer_memory_requirements(buffer) };
        let bound = self.allocate_and_bind(requirements, properties, |memory| unsafe {
            self.gpu.bind_buffer_memory(buffer, memory, 0)
        });
        match bound {
            Ok(memory) => Ok((buffer, memory)),
            Err(e) => {
                unsafe { self.gpu.destroy_buffer(buffer) };
                Err(e)
            }
        }
    }

    /// Image counterpart of [`create_buffer`](Self::create_buffer).
    pub fn create_image_with_info(
        &self,
        info: &vk::ImageCreateInfo<'_>,
        properties: vk::MemoryPropertyFlags,
    ) -> Result<(vk::Image, vk::DeviceMemory)> {
        let image = unsafe { self.gpu.create_image(info) }.call("vkCreateImage")?;

        let requirements = unsafe { self.gpu.image_memory_requirements(image) };
        let bound = self.allocate_and_bind(requirements, properties, |memory| unsafe {
            self.gpu.bind_image_memory(image, memory, 0)
        });
        match bound {
            Ok(memory) => Ok((image, memory)),
            Err(e) => {
                unsafe { self.gpu.destroy_image(image) };
                Err(e)
            }
        }
    }

    fn allocate_and_bind(
        &self,
        requirements: vk::MemoryRequirements,
        properties: vk::MemoryPropertyFlags,
        bind: impl FnOnce(vk::DeviceMemory) -> ash::prelude::VkResult<()>,
    ) -> Result<vk::DeviceMemory> {
        let memory_type_index = self
            .find_memory_type(requirements.memory_type_bits, properties)
            .ok_or(RenderError::NoMemoryType {
                type_filter: requirements.memory_type_bits,
                properties,
            })?;
        let alloc = vk::MemoryAllocateInfo {
            s_type: vk::StructureType::MEMORY_ALLOCATE_INFO,
            allocation_size: requirements.size,
            memory_type_index,
            ..Default::default()
        };
        let memory = unsafe { self.gpu.allocate_memory(&alloc) }.call("vkAllocateMemory")?;
        if let Err(result) = bind(memory) {
            unsafe { self.gpu.free_memory(memory) };
            return Err(RenderError::Vk {
                call: "vkBind*Memory",
                result,
            });
        }
        Ok(memory)
    }

    /// # Safety
    /// `buffer` and `memory` came from [`create_buffer`](Self::create_buffer)
    /// and the GPU no longer uses them.
    pub unsafe fn destroy_buffer(&self, buffer: vk::Buffer, memory: vk::DeviceMemory) {
        unsafe {
            self.gpu.destroy_buffer(buffer);
            self.gpu.free_memory(memory);
        }
    }

    /// # Safety
    /// `image` and `memory` came from
    /// [`create_image_with_info`](Self::create_image_with_info) and the GPU no
    /// longer uses them.
    pub unsafe fn destroy_image(&self, image: vk::Image, memory: vk::DeviceMemory) {
        unsafe {
            self.gpu.destroy_image(image);
            self.gpu.free_memory(memory);
        }
    }

    /// A primary command buffer, already begun for one-time submission.
    pub fn begin_single_time_commands(&self) -> Result<vk::CommandBuffer> {
        let cmd = unsafe { self.gpu.allocate_command_buffers(self.command_pool, 1) }
            .call("vkAllocateCommandBuffers")?
            .into_iter()
            .next()
            .ok_or(RenderError::Vk {
                call: "vkAllocateCommandBuffers",
                result: vk::Result::ERROR_UNKNOWN,
            })?;
        let begun = unsafe {
            self.gpu
                .begin_command_buffer(cmd, vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT)
        };
        if let Err(result) = begun {
            unsafe { self.gpu.free_command_buffers(self.command_pool, &[cmd]) };
            return Err(RenderError::Vk {
                call: "vkBeginCommandBuffer",
                result,
            });
        }
        Ok(cmd)
    }

    /// Ends, submits and frees `cmd`.
    ///
    /// Blocks until the graphics queue is idle. Meant for setup-time transfers,
    /// never for per-frame work.
    ///
    /// # Safety
    /// `cmd` came from [`begin_single_time_commands`](Self::begin_single_time_commands)
    /// and every handle recorded into it is still alive.
    pub unsafe fn end_single_time_commands(&self, cmd: vk::CommandBuffer) -> Result<()> {
        let submitted = unsafe {
            self.gpu
                .end_command_buffer(cmd)
                .call("vkEndCommandBuffer")
                .and_then(|()| {
                    let submit = vk::SubmitInfo {
                        s_type: vk::StructureType::SUBMIT_INFO,
                        command_buffer_count: 1,
                        p_command_buffers: &cmd,
                        ..Default::default()
                    };
                    self.gpu
                        .queue_submit(&submit, vk::Fence::null())
                        .call("vkQueueSubmit")
                })
                .and_then(|()| self.gpu.graphics_queue_wait_idle().call("vkQueueWaitIdle"))
        };
        unsafe { self.gpu.free_command_buffers(self.command_pool, &[cmd]) };
        submitted
    }

    /// # Safety
    /// Both buffers are alive, `src` has `TRANSFER_SRC` and `dst` has
    /// `TRANSFER_DST` usage, and both hold at least `size` bytes.
    pub unsafe fn copy_buffer(
        &self,
        src: vk::Buffer,
        dst: vk::Buffer,
        size: vk::DeviceSize,
    ) -> Result<()> {
        let cmd = self.begin_single_time_commands()?;
        let region = vk::BufferCopy {
            src_offset: 0,
            dst_offset: 0,
            size,
        };
        unsafe {
            self.gpu.cmd_copy_buffer(cmd, src, dst, &[region]);
            self.end_single_time_commands(cmd)
        }
    }

    /// Moves a color image between the layouts a texture upload needs:
    /// `UNDEFINED -> TRANSFER_DST_OPTIMAL` and
    /// `TRANSFER_DST_OPTIMAL -> SHADER_READ_ONLY_OPTIMAL`.
    ///
    /// # Safety
    /// `image` is alive, currently in `old_layout` and has `mip_levels` levels.
    pub unsafe fn transition_image_layout(
        &self,
        image: vk::Image,
        old_layout: vk::ImageLayout,
        new_layout: vk::ImageLayout,
        mip_levels: u32,
    ) -> Result<()> {
        let (src_access, dst_access, src_stage, dst_stage) = match (old_layout, new_layout) {
            (vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL) => (
                vk::AccessFlags::empty(),
                vk::AccessFlags::TRANSFER_WRITE,
                vk::PipelineStageFlags::TOP_OF_PIPE,
                vk::PipelineStageFlags::TRANSFER,
            ),
            (vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL) => (
                vk::AccessFlags::TRANSFER_WRITE,
                vk::AccessFlags::SHADER_READ,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
            ),
            (from, to) => return Err(RenderError::UnsupportedLayoutTransition { from, to }),
        };

        let barrier = vk::ImageMemoryBarrier {
            s_type: vk::StructureType::IMAGE_MEMORY_BARRIER,
            old_layout,
            new_layout,
            src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            image,
            subresource_range: vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: mip_levels,
                base_array_layer: 0,
                layer_count: 1,
            },
            src_access_mask: src_access,
            dst_access_mask: dst_access,
            ..Default::default()
        };

        let cmd = self.begin_single_time_commands()?;
        unsafe {
            self.gpu
                .cmd_pipeline_barrier(cmd, src_stage, dst_stage, &[barrier]);
            self.end_single_time_commands(cmd)
        }
    }

    /// # Safety
    /// `image` is in `TRANSFER_DST_OPTIMAL` and `buffer` holds a tightly
    /// packed `width x height` color image.
    pub unsafe fn copy_buffer_to_image(
        &self,
        buffer: vk::Buffer,
        image: vk::Image,
        width: u32,
        height: u32,
    ) -> Result<()> {
        let region = vk::BufferImageCopy {
            buffer_offset: 0,
            buffer_row_length: 0,
            buffer_image_height: 0,
            image_subresource: vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            },
            image_offset: vk::Offset3D { x: 0, y: 0, z: 0 },
            image_extent: vk::Extent3D {
                width,
                height,
                depth: 1,
            },
        };

        let cmd = self.begin_single_time_commands()?;
        unsafe {
            self.gpu.cmd_copy_buffer_to_image(
                cmd,
                buffer,
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );
            self.end_single_time_commands(cmd)
        }
    }

    pub fn wait_idle(&self) -> Result<()> {
        unsafe { self.gpu.device_wait_idle() }.call("vkDeviceWaitIdle")
    }
}

impl<G: Gpu> Drop for Device<G> {
    fn drop(&mut self) {
        unsafe { self.gpu.destroy_command_pool(self.command_pool) };
    }
}
