// SPDX-License-Identifier: CEPL-1.0
//! In-memory [`Gpu`] and [`FrameWindow`] doubles for unit tests.
//!
//! The mock hands out unique handles, keeps a ledger of live objects per kind
//! and logs the calls whose order matters. Submitted work completes
//! instantly unless `complete_submissions` is switched off.

use std::cell::{RefCell, RefMut};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::ffi::c_void;

use ash::prelude::VkResult;
use ash::vk::{self, Handle};
use yib_render::{FrameWindow, RenderSize};

use crate::gpu::{Gpu, SurfaceSupport};
use crate::select::QueueFamilyIndices;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    Buffer,
    Image,
    Memory,
    ImageView,
    RenderPass,
    Framebuffer,
    Semaphore,
    Fence,
    CommandPool,
    CommandBuffer,
    Swapchain,
    SetLayout,
    DescriptorPool,
    DescriptorSet,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Create(Kind, u64),
    Destroy(Kind, u64),
    CreateSwapchain {
        handle: u64,
        old: u64,
        extent: (u32, u32),
        min_image_count: u32,
        concurrent: bool,
        present_mode: vk::PresentModeKHR,
    },
    WaitFence(u64),
    ResetFence(u64),
    Submit {
        cmd: u64,
        wait: Vec<u64>,
        signal: Vec<u64>,
        fence: u64,
    },
    Acquire {
        swapchain: u64,
        semaphore: u64,
    },
    Present {
        swapchain: u64,
        image: u32,
        wait: Vec<u64>,
    },
    BeginCommandBuffer(u64, vk::CommandBufferUsageFlags),
    EndCommandBuffer(u64),
    CopyBuffer {
        src: u64,
        dst: u64,
        size: u64,
    },
    CopyBufferToImage {
        src: u64,
        dst: u64,
        extent: (u32, u32),
    },
    Barrier {
        old: vk::ImageLayout,
        new: vk::ImageLayout,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
    },
    BeginRenderPass {
        framebuffer: u64,
        extent: (u32, u32),
        clear_color: [f32; 4],
        clear_depth: f32,
    },
    EndRenderPass,
    Viewport([f32; 4]),
    Scissor((u32, u32)),
    QueueWaitIdle,
    DeviceWaitIdle,
    Map {
        memory: u64,
        offset: u64,
        size: u64,
    },
    Unmap(u64),
    Flush {
        offset: u64,
        size: u64,
    },
    Invalidate {
        offset: u64,
        size: u64,
    },
    WriteDescriptors(Vec<(u64, u32, vk::DescriptorType)>),
    FreeDescriptorSets(usize),
    ResetDescriptorPool(u64),
}

pub struct MockState {
    next_handle: u64,
    pub live: BTreeMap<u64, Kind>,
    pub log: Vec<Call>,
    pub surface: SurfaceSupport,
    pub acquire_script: VecDeque<VkResult<(u32, bool)>>,
    pub present_script: VecDeque<VkResult<bool>>,
    pub complete_submissions: bool,
    /// Calls named here fail with the given result until removed.
    pub fail: HashMap<&'static str, vk::Result>,
    pub memory_type_bits: u32,
    pub render_pass_attachments: Vec<vk::AttachmentDescription>,
    pub render_pass_dependency: Option<vk::SubpassDependency>,
    buffer_sizes: HashMap<u64, u64>,
    memory: HashMap<u64, Vec<u8>>,
    fences: HashMap<u64, bool>,
    swapchain_images: HashMap<u64, usize>,
    next_image: u32,
}

pub struct MockGpu {
    pub families: QueueFamilyIndices,
    pub properties: vk::PhysicalDeviceProperties,
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    /// Formats reporting depth-stencil attachment support with optimal tiling.
    pub depth_formats: Vec<vk::Format>,
    state: RefCell<MockState>,
}

pub const DEVICE_LOCAL_TYPE: u32 = 0;
pub const HOST_VISIBLE_TYPE: u32 = 1;

impl MockGpu {
    pub fn new() -> Self {
        let mut memory_properties = vk::PhysicalDeviceMemoryProperties {
            memory_type_count: 2,
            ..Default::default()
        };
        memory_properties.memory_types[DEVICE_LOCAL_TYPE as usize].property_flags =
            vk::MemoryPropertyFlags::DEVICE_LOCAL;
        memory_properties.memory_types[HOST_VISIBLE_TYPE as usize].property_flags =
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;

        let mut properties = vk::PhysicalDeviceProperties::default();
        properties.limits.min_uniform_buffer_offset_alignment = 256;

        let surface = SurfaceSupport {
            capabilities: vk::SurfaceCapabilitiesKHR {
                min_image_count: 2,
                max_image_count: 3,
                current_extent: vk::Extent2D {
                    width: u32::MAX,
                    height: u32::MAX,
                },
                min_image_extent: vk::Extent2D {
                    width: 1,
                    height: 1,
                },
                max_image_extent: vk::Extent2D {
                    width: 4096,
                    height: 4096,
                },
                current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
                ..Default::default()
            },
            formats: vec![vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            }],
            present_modes: vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX],
        };

        Self {
            families: QueueFamilyIndices {
                graphics: 0,
                present: 0,
            },
            properties,
            memory_properties,
            depth_formats: vec![vk::Format::D32_SFLOAT],
            state: RefCell::new(MockState {
                next_handle: 1,
                live: BTreeMap::new(),
                log: Vec::new(),
                surface,
                acquire_script: VecDeque::new(),
                present_script: VecDeque::new(),
                complete_submissions: true,
                fail: HashMap::new(),
                memory_type_bits: 0b11,
                render_pass_attachments: Vec::new(),
                render_pass_dependency: None,
                buffer_sizes: HashMap::new(),
                memory: HashMap::new(),
                fences: HashMap::new(),
                swapchain_images: HashMap::new(),
                next_image: 0,
            }),
        }
    }

    pub fn state(&self) -> RefMut<'_, MockState> {
        self.state.borrow_mut()
    }

    pub fn log(&self) -> Vec<Call> {
        self.state.borrow().log.clone()
    }

    pub fn clear_log(&self) {
        self.state.borrow_mut().log.clear();
    }

    pub fn live(&self, kind: Kind) -> usize {
        self.state.borrow().live.values().filter(|&&k| k == kind).count()
    }

    pub fn live_total(&self) -> usize {
        self.state.borrow().live.len()
    }

    pub fn is_live(&self, raw: u64) -> bool {
        self.state.borrow().live.contains_key(&raw)
    }

    pub fn fence_signaled(&self, raw: u64) -> bool {
        self.state.borrow().fences.get(&raw).copied().unwrap_or(false)
    }

    pub fn memory_bytes(&self, memory: vk::DeviceMemory) -> Vec<u8> {
        self.state.borrow().memory[&memory.as_raw()].clone()
    }

    fn check(&self, call: &'static str) -> VkResult<()> {
        match self.state.borrow().fail.get(call) {
            Some(&err) => Err(err),
            None => Ok(()),
        }
    }

    fn make<H: Handle>(&self, kind: Kind) -> H {
        let mut s = self.state.borrow_mut();
        let raw = s.next_handle;
        s.next_handle += 1;
        s.live.insert(raw, kind);
        s.log.push(Call::Create(kind, raw));
        H::from_raw(raw)
    }

    fn release<H: Handle>(&self, kind: Kind, handle: H) {
        let raw = handle.as_raw();
        let mut s = self.state.borrow_mut();
        let removed = s.live.remove(&raw);
        assert_eq!(removed, Some(kind), "destroying unknown or mistyped handle {raw}");
        s.log.push(Call::Destroy(kind, raw));
    }

    fn push(&self, call: Call) {
        self.state.borrow_mut().log.push(call);
    }
}

fn raws<H: Handle + Copy>(ptr: *const H, count: u32) -> Vec<u64> {
    if ptr.is_null() || count == 0 {
        return Vec::new();
    }
    unsafe { std::slice::from_raw_parts(ptr, count as usize) }
        .iter()
        .map(|h| h.as_raw())
        .collect()
}

impl Gpu for MockGpu {
    fn queue_families(&self) -> QueueFamilyIndices {
        self.families
    }

    fn properties(&self) -> &vk::PhysicalDeviceProperties {
        &self.properties
    }

    fn memory_properties(&self) -> &vk::PhysicalDeviceMemoryProperties {
        &self.memory_properties
    }

    fn format_properties(&self, format: vk::Format) -> vk::FormatProperties {
        let mut props = vk::FormatProperties::default();
        if self.depth_formats.contains(&format) {
            props.optimal_tiling_features = vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT;
        }
        props
    }

    fn surface(&self) -> vk::SurfaceKHR {
        vk::SurfaceKHR::from_raw(0xface)
    }

    fn surface_support(&self) -> VkResult<SurfaceSupport> {
        Ok(self.state.borrow().surface.clone())
    }

    unsafe fn create_buffer(&self, info: &vk::BufferCreateInfo<'_>) -> VkResult<vk::Buffer> {
        self.check("create_buffer")?;
        let buffer: vk::Buffer = self.make(Kind::Buffer);
        self.state
            .borrow_mut()
            .buffer_sizes
            .insert(buffer.as_raw(), info.size);
        Ok(buffer)
    }

    unsafe fn destroy_buffer(&self, buffer: vk::Buffer) {
        self.release(Kind::Buffer, buffer);
        self.state.borrow_mut().buffer_sizes.remove(&buffer.as_raw());
    }

    unsafe fn buffer_memory_requirements(&self, buffer: vk::Buffer) -> vk::MemoryRequirements {
        let s = self.state.borrow();
        vk::MemoryRequirements {
            size: s.buffer_sizes.get(&buffer.as_raw()).copied().unwrap_or(0),
            alignment: 16,
            memory_type_bits: s.memory_type_bits,
        }
    }

    unsafe fn bind_buffer_memory(
        &self,
        _buffer: vk::Buffer,
        _memory: vk::DeviceMemory,
        _offset: vk::DeviceSize,
    ) -> VkResult<()> {
        self.check("bind_buffer_memory")
    }

    unsafe fn create_image(&self, _info: &vk::ImageCreateInfo<'_>) -> VkResult<vk::Image> {
        self.check("create_image")?;
        Ok(self.make(Kind::Image))
    }

    unsafe fn destroy_image(&self, image: vk::Image) {
        self.release(Kind::Image, image)
    }

    unsafe fn image_memory_requirements(&self, _image: vk::Image) -> vk::MemoryRequirements {
        vk::MemoryRequirements {
            size: 64,
            alignment: 16,
            memory_type_bits: self.state.borrow().memory_type_bits,
        }
    }

    unsafe fn bind_image_memory(
        &self,
        _image: vk::Image,
        _memory: vk::DeviceMemory,
        _offset: vk::DeviceSize,
    ) -> VkResult<()> {
        self.check("bind_image_memory")
    }

    unsafe fn allocate_memory(
        &self,
        info: &vk::MemoryAllocateInfo<'_>,
    ) -> VkResult<vk::DeviceMemory> {
        self.check("allocate_memory")?;
        let memory: vk::DeviceMemory = self.make(Kind::Memory);
        self.state
            .borrow_mut()
            .memory
            .insert(memory.as_raw(), vec![0; info.allocation_size as usize]);
        Ok(memory)
    }

    unsafe fn free_memory(&self, memory: vk::DeviceMemory) {
        self.release(Kind::Memory, memory);
        self.state.borrow_mut().memory.remove(&memory.as_raw());
    }

    unsafe fn map_memory(
        &self,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
    ) -> VkResult<*mut c_void> {
        self.check("map_memory")?;
        self.push(Call::Map {
            memory: memory.as_raw(),
            offset,
            size,
        });
        let mut s = self.state.borrow_mut();
        let bytes = s
            .memory
            .get_mut(&memory.as_raw())
            .ok_or(vk::Result::ERROR_MEMORY_MAP_FAILED)?;
        if offset as usize > bytes.len() {
            return Err(vk::Result::ERROR_MEMORY_MAP_FAILED);
        }
        Ok(unsafe { bytes.as_mut_ptr().add(offset as usize) }.cast())
    }

    unsafe fn unmap_memory(&self, memory: vk::DeviceMemory) {
        self.push(Call::Unmap(memory.as_raw()));
    }

    unsafe fn flush_mapped_range(&self, range: &vk::MappedMemoryRange<'_>) -> VkResult<()> {
        self.push(Call::Flush {
            offset: range.offset,
            size: range.size,
        });
        Ok(())
    }

    unsafe fn invalidate_mapped_range(&self, range: &vk::MappedMemoryRange<'_>) -> VkResult<()> {
        self.push(Call::Invalidate {
            offset: range.offset,
            size: range.size,
        });
        Ok(())
    }

    unsafe fn create_image_view(
        &self,
        _info: &vk::ImageViewCreateInfo<'_>,
    ) -> VkResult<vk::ImageView> {
        self.check("create_image_view")?;
        Ok(self.make(Kind::ImageView))
    }

    unsafe fn destroy_image_view(&self, view: vk::ImageView) {
        self.release(Kind::ImageView, view)
    }

    unsafe fn create_render_pass(
        &self,
        info: &vk::RenderPassCreateInfo<'_>,
    ) -> VkResult<vk::RenderPass> {
        self.check("create_render_pass")?;
        {
            let mut s = self.state.borrow_mut();
            s.render_pass_attachments = unsafe {
                std::slice::from_raw_parts(info.p_attachments, info.attachment_count as usize)
            }
            .to_vec();
            s.render_pass_dependency = (info.dependency_count > 0)
                .then(|| unsafe { *info.p_dependencies });
        }
        Ok(self.make(Kind::RenderPass))
    }

    unsafe fn destroy_render_pass(&self, render_pass: vk::RenderPass) {
        self.release(Kind::RenderPass, render_pass)
    }

    unsafe fn create_framebuffer(
        &self,
        _info: &vk::FramebufferCreateInfo<'_>,
    ) -> VkResult<vk::Framebuffer> {
        self.check("create_framebuffer")?;
        Ok(self.make(Kind::Framebuffer))
    }

    unsafe fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        self.release(Kind::Framebuffer, framebuffer)
    }

    unsafe fn create_semaphore(&self) -> VkResult<vk::Semaphore> {
        self.check("create_semaphore")?;
        Ok(self.make(Kind::Semaphore))
    }

    unsafe fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        self.release(Kind::Semaphore, semaphore)
    }

    unsafe fn create_fence(&self, signaled: bool) -> VkResult<vk::Fence> {
        self.check("create_fence")?;
        let fence: vk::Fence = self.make(Kind::Fence);
        self.state
            .borrow_mut()
            .fences
            .insert(fence.as_raw(), signaled);
        Ok(fence)
    }

    unsafe fn destroy_fence(&self, fence: vk::Fence) {
        self.release(Kind::Fence, fence);
        self.state.borrow_mut().fences.remove(&fence.as_raw());
    }

    unsafe fn wait_for_fence(&self, fence: vk::Fence, _timeout_ns: u64) -> VkResult<()> {
        self.push(Call::WaitFence(fence.as_raw()));
        if self.fence_signaled(fence.as_raw()) {
            Ok(())
        } else {
            // nothing will ever signal it
            Err(vk::Result::TIMEOUT)
        }
    }

    unsafe fn reset_fence(&self, fence: vk::Fence) -> VkResult<()> {
        self.push(Call::ResetFence(fence.as_raw()));
        self.state
            .borrow_mut()
            .fences
            .insert(fence.as_raw(), false);
        Ok(())
    }

    unsafe fn create_command_pool(
        &self,
        _info: &vk::CommandPoolCreateInfo<'_>,
    ) -> VkResult<vk::CommandPool> {
        self.check("create_command_pool")?;
        Ok(self.make(Kind::CommandPool))
    }

    unsafe fn destroy_command_pool(&self, pool: vk::CommandPool) {
        self.release(Kind::CommandPool, pool)
    }

    unsafe fn allocate_command_buffers(
        &self,
        _pool: vk::CommandPool,
        count: u32,
    ) -> VkResult<Vec<vk::CommandBuffer>> {
        self.check("allocate_command_buffers")?;
        Ok((0..count).map(|_| self.make(Kind::CommandBuffer)).collect())
    }

    unsafe fn free_command_buffers(&self, _pool: vk::CommandPool, buffers: &[vk::CommandBuffer]) {
        for &cmd in buffers {
            self.release(Kind::CommandBuffer, cmd);
        }
    }

    unsafe fn begin_command_buffer(
        &self,
        cmd: vk::CommandBuffer,
        flags: vk::CommandBufferUsageFlags,
    ) -> VkResult<()> {
        self.check("begin_command_buffer")?;
        self.push(Call::BeginCommandBuffer(cmd.as_raw(), flags));
        Ok(())
    }

    unsafe fn end_command_buffer(&self, cmd: vk::CommandBuffer) -> VkResult<()> {
        self.check("end_command_buffer")?;
        self.push(Call::EndCommandBuffer(cmd.as_raw()));
        Ok(())
    }

    unsafe fn cmd_copy_buffer(
        &self,
        _cmd: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Buffer,
        regions: &[vk::BufferCopy],
    ) {
        self.push(Call::CopyBuffer {
            src: src.as_raw(),
            dst: dst.as_raw(),
            size: regions.iter().map(|r| r.size).sum(),
        });
    }

    unsafe fn cmd_copy_buffer_to_image(
        &self,
        _cmd: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Image,
        _dst_layout: vk::ImageLayout,
        regions: &[vk::BufferImageCopy],
    ) {
        let extent = regions
            .first()
            .map(|r| (r.image_extent.width, r.image_extent.height))
            .unwrap_or_default();
        self.push(Call::CopyBufferToImage {
            src: src.as_raw(),
            dst: dst.as_raw(),
            extent,
        });
    }

    unsafe fn cmd_pipeline_barrier(
        &self,
        _cmd: vk::CommandBuffer,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
        image_barriers: &[vk::ImageMemoryBarrier<'_>],
    ) {
        for b in image_barriers {
            self.push(Call::Barrier {
                old: b.old_layout,
                new: b.new_layout,
                src_stage,
                dst_stage,
            });
        }
    }

    unsafe fn cmd_begin_render_pass(
        &self,
        _cmd: vk::CommandBuffer,
        info: &vk::RenderPassBeginInfo<'_>,
    ) {
        let count = info.clear_value_count as usize;
        let clears = unsafe { std::slice::from_raw_parts(info.p_clear_values, count) };
        let clear_color = unsafe { clears[0].color.float32 };
        let clear_depth = unsafe { clears[1].depth_stencil.depth };
        self.push(Call::BeginRenderPass {
            framebuffer: info.framebuffer.as_raw(),
            extent: (info.render_area.extent.width, info.render_area.extent.height),
            clear_color,
            clear_depth,
        });
    }

    unsafe fn cmd_end_render_pass(&self, _cmd: vk::CommandBuffer) {
        self.push(Call::EndRenderPass);
    }

    unsafe fn cmd_set_viewport(&self, _cmd: vk::CommandBuffer, viewport: vk::Viewport) {
        self.push(Call::Viewport([
            viewport.x,
            viewport.y,
            viewport.width,
            viewport.height,
        ]));
    }

    unsafe fn cmd_set_scissor(&self, _cmd: vk::CommandBuffer, scissor: vk::Rect2D) {
        self.push(Call::Scissor((scissor.extent.width, scissor.extent.height)));
    }

    unsafe fn queue_submit(&self, submit: &vk::SubmitInfo<'_>, fence: vk::Fence) -> VkResult<()> {
        self.check("queue_submit")?;
        let cmd = raws(submit.p_command_buffers, submit.command_buffer_count);
        self.push(Call::Submit {
            cmd: cmd.first().copied().unwrap_or(0),
            wait: raws(submit.p_wait_semaphores, submit.wait_semaphore_count),
            signal: raws(submit.p_signal_semaphores, submit.signal_semaphore_count),
            fence: fence.as_raw(),
        });
        let mut s = self.state.borrow_mut();
        if s.complete_submissions && fence != vk::Fence::null() {
            s.fences.insert(fence.as_raw(), true);
        }
        Ok(())
    }

    unsafe fn graphics_queue_wait_idle(&self) -> VkResult<()> {
        self.push(Call::QueueWaitIdle);
        Ok(())
    }

    unsafe fn device_wait_idle(&self) -> VkResult<()> {
        self.push(Call::DeviceWaitIdle);
        Ok(())
    }

    unsafe fn create_swapchain(
        &self,
        info: &vk::SwapchainCreateInfoKHR<'_>,
    ) -> VkResult<vk::SwapchainKHR> {
        self.check("create_swapchain")?;
        let swapchain: vk::SwapchainKHR = self.make(Kind::Swapchain);
        let mut s = self.state.borrow_mut();
        s.swapchain_images
            .insert(swapchain.as_raw(), info.min_image_count as usize);
        s.log.push(Call::CreateSwapchain {
            handle: swapchain.as_raw(),
            old: info.old_swapchain.as_raw(),
            extent: (info.image_extent.width, info.image_extent.height),
            min_image_count: info.min_image_count,
            concurrent: info.image_sharing_mode == vk::SharingMode::CONCURRENT,
            present_mode: info.present_mode,
        });
        s.next_image = 0;
        Ok(swapchain)
    }

    unsafe fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>> {
        let mut s = self.state.borrow_mut();
        let count = s.swapchain_images[&swapchain.as_raw()];
        // presentable images belong to the swap chain, not to the ledger
        let images = (0..count)
            .map(|_| {
                let raw = s.next_handle;
                s.next_handle += 1;
                vk::Image::from_raw(raw)
            })
            .collect();
        Ok(images)
    }

    unsafe fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR) {
        self.release(Kind::Swapchain, swapchain);
    }

    unsafe fn acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        _timeout_ns: u64,
        semaphore: vk::Semaphore,
    ) -> VkResult<(u32, bool)> {
        self.push(Call::Acquire {
            swapchain: swapchain.as_raw(),
            semaphore: semaphore.as_raw(),
        });
        let mut s = self.state.borrow_mut();
        if let Some(scripted) = s.acquire_script.pop_front() {
            return scripted;
        }
        let count = s.swapchain_images[&swapchain.as_raw()] as u32;
        let index = s.next_image % count;
        s.next_image += 1;
        Ok((index, false))
    }

    unsafe fn queue_present(&self, info: &vk::PresentInfoKHR<'_>) -> VkResult<bool> {
        let image = unsafe { *info.p_image_indices };
        self.push(Call::Present {
            swapchain: raws(info.p_swapchains, info.swapchain_count)[0],
            image,
            wait: raws(info.p_wait_semaphores, info.wait_semaphore_count),
        });
        self.state
            .borrow_mut()
            .present_script
            .pop_front()
            .unwrap_or(Ok(false))
    }

    unsafe fn create_descriptor_set_layout(
        &self,
        _info: &vk::DescriptorSetLayoutCreateInfo<'_>,
    ) -> VkResult<vk::DescriptorSetLayout> {
        self.check("create_descriptor_set_layout")?;
        Ok(self.make(Kind::SetLayout))
    }

    unsafe fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout) {
        self.release(Kind::SetLayout, layout)
    }

    unsafe fn create_descriptor_pool(
        &self,
        _info: &vk::DescriptorPoolCreateInfo<'_>,
    ) -> VkResult<vk::DescriptorPool> {
        self.check("create_descriptor_pool")?;
        Ok(self.make(Kind::DescriptorPool))
    }

    unsafe fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool) {
        self.release(Kind::DescriptorPool, pool);
        // sets go with their pool
        let mut s = self.state.borrow_mut();
        s.live.retain(|_, k| *k != Kind::DescriptorSet);
    }

    unsafe fn allocate_descriptor_sets(
        &self,
        info: &vk::DescriptorSetAllocateInfo<'_>,
    ) -> VkResult<Vec<vk::DescriptorSet>> {
        self.check("allocate_descriptor_sets")?;
        Ok((0..info.descriptor_set_count)
            .map(|_| self.make(Kind::DescriptorSet))
            .collect())
    }

    unsafe fn free_descriptor_sets(
        &self,
        _pool: vk::DescriptorPool,
        sets: &[vk::DescriptorSet],
    ) -> VkResult<()> {
        for &set in sets {
            self.release(Kind::DescriptorSet, set);
        }
        self.push(Call::FreeDescriptorSets(sets.len()));
        Ok(())
    }

    unsafe fn reset_descriptor_pool(&self, pool: vk::DescriptorPool) -> VkResult<()> {
        let mut s = self.state.borrow_mut();
        s.live.retain(|_, k| *k != Kind::DescriptorSet);
        s.log.push(Call::ResetDescriptorPool(pool.as_raw()));
        Ok(())
    }

    unsafe fn update_descriptor_sets(&self, writes: &[vk::WriteDescriptorSet<'_>]) {
        self.push(Call::WriteDescriptors(
            writes
                .iter()
                .map(|w| (w.dst_set.as_raw(), w.dst_binding, w.descriptor_type))
                .collect(),
        ));
    }
}

/// Window whose size follows a script, one entry per `wait_events`.
pub struct MockWindow {
    pub size: RenderSize,
    pub resized: bool,
    pub pending: VecDeque<RenderSize>,
    pub waits: usize,
    pub closing: bool,
}

impl MockWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: RenderSize::new(width, height),
            resized: false,
            pending: VecDeque::new(),
            waits: 0,
            closing: false,
        }
    }
}

impl FrameWindow for MockWindow {
    fn size(&self) -> RenderSize {
        self.size
    }

    fn was_resized(&self) -> bool {
        self.resized
    }

    fn reset_resized(&mut self) {
        self.resized = false;
    }

    fn wait_events(&mut self) {
        self.waits += 1;
        match self.pending.pop_front() {
            Some(size) => {
                self.size = size;
                self.resized = true;
            }
            // script ran dry, behave like a user closing the window
            None => self.closing = true,
        }
    }

    fn close_requested(&self) -> bool {
        self.closing
    }
}
