// SPDX-License-Identifier: CEPL-1.0
use std::rc::Rc;
use std::time::Duration;

use ash::vk;
use tracing::{debug, info};
use yib_render::RenderSize;

use crate::ash_gpu::AshGpu;
use crate::device::Device;
use crate::error::{RenderError, Result, VkResultExt};
use crate::gpu::Gpu;
use crate::select::{
    choose_present_mode, choose_surface_format, extent_from_caps, image_count_from_caps,
    DEPTH_FORMAT_CANDIDATES,
};

/// Frames whose GPU work may overlap with recording of the next one.
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VsyncMode {
    /// Always FIFO.
    Fifo,
    /// MAILBOX when the surface offers it, FIFO otherwise.
    #[default]
    Mailbox,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SwapChainConfig {
    pub vsync_mode: VsyncMode,
    /// Bounds both frame fence waits and image acquisition. `None` waits
    /// forever; an expired wait is reported as [`RenderError::FenceTimeout`].
    pub fence_timeout: Option<Duration>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Acquire {
    Image { index: u32, suboptimal: bool },
    /// The surface changed under the chain; rebuild before drawing.
    OutOfDate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresentOutcome {
    Presented,
    /// Out of date or suboptimal; the chain should be rebuilt.
    Stale,
}

#[derive(Clone, Copy, Default)]
struct FrameSync {
    image_available: vk::Semaphore,
    render_finished: vk::Semaphore,
    in_flight: vk::Fence,
}

#[derive(Clone, Copy)]
struct DepthTarget {
    image: vk::Image,
    memory: vk::DeviceMemory,
    view: vk::ImageView,
}

/// Presentable images plus everything drawn into them: color views, one depth
/// target and framebuffer per image, the render pass, and the sync objects of
/// each frame slot.
///
/// Built in one go by [`SwapChain::new`]; a failure part-way drops what was
/// created so far. Rebuilding means constructing a new chain with the old one
/// as `previous` and dropping the old one afterwards.
pub struct SwapChain<G: Gpu = AshGpu> {
    device: Rc<Device<G>>,
    config: SwapChainConfig,

    swapchain: vk::SwapchainKHR,
    image_format: vk::Format,
    depth_format: vk::Format,
    extent: vk::Extent2D,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    render_pass: vk::RenderPass,
    depth: Vec<DepthTarget>,
    framebuffers: Vec<vk::Framebuffer>,

    frames: Vec<FrameSync>,
    /// Frame slot whose fence guards each image, if any submission used it yet.
    images_in_flight: Vec<Option<usize>>,
    current_frame: usize,
}

impl<G: Gpu> SwapChain<G> {
    /// `previous` is only read: its handle is passed on as `oldSwapchain`.
    pub fn new(
        device: Rc<Device<G>>,
        window_extent: RenderSize,
        previous: Option<&SwapChain<G>>,
        config: SwapChainConfig,
    ) -> Result<Self> {
        let mut chain = Self {
            device,
            config,
            swapchain: vk::SwapchainKHR::null(),
            image_format: vk::Format::UNDEFINED,
            depth_format: vk::Format::UNDEFINED,
            extent: vk::Extent2D::default(),
            images: Vec::new(),
            image_views: Vec::new(),
            render_pass: vk::RenderPass::null(),
            depth: Vec::new(),
            framebuffers: Vec::new(),
            frames: Vec::with_capacity(MAX_FRAMES_IN_FLIGHT),
            images_in_flight: Vec::new(),
            current_frame: 0,
        };
        chain.create_swapchain(window_extent, previous)?;
        chain.create_image_views()?;
        chain.create_render_pass()?;
        chain.create_depth_resources()?;
        chain.create_framebuffers()?;
        chain.create_sync_objects()?;

        info!(
            width = chain.extent.width,
            height = chain.extent.height,
            images = chain.images.len(),
            format = ?chain.image_format,
            depth = ?chain.depth_format,
            "swap chain created"
        );
        Ok(chain)
    }

    fn create_swapchain(
        &mut self,
        window_extent: RenderSize,
        previous: Option<&SwapChain<G>>,
    ) -> Result<()> {
        let gpu = self.device.gpu();
        let support = gpu
            .surface_support()
            .call("vkGetPhysicalDeviceSurfaceCapabilitiesKHR")?;
        let surface_format = choose_surface_format(&support.formats).ok_or(RenderError::Vk {
            call: "vkGetPhysicalDeviceSurfaceFormatsKHR",
            result: vk::Result::ERROR_FORMAT_NOT_SUPPORTED,
        })?;
        let present_mode = choose_present_mode(&support.present_modes, self.config.vsync_mode);
        let caps = &support.capabilities;
        let extent = extent_from_caps(caps, window_extent);
        let min_image_count = image_count_from_caps(caps);

        let families = self.device.queue_families();
        let family_indices = [families.graphics, families.present];
        let (sharing_mode, family_count) = if families.is_shared() {
            (vk::SharingMode::EXCLUSIVE, 0)
        } else {
            (vk::SharingMode::CONCURRENT, family_indices.len() as u32)
        };

        let info = vk::SwapchainCreateInfoKHR {
            s_type: vk::StructureType::SWAPCHAIN_CREATE_INFO_KHR,
            surface: gpu.surface(),
            min_image_count,
            image_format: surface_format.format,
            image_color_space: surface_format.color_space,
            image_extent: extent,
            image_array_layers: 1,
            image_usage: vk::ImageUsageFlags::COLOR_ATTACHMENT,
            image_sharing_mode: sharing_mode,
            queue_family_index_count: family_count,
            p_queue_family_indices: if family_count > 0 {
                family_indices.as_ptr()
            } else {
                std::ptr::null()
            },
            pre_transform: caps.current_transform,
            composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
            present_mode,
            clipped: vk::TRUE,
            old_swapchain: previous.map_or(vk::SwapchainKHR::null(), |p| p.swapchain),
            ..Default::default()
        };
        self.swapchain = unsafe { gpu.create_swapchain(&info) }.call("vkCreateSwapchainKHR")?;
        self.images = unsafe { gpu.swapchain_images(self.swapchain) }
            .call("vkGetSwapchainImagesKHR")?;
        self.image_format = surface_format.format;
        self.extent = extent;
        self.images_in_flight = vec![None; self.images.len()];

        debug!(?present_mode, min_image_count, ?sharing_mode, "swap chain parameters");
        Ok(())
    }

    fn create_image_views(&mut self) -> Result<()> {
        for &image in &self.images {
            let view = create_view(
                self.device.gpu(),
                image,
                self.image_format,
                vk::ImageAspectFlags::COLOR,
            )?;
            self.image_views.push(view);
        }
        Ok(())
    }

    fn create_render_pass(&mut self) -> Result<()> {
        self.depth_format = self.device.find_supported_format(
            &DEPTH_FORMAT_CANDIDATES,
            vk::ImageTiling::OPTIMAL,
            vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
        );
        if self.depth_format == vk::Format::UNDEFINED {
            return Err(RenderError::NoDepthFormat);
        }

        let attachments = [
            vk::AttachmentDescription {
                format: self.image_format,
                samples: vk::SampleCountFlags::TYPE_1,
                load_op: vk::AttachmentLoadOp::CLEAR,
                store_op: vk::AttachmentStoreOp::STORE,
                stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
                stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
                initial_layout: vk::ImageLayout::UNDEFINED,
                final_layout: vk::ImageLayout::PRESENT_SRC_KHR,
                ..Default::default()
            },
            vk::AttachmentDescription {
                format: self.depth_format,
                samples: vk::SampleCountFlags::TYPE_1,
                load_op: vk::AttachmentLoadOp::CLEAR,
                store_op: vk::AttachmentStoreOp::DONT_CARE,
                stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
                stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
                initial_layout: vk::ImageLayout::UNDEFINED,
                final_layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
                ..Default::default()
            },
        ];
        let color_ref = vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        };
        let depth_ref = vk::AttachmentReference {
            attachment: 1,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        };
        let subpass = vk::SubpassDescription {
            pipeline_bind_point: vk::PipelineBindPoint::GRAPHICS,
            color_attachment_count: 1,
            p_color_attachments: &color_ref,
            p_depth_stencil_attachment: &depth_ref,
            ..Default::default()
        };
        // the first subpass may not write before the acquired image is ready
        let stages = vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
            | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS;
        let dependency = vk::SubpassDependency {
            src_subpass: vk::SUBPASS_EXTERNAL,
            dst_subpass: 0,
            src_stage_mask: stages,
            src_access_mask: vk::AccessFlags::empty(),
            dst_stage_mask: stages,
            dst_access_mask: vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            ..Default::default()
        };
        let info = vk::RenderPassCreateInfo {
            s_type: vk::StructureType::RENDER_PASS_CREATE_INFO,
            attachment_count: attachments.len() as u32,
            p_attachments: attachments.as_ptr(),
            subpass_count: 1,
            p_subpasses: &subpass,
            dependency_count: 1,
            p_dependencies: &dependency,
            ..Default::default()
        };
        self.render_pass =
            unsafe { self.device.gpu().create_render_pass(&info) }.call("vkCreateRenderPass")?;
        Ok(())
    }

    fn create_depth_resources(&mut self) -> Result<()> {
        let info = vk::ImageCreateInfo {
            s_type: vk::StructureType::IMAGE_CREATE_INFO,
            image_type: vk::ImageType::TYPE_2D,
            format: self.depth_format,
            extent: vk::Extent3D {
                width: self.extent.width,
                height: self.extent.height,
                depth: 1,
            },
            mip_levels: 1,
            array_layers: 1,
            samples: vk::SampleCountFlags::TYPE_1,
            tiling: vk::ImageTiling::OPTIMAL,
            usage: vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            initial_layout: vk::ImageLayout::UNDEFINED,
            ..Default::default()
        };
        for _ in 0..self.images.len() {
            let (image, memory) = self
                .device
                .create_image_with_info(&info, vk::MemoryPropertyFlags::DEVICE_LOCAL)?;
            self.depth.push(DepthTarget {
                image,
                memory,
                view: vk::ImageView::null(),
            });
            let view = create_view(
                self.device.gpu(),
                image,
                self.depth_format,
                vk::ImageAspectFlags::DEPTH,
            )?;
            if let Some(target) = self.depth.last_mut() {
                target.view = view;
            }
        }
        Ok(())
    }

    fn create_framebuffers(&mut self) -> Result<()> {
        for (&color, depth) in self.image_views.iter().zip(&self.depth) {
            let attachments = [color, depth.view];
            let info = vk::FramebufferCreateInfo {
                s_type: vk::StructureType::FRAMEBUFFER_CREATE_INFO,
                render_pass: self.render_pass,
                attachment_count: attachments.len() as u32,
                p_attachments: attachments.as_ptr(),
                width: self.extent.width,
                height: self.extent.height,
                layers: 1,
                ..Default::default()
            };
            let framebuffer = unsafe { self.device.gpu().create_framebuffer(&info) }
                .call("vkCreateFramebuffer")?;
            self.framebuffers.push(framebuffer);
        }
        Ok(())
    }

    fn create_sync_objects(&mut self) -> Result<()> {
        let gpu = self.device.gpu();
        for slot in 0..MAX_FRAMES_IN_FLIGHT {
            self.frames.push(FrameSync::default());
            let frame = &mut self.frames[slot];
            frame.image_available =
                unsafe { gpu.create_semaphore() }.call("vkCreateSemaphore")?;
            frame.render_finished =
                unsafe { gpu.create_semaphore() }.call("vkCreateSemaphore")?;
            // signaled so the first wait on each slot returns at once
            frame.in_flight = unsafe { gpu.create_fence(true) }.call("vkCreateFence")?;
        }
        Ok(())
    }

    /// Waits for the current slot's fence, then asks for the next image.
    ///
    /// Suboptimal images are handed out normally; [`Acquire::OutOfDate`] asks
    /// the caller to rebuild. Both the fence wait and the acquire block for
    /// as long as [`SwapChainConfig::fence_timeout`] allows.
    pub fn acquire_next_image(&mut self) -> Result<Acquire> {
        let frame = self.frames[self.current_frame];
        self.wait_fence(frame.in_flight)?;

        let acquired = unsafe {
            self.device.gpu().acquire_next_image(
                self.swapchain,
                self.timeout_ns(),
                frame.image_available,
            )
        };
        match acquired {
            Ok((index, suboptimal)) => Ok(Acquire::Image { index, suboptimal }),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(Acquire::OutOfDate),
            Err(vk::Result::TIMEOUT | vk::Result::NOT_READY) => Err(RenderError::FenceTimeout),
            Err(result) => Err(RenderError::Vk {
                call: "vkAcquireNextImageKHR",
                result,
            }),
        }
    }

    /// Submits `cmd` for `image_index` and presents it.
    ///
    /// Waits first for the slot that last rendered into this image, if any.
    /// The internal slot counter advances whether or not presentation succeeds.
    pub fn submit_command_buffers(
        &mut self,
        cmd: vk::CommandBuffer,
        image_index: u32,
    ) -> Result<PresentOutcome> {
        let image = image_index as usize;
        if let Some(slot) = self.images_in_flight[image] {
            self.wait_fence(self.frames[slot].in_flight)?;
        }
        self.images_in_flight[image] = Some(self.current_frame);

        let frame = self.frames[self.current_frame];
        let gpu = self.device.gpu();
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let submit = vk::SubmitInfo {
            s_type: vk::StructureType::SUBMIT_INFO,
            wait_semaphore_count: 1,
            p_wait_semaphores: &frame.image_available,
            p_wait_dst_stage_mask: wait_stages.as_ptr(),
            command_buffer_count: 1,
            p_command_buffers: &cmd,
            signal_semaphore_count: 1,
            p_signal_semaphores: &frame.render_finished,
            ..Default::default()
        };
        unsafe { gpu.reset_fence(frame.in_flight) }.call("vkResetFences")?;
        unsafe { gpu.queue_submit(&submit, frame.in_flight) }.call("vkQueueSubmit")?;

        let present = vk::PresentInfoKHR {
            s_type: vk::StructureType::PRESENT_INFO_KHR,
            wait_semaphore_count: 1,
            p_wait_semaphores: &frame.render_finished,
            swapchain_count: 1,
            p_swapchains: &self.swapchain,
            p_image_indices: &image_index,
            ..Default::default()
        };
        let presented = unsafe { gpu.queue_present(&present) };
        self.current_frame = (self.current_frame + 1) % MAX_FRAMES_IN_FLIGHT;

        match presented {
            Ok(false) => Ok(PresentOutcome::Presented),
            Ok(true) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentOutcome::Stale),
            Err(result) => Err(RenderError::Vk {
                call: "vkQueuePresentKHR",
                result,
            }),
        }
    }

    fn timeout_ns(&self) -> u64 {
        self.config
            .fence_timeout
            .map_or(u64::MAX, |t| u64::try_from(t.as_nanos()).unwrap_or(u64::MAX))
    }

    fn wait_fence(&self, fence: vk::Fence) -> Result<()> {
        match unsafe { self.device.gpu().wait_for_fence(fence, self.timeout_ns()) } {
            Ok(()) => Ok(()),
            Err(vk::Result::TIMEOUT) => Err(RenderError::FenceTimeout),
            Err(result) => Err(RenderError::Vk {
                call: "vkWaitForFences",
                result,
            }),
        }
    }

    /// Same color and depth formats as `other`.
    pub fn compare_formats(&self, other: &SwapChain<G>) -> bool {
        self.image_format == other.image_format && self.depth_format == other.depth_format
    }

    pub fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass
    }

    pub fn framebuffer(&self, index: usize) -> vk::Framebuffer {
        self.framebuffers[index]
    }

    pub fn image_format(&self) -> vk::Format {
        self.image_format
    }

    pub fn depth_format(&self) -> vk::Format {
        self.depth_format
    }
}

fn create_view<G: Gpu>(
    gpu: &G,
    image: vk::Image,
    format: vk::Format,
    aspect_mask: vk::ImageAspectFlags,
) -> Result<vk::ImageView> {
    let info = vk::ImageViewCreateInfo {
        s_type: vk::StructureType::IMAGE_VIEW_CREATE_INFO,
        image,
        view_type: vk::ImageViewType::TYPE_2D,
        format,
        subresource_range: vk::ImageSubresourceRange {
            aspect_mask,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        },
        ..Default::default()
    };
    unsafe { gpu.create_image_view(&info) }.call("vkCreateImageView")
}

impl<G: Gpu> Drop for SwapChain<G> {
    fn drop(&mut self) {
        let gpu = self.device.gpu();
        unsafe {
            gpu.device_wait_idle().ok();

            for frame in &self.frames {
                if frame.in_flight != vk::Fence::null() {
                    gpu.destroy_fence(frame.in_flight);
                }
                if frame.render_finished != vk::Semaphore::null() {
                    gpu.destroy_semaphore(frame.render_finished);
                }
                if frame.image_available != vk::Semaphore::null() {
                    gpu.destroy_semaphore(frame.image_available);
                }
            }
            for &framebuffer in &self.framebuffers {
                gpu.destroy_framebuffer(framebuffer);
            }
            for target in &self.depth {
                if target.view != vk::ImageView::null() {
                    gpu.destroy_image_view(target.view);
                }
                self.device.destroy_image(target.image, target.memory);
            }
            if self.render_pass != vk::RenderPass::null() {
                gpu.destroy_render_pass(self.render_pass);
            }
            for &view in &self.image_views {
                gpu.destroy_image_view(view);
            }
            if self.swapchain != vk::SwapchainKHR::null() {
                gpu.destroy_swapchain(self.swapchain);
            }
        }
    }
}
