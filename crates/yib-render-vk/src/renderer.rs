// SPDX-License-Identifier: CEPL-1.0
use std::mem;
use std::rc::Rc;

use ash::vk;
use tracing::{debug, info, warn};
use yib_render::{ClearColor, FrameWindow};

use crate::ash_gpu::AshGpu;
use crate::device::Device;
use crate::error::{RenderError, Result, VkResultExt};
use crate::gpu::Gpu;
use crate::swapchain::{
    Acquire, PresentOutcome, SwapChain, SwapChainConfig, MAX_FRAMES_IN_FLIGHT,
};

#[derive(Clone, Copy, Debug, Default)]
pub struct RendererConfig {
    pub clear_color: ClearColor,
    pub swap_chain: SwapChainConfig,
}

/// Outcome of [`Renderer::begin_frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameBegin {
    /// Record into this buffer, then call [`Renderer::end_frame`].
    Recording(vk::CommandBuffer),
    /// The swap chain was rebuilt; skip this iteration.
    Skip,
}

/// Runs one acquire, record, submit and present cycle per
/// [`begin_frame`](Self::begin_frame) / [`end_frame`](Self::end_frame) pair and
/// rebuilds the swap chain when it goes stale or the window is resized.
pub struct Renderer<G: Gpu = AshGpu> {
    device: Rc<Device<G>>,
    swap_chain: SwapChain<G>,
    command_buffers: Vec<vk::CommandBuffer>,
    config: RendererConfig,

    image_index: u32,
    frame_index: usize,
    frame_started: bool,
}

impl<G: Gpu> Renderer<G> {
    pub fn new(
        device: Rc<Device<G>>,
        window: &impl FrameWindow,
        config: RendererConfig,
    ) -> Result<Self> {
        let swap_chain = SwapChain::new(device.clone(), window.size(), None, config.swap_chain)?;
        let command_buffers = unsafe {
            device
                .gpu()
                .allocate_command_buffers(device.command_pool(), MAX_FRAMES_IN_FLIGHT as u32)
        }
        .call("vkAllocateCommandBuffers")?;

        Ok(Self {
            device,
            swap_chain,
            command_buffers,
            config,
            image_index: 0,
            frame_index: 0,
            frame_started: false,
        })
    }

    /// Acquires the next image and begins this frame's command buffer.
    ///
    /// Returns [`FrameBegin::Skip`] after rebuilding an out-of-date chain.
    /// Errors, including a call while a frame is already in progress, are fatal
    /// for the render loop.
    pub fn begin_frame(&mut self, window: &mut impl FrameWindow) -> Result<FrameBegin> {
        if self.frame_started {
            return Err(RenderError::FrameInProgress);
        }

        match self.swap_chain.acquire_next_image()? {
            Acquire::OutOfDate => {
                warn!("swap chain out of date at acquire");
                self.recreate_swap_chain(window)?;
                return Ok(FrameBegin::Skip);
            }
            Acquire::Image { index, suboptimal } => {
                if suboptimal {
                    debug!(index, "acquired suboptimal image");
                }
                self.image_index = index;
            }
        }

        let cmd = self.command_buffers[self.frame_index];
        unsafe {
            self.device
                .gpu()
                .begin_command_buffer(cmd, vk::CommandBufferUsageFlags::empty())
        }
        .call("vkBeginCommandBuffer")?;
        self.frame_started = true;
        Ok(FrameBegin::Recording(cmd))
    }

    /// Ends recording, submits and presents.
    ///
    /// A stale chain or a resized window triggers a rebuild; that frame does
    /// not advance [`frame_index`](Self::frame_index).
    pub fn end_frame(&mut self, window: &mut impl FrameWindow) -> Result<()> {
        if !self.frame_started {
            return Err(RenderError::FrameNotInProgress);
        }
        self.frame_started = false;

        let cmd = self.command_buffers[self.frame_index];
        unsafe { self.device.gpu().end_command_buffer(cmd) }.call("vkEndCommandBuffer")?;

        let outcome = self.swap_chain.submit_command_buffers(cmd, self.image_index)?;
        if outcome == PresentOutcome::Stale || window.was_resized() {
            if outcome == PresentOutcome::Stale {
                warn!("swap chain stale at present");
            }
            self.recreate_swap_chain(window)?;
            window.reset_resized();
            return Ok(());
        }

        self.frame_index = (self.frame_index + 1) % MAX_FRAMES_IN_FLIGHT;
        Ok(())
    }

    /// Begins the swap chain's render pass on `cmd` and sets viewport and
    /// scissor to the full extent.
    pub fn begin_render_pass(&self, cmd: vk::CommandBuffer) -> Result<()> {
        self.check_recording(cmd)?;

        let extent = self.swap_chain.extent();
        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: self.config.clear_color.0,
                },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1.0,
                    stencil: 0,
                },
            },
        ];
        let full = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };
        let info = vk::RenderPassBeginInfo {
            s_type: vk::StructureType::RENDER_PASS_BEGIN_INFO,
            render_pass: self.swap_chain.render_pass(),
            framebuffer: self.swap_chain.framebuffer(self.image_index as usize),
            render_area: full,
            clear_value_count: clear_values.len() as u32,
            p_clear_values: clear_values.as_ptr(),
            ..Default::default()
        };
        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };

        let gpu = self.device.gpu();
        unsafe {
            gpu.cmd_begin_render_pass(cmd, &info);
            gpu.cmd_set_viewport(cmd, viewport);
            gpu.cmd_set_scissor(cmd, full);
        }
        Ok(())
    }

    pub fn end_render_pass(&self, cmd: vk::CommandBuffer) -> Result<()> {
        self.check_recording(cmd)?;
        unsafe { self.device.gpu().cmd_end_render_pass(cmd) };
        Ok(())
    }

    fn check_recording(&self, cmd: vk::CommandBuffer) -> Result<()> {
        if !self.frame_started {
            return Err(RenderError::FrameNotInProgress);
        }
        if cmd != self.command_buffers[self.frame_index] {
            return Err(RenderError::CommandBufferMismatch);
        }
        Ok(())
    }

    /// Builds a successor chain for the current window size and drops the old
    /// one once the new one exists.
    ///
    /// Blocks on window events while the window is minimized, and returns
    /// without rebuilding if the window is closed meanwhile.
    fn recreate_swap_chain(&mut self, window: &mut impl FrameWindow) -> Result<()> {
        let mut size = window.size();
        while size.is_empty() {
            if window.close_requested() {
                debug!("window closed while minimized, keeping old swap chain");
                return Ok(());
            }
            window.wait_events();
            size = window.size();
        }

        self.device.wait_idle()?;
        let next = SwapChain::new(
            self.device.clone(),
            size,
            Some(&self.swap_chain),
            self.config.swap_chain,
        )?;
        let old = mem::replace(&mut self.swap_chain, next);
        if !self.swap_chain.compare_formats(&old) {
            return Err(RenderError::FormatMismatch {
                old_color: old.image_format(),
                new_color: self.swap_chain.image_format(),
                old_depth: old.depth_format(),
                new_depth: self.swap_chain.depth_format(),
            });
        }

        let extent = self.swap_chain.extent();
        info!(width = extent.width, height = extent.height, "swap chain recreated");
        Ok(())
    }

    /// Index for per-frame resources, `None` outside a frame.
    pub fn frame_index(&self) -> Option<usize> {
        self.frame_started.then_some(self.frame_index)
    }

    pub fn current_command_buffer(&self) -> Option<vk::CommandBuffer> {
        self.frame_started
            .then(|| self.command_buffers[self.frame_index])
    }

    pub fn is_frame_started(&self) -> bool {
        self.frame_started
    }

    pub fn image_index(&self) -> u32 {
        self.image_index
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.swap_chain.extent()
    }

    pub fn render_pass(&self) -> vk::RenderPass {
        self.swap_chain.render_pass()
    }

    pub fn swap_chain(&self) -> &SwapChain<G> {
        &self.swap_chain
    }

    pub fn set_clear_color(&mut self, color: ClearColor) {
        self.config.clear_color = color;
    }
}

impl<G: Gpu> Drop for Renderer<G> {
    fn drop(&mut self) {
        let gpu = self.device.gpu();
        unsafe {
            gpu.device_wait_idle().ok();
            gpu.free_command_buffers(self.device.command_pool(), &self.command_buffers);
        }
    }
}
