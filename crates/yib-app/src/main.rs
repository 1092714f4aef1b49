// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
mod config;

use std::{
    path::PathBuf,
    rc::Rc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use clap::Parser;
use tracing::{debug, error, info};
use yib_core::init_tracing;
use yib_platform::PlatformWindow;
use yib_render::FrameWindow;
use yib_render_vk::{
    vk, AshGpu, Buffer, DescriptorPool, DescriptorSetLayout, DescriptorWriter, Device, FrameBegin,
    Renderer, MAX_FRAMES_IN_FLIGHT,
};

use config::{AppCfg, Overrides};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML config file; missing means defaults
    #[arg(long, default_value = "yib.toml")]
    config: PathBuf,

    #[command(flatten)]
    overrides: Overrides,
}

/// Per-frame uniform block.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct FrameUbo {
    extent: [f32; 2],
    time: f32,
    frame: u32,
}

/// One uniform slot and descriptor set per frame in flight, so the CPU never
/// writes a slot the GPU may still be reading.
struct FrameResources {
    ubo: Buffer,
    sets: Vec<vk::DescriptorSet>,
    _pool: DescriptorPool,
    _layout: DescriptorSetLayout,
}

impl FrameResources {
    fn new(device: &Rc<Device>) -> Result<Self> {
        let count = MAX_FRAMES_IN_FLIGHT as u32;

        let mut ubo = Buffer::new(
            device.clone(),
            std::mem::size_of::<FrameUbo>() as vk::DeviceSize,
            count,
            vk::BufferUsageFlags::UNIFORM_BUFFER,
            vk::MemoryPropertyFlags::HOST_VISIBLE,
            device.limits().min_uniform_buffer_offset_alignment,
        )
        .context("frame uniform buffer")?;
        ubo.map(vk::WHOLE_SIZE, 0)?;

        let layout = DescriptorSetLayout::builder(device.clone())
            .add_binding(
                0,
                vk::DescriptorType::UNIFORM_BUFFER,
                vk::ShaderStageFlags::ALL_GRAPHICS,
                1,
            )?
            .build()?;
        let pool = DescriptorPool::builder(device.clone())
            .max_sets(count)
            .add_pool_size(vk::DescriptorType::UNIFORM_BUFFER, count)
            .build()?;

        let sets = (0..count)
            .map(|i| {
                DescriptorWriter::new(&layout, &pool)
                    .write_buffer(0, ubo.descriptor_info_for_index(i))?
                    .build()
            })
            .collect::<yib_render_vk::Result<Vec<_>>>()
            .context("frame descriptor sets")?;

        Ok(Self {
            ubo,
            sets,
            _pool: pool,
            _layout: layout,
        })
    }

    fn update(&mut self, frame_index: usize, data: &FrameUbo) -> Result<vk::DescriptorSet> {
        let index = frame_index as u32;
        self.ubo.write_to_index(data, index)?;
        self.ubo.flush_index(index)?;
        Ok(self.sets[frame_index])
    }
}

fn draw_frame(
    renderer: &mut Renderer,
    window: &mut PlatformWindow,
    resources: &mut FrameResources,
    start: Instant,
    frame: u32,
) -> Result<bool> {
    let cmd = match renderer.begin_frame(window)? {
        FrameBegin::Recording(cmd) => cmd,
        FrameBegin::Skip => return Ok(false),
    };

    // begin_frame succeeded, so a frame index exists
    let frame_index = renderer.frame_index().unwrap_or_default();
    let extent = renderer.extent();
    let set = resources.update(
        frame_index,
        &FrameUbo {
            extent: [extent.width as f32, extent.height as f32],
            time: start.elapsed().as_secs_f32(),
            frame,
        },
    )?;
    debug!(frame_index, ?set, "recording");

    renderer.begin_render_pass(cmd)?;
    renderer.end_render_pass(cmd)?;
    renderer.end_frame(window)?;
    Ok(true)
}

fn run(cfg: AppCfg) -> Result<()> {
    let mut window = PlatformWindow::new(&cfg.window_settings()).context("create window")?;
    let gpu = AshGpu::new(&window, &cfg.gpu_config()).context("vulkan init")?;
    let device = Rc::new(Device::new(gpu).context("device")?);
    let mut renderer = Renderer::new(device.clone(), &window, cfg.renderer_config())
        .context("renderer")?;
    let mut resources = FrameResources::new(&device)?;

    let start = Instant::now();
    let mut rendered: u32 = 0;
    let mut frames: u32 = 0;
    let mut last_fps_instant = Instant::now();

    loop {
        window.poll_events();
        if window.close_requested() {
            break;
        }
        if window.size().is_empty() {
            // minimized: sleep until something happens
            window.wait_events();
            frames = 0;
            continue;
        }

        match draw_frame(&mut renderer, &mut window, &mut resources, start, rendered) {
            Ok(true) => {
                // count only frames that were actually rendered
                frames = frames.saturating_add(1);
                rendered = rendered.wrapping_add(1);
            }
            Ok(false) => {}
            Err(e) => {
                error!("render error: {e:#}");
                device.wait_idle().ok();
                return Err(e);
            }
        }

        let now = Instant::now();
        if now.duration_since(last_fps_instant) >= Duration::from_secs(1) {
            info!("fps ~ {}", frames);
            window
                .window()
                .set_title(&format!("{} ({} fps)", cfg.window.title, frames));
            frames = 0;
            last_fps_instant = now;
        }
    }

    info!("shutting down");
    device.wait_idle().context("device idle")?;
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut cfg = config::load(&args.config);
    cfg.apply(&args.overrides);
    info!(
        width = cfg.window.width,
        height = cfg.window.height,
        vsync_mode = ?cfg.render.vsync_mode,
        validation = cfg.render.validation,
        "starting"
    );

    run(cfg)
}
