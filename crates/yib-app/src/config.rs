// SPDX-License-Identifier: CEPL-1.0
use std::{fs, io, path::Path, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};
use yib_platform::WindowSettings;
use yib_render::ClearColor;
use yib_render_vk::{GpuConfig, RendererConfig, SwapChainConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum VsyncMode {
    Fifo,
    #[default]
    Mailbox,
}

impl From<VsyncMode> for yib_render_vk::VsyncMode {
    fn from(mode: VsyncMode) -> Self {
        match mode {
            VsyncMode::Fifo => yib_render_vk::VsyncMode::Fifo,
            VsyncMode::Mailbox => yib_render_vk::VsyncMode::Mailbox,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WindowCfg {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowCfg {
    fn default() -> Self {
        let settings = WindowSettings::default();
        Self {
            title: settings.title,
            width: settings.width,
            height: settings.height,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct RenderCfg {
    pub clear_color: [f32; 4],
    pub vsync_mode: VsyncMode,
    pub validation: bool,
    /// Frame fence wait limit. Absent means wait forever.
    pub fence_timeout_ms: Option<u64>,
}

impl Default for RenderCfg {
    fn default() -> Self {
        RenderCfg {
            clear_color: ClearColor::default().0,
            vsync_mode: VsyncMode::Mailbox,
            validation: cfg!(debug_assertions),
            fence_timeout_ms: None,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
#[serde(default)]
pub struct AppCfg {
    pub window: WindowCfg,
    pub render: RenderCfg,
}

/// Command-line values that take precedence over the file.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct Overrides {
    /// Initial window width in pixels
    #[arg(long)]
    pub width: Option<u32>,
    /// Initial window height in pixels
    #[arg(long)]
    pub height: Option<u32>,
    /// Presentation mode: fifo | mailbox
    #[arg(long, value_enum)]
    pub vsync_mode: Option<VsyncMode>,
    /// Enable the Vulkan validation layer
    #[arg(long)]
    pub validation: bool,
}

impl AppCfg {
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(width) = overrides.width {
            self.window.width = width;
        }
        if let Some(height) = overrides.height {
            self.window.height = height;
        }
        if let Some(mode) = overrides.vsync_mode {
            self.render.vsync_mode = mode;
        }
        if overrides.validation {
            self.render.validation = true;
        }
    }

    pub fn window_settings(&self) -> WindowSettings {
        WindowSettings {
            title: self.window.title.clone(),
            width: self.window.width,
            height: self.window.height,
        }
    }

    pub fn gpu_config(&self) -> GpuConfig {
        GpuConfig {
            application_name: self.window.title.clone(),
            validation: self.render.validation,
        }
    }

    pub fn renderer_config(&self) -> RendererConfig {
        RendererConfig {
            clear_color: ClearColor(self.render.clear_color),
            swap_chain: SwapChainConfig {
                vsync_mode: self.render.vsync_mode.into(),
                fence_timeout: self.render.fence_timeout_ms.map(Duration::from_millis),
            },
        }
    }
}

/// Reads `path`, falling back to defaults when it is missing or malformed.
pub fn load(path: &Path) -> AppCfg {
    match fs::read_to_string(path) {
        Ok(s) => match AppCfg::parse(&s) {
            Ok(cfg) => {
                info!(path = %path.display(), "config loaded");
                cfg
            }
            Err(e) => {
                warn!(path = %path.display(), "config parse failed, using defaults: {e}");
                AppCfg::default()
            }
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no config file, using defaults");
            AppCfg::default()
        }
        Err(e) => {
            warn!(path = %path.display(), "config unreadable, using defaults: {e}");
            AppCfg::default()
        }
    }
}
