// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
//! winit window driven by `pump_app_events`, so the caller owns the loop and
//! the renderer can block on events while the window is minimized.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle,
};
use tracing::{debug, info};
use yib_render::{FrameWindow, RenderSize};

pub use winit;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    error::OsError,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Window, WindowAttributes, WindowId},
};

#[derive(Clone, Debug)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "yib".into(),
            width: 800,
            height: 600,
        }
    }
}

struct Handler {
    pending: Option<WindowAttributes>,
    window: Option<Window>,
    create_error: Option<OsError>,
    size: RenderSize,
    resized: bool,
    close_requested: bool,
}

impl ApplicationHandler for Handler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);
        let Some(attributes) = self.pending.take() else {
            return;
        };
        match event_loop.create_window(attributes) {
            Ok(window) => {
                let size = window.inner_size();
                self.size = RenderSize::new(size.width, size.height);
                info!(width = size.width, height = size.height, "window created");
                self.window = Some(window);
            }
            Err(e) => {
                self.create_error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("CloseRequested");
                self.close_requested = true;
            }
            WindowEvent::Resized(size) => {
                self.size = RenderSize::new(size.width, size.height);
                self.resized = true;
                debug!(width = size.width, height = size.height, "Resized");
            }
            _ => {}
        }
    }
}

pub struct PlatformWindow {
    // dropped before the event loop
    window: Window,
    handler: Handler,
    event_loop: EventLoop<()>,
}

impl PlatformWindow {
    /// Opens the window, pumping the event loop until it exists.
    pub fn new(settings: &WindowSettings) -> Result<Self> {
        let mut event_loop = EventLoop::new().context("event loop")?;
        let attributes = Window::default_attributes()
            .with_title(settings.title.clone())
            .with_inner_size(PhysicalSize::new(settings.width, settings.height));

        let mut handler = Handler {
            pending: Some(attributes),
            window: None,
            create_error: None,
            size: RenderSize::default(),
            resized: false,
            close_requested: false,
        };

        let window = loop {
            let status = event_loop.pump_app_events(Some(Duration::ZERO), &mut handler);
            if let Some(e) = handler.create_error.take() {
                return Err(anyhow!("{e}")).context("create_window");
            }
            if let Some(window) = handler.window.take() {
                break window;
            }
            if let PumpStatus::Exit(code) = status {
                bail!("event loop exited with {code} before the window was created");
            }
        };

        Ok(Self {
            window,
            handler,
            event_loop,
        })
    }

    /// Handles whatever events are queued, without blocking.
    pub fn poll_events(&mut self) {
        self.pump(Some(Duration::ZERO));
    }

    fn pump(&mut self, timeout: Option<Duration>) {
        let status = self.event_loop.pump_app_events(timeout, &mut self.handler);
        if let PumpStatus::Exit(code) = status {
            debug!(code, "event loop exited");
            self.handler.close_requested = true;
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }
}

impl FrameWindow for PlatformWindow {
    fn size(&self) -> RenderSize {
        self.handler.size
    }

    fn was_resized(&self) -> bool {
        self.handler.resized
    }

    fn reset_resized(&mut self) {
        self.handler.resized = false;
    }

    fn wait_events(&mut self) {
        self.pump(None);
    }

    fn close_requested(&self) -> bool {
        self.handler.close_requested
    }
}

impl HasWindowHandle for PlatformWindow {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        self.window.window_handle()
    }
}

impl HasDisplayHandle for PlatformWindow {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        self.window.display_handle()
    }
}
