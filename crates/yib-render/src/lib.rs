// SPDX-License-Identifier: CEPL-1.0

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct RenderSize {
    pub width: u32,
    pub height: u32,
}

impl RenderSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A window with either dimension at zero is minimized and has nothing to draw into.
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// RGBA clear color in linear float space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClearColor(pub [f32; 4]);

impl Default for ClearColor {
    fn default() -> Self {
        ClearColor([0.1, 0.1, 0.1, 1.0])
    }
}

/// What the frame renderer needs from the window system.
///
/// The renderer reads the drawable size, polls the resize flag after each
/// present and, while the window is minimized, blocks in [`wait_events`]
/// until the size becomes non-zero again.
///
/// [`wait_events`]: FrameWindow::wait_events
pub trait FrameWindow {
    fn size(&self) -> RenderSize;
    fn was_resized(&self) -> bool;
    fn reset_resized(&mut self);

    /// Block until at least one window event has been processed.
    fn wait_events(&mut self);

    /// Set once the user asked to close the window. Lets blocking waits bail out.
    fn close_requested(&self) -> bool {
        false
    }
}
