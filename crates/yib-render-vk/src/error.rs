// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use thiserror::Error;

use crate::select::Unsuitable;

pub type Result<T, E = RenderError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{call} failed: {result:?}")]
    Vk {
        call: &'static str,
        result: vk::Result,
    },

    #[error("failed to load the Vulkan library: {0}")]
    Loading(#[from] ash::LoadingError),

    #[error("window handle unavailable: {0}")]
    WindowHandle(#[from] raw_window_handle::HandleError),

    #[error("no suitable physical device ({} rejected)", .0.len())]
    NoSuitableDevice(Vec<(String, Unsuitable)>),

    #[error("no memory type matches filter {type_filter:#b} with {properties:?}")]
    NoMemoryType {
        type_filter: u32,
        properties: vk::MemoryPropertyFlags,
    },

    #[error("no supported depth format")]
    NoDepthFormat,

    #[error("buffer is not mapped")]
    NotMapped,

    #[error("range {offset}+{size} exceeds {limit} bytes")]
    OutOfBounds {
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
        limit: vk::DeviceSize,
    },

    #[error("value is {actual} bytes, buffer instances are {expected}")]
    InstanceSizeMismatch {
        expected: vk::DeviceSize,
        actual: vk::DeviceSize,
    },

    #[error("begin_frame called while a frame is already in progress")]
    FrameInProgress,

    #[error("no frame in progress")]
    FrameNotInProgress,

    #[error("command buffer does not belong to the current frame")]
    CommandBufferMismatch,

    #[error(
        "swap chain formats changed across recreation: \
         color {old_color:?} -> {new_color:?}, depth {old_depth:?} -> {new_depth:?}"
    )]
    FormatMismatch {
        old_color: vk::Format,
        new_color: vk::Format,
        old_depth: vk::Format,
        new_depth: vk::Format,
    },

    #[error("frame wait timed out, device presumed lost")]
    FenceTimeout,

    #[error("unsupported layout transition {from:?} -> {to:?}")]
    UnsupportedLayoutTransition {
        from: vk::ImageLayout,
        to: vk::ImageLayout,
    },

    #[error("descriptor binding {0} already added")]
    DuplicateBinding(u32),

    #[error("descriptor binding {0} is not a single-descriptor binding of this layout")]
    UnknownBinding(u32),

    #[error("descriptor binding {binding} ({descriptor_type:?}) does not take this resource kind")]
    DescriptorTypeMismatch {
        binding: u32,
        descriptor_type: vk::DescriptorType,
    },
}

/// Attaches the name of the failing API call to a raw [`vk::Result`].
pub trait VkResultExt<T> {
    fn call(self, call: &'static str) -> Result<T>;
}

impl<T> VkResultExt<T> for std::result::Result<T, vk::Result> {
    fn call(self, call: &'static str) -> Result<T> {
        self.map_err(|result| RenderError::Vk { call, result })
    }
}
