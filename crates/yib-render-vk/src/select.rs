// SPDX-License-Identifier: CEPL-1.0
//! Pure selection policy: queue families, device suitability, surface format,
//! present mode, extent and image count. Nothing here touches the driver.

use ash::vk;
use thiserror::Error;
use yib_render::RenderSize;

use crate::swapchain::VsyncMode;

/// Depth formats in preference order.
pub const DEPTH_FORMAT_CANDIDATES: [vk::Format; 3] = [
    vk::Format::D32_SFLOAT,
    vk::Format::D32_SFLOAT_S8_UINT,
    vk::Format::D24_UNORM_S8_UINT,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics: u32,
    pub present: u32,
}

impl QueueFamilyIndices {
    pub fn is_shared(&self) -> bool {
        self.graphics == self.present
    }

    /// Distinct family indices, one queue create info each.
    pub fn unique(&self) -> Vec<u32> {
        if self.is_shared() {
            vec![self.graphics]
        } else {
            vec![self.graphics, self.present]
        }
    }
}

/// First graphics family and first present family, stopping once both are known.
pub fn find_queue_families(
    families: &[vk::QueueFamilyProperties],
    mut supports_present: impl FnMut(u32) -> bool,
) -> Option<QueueFamilyIndices> {
    let mut graphics = None;
    let mut present = None;
    for (i, family) in families.iter().enumerate() {
        let i = i as u32;
        if graphics.is_none()
            && family.queue_count > 0
            && family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
        {
            graphics = Some(i);
        }
        if present.is_none() && supports_present(i) {
            present = Some(i);
        }
        if let (Some(graphics), Some(present)) = (graphics, present) {
            return Some(QueueFamilyIndices { graphics, present });
        }
    }
    None
}

/// Everything device selection needs to know about one physical device.
#[derive(Clone, Debug)]
pub struct DeviceCandidate {
    pub name: String,
    pub device_type: vk::PhysicalDeviceType,
    pub families: Option<QueueFamilyIndices>,
    pub missing_extensions: Vec<String>,
    pub surface_format_count: usize,
    pub present_mode_count: usize,
    pub sampler_anisotropy: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Unsuitable {
    #[error("not a discrete GPU ({0:?})")]
    NotDiscrete(vk::PhysicalDeviceType),
    #[error("no graphics or present queue family")]
    NoQueueFamilies,
    #[error("missing device extensions: {0:?}")]
    MissingExtensions(Vec<String>),
    #[error("surface reports no formats or present modes")]
    InadequateSurface,
    #[error("sampler anisotropy not supported")]
    NoSamplerAnisotropy,
}

impl DeviceCandidate {
    pub fn check(&self) -> Result<QueueFamilyIndices, Unsuitable> {
        if self.device_type != vk::PhysicalDeviceType::DISCRETE_GPU {
            return Err(Unsuitable::NotDiscrete(self.device_type));
        }
        let families = self.families.ok_or(Unsuitable::NoQueueFamilies)?;
        if !self.missing_extensions.is_empty() {
            return Err(Unsuitable::MissingExtensions(self.missing_extensions.clone()));
        }
        if self.surface_format_count == 0 || self.present_mode_count == 0 {
            return Err(Unsuitable::InadequateSurface);
        }
        if !self.sampler_anisotropy {
            return Err(Unsuitable::NoSamplerAnisotropy);
        }
        Ok(families)
    }
}

/// First candidate whose tiling features include `features`, else `UNDEFINED`.
pub fn select_format(
    candidates: &[vk::Format],
    tiling: vk::ImageTiling,
    features: vk::FormatFeatureFlags,
    mut props_of: impl FnMut(vk::Format) -> vk::FormatProperties,
) -> vk::Format {
    candidates
        .iter()
        .copied()
        .find(|&format| {
            let props = props_of(format);
            match tiling {
                vk::ImageTiling::LINEAR => props.linear_tiling_features.contains(features),
                vk::ImageTiling::OPTIMAL => props.optimal_tiling_features.contains(features),
                _ => false,
            }
        })
        .unwrap_or(vk::Format::UNDEFINED)
}

/// BGRA8 sRGB with the sRGB non-linear color space if offered, else whatever comes first.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .copied()
        .find(|f| {
            f.format == vk::Format::B8G8R8A8_SRGB
                && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| formats.first().copied())
}

pub fn choose_present_mode(modes: &[vk::PresentModeKHR], mode: VsyncMode) -> vk::PresentModeKHR {
    match mode {
        VsyncMode::Mailbox => [vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::FIFO]
            .into_iter()
            .find(|m| modes.contains(m))
            .unwrap_or(vk::PresentModeKHR::FIFO),
        // FIFO is the one mode every surface must support
        VsyncMode::Fifo => vk::PresentModeKHR::FIFO,
    }
}

pub fn extent_from_caps(caps: &vk::SurfaceCapabilitiesKHR, want: RenderSize) -> vk::Extent2D {
    if caps.current_extent.width != u32::MAX {
        caps.current_extent
    } else {
        vk::Extent2D {
            width: want
                .width
                .clamp(caps.min_image_extent.width, caps.max_image_extent.width),
            height: want
                .height
                .clamp(caps.min_image_extent.height, caps.max_image_extent.height),
        }
    }
}

/// One more than the minimum, capped by the maximum (0 == "no max").
pub fn image_count_from_caps(caps: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let wanted = caps.min_image_count + 1;
    if caps.max_image_count > 0 {
        wanted.min(caps.max_image_count)
    } else {
        wanted
    }
}
