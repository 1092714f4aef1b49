// SPDX-License-Identifier: CEPL-1.0
use std::ffi::{c_void, CStr, CString};

use ash::ext::debug_utils;
use ash::khr::{surface, swapchain};
use ash::prelude::VkResult;
use ash::{vk, Entry};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle};
use tracing::{debug, error, info, trace, warn};

use crate::error::{RenderError, Result, VkResultExt};
use crate::gpu::{Gpu, SurfaceSupport};
use crate::select::{find_queue_families, DeviceCandidate, QueueFamilyIndices};

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Instance-level knobs.
#[derive(Clone, Debug)]
pub struct GpuConfig {
    pub application_name: String,
    /// Enable the Khronos validation layer when it is installed.
    pub validation: bool,
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            application_name: "Yibengine".into(),
            validation: cfg!(debug_assertions),
        }
    }
}

unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    types: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user: *mut c_void,
) -> vk::Bool32 {
    if data.is_null() {
        return vk::FALSE;
    }
    let p_message = unsafe { (*data).p_message };
    if p_message.is_null() {
        return vk::FALSE;
    }
    let msg = unsafe { CStr::from_ptr(p_message) }.to_string_lossy();
    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        error!(?types, "vulkan: {msg}");
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        warn!(?types, "vulkan: {msg}");
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        debug!(?types, "vulkan: {msg}");
    } else {
        trace!(?types, "vulkan: {msg}");
    }
    vk::FALSE
}

// STRICT TEARDOWN ORDER: surface, then messenger, then instance.
// Fields are filled in creation order; whatever exists at drop time is released.
struct InstanceBundle {
    entry: Entry,
    instance: ash::Instance,
    debug: Option<(debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    surface_loader: surface::Instance,
    surface: vk::SurfaceKHR,
}

impl Drop for InstanceBundle {
    fn drop(&mut self) {
        unsafe {
            if self.surface != vk::SurfaceKHR::null() {
                self.surface_loader.destroy_surface(self.surface, None);
            }
            if let Some((loader, messenger)) = self.debug.take() {
                loader.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

fn has_layer(entry: &Entry, name: &CStr) -> bool {
    unsafe { entry.enumerate_instance_layer_properties() }
        .unwrap_or_default()
        .iter()
        .any(|l| l.layer_name_as_c_str().is_ok_and(|n| n == name))
}

unsafe fn create_instance(
    entry: &Entry,
    display: RawDisplayHandle,
    config: &GpuConfig,
) -> Result<(ash::Instance, bool)> {
    let app = CString::new(config.application_name.replace('\0', "")).unwrap_or_default();

    let app_info = vk::ApplicationInfo {
        s_type: vk::StructureType::APPLICATION_INFO,
        p_application_name: app.as_ptr(),
        application_version: 0,
        p_engine_name: c"Yibengine".as_ptr(),
        engine_version: 0,
        api_version: vk::API_VERSION_1_0,
        ..Default::default()
    };

    let mut extensions = ash_window::enumerate_required_extensions(display)
        .call("enumerate_required_extensions")?
        .to_vec();

    let validation = if config.validation && has_layer(entry, VALIDATION_LAYER) {
        extensions.push(debug_utils::NAME.as_ptr());
        true
    } else {
        if config.validation {
            warn!("validation requested but {VALIDATION_LAYER:?} is not installed");
        }
        false
    };
    let layers = [VALIDATION_LAYER.as_ptr()];

    let create_info = vk::InstanceCreateInfo {
        s_type: vk::StructureType::INSTANCE_CREATE_INFO,
        p_application_info: &app_info,
        enabled_extension_count: extensions.len() as u32,
        pp_enabled_extension_names: extensions.as_ptr(),
        enabled_layer_count: if validation { layers.len() as u32 } else { 0 },
        pp_enabled_layer_names: if validation {
            layers.as_ptr()
        } else {
            std::ptr::null()
        },
        ..Default::default()
    };

    let instance = unsafe { entry.create_instance(&create_info, None) }.call("vkCreateInstance")?;
    Ok((instance, validation))
}

unsafe fn create_debug_messenger(
    entry: &Entry,
    instance: &ash::Instance,
) -> Result<(debug_utils::Instance, vk::DebugUtilsMessengerEXT)> {
    let loader = debug_utils::Instance::new(entry, instance);
    let ci = vk::DebugUtilsMessengerCreateInfoEXT {
        s_type: vk::StructureType::DEBUG_UTILS_MESSENGER_CREATE_INFO_EXT,
        message_severity: vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
            | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
            | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
            | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        message_type: vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        pfn_user_callback: Some(debug_callback),
        ..Default::default()
    };
    let messenger = unsafe { loader.create_debug_utils_messenger(&ci, None) }
        .call("vkCreateDebugUtilsMessengerEXT")?;
    Ok((loader, messenger))
}

// STRICT ORDER:
// 1) instance (window-system extensions + optional validation)
// 2) debug messenger
// 3) surface FROM THIS INSTANCE
// Device selection afterwards queries present support against this surface.
unsafe fn init_instance_and_surface<W>(window: &W, config: &GpuConfig) -> Result<InstanceBundle>
where
    W: HasWindowHandle + HasDisplayHandle + ?Sized,
{
    let dh = window.display_handle()?.as_raw();
    let wh = window.window_handle()?.as_raw();

    let entry = unsafe { Entry::load() }?;
    let (instance, validation) = unsafe { create_instance(&entry, dh, config) }?;
    let surface_loader = surface::Instance::new(&entry, &instance);
    let mut bundle = InstanceBundle {
        entry,
        instance,
        debug: None,
        surface_loader,
        surface: vk::SurfaceKHR::null(),
    };

    if validation {
        bundle.debug = Some(unsafe { create_debug_messenger(&bundle.entry, &bundle.instance) }?);
        info!("validation layer enabled");
    }

    bundle.surface =
        unsafe { ash_window::create_surface(&bundle.entry, &bundle.instance, dh, wh, None) }
            .call("ash_window::create_surface")?;
    Ok(bundle)
}

unsafe fn describe_candidate(
    bundle: &InstanceBundle,
    phys: vk::PhysicalDevice,
) -> Result<DeviceCandidate> {
    let instance = &bundle.instance;
    let props = unsafe { instance.get_physical_device_properties(phys) };
    let name = props
        .device_name_as_c_str()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "<unnamed>".into());

    let queue_props = unsafe { instance.get_physical_device_queue_family_properties(phys) };
    let families = find_queue_families(&queue_props, |i| unsafe {
        bundle
            .surface_loader
            .get_physical_device_surface_support(phys, i, bundle.surface)
            .unwrap_or(false)
    });

    let available = unsafe { instance.enumerate_device_extension_properties(phys) }
        .call("vkEnumerateDeviceExtensionProperties")?;
    let missing_extensions = [swapchain::NAME]
        .into_iter()
        .filter(|&want| {
            !available
                .iter()
                .any(|e| e.extension_name_as_c_str().is_ok_and(|n| n == want))
        })
        .map(|n| n.to_string_lossy().into_owned())
        .collect();

    let surface_format_count = unsafe {
        bundle
            .surface_loader
            .get_physical_device_surface_formats(phys, bundle.surface)
    }
    .map(|f| f.len())
    .unwrap_or(0);
    let present_mode_count = unsafe {
        bundle
            .surface_loader
            .get_physical_device_surface_present_modes(phys, bundle.surface)
    }
    .map(|m| m.len())
    .unwrap_or(0);

    let features = unsafe { instance.get_physical_device_features(phys) };

    Ok(DeviceCandidate {
        name,
        device_type: props.device_type,
        families,
        missing_extensions,
        surface_format_count,
        present_mode_count,
        sampler_anisotropy: features.sampler_anisotropy == vk::TRUE,
    })
}

unsafe fn pick_physical_device(
    bundle: &InstanceBundle,
) -> Result<(vk::PhysicalDevice, QueueFamilyIndices)> {
    let devices = unsafe { bundle.instance.enumerate_physical_devices() }
        .call("vkEnumeratePhysicalDevices")?;

    let mut rejected = Vec::new();
    for phys in devices {
        let candidate = unsafe { describe_candidate(bundle, phys) }?;
        match candidate.check() {
            Ok(families) => {
                info!(
                    device = %candidate.name,
                    graphics = families.graphics,
                    present = families.present,
                    "selected physical device"
                );
                return Ok((phys, families));
            }
            Err(why) => {
                debug!(device = %candidate.name, %why, "skipping physical device");
                rejected.push((candidate.name, why));
            }
        }
    }
    Err(RenderError::NoSuitableDevice(rejected))
}

unsafe fn create_logical_device(
    instance: &ash::Instance,
    phys: vk::PhysicalDevice,
    families: QueueFamilyIndices,
) -> Result<ash::Device> {
    let priorities = [1.0_f32];
    let queue_infos: Vec<_> = families
        .unique()
        .into_iter()
        .map(|family| vk::DeviceQueueCreateInfo {
            s_type: vk::StructureType::DEVICE_QUEUE_CREATE_INFO,
            queue_family_index: family,
            queue_count: 1,
            p_queue_priorities: priorities.as_ptr(),
            ..Default::default()
        })
        .collect();

    let features = vk::PhysicalDeviceFeatures {
        sampler_anisotropy: vk::TRUE,
        ..Default::default()
    };
    let extensions = [swapchain::NAME.as_ptr()];

    let dinfo = vk::DeviceCreateInfo {
        s_type: vk::StructureType::DEVICE_CREATE_INFO,
        queue_create_info_count: queue_infos.len() as u32,
        p_queue_create_infos: queue_infos.as_ptr(),
        enabled_extension_count: extensions.len() as u32,
        pp_enabled_extension_names: extensions.as_ptr(),
        p_enabled_features: &features,
        ..Default::default()
    };

    unsafe { instance.create_device(phys, &dinfo, None) }.call("vkCreateDevice")
}

/// [`Gpu`] over a real Vulkan driver through `ash`.
///
/// Owns the loader, instance, optional validation messenger, window surface,
/// logical device and its queues. Dropping it destroys the logical device,
/// then the surface, messenger and instance.
pub struct AshGpu {
    device: ash::Device,
    swapchain_loader: swapchain::Device,
    graphics_queue: vk::Queue,
    present_queue: vk::Queue,
    families: QueueFamilyIndices,
    physical: vk::PhysicalDevice,
    properties: vk::PhysicalDeviceProperties,
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    // Must drop after `device`; see Drop below.
    bundle: InstanceBundle,
}

impl AshGpu {
    pub fn new<W>(window: &W, config: &GpuConfig) -> Result<Self>
    where
        W: HasWindowHandle + HasDisplayHandle + ?Sized,
    {
        unsafe {
            let bundle = init_instance_and_surface(window, config)?;
            let (physical, families) = pick_physical_device(&bundle)?;
            let device = create_logical_device(&bundle.instance, physical, families)?;

            let graphics_queue = device.get_device_queue(families.graphics, 0);
            let present_queue = device.get_device_queue(families.present, 0);
            let swapchain_loader = swapchain::Device::new(&bundle.instance, &device);
            let properties = bundle.instance.get_physical_device_properties(physical);
            let memory_properties = bundle
                .instance
                .get_physical_device_memory_properties(physical);

            Ok(Self {
                device,
                swapchain_loader,
                graphics_queue,
                present_queue,
                families,
                physical,
                properties,
                memory_properties,
                bundle,
            })
        }
    }
}

impl Drop for AshGpu {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();
            self.device.destroy_device(None);
        }
    }
}

impl Gpu for AshGpu {
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
        unsafe {
            self.bundle
                .instance
                .get_physical_device_format_properties(self.physical, format)
        }
    }

    fn surface(&self) -> vk::SurfaceKHR {
        self.bundle.surface
    }

    fn surface_support(&self) -> VkResult<SurfaceSupport> {
        let loader = &self.bundle.surface_loader;
        let surface = self.bundle.surface;
        unsafe {
            Ok(SurfaceSupport {
                capabilities: loader
                    .get_physical_device_surface_capabilities(self.physical, surface)?,
                formats: loader.get_physical_device_surface_formats(self.physical, surface)?,
                present_modes: loader
                    .get_physical_device_surface_present_modes(self.physical, surface)?,
            })
        }
    }

    unsafe fn create_buffer(&self, info: &vk::BufferCreateInfo<'_>) -> VkResult<vk::Buffer> {
        unsafe { self.device.create_buffer(info, None) }
    }

    unsafe fn destroy_buffer(&self, buffer: vk::Buffer) {
        unsafe { self.device.destroy_buffer(buffer, None) }
    }

    unsafe fn buffer_memory_requirements(&self, buffer: vk::Buffer) -> vk::MemoryRequirements {
        unsafe { self.device.get_buffer_memory_requirements(buffer) }
    }

    unsafe fn bind_buffer_memory(
        &self,
        buffer: vk::Buffer,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> VkResult<()> {
        unsafe { self.device.bind_buffer_memory(buffer, memory, offset) }
    }

    unsafe fn create_image(&self, info: &vk::ImageCreateInfo<'_>) -> VkResult<vk::Image> {
        unsafe { self.device.create_image(info, None) }
    }

    unsafe fn destroy_image(&self, image: vk::Image) {
        unsafe { self.device.destroy_image(image, None) }
    }

    unsafe fn image_memory_requirements(&self, image: vk::Image) -> vk::MemoryRequirements {
        unsafe { self.device.get_image_memory_requirements(image) }
    }

    unsafe fn bind_image_memory(
        &self,
        image: vk::Image,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> VkResult<()> {
        unsafe { self.device.bind_image_memory(image, memory, offset) }
    }

    unsafe fn allocate_memory(
        &self,
        info: &vk::MemoryAllocateInfo<'_>,
    ) -> VkResult<vk::DeviceMemory> {
        unsafe { self.device.allocate_memory(info, None) }
    }

    unsafe fn free_memory(&self, memory: vk::DeviceMemory) {
        unsafe { self.device.free_memory(memory, None) }
    }

    unsafe fn map_memory(
        &self,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
    ) -> VkResult<*mut c_void> {
        unsafe {
            self.device
                .map_memory(memory, offset, size, vk::MemoryMapFlags::empty())
        }
    }

    unsafe fn unmap_memory(&self, memory: vk::DeviceMemory) {
        unsafe { self.device.unmap_memory(memory) }
    }

    unsafe fn flush_mapped_range(&self, range: &vk::MappedMemoryRange<'_>) -> VkResult<()> {
        unsafe {
            self.device
                .flush_mapped_memory_ranges(std::slice::from_ref(range))
        }
    }

    unsafe fn invalidate_mapped_range(&self, range: &vk::MappedMemoryRange<'_>) -> VkResult<()> {
        unsafe {
            self.device
                .invalidate_mapped_memory_ranges(std::slice::from_ref(range))
        }
    }

    unsafe fn create_image_view(
        &self,
        info: &vk::ImageViewCreateInfo<'_>,
    ) -> VkResult<vk::ImageView> {
        unsafe { self.device.create_image_view(info, None) }
    }

    unsafe fn destroy_image_view(&self, view: vk::ImageView) {
        unsafe { self.device.destroy_image_view(view, None) }
    }

    unsafe fn create_render_pass(
        &self,
        info: &vk::RenderPassCreateInfo<'_>,
    ) -> VkResult<vk::RenderPass> {
        unsafe { self.device.create_render_pass(info, None) }
    }

    unsafe fn destroy_render_pass(&self, render_pass: vk::RenderPass) {
        unsafe { self.device.destroy_render_pass(render_pass, None) }
    }

    unsafe fn create_framebuffer(
        &self,
        info: &vk::FramebufferCreateInfo<'_>,
    ) -> VkResult<vk::Framebuffer> {
        unsafe { self.device.create_framebuffer(info, None) }
    }

    unsafe fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        unsafe { self.device.destroy_framebuffer(framebuffer, None) }
    }

    unsafe fn create_semaphore(&self) -> VkResult<vk::Semaphore> {
        let ci = vk::SemaphoreCreateInfo::default();
        unsafe { self.device.create_semaphore(&ci, None) }
    }

    unsafe fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        unsafe { self.device.destroy_semaphore(semaphore, None) }
    }

    unsafe fn create_fence(&self, signaled: bool) -> VkResult<vk::Fence> {
        let ci = vk::FenceCreateInfo {
            s_type: vk::StructureType::FENCE_CREATE_INFO,
            flags: if signaled {
                vk::FenceCreateFlags::SIGNALED
            } else {
                vk::FenceCreateFlags::empty()
            },
            ..Default::default()
        };
        unsafe { self.device.create_fence(&ci, None) }
    }

    unsafe fn destroy_fence(&self, fence: vk::Fence) {
        unsafe { self.device.destroy_fence(fence, None) }
    }

    unsafe fn wait_for_fence(&self, fence: vk::Fence, timeout_ns: u64) -> VkResult<()> {
        unsafe { self.device.wait_for_fences(&[fence], true, timeout_ns) }
    }

    unsafe fn reset_fence(&self, fence: vk::Fence) -> VkResult<()> {
        unsafe { self.device.reset_fences(&[fence]) }
    }

    unsafe fn create_command_pool(
        &self,
        info: &vk::CommandPoolCreateInfo<'_>,
    ) -> VkResult<vk::CommandPool> {
        unsafe { self.device.create_command_pool(info, None) }
    }

    unsafe fn destroy_command_pool(&self, pool: vk::CommandPool) {
        unsafe { self.device.destroy_command_pool(pool, None) }
    }

    unsafe fn allocate_command_buffers(
        &self,
        pool: vk::CommandPool,
        count: u32,
    ) -> VkResult<Vec<vk::CommandBuffer>> {
        let alloc_info = vk::CommandBufferAllocateInfo {
            s_type: vk::StructureType::COMMAND_BUFFER_ALLOCATE_INFO,
            command_pool: pool,
            level: vk::CommandBufferLevel::PRIMARY,
            command_buffer_count: count,
            ..Default::default()
        };
        unsafe { self.device.allocate_command_buffers(&alloc_info) }
    }

    unsafe fn free_command_buffers(&self, pool: vk::CommandPool, buffers: &[vk::CommandBuffer]) {
        unsafe { self.device.free_command_buffers(pool, buffers) }
    }

    unsafe fn begin_command_buffer(
        &self,
        cmd: vk::CommandBuffer,
        flags: vk::CommandBufferUsageFlags,
    ) -> VkResult<()> {
        let begin = vk::CommandBufferBeginInfo {
            s_type: vk::StructureType::COMMAND_BUFFER_BEGIN_INFO,
            flags,
            ..Default::default()
        };
        unsafe { self.device.begin_command_buffer(cmd, &begin) }
    }

    unsafe fn end_command_buffer(&self, cmd: vk::CommandBuffer) -> VkResult<()> {
        unsafe { self.device.end_command_buffer(cmd) }
    }

    unsafe fn cmd_copy_buffer(
        &self,
        cmd: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Buffer,
        regions: &[vk::BufferCopy],
    ) {
        unsafe { self.device.cmd_copy_buffer(cmd, src, dst, regions) }
    }

    unsafe fn cmd_copy_buffer_to_image(
        &self,
        cmd: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Image,
        dst_layout: vk::ImageLayout,
        regions: &[vk::BufferImageCopy],
    ) {
        unsafe {
            self.device
                .cmd_copy_buffer_to_image(cmd, src, dst, dst_layout, regions)
        }
    }

    unsafe fn cmd_pipeline_barrier(
        &self,
        cmd: vk::CommandBuffer,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
        image_barriers: &[vk::ImageMemoryBarrier<'_>],
    ) {
        unsafe {
            self.device.cmd_pipeline_barrier(
                cmd,
                src_stage,
                dst_stage,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                image_barriers,
            )
        }
    }

    unsafe fn cmd_begin_render_pass(
        &self,
        cmd: vk::CommandBuffer,
        info: &vk::RenderPassBeginInfo<'_>,
    ) {
        unsafe {
            self.device
                .cmd_begin_render_pass(cmd, info, vk::SubpassContents::INLINE)
        }
    }

    unsafe fn cmd_end_render_pass(&self, cmd: vk::CommandBuffer) {
        unsafe { self.device.cmd_end_render_pass(cmd) }
    }

    unsafe fn cmd_set_viewport(&self, cmd: vk::CommandBuffer, viewport: vk::Viewport) {
        unsafe {
            self.device
                .cmd_set_viewport(cmd, 0, std::slice::from_ref(&viewport))
        }
    }

    unsafe fn cmd_set_scissor(&self, cmd: vk::CommandBuffer, scissor: vk::Rect2D) {
        unsafe {
            self.device
                .cmd_set_scissor(cmd, 0, std::slice::from_ref(&scissor))
        }
    }

    unsafe fn queue_submit(&self, submit: &vk::SubmitInfo<'_>, fence: vk::Fence) -> VkResult<()> {
        unsafe {
            self.device
                .queue_submit(self.graphics_queue, std::slice::from_ref(submit), fence)
        }
    }

    unsafe fn graphics_queue_wait_idle(&self) -> VkResult<()> {
        unsafe { self.device.queue_wait_idle(self.graphics_queue) }
    }

    unsafe fn device_wait_idle(&self) -> VkResult<()> {
        unsafe { self.device.device_wait_idle() }
    }

    unsafe fn create_swapchain(
        &self,
        info: &vk::SwapchainCreateInfoKHR<'_>,
    ) -> VkResult<vk::SwapchainKHR> {
        unsafe { self.swapchain_loader.create_swapchain(info, None) }
    }

    unsafe fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>> {
        unsafe { self.swapchain_loader.get_swapchain_images(swapchain) }
    }

    unsafe fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR) {
        unsafe { self.swapchain_loader.destroy_swapchain(swapchain, None) }
    }

    unsafe fn acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        timeout_ns: u64,
        semaphore: vk::Semaphore,
    ) -> VkResult<(u32, bool)> {
        unsafe {
            self.swapchain_loader.acquire_next_image(
                swapchain,
                timeout_ns,
                semaphore,
                vk::Fence::null(),
            )
        }
    }

    unsafe fn queue_present(&self, info: &vk::PresentInfoKHR<'_>) -> VkResult<bool> {
        unsafe { self.swapchain_loader.queue_present(self.present_queue, info) }
    }

    unsafe fn create_descriptor_set_layout(
        &self,
        info: &vk::DescriptorSetLayoutCreateInfo<'_>,
    ) -> VkResult<vk::DescriptorSetLayout> {
        unsafe { self.device.create_descriptor_set_layout(info, None) }
    }

    unsafe fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout) {
        unsafe { self.device.destroy_descriptor_set_layout(layout, None) }
    }

    unsafe fn create_descriptor_pool(
        &self,
        info: &vk::DescriptorPoolCreateInfo<'_>,
    ) -> VkResult<vk::DescriptorPool> {
        unsafe { self.device.create_descriptor_pool(info, None) }
    }

    unsafe fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool) {
        unsafe { self.device.destroy_descriptor_pool(pool, None) }
    }

    unsafe fn allocate_descriptor_sets(
        &self,
        info: &vk::DescriptorSetAllocateInfo<'_>,
    ) -> VkResult<Vec<vk::DescriptorSet>> {
        unsafe { self.device.allocate_descriptor_sets(info) }
    }

    unsafe fn free_descriptor_sets(
        &self,
        pool: vk::DescriptorPool,
        sets: &[vk::DescriptorSet],
    ) -> VkResult<()> {
        unsafe { self.device.free_descriptor_sets(pool, sets) }
    }

    unsafe fn reset_descriptor_pool(&self, pool: vk::DescriptorPool) -> VkResult<()> {
        unsafe {
            self.device
                .reset_descriptor_pool(pool, vk::DescriptorPoolResetFlags::empty())
        }
    }

    unsafe fn update_descriptor_sets(&self, writes: &[vk::WriteDescriptorSet<'_>]) {
        unsafe { self.device.update_descriptor_sets(writes, &[]) }
    }
}
