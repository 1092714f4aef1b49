// SPDX-License-Identifier: CEPL-1.0
//! Descriptor set layouts, pools and a writer that allocates and fills sets.

use std::collections::BTreeMap;
use std::rc::Rc;

use ash::vk;

use crate::ash_gpu::AshGpu;
use crate::device::Device;
use crate::error::{RenderError, Result, VkResultExt};
use crate::gpu::Gpu;

pub struct DescriptorSetLayout<G: Gpu = AshGpu> {
    device: Rc<Device<G>>,
    layout: vk::DescriptorSetLayout,
    bindings: BTreeMap<u32, vk::DescriptorSetLayoutBinding<'static>>,
}

pub struct DescriptorSetLayoutBuilder<G: Gpu = AshGpu> {
    device: Rc<Device<G>>,
    bindings: BTreeMap<u32, vk::DescriptorSetLayoutBinding<'static>>,
}

impl<G: Gpu> DescriptorSetLayoutBuilder<G> {
    /// Each binding number may be added once.
    pub fn add_binding(
        mut self,
        binding: u32,
        descriptor_type: vk::DescriptorType,
        stage_flags: vk::ShaderStageFlags,
        count: u32,
    ) -> Result<Self> {
        if self.bindings.contains_key(&binding) {
            return Err(RenderError::DuplicateBinding(binding));
        }
        self.bindings.insert(
            binding,
            vk::DescriptorSetLayoutBinding {
                binding,
                descriptor_type,
                descriptor_count: count,
                stage_flags,
                ..Default::default()
            },
        );
        Ok(self)
    }

    pub fn build(self) -> Result<DescriptorSetLayout<G>> {
        let bindings: Vec<_> = self.bindings.values().copied().collect();
        let info = vk::DescriptorSetLayoutCreateInfo {
            s_type: vk::StructureType::DESCRIPTOR_SET_LAYOUT_CREATE_INFO,
            binding_count: bindings.len() as u32,
            p_bindings: bindings.as_ptr(),
            ..Default::default()
        };
        let layout = unsafe { self.device.gpu().create_descriptor_set_layout(&info) }
            .call("vkCreateDescriptorSetLayout")?;
        Ok(DescriptorSetLayout {
            device: self.device,
            layout,
            bindings: self.bindings,
        })
    }
}

impl<G: Gpu> DescriptorSetLayout<G> {
    pub fn builder(device: Rc<Device<G>>) -> DescriptorSetLayoutBuilder<G> {
        DescriptorSetLayoutBuilder {
            device,
            bindings: BTreeMap::new(),
        }
    }

    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }

    /// Type of a single-descriptor binding, provided `accepts` allows it.
    fn single_binding(
        &self,
        binding: u32,
        accepts: fn(vk::DescriptorType) -> bool,
    ) -> Result<vk::DescriptorType> {
        match self.bindings.get(&binding) {
            Some(b) if b.descriptor_count == 1 => {
                if accepts(b.descriptor_type) {
                    Ok(b.descriptor_type)
                } else {
                    Err(RenderError::DescriptorTypeMismatch {
                        binding,
                        descriptor_type: b.descriptor_type,
                    })
                }
            }
            _ => Err(RenderError::UnknownBinding(binding)),
        }
    }
}

impl<G: Gpu> Drop for DescriptorSetLayout<G> {
    fn drop(&mut self) {
        unsafe { self.device.gpu().destroy_descriptor_set_layout(self.layout) };
    }
}

pub struct DescriptorPool<G: Gpu = AshGpu> {
    device: Rc<Device<G>>,
    pool: vk::DescriptorPool,
}

pub struct DescriptorPoolBuilder<G: Gpu = AshGpu> {
    device: Rc<Device<G>>,
    max_sets: u32,
    flags: vk::DescriptorPoolCreateFlags,
    sizes: Vec<vk::DescriptorPoolSize>,
}

impl<G: Gpu> DescriptorPoolBuilder<G> {
    pub fn add_pool_size(mut self, descriptor_type: vk::DescriptorType, count: u32) -> Self {
        self.sizes.push(vk::DescriptorPoolSize {
            ty: descriptor_type,
            descriptor_count: count,
        });
        self
    }

    /// `FREE_DESCRIPTOR_SET` is needed for [`DescriptorPool::free`].
    pub fn pool_flags(mut self, flags: vk::DescriptorPoolCreateFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn max_sets(mut self, count: u32) -> Self {
        self.max_sets = count;
        self
    }

    pub fn build(self) -> Result<DescriptorPool<G>> {
        let info = vk::DescriptorPoolCreateInfo {
            s_type: vk::StructureType::DESCRIPTOR_POOL_CREATE_INFO,
            flags: self.flags,
            max_sets: self.max_sets,
            pool_size_count: self.sizes.len() as u32,
            p_pool_sizes: self.sizes.as_ptr(),
            ..Default::default()
        };
        let pool = unsafe { self.device.gpu().create_descriptor_pool(&info) }
            .call("vkCreateDescriptorPool")?;
        Ok(DescriptorPool {
            device: self.device,
            pool,
        })
    }
}

impl<G: Gpu> DescriptorPool<G> {
    pub fn builder(device: Rc<Device<G>>) -> DescriptorPoolBuilder<G> {
        DescriptorPoolBuilder {
            device,
            max_sets: 1000,
            flags: vk::DescriptorPoolCreateFlags::empty(),
            sizes: Vec::new(),
        }
    }

    pub fn handle(&self) -> vk::DescriptorPool {
        self.pool
    }

    pub fn allocate(&self, layout: &DescriptorSetLayout<G>) -> Result<vk::DescriptorSet> {
        let info = vk::DescriptorSetAllocateInfo {
            s_type: vk::StructureType::DESCRIPTOR_SET_ALLOCATE_INFO,
            descriptor_pool: self.pool,
            descriptor_set_count: 1,
            p_set_layouts: &layout.layout,
            ..Default::default()
        };
        unsafe { self.device.gpu().allocate_descriptor_sets(&info) }
            .call("vkAllocateDescriptorSets")?
            .into_iter()
            .next()
            .ok_or(RenderError::Vk {
                call: "vkAllocateDescriptorSets",
                result: vk::Result::ERROR_UNKNOWN,
            })
    }

    /// The sets must not be in use by pending command buffers.
    pub fn free(&self, sets: &[vk::DescriptorSet]) -> Result<()> {
        unsafe { self.device.gpu().free_descriptor_sets(self.pool, sets) }
            .call("vkFreeDescriptorSets")
    }

    /// Returns every set allocated from this pool.
    pub fn reset(&self) -> Result<()> {
        unsafe { self.device.gpu().reset_descriptor_pool(self.pool) }
            .call("vkResetDescriptorPool")
    }
}

impl<G: Gpu> Drop for DescriptorPool<G> {
    fn drop(&mut self) {
        unsafe { self.device.gpu().destroy_descriptor_pool(self.pool) };
    }
}

fn takes_buffer_info(ty: vk::DescriptorType) -> bool {
    matches!(
        ty,
        vk::DescriptorType::UNIFORM_BUFFER
            | vk::DescriptorType::STORAGE_BUFFER
            | vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC
            | vk::DescriptorType::STORAGE_BUFFER_DYNAMIC
    )
}

fn takes_image_info(ty: vk::DescriptorType) -> bool {
    matches!(
        ty,
        vk::DescriptorType::SAMPLER
            | vk::DescriptorType::COMBINED_IMAGE_SAMPLER
            | vk::DescriptorType::SAMPLED_IMAGE
            | vk::DescriptorType::STORAGE_IMAGE
            | vk::DescriptorType::INPUT_ATTACHMENT
    )
}

enum Resource {
    Buffer(vk::DescriptorBufferInfo),
    Image(vk::DescriptorImageInfo),
}

struct PendingWrite {
    binding: u32,
    descriptor_type: vk::DescriptorType,
    resource: Resource,
}

/// Collects buffer and image writes for one layout, then allocates a set from
/// `pool` and applies them, or applies them to an existing set.
pub struct DescriptorWriter<'a, G: Gpu = AshGpu> {
    layout: &'a DescriptorSetLayout<G>,
    pool: &'a DescriptorPool<G>,
    writes: Vec<PendingWrite>,
}

impl<'a, G: Gpu> DescriptorWriter<'a, G> {
    pub fn new(layout: &'a DescriptorSetLayout<G>, pool: &'a DescriptorPool<G>) -> Self {
        Self {
            layout,
            pool,
            writes: Vec::new(),
        }
    }

    pub fn write_buffer(mut self, binding: u32, info: vk::DescriptorBufferInfo) -> Result<Self> {
        let descriptor_type = self.layout.single_binding(binding, takes_buffer_info)?;
        self.writes.push(PendingWrite {
            binding,
            descriptor_type,
            resource: Resource::Buffer(info),
        });
        Ok(self)
    }

    pub fn write_image(mut self, binding: u32, info: vk::DescriptorImageInfo) -> Result<Self> {
        let descriptor_type = self.layout.single_binding(binding, takes_image_info)?;
        self.writes.push(PendingWrite {
            binding,
            descriptor_type,
            resource: Resource::Image(info),
        });
        Ok(self)
    }

    pub fn build(&self) -> Result<vk::DescriptorSet> {
        let set = self.pool.allocate(self.layout)?;
        self.overwrite(set);
        Ok(set)
    }

    pub fn overwrite(&self, set: vk::DescriptorSet) {
        let writes: Vec<vk::WriteDescriptorSet<'_>> = self
            .writes
            .iter()
            .map(|pending| {
                let mut write = vk::WriteDescriptorSet {
                    s_type: vk::StructureType::WRITE_DESCRIPTOR_SET,
                    dst_set: set,
                    dst_binding: pending.binding,
                    descriptor_count: 1,
                    descriptor_type: pending.descriptor_type,
                    ..Default::default()
                };
                match &pending.resource {
                    Resource::Buffer(info) => write.p_buffer_info = info,
                    Resource::Image(info) => write.p_image_info = info,
                }
                write
            })
            .collect();
        unsafe { self.pool.device.gpu().update_descriptor_sets(&writes) };
    }
}
