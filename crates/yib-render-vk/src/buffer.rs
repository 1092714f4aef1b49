// SPDX-License-Identifier: CEPL-1.0
use std::rc::Rc;

use ash::vk;

use crate::ash_gpu::AshGpu;
use crate::device::Device;
use crate::error::{RenderError, Result, VkResultExt};
use crate::gpu::Gpu;
use crate::memory::aligned_size;

struct Mapping {
    ptr: *mut u8,
    offset: vk::DeviceSize,
    size: vk::DeviceSize,
}

/// A buffer plus its own memory allocation, holding `instance_count` elements
/// of `instance_size` bytes each, every element starting on an
/// `alignment_size` boundary.
///
/// Offsets taken by [`write`](Self::write), [`flush`](Self::flush) and friends
/// are relative to the start of the buffer. Host access needs a mapping that
/// covers the touched range.
pub struct Buffer<G: Gpu = AshGpu> {
    device: Rc<Device<G>>,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    mapping: Option<Mapping>,

    buffer_size: vk::DeviceSize,
    instance_size: vk::DeviceSize,
    instance_count: u32,
    alignment_size: vk::DeviceSize,
    usage: vk::BufferUsageFlags,
    memory_properties: vk::MemoryPropertyFlags,
}

impl<G: Gpu> Buffer<G> {
    pub fn new(
        device: Rc<Device<G>>,
        instance_size: vk::DeviceSize,
        instance_count: u32,
        usage: vk::BufferUsageFlags,
        memory_properties: vk::MemoryPropertyFlags,
        min_offset_alignment: vk::DeviceSize,
    ) -> Result<Self> {
        let alignment_size = aligned_size(instance_size, min_offset_alignment);
        let buffer_size = alignment_size * vk::DeviceSize::from(instance_count);
        let (buffer, memory) = device.create_buffer(buffer_size, usage, memory_properties)?;

        Ok(Self {
            device,
            buffer,
            memory,
            mapping: None,
            buffer_size,
            instance_size,
            instance_count,
            alignment_size,
            usage,
            memory_properties,
        })
    }

    /// Device-local buffer filled with `data` through a host-visible staging buffer.
    ///
    /// `data` must hold exactly `instance_size * instance_count` bytes.
    /// `TRANSFER_DST` is added to `usage`. Blocks until the copy has finished.
    pub fn device_local_with_data(
        device: Rc<Device<G>>,
        data: &[u8],
        instance_size: vk::DeviceSize,
        instance_count: u32,
        usage: vk::BufferUsageFlags,
    ) -> Result<Self> {
        let expected = instance_size * vk::DeviceSize::from(instance_count);
        if data.len() as vk::DeviceSize != expected {
            return Err(RenderError::InstanceSizeMismatch {
                expected,
                actual: data.len() as vk::DeviceSize,
            });
        }

        let mut staging = Self::new(
            device.clone(),
            instance_size,
            instance_count,
            vk::BufferUsageFlags::TRANSFER_SRC,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            0,
        )?;
        staging.map(vk::WHOLE_SIZE, 0)?;
        staging.write(data, vk::WHOLE_SIZE, 0)?;

        let target = Self::new(
            device.clone(),
            instance_size,
            instance_count,
            usage | vk::BufferUsageFlags::TRANSFER_DST,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            0,
        )?;
        unsafe { device.copy_buffer(staging.buffer, target.buffer, expected) }?;
        Ok(target)
    }

    /// Maps `size` bytes starting at `offset`. `vk::WHOLE_SIZE` maps through the end.
    /// An existing mapping is released first.
    pub fn map(&mut self, size: vk::DeviceSize, offset: vk::DeviceSize) -> Result<()> {
        let size = self.resolve(size, offset)?;
        self.unmap();
        let ptr = unsafe { self.device.gpu().map_memory(self.memory, offset, size) }
            .call("vkMapMemory")?;
        self.mapping = Some(Mapping {
            ptr: ptr.cast(),
            offset,
            size,
        });
        Ok(())
    }

    pub fn unmap(&mut self) {
        if self.mapping.take().is_some() {
            unsafe { self.device.gpu().unmap_memory(self.memory) };
        }
    }

    pub fn is_mapped(&self) -> bool {
        self.mapping.is_some()
    }

    /// Copies `size` bytes of `data` to `offset`.
    ///
    /// `vk::WHOLE_SIZE` copies the whole buffer from the start and ignores `offset`.
    pub fn write(
        &mut self,
        data: &[u8],
        size: vk::DeviceSize,
        offset: vk::DeviceSize,
    ) -> Result<()> {
        let (size, offset) = if size == vk::WHOLE_SIZE {
            (self.buffer_size, 0)
        } else {
            (size, offset)
        };
        if size > data.len() as vk::DeviceSize {
            return Err(RenderError::OutOfBounds {
                offset: 0,
                size,
                limit: data.len() as vk::DeviceSize,
            });
        }
        let dst = self.host_ptr(size, offset)?;
        unsafe { std::ptr::copy_nonoverlapping(data.as_ptr(), dst, size as usize) };
        Ok(())
    }

    /// Bytes currently visible through the mapping. Pair with
    /// [`invalidate`](Self::invalidate) on non-coherent memory.
    pub fn read(&self, size: vk::DeviceSize, offset: vk::DeviceSize) -> Result<&[u8]> {
        let size = self.resolve(size, offset)?;
        let src = self.host_ptr(size, offset)?;
        Ok(unsafe { std::slice::from_raw_parts(src, size as usize) })
    }

    /// Makes host writes in the range visible to the device.
    pub fn flush(&self, size: vk::DeviceSize, offset: vk::DeviceSize) -> Result<()> {
        let range = self.mapped_range(size, offset)?;
        unsafe { self.device.gpu().flush_mapped_range(&range) }.call("vkFlushMappedMemoryRanges")
    }

    /// Makes device writes in the range visible to the host.
    pub fn invalidate(&self, size: vk::DeviceSize, offset: vk::DeviceSize) -> Result<()> {
        let range = self.mapped_range(size, offset)?;
        unsafe { self.device.gpu().invalidate_mapped_range(&range) }
            .call("vkInvalidateMappedMemoryRanges")
    }

    pub fn descriptor_info(
        &self,
        size: vk::DeviceSize,
        offset: vk::DeviceSize,
    ) -> vk::DescriptorBufferInfo {
        vk::DescriptorBufferInfo {
            buffer: self.buffer,
            offset,
            range: size,
        }
    }

    /// Writes one element at `index * alignment_size`.
    pub fn write_to_index<T: bytemuck::Pod>(&mut self, value: &T, index: u32) -> Result<()> {
        let bytes = bytemuck::bytes_of(value);
        if bytes.len() as vk::DeviceSize != self.instance_size {
            return Err(RenderError::InstanceSizeMismatch {
                expected: self.instance_size,
                actual: bytes.len() as vk::DeviceSize,
            });
        }
        let offset = self.index_offset(index)?;
        self.write(bytes, self.instance_size, offset)
    }

    pub fn read_index(&self, index: u32) -> Result<&[u8]> {
        let offset = self.index_offset(index)?;
        self.read(self.instance_size, offset)
    }

    pub fn flush_index(&self, index: u32) -> Result<()> {
        let offset = self.index_offset(index)?;
        self.flush(self.alignment_size, offset)
    }

    pub fn invalidate_index(&self, index: u32) -> Result<()> {
        let offset = self.index_offset(index)?;
        self.invalidate(self.alignment_size, offset)
    }

    pub fn descriptor_info_for_index(&self, index: u32) -> vk::DescriptorBufferInfo {
        self.descriptor_info(
            self.alignment_size,
            vk::DeviceSize::from(index) * self.alignment_size,
        )
    }

    pub fn buffer(&self) -> vk::Buffer {
        self.buffer
    }

    pub fn memory(&self) -> vk::DeviceMemory {
        self.memory
    }

    pub fn buffer_size(&self) -> vk::DeviceSize {
        self.buffer_size
    }

    pub fn instance_size(&self) -> vk::DeviceSize {
        self.instance_size
    }

    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }

    pub fn alignment_size(&self) -> vk::DeviceSize {
        self.alignment_size
    }

    pub fn usage(&self) -> vk::BufferUsageFlags {
        self.usage
    }

    pub fn memory_properties(&self) -> vk::MemoryPropertyFlags {
        self.memory_properties
    }

    fn index_offset(&self, index: u32) -> Result<vk::DeviceSize> {
        if index >= self.instance_count {
            return Err(RenderError::OutOfBounds {
                offset: vk::DeviceSize::from(index) * self.alignment_size,
                size: self.instance_size,
                limit: self.buffer_size,
            });
        }
        Ok(vk::DeviceSize::from(index) * self.alignment_size)
    }

    /// Concrete length for a `(size, offset)` pair, checked against the buffer.
    fn resolve(&self, size: vk::DeviceSize, offset: vk::DeviceSize) -> Result<vk::DeviceSize> {
        let out_of_bounds = RenderError::OutOfBounds {
            offset,
            size,
            limit: self.buffer_size,
        };
        if offset > self.buffer_size {
            return Err(out_of_bounds);
        }
        if size == vk::WHOLE_SIZE {
            return Ok(self.buffer_size - offset);
        }
        match offset.checked_add(size) {
            Some(end) if end <= self.buffer_size => Ok(size),
            _ => Err(out_of_bounds),
        }
    }

    fn host_ptr(&self, size: vk::DeviceSize, offset: vk::DeviceSize) -> Result<*mut u8> {
        let (mapping, _) = self.within_mapping(size, offset)?;
        Ok(unsafe { mapping.ptr.add((offset - mapping.offset) as usize) })
    }

    /// Checks `[offset, offset + size)` against the current mapping.
    /// `vk::WHOLE_SIZE` runs to the end of the mapping.
    fn within_mapping(
        &self,
        size: vk::DeviceSize,
        offset: vk::DeviceSize,
    ) -> Result<(&Mapping, vk::DeviceSize)> {
        let mapping = self.mapping.as_ref().ok_or(RenderError::NotMapped)?;
        let end = mapping.offset + mapping.size;
        let size = if size == vk::WHOLE_SIZE {
            end.saturating_sub(offset)
        } else {
            size
        };
        let in_mapping = offset >= mapping.offset
            && offset.checked_add(size).is_some_and(|last| last <= end);
        if !in_mapping {
            return Err(RenderError::OutOfBounds {
                offset,
                size,
                limit: end,
            });
        }
        Ok((mapping, size))
    }

    fn mapped_range(
        &self,
        size: vk::DeviceSize,
        offset: vk::DeviceSize,
    ) -> Result<vk::MappedMemoryRange<'static>> {
        let (mapping, size) = self.within_mapping(size, offset)?;
        if size == 0 {
            return Err(RenderError::OutOfBounds {
                offset,
                size,
                limit: mapping.offset + mapping.size,
            });
        }
        Ok(vk::MappedMemoryRange {
            s_type: vk::StructureType::MAPPED_MEMORY_RANGE,
            memory: self.memory,
            offset,
            size,
            ..Default::default()
        })
    }
}

impl<G: Gpu> Drop for Buffer<G> {
    fn drop(&mut self) {
        self.unmap();
        unsafe { self.device.destroy_buffer(self.buffer, self.memory) };
    }
}
