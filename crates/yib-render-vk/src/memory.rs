// SPDX-License-Identifier: CEPL-1.0
use ash::vk;

/// First memory type allowed by `type_filter` whose flags contain `properties`.
///
/// `None` is an ordinary outcome (the device simply has no such heap), callers
/// decide whether that is fatal.
pub fn find_memory_type(
    mem_props: &vk::PhysicalDeviceMemoryProperties,
    type_filter: u32,
    properties: vk::MemoryPropertyFlags,
) -> Option<u32> {
    (0..mem_props.memory_type_count.min(vk::MAX_MEMORY_TYPES as u32)).find(|&i| {
        type_filter & (1 << i) != 0
            && mem_props.memory_types[i as usize]
                .property_flags
                .contains(properties)
    })
}

/// Rounds `instance_size` up to a multiple of `min_offset_alignment`.
/// An alignment of zero leaves the size as is.
pub fn aligned_size(
    instance_size: vk::DeviceSize,
    min_offset_alignment: vk::DeviceSize,
) -> vk::DeviceSize {
    if min_offset_alignment > 0 {
        instance_size.div_ceil(min_offset_alignment) * min_offset_alignment
    } else {
        instance_size
    }
}
