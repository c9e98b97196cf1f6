//! Texel block sizes and image storage sizing.

use ash::vk;

/// Dimensions and size of one texel block. Uncompressed formats use 1x1 blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    pub width: u32,
    pub height: u32,
    pub bytes: u32,
}

const fn texel(bytes: u32) -> BlockInfo {
    BlockInfo { width: 1, height: 1, bytes }
}

const fn block(width: u32, height: u32, bytes: u32) -> BlockInfo {
    BlockInfo { width, height, bytes }
}

/// Block layout of `format`. Formats outside the core 1.0 range are sized
/// as 4-byte texels.
pub fn block_info(format: vk::Format) -> BlockInfo {
    match format.as_raw() {
        // R4G4_UNORM_PACK8
        1 => texel(1),
        // 16-bit packed: R4G4B4A4 .. A1R5G5B5
        2..=8 => texel(2),
        // R8
        9..=15 => texel(1),
        // R8G8
        16..=22 => texel(2),
        // R8G8B8, B8G8R8
        23..=36 => texel(3),
        // R8G8B8A8, B8G8R8A8, A8B8G8R8, A2R10G10B10, A2B10G10R10
        37..=69 => texel(4),
        // R16
        70..=76 => texel(2),
        // R16G16
        77..=83 => texel(4),
        // R16G16B16
        84..=90 => texel(6),
        // R16G16B16A16
        91..=97 => texel(8),
        98..=100 => texel(4),
        101..=103 => texel(8),
        104..=106 => texel(12),
        107..=109 => texel(16),
        110..=112 => texel(8),
        113..=115 => texel(16),
        116..=118 => texel(24),
        119..=121 => texel(32),
        // B10G11R11_UFLOAT, E5B9G9R9_UFLOAT
        122 | 123 => texel(4),
        // D16_UNORM
        124 => texel(2),
        // X8_D24_UNORM, D32_SFLOAT
        125 | 126 => texel(4),
        // S8_UINT
        127 => texel(1),
        // D16_UNORM_S8_UINT
        128 => texel(3),
        // D24_UNORM_S8_UINT
        129 => texel(4),
        // D32_SFLOAT_S8_UINT
        130 => texel(8),
        // BC1, BC4
        131..=134 | 139 | 140 => block(4, 4, 8),
        // BC2, BC3, BC5, BC6H, BC7
        135..=138 | 141..=146 => block(4, 4, 16),
        // ETC2 RGB8, RGB8A1, EAC R11
        147..=150 | 153 | 154 => block(4, 4, 8),
        // ETC2 RGBA8, EAC R11G11
        151 | 152 | 155 | 156 => block(4, 4, 16),
        // ASTC, one UNORM/SRGB pair per footprint
        157..=184 => {
            const FOOTPRINTS: [(u32, u32); 14] = [
                (4, 4),
                (5, 4),
                (5, 5),
                (6, 5),
                (6, 6),
                (8, 5),
                (8, 6),
                (8, 8),
                (10, 5),
                (10, 6),
                (10, 8),
                (10, 10),
                (12, 10),
                (12, 12),
            ];
            let (w, h) = FOOTPRINTS[((format.as_raw() - 157) / 2) as usize];
            block(w, h, 16)
        }
        _ => texel(4),
    }
}

/// Bytes of storage an image needs: every mip level of one layer summed,
/// then scaled by array layers and sample count.
pub fn image_size(
    format: vk::Format,
    extent: vk::Extent3D,
    mip_levels: u32,
    array_layers: u32,
    samples: vk::SampleCountFlags,
) -> vk::DeviceSize {
    let block = block_info(format);
    let mip_levels = mip_levels.max(1);
    let mut layer_size: u64 = 0;

    for level in 0..mip_levels.min(u32::BITS) {
        let width = extent.width.checked_shr(level).unwrap_or(0).max(1);
        let height = extent.height.checked_shr(level).unwrap_or(0).max(1);
        let depth = extent.depth.checked_shr(level).unwrap_or(0).max(1);

        let blocks_x = u64::from(width.div_ceil(block.width));
        let blocks_y = u64::from(height.div_ceil(block.height));
        let level_size = blocks_x
            .saturating_mul(blocks_y)
            .saturating_mul(u64::from(depth))
            .saturating_mul(u64::from(block.bytes));
        layer_size = layer_size.saturating_add(level_size);
    }

    // Past 32 halvings every dimension is 1, so each level is a single block.
    let tail_levels = u64::from(mip_levels.saturating_sub(u32::BITS));
    layer_size = layer_size.saturating_add(tail_levels.saturating_mul(u64::from(block.bytes)));

    layer_size
        .saturating_mul(u64::from(array_layers.max(1)))
        .saturating_mul(u64::from(samples.as_raw().max(1)))
}
