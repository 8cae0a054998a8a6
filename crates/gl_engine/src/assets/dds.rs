//! DDS container decoding for block-compressed textures
//!
//! Only the S3TC/DXT FourCC variants are understood. The payload is split
//! into mip levels on the CPU so each level can be uploaded as-is.

use super::AssetError;

/// File signature at offset 0
pub const DDS_MAGIC: &[u8; 4] = b"DDS ";

/// Header size following the magic
pub const DDS_HEADER_SIZE: usize = 124;

const DATA_OFFSET: usize = DDS_MAGIC.len() + DDS_HEADER_SIZE;

// Byte offsets into the header, relative to the end of the magic.
const HEIGHT_OFFSET: usize = 8;
const WIDTH_OFFSET: usize = 12;
const LINEAR_SIZE_OFFSET: usize = 16;
const MIP_COUNT_OFFSET: usize = 24;
const FOURCC_OFFSET: usize = 80;

const FOURCC_DXT1: u32 = u32::from_le_bytes(*b"DXT1");
const FOURCC_DXT3: u32 = u32::from_le_bytes(*b"DXT3");
const FOURCC_DXT5: u32 = u32::from_le_bytes(*b"DXT5");

/// S3TC block compression variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockFormat {
    /// 8-byte blocks, 1-bit alpha
    Dxt1,
    /// 16-byte blocks, explicit alpha
    Dxt3,
    /// 16-byte blocks, interpolated alpha
    Dxt5,
}

impl BlockFormat {
    fn from_fourcc(fourcc: u32) -> Option<Self> {
        match fourcc {
            FOURCC_DXT1 => Some(Self::Dxt1),
            FOURCC_DXT3 => Some(Self::Dxt3),
            FOURCC_DXT5 => Some(Self::Dxt5),
            _ => None,
        }
    }

    /// Bytes per 4x4 block
    pub const fn block_size(self) -> usize {
        match self {
            Self::Dxt1 => 8,
            Self::Dxt3 | Self::Dxt5 => 16,
        }
    }

    /// Bytes needed for one level of the given size, `None` if it does not
    /// fit in `usize`
    pub const fn level_size(self, width: u32, height: u32) -> Option<usize> {
        let blocks_wide = (width as usize).div_ceil(4);
        let blocks_high = (height as usize).div_ceil(4);
        match blocks_wide.checked_mul(blocks_high) {
            Some(blocks) => blocks.checked_mul(self.block_size()),
            None => None,
        }
    }
}

/// One mip level of a compressed image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MipLevel {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Compressed blocks
    pub data: Vec<u8>,
}

/// A decoded DDS container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdsImage {
    /// Block compression of every level
    pub format: BlockFormat,
    /// Base level width
    pub width: u32,
    /// Base level height
    pub height: u32,
    /// Linear size field from the header, informational
    pub linear_size: u32,
    /// Mip chain, base level first
    pub levels: Vec<MipLevel>,
}

/// Whether the bytes start with the DDS signature
pub fn is_dds(bytes: &[u8]) -> bool {
    bytes.starts_with(DDS_MAGIC)
}

fn read_u32(bytes: &[u8], header_offset: usize) -> u32 {
    let at = DDS_MAGIC.len() + header_offset;
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(word)
}

impl DdsImage {
    /// Decode a DDS file held in memory
    pub fn decode(bytes: &[u8]) -> Result<Self, AssetError> {
        if !is_dds(bytes) {
            return Err(AssetError::UnrecognizedFormat("missing DDS signature".to_string()));
        }
        if bytes.len() < DATA_OFFSET {
            return Err(AssetError::InvalidData(format!(
                "DDS file is {} bytes, shorter than its {DATA_OFFSET}-byte header",
                bytes.len()
            )));
        }

        let height = read_u32(bytes, HEIGHT_OFFSET);
        let width = read_u32(bytes, WIDTH_OFFSET);
        let linear_size = read_u32(bytes, LINEAR_SIZE_OFFSET);
        let mip_count = read_u32(bytes, MIP_COUNT_OFFSET).max(1);
        let fourcc = read_u32(bytes, FOURCC_OFFSET);

        let format = BlockFormat::from_fourcc(fourcc).ok_or_else(|| {
            AssetError::UnsupportedFormat(format!(
                "DDS FourCC '{}'",
                String::from_utf8_lossy(&fourcc.to_le_bytes())
            ))
        })?;
        if width == 0 || height == 0 {
            return Err(AssetError::InvalidData(format!("DDS size {width}x{height}")));
        }

        let payload = &bytes[DATA_OFFSET..];
        let mut levels = Vec::new();
        let (mut w, mut h) = (width, height);
        let mut offset: usize = 0;
        for level in 0..mip_count {
            let end = format
                .level_size(w, h)
                .and_then(|size| offset.checked_add(size).map(|end| (size, end)));
            let Some((size, end)) = end else {
                return Err(AssetError::InvalidData(format!(
                    "DDS level {level} of {w}x{h} is too large"
                )));
            };
            let Some(data) = payload.get(offset..end) else {
                if level == 0 {
                    return Err(AssetError::InvalidData(format!(
                        "DDS payload has {} bytes, base level needs {size}",
                        payload.len()
                    )));
                }
                log::warn!("DDS declares {mip_count} mip levels but data ends after {level}");
                break;
            };
            levels.push(MipLevel { width: w, height: h, data: data.to_vec() });
            offset = end;
            w = (w / 2).max(1);
            h = (h / 2).max(1);
        }

        log::debug!("Decoded DDS {width}x{height} {format:?} with {} level(s)", levels.len());
        Ok(Self { format, width, height, linear_size, levels })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a DDS file in memory with zeroed blocks
    pub(crate) fn build_dds(
        fourcc: &[u8; 4],
        width: u32,
        height: u32,
        mips: u32,
        payload: usize,
    ) -> Vec<u8> {
        let mut bytes = vec![0u8; DATA_OFFSET + payload];
        bytes[..4].copy_from_slice(DDS_MAGIC);
        let mut put = |offset: usize, value: u32| {
            let at = DDS_MAGIC.len() + offset;
            bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
        };
        put(HEIGHT_OFFSET, height);
        put(WIDTH_OFFSET, width);
        put(MIP_COUNT_OFFSET, mips);
        put(FOURCC_OFFSET, u32::from_le_bytes(*fourcc));
        bytes
    }

    #[test]
    fn test_dxt1_mip_chain() {
        // 8x8 -> 4x4 -> 2x2 -> 1x1: 4 + 1 + 1 + 1 blocks of 8 bytes
        let bytes = build_dds(b"DXT1", 8, 8, 4, 56);
        let image = DdsImage::decode(&bytes).unwrap();
        assert_eq!(image.format, BlockFormat::Dxt1);
        let sizes: Vec<_> =
            image.levels.iter().map(|l| (l.width, l.height, l.data.len())).collect();
        assert_eq!(sizes, vec![(8, 8, 32), (4, 4, 8), (2, 2, 8), (1, 1, 8)]);
    }

    #[test]
    fn test_dxt5_block_size_and_non_square() {
        let bytes = build_dds(b"DXT5", 8, 4, 2, 32 + 16);
        let image = DdsImage::decode(&bytes).unwrap();
        assert_eq!(image.format.block_size(), 16);
        assert_eq!(image.levels.len(), 2);
        assert_eq!((image.levels[1].width, image.levels[1].height), (4, 2));
    }

    #[test]
    fn test_zero_mip_count_means_one_level() {
        let bytes = build_dds(b"DXT3", 4, 4, 0, 16);
        let image = DdsImage::decode(&bytes).unwrap();
        assert_eq!(image.levels.len(), 1);
    }

    #[test]
    fn test_truncated_mip_chain_is_cut() {
        let bytes = build_dds(b"DXT1", 8, 8, 4, 32 + 8);
        let image = DdsImage::decode(&bytes).unwrap();
        assert_eq!(image.levels.len(), 2);
    }

    #[test]
    fn test_rejections() {
        assert!(matches!(DdsImage::decode(b"PNG!"), Err(AssetError::UnrecognizedFormat(_))));
        assert!(matches!(DdsImage::decode(b"DDS \0\0\0"), Err(AssetError::InvalidData(_))));
        let unknown = build_dds(b"ATI2", 4, 4, 1, 16);
        assert!(matches!(DdsImage::decode(&unknown), Err(AssetError::UnsupportedFormat(_))));
        let empty = build_dds(b"DXT1", 4, 4, 1, 0);
        assert!(matches!(DdsImage::decode(&empty), Err(AssetError::InvalidData(_))));
    }

    #[test]
    fn test_oversized_dimensions_rejected() {
        assert_eq!(BlockFormat::Dxt5.level_size(u32::MAX, u32::MAX), None);
        assert_eq!(BlockFormat::Dxt1.level_size(8, 8), Some(32));
        let huge = build_dds(b"DXT5", u32::MAX, u32::MAX, 1, 16);
        assert!(matches!(DdsImage::decode(&huge), Err(AssetError::InvalidData(_))));
    }
}
