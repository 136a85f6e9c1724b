// block.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! In-memory model of GIF blocks, with recorded stream offsets
use crate::error::{Error, Result};

/// Bytes per color table entry
pub(crate) const CHANNELS: usize = 3;

/// An RGB color table entry
pub type Rgb = [u8; CHANNELS];

/// How a document (and every block within it) may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Fields may only be read
    ReadOnly,
    /// Fields may be written through to the backing stream
    ReadWrite,
}

impl Default for Access {
    fn default() -> Self {
        Access::ReadOnly
    }
}

impl Access {
    /// Check that writing is allowed
    pub(crate) fn check_writable(self) -> Result<()> {
        match self {
            Access::ReadWrite => Ok(()),
            Access::ReadOnly => Err(Error::WriteProtected),
        }
    }
}

/// Marker byte found before each block in the block chain.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlockCode {
    Extension_,
    ImageDesc_,
    Trailer_,
}

impl BlockCode {
    pub fn from_u8(t: u8) -> Option<Self> {
        use self::BlockCode::*;
        match t {
            b',' => Some(ImageDesc_), // (0x2C) Image separator
            b'!' => Some(Extension_), // (0x21) Extension introducer
            b';' => Some(Trailer_),   // (0x3B) GIF trailer
            _ => None,
        }
    }
    pub fn signature(&self) -> &'static [u8] {
        use self::BlockCode::*;
        match self {
            ImageDesc_ => b",",
            Extension_ => b"!",
            Trailer_ => b";",
        }
    }
}

/// Extension type, by label
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExtensionCode {
    PlainText,
    GraphicControl,
    Comment,
    Application,
    Unknown(u8),
}

impl From<u8> for ExtensionCode {
    fn from(n: u8) -> Self {
        use self::ExtensionCode::*;
        match n {
            0x01 => PlainText,
            0xF9 => GraphicControl,
            0xFE => Comment,
            0xFF => Application,
            _ => Unknown(n),
        }
    }
}

impl From<ExtensionCode> for u8 {
    fn from(t: ExtensionCode) -> Self {
        use self::ExtensionCode::*;
        match t {
            PlainText => 0x01,
            GraphicControl => 0xF9,
            Comment => 0xFE,
            Application => 0xFF,
            Unknown(n) => n,
        }
    }
}

/// Global or local color table.
///
/// The number of entries is fixed when parsed, and is always a power of two
/// between 2 and 256.
#[derive(Debug, Default)]
pub struct ColorTable {
    pub(crate) colors: Vec<u8>,
    pub(crate) origin: Option<u64>,
    pub(crate) access: Access,
}

impl ColorTable {
    /// Create a detached (read-only) color table from packed RGB bytes.
    pub fn with_colors(colors: &[u8]) -> Self {
        assert_eq!(colors.len() / CHANNELS * CHANNELS, colors.len());
        let colors = colors.to_vec();
        ColorTable {
            colors,
            ..Default::default()
        }
    }
    /// Get the number of colors
    pub fn len(&self) -> usize {
        self.colors.len() / CHANNELS
    }
    /// Check if the table has no colors
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
    /// Get the size exponent, as stored in a packed byte
    pub fn len_bits(&self) -> u8 {
        let sz = self.len();
        for b in 0..7 {
            if (sz >> (b + 1)) == 1 {
                return b;
            }
        }
        7
    }
    /// Get the size in bytes
    pub fn size_bytes(&self) -> usize {
        self.colors.len()
    }
    /// Get packed RGB bytes
    pub fn colors(&self) -> &[u8] {
        &self.colors
    }
    /// Get stream offset of the first entry
    pub fn origin(&self) -> Option<u64> {
        self.origin
    }
    /// Get one color
    pub fn get_color(&self, idx: usize) -> Result<Rgb> {
        if idx < self.len() {
            let i = idx * CHANNELS;
            Ok([self.colors[i], self.colors[i + 1], self.colors[i + 2]])
        } else {
            Err(Error::OutOfRange)
        }
    }
}

/// Extension block, holding a single data sub-block.
#[derive(Debug, Default)]
pub struct Extension {
    pub(crate) label: u8,
    pub(crate) data: Vec<u8>,
    pub(crate) origin: Option<u64>,
    pub(crate) access: Access,
}

impl Extension {
    /// Create a detached (read-only) extension.
    pub fn new(label: u8, data: &[u8]) -> Self {
        assert!(data.len() < 256);
        Extension {
            label,
            data: data.to_vec(),
            ..Default::default()
        }
    }
    pub fn label(&self) -> u8 {
        self.label
    }
    pub fn code(&self) -> ExtensionCode {
        self.label.into()
    }
    /// Get the payload bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }
    /// Read a range of the payload, clamped to its bounds
    pub fn read(&self, pos: usize, len: usize) -> &[u8] {
        let start = pos.min(self.data.len());
        let end = pos.saturating_add(len).min(self.data.len());
        &self.data[start..end]
    }
    /// Get stream offset of the label byte
    pub fn origin(&self) -> Option<u64> {
        self.origin
    }
}

/// One link of an image data sub-block chain
#[derive(Debug)]
pub struct SubBlock {
    pub(crate) origin: u64,
    pub(crate) data: Vec<u8>,
}

impl SubBlock {
    /// Get stream offset of the length byte
    pub fn origin(&self) -> u64 {
        self.origin
    }
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Image data, kept as undecoded LZW sub-blocks
#[derive(Debug, Default)]
pub struct ImageData {
    pub(crate) min_code_size: u8,
    pub(crate) chain: Vec<SubBlock>,
    pub(crate) origin: Option<u64>,
}

impl ImageData {
    pub fn min_code_size(&self) -> u8 {
        self.min_code_size
    }
    pub fn sub_blocks(&self) -> &[SubBlock] {
        &self.chain
    }
    /// Get total length of compressed data (excluding length bytes)
    pub fn data_len(&self) -> usize {
        self.chain.iter().map(|b| b.data.len()).sum()
    }
    /// Get stream offset of the minimum code size byte
    pub fn origin(&self) -> Option<u64> {
        self.origin
    }
}

/// Image descriptor, with optional local color table and image data
#[derive(Debug, Default)]
pub struct Image {
    pub(crate) left: u16,
    pub(crate) top: u16,
    pub(crate) width: u16,
    pub(crate) height: u16,
    pub(crate) flags: u8,
    pub(crate) local_color_table: Option<ColorTable>,
    pub(crate) image_data: ImageData,
    pub(crate) origin: Option<u64>,
    pub(crate) access: Access,
}

impl Image {
    pub(crate) const COLOR_TABLE_PRESENT: u8 = 0b1000_0000;
    const INTERLACED: u8 = 0b0100_0000;
    pub(crate) const COLOR_TABLE_SIZE: u8 = 0b0000_0111;

    /// Relative offsets of descriptor fields
    pub(crate) const LEFT: u64 = 0;
    pub(crate) const TOP: u64 = 2;
    pub(crate) const WIDTH: u64 = 4;
    pub(crate) const HEIGHT: u64 = 6;

    pub fn left(&self) -> u16 {
        self.left
    }
    pub fn top(&self) -> u16 {
        self.top
    }
    pub fn width(&self) -> u16 {
        self.width
    }
    pub fn height(&self) -> u16 {
        self.height
    }
    /// Get the packed byte, as parsed
    pub fn flags(&self) -> u8 {
        self.flags
    }
    pub fn interlaced(&self) -> bool {
        (self.flags & Self::INTERLACED) != 0
    }
    pub fn local_color_table(&self) -> Option<&ColorTable> {
        self.local_color_table.as_ref()
    }
    pub fn image_data(&self) -> &ImageData {
        &self.image_data
    }
    /// Get stream offset of the descriptor (after the separator)
    pub fn origin(&self) -> Option<u64> {
        self.origin
    }
    /// Compute the packed byte from the current local color table
    pub(crate) fn packed(&self) -> u8 {
        packed_flags(
            self.flags,
            self.local_color_table.as_ref(),
            Self::COLOR_TABLE_PRESENT,
            Self::COLOR_TABLE_SIZE,
        )
    }
}

/// Recompute color table bits of a packed byte, keeping all other bits.
pub(crate) fn packed_flags(
    flags: u8,
    tbl: Option<&ColorTable>,
    present: u8,
    size: u8,
) -> u8 {
    match tbl {
        Some(tbl) => {
            (flags & !(present | size)) | present | (tbl.len_bits() & size)
        }
        None => flags & !present,
    }
}

/// A block in the block chain.
#[derive(Debug)]
pub enum Block {
    Extension(Extension),
    Image(Image),
}

impl Block {
    pub fn code(&self) -> BlockCode {
        match self {
            Block::Extension(_) => BlockCode::Extension_,
            Block::Image(_) => BlockCode::ImageDesc_,
        }
    }
}

impl From<Extension> for Block {
    fn from(b: Extension) -> Self {
        Block::Extension(b)
    }
}

impl From<Image> for Block {
    fn from(b: Image) -> Self {
        Block::Image(b)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn color_table_len() {
        let t = ColorTable::with_colors(&[0; 6]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.len_bits(), 0);
        let t = ColorTable::with_colors(&[0; 12]);
        assert_eq!(t.len_bits(), 1);
        let t = ColorTable::with_colors(&[0; 8 * 3]);
        assert_eq!(t.len_bits(), 2);
        let t = ColorTable::with_colors(&[0; 64 * 3]);
        assert_eq!(t.len_bits(), 5);
        let t = ColorTable::with_colors(&[0; 256 * 3]);
        assert_eq!(t.len_bits(), 7);
    }

    #[test]
    fn color_bounds() {
        let t = ColorTable::with_colors(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(t.get_color(1).unwrap(), [4, 5, 6]);
        assert!(matches!(t.get_color(2), Err(Error::OutOfRange)));
        assert!(matches!(t.get_color(3), Err(Error::OutOfRange)));
    }

    #[test]
    fn packed() {
        let t = ColorTable::with_colors(&[0; 4 * 3]);
        assert_eq!(packed_flags(0x40, Some(&t), 0x80, 0x07), 0xC1);
        assert_eq!(packed_flags(0xC7, None, 0x80, 0x07), 0x47);
        assert_eq!(packed_flags(0xF7, Some(&t), 0x80, 0x07), 0xF1);
    }

    #[test]
    fn extension_read() {
        let e = Extension::new(0xFE, b"hello");
        assert_eq!(e.code(), ExtensionCode::Comment);
        assert_eq!(e.read(1, 3), b"ell");
        assert_eq!(e.read(3, 10), b"lo");
        assert_eq!(e.read(9, 1), b"");
    }

    #[test]
    fn block_code() {
        assert_eq!(BlockCode::from_u8(0x21), Some(BlockCode::Extension_));
        assert_eq!(BlockCode::from_u8(0x2C), Some(BlockCode::ImageDesc_));
        assert_eq!(BlockCode::from_u8(0x3B), Some(BlockCode::Trailer_));
        assert_eq!(BlockCode::from_u8(0x00), None);
        let b: Block = Extension::default().into();
        assert_eq!(b.code().signature(), b"!");
    }
}
