// private.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! Private module for top-level items
use crate::block::*;
use crate::decode::Parser;
use crate::error::{Error, Result};
use crate::patch::write_at;
use std::fs::{File, OpenOptions};
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Backing storage for a writable GIF document.
///
/// Besides reading, writing and seeking, storage must be able to discard its
/// content for [recompile](struct.GifFile.html#method.recompile).
pub trait Storage: Read + Write + Seek {
    /// Discard all content.
    fn truncate(&mut self) -> io::Result<()>;
}

impl Storage for File {
    fn truncate(&mut self) -> io::Result<()> {
        self.set_len(0)
    }
}

impl Storage for Cursor<Vec<u8>> {
    fn truncate(&mut self) -> io::Result<()> {
        self.get_mut().clear();
        Ok(())
    }
}

impl Storage for Cursor<&mut Vec<u8>> {
    fn truncate(&mut self) -> io::Result<()> {
        self.get_mut().clear();
        Ok(())
    }
}

impl<S: Storage + ?Sized> Storage for &mut S {
    fn truncate(&mut self) -> io::Result<()> {
        (**self).truncate()
    }
}

/// An open GIF document.
///
/// The document owns its backing stream for its entire lifetime.  Scalar
/// fields can be patched in place at the byte offsets recorded while
/// parsing; adding, removing or reordering blocks requires a full
/// [recompile].
///
/// ## Example: patch the canvas size of a GIF in memory
/// ```
/// use gifpatch::{Access, GifFile};
/// use std::io::Cursor;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let gif = vec![
///     0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00,
///     0x02, 0x00, 0x80, 0x01, 0x00, 0x00, 0x00, 0x00,
///     0xff, 0xff, 0xff, 0x2c, 0x00, 0x00, 0x00, 0x00,
///     0x02, 0x00, 0x02, 0x00, 0x00, 0x02, 0x03, 0x0c,
///     0x10, 0x05, 0x00, 0x3b,
/// ];
/// let mut doc = GifFile::parse(Cursor::new(gif), Access::ReadWrite)?;
/// doc.set_screen_width(4)?;
/// doc.set_global_color(1, [0xFF, 0x00, 0x00])?;
/// let gif = doc.into_inner().into_inner();
/// assert_eq!(&gif[6..8], &[0x04, 0x00]);
/// assert_eq!(&gif[16..19], &[0xFF, 0x00, 0x00]);
/// # Ok(())
/// # }
/// ```
///
/// [recompile]: struct.GifFile.html#method.recompile
#[derive(Debug)]
pub struct GifFile<S> {
    /// Backing stream
    stream: S,
    /// Access mode chosen when opened
    access: Access,
    /// Signature (normally `GIF`)
    signature: [u8; 3],
    /// Version (`87a` / `89a`)
    version: [u8; 3],
    screen_width: u16,
    screen_height: u16,
    flags: u8,
    background_color_idx: u8,
    pixel_aspect_ratio: u8,
    /// Offset of logical screen descriptor
    screen_origin: Option<u64>,
    global_color_table: Option<ColorTable>,
    blocks: Vec<Block>,
    /// Block chain ended with a trailer
    trailer: bool,
}

/// Get the `n`th extension
fn extension_mut(blocks: &mut [Block], n: usize) -> Result<&mut Extension> {
    blocks
        .iter_mut()
        .filter_map(|b| match b {
            Block::Extension(e) => Some(e),
            _ => None,
        })
        .nth(n)
        .ok_or(Error::OutOfRange)
}

/// Get the `n`th image
fn image_mut(blocks: &mut [Block], n: usize) -> Result<&mut Image> {
    blocks
        .iter_mut()
        .filter_map(|b| match b {
            Block::Image(img) => Some(img),
            _ => None,
        })
        .nth(n)
        .ok_or(Error::OutOfRange)
}

impl<S> GifFile<S> {
    const COLOR_TABLE_PRESENT: u8 = 0b1000_0000;
    const COLOR_TABLE_SIZE: u8 = 0b0000_0111;

    /// Relative offsets of logical screen descriptor fields
    const WIDTH: u64 = 0;
    const HEIGHT: u64 = 2;
    const BACKGROUND: u64 = 5;
    const ASPECT: u64 = 6;

    pub fn access(&self) -> Access {
        self.access
    }
    pub fn signature(&self) -> [u8; 3] {
        self.signature
    }
    pub fn version(&self) -> [u8; 3] {
        self.version
    }
    /// Get first two version bytes as a little-endian number
    pub fn version_number(&self) -> u16 {
        u16::from_le_bytes([self.version[0], self.version[1]])
    }
    pub fn screen_width(&self) -> u16 {
        self.screen_width
    }
    pub fn screen_height(&self) -> u16 {
        self.screen_height
    }
    /// Get the logical screen packed byte, as parsed
    pub fn flags(&self) -> u8 {
        self.flags
    }
    pub fn background_color_idx(&self) -> u8 {
        self.background_color_idx
    }
    pub fn pixel_aspect_ratio(&self) -> u8 {
        self.pixel_aspect_ratio
    }
    pub fn global_color_table(&self) -> Option<&ColorTable> {
        self.global_color_table.as_ref()
    }
    /// Get all blocks, in document order
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }
    /// Get an `Iterator` of extension blocks, in document order
    pub fn extensions(&self) -> impl Iterator<Item = &Extension> + '_ {
        self.blocks.iter().filter_map(|b| match b {
            Block::Extension(e) => Some(e),
            _ => None,
        })
    }
    /// Get an `Iterator` of image blocks, in document order
    pub fn images(&self) -> impl Iterator<Item = &Image> + '_ {
        self.blocks.iter().filter_map(|b| match b {
            Block::Image(img) => Some(img),
            _ => None,
        })
    }
    /// Check whether the block chain ended with a trailer
    pub fn has_trailer(&self) -> bool {
        self.trailer
    }
    /// Get a reference to the backing stream
    pub fn get_ref(&self) -> &S {
        &self.stream
    }
    /// Release the backing stream
    pub fn into_inner(self) -> S {
        self.stream
    }
    /// Compute the logical screen packed byte from the global color table
    fn packed(&self) -> u8 {
        packed_flags(
            self.flags,
            self.global_color_table.as_ref(),
            Self::COLOR_TABLE_PRESENT,
            Self::COLOR_TABLE_SIZE,
        )
    }
    /// Rebuild the entire document from in-memory state.
    ///
    /// No recorded offsets are touched; to rewrite the backing stream itself
    /// use [recompile](struct.GifFile.html#method.recompile).
    pub fn rebuild<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let mut buf = Vec::with_capacity(13);
        buf.extend_from_slice(&self.signature);
        buf.extend_from_slice(&self.version);
        buf.extend_from_slice(&self.screen_width.to_le_bytes());
        buf.extend_from_slice(&self.screen_height.to_le_bytes());
        buf.push(self.packed());
        buf.push(self.background_color_idx);
        buf.push(self.pixel_aspect_ratio);
        w.write_all(&buf)?;
        if let Some(tbl) = &self.global_color_table {
            tbl.rebuild(w)?;
        }
        for block in &self.blocks {
            block.rebuild(w)?;
        }
        w.write_all(BlockCode::Trailer_.signature())
    }
    /// Mark every recorded offset stale
    fn invalidate(&mut self) {
        self.screen_origin = None;
        if let Some(tbl) = &mut self.global_color_table {
            tbl.invalidate();
        }
        for block in self.blocks.iter_mut() {
            block.invalidate();
        }
    }
}

impl GifFile<File> {
    /// Open a GIF file for reading and in-place writing
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Self::parse(file, Access::ReadWrite)
    }
    /// Open a GIF file read-only
    pub fn read_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::parse(file, Access::ReadOnly)
    }
}

impl<S: Read + Seek> GifFile<S> {
    /// Parse a GIF document from the start of a stream
    pub fn parse(mut stream: S, access: Access) -> Result<Self> {
        stream.seek(SeekFrom::Start(0))?;
        let mut parser = Parser::new(&mut stream, 0, access);
        let mut signature = [0; 3];
        parser.read_buf(&mut signature)?;
        if &signature != b"GIF" {
            warn!("unexpected signature: {:?}", signature);
        }
        let mut version = [0; 3];
        parser.read_buf(&mut version)?;
        let screen_origin = Some(parser.position());
        let screen_width = parser.read_u16()?;
        let screen_height = parser.read_u16()?;
        let flags = parser.read_u8()?;
        let background_color_idx = parser.read_u8()?;
        let pixel_aspect_ratio = parser.read_u8()?;
        debug!("screen: {}x{} flags {:#04x}", screen_width, screen_height,
            flags);
        let global_color_table = if flags & Self::COLOR_TABLE_PRESENT != 0 {
            let size_exp = flags & Self::COLOR_TABLE_SIZE;
            Some(ColorTable::parse(size_exp, &mut parser)?)
        } else {
            None
        };
        let mut blocks = vec![];
        let mut trailer = false;
        while let Some(marker) = parser.read_marker()? {
            match Block::parse(marker, &mut parser)? {
                Some(block) => blocks.push(block),
                None => {
                    if BlockCode::from_u8(marker) == Some(BlockCode::Trailer_) {
                        trailer = true;
                    } else {
                        warn!(
                            "unknown block marker {:#04x} @ {}; ignoring rest",
                            marker,
                            parser.position() - 1
                        );
                    }
                    break;
                }
            }
        }
        if !trailer {
            warn!("no trailer after {} blocks", blocks.len());
        }
        drop(parser);
        Ok(GifFile {
            stream,
            access,
            signature,
            version,
            screen_width,
            screen_height,
            flags,
            background_color_idx,
            pixel_aspect_ratio,
            screen_origin,
            global_color_table,
            blocks,
            trailer,
        })
    }
}

impl<S: Write + Seek> GifFile<S> {
    /// Write a logical screen descriptor field
    fn write_screen(&mut self, rel: u64, buf: &[u8]) -> Result<()> {
        self.access.check_writable()?;
        let origin = self.screen_origin.ok_or(Error::StaleOffset)?;
        write_at(&mut self.stream, origin + rel, buf)
    }
    pub fn set_screen_width(&mut self, width: u16) -> Result<()> {
        self.write_screen(Self::WIDTH, &width.to_le_bytes())?;
        self.screen_width = width;
        Ok(())
    }
    pub fn set_screen_height(&mut self, height: u16) -> Result<()> {
        self.write_screen(Self::HEIGHT, &height.to_le_bytes())?;
        self.screen_height = height;
        Ok(())
    }
    pub fn set_background_color_idx(&mut self, idx: u8) -> Result<()> {
        self.write_screen(Self::BACKGROUND, &[idx])?;
        self.background_color_idx = idx;
        Ok(())
    }
    pub fn set_pixel_aspect_ratio(&mut self, ratio: u8) -> Result<()> {
        self.write_screen(Self::ASPECT, &[ratio])?;
        self.pixel_aspect_ratio = ratio;
        Ok(())
    }
    /// Set one entry of the global color table
    pub fn set_global_color(&mut self, idx: usize, rgb: Rgb) -> Result<()> {
        self.access.check_writable()?;
        match &mut self.global_color_table {
            Some(tbl) => tbl.set_color(&mut self.stream, idx, rgb),
            None => Err(Error::MissingColorTable),
        }
    }
    /// Set the label of the `n`th extension
    pub fn set_extension_label(&mut self, n: usize, label: u8) -> Result<()> {
        self.access.check_writable()?;
        extension_mut(&mut self.blocks, n)?.set_label(&mut self.stream, label)
    }
    /// Patch payload bytes of the `n`th extension.
    ///
    /// See [Extension::write](block/struct.Extension.html#method.write).
    pub fn write_extension(
        &mut self,
        n: usize,
        pos: usize,
        len: usize,
        data: &[u8],
    ) -> Result<usize> {
        self.access.check_writable()?;
        extension_mut(&mut self.blocks, n)?
            .write(&mut self.stream, pos, len, data)
    }
    pub fn set_image_left(&mut self, n: usize, left: u16) -> Result<()> {
        self.access.check_writable()?;
        image_mut(&mut self.blocks, n)?.set_left(&mut self.stream, left)
    }
    pub fn set_image_top(&mut self, n: usize, top: u16) -> Result<()> {
        self.access.check_writable()?;
        image_mut(&mut self.blocks, n)?.set_top(&mut self.stream, top)
    }
    pub fn set_image_width(&mut self, n: usize, width: u16) -> Result<()> {
        self.access.check_writable()?;
        image_mut(&mut self.blocks, n)?.set_width(&mut self.stream, width)
    }
    pub fn set_image_height(&mut self, n: usize, height: u16) -> Result<()> {
        self.access.check_writable()?;
        image_mut(&mut self.blocks, n)?.set_height(&mut self.stream, height)
    }
    /// Set one entry of the local color table of the `n`th image
    pub fn set_local_color(
        &mut self,
        n: usize,
        idx: usize,
        rgb: Rgb,
    ) -> Result<()> {
        self.access.check_writable()?;
        image_mut(&mut self.blocks, n)?
            .set_local_color(&mut self.stream, idx, rgb)
    }
    /// Flush and close the backing stream
    pub fn close(mut self) -> Result<()> {
        self.stream.flush()?;
        Ok(())
    }
}

impl<S: Storage> GifFile<S> {
    /// Truncate the backing stream and rewrite it from in-memory state.
    ///
    /// Afterwards, every recorded offset is stale: field setters fail with
    /// `StaleOffset` until the document is parsed again.
    pub fn recompile(&mut self) -> Result<()> {
        self.access.check_writable()?;
        let mut buf = vec![];
        self.rebuild(&mut buf)?;
        self.stream.seek(SeekFrom::Start(0))?;
        self.stream.truncate()?;
        self.stream.write_all(&buf)?;
        self.stream.flush()?;
        self.invalidate();
        info!("recompiled: {} blocks, {} bytes", self.blocks.len(), buf.len());
        Ok(())
    }
}
