// decode.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! Offset-tracking parsing of GIF blocks
use crate::block::*;
use crate::error::{Error, Result};
use std::io::{BufReader, ErrorKind, Read};

/// Buffered reader which keeps track of the absolute stream offset.
pub(crate) struct Parser<R: Read> {
    reader: BufReader<R>,
    pos: u64,
    access: Access,
}

impl<R: Read> Parser<R> {
    /// Create a new parser, with the reader positioned at `pos`
    pub fn new(reader: R, pos: u64, access: Access) -> Self {
        Parser {
            reader: BufReader::new(reader),
            pos,
            access,
        }
    }
    /// Get absolute offset of the next byte
    pub fn position(&self) -> u64 {
        self.pos
    }
    pub fn access(&self) -> Access {
        self.access
    }
    /// Read exactly enough bytes to fill a buffer
    pub fn read_buf(&mut self, buf: &mut [u8]) -> Result<()> {
        self.reader.read_exact(buf)?;
        self.pos += buf.len() as u64;
        Ok(())
    }
    pub fn read_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0; len];
        self.read_buf(&mut buf)?;
        Ok(buf)
    }
    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0; 1];
        self.read_buf(&mut buf)?;
        Ok(buf[0])
    }
    pub fn read_u16(&mut self) -> Result<u16> {
        let mut buf = [0; 2];
        self.read_buf(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }
    /// Read a block marker, or `None` at end of file
    pub fn read_marker(&mut self) -> Result<Option<u8>> {
        let mut buf = [0; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.pos += 1;
                    return Ok(Some(buf[0]));
                }
                Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }
}

impl ColorTable {
    /// Parse a color table with 2^(size_exp+1) entries
    pub(crate) fn parse<R: Read>(
        size_exp: u8,
        parser: &mut Parser<R>,
    ) -> Result<Self> {
        let len = 2 << (size_exp & 0b111);
        let origin = Some(parser.position());
        let colors = parser.read_vec(len * CHANNELS)?;
        debug!("  color table: {} colors @ {:?}", len, origin);
        Ok(ColorTable {
            colors,
            origin,
            access: parser.access(),
        })
    }
}

impl Extension {
    /// Parse an extension (after the introducer)
    pub(crate) fn parse<R: Read>(parser: &mut Parser<R>) -> Result<Self> {
        let origin = Some(parser.position());
        let label = parser.read_u8()?;
        let len = parser.read_u8()?;
        let data = parser.read_vec(len.into())?;
        let terminator = parser.read_u8()?;
        if terminator != 0 {
            warn!(
                "extension {:#04x} @ {:?}: extra sub-block of {} bytes",
                label, origin, terminator
            );
        }
        debug!("  extension: {:#04x} {} bytes @ {:?}", label, len, origin);
        Ok(Extension {
            label,
            data,
            origin,
            access: parser.access(),
        })
    }
}

impl ImageData {
    /// Parse image data sub-blocks, up to the zero-length terminator
    pub(crate) fn parse<R: Read>(parser: &mut Parser<R>) -> Result<Self> {
        let origin = Some(parser.position());
        let min_code_size = parser.read_u8()?;
        let mut chain = vec![];
        loop {
            let origin = parser.position();
            let len = parser.read_u8()?;
            if len == 0 {
                break;
            }
            let data = parser.read_vec(len.into())?;
            chain.push(SubBlock { origin, data });
        }
        debug!("  image data: {} sub-blocks @ {:?}", chain.len(), origin);
        Ok(ImageData {
            min_code_size,
            chain,
            origin,
        })
    }
}

impl Image {
    /// Parse an image (after the separator)
    pub(crate) fn parse<R: Read>(parser: &mut Parser<R>) -> Result<Self> {
        let origin = Some(parser.position());
        let left = parser.read_u16()?;
        let top = parser.read_u16()?;
        let width = parser.read_u16()?;
        let height = parser.read_u16()?;
        let flags = parser.read_u8()?;
        debug!("  image: {}x{} at {},{} @ {:?}", width, height, left, top,
            origin);
        let local_color_table = if flags & Self::COLOR_TABLE_PRESENT != 0 {
            let size_exp = flags & Self::COLOR_TABLE_SIZE;
            Some(ColorTable::parse(size_exp, parser)?)
        } else {
            None
        };
        let image_data = ImageData::parse(parser)?;
        Ok(Image {
            left,
            top,
            width,
            height,
            flags,
            local_color_table,
            image_data,
            origin,
            access: parser.access(),
        })
    }
}

impl Block {
    /// Parse the block following a marker byte.
    ///
    /// Returns `None` for the trailer or an unknown marker.
    pub(crate) fn parse<R: Read>(
        marker: u8,
        parser: &mut Parser<R>,
    ) -> Result<Option<Self>> {
        match BlockCode::from_u8(marker) {
            Some(BlockCode::Extension_) => {
                Ok(Some(Extension::parse(parser)?.into()))
            }
            Some(BlockCode::ImageDesc_) => {
                Ok(Some(Image::parse(parser)?.into()))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parser(buf: &[u8]) -> Parser<&[u8]> {
        Parser::new(buf, 100, Access::ReadWrite)
    }

    #[test]
    fn color_table() -> Result<()> {
        let buf = [1, 2, 3, 4, 5, 6, 7];
        let mut p = parser(&buf);
        let t = ColorTable::parse(0, &mut p)?;
        assert_eq!(t.len(), 2);
        assert_eq!(t.origin(), Some(100));
        assert_eq!(t.get_color(1)?, [4, 5, 6]);
        assert_eq!(p.position(), 106);
        Ok(())
    }

    #[test]
    fn extension() -> Result<()> {
        let buf = [0xFE, 0x03, b'a', b'b', b'c', 0x00];
        let mut p = parser(&buf);
        let e = Extension::parse(&mut p)?;
        assert_eq!(e.label(), 0xFE);
        assert_eq!(e.data(), b"abc");
        assert_eq!(e.origin(), Some(100));
        assert_eq!(p.position(), 106);
        Ok(())
    }

    #[test]
    fn image_data() -> Result<()> {
        let buf = [0x02, 0x02, 0xAA, 0xBB, 0x01, 0xCC, 0x00, 0x3B];
        let mut p = parser(&buf);
        let d = ImageData::parse(&mut p)?;
        assert_eq!(d.min_code_size(), 2);
        assert_eq!(d.sub_blocks().len(), 2);
        assert_eq!(d.sub_blocks()[0].origin(), 101);
        assert_eq!(d.sub_blocks()[1].origin(), 104);
        assert_eq!(d.sub_blocks()[1].data(), &[0xCC]);
        assert_eq!(d.data_len(), 3);
        assert_eq!(p.read_marker()?, Some(0x3B));
        assert_eq!(p.read_marker()?, None);
        Ok(())
    }

    #[test]
    fn image_local_table() -> Result<()> {
        let buf = [
            0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x04, 0x00, 0x80, 0x00, 0x00,
            0x00, 0xFF, 0xFF, 0xFF, 0x02, 0x01, 0x44, 0x00,
        ];
        let mut p = parser(&buf);
        let img = Image::parse(&mut p)?;
        assert_eq!(img.left(), 1);
        assert_eq!(img.top(), 2);
        assert_eq!(img.width(), 3);
        assert_eq!(img.height(), 4);
        let tbl = img.local_color_table().unwrap();
        assert_eq!(tbl.len(), 2);
        assert_eq!(tbl.origin(), Some(109));
        assert_eq!(img.image_data().origin(), Some(115));
        Ok(())
    }

    #[test]
    fn truncated() {
        let buf = [0xFE, 0x05, b'a', b'b'];
        let mut p = parser(&buf);
        assert!(matches!(
            Extension::parse(&mut p),
            Err(Error::UnexpectedEndOfFile)
        ));
        let buf = [0x02, 0x02, 0xAA];
        let mut p = parser(&buf);
        assert!(matches!(
            ImageData::parse(&mut p),
            Err(Error::UnexpectedEndOfFile)
        ));
    }
}
