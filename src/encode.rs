// encode.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! Rebuilding blocks from in-memory state
use crate::block::*;
use std::io::{self, Write};

impl ColorTable {
    /// Write all entries
    pub fn rebuild<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(self.colors())
    }
}

impl Extension {
    /// Write label, sub-block and terminator (without the introducer)
    pub fn rebuild<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let data = self.data();
        assert!(data.len() < 256);
        w.write_all(&[self.label(), data.len() as u8])?;
        w.write_all(data)?;
        w.write_all(&[0]) // block size
    }
}

impl ImageData {
    /// Write minimum code size and sub-block chain
    pub fn rebuild<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&[self.min_code_size()])?;
        for b in self.sub_blocks() {
            let data = b.data();
            assert!(data.len() < 256);
            w.write_all(&[data.len() as u8])?; // block size
            w.write_all(data)?;
        }
        w.write_all(&[0]) // block size
    }
}

impl Image {
    /// Write descriptor, local color table and image data (without the
    /// separator)
    pub fn rebuild<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let mut buf = Vec::with_capacity(9);
        buf.extend_from_slice(&self.left().to_le_bytes());
        buf.extend_from_slice(&self.top().to_le_bytes());
        buf.extend_from_slice(&self.width().to_le_bytes());
        buf.extend_from_slice(&self.height().to_le_bytes());
        buf.push(self.packed());
        w.write_all(&buf)?;
        if let Some(tbl) = self.local_color_table() {
            tbl.rebuild(w)?;
        }
        self.image_data().rebuild(w)
    }
}

impl Block {
    /// Write marker and block
    pub fn rebuild<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(self.code().signature())?;
        match self {
            Block::Extension(b) => b.rebuild(w),
            Block::Image(b) => b.rebuild(w),
        }
    }
}

/// Writer which counts bytes written
pub(crate) struct CountingWriter<W: Write> {
    writer: W,
    count: u64,
}

impl<W: Write> CountingWriter<W> {
    pub fn new(writer: W, count: u64) -> Self {
        CountingWriter { writer, count }
    }
    /// Get absolute offset of the next byte
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.writer.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }
    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::decode::Parser;
    use std::error::Error;

    #[test]
    fn extension() -> Result<(), Box<dyn Error>> {
        let e = Extension::new(0xFE, b"hi");
        let mut v = vec![];
        e.rebuild(&mut v)?;
        assert_eq!(v, [0xFE, 0x02, b'h', b'i', 0x00]);
        let mut v = vec![];
        Block::from(e).rebuild(&mut v)?;
        assert_eq!(v, [0x21, 0xFE, 0x02, b'h', b'i', 0x00]);
        Ok(())
    }

    #[test]
    fn image() -> Result<(), Box<dyn Error>> {
        let buf = [
            0x00, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x0A, 0x00, 0x41, 0x02,
            0x03, 0x0C, 0x10, 0x05, 0x00,
        ];
        let mut p = Parser::new(&buf[..], 0, Access::ReadOnly);
        let img = Image::parse(&mut p)?;
        assert!(img.interlaced());
        assert!(img.local_color_table().is_none());
        let mut v = vec![];
        img.rebuild(&mut v)?;
        assert_eq!(&v[..], &buf[..]);
        Ok(())
    }

    #[test]
    fn counting() -> Result<(), Box<dyn Error>> {
        let mut v = vec![];
        let mut w = CountingWriter::new(&mut v, 4);
        ImageData::default().rebuild(&mut w)?;
        assert_eq!(w.count(), 6);
        assert_eq!(v, [0, 0]);
        Ok(())
    }
}
