// composite.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Composite export: an index of blocks followed by their rebuilt bytes.
//!
//! ```text
//! count: u32
//! count × { origin: u32, length: u32, kind: u8, index: u16 }
//! payloads
//! ```
//! All integers are little-endian.
use crate::block::{ColorTable, Extension, Image};
use crate::encode::CountingWriter;
use crate::error::Result;
use crate::private::GifFile;
use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

/// Encoded size of an index record
const RECORD_SZ: usize = 11;

/// Kind of a composite entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    GlobalColorTable,
    Extension,
    Image,
}

impl From<EntryKind> for u8 {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::GlobalColorTable => 0xCC,
            EntryKind::Extension => 0xEE,
            EntryKind::Image => 0x11,
        }
    }
}

/// Block referenced by a composite entry
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    ColorTable(&'a ColorTable),
    Extension(&'a Extension),
    Image(&'a Image),
}

impl Payload<'_> {
    pub fn kind(&self) -> EntryKind {
        match self {
            Payload::ColorTable(_) => EntryKind::GlobalColorTable,
            Payload::Extension(_) => EntryKind::Extension,
            Payload::Image(_) => EntryKind::Image,
        }
    }
    pub fn rebuild<W: Write>(&self, w: &mut W) -> io::Result<()> {
        match self {
            Payload::ColorTable(b) => b.rebuild(w),
            Payload::Extension(b) => b.rebuild(w),
            Payload::Image(b) => b.rebuild(w),
        }
    }
}

/// Index entry of a composite
#[derive(Debug)]
pub struct Entry<'a> {
    origin: u32,
    length: u32,
    index: u16,
    payload: Payload<'a>,
}

impl<'a> Entry<'a> {
    fn new(index: usize, payload: Payload<'a>) -> Result<Self> {
        let index = u16::try_from(index)?;
        Ok(Entry {
            origin: 0,
            length: 0,
            index,
            payload,
        })
    }
    /// Get offset of the payload (zero before creating)
    pub fn origin(&self) -> u32 {
        self.origin
    }
    /// Get length of the payload (zero before creating)
    pub fn length(&self) -> u32 {
        self.length
    }
    pub fn kind(&self) -> EntryKind {
        self.payload.kind()
    }
    /// Get position among entries of the same kind
    pub fn index(&self) -> u16 {
        self.index
    }
    pub fn payload(&self) -> Payload<'a> {
        self.payload
    }
    fn record(&self) -> [u8; RECORD_SZ] {
        let mut rec = [0; RECORD_SZ];
        rec[..4].copy_from_slice(&self.origin.to_le_bytes());
        rec[4..8].copy_from_slice(&self.length.to_le_bytes());
        rec[8] = self.kind().into();
        rec[9..].copy_from_slice(&self.index.to_le_bytes());
        rec
    }
}

/// Indexed, random-access export of a GIF document's blocks.
///
/// Entries are the global color table (if any), then every extension, then
/// every image, each in document order.
#[derive(Debug)]
pub struct Composite<'a> {
    entries: Vec<Entry<'a>>,
}

impl<'a> Composite<'a> {
    /// Reserved bytes for each index record, before backfilling
    const PLACEHOLDER: [u8; RECORD_SZ] =
        [0x00, 0x00, 0x00, 0x00, 0x33, 0x33, 0x33, 0x33, 0x11, 0x22, 0x22];

    /// Build the index of a parsed document
    pub fn from_gif<S>(gif: &'a GifFile<S>) -> Result<Self> {
        let mut entries = vec![];
        if let Some(tbl) = gif.global_color_table() {
            entries.push(Entry::new(0, Payload::ColorTable(tbl))?);
        }
        for (i, ext) in gif.extensions().enumerate() {
            entries.push(Entry::new(i, Payload::Extension(ext))?);
        }
        for (i, img) in gif.images().enumerate() {
            entries.push(Entry::new(i, Payload::Image(img))?);
        }
        Ok(Composite { entries })
    }
    pub fn entries(&self) -> &[Entry<'a>] {
        &self.entries
    }
    /// Create a composite file
    pub fn create<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        self.create_writer(&mut w)?;
        w.flush()?;
        Ok(())
    }
    /// Write a composite, starting at the current stream position.
    ///
    /// Origins are absolute stream offsets.
    pub fn create_writer<W: Write + Seek>(&mut self, w: &mut W) -> Result<()> {
        let start = w.stream_position()?;
        let count = u32::try_from(self.entries.len())?;
        w.write_all(&count.to_le_bytes())?;
        for _ in &self.entries {
            w.write_all(&Self::PLACEHOLDER)?;
        }
        let index_sz = (RECORD_SZ * self.entries.len()) as u64;
        let mut cw = CountingWriter::new(&mut *w, start + 4 + index_sz);
        for entry in self.entries.iter_mut() {
            let origin = cw.count();
            entry.payload.rebuild(&mut cw)?;
            entry.origin = u32::try_from(origin)?;
            entry.length = u32::try_from(cw.count() - origin)?;
        }
        let end = cw.count();
        w.seek(SeekFrom::Start(start + 4))?;
        for entry in &self.entries {
            w.write_all(&entry.record())?;
        }
        w.seek(SeekFrom::Start(end))?;
        info!("composite: {} entries, {} bytes", count, end - start);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::block::Access;
    use std::io::Cursor;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    const GIF: &[u8] = &[
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x0A, 0x00, 0x0A, 0x00, 0x91,
        0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0xFF,
        0x00, 0x00, 0x00, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x21, 0xFE, 0x02, b'h', b'i', 0x00, 0x2C, 0x00, 0x00, 0x00, 0x00,
        0x0A, 0x00, 0x0A, 0x00, 0x00, 0x02, 0x02, 0x8C, 0x2D, 0x00, 0x2C,
        0x01, 0x00, 0x01, 0x00, 0x02, 0x00, 0x02, 0x00, 0x80, 0x01, 0x02,
        0x03, 0x04, 0x05, 0x06, 0x02, 0x01, 0x44, 0x00, 0x3B,
    ];

    fn u32_at(buf: &[u8], i: usize) -> u32 {
        u32::from_le_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]])
    }

    #[test]
    fn index() -> TestResult {
        let gif = GifFile::parse(Cursor::new(GIF), Access::ReadOnly)?;
        let comp = Composite::from_gif(&gif)?;
        let kinds: Vec<_> = comp
            .entries()
            .iter()
            .map(|e| (e.kind(), e.index()))
            .collect();
        assert_eq!(kinds, [
            (EntryKind::GlobalColorTable, 0),
            (EntryKind::Extension, 0),
            (EntryKind::Extension, 1),
            (EntryKind::Image, 0),
            (EntryKind::Image, 1),
        ]);
        assert!(comp.entries().iter().all(|e| e.origin() == 0));
        Ok(())
    }

    #[test]
    fn create() -> TestResult {
        let gif = GifFile::parse(Cursor::new(GIF), Access::ReadOnly)?;
        let mut comp = Composite::from_gif(&gif)?;
        let mut out = Cursor::new(vec![]);
        comp.create_writer(&mut out)?;
        let buf = out.into_inner();
        assert_eq!(u32_at(&buf, 0), 5);
        let mut next = 4 + 5 * 11;
        for (n, entry) in comp.entries().iter().enumerate() {
            let rec = &buf[4 + n * 11..4 + (n + 1) * 11];
            let origin = u32_at(rec, 0) as usize;
            let length = u32_at(rec, 4) as usize;
            assert_eq!(origin, entry.origin() as usize);
            assert_eq!(length, entry.length() as usize);
            assert_eq!(rec[8], u8::from(entry.kind()));
            assert_eq!(u16::from_le_bytes([rec[9], rec[10]]), entry.index());
            assert_eq!(origin, next);
            let mut expected = vec![];
            entry.payload().rebuild(&mut expected)?;
            assert_eq!(&buf[origin..origin + length], &expected[..]);
            next = origin + length;
        }
        assert_eq!(next, buf.len());
        assert_eq!(&buf[4 + 11 * 3 + 8..4 + 11 * 4], &[0x11, 0x00, 0x00]);
        Ok(())
    }

    #[test]
    fn no_global_table() -> TestResult {
        let gif = [
            0x47, 0x49, 0x46, 0x38, 0x37, 0x61, 0x01, 0x00, 0x01, 0x00,
            0x00, 0x00, 0x00, 0x3B,
        ];
        let gif = GifFile::parse(Cursor::new(&gif[..]), Access::ReadOnly)?;
        let mut comp = Composite::from_gif(&gif)?;
        assert!(comp.entries().is_empty());
        let mut out = Cursor::new(vec![0xAB; 3]);
        out.set_position(3);
        comp.create_writer(&mut out)?;
        assert_eq!(out.into_inner(), [0xAB, 0xAB, 0xAB, 0, 0, 0, 0]);
        Ok(())
    }
}
