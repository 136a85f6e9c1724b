// patch.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! In-place (write-through) field updates.
//!
//! Each setter overwrites exactly the bytes of one field at its recorded
//! stream offset, then updates the in-memory value.
use crate::block::*;
use crate::error::{Error, Result};
use std::io::{Seek, SeekFrom, Write};

/// Overwrite bytes at an absolute stream offset
pub(crate) fn write_at<W: Write + Seek>(
    w: &mut W,
    pos: u64,
    buf: &[u8],
) -> Result<()> {
    w.seek(SeekFrom::Start(pos))?;
    w.write_all(buf)?;
    Ok(())
}

impl ColorTable {
    /// Set one color, writing it through to the stream
    pub fn set_color<W: Write + Seek>(
        &mut self,
        w: &mut W,
        idx: usize,
        rgb: Rgb,
    ) -> Result<()> {
        self.access.check_writable()?;
        if idx >= self.len() {
            return Err(Error::OutOfRange);
        }
        let origin = self.origin.ok_or(Error::StaleOffset)?;
        let i = idx * CHANNELS;
        write_at(w, origin + i as u64, &rgb)?;
        self.colors[i..i + CHANNELS].copy_from_slice(&rgb);
        Ok(())
    }
    pub(crate) fn invalidate(&mut self) {
        self.origin = None;
    }
}

impl Extension {
    /// Offset of payload from label
    const PAYLOAD: u64 = 2;

    /// Set the label, writing it through to the stream
    pub fn set_label<W: Write + Seek>(
        &mut self,
        w: &mut W,
        label: u8,
    ) -> Result<()> {
        self.access.check_writable()?;
        let origin = self.origin.ok_or(Error::StaleOffset)?;
        write_at(w, origin, &[label])?;
        self.label = label;
        Ok(())
    }
    /// Patch existing payload bytes, writing them through to the stream.
    ///
    /// Bytes in `pos..pos + len` are copied from the same positions of
    /// `data`.  Positions past the end of the payload (or of `data`) are
    /// skipped; the payload never grows.
    ///
    /// Returns the number of bytes patched.
    pub fn write<W: Write + Seek>(
        &mut self,
        w: &mut W,
        pos: usize,
        len: usize,
        data: &[u8],
    ) -> Result<usize> {
        self.access.check_writable()?;
        let origin = self.origin.ok_or(Error::StaleOffset)?;
        let end = pos
            .saturating_add(len)
            .min(self.data.len())
            .min(data.len());
        if pos >= end {
            return Ok(0);
        }
        let patch = &data[pos..end];
        write_at(w, origin + Self::PAYLOAD + pos as u64, patch)?;
        self.data[pos..end].copy_from_slice(patch);
        Ok(end - pos)
    }
    pub(crate) fn invalidate(&mut self) {
        self.origin = None;
    }
}

impl Image {
    /// Write a 16-bit descriptor field at a relative offset
    fn write_field<W: Write + Seek>(
        &self,
        w: &mut W,
        rel: u64,
        value: u16,
    ) -> Result<()> {
        self.access.check_writable()?;
        let origin = self.origin.ok_or(Error::StaleOffset)?;
        write_at(w, origin + rel, &value.to_le_bytes())
    }
    pub fn set_left<W: Write + Seek>(
        &mut self,
        w: &mut W,
        left: u16,
    ) -> Result<()> {
        self.write_field(w, Self::LEFT, left)?;
        self.left = left;
        Ok(())
    }
    pub fn set_top<W: Write + Seek>(
        &mut self,
        w: &mut W,
        top: u16,
    ) -> Result<()> {
        self.write_field(w, Self::TOP, top)?;
        self.top = top;
        Ok(())
    }
    pub fn set_width<W: Write + Seek>(
        &mut self,
        w: &mut W,
        width: u16,
    ) -> Result<()> {
        self.write_field(w, Self::WIDTH, width)?;
        self.width = width;
        Ok(())
    }
    pub fn set_height<W: Write + Seek>(
        &mut self,
        w: &mut W,
        height: u16,
    ) -> Result<()> {
        self.write_field(w, Self::HEIGHT, height)?;
        self.height = height;
        Ok(())
    }
    /// Set one local color, writing it through to the stream
    pub fn set_local_color<W: Write + Seek>(
        &mut self,
        w: &mut W,
        idx: usize,
        rgb: Rgb,
    ) -> Result<()> {
        self.access.check_writable()?;
        match &mut self.local_color_table {
            Some(tbl) => tbl.set_color(w, idx, rgb),
            None => Err(Error::MissingColorTable),
        }
    }
    pub(crate) fn invalidate(&mut self) {
        self.origin = None;
        self.image_data.origin = None;
        if let Some(tbl) = &mut self.local_color_table {
            tbl.invalidate();
        }
    }
}

impl Block {
    pub(crate) fn invalidate(&mut self) {
        match self {
            Block::Extension(b) => b.invalidate(),
            Block::Image(b) => b.invalidate(),
        }
    }
}
