// lib.rs      gifpatch crate.
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! A library for reading GIF files and patching them in place.
//!
//! A [GifFile] records the byte offset of every scalar field while parsing,
//! so that single fields (canvas size, background color, color table
//! entries, extension labels and payloads, image positions) can be
//! overwritten directly in the backing stream.  Whole documents can be
//! rebuilt with [GifFile::recompile], or flattened into an indexed archive
//! with [Composite].
//!
//! Image data is never decompressed; LZW sub-blocks are kept verbatim.
//!
//! [Composite]: struct.Composite.html
//! [GifFile]: struct.GifFile.html
//! [GifFile::recompile]: struct.GifFile.html#method.recompile
#![forbid(unsafe_code)]

#[macro_use]
extern crate log;

pub mod block;
mod composite;
mod decode;
mod encode;
mod error;
mod patch;
mod private;

pub use crate::block::Access;
pub use crate::composite::{Composite, Entry, EntryKind, Payload};
pub use crate::error::{Error, Result};
pub use crate::private::{GifFile, Storage};
