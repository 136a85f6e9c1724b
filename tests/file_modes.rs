use gifpatch::{Access, Composite, Error, GifFile};
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

type TestResult = Result<(), Box<dyn std::error::Error>>;

/// 2x2 GIF with a 2-color global table, a comment and one image
const GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x02, 0x00, 0x80, 0x01,
    0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xFE, 0x05, b'h', b'e',
    b'l', b'l', b'o', 0x00, 0x2C, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x02,
    0x00, 0x00, 0x02, 0x03, 0x0C, 0x10, 0x05, 0x00, 0x3B,
];

fn temp_gif() -> Result<NamedTempFile, Box<dyn std::error::Error>> {
    let mut file = NamedTempFile::new()?;
    file.write_all(GIF)?;
    file.flush()?;
    Ok(file)
}

#[test]
fn read_only_file() -> TestResult {
    let file = temp_gif()?;
    let mut gif = GifFile::read_path(file.path())?;
    assert_eq!(gif.access(), Access::ReadOnly);
    assert_eq!(gif.extensions().next().unwrap().data(), b"hello");
    assert!(matches!(gif.set_screen_width(4), Err(Error::WriteProtected)));
    assert!(matches!(
        gif.write_extension(0, 0, 1, b"j"),
        Err(Error::WriteProtected)
    ));
    assert!(matches!(gif.recompile(), Err(Error::WriteProtected)));
    gif.close()?;
    assert_eq!(fs::read(file.path())?, GIF);
    Ok(())
}

#[test]
fn patch_file() -> TestResult {
    let file = temp_gif()?;
    let mut gif = GifFile::open(file.path())?;
    gif.set_screen_height(0x0102)?;
    gif.set_global_color(0, [0x10, 0x20, 0x30])?;
    assert_eq!(gif.write_extension(0, 0, 9, b"jelly")?, 5);
    gif.set_image_top(0, 1)?;
    gif.close()?;
    let buf = fs::read(file.path())?;
    assert_eq!(buf.len(), GIF.len());
    assert_eq!(&buf[8..10], &[0x02, 0x01]);
    assert_eq!(&buf[13..16], &[0x10, 0x20, 0x30]);
    assert_eq!(&buf[22..27], b"jelly");
    let gif = GifFile::read_path(file.path())?;
    assert_eq!(gif.screen_height(), 0x0102);
    assert_eq!(gif.images().next().unwrap().top(), 1);
    Ok(())
}

#[test]
fn recompile_file() -> TestResult {
    let file = temp_gif()?;
    let mut extra = GIF.to_vec();
    extra.extend_from_slice(b"trailing garbage");
    fs::write(file.path(), &extra)?;
    let mut gif = GifFile::open(file.path())?;
    gif.recompile()?;
    assert!(matches!(gif.set_screen_width(9), Err(Error::StaleOffset)));
    gif.close()?;
    assert_eq!(fs::read(file.path())?, GIF);
    Ok(())
}

#[test]
fn export_file() -> TestResult {
    let file = temp_gif()?;
    let out = NamedTempFile::new()?;
    let gif = GifFile::read_path(file.path())?;
    let mut comp = Composite::from_gif(&gif)?;
    comp.create(out.path())?;
    let buf = fs::read(out.path())?;
    assert_eq!(&buf[..4], &[3, 0, 0, 0]);
    let last = comp.entries().last().unwrap();
    assert_eq!((last.origin() + last.length()) as usize, buf.len());
    assert_eq!(&buf[4 + 11 + 8..4 + 22], &[0xEE, 0x00, 0x00]);
    let ext = comp.entries()[1].origin() as usize;
    assert_eq!(&buf[ext..ext + 8], &[0xFE, 0x05, b'h', b'e', b'l', b'l',
        b'o', 0x00]);
    Ok(())
}
