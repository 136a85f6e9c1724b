// cargo fuzz run parse corpus/parse -- -timeout=30

#![no_main]

use std::io::Cursor;
use libfuzzer_sys::fuzz_target;

use gifpatch::{Access, GifFile};

fuzz_target!(|data: &[u8]| {
    if let Ok(mut gif) = GifFile::parse(Cursor::new(data.to_vec()),
        Access::ReadWrite)
    {
        let _ = gif.set_screen_width(1);
        let _ = gif.write_extension(0, 0, 255, &[0xAA; 255]);
        let _ = gif.recompile();
    }
});
