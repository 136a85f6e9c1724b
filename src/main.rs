// main.rs      gifpatch command
//
// Copyright (c) 2019-2025  Douglas Lau
//
#![forbid(unsafe_code)]

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use gifpatch::block::{Block, ExtensionCode};
use gifpatch::{Composite, GifFile};
use std::error::Error;
use std::ffi::OsStr;
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Crate version
const VERSION: &str = std::env!("CARGO_PKG_VERSION");

/// Main entry point
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::builder().format_timestamp(None).init();
    let mut out = StandardStream::stdout(ColorChoice::Always);
    match create_app().get_matches().subcommand() {
        ("show", Some(matches)) => show(&mut out, matches)?,
        ("patch", Some(matches)) => patch(matches)?,
        ("recompile", Some(matches)) => recompile(matches)?,
        ("export", Some(matches)) => export(matches)?,
        _ => unreachable!(),
    }
    out.reset()?;
    Ok(())
}

/// Create clap App
fn create_app() -> App<'static, 'static> {
    App::new("gifpatch")
        .version(VERSION)
        .setting(AppSettings::GlobalVersion)
        .about("GIF in-place patching utility")
        .setting(AppSettings::ArgRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("show")
                .about("Show GIF block table")
                .arg(
                    Arg::with_name("files")
                        .required(true)
                        .min_values(1)
                        .help("input file(s)"),
                ),
        )
        .subcommand(
            SubCommand::with_name("patch")
                .about("Patch logical screen fields in place")
                .arg(Arg::with_name("file").required(true).help("GIF file"))
                .arg(value_arg("width", "canvas width"))
                .arg(value_arg("height", "canvas height"))
                .arg(value_arg("background", "background color index"))
                .arg(value_arg("aspect", "pixel aspect ratio")),
        )
        .subcommand(
            SubCommand::with_name("recompile")
                .about("Rewrite a GIF from its parsed blocks")
                .arg(Arg::with_name("file").required(true).help("GIF file")),
        )
        .subcommand(
            SubCommand::with_name("export")
                .about("Export GIF blocks to an indexed composite")
                .arg(Arg::with_name("file").required(true).help("GIF file"))
                .arg(
                    Arg::with_name("output")
                        .required(true)
                        .help("composite file"),
                ),
        )
}

/// Create an optional `--name VALUE` argument
fn value_arg(name: &'static str, help: &'static str) -> Arg<'static, 'static> {
    Arg::with_name(name)
        .long(name)
        .takes_value(true)
        .help(help)
}

/// Handle show subcommand
fn show(
    out: &mut StandardStream,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    if let Some(values) = matches.values_of_os("files") {
        for path in values {
            show_file(out, path)?;
        }
    }
    Ok(())
}

/// Show one GIF file
fn show_file(
    out: &mut StandardStream,
    path: &OsStr,
) -> Result<(), Box<dyn Error>> {
    let mut magenta = ColorSpec::new();
    magenta.set_fg(Some(Color::Magenta));
    let mut yellow = ColorSpec::new();
    yellow.set_fg(Some(Color::Yellow)).set_intense(true);
    let mut cyan = ColorSpec::new();
    cyan.set_fg(Some(Color::Cyan)).set_intense(true);
    let mut bold = ColorSpec::new();
    bold.set_fg(Some(Color::White))
        .set_intense(true)
        .set_bold(true);
    let mut dflt = ColorSpec::new();
    dflt.set_fg(Some(Color::White));
    let gif = GifFile::read_path(path)?;
    out.set_color(&magenta)?;
    writeln!(out, "{:?}", path)?;
    out.set_color(&bold)?;
    write!(
        out,
        "{}{}, {}x{}",
        String::from_utf8_lossy(&gif.signature()),
        String::from_utf8_lossy(&gif.version()),
        gif.screen_width(),
        gif.screen_height()
    )?;
    write!(out, ", bg: {}", gif.background_color_idx())?;
    if let Some(tbl) = gif.global_color_table() {
        write!(out, ", colors: {}", tbl.len())?;
    }
    writeln!(out)?;
    out.set_color(&yellow)?;
    writeln!(out, " Blk#   Offset Kind  Details")?;
    for (n, block) in gif.blocks().iter().enumerate() {
        out.set_color(&bold)?;
        write!(out, " {:>4}", n)?;
        out.set_color(&dflt)?;
        match block {
            Block::Extension(ext) => {
                write!(out, " {:>8}", offset(ext.origin()))?;
                out.set_color(&cyan)?;
                write!(out, " ext  ")?;
                out.set_color(&dflt)?;
                writeln!(
                    out,
                    "{} ({} bytes)",
                    ext_name(ext.code()),
                    ext.data().len()
                )?;
            }
            Block::Image(img) => {
                write!(out, " {:>8}", offset(img.origin()))?;
                out.set_color(&cyan)?;
                write!(out, " image")?;
                out.set_color(&dflt)?;
                write!(
                    out,
                    " {}x{} at {},{}",
                    img.width(),
                    img.height(),
                    img.left(),
                    img.top()
                )?;
                if let Some(tbl) = img.local_color_table() {
                    write!(out, ", colors: {}", tbl.len())?;
                }
                if img.interlaced() {
                    write!(out, ", interlaced")?;
                }
                writeln!(
                    out,
                    ", lzw: {} bytes",
                    img.image_data().data_len()
                )?;
            }
        }
    }
    if !gif.has_trailer() {
        out.set_color(&yellow)?;
        writeln!(out, " (no trailer)")?;
    }
    Ok(())
}

/// Format a recorded offset
fn offset(origin: Option<u64>) -> String {
    match origin {
        Some(o) => format!("{:#x}", o),
        None => "-".to_string(),
    }
}

/// Get a short extension name
fn ext_name(code: ExtensionCode) -> String {
    match code {
        ExtensionCode::PlainText => "plain text".to_string(),
        ExtensionCode::GraphicControl => "graphic control".to_string(),
        ExtensionCode::Comment => "comment".to_string(),
        ExtensionCode::Application => "application".to_string(),
        ExtensionCode::Unknown(n) => format!("unknown {:#04x}", n),
    }
}

/// Handle patch subcommand
fn patch(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let path = matches.value_of_os("file").ok_or("missing file")?;
    let mut gif = GifFile::open(path)?;
    if let Some(v) = matches.value_of("width") {
        gif.set_screen_width(v.parse()?)?;
    }
    if let Some(v) = matches.value_of("height") {
        gif.set_screen_height(v.parse()?)?;
    }
    if let Some(v) = matches.value_of("background") {
        gif.set_background_color_idx(v.parse()?)?;
    }
    if let Some(v) = matches.value_of("aspect") {
        gif.set_pixel_aspect_ratio(v.parse()?)?;
    }
    gif.close()?;
    Ok(())
}

/// Handle recompile subcommand
fn recompile(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let path = matches.value_of_os("file").ok_or("missing file")?;
    let mut gif = GifFile::open(path)?;
    gif.recompile()?;
    gif.close()?;
    Ok(())
}

/// Handle export subcommand
fn export(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let path = matches.value_of_os("file").ok_or("missing file")?;
    let output = matches.value_of_os("output").ok_or("missing output")?;
    let gif = GifFile::read_path(path)?;
    Composite::from_gif(&gif)?.create(output)?;
    Ok(())
}
