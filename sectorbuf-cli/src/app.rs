//! Command-line surface.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use log::debug;
use sectorbuf::embedded_io::{Seek, SeekFrom, Write};
use sectorbuf::{ByteStream, HeapFlashBuffer, SectorLayout, StorageGeometry};

use crate::image::ImageFlash;

#[derive(Parser)]
#[command(
    name = "sectorbuf",
    about = "Inspect and edit flash images through the write-back buffer"
)]
pub struct Cli {
    /// Flash image file.
    #[arg(long, global = true, default_value = "flash.img")]
    image: PathBuf,

    /// Region capacity in bytes.
    #[arg(long, global = true, default_value_t = 192 * 1024)]
    capacity: u32,

    /// Window (erase sector) size in bytes.
    #[arg(long, global = true, default_value_t = 16 * 1024)]
    window: u32,

    /// Transport block size in bytes.
    #[arg(long, global = true, default_value_t = 512)]
    block: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the configured geometry.
    Info,
    /// Hex-dump a byte range.
    Read { address: u32, len: u32 },
    /// Write hex-encoded bytes at an address.
    Write { address: u32, hex: String },
    /// Fill a byte range with a value.
    Fill { address: u32, len: u32, value: u8 },
}

pub fn run(cli: Cli) -> Result<()> {
    let geometry = StorageGeometry::new(cli.capacity, cli.window, cli.block)?;
    let layout = SectorLayout::Uniform {
        base: 0,
        erase_size: cli.window,
    };
    let flash = ImageFlash::open(&cli.image, cli.capacity as usize, layout, 0)?;
    debug!("opened {} ({} bytes)", cli.image.display(), cli.capacity);
    let mut buffer = HeapFlashBuffer::for_flash(flash, layout, 0, geometry);

    match cli.command {
        Command::Info => {
            let blocks = buffer.block_geometry();
            println!(
                "{} bytes in {} windows of {} bytes",
                geometry.capacity(),
                geometry.capacity() / geometry.window_size(),
                geometry.window_size()
            );
            println!("{} transport blocks of {} bytes", blocks.count, blocks.size);
            Ok(())
        }
        Command::Read { address, len } => {
            let mut data = vec![0u8; len as usize];
            buffer.read(address, &mut data)?;
            hexdump(address, &data);
            Ok(())
        }
        Command::Write { address, hex } => {
            let data = parse_hex(&hex)?;
            write_bytes(buffer, address, &data, &cli.image)
        }
        Command::Fill {
            address,
            len,
            value,
        } => {
            let data = vec![value; len as usize];
            write_bytes(buffer, address, &data, &cli.image)
        }
    }
}

/// Stream `data` into the buffer, flush, and persist the image.
fn write_bytes(
    buffer: HeapFlashBuffer<ImageFlash>,
    address: u32,
    data: &[u8],
    image: &std::path::Path,
) -> Result<()> {
    let mut stream = ByteStream::new(buffer);
    stream.seek(SeekFrom::Start(address as u64))?;
    stream.write_all(data)?;
    stream.flush()?;
    debug!("wrote {} bytes at {}", data.len(), address);

    stream.into_inner().into_store().into_inner().persist()?;
    println!("{} bytes written to {}", data.len(), image.display());
    Ok(())
}

fn parse_hex(hex: &str) -> Result<Vec<u8>> {
    let cleaned: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.len() % 2 != 0 {
        bail!("hex input must have an even number of digits");
    }
    let mut out = Vec::with_capacity(cleaned.len() / 2);
    for pair in cleaned.as_bytes().chunks(2) {
        let pair = std::str::from_utf8(pair)?;
        let byte = u8::from_str_radix(pair, 16)
            .map_err(|_| anyhow::anyhow!("bad hex byte {:?}", pair))?;
        out.push(byte);
    }
    Ok(out)
}

fn hexdump(base: u32, data: &[u8]) {
    for (i, row) in data.chunks(16).enumerate() {
        let offset = base as usize + i * 16;
        let bytes: Vec<String> = row.iter().map(|b| format!("{:02x}", b)).collect();
        let ascii: String = row
            .iter()
            .map(|&b| {
                if (0x20..0x7F).contains(&b) {
                    b as char
                } else {
                    '.'
                }
            })
            .collect();
        println!("{:08x}  {:<47}  |{}|", offset, bytes.join(" "), ascii);
    }
}
