//! Single-channel PFM rasters for height map inspection
//!
//! Rows are stored bottom to top, which matches grid row 0 lying at the
//! minimum y of the bounding box.

use crate::error::IoError;
use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use proxymesh_core::{grid_cell_count, HeightGrid, Result, MAX_GRID_CELLS};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

/// Encode `grid` as a little-endian grayscale PFM
pub fn write_pfm<W: Write>(grid: &HeightGrid, writer: &mut W) -> Result<()> {
    write!(writer, "Pf\n{} {}\n-1.0\n", grid.width(), grid.height())?;
    for &value in grid.data() {
        writer.write_f32::<LittleEndian>(value)?;
    }
    writer.flush()?;
    Ok(())
}

/// Save `grid` as a PFM file
pub fn save_pfm<P: AsRef<Path>>(grid: &HeightGrid, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_pfm(grid, &mut writer)?;
    debug!(
        "Saved {}x{} height map to {}",
        grid.width(),
        grid.height(),
        path.display()
    );
    Ok(())
}

fn header_line<R: BufRead>(reader: &mut R, what: &str) -> Result<String> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(IoError::parse("PFM header", format!("missing {}", what)).into());
    }
    Ok(line.trim().to_string())
}

/// Decode a grayscale PFM of either byte order
pub fn read_pfm<R: Read>(reader: R) -> Result<HeightGrid> {
    let mut reader = BufReader::new(reader);

    let magic = header_line(&mut reader, "magic")?;
    if magic != "Pf" {
        return Err(IoError::InvalidFormat {
            format: format!("expected grayscale PFM, found magic '{}'", magic),
        }
        .into());
    }

    let dims = header_line(&mut reader, "dimensions")?;
    let parsed: Vec<usize> = dims
        .split_whitespace()
        .map(str::parse)
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| IoError::parse("PFM dimensions", format!("{}", e)))?;
    let [width, height] = parsed[..] else {
        return Err(IoError::parse("PFM dimensions", format!("expected two values, got '{}'", dims)).into());
    };

    let scale_line = header_line(&mut reader, "scale")?;
    let scale: f32 = scale_line
        .parse()
        .map_err(|e| IoError::parse("PFM scale", format!("{}", e)))?;
    if scale == 0.0 || !scale.is_finite() {
        return Err(IoError::parse("PFM scale", format!("invalid scale {}", scale)).into());
    }

    let cells = grid_cell_count(width, height).ok_or_else(|| {
        IoError::parse(
            "PFM dimensions",
            format!("{}x{} exceeds the {} cell limit", width, height, MAX_GRID_CELLS),
        )
    })?;

    // Buffer what the stream actually holds before sizing the grid
    let expected = cells * 4;
    let mut payload = Vec::new();
    reader.take(expected as u64).read_to_end(&mut payload)?;
    if payload.len() != expected {
        return Err(IoError::parse(
            "PFM data",
            format!("expected {} bytes, found {}", expected, payload.len()),
        )
        .into());
    }

    let mut data = vec![0.0f32; cells];
    let mut payload = payload.as_slice();
    if scale < 0.0 {
        payload.read_f32_into::<LittleEndian>(&mut data)?;
    } else {
        payload.read_f32_into::<BigEndian>(&mut data)?;
    }

    HeightGrid::from_vec(width, height, data)
}

/// Load a PFM file into a height grid
pub fn load_pfm<P: AsRef<Path>>(path: P) -> Result<HeightGrid> {
    read_pfm(File::open(path)?)
}
