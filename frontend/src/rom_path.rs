//! ROM path resolution: a raw dump file or a ZIP archive containing one.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use toumapet_system::rom::MAX_ROM_SIZE;

/// Load the dump bytes at `path`. A `.zip` archive is searched for the
/// first `.bin` entry, falling back to the first file.
pub fn load_rom_bytes(path: &Path) -> Result<Vec<u8>, std::io::Error> {
    if path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
    {
        return load_from_zip(path);
    }

    let meta = std::fs::metadata(path)?;
    if meta.len() > MAX_ROM_SIZE as u64 {
        return Err(too_large(meta.len()));
    }
    std::fs::read(path)
}

fn load_from_zip(path: &Path) -> Result<Vec<u8>, std::io::Error> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut archive = zip::ZipArchive::new(reader).map_err(invalid)?;

    let mut pick = None;
    for i in 0..archive.len() {
        let entry = archive.by_index(i).map_err(invalid)?;
        if entry.is_dir() {
            continue;
        }
        if entry.name().to_ascii_lowercase().ends_with(".bin") {
            pick = Some(i);
            break;
        }
        if pick.is_none() {
            pick = Some(i);
        }
    }
    let Some(index) = pick else {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "ZIP archive contains no files",
        ));
    };

    let mut entry = archive.by_index(index).map_err(invalid)?;
    if entry.size() > MAX_ROM_SIZE as u64 {
        return Err(too_large(entry.size()));
    }
    let mut data = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut data)?;
    Ok(data)
}

fn invalid(e: zip::result::ZipError) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, format!("invalid ZIP: {e}"))
}

fn too_large(len: u64) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("ROM is {len} bytes; largest supported dump is {MAX_ROM_SIZE}"),
    )
}
