//! Archive extraction (zip and 7z).
//!
//! Extraction is best effort per entry: directories and encrypted entries
//! are skipped, entries that fail to write are skipped, and existing files
//! are overwritten. Only an archive that cannot be opened at all is a
//! failure.

use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component as PathComponent, Path, PathBuf};

const ZIP_MAGIC: &[u8] = b"PK";
const SEVEN_ZIP_MAGIC: &[u8] = &[b'7', b'z', 0xBC, 0xAF, 0x27, 0x1C];

/// Archive formats we can unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    SevenZip,
}

/// Identify the format from the file's leading bytes, then its extension.
pub fn detect_format(path: &Path) -> Option<ArchiveFormat> {
    let mut header = [0u8; 6];
    let read = File::open(path)
        .and_then(|mut f| read_prefix(&mut f, &mut header))
        .unwrap_or(0);
    let header = &header[..read];

    if header.starts_with(SEVEN_ZIP_MAGIC) {
        return Some(ArchiveFormat::SevenZip);
    }
    if header.starts_with(ZIP_MAGIC) {
        return Some(ArchiveFormat::Zip);
    }

    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("zip") => Some(ArchiveFormat::Zip),
        Some("7z") => Some(ArchiveFormat::SevenZip),
        _ => None,
    }
}

fn read_prefix(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// Unpack `archive` into `destination`, creating it if needed.
pub fn extract_archive(archive: &Path, destination: &Path) -> Result<()> {
    let format = detect_format(archive)
        .with_context(|| format!("Unrecognized archive format: {}", archive.display()))?;
    fs::create_dir_all(destination)
        .with_context(|| format!("Failed to create {}", destination.display()))?;

    match format {
        ArchiveFormat::Zip => extract_zip(archive, destination),
        ArchiveFormat::SevenZip => extract_seven_zip(archive, destination),
    }
}

fn extract_zip(archive: &Path, destination: &Path) -> Result<()> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)
        .with_context(|| format!("Failed to open zip {}", archive.display()))?;

    for i in 0..zip.len() {
        // Raw access reads metadata without tripping over encryption.
        let (relative, skip) = match zip.by_index_raw(i) {
            Ok(entry) => (
                entry.enclosed_name(),
                entry.is_dir() || entry.encrypted(),
            ),
            Err(_) => continue,
        };
        let Some(relative) = relative else { continue };
        if skip {
            continue;
        }

        let Ok(mut entry) = zip.by_index(i) else { continue };
        let target = destination.join(relative);
        let _ = write_entry(&mut entry, &target);
    }

    Ok(())
}

fn extract_seven_zip(archive: &Path, destination: &Path) -> Result<()> {
    let result = sevenz_rust2::decompress_file_with_extract_fn(
        archive,
        destination,
        |entry, reader, _default_target| {
            if entry.is_directory() || !entry.has_stream() {
                return Ok(true);
            }
            if let Some(target) = safe_join(destination, entry.name()) {
                let _ = write_entry(reader, &target);
            }
            Ok(true)
        },
    );
    match result {
        Ok(()) => Ok(()),
        Err(e) => bail!("Failed to extract 7z {}: {}", archive.display(), e),
    }
}

/// Join an archive entry name onto `root`, refusing anything that escapes.
pub fn safe_join(root: &Path, entry_name: &str) -> Option<PathBuf> {
    let normalized = entry_name.replace('\\', "/");
    let mut path = root.to_path_buf();
    let mut depth = 0usize;

    for part in Path::new(&normalized).components() {
        match part {
            PathComponent::Normal(segment) => {
                path.push(segment);
                depth += 1;
            }
            PathComponent::CurDir => {}
            PathComponent::ParentDir | PathComponent::RootDir | PathComponent::Prefix(_) => {
                return None;
            }
        }
    }

    (depth > 0).then_some(path)
}

fn write_entry(reader: &mut dyn Read, target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = File::create(target)?;
    io::copy(reader, &mut out)?;
    Ok(())
}
