//! Program analysis.
//!
//! This module inspects the program named on the command line before the instance is
//! configured. It performs:
//! 1. **Reading:** Loads the file into memory, reporting unreadable paths as errors.
//! 2. **ELF analysis:** Extracts entry point and machine from 32-bit little-endian ELF images.
//! 3. **Raw fallback:** Anything that is not ELF is accepted as a raw image entered at 0.

use std::fs;
use std::path::{Path, PathBuf};

use object::read::elf::{ElfFile32, FileHeader};
use object::{Endianness, FileKind, Object};
use tracing::info;

use crate::common::{SimError, SimResult};

/// How the program image was recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// 32-bit little-endian ELF.
    Elf32,
    /// Anything else, loaded verbatim.
    Raw,
}

/// Result of analyzing a program image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramImage {
    /// Path the image was read from.
    pub path: PathBuf,
    /// Recognized format.
    pub format: ImageFormat,
    /// Execution start address.
    pub entry: u64,
    /// ELF machine number, if the image is ELF.
    pub machine: Option<u16>,
    /// File size in bytes.
    pub size: usize,
}

/// Reads a program file from disk.
///
/// # Errors
///
/// `ProgramAnalysis` if the file cannot be read.
pub fn load_binary(path: &Path) -> SimResult<Vec<u8>> {
    fs::read(path).map_err(|e| SimError::ProgramAnalysis(format!("{}: {e}", path.display())))
}

/// Reads and analyzes the program at `path`.
pub fn analyze(path: &Path) -> SimResult<ProgramImage> {
    let data = load_binary(path)?;
    let image = analyze_bytes(path, &data)?;
    info!(
        path = %image.path.display(),
        format = ?image.format,
        "program analyzed, entry {:#x}",
        image.entry
    );
    Ok(image)
}

/// Analyzes an in-memory image; `path` is recorded for diagnostics only.
///
/// # Errors
///
/// `ProgramAnalysis` for 64-bit or big-endian ELF images, or a malformed ELF header.
pub fn analyze_bytes(path: &Path, data: &[u8]) -> SimResult<ProgramImage> {
    let fail = |why: String| SimError::ProgramAnalysis(format!("{}: {why}", path.display()));

    match FileKind::parse(data) {
        Ok(FileKind::Elf32) => {
            let elf = ElfFile32::<Endianness>::parse(data).map_err(|e| fail(e.to_string()))?;
            if !elf.is_little_endian() {
                return Err(fail("big-endian images are not supported".into()));
            }
            let machine = elf.elf_header().e_machine(elf.endian());
            Ok(ProgramImage {
                path: path.to_path_buf(),
                format: ImageFormat::Elf32,
                entry: elf.entry(),
                machine: Some(machine),
                size: data.len(),
            })
        }
        Ok(FileKind::Elf64) => Err(fail("64-bit ELF images are not supported".into())),
        _ => Ok(ProgramImage {
            path: path.to_path_buf(),
            format: ImageFormat::Raw,
            entry: 0,
            machine: None,
            size: data.len(),
        }),
    }
}
