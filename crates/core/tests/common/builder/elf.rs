//! Minimal ELF header builder.
//!
//! Produces header-only images (no sections, no segments), which is all program
//! analysis looks at.

use std::fs;
use std::path::{Path, PathBuf};

use esim_core::common::constants::EM_EPIPHANY;

pub struct ElfBuilder {
    class64: bool,
    big_endian: bool,
    machine: u16,
    entry: u64,
}

impl Default for ElfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ElfBuilder {
    pub fn new() -> Self {
        Self {
            class64: false,
            big_endian: false,
            machine: EM_EPIPHANY,
            entry: 0,
        }
    }

    pub fn machine(mut self, machine: u16) -> Self {
        self.machine = machine;
        self
    }

    pub fn entry(mut self, entry: u64) -> Self {
        self.entry = entry;
        self
    }

    pub fn elf64(mut self) -> Self {
        self.class64 = true;
        self
    }

    pub fn big_endian(mut self) -> Self {
        self.big_endian = true;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![
            0x7f,
            b'E',
            b'L',
            b'F',
            if self.class64 { 2 } else { 1 },
            if self.big_endian { 2 } else { 1 },
            1,
            0,
        ];
        out.resize(16, 0);

        let be = self.big_endian;
        let u16b = |v: u16| if be { v.to_be_bytes() } else { v.to_le_bytes() };
        let u32b = |v: u32| if be { v.to_be_bytes() } else { v.to_le_bytes() };
        let u64b = |v: u64| if be { v.to_be_bytes() } else { v.to_le_bytes() };

        out.extend_from_slice(&u16b(2)); // ET_EXEC
        out.extend_from_slice(&u16b(self.machine));
        out.extend_from_slice(&u32b(1));
        if self.class64 {
            out.extend_from_slice(&u64b(self.entry));
            out.extend_from_slice(&u64b(0)); // e_phoff
            out.extend_from_slice(&u64b(0)); // e_shoff
        } else {
            out.extend_from_slice(&u32b(self.entry as u32));
            out.extend_from_slice(&u32b(0));
            out.extend_from_slice(&u32b(0));
        }
        out.extend_from_slice(&u32b(0)); // e_flags
        let (ehsize, phentsize, shentsize) = if self.class64 { (64, 56, 64) } else { (52, 32, 40) };
        out.extend_from_slice(&u16b(ehsize));
        out.extend_from_slice(&u16b(phentsize));
        out.extend_from_slice(&u16b(0));
        out.extend_from_slice(&u16b(shentsize));
        out.extend_from_slice(&u16b(0));
        out.extend_from_slice(&u16b(0));
        out
    }

    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, self.build()).unwrap();
        path
    }
}
