//! Region backing storage.
//!
//! This module owns the raw allocation behind each mapped region.
//! On Unix it uses anonymous `mmap`, so the 16 MiB external banks cost nothing until
//! touched; elsewhere it falls back to a zeroed heap allocation.

use crate::common::{SimError, SimResult};

/// Zero-initialized backing store for one mapped region.
#[derive(Debug)]
pub struct RegionBuffer {
    ptr: *mut u8,
    size: usize,
    is_mmap: bool,
}

// SAFETY: the buffer exclusively owns its allocation and never hands out the pointer.
unsafe impl Send for RegionBuffer {}
unsafe impl Sync for RegionBuffer {}

impl RegionBuffer {
    /// Allocates a zeroed buffer of `size` bytes.
    ///
    /// # Errors
    ///
    /// `AllocationFailed` when `size` is zero or the host refuses the mapping.
    pub fn new(size: usize) -> SimResult<Self> {
        if size == 0 {
            return Err(SimError::AllocationFailed { requested: 0 });
        }

        #[cfg(unix)]
        {
            // SAFETY: anonymous private mapping with no fixed address; the result is
            // checked against MAP_FAILED before use.
            let ptr = unsafe {
                libc::mmap(
                    std::ptr::null_mut(),
                    size,
                    libc::PROT_READ | libc::PROT_WRITE,
                    libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                    -1,
                    0,
                )
            };

            if ptr == libc::MAP_FAILED {
                return Err(SimError::AllocationFailed { requested: size });
            }

            Ok(Self {
                ptr: ptr.cast::<u8>(),
                size,
                is_mmap: true,
            })
        }

        #[cfg(not(unix))]
        {
            let mut vec = Vec::new();
            vec.try_reserve_exact(size)
                .map_err(|_| SimError::AllocationFailed { requested: size })?;
            vec.resize(size, 0u8);
            let mut boxed = vec.into_boxed_slice();
            let ptr = boxed.as_mut_ptr();
            std::mem::forget(boxed);
            Ok(Self {
                ptr,
                size,
                is_mmap: false,
            })
        }
    }
}

impl Drop for RegionBuffer {
    fn drop(&mut self) {
        if self.is_mmap {
            #[cfg(unix)]
            // SAFETY: `ptr`/`size` are exactly what mmap returned in `new`.
            unsafe {
                let _ = libc::munmap(self.ptr.cast::<libc::c_void>(), self.size);
            }
        } else {
            #[cfg(not(unix))]
            // SAFETY: reconstructs the boxed slice leaked in `new`.
            unsafe {
                drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    self.ptr, self.size,
                )));
            }
        }
    }
}
