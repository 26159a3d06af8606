//! State Relocator.
//!
//! Replaces a core record with one of a new total size once the decode engine's
//! configuration has changed. The header survives; the extension does not.

use tracing::info;

use crate::common::{SimError, SimResult};

use super::registry::{CoreHandle, CoreRegistry};
use super::state::{CoreHeader, CoreState};

/// Reallocates the record behind `handle` to `new_total_size` bytes.
///
/// The fixed header is copied from the current record and the new extension starts
/// zeroed. The replacement is built before anything is touched, so on failure the
/// current record and every handle to it are left exactly as they were. On success the
/// previous record is dropped here, and only here.
///
/// # Errors
///
/// * `AllocationFailed` if `new_total_size` is smaller than the header or the host
///   cannot provide the extension.
/// * `StaleHandle` if `handle` no longer refers to a live record.
pub fn relocate(
    registry: &mut CoreRegistry,
    handle: CoreHandle,
    new_total_size: usize,
) -> SimResult<()> {
    let extension_bytes = new_total_size
        .checked_sub(CoreHeader::SIZE)
        .ok_or(SimError::AllocationFailed {
            requested: new_total_size,
        })?;
    let header = registry
        .get(handle)
        .ok_or(SimError::StaleHandle(handle.index()))?
        .header;

    let fresh = CoreState::with_header(header, extension_bytes)?;
    let previous = registry.install(handle, fresh)?;

    info!(
        core = handle.index(),
        from = previous.total_size(),
        to = new_total_size,
        "core state relocated"
    );
    drop(previous);
    Ok(())
}
