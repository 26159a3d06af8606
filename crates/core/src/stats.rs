//! Profiling hook.
//!
//! The decode engine reports Epiphany-specific events here. It provides:
//! 1. **Counters:** `MiscProfile`, currently the count of fill NOPs issued.
//! 2. **Hook:** `ProfileHook`, which targets the core through its handle so relocation
//!    never leaves it pointing at a dead record.
//! 3. **Report:** The "Miscellaneous Statistics" block with comma-grouped counts.

use std::fmt::Write;

use tracing::debug;

use crate::common::{SimError, SimResult};
use crate::core::{CoreHandle, CoreRegistry};

/// Width of the label column in reports.
pub const PROFILE_LABEL_WIDTH: usize = 32;

/// Epiphany-specific counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MiscProfile {
    /// NOPs inserted to fill dual-issue slots.
    pub fillnop_count: u64,
}

/// Profiling callback bound to one core.
#[derive(Debug, Clone)]
pub struct ProfileHook {
    target: CoreHandle,
    misc: MiscProfile,
}

impl ProfileHook {
    /// Binds a hook to `target` with zeroed counters.
    ///
    /// # Errors
    ///
    /// `StaleHandle` if `target` does not refer to a live record.
    pub fn install(target: CoreHandle, cores: &CoreRegistry) -> SimResult<Self> {
        if cores.get(target).is_none() {
            return Err(SimError::StaleHandle(target.index()));
        }
        debug!(core = target.index(), "profile hook installed");
        Ok(Self {
            target,
            misc: MiscProfile::default(),
        })
    }

    /// Core the hook reports for.
    pub const fn target(&self) -> CoreHandle {
        self.target
    }

    /// Current counters.
    pub const fn misc(&self) -> MiscProfile {
        self.misc
    }

    /// Counts one fill NOP.
    pub const fn record_fillnop(&mut self) {
        self.misc.fillnop_count += 1;
    }

    /// Renders the report, or `None` if the target record is gone.
    pub fn report(&self, cores: &CoreRegistry) -> Option<String> {
        cores.get(self.target)?;
        let mut out = String::from("Miscellaneous Statistics\n\n");
        let _ = writeln!(
            out,
            "  {:<width$} {}\n",
            "Fill nops:",
            add_commas(self.misc.fillnop_count),
            width = PROFILE_LABEL_WIDTH
        );
        Some(out)
    }
}

/// Formats `value` with a comma between each group of three digits.
///
/// ```
/// use esim_core::stats::add_commas;
///
/// assert_eq!(add_commas(0), "0");
/// assert_eq!(add_commas(1234567), "1,234,567");
/// ```
pub fn add_commas(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
