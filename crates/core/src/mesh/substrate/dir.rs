//! Shared-directory substrate.
//!
//! Sibling processes point at one directory. Each identifier has a lock file claimed with
//! a non-blocking exclusive `flock`, so the kernel arbitrates reservations and releases
//! them if a holder dies. Readiness is a marker file per identifier.
//!
//! Attached handles hold a shared `flock` on the `topology` file for as long as they live.
//! An attacher that can take that lock exclusively is alone, so it starts a new session:
//! it clears old markers and records its own geometry. Later attachers must match it.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Read, Write};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::common::{SimError, SimResult};

use super::{CoreId, MeshSubstrate, MeshTopology, OwnerId};

const TOPOLOGY_FILE: &str = "topology";
const ATTACH_FILE: &str = "attach.lock";
const MARKER_EXT: &str = "ready";

#[derive(Debug)]
struct Claim {
    owner: OwnerId,
    // Holds the flock; closing the descriptor releases it.
    _lock: File,
}

#[derive(Debug)]
struct Session {
    signature: String,
    // Shared flock on the topology file.
    _lock: File,
}

/// Reservation table backed by lock files in a shared directory.
#[derive(Debug)]
pub struct DirSubstrate {
    root: PathBuf,
    session: Mutex<Option<Session>>,
    held: Mutex<HashMap<CoreId, Claim>>,
}

impl DirSubstrate {
    /// Uses `root` as the shared directory. Nothing is touched until `attach`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            session: Mutex::new(None),
            held: Mutex::new(HashMap::new()),
        }
    }

    /// Shared directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn held(&self) -> MutexGuard<'_, HashMap<CoreId, Claim>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_path(&self, coreid: CoreId) -> PathBuf {
        self.root.join(format!("core-{:03x}.lock", coreid.get()))
    }

    fn ready_path(&self, coreid: CoreId) -> PathBuf {
        self.root.join(format!("core-{:03x}.{MARKER_EXT}", coreid.get()))
    }

    /// Joins the session recorded in the directory, or starts one with `signature`.
    fn open_session(&self, signature: &str) -> io::Result<Session> {
        fs::create_dir_all(&self.root)?;

        // Held until return so nobody sees a session between its EX and SH locks.
        let guard = open_rw(&self.root.join(ATTACH_FILE))?;
        let _ = flock(&guard, libc::LOCK_EX)?;

        let mut file = open_rw(&self.root.join(TOPOLOGY_FILE))?;
        let recorded = if flock(&file, libc::LOCK_EX | libc::LOCK_NB)? {
            self.clear_markers()?;
            file.set_len(0)?;
            file.write_all(signature.as_bytes())?;
            info!(root = %self.root.display(), signature, "new substrate session");
            signature.to_owned()
        } else {
            let mut existing = String::new();
            let _ = file.read_to_string(&mut existing)?;
            existing.trim().to_owned()
        };
        let _ = flock(&file, libc::LOCK_SH)?;

        Ok(Session {
            signature: recorded,
            _lock: file,
        })
    }

    fn clear_markers(&self) -> io::Result<()> {
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == MARKER_EXT) {
                remove_marker(&path);
            }
        }
        Ok(())
    }
}

fn open_rw(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
}

/// Applies the `flock` operation `op`; `Ok(false)` if a non-blocking request would block.
fn flock(file: &File, op: libc::c_int) -> io::Result<bool> {
    // SAFETY: the descriptor is owned by `file` and stays open for the call.
    let rc = unsafe { libc::flock(file.as_raw_fd(), op) };
    if rc == 0 {
        return Ok(true);
    }
    let err = io::Error::last_os_error();
    if err.kind() == ErrorKind::WouldBlock {
        Ok(false)
    } else {
        Err(err)
    }
}

fn remove_marker(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "could not remove readiness marker"),
    }
}

impl MeshSubstrate for DirSubstrate {
    fn attach(&self, topology: &MeshTopology) -> SimResult<()> {
        let signature = topology.signature();
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        let recorded = match session.as_ref() {
            Some(current) => current.signature.clone(),
            None => {
                let joined = self.open_session(&signature).map_err(|e| {
                    SimError::TopologyInitFailed(format!("{}: {e}", self.root.display()))
                })?;
                let recorded = joined.signature.clone();
                // A rejected attacher must not keep the session pinned.
                if recorded == signature {
                    *session = Some(joined);
                }
                recorded
            }
        };

        if recorded != signature {
            return Err(SimError::TopologyInitFailed(format!(
                "{} in use with `{recorded}`",
                self.root.display()
            )));
        }
        debug!(root = %self.root.display(), "substrate attached");
        Ok(())
    }

    fn try_reserve(&self, coreid: CoreId, owner: OwnerId) -> SimResult<bool> {
        let mut held = self.held();
        if let Some(claim) = held.get(&coreid) {
            return Ok(claim.owner == owner);
        }

        let file = open_rw(&self.lock_path(coreid))?;
        if !flock(&file, libc::LOCK_EX | libc::LOCK_NB)? {
            return Ok(false);
        }

        // Readiness left by the previous holder is stale now that we own the lock.
        remove_marker(&self.ready_path(coreid));
        let _ = held.insert(coreid, Claim { owner, _lock: file });
        debug!(%coreid, %owner, "reserved");
        Ok(true)
    }

    fn holds(&self, coreid: CoreId, owner: OwnerId) -> bool {
        self.held()
            .get(&coreid)
            .is_some_and(|claim| claim.owner == owner)
    }

    fn release(&self, coreid: CoreId, owner: OwnerId) {
        let mut held = self.held();
        if held.get(&coreid).is_some_and(|claim| claim.owner == owner) {
            let _ = held.remove(&coreid);
            debug!(%coreid, %owner, "released");
        }
    }

    fn signal_ready(&self, coreid: CoreId, owner: OwnerId) -> SimResult<()> {
        if !self.holds(coreid, owner) {
            return Err(SimError::MissingIdentity {
                hint: "readiness requires a reserved coreid",
            });
        }
        fs::write(self.ready_path(coreid), owner.to_string())?;
        Ok(())
    }

    fn ready_count(&self, participants: &[CoreId]) -> usize {
        participants
            .iter()
            .filter(|id| self.ready_path(**id).exists())
            .count()
    }

    fn park(&self, timeout: Duration) {
        std::thread::sleep(timeout);
    }
}
