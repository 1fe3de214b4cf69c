//! Python interpreter resolution.
//!
//! The server process may run in a completely different environment
//! than the project being debugged, so the host's own notion of
//! "python" is deliberately ignored: an explicit caller-supplied path
//! always wins, then conventional virtual-environment locations are
//! probed, then the bare fallback command is handed to the OS search
//! path.

use std::path::Path;

/// Virtual-environment interpreter locations probed in order, relative
/// to the current working directory.
const VENV_CANDIDATES: &[&str] = &[
    ".venv/bin/python",
    "venv/bin/python",
    // Windows layouts.
    ".venv/Scripts/python.exe",
    "venv/Scripts/python.exe",
];

/// Resolve the interpreter used to launch the debugger.
///
/// A non-empty `explicit` path is returned unchanged — the caller is
/// assumed to know the target project's environment better than this
/// process does. Otherwise the venv candidates are probed under the
/// current working directory; if none exists the configured fallback
/// command is returned and `PATH` resolution is deferred to launch.
///
/// This never fails: an unusable result surfaces later as a spawn
/// error.
#[must_use]
pub fn resolve(explicit: Option<&str>, fallback: &str) -> String {
    let cwd = std::env::current_dir().unwrap_or_else(|_| ".".into());
    resolve_under(explicit, &cwd, fallback)
}

/// Resolution rooted at an explicit directory instead of the process
/// working directory. `resolve` delegates here; tests call it directly
/// so they do not have to change the process cwd.
#[must_use]
pub fn resolve_under(explicit: Option<&str>, root: &Path, fallback: &str) -> String {
    if let Some(path) = explicit {
        if !path.is_empty() {
            return path.to_owned();
        }
    }

    for candidate in VENV_CANDIDATES {
        let probe = root.join(candidate);
        if probe.exists() {
            // Absolute so the choice survives a cwd override at launch.
            return probe
                .canonicalize()
                .unwrap_or(probe)
                .to_string_lossy()
                .into_owned();
        }
    }

    fallback.to_owned()
}
