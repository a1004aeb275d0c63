//! Tier 2: concurrent search of an imported package for a top-level
//! declaration.
//!
//! One scoped worker per candidate file, gated by a fixed-capacity token
//! channel so at most the configured parallelism of parses is in flight.
//! Cancellation is cooperative: the first match raises a shared flag,
//! workers that have not started skip their work, and a worker mid-parse
//! finishes and has its result discarded. Every spawned worker sends
//! exactly one result into a channel sized to the candidate count, so the
//! collector always drains to completion and the scope joins promptly.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::debug;

use crate::build::ImportedUnit;
use crate::errors::{DefjumpError, Result};
use crate::frontend::GoFrontend;
use crate::resolution::RawDefinition;
use crate::vfs::Vfs;

pub struct MemberLocator<'a> {
    frontend: &'a GoFrontend,
    vfs: &'a Vfs<'a>,
    parallelism: usize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl<'a> MemberLocator<'a> {
    /// Creates a locator running at most `parallelism` concurrent parses.
    pub fn new(frontend: &'a GoFrontend, vfs: &'a Vfs<'a>, parallelism: usize) -> Self {
        Self {
            frontend,
            vfs,
            parallelism: parallelism.max(1),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// High-water mark of simultaneously in-flight parses.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::Relaxed)
    }

    /// Searches the package's candidate files for a top-level declaration
    /// named `member`.
    pub fn locate(
        &self,
        import_path: &str,
        unit: &ImportedUnit,
        member: &str,
    ) -> Result<RawDefinition> {
        let candidates = &unit.files;
        debug!(
            import_path,
            member,
            candidates = candidates.len(),
            parallelism = self.parallelism,
            "searching package for member"
        );

        let cancel = AtomicBool::new(false);
        let (result_tx, result_rx) = bounded::<Option<RawDefinition>>(candidates.len());
        let (gate_tx, gate_rx) = bounded::<()>(self.parallelism);

        let found = thread::scope(|scope| {
            for path in candidates {
                let result_tx = result_tx.clone();
                let gate_tx = gate_tx.clone();
                let gate_rx = gate_rx.clone();
                let cancel = &cancel;
                scope.spawn(move || {
                    let outcome =
                        self.scan_candidate(path, import_path, member, cancel, &gate_tx, &gate_rx);
                    let _ = result_tx.send(outcome);
                });
            }

            let mut found = None;
            for _ in 0..candidates.len() {
                match result_rx.recv() {
                    Ok(Some(hit)) => {
                        if found.is_none() {
                            cancel.store(true, Ordering::Release);
                            found = Some(hit);
                        }
                    }
                    Ok(None) => {}
                    Err(_) => break,
                }
            }
            found
        });

        found.ok_or_else(|| DefjumpError::MemberNotFound {
            member: member.to_string(),
            import_path: import_path.to_string(),
        })
    }

    /// Parses one candidate file and scans its top-level declarations.
    /// Returns `None` when cancelled, unparsable, or without a match.
    fn scan_candidate(
        &self,
        path: &Path,
        import_path: &str,
        member: &str,
        cancel: &AtomicBool,
        gate_tx: &Sender<()>,
        gate_rx: &Receiver<()>,
    ) -> Option<RawDefinition> {
        if cancel.load(Ordering::Acquire) {
            return None;
        }
        // Acquire a parse slot; capacity bounds the in-flight parses.
        gate_tx.send(()).ok()?;
        let result = self.parse_and_scan(path, import_path, member, cancel);
        let _ = gate_rx.try_recv();
        result
    }

    fn parse_and_scan(
        &self,
        path: &Path,
        import_path: &str,
        member: &str,
        cancel: &AtomicBool,
    ) -> Option<RawDefinition> {
        // A match may have landed while we waited for a slot.
        if cancel.load(Ordering::Acquire) {
            return None;
        }
        let n = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_in_flight.fetch_max(n, Ordering::AcqRel);
        let parsed = self.frontend.parse_unit(self.vfs, path).ok();
        self.in_flight.fetch_sub(1, Ordering::AcqRel);

        let decl = parsed?.find_member(member)?;
        Some(RawDefinition {
            path: path.to_path_buf(),
            offset: decl.offset,
            label: format!("{} {}.{}", decl.kind, import_path, member),
        })
    }
}
