//! Versioned, snapshot-published parameter storage.
//!
//! The control thread builds a new immutable [`SynthParams`] for every setter
//! call and publishes it with a single `ArcSwap::store`. The tick path calls
//! [`ParameterStore::snapshot`] once per tick and works on that `Arc` for the
//! whole tick, so it never blocks on or partially observes a write.
//!
//! Writes are serialized by the caller (one control thread); `ParameterStore`
//! is `Clone` and cheap to share between the control side and the engine.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::patch::ParamPatch;
use crate::params::SynthParams;
use crate::warning::{EngineWarning, WarningSink, report};

/// One published parameter set.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamSnapshot {
    /// Monotonic version, incremented by every successful write.
    pub version: u64,
    /// The parameters.
    pub params: SynthParams,
}

/// Shared handle to the current parameter snapshot.
///
/// # Example
///
/// ```rust
/// use patchlab_synth::{ParamPatch, ParameterStore, SynthParams};
///
/// let store = ParameterStore::new(SynthParams::subtractive());
/// let before = store.snapshot();
///
/// store.apply(ParamPatch::Pan(2.0));
///
/// let after = store.snapshot();
/// assert_eq!(after.version, before.version + 1);
/// assert_eq!(after.params.common.pan, 1.0);
/// assert_eq!(before.params.common.pan, 0.0);
/// ```
#[derive(Clone)]
pub struct ParameterStore {
    current: Arc<ArcSwap<ParamSnapshot>>,
    warnings: Option<WarningSink>,
}

impl core::fmt::Debug for ParameterStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ParameterStore")
            .field("version", &self.version())
            .finish_non_exhaustive()
    }
}

impl ParameterStore {
    /// Create a store holding `params` (sanitized) at version 0.
    pub fn new(params: SynthParams) -> Self {
        let params = sanitize_logged(params);
        Self {
            current: Arc::new(ArcSwap::from_pointee(ParamSnapshot { version: 0, params })),
            warnings: None,
        }
    }

    /// Attach a sink for non-fatal warnings.
    pub fn with_warnings(mut self, sink: WarningSink) -> Self {
        self.warnings = Some(sink);
        self
    }

    /// The warning sink, if attached.
    pub fn warnings(&self) -> Option<&WarningSink> {
        self.warnings.as_ref()
    }

    /// Load the current snapshot (wait-free).
    #[inline]
    pub fn snapshot(&self) -> Arc<ParamSnapshot> {
        self.current.load_full()
    }

    /// Current version.
    pub fn version(&self) -> u64 {
        self.current.load().version
    }

    /// Current parameters (copied out of the snapshot).
    pub fn params(&self) -> SynthParams {
        self.current.load().params
    }

    /// Apply a group patch and publish the result.
    ///
    /// A conflicting patch leaves the snapshot unchanged and is reported as a
    /// warning. Returns the snapshot in effect afterwards.
    pub fn apply(&self, patch: ParamPatch) -> Arc<ParamSnapshot> {
        let current = self.snapshot();
        match current.params.with_patch(patch) {
            Ok(params) => {
                tracing::debug!(
                    group = patch.group(),
                    version = current.version + 1,
                    "patch applied"
                );
                self.publish(current.version, params)
            }
            Err(conflict) => {
                report(self.warnings.as_ref(), EngineWarning::from(conflict));
                current
            }
        }
    }

    /// Replace every parameter at once (preset load).
    pub fn replace_all(&self, params: SynthParams) -> Arc<ParamSnapshot> {
        let current = self.snapshot();
        let params = sanitize_logged(params);
        tracing::debug!(
            paradigm = ?params.kind(),
            version = current.version + 1,
            "parameters replaced"
        );
        self.publish(current.version, params)
    }

    fn publish(&self, previous: u64, params: SynthParams) -> Arc<ParamSnapshot> {
        let next = Arc::new(ParamSnapshot {
            version: previous + 1,
            params,
        });
        self.current.store(Arc::clone(&next));
        next
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new(SynthParams::default())
    }
}

fn sanitize_logged(params: SynthParams) -> SynthParams {
    let clean = params.sanitized();
    if clean != params {
        tracing::debug!("out-of-range parameters clamped");
    }
    clean
}
