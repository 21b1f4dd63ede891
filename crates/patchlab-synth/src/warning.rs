//! Out-of-band, non-fatal warnings for the UI.
//!
//! Conflicting state never interrupts the engine. It is logged with
//! `tracing::warn!` and, when a [`WarningSink`] is attached, pushed onto a
//! bounded crossbeam channel with `try_send`. A full or disconnected channel
//! drops the warning; the engine never blocks on its listener.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::mod_matrix::{ModRoute, RouteOrigin};
use crate::params::ParadigmKind;

/// A non-fatal condition the UI may want to show.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineWarning {
    /// A modulation route would form a cycle and is treated as disabled.
    ConflictingRoute {
        /// Where the route came from.
        origin: RouteOrigin,
        /// The ignored route.
        route: ModRoute,
    },
    /// A patch targeted a paradigm group the current parameters do not have.
    ParadigmMismatch {
        /// Paradigm the patch was written for.
        expected: ParadigmKind,
        /// Paradigm of the current parameters.
        actual: ParadigmKind,
    },
    /// A patch addressed an index that does not exist.
    IndexOutOfRange {
        /// Name of the indexed group.
        group: &'static str,
        /// Requested index.
        index: usize,
        /// Number of entries in the group.
        len: usize,
    },
}

impl core::fmt::Display for EngineWarning {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EngineWarning::ConflictingRoute { origin, route } => write!(
                f,
                "route {:?} -> {:?} from {:?} forms a modulation cycle and is ignored",
                route.source, route.destination, origin
            ),
            EngineWarning::ParadigmMismatch { expected, actual } => write!(
                f,
                "patch for {expected:?} parameters ignored by a {actual:?} engine"
            ),
            EngineWarning::IndexOutOfRange { group, index, len } => {
                write!(f, "{group} index {index} out of range (len {len})")
            }
        }
    }
}

/// Sending half of the warning channel.
#[derive(Clone, Debug)]
pub struct WarningSink {
    tx: Sender<EngineWarning>,
}

impl WarningSink {
    /// Wrap an existing sender.
    pub fn new(tx: Sender<EngineWarning>) -> Self {
        Self { tx }
    }

    /// Log and publish a warning without blocking.
    ///
    /// Returns `false` if the warning was dropped.
    pub fn emit(&self, warning: EngineWarning) -> bool {
        tracing::warn!(%warning, "engine warning");
        match self.tx.try_send(warning) {
            Ok(()) => true,
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Log a warning and forward it to an optional sink.
pub(crate) fn report(sink: Option<&WarningSink>, warning: EngineWarning) {
    match sink {
        Some(sink) => {
            sink.emit(warning);
        }
        None => tracing::warn!(%warning, "engine warning"),
    }
}

/// Create a bounded warning channel.
///
/// ```rust
/// use patchlab_synth::warning_channel;
///
/// let (sink, rx) = warning_channel(8);
/// drop(sink);
/// assert!(rx.try_recv().is_err());
/// ```
pub fn warning_channel(capacity: usize) -> (WarningSink, Receiver<EngineWarning>) {
    let (tx, rx) = bounded(capacity.max(1));
    (WarningSink::new(tx), rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mod_matrix::{ModDestination, ModSource};

    fn conflict() -> EngineWarning {
        EngineWarning::ConflictingRoute {
            origin: RouteOrigin::Slot(2),
            route: ModRoute::new(ModSource::Lfo1, ModDestination::Lfo1Rate, 0.5),
        }
    }

    #[test]
    fn test_emit_delivers() {
        let (sink, rx) = warning_channel(4);
        assert!(sink.emit(conflict()));
        assert_eq!(rx.try_recv().unwrap(), conflict());
    }

    #[test]
    fn test_full_channel_drops_without_blocking() {
        let (sink, rx) = warning_channel(1);
        assert!(sink.emit(conflict()));
        assert!(!sink.emit(conflict()));
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn test_disconnected_receiver_is_ignored() {
        let (sink, rx) = warning_channel(1);
        drop(rx);
        assert!(!sink.emit(conflict()));
    }

    #[test]
    fn test_display_mentions_route() {
        let text = conflict().to_string();
        assert!(text.contains("Lfo1Rate"));
        assert!(text.contains("cycle"));
    }
}
