//! Progress reporting capability.

/// Fire-and-forget progress sink injected into the session.
///
/// Implementations must never block and never fail; the engine calls this
/// from hot paths and ignores everything about the outcome. Console
/// spinners, log forwarding, and verbosity policy all live on the caller's
/// side of this trait.
pub trait ProgressSink: Send + Sync {
    /// Reports one progress event. `label` is a fixed operation name
    /// (`"onboarding"`, `"upload"`); `detail` is human-readable.
    fn report(&self, label: &str, detail: &str);
}

/// Sink that discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn report(&self, _label: &str, _detail: &str) {}
}
