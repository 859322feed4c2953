//! Lightweight execution-scope accounting, compiled to no-ops unless the
//! `profiler` feature is enabled.

#[cfg(feature = "profiler")]
use std::collections::HashMap;
#[cfg(feature = "profiler")]
use std::sync::{Mutex, OnceLock};
use std::time::Duration;
#[cfg(feature = "profiler")]
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProfileKey {
    pub op: &'static str,
    pub implementation: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileEntry {
    pub calls: u64,
    pub total: Duration,
}

#[cfg(feature = "profiler")]
fn samples() -> &'static Mutex<HashMap<ProfileKey, ProfileEntry>> {
    static SAMPLES: OnceLock<Mutex<HashMap<ProfileKey, ProfileEntry>>> = OnceLock::new();
    SAMPLES.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Guard covering one primitive invocation; records its wall time on drop.
pub struct ScopeGuard {
    #[cfg(feature = "profiler")]
    key: ProfileKey,
    #[cfg(feature = "profiler")]
    start: Instant,
}

#[cfg(feature = "profiler")]
impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        if let Ok(mut samples) = samples().lock() {
            let entry = samples.entry(self.key.clone()).or_default();
            entry.calls += 1;
            entry.total += elapsed;
        }
    }
}

#[cfg(feature = "profiler")]
pub fn primitive_scope(op: &'static str, implementation: &'static str) -> ScopeGuard {
    ScopeGuard {
        key: ProfileKey { op, implementation },
        start: Instant::now(),
    }
}

#[cfg(not(feature = "profiler"))]
pub fn primitive_scope(_op: &'static str, _implementation: &'static str) -> ScopeGuard {
    ScopeGuard {}
}

/// Snapshot of accumulated scopes; empty without the `profiler` feature.
pub fn snapshot() -> Vec<(ProfileKey, ProfileEntry)> {
    #[cfg(feature = "profiler")]
    {
        samples()
            .lock()
            .map(|samples| samples.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }
    #[cfg(not(feature = "profiler"))]
    {
        Vec::new()
    }
}

pub fn reset() {
    #[cfg(feature = "profiler")]
    if let Ok(mut samples) = samples().lock() {
        samples.clear();
    }
}
