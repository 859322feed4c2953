//! Runtime registry of pooling primitive implementations.
//!
//! Kernel families register themselves here; the engine resolves a
//! configuration by walking the candidates in priority order and taking the
//! first one that accepts it. A candidate that declines (unsupported
//! configuration or uncovered instruction selection) is skipped, not an
//! error: reference fallbacks registered with lower priority pick the
//! configuration up.

use std::sync::{OnceLock, RwLock};

use crate::attr::PrimitiveAttr;
use crate::env;
use crate::pooling::PoolingDesc;
use crate::primitive::Primitive;
use crate::spec::{PrimitiveError, PrimitiveResult};

/// One registered implementation candidate.
#[derive(Clone, Copy)]
pub struct Implementation {
    /// Stable name, e.g. `"vec:i8i8_pooling_fwd"`. Registration is keyed on it.
    pub name: &'static str,
    /// Reference implementations stay eligible under `PRIMS_RS_FORCE_REF`.
    pub reference: bool,
    /// Cheap pre-filter mirroring the candidate's construction-time checks.
    pub supported: fn(&PoolingDesc, &PrimitiveAttr) -> bool,
    pub create: fn(&PoolingDesc, &PrimitiveAttr) -> PrimitiveResult<Box<dyn Primitive>>,
}

struct ImplRegistry {
    candidates: RwLock<Vec<Implementation>>,
}

impl ImplRegistry {
    fn new() -> Self {
        Self {
            candidates: RwLock::new(Vec::new()),
        }
    }
}

static GLOBAL_REGISTRY: OnceLock<ImplRegistry> = OnceLock::new();

fn global_registry() -> &'static ImplRegistry {
    GLOBAL_REGISTRY.get_or_init(ImplRegistry::new)
}

/// Appends a candidate to the try-list. Earlier registrations win ties, so
/// specialized families register before their reference fallbacks.
/// Re-registering a name is a no-op.
pub fn register_implementation(implementation: Implementation) {
    let mut candidates = global_registry().candidates.write().unwrap();
    if candidates.iter().any(|c| c.name == implementation.name) {
        return;
    }
    candidates.push(implementation);
}

pub fn list_implementations() -> Vec<&'static str> {
    let candidates = global_registry().candidates.read().unwrap();
    candidates.iter().map(|c| c.name).collect()
}

fn eligible(candidate: &Implementation) -> bool {
    candidate.reference || !env::force_ref_enabled()
}

/// Cheap pre-filter usable by the dispatch layer before committing to
/// construction.
pub fn is_supported(desc: &PoolingDesc, attr: &PrimitiveAttr) -> bool {
    let candidates = global_registry().candidates.read().unwrap();
    candidates
        .iter()
        .filter(|c| eligible(c))
        .any(|c| (c.supported)(desc, attr))
}

/// Resolves a configuration to a ready primitive instance.
///
/// Candidates are tried in registration order; declines fall through to the
/// next candidate. Execution-class errors from a candidate's constructor are
/// raised immediately since they indicate a malformed descriptor rather than
/// a coverage gap.
pub fn create_primitive(
    desc: &PoolingDesc,
    attr: &PrimitiveAttr,
) -> PrimitiveResult<Box<dyn Primitive>> {
    let candidates: Vec<Implementation> = {
        let guard = global_registry().candidates.read().unwrap();
        guard.iter().copied().filter(eligible).collect()
    };

    for candidate in &candidates {
        if !(candidate.supported)(desc, attr) {
            continue;
        }
        match (candidate.create)(desc, attr) {
            Ok(primitive) => return Ok(primitive),
            Err(err) if err.is_decline() => continue,
            Err(err) => return Err(err),
        }
    }

    Err(PrimitiveError::unsupported(
        "no registered implementation accepts this configuration",
    ))
}
