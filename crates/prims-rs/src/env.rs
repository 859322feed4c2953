use std::env;
use std::sync::OnceLock;

static FORCE_REF: OnceLock<bool> = OnceLock::new();

fn parse_bool(value: &str) -> bool {
    let normalized = value.trim().to_ascii_lowercase();
    matches!(normalized.as_str(), "1" | "true" | "yes" | "on")
}

/// When `PRIMS_RS_FORCE_REF` is set, dispatch skips specialized kernel
/// families and resolves to reference implementations only. Read once.
pub(crate) fn force_ref_enabled() -> bool {
    *FORCE_REF.get_or_init(|| match env::var("PRIMS_RS_FORCE_REF") {
        Ok(value) if !value.trim().is_empty() => parse_bool(&value),
        _ => false,
    })
}
