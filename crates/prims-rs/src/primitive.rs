//! Primitive execution surface: typed tensor storage, execution arguments,
//! and the completion handle signalled when a forward pass finishes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::spec::{DType, PrimitiveError, PrimitiveResult};

/// Dense host tensor storage, one variant per supported dtype.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    Si8(Vec<i8>),
    Ui8(Vec<u8>),
    Si32(Vec<i32>),
    F32(Vec<f32>),
}

impl TensorData {
    pub fn zeroed(dtype: DType, len: usize) -> Self {
        match dtype {
            DType::Si8 => TensorData::Si8(vec![0; len]),
            DType::Ui8 => TensorData::Ui8(vec![0; len]),
            DType::Si32 => TensorData::Si32(vec![0; len]),
            DType::F32 => TensorData::F32(vec![0.0; len]),
        }
    }

    pub fn dtype(&self) -> DType {
        match self {
            TensorData::Si8(_) => DType::Si8,
            TensorData::Ui8(_) => DType::Ui8,
            TensorData::Si32(_) => DType::Si32,
            TensorData::F32(_) => DType::F32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TensorData::Si8(v) => v.len(),
            TensorData::Ui8(v) => v.len(),
            TensorData::Si32(v) => v.len(),
            TensorData::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks dtype and element count against a descriptor-derived
    /// expectation, reporting an execution error on mismatch.
    pub fn expect(&self, dtype: DType, len: usize, role: &str) -> PrimitiveResult<()> {
        if self.dtype() != dtype {
            return Err(PrimitiveError::execution(format!(
                "{role} buffer holds {:?}, primitive was built for {:?}",
                self.dtype(),
                dtype
            )));
        }
        if self.len() != len {
            return Err(PrimitiveError::execution(format!(
                "{role} buffer holds {} elements, primitive expects {len}",
                self.len()
            )));
        }
        Ok(())
    }
}

/// Completion handle supplied by the surrounding engine's executor.
///
/// Primitives flip it exactly once, after the last destination write of an
/// `execute` call.
#[derive(Debug, Clone, Default)]
pub struct CompletionHandle {
    ready: Arc<AtomicBool>,
}

impl CompletionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}

/// Borrowed arguments for one `execute` call. Buffers are owned by the
/// caller; the primitive only reads `src` and writes `dst` for the duration
/// of the call.
pub struct ExecArgs<'a> {
    pub src: &'a TensorData,
    pub dst: &'a mut TensorData,
    pub done: &'a CompletionHandle,
}

/// A configuration-specific compute unit, ready to run.
///
/// An instance only exists after its configuration passed validation and
/// planning, so `execute` has no invalid-state failure mode: the only errors
/// it can report are argument/buffer mismatches.
pub trait Primitive: Send + Sync + std::fmt::Debug {
    /// Stable human-readable implementation name, e.g. `"vec:i8i8_pooling_fwd"`.
    fn name(&self) -> &'static str;

    fn execute(&self, args: ExecArgs<'_>) -> PrimitiveResult<()>;
}
