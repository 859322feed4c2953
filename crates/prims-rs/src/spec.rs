use std::fmt;

use serde::{Deserialize, Serialize};

/// Enumerates scalar element types supported by the primitive contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    Si8,
    Ui8,
    Si32,
    F32,
}

impl DType {
    /// Returns `true` when the dtype is a signed or unsigned integer.
    pub fn is_integer(self) -> bool {
        matches!(self, DType::Si8 | DType::Ui8 | DType::Si32)
    }

    /// Returns `true` when the dtype is a floating-point representation.
    pub fn is_float(self) -> bool {
        matches!(self, DType::F32)
    }

    pub fn bitwidth(self) -> usize {
        match self {
            DType::Si8 | DType::Ui8 => 8,
            DType::Si32 | DType::F32 => 32,
        }
    }

    pub fn size_in_bytes(self) -> usize {
        self.bitwidth() / 8
    }
}

/// Memory layout tag for rank-4 activations.
///
/// `Any` is a placeholder left by the caller; primitive descriptors resolve it
/// to the one layout their kernel family selects before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layout {
    Nhwc,
    Any,
}

impl Layout {
    pub fn is_resolved(self) -> bool {
        !matches!(self, Layout::Any)
    }
}

/// Logical tensor shape as an ordered list of static extents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    pub fn new(dims: impl Into<Vec<usize>>) -> Self {
        Self { dims: dims.into() }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn element_count(&self) -> usize {
        self.dims.iter().product()
    }
}

/// Tensor metadata coupling dtype, layout tag, and shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TensorDesc {
    pub dtype: DType,
    pub layout: Layout,
    pub shape: Shape,
}

impl TensorDesc {
    pub fn new(dtype: DType, layout: Layout, shape: Shape) -> Self {
        Self {
            dtype,
            layout,
            shape,
        }
    }

    pub fn nhwc(dtype: DType, dims: [usize; 4]) -> Self {
        Self::new(dtype, Layout::Nhwc, Shape::new(dims.to_vec()))
    }

    /// Returns the same descriptor with `Any` layout replaced by `layout`.
    pub fn with_default_layout(&self, layout: Layout) -> Self {
        let mut resolved = self.clone();
        if !resolved.layout.is_resolved() {
            resolved.layout = layout;
        }
        resolved
    }

    pub fn byte_len(&self) -> usize {
        self.shape.element_count() * self.dtype.size_in_bytes()
    }
}

/// Primitive error surfaced to higher layers.
///
/// `Unsupported` and `Unimplemented` are both construction-time declines: the
/// dispatch layer moves on to the next candidate implementation on either.
/// `Execution` indicates malformed arguments handed to a ready instance.
#[derive(Debug)]
pub enum PrimitiveError {
    Unsupported {
        reason: &'static str,
    },
    Unimplemented {
        what: &'static str,
        reason: String,
    },
    Execution {
        message: String,
    },
}

impl PrimitiveError {
    pub fn unsupported(reason: &'static str) -> Self {
        PrimitiveError::Unsupported { reason }
    }

    pub fn unimplemented(what: &'static str, reason: impl Into<String>) -> Self {
        PrimitiveError::Unimplemented {
            what,
            reason: reason.into(),
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        PrimitiveError::Execution {
            message: message.into(),
        }
    }

    /// Returns `true` when the error is a candidate decline rather than a
    /// malformed call.
    pub fn is_decline(&self) -> bool {
        matches!(
            self,
            PrimitiveError::Unsupported { .. } | PrimitiveError::Unimplemented { .. }
        )
    }
}

impl fmt::Display for PrimitiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveError::Unsupported { reason } => {
                write!(f, "unsupported configuration: {reason}")
            }
            PrimitiveError::Unimplemented { what, reason } => {
                write!(f, "{what} is not implemented: {reason}")
            }
            PrimitiveError::Execution { message } => {
                write!(f, "primitive execution failure: {message}")
            }
        }
    }
}

impl std::error::Error for PrimitiveError {}

/// Convenience alias for results returned by primitive routines.
pub type PrimitiveResult<T> = Result<T, PrimitiveError>;
