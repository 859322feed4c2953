//! Primitive attributes: the ordered post-op chain fused into a primitive's
//! output path.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Closed set of fused post-operations.
///
/// Keeping the enum closed lets primitive descriptors encode their post-op
/// policy as an exhaustive match instead of consulting an open-ended kind
/// registry. Individual kernel families typically accept a subset; pooling
/// only takes `Quantization`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PostOp {
    Quantization { scale: f32, shift: f32 },
    Eltwise { alg: EltwiseAlg, alpha: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EltwiseAlg {
    Relu,
}

impl PostOp {
    pub fn quantization(scale: f32) -> Self {
        PostOp::Quantization { scale, shift: 0.0 }
    }

    pub fn relu() -> Self {
        PostOp::Eltwise {
            alg: EltwiseAlg::Relu,
            alpha: 0.0,
        }
    }

    pub fn is_quantization(&self) -> bool {
        matches!(self, PostOp::Quantization { .. })
    }

    /// Applies the post-op to a single f32 accumulator value.
    pub fn apply(&self, value: f32) -> f32 {
        match *self {
            PostOp::Quantization { scale, shift } => value * scale + shift,
            PostOp::Eltwise {
                alg: EltwiseAlg::Relu,
                alpha,
            } => {
                if value >= 0.0 {
                    value
                } else {
                    value * alpha
                }
            }
        }
    }
}

/// Ordered post-op chain. Insertion order is application order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostOps {
    entries: SmallVec<[PostOp; 2]>,
}

impl PostOps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: PostOp) {
        self.entries.push(op);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PostOp> {
        self.entries.iter()
    }

    /// Applies the whole chain, in order, to an f32 accumulator value.
    pub fn apply(&self, value: f32) -> f32 {
        self.entries.iter().fold(value, |acc, op| op.apply(acc))
    }
}

impl FromIterator<PostOp> for PostOps {
    fn from_iter<I: IntoIterator<Item = PostOp>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Attributes attached to a primitive configuration descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveAttr {
    pub post_ops: PostOps,
}

impl PrimitiveAttr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_post_op(mut self, op: PostOp) -> Self {
        self.post_ops.push(op);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_applies_in_insertion_order() {
        let mut ops = PostOps::new();
        ops.push(PostOp::Quantization {
            scale: 2.0,
            shift: 1.0,
        });
        ops.push(PostOp::Quantization {
            scale: 10.0,
            shift: 0.0,
        });
        // (3 * 2 + 1) * 10, not (3 * 10) * 2 + 1.
        assert_eq!(ops.apply(3.0), 70.0);
    }

    #[test]
    fn empty_chain_is_identity() {
        assert_eq!(PostOps::new().apply(-4.5), -4.5);
    }
}
