//! Tuning plan derived once per validated pooling configuration.

use prims_rs::attr::{PostOps, PrimitiveAttr};
use prims_rs::pooling::{PoolingAlg, PoolingDesc};
use prims_rs::spec::{DType, PrimitiveError, PrimitiveResult};

use crate::pooling::kernel;

/// Vector register width assumed by the channel-block computation, in bits.
pub(crate) const LANE_BITS: usize = 128;

/// Immutable kernel-generation plan.
///
/// Everything the generated routine needs is normalized here: flattened NHWC
/// extents, window geometry, the channel block width matched to the narrowest
/// element type, and a frozen copy of the post-op chain. Rebuilding a plan
/// requires a new configuration descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolConf {
    pub mb: usize,
    pub c: usize,
    pub ih: usize,
    pub iw: usize,
    pub oh: usize,
    pub ow: usize,
    pub kh: usize,
    pub kw: usize,
    pub stride_h: usize,
    pub stride_w: usize,
    pub pad_t: usize,
    pub pad_l: usize,
    pub alg: PoolingAlg,
    pub src_dt: DType,
    pub dst_dt: DType,
    /// Channels processed per inner-loop step; 8-bit elements pack four times
    /// as many lanes as 32-bit ones.
    pub c_block: usize,
    pub with_post_ops: bool,
    pub post_ops: PostOps,
}

impl PoolConf {
    /// Derives the plan from a descriptor that already passed the family's
    /// compatibility check. Callers must guard with that check first.
    ///
    /// Fails with `Unimplemented` when the resolved
    /// (source, destination, algorithm, post-op) combination has no
    /// instruction-selection strategy; dispatch treats that exactly like a
    /// failed compatibility check.
    pub fn from_desc(desc: &PoolingDesc, attr: &PrimitiveAttr) -> PrimitiveResult<Self> {
        let src_dims = desc.src.shape.dims();
        let dst_dims = desc.dst.shape.dims();
        let src_dt = desc.src.dtype;
        let dst_dt = desc.dst.dtype;
        let with_post_ops = !attr.post_ops.is_empty();

        if kernel::select(src_dt, dst_dt, desc.alg, with_post_ops).is_none() {
            return Err(PrimitiveError::unimplemented(
                "pooling_fwd planning",
                format!("no kernel variant for {src_dt:?} -> {dst_dt:?} {:?}", desc.alg),
            ));
        }

        let narrowest = src_dt.bitwidth().min(dst_dt.bitwidth());
        Ok(Self {
            mb: src_dims[0],
            c: src_dims[3],
            ih: src_dims[1],
            iw: src_dims[2],
            oh: dst_dims[1],
            ow: dst_dims[2],
            kh: desc.kernel[0],
            kw: desc.kernel[1],
            stride_h: desc.strides[0],
            stride_w: desc.strides[1],
            pad_t: desc.padding[0].0,
            pad_l: desc.padding[1].0,
            alg: desc.alg,
            src_dt,
            dst_dt,
            c_block: LANE_BITS / narrowest,
            with_post_ops,
            post_ops: attr.post_ops.clone(),
        })
    }

    pub fn src_len(&self) -> usize {
        self.mb * self.ih * self.iw * self.c
    }

    pub fn dst_len(&self) -> usize {
        self.mb * self.oh * self.ow * self.c
    }
}
