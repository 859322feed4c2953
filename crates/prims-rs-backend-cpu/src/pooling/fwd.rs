//! Forward pooling over quantized NHWC activations: primitive descriptor and
//! the executing instance.

use prims_rs::attr::PrimitiveAttr;
use prims_rs::pooling::{PoolingAlg, PoolingDesc};
use prims_rs::primitive::{ExecArgs, Primitive};
use prims_rs::profiling;
use prims_rs::spec::{DType, Layout, PrimitiveError, PrimitiveResult};

use crate::pooling::conf::PoolConf;
use crate::pooling::kernel::{KernelArgs, PoolKernel};

/// Primitive descriptor for the i8i8 pooling family.
///
/// Construction resolves layout defaults and runs the family's compatibility
/// check before deriving the tuning plan. A descriptor only exists for
/// configurations this family agreed to serve.
#[derive(Debug, Clone)]
pub struct PoolingFwdPd {
    desc: PoolingDesc,
    attr: PrimitiveAttr,
    conf: PoolConf,
}

impl PoolingFwdPd {
    pub const NAME: &'static str = "vec:i8i8_pooling_fwd";

    /// Pure compatibility predicate. No side effects; a `false` answer means
    /// "try another implementation", never an error.
    pub fn supported(desc: &PoolingDesc, attr: &PrimitiveAttr) -> bool {
        Self::check(&Self::set_default_params(desc), attr)
    }

    /// Post-op policy: only quantization entries, and only on averaging
    /// algorithms. Keeping max pooling post-op-free is a policy choice, not
    /// a kernel limitation.
    pub fn supported_post_ops(alg: PoolingAlg, attr: &PrimitiveAttr) -> bool {
        let all_quantization = attr.post_ops.iter().all(|op| op.is_quantization());
        all_quantization && (attr.post_ops.is_empty() || alg.is_avg())
    }

    fn set_default_params(desc: &PoolingDesc) -> PoolingDesc {
        let mut resolved = desc.clone();
        resolved.dst = resolved.dst.with_default_layout(Layout::Nhwc);
        resolved
    }

    fn check(desc: &PoolingDesc, attr: &PrimitiveAttr) -> bool {
        let dst_shape_ok = match desc.expected_dst_shape() {
            Ok(shape) => shape == desc.dst.shape,
            Err(_) => false,
        };
        desc.src.shape.rank() == 4
            && desc.dst.shape.rank() == 4
            && matches!(desc.src.dtype, DType::Si8 | DType::Ui8 | DType::Si32)
            && (desc.alg != PoolingAlg::Max || desc.src.dtype == desc.dst.dtype)
            && (!desc.alg.is_avg()
                || matches!(
                    desc.dst.dtype,
                    DType::Si8 | DType::Ui8 | DType::Si32 | DType::F32
                ))
            && desc.src.layout == Layout::Nhwc
            && desc.dst.layout == Layout::Nhwc
            && dst_shape_ok
            && Self::supported_post_ops(desc.alg, attr)
    }

    pub fn init(desc: &PoolingDesc, attr: &PrimitiveAttr) -> PrimitiveResult<Self> {
        let desc = Self::set_default_params(desc);
        if !Self::check(&desc, attr) {
            return Err(PrimitiveError::unsupported(
                "i8i8 pooling family cannot serve this configuration",
            ));
        }
        let conf = PoolConf::from_desc(&desc, attr)?;
        Ok(Self {
            desc,
            attr: attr.clone(),
            conf,
        })
    }

    pub fn desc(&self) -> &PoolingDesc {
        &self.desc
    }

    pub fn attr(&self) -> &PrimitiveAttr {
        &self.attr
    }

    pub fn conf(&self) -> &PoolConf {
        &self.conf
    }
}

/// Ready-to-run forward pooling instance owning one generated kernel.
///
/// The kernel is released with the instance; plans and descriptors are
/// immutable value data, so no other teardown exists.
#[derive(Debug)]
pub struct I8i8PoolingFwd {
    pd: PoolingFwdPd,
    ker: PoolKernel,
}

impl I8i8PoolingFwd {
    pub fn init(desc: &PoolingDesc, attr: &PrimitiveAttr) -> PrimitiveResult<Self> {
        let pd = PoolingFwdPd::init(desc, attr)?;
        let ker = PoolKernel::generate(pd.conf())?;
        Ok(Self { pd, ker })
    }

    pub fn pd(&self) -> &PoolingFwdPd {
        &self.pd
    }
}

impl Primitive for I8i8PoolingFwd {
    fn name(&self) -> &'static str {
        PoolingFwdPd::NAME
    }

    fn execute(&self, args: ExecArgs<'_>) -> PrimitiveResult<()> {
        let _scope = profiling::primitive_scope("pooling_fwd", PoolingFwdPd::NAME);
        let conf = self.ker.conf();
        args.src.expect(conf.src_dt, conf.src_len(), "source")?;
        args.dst.expect(conf.dst_dt, conf.dst_len(), "destination")?;

        // One kernel call per (batch, output row) tile; tiles write disjoint
        // destination ranges, so the surrounding engine may split this loop
        // across threads without locking.
        for mb in 0..conf.mb {
            for oh in 0..conf.oh {
                self.ker.call(KernelArgs {
                    src: args.src,
                    dst: &mut *args.dst,
                    mb,
                    oh,
                })?;
            }
        }
        args.done.mark_ready();
        Ok(())
    }
}
