//! Scalar reference implementation of forward pooling.
//!
//! Registered after the vector family, it serves the configurations the
//! specialized kernels decline (for example cross-integer averaging) and acts
//! as the behavioral model the vector kernels are tested against.

use prims_rs::attr::PrimitiveAttr;
use prims_rs::pooling::{PoolingAlg, PoolingDesc};
use prims_rs::primitive::{ExecArgs, Primitive, TensorData};
use prims_rs::profiling;
use prims_rs::spec::{Layout, PrimitiveError, PrimitiveResult};

use crate::pooling::fwd::PoolingFwdPd;
use crate::pooling::kernel::PoolElem;

#[derive(Debug)]
pub struct RefPoolingFwd {
    desc: PoolingDesc,
    attr: PrimitiveAttr,
}

impl RefPoolingFwd {
    pub const NAME: &'static str = "ref:pooling_fwd";

    /// The reference accepts the whole family-level configuration space; it
    /// has no instruction-selection gaps.
    pub fn supported(desc: &PoolingDesc, attr: &PrimitiveAttr) -> bool {
        PoolingFwdPd::supported(desc, attr)
    }

    pub fn init(desc: &PoolingDesc, attr: &PrimitiveAttr) -> PrimitiveResult<Self> {
        if !Self::supported(desc, attr) {
            return Err(PrimitiveError::unsupported(
                "reference pooling cannot serve this configuration",
            ));
        }
        let mut resolved = desc.clone();
        resolved.dst = resolved.dst.with_default_layout(Layout::Nhwc);
        Ok(Self {
            desc: resolved,
            attr: attr.clone(),
        })
    }

    pub fn desc(&self) -> &PoolingDesc {
        &self.desc
    }
}

fn dense_f64(data: &TensorData) -> Vec<f64> {
    match data {
        TensorData::Si8(values) => values.iter().map(|&x| x as f64).collect(),
        TensorData::Ui8(values) => values.iter().map(|&x| x as f64).collect(),
        TensorData::Si32(values) => values.iter().map(|&x| x as f64).collect(),
        TensorData::F32(values) => values.iter().map(|&x| x as f64).collect(),
    }
}

fn write_from_f32(data: &mut TensorData, index: usize, value: f32) {
    match data {
        TensorData::Si8(values) => values[index] = <i8 as PoolElem>::from_f32(value),
        TensorData::Ui8(values) => values[index] = <u8 as PoolElem>::from_f32(value),
        TensorData::Si32(values) => values[index] = <i32 as PoolElem>::from_f32(value),
        TensorData::F32(values) => values[index] = value,
    }
}

impl Primitive for RefPoolingFwd {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn execute(&self, args: ExecArgs<'_>) -> PrimitiveResult<()> {
        let _scope = profiling::primitive_scope("pooling_fwd", Self::NAME);
        let src_dims = self.desc.src.shape.dims();
        let dst_dims = self.desc.dst.shape.dims();
        let (mb, ih, iw, c) = (src_dims[0], src_dims[1], src_dims[2], src_dims[3]);
        let (oh, ow) = (dst_dims[1], dst_dims[2]);
        let (kh, kw) = (self.desc.kernel[0], self.desc.kernel[1]);
        let (stride_h, stride_w) = (self.desc.strides[0], self.desc.strides[1]);
        let (pad_t, pad_l) = (self.desc.padding[0].0, self.desc.padding[1].0);

        args.src
            .expect(self.desc.src.dtype, mb * ih * iw * c, "source")?;
        args.dst
            .expect(self.desc.dst.dtype, mb * oh * ow * c, "destination")?;

        let values = dense_f64(args.src);

        for n in 0..mb {
            for out_h in 0..oh {
                let start_h = (out_h * stride_h) as isize - pad_t as isize;
                for out_w in 0..ow {
                    let start_w = (out_w * stride_w) as isize - pad_l as isize;
                    for ch in 0..c {
                        let mut acc = match self.desc.alg {
                            PoolingAlg::Max => f64::NEG_INFINITY,
                            _ => 0.0,
                        };
                        let mut samples = 0usize;
                        for k_h in 0..kh {
                            let in_h = start_h + k_h as isize;
                            if in_h < 0 || in_h >= ih as isize {
                                continue;
                            }
                            for k_w in 0..kw {
                                let in_w = start_w + k_w as isize;
                                if in_w < 0 || in_w >= iw as isize {
                                    continue;
                                }
                                let linear =
                                    ((n * ih + in_h as usize) * iw + in_w as usize) * c + ch;
                                let v = values[linear];
                                match self.desc.alg {
                                    PoolingAlg::Max => acc = acc.max(v),
                                    _ => acc += v,
                                }
                                samples += 1;
                            }
                        }

                        let result = match self.desc.alg {
                            PoolingAlg::Max => acc as f32,
                            PoolingAlg::AvgIncludePadding => (acc / (kh * kw) as f64) as f32,
                            PoolingAlg::AvgExcludePadding => {
                                if samples == 0 {
                                    0.0
                                } else {
                                    (acc / samples as f64) as f32
                                }
                            }
                        };
                        let result = self.attr.post_ops.apply(result);
                        let out_index = ((n * oh + out_h) * ow + out_w) * c + ch;
                        write_from_f32(args.dst, out_index, result);
                    }
                }
            }
        }
        args.done.mark_ready();
        Ok(())
    }
}
