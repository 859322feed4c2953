//! Kernel generation for the i8i8 forward pooling family.
//!
//! `PoolKernel::generate` commits once, per tuning plan, to a monomorphized
//! routine covering exactly the plan's (source, destination, algorithm,
//! post-op) combination. After generation the kernel is an opaque callable:
//! one invocation computes one (batch, output-row) tile and writes nothing
//! outside that tile's destination range.

use std::sync::Arc;

use prims_rs::pooling::PoolingAlg;
use prims_rs::primitive::TensorData;
use prims_rs::spec::{DType, PrimitiveError, PrimitiveResult};

use crate::pooling::conf::{PoolConf, LANE_BITS};

/// Widest channel tile any plan can request (8-bit lanes).
const MAX_C_BLOCK: usize = LANE_BITS / 8;

/// Per-invocation arguments: the caller-owned buffers plus the tile
/// coordinates this call is responsible for.
pub struct KernelArgs<'a> {
    pub src: &'a TensorData,
    pub dst: &'a mut TensorData,
    pub mb: usize,
    pub oh: usize,
}

pub(crate) type KernelFn = fn(&PoolConf, KernelArgs<'_>) -> PrimitiveResult<()>;

/// One generated kernel instance, exclusively owned by the primitive that
/// requested it. Read-only after generation; safe to invoke from multiple
/// threads against disjoint tiles.
#[derive(Debug)]
pub struct PoolKernel {
    conf: Arc<PoolConf>,
    run: KernelFn,
}

impl PoolKernel {
    pub fn generate(conf: &PoolConf) -> PrimitiveResult<Self> {
        let run = select(conf.src_dt, conf.dst_dt, conf.alg, conf.with_post_ops).ok_or_else(
            || {
                PrimitiveError::unimplemented(
                    "pooling_fwd kernel generation",
                    format!(
                        "no variant for {:?} -> {:?} {:?}",
                        conf.src_dt, conf.dst_dt, conf.alg
                    ),
                )
            },
        )?;
        Ok(Self {
            conf: Arc::new(conf.clone()),
            run,
        })
    }

    pub fn conf(&self) -> &PoolConf {
        &self.conf
    }

    pub fn call(&self, args: KernelArgs<'_>) -> PrimitiveResult<()> {
        (self.run)(&self.conf, args)
    }
}

/// Instruction-selection table. `None` means the combination has no strategy
/// even if it passed family-level type compatibility; planning surfaces that
/// as `Unimplemented`.
pub(crate) fn select(
    src: DType,
    dst: DType,
    alg: PoolingAlg,
    with_post_ops: bool,
) -> Option<KernelFn> {
    use DType::{Si32, Si8, Ui8, F32};
    match alg {
        PoolingAlg::Max => {
            if with_post_ops {
                return None;
            }
            match (src, dst) {
                (Si8, Si8) => Some(run_max::<i8>),
                (Ui8, Ui8) => Some(run_max::<u8>),
                (Si32, Si32) => Some(run_max::<i32>),
                _ => None,
            }
        }
        PoolingAlg::AvgIncludePadding | PoolingAlg::AvgExcludePadding => {
            match (src, dst, with_post_ops) {
                (Si8, Si8, false) => Some(run_avg::<i8, i8, false>),
                (Si8, Si8, true) => Some(run_avg::<i8, i8, true>),
                (Si8, F32, false) => Some(run_avg::<i8, f32, false>),
                (Si8, F32, true) => Some(run_avg::<i8, f32, true>),
                (Ui8, Ui8, false) => Some(run_avg::<u8, u8, false>),
                (Ui8, Ui8, true) => Some(run_avg::<u8, u8, true>),
                (Ui8, F32, false) => Some(run_avg::<u8, f32, false>),
                (Ui8, F32, true) => Some(run_avg::<u8, f32, true>),
                (Si32, Si32, false) => Some(run_avg::<i32, i32, false>),
                (Si32, Si32, true) => Some(run_avg::<i32, i32, true>),
                (Si32, F32, false) => Some(run_avg::<i32, f32, false>),
                (Si32, F32, true) => Some(run_avg::<i32, f32, true>),
                _ => None,
            }
        }
    }
}

pub(crate) trait PoolElem: Copy + Send + Sync + 'static {
    const LOWEST: Self;
    fn pick_max(a: Self, b: Self) -> Self;
    fn to_f64(self) -> f64;
    fn from_f32(value: f32) -> Self;
    fn view(data: &TensorData) -> Option<&[Self]>;
    fn view_mut(data: &mut TensorData) -> Option<&mut [Self]>;
}

macro_rules! impl_int_pool_elem {
    ($ty:ty, $variant:ident) => {
        impl PoolElem for $ty {
            const LOWEST: Self = <$ty>::MIN;

            fn pick_max(a: Self, b: Self) -> Self {
                a.max(b)
            }

            fn to_f64(self) -> f64 {
                self as f64
            }

            fn from_f32(value: f32) -> Self {
                value.round_ties_even() as $ty
            }

            fn view(data: &TensorData) -> Option<&[Self]> {
                match data {
                    TensorData::$variant(values) => Some(values),
                    _ => None,
                }
            }

            fn view_mut(data: &mut TensorData) -> Option<&mut [Self]> {
                match data {
                    TensorData::$variant(values) => Some(values),
                    _ => None,
                }
            }
        }
    };
}

impl_int_pool_elem!(i8, Si8);
impl_int_pool_elem!(u8, Ui8);
impl_int_pool_elem!(i32, Si32);

impl PoolElem for f32 {
    const LOWEST: Self = f32::NEG_INFINITY;

    fn pick_max(a: Self, b: Self) -> Self {
        a.max(b)
    }

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f32(value: f32) -> Self {
        value
    }

    fn view(data: &TensorData) -> Option<&[Self]> {
        match data {
            TensorData::F32(values) => Some(values),
            _ => None,
        }
    }

    fn view_mut(data: &mut TensorData) -> Option<&mut [Self]> {
        match data {
            TensorData::F32(values) => Some(values),
            _ => None,
        }
    }
}

fn view_mismatch(role: &str) -> PrimitiveError {
    PrimitiveError::execution(format!(
        "{role} buffer dtype does not match the generated kernel"
    ))
}

/// Clips one spatial window axis to the source extent. Implicit padding
/// samples fall outside the returned range.
fn clip(out_idx: usize, stride: usize, pad: usize, window: usize, extent: usize) -> (usize, usize) {
    let start = (out_idx * stride) as isize - pad as isize;
    let lo = start.clamp(0, extent as isize) as usize;
    let hi = (start + window as isize).clamp(0, extent as isize) as usize;
    (lo, hi.max(lo))
}

fn run_max<T: PoolElem>(conf: &PoolConf, args: KernelArgs<'_>) -> PrimitiveResult<()> {
    let src = T::view(args.src).ok_or_else(|| view_mismatch("source"))?;
    let dst = T::view_mut(args.dst).ok_or_else(|| view_mismatch("destination"))?;
    let c = conf.c;
    let row = &mut dst[(args.mb * conf.oh + args.oh) * conf.ow * c..][..conf.ow * c];
    let (h_lo, h_hi) = clip(args.oh, conf.stride_h, conf.pad_t, conf.kh, conf.ih);

    for ow in 0..conf.ow {
        let (w_lo, w_hi) = clip(ow, conf.stride_w, conf.pad_l, conf.kw, conf.iw);
        let out = &mut row[ow * c..(ow + 1) * c];
        out.fill(T::LOWEST);
        for ih in h_lo..h_hi {
            let line = (args.mb * conf.ih + ih) * conf.iw * c;
            for iw in w_lo..w_hi {
                let window = &src[line + iw * c..][..c];
                for (o, s) in out.iter_mut().zip(window) {
                    *o = T::pick_max(*o, *s);
                }
            }
        }
    }
    Ok(())
}

fn run_avg<S: PoolElem, D: PoolElem, const WITH_POST: bool>(
    conf: &PoolConf,
    args: KernelArgs<'_>,
) -> PrimitiveResult<()> {
    let src = S::view(args.src).ok_or_else(|| view_mismatch("source"))?;
    let dst = D::view_mut(args.dst).ok_or_else(|| view_mismatch("destination"))?;
    let c = conf.c;
    let row = &mut dst[(args.mb * conf.oh + args.oh) * conf.ow * c..][..conf.ow * c];
    let (h_lo, h_hi) = clip(args.oh, conf.stride_h, conf.pad_t, conf.kh, conf.ih);
    let full_window = (conf.kh * conf.kw) as f64;

    for ow in 0..conf.ow {
        let (w_lo, w_hi) = clip(ow, conf.stride_w, conf.pad_l, conf.kw, conf.iw);
        let samples = (h_hi - h_lo) * (w_hi - w_lo);
        let divisor = match conf.alg {
            PoolingAlg::AvgIncludePadding => full_window,
            PoolingAlg::AvgExcludePadding => samples as f64,
            PoolingAlg::Max => unreachable!("variant selection guard"),
        };
        let out = &mut row[ow * c..(ow + 1) * c];

        let mut acc = [0f64; MAX_C_BLOCK];
        let mut cb = 0;
        while cb < c {
            let width = conf.c_block.min(c - cb);
            acc[..width].fill(0.0);
            for ih in h_lo..h_hi {
                let line = (args.mb * conf.ih + ih) * conf.iw * c;
                for iw in w_lo..w_hi {
                    let lane = &src[line + iw * c + cb..][..width];
                    for (a, s) in acc[..width].iter_mut().zip(lane) {
                        *a += s.to_f64();
                    }
                }
            }
            for (o, a) in out[cb..cb + width].iter_mut().zip(&acc[..width]) {
                let mut value = if divisor > 0.0 { (a / divisor) as f32 } else { 0.0 };
                if WITH_POST {
                    value = conf.post_ops.apply(value);
                }
                *o = D::from_f32(value);
            }
            cb += width;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_with_post_ops_has_no_variant() {
        assert!(select(DType::Si8, DType::Si8, PoolingAlg::Max, true).is_none());
    }

    #[test]
    fn clip_drops_padding_samples() {
        // First output of a 3-wide window with padding 1: only source 0..2.
        assert_eq!(clip(0, 1, 1, 3, 4), (0, 2));
        // Interior output sees the full window.
        assert_eq!(clip(1, 1, 1, 3, 4), (0, 3));
        // Fully padded tail clamps to an empty range.
        assert_eq!(clip(5, 1, 0, 3, 4), (4, 4));
    }

    #[test]
    fn integer_downconvert_rounds_to_nearest_even() {
        assert_eq!(<i8 as PoolElem>::from_f32(2.5), 2);
        assert_eq!(<i8 as PoolElem>::from_f32(3.5), 4);
        assert_eq!(<i8 as PoolElem>::from_f32(-2.5), -2);
        assert_eq!(<u8 as PoolElem>::from_f32(-1.0), 0);
        assert_eq!(<i8 as PoolElem>::from_f32(400.0), i8::MAX);
    }
}
