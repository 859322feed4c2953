//! Forward pooling operation descriptor.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::{PrimitiveError, Shape, TensorDesc};

/// Window geometry that cannot produce a destination shape.
#[derive(Debug, Error, Clone)]
#[error("{message}")]
pub struct GeometryError {
    message: String,
}

impl GeometryError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<GeometryError> for PrimitiveError {
    fn from(err: GeometryError) -> Self {
        PrimitiveError::execution(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolingAlg {
    Max,
    AvgIncludePadding,
    AvgExcludePadding,
}

impl PoolingAlg {
    pub fn is_avg(self) -> bool {
        matches!(
            self,
            PoolingAlg::AvgIncludePadding | PoolingAlg::AvgExcludePadding
        )
    }
}

/// Immutable description of one requested forward pooling operation.
///
/// Geometry is rank-4 NHWC: `kernel`, `strides`, and `padding` cover the two
/// spatial axes; batch and channel are never pooled. Padding is expressed as
/// `(begin, end)` per spatial axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolingDesc {
    pub src: TensorDesc,
    pub dst: TensorDesc,
    pub alg: PoolingAlg,
    pub kernel: [usize; 2],
    pub strides: [usize; 2],
    pub padding: [(usize, usize); 2],
}

impl PoolingDesc {
    pub fn new(
        src: TensorDesc,
        dst: TensorDesc,
        alg: PoolingAlg,
        kernel: [usize; 2],
        strides: [usize; 2],
        padding: [(usize, usize); 2],
    ) -> Self {
        Self {
            src,
            dst,
            alg,
            kernel,
            strides,
            padding,
        }
    }

    /// Destination shape implied by the source shape and window geometry.
    pub fn expected_dst_shape(&self) -> Result<Shape, GeometryError> {
        let dims = self.src.shape.dims();
        if dims.len() != 4 {
            return Err(GeometryError::new(format!(
                "pooling expects a rank-4 source, got rank {}",
                dims.len()
            )));
        }
        let (mb, ih, iw, c) = (dims[0], dims[1], dims[2], dims[3]);
        let oh = out_dim(ih, self.kernel[0], self.strides[0], self.padding[0])?;
        let ow = out_dim(iw, self.kernel[1], self.strides[1], self.padding[1])?;
        Ok(Shape::new(vec![mb, oh, ow, c]))
    }
}

fn out_dim(
    input: usize,
    kernel: usize,
    stride: usize,
    padding: (usize, usize),
) -> Result<usize, GeometryError> {
    let padded = input + padding.0 + padding.1;
    if kernel == 0 || stride == 0 || padded < kernel {
        return Err(GeometryError::new(format!(
            "window {kernel} with stride {stride} does not fit padded extent {padded}"
        )));
    }
    Ok((padded - kernel) / stride + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::DType;

    fn desc(src_dims: [usize; 4], kernel: [usize; 2], strides: [usize; 2]) -> PoolingDesc {
        PoolingDesc::new(
            TensorDesc::nhwc(DType::Si8, src_dims),
            TensorDesc::nhwc(DType::Si8, src_dims),
            PoolingAlg::Max,
            kernel,
            strides,
            [(0, 0), (0, 0)],
        )
    }

    #[test]
    fn dst_shape_halves_under_2x2_stride_2() {
        let d = desc([1, 4, 4, 2], [2, 2], [2, 2]);
        let shape = d.expected_dst_shape().expect("shape derivable");
        assert_eq!(shape.dims(), &[1, 2, 2, 2]);
    }

    #[test]
    fn padding_widens_the_output() {
        let mut d = desc([1, 4, 4, 2], [3, 3], [1, 1]);
        d.padding = [(1, 1), (1, 1)];
        let shape = d.expected_dst_shape().expect("shape derivable");
        assert_eq!(shape.dims(), &[1, 4, 4, 2]);
    }

    #[test]
    fn oversized_window_is_rejected() {
        let d = desc([1, 2, 2, 2], [4, 4], [1, 1]);
        assert!(d.expected_dst_shape().is_err());
    }
}
