pub mod attr;
mod env;
pub mod pooling;
pub mod primitive;
pub mod profiling;
pub mod registry;
pub mod spec;

pub use attr::{EltwiseAlg, PostOp, PostOps, PrimitiveAttr};
pub use pooling::{GeometryError, PoolingAlg, PoolingDesc};
pub use primitive::{CompletionHandle, ExecArgs, Primitive, TensorData};
pub use spec::{DType, Layout, PrimitiveError, PrimitiveResult, Shape, TensorDesc};
