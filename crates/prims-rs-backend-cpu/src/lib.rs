pub mod pooling;

pub use pooling::{I8i8PoolingFwd, KernelArgs, PoolConf, PoolKernel, PoolingFwdPd, RefPoolingFwd};

use prims_rs::attr::PrimitiveAttr;
use prims_rs::pooling::PoolingDesc;
use prims_rs::primitive::Primitive;
use prims_rs::registry::{register_implementation, Implementation};
use prims_rs::spec::PrimitiveResult;

fn create_i8i8(desc: &PoolingDesc, attr: &PrimitiveAttr) -> PrimitiveResult<Box<dyn Primitive>> {
    Ok(Box::new(I8i8PoolingFwd::init(desc, attr)?))
}

fn create_ref(desc: &PoolingDesc, attr: &PrimitiveAttr) -> PrimitiveResult<Box<dyn Primitive>> {
    Ok(Box::new(RefPoolingFwd::init(desc, attr)?))
}

/// Register the CPU pooling families with the global implementation registry.
///
/// Called automatically via a static initializer, but can also be called
/// manually to ensure registration. The vector family registers ahead of the
/// scalar reference so it wins whenever its instruction selection covers the
/// configuration.
pub fn register_cpu_pooling() {
    register_implementation(Implementation {
        name: PoolingFwdPd::NAME,
        reference: false,
        supported: PoolingFwdPd::supported,
        create: create_i8i8,
    });
    register_implementation(Implementation {
        name: RefPoolingFwd::NAME,
        reference: true,
        supported: RefPoolingFwd::supported,
        create: create_ref,
    });
}

// Auto-register on library load
#[cfg(not(target_family = "wasm"))]
#[used]
#[link_section = ".init_array"]
static REGISTER_CPU_POOLING: extern "C" fn() = {
    extern "C" fn register() {
        register_cpu_pooling();
    }
    register
};
