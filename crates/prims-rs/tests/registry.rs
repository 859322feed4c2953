use prims_rs::attr::PrimitiveAttr;
use prims_rs::pooling::{PoolingAlg, PoolingDesc};
use prims_rs::primitive::{ExecArgs, Primitive};
use prims_rs::registry::{self, Implementation};
use prims_rs::spec::{DType, PrimitiveError, PrimitiveResult, TensorDesc};

#[derive(Debug)]
struct DummyPrimitive {
    name: &'static str,
}

impl Primitive for DummyPrimitive {
    fn name(&self) -> &'static str {
        self.name
    }

    fn execute(&self, args: ExecArgs<'_>) -> PrimitiveResult<()> {
        args.done.mark_ready();
        Ok(())
    }
}

fn never(_: &PoolingDesc, _: &PrimitiveAttr) -> bool {
    false
}

fn always(_: &PoolingDesc, _: &PrimitiveAttr) -> bool {
    true
}

fn create_unreachable(
    _: &PoolingDesc,
    _: &PrimitiveAttr,
) -> PrimitiveResult<Box<dyn Primitive>> {
    Err(PrimitiveError::execution("pre-filter should have skipped"))
}

fn create_declining(_: &PoolingDesc, _: &PrimitiveAttr) -> PrimitiveResult<Box<dyn Primitive>> {
    Err(PrimitiveError::unimplemented(
        "dummy planning",
        "combination not covered",
    ))
}

fn create_accepting(_: &PoolingDesc, _: &PrimitiveAttr) -> PrimitiveResult<Box<dyn Primitive>> {
    Ok(Box::new(DummyPrimitive {
        name: "test:fallback",
    }))
}

fn sample_desc() -> PoolingDesc {
    let src = TensorDesc::nhwc(DType::Si8, [1, 4, 4, 2]);
    let dst = TensorDesc::nhwc(DType::Si8, [1, 2, 2, 2]);
    PoolingDesc::new(
        src,
        dst,
        PoolingAlg::Max,
        [2, 2],
        [2, 2],
        [(0, 0), (0, 0)],
    )
}

#[test]
fn try_list_walks_candidates_in_priority_order() {
    registry::register_implementation(Implementation {
        name: "test:filtered-out",
        reference: false,
        supported: never,
        create: create_unreachable,
    });
    registry::register_implementation(Implementation {
        name: "test:declines-at-planning",
        reference: false,
        supported: always,
        create: create_declining,
    });
    registry::register_implementation(Implementation {
        name: "test:fallback",
        reference: true,
        supported: always,
        create: create_accepting,
    });
    // Re-registration under an existing name is ignored.
    registry::register_implementation(Implementation {
        name: "test:fallback",
        reference: true,
        supported: never,
        create: create_unreachable,
    });

    let names = registry::list_implementations();
    assert_eq!(
        names.iter().filter(|&&n| n == "test:fallback").count(),
        1
    );

    let desc = sample_desc();
    let attr = PrimitiveAttr::new();
    assert!(registry::is_supported(&desc, &attr));

    let primitive = registry::create_primitive(&desc, &attr).expect("fallback accepts");
    assert_eq!(primitive.name(), "test:fallback");
}
