#![no_main]

use arbitrary::Arbitrary;
use flexwm_layout::{
    Axis, FlexEvent, FlexModel, FloorKind, INFER_TOTAL, NORMAL, NodeId, Size, globals, rescale,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Flex(u8),
    Grow { item: u8, increase: u16 },
    Override { item: u8, flexed: bool, min: u16 },
}

#[derive(Debug, Arbitrary)]
struct Input {
    weights: Vec<u16>,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    if input.weights.is_empty() || input.weights.len() > 16 {
        return;
    }
    let mut sizes: Vec<Size> = input.weights.iter().map(|&w| Size::from(w)).collect();
    rescale(&mut sizes, INFER_TOTAL, NORMAL).expect("non-empty group");

    let items = sizes
        .iter()
        .enumerate()
        .map(|(i, &s)| (NodeId::new(i as i64), s));
    let mut model =
        FlexModel::new(NodeId::new(-1), Axis::Horizontal, items, *globals()).expect("on scale");
    let n = model.len();

    for op in input.ops.iter().take(64) {
        match *op {
            Op::Flex(i) => {
                model.flex(usize::from(i) % n).expect("index in range");
            }
            Op::Grow { item, increase } => {
                if increase == 0 {
                    continue;
                }
                let id = model.items()[usize::from(item) % n].id();
                model
                    .on_update(&[FlexEvent {
                        id,
                        increase: Size::from(increase % 1000),
                    }])
                    .ok();
            }
            Op::Override { item, flexed, min } => {
                let kind = if flexed { FloorKind::Flexed } else { FloorKind::Unflexed };
                let min = Size::from(min % 1000);
                model
                    .set_floor_override(usize::from(item) % n, kind, Some(min))
                    .expect("index in range");
            }
        }

        // Post-conditions that must always hold:
        assert_eq!(model.sizes().iter().sum::<Size>(), NORMAL, "group off scale");
        let constraints = model.constraints();
        for (i, c) in constraints.iter().enumerate() {
            assert!(c.item < n, "constraint on missing item");
            assert!(!constraints[i + 1..].contains(c), "duplicate constraint");
        }
    }
});
