#![no_main]

use flexwm_layout::{FlexRegistry, NORMAL, Size};
use flexwm_runtime::{TreeNode, collect_updates, outline};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(tree) = TreeNode::from_json_str(text) else {
        return;
    };
    let _ = outline(&tree);

    let updates = collect_updates(&tree);
    let mut registry = FlexRegistry::default();
    // Duplicate group ids in hostile snapshots may be rejected; a panic may not.
    if registry.updates(&updates, true).is_err() {
        return;
    }
    for model in registry.models() {
        assert_eq!(model.sizes().iter().sum::<Size>(), NORMAL, "group off scale");
    }
});
