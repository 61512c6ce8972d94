use super::*;

fn set(raw: u64) -> vk::DescriptorSet {
    vk::DescriptorSet::from_raw(raw)
}

fn layout(raw: u64) -> vk::PipelineLayout {
    vk::PipelineLayout::from_raw(raw)
}

// ============================================================================
// Recording
// ============================================================================

#[test]
fn test_nothing_pending_initially() {
    let mut bound = BoundDescriptorSets::default();
    assert!(bound.take_pending(vk::PipelineLayout::null()).is_empty());
}

#[test]
fn test_recorded_sets_flush_in_set_order() {
    let mut bound = BoundDescriptorSets::default();
    bound.record(2, set(30), &[]);
    bound.record(0, set(10), &[256]);

    let pending = bound.take_pending(layout(1));
    assert_eq!(
        pending,
        vec![
            PendingBinding { set_index: 0, set: set(10), dynamic_offsets: vec![256] },
            PendingBinding { set_index: 2, set: set(30), dynamic_offsets: vec![] },
        ]
    );
}

#[test]
fn test_flush_clears_dirty_points() {
    let mut bound = BoundDescriptorSets::default();
    bound.record(1, set(20), &[]);
    assert_eq!(bound.take_pending(layout(1)).len(), 1);
    assert!(bound.take_pending(layout(1)).is_empty());
}

#[test]
fn test_rebinding_same_set_and_offsets_is_not_dirty() {
    let mut bound = BoundDescriptorSets::default();
    bound.record(1, set(20), &[64]);
    bound.take_pending(layout(1));

    bound.record(1, set(20), &[64]);
    assert!(bound.take_pending(layout(1)).is_empty());
}

#[test]
fn test_new_dynamic_offsets_mark_point_dirty() {
    let mut bound = BoundDescriptorSets::default();
    bound.record(1, set(20), &[0]);
    bound.take_pending(layout(1));

    bound.record(1, set(20), &[128]);
    let pending = bound.take_pending(layout(1));
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].dynamic_offsets, vec![128]);
}

// ============================================================================
// Unbinding and layout changes
// ============================================================================

#[test]
fn test_null_set_unbinds_point() {
    let mut bound = BoundDescriptorSets::default();
    bound.record(0, set(10), &[]);
    bound.take_pending(layout(1));

    bound.record(0, vk::DescriptorSet::null(), &[]);
    assert!(bound.take_pending(layout(1)).is_empty());

    // Stays unbound across layout changes
    assert!(bound.take_pending(layout(2)).is_empty());
}

#[test]
fn test_pipeline_layout_change_rebinds_everything() {
    let mut bound = BoundDescriptorSets::default();
    bound.record(0, set(10), &[]);
    bound.record(2, set(30), &[]);
    bound.take_pending(layout(1));

    let pending = bound.take_pending(layout(2));
    let indices: Vec<u32> = pending.iter().map(|p| p.set_index).collect();
    assert_eq!(indices, vec![0, 2]);
}

#[test]
fn test_forget_drops_destroyed_set() {
    let mut bound = BoundDescriptorSets::default();
    bound.record(0, set(10), &[]);
    bound.record(1, set(20), &[]);

    bound.forget(set(10));
    let pending = bound.take_pending(layout(1));
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].set, set(20));
}
