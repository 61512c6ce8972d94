use super::*;

// ============================================================================
// Basic operations
// ============================================================================

#[test]
fn test_new_is_empty() {
    let set = Bitset64::new();
    assert!(set.none());
    assert!(!set.any());
    assert_eq!(set.count(), 0);
}

#[test]
fn test_set_and_unset() {
    let mut set = Bitset64::new();
    set.set(0);
    set.set(63);
    assert!(set.test(0));
    assert!(set.test(63));
    assert!(!set.test(1));
    assert_eq!(set.count(), 2);

    set.unset(0);
    assert!(!set.test(0));
    assert_eq!(set.bits(), 1u64 << 63);
}

#[test]
fn test_set_value() {
    let mut set = Bitset64::new();
    set.set_value(5, true);
    assert!(set.test(5));
    set.set_value(5, false);
    assert!(set.none());
}

#[test]
fn test_out_of_range_reads_unset() {
    let set = Bitset64::from_bits(u64::MAX);
    assert!(!set.test(64));
    assert!(!set.test(1000));
}

#[test]
fn test_clear() {
    let mut set = Bitset64::from_bits(0b1011);
    set.clear();
    assert!(set.none());
}

// ============================================================================
// Iteration and operators
// ============================================================================

#[test]
fn test_iter_ascending() {
    let set: Bitset64 = [9, 2, 40, 0].into_iter().collect();
    let indices: Vec<usize> = set.iter().collect();
    assert_eq!(indices, vec![0, 2, 9, 40]);
}

#[test]
fn test_iter_empty() {
    assert_eq!(Bitset64::new().iter().count(), 0);
}

#[test]
fn test_operators() {
    let a = Bitset64::from_bits(0b1100);
    let b = Bitset64::from_bits(0b1010);
    assert_eq!((a | b).bits(), 0b1110);
    assert_eq!((a & b).bits(), 0b1000);
    assert_eq!((a & !b).bits(), 0b0100);
}

#[test]
fn test_debug_lists_indices() {
    let set = Bitset64::from_bits(0b101);
    assert_eq!(format!("{:?}", set), "{0, 2}");
}
