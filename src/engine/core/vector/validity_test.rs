use crate::engine::core::vector::ValidityMask;

#[test]
fn test_push_and_read_bits() {
    let mut mask = ValidityMask::new();
    for i in 0..130 {
        mask.push(i % 3 != 0);
    }
    assert_eq!(mask.len(), 130);
    for i in 0..130 {
        assert_eq!(mask.is_valid(i), i % 3 != 0, "bit {}", i);
    }
    assert_eq!(mask.invalid_count(), (0..130).filter(|i| i % 3 == 0).count());
}

#[test]
fn test_set_overrides_bit() {
    let mut mask = ValidityMask::all_valid(10);
    mask.set(4, false);
    assert!(!mask.is_valid(4));
    assert!(mask.is_valid(3));
    mask.set(4, true);
    assert!(mask.is_valid(4));
}

#[test]
fn test_truncate_clears_tail() {
    let mut mask = ValidityMask::new();
    for _ in 0..100 {
        mask.push(true);
    }
    mask.truncate(65);
    assert_eq!(mask.len(), 65);
    // pushes after truncation must not see stale bits
    mask.push(false);
    assert!(!mask.is_valid(65));
}
