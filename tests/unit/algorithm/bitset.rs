//! Tests for `ValueSet` membership, counting and set operations

#[cfg(test)]
mod tests {
    use stepwise_explainer::algorithm::bitset::ValueSet;

    // Tests that a new ValueSet is empty with count 0
    // Verified by initializing the bits to 1
    #[test]
    fn test_new_value_set() {
        let values = ValueSet::new(9);
        assert_eq!(values.count(), 0);
        assert!(values.is_empty());
        assert_eq!(values.single(), None);
    }

    // Tests that values are stored 1-based and out-of-domain values are ignored
    // Verified by storing value at index value instead of value-1
    #[test]
    fn test_insert_and_contains() {
        let mut values = ValueSet::new(9);
        values.insert(1);
        values.insert(9);
        values.insert(0);
        values.insert(10);
        assert!(values.contains(1));
        assert!(values.contains(9));
        assert!(!values.contains(0));
        assert!(!values.contains(10));
        assert_eq!(values.to_vec(), vec![1, 9]);
    }

    // Tests that single reports the only value and nothing for larger sets
    // Verified by returning the first value regardless of count
    #[test]
    fn test_single() {
        let mut values = ValueSet::new(4);
        values.insert(3);
        assert_eq!(values.single(), Some(3));
        values.insert(4);
        assert_eq!(values.single(), None);
        values.remove(3);
        assert_eq!(values.single(), Some(4));
    }

    // Tests intersection keeps only shared values
    // Verified by changing intersection to union
    #[test]
    fn test_intersect_with() {
        let mut left = ValueSet::all(6);
        let mut right = ValueSet::new(6);
        right.insert(2);
        right.insert(5);
        left.intersect_with(&right);
        assert_eq!(left.to_vec(), vec![2, 5]);
        assert_eq!(format!("{left}"), "ValueSet(2 values: [2, 5])");
    }
}
