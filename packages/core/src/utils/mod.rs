//! Utility functions shared across the crate

use std::collections::BTreeSet;

/// Whether two string lists hold the same members, ignoring order and duplicates
pub fn same_members<A, B>(left: &[A], right: &[B]) -> bool
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let left: BTreeSet<&str> = left.iter().map(AsRef::as_ref).collect();
    let right: BTreeSet<&str> = right.iter().map(AsRef::as_ref).collect();
    left == right
}
