//! Parent/child filtering of flat reference lists.
//!
//! Children carry a foreign key to their parent (a line carries its
//! `branch_id`, an expense type its optional `line_id`). The filters below
//! never sort and never mutate their input: the subset keeps the order the
//! backend returned.

/// Children of `parent`, in their original order.
///
/// `None` means "no parent selected" and always yields an empty subset.
/// `parent_key` extracts the child's foreign key; a child without one never
/// matches.
pub fn filter_children<'a, T, K, F>(parent: Option<&K>, children: &'a [T], parent_key: F) -> Vec<&'a T>
where
    K: PartialEq,
    F: Fn(&T) -> Option<K>,
{
    let Some(parent) = parent else {
        return Vec::new();
    };
    children
        .iter()
        .filter(|&child| parent_key(child).is_some_and(|key| key == *parent))
        .collect()
}

/// Children of any of `parents`, in their original order.
///
/// Used by multi-select parents (a user's branches). An empty parent set
/// yields an empty subset.
pub fn filter_children_any<'a, T, K, F>(parents: &[K], children: &'a [T], parent_key: F) -> Vec<&'a T>
where
    K: PartialEq,
    F: Fn(&T) -> Option<K>,
{
    if parents.is_empty() {
        return Vec::new();
    }
    children
        .iter()
        .filter(|&child| parent_key(child).is_some_and(|key| parents.contains(&key)))
        .collect()
}
