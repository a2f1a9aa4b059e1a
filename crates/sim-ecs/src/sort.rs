//! Stable sorting and sorted-set intersection.
//!
//! These are the building blocks of [`World::get_entities`](crate::world::World::get_entities).
//! All functions take the sequence explicitly; nothing here extends a
//! built-in type.

use std::cmp::Ordering;

// ---------------------------------------------------------------------------
// Stable sort
// ---------------------------------------------------------------------------

/// Sort `seq` ascending, keeping equal elements in their original order.
pub fn stable_sort<T: Ord>(seq: &mut [T]) {
    stable_sort_by(seq, T::cmp);
}

/// Sort `seq` with `cmp`, keeping elements that compare equal in their
/// original relative order.
///
/// `slice::sort_by` is guaranteed stable, so this is a thin wrapper that pins
/// the stability requirement to a single call site.
pub fn stable_sort_by<T, F>(seq: &mut [T], cmp: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    seq.sort_by(cmp);
}

// ---------------------------------------------------------------------------
// Intersection
// ---------------------------------------------------------------------------

/// Intersect two ascending sequences.
///
/// Walks both inputs from the tail: when the two largest remaining elements
/// are equal the element is kept and both sides step inward, otherwise the
/// larger one cannot be in the intersection and only its side steps. The walk
/// stops as soon as either side is exhausted, so the cost is `O(|a| + |b|)`.
///
/// The result is ascending. Neither input is modified.
pub fn intersection<T: Ord + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    let mut result = Vec::with_capacity(a.len().min(b.len()));
    let mut a_end = a.len();
    let mut b_end = b.len();

    while a_end > 0 && b_end > 0 {
        let a_last = &a[a_end - 1];
        let b_last = &b[b_end - 1];
        match a_last.cmp(b_last) {
            Ordering::Greater => a_end -= 1,
            Ordering::Less => b_end -= 1,
            Ordering::Equal => {
                result.push(a_last.clone());
                a_end -= 1;
                b_end -= 1;
            }
        }
    }

    // Collected from the tail, so it is descending here.
    result.reverse();
    result
}

/// Intersect any number of unordered sets.
///
/// The sets are ordered smallest first, the smallest is sorted ascending and
/// becomes the running result, and every remaining set is sorted and merged in
/// with [`intersection`]. The running result can only shrink, so starting from
/// the smallest set bounds the total work by it when the filters are
/// selective.
///
/// Returns an empty vector when `sets` is empty.
pub fn intersect_all<T: Ord + Clone>(mut sets: Vec<Vec<T>>) -> Vec<T> {
    if sets.is_empty() {
        return Vec::new();
    }

    stable_sort_by(&mut sets, |a, b| a.len().cmp(&b.len()));

    let mut rest = sets.into_iter();
    let mut result = rest.next().unwrap_or_default();
    stable_sort(&mut result);

    for mut set in rest {
        if result.is_empty() {
            break;
        }
        stable_sort(&mut set);
        result = intersection(&result, &set);
    }

    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
