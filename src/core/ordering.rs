//! Rank bookkeeping for a single user's list.
//!
//! Every function here works on the full set of one owner's items and keeps
//! the dense rank invariant: ranks cover exactly `1..=N`.

use crate::domain::model::{ListItem, ListItemId};
use crate::utils::error::{ListError, Result};

/// Rank a newly appended item receives.
pub fn next_rank(max_rank: Option<u32>) -> u32 {
    max_rank.map_or(1, |rank| rank + 1)
}

/// Moves `item_id` to `target` and shifts the items in between by one.
///
/// Returns the whole list sorted ascending by rank. Items outside the moved
/// range keep their rank.
pub fn move_to(mut items: Vec<ListItem>, item_id: ListItemId, target: u32) -> Result<Vec<ListItem>> {
    let current = items
        .iter()
        .find(|item| item.id == item_id)
        .map(|item| item.rank)
        .ok_or_else(|| ListError::not_found(format!("List item {}", item_id)))?;

    if target < 1 || target as usize > items.len() {
        return Err(ListError::InvalidRank {
            rank: target,
            len: items.len(),
        });
    }

    if target > current {
        for item in items.iter_mut() {
            if item.id != item_id && item.rank > current && item.rank <= target {
                item.rank -= 1;
            }
        }
    } else if target < current {
        for item in items.iter_mut() {
            if item.id != item_id && item.rank >= target && item.rank < current {
                item.rank += 1;
            }
        }
    }

    if let Some(item) = items.iter_mut().find(|item| item.id == item_id) {
        item.rank = target;
    }

    sort_by_rank(&mut items);
    Ok(items)
}

/// Reassigns ranks `1..=N` following the current order.
///
/// Ties (which only exist if the list was already corrupted) fall back to
/// insertion time, then id.
pub fn renumber(mut items: Vec<ListItem>) -> Vec<ListItem> {
    sort_by_rank(&mut items);
    for (index, item) in items.iter_mut().enumerate() {
        item.rank = index as u32 + 1;
    }
    items
}

pub fn sort_by_rank(items: &mut [ListItem]) {
    items.sort_by(|a, b| {
        a.rank
            .cmp(&b.rank)
            .then(a.added_at.cmp(&b.added_at))
            .then(a.id.cmp(&b.id))
    });
}

/// True when the ranks of `items` are exactly `1..=items.len()`.
pub fn is_dense(items: &[ListItem]) -> bool {
    let mut ranks: Vec<u32> = items.iter().map(|item| item.rank).collect();
    ranks.sort_unstable();
    ranks
        .iter()
        .enumerate()
        .all(|(index, rank)| *rank == index as u32 + 1)
}
