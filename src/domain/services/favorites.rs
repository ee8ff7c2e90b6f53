//! Favorites list merging

use crate::domain::entities::Favorite;

/// Append `incoming` to `existing`, skipping ids already present.
/// First-insertion order is preserved and new entries are sorted after the
/// existing ones.
pub fn merge_favorites(
    existing: &[Favorite],
    incoming: impl IntoIterator<Item = Favorite>,
) -> Vec<Favorite> {
    let mut merged = existing.to_vec();
    let mut next_sort = existing.iter().map(|f| f.sort).max().unwrap_or(0);

    for favorite in incoming {
        if merged.iter().any(|f| f.id == favorite.id) {
            continue;
        }
        next_sort += 1;
        merged.push(Favorite {
            sort: next_sort,
            ..favorite
        });
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_is_idempotent() {
        let existing = vec![Favorite::item("spellbook")];
        let once = merge_favorites(&existing, vec![Favorite::item("dagger")]);
        let twice = merge_favorites(&once, vec![Favorite::item("dagger")]);

        assert_eq!(once, twice);
        assert_eq!(twice.len(), 2);
    }

    #[test]
    fn test_merge_preserves_first_insertion_order() {
        let merged = merge_favorites(
            &[],
            vec![
                Favorite::item("staff"),
                Favorite::item("dagger"),
                Favorite::item("staff"),
            ],
        );

        let ids: Vec<&str> = merged.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec![".Item.staff", ".Item.dagger"]);
        assert_eq!(merged[0].sort, 1);
        assert_eq!(merged[1].sort, 2);
    }
}
