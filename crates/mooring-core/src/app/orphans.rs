//! Orphan Detector: committed assets whose URL no longer occurs in the content.

use std::collections::BTreeSet;

use crate::app::rewrite::contains_exact;
use crate::domain::{CommittedAssetRecord, RemoteId};

/// Remote ids of `records` whose `remote_url` is absent from `content`.
///
/// Must run on rewritten content so assets committed in the current pass
/// count as present.
pub fn find_orphans<'a, I>(content: &str, records: I) -> BTreeSet<RemoteId>
where
    I: IntoIterator<Item = &'a CommittedAssetRecord>,
{
    records
        .into_iter()
        .filter(|record| !contains_exact(content, record.remote_url.as_str()))
        .map(|record| record.remote_id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referenced_records_are_not_orphans() {
        let records = vec![
            CommittedAssetRecord::new("r1", "https://cdn/r1"),
            CommittedAssetRecord::new("r2", "https://cdn/r2"),
        ];
        let orphans = find_orphans("<img src='https://cdn/r1'>", &records);
        assert_eq!(orphans, BTreeSet::from([RemoteId::from("r2")]));
    }

    #[test]
    fn url_prefix_of_another_url_is_still_an_orphan() {
        let records = vec![
            CommittedAssetRecord::new("r1", "https://cdn/a1"),
            CommittedAssetRecord::new("r10", "https://cdn/a10"),
        ];
        let orphans = find_orphans("<img src='https://cdn/a10'>", &records);
        assert_eq!(orphans, BTreeSet::from([RemoteId::from("r1")]));
    }

    #[test]
    fn url_found_only_in_an_overlapping_occurrence_is_kept() {
        let records = vec![CommittedAssetRecord::new("r1", "ab.a")];
        assert!(find_orphans("ab.ab.a", &records).is_empty());
    }

    #[test]
    fn empty_content_orphans_everything() {
        let records = vec![CommittedAssetRecord::new("r1", "u1")];
        assert_eq!(find_orphans("", &records).len(), 1);
        let none: Vec<CommittedAssetRecord> = Vec::new();
        assert!(find_orphans("u1", &none).is_empty());
    }
}
