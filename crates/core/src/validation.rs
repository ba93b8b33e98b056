//! Validated-value payloads for single edits and bulk copies.
//!
//! The backend treats `validated_values` as a full replacement list, so
//! every payload built here covers the complete region roster.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::model::{
    AdministrationId, AdministrativeRegion, Publication, PublicationStatus, ReconciledRow,
    ValidatedValue,
};

/// Body of `PUT /admin/publication/{id}` for validation edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedValuesUpdate {
    pub validated_values: Vec<ValidatedValue>,
}

impl ValidatedValuesUpdate {
    pub fn category(&self, id: AdministrationId) -> Option<i32> {
        self.validated_values
            .iter()
            .find(|v| v.administration_id == id)
            .and_then(|v| v.category)
    }
}

/// Body of `PUT /admin/publication/{id}` publishing the bulletin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishRequest {
    pub bulletin_url: Option<String>,
    pub narrative: Option<String>,
    pub status: i32,
}

impl PublishRequest {
    pub fn new(narrative: Option<String>, bulletin_url: Option<String>) -> Self {
        Self { bulletin_url, narrative, status: PublicationStatus::Published.code() }
    }

    /// The backend answers with the stored publication; anything other
    /// than a published status means the publish did not take.
    pub fn confirmed(returned: &Publication) -> bool {
        returned.status() == Some(PublicationStatus::Published)
    }
}

/// Query filters for the publication-reviews endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewFilter {
    pub non_disputed: bool,
    pub non_validated: bool,
}

impl ReviewFilter {
    pub fn is_empty(&self) -> bool {
        !self.non_disputed && !self.non_validated
    }

    pub fn query(&self) -> [(&'static str, &'static str); 2] {
        [
            ("non_disputed", bool_str(self.non_disputed)),
            ("non_validated", bool_str(self.non_validated)),
        ]
    }
}

fn bool_str(b: bool) -> &'static str {
    if b { "true" } else { "false" }
}

/// At most one distinct defined reviewer category.
pub fn is_non_disputed(row: &ReconciledRow) -> bool {
    row.reviewer_values().collect::<BTreeSet<_>>().len() <= 1
}

/// Value a bulk copy writes: the first defined reviewer column.
pub fn agreed_value(row: &ReconciledRow) -> Option<i32> {
    row.reviewer_values().next()
}

/// Rows an admin may select for a bulk copy.
pub fn is_bulk_eligible(row: &ReconciledRow) -> bool {
    !row.is_validated() && is_non_disputed(row)
}

pub fn bulk_candidates(rows: &[ReconciledRow]) -> Vec<AdministrationId> {
    rows.iter()
        .filter(|r| is_bulk_eligible(r))
        .map(|r| r.administration_id)
        .collect()
}

/// Current validated category per region: the row value when the region
/// is in view, else the last server-known value.
fn prior_values(
    rows: &[ReconciledRow],
    baseline: &[ValidatedValue],
) -> HashMap<AdministrationId, Option<i32>> {
    let mut prior: HashMap<AdministrationId, Option<i32>> = baseline
        .iter()
        .map(|v| (v.administration_id, v.category))
        .collect();
    for row in rows {
        prior.insert(row.administration_id, row.category);
    }
    prior
}

/// Full-roster payload changing one region (`None` clears it).
pub fn single_edit_payload(
    regions: &[AdministrativeRegion],
    rows: &[ReconciledRow],
    baseline: &[ValidatedValue],
    target: AdministrationId,
    category: Option<i32>,
) -> ValidatedValuesUpdate {
    let prior = prior_values(rows, baseline);
    let validated_values = regions
        .iter()
        .map(|region| {
            let id = region.administration_id;
            ValidatedValue {
                administration_id: id,
                category: if id == target {
                    category
                } else {
                    prior.get(&id).copied().flatten()
                },
            }
        })
        .collect();
    ValidatedValuesUpdate { validated_values }
}

/// Full-roster payload copying the agreed reviewer value into every
/// selected region. Eligibility is not re-checked here.
pub fn bulk_copy_payload(
    regions: &[AdministrativeRegion],
    rows: &[ReconciledRow],
    baseline: &[ValidatedValue],
    selected: &[AdministrationId],
) -> ValidatedValuesUpdate {
    let prior = prior_values(rows, baseline);
    let copies: HashMap<AdministrationId, Option<i32>> = rows
        .iter()
        .filter(|r| selected.contains(&r.administration_id))
        .map(|r| (r.administration_id, agreed_value(r)))
        .collect();

    let validated_values = regions
        .iter()
        .map(|region| {
            let id = region.administration_id;
            let category = match copies.get(&id) {
                Some(copied) => *copied,
                None => prior.get(&id).copied().flatten(),
            };
            ValidatedValue { administration_id: id, category }
        })
        .collect();
    ValidatedValuesUpdate { validated_values }
}

/// Refresh local rows from the server's returned validated values.
pub fn apply_validated(rows: &mut [ReconciledRow], returned: &[ValidatedValue]) {
    let by_id: HashMap<AdministrationId, Option<i32>> = returned
        .iter()
        .map(|v| (v.administration_id, v.category))
        .collect();
    for row in rows.iter_mut() {
        if let Some(category) = by_id.get(&row.administration_id) {
            row.category = *category;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CommentMeta, ReviewerCell};
    use std::collections::BTreeMap;

    fn row(
        id: AdministrationId,
        category: Option<i32>,
        reviewer_values: &[Option<i32>],
    ) -> ReconciledRow {
        let reviews = reviewer_values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let cell = ReviewerCell {
                    category: *v,
                    comment: CommentMeta {
                        user: format!("r{i}"),
                        twg: None,
                        comment: None,
                        category: *v,
                    },
                };
                (i as i64 + 1, cell)
            })
            .collect::<BTreeMap<_, _>>();
        ReconciledRow {
            administration_id: id,
            name: format!("Region {id}"),
            initial_category: None,
            category,
            reviews,
        }
    }

    fn roster(n: i64) -> Vec<AdministrativeRegion> {
        (1..=n)
            .map(|id| AdministrativeRegion { administration_id: id, name: format!("Region {id}") })
            .collect()
    }

    #[test]
    fn dispute_ignores_missing_values() {
        assert!(is_non_disputed(&row(1, None, &[Some(2), Some(2)])));
        assert!(is_non_disputed(&row(1, None, &[None, Some(2)])));
        assert!(!is_non_disputed(&row(1, None, &[Some(1), Some(2)])));
    }

    #[test]
    fn validated_rows_are_not_bulk_candidates() {
        let rows = vec![
            row(1, None, &[Some(2), Some(2)]),
            row(2, Some(0), &[Some(2), Some(2)]),
            row(3, None, &[Some(1), Some(3)]),
        ];
        assert_eq!(bulk_candidates(&rows), vec![1]);
    }

    #[test]
    fn bulk_payload_covers_whole_roster() {
        let regions = roster(5);
        let rows = vec![
            row(1, None, &[Some(2), Some(2)]),
            row(2, Some(4), &[Some(3), Some(4)]),
            row(3, None, &[None, Some(1)]),
        ];
        let baseline = vec![ValidatedValue { administration_id: 5, category: Some(0) }];
        let payload = bulk_copy_payload(&regions, &rows, &baseline, &[1, 3]);

        assert_eq!(payload.validated_values.len(), 5);
        assert_eq!(payload.category(1), Some(2));
        assert_eq!(payload.category(2), Some(4));
        assert_eq!(payload.category(3), Some(1));
        assert_eq!(payload.category(4), None);
        assert_eq!(payload.category(5), Some(0));
    }

    #[test]
    fn single_edit_only_changes_target() {
        let regions = roster(3);
        let rows = vec![row(1, Some(1), &[Some(1)]), row(2, Some(2), &[Some(2)])];
        let payload = single_edit_payload(&regions, &rows, &[], 2, None);
        assert_eq!(payload.validated_values.len(), 3);
        assert_eq!(payload.category(1), Some(1));
        assert_eq!(payload.category(2), None);
        assert_eq!(payload.category(3), None);

        let payload = single_edit_payload(&regions, &rows, &[], 3, Some(5));
        assert_eq!(payload.category(3), Some(5));
    }

    #[test]
    fn row_state_overrides_stale_baseline() {
        let regions = roster(1);
        let rows = vec![row(1, None, &[Some(1)])];
        let baseline = vec![ValidatedValue { administration_id: 1, category: Some(3) }];
        let payload = bulk_copy_payload(&regions, &rows, &baseline, &[]);
        assert_eq!(payload.category(1), None);
    }

    #[test]
    fn apply_validated_updates_rows_in_view() {
        let mut rows = vec![row(1, None, &[Some(1)]), row(2, Some(2), &[Some(2)])];
        apply_validated(
            &mut rows,
            &[
                ValidatedValue { administration_id: 1, category: Some(1) },
                ValidatedValue { administration_id: 9, category: Some(4) },
            ],
        );
        assert_eq!(rows[0].category, Some(1));
        assert_eq!(rows[1].category, Some(2));
    }

    #[test]
    fn publish_body_and_confirmation() {
        let body = PublishRequest::new(Some("Dry month".into()), None);
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"bulletin_url": null, "narrative": "Dry month", "status": 3})
        );
        let mut returned: Publication =
            serde_json::from_value(serde_json::json!({"id": 1, "status": 2})).unwrap();
        assert!(!PublishRequest::confirmed(&returned));
        returned.status = Some(3);
        assert!(PublishRequest::confirmed(&returned));
    }

    #[test]
    fn filter_query_params() {
        let f = ReviewFilter { non_disputed: true, non_validated: false };
        assert_eq!(f.query(), [("non_disputed", "true"), ("non_validated", "false")]);
        assert!(ReviewFilter::default().is_empty());
    }
}
