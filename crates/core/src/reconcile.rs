use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::model::{
    AdministrationId, AdministrativeRegion, CommentMeta, Publication, ReconciledRow, Reviewer,
    ReviewerCell, ReviewerSuggestion, SuggestionValue, UserId,
};

/// Merge the region roster with reviewer suggestions and publication values.
///
/// Returns one row per region that at least one reviewer contributed a
/// category to, sorted by name (case-insensitive). Regions nobody has
/// reviewed are dropped. Pure: identical inputs give identical output.
pub fn reconcile(
    regions: &[AdministrativeRegion],
    suggestions: &[ReviewerSuggestion],
    reviewers: &[Reviewer],
    publication: &Publication,
) -> Vec<ReconciledRow> {
    // First match wins, same as a linear find over the suggestion list.
    let mut by_key: HashMap<(UserId, AdministrationId), &SuggestionValue> = HashMap::new();
    for s in suggestions {
        by_key
            .entry((s.user_id, s.suggestion.administration_id))
            .or_insert(&s.suggestion);
    }

    let mut rows: Vec<ReconciledRow> = regions
        .iter()
        .map(|region| {
            let id = region.administration_id;
            let reviews = reviewers
                .iter()
                .map(|reviewer| {
                    let found = by_key.get(&(reviewer.id, id));
                    let category = found.and_then(|s| s.category);
                    let cell = ReviewerCell {
                        category,
                        comment: CommentMeta {
                            user: reviewer.display(),
                            twg: reviewer.technical_working_group.clone(),
                            comment: found.and_then(|s| s.comment.clone()),
                            category,
                        },
                    };
                    (reviewer.id, cell)
                })
                .collect::<BTreeMap<_, _>>();

            ReconciledRow {
                administration_id: id,
                name: region.name.clone(),
                initial_category: publication.initial_category(id),
                category: publication.validated_category(id),
                reviews,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        compare_names(&a.name, &b.name).then(a.administration_id.cmp(&b.administration_id))
    });
    rows.retain(ReconciledRow::has_contribution);

    log::debug!(
        "reconciled {} of {} regions across {} reviewer(s)",
        rows.len(),
        regions.len(),
        reviewers.len()
    );
    rows
}

/// Case-insensitive name order, raw name as tie-break.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InitialValue;

    fn region(id: AdministrationId, name: &str) -> AdministrativeRegion {
        AdministrativeRegion { administration_id: id, name: name.into() }
    }

    fn reviewer(id: UserId, name: &str) -> Reviewer {
        Reviewer {
            id,
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            technical_working_group: Some(format!("TWG {id}")),
        }
    }

    fn suggestion(
        user_id: UserId,
        region: AdministrationId,
        category: Option<i32>,
    ) -> ReviewerSuggestion {
        ReviewerSuggestion {
            user_id,
            suggestion: SuggestionValue {
                administration_id: region,
                category,
                comment: None,
                reviewed: true,
                value: None,
            },
        }
    }

    fn publication() -> Publication {
        Publication {
            id: 1,
            year_month: Some("2025-01".into()),
            initial_values: vec![
                InitialValue { administration_id: 1, category: Some(2), value: Some(12.0) },
                InitialValue { administration_id: 2, category: Some(1), value: None },
            ],
            validated_values: vec![],
            status: Some(2),
            due_date: None,
            narrative: None,
            bulletin_url: None,
            published_at: None,
        }
    }

    #[test]
    fn empty_reviewers_yield_no_rows() {
        let regions = vec![region(1, "Mbabane"), region(2, "Lobamba")];
        assert!(reconcile(&regions, &[], &[], &publication()).is_empty());
    }

    #[test]
    fn sorted_case_insensitively() {
        let regions = vec![region(1, "zombodze"), region(2, "Hhukwini"), region(3, "lobamba")];
        let reviewers = vec![reviewer(10, "Ann")];
        let suggestions = vec![
            suggestion(10, 1, Some(1)),
            suggestion(10, 2, Some(1)),
            suggestion(10, 3, Some(1)),
        ];
        let rows = reconcile(&regions, &suggestions, &reviewers, &publication());
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Hhukwini", "lobamba", "zombodze"]);
    }

    #[test]
    fn comment_meta_present_even_without_suggestion() {
        let regions = vec![region(1, "Mbabane")];
        let reviewers = vec![reviewer(10, "Ann"), reviewer(11, "Bo")];
        let suggestions = vec![suggestion(10, 1, Some(3))];
        let rows = reconcile(&regions, &suggestions, &reviewers, &publication());
        assert_eq!(rows.len(), 1);

        let missing = &rows[0].reviews[&11];
        assert_eq!(missing.category, None);
        assert_eq!(missing.comment.user, "Bo (bo@example.com)");
        assert_eq!(missing.comment.twg.as_deref(), Some("TWG 11"));
        assert_eq!(missing.comment.comment, None);
    }

    #[test]
    fn suggestion_without_category_is_not_a_contribution() {
        let regions = vec![region(1, "Mbabane")];
        let reviewers = vec![reviewer(10, "Ann")];
        let suggestions = vec![suggestion(10, 1, None)];
        assert!(reconcile(&regions, &suggestions, &reviewers, &publication()).is_empty());
    }

    #[test]
    fn suggestions_from_unknown_users_are_ignored() {
        let regions = vec![region(1, "Mbabane")];
        let reviewers = vec![reviewer(10, "Ann")];
        let suggestions = vec![suggestion(99, 1, Some(2))];
        assert!(reconcile(&regions, &suggestions, &reviewers, &publication()).is_empty());
    }

    #[test]
    fn validated_category_is_carried() {
        let regions = vec![region(2, "Lobamba")];
        let reviewers = vec![reviewer(10, "Ann")];
        let suggestions = vec![suggestion(10, 2, Some(1))];
        let mut p = publication();
        p.validated_values =
            vec![crate::model::ValidatedValue { administration_id: 2, category: Some(0) }];
        let rows = reconcile(&regions, &suggestions, &reviewers, &p);
        assert_eq!(rows[0].category, Some(0));
        assert_eq!(rows[0].initial_category, Some(1));
    }
}
