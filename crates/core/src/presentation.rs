//! Table and map view models built from reconciled rows.

use std::collections::HashMap;
use std::str::FromStr;

use serde::Serialize;

use crate::category::{color_of, label_of};
use crate::error::CoreError;
use crate::model::{
    AdministrationId, AdministrativeRegion, Publication, ReconciledRow, Reviewer, UserId,
};
use crate::selection::SelectionState;
use crate::validation::is_bulk_eligible;

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableColumn {
    pub key: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableCell {
    pub category: Option<i32>,
    pub label: Option<&'static str>,
    pub color: Option<&'static str>,
}

impl TableCell {
    pub fn new(category: Option<i32>) -> Self {
        Self { category, label: label_of(category), color: color_of(category) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub administration_id: AdministrationId,
    pub name: String,
    pub initial: TableCell,
    pub validated: TableCell,
    /// One per reviewer column, in column order.
    pub reviewers: Vec<TableCell>,
    /// Eligible for the bulk copy action.
    pub selectable: bool,
    /// Validated value set; drives the read/unread comment marker.
    pub is_validated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationTable {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<TableRow>,
}

/// Build the editable validation table. `search` keeps rows whose name
/// contains it, case-insensitive.
pub fn validation_table(
    rows: &[ReconciledRow],
    reviewers: &[Reviewer],
    search: Option<&str>,
) -> ValidationTable {
    let mut columns = vec![
        TableColumn { key: "name".into(), title: "Inkhundla".into() },
        TableColumn { key: "initial_category".into(), title: "Initial Value".into() },
        TableColumn { key: "category".into(), title: "Validated Value".into() },
    ];
    columns.extend(reviewers.iter().map(|r| TableColumn {
        key: r.id.to_string(),
        title: r.column_title().to_string(),
    }));

    let needle = search.map(str::trim).filter(|s| !s.is_empty()).map(str::to_lowercase);
    let rows = rows
        .iter()
        .filter(|row| match &needle {
            Some(n) => row.name.to_lowercase().contains(n.as_str()),
            None => true,
        })
        .map(|row| TableRow {
            administration_id: row.administration_id,
            name: row.name.clone(),
            initial: TableCell::new(row.initial_category),
            validated: TableCell::new(row.category),
            reviewers: reviewers
                .iter()
                .map(|r| TableCell::new(row.reviews.get(&r.id).and_then(|c| c.category)))
                .collect(),
            selectable: is_bulk_eligible(row),
            is_validated: row.is_validated(),
        })
        .collect();

    ValidationTable { columns, rows }
}

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

pub const STROKE_COLOR: &str = "#485D92";
pub const STROKE_OPACITY: f64 = 0.5;
pub const STROKE_WEIGHT: u32 = 2;
pub const FILL_OPACITY: f64 = 1.0;
const HIGHLIGHT_WEIGHT: u32 = 5;

/// Which value colors the choropleth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapLayer {
    Validated,
    Computed,
    Reviewer(UserId),
}

impl FromStr for MapLayer {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "validated" => Ok(Self::Validated),
            "computed" | "raw" => Ok(Self::Computed),
            other => other
                .strip_prefix("reviewer:")
                .and_then(|id| id.parse().ok())
                .map(Self::Reviewer)
                .ok_or_else(|| CoreError::UnknownLayer(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapStyle {
    pub administration_id: AdministrationId,
    pub category: Option<i32>,
    pub label: Option<&'static str>,
    pub fill_color: Option<&'static str>,
    pub stroke_color: &'static str,
    pub weight: u32,
    pub opacity: f64,
    pub fill_opacity: f64,
}

impl MapStyle {
    pub fn for_category(administration_id: AdministrationId, category: Option<i32>) -> Self {
        Self {
            administration_id,
            category,
            label: label_of(category),
            fill_color: color_of(category),
            stroke_color: STROKE_COLOR,
            weight: STROKE_WEIGHT,
            opacity: STROKE_OPACITY,
            fill_opacity: FILL_OPACITY,
        }
    }

    fn highlighted(mut self) -> Self {
        self.opacity = 1.0;
        self.weight = HIGHLIGHT_WEIGHT;
        self
    }
}

/// One style per roster region for the chosen layer. Regions without a
/// value get no fill.
pub fn map_styles(
    regions: &[AdministrativeRegion],
    publication: &Publication,
    rows: &[ReconciledRow],
    layer: MapLayer,
    selection: Option<&SelectionState>,
) -> Vec<MapStyle> {
    let by_id: HashMap<AdministrationId, &ReconciledRow> =
        rows.iter().map(|r| (r.administration_id, r)).collect();

    regions
        .iter()
        .map(|region| {
            let id = region.administration_id;
            let row = by_id.get(&id);
            let category = match layer {
                MapLayer::Computed => publication.initial_category(id),
                MapLayer::Validated => match row {
                    Some(row) => row.category,
                    None => publication.validated_category(id),
                },
                MapLayer::Reviewer(user) => row
                    .and_then(|r| r.reviews.get(&user))
                    .and_then(|cell| cell.category),
            };
            let style = MapStyle::for_category(id, category);
            match selection {
                Some(s) if s.is_highlighted(id) => style.highlighted(),
                _ => style,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InitialValue, ReviewerSuggestion, SuggestionValue, ValidatedValue};
    use crate::reconcile::reconcile;

    fn fixture() -> (Vec<AdministrativeRegion>, Vec<Reviewer>, Publication, Vec<ReconciledRow>) {
        let regions = vec![
            AdministrativeRegion { administration_id: 1, name: "Mbabane".into() },
            AdministrativeRegion { administration_id: 2, name: "Lobamba".into() },
            AdministrativeRegion { administration_id: 3, name: "Hhukwini".into() },
        ];
        let reviewers = vec![
            Reviewer {
                id: 7,
                name: "Ann".into(),
                email: "a@x".into(),
                technical_working_group: Some("MET".into()),
            },
            Reviewer {
                id: 8,
                name: "Bo".into(),
                email: "b@x".into(),
                technical_working_group: None,
            },
        ];
        let publication = Publication {
            id: 1,
            year_month: None,
            initial_values: vec![InitialValue {
                administration_id: 3,
                category: Some(5),
                value: None,
            }],
            validated_values: vec![ValidatedValue { administration_id: 3, category: Some(1) }],
            status: None,
            due_date: None,
            narrative: None,
            bulletin_url: None,
            published_at: None,
        };
        let s = |user_id, id, c| ReviewerSuggestion {
            user_id,
            suggestion: SuggestionValue {
                administration_id: id,
                category: Some(c),
                comment: None,
                reviewed: true,
                value: None,
            },
        };
        let suggestions = [s(7, 1, 2), s(8, 1, 3), s(8, 2, 0)];
        let rows = reconcile(&regions, &suggestions, &reviewers, &publication);
        (regions, reviewers, publication, rows)
    }

    #[test]
    fn table_has_one_column_per_reviewer() {
        let (_, reviewers, _, rows) = fixture();
        let table = validation_table(&rows, &reviewers, None);
        let titles: Vec<&str> = table.columns.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Inkhundla", "Initial Value", "Validated Value", "MET", "Bo"]);
        assert_eq!(table.rows.len(), 2);

        let lobamba = &table.rows[0];
        assert_eq!(lobamba.name, "Lobamba");
        assert!(lobamba.selectable);
        assert_eq!(lobamba.reviewers[0].category, None);
        assert_eq!(lobamba.reviewers[1].label, Some("Wet/normal conditions"));

        let mbabane = &table.rows[1];
        assert!(!mbabane.selectable);
        assert_eq!(mbabane.reviewers[0].color, Some("#fbd47f"));
    }

    #[test]
    fn table_search_is_case_insensitive() {
        let (_, reviewers, _, rows) = fixture();
        let table = validation_table(&rows, &reviewers, Some("MBA"));
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].administration_id, 1);
        assert_eq!(validation_table(&rows, &reviewers, Some("  ")).rows.len(), 2);
    }

    #[test]
    fn map_covers_every_region() {
        let (regions, _, publication, rows) = fixture();
        let styles = map_styles(&regions, &publication, &rows, MapLayer::Computed, None);
        assert_eq!(styles.len(), 3);
        assert_eq!(styles[2].fill_color, Some("#730000"));
        assert_eq!(styles[0].fill_color, None);

        let styles = map_styles(&regions, &publication, &rows, MapLayer::Validated, None);
        assert_eq!(styles[2].category, Some(1));

        let styles = map_styles(&regions, &publication, &rows, MapLayer::Reviewer(8), None);
        assert_eq!(styles[0].category, Some(3));
        assert_eq!(styles[1].category, Some(0));
    }

    #[test]
    fn selected_regions_are_highlighted() {
        let (regions, _, publication, rows) = fixture();
        let mut selection = SelectionState::new();
        selection.add(2);
        let styles =
            map_styles(&regions, &publication, &rows, MapLayer::Validated, Some(&selection));
        assert_eq!(styles[1].weight, 5);
        assert_eq!(styles[0].weight, STROKE_WEIGHT);
    }

    #[test]
    fn layer_names_parse() {
        assert_eq!("validated".parse::<MapLayer>().unwrap(), MapLayer::Validated);
        assert_eq!("raw".parse::<MapLayer>().unwrap(), MapLayer::Computed);
        assert_eq!("reviewer:12".parse::<MapLayer>().unwrap(), MapLayer::Reviewer(12));
        assert!("reviewer:x".parse::<MapLayer>().is_err());
    }
}
