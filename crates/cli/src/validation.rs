//! Admin validation commands: show, set, bulk, map, publish.

use std::path::PathBuf;

use edm_core::presentation::{map_styles, validation_table, MapLayer, MapStyle, TableCell};
use edm_core::regions::RegionDataset;
use edm_core::validation::{
    apply_validated, bulk_copy_payload, single_edit_payload, PublishRequest, ReviewFilter,
};
use edm_core::{
    category::label_of, DroughtCategory, Publication, PublicationReviews, ReconciledRow,
    SelectionState, Subject,
};

use crate::context::{Context, Session};
use crate::exit_codes::*;
use crate::{parse_category, print_json, util, CliError};

const PUBLICATION: &str = "Publication";

/// Everything a validation command works from.
struct Loaded {
    dataset: RegionDataset,
    publication: Publication,
    reviews: PublicationReviews,
    rows: Vec<ReconciledRow>,
}

fn load(
    ctx: &Context,
    session: &Session,
    id: i64,
    filter: &ReviewFilter,
) -> Result<Loaded, CliError> {
    let dataset = ctx.regions()?;
    let publication = session.client.publication(id)?;
    let reviews = session.client.publication_reviews(id, filter)?;
    let rows =
        edm_core::reconcile(dataset.regions(), &reviews.reviews, &reviews.users, &publication);
    log::debug!(
        "publication {id}: {} suggestions from {} reviewers, {} rows",
        reviews.reviews.len(),
        reviews.users.len(),
        rows.len()
    );
    Ok(Loaded { dataset, publication, reviews, rows })
}

fn short(cell: &TableCell) -> String {
    cell.category
        .map(|c| match DroughtCategory::from_code(c) {
            Some(cat) => cat.name().to_string(),
            None => c.to_string(),
        })
        .unwrap_or_default()
}

fn describe(category: Option<i32>) -> String {
    match category {
        Some(c) => label_of(Some(c)).map(String::from).unwrap_or_else(|| c.to_string()),
        None => "(cleared)".to_string(),
    }
}

fn region_name(dataset: &RegionDataset, id: i64) -> String {
    dataset
        .region(id)
        .map(|r| r.name.clone())
        .unwrap_or_else(|_| id.to_string())
}

/// Write the styled dataset to `output`, or stdout when `None`.
pub(crate) fn write_map(
    dataset: &RegionDataset,
    styles: &[MapStyle],
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let text = serde_json::to_string(&dataset.styled(styles))
        .map_err(|e| CliError::io(format!("cannot serialize map: {e}")))?;
    match output {
        Some(path) => {
            std::fs::write(&path, text)
                .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
            eprintln!("Wrote {} region(s) to {}", styles.len(), path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

/// Redraw the validated layer when the selection asked for it.
fn refresh_map(
    loaded: &Loaded,
    selection: &mut SelectionState,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let Some(path) = output else {
        return Ok(());
    };
    if !selection.take_map_refresh() {
        return Ok(());
    }
    let styles = map_styles(
        loaded.dataset.regions(),
        &loaded.publication,
        &loaded.rows,
        MapLayer::Validated,
        Some(selection),
    );
    write_map(&loaded.dataset, &styles, Some(path))
}

// ── Show ────────────────────────────────────────────────────────────

pub fn cmd_show(
    ctx: &Context,
    id: i64,
    non_disputed: bool,
    non_validated: bool,
    search: Option<String>,
    json: bool,
) -> Result<(), CliError> {
    let session = ctx.session()?;
    session.require("read", &Subject::Type(PUBLICATION))?;

    let filter = ReviewFilter { non_disputed, non_validated };
    let loaded = load(ctx, &session, id, &filter)?;
    let table = validation_table(&loaded.rows, &loaded.reviews.users, search.as_deref());

    if json {
        return print_json(&table);
    }

    let status = loaded.publication.status().map(|s| s.label()).unwrap_or("Unknown");
    println!("CDI validation for {} ({status})", loaded.publication.period_label());
    println!();

    let mut headers: Vec<String> = vec![String::new()];
    headers.extend(table.columns.iter().map(|c| c.title.clone()));
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| {
            let marker = if row.selectable { "*" } else { "" };
            let mut cells = vec![
                marker.to_string(),
                row.name.clone(),
                short(&row.initial),
                short(&row.validated),
            ];
            cells.extend(row.reviewers.iter().map(short));
            cells
        })
        .collect();
    print!("{}", util::render_table(&headers, &rows, 24));

    let eligible = table.rows.iter().filter(|r| r.selectable).count();
    println!();
    println!(
        "{} region(s), {} validated, {eligible} eligible for bulk copy (*)",
        table.rows.len(),
        table.rows.iter().filter(|r| r.is_validated).count()
    );
    Ok(())
}

// ── Set ─────────────────────────────────────────────────────────────

pub fn cmd_set(
    ctx: &Context,
    id: i64,
    region: i64,
    category: &str,
    map: Option<PathBuf>,
) -> Result<(), CliError> {
    let category = match parse_category(category)? {
        Some(DroughtCategory::NoData) => {
            return Err(CliError::usage("No Data is not a selectable validated value"));
        }
        other => other.map(|c| c.code()),
    };

    let session = ctx.session()?;
    session.require("update", &Subject::Type(PUBLICATION))?;

    let mut loaded = load(ctx, &session, id, &ReviewFilter::default())?;
    loaded.dataset.region(region)?;
    let mut selection = SelectionState::new();
    selection.set_active(region);

    let payload = single_edit_payload(
        loaded.dataset.regions(),
        &loaded.rows,
        &loaded.publication.validated_values,
        region,
        category,
    );
    let stored = session.client.update_validated_values(id, &payload)?;
    apply_validated(&mut loaded.rows, &stored.validated_values);
    loaded.publication.validated_values = stored.validated_values.clone();
    selection.request_map_refresh();

    let now = loaded
        .rows
        .iter()
        .find(|r| r.administration_id == region)
        .map(|r| r.category)
        .unwrap_or_else(|| stored.validated_category(region));
    eprintln!("{}: {}", region_name(&loaded.dataset, region), describe(now));
    refresh_map(&loaded, &mut selection, map)
}

// ── Bulk ────────────────────────────────────────────────────────────

pub struct BulkArgs {
    pub region_ids: Vec<i64>,
    pub all: bool,
    pub skip: Vec<i64>,
    pub dry_run: bool,
    pub map: Option<PathBuf>,
}

pub fn cmd_bulk(ctx: &Context, id: i64, args: BulkArgs) -> Result<(), CliError> {
    let session = ctx.session()?;
    session.require("update", &Subject::Type(PUBLICATION))?;

    let mut loaded = load(ctx, &session, id, &ReviewFilter::default())?;

    let mut selection = SelectionState::new();
    if args.all {
        selection.set_bulk_mode(true, &loaded.rows);
        for region in &args.skip {
            loaded.dataset.region(*region)?;
            selection.remove(*region);
        }
    } else {
        selection.add_eligible(&args.region_ids, &loaded.rows)?;
    }

    let selected = selection.selected();
    if selected.is_empty() {
        eprintln!("No non-disputed, unvalidated regions to copy");
        return Ok(());
    }

    let payload = bulk_copy_payload(
        loaded.dataset.regions(),
        &loaded.rows,
        &loaded.publication.validated_values,
        &selected,
    );

    if args.dry_run {
        for region in &selected {
            let name = region_name(&loaded.dataset, *region);
            println!("{name}\t{}", describe(payload.category(*region)));
        }
        eprintln!("Dry run: {} region(s) would be copied", selected.len());
        return Ok(());
    }

    let stored = session.client.update_validated_values(id, &payload)?;
    apply_validated(&mut loaded.rows, &stored.validated_values);
    loaded.publication.validated_values = stored.validated_values;
    selection.request_map_refresh();

    let copied = loaded
        .rows
        .iter()
        .filter(|r| selected.contains(&r.administration_id) && r.is_validated())
        .count();
    eprintln!("Copied reviewer values into {copied} of {} region(s)", selected.len());
    refresh_map(&loaded, &mut selection, args.map)
}

// ── Map ─────────────────────────────────────────────────────────────

pub fn cmd_map(
    ctx: &Context,
    id: i64,
    layer: &str,
    output: Option<PathBuf>,
    highlight: Vec<i64>,
    focus: Option<i64>,
) -> Result<(), CliError> {
    let layer: MapLayer = layer.parse()?;

    let session = ctx.session()?;
    session.require("read", &Subject::Type(PUBLICATION))?;

    let loaded = load(ctx, &session, id, &ReviewFilter::default())?;
    if let MapLayer::Reviewer(user) = layer {
        if !loaded.reviews.users.iter().any(|u| u.id == user) {
            return Err(CliError::usage(format!("no reviewer {user} on publication {id}")));
        }
    }

    let mut selection = SelectionState::new();
    for region in highlight {
        loaded.dataset.region(region)?;
        selection.add(region);
    }
    if let Some(region) = focus {
        loaded.dataset.region(region)?;
        selection.set_active(region);
    }

    let styles = map_styles(
        loaded.dataset.regions(),
        &loaded.publication,
        &loaded.rows,
        layer,
        Some(&selection),
    );
    write_map(&loaded.dataset, &styles, output)
}

// ── Publish ─────────────────────────────────────────────────────────

pub fn cmd_publish(
    ctx: &Context,
    id: i64,
    narrative: Option<String>,
    bulletin_url: Option<String>,
) -> Result<(), CliError> {
    let session = ctx.session()?;
    session.require("update", &Subject::Type(PUBLICATION))?;

    let request = PublishRequest::new(narrative, bulletin_url);
    let stored = session.client.publish(id, &request)?;
    if !PublishRequest::confirmed(&stored) {
        return Err(CliError {
            code: EXIT_API_PUBLISH_UNCONFIRMED,
            message: "[ADM-P-3] Please report this issue along with the code.".into(),
            hint: None,
        });
    }

    eprintln!("Published {}", stored.period_label());
    Ok(())
}
