//! Reviewer commands: show, suggest, mark, submit.

use edm_core::regions::RegionDataset;
use edm_core::review::{
    ensure_open, ensure_submittable, mark_reviewed, suggest, working_values,
    ReviewAssignment, ReviewCompletion, SuggestionUpdate,
};
use edm_core::{category::label_of, Subject, SuggestionValue};

use crate::context::{Context, Session};
use crate::exit_codes::*;
use crate::{parse_category, print_json, util, CliError};

const REVIEW: &str = "Review";

/// Fetch the review and check the cached grants against it as a record,
/// so owner-conditioned grants apply.
fn load(session: &Session, id: i64, action: &str) -> Result<ReviewAssignment, CliError> {
    let actor = session.actor().ok_or_else(|| CliError {
        code: EXIT_API_NOT_AUTH,
        message: "stored session has no user id".into(),
        hint: Some("run `edm login` again".into()),
    })?;
    let review = session.client.review(id)?;
    let fields = review.subject_fields(actor.id);
    session.require(action, &Subject::Entity { kind: REVIEW, fields: &fields })?;
    Ok(review)
}

pub(crate) fn name_of(regions: Option<&RegionDataset>, id: i64) -> String {
    regions
        .and_then(|d| d.region(id).ok())
        .map(|r| r.name.clone())
        .unwrap_or_else(|| id.to_string())
}

pub(crate) fn category_text(category: Option<i32>) -> String {
    category
        .map(|c| label_of(Some(c)).map(String::from).unwrap_or_else(|| c.to_string()))
        .unwrap_or_default()
}

fn print_progress(review: &ReviewAssignment) {
    let progress = review.progress();
    eprintln!("Review {}: {progress} reviewed, {} remaining", review.id, progress.remaining());
}

// ── Show ────────────────────────────────────────────────────────────

pub fn cmd_show(ctx: &Context, id: i64, json: bool) -> Result<(), CliError> {
    let session = ctx.session()?;
    let review = load(&session, id, "read")?;
    if json {
        return print_json(&review);
    }

    let regions = ctx.regions_if_configured()?;
    let publication = review.publication.as_ref();
    let period = publication.and_then(|p| p.year_month.as_deref()).unwrap_or("-");
    let due = publication.and_then(|p| p.due_date.as_deref()).unwrap_or("-");
    let state = match &review.completed_at {
        Some(at) if review.is_completed => format!("submitted {at}"),
        _ if review.is_completed => "submitted".to_string(),
        _ => "open".to_string(),
    };
    println!("Review {} for {period} (due {due}), {state}", review.id);
    println!("Progress: {}", review.progress());
    println!();

    let computed = |region: i64| -> Option<i32> {
        publication
            .and_then(|p| p.initial_values.iter().find(|v| v.administration_id == region))
            .and_then(|v| v.category)
    };

    let headers = ["Region", "Computed", "Suggested", "Reviewed", "Comment"]
        .map(String::from)
        .to_vec();
    let mut values: Vec<SuggestionValue> = working_values(&review);
    values.sort_by_key(|v| v.administration_id);
    let rows: Vec<Vec<String>> = values
        .iter()
        .map(|v| {
            vec![
                name_of(regions.as_ref(), v.administration_id),
                category_text(computed(v.administration_id)),
                category_text(v.category),
                if v.reviewed { "yes" } else { "" }.to_string(),
                v.comment.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print!("{}", util::render_table(&headers, &rows, 32));
    Ok(())
}

// ── Suggest ─────────────────────────────────────────────────────────

pub fn cmd_suggest(
    ctx: &Context,
    id: i64,
    region: i64,
    category: Option<String>,
    comment: Option<String>,
) -> Result<(), CliError> {
    let category = match category.as_deref() {
        Some(arg) => match parse_category(arg)? {
            Some(cat) => Some(cat.code()),
            None => return Err(CliError::usage("a suggestion cannot clear the category")),
        },
        None => None,
    };

    let session = ctx.session()?;
    let review = load(&session, id, "update")?;
    ensure_open(&review)?;

    let values = suggest(&working_values(&review), region, category, comment)?;
    let update = SuggestionUpdate { suggestion_values: values };
    let stored = session.client.update_suggestions(id, &update)?;
    print_progress(&stored);
    Ok(())
}

// ── Mark ────────────────────────────────────────────────────────────

pub fn cmd_mark(ctx: &Context, id: i64, regions: Vec<i64>) -> Result<(), CliError> {
    let session = ctx.session()?;
    let review = load(&session, id, "update")?;
    ensure_open(&review)?;

    let values = mark_reviewed(&working_values(&review), &regions)?;
    let update = SuggestionUpdate { suggestion_values: values };
    let stored = session.client.update_suggestions(id, &update)?;
    print_progress(&stored);
    Ok(())
}

// ── Submit ──────────────────────────────────────────────────────────

pub fn cmd_submit(ctx: &Context, id: i64) -> Result<(), CliError> {
    let session = ctx.session()?;
    let review = load(&session, id, "update")?;
    ensure_submittable(&review)?;

    let stored = session.client.complete_review(id, &ReviewCompletion::now())?;
    log::info!("review {id} submitted at {:?}", stored.completed_at);
    eprintln!("Submitted review {id}");
    Ok(())
}
