//! Admin publication commands: list, create, review.

use edm_core::{NewPublication, SuggestionValue, Subject};

use crate::context::Context;
use crate::review::{category_text, name_of};
use crate::{print_json, util, CliError};

const PUBLICATION: &str = "Publication";
const REVIEW: &str = "Review";

pub struct CreateArgs {
    pub cdi_geonode_id: i64,
    pub year_month: String,
    pub due_date: String,
    pub reviewers: Vec<i64>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub download_url: Option<String>,
}

// ── List ────────────────────────────────────────────────────────────

pub fn cmd_list(ctx: &Context, page: u32, json: bool) -> Result<(), CliError> {
    let session = ctx.session()?;
    session.require("read", &Subject::Type(PUBLICATION))?;

    let page = session.client.publications(page.max(1))?;
    if json {
        return print_json(&page);
    }

    let headers = ["ID", "Period", "Status", "Due", "Regions"].map(String::from).to_vec();
    let rows: Vec<Vec<String>> = page
        .data
        .iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                p.period_label(),
                p.status().map(|s| s.label()).unwrap_or("-").to_string(),
                p.due_date.clone().unwrap_or_default(),
                p.initial_values.len().to_string(),
            ]
        })
        .collect();
    print!("{}", util::render_table(&headers, &rows, 24));
    println!();
    println!("Page {} of {} ({} publications)", page.current, page.total_page.max(1), page.total);
    if page.has_next() {
        eprintln!("More: edm publication list --page {}", page.current + 1);
    }
    Ok(())
}

// ── Create ──────────────────────────────────────────────────────────

pub fn cmd_create(ctx: &Context, args: CreateArgs) -> Result<(), CliError> {
    let today = chrono::Local::now().date_naive();
    let request = NewPublication::new(
        args.cdi_geonode_id,
        &args.year_month,
        &args.due_date,
        args.reviewers,
        today,
    )?
    .with_mail(args.subject, args.message)
    .with_download_url(args.download_url);

    let session = ctx.session()?;
    session.require("create", &Subject::Type(PUBLICATION))?;

    let stored = session.client.create_publication(&request)?;
    eprintln!(
        "Created publication {} for {}, {} reviewer(s) notified, due {}",
        stored.id,
        stored.period_label(),
        request.reviewers.len(),
        request.due_date,
    );
    println!("{}", stored.id);
    Ok(())
}

// ── Review ──────────────────────────────────────────────────────────

pub fn cmd_review(ctx: &Context, id: i64, json: bool) -> Result<(), CliError> {
    let session = ctx.session()?;
    session.require("read", &Subject::Type(REVIEW))?;

    let details = session.client.publication_review(id)?;
    if json {
        return print_json(&details);
    }

    let regions = ctx.regions_if_configured()?;
    let publication = details.publication.as_ref();
    let period = publication.and_then(|p| p.year_month.as_deref()).unwrap_or("-");
    let state = match &details.completed_at {
        Some(at) => format!("submitted {at}"),
        None => "open".to_string(),
    };
    println!("Review {} by {} for {period}, {state}", details.id, details.user.display());
    if let Some(twg) = &details.user.technical_working_group {
        println!("Working group: {twg}");
    }
    println!("Progress: {}", details.progress());
    println!();

    let computed = |region: i64| -> Option<i32> {
        publication
            .and_then(|p| p.initial_values.iter().find(|v| v.administration_id == region))
            .and_then(|v| v.category)
    };

    let headers = ["Region", "Computed", "Suggested", "Reviewed", "Comment"]
        .map(String::from)
        .to_vec();
    let mut values: Vec<SuggestionValue> = details.values();
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
