//! Public map commands: browse published periods, export a published map.

use std::path::PathBuf;

use edm_core::presentation::{map_styles, MapLayer};

use crate::context::Context;
use crate::exit_codes::EXIT_API_HTTP;
use crate::validation::write_map;
use crate::{print_json, util, CliError};

pub fn cmd_browse(ctx: &Context, json: bool) -> Result<(), CliError> {
    let client = ctx.public_client()?;
    let dates = client.dates()?;
    if json {
        return print_json(&dates);
    }
    if dates.is_empty() {
        eprintln!("No published maps");
        return Ok(());
    }

    let headers = ["ID", "Period"].map(String::from).to_vec();
    let rows: Vec<Vec<String>> = dates
        .iter()
        .map(|d| vec![d.value.to_string(), d.label.clone()])
        .collect();
    print!("{}", util::render_table(&headers, &rows, 40));
    Ok(())
}

/// Published validated values as a styled choropleth; defaults to the
/// latest published period.
pub fn cmd_map(ctx: &Context, id: Option<i64>, output: Option<PathBuf>) -> Result<(), CliError> {
    let dataset = ctx.regions()?;
    let client = ctx.public_client()?;

    let id = match id {
        Some(id) => id,
        None => client.dates()?.first().map(|d| d.value).ok_or_else(|| CliError {
            code: EXIT_API_HTTP,
            message: "no published maps".into(),
            hint: None,
        })?,
    };

    let published = client.published_map(id)?;
    log::debug!("published map {id}: {} validated values", published.validated_values.len());
    let styles = map_styles(dataset.regions(), &published, &[], MapLayer::Validated, None);
    write_map(&dataset, &styles, output)?;

    if let Some(narrative) = published.narrative.as_deref().filter(|n| !n.is_empty()) {
        eprintln!("{}: {narrative}", published.period_label());
    }
    Ok(())
}
