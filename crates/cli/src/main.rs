// Drought monitor CLI - review reconciliation, validation and publishing
// against the drought monitor backend

mod account;
mod browse;
mod context;
mod exit_codes;
mod publication;
mod review;
mod util;
mod validation;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use edm_client::ClientError;
use edm_config::Settings;
use edm_core::category::legend;
use edm_core::{CoreError, DroughtCategory};

use exit_codes::{client_exit_code, core_exit_code, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "edm")]
#[command(about = "Eswatini Drought Monitor: reconcile reviews, validate and publish CDI maps")]
#[command(version)]
struct Cli {
    /// Region boundary dataset (GeoJSON or TopoJSON); overrides EDM_REGIONS and config
    #[arg(long, global = true, value_name = "PATH")]
    regions: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session token
    #[command(after_help = "\
Examples:
  edm login --email admin@example.org
  EDM_PASSWORD=... edm login --email admin@example.org --api-base https://edm.example.org/api/v1")]
    Login {
        #[arg(long, env = "EDM_EMAIL")]
        email: Option<String>,

        /// Read from EDM_PASSWORD, else prompted on a terminal
        #[arg(long, env = "EDM_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Backend API root (defaults to config / EDM_API_BASE)
        #[arg(long)]
        api_base: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in account and its grants
    Whoami {
        #[arg(long)]
        json: bool,
    },

    /// Print the drought category legend
    #[command(after_help = "\
Examples:
  edm categories
  edm categories --public --json")]
    Categories {
        #[arg(long)]
        json: bool,

        /// Drop the \"No Data\" entry, as on public maps
        #[arg(long)]
        public: bool,
    },

    /// Admin management of publications and review assignments
    #[command(subcommand)]
    Publication(PublicationCommands),

    /// Admin validation of a publication's reviewed values
    #[command(subcommand)]
    Validation(ValidationCommands),

    /// Reviewer work on an assigned review
    #[command(subcommand)]
    Review(ReviewCommands),

    /// List published CDI maps (no login needed)
    Browse {
        #[arg(long)]
        json: bool,
    },

    /// Write a published CDI map as a styled choropleth (no login needed)
    #[command(after_help = "\
Examples:
  edm map -o latest.geojson
  edm map 4 --regions tinkhundla.topojson")]
    Map {
        /// Publication id from `edm browse`; defaults to the latest
        publication: Option<i64>,

        /// Output file (omit for stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum PublicationCommands {
    /// Publications with status and due date
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long)]
        json: bool,
    },

    /// Open a month for review and notify the reviewers
    #[command(after_help = "\
Examples:
  edm publication create --geonode 9 --year-month 2025-01 --due-date 2025-02-10 \\
      --reviewer 21 --reviewer 22
  edm publication create --geonode 9 --year-month 2025-01 --due-date 2025-02-10 \\
      --reviewer 21 --subject \"January CDI review\"")]
    Create {
        /// GeoNode dataset holding the computed CDI raster
        #[arg(long = "geonode", value_name = "ID")]
        cdi_geonode_id: i64,

        /// Month under review, YYYY-MM
        #[arg(long)]
        year_month: String,

        /// Review deadline, YYYY-MM-DD (today or later)
        #[arg(long)]
        due_date: String,

        /// Reviewer user id (repeatable, at least one)
        #[arg(long = "reviewer", value_name = "ID", required = true)]
        reviewers: Vec<i64>,

        /// Notification subject
        #[arg(long)]
        subject: Option<String>,

        /// Notification body (HTML, with {{reviewer_name}}, {{year_month}}, {{due_date}})
        #[arg(long)]
        message: Option<String>,

        #[arg(long)]
        download_url: Option<String>,
    },

    /// One reviewer's assignment: progress and suggestions
    Review {
        review: i64,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ValidationCommands {
    /// Reconciled table: computed, validated and every reviewer's value
    #[command(after_help = "\
Examples:
  edm validation show 4
  edm validation show 4 --non-disputed --non-validated
  edm validation show 4 --search mba --json")]
    Show {
        publication: i64,

        /// Only regions where reviewers agree (server-side filter)
        #[arg(long)]
        non_disputed: bool,

        /// Only regions without a validated value (server-side filter)
        #[arg(long)]
        non_validated: bool,

        /// Case-insensitive substring on the inkhundla name
        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Set or clear one region's validated value
    #[command(after_help = "\
Examples:
  edm validation set 4 1253001 d2
  edm validation set 4 1253001 3
  edm validation set 4 1253001 clear")]
    Set {
        publication: i64,
        region: i64,
        /// normal, d0-d4, a numeric code, or `clear`
        category: String,

        /// Redraw the validated map to this file after the update
        #[arg(long, value_name = "PATH")]
        map: Option<PathBuf>,
    },

    /// Copy the agreed reviewer value into non-disputed, unvalidated regions
    #[command(after_help = "\
Examples:
  edm validation bulk 4 --all
  edm validation bulk 4 --region 1253002 --region 1253007
  edm validation bulk 4 --all --skip 1253005 --map validated.geojson
  edm validation bulk 4 --all --dry-run")]
    Bulk {
        publication: i64,

        /// Region to copy (repeatable)
        #[arg(
            long = "region",
            value_name = "ID",
            required_unless_present = "all",
            conflicts_with = "all"
        )]
        region_ids: Vec<i64>,

        /// Every eligible region
        #[arg(long)]
        all: bool,

        /// Leave a region out of `--all` (repeatable)
        #[arg(long, value_name = "ID", requires = "all")]
        skip: Vec<i64>,

        /// Print the change without sending it
        #[arg(long)]
        dry_run: bool,

        /// Redraw the validated map to this file after the update
        #[arg(long, value_name = "PATH", conflicts_with = "dry_run")]
        map: Option<PathBuf>,
    },

    /// Write a styled choropleth (GeoJSON/TopoJSON) for one layer
    #[command(after_help = "\
Examples:
  edm validation map 4 -o validated.geojson
  edm validation map 4 --layer computed
  edm validation map 4 --layer reviewer:21 --highlight 1253001
  edm validation map 4 --focus 1253004 -o focus.geojson")]
    Map {
        publication: i64,

        /// validated, computed or reviewer:<id>
        #[arg(long, default_value = "validated")]
        layer: String,

        /// Output file (omit for stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Regions drawn with a heavy outline (repeatable)
        #[arg(long, value_name = "ID")]
        highlight: Vec<i64>,

        /// Region under inspection, also outlined
        #[arg(long, value_name = "ID")]
        focus: Option<i64>,
    },

    /// Publish the bulletin
    Publish {
        publication: i64,

        #[arg(long)]
        narrative: Option<String>,

        #[arg(long)]
        bulletin_url: Option<String>,
    },
}

#[derive(Subcommand)]
enum ReviewCommands {
    /// Suggestion list with progress
    Show {
        review: i64,

        #[arg(long)]
        json: bool,
    },

    /// Review one region: approve the computed value or suggest another
    #[command(after_help = "\
Examples:
  edm review suggest 11 1253001
  edm review suggest 11 1253001 --category d2 --comment \"crop failure reported\"")]
    Suggest {
        review: i64,
        region: i64,

        /// Suggested category; omit to approve the computed value
        #[arg(long)]
        category: Option<String>,

        /// Required when the category differs
        #[arg(long)]
        comment: Option<String>,
    },

    /// Mark regions reviewed, keeping their current values
    Mark {
        review: i64,

        #[arg(id = "region_ids", value_name = "REGIONS", required = true)]
        regions: Vec<i64>,
    },

    /// Submit the review once every region is reviewed
    Submit { review: i64 },
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: exit_codes::EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: exit_codes::EXIT_ERROR, message: msg.into(), hint: None }
    }
}

impl From<ClientError> for CliError {
    fn from(err: ClientError) -> Self {
        let hint = match &err {
            ClientError::NotAuthenticated => Some("run `edm login` again".to_string()),
            ClientError::Network(_) => {
                Some("check api_base in config.toml or EDM_API_BASE".to_string())
            }
            _ => None,
        };
        Self { code: client_exit_code(&err), message: err.to_string(), hint }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let hint = match &err {
            CoreError::UnknownCategory(_) => {
                Some("use normal, d0, d1, d2, d3, d4, none or a numeric code".to_string())
            }
            CoreError::NotBulkEligible(_) => {
                Some("only unvalidated regions where reviewers agree can be bulk copied".into())
            }
            _ => None,
        };
        Self { code: core_exit_code(&err), message: err.to_string(), hint }
    }
}

/// `clear` clears; anything else must name a taxonomy category.
pub(crate) fn parse_category(arg: &str) -> Result<Option<DroughtCategory>, CliError> {
    if arg.eq_ignore_ascii_case("clear") {
        return Ok(None);
    }
    Ok(Some(DroughtCategory::from_name(arg)?))
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::io(format!("cannot serialize output: {e}")))?;
    println!("{text}");
    Ok(())
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("EDM_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    // A second init (tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn cmd_categories(json: bool, public: bool) -> Result<(), CliError> {
    let public = public || Settings::load().map(|s| s.public_legend).unwrap_or(false);
    let entries = legend(!public);
    if json {
        return print_json(&entries);
    }
    let headers = ["Code", "Name", "Label", "Color"].map(String::from).to_vec();
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|info| {
            let name = DroughtCategory::from_code(info.value)
                .map(|c| c.name())
                .unwrap_or_default();
            vec![
                info.value.to_string(),
                name.to_string(),
                info.label.to_string(),
                info.color.to_string(),
            ]
        })
        .collect();
    print!("{}", util::render_table(&headers, &rows, 40));
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Login { email, password, api_base } => {
            account::cmd_login(email, password, api_base)
        }
        Commands::Logout => account::cmd_logout(),
        Commands::Whoami { json } => account::cmd_whoami(json),
        Commands::Categories { json, public } => cmd_categories(json, public),
        Commands::Publication(cmd) => {
            let ctx = context::Context::load(cli.regions)?;
            match cmd {
                PublicationCommands::List { page, json } => {
                    publication::cmd_list(&ctx, page, json)
                }
                PublicationCommands::Create {
                    cdi_geonode_id,
                    year_month,
                    due_date,
                    reviewers,
                    subject,
                    message,
                    download_url,
                } => publication::cmd_create(
                    &ctx,
                    publication::CreateArgs {
                        cdi_geonode_id,
                        year_month,
                        due_date,
                        reviewers,
                        subject,
                        message,
                        download_url,
                    },
                ),
                PublicationCommands::Review { review, json } => {
                    publication::cmd_review(&ctx, review, json)
                }
            }
        }
        Commands::Validation(cmd) => {
            let ctx = context::Context::load(cli.regions)?;
            match cmd {
                ValidationCommands::Show {
                    publication,
                    non_disputed,
                    non_validated,
                    search,
                    json,
                } => validation::cmd_show(
                    &ctx,
                    publication,
                    non_disputed,
                    non_validated,
                    search,
                    json,
                ),
                ValidationCommands::Set { publication, region, category, map } => {
                    validation::cmd_set(&ctx, publication, region, &category, map)
                }
                ValidationCommands::Bulk { publication, region_ids, all, skip, dry_run, map } => {
                    let args = validation::BulkArgs { region_ids, all, skip, dry_run, map };
                    validation::cmd_bulk(&ctx, publication, args)
                }
                ValidationCommands::Map { publication, layer, output, highlight, focus } => {
                    validation::cmd_map(&ctx, publication, &layer, output, highlight, focus)
                }
                ValidationCommands::Publish { publication, narrative, bulletin_url } => {
                    validation::cmd_publish(&ctx, publication, narrative, bulletin_url)
                }
            }
        }
        Commands::Review(cmd) => {
            let ctx = context::Context::load(cli.regions)?;
            match cmd {
                ReviewCommands::Show { review, json } => review::cmd_show(&ctx, review, json),
                ReviewCommands::Suggest { review, region, category, comment } => {
                    review::cmd_suggest(&ctx, review, region, category, comment)
                }
                ReviewCommands::Mark { review, regions } => review::cmd_mark(&ctx, review, regions),
                ReviewCommands::Submit { review } => review::cmd_submit(&ctx, review),
            }
        }
        Commands::Browse { json } => {
            let ctx = context::Context::load(cli.regions)?;
            browse::cmd_browse(&ctx, json)
        }
        Commands::Map { publication, output } => {
            let ctx = context::Context::load(cli.regions)?;
            browse::cmd_map(&ctx, publication, output)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            log::debug!("exit {code}: {message}");
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}
