//! ecocat CLI
//!
//! Command-line front end for the environmental dataset catalogue:
//! - Log in / out, register, edit the profile
//! - List, filter and inspect datasets
//! - Print statistics and dashboard charts
//! - Export PDF reports
//! - Run GraphQL queries

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ecocat::chart::{dashboard_charts, statistics_charts};
use ecocat::config::{generate_default_config, Config};
use ecocat::export::{dashboard_report, dataset_sheet, statistics_report, Exporter, Report};
use ecocat::graphql::{self, DEFAULT_QUERY};
use ecocat::session::{AppStore, Resolution, Route, SessionGate, TokenStore};
use ecocat::views::{self, OutputFormat};
use ecocat::{
    filter_records, unique_organisations, CatalogClient, Credentials, DatasetRecord,
    FilterPredicate, OrganisationFilter, ProfileUpdate, Registration, StatisticsSummary,
};

#[derive(Parser)]
#[command(name = "ecocat")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Environmental dataset catalogue explorer")]
#[command(long_about = "ecocat browses a catalogue of harvested environmental datasets.\nFilter the catalogue, chart it by theme, source, organisation and date, and export PDF reports.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ~/.config/ecocat/config.toml, /etc/ecocat/config.toml, ./config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,
}

/// Search and organisation filters shared by several commands
#[derive(clap::Args, Clone, Default)]
pub struct FilterArgs {
    /// Case-insensitive text matched against titles
    #[arg(short, long)]
    pub search: Option<String>,

    /// Exact organisation name ("all" for every organisation)
    #[arg(short, long)]
    pub org: Option<String>,
}

impl FilterArgs {
    fn predicate(&self) -> FilterPredicate {
        FilterPredicate {
            search: self.search.clone().unwrap_or_default(),
            organisation: OrganisationFilter::from_input(self.org.as_deref()),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and remember the session
    Login {
        username: String,
        /// Password (prompted on stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Create an account
    Register {
        username: String,
        email: String,
        #[arg(short, long)]
        password: Option<String>,
        /// Password confirmation
        #[arg(long)]
        confirm: Option<String>,
    },

    /// Show who is logged in
    Whoami,

    /// Welcome page
    Home,

    /// List datasets
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// List organisations available as filters
    Orgs,

    /// Show one dataset
    Show { id: i64 },

    /// Charts by theme, source, organisation, year and season
    Stats {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Source and top-organisation overview
    Dashboard {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Write a PDF report
    Export {
        #[command(subcommand)]
        report: ExportTarget,

        /// Output directory (default: [report] output_dir)
        #[arg(short = 'd', long, global = true)]
        output_dir: Option<PathBuf>,
    },

    /// Show or edit the profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Run a GraphQL query
    Query {
        /// Query text (default: every dataset's id, title and organisation)
        query: Option<String>,
        /// Read the query from a file
        #[arg(long, conflicts_with = "query")]
        file: Option<PathBuf>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ExportTarget {
    /// dashboard-report.pdf
    Dashboard {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// statistics-report.pdf
    Stats {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// dataset-<id>-sheet.pdf
    Dataset { id: i64 },
}

#[derive(Subcommand)]
pub enum ProfileAction {
    Show,
    Update {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
}

impl Commands {
    /// View this command corresponds to, for the session gate
    fn route(&self) -> Option<Route> {
        match self {
            Commands::Login { .. } => Some(Route::Login),
            Commands::Register { .. } => Some(Route::Register),
            Commands::Home => Some(Route::Home),
            Commands::List { .. } | Commands::Orgs => Some(Route::Datasets),
            Commands::Show { id } => Some(Route::DatasetDetail(*id)),
            Commands::Stats { .. } => Some(Route::Statistics),
            Commands::Dashboard { .. } => Some(Route::Dashboard),
            Commands::Export { report, .. } => Some(match report {
                ExportTarget::Dashboard { .. } => Route::Dashboard,
                ExportTarget::Stats { .. } => Route::Statistics,
                ExportTarget::Dataset { id } => Route::DatasetDetail(*id),
            }),
            Commands::Profile { .. } => Some(Route::Profile),
            Commands::Query { .. } => Some(Route::Query),
            Commands::Logout | Commands::Whoami | Commands::Config { .. } => None,
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ecocat={}", config.logging.level)));

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn prompt(label: &str) -> anyhow::Result<String> {
    eprint!("{}: ", label);
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn print(output: &str) {
    print!("{}", output);
    if !output.ends_with('\n') {
        println!();
    }
}

fn summarize(config: &Config, visible: &[&DatasetRecord]) -> StatisticsSummary {
    StatisticsSummary::compute_now(visible, &config.categories)
}

/// Run an export off the async runtime
async fn export(exporter: Exporter, report: Report) -> anyhow::Result<PathBuf> {
    let path = tokio::task::spawn_blocking(move || exporter.export(&report))
        .await
        .context("Export task panicked")??;
    Ok(path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    init_tracing(&config);
    config.validate()?;

    if let Commands::Config { output } = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, content)
                    .with_context(|| format!("Cannot write {}", path.display()))?;
                println!("Config written to {}", path.display());
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let backend = Arc::new(CatalogClient::new(config.client_config())?);
    let store = AppStore::new(backend, TokenStore::new(config.data_dir()));
    let gate = SessionGate::new(store.auth());

    if let Some(route) = cli.command.route() {
        if let Resolution::Redirect(target) = gate.resolve(route) {
            tracing::debug!(%route, %target, "Redirected by session gate");
            bail!("Not logged in; run `ecocat login <username>` first");
        }
    }

    let format = cli.format;

    match cli.command {
        Commands::Login { username, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt("Password")?,
            };
            store.login(&Credentials::new(username.clone(), password)?).await?;
            println!("Logged in as {}", username);
        }

        Commands::Logout => {
            if store.is_authenticated() {
                store.logout()?;
                println!("Logged out");
            } else {
                println!("Not logged in");
            }
        }

        Commands::Register {
            username,
            email,
            password,
            confirm,
        } => {
            let password = match password {
                Some(p) => p,
                None => prompt("Password")?,
            };
            let confirm = match confirm {
                Some(c) => c,
                None => prompt("Confirm password")?,
            };
            let registration = Registration::new(username, email, password, &confirm)?;
            store.register(&registration).await?;
            println!(
                "Account {} created; log in with `ecocat login {}`",
                registration.username, registration.username
            );
        }

        Commands::Whoami => match store.auth_state().user {
            Some(user) if store.is_authenticated() => println!("{}", user),
            _ => println!("Not logged in"),
        },

        Commands::Home => {
            let records = store.fetch_datasets().await?;
            let user = store.auth_state().user;
            print(&views::render_home(
                user.as_deref(),
                records.len(),
                unique_organisations(&records).len(),
            ));
        }

        Commands::List { filter } => {
            let records = store.fetch_datasets().await?;
            let visible = filter_records(&records, &filter.predicate());
            print(&views::render_list(&visible, config.catalog.list_limit, format)?);
        }

        Commands::Orgs => {
            let records = store.fetch_datasets().await?;
            print(&views::render_organisations(&unique_organisations(&records), format)?);
        }

        Commands::Show { id } => {
            let record = store.fetch_dataset(id).await?;
            print(&views::render_detail(&record, format)?);
        }

        Commands::Stats { filter } => {
            let records = store.fetch_datasets().await?;
            let visible = filter_records(&records, &filter.predicate());
            let summary = summarize(&config, &visible);
            print(&views::render_charts(&summary, &statistics_charts(&summary), format)?);
        }

        Commands::Dashboard { filter } => {
            let records = store.fetch_datasets().await?;
            let predicate = filter.predicate();
            let visible = filter_records(&records, &predicate);
            let summary = summarize(&config, &visible);
            if format == OutputFormat::Table {
                println!("Filters: {}", ecocat::export::report::describe_filter(&predicate));
            }
            print(&views::render_charts(&summary, &dashboard_charts(&summary), format)?);
        }

        Commands::Export { report, output_dir } => {
            let mut export_config = config.export_config();
            if let Some(dir) = output_dir {
                export_config.output_dir = dir;
            }
            let title = config.report.title.as_str();

            let report = match report {
                ExportTarget::Dashboard { filter } => {
                    let records = store.fetch_datasets().await?;
                    let predicate = filter.predicate();
                    let visible = filter_records(&records, &predicate);
                    let summary = summarize(&config, &visible);
                    dashboard_report(title, &predicate, &visible, &summary)
                }
                ExportTarget::Stats { filter } => {
                    let records = store.fetch_datasets().await?;
                    let visible = filter_records(&records, &filter.predicate());
                    let summary = summarize(&config, &visible);
                    statistics_report(title, &summary)
                }
                ExportTarget::Dataset { id } => dataset_sheet(&store.fetch_dataset(id).await?),
            };

            let path = export(Exporter::new(export_config), report).await?;
            println!("Report written to {}", path.display());
        }

        Commands::Profile { action } => match action {
            ProfileAction::Show => {
                print(&views::render_profile(&store.profile().await?, format)?);
            }
            ProfileAction::Update {
                first_name,
                last_name,
                email,
            } => {
                let update = ProfileUpdate {
                    first_name,
                    last_name,
                    email,
                };
                store.update_profile(&update).await?;
                println!("Profile updated");
                print(&views::render_profile(&store.profile().await?, format)?);
            }
        },

        Commands::Query { query, file } => {
            let query = match (query, file) {
                (_, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Cannot read {}", path.display()))?,
                (Some(q), None) => q,
                (None, None) => DEFAULT_QUERY.to_string(),
            };
            let outcome = graphql::execute(&store, &query).await?;
            print(&views::render_query(&outcome, format)?);
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}
