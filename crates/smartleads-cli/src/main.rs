mod companies;
mod search;
mod templates;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use smartleads_client::{CompanyFilter, LeadsApiClient};
use smartleads_core::Category;
use smartleads_export::ExportFormat;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "smartleads")]
#[command(about = "Find B2B leads, export them, and preview outreach emails")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a company search and follow its progress
    Search {
        /// Business category (e.g. restaurantes, hoteles)
        category: Category,
        /// Place name to search around (e.g. "Mendoza")
        #[arg(long, conflicts_with_all = ["lat", "lng"])]
        location: Option<String>,
        /// Latitude of the search centre
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,
        /// Longitude of the search centre
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,
        /// Search radius in kilometres (1-50)
        #[arg(long, default_value_t = 5)]
        radius: u32,
        /// Export the results once the search completes
        #[arg(long, value_enum)]
        export: Option<FormatArg>,
        /// Directory export files are written to
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// List stored companies
    Results {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Write stored companies to leads.csv or leads.pdf
    Export {
        #[arg(long, value_enum, default_value = "csv")]
        format: FormatArg,
        /// Directory the export file is written to
        #[arg(long, default_value = ".")]
        out: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Render an email template with sample values
    Preview {
        /// YAML template file; defaults to the stock template
        #[arg(long)]
        template: Option<PathBuf>,
    },
    /// Ask the server to send a template to one company
    Send {
        #[arg(long)]
        company_id: String,
        #[arg(long)]
        template_id: String,
    },
}

#[derive(Debug, Clone, Default, clap::Args)]
struct FilterArgs {
    /// Only companies in this category
    #[arg(long)]
    category: Option<Category>,
    /// Only validated (true) or pending (false) companies
    #[arg(long)]
    validated: Option<bool>,
}

impl FilterArgs {
    fn to_filter(&self) -> CompanyFilter {
        CompanyFilter {
            category: self.category,
            validated: self.validated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Csv,
    Pdf,
}

impl From<FormatArg> for ExportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Pdf => ExportFormat::Pdf,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = smartleads_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Search {
            category,
            location,
            lat,
            lng,
            radius,
            export,
            out,
        } => {
            let client = LeadsApiClient::new(&config)?;
            let request = search::build_request(category, location, lat, lng, radius);
            search::run_search(client, &config, request, export.map(Into::into), &out).await?;
        }
        Commands::Results { filter } => {
            let client = LeadsApiClient::new(&config)?;
            companies::run_results(&client, &filter.to_filter()).await?;
        }
        Commands::Export {
            format,
            out,
            filter,
        } => {
            let client = LeadsApiClient::new(&config)?;
            companies::run_export(
                &client,
                &filter.to_filter(),
                format.into(),
                config.csv_quoting,
                &out,
            )
            .await?;
        }
        Commands::Preview { template } => templates::run_preview(template.as_deref())?,
        Commands::Send {
            company_id,
            template_id,
        } => {
            let client = LeadsApiClient::new(&config)?;
            companies::run_send(&client, &company_id, &template_id).await?;
        }
    }

    Ok(())
}
