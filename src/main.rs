use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use hotspot::{
    parse_threshold, render_html, GlobalConfig, HotspotCreative, ImageDimensions, StorageConfig,
};

#[derive(Parser)]
#[command(name = "hotspot")]
#[command(about = "Build interactive HTML5 hotspot creatives from an image URL", long_about = None)]
struct Cli {
    /// Cloud Vision API key
    #[arg(long, env = "API_KEY", default_value = "")]
    api_key: String,

    /// Where generated images and bundles are kept
    #[arg(long, value_enum, default_value_t = StorageKind::Local)]
    storage: StorageKind,

    /// Root directory for local storage
    #[arg(long, default_value = "static")]
    static_dir: PathBuf,

    /// Base URL local files are served from
    #[arg(long, default_value = "http://localhost:8080")]
    base_url: String,

    /// Project whose default bucket is used for GCS storage
    #[arg(long, env = "GOOGLE_CLOUD_PROJECT")]
    project: Option<String>,

    /// OAuth access token for GCS storage
    #[arg(long, env = "GCS_ACCESS_TOKEN", default_value = "")]
    gcs_token: String,

    /// Service-account JSON key used to sign shared GCS links
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    gcs_credentials: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect objects and print the creative's markup
    Build {
        /// Image URL to analyse
        img_url: String,

        /// Detection confidence threshold between 0 and 1
        #[arg(short, long, default_value = "0.85", value_parser = parse_threshold)]
        threshold: f64,

        /// Creative size as WIDTHxHEIGHT, e.g. 300x600
        #[arg(short, long)]
        dimensions: Option<ImageDimensions>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Package an edited creative HTML file with its image into a ZIP
    Zip {
        /// URL of the stored image
        img_url: String,

        /// File name of the image inside the bundle
        img_name: String,

        /// Creative HTML file
        html_file: PathBuf,
    },
    /// Delete a creative's image and ZIP
    Clean {
        img_url: String,
        zip_file_url: String,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum StorageKind {
    /// Files under --static-dir
    Local,
    /// The project's App Engine bucket
    Gcs,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    /// JSON with image details and every fragment list
    Json,
    /// Standalone HTML preview page
    Html,
    /// Hotspot names, one per line
    Text,
}

fn storage_config(cli: &Cli) -> Result<StorageConfig, Box<dyn std::error::Error>> {
    Ok(match cli.storage {
        StorageKind::Local => StorageConfig::Local {
            root: cli.static_dir.clone(),
            base_url: cli.base_url.clone(),
        },
        StorageKind::Gcs => {
            let project = cli
                .project
                .as_deref()
                .ok_or("GCS storage needs --project or GOOGLE_CLOUD_PROJECT")?;
            let credentials = cli
                .gcs_credentials
                .clone()
                .ok_or("GCS storage needs --gcs-credentials or GOOGLE_APPLICATION_CREDENTIALS")?;
            StorageConfig::gcs_for_project(project, cli.gcs_token.clone(), credentials)
        }
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = GlobalConfig {
        api_key: cli.api_key.clone(),
        storage: storage_config(&cli)?,
        ..GlobalConfig::default()
    };
    config.bundle.static_dir = cli.static_dir.clone();

    let app = HotspotCreative::new(config)?;

    match cli.command {
        Command::Build {
            img_url,
            threshold,
            dimensions,
            format,
        } => {
            let creative = app.build_creative(&img_url, threshold, dimensions)?;
            match format {
                OutputFormat::Json => {
                    let json_output = serde_json::json!({
                        "img_url": creative.img_url,
                        "img_name": creative.img_name,
                        "width": creative.width,
                        "height": creative.height,
                        "fragments": creative.fragments,
                        "joined": creative.fragments.joined(),
                        "elapse": creative.elapse,
                    });
                    println!("{}", serde_json::to_string_pretty(&json_output)?);
                }
                OutputFormat::Html => {
                    print!(
                        "{}",
                        render_html(&creative.img_url, creative.width, creative.height, &creative.fragments)
                    );
                }
                OutputFormat::Text => {
                    for name in &creative.fragments.object_names {
                        println!("{}", name.trim_matches('"'));
                    }
                }
            }
        }
        Command::Zip {
            img_url,
            img_name,
            html_file,
        } => {
            let html = std::fs::read(&html_file)?;
            let url = app.generate_zip(&img_url, &img_name, &html)?;
            println!("{}", url);
        }
        Command::Clean {
            img_url,
            zip_file_url,
        } => {
            app.clean(&img_url, &zip_file_url);
        }
    }

    Ok(())
}
