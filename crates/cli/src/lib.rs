use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use doc_model::{now_millis, Campaign, Rgba, UserId};
use qr_engine::export::DEFAULT_FILE_STEM;
use qr_engine::{
    default_engine, download, notice_for, ErrorCorrection, ExportAction, QrEngine, QrOptions,
};
use qrdeck_core::{
    apply_editor_action, CanvasAction, CanvasEditor, EditorAction, EditorConfig, EditorSurface,
};
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use storage::{
    default_data_dir, resolve_template_url, DirectoryObjectStore, JsonFileRepository,
    ResolvedTemplate, TemplateCandidates, UserRepository,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "qrdeck")]
#[command(about = "qrdeck template editor and QR toolkit")]
pub struct Cli {
    /// Editor configuration file (JSON). Defaults to QRDECK_* environment variables.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Render a QR code.
    Qr {
        #[arg(value_name = "CONTENT")]
        content: String,
        #[arg(long, default_value_t = 256)]
        size: u32,
        /// Quiet zone in modules.
        #[arg(long, default_value_t = 4)]
        border: u32,
        #[arg(long, default_value = "#000000")]
        fg: Rgba,
        #[arg(long, default_value = "#ffffff")]
        bg: Rgba,
        /// Error correction level: L, M, Q or H.
        #[arg(long, default_value = "M")]
        ec: ErrorCorrection,
        /// Save the PNG into this directory.
        #[arg(long, value_name = "DIR")]
        output: Option<PathBuf>,
        /// File name for the saved PNG, without extension.
        #[arg(long, default_value = DEFAULT_FILE_STEM)]
        name: String,
        /// Include the data URL in the output.
        #[arg(long)]
        data_url: bool,
    },
    /// Replay editor events from a JSON script and print the result.
    Annotate {
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,
    },
    /// Replay canvas edits from a JSON script and print the result.
    Canvas {
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,
    },
    /// Manage a user's campaigns.
    Campaigns {
        #[command(subcommand)]
        command: CampaignCommands,
    },
    /// Project template helpers.
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Subcommand)]
enum CampaignCommands {
    List {
        #[arg(long)]
        user: String,
        #[arg(long, value_name = "DIR")]
        data_dir: Option<PathBuf>,
    },
    Add {
        #[arg(long)]
        user: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, value_name = "DIR")]
        data_dir: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
enum TemplateCommands {
    /// Pick or create the durable URL for a template.
    Resolve {
        #[arg(long)]
        pdf_url: Option<String>,
        #[arg(long)]
        file_url: Option<String>,
        #[arg(long)]
        data_url: Option<String>,
        #[arg(long, value_name = "DIR")]
        store_dir: PathBuf,
        #[arg(long)]
        public_base: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QrOutput {
    size: u32,
    modules: u32,
    error_correction: String,
    png_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CanvasOutput<'a> {
    objects: &'a [qrdeck_core::CanvasObject],
    history_length: usize,
    history_index: isize,
    can_undo: bool,
    can_redo: bool,
}

#[derive(Debug, Serialize)]
struct TemplateOutput<'a> {
    field: &'a str,
    url: &'a str,
    uploaded: bool,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    init_logging(cli.verbose);

    match cli.command {
        Commands::Qr { content, size, border, fg, bg, ec, output, name, data_url } => {
            let options = QrOptions::default()
                .with_size(size)
                .with_border(border)
                .with_colors(fg, bg)
                .with_error_correction(ec);
            run_qr(&content, &options, output.as_deref(), &name, data_url)
        }
        Commands::Annotate { script } => run_annotate(&script, load_config(cli.config.as_deref())?),
        Commands::Canvas { script } => run_canvas(&script, load_config(cli.config.as_deref())?),
        Commands::Campaigns { command } => run_campaigns(command),
        Commands::Template {
            command:
                TemplateCommands::Resolve { pdf_url, file_url, data_url, store_dir, public_base },
        } => {
            let candidates = TemplateCandidates {
                pdf_url: pdf_url.as_deref(),
                file_url: file_url.as_deref(),
                data_url: data_url.as_deref(),
            };
            run_template_resolve(candidates, DirectoryObjectStore::new(store_dir, public_base))
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Stderr logging filtered by `QRDECK_LOG` (default `warn`); `--verbose` forces `debug`.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("QRDECK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<EditorConfig> {
    match path {
        Some(path) => EditorConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => EditorConfig::from_env().context("invalid QRDECK_* environment configuration"),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

fn run_qr(
    content: &str,
    options: &QrOptions,
    output: Option<&Path>,
    name: &str,
    data_url: bool,
) -> Result<()> {
    let rendered =
        default_engine().render(content, options).context("failed to generate QR code")?;

    let mut saved = None;
    let mut notice = None;
    if let Some(dir) = output {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
        let result = download(Some(&rendered), dir, name);
        let outcome = notice_for(ExportAction::Download, &result);
        let path = result.context(outcome.message.clone())?;
        info!(path = %path.display(), "{}", outcome.message);
        saved = Some(path.display().to_string());
        notice = Some(outcome.message);
    }

    print_json(&QrOutput {
        size: rendered.width(),
        modules: rendered.modules,
        error_correction: options.error_correction.to_string(),
        png_bytes: rendered.png.len(),
        output: saved,
        notice,
        data_url: data_url.then(|| rendered.data_url()),
    })
}

fn read_script<T: serde::de::DeserializeOwned>(script: &Path) -> Result<Vec<T>> {
    if !script.is_file() {
        anyhow::bail!("script does not exist: {}", script.display());
    }
    let bytes = fs::read(script)?;
    serde_json::from_slice(&bytes).with_context(|| format!("invalid script {}", script.display()))
}

fn run_annotate(script: &Path, config: EditorConfig) -> Result<()> {
    let actions: Vec<EditorAction> = read_script(script)?;
    debug!(actions = actions.len(), "replaying editor script");
    let mut editor = EditorSurface::new(config);
    for action in actions {
        apply_editor_action(&mut editor, action);
    }

    let output = serde_json::json!({
        "tool": editor.tool().to_string(),
        "page": editor.current_page(),
        "annotations": editor.annotations(),
        "textRuns": editor.text_editor().runs(),
        "view": editor.render(),
    });
    print_json(&output)
}

fn run_canvas(script: &Path, config: EditorConfig) -> Result<()> {
    let actions: Vec<CanvasAction> = read_script(script)?;
    debug!(actions = actions.len(), "replaying canvas script");
    let mut editor = CanvasEditor::new(config.history_depth);
    for action in actions {
        editor.apply(action);
    }

    let history = editor.history();
    print_json(&CanvasOutput {
        objects: editor.canvas().objects(),
        history_length: history.len(),
        history_index: history.index(),
        can_undo: history.can_undo(),
        can_redo: history.can_redo(),
    })
}

fn parse_user(user: &str) -> Result<UserId> {
    UserId::parse(user).with_context(|| format!("invalid user id {user:?}"))
}

fn campaign_repository(data_dir: Option<PathBuf>) -> Result<JsonFileRepository<Campaign>> {
    let root = match data_dir {
        Some(dir) => dir,
        None => default_data_dir().context("no data directory available; pass --data-dir")?,
    };
    Ok(JsonFileRepository::with_root(root, "campaigns"))
}

fn run_campaigns(command: CampaignCommands) -> Result<()> {
    match command {
        CampaignCommands::List { user, data_dir } => {
            let user = parse_user(&user)?;
            let campaigns =
                campaign_repository(data_dir)?.get(&user).context("failed to load campaigns")?;
            print_json(&campaigns)
        }
        CampaignCommands::Add { user, name, description, data_dir } => {
            let user = parse_user(&user)?;
            let name = name.trim();
            if name.is_empty() {
                anyhow::bail!("campaign name must not be empty");
            }

            let repo = campaign_repository(data_dir)?;
            let mut campaigns = repo.get(&user).context("failed to load campaigns")?;
            let mut campaign = Campaign::new(name, now_millis());
            campaign.description = description;
            campaigns.push(campaign.clone());
            repo.put(&user, &campaigns).context("failed to save campaigns")?;
            print_json(&campaign)
        }
    }
}

fn run_template_resolve(
    candidates: TemplateCandidates<'_>,
    store: DirectoryObjectStore,
) -> Result<()> {
    let resolved =
        resolve_template_url(candidates, &store).context("failed to resolve template URL")?;
    let (field, uploaded) = match &resolved {
        ResolvedTemplate::Durable { field, .. } => (*field, false),
        ResolvedTemplate::Uploaded { field, .. } => (*field, true),
    };
    print_json(&TemplateOutput { field, url: resolved.url(), uploaded })
}
