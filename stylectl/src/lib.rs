use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use style_selector::api::{InitializationResponse, SelectionRequest, SelectionResponse};
use style_selector::presentation::{TileLayer, popup_css};
use style_selector::presets::default_presets;
use style_selector::{
    HttpTilePrefetcher, MapConfig, MapInitializer, MapPurpose, NoopPrefetcher, SelectionResult,
    StyleCatalog, TilePrefetcher, evaluate_style, score_metrics,
};
use tracing::{debug, info};

/// How long the CLI lingers for an in-flight tile prefetch before exiting.
/// Slightly longer than the prefetch client's own request timeout.
const PREFETCH_WAIT: Duration = Duration::from_secs(6);

#[derive(Debug, Parser, Clone)]
#[command(
    name = "stylectl",
    author,
    version,
    about = "Pick the best map style for a viewing context and inspect the style catalog",
    long_about = None
)]
pub struct Cli {
    /// Style catalog JSON file (defaults to the configured catalog path)
    #[arg(long, global = true, value_name = "CATALOG_FILE")]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Score every style and print the winner
    Select {
        #[command(flatten)]
        config: ConfigArgs,

        /// Warm the winning style's origin tile over HTTP
        #[arg(long)]
        prefetch: bool,

        /// Emit the JSON response envelope instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the metrics and score of a single style
    Evaluate {
        /// Style id to evaluate
        #[arg(long, value_name = "STYLE_ID")]
        style: String,

        #[command(flatten)]
        config: ConfigArgs,

        #[arg(long)]
        json: bool,
    },
    /// Run an initialization request read from a JSON file (`-` for stdin)
    Init {
        #[arg(value_name = "REQUEST_FILE")]
        request: PathBuf,
    },
    /// List catalog styles in selection order
    Styles,
    /// Print the tile layer descriptor and popup stylesheet for a style
    Css {
        #[arg(long, value_name = "STYLE_ID")]
        style: String,
    },
    /// List the stock map presets available for the catalog
    Presets {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Args, Clone)]
pub struct ConfigArgs {
    /// Current map zoom level
    #[arg(long)]
    pub zoom: f64,

    #[arg(long, default_value_t = 2.0)]
    pub min_zoom: f64,

    #[arg(long, default_value_t = 18.0)]
    pub max_zoom: f64,

    #[arg(long, value_enum, default_value_t = PurposeArg::Community)]
    pub purpose: PurposeArg,

    /// Viewport width in pixels
    #[arg(long, default_value_t = 1024)]
    pub width: u32,

    /// Viewport height in pixels
    #[arg(long, default_value_t = 768)]
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PurposeArg {
    Community,
    Navigation,
    Analytics,
}

impl From<PurposeArg> for MapPurpose {
    fn from(purpose: PurposeArg) -> Self {
        match purpose {
            PurposeArg::Community => MapPurpose::Community,
            PurposeArg::Navigation => MapPurpose::Navigation,
            PurposeArg::Analytics => MapPurpose::Analytics,
        }
    }
}

impl From<&ConfigArgs> for MapConfig {
    fn from(args: &ConfigArgs) -> Self {
        MapConfig::new(args.zoom)
            .with_zoom_bounds(args.min_zoom, args.max_zoom)
            .with_viewport(args.width, args.height)
            .with_purpose(args.purpose.into())
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_with_output(cli, &mut out)
}

pub fn run_with_output<W: Write>(cli: Cli, out: &mut W) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    run_with_io(cli, &mut input, out)
}

/// Runs `cli` reading `init -` requests from `input` and writing to `out`.
pub fn run_with_io<R: Read, W: Write>(cli: Cli, input: &mut R, out: &mut W) -> Result<()> {
    let catalog = load_catalog(cli.catalog.as_deref())?;

    match cli.command {
        Command::Select {
            config,
            prefetch,
            json,
        } => run_select(&catalog, &MapConfig::from(&config), prefetch, json, out),
        Command::Evaluate {
            style,
            config,
            json,
        } => run_evaluate(&catalog, &style, &MapConfig::from(&config), json, out),
        Command::Init { request } => run_init(catalog, &request, input, out),
        Command::Styles => run_styles(&catalog, out),
        Command::Css { style } => run_css(&catalog, &style, out),
        Command::Presets { json } => run_presets(&catalog, json, out),
    }
}

fn load_catalog(path: Option<&Path>) -> Result<StyleCatalog> {
    match path {
        Some(path) => StyleCatalog::load_from_path(path)
            .with_context(|| format!("failed to load style catalog '{}'", path.display())),
        None => StyleCatalog::load().context("failed to load configured style catalog"),
    }
}

fn prefetcher(enabled: bool) -> Result<Arc<dyn TilePrefetcher>> {
    if enabled {
        let http = HttpTilePrefetcher::new().context("failed to build tile prefetch client")?;
        Ok(Arc::new(http))
    } else {
        Ok(Arc::new(NoopPrefetcher))
    }
}

fn run_select<W: Write>(
    catalog: &StyleCatalog,
    config: &MapConfig,
    prefetch: bool,
    json: bool,
    out: &mut W,
) -> Result<()> {
    let initializer = MapInitializer::new(catalog.clone(), prefetcher(prefetch)?);
    let result = initializer.initialize_map(config).map(SelectionResult::from);

    if json {
        let response = SelectionResponse::from(result);
        serde_json::to_writer_pretty(&mut *out, &response)?;
        writeln!(out)?;
    } else {
        let selection = result.context("style selection failed")?;
        info!(
            target: "stylectl::select",
            style = %selection.style_id,
            total = selection.score.total,
            zoom = config.current_zoom,
            "style selected"
        );

        let metrics = &selection.metrics;
        writeln!(out, "{} ({})", selection.style_id, selection.style.name)?;
        writeln!(out, "  score          {:.2}", selection.score.total)?;
        writeln!(out, "  load time      {} ms", metrics.load_time_ms)?;
        writeln!(out, "  contrast       {:.2}", metrics.contrast_ratio)?;
        writeln!(out, "  visibility     {}", metrics.feature_visibility)?;
        writeln!(out, "  readability    {:.1}", metrics.readability_score)?;
    }

    settle_prefetches(&initializer);
    Ok(())
}

fn settle_prefetches(initializer: &MapInitializer) {
    let settled = initializer.wait_for_prefetches(PREFETCH_WAIT);
    debug!(target: "stylectl", settled, "tile prefetch wait finished");
}

fn run_evaluate<W: Write>(
    catalog: &StyleCatalog,
    style_id: &str,
    config: &MapConfig,
    json: bool,
    out: &mut W,
) -> Result<()> {
    let style = catalog
        .get(style_id)
        .ok_or_else(|| anyhow!("unknown style '{style_id}'"))?;

    let metrics = evaluate_style(style, config);
    let score = score_metrics(&metrics);

    if json {
        let value = serde_json::json!({
            "styleId": style.id,
            "metrics": metrics,
            "score": score,
        });
        serde_json::to_writer_pretty(&mut *out, &value)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "{} ({})", style.id, style.name)?;
    writeln!(
        out,
        "  load time      {} ms -> {:.2}",
        metrics.load_time_ms, score.load_time
    )?;
    writeln!(
        out,
        "  contrast       {:.2} -> {:.2}",
        metrics.contrast_ratio, score.contrast
    )?;
    writeln!(
        out,
        "  visibility     {} -> {:.2}",
        metrics.feature_visibility, score.visibility
    )?;
    writeln!(
        out,
        "  readability    {:.1} -> {:.2}",
        metrics.readability_score, score.readability
    )?;
    writeln!(out, "  total          {:.2}", score.total)?;
    Ok(())
}

fn run_init<R: Read, W: Write>(
    catalog: StyleCatalog,
    request_path: &Path,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    let raw = read_request(request_path, input)?;
    let request: SelectionRequest = serde_json::from_str(&raw).with_context(|| {
        format!(
            "failed to parse initialization request '{}'",
            request_path.display()
        )
    })?;

    let initializer = MapInitializer::new(catalog, prefetcher(request.prefetch)?);
    let response = InitializationResponse::from(initializer.initialize_map(&request.config));

    serde_json::to_writer_pretty(&mut *out, &response)?;
    writeln!(out)?;

    settle_prefetches(&initializer);
    Ok(())
}

fn read_request<R: Read>(path: &Path, input: &mut R) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut raw = String::new();
        input
            .read_to_string(&mut raw)
            .context("failed to read initialization request from stdin")?;
        return Ok(raw);
    }

    fs::read_to_string(path)
        .with_context(|| format!("failed to read initialization request '{}'", path.display()))
}

fn run_styles<W: Write>(catalog: &StyleCatalog, out: &mut W) -> Result<()> {
    for style in catalog {
        writeln!(out, "{:<12} {}", style.id, style.name)?;
    }
    Ok(())
}

fn run_css<W: Write>(catalog: &StyleCatalog, style_id: &str, out: &mut W) -> Result<()> {
    let style = catalog
        .get(style_id)
        .ok_or_else(|| anyhow!("unknown style '{style_id}'"))?;

    let layer = TileLayer::for_style(style);
    writeln!(out, "/* tile layer */")?;
    writeln!(out, "/* {} */", serde_json::to_string(&layer)?)?;
    write!(out, "{}", popup_css(style))?;
    Ok(())
}

fn run_presets<W: Write>(catalog: &StyleCatalog, json: bool, out: &mut W) -> Result<()> {
    let presets = default_presets(catalog);

    if json {
        serde_json::to_writer_pretty(&mut *out, &presets)?;
        writeln!(out)?;
        return Ok(());
    }

    for preset in &presets {
        writeln!(
            out,
            "{:>2}  {:<20} {:<10} clustering={}",
            preset.id, preset.name, preset.style.id, preset.options.enable_clustering
        )?;
    }
    Ok(())
}
