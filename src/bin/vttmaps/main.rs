//! CLI binary for vtt-maps.
//!
//! A thin shim over the library crate: maps subcommands and flags to
//! `CatalogConfig` / `LibraryConfig`, runs the operation, prints results.
//! Without a subcommand it starts the interactive menu.

mod menu;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command as Process, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use vtt_maps::{
    catalog, BatchProgressCallback, CatalogClient, CatalogConfig, DownloadSummary, Downloader,
    LibraryConfig, MapLibrary, ProgressCallback,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const RULE: &str = "======================================================================";

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar per batch (a category download or an
/// export run) plus a log line per item.
struct CliProgressCallback {
    bar: Mutex<Option<ProgressBar>>,
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn println(&self, line: String) {
        match self.bar.lock().unwrap().as_ref() {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        self.start_times
            .lock()
            .unwrap()
            .remove(&index)
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, label: &str, total: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} maps  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        let bar = ProgressBar::new(total as u64);
        bar.set_style(style);
        bar.set_prefix(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("{label}: {total} maps"))
        ));
        *self.bar.lock().unwrap() = Some(bar);
    }

    fn on_item_start(&self, index: usize, _total: usize, name: &str) {
        self.start_times.lock().unwrap().insert(index, Instant::now());
        if let Some(bar) = self.bar.lock().unwrap().as_ref() {
            bar.set_message(name.to_string());
        }
    }

    fn on_item_complete(&self, index: usize, total: usize, name: &str) {
        let secs = self.elapsed_secs(index);
        self.println(format!(
            "  {} {:>3}/{:<3}  {:<32}  {}",
            green("✓"),
            index,
            total,
            name,
            dim(&format!("{secs:.1}s")),
        ));
        if let Some(bar) = self.bar.lock().unwrap().as_ref() {
            bar.inc(1);
        }
    }

    fn on_item_error(&self, index: usize, total: usize, name: &str, error: &str) {
        let secs = self.elapsed_secs(index);

        // Truncate very long error messages to keep output tidy.
        let first_line = error.lines().next().unwrap_or("");
        let msg = match first_line.char_indices().nth(79) {
            Some((cut, _)) => format!("{}\u{2026}", &first_line[..cut]),
            None => first_line.to_string(),
        };

        self.println(format!(
            "  {} {:>3}/{:<3}  {:<32}  {}  {}",
            red("✗"),
            index,
            total,
            name,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        if let Some(bar) = self.bar.lock().unwrap().as_ref() {
            bar.inc(1);
        }
    }

    fn on_batch_complete(&self, label: &str, total: usize, success_count: usize) {
        if let Some(bar) = self.bar.lock().unwrap().take() {
            bar.finish_and_clear();
        }
        let failed = total.saturating_sub(success_count);
        if failed == 0 {
            eprintln!("{} {}: {} maps", green("✔"), label, bold(&success_count.to_string()));
        } else {
            eprintln!(
                "{} {}: {}/{} maps  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                label,
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Interactive menu
  vttmaps

  # How many maps does each category have?
  vttmaps probe

  # Two maps from every category, then index them
  vttmaps download --sample

  # Everything from two categories
  vttmaps download --categories dungeons,taverns

  # One specific map
  vttmaps fetch beach simple-beach

  # Export every local map to PNG (maps/<category>/exported_pngs/)
  vttmaps export

  # Grid metadata of a file, as JSON
  vttmaps --json info maps/beach/simple-beach.dd2vtt

  # Open map #3 of `vttmaps list` in the system image viewer
  vttmaps view 3

ENVIRONMENT VARIABLES:
  VTTMAPS_DIR          Local maps folder (default: maps)
  VTTMAPS_API_BASE     Listing endpoint (GitHub contents API)
  VTTMAPS_RAW_BASE     Raw file host
  RUST_LOG             Override log filter (e.g. vtt_maps=debug)

NEXT STEPS:
  DD2VTT files import directly into Foundry VTT with the DD Import module:
  https://foundryvtt.com/packages/dd-import/
"#;

/// Discover, download, and view DD2VTT battle maps.
#[derive(Parser, Debug)]
#[command(
    name = "vttmaps",
    version,
    about = "Discover, download, and view DD2VTT battle maps",
    long_about = "Download professional Dungeondraft battle maps (DD2VTT format) from the \
mbround18/vtt-maps repository, list and inspect them locally, and export their embedded \
images to PNG. Run without a subcommand for the interactive menu.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Local maps folder.
    #[arg(long, global = true, env = "VTTMAPS_DIR", default_value = "maps")]
    maps_dir: PathBuf,

    /// Listing endpoint: `<api-base>/<category>` returns a JSON array.
    #[arg(long, global = true, env = "VTTMAPS_API_BASE", default_value = vtt_maps::config::DEFAULT_API_BASE)]
    api_base: String,

    /// Raw file host: `<raw-base>/<category>/<file>`.
    #[arg(long, global = true, env = "VTTMAPS_RAW_BASE", default_value = vtt_maps::config::DEFAULT_RAW_BASE)]
    raw_base: String,

    /// HTTP request timeout in seconds.
    #[arg(long, global = true, env = "VTTMAPS_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// Pause after each downloaded map, in milliseconds.
    #[arg(long, global = true, env = "VTTMAPS_THROTTLE_MS", default_value_t = 500)]
    throttle_ms: u64,

    /// Output structured JSON where supported.
    #[arg(long, global = true, env = "VTTMAPS_JSON")]
    json: bool,

    /// Disable progress bars.
    #[arg(long, global = true, env = "VTTMAPS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "VTTMAPS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "VTTMAPS_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum Command {
    /// Count the maps available in each remote category.
    Probe,

    /// Download maps in bulk, then rebuild the index.
    Download {
        /// Two maps from every category.
        #[arg(long, conflicts_with_all = ["all", "categories", "limit"])]
        sample: bool,

        /// Every map of every category.
        #[arg(long, conflicts_with = "categories")]
        all: bool,

        /// Comma-separated categories to download completely.
        #[arg(short, long, value_delimiter = ',')]
        categories: Vec<String>,

        /// Maximum maps per category.
        #[arg(long)]
        limit: Option<usize>,

        /// Skip the confirmation prompt for --all.
        #[arg(short, long)]
        yes: bool,
    },

    /// Download one map by category and name, then rebuild the index.
    Fetch {
        /// Category folder, e.g. `beach`.
        category: String,
        /// Map name without extension, e.g. `simple-beach`.
        map: String,
    },

    /// List local maps grouped by category.
    List,

    /// Show grid metadata and embedded image details of a DD2VTT file.
    Info {
        file: PathBuf,
    },

    /// Export one map (or every local map) to PNG.
    Export {
        /// DD2VTT file to export. Omit to export the whole library.
        file: Option<PathBuf>,

        /// Destination PNG (single-file export only).
        #[arg(short, long, requires = "file")]
        output: Option<PathBuf>,
    },

    /// Show a map in the system image viewer.
    View {
        /// Path to a DD2VTT file, or its number in `vttmaps list`.
        map: String,

        /// Only write the preview PNG and print its path.
        #[arg(long)]
        no_open: bool,
    },

    /// Rebuild maps/index.json from the files on disk.
    Index,

    /// Interactive numbered menu (default).
    Menu,
}

/// Shared state for command handlers.
pub(crate) struct App {
    catalog: CatalogConfig,
    library: LibraryConfig,
    json: bool,
    quiet: bool,
}

impl App {
    fn downloader(&self) -> Result<Downloader> {
        let client =
            CatalogClient::new(self.catalog.clone()).context("Failed to create catalog client")?;
        Ok(Downloader::new(client))
    }

    fn library(&self) -> MapLibrary {
        MapLibrary::new(self.library.clone())
    }

    pub(crate) fn categories(&self) -> &[String] {
        &self.catalog.categories
    }

    fn say(&self, line: impl AsRef<str>) {
        if !self.quiet {
            println!("{}", line.as_ref());
        }
    }
}

#[cfg(test)]
impl App {
    /// Quiet app over a maps folder; the catalog points at nothing.
    pub(crate) fn for_tests(maps_dir: &Path) -> Self {
        Self {
            catalog: CatalogConfig::builder()
                .output_dir(maps_dir)
                .throttle_ms(0)
                .build()
                .unwrap(),
            library: LibraryConfig::builder().maps_dir(maps_dir).build().unwrap(),
            json: false,
            quiet: true,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when progress bars are active; the
    // bars provide all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as ProgressCallback)
    } else {
        None
    };

    let app = build_app(&cli, progress)?;

    match cli.command.clone().unwrap_or(Command::Menu) {
        Command::Menu => menu::run(&app).await,
        command => run_command(&app, command).await,
    }
}

/// Map CLI args to the library configs.
fn build_app(cli: &Cli, progress: Option<ProgressCallback>) -> Result<App> {
    let mut catalog = CatalogConfig::builder()
        .api_base(&cli.api_base)
        .raw_base(&cli.raw_base)
        .output_dir(&cli.maps_dir)
        .request_timeout_secs(cli.timeout)
        .throttle_ms(cli.throttle_ms);
    let mut library = LibraryConfig::builder().maps_dir(&cli.maps_dir);

    if let Some(cb) = progress {
        catalog = catalog.progress_callback(Arc::clone(&cb));
        library = library.progress_callback(cb);
    }

    Ok(App {
        catalog: catalog.build().context("Invalid configuration")?,
        library: library.build().context("Invalid configuration")?,
        json: cli.json,
        quiet: cli.quiet,
    })
}

/// Run one (non-menu) command.
pub(crate) async fn run_command(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Probe => cmd_probe(app).await,
        Command::Download {
            sample,
            all,
            categories,
            limit,
            yes,
        } => cmd_download(app, sample, all, categories, limit, yes).await,
        Command::Fetch { category, map } => cmd_fetch(app, &category, &map).await,
        Command::List => cmd_list(app),
        Command::Info { file } => cmd_info(app, &file),
        Command::Export { file, output } => cmd_export(app, file.as_deref(), output.as_deref()),
        Command::View { map, no_open } => cmd_view(app, &map, no_open),
        Command::Index => cmd_index(app),
        Command::Menu => anyhow::bail!("The menu cannot be started from inside the menu"),
    }
}

// ── Remote commands ──────────────────────────────────────────────────────────

async fn cmd_probe(app: &App) -> Result<()> {
    let downloader = app.downloader()?;
    let report = catalog::probe_all(downloader.client()).await;

    if app.json {
        let rows: Vec<_> = report
            .counts
            .iter()
            .map(|(cat, r)| match r {
                Ok(n) => serde_json::json!({ "category": cat, "maps": n }),
                Err(e) => serde_json::json!({ "category": cat, "error": e.to_string() }),
            })
            .collect();
        let out = serde_json::json!({ "categories": rows, "total": report.total() });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Maps available per category:");
    println!("{}", &RULE[..40]);
    for (category, count) in &report.counts {
        match count {
            Ok(0) => {}
            Ok(n) => println!("  {category:20} {n:3} maps"),
            Err(e) => println!("  {category:20} {}", red(&format!("Error: {e}"))),
        }
    }
    println!("{}", &RULE[..40]);
    println!("Total available: {} maps", report.total());
    Ok(())
}

pub(crate) async fn cmd_download(
    app: &App,
    sample: bool,
    all: bool,
    categories: Vec<String>,
    limit: Option<usize>,
    yes: bool,
) -> Result<()> {
    let downloader = app.downloader()?;

    let summary = if sample {
        app.say("Downloading sample maps (2 from each category)…");
        downloader.download_sample().await
    } else if all {
        if !yes {
            app.say("This will download ALL maps from the repository!");
            let answer = menu::prompt("Continue? (yes/no): ")?.unwrap_or_default();
            if !answer.eq_ignore_ascii_case("yes") {
                app.say("Cancelled.");
                return Ok(());
            }
        }
        downloader.download_all(limit).await
    } else if !categories.is_empty() {
        downloader.download_categories(&categories, limit).await
    } else {
        anyhow::bail!("Choose what to download: --sample, --all, or --categories <list>");
    };

    finish_download(app, &summary)
}

async fn cmd_fetch(app: &App, category: &str, map: &str) -> Result<()> {
    let downloader = app.downloader()?;
    let downloaded = downloader
        .download_map(category, map)
        .await
        .with_context(|| format!("Failed to download {category}/{map}"))?;

    app.say(format!(
        "{} Saved DD2VTT: {}",
        green("✓"),
        downloaded.dd2vtt_path.display()
    ));
    if let Some(ref md) = downloaded.description_path {
        app.say(format!("{} Saved description: {}", green("✓"), md.display()));
    }

    let summary = DownloadSummary {
        categories: vec![(
            category.to_string(),
            Ok(vtt_maps::CategoryReport {
                category: category.to_string(),
                available: 1,
                attempted: 1,
                downloaded: vec![downloaded],
                failures: Vec::new(),
            }),
        )],
    };
    finish_download(app, &summary)
}

/// Print the download summary, rebuild the index, and fail when any
/// category or map failed.
fn finish_download(app: &App, summary: &DownloadSummary) -> Result<()> {
    let library = app.library();
    // Nothing saved and no folder yet: there is nothing to index.
    let index = library.root().is_dir().then(|| library.write_index());
    let (index_path, index_error) = match &index {
        Some(Ok((path, _))) => (Some(path.clone()), None),
        Some(Err(e)) => (None, Some(e.to_string())),
        None => (None, None),
    };
    let failed = summary.failure_count();
    let total = summary.total_downloaded() + failed;

    if app.json {
        let rows: Vec<_> = summary
            .categories
            .iter()
            .map(|(cat, r)| match r {
                Ok(rep) => serde_json::json!({
                    "category": cat,
                    "available": rep.available,
                    "downloaded": rep.downloaded,
                    "failures": rep.failures.iter()
                        .map(|f| serde_json::json!({ "name": f.name, "error": f.error.to_string() }))
                        .collect::<Vec<_>>(),
                }),
                Err(e) => serde_json::json!({ "category": cat, "error": e.to_string() }),
            })
            .collect();
        let out = serde_json::json!({
            "categories": rows,
            "total_downloaded": summary.total_downloaded(),
            "failed": failed,
            "index": index_path,
            "index_error": index_error,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        app.say(format!("\n{RULE}\nDownload Summary:\n{RULE}"));
        for (category, count) in summary.counts() {
            app.say(format!("  {category}: {count} maps"));
        }
        // Failures go to stderr so --quiet still shows them.
        for (category, result) in &summary.categories {
            match result {
                Ok(report) => {
                    for failure in &report.failures {
                        eprintln!("  {} {category}/{}: {}", red("✗"), failure.name, failure.error);
                    }
                }
                Err(error) => eprintln!("  {} {category}: {error}", red("✗")),
            }
        }
        app.say(format!(
            "\n{} Total maps downloaded: {}",
            green("✓"),
            summary.total_downloaded()
        ));
        if summary.total_downloaded() > 0 {
            app.say(format!(
                "{} Maps saved to: {}/",
                green("✓"),
                app.library.maps_dir.display()
            ));
        }
        match (&index_path, &index_error) {
            (Some(path), _) => app.say(format!("{} Index saved to: {}", green("✓"), path.display())),
            (None, Some(error)) => eprintln!("{} Index not written: {error}", red("✗")),
            (None, None) => app.say(dim("No maps folder yet; index not written")),
        }
    }

    batch_status("downloads failed", failed, total)?;
    match index {
        Some(Err(e)) => Err(e).context("Failed to create map index"),
        _ => Ok(()),
    }
}

/// Exit status of a batch command: an error when any item failed.
fn batch_status(what: &str, failed: usize, total: usize) -> Result<()> {
    if failed > 0 {
        anyhow::bail!("{failed}/{total} {what}");
    }
    Ok(())
}

// ── Local commands ───────────────────────────────────────────────────────────

pub(crate) fn cmd_list(app: &App) -> Result<()> {
    let maps = app.library().list_maps()?;

    if app.json {
        let out: serde_json::Map<String, serde_json::Value> = maps
            .iter()
            .map(|(cat, entries)| {
                let rows: Vec<_> = entries
                    .iter()
                    .map(|e| match &e.info {
                        Ok(info) => serde_json::json!({ "name": e.name, "path": e.path, "info": info }),
                        Err(err) => serde_json::json!({ "name": e.name, "path": e.path, "error": err.to_string() }),
                    })
                    .collect();
                (cat.clone(), serde_json::Value::Array(rows))
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{RULE}\nAvailable Maps:\n{RULE}");
    let mut number = 0;
    for (category, entries) in &maps {
        println!("\n📁 {} ({} maps)", bold(category), entries.len());
        for entry in entries {
            number += 1;
            println!("  {number:>3}. {:30} {}", entry.name, dim(&entry.grid_label()));
        }
    }
    println!("\n{RULE}\nTotal: {number} maps\n{RULE}");
    Ok(())
}

fn cmd_info(app: &App, file: &Path) -> Result<()> {
    let doc = vtt_maps::dd2vtt::read_document(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let info = vtt_maps::dd2vtt::describe(&doc);
    let raster = vtt_maps::dd2vtt::extract_image(&doc);

    if app.json {
        let mut out = serde_json::json!({
            "name": vtt_maps::library::map_name(file),
            "path": file,
            "format": doc.format,
            "info": info,
        });
        match &raster {
            Ok(r) => {
                out["image"] = serde_json::json!({
                    "format": r.format_name(),
                    "width": r.width(),
                    "height": r.height(),
                    "bytes": r.encoded.len(),
                })
            }
            Err(e) => out["image_error"] = serde_json::json!(e.to_string()),
        }
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("File:              {}", file.display());
    if let Some(ref format) = doc.format {
        println!("Format:            {format}");
    }
    println!("Grid:              {}", info.grid_label());
    println!(
        "Pixels per square: {}",
        info.pixels_per_grid
            .map_or_else(|| "unknown".to_string(), |n| n.to_string())
    );
    match raster {
        Ok(r) => println!(
            "Image:             {} {}x{} ({} bytes)",
            r.format_name(),
            r.width(),
            r.height(),
            r.encoded.len()
        ),
        Err(e) => println!("Image:             {}", red(&e.to_string())),
    }
    Ok(())
}

pub(crate) fn cmd_export(app: &App, file: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let library = app.library();

    if let Some(file) = file {
        let dest = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| library.export_path_for(file));
        let exported = library
            .export_map(file, &dest)
            .with_context(|| format!("Failed to export {}", file.display()))?;
        if app.json {
            println!("{}", serde_json::to_string_pretty(&exported)?);
        } else {
            app.say(format!("Grid: {}", exported.info));
            app.say(format!("{} Exported: {}", green("✓"), exported.png_path.display()));
        }
        return Ok(());
    }

    app.say(format!("{RULE}\nExporting DD2VTT maps to PNG files...\n{RULE}"));
    let report = library.export_all()?;

    if app.json {
        let rows: Vec<_> = report
            .outcomes
            .iter()
            .map(|o| match &o.result {
                Ok(m) => serde_json::to_value(m).unwrap_or_default(),
                Err(e) => serde_json::json!({ "source": o.path, "error": e.to_string(), "kind": e.kind() }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for outcome in &report.outcomes {
            match &outcome.result {
                Ok(m) => app.say(format!(
                    "  {} {:40} {}",
                    green("✓"),
                    m.png_path.display(),
                    dim(&m.info.to_string())
                )),
                Err(e) => app.say(format!(
                    "  {} {:40} {}",
                    red("✗"),
                    outcome.path.display(),
                    red(&e.to_string())
                )),
            }
        }
        app.say(format!(
            "\n{RULE}\n{} Exported {} maps\n{RULE}",
            green("✓"),
            report.success_count()
        ));
        let mut dirs: Vec<_> = report
            .successes()
            .filter_map(|m| m.png_path.parent().map(Path::to_path_buf))
            .collect();
        dirs.sort();
        dirs.dedup();
        if !dirs.is_empty() {
            app.say("Exported to:");
            for dir in dirs {
                app.say(format!("  {}/", dir.display()));
            }
        }
    }

    batch_status("maps failed to export", report.failure_count(), report.len())
}

pub(crate) fn cmd_view(app: &App, map: &str, no_open: bool) -> Result<()> {
    let library = app.library();
    let path = resolve_map_arg(&library, map)?;

    let (info, preview) = library
        .preview(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    app.say(format!("\nOpening: {}", path.display()));
    app.say(format!("Grid: {}", info.grid_label()));
    app.say(format!(
        "Pixels per square: {}",
        info.pixels_per_grid
            .map_or_else(|| "unknown".to_string(), |n| n.to_string())
    ));

    // The viewer runs detached, so the preview must outlive this process.
    let preview = preview.keep().context("Failed to keep preview file")?;
    if no_open {
        println!("{}", preview.display());
        return Ok(());
    }
    open_viewer(&preview)
}

/// Accept either a path or a 1-based number from `vttmaps list`.
fn resolve_map_arg(library: &MapLibrary, map: &str) -> Result<PathBuf> {
    let as_path = PathBuf::from(map);
    if as_path.exists() {
        return Ok(as_path);
    }
    let number: usize = map
        .trim()
        .parse()
        .with_context(|| format!("'{map}' is neither a file nor a map number"))?;
    let maps = library.numbered_maps()?;
    number
        .checked_sub(1)
        .and_then(|i| maps.into_iter().nth(i))
        .map(|entry| entry.path)
        .with_context(|| format!("Invalid map number {number}"))
}

fn open_viewer(path: &Path) -> Result<()> {
    let mut cmd = if cfg!(target_os = "macos") {
        Process::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = Process::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        Process::new("xdg-open")
    };
    cmd.arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to launch an image viewer for {}", path.display()))?;
    Ok(())
}

fn cmd_index(app: &App) -> Result<()> {
    let (path, index) = app.library().write_index()?;
    let total: usize = index.values().map(Vec::len).sum();
    if app.json {
        println!("{}", serde_json::to_string_pretty(&index)?);
    } else {
        app.say(format!("{} Index created: {}", green("✓"), path.display()));
        app.say(format!("{} Total maps catalogued: {total}", green("✓")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vtt_maps::{CatalogError, CategoryReport, DownloadedMap, MapFailure};

    fn unreachable(category: &str) -> (String, std::result::Result<CategoryReport, CatalogError>) {
        (
            category.to_string(),
            Err(CatalogError::Request {
                url: format!("http://127.0.0.1:9/api/{category}"),
                reason: "connection refused".into(),
            }),
        )
    }

    #[test]
    fn sample_and_limit_conflict() {
        assert!(Cli::try_parse_from(["vttmaps", "download", "--sample", "--limit", "5"]).is_err());
        assert!(Cli::try_parse_from(["vttmaps", "download", "-c", "beach", "--limit", "5"]).is_ok());
    }

    #[test]
    fn failed_categories_are_returned_without_a_maps_folder() {
        let tmp = tempfile::tempdir().unwrap();
        let maps_dir = tmp.path().join("maps");
        let app = App::for_tests(&maps_dir);
        let summary = DownloadSummary {
            categories: vec![unreachable("beach"), unreachable("taverns")],
        };

        let err = finish_download(&app, &summary).unwrap_err();
        assert_eq!(err.to_string(), "2/2 downloads failed");
        assert!(!maps_dir.exists());
    }

    #[test]
    fn partial_download_writes_index_and_still_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let beach = tmp.path().join("beach");
        std::fs::create_dir_all(&beach).unwrap();
        std::fs::write(beach.join("cove.dd2vtt"), "{}").unwrap();

        let app = App::for_tests(tmp.path());
        let summary = DownloadSummary {
            categories: vec![(
                "beach".into(),
                Ok(CategoryReport {
                    category: "beach".into(),
                    available: 2,
                    attempted: 2,
                    downloaded: vec![DownloadedMap {
                        category: "beach".into(),
                        name: "cove".into(),
                        dd2vtt_path: beach.join("cove.dd2vtt"),
                        description_path: None,
                    }],
                    failures: vec![MapFailure {
                        name: "dunes".into(),
                        error: CatalogError::NotFound { url: "u".into() },
                    }],
                }),
            )],
        };

        let err = finish_download(&app, &summary).unwrap_err();
        assert_eq!(err.to_string(), "1/2 downloads failed");
        assert!(tmp.path().join("index.json").is_file());
    }

    #[test]
    fn successful_download_exits_cleanly() {
        let tmp = tempfile::tempdir().unwrap();
        let app = App::for_tests(tmp.path());
        assert!(finish_download(&app, &DownloadSummary::default()).is_ok());
    }

    #[test]
    fn export_and_download_share_exit_status() {
        assert!(batch_status("maps failed to export", 0, 3).is_ok());
        let err = batch_status("maps failed to export", 1, 3).unwrap_err();
        assert_eq!(err.to_string(), "1/3 maps failed to export");
    }

    #[test]
    fn progress_callback_runs_a_batch_with_errors() {
        let cb = CliProgressCallback::new();
        cb.on_batch_start("beach", 2);
        cb.on_item_start(1, 2, "cove");
        cb.on_item_complete(1, 2, "cove");
        cb.on_item_start(2, 2, "dunes");
        cb.on_item_error(2, 2, "dunes", &"x".repeat(200));
        cb.on_batch_complete("beach", 2, 1);

        assert!(cb.bar.lock().unwrap().is_none());
        assert!(cb.start_times.lock().unwrap().is_empty());
    }
}
