use std::fs::File;
use std::io::{self, BufReader, IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use bytesize::ByteSize;
use clap::{Parser, ValueEnum};
use duviz_core::lister::{FsLister, TimeMetric};
use duviz_core::policy::detect_allocation_unit;
use duviz_core::records::{collect_records, RecordWriter};
use duviz_core::render::render;
use duviz_core::{
    ChannelFeedback, RecordTreeBuilder, RenderOptions, ScanMsg, ScanOptions, Scanner, SizePolicy,
    TreeNode, TreeSource, View, DEFAULT_MAX_DEPTH, DEFAULT_WIDTH,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ViewArg {
    Blocks,
    Summary,
    Dump,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TimeArg {
    Modified,
    Accessed,
    Created,
}

#[derive(Parser, Debug)]
#[command(
    name = "duviz",
    version,
    about = "Shows where disk space goes, as nested bars or a sorted summary"
)]
struct Args {
    /// Directories to scan
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,
    /// Total width of the bar chart
    #[arg(short, long, env = "COLUMNS", default_value_t = DEFAULT_WIDTH)]
    width: usize,
    /// Levels of subdirectories to show
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
    #[arg(long, value_enum, default_value = "blocks")]
    view: ViewArg,
    /// Round file sizes up to this unit for allocated size, e.g. 4KiB
    #[arg(long, value_name = "BYTES")]
    allocation_unit: Option<ByteSize>,
    /// Use the block size of the scanned filesystem as allocation unit
    #[arg(long, conflicts_with = "allocation_unit")]
    detect_allocation_unit: bool,
    /// Timestamp that decides the oldest file
    #[arg(long, value_enum, default_value = "modified")]
    time_metric: TimeArg,
    /// Skip directories on different filesystems
    #[arg(short = 'x', long)]
    one_file_system: bool,
    /// Disable progress reporting
    #[arg(long)]
    no_progress: bool,
    /// Build the tree from directory records in FILE ('-' for stdin)
    #[arg(long, value_name = "FILE", conflicts_with = "emit_records")]
    records: Option<PathBuf>,
    /// Print one record per directory instead of rendering
    #[arg(long)]
    emit_records: bool,
    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn render_options(&self) -> RenderOptions {
        RenderOptions {
            width: self.width,
            max_depth: self.max_depth,
            view: match self.view {
                ViewArg::Blocks => View::Blocks,
                ViewArg::Summary => View::Summary,
                ViewArg::Dump => View::Dump,
            },
        }
    }

    fn scan_options(&self, root: &Path) -> Result<ScanOptions> {
        let size_policy = if self.detect_allocation_unit {
            detect_allocation_unit(root)
                .with_context(|| format!("detecting allocation unit of {}", root.display()))?
        } else {
            SizePolicy::new(self.allocation_unit.map_or(0, |b| b.as_u64()))
        };
        Ok(ScanOptions {
            size_policy,
            time_metric: match self.time_metric {
                TimeArg::Modified => TimeMetric::Modified,
                TimeArg::Accessed => TimeMetric::Accessed,
                TimeArg::Created => TimeMetric::Created,
            },
            one_file_system: self.one_file_system,
            progress_every: if self.no_progress || !io::stderr().is_terminal() {
                0
            } else {
                ScanOptions::default().progress_every
            },
        })
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    let render_options = args.render_options();

    if let Some(src) = &args.records {
        let tree = ingest_records(src)?;
        println!("{}", render(&tree, &render_options));
        return Ok(());
    }

    for path in &args.paths {
        if !path.exists() {
            warn!("not a valid path: {}", path.display());
            continue;
        }
        let options = args.scan_options(path)?;
        if args.emit_records {
            emit_records(path, &options)?;
            continue;
        }
        let tree = scan(path.clone(), options, args.width)?;
        println!("{}", render(&tree, &render_options));
    }
    Ok(())
}

/// Runs the scan on a worker thread and shows a status line while it runs.
fn scan(root: PathBuf, options: ScanOptions, width: usize) -> Result<TreeNode> {
    let (tx, rx) = crossbeam_channel::unbounded::<ScanMsg>();
    std::thread::spawn({
        let tx = tx.clone();
        move || {
            let scanner = Scanner::new(root, options).with_feedback(ChannelFeedback::new(tx.clone()));
            let msg = match scanner.build() {
                Ok(tree) => ScanMsg::Done(tree),
                Err(e) => ScanMsg::Error(e.to_string()),
            };
            let _ = tx.send(msg);
        }
    });
    drop(tx);

    let mut status = StatusLine::new(width);
    while let Ok(msg) = rx.recv() {
        match msg {
            ScanMsg::Progress { path, .. } => status.show(&format!("scanning {}", path.display())),
            ScanMsg::Done(tree) => {
                status.clear();
                return Ok(tree);
            }
            ScanMsg::Error(e) => {
                status.clear();
                return Err(anyhow!(e));
            }
        }
    }
    bail!("scan ended without a result")
}

fn emit_records(root: &Path, options: &ScanOptions) -> Result<()> {
    let lister = FsLister::new().one_file_system(options.one_file_system);
    let records = collect_records(root, &lister, options)?;
    let stdout = io::stdout();
    let mut w = RecordWriter::new(stdout.lock());
    for rec in &records {
        w.write(rec)?;
    }
    w.flush()?;
    Ok(())
}

fn ingest_records(src: &Path) -> Result<TreeNode> {
    let mut builder = RecordTreeBuilder::new();
    if src == Path::new("-") {
        builder.ingest(io::stdin().lock())?;
    } else {
        let file = File::open(src).with_context(|| format!("opening {}", src.display()))?;
        builder.ingest(BufReader::new(file))?;
    }
    if builder.inserted() == 0 {
        bail!("no usable records in {}", src.display());
    }
    if builder.skipped() > 0 {
        warn!("skipped {} malformed records", builder.skipped());
    }
    Ok(builder.build()?)
}

/// Single self-overwriting line on stderr.
struct StatusLine {
    width: usize,
    dirty: bool,
}

impl StatusLine {
    fn new(width: usize) -> Self {
        Self { width, dirty: false }
    }

    fn show(&mut self, text: &str) {
        let text: String = text.chars().take(self.width).collect();
        let mut err = io::stderr().lock();
        let _ = write!(err, "{:<width$}\r", text, width = self.width);
        let _ = err.flush();
        self.dirty = true;
    }

    fn clear(&mut self) {
        if self.dirty {
            let mut err = io::stderr().lock();
            let _ = write!(err, "{}\r", " ".repeat(self.width));
            let _ = err.flush();
            self.dirty = false;
        }
    }
}
