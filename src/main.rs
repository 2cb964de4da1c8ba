//! backupfs - command-line interface
//!
//! Backs up local directories into a category and browses the versioned
//! result.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};
use walkdir::WalkDir;

use backupfs::backup::{BackupService, Category};
use backupfs::config::BackupConfig;
use backupfs::filesystem::{path, Version};

#[derive(Parser)]
#[command(name = "backupfs", about = "Versioned backup filesystem", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Filesystem snapshot file
    #[arg(long, global = true, default_value = ".backupfs/state.json")]
    state: PathBuf,

    /// Blob store repository directory
    #[arg(long, global = true, default_value = ".backupfs/blobs")]
    blobs: PathBuf,

    /// Name recorded for the blob store in every file reference
    #[arg(long, global = true, default_value = "local")]
    store_name: String,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Back up every file under a local directory
    Backup(BackupArgs),
    /// List a directory
    Ls(LsArgs),
    /// Print a file's content
    Cat(CatArgs),
    /// Show the versions of a directory or file
    Versions(VersionsArgs),
    /// Print every path's history in a category
    Dump(DumpArgs),
}

#[derive(Args)]
struct BackupArgs {
    category: Category,
    source: PathBuf,
}

#[derive(Args)]
struct LsArgs {
    category: Category,
    #[arg(default_value = "")]
    path: String,
    /// List at this version instead of the union of all versions
    #[arg(long, conflicts_with = "latest")]
    version: Option<String>,
    /// List at the directory's latest version
    #[arg(long)]
    latest: bool,
}

#[derive(Args)]
struct CatArgs {
    category: Category,
    path: String,
    #[arg(long)]
    version: Option<String>,
}

#[derive(Args)]
struct VersionsArgs {
    category: Category,
    #[arg(default_value = "")]
    path: String,
    /// Treat the path as a file
    #[arg(long)]
    file: bool,
}

#[derive(Args)]
struct DumpArgs {
    category: Category,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let config = BackupConfig::default()
        .state_path(cli.state)
        .blob_path(cli.blobs)
        .store_name(cli.store_name);
    let service = BackupService::open(config).context("opening backup service")?;

    match cli.command {
        Command::Backup(args) => cmd_backup(&service, args),
        Command::Ls(args) => cmd_ls(&service, args),
        Command::Cat(args) => cmd_cat(&service, args),
        Command::Versions(args) => cmd_versions(&service, args),
        Command::Dump(args) => cmd_dump(&service, args),
    }
}

fn cmd_backup(service: &BackupService, args: BackupArgs) -> anyhow::Result<()> {
    let mut tx = service.begin(args.category);

    for entry in WalkDir::new(&args.source).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = relative_path(&args.source, entry.path())?;
        let file = File::open(entry.path())
            .with_context(|| format!("opening {}", entry.path().display()))?;
        tx.put(&relative, file)?;
    }

    let summary = tx.commit()?;
    service.save().context("saving filesystem snapshot")?;
    info!(source = %args.source.display(), "backup finished");

    println!(
        "{} {}: {} files ({} uploaded, {} already stored)",
        args.category, summary.version, summary.files, summary.uploaded, summary.deduplicated
    );
    Ok(())
}

fn cmd_ls(service: &BackupService, args: LsArgs) -> anyhow::Result<()> {
    let dir = path::clean(&args.path);
    let mut selector = service.bucket(args.category).select();
    for segment in path::segments(&dir) {
        selector = selector.dir(segment);
    }
    if let Some(version) = args.version {
        selector = selector.version(version);
    } else if args.latest {
        selector = selector.latest();
    }

    for name in selector.list()? {
        println!("{}", path::join(&dir, &name));
    }
    Ok(())
}

fn cmd_cat(service: &BackupService, args: CatArgs) -> anyhow::Result<()> {
    let version = args.version.map(Version::new);
    let content = service.read_file_at(args.category, &args.path, version.as_ref())?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(&content)?;
    stdout.flush()?;
    Ok(())
}

fn cmd_versions(service: &BackupService, args: VersionsArgs) -> anyhow::Result<()> {
    let cleaned = path::clean(&args.path);
    let mut selector = service.bucket(args.category).select();
    if args.file {
        let (parent, name) = path::split_parent(&cleaned);
        for segment in path::segments(parent) {
            selector = selector.dir(segment);
        }
        selector = selector.file(name);
    } else {
        for segment in path::segments(&cleaned) {
            selector = selector.dir(segment);
        }
    }

    for version in selector.versions()? {
        println!("{}", version);
    }
    Ok(())
}

fn cmd_dump(service: &BackupService, args: DumpArgs) -> anyhow::Result<()> {
    print!("{}", service.bucket(args.category));
    Ok(())
}

/// `path` relative to `root`, with '/' separators
fn relative_path(root: &Path, path: &Path) -> anyhow::Result<String> {
    let relative = path
        .strip_prefix(root)
        .with_context(|| format!("{} is outside {}", path.display(), root.display()))?;
    let segments: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(segments.join("/"))
}
