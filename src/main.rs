use clap::{Parser, Subcommand};
use phalak_catalog::catalog::Catalog;
use phalak_catalog::config::{self, CatalogConfig, ExclusionPreset, Overrides, UncategorizedPolicy};
use phalak_catalog::pages::{self, EmitEvent};
use phalak_catalog::{output, pipeline};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;

#[derive(Parser)]
#[command(name = "phalak-catalog")]
#[command(about = "Generate the image catalog and share pages for a static gallery")]
#[command(long_about = "\
Generate the image catalog and share pages for a static gallery

Every folder directly below the image store is a category. Images inside
it (at any depth) are listed in images.json, and each gets a share page
with Open Graph tags that redirects to the gallery app.

  phalakimages/
  ├── root.png              # Root-level: dropped, or kept as Miscellaneous
  ├── kodi/                 # Category \"kodi\"
  │   └── riddle1.jpg       # → image/kodi/riddle1/index.html
  └── scan-old/             # Excluded folder, skipped entirely

Settings are read from catalog.toml in the working directory (or --config),
and flags override the file.

Run 'phalak-catalog gen-config' to print a documented catalog.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./catalog.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Image store to scan
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Output path for the JSON catalog
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Output directory for share pages
    #[arg(long, global = true)]
    pages: Option<PathBuf>,

    /// Absolute URL the site is published at
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// What to do with images directly in the image store
    #[arg(long, value_enum, global = true)]
    uncategorized: Option<UncategorizedPolicy>,

    /// Folder exclusion rule set
    #[arg(long, value_enum, global = true)]
    exclusions: Option<ExclusionPreset>,

    /// Keep pages of images that no longer exist
    #[arg(long, global = true)]
    no_prune: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan and show the catalog without writing anything
    Scan,
    /// Write the JSON catalog only
    Catalog,
    /// Write share pages from an existing JSON catalog
    Pages,
    /// Run the full pipeline: scan → catalog → pages
    Build,
    /// Print a stock catalog.toml with all options documented
    GenConfig,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            scan_root: self.source.clone(),
            catalog_path: self.catalog.clone(),
            pages_root: self.pages.clone(),
            base_url: self.base_url.clone(),
            uncategorized: self.uncategorized,
            exclusions: self.exclusions,
            no_prune: self.no_prune,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = config::load_config(cli.config.as_deref(), &cli.overrides())?;

    match cli.command {
        Command::Scan => {
            println!("==> Scanning {}", config.scan_root.display());
            let (discovered, catalog) = pipeline::catalog_only(&config)?;
            output::print_catalog_output(&catalog);
            println!("{}", output::format_catalog_summary(discovered, &catalog));
        }
        Command::Catalog => {
            println!("==> Scanning {}", config.scan_root.display());
            let (discovered, catalog) = pipeline::write_catalog(&config)?;
            println!("{}", output::format_catalog_summary(discovered, &catalog));
            println!("Wrote {}", config.catalog_path.display());
        }
        Command::Pages => {
            let catalog = Catalog::read(&config.catalog_path)?;
            println!("==> Writing pages → {}", config.pages_root.display());
            let (tx, printer) = spawn_printer();
            let report = pages::emit_pages(&catalog, &config, Some(tx));
            printer.join().ok();
            output::print_emit_summary(&report);
        }
        Command::Build => run_build(&config)?,
        Command::GenConfig => {}
    }

    Ok(())
}

fn run_build(config: &CatalogConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("==> Scanning {}", config.scan_root.display());
    let (tx, printer) = spawn_printer();
    let result = pipeline::build(config, Some(tx));
    printer.join().ok();
    let report = result?;
    output::print_build_summary(&report);
    Ok(())
}

/// Print emission events as they arrive. The thread ends once the sender is
/// dropped.
fn spawn_printer() -> (Sender<EmitEvent>, JoinHandle<()>) {
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_emit_event(&event);
        }
    });
    (tx, printer)
}
