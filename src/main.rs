use clap::{Parser, Subcommand};
use simplifier_ig::config::GUIDE_FILE;
use simplifier_ig::generate::{self, GenerateOptions};
use simplifier_ig::ig_resource::{self, build_ig_resource};
use simplifier_ig::init::{self, InitOptions};
use simplifier_ig::output;
use simplifier_ig::settings::{INPUT_PATH, Settings};
use simplifier_ig::validate::validate;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let describe = env!("GIT_DESCRIBE");
    if describe.is_empty() {
        env!("CARGO_PKG_VERSION")
    } else {
        describe
    }
}

#[derive(Parser)]
#[command(name = "simplifier-ig")]
#[command(about = "Implementation Guide generator for Simplifier.net")]
#[command(long_about = "\
Implementation Guide generator for Simplifier.net

Turns an input folder of FHIR resources, Markdown pages and a style into the
guide folder Simplifier.net publishes, with a toc.yaml in every folder.

Input structure:

  input/
  ├── guide.yaml                   # title, url-key, style-name, menu, IG fields
  ├── variables.yaml               # Optional values for {{ig-var: name}}
  ├── resources/*.json             # Conformance resources → artifact pages
  ├── examples/*.json              # Example instances → artifacts/examples
  ├── pages/                       # Markdown pages (x.md → x.page.md)
  ├── images/                      # Optional, copied to Home/images
  ├── pagetemplates/               # Optional, copied to Home/pagetemplates
  ├── pagetemplates-artifacts/     # codesystem.md, valueset.md, ..., <type>.index.md
  └── styles/<style-name>/         # master.html, settings.style, style.css

Run 'simplifier-ig init' to scaffold an input folder that validates as-is.")]
#[command(version = version_string())]
struct Cli {
    /// Show debug progress messages
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scaffold a new input folder
    Init {
        /// Folder to create
        #[arg(long, default_value = "input")]
        path: PathBuf,
        /// Guide name; also determines the url-key
        #[arg(long, default_value = "My Implementation Guide")]
        name: String,
        /// Style folder name
        #[arg(long, default_value = "custom")]
        style: String,
        /// Initialize even if the folder is not empty (existing files are kept)
        #[arg(long)]
        force: bool,
        /// Template set folder (default: $SIMPLIFIER_IG_TEMPLATES, then templates/ beside the binary)
        #[arg(long)]
        templates: Option<PathBuf>,
    },
    /// Check an input folder without generating anything
    Validate {
        #[arg(long, default_value = "input")]
        input: PathBuf,
    },
    /// Generate the guide folder, and ImplementationGuide.json when guide.yaml allows
    Generate {
        /// Input folder (default: the last validated or initialized folder)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Output root; the guide is written to <output>/<url-key>
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        skip_validation: bool,
        /// Do not build ImplementationGuide.json
        #[arg(long)]
        no_ig_resource: bool,
    },
    /// Build ImplementationGuide.json for an already generated guide
    IgResource {
        /// Generated guide folder (default: the only guide under the output root)
        #[arg(long)]
        path: Option<PathBuf>,
        /// Input folder to read resources and examples from
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Show saved settings
    Config,
    /// Forget the saved input folder
    Clear,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Progress goes to stderr as plain lines; `RUST_LOG` overrides `-v`.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "simplifier_ig=debug"
    } else {
        "simplifier_ig=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

fn run(command: Command) -> Result<ExitCode, Box<dyn Error>> {
    let mut settings = Settings::load_default()?;

    match command {
        Command::Init {
            path,
            name,
            style,
            force,
            templates,
        } => {
            let options = InitOptions {
                guide_name: name,
                style_name: style,
                force,
                template_dir: init::find_template_dir(templates.as_deref()),
            };
            let summary = init::initialize(&path, &options)?;
            output::print_init_summary(&summary);
            remember_input(&mut settings, &path)?;
        }
        Command::Validate { input } => {
            let report = validate(&input);
            output::print_validation_report(&report);
            if !report.is_valid {
                return Ok(ExitCode::FAILURE);
            }
            remember_input(&mut settings, &input)?;
        }
        Command::Generate {
            input,
            output: output_root,
            skip_validation,
            no_ig_resource,
        } => {
            let input = resolve_input(&settings, input)?;
            let output_root = match output_root {
                Some(dir) => dir,
                None => std::env::current_dir()?.join(settings.output_folder()),
            };

            let build_ig = !no_ig_resource
                && match ig_resource::preflight(&input) {
                    Ok(_) => true,
                    Err(problems) => {
                        output::print_preflight_skip(&problems);
                        false
                    }
                };

            let summary =
                generate::generate(&input, &output_root, &GenerateOptions { skip_validation })?;
            output::print_generation_summary(&summary);

            if build_ig {
                let outcome = build_ig_resource(&summary.output_path, Some(&input));
                output::print_ig_outcome(&outcome);
                if !outcome.success {
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::IgResource { path, input } => {
            let guide_dir = match path {
                Some(dir) => dir,
                None => {
                    let root = std::env::current_dir()?.join(settings.output_folder());
                    find_guide_folder(&root)?
                }
            };
            let input = input.or_else(|| settings.get(INPUT_PATH).map(PathBuf::from));
            let outcome = build_ig_resource(&guide_dir, input.as_deref());
            output::print_ig_outcome(&outcome);
            if !outcome.success {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Config => {
            output::print_settings(
                settings.path(),
                &settings.entries(),
                settings.input_status().as_ref(),
            );
        }
        Command::Clear => {
            if settings.remove(INPUT_PATH) {
                settings.persist()?;
                println!("Cleared saved input folder");
            } else {
                println!("No input folder saved");
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Save `input` as the folder later commands default to.
fn remember_input(settings: &mut Settings, input: &Path) -> std::io::Result<()> {
    let absolute = fs::canonicalize(input).unwrap_or_else(|_| input.to_path_buf());
    settings.set(INPUT_PATH, absolute.to_string_lossy());
    settings.persist()
}

fn resolve_input(settings: &Settings, input: Option<PathBuf>) -> Result<PathBuf, String> {
    input
        .or_else(|| settings.get(INPUT_PATH).map(PathBuf::from))
        .ok_or_else(|| {
            "No input folder given and none saved. Use --input, or run 'simplifier-ig validate' first."
                .to_string()
        })
}

/// The one folder under `root` holding a generated guide.
fn find_guide_folder(root: &Path) -> Result<PathBuf, String> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(root)
        .map_err(|e| format!("Cannot read output folder {}: {e}", root.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.join(GUIDE_FILE).is_file())
        .collect();
    candidates.sort();

    match candidates.len() {
        1 => Ok(candidates.remove(0)),
        0 => Err(format!("No generated guide found in {}", root.display())),
        _ => {
            let names: Vec<String> = candidates
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().to_string())
                .collect();
            Err(format!(
                "Multiple guides found in {}: {}. Use --path to choose one.",
                root.display(),
                names.join(", ")
            ))
        }
    }
}
