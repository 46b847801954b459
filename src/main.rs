//! Mailsmith CLI
//!
//! Usage:
//!   mailsmith [OPTIONS] <COMMAND>
//!
//! Commands:
//!   init        Write the default project file
//!   validate    Check a project file
//!   compose     Print the composed HTML of one template
//!   export-all  Write the HTML of every variant to a directory
//!   types       List template types
//!   variables   List template variables
//!   projects    Manage stored projects

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mailsmith::persistence::{duplicate_project, FileProjectStore};
use mailsmith::{
    compose, default_persisted_data, ComposeOptions, EditorState, ExportFormat, PersistedData,
    ProjectKey, ProjectStore, StudioConfig, StudioError, StylePatch,
};

#[derive(Parser)]
#[command(name = "mailsmith")]
#[command(about = "Compose and manage styled email templates")]
struct Cli {
    /// Configuration file (TOML format)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the default project file
    Init {
        /// Output file (stdout if not provided)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that a project file can be imported
    Validate { file: PathBuf },

    /// Print the composed HTML of one template
    Compose {
        /// Project file (built-in defaults if not provided)
        #[arg(short, long)]
        project: Option<PathBuf>,

        /// Template type id
        #[arg(short = 't', long = "type")]
        template_type: Option<String>,

        /// Variant id
        #[arg(long)]
        variant: Option<String>,

        /// Output the global template instead
        #[arg(short, long)]
        global: bool,

        /// Style overrides (TOML format)
        #[arg(short, long)]
        style: Option<PathBuf>,

        /// Output file (stdout if not provided)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the HTML of every variant as <type>/<variant>.html
    ExportAll {
        #[arg(short, long)]
        project: Option<PathBuf>,

        /// Output directory
        #[arg(long)]
        out: PathBuf,
    },

    /// List template types
    Types {
        #[arg(short, long)]
        project: Option<PathBuf>,
    },

    /// List template variables
    Variables {
        #[arg(short, long)]
        project: Option<PathBuf>,

        /// Only variables available for this type
        #[arg(short = 't', long = "type")]
        template_type: Option<String>,
    },

    /// Manage stored projects
    Projects {
        /// Storage root (overrides the config file)
        #[arg(long)]
        store: Option<PathBuf>,

        /// User id (overrides the config file)
        #[arg(long)]
        user: Option<String>,

        #[command(subcommand)]
        action: ProjectAction,
    },
}

#[derive(Subcommand)]
enum ProjectAction {
    List,
    Create {
        name: String,
        /// Initial data (built-in defaults if not provided)
        #[arg(long)]
        from: Option<PathBuf>,
    },
    Rename { id: String, name: String },
    Duplicate { id: String, name: String },
    Delete { id: String },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "mailsmith=debug" } else { "mailsmith=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), StudioError> {
    let config = match &cli.config {
        Some(path) => StudioConfig::from_file(path)?,
        None => StudioConfig::default(),
    };

    match cli.command {
        Command::Init { output } => {
            let json = default_persisted_data().to_json_pretty()?;
            write_output(output.as_deref(), &json)?;
        }
        Command::Validate { file } => {
            let data = PersistedData::from_json_str(&fs::read_to_string(&file)?)?;
            println!(
                "{}: valid ({} templates, {} custom types)",
                file.display(),
                data.templates.len(),
                data.custom_template_types.len()
            );
        }
        Command::Compose {
            project,
            template_type,
            variant,
            global,
            style,
            output,
        } => {
            let mut options = ComposeOptions::new().with_global(global);
            if let Some(template_type) = template_type {
                options = options.with_type(template_type);
            }
            if let Some(variant) = variant {
                options = options.with_variant(variant);
            }
            if let Some(path) = style {
                options = options.with_style(StylePatch::from_file(&path)?);
            }
            let html = compose(load_project(project.as_deref())?, &options)?;
            write_output(output.as_deref(), &html)?;
        }
        Command::ExportAll { project, out } => {
            let editor = EditorState::from_persisted(load_project(project.as_deref())?);
            let entries = editor.export_all(ExportFormat::Html, None)?;
            for entry in &entries {
                let path = out.join(&entry.path);
                if let Some(dir) = path.parent() {
                    fs::create_dir_all(dir)?;
                }
                fs::write(&path, &entry.contents)?;
            }
            info!(files = entries.len(), dir = %out.display(), "exported templates");
        }
        Command::Types { project } => {
            let editor = EditorState::from_persisted(load_project(project.as_deref())?);
            let counts = editor.variant_counts();
            for info in editor.all_template_types() {
                println!(
                    "{:<28} {:<24} {} variant(s){}",
                    info.id,
                    info.label,
                    counts.get(&info.id).copied().unwrap_or(0),
                    if info.is_built_in { "" } else { " [custom]" }
                );
            }
        }
        Command::Variables {
            project,
            template_type,
        } => {
            let mut editor = EditorState::from_persisted(load_project(project.as_deref())?);
            let variables = match template_type {
                Some(template_type) => {
                    editor.change_type(&template_type)?;
                    editor.variables_for_selected()
                }
                None => editor.all_variables(),
            };
            for var in variables {
                println!("{:<24} {}", var.syntax, var.description);
            }
        }
        Command::Projects {
            store,
            user,
            action,
        } => {
            let mut config = config;
            if let Some(root) = store {
                config = config.with_storage_root(root);
            }
            if let Some(user) = user {
                config = config.with_user(user);
            }
            run_projects(&mut config.file_store(), &config.storage.user, action)?;
        }
    }
    Ok(())
}

fn run_projects(
    store: &mut FileProjectStore,
    user: &str,
    action: ProjectAction,
) -> Result<(), StudioError> {
    match action {
        ProjectAction::List => {
            for project in store.list(user)? {
                println!(
                    "{}  {:<32} {}",
                    project.id,
                    project.name,
                    project.updated_at.to_rfc3339()
                );
            }
        }
        ProjectAction::Create { name, from } => {
            let data = load_project(from.as_deref())?;
            let summary = store.create(user, &name, &data)?;
            println!("{}", summary.id);
        }
        ProjectAction::Rename { id, name } => {
            store.rename(&ProjectKey::new(user, id), &name)?;
        }
        ProjectAction::Duplicate { id, name } => {
            let summary = duplicate_project(store, &ProjectKey::new(user, id), &name)?;
            println!("{}", summary.id);
        }
        ProjectAction::Delete { id } => {
            store.delete(&ProjectKey::new(user, id))?;
        }
    }
    Ok(())
}

fn load_project(path: Option<&Path>) -> Result<PersistedData, StudioError> {
    match path {
        Some(path) => Ok(PersistedData::from_json_str(&fs::read_to_string(path)?)?),
        None => Ok(default_persisted_data()),
    }
}

fn write_output(path: Option<&Path>, contents: &str) -> Result<(), StudioError> {
    match path {
        Some(path) => {
            fs::write(path, contents)?;
            info!(path = %path.display(), "wrote output");
        }
        None => println!("{}", contents),
    }
    Ok(())
}
