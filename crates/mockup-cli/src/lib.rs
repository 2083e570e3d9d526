mod cmd;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mockup_context::{MockupConfig, MockupProject};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mockup", version, about = "Mockup - sandboxed previews of component-based page templates")]
struct Cli {
    /// Project directory (defaults to the current directory)
    #[arg(short = 'C', long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the page preview to a single HTML file
    Render {
        #[command(flatten)]
        inputs: InputArgs,
        /// Output file (overrides `out` in mockup.json)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Document title
        #[arg(long)]
        title: Option<String>,
    },
    /// List registered components with their inputs and content field
    List {
        #[command(flatten)]
        inputs: InputArgs,
    },
    /// Serve the preview with live reload
    Serve {
        #[command(flatten)]
        inputs: InputArgs,
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
}

/// Input locations shared by every command; each overrides mockup.json.
#[derive(Args)]
struct InputArgs {
    /// Component metadata JSON, or a directory of *.component.ts sources
    #[arg(long)]
    components: Option<PathBuf>,
    /// Page record JSON (may be model output) or a *.component.ts source
    #[arg(long)]
    page: Option<PathBuf>,
    /// Register only components marked `required`
    #[arg(long)]
    required_only: bool,
}

impl InputArgs {
    fn apply(self, config: &mut MockupConfig) {
        if let Some(components) = self.components {
            config.components = components;
        }
        if let Some(page) = self.page {
            config.page = page;
        }
        if self.required_only {
            config.required_only = true;
        }
    }
}

/// Install the log subscriber: `MOCKUP_LOG`, then `RUST_LOG`, then `warn`.
fn init_logging() {
    let env_filter = EnvFilter::try_from_env("MOCKUP_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_project(dir: Option<PathBuf>) -> anyhow::Result<MockupProject> {
    match dir {
        Some(dir) => MockupProject::load(&dir),
        None => MockupProject::load_cwd(),
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let mut project = load_project(cli.dir)?;
    tracing::debug!(root = %project.root.display(), "loaded project");

    match cli.command {
        Commands::Render { inputs, out, title } => {
            inputs.apply(&mut project.config);
            if let Some(out) = out {
                project.config.out = out;
            }
            if title.is_some() {
                project.config.title = title;
            }
            cmd::render::run(&project)
        }
        Commands::List { inputs } => {
            inputs.apply(&mut project.config);
            cmd::list::run(&project)
        }
        Commands::Serve { inputs, port } => {
            inputs.apply(&mut project.config);
            cmd::serve::run(project, port).await
        }
    }
}

pub async fn run() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = dispatch(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
