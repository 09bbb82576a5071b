use anyhow::Result;
use clap::{Parser, Subcommand};
use ritsu::{engine, theme::GitFetcher};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ritsu", version, about = "A static blog generator")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new blog directory
    Init {
        /// Directory name (defaults to `blog`)
        dir: Option<String>,

        /// Repository to clone the default theme from
        #[arg(long)]
        theme_repo: Option<String>,
    },

    /// Create a new draft post
    New {
        name: String,

        /// Template under templates/ to start from
        #[arg(short, long)]
        template: Option<String>,
    },

    /// Publish a draft
    Publish {
        name: String,

        /// Publication date (YYYY-MM-DD or RFC 3339)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Move a published post to the trash
    Delete { name: String },

    /// Render the blog into a new directory
    Generate {
        /// Output directory name (defaults to `public`)
        dir: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    let cwd = std::env::current_dir()?;
    match command {
        Commands::Init { dir, theme_repo } => {
            let fetcher = match theme_repo {
                Some(repo) => GitFetcher::new(repo),
                None => GitFetcher::default(),
            };
            engine::init(&cwd, dir.as_deref(), &fetcher)?;
        }
        Commands::New { name, template } => {
            engine::new_post(&cwd, &name, template.as_deref())?;
        }
        Commands::Publish { name, date } => {
            engine::publish(&cwd, &name, date.as_deref())?;
        }
        Commands::Delete { name } => engine::delete(&cwd, &name)?,
        Commands::Generate { dir } => {
            engine::generate(&cwd, dir.as_deref())?;
        }
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "ritsu=debug" } else { "ritsu=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .with_level(false)
        .init();
}
