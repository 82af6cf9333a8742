use std::path::PathBuf;

use clap::{Parser, Subcommand};
use langindex_cli::{
    Overrides,
    run::{self, AddSource},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings file to read (default: .vscode/settings.json in the current directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Resource root, overriding the settings file
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Main locale, overriding the settings file
    #[arg(long, global = true)]
    main: Option<String>,

    /// Locale of inline hints, overriding the settings file
    #[arg(long, global = true)]
    display: Option<String>,

    /// Resource format (json or yaml), overriding the settings file
    #[arg(long, global = true)]
    format: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    commands: Commands,
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan the resource root and list the locale bundles found.
    Scan {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the keys of a bundle.
    Keys {
        /// Locale to list (default: the main locale)
        #[arg(short, long)]
        lang: Option<String>,

        /// Print the keys as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Show the translations of a key.
    Lookup {
        key: String,

        /// Only show this locale
        #[arg(short, long)]
        lang: Option<String>,

        /// Display full values without truncation
        #[arg(long)]
        full: bool,
    },

    /// Add a key to every locale, replacing the selected source text with a call.
    Add {
        #[arg(short, long)]
        key: String,

        /// Text of the key in the main locale, when no file is given
        #[arg(short, long, required_unless_present = "file")]
        text: Option<String>,

        /// Source file holding the selected text
        #[arg(short, long, requires_all = ["line", "start", "end"])]
        file: Option<PathBuf>,

        /// Line of the selection (1-based)
        #[arg(long)]
        line: Option<usize>,

        /// First column of the selection (1-based)
        #[arg(long)]
        start: Option<usize>,

        /// Column after the selection (1-based, exclusive)
        #[arg(long)]
        end: Option<usize>,
    },

    /// Delete a key from every locale.
    Delete {
        #[arg(short, long)]
        key: String,
    },

    /// Import keys from another project.
    Import {
        /// The other project's .vscode/settings.json
        #[arg(long)]
        from: PathBuf,

        /// Keys to import, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        keys: Vec<String>,
    },

    /// Write the untranslated entries of a locale to a scratch JSON document.
    Extract {
        #[arg(short, long)]
        lang: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Merge an edited scratch document back into a locale.
    Apply {
        #[arg(short, long)]
        lang: String,

        /// The edited scratch document
        #[arg(long)]
        from: PathBuf,
    },

    /// Show the hover for the key at a position.
    Hover {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(long)]
        line: usize,

        #[arg(long)]
        column: usize,
    },

    /// Print the display-locale text after each translation call.
    Hints {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Report translation calls whose key is unknown.
    Check {
        #[arg(short, long)]
        file: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let workspace = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let overrides = Overrides {
        root: args.root,
        main: args.main,
        display: args.display,
        format: args.format,
    };
    let config = match langindex_cli::resolve(args.settings.as_deref(), &workspace, &overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match args.commands {
        Commands::Scan { json } => run::scan(config, json),
        Commands::Keys { lang, json } => run::keys(config, lang, json),
        Commands::Lookup { key, lang, full } => run::lookup(config, &key, lang, full),
        Commands::Add {
            key,
            text,
            file,
            line,
            start,
            end,
        } => {
            let source = match (file, text) {
                (Some(file), _) => AddSource::File {
                    file,
                    line: line.unwrap_or_default(),
                    start: start.unwrap_or_default(),
                    end: end.unwrap_or_default(),
                },
                (None, text) => AddSource::Text(text.unwrap_or_default()),
            };
            run::add(config, &key, source).await
        }
        Commands::Delete { key } => run::delete(config, &key).await,
        Commands::Import { from, keys } => run::import(config, from, keys).await,
        Commands::Extract { lang, out } => run::extract(config, &lang, out).await,
        Commands::Apply { lang, from } => run::apply(config, &lang, &from).await,
        Commands::Hover { file, line, column } => run::hover(config, &file, line, column),
        Commands::Hints { file } => run::hints(config, &file),
        Commands::Check { file } => run::check(config, &file),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
