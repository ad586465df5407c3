use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use digikuery::{logging, Config, Database, Digikuery};

const EXAMPLES: &str = r#"EXAMPLES:
    List albums where tag 'Paquerette' is present, with the other tags of each album
    $ digikuery tag Paquerette

    Same, only showing co-occurring tags that match 'flow' (the value needs '=')
    $ digikuery -T=flow tag Paquerette
    $ digikuery --filter-tags=flow tag Paquerette

    Same, without co-occurring tags
    $ digikuery -T tag Paquerette

ENVIRONMENT:
    DIGIKUERY_CONFIG    Path to config file (overrides default location)
    DIGIKUERY_LOG       Log level (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/digikuery/config.toml"#;

#[derive(Parser)]
#[command(name = "digikuery")]
#[command(version, about = "digikuery - digiKam database query tool", after_help = EXAMPLES)]
struct Cli {
    /// Database path or sqlite:/// URI
    #[arg(short = 'd', long = "dbpath", global = true)]
    dbpath: Option<String>,

    /// Display full tag names
    #[arg(short = 'F', long, global = true)]
    full_tagname: bool,

    /// Restrict queries to this album root
    #[arg(short = 'R', long, global = true)]
    root: Option<String>,

    /// Show and filter tags for displayed albums; the pattern needs '=' (-T=PATTERN,
    /// --filter-tags=PATTERN), a bare -T hides them
    #[arg(
        short = 'T',
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "",
        global = true
    )]
    filter_tags: Option<String>,

    /// Path to config file
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    /// Command line values win over the config file.
    fn apply(&self, config: &mut Config) {
        if let Some(dbpath) = &self.dbpath {
            config.database = dbpath.clone();
        }
        if let Some(root) = &self.root {
            config.root = Some(root.clone());
        }
        if let Some(filter_tags) = &self.filter_tags {
            config.filter_tags = Some(filter_tags.clone());
        }
        if self.full_tagname {
            config.full_tagname = true;
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Interactive shell to explore the database
    Shell,
    /// Dump the database schema
    Schema,
    /// List tags for one or all albums
    Album {
        /// Substring of the album path
        album_name: Option<String>,
    },
    /// List all tags or query matching tags
    Tag {
        /// Case-insensitive pattern matched against full tag names
        tag_name: Option<String>,
        /// Sort albums by result count
        #[arg(short = 'C', long)]
        sort_count: bool,
        /// Show image details
        #[arg(short = 'I', long)]
        show_image: bool,
    },
    /// Show database statistics (default)
    Stats,
}

/// One line typed at the shell prompt
#[derive(Parser)]
#[command(name = "digikuery", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Command,
}

fn run(dk: &Digikuery, command: &Command) -> Result<String> {
    let text = match command {
        Command::Shell => "already in the shell".to_string(),
        Command::Schema => dk.schema()?.to_string(),
        Command::Album { album_name } => dk.query_album(album_name.as_deref())?.to_string(),
        Command::Tag { tag_name, sort_count, show_image } => {
            dk.query_tag(tag_name.as_deref(), *show_image, *sort_count)?.to_string()
        }
        Command::Stats => dk.stats()?.to_string(),
    };
    Ok(text)
}

fn shell(dk: &Digikuery) -> Result<()> {
    println!("digikuery shell on {}", dk.database().uri());
    println!("commands: album [NAME], tag [NAME] [-C] [-I], schema, stats, help, quit");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("digikuery> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line?;
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => continue,
            ["quit"] | ["exit"] => break,
            _ => {}
        }

        match ShellLine::try_parse_from(words.iter().copied()) {
            Ok(parsed) => match run(dk, &parsed.command) {
                Ok(text) => println!("{}", text),
                Err(e) => eprintln!("Error: {:#}", e),
            },
            Err(e) => {
                let _ = e.print();
            }
        }
    }
    Ok(())
}

/// Config from `--config`, or from the default location when a file exists
/// there. The second value is the default path that had no file.
fn load_config(cli: &Cli) -> Result<(Config, Option<PathBuf>)> {
    if let Some(path) = &cli.config {
        return Ok((Config::load_from(path)?, None));
    }
    let path = Config::path();
    let loaded = match Config::load_if_exists(&path)? {
        Some(config) => (config, None),
        None => (Config::default(), Some(path)),
    };
    Ok(loaded)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, missing) = load_config(&cli)?;
    cli.apply(&mut config);

    let _ = logging::init(config.log_dir.as_deref(), cli.verbose);
    if let Some(path) = missing {
        tracing::debug!("Config file not found at {:?}, using defaults", path);
    }

    let db = Database::open(&config.database)
        .with_context(|| format!("Failed to open database {}", config.database))?;
    let dk = Digikuery::new(db, config.query_options()?);

    match cli.command.unwrap_or(Command::Stats) {
        Command::Shell => shell(&dk),
        command => {
            println!("{}", run(&dk, &command)?);
            Ok(())
        }
    }
}
