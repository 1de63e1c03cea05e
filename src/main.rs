use anyhow::{bail, Context, Result};
use clap::error::ErrorKind;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use threadscrape::{
    init_tracing_once, is_writable_dir, load_blacklist, load_list_from_file, load_query_params, Blacklist,
    ContentProvider, Credentials, Day, PushshiftClient, RedditClient, RunSummary, Scraper, PUSHSHIFT_ENDPOINT,
};

/// Scrapes subreddits and puts their content in plain text files, one sentence per line.
/// Use --posts to download posts, --subs to download subreddits, and --config (or no
/// list at all) to make custom Pushshift calls over the whole index.
#[derive(Parser, Debug)]
#[command(name = "threadscrape", version, arg_required_else_help = true)]
#[command(group(ArgGroup::new("mode").args(["posts", "subs", "config"]).multiple(false)))]
struct Cli {
    /// File with the ids of the posts to download, one per line
    #[arg(long)]
    posts: Option<PathBuf>,

    /// File with the subreddits to download, one per line
    #[arg(long)]
    subs: Option<PathBuf>,

    /// Tab-separated `key<TAB>value` file of extra Pushshift parameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// First day to scrape, YYYY-MM-DD
    #[arg(long)]
    start: Option<String>,

    /// Last day to scrape, YYYY-MM-DD
    #[arg(long)]
    end: Option<String>,

    /// Output directory (must exist and be writable)
    #[arg(long)]
    output: PathBuf,

    /// File of lines to leave out of the output
    #[arg(long)]
    blacklist: Option<PathBuf>,

    /// Number of parallel workers
    #[arg(long, default_value_t = 1)]
    workers: usize,

    /// Prefix every line with "<author> : "
    #[arg(long, env = "THREADSCRAPE_PRINT_USERS")]
    print_users: bool,

    /// Keep posts deleted by their author
    #[arg(long)]
    keep_deleted: bool,

    /// Keep posts removed by moderators or bots
    #[arg(long)]
    keep_removed: bool,

    /// Exit with status 2 when windows were abandoned or items failed
    #[arg(long)]
    strict: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    #[arg(long, env = "REDDIT_CLIENT_ID", hide_env_values = true)]
    client_id: Option<String>,

    #[arg(long, env = "REDDIT_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    #[arg(long, env = "REDDIT_USER_AGENT", default_value = concat!("threadscrape/", env!("CARGO_PKG_VERSION")))]
    user_agent: String,

    #[arg(long, env = "PUSHSHIFT_ENDPOINT", default_value = PUSHSHIFT_ENDPOINT)]
    pushshift_endpoint: String,
}

enum Mode {
    Posts(Vec<String>),
    Subs { names: Vec<String>, start: Day, end: Day },
    Corpus { start: Day, end: Day, config: Option<PathBuf> },
}

impl Mode {
    /// Units the dispatcher will run: one per post, per subreddit, or per window.
    fn unit_count(&self, workers: usize) -> usize {
        match self {
            Mode::Posts(ids) => ids.len(),
            Mode::Subs { names, .. } => names.len(),
            Mode::Corpus { .. } => workers.max(1),
        }
    }
}

/// Progress bar only for runs with more than one unit.
fn show_progress(no_progress: bool, units: usize) -> bool {
    !no_progress && units > 1
}

fn parse_day(flag: &str, value: Option<&str>) -> Result<Day> {
    let value = value.with_context(|| format!("--{} is required in --config or --subs mode", flag))?;
    value.parse::<Day>().with_context(|| format!("invalid --{}", flag))
}

fn resolve_mode(cli: &Cli) -> Result<Mode> {
    if let Some(posts) = &cli.posts {
        return Ok(Mode::Posts(load_list_from_file(posts)?));
    }
    let start = parse_day("start", cli.start.as_deref())?;
    let end = parse_day("end", cli.end.as_deref())?;
    if end < start {
        bail!("--end {} is before --start {}", end, start);
    }
    match &cli.subs {
        Some(subs) => Ok(Mode::Subs { names: load_list_from_file(subs)?, start, end }),
        None => Ok(Mode::Corpus { start, end, config: cli.config.clone() }),
    }
}

fn run(cli: Cli) -> Result<RunSummary> {
    init_tracing_once();

    if !is_writable_dir(&cli.output) {
        bail!("{} is not a valid directory or it is not writable", cli.output.display());
    }
    let mode = resolve_mode(&cli)?;
    let progress = show_progress(cli.no_progress, mode.unit_count(cli.workers));
    let blacklist = match &cli.blacklist {
        Some(p) => load_blacklist(p)?,
        None => Blacklist::new(),
    };

    let creds = Credentials {
        client_id: cli.client_id.clone().unwrap_or_default(),
        client_secret: cli.client_secret.clone().unwrap_or_default(),
        user_agent: cli.user_agent.clone(),
    };
    let reddit = RedditClient::new(creds).context("set REDDIT_CLIENT_ID and REDDIT_CLIENT_SECRET")?;
    reddit
        .verify()
        .context("Login failed. Please double check your application tokens.")?;
    let pushshift = PushshiftClient::new(&cli.user_agent)?.with_endpoint(cli.pushshift_endpoint.clone());

    let scraper = Scraper::new(Arc::new(reddit), Arc::new(pushshift))
        .output_dir(&cli.output)
        .blacklist(blacklist)
        .workers(cli.workers)
        .attribution(cli.print_users)
        .skip_deleted(!cli.keep_deleted)
        .skip_removed(!cli.keep_removed)
        .progress(progress);

    match mode {
        Mode::Posts(ids) => scraper.scrape_posts(&ids),
        Mode::Subs { names, start, end } => scraper.scrape_subreddits(&names, start, end),
        Mode::Corpus { start, end, config } => {
            let params = match config {
                Some(p) => load_query_params(&p)?,
                None => Vec::new(),
            };
            scraper.scrape_corpus(start, end, &params)
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => e.exit(),
            _ => {
                let _ = e.print();
                return ExitCode::from(1);
            }
        },
    };
    let strict = cli.strict;

    match run(cli) {
        Ok(summary) => {
            if summary.lost_data() {
                eprintln!(
                    "Warning: {} abandoned window(s), {} failed item(s), {} failed unit(s)",
                    summary.windows_abandoned, summary.items_failed, summary.units_failed
                );
                if strict {
                    return ExitCode::from(2);
                }
            }
            println!("Done!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            eprintln!("Exiting...");
            ExitCode::from(1)
        }
    }
}
