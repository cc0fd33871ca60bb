use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use outlink_core::crawl::{CrawlOptions, execute_crawl};
use outlink_core::lists::load_known_dead;
use outlink_core::report::{OutboundReport, ReportFormat, render_report, save_report};
use outlink_core::whitelist::{Whitelist, bare_domain};
use outlink_core::print_banner;
use outlink_scanner::CrawlConfig;
use std::collections::HashSet;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;
use url::Url;

/// Everything the `crawl` subcommand needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct CrawlArgs {
    pub start_url: Url,
    pub domain: String,
    pub page_limit: i64,
    pub concurrency: usize,
    pub attempts: usize,
    pub timeout: Duration,
    pub show_dead_links: bool,
    pub whitelist_file: PathBuf,
    pub dead_urls_file: PathBuf,
    pub interactive: bool,
    pub format: ReportFormat,
    pub output: Option<PathBuf>,
    pub quiet: bool,
}

impl CrawlArgs {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let start_url = matches
            .get_one::<Url>("starting-url")
            .cloned()
            .ok_or_else(|| anyhow!("Missing required argument: --starting-url"))?;
        let domain = matches
            .get_one::<String>("domain")
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .ok_or_else(|| anyhow!("Missing required argument: --domain"))?;

        let whitelist_file = match matches.get_one::<PathBuf>("domains-whitelist-file") {
            Some(path) => expand_path(path),
            None => default_whitelist_path(&domain),
        };
        let dead_urls_file = match matches.get_one::<PathBuf>("dead-external-urls") {
            Some(path) => expand_path(path),
            None => default_dead_list_path(&domain),
        };

        let format = matches
            .get_one::<String>("format")
            .map(|f| {
                ReportFormat::from_str(f).ok_or_else(|| anyhow!("Unknown report format: {}", f))
            })
            .transpose()?
            .unwrap_or(ReportFormat::Text);

        Ok(Self {
            start_url,
            domain,
            page_limit: matches
                .get_one::<i64>("num-url-crawl-limit")
                .copied()
                .unwrap_or(-1),
            concurrency: matches
                .get_one::<usize>("num-concurrent-crawls")
                .copied()
                .unwrap_or(outlink_scanner::config::DEFAULT_MAX_CONCURRENCY),
            attempts: matches
                .get_one::<usize>("num-retry")
                .copied()
                .unwrap_or(outlink_scanner::config::DEFAULT_MAX_ATTEMPTS),
            timeout: matches
                .get_one::<u64>("timeout")
                .map(|secs| Duration::from_secs(*secs))
                .unwrap_or(outlink_scanner::config::DEFAULT_REQUEST_TIMEOUT),
            show_dead_links: matches.get_flag("show-dead-links"),
            whitelist_file,
            dead_urls_file,
            interactive: !matches.get_flag("no-interactive"),
            format,
            output: matches.get_one::<PathBuf>("output").map(|p| expand_path(p)),
            quiet: matches.get_flag("quiet"),
        })
    }

    pub fn crawl_config(&self, known_dead: HashSet<outlink_scanner::PageId>) -> CrawlConfig {
        CrawlConfig::new(self.domain.clone())
            .with_page_limit(self.page_limit)
            .with_max_concurrency(self.concurrency)
            .with_max_attempts(self.attempts)
            .with_request_timeout(self.timeout)
            .with_liveness_checks(self.show_dead_links)
            .with_known_dead(known_dead)
    }

    /// JSON on stdout must stay machine readable.
    fn writes_json_to_stdout(&self) -> bool {
        self.format == ReportFormat::Json && self.output.is_none()
    }
}

pub fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
}

pub fn default_whitelist_path(domain: &str) -> PathBuf {
    PathBuf::from(format!("./{}_whitelisted_outbound_domains.txt", domain))
}

pub fn default_dead_list_path(domain: &str) -> PathBuf {
    PathBuf::from(format!(
        "./{}_whitelisted_outbound_urls_known_dead_or_blocked.txt",
        domain
    ))
}

/// Install the stderr subscriber. Safe to call more than once.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn print_divider<W: Write>(output: &mut W) -> io::Result<()> {
    writeln!(output, "{}", "═".repeat(60).bright_blue().bold())
}

fn print_prompt<R: BufRead, W: Write>(
    msg: &str,
    input: &mut R,
    output: &mut W,
) -> io::Result<Option<String>> {
    write!(output, "{} ", msg.bright_cyan().bold())?;
    output.flush()?;
    let mut response = String::new();
    if input.read_line(&mut response)? == 0 {
        return Ok(None);
    }
    Ok(Some(response.trim().to_lowercase()))
}

/// Offer every reported domain that is not yet whitelisted, once each.
///
/// Accepted domains are added in memory and appended to the whitelist file
/// immediately. Ends early when input runs out. Returns the accepted domains.
pub fn review_interactively<R: BufRead, W: Write>(
    report: &OutboundReport,
    whitelist: &mut Whitelist,
    mut input: R,
    mut output: W,
) -> Result<Vec<String>> {
    let mut accepted = Vec::new();
    let mut asked = HashSet::new();

    for link in &report.outbound {
        let domain = bare_domain(&link.domain).to_string();
        if domain.is_empty() || whitelist.contains_host(&domain) || !asked.insert(domain.clone())
        {
            continue;
        }

        let msg = format!("Whitelist domain \"{}\" [y/N]?", domain);
        let Some(response) = print_prompt(&msg, &mut input, &mut output)? else {
            writeln!(output)?;
            break;
        };

        if response == "y" || response == "yes" {
            whitelist.accept(&domain)?;
            writeln!(output, "{} {} whitelisted", "✓".green(), domain)?;
            accepted.push(domain);
        }
    }

    Ok(accepted)
}

/// Load the lists, crawl, and build the report. No output is written.
pub async fn run_crawl(args: &CrawlArgs) -> Result<(OutboundReport, Whitelist)> {
    let whitelist = Whitelist::load(&args.whitelist_file)?;
    let known_dead = load_known_dead(&args.dead_urls_file)?;
    info!(
        count = known_dead.len(),
        file = %args.dead_urls_file.display(),
        "Known dead outbound urls loaded"
    );

    let options = CrawlOptions {
        start_url: args.start_url.to_string(),
        config: args.crawl_config(known_dead),
        show_progress_bars: !args.quiet && io::stderr().is_terminal(),
    };
    let outcome = execute_crawl(options, None)
        .await
        .with_context(|| format!("Crawl of {} failed", args.start_url))?;

    let report = OutboundReport::build(&outcome, &args.domain, &whitelist, args.show_dead_links);
    Ok((report, whitelist))
}

pub async fn handle_crawl(sub_matches: &ArgMatches) -> Result<()> {
    let args = CrawlArgs::from_matches(sub_matches)?;

    if !args.quiet && !args.writes_json_to_stdout() {
        print_banner();
    }

    let (report, mut whitelist) = run_crawl(&args).await?;
    let rendered = render_report(&report, args.format)?;

    match args.output {
        Some(ref path) => {
            save_report(&rendered, path)?;
            info!(file = %path.display(), "Report saved");
        }
        None => print!("{}", rendered),
    }

    if !args.interactive || report.outbound.is_empty() {
        return Ok(());
    }
    if !io::stdin().is_terminal() {
        warn!("stdin is not a terminal, skipping whitelist review");
        return Ok(());
    }

    // Prompts go to stderr when stdout carries the JSON report.
    let accepted = if args.writes_json_to_stdout() {
        let mut stderr = io::stderr();
        print_divider(&mut stderr)?;
        review_interactively(&report, &mut whitelist, io::stdin().lock(), stderr)?
    } else {
        let mut stdout = io::stdout();
        print_divider(&mut stdout)?;
        review_interactively(&report, &mut whitelist, io::stdin().lock(), stdout)?
    };

    info!(
        accepted = accepted.len(),
        file = %whitelist.path().display(),
        "Whitelist review finished"
    );
    Ok(())
}
