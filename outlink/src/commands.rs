use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("outlink")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("outlink")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and progress output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Log debug output to stderr")
                .required(false)
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl a site from its starting page and report every link that leaves \
                the domain.",
                )
                .arg(
                    arg!(-u --"starting-url" <URL>)
                        .required(true)
                        .help("The url to start the crawl from, usually the homepage, e.g. https://example.com")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-d --"domain" <DOMAIN>)
                        .required(true)
                        .help(
                            "The domain of the website; everything else is outbound. Do not \
                        prefix www, e.g. example.com",
                        ),
                )
                .arg(
                    arg!(-l --"num-url-crawl-limit" <NUM_URLS>)
                        .required(false)
                        .help("Number of urls to crawl (zero or negative: unlimited)")
                        .value_parser(clap::value_parser!(i64))
                        .allow_negative_numbers(true)
                        .default_value("-1"),
                )
                .arg(
                    arg!(-c --"num-concurrent-crawls" <NUM_REQUESTS>)
                        .required(false)
                        .help("Number of concurrent requests to the website")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("20"),
                )
                .arg(
                    arg!(-r --"num-retry" <ATTEMPTS>)
                        .required(false)
                        .help("Number of attempts to fetch a url")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("3"),
                )
                .arg(
                    arg!(-t --"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"show-dead-links")
                        .required(false)
                        .help("Probe outbound links once and report the ones that are dead now")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-w --"domains-whitelist-file" <PATH>)
                        .required(false)
                        .help(
                            "Newline separated whitelisted domains; links to them are not \
                        reported. Empty lines and lines starting with // are ignored \
                        (default: ./<domain>_whitelisted_outbound_domains.txt)",
                        )
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(--"dead-external-urls" <PATH>)
                        .required(false)
                        .help(
                            "Newline separated external urls that cannot be crawled, e.g. \
                        because they block crawlers. Must exist, even if empty \
                        (default: ./<domain>_whitelisted_outbound_urls_known_dead_or_blocked.txt)",
                        )
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(--"no-interactive")
                        .required(false)
                        .help("Do not prompt to whitelist newly found domains")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
}
