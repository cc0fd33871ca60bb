use colored::Colorize;
use outlink::commands::command_argument_builder;
use outlink::{handle_crawl, init_logging};

#[tokio::main]
async fn main() {
    let chosen_command = command_argument_builder().get_matches();
    init_logging(chosen_command.get_flag("verbose"));

    let result = match chosen_command.subcommand() {
        Some(("crawl", primary_command)) => handle_crawl(primary_command).await,
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}
