use colored::Colorize;

pub mod crawl;
pub mod error;
pub mod lists;
pub mod report;
pub mod whitelist;

pub use error::CoreError;

pub fn print_banner() {
    println!(
        "{} {}",
        "outlink".bright_cyan().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
    println!("{}", "where does your site link to?".bright_black());
    println!();
}
