mod cli;
mod config;
mod database;
mod error;
mod import;
mod logging;
mod progress;
mod reconciler;
mod reports;
mod run;
mod schema;
mod slug;
mod users;

use cli::Cli;
use log::error;

fn main() {
    if let Err(err) = Cli::handle_command_line() {
        error!("{:?}", err);
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
