//! mstack - multistack command-line entry point

use multistack::cli;
use multistack::ui::output;

fn main() {
    if let Err(err) = cli::run() {
        output::error(format!("{:#}", err));
        std::process::exit(1);
    }
}
