mod commands;
mod output;
mod terminal;
mod wordlist;

use commands::{CommandLine, Commands, enumerate, resolvers};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    match commands.command {
        Commands::Enumerate(args) => {
            logging::init(commands.verbose, args.is_silent())?;
            if !args.is_silent() {
                print::banner();
            }
            enumerate::enumerate(args).await
        }
        Commands::Resolvers => {
            logging::init(commands.verbose, false)?;
            print::header("resolver pool");
            resolvers::resolvers();
            Ok(())
        }
    }
}
