use anyhow::Result;
use clap::Parser;

use downsize::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
