use brainage::Cli;
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let mut cmd: Cli = Cli::parse();
    cmd.init_logging();
    cmd.run_program()
}
