mod args;
mod browser;
mod error;
mod serve;
mod signal;

use clap::Parser as _;
use proc_exit::WithCodeResultExt as _;

fn main() {
    human_panic::setup_panic!();
    let result = run();
    proc_exit::exit(result);
}

fn run() -> proc_exit::ExitResult {
    let cli = args::Cli::parse();

    cli.color.write_global();
    let colored_stderr = !matches!(
        anstream::AutoStream::choice(&std::io::stderr()),
        anstream::ColorChoice::Never
    );
    args::init_logging(cli.verbose, colored_stderr);

    cli.serve.run().with_code(proc_exit::Code::FAILURE)?;

    Ok(())
}
