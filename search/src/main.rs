use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use uxsearch::{exit_code, run, Args};

fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let args = Args::parse();

    match run(&args) {
        Ok(out) => println!("{out}"),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(exit_code(&e));
        }
    }
}
