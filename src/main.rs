use clap::Parser;
use log::info;
use snafu::ErrorCompat;

mod args;
mod watch;

fn main() {
    let args = args::Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    info!("args: {:?}", args);

    let res = watch::run_report(
        &args.config,
        args.out.as_deref(),
        args.reference.as_deref(),
        args.seed,
        args.timestamp.as_deref(),
    );
    if let Err(e) = res {
        eprintln!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
