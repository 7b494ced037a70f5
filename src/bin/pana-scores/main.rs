use pana_scores::{GitHub, Outcome, parse_args, run};
use tracing::error;

fn handle_clap_help_version(clap_err: &clap::Error) -> ! {
    use clap::error::ErrorKind;
    match clap_err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            print!("{clap_err}");
            std::process::exit(0);
        }
        _ => {
            eprint!("{clap_err}");
            std::process::exit(2);
        }
    }
}

fn init_tracing(debug: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match parse_args(std::env::args_os()) {
        Ok(config) => config,
        Err(err) => {
            if let Some(clap_err) = err.downcast_ref::<clap::Error>() {
                handle_clap_help_version(clap_err);
            } else {
                return Err(err);
            }
        }
    };

    init_tracing(config.debug);

    let forge = GitHub::new(config.github_token.clone());
    let mut echo = std::io::stderr();

    match run(&config, &forge, &mut echo).await {
        Ok(Outcome::DryRun { body }) => {
            print!("{body}");
            Ok(())
        }
        Ok(_) => Ok(()),
        Err(err) => {
            let code = err.exit_code();
            error!("{:#}", anyhow::Error::from(err));
            std::process::exit(code);
        }
    }
}
