// Standard library
use std::process::ExitCode;

// 3rd party crates
use clap::Parser;
use tokio::signal::ctrl_c;
use tokio_util::sync::CancellationToken;

// Project imports
use pubip::cli::Args;
use pubip::functions::run;

/// Main entry point for the pubip client.
///
/// Prints the public IP address of this machine. The address is taken from
/// the cache file while it is fresh, otherwise several echo services are
/// queried and the first valid answer wins.
#[tokio::main]
async fn main() -> ExitCode {
    // loads the .env file from the current directory or parents.
    dotenvy::dotenv().ok();

    let args: Args = Args::parse();

    // Ctrl+C abandons a running detection.
    let shutdown = CancellationToken::new();
    let ctrl_c_token = shutdown.clone();
    tokio::spawn(async move {
        if ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    run(args, shutdown).await
}
