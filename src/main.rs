use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use surf_view::app::App;
use surf_view::config::{AppConfig, CliArgs};

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // Init tracing
    let filter = if args.verbose {
        EnvFilter::new("surf_view=debug")
    } else {
        EnvFilter::new("surf_view=info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config: AppConfig = args.into();

    match App::run(&config) {
        Ok(result) => {
            println!("Done in {:.2}s", result.duration.as_secs_f64());
            Ok(())
        }
        Err(e) => {
            error!(%e, "Command failed");
            Err(anyhow::anyhow!(e)).context("surf-view command failed")
        }
    }
}
