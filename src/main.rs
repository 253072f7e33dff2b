use std::{error::Error, process};

use clap::Parser;
use colored::Colorize;
use kmerbin::{cli::Args, config::Config, run};

fn main() {
    let args = Args::parse();
    let quiet = args.quiet;

    #[cfg(feature = "tracing")]
    init_tracing(quiet);

    let config = Config::from(args);

    if !quiet {
        banner(&config);
    }

    match run::run(&config) {
        Ok(table) => {
            if !quiet {
                eprintln!(
                    "{}: {} reads, {} clusters, {} noise",
                    "binned".bold(),
                    table.n_reads().to_string().blue().bold(),
                    table.n_clusters().to_string().blue().bold(),
                    table.n_noise().to_string().blue().bold()
                );
                eprintln!(
                    "{}: {}",
                    "table".bold(),
                    config.output.display().to_string().underline().bold().blue()
                );
                if config.plot {
                    eprintln!(
                        "{}: {}",
                        "plot".bold(),
                        config
                            .plot_path()
                            .display()
                            .to_string()
                            .underline()
                            .bold()
                            .blue()
                    );
                }
            }
        }
        Err(e) => {
            eprintln!(
                "{}\n {}",
                "Application error:".blue().bold(),
                e.to_string().blue()
            );
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("  {} {}", "caused by:".bold(), cause);
                source = cause.source();
            }
            process::exit(1);
        }
    }
}

fn banner(config: &Config) {
    eprintln!("{}: {}", "data".bold(), config.input.to_string().underline().bold().blue());
    eprintln!(
        "{}: n_neighbors={} min_dist={} metric={} n_components={}{}",
        "umap".bold(),
        config.embed.n_neighbors,
        config.embed.min_dist,
        config.embed.metric.blue().bold(),
        config.embed.n_components,
        if config.embed.low_memory {
            " low_memory"
        } else {
            ""
        }
    );
    eprintln!(
        "{}: min_cluster_size={} min_samples={} epsilon={}",
        "hdbscan".bold(),
        config.cluster.min_cluster_size,
        config.cluster.min_samples,
        config.cluster.epsilon
    );
    eprintln!();
}

#[cfg(feature = "tracing")]
fn init_tracing(quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if quiet { "warn" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
