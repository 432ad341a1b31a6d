mod cli;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use phantom2d::config::demo::Config;
use phantom2d::pipeline::Pipeline;

use cli::Cli;

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = match args.verbose { 0 => "info", 1 => "debug", _ => "trace" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = args.threads {
        // Set the maximum number of threads used by rayon for parallel iteration
        rayon::ThreadPoolBuilder::new().num_threads(threads).build_global()
            .context("configuring thread pool")?;
        info!(threads, "thread pool");
    }

    let mut config = match &args.config {
        Some(path) => Config::read(path).with_context(|| format!("reading config `{}`", path.display()))?,
        None       => Config::default(),
    };
    args.apply(&mut config);

    phantom2d::progress::enable(true);
    let pipeline = Pipeline::new(config).context("setting up the run")?;
    let report = pipeline.run().context("running the pipeline")?;
    let summary = report.write(&args.out, args.format)
        .with_context(|| format!("writing results to `{}`", args.out.display()))?;

    println!("FBP  ‖ideal − error‖/‖error‖ = {:.4}", report.fbp_ratio);
    println!("SIRT ‖ideal − error‖/‖error‖ = {:.4}", report.sirt_ratio);
    for (name, rmse) in &report.rmse {
        println!("RMSE {name:<18} {rmse:.4}");
    }
    println!("Summary written to {}", summary.display());
    Ok(())
}
