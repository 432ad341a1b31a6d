use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use itertools::Itertools;

use phantom2d::phantom::Library;

/// List the models in a phantom library
#[derive(clap::Parser, Debug, Clone)]
#[clap(name = "phantom2d-models", about = "List the models in a phantom library")]
struct Cli {
    /// Phantom library file, instead of the built-in one
    #[clap(short, long)]
    library: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let library = Library::load(args.library.as_deref())
        .with_context(|| match &args.library {
            Some(path) => format!("loading phantom library `{}`", path.display()),
            None       => "loading built-in phantom library".into(),
        })?;

    println!("{:>5}  {:>10}  kinds", "model", "components");
    for model in library.models() {
        let kinds = model.kinds()
            .dedup_with_count()
            .map(|(n, kind)| if n == 1 { kind.to_string() } else { format!("{n}×{kind}") })
            .join(", ");
        println!("{:>5}  {:>10}  {kinds}", model.id, model.objects.len());
    }
    Ok(())
}
