//! CLI entry point for the step-by-step puzzle explainer

use clap::Parser;
use stepwise_explainer::io::cli::{Cli, ExplainRunner};

fn main() -> stepwise_explainer::Result<()> {
    let cli = Cli::parse();
    let mut runner = ExplainRunner::new(cli);
    runner.process()
}
