//! Command-line interface wiring for ddi-prep.

use anyhow::Result;
use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::config::{Dataset, Settings};

pub mod drug_data;
pub mod split;
pub mod triplets;

/// Top-level CLI definition.
#[derive(Debug, Parser)]
#[command(author, version, about = "Drug-drug interaction corpus preparation", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    overrides: Overrides,
    #[command(subcommand)]
    command: Commands,
}

/// Flags that take precedence over the environment.
#[derive(Debug, Clone, ClapArgs)]
pub struct Overrides {
    /// Raw pair table layout.
    #[arg(long, global = true, value_enum)]
    pub dataset: Option<Dataset>,
    /// Negative samples per positive triplet.
    #[arg(long, global = true)]
    pub neg_ent: Option<usize>,
    #[arg(long, global = true)]
    pub seed: Option<u64>,
    #[arg(long, global = true)]
    pub test_ratio: Option<f64>,
    #[arg(long, global = true)]
    pub n_folds: Option<usize>,
    /// Rejection batches before a corruption request fails.
    #[arg(long, global = true)]
    pub max_retries: Option<usize>,
}

impl Overrides {
    pub fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(dataset) = self.dataset {
            settings = settings.with_dataset(dataset);
        }
        if let Some(neg_ent) = self.neg_ent {
            settings.neg_ent = neg_ent;
        }
        if let Some(seed) = self.seed {
            settings.seed = seed;
        }
        if let Some(ratio) = self.test_ratio {
            settings.test_ratio = ratio;
        }
        if let Some(n_folds) = self.n_folds {
            settings.n_folds = n_folds;
        }
        if let Some(retries) = self.max_retries {
            settings.max_sampling_retries = retries;
        }
        settings
    }
}

impl Cli {
    /// Parse CLI arguments from the environment.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Dispatch the selected sub-command.
    pub fn dispatch(self, settings: Settings) -> Result<()> {
        let settings = self.overrides.apply(settings);
        match self.command {
            Commands::DrugData => drug_data::run(&settings).map(|_| ()),
            Commands::Triplets(args) => triplets::run(args, &settings),
            Commands::Split(args) => split::run(args, &settings),
            Commands::All(args) => {
                split::validate(&args.split, &settings)?;
                drug_data::run(&settings)?;
                triplets::run(args.triplets, &settings)?;
                split::run(args.split, &settings)
            }
        }
    }
}

/// Supported sub-commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Featurise every drug of the pair table into graphs.
    DrugData,
    /// Sample negatives and write the annotated triplet table.
    Triplets(triplets::TripletsArgs),
    /// Write stratified train/test folds of the triplet table.
    Split(split::SplitArgs),
    /// Run every stage in order.
    All(AllArgs),
}

#[derive(Debug, Clone, ClapArgs)]
pub struct AllArgs {
    #[command(flatten)]
    pub triplets: triplets::TripletsArgs,
    #[command(flatten)]
    pub split: split::SplitArgs,
}
