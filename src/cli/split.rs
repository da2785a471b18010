//! CLI entry-point for writing stratified folds.

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use crate::{
    config::Settings,
    data::dataset::{self, AnnotatedRow},
    folds::{check_ratio, FoldSplitter},
};

/// Args for the `split` sub-command.
#[derive(Debug, Clone, ClapArgs)]
pub struct SplitArgs {
    /// Also hold out this share of every training fold as a validation file.
    #[arg(long)]
    pub validation_ratio: Option<f64>,
}

/// Reject fold and validation settings before any stage writes output.
pub fn validate(args: &SplitArgs, settings: &Settings) -> Result<FoldSplitter> {
    let splitter = FoldSplitter::new(settings.n_folds, settings.test_ratio, settings.seed)?;
    if let Some(ratio) = args.validation_ratio {
        check_ratio(ratio)?;
    }
    Ok(splitter)
}

#[instrument(skip(settings), fields(dataset = settings.dataset.dir_name()))]
pub fn run(args: SplitArgs, settings: &Settings) -> Result<()> {
    let source = settings.triplets_path();
    let rows = dataset::read_rows(&source).with_context(|| {
        format!("reading {} (run `triplets` first)", source.display())
    })?;

    let splitter = validate(&args, settings)?;
    let folds = splitter.split(&rows, |row| row.relation)?;

    for fold in &folds {
        let mut train = fold.train_rows(&rows);
        if let Some(ratio) = args.validation_ratio {
            let partition = FoldSplitter::train_valid(&train, ratio, fold.index, |row| row.relation)?;
            let valid: Vec<&AnnotatedRow> = partition.held_out.iter().map(|&i| train[i]).collect();
            write(settings, "valid", fold.index, valid)?;
            train = partition.train.iter().map(|&i| train[i]).collect();
        }
        write(settings, "train", fold.index, train)?;
        write(settings, "test", fold.index, fold.test_rows(&rows))?;
    }
    info!(folds = folds.len(), rows = rows.len(), "fold files ready");
    Ok(())
}

fn write(settings: &Settings, part: &str, fold: usize, rows: Vec<&AnnotatedRow>) -> Result<()> {
    let path = settings.fold_path(part, fold);
    dataset::write_rows(&path, rows).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
