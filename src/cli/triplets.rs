//! CLI entry-point for negative sampling and triplet table generation.

use std::fs;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use rand::{rngs::StdRng, SeedableRng};
use tracing::{info, instrument};

use crate::{
    config::Settings,
    data::{dataset, fingerprint::FingerprintTable, pairs},
    logging::stage_progress,
    molecule,
    sampling::{CorruptionPolicy, NegativeSampler, RelationStatistics, TripletDatasetBuilder},
};

/// Args for the `triplets` sub-command.
#[derive(Debug, Clone, ClapArgs)]
pub struct TripletsArgs {
    /// How the corrupted endpoint is chosen.
    #[arg(long, value_enum, default_value_t = CorruptionPolicy::Biased)]
    pub policy: CorruptionPolicy,
}

#[instrument(skip(settings), fields(dataset = settings.dataset.dir_name()))]
pub fn run(args: TripletsArgs, settings: &Settings) -> Result<()> {
    let graphs_path = settings.drug_data_path();
    let graphs = molecule::load_graphs(&graphs_path).with_context(|| {
        format!(
            "loading drug graphs {} (run `drug-data` first)",
            graphs_path.display()
        )
    })?;
    let universe = molecule::universe_of(&graphs)?;

    let table = &settings.dataset_filename;
    let records = pairs::read_pairs(table, &settings.dataset.columns())
        .with_context(|| format!("reading pair table {}", table.display()))?;
    let smiles = pairs::smiles_index(&records);
    let positives = pairs::positive_triplets(&records, &universe)?;
    let statistics = RelationStatistics::build(&positives, &universe)?;

    let fingerprints = FingerprintTable::load(&settings.fingerprint_filename).with_context(|| {
        format!(
            "loading fingerprints {}",
            settings.fingerprint_filename.display()
        )
    })?;

    let sampler = NegativeSampler::new(&statistics, &universe)
        .with_policy(args.policy)
        .with_max_retries(settings.max_sampling_retries);
    let builder = TripletDatasetBuilder::new(sampler, &fingerprints, settings.neg_ent)
        .with_smiles(&smiles);
    let mut rng = StdRng::seed_from_u64(settings.seed);
    let progress = stage_progress(positives.len(), "sampling negatives");
    let rows = builder.build_with_progress(&positives, &mut rng, &progress)?;

    let snapshot = serde_json::to_vec_pretty(&statistics.snapshot())
        .context("serialising relation statistics")?;

    settings.ensure_dataset_dir()?;
    let out = settings.triplets_path();
    dataset::write_rows(&out, &rows).with_context(|| format!("writing {}", out.display()))?;
    let stats_path = settings.statistics_path();
    fs::write(&stats_path, snapshot).with_context(|| format!("writing {}", stats_path.display()))?;
    info!(
        rows = rows.len(),
        neg_ent = settings.neg_ent,
        policy = ?args.policy,
        "triplet table ready"
    );
    Ok(())
}
