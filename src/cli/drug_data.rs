//! CLI entry-point for drug graph featurisation.

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::{
    config::Settings,
    data::pairs,
    logging::stage_progress,
    molecule::{self, structure::JsonMoleculeSource, DrugGraphs},
};

#[instrument(skip(settings), fields(dataset = settings.dataset.dir_name()))]
pub fn run(settings: &Settings) -> Result<DrugGraphs> {
    let table = &settings.dataset_filename;
    let records = pairs::read_pairs(table, &settings.dataset.columns())
        .with_context(|| format!("reading pair table {}", table.display()))?;
    let smiles = pairs::smiles_index(&records);
    info!(pairs = records.len(), drugs = smiles.len(), "loaded pair table");

    let source = JsonMoleculeSource::load(&settings.molecules_filename).with_context(|| {
        format!(
            "loading molecular structures {}",
            settings.molecules_filename.display()
        )
    })?;

    let progress = stage_progress(smiles.len(), "featurising drugs");
    let graphs = molecule::featurize_all(&smiles, &source, &progress)?;

    settings.ensure_dataset_dir()?;
    let out = settings.drug_data_path();
    molecule::save_graphs(&out, &graphs)
        .with_context(|| format!("writing drug graphs {}", out.display()))?;
    Ok(graphs)
}
