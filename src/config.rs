//! Runtime configuration utilities for ddi-prep.

use std::{
    env,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::Context;
use clap::ValueEnum;

const TRIPLETS_STEM: &str = "pair_pos_neg_triplets";

/// Raw pair tables understood by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Dataset {
    Drugbank,
    Twosides,
    Zhangddi,
}

/// Column names of one raw pair table.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMap {
    pub head_id: &'static str,
    pub tail_id: &'static str,
    pub head_smiles: &'static str,
    pub tail_smiles: &'static str,
    pub relation: &'static str,
}

impl Dataset {
    pub fn columns(self) -> ColumnMap {
        match self {
            Self::Drugbank => ColumnMap {
                head_id: "d1",
                tail_id: "d2",
                head_smiles: "smile1",
                tail_smiles: "smile2",
                relation: "type",
            },
            Self::Twosides => ColumnMap {
                head_id: "Drug1_ID",
                tail_id: "Drug2_ID",
                head_smiles: "Drug1",
                tail_smiles: "Drug2",
                relation: "New Y",
            },
            Self::Zhangddi => ColumnMap {
                head_id: "drugbank_id_1",
                tail_id: "drugbank_id_2",
                head_smiles: "smiles_1",
                tail_smiles: "smiles_2",
                relation: "label",
            },
        }
    }

    /// Directory name used below the data root.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Drugbank => "drugbank",
            Self::Twosides => "twosides",
            Self::Zhangddi => "zhangddi",
        }
    }
}

impl FromStr for Dataset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true).map_err(|_| anyhow::anyhow!("unknown dataset {s}"))
    }
}

/// Application configuration resolved from `.env` and defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root folder for inputs and generated artefacts.
    pub data_dir: PathBuf,
    /// Which raw pair table layout to read.
    pub dataset: Dataset,
    /// Raw drug pair table.
    pub dataset_filename: PathBuf,
    /// Fingerprint table providing auxiliary vectors.
    pub fingerprint_filename: PathBuf,
    /// Pre-parsed molecular structures.
    pub molecules_filename: PathBuf,
    /// Negative samples drawn per positive triplet.
    pub neg_ent: usize,
    /// Seed for every random draw in a run.
    pub seed: u64,
    pub test_ratio: f64,
    pub n_folds: usize,
    /// Rejection batches tried before a corruption request gives up.
    pub max_sampling_retries: usize,
}

impl Settings {
    /// Load configuration from environment with reasonable defaults.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./Data"));
        let dataset = match env::var("DATASET") {
            Ok(value) => value.parse().context("parsing DATASET")?,
            Err(_) => Dataset::Drugbank,
        };
        let dataset_filename = env::var("DATASET_FILENAME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_dataset_filename(&data_dir, dataset));
        let fingerprint_filename = env::var("FINGERPRINT_FILENAME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("fingerprint.csv"));
        let molecules_filename = env::var("MOLECULES_FILENAME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("molecules.json"));

        Ok(Self {
            data_dir,
            dataset,
            dataset_filename,
            fingerprint_filename,
            molecules_filename,
            neg_ent: parse_var("NEG_ENT", 1)?,
            seed: parse_var("SEED", 0)?,
            test_ratio: parse_var("TEST_RATIO", 0.2)?,
            n_folds: parse_var("N_FOLDS", 3)?,
            max_sampling_retries: parse_var("MAX_SAMPLING_RETRIES", 1000)?,
        })
    }

    /// Switch dataset layout; the pair table follows unless `DATASET_FILENAME` pins it.
    pub fn with_dataset(mut self, dataset: Dataset) -> Self {
        if env::var_os("DATASET_FILENAME").is_none() {
            self.dataset_filename = default_dataset_filename(&self.data_dir, dataset);
        }
        self.dataset = dataset;
        self
    }

    /// Folder holding every artefact of the configured dataset.
    pub fn dataset_dir(&self) -> PathBuf {
        self.data_dir.join(self.dataset.dir_name())
    }

    /// Convenience helper for derived artefact paths.
    pub fn join_dataset<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.dataset_dir().join(path)
    }

    pub fn drug_data_path(&self) -> PathBuf {
        self.join_dataset("drug_data.json")
    }

    pub fn triplets_path(&self) -> PathBuf {
        self.join_dataset(format!("{TRIPLETS_STEM}.csv"))
    }

    pub fn statistics_path(&self) -> PathBuf {
        self.join_dataset("data_statistics.json")
    }

    /// Per-fold partition file, `part` being `train`, `test` or `valid`.
    pub fn fold_path(&self, part: &str, fold: usize) -> PathBuf {
        self.join_dataset(format!("{TRIPLETS_STEM}_{part}_fold{fold}.csv"))
    }

    /// Create the dataset folder if it does not exist yet.
    pub fn ensure_dataset_dir(&self) -> anyhow::Result<PathBuf> {
        let dir = self.dataset_dir();
        std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        Ok(dir)
    }
}

fn default_dataset_filename(data_dir: &Path, dataset: Dataset) -> PathBuf {
    data_dir.join(format!("{}.csv", dataset.dir_name()))
}

fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("parsing {key}={raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zhangddi_pairs_smiles_with_matching_ids() {
        let columns = Dataset::Zhangddi.columns();
        assert_eq!(columns.head_id, "drugbank_id_1");
        assert_eq!(columns.head_smiles, "smiles_1");
        assert_eq!(columns.tail_smiles, "smiles_2");
    }

    #[test]
    fn artefacts_live_below_the_dataset_folder() {
        let settings = Settings {
            data_dir: PathBuf::from("/data"),
            dataset: Dataset::Twosides,
            dataset_filename: PathBuf::from("/data/twosides.csv"),
            fingerprint_filename: PathBuf::from("/data/fingerprint.csv"),
            molecules_filename: PathBuf::from("/data/molecules.json"),
            neg_ent: 1,
            seed: 0,
            test_ratio: 0.2,
            n_folds: 3,
            max_sampling_retries: 1000,
        };
        assert_eq!(
            settings.fold_path("test", 2),
            PathBuf::from("/data/twosides/pair_pos_neg_triplets_test_fold2.csv")
        );
        assert_eq!(
            settings.statistics_path(),
            PathBuf::from("/data/twosides/data_statistics.json")
        );
    }

    #[test]
    fn dataset_parses_case_insensitively() {
        let parsed: Dataset = "DrugBank".parse().unwrap();
        assert_eq!(parsed, Dataset::Drugbank);
        assert!("chembl".parse::<Dataset>().is_err());
    }
}
