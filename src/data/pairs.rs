//! Raw drug pair ingestion.

use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::{
    config::ColumnMap,
    data::types::{Entity, EntityUniverse, Relation, Triplet},
    error::{PrepError, Result},
};

/// SMILES string of every drug seen in the pair table, last occurrence wins.
pub type SmilesIndex = IndexMap<Entity, String>;

/// One row of the raw pair table.
#[derive(Debug, Clone, PartialEq)]
pub struct PairRecord {
    pub head: Entity,
    pub tail: Entity,
    pub head_smiles: String,
    pub tail_smiles: String,
    pub relation: Relation,
}

impl PairRecord {
    pub fn triplet(&self) -> Triplet {
        Triplet {
            head: self.head.clone(),
            tail: self.tail.clone(),
            relation: self.relation,
        }
    }
}

/// Read every pair of the raw table using the dataset's column layout.
pub fn read_pairs(path: &Path, columns: &ColumnMap) -> Result<Vec<PairRecord>> {
    let delimiter = match path.extension().and_then(|s| s.to_str()) {
        Some("tab") | Some("tsv") => b'\t',
        _ => b',',
    };
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_path(path)?;
    let headers = reader.headers()?.clone();
    let idx = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| {
                PrepError::InvalidInput(format!("{} is missing column {name}", path.display()))
            })
    };
    let layout = [
        idx(columns.head_id)?,
        idx(columns.tail_id)?,
        idx(columns.head_smiles)?,
        idx(columns.tail_smiles)?,
        idx(columns.relation)?,
    ];

    let mut pairs = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        pairs.push(parse_pair(&record, &layout, line + 2)?);
    }
    info!(path = %path.display(), pairs = pairs.len(), "loaded raw drug pairs");
    Ok(pairs)
}

fn parse_pair(record: &StringRecord, layout: &[usize; 5], line: usize) -> Result<PairRecord> {
    let field = |i: usize| record.get(layout[i]).map(str::trim).unwrap_or_default();
    let raw_relation = field(4);
    // Some exports store labels as floats ("3.0").
    let relation = raw_relation
        .parse::<i64>()
        .ok()
        .or_else(|| {
            raw_relation
                .parse::<f64>()
                .ok()
                .filter(|v| v.fract() == 0.0)
                .map(|v| v as i64)
        })
        .ok_or_else(|| {
            PrepError::InvalidInput(format!("line {line}: relation {raw_relation:?} is not an integer"))
        })?;
    let head = field(0);
    let tail = field(1);
    if head.is_empty() || tail.is_empty() {
        return Err(PrepError::InvalidInput(format!("line {line}: empty drug id")));
    }
    Ok(PairRecord {
        head: Entity::new(head),
        tail: Entity::new(tail),
        head_smiles: field(2).to_string(),
        tail_smiles: field(3).to_string(),
        relation: Relation(relation),
    })
}

/// Collect the drug → SMILES mapping over all pairs.
pub fn smiles_index(pairs: &[PairRecord]) -> SmilesIndex {
    let mut index = SmilesIndex::new();
    for pair in pairs {
        index.insert(pair.head.clone(), pair.head_smiles.clone());
        index.insert(pair.tail.clone(), pair.tail_smiles.clone());
    }
    index
}

/// Keep the pairs whose endpoints both belong to the universe.
pub fn positive_triplets(pairs: &[PairRecord], universe: &EntityUniverse) -> Result<Vec<Triplet>> {
    let triplets: Vec<Triplet> = pairs
        .iter()
        .filter(|pair| universe.contains(&pair.head) && universe.contains(&pair.tail))
        .map(PairRecord::triplet)
        .collect();
    let skipped = pairs.len() - triplets.len();
    if skipped > 0 {
        debug!(skipped, "dropped pairs with drugs outside the universe");
    }
    if triplets.is_empty() {
        return Err(PrepError::InvalidInput("all tuples are invalid".into()));
    }
    info!(positives = triplets.len(), skipped, "selected positive triplets");
    Ok(triplets)
}
