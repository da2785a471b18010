//! Annotated triplet rows and their tabular storage form.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    data::{
        fingerprint::AuxVector,
        types::{decode_negatives, encode_negatives, Entity, NegativeEntity, Relation},
    },
    error::Result,
};

/// One positive triplet with its negatives and auxiliary vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedRow {
    pub head: Entity,
    pub tail: Entity,
    pub relation: Relation,
    pub negatives: Vec<NegativeEntity>,
    pub head_smiles: Option<String>,
    pub tail_smiles: Option<String>,
    /// SMILES of the primary (first) negative.
    pub negative_smiles: Option<String>,
    pub head_vector: AuxVector,
    pub tail_vector: AuxVector,
    /// Head-side vector of the primary negative pair.
    pub negative_head_vector: AuxVector,
    /// Tail-side vector of the primary negative pair.
    pub negative_tail_vector: AuxVector,
}

impl AnnotatedRow {
    pub fn primary_negative(&self) -> Option<&NegativeEntity> {
        self.negatives.first()
    }

    /// Whether any of the four stored vectors is missing.
    ///
    /// Vectors of negatives after the primary one are not stored, so they are not covered here.
    pub fn has_missing_vectors(&self) -> bool {
        [
            &self.head_vector,
            &self.tail_vector,
            &self.negative_head_vector,
            &self.negative_tail_vector,
        ]
        .iter()
        .any(|v| v.is_missing())
    }
}

/// Flat storage record; column names are the on-disk header.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnnotatedRecord {
    drug1_id: String,
    drug2_id: String,
    y: i64,
    neg_samples: String,
    p_smile1: String,
    p_smile2: String,
    neg_smiles: String,
    head_vector: String,
    tail_vector: String,
    neg_head_vector: String,
    neg_tail_vector: String,
}

fn optional(cell: String) -> Option<String> {
    if cell.is_empty() {
        None
    } else {
        Some(cell)
    }
}

impl From<&AnnotatedRow> for AnnotatedRecord {
    fn from(row: &AnnotatedRow) -> Self {
        Self {
            drug1_id: row.head.to_string(),
            drug2_id: row.tail.to_string(),
            y: row.relation.0,
            neg_samples: encode_negatives(&row.negatives),
            p_smile1: row.head_smiles.clone().unwrap_or_default(),
            p_smile2: row.tail_smiles.clone().unwrap_or_default(),
            neg_smiles: row.negative_smiles.clone().unwrap_or_default(),
            head_vector: row.head_vector.to_string(),
            tail_vector: row.tail_vector.to_string(),
            neg_head_vector: row.negative_head_vector.to_string(),
            neg_tail_vector: row.negative_tail_vector.to_string(),
        }
    }
}

impl TryFrom<AnnotatedRecord> for AnnotatedRow {
    type Error = crate::error::PrepError;

    fn try_from(record: AnnotatedRecord) -> Result<Self> {
        Ok(Self {
            head: Entity::new(record.drug1_id),
            tail: Entity::new(record.drug2_id),
            relation: Relation(record.y),
            negatives: decode_negatives(&record.neg_samples)?,
            head_smiles: optional(record.p_smile1),
            tail_smiles: optional(record.p_smile2),
            negative_smiles: optional(record.neg_smiles),
            head_vector: AuxVector::parse_cell(&record.head_vector)?,
            tail_vector: AuxVector::parse_cell(&record.tail_vector)?,
            negative_head_vector: AuxVector::parse_cell(&record.neg_head_vector)?,
            negative_tail_vector: AuxVector::parse_cell(&record.neg_tail_vector)?,
        })
    }
}

/// Write rows with a header line.
pub fn write_rows<'a, I>(path: &Path, rows: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a AnnotatedRow>,
{
    let mut writer = csv::Writer::from_path(path)?;
    let mut count = 0;
    for row in rows {
        writer.serialize(AnnotatedRecord::from(row))?;
        count += 1;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = count, "wrote annotated rows");
    Ok(count)
}

pub fn read_rows(path: &Path) -> Result<Vec<AnnotatedRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize::<AnnotatedRecord>() {
        rows.push(AnnotatedRow::try_from(record?)?);
    }
    info!(path = %path.display(), rows = rows.len(), "loaded annotated rows");
    Ok(rows)
}
