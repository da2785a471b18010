//! Fingerprint table supplying per-drug auxiliary vectors.

use std::{fmt, path::Path, sync::Arc};

use csv::ReaderBuilder;
use indexmap::IndexMap;
use tracing::info;

use crate::{
    data::types::Entity,
    error::{PrepError, Result},
};

const VALUE_SEPARATOR: char = ';';

/// Fixed-length numeric descriptor attached to a row, or an explicit gap.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuxVector {
    Present(Arc<[f32]>),
    #[default]
    Missing,
}

impl AuxVector {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn values(&self) -> Option<&[f32]> {
        match self {
            Self::Present(values) => Some(values.as_ref()),
            Self::Missing => None,
        }
    }

    /// Parse the stored cell form; an empty cell is a missing vector.
    pub fn parse_cell(cell: &str) -> Result<Self> {
        let cell = cell.trim();
        if cell.is_empty() {
            return Ok(Self::Missing);
        }
        let values = cell
            .split(VALUE_SEPARATOR)
            .map(|v| {
                v.trim()
                    .parse::<f32>()
                    .map_err(|_| PrepError::InvalidInput(format!("bad vector component {v:?}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::Present(values.into()))
    }
}

impl fmt::Display for AuxVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Self::Present(values) = self {
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    write!(f, "{VALUE_SEPARATOR}")?;
                }
                write!(f, "{value}")?;
            }
        }
        Ok(())
    }
}

/// Source of auxiliary vectors keyed by drug.
pub trait AuxiliaryLookup {
    fn lookup(&self, entity: &Entity) -> AuxVector;

    /// SMILES recorded next to the vector, if the source keeps one.
    fn smiles(&self, _entity: &Entity) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone)]
struct FingerprintRow {
    smiles: String,
    values: Arc<[f32]>,
}

/// In-memory copy of `fingerprint.csv` (`id, smiles, f0..fN`).
#[derive(Debug, Clone, Default)]
pub struct FingerprintTable {
    width: usize,
    rows: IndexMap<Entity, FingerprintRow>,
}

impl FingerprintTable {
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
        let mut table = Self::default();
        for (line, record) in reader.records().enumerate() {
            let record = record?;
            let id = record.get(0).map(str::trim).unwrap_or_default();
            if id.is_empty() {
                return Err(PrepError::InvalidInput(format!(
                    "{} line {}: empty drug id",
                    path.display(),
                    line + 2
                )));
            }
            let smiles = record.get(1).map(str::trim).unwrap_or_default().to_string();
            let values = record
                .iter()
                .skip(2)
                .map(|v| {
                    v.trim().parse::<f32>().map_err(|_| {
                        PrepError::InvalidInput(format!(
                            "{} line {}: fingerprint value {v:?} for {id} is not numeric",
                            path.display(),
                            line + 2
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            table.insert(Entity::new(id), smiles, values)?;
        }
        info!(
            path = %path.display(),
            drugs = table.len(),
            width = table.width,
            "loaded fingerprint table"
        );
        Ok(table)
    }

    /// Add a row, enforcing the same non-zero width as every previous row.
    ///
    /// An empty vector would be stored as an empty cell, which reads back as missing.
    pub fn insert(&mut self, entity: Entity, smiles: String, values: Vec<f32>) -> Result<()> {
        if values.is_empty() {
            return Err(PrepError::InvalidInput(format!(
                "fingerprint for {entity} has no values"
            )));
        }
        if self.rows.is_empty() {
            self.width = values.len();
        } else if values.len() != self.width {
            return Err(PrepError::InvalidInput(format!(
                "fingerprint for {entity} has {} values, expected {}",
                values.len(),
                self.width
            )));
        }
        self.rows.insert(
            entity,
            FingerprintRow {
                smiles,
                values: values.into(),
            },
        );
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl AuxiliaryLookup for FingerprintTable {
    fn lookup(&self, entity: &Entity) -> AuxVector {
        self.rows
            .get(entity)
            .map(|row| AuxVector::Present(Arc::clone(&row.values)))
            .unwrap_or(AuxVector::Missing)
    }

    fn smiles(&self, entity: &Entity) -> Option<&str> {
        self.rows
            .get(entity)
            .map(|row| row.smiles.as_str())
            .filter(|smiles| !smiles.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_must_share_one_width() {
        let mut table = FingerprintTable::default();
        table
            .insert(Entity::new("A"), "C".into(), vec![0.1, 0.2])
            .unwrap();
        let err = table
            .insert(Entity::new("B"), "O".into(), vec![0.1])
            .unwrap_err();
        assert!(err.to_string().contains("B"));
        assert_eq!(table.width(), 2);
    }

    #[test]
    fn zero_width_tables_are_rejected() {
        let mut table = FingerprintTable::default();
        let err = table
            .insert(Entity::new("A"), "C".into(), Vec::new())
            .unwrap_err();
        assert!(err.to_string().contains('A'));
        assert!(table.is_empty());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fingerprint.csv");
        std::fs::write(&path, "id,smiles\nA,C\n").unwrap();
        assert!(matches!(
            FingerprintTable::load(&path),
            Err(PrepError::InvalidInput(_))
        ));
    }

    #[test]
    fn lookup_marks_unknown_drugs_missing() {
        let mut table = FingerprintTable::default();
        table
            .insert(Entity::new("A"), "C".into(), vec![1.0, 0.5])
            .unwrap();
        assert_eq!(table.lookup(&Entity::new("A")).values(), Some(&[1.0, 0.5][..]));
        assert!(table.lookup(&Entity::new("Z")).is_missing());
        assert_eq!(table.smiles(&Entity::new("A")), Some("C"));
    }

    #[test]
    fn cell_form_round_trips_missing_marker() {
        let vector = AuxVector::Present(vec![1.0, 0.25].into());
        assert_eq!(vector.to_string(), "1;0.25");
        assert_eq!(AuxVector::parse_cell("1;0.25").unwrap(), vector);
        assert!(AuxVector::parse_cell("").unwrap().is_missing());
        assert!(AuxVector::parse_cell("1;x").is_err());
    }
}
