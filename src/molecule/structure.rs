//! Pre-parsed molecular structures and the source trait that supplies them.

use std::{collections::HashMap, path::Path};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    data::types::Entity,
    error::{PrepError, Result},
};

/// Orbital hybridisation of an atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Hybridization {
    S,
    Sp,
    Sp2,
    Sp3,
    Sp3d,
    Sp3d2,
    #[serde(other)]
    Other,
}

/// Bond order classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BondKind {
    Single,
    Double,
    Triple,
    Aromatic,
    #[serde(other)]
    Other,
}

/// An atom with the properties the featuriser reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub symbol: String,
    #[serde(default)]
    pub formal_charge: i32,
    #[serde(default)]
    pub radical_electrons: u32,
    #[serde(default)]
    pub implicit_valence: u32,
    pub hybridization: Hybridization,
    #[serde(default)]
    pub aromatic: bool,
    #[serde(default)]
    pub total_hydrogens: u32,
}

/// A bond between two atom indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bond {
    pub begin: usize,
    pub end: usize,
    pub kind: BondKind,
    #[serde(default)]
    pub conjugated: bool,
    #[serde(default)]
    pub in_ring: bool,
}

/// Molecular graph of one drug as produced by an upstream cheminformatics toolkit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MolecularStructure {
    pub id: String,
    #[serde(default)]
    pub smiles: String,
    pub atoms: Vec<Atom>,
    #[serde(default)]
    pub bonds: Vec<Bond>,
}

impl MolecularStructure {
    pub fn degree(&self, atom: usize) -> usize {
        self.bonds
            .iter()
            .filter(|b| b.begin == atom || b.end == atom)
            .count()
    }

    pub fn neighbors(&self, atom: usize) -> impl Iterator<Item = (usize, &Bond)> + '_ {
        self.bonds.iter().filter_map(move |b| {
            if b.begin == atom {
                Some((b.end, b))
            } else if b.end == atom {
                Some((b.begin, b))
            } else {
                None
            }
        })
    }

    /// Reject bonds that point outside the atom list.
    pub fn validate(&self) -> Result<()> {
        if self.atoms.is_empty() {
            return Err(PrepError::InvalidInput(format!("molecule {} has no atoms", self.id)));
        }
        for bond in &self.bonds {
            if bond.begin >= self.atoms.len() || bond.end >= self.atoms.len() || bond.begin == bond.end {
                return Err(PrepError::InvalidInput(format!(
                    "molecule {} has an invalid bond {}-{}",
                    self.id, bond.begin, bond.end
                )));
            }
        }
        Ok(())
    }
}

/// Supplies molecular structures for drug ids.
pub trait MoleculeSource {
    fn structure(&self, entity: &Entity) -> Option<&MolecularStructure>;
}

/// Structures loaded from a JSON array.
#[derive(Debug, Clone, Default)]
pub struct JsonMoleculeSource {
    molecules: HashMap<String, MolecularStructure>,
}

impl JsonMoleculeSource {
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let molecules: Vec<MolecularStructure> = serde_json::from_reader(std::io::BufReader::new(file))?;
        info!(path = %path.display(), molecules = molecules.len(), "loaded molecular structures");
        Ok(Self::from_structures(molecules))
    }

    pub fn from_structures(molecules: Vec<MolecularStructure>) -> Self {
        Self {
            molecules: molecules.into_iter().map(|m| (m.id.clone(), m)).collect(),
        }
    }
}

impl MoleculeSource for JsonMoleculeSource {
    fn structure(&self, entity: &Entity) -> Option<&MolecularStructure> {
        self.molecules.get(entity.as_str())
    }
}
