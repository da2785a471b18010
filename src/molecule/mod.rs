//! Molecule featurisation: atom/bond graphs, line graphs and similarity rows.

pub mod features;
pub mod fingerprint;
pub mod structure;

use std::{
    collections::BTreeSet,
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use indexmap::IndexMap;
use indicatif::ProgressBar;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    data::{
        pairs::SmilesIndex,
        types::{Entity, EntityUniverse},
    },
    error::{PrepError, Result},
};

use self::{
    features::{atom_feature_len, atom_features, bond_features, BOND_FEATURES},
    structure::{MolecularStructure, MoleculeSource},
};

/// Graph representation of one drug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugGraph {
    pub id: Entity,
    pub smiles: String,
    /// Atom features, one row per atom.
    pub x: Array2<f32>,
    /// Directed bonds: every bond followed by all reversed bonds.
    pub edge_index: Vec<[usize; 2]>,
    /// Bond features aligned with `edge_index`.
    pub edge_attr: Array2<f32>,
    /// Pairs of directed edges `(i, j)` where edge `i` flows into edge `j`.
    pub line_graph_edge_index: Vec<[usize; 2]>,
    /// Tanimoto similarity to every molecule of the reference set.
    pub sim: Vec<f64>,
}

/// Drug id → graph, in featurisation order.
pub type DrugGraphs = IndexMap<Entity, DrugGraph>;

/// Directed edges `i → j` of the line graph, excluding immediate back-tracking.
pub fn line_graph_edges(edges: &[[usize; 2]]) -> Vec<[usize; 2]> {
    let mut out = Vec::new();
    for (i, [src_i, dst_i]) in edges.iter().enumerate() {
        for (j, [src_j, dst_j]) in edges.iter().enumerate() {
            if dst_i == src_j && src_i != dst_j {
                out.push([i, j]);
            }
        }
    }
    out
}

fn directed_edges(mol: &MolecularStructure) -> (Vec<[usize; 2]>, Array2<f32>) {
    let forward: Vec<[usize; 2]> = mol.bonds.iter().map(|b| [b.begin, b.end]).collect();
    let mut edges = forward.clone();
    edges.extend(forward.iter().map(|[a, b]| [*b, *a]));

    let mut attr = Array2::<f32>::zeros((edges.len(), BOND_FEATURES));
    let bonds = mol.bonds.len();
    for (k, bond) in mol.bonds.iter().enumerate() {
        let row = bond_features(bond);
        for (c, value) in row.iter().enumerate() {
            attr[[k, c]] = *value;
            attr[[k + bonds, c]] = *value;
        }
    }
    (edges, attr)
}

fn node_features(mol: &MolecularStructure, symbols: &[String]) -> Result<Array2<f32>> {
    let width = atom_feature_len(symbols);
    let mut flat = Vec::with_capacity(mol.atoms.len() * width);
    for (i, atom) in mol.atoms.iter().enumerate() {
        flat.extend(atom_features(mol, i, atom, symbols)?);
    }
    Array2::from_shape_vec((mol.atoms.len(), width), flat).map_err(|err| {
        PrepError::InvalidInput(format!("atom feature matrix for {}: {err}", mol.id))
    })
}

/// Featurise every drug of the pair table that has a usable structure.
///
/// Drugs without a structure (or with a broken one) are skipped with a warning, so the
/// resulting key set can be smaller than the SMILES index.
pub fn featurize_all(
    smiles: &SmilesIndex,
    source: &dyn MoleculeSource,
    progress: &ProgressBar,
) -> Result<DrugGraphs> {
    let mut molecules: Vec<(&Entity, &str, &MolecularStructure)> = Vec::new();
    for (id, smile) in smiles {
        match source.structure(id) {
            Some(mol) => match mol.validate() {
                Ok(()) => molecules.push((id, smile.as_str(), mol)),
                Err(err) => warn!(drug = %id, %err, "skipping malformed structure"),
            },
            None => warn!(drug = %id, "no structure available; skipping"),
        }
    }
    if molecules.is_empty() {
        return Err(PrepError::InvalidInput(
            "no drug in the pair table has a usable structure".into(),
        ));
    }

    let symbols: Vec<String> = molecules
        .iter()
        .flat_map(|(_, _, mol)| mol.atoms.iter().map(|a| a.symbol.clone()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let reference: Vec<BTreeSet<u32>> = molecules
        .iter()
        .map(|(_, _, mol)| fingerprint::morgan_bits(mol))
        .collect();

    progress.set_length(molecules.len() as u64);
    let mut graphs = DrugGraphs::with_capacity(molecules.len());
    for ((id, smile, mol), bits) in molecules.iter().zip(&reference) {
        let x = node_features(mol, &symbols)?;
        let (edge_index, edge_attr) = directed_edges(mol);
        let line_graph_edge_index = line_graph_edges(&edge_index);
        let sim = reference
            .iter()
            .map(|other| fingerprint::tanimoto(other, bits))
            .collect();
        graphs.insert(
            (*id).clone(),
            DrugGraph {
                id: (*id).clone(),
                smiles: (*smile).to_string(),
                x,
                edge_index,
                edge_attr,
                line_graph_edge_index,
                sim,
            },
        );
        progress.inc(1);
    }
    progress.finish_and_clear();
    info!(
        drugs = graphs.len(),
        skipped = smiles.len() - graphs.len(),
        symbols = symbols.len(),
        "featurised drug graphs"
    );
    Ok(graphs)
}

pub fn save_graphs(path: &Path, graphs: &DrugGraphs) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(writer, graphs)?;
    info!(path = %path.display(), drugs = graphs.len(), "wrote drug graphs");
    Ok(())
}

pub fn load_graphs(path: &Path) -> Result<DrugGraphs> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// The key set of the graph mapping is the sampling universe.
pub fn universe_of(graphs: &DrugGraphs) -> Result<EntityUniverse> {
    EntityUniverse::new(graphs.keys().cloned())
}
