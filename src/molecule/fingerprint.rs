//! Folded circular (Morgan/ECFP-style) fingerprints and Tanimoto similarity.

use std::collections::BTreeSet;

use crate::molecule::structure::{BondKind, MolecularStructure};

/// Folded fingerprint length.
pub const FINGERPRINT_BITS: u64 = 2048;
/// Neighbourhood radius, matching ECFP4.
pub const RADIUS: usize = 2;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Stable 64-bit FNV-1a over a sequence of words.
fn stable_hash(words: &[u64]) -> u64 {
    let mut hash = FNV_OFFSET;
    for word in words {
        for byte in word.to_le_bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    }
    hash
}

fn bond_code(kind: BondKind) -> u64 {
    match kind {
        BondKind::Single => 1,
        BondKind::Double => 2,
        BondKind::Triple => 3,
        BondKind::Aromatic => 4,
        BondKind::Other => 5,
    }
}

fn symbol_code(symbol: &str) -> u64 {
    stable_hash(&symbol.bytes().map(u64::from).collect::<Vec<_>>())
}

/// Set bits of a radius-2 circular fingerprint folded to 2048 bits.
pub fn morgan_bits(mol: &MolecularStructure) -> BTreeSet<u32> {
    let mut identifiers: Vec<u64> = mol
        .atoms
        .iter()
        .enumerate()
        .map(|(i, atom)| {
            stable_hash(&[
                symbol_code(&atom.symbol),
                mol.degree(i) as u64,
                u64::from(atom.total_hydrogens),
                atom.formal_charge as i64 as u64,
                u64::from(atom.aromatic),
                u64::from(mol.neighbors(i).any(|(_, b)| b.in_ring)),
            ])
        })
        .collect();

    let mut bits: BTreeSet<u32> = identifiers
        .iter()
        .map(|id| (id % FINGERPRINT_BITS) as u32)
        .collect();

    for iteration in 1..=RADIUS {
        let next: Vec<u64> = (0..identifiers.len())
            .map(|i| {
                let mut environment: Vec<(u64, u64)> = mol
                    .neighbors(i)
                    .map(|(j, bond)| (bond_code(bond.kind), identifiers[j]))
                    .collect();
                environment.sort_unstable();
                let mut words = vec![iteration as u64, identifiers[i]];
                for (bond, neighbour) in environment {
                    words.push(bond);
                    words.push(neighbour);
                }
                stable_hash(&words)
            })
            .collect();
        bits.extend(next.iter().map(|id| (id % FINGERPRINT_BITS) as u32));
        identifiers = next;
    }
    bits
}

/// Tanimoto coefficient of two bit sets; two empty sets score zero.
pub fn tanimoto(a: &BTreeSet<u32>, b: &BTreeSet<u32>) -> f64 {
    let common = a.intersection(b).count();
    let union = a.len() + b.len() - common;
    if union == 0 {
        0.0
    } else {
        common as f64 / union as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::structure::{Atom, Bond, Hybridization};

    fn chain(id: &str, symbols: &[&str]) -> MolecularStructure {
        MolecularStructure {
            id: id.into(),
            smiles: String::new(),
            atoms: symbols
                .iter()
                .map(|s| Atom {
                    symbol: (*s).into(),
                    formal_charge: 0,
                    radical_electrons: 0,
                    implicit_valence: 0,
                    hybridization: Hybridization::Sp3,
                    aromatic: false,
                    total_hydrogens: 0,
                })
                .collect(),
            bonds: (1..symbols.len())
                .map(|i| Bond {
                    begin: i - 1,
                    end: i,
                    kind: BondKind::Single,
                    conjugated: false,
                    in_ring: false,
                })
                .collect(),
        }
    }

    #[test]
    fn identical_molecules_have_unit_similarity() {
        let a = morgan_bits(&chain("a", &["C", "C", "O"]));
        let b = morgan_bits(&chain("b", &["C", "C", "O"]));
        assert!(!a.is_empty());
        assert_eq!(tanimoto(&a, &b), 1.0);
    }

    #[test]
    fn different_molecules_score_below_one() {
        let a = morgan_bits(&chain("a", &["C", "C", "O"]));
        let b = morgan_bits(&chain("b", &["N", "S", "Cl", "Br"]));
        let sim = tanimoto(&a, &b);
        assert!((0.0..1.0).contains(&sim));
        assert!(a.iter().all(|bit| u64::from(*bit) < FINGERPRINT_BITS));
    }

    #[test]
    fn empty_sets_score_zero() {
        assert_eq!(tanimoto(&BTreeSet::new(), &BTreeSet::new()), 0.0);
    }
}
