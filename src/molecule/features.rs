//! Atom and bond feature encodings.

use crate::{
    error::{PrepError, Result},
    molecule::structure::{Atom, Bond, BondKind, Hybridization, MolecularStructure},
};

const DEGREES: [usize; 11] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
const IMPLICIT_VALENCES: [u32; 7] = [0, 1, 2, 3, 4, 5, 6];
const HYBRIDIZATIONS: [Hybridization; 5] = [
    Hybridization::Sp,
    Hybridization::Sp2,
    Hybridization::Sp3,
    Hybridization::Sp3d,
    Hybridization::Sp3d2,
];
const HYDROGEN_COUNTS: [u32; 5] = [0, 1, 2, 3, 4];

/// Number of values produced per bond.
pub const BOND_FEATURES: usize = 6;

/// One-hot encoding where a value outside `allowed` selects the last slot.
fn one_hot_or_last<T: PartialEq>(value: &T, allowed: &[T], out: &mut Vec<f32>) {
    let hit = allowed.iter().position(|a| a == value).unwrap_or(allowed.len() - 1);
    out.extend((0..allowed.len()).map(|i| if i == hit { 1.0 } else { 0.0 }));
}

fn flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Width of an atom feature vector for a given symbol vocabulary.
pub fn atom_feature_len(symbols: &[String]) -> usize {
    (symbols.len() + 1)
        + DEGREES.len()
        + IMPLICIT_VALENCES.len()
        + 2
        + HYBRIDIZATIONS.len()
        + 1
        + HYDROGEN_COUNTS.len()
}

/// Encode one atom against the corpus symbol vocabulary.
///
/// The degree encoding is strict: a degree above 10 is rejected instead of folded.
pub fn atom_features(
    mol: &MolecularStructure,
    index: usize,
    atom: &Atom,
    symbols: &[String],
) -> Result<Vec<f32>> {
    let mut out = Vec::with_capacity(atom_feature_len(symbols));

    let slot = symbols
        .iter()
        .position(|s| *s == atom.symbol)
        .unwrap_or(symbols.len());
    out.extend((0..=symbols.len()).map(|i| flag(i == slot)));

    let degree = mol.degree(index);
    if !DEGREES.contains(&degree) {
        return Err(PrepError::UnsupportedValue {
            entity: mol.id.clone(),
            field: "atom degree",
            value: degree.to_string(),
        });
    }
    out.extend(DEGREES.iter().map(|d| flag(*d == degree)));

    one_hot_or_last(&atom.implicit_valence, &IMPLICIT_VALENCES, &mut out);
    out.push(atom.formal_charge as f32);
    out.push(atom.radical_electrons as f32);
    one_hot_or_last(&atom.hybridization, &HYBRIDIZATIONS, &mut out);
    out.push(flag(atom.aromatic));
    one_hot_or_last(&atom.total_hydrogens, &HYDROGEN_COUNTS, &mut out);
    Ok(out)
}

pub fn bond_features(bond: &Bond) -> [f32; BOND_FEATURES] {
    [
        flag(bond.kind == BondKind::Single),
        flag(bond.kind == BondKind::Double),
        flag(bond.kind == BondKind::Triple),
        flag(bond.kind == BondKind::Aromatic),
        flag(bond.conjugated),
        flag(bond.in_ring),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(symbol: &str, hybridization: Hybridization, hydrogens: u32) -> Atom {
        Atom {
            symbol: symbol.into(),
            formal_charge: 0,
            radical_electrons: 0,
            implicit_valence: hydrogens,
            hybridization,
            aromatic: false,
            total_hydrogens: hydrogens,
        }
    }

    fn ethanol() -> MolecularStructure {
        let single = |begin, end| Bond {
            begin,
            end,
            kind: BondKind::Single,
            conjugated: false,
            in_ring: false,
        };
        MolecularStructure {
            id: "ethanol".into(),
            smiles: "CCO".into(),
            atoms: vec![
                atom("C", Hybridization::Sp3, 3),
                atom("C", Hybridization::Sp3, 2),
                atom("O", Hybridization::Sp3, 1),
            ],
            bonds: vec![single(0, 1), single(1, 2)],
        }
    }

    #[test]
    fn atom_vector_layout() {
        let mol = ethanol();
        let symbols = vec!["C".to_string(), "N".to_string(), "O".to_string()];
        let features = atom_features(&mol, 1, &mol.atoms[1], &symbols).unwrap();
        assert_eq!(features.len(), atom_feature_len(&symbols));
        // symbol slots: C, N, O, Unknown
        assert_eq!(&features[..4], &[1.0, 0.0, 0.0, 0.0]);
        // degree 2
        assert_eq!(features[4 + 2], 1.0);
        assert_eq!(features[4..15].iter().sum::<f32>(), 1.0);
    }

    #[test]
    fn unknown_symbol_and_hybridization_use_last_slot() {
        let mol = ethanol();
        let symbols = vec!["C".to_string()];
        let features = atom_features(&mol, 2, &mol.atoms[2], &symbols).unwrap();
        assert_eq!(&features[..2], &[0.0, 1.0]);

        let odd = atom("C", Hybridization::Other, 9);
        let features = atom_features(&mol, 0, &odd, &symbols).unwrap();
        let hyb_start = 2 + DEGREES.len() + IMPLICIT_VALENCES.len() + 2;
        assert_eq!(
            &features[hyb_start..hyb_start + 5],
            &[0.0, 0.0, 0.0, 0.0, 1.0]
        );
        assert_eq!(features.last(), Some(&1.0));
    }

    #[test]
    fn bond_flags() {
        let bond = Bond {
            begin: 0,
            end: 1,
            kind: BondKind::Aromatic,
            conjugated: true,
            in_ring: true,
        };
        assert_eq!(bond_features(&bond), [0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    }
}
