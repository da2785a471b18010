//! Drives the sampler over every positive triplet and assembles annotated rows.

use indicatif::ProgressBar;
use rand::Rng;
use tracing::{info, instrument, warn};

use crate::{
    data::{
        dataset::AnnotatedRow,
        fingerprint::{AuxVector, AuxiliaryLookup},
        pairs::SmilesIndex,
        types::{Entity, Side, Triplet},
    },
    error::Result,
    sampling::sampler::NegativeSampler,
};

/// Assembles the annotated dataset for one run.
pub struct TripletDatasetBuilder<'a> {
    sampler: NegativeSampler<'a>,
    lookup: &'a dyn AuxiliaryLookup,
    smiles: Option<&'a SmilesIndex>,
    negatives_per_positive: usize,
}

impl<'a> TripletDatasetBuilder<'a> {
    pub fn new(
        sampler: NegativeSampler<'a>,
        lookup: &'a dyn AuxiliaryLookup,
        negatives_per_positive: usize,
    ) -> Self {
        Self {
            sampler,
            lookup,
            smiles: None,
            negatives_per_positive,
        }
    }

    /// Attach SMILES strings to the emitted rows.
    ///
    /// Drugs absent from `smiles` fall back to the SMILES kept by the auxiliary source.
    pub fn with_smiles(mut self, smiles: &'a SmilesIndex) -> Self {
        self.smiles = Some(smiles);
        self
    }

    pub fn build<R: Rng + ?Sized>(
        &self,
        positives: &[Triplet],
        rng: &mut R,
    ) -> Result<Vec<AnnotatedRow>> {
        self.build_with_progress(positives, rng, &ProgressBar::hidden())
    }

    /// Build every row; the first sampling failure aborts the whole dataset.
    #[instrument(skip_all, fields(positives = positives.len(), per_positive = self.negatives_per_positive))]
    pub fn build_with_progress<R: Rng + ?Sized>(
        &self,
        positives: &[Triplet],
        rng: &mut R,
        progress: &ProgressBar,
    ) -> Result<Vec<AnnotatedRow>> {
        progress.set_length(positives.len() as u64);
        let mut rows = Vec::with_capacity(positives.len());
        let mut missing = 0usize;
        for triplet in positives {
            let (row, any_missing) = self.build_row(triplet, rng)?;
            if any_missing {
                missing += 1;
            }
            rows.push(row);
            progress.inc(1);
        }
        progress.finish_and_clear();
        info!(rows = rows.len(), rows_with_missing_vectors = missing, "built annotated dataset");
        Ok(rows)
    }

    /// The flag also counts missing vectors of negatives past the primary one.
    fn build_row<R: Rng + ?Sized>(
        &self,
        triplet: &Triplet,
        rng: &mut R,
    ) -> Result<(AnnotatedRow, bool)> {
        let negatives = self
            .sampler
            .corrupt(triplet, self.negatives_per_positive, rng)?;

        let head_vector = self.vector(&triplet.head, "head");
        let tail_vector = self.vector(&triplet.tail, "tail");
        let negative_vectors: Vec<AuxVector> = negatives
            .iter()
            .map(|n| self.vector(&n.entity, "negative"))
            .collect();
        let extra_missing = negative_vectors.iter().skip(1).any(AuxVector::is_missing);

        // The side that was not corrupted keeps the positive vector.
        let (negative_head_vector, negative_tail_vector) =
            match (negatives.first(), negative_vectors.into_iter().next()) {
                (Some(neg), Some(vector)) => match neg.side {
                    Side::Head => (vector, tail_vector.clone()),
                    Side::Tail => (head_vector.clone(), vector),
                },
                _ => (AuxVector::Missing, AuxVector::Missing),
            };

        let row = AnnotatedRow {
            head: triplet.head.clone(),
            tail: triplet.tail.clone(),
            relation: triplet.relation,
            head_smiles: self.smiles_of(&triplet.head),
            tail_smiles: self.smiles_of(&triplet.tail),
            negative_smiles: negatives.first().and_then(|n| self.smiles_of(&n.entity)),
            negatives,
            head_vector,
            tail_vector,
            negative_head_vector,
            negative_tail_vector,
        };
        let any_missing = extra_missing || row.has_missing_vectors();
        Ok((row, any_missing))
    }

    fn vector(&self, entity: &Entity, role: &'static str) -> AuxVector {
        let vector = self.lookup.lookup(entity);
        if vector.is_missing() {
            warn!(drug = %entity, role, "missing auxiliary vector");
        }
        vector
    }

    fn smiles_of(&self, entity: &Entity) -> Option<String> {
        self.smiles
            .and_then(|index| index.get(entity).map(String::as_str))
            .or_else(|| self.lookup.smiles(entity))
            .map(str::to_owned)
    }
}
