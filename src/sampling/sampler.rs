//! Statistics-biased negative sampling with collision avoidance.

use std::collections::HashSet;

use indexmap::IndexSet;
use rand::{seq::index, Rng};
use tracing::trace;

use crate::{
    data::types::{Entity, EntityUniverse, NegativeEntity, Side, Triplet},
    error::{PrepError, Result},
    sampling::statistics::RelationStatistics,
};

/// Default number of rejection batches before a request is abandoned.
pub const DEFAULT_MAX_RETRIES: usize = 1000;

/// How the corrupted endpoint is chosen for each draw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum CorruptionPolicy {
    /// Head with probability `tph / (tph + hpt)`, tail otherwise.
    #[default]
    Biased,
    /// Head or tail with equal probability.
    Uniform,
}

/// Draws corrupted entities for positive triplets.
///
/// Corrupting the head of `(h, t, r)` never yields an entity in `true_heads_given(t, r)`,
/// and corrupting the tail never yields one in `true_tails_given(h, r)`, so no negative
/// is a known positive.
#[derive(Debug, Clone)]
pub struct NegativeSampler<'a> {
    statistics: &'a RelationStatistics,
    universe: &'a EntityUniverse,
    policy: CorruptionPolicy,
    max_retries: usize,
}

impl<'a> NegativeSampler<'a> {
    pub fn new(statistics: &'a RelationStatistics, universe: &'a EntityUniverse) -> Self {
        Self {
            statistics,
            universe,
            policy: CorruptionPolicy::default(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_policy(mut self, policy: CorruptionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Draw `count` corruptions of `triplet`: all head corruptions first, then tails.
    pub fn corrupt<R: Rng + ?Sized>(
        &self,
        triplet: &Triplet,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<NegativeEntity>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let relation = triplet.relation;
        let prob = match self.policy {
            CorruptionPolicy::Biased => self.statistics.head_corruption_probability(relation)?,
            CorruptionPolicy::Uniform => {
                self.statistics
                    .frequency(relation)
                    .ok_or(PrepError::UnknownRelation(relation))?;
                0.5
            }
        };

        let mut head_count = 0;
        for _ in 0..count {
            if rng.gen::<f64>() < prob {
                head_count += 1;
            }
        }
        let tail_count = count - head_count;

        let empty = IndexSet::new();
        let true_heads = self
            .statistics
            .true_heads_given(&triplet.tail, relation)
            .unwrap_or(&empty);
        let true_tails = self
            .statistics
            .true_tails_given(&triplet.head, relation)
            .unwrap_or(&empty);

        let mut negatives = Vec::with_capacity(count);
        for (side, wanted, exclusion) in [
            (Side::Head, head_count, true_heads),
            (Side::Tail, tail_count, true_tails),
        ] {
            let drawn = self.draw_excluding(triplet, side, exclusion, wanted, rng)?;
            negatives.extend(drawn.into_iter().map(|e| NegativeEntity::new(e, side)));
        }
        Ok(negatives)
    }

    /// Rejection batching: sample `2 × remaining` distinct candidates, keep the ones
    /// outside `exclusion` and not yet accepted, repeat until enough are collected.
    fn draw_excluding<R: Rng + ?Sized>(
        &self,
        triplet: &Triplet,
        side: Side,
        exclusion: &IndexSet<Entity>,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<Entity>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let population = self.universe.len();
        let excluded_in_universe = exclusion.iter().filter(|e| self.universe.contains(e)).count();
        let available = population - excluded_in_universe;
        let anchor = match side {
            Side::Head => &triplet.tail,
            Side::Tail => &triplet.head,
        };
        let exhausted = |attempts| PrepError::SamplingExhausted {
            anchor: anchor.clone(),
            relation: triplet.relation,
            side,
            requested: count,
            available,
            attempts,
        };
        if available < count {
            return Err(exhausted(0));
        }

        let mut accepted: Vec<Entity> = Vec::with_capacity(count);
        let mut seen: HashSet<&Entity> = HashSet::with_capacity(count);
        let mut attempts = 0;
        while accepted.len() < count {
            if attempts == self.max_retries {
                return Err(exhausted(attempts));
            }
            attempts += 1;
            let batch = ((count - accepted.len()) * 2).min(population);
            for idx in index::sample(rng, population, batch) {
                let Some(candidate) = self.universe.get(idx) else {
                    continue;
                };
                if exclusion.contains(candidate) || seen.contains(candidate) {
                    continue;
                }
                seen.insert(candidate);
                accepted.push(candidate.clone());
            }
        }
        accepted.truncate(count);
        trace!(
            head = %triplet.head,
            tail = %triplet.tail,
            %side,
            attempts,
            "drew corrupted entities"
        );
        Ok(accepted)
    }
}
