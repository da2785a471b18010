//! Per-relation head/tail statistics of the positive triplet set.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::{
    data::types::{Entity, EntityUniverse, Relation, Triplet},
    error::{PrepError, Result},
};

/// Immutable statistics rebuilt from scratch for every run.
#[derive(Debug, Clone, Default)]
pub struct RelationStatistics {
    true_heads: IndexMap<(Entity, Relation), IndexSet<Entity>>,
    true_tails: IndexMap<(Entity, Relation), IndexSet<Entity>>,
    frequency: IndexMap<Relation, usize>,
    heads_observed: IndexMap<Relation, IndexSet<Entity>>,
    tails_observed: IndexMap<Relation, IndexSet<Entity>>,
    tails_per_head: IndexMap<Relation, f64>,
    heads_per_tail: IndexMap<Relation, f64>,
}

impl RelationStatistics {
    /// Aggregate statistics in a single pass over `triplets`.
    ///
    /// Every endpoint must belong to `universe`; frequencies count duplicate triplets.
    #[instrument(skip_all, fields(triplets = triplets.len()))]
    pub fn build(triplets: &[Triplet], universe: &EntityUniverse) -> Result<Self> {
        if triplets.is_empty() {
            return Err(PrepError::InvalidInput("triplet list is empty".into()));
        }

        let mut stats = Self::default();
        for Triplet {
            head,
            tail,
            relation,
        } in triplets
        {
            for entity in [head, tail] {
                if !universe.contains(entity) {
                    return Err(PrepError::InvalidInput(format!(
                        "drug {entity} in relation {relation} is not part of the universe"
                    )));
                }
            }
            stats
                .true_heads
                .entry((tail.clone(), *relation))
                .or_default()
                .insert(head.clone());
            stats
                .true_tails
                .entry((head.clone(), *relation))
                .or_default()
                .insert(tail.clone());
            *stats.frequency.entry(*relation).or_insert(0) += 1;
            stats
                .heads_observed
                .entry(*relation)
                .or_default()
                .insert(head.clone());
            stats
                .tails_observed
                .entry(*relation)
                .or_default()
                .insert(tail.clone());
        }

        for (relation, freq) in &stats.frequency {
            let heads = stats.heads_observed.get(relation).map_or(0, IndexSet::len);
            let tails = stats.tails_observed.get(relation).map_or(0, IndexSet::len);
            if heads == 0 || tails == 0 {
                return Err(PrepError::EmptyStatistics(*relation));
            }
            let freq = *freq as f64;
            stats.tails_per_head.insert(*relation, freq / heads as f64);
            stats.heads_per_tail.insert(*relation, freq / tails as f64);
            debug!(%relation, freq, heads, tails, "relation statistics");
        }

        info!(
            relations = stats.frequency.len(),
            head_keys = stats.true_heads.len(),
            tail_keys = stats.true_tails.len(),
            "built relation statistics"
        );
        Ok(stats)
    }

    /// Heads known to form a true triplet with `(tail, relation)`.
    pub fn true_heads_given(&self, tail: &Entity, relation: Relation) -> Option<&IndexSet<Entity>> {
        self.true_heads.get(&(tail.clone(), relation))
    }

    /// Tails known to form a true triplet with `(head, relation)`.
    pub fn true_tails_given(&self, head: &Entity, relation: Relation) -> Option<&IndexSet<Entity>> {
        self.true_tails.get(&(head.clone(), relation))
    }

    pub fn frequency(&self, relation: Relation) -> Option<usize> {
        self.frequency.get(&relation).copied()
    }

    pub fn heads_observed(&self, relation: Relation) -> Option<&IndexSet<Entity>> {
        self.heads_observed.get(&relation)
    }

    pub fn tails_observed(&self, relation: Relation) -> Option<&IndexSet<Entity>> {
        self.tails_observed.get(&relation)
    }

    pub fn tails_per_head(&self, relation: Relation) -> Option<f64> {
        self.tails_per_head.get(&relation).copied()
    }

    pub fn heads_per_tail(&self, relation: Relation) -> Option<f64> {
        self.heads_per_tail.get(&relation).copied()
    }

    /// Probability of corrupting the head: `tph / (tph + hpt)`.
    pub fn head_corruption_probability(&self, relation: Relation) -> Result<f64> {
        match (self.tails_per_head(relation), self.heads_per_tail(relation)) {
            (Some(tph), Some(hpt)) => Ok(tph / (tph + hpt)),
            _ => Err(PrepError::UnknownRelation(relation)),
        }
    }

    pub fn relations(&self) -> impl Iterator<Item = Relation> + '_ {
        self.frequency.keys().copied()
    }

    /// Serialisable view used for the on-disk statistics cache.
    pub fn snapshot(&self) -> StatisticsSnapshot {
        let relations = self
            .frequency
            .iter()
            .map(|(relation, frequency)| RelationSummary {
                relation: *relation,
                frequency: *frequency,
                heads: self.heads_observed[relation].iter().cloned().collect(),
                tails: self.tails_observed[relation].iter().cloned().collect(),
                tails_per_head: self.tails_per_head[relation],
                heads_per_tail: self.heads_per_tail[relation],
            })
            .collect();
        let entries = |map: &IndexMap<(Entity, Relation), IndexSet<Entity>>| {
            map.iter()
                .map(|((anchor, relation), others)| KnownEntities {
                    anchor: anchor.clone(),
                    relation: *relation,
                    entities: others.iter().cloned().collect(),
                })
                .collect::<Vec<_>>()
        };
        StatisticsSnapshot {
            relations,
            true_heads_given_tail: entries(&self.true_heads),
            true_tails_given_head: entries(&self.true_tails),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RelationSummary {
    pub relation: Relation,
    pub frequency: usize,
    pub heads: Vec<Entity>,
    pub tails: Vec<Entity>,
    pub tails_per_head: f64,
    pub heads_per_tail: f64,
}

/// Entities known to complete `(anchor, relation)`.
#[derive(Debug, Clone, Serialize)]
pub struct KnownEntities {
    pub anchor: Entity,
    pub relation: Relation,
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatisticsSnapshot {
    pub relations: Vec<RelationSummary>,
    pub true_heads_given_tail: Vec<KnownEntities>,
    pub true_tails_given_head: Vec<KnownEntities>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn universe() -> EntityUniverse {
        EntityUniverse::new(["A", "B", "C", "D", "E"]).unwrap()
    }

    fn set(ids: &[&str]) -> IndexSet<Entity> {
        ids.iter().map(|id| Entity::new(*id)).collect()
    }

    #[test]
    fn worked_example() {
        let triplets = vec![
            Triplet::new("A", "B", 0),
            Triplet::new("A", "C", 0),
            Triplet::new("D", "E", 1),
        ];
        let stats = RelationStatistics::build(&triplets, &universe()).unwrap();
        let rel0 = Relation(0);
        assert_eq!(stats.true_tails_given(&Entity::new("A"), rel0), Some(&set(&["B", "C"])));
        assert_eq!(stats.heads_observed(rel0), Some(&set(&["A"])));
        assert_eq!(stats.tails_observed(rel0), Some(&set(&["B", "C"])));
        assert_eq!(stats.tails_per_head(rel0), Some(2.0));
        assert_eq!(stats.heads_per_tail(rel0), Some(1.0));
        assert_eq!(stats.frequency(Relation(1)), Some(1));
        assert!((stats.head_corruption_probability(rel0).unwrap() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn single_head_single_tail_is_unbiased() {
        let triplets = vec![Triplet::new("A", "B", 4), Triplet::new("A", "B", 4)];
        let stats = RelationStatistics::build(&triplets, &universe()).unwrap();
        let rel = Relation(4);
        assert_eq!(stats.frequency(rel), Some(2));
        assert_eq!(stats.tails_per_head(rel), Some(2.0));
        assert_eq!(stats.heads_per_tail(rel), Some(2.0));
        assert_eq!(stats.head_corruption_probability(rel).unwrap(), 0.5);
        // stored as sets, counted with multiplicity
        assert_eq!(stats.true_tails_given(&Entity::new("A"), rel).unwrap().len(), 1);
    }

    #[test]
    fn rejects_empty_and_foreign_input() {
        assert!(matches!(
            RelationStatistics::build(&[], &universe()),
            Err(PrepError::InvalidInput(_))
        ));
        let err = RelationStatistics::build(&[Triplet::new("A", "Q", 0)], &universe()).unwrap_err();
        assert!(err.to_string().contains('Q'));
    }

    #[test]
    fn unknown_relation_has_no_probability() {
        let stats = RelationStatistics::build(&[Triplet::new("A", "B", 0)], &universe()).unwrap();
        assert!(matches!(
            stats.head_corruption_probability(Relation(9)),
            Err(PrepError::UnknownRelation(Relation(9)))
        ));
    }

    #[test]
    fn snapshot_mirrors_tables() {
        let triplets = vec![Triplet::new("A", "B", 0), Triplet::new("C", "B", 0)];
        let stats = RelationStatistics::build(&triplets, &universe()).unwrap();
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.relations.len(), 1);
        assert_eq!(snapshot.relations[0].frequency, 2);
        assert_eq!(snapshot.true_heads_given_tail[0].entities.len(), 2);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["relations"][0]["heads_per_tail"], 2.0);
    }
}
