//! Stratified train/test folds over an annotated dataset.

use std::hash::Hash;

use indexmap::IndexMap;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use tracing::{debug, info, instrument};

use crate::error::{PrepError, Result};

/// One stratified partition; indices point into the split input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub index: usize,
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl Fold {
    pub fn train_rows<'a, T>(&self, items: &'a [T]) -> Vec<&'a T> {
        self.train.iter().map(|&i| &items[i]).collect()
    }

    pub fn test_rows<'a, T>(&self, items: &'a [T]) -> Vec<&'a T> {
        self.test.iter().map(|&i| &items[i]).collect()
    }
}

/// Training rows and the stratified validation rows held out from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub train: Vec<usize>,
    pub held_out: Vec<usize>,
}

/// Draws `n_folds` independent stratified re-shuffles from a single seeded generator.
#[derive(Debug, Clone, Copy)]
pub struct FoldSplitter {
    n_folds: usize,
    test_ratio: f64,
    seed: u64,
}

impl FoldSplitter {
    pub fn new(n_folds: usize, test_ratio: f64, seed: u64) -> Result<Self> {
        if n_folds == 0 {
            return Err(PrepError::InvalidInput("at least one fold is required".into()));
        }
        check_ratio(test_ratio)?;
        Ok(Self {
            n_folds,
            test_ratio,
            seed,
        })
    }

    /// Split `items` by the label `label_of` returns.
    ///
    /// Folds are not a cover: each one holds out `ceil(test_ratio * n)` rows drawn afresh.
    #[instrument(skip_all, fields(items = items.len(), folds = self.n_folds, ratio = self.test_ratio))]
    pub fn split<T, K, F>(&self, items: &[T], label_of: F) -> Result<Vec<Fold>>
    where
        K: Hash + Eq,
        F: Fn(&T) -> K,
    {
        let groups = group_by_label(items, label_of);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut folds = Vec::with_capacity(self.n_folds);
        for index in 0..self.n_folds {
            let (train, test) = stratified(&groups, items.len(), self.test_ratio, &mut rng)?;
            debug!(fold = index, train = train.len(), test = test.len(), "drew fold");
            folds.push(Fold { index, train, test });
        }
        info!(folds = folds.len(), labels = groups.len(), "split dataset into folds");
        Ok(folds)
    }

    /// Hold out a stratified validation share of `items`, seeded by the fold index.
    pub fn train_valid<T, K, F>(items: &[T], ratio: f64, fold: usize, label_of: F) -> Result<Partition>
    where
        K: Hash + Eq,
        F: Fn(&T) -> K,
    {
        check_ratio(ratio)?;
        let groups = group_by_label(items, label_of);
        let mut rng = StdRng::seed_from_u64(fold as u64);
        let (train, held_out) = stratified(&groups, items.len(), ratio, &mut rng)?;
        debug!(fold, train = train.len(), valid = held_out.len(), "held out validation rows");
        Ok(Partition { train, held_out })
    }
}

/// Held-out shares must lie strictly between 0 and 1.
pub fn check_ratio(ratio: f64) -> Result<()> {
    if ratio > 0.0 && ratio < 1.0 {
        Ok(())
    } else {
        Err(PrepError::InvalidInput(format!(
            "held-out ratio must lie strictly between 0 and 1, got {ratio}"
        )))
    }
}

fn group_by_label<T, K, F>(items: &[T], label_of: F) -> IndexMap<K, Vec<usize>>
where
    K: Hash + Eq,
    F: Fn(&T) -> K,
{
    let mut groups: IndexMap<K, Vec<usize>> = IndexMap::new();
    for (i, item) in items.iter().enumerate() {
        groups.entry(label_of(item)).or_default().push(i);
    }
    groups
}

/// Per-label held-out counts by the largest-remainder method, summing to `total`.
fn allocate<K>(groups: &IndexMap<K, Vec<usize>>, n: usize, total: usize) -> Vec<usize> {
    let mut counts = Vec::with_capacity(groups.len());
    let mut remainders = Vec::with_capacity(groups.len());
    for (slot, members) in groups.values().enumerate() {
        let scaled = total * members.len();
        counts.push(scaled / n);
        remainders.push((scaled % n, slot));
    }
    let assigned: usize = counts.iter().sum();
    // Stable sort keeps first-seen labels ahead on ties.
    remainders.sort_by(|a, b| b.0.cmp(&a.0));
    for &(_, slot) in remainders.iter().take(total - assigned) {
        counts[slot] += 1;
    }
    counts
}

fn stratified<K, R: Rng + ?Sized>(
    groups: &IndexMap<K, Vec<usize>>,
    n: usize,
    ratio: f64,
    rng: &mut R,
) -> Result<(Vec<usize>, Vec<usize>)> {
    let total = (ratio * n as f64).ceil() as usize;
    if total == 0 || total >= n {
        return Err(PrepError::InvalidInput(format!(
            "{n} rows cannot be split with ratio {ratio}: one side would be empty"
        )));
    }
    let counts = allocate(groups, n, total);

    let mut train = Vec::with_capacity(n - total);
    let mut held_out = Vec::with_capacity(total);
    for (members, take) in groups.values().zip(counts) {
        let mut shuffled = members.clone();
        shuffled.shuffle(rng);
        let (left, right) = shuffled.split_at(take);
        held_out.extend_from_slice(left);
        train.extend_from_slice(right);
    }
    train.shuffle(rng);
    held_out.shuffle(rng);
    Ok((train, held_out))
}
