use std::collections::HashMap;

use ddi_prep::folds::FoldSplitter;

fn proportions(labels: &[&i64]) -> HashMap<i64, f64> {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for label in labels {
        *counts.entry(**label).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(label, count)| (label, count as f64 / labels.len() as f64))
        .collect()
}

#[test]
fn every_fold_preserves_the_label_distribution() {
    // 86 interactions spread unevenly over four labels
    let labels: Vec<i64> = [(0, 41), (1, 27), (2, 13), (3, 5)]
        .iter()
        .flat_map(|&(label, n)| std::iter::repeat(label).take(n))
        .collect();
    let all: Vec<&i64> = labels.iter().collect();
    let global = proportions(&all);

    let folds = FoldSplitter::new(3, 0.2, 7)
        .unwrap()
        .split(&labels, |label| *label)
        .unwrap();
    let tolerance = 1.0 / (labels.len() as f64).sqrt();
    for fold in &folds {
        // ceil(0.2 * 86)
        assert_eq!(fold.test.len(), 18);
        assert_eq!(fold.train.len() + fold.test.len(), labels.len());

        let test = proportions(&fold.test_rows(&labels));
        for (label, share) in &global {
            let observed = test.get(label).copied().unwrap_or(0.0);
            assert!(
                (observed - share).abs() <= tolerance,
                "label {label}: {observed} vs {share} in fold {}",
                fold.index
            );
        }
    }
}

#[test]
fn different_seeds_draw_different_folds() {
    let labels: Vec<i64> = (0..50).map(|i| i % 2).collect();
    let a = FoldSplitter::new(1, 0.2, 1).unwrap().split(&labels, |l| *l).unwrap();
    let b = FoldSplitter::new(1, 0.2, 2).unwrap().split(&labels, |l| *l).unwrap();
    assert_ne!(a[0].test, b[0].test);
}
