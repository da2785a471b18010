use std::{fs, path::Path};

use assert_cmd::Command;
use ddi_prep::{
    data::{
        dataset,
        fingerprint::{AuxiliaryLookup, FingerprintTable},
        types::{Entity, EntityUniverse, Relation, Side, Triplet},
    },
    error::PrepError,
    sampling::{NegativeSampler, RelationStatistics, TripletDatasetBuilder},
};
use rand::{rngs::StdRng, SeedableRng};
use serde_json::json;

#[test]
fn worked_scenario_end_to_end() {
    let universe = EntityUniverse::new(["A", "B", "C", "D", "E"]).unwrap();
    let positives = vec![
        Triplet::new("A", "B", 0),
        Triplet::new("A", "C", 0),
        Triplet::new("D", "E", 1),
    ];
    let stats = RelationStatistics::build(&positives, &universe).unwrap();
    let rel0 = Relation(0);
    assert_eq!(stats.tails_per_head(rel0), Some(2.0));
    assert_eq!(stats.heads_per_tail(rel0), Some(1.0));

    let sampler = NegativeSampler::new(&stats, &universe);
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..200 {
        let negatives = sampler.corrupt(&positives[0], 1, &mut rng).unwrap();
        if negatives[0].side == Side::Tail {
            assert!(!["B", "C"].contains(&negatives[0].entity.as_str()));
        }
    }

    // Twelve draws cannot fit into four eligible heads plus four eligible tails.
    let err = sampler.corrupt(&positives[2], 12, &mut rng).unwrap_err();
    assert!(matches!(err, PrepError::SamplingExhausted { .. }));
}

#[test]
fn built_rows_survive_storage() {
    let universe = EntityUniverse::new(["A", "B", "C", "D", "E"]).unwrap();
    let positives = vec![
        Triplet::new("A", "B", 0),
        Triplet::new("A", "C", 0),
        Triplet::new("D", "E", 1),
    ];
    let stats = RelationStatistics::build(&positives, &universe).unwrap();
    let mut table = FingerprintTable::default();
    for (i, id) in ["A", "B", "C", "D"].iter().enumerate() {
        table
            .insert(Entity::new(*id), String::new(), vec![i as f32, 0.5])
            .unwrap();
    }
    let builder = TripletDatasetBuilder::new(NegativeSampler::new(&stats, &universe), &table, 2);
    let rows = builder
        .build(&positives, &mut StdRng::seed_from_u64(5))
        .unwrap();
    assert!(rows[2].tail_vector.is_missing());
    assert_eq!(rows[0].head_vector, table.lookup(&Entity::new("A")));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("triplets.csv");
    dataset::write_rows(&path, &rows).unwrap();
    assert_eq!(dataset::read_rows(&path).unwrap(), rows);
}

fn chain(id: &str, symbols: &[&str]) -> serde_json::Value {
    let atoms: Vec<_> = symbols
        .iter()
        .map(|s| json!({"symbol": s, "hybridization": "SP3", "implicit_valence": 1, "total_hydrogens": 2}))
        .collect();
    let bonds: Vec<_> = (1..symbols.len())
        .map(|i| json!({"begin": i - 1, "end": i, "kind": "single"}))
        .collect();
    json!({"id": id, "smiles": symbols.concat(), "atoms": atoms, "bonds": bonds})
}

fn write_inputs(root: &Path) {
    let drugs = ["DB01", "DB02", "DB03", "DB04", "DB05", "DB06"];
    let molecules: Vec<_> = drugs
        .iter()
        .enumerate()
        .map(|(i, id)| chain(id, &["C", "C", "O", "N"][..2 + i % 3]))
        .collect();
    fs::write(
        root.join("molecules.json"),
        serde_json::to_string(&molecules).unwrap(),
    )
    .unwrap();

    let mut fingerprints = String::from("id,smiles,f0,f1,f2\n");
    for (i, id) in drugs.iter().enumerate() {
        fingerprints.push_str(&format!("{id},C,{i},1,0\n"));
    }
    fs::write(root.join("fingerprint.csv"), fingerprints).unwrap();

    let mut pairs = String::from("d1,d2,smile1,smile2,type\n");
    let edges = [
        (0, 1, 0),
        (0, 2, 0),
        (1, 3, 0),
        (2, 4, 0),
        (3, 5, 0),
        (4, 0, 1),
        (5, 1, 1),
        (1, 2, 1),
        (3, 4, 1),
        (2, 5, 1),
    ];
    for (h, t, r) in edges {
        pairs.push_str(&format!("{},{},CC,CC,{r}\n", drugs[h], drugs[t]));
    }
    fs::write(root.join("drugbank.csv"), pairs).unwrap();
}

fn ddi_prep(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ddi-prep").unwrap();
    cmd.current_dir(root)
        .env("DATA_DIR", root)
        .env("RUST_LOG", "warn")
        .env_remove("DATASET")
        .env_remove("DATASET_FILENAME")
        .env_remove("FINGERPRINT_FILENAME")
        .env_remove("MOLECULES_FILENAME")
        .env_remove("NEG_ENT")
        .env_remove("TEST_RATIO")
        .env_remove("N_FOLDS");
    cmd
}

#[test]
fn cli_runs_every_stage() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());

    ddi_prep(dir.path())
        .args(["all", "--n-folds", "2", "--seed", "3", "--validation-ratio", "0.25"])
        .assert()
        .success();

    let out = dir.path().join("drugbank");
    for name in ["drug_data.json", "pair_pos_neg_triplets.csv", "data_statistics.json"] {
        assert!(out.join(name).exists(), "{name} missing");
    }
    let rows = dataset::read_rows(&out.join("pair_pos_neg_triplets.csv")).unwrap();
    assert_eq!(rows.len(), 10);
    assert!(rows.iter().all(|row| row.negatives.len() == 1));

    for fold in 0..2 {
        let part = |name: &str| {
            dataset::read_rows(&out.join(format!("pair_pos_neg_triplets_{name}_fold{fold}.csv")))
                .unwrap()
                .len()
        };
        assert_eq!(part("test"), 2);
        assert_eq!(part("train") + part("valid"), 8);
    }

    let statistics: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("data_statistics.json")).unwrap())
            .unwrap();
    assert_eq!(statistics["relations"].as_array().unwrap().len(), 2);
}

#[test]
fn bad_split_settings_fail_before_any_output() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let out = dir.path().join("drugbank");

    ddi_prep(dir.path())
        .args(["all", "--test-ratio", "1.5"])
        .assert()
        .failure();
    assert!(!out.exists());

    ddi_prep(dir.path())
        .args(["all", "--n-folds", "0"])
        .assert()
        .failure();
    ddi_prep(dir.path())
        .args(["all", "--validation-ratio", "0"])
        .assert()
        .failure();
    assert!(!out.exists());
}
