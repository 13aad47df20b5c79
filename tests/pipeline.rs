// End-to-end: cached AppliancesEnergy-format files → train → export → reload → predict.
// Runs offline on a tiny fixture and a tiny model.

use std::{fs, path::Path};

use pretty_assertions::assert_eq;
use tsreg::{
    data::{
        loader::MonashArchive,
        transforms::{TfmSpec, TsStandardize},
    },
    domain::{traits::Predictor, ts_array::TsArray},
    ml::{
        arch::ModelHyperParams,
        backend::TrainBackend,
        inferencer::load_learner,
        trainer::{RegressorConfig, TsRegressor},
    },
    infra::artifact::{read_artifact, write_artifact},
    TsError,
};

const N_VARS: usize = 3;
const SEQ_LEN: usize = 8;

fn series_row(i: usize, target: f32) -> String {
    let channels: Vec<String> = (0..N_VARS)
        .map(|v| {
            (0..SEQ_LEN)
                .map(|t| format!("{:.3}", ((i * 7 + v * 3 + t) as f32 * 0.37).sin() * (v + 1) as f32))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect();
    format!("{}:{}", channels.join(":"), target)
}

fn write_dataset(dir: &Path, n_train: usize, n_test: usize) {
    let ds = dir.join("AppliancesEnergy");
    fs::create_dir_all(&ds).unwrap();
    let header = format!(
        "# fixture\n@problemName AppliancesEnergy\n@timeStamps false\n@missing false\n\
         @univariate false\n@dimensions {N_VARS}\n@equalLength true\n@seriesLength {SEQ_LEN}\n\
         @targetLabel true\n@data\n"
    );
    let rows = |range: std::ops::Range<usize>| {
        range.map(|i| series_row(i, 15.0 + (i % 5) as f32)).collect::<Vec<_>>().join("\n")
    };
    fs::write(ds.join("AppliancesEnergy_TRAIN.ts"), format!("{header}{}\n", rows(0..n_train))).unwrap();
    fs::write(ds.join("AppliancesEnergy_TEST.ts"), format!("{header}{}\n", rows(n_train..n_train + n_test))).unwrap();
}

fn tiny_config(path: &Path) -> RegressorConfig {
    RegressorConfig {
        path:       path.to_path_buf(),
        arch:       "TSTPlus".into(),
        model:      ModelHyperParams {
            n_layers: 1, d_model: 8, n_heads: 2, d_ff: 16,
            dropout: 0.1, fc_dropout: 0.0, max_seq_len: 512,
        },
        tfms:       TfmSpec::default(),
        batch_tfms: Some(TsStandardize::new(true, false)),
        batch_size: 4,
        ..Default::default()
    }
}

fn trained(dir: &Path, epochs: usize) -> (TsRegressor<TrainBackend>, TsArray, Vec<f32>) {
    write_dataset(&dir.join("data"), 10, 5);
    let data = MonashArchive::new(dir.join("data"))
        .get_regression_data("AppliancesEnergy", false)
        .unwrap()
        .combined()
        .unwrap();
    let (x_valid, y_valid) = data.valid_set().unwrap();

    let mut reg = TsRegressor::<TrainBackend>::new(
        data.x, data.y, data.splits, tiny_config(&dir.join("models")), Default::default(),
    )
    .unwrap();
    reg.fit_one_cycle(epochs, 3e-4).unwrap();
    (reg, x_valid, y_valid)
}

#[test]
fn test_train_export_reload_predict() {
    let dir = tempfile::tempdir().unwrap();
    let (reg, x_valid, y_valid) = trained(dir.path(), 2);

    // 10 training samples, batch size 4 → 3 batches per epoch
    assert_eq!(reg.n_train_batches(), 3);
    assert_eq!(reg.train_iter(), 6);

    let path = reg.export("reg.pkl").unwrap();
    assert_eq!(path, dir.path().join("models").join("reg.pkl"));
    assert!(fs::metadata(&path).unwrap().len() > 0);

    let learner = load_learner(&path).unwrap();
    assert_eq!(learner.train_iter(), 6);

    let (raw_preds, target, preds) = learner.get_x_preds(&x_valid, Some(y_valid.as_slice())).unwrap().into_parts();
    assert_eq!(raw_preds.len(), 5);
    assert_eq!(preds.len(), 5);
    assert_eq!(target, Some(y_valid.clone()));

    let in_memory = reg.get_x_preds(&x_valid, Some(y_valid.as_slice())).unwrap();
    for (a, b) in in_memory.preds.iter().zip(&preds) {
        assert!((a - b).abs() < 1e-5, "in-memory {a} vs reloaded {b}");
    }
}

#[test]
fn test_predict_without_targets_and_empty_query() {
    let dir = tempfile::tempdir().unwrap();
    let (reg, x_valid, _) = trained(dir.path(), 1);
    let learner = load_learner(reg.export("reg.pkl").unwrap()).unwrap();

    let p = learner.get_x_preds(&x_valid, None).unwrap();
    assert_eq!(p.len(), x_valid.len());
    assert_eq!(p.target, None);

    let empty = TsArray::empty(N_VARS, SEQ_LEN);
    let p = learner.get_x_preds(&empty, Some(&[][..])).unwrap();
    assert!(p.raw_preds.is_empty() && p.preds.is_empty());
    assert_eq!(p.target, Some(vec![]));
}

#[test]
fn test_wrong_channel_count_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (reg, _, _) = trained(dir.path(), 1);
    let learner = load_learner(reg.export("reg.pkl").unwrap()).unwrap();

    let x = TsArray::new(vec![0.0; 2 * (N_VARS + 1) * SEQ_LEN], 2, N_VARS + 1, SEQ_LEN).unwrap();
    assert!(matches!(learner.get_x_preds(&x, None), Err(TsError::ShapeMismatch(_))));

    let x = TsArray::new(vec![0.0; N_VARS * SEQ_LEN], 1, N_VARS, SEQ_LEN).unwrap();
    assert!(matches!(learner.get_x_preds(&x, Some(&[1.0, 2.0][..])), Err(TsError::ShapeMismatch(_))));
}

#[test]
fn test_zero_epochs_leaves_model_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let (mut reg, x_valid, _) = trained(dir.path(), 0);
    let before = reg.get_x_preds(&x_valid, None).unwrap();

    reg.fit_one_cycle(0, 3e-4).unwrap();

    assert_eq!(reg.train_iter(), 0);
    assert_eq!(reg.get_x_preds(&x_valid, None).unwrap(), before);
}

#[test]
fn test_corrupted_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let (reg, _, _) = trained(dir.path(), 1);
    let path = reg.export("reg.pkl").unwrap();

    // Keep the preamble and header, garble the weights
    let mut bytes = fs::read(&path).unwrap();
    let header_len = u64::from_le_bytes(bytes[8..16].try_into().unwrap()) as usize;
    bytes.truncate(16 + header_len);
    bytes.extend_from_slice(b"not a msgpack record");
    fs::write(&path, &bytes).unwrap();
    assert!(matches!(load_learner(&path), Err(TsError::ArtifactCorrupt(_))));

    fs::write(&path, b"PK\x03\x04 a zip file, not a model").unwrap();
    assert!(matches!(load_learner(&path), Err(TsError::ArtifactCorrupt(_))));

    assert!(matches!(load_learner(dir.path().join("missing.pkl")), Err(TsError::Io(_))));
}

#[test]
fn test_artifact_naming_unknown_architecture() {
    let dir = tempfile::tempdir().unwrap();
    let (reg, _, _) = trained(dir.path(), 1);
    let path = reg.export("reg.pkl").unwrap();

    let (mut header, record) = read_artifact(&path).unwrap();
    header.arch = "FooNet".into();
    write_artifact(&path, &header, &record).unwrap();

    assert!(matches!(load_learner(&path), Err(TsError::InvalidArchitecture(name)) if name == "FooNet"));
}

#[test]
fn test_export_into_unwritable_path_is_io() {
    let dir = tempfile::tempdir().unwrap();
    let (reg, _, _) = trained(dir.path(), 0);

    // A regular file where the output directory should be
    fs::write(dir.path().join("models"), b"not a directory").unwrap();
    assert!(matches!(reg.export("reg.pkl"), Err(TsError::Io(_))));
}

#[test]
fn test_unknown_architecture() {
    let dir = tempfile::tempdir().unwrap();
    let x = TsArray::new(vec![0.0; 4 * N_VARS * SEQ_LEN], 4, N_VARS, SEQ_LEN).unwrap();
    let cfg = RegressorConfig { arch: "InceptionTimeXYZ".into(), ..tiny_config(dir.path()) };
    let err = TsRegressor::<TrainBackend>::new(
        x, vec![1.0; 4], tsreg::domain::splits::Splits::contiguous(3, 1), cfg, Default::default(),
    );
    assert!(matches!(err, Err(TsError::InvalidArchitecture(_))));
}

#[test]
fn test_unknown_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let err = MonashArchive::new(dir.path()).get_regression_data("NotADataset", false);
    assert!(matches!(err, Err(TsError::DatasetNotFound(_))));
}
