mod common;

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn mlstac() -> Command {
    Command::cargo_bin("mlstac").unwrap()
}

fn read_json(path: &Path) -> serde_json::Value {
    let text = fs::read_to_string(path).expect("read json file");
    serde_json::from_str(&text).expect("parse json file")
}

#[test]
fn runs() {
    mlstac()
        .assert()
        .success()
        .stdout(predicate::str::contains("mlstac"));
}

#[test]
fn outputs_tool_name() {
    mlstac()
        .arg("-V")
        .assert()
        .success()
        .stdout("mlstac 0.1.0\n");
}

#[test]
fn build_reads_pixel_bounds_from_images() {
    let temp = TempDir::new().unwrap();
    common::write_sample(temp.path(), "a", 64, 32);
    common::write_sample(temp.path(), "b", 16, 16);
    let manifest = common::write_manifest(temp.path(), &[("a", "train"), ("b", "test")]);
    let out = temp.path().join("out");

    mlstac()
        .arg("build")
        .arg(&manifest)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 pair(s) added"));

    let image = read_json(&out.join("image/train/a/a.json"));
    assert_eq!(image["type"], "Feature");
    assert_eq!(image["bbox"], serde_json::json!([0.0, 0.0, 64.0, 32.0]));

    let label = read_json(&out.join("label/test/b_labels/b_labels.json"));
    let source = label["links"]
        .as_array()
        .unwrap()
        .iter()
        .find(|link| link["rel"] == "source")
        .expect("label item links to its image");
    assert_eq!(source["href"], "../../../image/test/b/b.json");

    let collection = read_json(&out.join("image/collection.json"));
    assert_eq!(
        collection["extent"]["spatial"]["bbox"][0],
        serde_json::json!([0.0, 0.0, 64.0, 32.0])
    );
}

#[test]
fn build_with_config_and_ml_output_reports_json() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("catalog");
    let ml = temp.path().join("ml");

    let output = mlstac()
        .arg("build")
        .arg(fixture("pairs.csv"))
        .arg("-o")
        .arg(&out)
        .arg("-c")
        .arg(fixture("catalog.yaml"))
        .arg("--ml-output")
        .arg(&ml)
        .arg("--report")
        .arg("json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["build"]["catalog_id"], "tiny-spacenet");
    assert_eq!(report["build"]["processed"].as_array().unwrap().len(), 5);
    assert_eq!(report["split"]["added"].as_array().unwrap().len(), 4);
    assert_eq!(report["split"]["skipped"][0]["code"], "unassigned_split");

    let root = read_json(&out.join("catalog.json"));
    assert_eq!(root["title"], "Tiny SpaceNet");

    let combined = read_json(&ml.join("train/RGB_img205/RGB_img205.json"));
    assert_eq!(combined["assets"]["rgb"]["type"], "image/tiff; application=geotiff");
    assert!(combined["assets"]["labels"]["href"]
        .as_str()
        .unwrap()
        .ends_with("buildings_img205.geojson"));
    let derived: Vec<&str> = combined["links"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|link| link["rel"] == "derived_from")
        .map(|link| link["href"].as_str().unwrap())
        .collect();
    assert_eq!(
        derived,
        vec![
            "../../../catalog/image/train/RGB_img205/RGB_img205.json",
            "../../../catalog/label/train/buildings_img205/buildings_img205.json",
        ]
    );
}

#[test]
fn strict_build_fails_when_pairs_are_skipped() {
    let temp = TempDir::new().unwrap();
    common::write_sample(temp.path(), "a", 8, 8);
    let manifest = common::write_manifest(temp.path(), &[("a", "train"), ("ghost", "test")]);

    mlstac()
        .arg("build")
        .arg(&manifest)
        .arg("-o")
        .arg(temp.path().join("out"))
        .arg("--strict")
        .assert()
        .failure()
        .stdout(predicate::str::contains("1 skipped"))
        .stderr(predicate::str::contains("1 pair(s) were skipped"));

    // The catalog is still written before the strict check.
    assert!(temp.path().join("out/image/train/a/a.json").is_file());
}

#[test]
fn build_assigns_splits_from_fraction() {
    let temp = TempDir::new().unwrap();
    for stem in ["a", "b", "c", "d"] {
        common::write_sample(temp.path(), stem, 4, 4);
    }
    let manifest = common::write_manifest(
        temp.path(),
        &[("a", ""), ("b", ""), ("c", ""), ("d", "")],
    );
    let out = temp.path().join("out");

    mlstac()
        .arg("build")
        .arg(&manifest)
        .arg("-o")
        .arg(&out)
        .arg("--test-fraction")
        .arg("0.5")
        .arg("--seed")
        .arg("7")
        .assert()
        .success()
        .stdout(predicate::str::contains("(2 train, 2 test, 0 unsplit)"));
}

#[test]
fn build_rejects_out_of_range_fraction() {
    let temp = TempDir::new().unwrap();
    let manifest = common::write_manifest(temp.path(), &[("a", "")]);

    mlstac()
        .arg("build")
        .arg(&manifest)
        .arg("-o")
        .arg(temp.path().join("out"))
        .arg("--test-fraction")
        .arg("1.5")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid split parameters"));
}

#[test]
fn build_rejects_unknown_report_format() {
    let temp = TempDir::new().unwrap();

    mlstac()
        .arg("build")
        .arg(fixture("pairs.csv"))
        .arg("-o")
        .arg(temp.path().join("out"))
        .arg("--report")
        .arg("xml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported format"));
}

#[test]
fn build_rejects_unknown_config_fields() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("bad.yaml");
    fs::write(&config, "catalog:\n  name: nope\n").unwrap();

    mlstac()
        .arg("build")
        .arg(fixture("pairs.csv"))
        .arg("-o")
        .arg(temp.path().join("out"))
        .arg("-c")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config"));
}

#[test]
fn describe_prints_tree_and_json() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");

    mlstac()
        .arg("build")
        .arg(fixture("pairs.csv"))
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    mlstac()
        .arg("describe")
        .arg(out.join("catalog.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("* <Catalog id=catalog>"))
        .stdout(predicate::str::contains("- <Item id=RGB_img205>"));

    let output = mlstac()
        .arg("describe")
        .arg(out.join("catalog.json"))
        .arg("--output")
        .arg("json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let summary: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(summary["counts"]["items"], 10);
    assert_eq!(summary["counts"]["collections"], 2);
}

#[test]
fn describe_fails_for_missing_catalog() {
    let temp = TempDir::new().unwrap();

    mlstac()
        .arg("describe")
        .arg(temp.path().join("nope/catalog.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn scenes_reads_ml_catalog() {
    let temp = TempDir::new().unwrap();
    let ml = temp.path().join("ml");

    mlstac()
        .arg("build")
        .arg(fixture("pairs.csv"))
        .arg("-o")
        .arg(temp.path().join("catalog"))
        .arg("-c")
        .arg(fixture("catalog.yaml"))
        .arg("--ml-output")
        .arg(&ml)
        .assert()
        .success();

    let output = mlstac()
        .arg("scenes")
        .arg(ml.join("catalog.json"))
        .arg("--channel-order")
        .arg("2,1,0")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let dataset: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(
        dataset["class_config"]["names"],
        serde_json::json!(["building", "background"])
    );
    assert_eq!(dataset["train_scenes"].as_array().unwrap().len(), 2);
    assert_eq!(dataset["validation_scenes"].as_array().unwrap().len(), 2);
    assert_eq!(
        dataset["train_scenes"][0]["raster_source"]["channel_order"],
        serde_json::json!([2, 1, 0])
    );
    assert_eq!(dataset["train_scenes"][0]["label_source"]["background_class_id"], 1);
}

#[test]
fn scenes_rejects_catalog_without_splits() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");

    mlstac()
        .arg("build")
        .arg(fixture("pairs.csv"))
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    mlstac()
        .arg("scenes")
        .arg(out.join("catalog.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no child 'train'"));
}
