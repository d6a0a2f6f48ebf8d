//! Catalogs survive a trip through STAC documents on disk.

use std::fs;
use std::path::Path;

use mlstac::builder::{CatalogBuilder, CatalogOptions};
use mlstac::catalog::Catalog;
use mlstac::factory::{PairFactory, StaticBBoxProvider};
use mlstac::inspect::inspect_catalog;
use mlstac::model::{BBox, LabelClasses, LabelSemantics, LinkTarget, Relation, Split};
use mlstac::scene::{read_dataset_config, SceneOptions};
use mlstac::split::{MlCatalogBuilder, MlCatalogOptions, SplitIssueCode};
use mlstac::stac::{read_catalog, write_catalog};
use tempfile::TempDir;

fn root_href(dir: &Path) -> String {
    format!("{}/catalog.json", dir.display())
}

fn semantics() -> LabelSemantics {
    LabelSemantics {
        tasks: vec!["segmentation".to_string()],
        classes: vec![LabelClasses::new(["building", "background"])],
        description: Some("Building Polygons".to_string()),
        ..Default::default()
    }
}

fn build_into(dir: &Path) -> Catalog {
    let provider: StaticBBoxProvider = [
        ("img1.tif", BBox::from_xyxy(0.0, 0.0, 1.0, 1.0)),
        ("img2.tif", BBox::from_xyxy(1.0, 1.0, 2.0, 2.0)),
        ("img3.tif", BBox::from_xyxy(5.0, 5.0, 6.0, 6.0)),
    ]
    .into_iter()
    .collect();
    let factory = PairFactory::new(semantics()).with_asset_base_uri("s3://chips");

    let mut builder = CatalogBuilder::new(
        CatalogOptions::new("chips", "Chip catalog", root_href(dir)),
        factory,
        provider,
    )
    .unwrap();
    builder.add_train_pair("img1.tif", "lbl1.geojson").unwrap();
    builder.add_train_pair("img2.tif", "lbl2.geojson").unwrap();
    builder.add_test_pair("img3.tif", "lbl3.geojson").unwrap();
    builder.finalize();
    let catalog = builder.into_catalog();

    write_catalog(&catalog, dir).unwrap();
    catalog
}

#[test]
fn written_catalog_reads_back_identically() {
    let temp = TempDir::new().unwrap();
    let built = build_into(temp.path());
    let loaded = read_catalog(&temp.path().join("catalog.json")).unwrap();

    let before = inspect_catalog(&built);
    let after = inspect_catalog(&loaded);
    assert_eq!(before.tree, after.tree);
    assert_eq!(before.counts, after.counts);
    assert_eq!(before.collections, after.collections);

    let label = loaded.find_path(&["label", "train", "lbl2"]).unwrap();
    let image = loaded.find_path(&["image", "train", "img2"]).unwrap();
    let source: Vec<_> = loaded.links_with(label, &Relation::Source).collect();
    assert_eq!(source.len(), 1);
    assert_eq!(source[0].target, LinkTarget::Node(image));

    let collection = loaded.find_path(&["label"]).unwrap();
    let properties = &loaded.node(collection).as_collection().unwrap().properties;
    assert_eq!(LabelSemantics::from_properties(properties), Some(semantics()));

    let asset = &loaded.item(image).unwrap().assets["rgb"];
    assert_eq!(asset.href, "s3://chips/img2.tif");
}

#[test]
fn documents_carry_only_relative_links() {
    let temp = TempDir::new().unwrap();
    build_into(temp.path());

    let text = fs::read_to_string(temp.path().join("label/test/lbl3/lbl3.json")).unwrap();
    let item: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(item["collection"], "label");
    for link in item["links"].as_array().unwrap() {
        let href = link["href"].as_str().unwrap();
        assert!(!href.starts_with('/'), "absolute link {href}");
        assert_ne!(link["rel"], "self");
    }
    assert_eq!(item["properties"]["label:tasks"], serde_json::json!(["segmentation"]));
}

#[test]
fn splitter_reads_a_saved_catalog_and_skips_damaged_items() {
    let temp = TempDir::new().unwrap();
    let source_dir = temp.path().join("source");
    build_into(&source_dir);

    // Drop the labels asset of one label item on disk.
    let damaged = source_dir.join("label/train/lbl1/lbl1.json");
    let mut item: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&damaged).unwrap()).unwrap();
    item["assets"].as_object_mut().unwrap().remove("labels");
    fs::write(&damaged, serde_json::to_string_pretty(&item).unwrap()).unwrap();

    let source = read_catalog(&source_dir.join("catalog.json")).unwrap();
    let ml_dir = temp.path().join("ml");
    let options =
        MlCatalogOptions::new("chips-ml", "Chip training data", root_href(&ml_dir))
            .with_label(semantics());
    let mut ml = MlCatalogBuilder::new(options).unwrap();
    let report = ml.extend_from(&source).unwrap();
    ml.finalize();

    assert_eq!(report.skipped_ids(), vec!["lbl1"]);
    assert_eq!(report.skipped[0].code, SplitIssueCode::MissingAsset);
    assert_eq!(report.count_for(Split::Train), 1);
    assert_eq!(report.count_for(Split::Test), 1);

    write_catalog(ml.catalog(), &ml_dir).unwrap();
    let saved = read_catalog(&ml_dir.join("catalog.json")).unwrap();
    let combined = saved.find_path(&["train", "img2"]).unwrap();

    let derived: Vec<_> = saved
        .links_with(combined, &Relation::DerivedFrom)
        .map(|link| saved.link_href(link).to_string())
        .collect();
    assert_eq!(
        derived,
        vec![
            format!("{}/image/train/img2/img2.json", source_dir.display()),
            format!("{}/label/train/lbl2/lbl2.json", source_dir.display()),
        ]
    );

    let dataset = read_dataset_config(&saved, &SceneOptions::default()).unwrap();
    assert_eq!(dataset.class_config.names, vec!["building", "background"]);
    assert_eq!(dataset.train_scenes.len(), 1);
    assert_eq!(dataset.train_scenes[0].raster_source.uris, vec!["s3://chips/img2.tif"]);
    assert_eq!(dataset.validation_scenes[0].label_source.uri, "s3://chips/lbl3.geojson");
    assert_eq!(dataset.validation_scenes[0].label_source.background_class_id, Some(1));
}
