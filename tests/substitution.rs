//! Substitution semantics over trees read from real containers.

mod common;

use stagepack::checksum::Crc32;
use stagepack::{Archive, SubstitutionMap, serialize_container};

#[test]
fn test_substituted_payload_lands_in_output() {
    let source = common::build_container(&[
        common::stored("root.usdc", b"scene"),
        common::stored("textures/poster.png", b"old pixels"),
    ]);
    let mut tree = Archive::from_bytes(source).unwrap().into_tree().unwrap();

    let mut subs = SubstitutionMap::new();
    subs.insert_bytes("textures/poster.png", b"new pixels".to_vec()).unwrap();
    let result = subs.apply(&mut tree).unwrap();
    assert_eq!(result.entries_replaced, 1);

    let (output, _) = serialize_container(&tree, "root.usdc").unwrap();
    let poster = common::local_entries(&output)
        .into_iter()
        .find(|e| e.name == "textures/poster.png")
        .unwrap();
    assert_eq!(poster.payload, b"new pixels");
    // The written checksum covers the replacement bytes, not the original's.
    assert_eq!(poster.crc32, Crc32::compute(b"new pixels"));
    assert_ne!(poster.crc32, Crc32::compute(b"old pixels"));
}

#[test]
fn test_substitution_creates_entry_and_parents() {
    let source = common::build_container(&[common::stored("root.usdc", b"scene")]);
    let mut tree = Archive::from_bytes(source).unwrap().into_tree().unwrap();

    let mut subs = SubstitutionMap::new();
    subs.insert_bytes("textures/extra/banner.png", b"banner".to_vec()).unwrap();
    let result = subs.apply(&mut tree).unwrap();
    assert_eq!(result.entries_created, 1);
    assert_eq!(result.directories_created, 2);

    let (output, write) = serialize_container(&tree, "root.usdc").unwrap();
    assert_eq!(write.directories_written, 2);

    let names: Vec<_> = common::local_entries(&output)
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(
        names,
        vec![
            "root.usdc",
            "textures/",
            "textures/extra/",
            "textures/extra/banner.png",
        ]
    );
}

#[test]
fn test_empty_map_changes_nothing() {
    let source = common::build_container(&[
        common::stored("root.usdc", b"scene"),
        common::stored("textures/poster.png", b"pixels"),
    ]);
    let mut tree = Archive::from_bytes(source.clone()).unwrap().into_tree().unwrap();

    let result = SubstitutionMap::new().apply(&mut tree).unwrap();
    assert_eq!(result.entries_replaced, 0);
    assert_eq!(result.entries_created, 0);

    let (output, _) = serialize_container(&tree, "root.usdc").unwrap();
    let back = Archive::from_bytes(output).unwrap().into_tree().unwrap();
    let original = Archive::from_bytes(source).unwrap().into_tree().unwrap();
    for path in original.paths() {
        assert_eq!(
            back.get(path).unwrap().payload(),
            original.get(path).unwrap().payload(),
            "payload of '{}' must be byte-identical",
            path
        );
    }
}

#[test]
fn test_marker_file_supplement() {
    // A cache-busting marker entry is plain caller configuration: one more
    // substitution targeting a fresh root-level path.
    let source = common::build_container(&[common::stored("root.usdc", b"scene")]);
    let mut tree = Archive::from_bytes(source).unwrap().into_tree().unwrap();

    let mut subs = SubstitutionMap::new();
    subs.insert_bytes("version.txt", b"1754500000000".to_vec()).unwrap();
    subs.apply(&mut tree).unwrap();

    let (output, _) = serialize_container(&tree, "root.usdc").unwrap();
    let raw = common::local_entries(&output);
    // Stage entry still first; the marker is an ordinary root-level file.
    assert_eq!(raw[0].name, "root.usdc");
    assert!(raw.iter().any(|e| e.name == "version.txt"));
}

#[test]
fn test_substitution_from_payload_file() {
    let dir = tempfile::tempdir().unwrap();
    let payload_path = dir.path().join("incoming.png");
    std::fs::write(&payload_path, b"fetched image bytes").unwrap();

    let source = common::build_container(&[
        common::stored("root.usdc", b"scene"),
        common::stored("textures/poster.png", b"old"),
    ]);
    let mut tree = Archive::from_bytes(source).unwrap().into_tree().unwrap();

    let mut subs = SubstitutionMap::new();
    subs.insert_file("textures/poster.png", &payload_path).unwrap();
    subs.apply(&mut tree).unwrap();

    assert_eq!(
        tree.get("textures/poster.png").unwrap().payload(),
        Some(&b"fetched image bytes"[..])
    );
}
