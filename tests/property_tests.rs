mod common;

use common::Trees;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use symdir::engine::Operation;
use symdir::utils::paths::{is_normalized_path, normalize_path};

fn raw_path() -> impl Strategy<Value = String> {
    let leading = prop::sample::select(vec!["", "/", "//", "///"]);
    let segment = prop::sample::select(vec!["a", "bc", "..", ".", ""]);
    (leading, prop::collection::vec(segment, 0..8))
        .prop_map(|(leading, segments)| format!("{leading}{}", segments.join("/")))
}

/// Relative file paths whose directories (`d*`) and files (`f*`) never share a name,
/// so the generated trees cannot conflict with each other.
fn source_files() -> impl Strategy<Value = BTreeSet<String>> {
    let dir = prop::sample::select(vec!["d0", "d1"]);
    let file = prop::sample::select(vec!["f0", "f1", "f2"]);
    let path = (prop::collection::vec(dir, 0..3), file).prop_map(|(dirs, file)| {
        let mut parts: Vec<&str> = dirs;
        parts.push(file);
        parts.join("/")
    });
    prop::collection::btree_set(path, 0..8)
}

/// Every directory and file the collection should hold for `files`.
fn expected_listing(files: &BTreeSet<String>) -> Vec<String> {
    let mut entries = BTreeSet::new();
    for file in files {
        let mut prefix = String::new();
        let parts: Vec<&str> = file.split('/').collect();
        for dir in &parts[..parts.len() - 1] {
            prefix.push_str(dir);
            prefix.push('/');
            entries.insert(prefix.clone());
        }
        entries.insert(file.clone());
    }
    entries.into_iter().collect()
}

fn write_source(trees: &Trees, files: &BTreeSet<String>) {
    if trees.source.exists() {
        fs::remove_dir_all(&trees.source).unwrap();
    }
    fs::create_dir(&trees.source).unwrap();
    for file in files {
        trees.source_file(file).unwrap();
    }
}

proptest! {
    #[test]
    fn test_normalize_is_idempotent(path in raw_path()) {
        let once = normalize_path(path.as_bytes());
        let twice = normalize_path(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_normalized_output_is_recognized(path in raw_path()) {
        let normalized = normalize_path(path.as_bytes());
        prop_assert!(is_normalized_path(&normalized));
    }

    #[test]
    fn test_is_normalized_matches_fixed_point(path in raw_path()) {
        let normalized = normalize_path(path.as_bytes());
        prop_assert_eq!(
            is_normalized_path(path.as_bytes()),
            normalized == path.as_bytes()
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_refresh_converges(before in source_files(), after in source_files()) {
        let trees = Trees::new().unwrap();
        write_source(&trees, &before);
        trees.run(Operation::Add).unwrap();
        trees.coll_link("zz", "/elsewhere/zz").unwrap();

        write_source(&trees, &after);
        let (flags, _) = trees.run(Operation::Refresh).unwrap();
        prop_assert!(!flags.is_failure());

        let mut expected = expected_listing(&after);
        expected.push("zz".to_string());
        expected.sort();
        prop_assert_eq!(trees.coll_listing(), expected);

        for file in &after {
            prop_assert_eq!(trees.link_target(file), Some(trees.source.join(file)));
        }
    }

    #[test]
    fn test_add_then_remove_restores_collection(files in source_files()) {
        let trees = Trees::new().unwrap();
        write_source(&trees, &files);

        trees.run(Operation::Add).unwrap();
        let (flags, _) = trees.run(Operation::Remove).unwrap();

        prop_assert!(!flags.is_failure());
        prop_assert!(trees.coll_listing().is_empty());
    }
}
