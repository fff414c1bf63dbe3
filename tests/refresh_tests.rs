mod common;

use anyhow::Result;
use common::Trees;
use std::fs;
use symdir::engine::{Depth, Operation, ResultFlags};
use symdir::output::Level;

#[test]
fn test_refresh_removes_link_to_deleted_file() -> Result<()> {
    let trees = Trees::new()?;
    trees.source_file("a/b.txt")?;
    trees.run(Operation::Add)?;

    fs::remove_file(trees.source.join("a/b.txt"))?;
    let (flags, logger) = trees.run(Operation::Refresh)?;

    assert!(!flags.is_failure());
    assert!(!trees.coll_exists("a/b.txt"));
    // The source directory still exists, so its mirror stays.
    assert!(trees.coll.join("a").is_dir());
    assert!(logger.contains(Level::Info, "removed"));
    Ok(())
}

#[test]
fn test_refresh_removes_directory_of_deleted_source_directory() -> Result<()> {
    let trees = Trees::new()?;
    trees.source_file("a/b.txt")?;
    trees.run(Operation::Add)?;

    fs::remove_dir_all(trees.source.join("a"))?;
    let (flags, _) = trees.run(Operation::Refresh)?;

    assert!(!flags.is_failure());
    assert!(trees.coll_listing().is_empty());
    Ok(())
}

#[test]
fn test_refresh_creates_missing_entries() -> Result<()> {
    let trees = Trees::new()?;
    trees.source_file("old")?;
    trees.run(Operation::Add)?;
    trees.source_file("new")?;
    trees.source_file("fresh/dir/file")?;

    let (flags, _) = trees.run(Operation::Refresh)?;

    assert!(!flags.is_failure());
    assert_eq!(
        trees.coll_listing(),
        vec![
            "fresh/".to_string(),
            "fresh/dir/".into(),
            "fresh/dir/file".into(),
            "new".into(),
            "old".into(),
        ]
    );
    assert_eq!(trees.link_target("new"), Some(trees.source.join("new")));
    Ok(())
}

#[test]
fn test_refresh_fills_existing_directory() -> Result<()> {
    let trees = Trees::new()?;
    trees.source_file("dir/first")?;
    trees.run(Operation::Add)?;
    trees.source_file("dir/second")?;

    trees.run(Operation::Refresh)?;

    assert!(trees.coll_exists("dir/second"));
    Ok(())
}

#[test]
fn test_refresh_keeps_unrelated_entries() -> Result<()> {
    let trees = Trees::new()?;
    trees.source_file("a/x")?;
    trees.run(Operation::Add)?;
    fs::remove_dir_all(trees.source.join("a"))?;
    fs::write(trees.coll.join("a/local.txt"), b"mine")?;
    trees.coll_link("elsewhere", "/somewhere/else")?;

    let (flags, logger) = trees.run(Operation::Refresh)?;

    assert!(!flags.is_failure());
    assert_eq!(
        trees.coll_listing(),
        vec!["a/".to_string(), "a/local.txt".into(), "elsewhere".into()]
    );
    assert!(logger.contains(Level::Debug, "kept    "));
    Ok(())
}

#[test]
fn test_refresh_warns_about_foreign_link_shadowing_source() -> Result<()> {
    let trees = Trees::new()?;
    trees.source_file("foo")?;
    trees.coll_link("foo", "/elsewhere/foo")?;

    let (flags, logger) = trees.run(Operation::Refresh)?;

    assert!(flags.contains(ResultFlags::WARN));
    assert!(logger.contains(Level::Warn, "already links to /elsewhere/foo"));
    Ok(())
}

#[test]
fn test_refresh_never_resolves_conflicts() -> Result<()> {
    let trees = Trees::new()?;
    trees.source_dir("was_file")?;
    trees.source_file("was_dir")?;
    fs::write(trees.coll.join("was_file"), b"data")?;
    fs::create_dir(trees.coll.join("was_dir"))?;

    let (flags, _) = trees.run(Operation::Refresh)?;

    assert!(flags.contains(ResultFlags::ERROR));
    assert_eq!(fs::read(trees.coll.join("was_file"))?, b"data");
    assert!(trees.coll.join("was_dir").is_dir());
    Ok(())
}

#[test]
fn test_refresh_conflict_on_managed_link_to_directory() -> Result<()> {
    let trees = Trees::new()?;
    trees.source_file("thing")?;
    trees.run(Operation::Add)?;
    fs::remove_file(trees.source.join("thing"))?;
    trees.source_dir("thing")?;

    let (flags, logger) = trees.run(Operation::Refresh)?;

    assert!(flags.contains(ResultFlags::ERROR));
    assert!(trees.link_target("thing").is_some());
    assert!(logger.contains(Level::Error, "is a symlink to"));
    Ok(())
}

#[test]
fn test_refresh_honours_depth_on_existing_directories() -> Result<()> {
    let trees = Trees::new()?;
    trees.source_file("sub/stale")?;
    trees.run(Operation::Add)?;
    fs::remove_file(trees.source.join("sub/stale"))?;

    let (flags, logger) = trees.run_with_depth(Operation::Refresh, Depth::Levels(0))?;

    assert!(!flags.is_failure());
    assert!(trees.coll_exists("sub/stale"));
    assert!(logger.contains(Level::Debug, "skipped"));
    Ok(())
}

#[test]
fn test_refresh_is_stable() -> Result<()> {
    let trees = Trees::new()?;
    trees.source_file("a/b")?;
    trees.source_file("c")?;

    trees.run(Operation::Refresh)?;
    let first = trees.coll_listing();
    let (flags, logger) = trees.run(Operation::Refresh)?;

    assert!(!flags.is_failure());
    assert_eq!(trees.coll_listing(), first);
    assert_eq!(logger.messages(Level::Info).len(), 1);
    Ok(())
}
