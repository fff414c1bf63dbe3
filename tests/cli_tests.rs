use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::os::unix::fs::symlink;
use tempfile::TempDir;

/// A `symdir` command isolated from the user's configuration and environment.
fn symdir(temp_dir: &TempDir) -> Result<Command> {
    let mut cmd = Command::cargo_bin("symdir")?;
    cmd.current_dir(temp_dir.path())
        .env("SYMDIR_CONFIG", temp_dir.path().join("no-config.toml"))
        .env_remove("SYMDIR_COLLECTION")
        .env_remove("SYMDIR_LOG");
    Ok(cmd)
}

fn setup() -> Result<TempDir> {
    let temp_dir = TempDir::new()?;
    fs::create_dir_all(temp_dir.path().join("src/a"))?;
    fs::write(temp_dir.path().join("src/a/b.txt"), b"b")?;
    fs::create_dir(temp_dir.path().join("coll"))?;
    Ok(temp_dir)
}

#[test]
fn test_add_succeeds_quietly() -> Result<()> {
    let temp_dir = setup()?;

    symdir(&temp_dir)?
        .args(["add", "-c", "coll", "src"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::is_empty());

    let target = fs::read_link(temp_dir.path().join("coll/a/b.txt"))?;
    assert_eq!(target, temp_dir.path().join("src/a/b.txt"));
    Ok(())
}

#[test]
fn test_verbose_add_reports_changes() -> Result<()> {
    let temp_dir = setup()?;

    symdir(&temp_dir)?
        .args(["-v", "add", "--collection=coll", "src"])
        .assert()
        .success()
        .stdout(predicate::str::contains("symdir: add "))
        .stdout(predicate::str::contains(" to coll"))
        .stdout(predicate::str::contains("symdir: created directory coll/a"))
        .stdout(predicate::str::contains("symdir: created symlink coll/a/b.txt"));
    Ok(())
}

#[test]
fn test_collection_defaults_to_current_directory() -> Result<()> {
    let temp_dir = setup()?;

    symdir(&temp_dir)?
        .current_dir(temp_dir.path().join("coll"))
        .args(["add", "../src"])
        .assert()
        .success();

    assert!(temp_dir.path().join("coll/a/b.txt").is_symlink());
    Ok(())
}

#[test]
fn test_collection_from_environment() -> Result<()> {
    let temp_dir = setup()?;

    symdir(&temp_dir)?
        .env("SYMDIR_COLLECTION", "coll")
        .args(["add", "src"])
        .assert()
        .success();

    assert!(temp_dir.path().join("coll/a/b.txt").is_symlink());
    Ok(())
}

#[test]
fn test_warning_exits_with_one() -> Result<()> {
    let temp_dir = setup()?;
    fs::create_dir(temp_dir.path().join("coll/a"))?;
    symlink("/elsewhere/b.txt", temp_dir.path().join("coll/a/b.txt"))?;

    symdir(&temp_dir)?
        .args(["add", "-c", "coll", "src"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "symdir: coll/a/b.txt already links to /elsewhere/b.txt",
        ));
    Ok(())
}

#[test]
fn test_rm_alias_removes_links() -> Result<()> {
    let temp_dir = setup()?;
    symdir(&temp_dir)?
        .args(["add", "-c", "coll", "src"])
        .assert()
        .success();

    symdir(&temp_dir)?
        .args(["rm", "-c", "coll", "src"])
        .assert()
        .success();

    assert_eq!(fs::read_dir(temp_dir.path().join("coll"))?.count(), 0);
    Ok(())
}

#[test]
fn test_refresh_after_delete() -> Result<()> {
    let temp_dir = setup()?;
    symdir(&temp_dir)?
        .args(["add", "-c", "coll", "src"])
        .assert()
        .success();
    fs::remove_dir_all(temp_dir.path().join("src/a"))?;

    symdir(&temp_dir)?
        .args(["-vv", "refresh", "-c", "coll", "src"])
        .assert()
        .success()
        .stdout(predicate::str::contains("symdir: removed coll/a/b.txt"))
        .stdout(predicate::str::contains("symdir: removed coll/a\n"));
    Ok(())
}

#[test]
fn test_bad_depth_is_a_usage_error() -> Result<()> {
    let temp_dir = setup()?;

    symdir(&temp_dir)?
        .args(["add", "--depth=3x", "src"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "cannot parse depth 3x: Invalid argument",
        ));

    symdir(&temp_dir)?
        .args(["refresh", "-d", "4294967296", "src"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Numerical result out of range"));
    Ok(())
}

#[test]
fn test_unknown_command_is_a_usage_error() -> Result<()> {
    let temp_dir = setup()?;
    symdir(&temp_dir)?.arg("sync").assert().code(2);
    symdir(&temp_dir)?.assert().code(2);
    Ok(())
}

#[test]
fn test_help_exits_zero() -> Result<()> {
    let temp_dir = setup()?;
    symdir(&temp_dir)?
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("refresh"))
        .stdout(predicate::str::contains("--collection"));
    Ok(())
}

#[test]
fn test_missing_collection_exits_with_one() -> Result<()> {
    let temp_dir = setup()?;

    symdir(&temp_dir)?
        .args(["add", "-c", "nowhere", "src"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("symdir: cannot open nowhere"));
    Ok(())
}

#[test]
fn test_config_supplies_collection_and_verbosity() -> Result<()> {
    let temp_dir = setup()?;
    let config = temp_dir.path().join("config.toml");
    fs::write(&config, "collection = \"coll\"\nverbosity = 1\n")?;

    symdir(&temp_dir)?
        .env("SYMDIR_CONFIG", &config)
        .args(["add", "src"])
        .assert()
        .success()
        .stdout(predicate::str::contains("created symlink coll/a/b.txt"));
    Ok(())
}

#[test]
fn test_invalid_config_is_a_usage_error() -> Result<()> {
    let temp_dir = setup()?;
    let config = temp_dir.path().join("config.toml");
    fs::write(&config, "verbosity = 7\n")?;

    symdir(&temp_dir)?
        .env("SYMDIR_CONFIG", &config)
        .args(["add", "src"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("verbosity"));
    Ok(())
}

#[test]
fn test_completion_generates_script() -> Result<()> {
    let temp_dir = TempDir::new()?;
    symdir(&temp_dir)?
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("symdir"));
    Ok(())
}
