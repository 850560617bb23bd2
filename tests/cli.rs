use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_cli_pack_list_extract_cycle() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Setup: a temporary source tree
    let source_dir = tempdir()?;
    let file1_path = source_dir.path().join("file1.txt");
    let nested_dir = source_dir.path().join("nested");
    fs::create_dir(&nested_dir)?;
    let nested_file_path = nested_dir.join("nested_file.dat");

    let mut file1 = fs::File::create(&file1_path)?;
    writeln!(file1, "Hello, this is the first file.")?;

    let mut nested_file = fs::File::create(&nested_file_path)?;
    nested_file.write_all(&[0, 1, 2, 3, 4, 5])?;

    let archive_dir = tempdir()?;
    // No suffix on purpose: pack must append `.asar`.
    let output_arg = archive_dir.path().join("test_archive");
    let archive_path = archive_dir.path().join("test_archive.asar");

    // 2. Pack
    let mut cmd = Command::cargo_bin("asarpack")?;
    cmd.arg("pack").arg(source_dir.path()).arg(&output_arg);
    cmd.assert().success();
    assert!(archive_path.exists());

    // 3. List
    let mut cmd = Command::cargo_bin("asarpack")?;
    cmd.arg("list").arg(&archive_path);
    cmd.assert().success().stdout(
        predicate::str::contains("file1.txt")
            .and(predicate::str::contains("nested/nested_file.dat")),
    );

    // 4. Extract everything
    let extract_dir = tempdir()?;
    let dest = extract_dir.path().join("out");
    let mut cmd = Command::cargo_bin("asarpack")?;
    cmd.arg("extract").arg(&archive_path).arg(&dest);
    cmd.assert().success();

    assert_eq!(fs::read(dest.join("file1.txt"))?, fs::read(&file1_path)?);
    assert_eq!(
        fs::read(dest.join("nested/nested_file.dat"))?,
        fs::read(&nested_file_path)?
    );

    // 5. Extract a single entry into the working directory
    let single_dir = tempdir()?;
    let mut cmd = Command::cargo_bin("asarpack")?;
    cmd.current_dir(single_dir.path())
        .arg("extract-file")
        .arg(&archive_path)
        .arg("nested/nested_file.dat");
    cmd.assert().success();
    assert_eq!(
        fs::read(single_dir.path().join("nested_file.dat"))?,
        &[0, 1, 2, 3, 4, 5]
    );

    Ok(())
}

#[test]
fn test_cli_extract_into_non_empty_dir_fails() -> Result<(), Box<dyn std::error::Error>> {
    let source_dir = tempdir()?;
    fs::write(source_dir.path().join("a.txt"), "data")?;

    let archive_dir = tempdir()?;
    let archive_path = archive_dir.path().join("a.asar");
    let mut cmd = Command::cargo_bin("asarpack")?;
    cmd.arg("pack").arg(source_dir.path()).arg(&archive_path);
    cmd.assert().success();

    let dest = tempdir()?;
    fs::write(dest.path().join("occupied.txt"), "already here")?;

    let mut cmd = Command::cargo_bin("asarpack")?;
    cmd.arg("extract").arg(&archive_path).arg(dest.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not empty"));

    Ok(())
}

#[test]
fn test_cli_missing_entry_reports_failure() -> Result<(), Box<dyn std::error::Error>> {
    let source_dir = tempdir()?;
    fs::write(source_dir.path().join("a.txt"), "data")?;

    let archive_dir = tempdir()?;
    let archive_path = archive_dir.path().join("a.asar");
    let mut cmd = Command::cargo_bin("asarpack")?;
    cmd.arg("pack").arg(source_dir.path()).arg(&archive_path);
    cmd.assert().success();

    let work = tempdir()?;
    let mut cmd = Command::cargo_bin("asarpack")?;
    cmd.current_dir(work.path())
        .arg("extract-file")
        .arg(&archive_path)
        .arg("nope.txt");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not found"));

    Ok(())
}
