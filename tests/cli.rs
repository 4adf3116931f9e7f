//! End-to-end runs of the binary over scratch trees. Physical block
//! addresses cannot be pinned on a test host, so these assert the
//! completeness, skip and error contracts; ordering is covered by the
//! unit tests against the sort layers.

use assert_cmd::Command;

fn fastwalk() -> Command {
    Command::cargo_bin("fastwalk").unwrap()
}

fn stdout_lines(output: &[u8]) -> Vec<String> {
    let mut lines: Vec<String> = String::from_utf8_lossy(output)
        .lines()
        .map(str::to_owned)
        .collect();
    lines.sort();
    lines
}

#[test]
fn prints_every_regular_file_exactly_once() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("a"), b"1").unwrap();
    std::fs::write(tmp.path().join("b"), b"2").unwrap();
    std::fs::create_dir(tmp.path().join("sub")).unwrap();
    std::fs::write(tmp.path().join("sub/c"), b"3").unwrap();

    let out = fastwalk().arg(tmp.path()).output().unwrap();
    let lines = stdout_lines(&out.stdout);
    let root = tmp.path().display();
    assert_eq!(
        lines,
        vec![
            format!("{root}/a"),
            format!("{root}/b"),
            format!("{root}/sub/c"),
        ]
    );
}

#[test]
fn skip_flag_prunes_the_named_subtree() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("keep"), b"k").unwrap();
    std::fs::create_dir(tmp.path().join("sub")).unwrap();
    std::fs::write(tmp.path().join("sub/inner"), b"i").unwrap();

    let out = fastwalk()
        .args(["-p", "sub"])
        .arg(tmp.path())
        .output()
        .unwrap();
    assert_eq!(stdout_lines(&out.stdout), vec![format!("{}/keep", tmp.path().display())]);
}

#[test]
fn repeating_a_skip_name_changes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("keep"), b"k").unwrap();
    std::fs::create_dir(tmp.path().join("sub")).unwrap();
    std::fs::write(tmp.path().join("sub/inner"), b"i").unwrap();

    let once = fastwalk()
        .args(["-p", "sub"])
        .arg(tmp.path())
        .output()
        .unwrap();
    let twice = fastwalk()
        .args(["-p", "sub", "-p", "sub"])
        .arg(tmp.path())
        .output()
        .unwrap();
    assert_eq!(stdout_lines(&once.stdout), stdout_lines(&twice.stdout));
}

#[test]
fn missing_root_reports_on_stderr_and_fails() {
    let out = fastwalk().arg("/no-such-fastwalk-root").output().unwrap();
    assert!(!out.status.success());
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("/no-such-fastwalk-root"));
}

#[test]
fn a_bad_root_does_not_stop_the_good_ones() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("real"), b"x").unwrap();

    let out = fastwalk()
        .arg("/no-such-fastwalk-root")
        .arg(tmp.path())
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert_eq!(stdout_lines(&out.stdout), vec![format!("{}/real", tmp.path().display())]);
}

#[test]
fn unknown_flag_prints_usage_and_exits_1() {
    let out = fastwalk().arg("-Z").output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Usage"));
}

#[test]
fn readahead_mode_emits_nothing_on_stdout() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("a"), vec![0u8; 8192]).unwrap();

    let out = fastwalk().arg("-r").arg(tmp.path()).output().unwrap();
    assert!(out.stdout.is_empty());
}

#[test]
fn empty_directory_prints_nothing_and_succeeds() {
    let tmp = tempfile::tempdir().unwrap();
    fastwalk().arg(tmp.path()).assert().success().stdout("");
}
