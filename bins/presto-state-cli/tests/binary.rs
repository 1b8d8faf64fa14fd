// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]

use assert_cmd::Command;
use predicates::prelude::*;
use presto_state_dry_tests::fixtures::{parameter_comparison, price_predicate};

fn presto_state(config_dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("presto-state").unwrap();
    cmd.arg("--config-dir").arg(config_dir.path()).env_remove("PRESTO_STATE_LOG");
    cmd
}

#[test]
fn reads_stdin_and_formats() {
    let dir = tempfile::tempdir().unwrap();
    presto_state(&dir)
        .args(["format-expr", "--param", "42", "--param", "x", "-"])
        .write_stdin(parameter_comparison().to_string())
        .assert()
        .success()
        .stdout("(42 = 'x')\n");
}

#[test]
fn decode_failure_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    presto_state(&dir)
        .args(["decode", "--kind", "memory-pool", "-"])
        .write_stdin("{\"maxBytes\": 10}")
        .assert()
        .failure()
        .stderr(predicate::str::contains("decoding memory pool"));
}

#[test]
fn prefs_round_trip_through_the_config_dir() {
    let dir = tempfile::tempdir().unwrap();
    presto_state(&dir)
        .args(["prefs", "set", "--pretty", "true"])
        .assert()
        .success();
    assert!(dir.path().join("prefs.json").exists());

    presto_state(&dir)
        .args(["decode", "--kind", "expression", "--emit", "json", "-"])
        .write_stdin(price_predicate().to_string())
        .assert()
        .success()
        .stdout(predicate::str::contains("\n  \"operator\": \"GREATER_THAN\""));
}

#[test]
fn verbose_logs_go_to_stderr() {
    let dir = tempfile::tempdir().unwrap();
    presto_state(&dir)
        .args(["-v", "decode", "--kind", "expression", "-"])
        .write_stdin(price_predicate().to_string())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("comparison expression: (totalprice > 1000.5)"))
        .stderr(predicate::str::contains("decoded expression"));
}
