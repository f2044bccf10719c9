//! CLI interface end-to-end tests: run the real `lumina` binary and assert
//! on its exit code and stdio.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn lumina_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_lumina"))
}

fn source_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{content}").unwrap();
    file
}

#[test]
fn help_output_lists_the_four_subcommands() {
    lumina_bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("compile"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("repl"));
}

#[test]
fn version_flag_reports_a_version() {
    lumina_bin().arg("--version").assert().success().stdout(predicate::str::contains("lumina"));
}

#[test]
fn repl_is_not_implemented_by_this_core() {
    lumina_bin().arg("repl").assert().failure().stderr(predicate::str::contains("not implemented"));
}

#[test]
fn watch_is_not_implemented_by_this_core() {
    let file = source_file("fn main() {}");
    lumina_bin().arg("watch").arg(file.path()).assert().failure().stderr(predicate::str::contains("not implemented"));
}

#[test]
fn compile_without_a_parser_collaborator_reports_no_parser_available() {
    let file = source_file("fn main() {}");
    lumina_bin().arg("compile").arg(file.path()).assert().failure().stderr(predicate::str::contains("parser"));
}

#[test]
fn compile_rejects_an_unknown_target() {
    let file = source_file("fn main() {}");
    lumina_bin()
        .arg("compile")
        .arg(file.path())
        .arg("--target")
        .arg("llvm")
        .assert()
        .failure()
        .stderr(predicate::str::contains("target"));
}

#[test]
fn compile_of_a_missing_file_reports_an_io_error() {
    lumina_bin().arg("compile").arg("/nonexistent/does-not-exist.lum").assert().failure();
}
