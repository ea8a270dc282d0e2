// Tests for the validator executable
//
//  Copyright (C) 2014-2022 Ryan Specialty Group, LLC.
//
//  This file is part of Dervish.
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const SCHEMA: &str = "tests/data/foo.rng";

#[test]
fn invalid_argument() -> TestResult {
    let mut cmd = Command::cargo_bin("dervish")?;
    cmd.arg("--foo");
    cmd.assert()
        .failure()
        .code(exitcode::USAGE)
        .stderr(predicate::str::contains("Unrecognized option:"));

    Ok(())
}

#[test]
fn missing_schema() -> TestResult {
    let mut cmd = Command::cargo_bin("dervish")?;
    cmd.assert()
        .failure()
        .code(exitcode::USAGE)
        .stderr(predicate::str::contains("SCHEMA"));

    Ok(())
}

#[test]
fn missing_document() -> TestResult {
    let mut cmd = Command::cargo_bin("dervish")?;
    cmd.arg(SCHEMA);
    cmd.assert()
        .failure()
        .code(exitcode::USAGE)
        .stderr(predicate::str::contains("DOCUMENT"));

    Ok(())
}

#[test]
fn help() -> TestResult {
    let mut cmd = Command::cargo_bin("dervish")?;
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("SCHEMA DOCUMENT..."));

    Ok(())
}

#[test]
fn valid_document() -> TestResult {
    let mut cmd = Command::cargo_bin("dervish")?;
    cmd.arg(SCHEMA).arg("tests/data/valid.xml");
    cmd.assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::is_empty());

    Ok(())
}

#[test]
fn invalid_document_reports_each_error() -> TestResult {
    let mut cmd = Command::cargo_bin("dervish")?;
    cmd.arg(SCHEMA).arg("tests/data/invalid.xml");
    cmd.assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains(
            "element `Foo` is missing a required attribute",
        ))
        .stdout(predicate::str::contains("unexpected element `Baz`"))
        .stdout(predicate::str::contains("invalid text in element `count`"))
        .stdout(predicate::str::contains("tests/data/invalid.xml:3:"))
        .stderr(predicate::str::contains(
            "`tests/data/invalid.xml` is invalid due to 3 error(s)",
        ));

    Ok(())
}

#[test]
fn quiet_suppresses_individual_errors() -> TestResult {
    let mut cmd = Command::cargo_bin("dervish")?;
    cmd.arg("-q").arg(SCHEMA).arg("tests/data/invalid.xml");
    cmd.assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("is invalid due to 3 error(s)"));

    Ok(())
}

#[test]
fn any_invalid_document_fails() -> TestResult {
    let mut cmd = Command::cargo_bin("dervish")?;
    cmd.arg("-q")
        .arg(SCHEMA)
        .arg("tests/data/valid.xml")
        .arg("tests/data/invalid.xml");
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("tests/data/invalid.xml"))
        .stderr(predicate::str::contains("`tests/data/valid.xml`").not());

    Ok(())
}

#[test]
fn malformed_document_is_fatal() -> TestResult {
    let mut cmd = Command::cargo_bin("dervish")?;
    cmd.arg(SCHEMA).arg("tests/data/malformed.xml");
    cmd.assert().failure().code(1).stderr(predicate::str::contains(
        "fatal: failed to validate `tests/data/malformed.xml`",
    ));

    Ok(())
}

#[test]
fn document_does_not_exist() -> TestResult {
    let mut cmd = Command::cargo_bin("dervish")?;
    cmd.arg(SCHEMA).arg("tests/data/nope.xml");
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No such file or directory"));

    Ok(())
}

#[test]
fn unsupported_schema() -> TestResult {
    let mut cmd = Command::cargo_bin("dervish")?;
    cmd.arg("tests/data/include.rng").arg("tests/data/valid.xml");
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("`include` is not supported"))
        .stderr(predicate::str::contains(
            "fatal: failed to load schema `tests/data/include.rng`",
        ));

    Ok(())
}
