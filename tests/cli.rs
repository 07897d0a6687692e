use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn bin() -> Command {
    Command::cargo_bin("dmarc-convert").unwrap()
}

#[test]
fn version_prints_package_version() {
    bin()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn missing_config_file_fails_with_config_error() {
    bin()
        .args(["--config", "does-not-exist.toml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unable to read config file"));
}

#[test]
fn generate_config_then_run_empty_input_dir() {
    let tmp = TempDir::new().unwrap();

    bin()
        .current_dir(tmp.path())
        .args(["--generate-config", "--config", "config.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated sample configuration"));

    assert!(tmp.path().join("config.toml").exists());

    // The sample config points at an empty input directory, so a run finds
    // nothing to convert and exits cleanly.
    bin()
        .current_dir(tmp.path())
        .args(["--config", "config.toml"])
        .assert()
        .success();

    assert!(tmp.path().join("input").is_dir());
}

#[test]
fn contradictory_cleanup_policy_is_rejected() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[input]\ndir = \"input\"\ndelete = true\narchive_dir = \"archive\"\n\n[output]\nformat = \"txt\"\n",
    )
    .unwrap();

    bin()
        .current_dir(tmp.path())
        .args(["--config", "config.toml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("mutually exclusive"));
}

#[test]
fn converts_report_to_stdout() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("input")).unwrap();
    fs::write(
        tmp.path().join("input/report.xml"),
        r#"<?xml version="1.0"?>
<feedback>
  <report_metadata>
    <org_name>Example</org_name>
    <email>dmarc@example.com</email>
    <report_id>42</report_id>
    <date_range><begin>1700000000</begin><end>1700086400</end></date_range>
  </report_metadata>
  <policy_published>
    <domain>example.com</domain>
    <p>none</p>
  </policy_published>
  <record>
    <row>
      <source_ip>192.0.2.1</source_ip>
      <count>1</count>
      <policy_evaluated><disposition>none</disposition><dkim>pass</dkim><spf>pass</spf></policy_evaluated>
    </row>
    <identifiers><header_from>example.com</header_from></identifiers>
    <auth_results></auth_results>
  </record>
</feedback>
"#,
    )
    .unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[input]\ndir = \"input\"\n\n[output]\nformat = \"txt\"\n",
    )
    .unwrap();

    bin()
        .current_dir(tmp.path())
        .args(["--config", "config.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DMARC aggregate report from Example"))
        .stdout(predicate::str::contains("192.0.2.1"));

    // No cleanup policy configured, the source file stays.
    assert!(tmp.path().join("input/report.xml").exists());
}
