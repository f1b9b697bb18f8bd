use assert_cmd::Command;
use predicates::prelude::*;

fn clipper() -> Command {
    Command::cargo_bin("clipper").unwrap()
}

#[test]
fn help_lists_lifecycle_commands() {
    clipper()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("publish"))
        .stdout(predicate::str::contains("batch"));
}

#[test]
fn version_is_printed() {
    clipper()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn publish_without_names_is_rejected() {
    clipper()
        .args(["publish", "abc123", "moe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("LOCALE:NAME"));
}

#[test]
fn missing_url_is_rejected() {
    clipper().arg("new").assert().failure();
}

#[test]
fn malformed_config_file_is_reported() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = dir.path().join("config.yaml");
    std::fs::write(&config, "catalog: [not, a, map]\n").unwrap();

    clipper()
        .current_dir(dir.path())
        .args(["--config", config.to_str().unwrap(), "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
}

fn write_config(dir: &std::path::Path) -> std::path::PathBuf {
    let mut config = clipper::Config::default();
    // never contacted by local commands
    config.catalog.url = "http://127.0.0.1:9/catalog".to_string();
    let path = dir.join("config.yaml");
    std::fs::write(&path, serde_yaml::to_string(&config).unwrap()).unwrap();
    path
}

#[test]
fn list_works_without_a_token() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = write_config(dir.path());

    clipper()
        .current_dir(dir.path())
        .env_remove("CLIPPER_TOKEN")
        .args(["--config", config.to_str().unwrap(), "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No clips yet"));
}

#[test]
fn catalog_commands_ask_for_a_token() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = write_config(dir.path());

    clipper()
        .current_dir(dir.path())
        .env_remove("CLIPPER_TOKEN")
        .args(["--config", config.to_str().unwrap(), "category", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CLIPPER_TOKEN"));
}
