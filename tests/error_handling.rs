use std::io::Write;

use fashion_buddy::{load_recommender, ConfigLoadError, PipelineError};
use tempfile::NamedTempFile;

fn yaml_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_recommender(dir.path().join("pipeline.yaml"));
    assert!(matches!(
        result,
        Err(PipelineError::Config(ConfigLoadError::FileRead(_)))
    ));
}

#[test]
fn newer_config_version_is_rejected() {
    let file = yaml_file("version: \"2.0\"\n");
    assert!(matches!(
        load_recommender(file.path()),
        Err(PipelineError::Config(ConfigLoadError::UnsupportedVersion(_)))
    ));
}

#[test]
fn unknown_embedding_mode_fails_validation() {
    let file = yaml_file("version: \"1.0\"\nembedding:\n  mode: \"telepathy\"\ncatalog:\n  backend: \"in_memory\"\n");
    assert!(matches!(
        load_recommender(file.path()),
        Err(PipelineError::Config(ConfigLoadError::Validation(_)))
    ));
}

#[test]
fn hosted_services_need_credentials() {
    // Only fails when the environment does not already provide them.
    if std::env::var("GCP_ACCESS_TOKEN").is_ok() || std::env::var("ASTRA_DB_TOKEN").is_ok() {
        return;
    }
    let file = yaml_file("version: \"1.0\"\nembedding:\n  mode: \"vertex\"\n  project_id: \"demo\"\ncatalog:\n  backend: \"astra\"\n  api_endpoint: \"https://db.example\"\n");
    assert!(matches!(
        load_recommender(file.path()),
        Err(PipelineError::Config(ConfigLoadError::MissingCredential(_)))
    ));
}
