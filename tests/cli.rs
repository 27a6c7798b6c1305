use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn tripweave_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("tripweave");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    // Photos without any EXIF block: no GPS, file time only.
    let photos_dir = root.join("photos");
    fs::create_dir_all(photos_dir.join("day1")).unwrap();
    fs::write(photos_dir.join("day1/IMG_0001.JPG"), b"\xFF\xD8\xFF\xD9").unwrap();
    fs::write(photos_dir.join("day1/IMG_0002.jpg"), b"\xFF\xD8\xFF\xD9").unwrap();
    fs::write(photos_dir.join("day1/notes.txt"), "not a photo").unwrap();

    let config_content = r#"[clustering]
distance_threshold_m = 200.0
time_threshold_min = 30.0

[geocoding]
provider = "disabled"

[generation]
max_photos = 50
locale = "en"
"#;

    let config_path = config_dir.join("tripweave.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_tripweave(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = tripweave_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run tripweave binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_generate_json_without_gps() {
    let (tmp, config) = setup_test_env();
    let photos = tmp.path().join("photos");

    let (stdout, stderr, success) = run_tripweave(
        &config,
        &["generate", photos.to_str().unwrap(), "--json", "--progress", "off"],
    );
    assert!(success, "generate failed: {}", stderr);

    let out: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(out["trip"]["photo_count"], 2);
    assert_eq!(out["trip"]["spots"].as_array().unwrap().len(), 0);
    assert_eq!(out["trip"]["location"], "Unknown");
    assert_eq!(out["tags"].as_array().unwrap().len(), 5);
    assert_eq!(out["cancelled"], false);

    let warnings: Vec<&str> = out["warnings"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|w| w.as_str())
        .collect();
    assert!(
        warnings.iter().any(|w| w.contains("No location data")),
        "warnings: {:?}",
        warnings
    );
}

#[test]
fn test_generate_rejects_too_many_photos_before_reading() {
    let (tmp, config) = setup_test_env();
    let limited = fs::read_to_string(&config)
        .unwrap()
        .replace("max_photos = 50", "max_photos = 1");
    fs::write(&config, limited).unwrap();
    let photos = tmp.path().join("photos");

    let (stdout, stderr, success) = run_tripweave(
        &config,
        &["generate", photos.to_str().unwrap(), "--progress", "off"],
    );
    assert!(!success);
    assert!(stdout.is_empty(), "stdout: {}", stdout);
    assert!(
        stderr.contains("Too many photos: 2 found under"),
        "stderr: {}",
        stderr
    );
}

#[test]
fn test_generate_text_output() {
    let (tmp, config) = setup_test_env();
    let photos = tmp.path().join("photos");

    let (stdout, stderr, success) = run_tripweave(
        &config,
        &["generate", photos.to_str().unwrap(), "--progress", "off"],
    );
    assert!(success, "generate failed: {}", stderr);
    assert!(stdout.contains("(2 photos, 0 spots)"), "stdout: {}", stdout);
    assert!(stdout.contains("warning:"));
}

#[test]
fn test_generate_json_progress_on_stderr() {
    let (tmp, config) = setup_test_env();
    let photos = tmp.path().join("photos");

    let (_, stderr, success) = run_tripweave(
        &config,
        &["generate", photos.to_str().unwrap(), "--json", "--progress", "json"],
    );
    assert!(success, "generate failed: {}", stderr);
    assert!(stderr.contains(r#""phase":"extracting""#), "stderr: {}", stderr);
    assert!(stderr.contains(r#""event":"complete""#));
}

#[test]
fn test_generate_empty_directory_fails() {
    let (tmp, config) = setup_test_env();
    let empty = tmp.path().join("empty");
    fs::create_dir_all(&empty).unwrap();

    let (_, stderr, success) = run_tripweave(&config, &["generate", empty.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("No photos found"), "stderr: {}", stderr);
}

#[test]
fn test_titles() {
    let (_tmp, config) = setup_test_env();

    let (stdout, stderr, success) = run_tripweave(
        &config,
        &["titles", "place:Kyoto", "season:Autumn trip", "time:Evening walk"],
    );
    assert!(success, "titles failed: {}", stderr);
    let lines: Vec<&str> = stdout.lines().collect();
    assert!(!lines.is_empty() && lines.len() <= 3, "stdout: {}", stdout);
    assert!(lines[0].contains("Kyoto"));
}

#[test]
fn test_titles_rejects_bad_tags() {
    let (_tmp, config) = setup_test_env();

    let (_, _, success) = run_tripweave(&config, &["titles", "place:Kyoto", "season:Autumn"]);
    assert!(!success);

    let (_, stderr, success) = run_tripweave(
        &config,
        &["titles", "place:Kyoto", "weather:Rain", "time:Night"],
    );
    assert!(!success);
    assert!(stderr.contains("Unknown tag category"), "stderr: {}", stderr);
}

#[test]
fn test_exif_without_metadata() {
    let (tmp, config) = setup_test_env();
    let photo = tmp.path().join("photos/day1/IMG_0001.JPG");

    let (stdout, stderr, success) = run_tripweave(&config, &["exif", photo.to_str().unwrap()]);
    assert!(success, "exif failed: {}", stderr);
    let out: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(out["location"].is_null());
    assert_eq!(out["has_exif"], false);
}

#[test]
fn test_geocode_with_provider_disabled() {
    let (_tmp, config) = setup_test_env();

    let (stdout, stderr, success) = run_tripweave(&config, &["geocode", "35.5", "139.25"]);
    assert!(success, "geocode failed: {}", stderr);
    let out: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(out["name"], "Unknown spot");
    assert_eq!(out["address"], "35.500000, 139.250000");
}

#[test]
fn test_invalid_config_is_reported() {
    let (tmp, _) = setup_test_env();
    let bad = tmp.path().join("config/bad.toml");
    fs::write(&bad, "[geocoding]\nprovider = \"carrier-pigeon\"\n").unwrap();

    let (_, stderr, success) = run_tripweave(&bad, &["titles", "place:A", "season:B", "time:C"]);
    assert!(!success);
    assert!(stderr.contains("Unknown geocoding provider"), "stderr: {}", stderr);
}
