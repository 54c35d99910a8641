//! Config parsing, override and path-resolution tests.

use std::path::Path;
use std::time::Duration;

use dlp_access::ContentSlot;
use dlp_access_cli::config::{resolve_config_path_from, AccessConfig, ConfigError};
use dlp_access_cli::load_config;

const SAMPLE: &str = r#"
[api]
endpoint = "https://api.example.org/graphql"
api_key = "da2-secret"
timeout_ms = 2500

[site]
name = "Test Library"
search_url = "https://search.example.org/find"
ark_prefix = "ark:/99999/"

[content]
team = "team-v2"
harmful_content_statement = "hcs-override"
"#;

#[test]
fn test_parse_full_config() {
    let config = AccessConfig::from_toml(SAMPLE, Path::new("sample.toml")).unwrap();
    assert_eq!(
        config.api.endpoint.as_deref(),
        Some("https://api.example.org/graphql")
    );
    assert_eq!(config.api.timeout_ms, 2500);
    assert_eq!(config.api.ready_timeout_ms, 5_000);
    assert_eq!(config.site.name, "Test Library");

    let options = config.gateway_options();
    assert_eq!(options.ark_prefix, "ark:/99999/");
    assert_eq!(options.ready_timeout, Duration::from_millis(5_000));

    let registry = config.content_registry().unwrap();
    assert_eq!(registry.id(ContentSlot::Team), "team-v2");
    assert_eq!(
        registry.id(ContentSlot::HarmfulContentStatement),
        "hcs-override"
    );
    assert_eq!(registry.id(ContentSlot::About), "about");

    let rewriter = config.rewriter().unwrap();
    assert_eq!(
        rewriter.link_for("format", "PDF"),
        "https://search.example.org/find?q=&field=all&view=gallery&format=PDF"
    );

    let transport = config.transport().unwrap();
    assert_eq!(transport.endpoint().host_str(), Some("api.example.org"));
}

#[test]
fn test_empty_config_uses_defaults() {
    let config = AccessConfig::from_toml("", Path::new("empty.toml")).unwrap();
    assert!(config.api.endpoint.is_none());
    assert_eq!(config.site.ark_prefix, "ark:/53696/");
    assert_eq!(
        config.rewriter().unwrap().search_url(),
        "https://digital.lib.vt.edu/search"
    );
    assert!(matches!(
        config.transport(),
        Err(ConfigError::MissingEndpoint)
    ));
}

#[test]
fn test_invalid_toml_names_the_file() {
    let err = AccessConfig::from_toml("[api\nendpoint=", Path::new("broken.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("broken.toml"));
}

#[test]
fn test_unknown_content_section_is_rejected() {
    let config =
        AccessConfig::from_toml("[content]\ngallery = \"x\"\n", Path::new("c.toml")).unwrap();
    assert!(config.content_registry().is_err());
}

#[test]
fn test_search_url_with_query_is_rejected() {
    let config = AccessConfig::from_toml(
        "[site]\nsearch_url = \"https://x.org/search?q=1\"\n",
        Path::new("c.toml"),
    )
    .unwrap();
    assert!(config.rewriter().is_err());
}

#[test]
fn test_overrides_replace_only_non_blank_values() {
    let mut config = AccessConfig::from_toml(SAMPLE, Path::new("sample.toml")).unwrap();

    config.apply_overrides(None, Some("   ".into()));
    assert_eq!(config.api.api_key.as_deref(), Some("da2-secret"));

    config.apply_overrides(Some("http://localhost:4000/graphql".into()), Some("k2".into()));
    assert_eq!(
        config.api.endpoint.as_deref(),
        Some("http://localhost:4000/graphql")
    );
    assert_eq!(config.api.api_key.as_deref(), Some("k2"));
}

#[test]
fn test_load_config_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dlp-access.toml");
    std::fs::write(&path, SAMPLE).unwrap();

    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.site.name, "Test Library");
}

#[test]
fn test_load_config_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_config(Some(&dir.path().join("nope.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

// ─────────────────────── path resolution ───────────────────────

#[test]
fn test_explicit_path_wins() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("dlp-access.toml"), "").unwrap();

    let resolved = resolve_config_path_from(
        Some("/etc/dlp.toml"),
        Some("/env/dlp.toml".into()),
        dir.path(),
        None,
    );
    assert_eq!(resolved.as_deref(), Some(Path::new("/etc/dlp.toml")));
}

#[test]
fn test_env_path_beats_local_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("dlp-access.toml"), "").unwrap();

    let resolved = resolve_config_path_from(None, Some("/env/dlp.toml".into()), dir.path(), None);
    assert_eq!(resolved.as_deref(), Some(Path::new("/env/dlp.toml")));

    let resolved = resolve_config_path_from(None, Some(String::new()), dir.path(), None);
    assert_eq!(resolved, Some(dir.path().join("dlp-access.toml")));
}

#[test]
fn test_home_config_is_last_resort() {
    let cwd = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();

    assert_eq!(
        resolve_config_path_from(None, None, cwd.path(), Some(home.path())),
        None
    );

    let user = home.path().join(".config/dlp-access/config.toml");
    std::fs::create_dir_all(user.parent().unwrap()).unwrap();
    std::fs::write(&user, "").unwrap();
    assert_eq!(
        resolve_config_path_from(None, None, cwd.path(), Some(home.path())),
        Some(user)
    );
}
