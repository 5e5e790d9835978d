use std::io::Write;

use super::*;

#[test]
fn defaults_resolve_to_local_strapi() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.api.provider, Provider::Strapi);
    assert_eq!(settings.api.base_url.as_str(), "http://127.0.0.1:1337/");
    assert!(settings.api.token.is_none());
    assert_eq!(settings.api.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    assert_eq!(settings.api.page_size.get(), 100);
    assert_eq!(settings.cache.ttl, Duration::from_secs(300));
    assert_eq!(settings.cache.max_entries.get(), 64);
    assert_eq!(settings.images.placeholder, DEFAULT_PLACEHOLDER);
    assert!(settings.images.optimize);
    assert_eq!(settings.images.quality, 80);
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.api.provider = Some("strapi".to_string());
    raw.cache.ttl_seconds = Some(600);
    raw.logging.level = Some("info".to_string());

    let overrides = Overrides {
        provider: Some("sanity".to_string()),
        ttl_seconds: Some(5),
        log_level: Some("debug".to_string()),
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.api.provider, Provider::Sanity);
    assert_eq!(settings.cache.ttl, Duration::from_secs(5));
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn zero_ttl_is_allowed() {
    let mut raw = RawSettings::default();
    raw.cache.ttl_seconds = Some(0);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.cache.ttl, Duration::ZERO);
}

#[test]
fn zero_capacity_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.max_entries = Some(0);
    let err = Settings::from_raw(raw).expect_err("zero capacity");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.max_entries",
            ..
        }
    ));
}

#[test]
fn quality_outside_range_is_rejected() {
    for quality in [0, 101, 300] {
        let mut raw = RawSettings::default();
        raw.images.quality = Some(quality);
        let err = Settings::from_raw(raw).expect_err("quality out of range");
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "images.quality",
                ..
            }
        ));
    }
}

#[test]
fn unknown_provider_is_rejected() {
    let mut raw = RawSettings::default();
    raw.api.provider = Some("contentful".to_string());
    let err = Settings::from_raw(raw).expect_err("unknown provider");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "api.provider",
            ..
        }
    ));
}

#[test]
fn base_url_must_be_http() {
    let mut raw = RawSettings::default();
    raw.api.base_url = Some("ftp://cms.local".to_string());
    assert!(Settings::from_raw(raw).is_err());

    let mut raw = RawSettings::default();
    raw.api.base_url = Some("not a url".to_string());
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn blank_token_and_format_are_dropped() {
    let mut raw = RawSettings::default();
    raw.api.token = Some("   ".to_string());
    raw.images.preferred_format = Some(String::new());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.api.token.is_none());
    assert!(settings.images.preferred_format.is_none());
}

#[test]
fn invalid_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("loud".to_string());
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "logging.level",
            ..
        })
    ));
}

#[test]
fn parse_fetch_arguments() {
    let args = CliArgs::parse_from(["folio", "fetch", "main", "projects", "frames"]);
    match args.command {
        Command::Fetch(fetch) => assert_eq!(
            fetch.resources,
            vec![
                ResourceKey::Main,
                ResourceKey::Projects,
                ResourceKey::Collection("frames".to_string()),
            ]
        ),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_show_defaults_to_projects() {
    let args = CliArgs::parse_from(["folio", "show", "7"]);
    match args.command {
        Command::Show(show) => {
            assert_eq!(show.id, "7");
            assert_eq!(show.resource, ResourceKey::Projects);
            assert_eq!(show.slide, None);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn global_overrides_follow_the_subcommand() {
    let args = CliArgs::parse_from([
        "folio",
        "categories",
        "--provider",
        "sanity",
        "--ttl-seconds",
        "30",
        "--log-json",
        "true",
    ]);

    assert!(matches!(args.command, Command::Categories));
    assert_eq!(args.overrides.provider.as_deref(), Some("sanity"));
    assert_eq!(args.overrides.ttl_seconds, Some(30));
    assert_eq!(args.overrides.log_json, Some(true));
}

#[test]
#[serial_test::serial]
fn config_file_is_layered_under_cli() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config");
    writeln!(
        file,
        r#"
[api]
provider = "sanity"
base_url = "https://abc123.api.sanity.io"
dataset = "staging"

[cache]
ttl_seconds = 60
max_entries = 8

[images]
width = 1280
"#
    )
    .expect("write config");

    let path = file.path().to_string_lossy().into_owned();
    let args = CliArgs::parse_from([
        "folio",
        "--config-file",
        path.as_str(),
        "--ttl-seconds",
        "15",
        "categories",
    ]);
    let settings = load(&args).expect("settings");

    assert_eq!(settings.api.provider, Provider::Sanity);
    assert_eq!(settings.api.dataset, "staging");
    assert_eq!(settings.api.base_url.host_str(), Some("abc123.api.sanity.io"));
    assert_eq!(settings.cache.ttl, Duration::from_secs(15));
    assert_eq!(settings.cache.max_entries.get(), 8);
    assert_eq!(settings.images.width.get(), 1280);
}

#[test]
#[serial_test::serial]
fn missing_config_file_is_an_error() {
    let args = CliArgs::parse_from([
        "folio",
        "--config-file",
        "/definitely/not/here/folio.toml",
        "categories",
    ]);
    assert!(matches!(load(&args), Err(LoadError::Build(_))));
}

#[test]
#[serial_test::serial]
fn environment_layers_over_files() {
    // SAFETY: serialized with every other test that touches the environment.
    unsafe {
        std::env::set_var("FOLIO__API__DATASET", "preview");
        std::env::set_var("FOLIO__CACHE__TTL_SECONDS", "42");
    }

    let args = CliArgs::parse_from(["folio", "categories"]);
    let result = load(&args);

    unsafe {
        std::env::remove_var("FOLIO__API__DATASET");
        std::env::remove_var("FOLIO__CACHE__TTL_SECONDS");
    }

    let settings = result.expect("settings");
    assert_eq!(settings.api.dataset, "preview");
    assert_eq!(settings.cache.ttl, Duration::from_secs(42));
}
