use std::collections::HashMap;

use super::*;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
    move |key| map.get(key).cloned()
}

#[test]
fn empty_environment_gives_defaults() {
    let cfg = ServerConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(cfg, ServerConfig::default());
    assert_eq!(cfg.port, 3000);
    assert_eq!(cfg.render_timeout, Duration::from_secs(10));
    assert_eq!(cfg.font, FontSource::System);
    assert_eq!(cfg.cache_capacity.get(), 256);
    assert_eq!(cfg.max_payload_bytes, 65_536);
}

#[test]
fn overrides_are_parsed() {
    let cfg = ServerConfig::from_lookup(lookup(&[
        ("PORT", "8080"),
        ("RENDER_TIMEOUT_MS", "2500"),
        ("FONT_FETCH_TIMEOUT_SECS", "3"),
        ("OG_CACHE_CAPACITY", "16"),
        ("MAX_PAYLOAD_BYTES", "1024"),
    ]))
    .unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.render_timeout, Duration::from_millis(2500));
    assert_eq!(cfg.font_fetch_timeout, Duration::from_secs(3));
    assert_eq!(cfg.cache_capacity.get(), 16);
    assert_eq!(cfg.max_payload_bytes, 1024);
}

#[test]
fn blank_values_count_as_unset() {
    let cfg = ServerConfig::from_lookup(lookup(&[("PORT", "  "), ("OG_FONT_URL", "")])).unwrap();
    assert_eq!(cfg.port, DEFAULT_PORT);
    assert_eq!(cfg.font, FontSource::System);
}

#[test]
fn font_path_wins_over_url() {
    let cfg = ServerConfig::from_lookup(lookup(&[
        ("OG_FONT_PATH", "/fonts/NotoSansJP.ttf"),
        ("OG_FONT_URL", "https://example.test/font.ttf"),
    ]))
    .unwrap();
    assert_eq!(cfg.font, FontSource::File(PathBuf::from("/fonts/NotoSansJP.ttf")));

    let cfg = ServerConfig::from_lookup(lookup(&[("OG_FONT_URL", "https://example.test/font.ttf")])).unwrap();
    assert_eq!(cfg.font, FontSource::Url("https://example.test/font.ttf".into()));
}

#[test]
fn unparsable_port_is_an_error() {
    let err = ServerConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
    assert_eq!(err, ConfigError::Invalid { key: "PORT", value: "eighty".into() });
}

#[test]
fn zero_timeout_is_an_error() {
    let err = ServerConfig::from_lookup(lookup(&[("RENDER_TIMEOUT_MS", "0")])).unwrap_err();
    assert_eq!(err, ConfigError::Zero { key: "RENDER_TIMEOUT_MS" });
}

#[test]
fn zero_cache_capacity_is_an_error() {
    let err = ServerConfig::from_lookup(lookup(&[("OG_CACHE_CAPACITY", "0")])).unwrap_err();
    assert_eq!(err, ConfigError::Zero { key: "OG_CACHE_CAPACITY" });
}

#[test]
fn from_env_reads_process_environment() {
    // SAFETY: no other test in this binary touches these variables.
    unsafe {
        std::env::set_var("OG_CACHE_CAPACITY", "7");
    }
    let cfg = ServerConfig::from_env().unwrap();
    assert_eq!(cfg.cache_capacity.get(), 7);
    unsafe {
        std::env::remove_var("OG_CACHE_CAPACITY");
    }
}
