//! `Config::from_env` against the real process environment
//!
//! These mutate process-wide state, so they run serially.

use secrecy::ExposeSecret;
use serial_test::serial;
use std::time::Duration;
use sticker_exporter::{Config, Error};

const VARS: &[&str] = &[
    "BOT_TOKEN",
    "MAX_PER_PACK",
    "CMD_TIMEOUT",
    "TELETHON_API_ID",
    "TELETHON_API_HASH",
    "STICKER_CONVERT_BIN",
    "EXPORT_AUTHOR",
];

fn clear_env() {
    for var in VARS {
        // SAFETY: tests in this file are #[serial] and no other thread reads the environment
        unsafe { std::env::remove_var(var) };
    }
}

fn set(key: &str, value: &str) {
    // SAFETY: see clear_env
    unsafe { std::env::set_var(key, value) };
}

#[test]
#[serial]
fn reads_token_and_overrides_from_environment() {
    clear_env();
    set("BOT_TOKEN", "123:abc");
    set("MAX_PER_PACK", "25");
    set("CMD_TIMEOUT", "90");
    set("EXPORT_AUTHOR", "Me");

    let config = Config::from_env().unwrap();

    assert_eq!(config.bot.token.expose_secret(), "123:abc");
    assert_eq!(config.export.max_per_pack, 25);
    assert_eq!(config.tools.command_timeout, Duration::from_secs(90));
    assert_eq!(config.export.author, "Me");
    assert!(!config.wants_telethon());
    clear_env();
}

#[test]
#[serial]
fn missing_token_names_the_variable() {
    clear_env();

    let err = Config::from_env().unwrap_err();

    assert!(matches!(
        err,
        Error::Config { key: Some(ref key), .. } if key == "BOT_TOKEN"
    ));
}

#[test]
#[serial]
fn telethon_credentials_enable_private_downloads() {
    clear_env();
    set("BOT_TOKEN", "123:abc");
    set("TELETHON_API_ID", "12345");
    set("TELETHON_API_HASH", "deadbeef");

    let config = Config::from_env().unwrap();

    assert!(config.wants_telethon());
    let rendered = format!("{config:?}");
    assert!(!rendered.contains("deadbeef"));
    assert!(!rendered.contains("123:abc"));
    clear_env();
}
