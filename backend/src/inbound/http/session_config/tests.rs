//! Unit tests for session configuration parsing.

use std::collections::HashMap;
use std::io::Write;

use mockable::MockEnv;
use rstest::{fixture, rstest};
use tempfile::NamedTempFile;

use super::*;

fn key_file(len: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temporary key file");
    file.write_all(&vec![b'k'; len]).expect("write key bytes");
    file
}

fn mock_env(vars: HashMap<&'static str, String>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

struct ReleaseEnv {
    key: NamedTempFile,
    vars: HashMap<&'static str, String>,
}

impl ReleaseEnv {
    fn with(mut self, name: &'static str, value: &str) -> Self {
        self.vars.insert(name, value.to_owned());
        self
    }

    fn without(mut self, name: &'static str) -> Self {
        self.vars.remove(name);
        self
    }

    fn load(self) -> Result<SessionSettings, SessionConfigError> {
        let env = mock_env(self.vars);
        let result = session_settings_from_env(&env, BuildMode::Release);
        drop(self.key);
        result
    }
}

#[fixture]
fn release_env() -> ReleaseEnv {
    let key = key_file(SESSION_KEY_MIN_LEN);
    let path = key.path().to_string_lossy().into_owned();
    let vars = HashMap::from([
        (KEY_FILE_ENV, path),
        (COOKIE_SECURE_ENV, "1".to_owned()),
        (SAMESITE_ENV, "Strict".to_owned()),
        (ALLOW_EPHEMERAL_ENV, "0".to_owned()),
    ]);
    ReleaseEnv { key, vars }
}

#[rstest]
fn release_accepts_complete_configuration(release_env: ReleaseEnv) {
    let settings = release_env
        .with(TTL_ENV, "900")
        .load()
        .expect("release settings");
    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Strict);
    assert_eq!(settings.ttl, TimeDelta::minutes(15));
}

#[rstest]
#[case(COOKIE_SECURE_ENV)]
#[case(SAMESITE_ENV)]
#[case(ALLOW_EPHEMERAL_ENV)]
fn release_requires_every_toggle(release_env: ReleaseEnv, #[case] name: &'static str) {
    let Err(err) = release_env.without(name).load() else {
        panic!("missing {name} should be rejected");
    };
    assert!(matches!(err, SessionConfigError::MissingEnv { name: missing } if missing == name));
}

#[rstest]
#[case(COOKIE_SECURE_ENV, "maybe")]
#[case(COOKIE_SECURE_ENV, "")]
#[case(SAMESITE_ENV, "sometimes")]
#[case(ALLOW_EPHEMERAL_ENV, "2")]
#[case(TTL_ENV, "0")]
#[case(TTL_ENV, "-60")]
#[case(TTL_ENV, "an hour")]
fn release_rejects_invalid_values(
    release_env: ReleaseEnv,
    #[case] name: &'static str,
    #[case] value: &str,
) {
    let Err(err) = release_env.with(name, value).load() else {
        panic!("{name}={value} should be rejected");
    };
    assert!(matches!(err, SessionConfigError::InvalidEnv { name: invalid, .. } if invalid == name));
}

#[rstest]
fn release_rejects_ephemeral_keys(release_env: ReleaseEnv) {
    let result = release_env.with(ALLOW_EPHEMERAL_ENV, "yes").load();
    assert!(matches!(result, Err(SessionConfigError::EphemeralNotAllowed)));
}

#[rstest]
fn release_rejects_insecure_same_site_none(release_env: ReleaseEnv) {
    let result = release_env
        .with(COOKIE_SECURE_ENV, "0")
        .with(SAMESITE_ENV, "None")
        .load();
    assert!(matches!(result, Err(SessionConfigError::InsecureSameSiteNone)));
}

#[rstest]
fn release_requires_a_readable_key(release_env: ReleaseEnv) {
    let result = release_env
        .with(KEY_FILE_ENV, "/nonexistent/engagement-ledger/session_key")
        .load();
    assert!(matches!(result, Err(SessionConfigError::KeyRead { .. })));
}

#[rstest]
fn release_rejects_short_keys(release_env: ReleaseEnv) {
    let short = key_file(SESSION_KEY_MIN_LEN - 1);
    let path = short.path().to_string_lossy().into_owned();
    let result = release_env.with(KEY_FILE_ENV, &path).load();
    assert!(matches!(
        result,
        Err(SessionConfigError::KeyTooShort { length, .. }) if length == SESSION_KEY_MIN_LEN - 1
    ));
}

#[rstest]
fn debug_falls_back_to_defaults() {
    let env = mock_env(HashMap::from([(
        KEY_FILE_ENV,
        "/nonexistent/engagement-ledger/session_key".to_owned(),
    )]));
    let settings = session_settings_from_env(&env, BuildMode::Debug).expect("debug settings");
    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
    assert_eq!(settings.ttl, TimeDelta::seconds(DEFAULT_TTL_SECS));
}

#[rstest]
#[case(SAMESITE_ENV, "sometimes")]
#[case(COOKIE_SECURE_ENV, "perhaps")]
#[case(TTL_ENV, "0")]
fn debug_tolerates_invalid_values(#[case] name: &'static str, #[case] value: &str) {
    let key = key_file(8);
    let env = mock_env(HashMap::from([
        (KEY_FILE_ENV, key.path().to_string_lossy().into_owned()),
        (name, value.to_owned()),
    ]));
    let settings = session_settings_from_env(&env, BuildMode::Debug).expect("debug settings");
    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
    assert_eq!(settings.ttl, TimeDelta::seconds(DEFAULT_TTL_SECS));
}

#[rstest]
#[case(8)]
#[case(31)]
#[case(SESSION_KEY_MIN_LEN - 1)]
fn debug_replaces_short_keys_with_temporary_ones(#[case] len: usize) {
    let key = key_file(len);
    let env = mock_env(HashMap::from([(
        KEY_FILE_ENV,
        key.path().to_string_lossy().into_owned(),
    )]));

    let first = session_settings_from_env(&env, BuildMode::Debug).expect("debug settings");
    let second = session_settings_from_env(&env, BuildMode::Debug).expect("debug settings");

    assert_ne!(first.key.master(), second.key.master());
}

#[rstest]
#[case("1", Some(true))]
#[case(" YES ", Some(true))]
#[case("n", Some(false))]
#[case("False", Some(false))]
#[case("on", None)]
fn parses_boolean_toggles(#[case] value: &str, #[case] expected: Option<bool>) {
    assert_eq!(parse_bool(value), expected);
}
