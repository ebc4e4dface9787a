//! Credential store and session table used together, the way the auth
//! service drives them.

use std::time::Duration;

use dicebox_session::{CredentialStore, SessionError, SessionTable, Timestamp};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);
const HOUR: Duration = Duration::from_secs(60 * 60);

fn login(
    store: &mut CredentialStore,
    table: &mut SessionTable,
    username: &str,
    password: &str,
    is_new_user: bool,
    now: Timestamp,
) -> Result<String, SessionError> {
    let player_id = store.register_or_verify(username, password, is_new_user)?;
    Ok(table.create_or_replace(player_id, now).token.into_inner())
}

#[test]
fn test_login_logout_then_token_is_dead() {
    let mut store = CredentialStore::new();
    let mut table = SessionTable::new();
    let now = Timestamp::now();

    let token = login(&mut store, &mut table, "u1", "p1", true, now).unwrap();
    assert_eq!(table.touch(&token, now).unwrap().as_str(), "bb82030d");

    table.touch(&token, now).unwrap();
    table.delete(&token).unwrap();

    assert_eq!(table.touch(&token, now), Err(SessionError::InvalidSession));
    assert!(table.is_empty());
}

#[test]
fn test_relogin_invalidates_previous_token() {
    let mut store = CredentialStore::new();
    let mut table = SessionTable::new();
    let now = Timestamp::now();

    let t1 = login(&mut store, &mut table, "u2", "p2", true, now).unwrap();
    let t2 = login(&mut store, &mut table, "u2", "p2", false, now).unwrap();

    assert_ne!(t1, t2);
    assert_eq!(table.touch(&t1, now), Err(SessionError::InvalidSession));
    assert!(table.touch(&t2, now).is_ok());
    assert_eq!(table.len(), 1);
}

#[test]
fn test_failed_login_leaves_sessions_untouched() {
    let mut store = CredentialStore::new();
    let mut table = SessionTable::new();
    let now = Timestamp::now();
    let token = login(&mut store, &mut table, "u1", "p1", true, now).unwrap();

    let again = login(&mut store, &mut table, "u1", "p1", true, now);
    let wrong = login(&mut store, &mut table, "u1", "nope", false, now);

    assert!(matches!(again, Err(SessionError::UsernameTaken(_))));
    assert_eq!(wrong, Err(SessionError::InvalidCredentials));
    assert!(table.get(&token).is_some());
}

#[test]
fn test_sweep_evicts_day_old_session_and_keeps_recent_one() {
    let mut store = CredentialStore::new();
    let mut table = SessionTable::new();
    let now = Timestamp::now();

    let day_old = now.saturating_sub(DAY + HOUR);
    let ten_hours_old = now.saturating_sub(10 * HOUR);
    let old = login(&mut store, &mut table, "u1", "p1", true, day_old).unwrap();
    let recent = login(&mut store, &mut table, "u2", "p2", true, ten_hours_old).unwrap();
    let before = table.get(&recent).cloned();

    let report = table.sweep(now, DAY);

    assert_eq!(report.removed_count(), 1);
    assert!(table.get(&old).is_none());
    let u1 = store.register_or_verify("u1", "p1", false).unwrap();
    assert!(table.token_for(&u1).is_none());
    assert_eq!(table.get(&recent).cloned(), before);

    // The evicted player can simply log in again.
    let fresh = login(&mut store, &mut table, "u1", "p1", false, now).unwrap();
    assert!(table.touch(&fresh, now).is_ok());
}
