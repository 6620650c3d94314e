use rand::Rng;

/// Generate a cryptographically random 32-byte hex token.
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

pub fn session_cookie(name: &str, token: &str, max_age_hours: u64) -> String {
    let max_age_secs = max_age_hours * 3600;
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        name, token, max_age_secs
    )
}

pub fn clear_session_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", name)
}

/// Whether a SQLite `datetime` expiry falls within `hours` from now.
/// Unparseable timestamps count as expiring.
pub fn expires_within(expires_at: &str, hours: i64) -> bool {
    match chrono::NaiveDateTime::parse_from_str(expires_at, "%Y-%m-%d %H:%M:%S") {
        Ok(at) => at.and_utc() - chrono::Utc::now() < chrono::Duration::hours(hours),
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_token_is_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn cookies_carry_lifetime() {
        assert_eq!(
            session_cookie("khateraty_session", "abc", 2),
            "khateraty_session=abc; HttpOnly; SameSite=Lax; Path=/; Max-Age=7200"
        );
        assert!(clear_session_cookie("khateraty_session").contains("Max-Age=0"));
    }

    #[test]
    fn expiry_window() {
        let soon = (chrono::Utc::now() + chrono::Duration::hours(2))
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        let later = (chrono::Utc::now() + chrono::Duration::hours(200))
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        assert!(expires_within(&soon, 24));
        assert!(!expires_within(&later, 24));
        assert!(expires_within("garbage", 24));
    }
}
