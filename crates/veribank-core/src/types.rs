use chrono::Utc;

use crate::constants::RESERVED_USERNAMES;

/// Current time as an RFC 3339 / ISO-8601 timestamp string.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

/// Low-information rendering of a subject for publicly visible block
/// metadata: the first three characters followed by `***`. Never the full
/// subject.
pub fn mask_account(subject: &str) -> String {
    let prefix: String = subject.chars().take(3).collect();
    format!("{prefix}***")
}

/// Whether `user_id` collides with a reserved name (case-insensitive).
pub fn is_reserved(user_id: &str) -> bool {
    let upper = user_id.to_uppercase();
    RESERVED_USERNAMES.contains(&upper.as_str())
}
