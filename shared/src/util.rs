use chrono::NaiveDate;
use rand::Rng;
use rand::distributions::Alphanumeric;

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Today's calendar date (UTC)
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

/// Generate a human-readable donation receipt number.
///
/// Format: `RCP-YYYYMMDD-XXXXXX` where the suffix is six upper-case
/// alphanumerics (36^6 ≈ 2.2 billion values per day). The `receipt_number`
/// UNIQUE constraint is the final guard.
pub fn receipt_number(date: NaiveDate) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect();
    format!("RCP-{}-{}", date.format("%Y%m%d"), suffix)
}
