use chrono::{DateTime, Utc};
use rand::Rng;
use regex::Regex;
use std::sync::OnceLock;

/// Prefixes of the human-readable reference codes.
pub const SESSION_PREFIX: &str = "SHOP";
pub const TRANSACTION_PREFIX: &str = "TXN";
pub const RECEIPT_PREFIX: &str = "RCP";
pub const ALERT_PREFIX: &str = "ALERT";

/// `PREFIX-YYYYMMDD-XXXXXXXX` with eight uppercase hex characters.
pub fn generate_reference_code(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{}-{}-{}", prefix, at.format("%Y%m%d"), random_hex(8))
}

/// Mock payment provider reference, e.g. `MPESA-1A2B3C4D5E`.
pub fn generate_provider_reference(provider: &str) -> String {
    format!("{}-{}", provider, random_hex(10))
}

/// URL slug from a display name: `"Dairy & Eggs"` becomes `dairy-eggs`.
pub fn slugify(name: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    let re = NON_ALNUM.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static regex"));
    re.replace_all(&name.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

fn random_hex(len: usize) -> String {
    const HEX: &[u8] = b"0123456789ABCDEF";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| HEX[rng.gen_range(0..HEX.len())] as char)
        .collect()
}
