use chrono::Utc;
use uuid::Uuid;

/// Generate a 24-hex document id: 4 bytes of big-endian unix seconds followed
/// by 8 random bytes. Ids created later sort after earlier ones at second
/// granularity.
pub fn new_object_id() -> String {
    let secs = Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;
    let random = Uuid::new_v4();

    let mut bytes = [0u8; 12];
    bytes[..4].copy_from_slice(&secs.to_be_bytes());
    bytes[4..].copy_from_slice(&random.as_bytes()[..8]);

    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
