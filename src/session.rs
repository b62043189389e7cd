use std::fmt;

use chrono::Utc;
use uuid::Uuid;

/// Opaque correlation token sent with every webhook request.
///
/// Generated once per application instance and passed explicitly to the
/// webhook client; it never changes for the lifetime of the instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Build a fresh identifier of the form `session_<unix-millis>_<9 base-36 chars>`.
    pub fn generate() -> Self {
        let millis = Utc::now().timestamp_millis();
        Self(format!("session_{}_{}", millis, base36_suffix(Uuid::new_v4().as_u128())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;

/// Nine lowercase base-36 digits taken from the low (fully random) bits of a v4 uuid
fn base36_suffix(mut bits: u128) -> String {
    let mut suffix = String::with_capacity(SUFFIX_LEN);
    for _ in 0..SUFFIX_LEN {
        suffix.push(BASE36[(bits % 36) as usize] as char);
        bits /= 36;
    }
    suffix
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
