//! MD5-based content addressing for session identity (testable property 1).

use md5::{Digest, Md5};

pub fn session_id(first_user_message: &str) -> String {
    hex_digest(first_user_message.as_bytes())
}

pub fn conversation_hash(first_user: &str, first_assistant: &str) -> String {
    let mut buf = Vec::with_capacity(first_user.len() + first_assistant.len());
    buf.extend_from_slice(first_user.as_bytes());
    buf.extend_from_slice(first_assistant.as_bytes());
    hex_digest(&buf)
}

fn hex_digest(bytes: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_is_deterministic() {
        assert_eq!(session_id("hello"), session_id("hello"));
        assert_ne!(session_id("hello"), session_id("world"));
    }

    #[test]
    fn session_id_matches_known_md5() {
        // md5("hello") = 5d41402abc4b2a76b9719d911017c592
        assert_eq!(session_id("hello"), "5d41402abc4b2a76b9719d911017c592");
    }

    #[test]
    fn conversation_hash_order_matters() {
        assert_ne!(conversation_hash("a", "b"), conversation_hash("b", "a"));
    }
}
