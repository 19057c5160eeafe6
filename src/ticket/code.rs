//! The opaque string carried inside a ticket's QR image.
//!
//! `EVENT-<event_id>-<user_id>`, both canonical 36-character UUIDs. The
//! code embeds both halves of the ticket's compound key so the gate can go
//! straight to a lookup, and it is fully determined by the pair so issuance
//! stays idempotent without a round trip.

use thiserror::Error;
use uuid::Uuid;

pub const CODE_PREFIX: &str = "EVENT-";

/// Canonical hyphenated UUID length; the fixed width is what lets decode
/// split the two tokens without a delimiter scan.
const TOKEN_LEN: usize = 36;

/// The (event, user) pair recovered from a scanned code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketKey {
    pub event_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("payload does not match the EVENT-<event>-<user> ticket code format")]
    MalformedPayload,
}

pub fn encode(event_id: Uuid, user_id: Uuid) -> String {
    format!("{CODE_PREFIX}{event_id}-{user_id}")
}

/// Parses a scanned payload back into its [`TicketKey`]. Surrounding
/// whitespace is tolerated; anything else that deviates from the format is
/// [`DecodeError::MalformedPayload`].
pub fn decode(raw: &str) -> Result<TicketKey, DecodeError> {
    let trimmed = raw.trim();
    let rest = trimmed
        .strip_prefix(CODE_PREFIX)
        .ok_or(DecodeError::MalformedPayload)?;

    if rest.len() != TOKEN_LEN * 2 + 1 || rest.as_bytes().get(TOKEN_LEN) != Some(&b'-') {
        return Err(DecodeError::MalformedPayload);
    }

    let event_token = rest.get(..TOKEN_LEN).ok_or(DecodeError::MalformedPayload)?;
    let user_token = rest
        .get(TOKEN_LEN + 1..)
        .ok_or(DecodeError::MalformedPayload)?;

    let event_id = Uuid::parse_str(event_token).map_err(|_| DecodeError::MalformedPayload)?;
    let user_id = Uuid::parse_str(user_token).map_err(|_| DecodeError::MalformedPayload)?;

    Ok(TicketKey { event_id, user_id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let event_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let code = encode(event_id, user_id);
        let key = decode(&code).expect("freshly encoded code should decode");

        assert_eq!(key.event_id, event_id);
        assert_eq!(key.user_id, user_id);
    }

    #[test]
    fn test_decode_tolerates_surrounding_whitespace() {
        let event_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let padded = format!("  {}\n", encode(event_id, user_id));
        let key = decode(&padded).unwrap();

        assert_eq!(key.event_id, event_id);
        assert_eq!(key.user_id, user_id);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(decode("garbage"), Err(DecodeError::MalformedPayload));
        assert_eq!(decode(""), Err(DecodeError::MalformedPayload));
        assert_eq!(
            decode("EVENT-short-short"),
            Err(DecodeError::MalformedPayload)
        );
    }

    #[test]
    fn test_decode_rejects_wrong_prefix() {
        let code = encode(Uuid::new_v4(), Uuid::new_v4());
        let wrong = code.replacen("EVENT-", "TICKET-", 1);
        assert_eq!(decode(&wrong), Err(DecodeError::MalformedPayload));
    }

    #[test]
    fn test_decode_rejects_trailing_junk() {
        let mut code = encode(Uuid::new_v4(), Uuid::new_v4());
        code.push_str("-extra");
        assert_eq!(decode(&code), Err(DecodeError::MalformedPayload));
    }

    #[test]
    fn test_decode_rejects_non_uuid_tokens_of_correct_width() {
        // Right shape, wrong characters.
        let fake = format!("EVENT-{}-{}", "z".repeat(36), "z".repeat(36));
        assert_eq!(decode(&fake), Err(DecodeError::MalformedPayload));
    }

    #[test]
    fn test_decode_rejects_multibyte_payload_without_panicking() {
        let multibyte = format!("EVENT-{}", "🎫".repeat(20));
        assert_eq!(decode(&multibyte), Err(DecodeError::MalformedPayload));
    }

    #[test]
    fn test_encode_is_deterministic() {
        let event_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        assert_eq!(encode(event_id, user_id), encode(event_id, user_id));
    }
}
