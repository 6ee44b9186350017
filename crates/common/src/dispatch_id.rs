//! Dispatch id minting.
//!
//! Every fan-out round gets a fresh id that threads through the audit
//! record, broker headers, and the outbound webhook envelope as
//! `dispatchId`. In-app notification rows reuse the same generator for
//! their primary keys.

use uuid::Uuid;

pub fn mint() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_id_is_uuid_v4() {
        let id = mint();
        let parsed = Uuid::parse_str(&id).expect("uuid");
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn rounds_never_share_an_id() {
        assert_ne!(mint(), mint());
    }
}
