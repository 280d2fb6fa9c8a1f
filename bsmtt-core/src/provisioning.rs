//! Identity provisioning state
//!
//! The identity client reports its state as a short flag string, one
//! character per facet. The transport may send once the client is connected
//! and holds a valid identity:
//!
//! ```text
//! index 0: 'f' → fatal
//! index 3: 'Y' → identity present
//! index 4: 'N' → no certificate request pending
//! ```

/// Whether a provisioning state string allows sending
///
/// Strings too short to carry the flags are treated as not ready.
pub fn is_identity_ready(state: &str) -> bool {
    let flags = state.as_bytes();
    if flags.len() < 5 {
        return false;
    }
    flags[3] == b'Y' && flags[4] == b'N' && flags[0] != b'f'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_state() {
        assert!(is_identity_ready("C*>YN"));
        assert!(is_identity_ready("i*>YN1"));
    }

    #[test]
    fn not_ready_states() {
        assert!(!is_identity_ready("f*>YN"));
        assert!(!is_identity_ready("C*>NN"));
        assert!(!is_identity_ready("C*>YY"));
        assert!(!is_identity_ready("C*>Y"));
        assert!(!is_identity_ready(""));
    }
}
