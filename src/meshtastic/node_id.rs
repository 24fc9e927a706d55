//! Conversion between 32-bit node numbers and their `!hex` string form.
//!
//! The Meshtastic tooling addresses nodes as `!` followed by the lowercase
//! hexadecimal node number with no zero padding, e.g. `42` becomes `!2a`.

use super::errors::MeshError;

/// Render a node number in its canonical `!hex` form.
pub fn encode_id(node_number: u32) -> String {
    format!("!{:x}", node_number)
}

/// Parse a `!hex` node id back into its node number.
///
/// The leading `!` is optional and case is ignored. Anything that is not
/// one to eight hex digits after the prefix is rejected.
pub fn decode_id(id: &str) -> Result<u32, MeshError> {
    let digits = id.strip_prefix('!').unwrap_or(id).to_ascii_lowercase();
    // from_str_radix tolerates a leading '+', which is not a node id
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(MeshError::MalformedIdentifier(id.to_string()));
    }
    u32::from_str_radix(&digits, 16).map_err(|_| MeshError::MalformedIdentifier(id.to_string()))
}
