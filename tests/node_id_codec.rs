use meshwatch::meshtastic::{decode_id, encode_id, MeshError};

#[test]
fn round_trip_over_sampled_range() {
    // stride through the whole u32 space plus every value near the edges
    let strided = (0..=u32::MAX).step_by(65_521);
    let edges = (0u32..4096).chain(u32::MAX - 4096..=u32::MAX);
    for n in strided.chain(edges) {
        let id = encode_id(n);
        assert_eq!(decode_id(&id), Ok(n), "round trip failed for {n} ({id})");
    }
}

#[test]
fn encoding_is_bang_plus_lowercase_hex() {
    for n in [0u32, 9, 10, 0xabcdef, 0xDEAD_BEEF, u32::MAX] {
        let id = encode_id(n);
        let digits = id.strip_prefix('!').expect("leading bang");
        assert!(!digits.is_empty());
        assert!(!digits.starts_with("0x"));
        assert!(digits
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }
}

#[test]
fn decode_errors_carry_the_input() {
    assert_eq!(
        decode_id("!nothex"),
        Err(MeshError::MalformedIdentifier("!nothex".to_string()))
    );
}
