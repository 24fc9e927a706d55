//! Parsing of `meshtastic --info` dumps.

use meshwatch::meshtastic::{encode_id, parse_node_info, MeshError};

const PYTHON_CLI_DUMP: &str = r#"Connected to radio
Owner: Gateway Alpha (GWA)
My info: { "myNodeNum": 3125541328, "rebootCount": 12, "minAppVersion": 30200, "deviceId": "qdd1Q==" }
Metadata: { "firmwareVersion": "2.5.6.d55c08d", "deviceStateVersion": 23, "canShutdown": true, "hasWifi": true, "hasBluetooth": true, "positionFlags": 811, "hwModel": "HELTEC_V3", "hasPKC": true, "role": "ROUTER_CLIENT" }

Nodes in mesh: {
  "!ba4bf9d0": {
    "num": 3125541328,
    "user": {
      "id": "!ba4bf9d0",
      "longName": "Gateway Alpha",
      "shortName": "GWA",
      "macaddr": "48:ca:ba:4b:f9:d0",
      "hwModel": "HELTEC_V3",
      "publicKey": "ZmFrZWtleQ=="
    },
    "deviceMetrics": {
      "batteryLevel": 101,
      "voltage": 4.2,
      "channelUtilization": 3.5,
      "airUtilTx": 0.8,
      "uptimeSeconds": 86400
    },
    "isFavorite": true
  },
  "!1234abcd": {
    "num": 305441741,
    "user": {
      "id": "!1234abcd",
      "longName": "Hilltop Relay",
      "shortName": "HTR",
      "macaddr": "aa:bb:12:34:ab:cd",
      "hwModel": "RAK4631"
    },
    "position": {
      "latitudeI": 377749000,
      "longitudeI": -1224194000,
      "altitude": 120,
      "time": 1718000000,
      "locationSource": "LOC_INTERNAL",
      "latitude": 37.7749,
      "longitude": -122.4194
    },
    "snr": 6.25,
    "lastHeard": 1718000123,
    "hopsAway": 1
  }
}

Preferences: { "device": { "role": "ROUTER_CLIENT" },
 "lora": { "region": "US" } }

Channels:
  Index 0: PRIMARY psk=default { "psk": "AQ==" }

Primary channel URL: https://meshtastic.org/e/#CgMSAQESCAgBOAFAA0gB
"#;

fn minimal(line_ending: &str, trailing_blank: bool) -> String {
    let mut lines = vec![
        "Owner: Alice",
        "My info: {\"myNodeNum\":42}",
        "Nodes in mesh: [{\"num\":42,",
        "\"user\":{\"longName\":\"Alice Node\",\"shortName\":\"AL\"}},",
        "{\"num\":7,\"lastHeard\":1700000000}]",
    ];
    if trailing_blank {
        lines.push("");
    }
    lines.join(line_ending)
}

#[test]
fn parses_full_python_cli_dump() {
    let snap = parse_node_info(PYTHON_CLI_DUMP).unwrap();

    assert_eq!(snap.owner, "Gateway Alpha (GWA)");
    assert_eq!(snap.my_info.node_number, Some(3125541328));
    assert_eq!(snap.my_info.reboot_count, Some(12));
    assert_eq!(snap.my_info.min_app_version, Some(30200));
    assert_eq!(snap.metadata.firmware_version(), Some("2.5.6.d55c08d"));
    assert_eq!(snap.metadata.hw_model(), Some("HELTEC_V3"));
    assert_eq!(snap.metadata.role(), Some("ROUTER_CLIENT"));
    assert_eq!(
        snap.primary_channel_url,
        "https://meshtastic.org/e/#CgMSAQESCAgBOAFAA0gB"
    );
    assert_eq!(snap.own_id().as_deref(), Some("!ba4bf9d0"));

    assert_eq!(snap.nodes.len(), 2);
    let gateway = &snap.nodes["!ba4bf9d0"];
    assert!(gateway.is_favorite);
    assert_eq!(gateway.user.mac_address, "48:ca:ba:4b:f9:d0");
    assert_eq!(gateway.user.public_key.as_deref(), Some("ZmFrZWtleQ=="));
    assert_eq!(gateway.device_metrics.battery_level, 101);
    assert_eq!(gateway.device_metrics.uptime_seconds, 86400);
    assert_eq!(gateway.position.latitude_int, 0, "no fix means zeroed position");

    let relay = &snap.nodes["!1234abcd"];
    assert_eq!(relay.num, 305441741);
    assert_eq!(relay.user.hardware_model, "RAK4631");
    assert_eq!(relay.position.longitude_int, -1224194000);
    assert_eq!(relay.position.location_source, "LOC_INTERNAL");
    assert_eq!(relay.last_heard, 1718000123);
    assert_eq!(relay.hops_away, Some(1));
    assert_eq!(relay.label(), "Hilltop Relay");
}

#[test]
fn parses_array_form_keyed_by_encoded_num() {
    let snap = parse_node_info(&minimal("\n", true)).unwrap();
    assert_eq!(snap.owner, "Alice");
    assert_eq!(snap.my_info.node_number, Some(42));
    let keys: Vec<&str> = snap.nodes.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["!2a", "!7"]);
    assert_eq!(snap.nodes["!2a"].user.short_name, "AL");
    assert_eq!(snap.nodes["!7"].last_heard, 1700000000);
    for (id, entry) in &snap.nodes {
        assert_eq!(id, &encode_id(entry.num));
    }
}

#[test]
fn trailing_blank_line_is_optional() {
    let with_blank = parse_node_info(&minimal("\n", true)).unwrap();
    let without_blank = parse_node_info(&minimal("\n", false)).unwrap();
    assert_eq!(with_blank, without_blank);
}

#[test]
fn crlf_and_lf_give_identical_snapshots() {
    let lf = parse_node_info(PYTHON_CLI_DUMP).unwrap();
    let crlf = parse_node_info(&PYTHON_CLI_DUMP.replace('\n', "\r\n")).unwrap();
    assert_eq!(lf, crlf);
    assert_eq!(
        parse_node_info(&minimal("\r\n", false)).unwrap(),
        parse_node_info(&minimal("\n", false)).unwrap()
    );
}

#[test]
fn parsing_is_idempotent() {
    let first = parse_node_info(PYTHON_CLI_DUMP).unwrap();
    let second = parse_node_info(PYTHON_CLI_DUMP).unwrap();
    assert_eq!(first, second);
}

#[test]
fn single_line_node_list() {
    let snap = parse_node_info("Nodes in mesh: [{\"num\": 255}, {\"num\": 4096}]\n\n").unwrap();
    assert!(snap.nodes.contains_key("!ff"));
    assert!(snap.nodes.contains_key("!1000"));
    assert_eq!(snap.owner, "");
    assert_eq!(snap.my_info.node_number, None);
    assert_eq!(snap.own_id(), None);
}

#[test]
fn empty_or_unrelated_text_is_malformed() {
    for text in ["", "\n\n", "Connected to radio\nError: no device found\n"] {
        let err = parse_node_info(text).unwrap_err();
        assert!(
            matches!(err, MeshError::MalformedNodeInfo(_)),
            "expected MalformedNodeInfo for {text:?}, got {err:?}"
        );
    }
}

#[test]
fn truncated_node_list_is_malformed() {
    let text = "Owner: Alice\nNodes in mesh: {\n  \"!2a\": { \"num\": 42,\n";
    assert!(matches!(
        parse_node_info(text),
        Err(MeshError::MalformedNodeInfo(_))
    ));
}

const PADDED_KEYS_DUMP: &str = r#"Owner: Low Numbers (LN)
My info: { "myNodeNum": 42, "rebootCount": 3 }
Nodes in mesh: {
  "!0000002a": {
    "num": 42,
    "user": { "id": "!0000002a", "longName": "Low Numbers", "shortName": "LN" }
  },
  "!0A1B2C3D": {
    "num": 169552957,
    "user": { "id": "!0a1b2c3d", "longName": "Valley Repeater", "shortName": "VR" }
  },
  "!00000007": {
    "num": 7,
    "lastHeard": 1700000000
  }
}
"#;

#[test]
fn object_keys_are_canonical_encoded_nums() {
    let snap = parse_node_info(PADDED_KEYS_DUMP).unwrap();
    let keys: Vec<&str> = snap.nodes.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["!2a", "!7", "!a1b2c3d"]);
    assert_eq!(snap.own_id().as_deref(), Some("!2a"));
    assert_eq!(snap.nodes["!a1b2c3d"].label(), "Valley Repeater");

    for dump in [PADDED_KEYS_DUMP, PYTHON_CLI_DUMP] {
        let snap = parse_node_info(dump).unwrap();
        for (id, entry) in &snap.nodes {
            assert_eq!(id, &encode_id(entry.num));
        }
    }
}

#[test]
fn uppercase_array_id_is_lowercased() {
    let snap = parse_node_info("Nodes in mesh: [{\"id\": \"!2A\", \"num\": 42}, {\"num\": 7}]").unwrap();
    let keys: Vec<&str> = snap.nodes.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["!2a", "!7"]);
}

#[test]
fn undecodable_node_ids_are_malformed() {
    for text in [
        "Nodes in mesh: {\"gateway\": {\"num\": 42}}",
        "Nodes in mesh: {\"!123456789\": {\"num\": 42}}",
        "Nodes in mesh: [{\"id\": \"!zz\", \"num\": 42}]",
    ] {
        let err = parse_node_info(text).unwrap_err();
        assert!(
            matches!(err, MeshError::MalformedNodeInfo(_)),
            "expected MalformedNodeInfo for {text:?}, got {err:?}"
        );
    }
}

#[test]
fn mistyped_my_info_field_does_not_lose_node_number() {
    let snap = parse_node_info(
        "My info: {\"myNodeNum\": 42, \"minAppVersion\": \"2.5\", \"rebootCount\": null}\nNodes in mesh: [{\"num\": 42}]\n",
    )
    .unwrap();
    assert_eq!(snap.my_info.node_number, Some(42));
    assert_eq!(snap.my_info.min_app_version, None);
    assert_eq!(snap.my_info.reboot_count, None);
    assert_eq!(snap.own_id().as_deref(), Some("!2a"));
}
