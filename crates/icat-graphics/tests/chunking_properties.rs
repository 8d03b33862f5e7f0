use base64::{engine::general_purpose, Engine as _};
use icat_graphics::{ChunkedTransmitter, ControlData, Passthrough, CHUNK_SIZE};
use proptest::prelude::*;

/// Split one serialized command into (control, payload)
fn split_command(chunk: &[u8]) -> (String, Vec<u8>) {
    let body = chunk
        .strip_prefix(b"\x1b_G")
        .and_then(|b| b.strip_suffix(b"\x1b\\"))
        .expect("command framing");
    match body.iter().position(|b| *b == b';') {
        Some(at) => (
            String::from_utf8(body[..at].to_vec()).unwrap(),
            body[at + 1..].to_vec(),
        ),
        None => (String::from_utf8(body.to_vec()).unwrap(), Vec::new()),
    }
}

proptest! {
    #[test]
    fn payload_segments_reassemble(data in proptest::collection::vec(any::<u8>(), 1..20_000)) {
        let control = ControlData::new().with('a', "T").with('i', 42u32);
        let wire = ChunkedTransmitter::new(Passthrough::Never).encode(&control, &data);

        let mut payload = Vec::new();
        let mut final_flags = 0;
        for (i, chunk) in wire.iter().enumerate() {
            let (keys, segment) = split_command(chunk);
            prop_assert!(segment.len() <= CHUNK_SIZE);
            if i == 0 {
                prop_assert!(keys.starts_with("a=T,i=42,m="));
            } else {
                prop_assert!(keys == "m=0" || keys == "m=1", "unexpected keys {}", keys);
            }
            if keys.ends_with("m=0") {
                final_flags += 1;
                prop_assert_eq!(i, wire.len() - 1);
            }
            payload.extend_from_slice(&segment);
        }

        prop_assert_eq!(final_flags, 1);
        prop_assert_eq!(payload, general_purpose::STANDARD.encode(&data).into_bytes());
    }

    #[test]
    fn tmux_wrapping_preserves_payload(data in proptest::collection::vec(any::<u8>(), 1..6_000)) {
        let control = ControlData::new().with('a', "T");
        let plain = ChunkedTransmitter::new(Passthrough::Never).encode(&control, &data);
        let wrapped = ChunkedTransmitter::new(Passthrough::Tmux).encode(&control, &data);
        prop_assert_eq!(plain.len(), wrapped.len());

        for (p, w) in plain.iter().zip(wrapped.iter()) {
            let inner = w
                .strip_prefix(b"\x1bPtmux;")
                .and_then(|b| b.strip_suffix(b"\x1b\\"))
                .expect("tmux envelope");
            let undoubled: Vec<u8> = String::from_utf8(inner.to_vec())
                .unwrap()
                .replace("\x1b\x1b", "\x1b")
                .into_bytes();
            prop_assert_eq!(&undoubled[..], &p[..]);
        }
    }
}
