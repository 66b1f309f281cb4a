// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Decode failures and reader poisoning.
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

mod common;

use std::io::{self, Read};

use common::{nested, portable_values, q, sample_tree, NS};
use nodestream::{
    read_tree, write_tree, CodecConfig, EncodingError, InvalidStream, NodeDataInput,
    NodeDataOutput, StreamError, StreamVersion, Table,
};
use nodestream_model::{InstancePath, NodeWithValue, NormalizedNode, PathArgument, Value};

fn invalid(result: Result<NormalizedNode, StreamError>) -> InvalidStream {
    match result {
        Err(StreamError::Invalid(cause)) => cause,
        other => panic!("expected a structural error, got {other:?}"),
    }
}

fn magnesium(payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0xAB, 0x00, 0x04];
    bytes.extend_from_slice(payload);
    bytes
}

fn qname_definition(local: &str) -> Vec<u8> {
    let mut bytes = vec![0x0C, 0x08];
    bytes.extend_from_slice(NS.as_bytes());
    bytes.push(0x0B);
    bytes.push(0x0C);
    bytes.push(u8::try_from(local.len()).expect("short name"));
    bytes.extend_from_slice(local.as_bytes());
    bytes
}

#[test]
fn first_structural_error_poisons_the_reader() {
    let bytes = magnesium(&[0x11, 0x05]);
    let mut input = NodeDataInput::new(bytes.as_slice());
    let expected = InvalidStream::DanglingReference {
        table: Table::QName,
        code: 5,
    };
    assert_eq!(invalid(input.read_node()), expected);
    assert!(input.is_poisoned());
    assert_eq!(invalid(input.read_node()), expected);
    assert!(matches!(
        input.read_qname(),
        Err(StreamError::Invalid(cause)) if cause == expected
    ));
    assert!(matches!(
        input.version(),
        Err(StreamError::Invalid(cause)) if cause == expected
    ));
}

#[test]
fn bad_signature_and_unknown_version() {
    assert_eq!(
        invalid(read_tree(&[0x00, 0x00, 0x04, 0x01][..])),
        InvalidStream::BadSignature(0x00)
    );
    assert_eq!(
        invalid(read_tree(&[0xAB, 0x00, 0x05][..])),
        InvalidStream::UnknownVersion(5)
    );
    assert_eq!(invalid(read_tree(&[0xAB][..])), InvalidStream::Truncated);
}

#[test]
fn every_truncated_prefix_is_reported() {
    let tree = sample_tree(&portable_values());
    for version in StreamVersion::ALL {
        let mut bytes = Vec::new();
        write_tree(&mut bytes, version, &tree).expect("encode");
        for len in 0..bytes.len() {
            assert_eq!(
                invalid(read_tree(&bytes[..len])),
                InvalidStream::Truncated,
                "{version} prefix {len}"
            );
        }
    }
}

#[test]
fn reader_enforces_depth_limit() {
    let tree = nested(10);
    for version in StreamVersion::ALL {
        let mut bytes = Vec::new();
        write_tree(&mut bytes, version, &tree).expect("encode");
        let config = CodecConfig::default().with_max_depth(5);
        let mut input = NodeDataInput::with_config(bytes.as_slice(), config);
        assert_eq!(
            invalid(input.read_node()),
            InvalidStream::DepthExceeded(5),
            "{version}"
        );
    }
}

fn assert_aborted(input: &mut NodeDataInput<impl Read>) {
    assert!(input.is_poisoned());
    assert!(matches!(
        input.read_node(),
        Err(StreamError::Invalid(InvalidStream::Aborted(_)))
    ));
}

#[test]
fn modeled_anyxml_is_unsupported_and_ends_the_stream() {
    for bytes in [vec![0xAB, 0x00, 0x01, 0x0F], magnesium(&[0x0E])] {
        let mut input = NodeDataInput::new(bytes.as_slice());
        assert!(matches!(
            input.read_node(),
            Err(StreamError::Unsupported { .. })
        ));
        assert_aborted(&mut input);
    }
}

#[test]
fn unknown_node_tags_are_rejected() {
    assert_eq!(
        invalid(read_tree(&[0xAB, 0x00, 0x01, 0x63][..])),
        InvalidStream::UnexpectedNode(0x63)
    );
    assert_eq!(
        invalid(read_tree(magnesium(&[0x0F]).as_slice())),
        InvalidStream::UnexpectedNode(0x0F)
    );
    // predicate bits on a container
    assert_eq!(
        invalid(read_tree(magnesium(&[0x42]).as_slice())),
        InvalidStream::UnexpectedNode(0x42)
    );
}

#[test]
fn key_leaf_outside_an_entry_is_missing() {
    let mut payload = vec![0x02];
    payload.extend(qname_definition("root"));
    payload.extend([0x41, 0x35, 0x00, 0x0C, 0x01, b'x']);
    let cause = invalid(read_tree(magnesium(&payload).as_slice()));
    assert!(
        matches!(&cause, InvalidStream::MissingKeyLeaf { leaf, .. } if *leaf == q("x").to_string()),
        "{cause:?}"
    );
}

#[test]
fn parent_reference_needs_an_inheriting_parent() {
    assert_eq!(
        invalid(read_tree(magnesium(&[0x32]).as_slice())),
        InvalidStream::InvalidParentReference(0x32)
    );
    // A leaf never inherits, even below a named parent.
    let mut payload = vec![0x02];
    payload.extend(qname_definition("root"));
    payload.push(0x31);
    assert_eq!(
        invalid(read_tree(magnesium(&payload).as_slice())),
        InvalidStream::InvalidParentReference(0x31)
    );
}

/// Serves `bytes`, failing once when the read position reaches `fail_at`.
struct FlakyReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    fail_at: usize,
    failed: bool,
}

impl<'a> FlakyReader<'a> {
    fn new(bytes: &'a [u8], fail_at: usize) -> Self {
        Self {
            bytes,
            pos: 0,
            fail_at,
            failed: false,
        }
    }
}

impl Read for FlakyReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.failed && self.pos == self.fail_at {
            self.failed = true;
            return Err(io::Error::other("link down"));
        }
        let end = if self.failed { self.bytes.len() } else { self.fail_at };
        let n = (end - self.pos).min(buf.len());
        buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

#[test]
fn io_failure_at_any_offset_ends_the_stream() {
    // The string bytes also parse as record headers, so a resumed read would misparse.
    let tree = NormalizedNode::container(
        q("root"),
        vec![NormalizedNode::leaf(q("x"), "\u{11}\u{0}\u{19}")],
    );
    for version in StreamVersion::ALL {
        let mut bytes = Vec::new();
        write_tree(&mut bytes, version, &tree).expect("encode");
        for fail_at in 0..bytes.len() {
            let mut input = NodeDataInput::new(FlakyReader::new(&bytes, fail_at));
            assert!(
                matches!(input.read_node(), Err(StreamError::Io(_))),
                "{version} at {fail_at}"
            );
            assert_aborted(&mut input);
            assert!(input.read_qname().is_err(), "{version} at {fail_at}");
        }
    }
}

#[test]
fn untouched_source_reads_normally() {
    let tree = nested(2);
    let mut bytes = Vec::new();
    write_tree(&mut bytes, StreamVersion::Magnesium, &tree).expect("encode");
    let mut input = NodeDataInput::new(FlakyReader::new(&bytes, bytes.len()));
    assert_eq!(input.read_node().expect("decode"), tree);
    assert!(!input.is_poisoned());
}

/// Lithium leaf `x` whose value is an instance path `levels` deep.
fn lithium_nested_path_value(levels: usize) -> Vec<u8> {
    let mut bytes = vec![0xAB, 0x00, 0x01, 0x01];
    // local name, namespace, no revision; defines string codes 0 and 1
    bytes.extend([0x02, 0x00, 0x01, b'x', 0x02, 0x00, 0x08]);
    bytes.extend_from_slice(NS.as_bytes());
    bytes.push(0x03);
    for _ in 0..levels {
        // instance path of one WITH_VALUE argument named by string codes
        bytes.extend([0x08, 0x00, 0x00, 0x00, 0x01, 0x03]);
        bytes.extend([0x01, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x03]);
    }
    bytes
}

/// Magnesium leaf `x` whose value is an instance path `levels` deep.
fn magnesium_nested_path_value(levels: usize) -> Vec<u8> {
    let mut payload = vec![0x01];
    payload.extend(qname_definition("x"));
    for _ in 0..levels {
        // one-argument path; WITH_VALUE naming QName code 0
        payload.extend([0x61, 0x0B, 0x00]);
    }
    magnesium(&payload)
}

#[test]
fn deeply_nested_values_hit_the_depth_limit() {
    let config = CodecConfig::default().with_max_depth(16);
    for bytes in [
        lithium_nested_path_value(100_000),
        magnesium_nested_path_value(200_000),
    ] {
        let mut input = NodeDataInput::with_config(bytes.as_slice(), config);
        assert_eq!(invalid(input.read_node()), InvalidStream::DepthExceeded(16));
        assert!(input.is_poisoned());
    }
}

#[test]
fn nested_values_within_the_limit_decode() {
    let config = CodecConfig::default().with_max_depth(16);
    let expected = NormalizedNode::leaf(q("x"), nested_value(3));
    // innermost value: empty
    let mut lithium = lithium_nested_path_value(3);
    lithium.push(0x0F);
    let mut magnesium = magnesium_nested_path_value(3);
    magnesium.push(0x02);
    for bytes in [lithium, magnesium] {
        let mut input = NodeDataInput::with_config(bytes.as_slice(), config);
        assert_eq!(input.read_node().expect("decode"), expected);
    }
}

fn nested_value(levels: usize) -> Value {
    let mut value = Value::Empty;
    for _ in 0..levels {
        value = Value::InstanceIdentifier(InstancePath(vec![PathArgument::WithValue(
            NodeWithValue {
                node_type: q("x"),
                value,
            },
        )]));
    }
    value
}

#[test]
fn writer_enforces_the_limit_on_nested_values() {
    let config = CodecConfig::default().with_max_depth(16);
    for version in StreamVersion::ALL {
        let mut out = NodeDataOutput::with_config(Vec::new(), config.with_version(version));
        assert!(
            matches!(
                out.write_node(&NormalizedNode::leaf(q("x"), nested_value(40))),
                Err(StreamError::Encoding(EncodingError::DepthExceeded(16)))
            ),
            "{version}"
        );

        let shallow = NormalizedNode::leaf(q("x"), nested_value(8));
        let mut out = NodeDataOutput::with_config(Vec::new(), config.with_version(version));
        out.write_node(&shallow).expect("encode");
        let bytes = out.into_inner();
        let mut input = NodeDataInput::with_config(bytes.as_slice(), config);
        assert_eq!(input.read_node().expect("decode"), shallow, "{version}");
    }
}
