// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use std::collections::BTreeSet;
use std::io::Read;
use std::sync::Arc;

use nodestream_model::{
    AugmentationIdentifier, InstancePath, NodeIdentifier, NodeIdentifierWithPredicates,
    NodeWithValue, PathArgument, QName, QNameModule, Value,
};
use tracing::trace;

use super::tokens::{node, path, value, Width};
use crate::codec::{DecodeContext, StreamDecoder};
use crate::error::{InvalidStream, Result, StreamError};
use crate::io::DataInput;
use crate::stream::NodeStreamWriter;
use crate::StreamVersion;

pub(crate) struct MagnesiumDecoder<'a, R> {
    input: &'a mut DataInput<R>,
    ctx: &'a mut DecodeContext,
}

impl<'a, R: Read> MagnesiumDecoder<'a, R> {
    pub(crate) fn new(input: &'a mut DataInput<R>, ctx: &'a mut DecodeContext) -> Self {
        Self { input, ctx }
    }

    fn stream_header(
        &mut self,
        w: &mut dyn NodeStreamWriter,
        header: u8,
        parent: Option<&PathArgument>,
        depth: usize,
    ) -> Result<()> {
        self.ctx.check_depth(depth)?;
        let kind = header & node::TYPE_MASK;
        let predicates = header & node::PREDICATE_MASK;
        let key_leaf = kind == node::LEAF && predicates == node::PREDICATE_ONE;
        if predicates != node::PREDICATE_ZERO && kind != node::MAP_ENTRY && !key_leaf {
            return Err(InvalidStream::UnexpectedNode(header).into());
        }
        match kind {
            node::LEAF => {
                let id = NodeIdentifier::new(self.read_node_name(header, parent)?);
                let v = if key_leaf {
                    key_leaf_value(&id, parent)?
                } else {
                    self.read_value(0)?
                };
                trace!(name = %id.qname(), kind = v.type_name(), key_leaf, "leaf");
                w.leaf_node(&id, &v)
            }
            node::LEAFSET_ENTRY => {
                let name = self.read_node_name(header, parent)?;
                let v = self.read_value(0)?;
                w.leaf_set_entry_node(&name, &v)
            }
            node::ANYXML => {
                let id = NodeIdentifier::new(self.read_node_name(header, parent)?);
                let token = self.input.read_u8()?;
                let body = match token {
                    value::STRING_EMPTY => String::new(),
                    value::STRING_1B | value::STRING_2B | value::STRING_4B => {
                        self.read_string_literal(token)?
                    }
                    other => return Err(InvalidStream::UnexpectedValue(other).into()),
                };
                w.anyxml_node(&id, &body)
            }
            node::CONTAINER => {
                let id = NodeIdentifier::new(self.read_node_name(header, parent)?);
                w.start_container_node(&id, None)?;
                self.stream_children(w, &PathArgument::NodeIdentifier(id), depth)
            }
            node::CHOICE => {
                let id = NodeIdentifier::new(self.read_node_name(header, parent)?);
                w.start_choice_node(&id, None)?;
                self.stream_children(w, &PathArgument::NodeIdentifier(id), depth)
            }
            node::LIST => {
                let id = NodeIdentifier::new(self.read_node_name(header, parent)?);
                w.start_unkeyed_list(&id, None)?;
                self.stream_children(w, &PathArgument::NodeIdentifier(id), depth)
            }
            node::LIST_ENTRY => {
                let id = NodeIdentifier::new(self.read_node_name(header, parent)?);
                w.start_unkeyed_list_item(&id, None)?;
                self.stream_children(w, &PathArgument::NodeIdentifier(id), depth)
            }
            node::MAP => {
                let id = NodeIdentifier::new(self.read_node_name(header, parent)?);
                w.start_map_node(&id, None)?;
                self.stream_children(w, &PathArgument::NodeIdentifier(id), depth)
            }
            node::MAP_ORDERED => {
                let id = NodeIdentifier::new(self.read_node_name(header, parent)?);
                w.start_ordered_map_node(&id, None)?;
                self.stream_children(w, &PathArgument::NodeIdentifier(id), depth)
            }
            node::LEAFSET => {
                let id = NodeIdentifier::new(self.read_node_name(header, parent)?);
                w.start_leaf_set(&id, None)?;
                self.stream_children(w, &PathArgument::NodeIdentifier(id), depth)
            }
            node::LEAFSET_ORDERED => {
                let id = NodeIdentifier::new(self.read_node_name(header, parent)?);
                w.start_ordered_leaf_set(&id, None)?;
                self.stream_children(w, &PathArgument::NodeIdentifier(id), depth)
            }
            node::MAP_ENTRY => {
                let name = self.read_node_name(header, parent)?;
                let size = match predicates {
                    node::PREDICATE_ZERO => 0,
                    node::PREDICATE_ONE => 1,
                    node::PREDICATE_1B => usize::from(self.input.read_u8()?),
                    _ => self.input.read_count("predicate")?,
                };
                let id = self.read_predicates(name, size, 0)?;
                trace!(name = %id.node_type(), keys = id.len(), "map entry");
                w.start_map_entry_node(&id, None)?;
                self.stream_children(w, &PathArgument::WithPredicates(id), depth)
            }
            node::AUGMENTATION => {
                let id = self.read_augmentation(header)?;
                w.start_augmentation_node(&id)?;
                self.stream_children(w, &PathArgument::Augmentation(id), depth)
            }
            node::ANYXML_MODELED => Err(StreamError::Unsupported {
                version: StreamVersion::Magnesium,
                operation: "YANG-modeled anyxml node",
            }),
            _ => Err(InvalidStream::UnexpectedNode(header).into()),
        }
    }

    fn stream_children(
        &mut self,
        w: &mut dyn NodeStreamWriter,
        parent: &PathArgument,
        depth: usize,
    ) -> Result<()> {
        loop {
            let header = self.input.read_u8()?;
            if header == node::END {
                return w.end_node();
            }
            self.stream_header(w, header, Some(parent), depth + 1)?;
        }
    }

    fn read_node_name(&mut self, header: u8, parent: Option<&PathArgument>) -> Result<QName> {
        match header & node::ADDR_MASK {
            node::ADDR_DEFINE => self.read_qname_definition(),
            node::ADDR_LOOKUP_1B => {
                let code = i64::from(self.input.read_u8()?);
                Ok(self.ctx.dictionary.qnames.resolve(code)?.clone())
            }
            node::ADDR_LOOKUP_4B => {
                let code = i64::from(self.input.read_u32()?);
                Ok(self.ctx.dictionary.qnames.resolve(code)?.clone())
            }
            _ => {
                let inheritable = matches!(
                    header & node::TYPE_MASK,
                    node::LIST_ENTRY | node::MAP_ENTRY | node::LEAFSET_ENTRY
                );
                parent
                    .and_then(PathArgument::node_type)
                    .filter(|_| inheritable)
                    .cloned()
                    .ok_or_else(|| InvalidStream::InvalidParentReference(header).into())
            }
        }
    }

    fn read_augmentation(&mut self, header: u8) -> Result<AugmentationIdentifier> {
        match header & node::ADDR_MASK {
            node::ADDR_DEFINE => {
                let count = self.input.read_count("augmentation child")?;
                let id = self.read_qname_set(count)?;
                self.ctx.dictionary.augmentations.push(id.clone());
                Ok(id)
            }
            node::ADDR_LOOKUP_1B => {
                let code = i64::from(self.input.read_u8()?);
                Ok(self.ctx.dictionary.augmentations.resolve(code)?.clone())
            }
            node::ADDR_LOOKUP_4B => {
                let code = i64::from(self.input.read_u32()?);
                Ok(self.ctx.dictionary.augmentations.resolve(code)?.clone())
            }
            _ => Err(InvalidStream::InvalidParentReference(header).into()),
        }
    }

    fn read_qname_set(&mut self, count: usize) -> Result<AugmentationIdentifier> {
        let mut names = BTreeSet::new();
        for _ in 0..count {
            names.insert(self.read_qname()?);
        }
        Ok(AugmentationIdentifier::new(names))
    }

    fn read_predicates(
        &mut self,
        name: QName,
        size: usize,
        depth: usize,
    ) -> Result<NodeIdentifierWithPredicates> {
        let mut id = NodeIdentifierWithPredicates::new(name);
        for _ in 0..size {
            let key = self.read_qname()?;
            let v = self.read_value(depth)?;
            id = id.with_key(key, v);
        }
        Ok(id)
    }

    fn read_ref(&mut self, token: u8, tokens: [u8; 3]) -> Result<i64> {
        Ok(if token == tokens[0] {
            i64::from(self.input.read_u8()?)
        } else if token == tokens[1] {
            i64::from(self.input.read_u16()?) + 256
        } else {
            i64::from(self.input.read_u32()?)
        })
    }

    fn read_string_literal(&mut self, token: u8) -> Result<String> {
        let len = match token {
            value::STRING_1B => usize::from(self.input.read_u8()?),
            value::STRING_2B => usize::from(self.input.read_u16()?),
            _ => self.input.read_count("string byte")?,
        };
        self.input.read_utf8(len)
    }

    fn read_encoded_string(&mut self, token: u8) -> Result<Arc<str>> {
        match token {
            value::STRING_EMPTY => Ok(self.ctx.interner.string(String::new())),
            value::STRING_REF_1B | value::STRING_REF_2B | value::STRING_REF_4B => {
                let code = self.read_ref(
                    token,
                    [value::STRING_REF_1B, value::STRING_REF_2B, value::STRING_REF_4B],
                )?;
                Ok(Arc::clone(self.ctx.dictionary.strings.resolve(code)?))
            }
            value::STRING_1B | value::STRING_2B | value::STRING_4B => {
                let text = self.read_string_literal(token)?;
                let shared = self.ctx.interner.string(text);
                self.ctx.dictionary.strings.push(Arc::clone(&shared));
                Ok(shared)
            }
            other => Err(InvalidStream::UnexpectedString(other).into()),
        }
    }

    fn read_module(&mut self) -> Result<QNameModule> {
        let token = self.input.read_u8()?;
        if matches!(token, value::MODREF_1B | value::MODREF_2B | value::MODREF_4B) {
            let code = self.read_ref(token, [value::MODREF_1B, value::MODREF_2B, value::MODREF_4B])?;
            return Ok(self.ctx.dictionary.modules.resolve(code)?.clone());
        }
        let namespace = self.read_encoded_string(token)?;
        let token = self.input.read_u8()?;
        let revision = Some(self.read_encoded_string(token)?).filter(|rev| !rev.is_empty());
        let module = self.ctx.interner.module(namespace, revision)?;
        self.ctx.dictionary.modules.push(module.clone());
        Ok(module)
    }

    fn read_qname_definition(&mut self) -> Result<QName> {
        let module = self.read_module()?;
        let token = self.input.read_u8()?;
        let local_name = self.read_encoded_string(token)?;
        let qname = self.ctx.interner.qname(module, local_name)?;
        self.ctx.dictionary.qnames.push(qname.clone());
        Ok(qname)
    }

    fn read_qname_token(&mut self, token: u8) -> Result<QName> {
        match token {
            value::QNAME => self.read_qname_definition(),
            value::QNAME_REF_1B | value::QNAME_REF_2B | value::QNAME_REF_4B => {
                let code = self.read_ref(
                    token,
                    [value::QNAME_REF_1B, value::QNAME_REF_2B, value::QNAME_REF_4B],
                )?;
                Ok(self.ctx.dictionary.qnames.resolve(code)?.clone())
            }
            other => Err(InvalidStream::UnexpectedName(other).into()),
        }
    }

    fn read_path_qname(&mut self, header: u8) -> Result<QName> {
        let code = match header & path::QNAME_MASK {
            path::QNAME_DEF => return self.read_qname_definition(),
            path::QNAME_REF_1B => i64::from(self.input.read_u8()?),
            path::QNAME_REF_2B => i64::from(self.input.read_u16()?) + 256,
            _ => i64::from(self.input.read_u32()?),
        };
        Ok(self.ctx.dictionary.qnames.resolve(code)?.clone())
    }

    /// Count carried in a header field: inline, or in 1, 2 or 4 trailing bytes.
    fn read_sized(&mut self, what: &'static str, field: u8, inline: usize) -> Result<usize> {
        let field_len = usize::from(field);
        if field_len < inline {
            return Ok(field_len);
        }
        match field_len - inline {
            0 => Ok(Width::byte_value(self.input.read_u8()?, inline)),
            1 => Ok(Width::short_value(self.input.read_u16()?, inline)),
            _ => self.input.read_count(what),
        }
    }

    fn read_binary(&mut self, token: u8) -> Result<Vec<u8>> {
        let len = match token {
            value::BINARY_1B => Width::byte_value(self.input.read_u8()?, value::BINARY_INLINE),
            value::BINARY_2B => Width::short_value(self.input.read_u16()?, value::BINARY_INLINE),
            value::BINARY_4B => self.input.read_count("binary byte")?,
            _ => usize::from(token - value::BINARY_0),
        };
        self.input.read_vec(len)
    }

    fn read_bits(&mut self, token: u8) -> Result<Value> {
        let count = self.read_sized("bit", token - value::BITS_0, value::BITS_INLINE)?;
        let mut bits = BTreeSet::new();
        for _ in 0..count {
            let token = self.input.read_u8()?;
            bits.insert(self.read_encoded_string(token)?.to_string());
        }
        Ok(Value::Bits(bits))
    }

    fn read_path_body(&mut self, count: usize, depth: usize) -> Result<InstancePath> {
        self.ctx.check_depth(depth)?;
        let mut args = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            args.push(self.read_nested_argument(depth)?);
        }
        Ok(InstancePath(args))
    }

    fn read_nested_argument(&mut self, depth: usize) -> Result<PathArgument> {
        let header = self.input.read_u8()?;
        let size_field = header >> path::SIZE_SHIFT;
        match header & path::TYPE_MASK {
            path::AUGMENTATION => {
                let count = self.read_sized(
                    "augmentation child",
                    header >> path::AID_COUNT_SHIFT,
                    path::AID_COUNT_INLINE,
                )?;
                Ok(PathArgument::Augmentation(self.read_qname_set(count)?))
            }
            path::WITH_PREDICATES => {
                let name = self.read_path_qname(header)?;
                let size = self.read_sized("predicate", size_field, path::SIZE_INLINE)?;
                Ok(PathArgument::WithPredicates(self.read_predicates(name, size, depth + 1)?))
            }
            _ if size_field != 0 => Err(InvalidStream::UnexpectedPathArgument(header).into()),
            path::NODE_IDENTIFIER => Ok(PathArgument::NodeIdentifier(NodeIdentifier::new(
                self.read_path_qname(header)?,
            ))),
            path::WITH_VALUE => {
                let node_type = self.read_path_qname(header)?;
                let value = self.read_value(depth + 1)?;
                Ok(PathArgument::WithValue(NodeWithValue { node_type, value }))
            }
            path::MOUNTPOINT => Ok(PathArgument::MountPoint(self.read_path_qname(header)?)),
            _ => Err(InvalidStream::UnexpectedPathArgument(header).into()),
        }
    }

    /// `depth` counts instance paths enclosing this value.
    fn read_value(&mut self, depth: usize) -> Result<Value> {
        let token = self.input.read_u8()?;
        Ok(match token {
            value::BOOLEAN_FALSE => Value::Bool(false),
            value::BOOLEAN_TRUE => Value::Bool(true),
            value::EMPTY => Value::Empty,
            value::INT8 => Value::Int8(self.input.read_i8()?),
            value::INT16 => Value::Int16(self.input.read_i16()?),
            value::INT32 => Value::Int32(self.input.read_i32()?),
            value::INT64 => Value::Int64(self.input.read_i64()?),
            value::UINT8 => Value::Uint8(self.input.read_u8()?),
            value::UINT16 => Value::Uint16(self.input.read_u16()?),
            value::UINT32 => Value::Uint32(self.input.read_u32()?),
            value::UINT64 => Value::Uint64(self.input.read_u64()?),
            value::STRING_EMPTY => Value::String(String::new()),
            value::STRING_1B | value::STRING_2B | value::STRING_4B => {
                Value::String(self.read_string_literal(token)?)
            }
            value::BIGINTEGER => {
                let text = self.input.read_utf()?;
                Value::BigInteger(
                    text.parse()
                        .map_err(|_| InvalidStream::InvalidNumber(text.clone()))?,
                )
            }
            value::BIGDECIMAL => Value::Decimal(self.input.read_utf()?),
            value::INT8_0 => Value::Int8(0),
            value::INT8_1 => Value::Int8(1),
            value::INT8_MIN => Value::Int8(i8::MIN),
            value::INT8_MAX => Value::Int8(i8::MAX),
            value::INT16_0 => Value::Int16(0),
            value::INT16_1 => Value::Int16(1),
            value::INT16_MIN => Value::Int16(i16::MIN),
            value::INT16_MAX => Value::Int16(i16::MAX),
            value::INT32_0 => Value::Int32(0),
            value::INT32_1 => Value::Int32(1),
            value::INT32_MIN => Value::Int32(i32::MIN),
            value::INT32_MAX => Value::Int32(i32::MAX),
            value::INT64_0 => Value::Int64(0),
            value::INT64_1 => Value::Int64(1),
            value::INT64_MIN => Value::Int64(i64::MIN),
            value::INT64_MAX => Value::Int64(i64::MAX),
            value::UINT8_0 => Value::Uint8(0),
            value::UINT8_1 => Value::Uint8(1),
            value::UINT8_MAX => Value::Uint8(u8::MAX),
            value::UINT16_0 => Value::Uint16(0),
            value::UINT16_1 => Value::Uint16(1),
            value::UINT16_MAX => Value::Uint16(u16::MAX),
            value::UINT32_0 => Value::Uint32(0),
            value::UINT32_1 => Value::Uint32(1),
            value::UINT32_MAX => Value::Uint32(u32::MAX),
            value::UINT64_0 => Value::Uint64(0),
            value::UINT64_1 => Value::Uint64(1),
            value::UINT64_MAX => Value::Uint64(u64::MAX),
            value::INT32_2B => Value::Int32(i32::from(self.input.read_u16()?)),
            value::INT64_4B => Value::Int64(i64::from(self.input.read_u32()?)),
            value::UINT32_2B => Value::Uint32(u32::from(self.input.read_u16()?)),
            value::UINT64_4B => Value::Uint64(u64::from(self.input.read_u32()?)),
            value::QNAME | value::QNAME_REF_1B | value::QNAME_REF_2B | value::QNAME_REF_4B => {
                Value::QName(self.read_qname_token(token)?)
            }
            value::BINARY_1B | value::BINARY_2B | value::BINARY_4B | value::BINARY_0..=0xFF => {
                Value::Binary(self.read_binary(token)?)
            }
            value::BITS_0..=value::BITS_4B => self.read_bits(token)?,
            value::YIID => {
                let count = self.input.read_count("path argument")?;
                Value::InstanceIdentifier(self.read_path_body(count, depth)?)
            }
            value::YIID_0..=0x7F => {
                let count = usize::from(token - value::YIID_0);
                Value::InstanceIdentifier(self.read_path_body(count, depth)?)
            }
            other => return Err(InvalidStream::UnexpectedValue(other).into()),
        })
    }
}

fn key_leaf_value(id: &NodeIdentifier, parent: Option<&PathArgument>) -> Result<Value> {
    let missing = || InvalidStream::MissingKeyLeaf {
        leaf: id.qname().to_string(),
        entry: parent.map_or_else(|| "<root>".to_owned(), ToString::to_string),
    };
    match parent {
        Some(PathArgument::WithPredicates(entry)) => {
            let v = entry.get(id.qname()).cloned().ok_or_else(missing)?;
            trace!(name = %id.qname(), "key leaf value restored from predicates");
            Ok(v)
        }
        _ => Err(missing().into()),
    }
}

impl<R: Read> StreamDecoder for MagnesiumDecoder<'_, R> {
    fn stream_node(&mut self, receiver: &mut dyn NodeStreamWriter) -> Result<()> {
        let header = self.input.read_u8()?;
        self.stream_header(receiver, header, None, 0)
    }

    fn read_qname(&mut self) -> Result<QName> {
        let token = self.input.read_u8()?;
        self.read_qname_token(token)
    }

    fn read_path_argument(&mut self) -> Result<PathArgument> {
        self.read_nested_argument(0)
    }

    fn read_instance_path(&mut self) -> Result<InstancePath> {
        let count = match self.input.read_u8()? {
            value::YIID => self.input.read_count("path argument")?,
            token @ value::YIID_0..=0x7F => usize::from(token - value::YIID_0),
            other => return Err(InvalidStream::UnexpectedValue(other).into()),
        };
        self.read_path_body(count, 0)
    }

    fn read_bool(&mut self) -> Result<bool> {
        self.input.read_bool()
    }
}
