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

use super::tokens::{node, path, token, value};
use crate::codec::{DecodeContext, StreamDecoder};
use crate::error::{InvalidStream, Result, StreamError};
use crate::io::DataInput;
use crate::stream::NodeStreamWriter;
use crate::StreamVersion;

pub(crate) struct LithiumDecoder<'a, R> {
    input: &'a mut DataInput<R>,
    version: StreamVersion,
    ctx: &'a mut DecodeContext,
    leaf_set: Option<QName>,
}

impl<'a, R: Read> LithiumDecoder<'a, R> {
    pub(crate) fn new(
        input: &'a mut DataInput<R>,
        version: StreamVersion,
        ctx: &'a mut DecodeContext,
    ) -> Self {
        Self {
            input,
            version,
            ctx,
            leaf_set: None,
        }
    }

    fn codes_names(&self) -> bool {
        self.version != StreamVersion::Lithium
    }

    fn stream_tag(&mut self, w: &mut dyn NodeStreamWriter, tag: u8, depth: usize) -> Result<()> {
        self.ctx.check_depth(depth)?;
        match tag {
            node::LEAF => {
                let id = self.read_node_identifier()?;
                let v = self.read_value(0)?;
                trace!(name = %id.qname(), kind = v.type_name(), "leaf");
                w.leaf_node(&id, &v)
            }
            node::LEAF_SET_ENTRY => {
                let name = match &self.leaf_set {
                    Some(parent) => parent.clone(),
                    None => self.read_qname()?,
                };
                let v = self.read_value(0)?;
                w.leaf_set_entry_node(&name, &v)
            }
            node::ANY_XML => {
                let id = self.read_node_identifier()?;
                let body = match self.read_value(0)? {
                    Value::String(body) => body,
                    other => {
                        trace!(kind = other.type_name(), "anyxml body is not a string");
                        return Err(InvalidStream::UnexpectedValue(node::ANY_XML).into());
                    }
                };
                w.anyxml_node(&id, &body)
            }
            node::CONTAINER => {
                let (id, hint) = self.read_open_node()?;
                w.start_container_node(&id, hint)?;
                self.stream_children(w, depth)
            }
            node::CHOICE => {
                let (id, hint) = self.read_open_node()?;
                w.start_choice_node(&id, hint)?;
                self.stream_children(w, depth)
            }
            node::UNKEYED_LIST => {
                let (id, hint) = self.read_open_node()?;
                w.start_unkeyed_list(&id, hint)?;
                self.stream_children(w, depth)
            }
            node::UNKEYED_LIST_ITEM => {
                let (id, hint) = self.read_open_node()?;
                w.start_unkeyed_list_item(&id, hint)?;
                self.stream_children(w, depth)
            }
            node::MAP => {
                let (id, hint) = self.read_open_node()?;
                w.start_map_node(&id, hint)?;
                self.stream_children(w, depth)
            }
            node::ORDERED_MAP => {
                let (id, hint) = self.read_open_node()?;
                w.start_ordered_map_node(&id, hint)?;
                self.stream_children(w, depth)
            }
            node::MAP_ENTRY => {
                let name = self.read_qname()?;
                let id = self.read_predicates(name, 0)?;
                let hint = self.read_size_hint()?;
                trace!(name = %id.node_type(), keys = id.len(), "map entry");
                w.start_map_entry_node(&id, hint)?;
                self.stream_children(w, depth)
            }
            node::LEAF_SET | node::ORDERED_LEAF_SET => {
                let (id, hint) = self.read_open_node()?;
                if tag == node::LEAF_SET {
                    w.start_leaf_set(&id, hint)?;
                } else {
                    w.start_ordered_leaf_set(&id, hint)?;
                }
                self.leaf_set = Some(id.qname().clone());
                let result = self.stream_children(w, depth);
                self.leaf_set = None;
                result
            }
            node::AUGMENTATION => {
                let id = self.read_augmentation_identifier()?;
                w.start_augmentation_node(&id)?;
                self.stream_children(w, depth)
            }
            node::YANG_MODELED_ANY_XML => Err(StreamError::Unsupported {
                version: self.version,
                operation: "YANG-modeled anyxml node",
            }),
            other => Err(InvalidStream::UnexpectedNode(other).into()),
        }
    }

    fn stream_children(&mut self, w: &mut dyn NodeStreamWriter, depth: usize) -> Result<()> {
        loop {
            let tag = self.input.read_u8()?;
            if tag == node::END {
                return w.end_node();
            }
            self.stream_tag(w, tag, depth + 1)?;
        }
    }

    fn read_node_identifier(&mut self) -> Result<NodeIdentifier> {
        Ok(NodeIdentifier::new(self.read_qname()?))
    }

    fn read_open_node(&mut self) -> Result<(NodeIdentifier, Option<usize>)> {
        let id = self.read_node_identifier()?;
        let hint = self.read_size_hint()?;
        trace!(name = %id.qname(), ?hint, "open node");
        Ok((id, hint))
    }

    fn read_size_hint(&mut self) -> Result<Option<usize>> {
        if self.version != StreamVersion::SodiumSr1 {
            return Ok(None);
        }
        let raw = self.input.read_varint()?;
        Ok(raw.checked_sub(1).and_then(|n| usize::try_from(n).ok()))
    }

    fn read_code(&mut self) -> Result<i64> {
        Ok(i64::from(self.input.read_i32()?))
    }

    fn read_coded_string(&mut self) -> Result<Option<Arc<str>>> {
        match self.input.read_u8()? {
            token::IS_NULL_VALUE => Ok(None),
            token::IS_CODE_VALUE => {
                let code = self.read_code()?;
                Ok(Some(Arc::clone(self.ctx.dictionary.strings.resolve(code)?)))
            }
            token::IS_STRING_VALUE => {
                let text = self.input.read_utf()?;
                let shared = self.ctx.interner.string(text);
                self.ctx.dictionary.strings.push(Arc::clone(&shared));
                Ok(Some(shared))
            }
            other => Err(InvalidStream::UnexpectedString(other).into()),
        }
    }

    fn read_required_string(&mut self, what: &str) -> Result<Arc<str>> {
        self.read_coded_string()?
            .ok_or_else(|| InvalidStream::InvalidName(format!("missing {what}")).into())
    }

    // Empty revisions are treated as absent.
    fn read_revision(&mut self) -> Result<Option<Arc<str>>> {
        Ok(self.read_coded_string()?.filter(|rev| !rev.is_empty()))
    }

    fn read_module(&mut self) -> Result<QNameModule> {
        match self.input.read_u8()? {
            token::IS_MODULE_CODE => {
                let code = self.read_code()?;
                Ok(self.ctx.dictionary.modules.resolve(code)?.clone())
            }
            token::IS_MODULE_VALUE => {
                let namespace = self.read_required_string("namespace")?;
                let revision = self.read_revision()?;
                let module = self.ctx.interner.module(namespace, revision)?;
                self.ctx.dictionary.modules.push(module.clone());
                Ok(module)
            }
            other => Err(InvalidStream::UnexpectedName(other).into()),
        }
    }

    fn read_qname_set(&mut self) -> Result<AugmentationIdentifier> {
        let count = self.input.read_count("augmentation child")?;
        let mut names = BTreeSet::new();
        for _ in 0..count {
            names.insert(self.read_qname()?);
        }
        Ok(AugmentationIdentifier::new(names))
    }

    fn read_augmentation_identifier(&mut self) -> Result<AugmentationIdentifier> {
        if !self.codes_names() {
            return self.read_qname_set();
        }
        match self.input.read_u8()? {
            token::IS_AUGMENT_CODE => {
                let code = self.read_code()?;
                Ok(self.ctx.dictionary.augmentations.resolve(code)?.clone())
            }
            token::IS_AUGMENT_VALUE => {
                let id = self.read_qname_set()?;
                self.ctx.dictionary.augmentations.push(id.clone());
                Ok(id)
            }
            other => Err(InvalidStream::UnexpectedName(other).into()),
        }
    }

    fn read_predicates(
        &mut self,
        name: QName,
        depth: usize,
    ) -> Result<NodeIdentifierWithPredicates> {
        let count = self.input.read_count("predicate")?;
        let mut id = NodeIdentifierWithPredicates::new(name);
        for _ in 0..count {
            let key = self.read_qname()?;
            let v = self.read_value(depth)?;
            id = id.with_key(key, v);
        }
        Ok(id)
    }

    fn read_number<T: std::str::FromStr>(&mut self) -> Result<T> {
        let text = self.input.read_utf()?;
        text.parse()
            .map_err(|_| InvalidStream::InvalidNumber(text).into())
    }

    /// `depth` counts instance paths enclosing this value.
    fn read_value(&mut self, depth: usize) -> Result<Value> {
        let native_unsigned = self.version.has_native_unsigned();
        let tag = self.input.read_u8()?;
        Ok(match tag {
            value::BOOL => Value::Bool(self.input.read_bool()?),
            value::BYTE => Value::Int8(self.input.read_i8()?),
            value::SHORT => Value::Int16(self.input.read_i16()?),
            value::INT => Value::Int32(self.input.read_i32()?),
            value::LONG => Value::Int64(self.input.read_i64()?),
            value::UINT8 if native_unsigned => Value::Uint8(self.input.read_u8()?),
            value::UINT16 if native_unsigned => Value::Uint16(self.input.read_u16()?),
            value::UINT32 if native_unsigned => Value::Uint32(self.input.read_u32()?),
            value::UINT64 if native_unsigned => Value::Uint64(self.input.read_u64()?),
            value::BIG_INTEGER => Value::BigInteger(self.read_number()?),
            value::DECIMAL => Value::Decimal(self.input.read_utf()?),
            value::STRING => Value::String(self.input.read_utf()?),
            value::STRING_BYTES => {
                let len = self.input.read_count("string byte")?;
                Value::String(self.input.read_utf8(len)?)
            }
            value::BINARY => {
                let len = self.input.read_count("binary byte")?;
                Value::Binary(self.input.read_vec(len)?)
            }
            value::EMPTY | value::NULL => Value::Empty,
            value::QNAME => Value::QName(self.read_qname()?),
            value::BITS => {
                let count = self.input.read_count("bit")?;
                let mut bits = BTreeSet::new();
                for _ in 0..count {
                    bits.insert(self.read_required_string("bit name")?.to_string());
                }
                Value::Bits(bits)
            }
            value::INSTANCE_PATH => Value::InstanceIdentifier(self.read_nested_path(depth)?),
            other => return Err(InvalidStream::UnexpectedValue(other).into()),
        })
    }

    fn read_nested_argument(&mut self, depth: usize) -> Result<PathArgument> {
        match self.input.read_u8()? {
            path::NODE_IDENTIFIER => Ok(PathArgument::NodeIdentifier(self.read_node_identifier()?)),
            path::WITH_PREDICATES => {
                let name = self.read_qname()?;
                Ok(PathArgument::WithPredicates(self.read_predicates(name, depth + 1)?))
            }
            path::WITH_VALUE => {
                let node_type = self.read_qname()?;
                let value = self.read_value(depth + 1)?;
                Ok(PathArgument::WithValue(NodeWithValue { node_type, value }))
            }
            path::AUGMENTATION => Ok(PathArgument::Augmentation(
                self.read_augmentation_identifier()?,
            )),
            other => Err(InvalidStream::UnexpectedPathArgument(other).into()),
        }
    }

    fn read_nested_path(&mut self, depth: usize) -> Result<InstancePath> {
        self.ctx.check_depth(depth)?;
        let count = self.input.read_count("path argument")?;
        let mut args = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            args.push(self.read_nested_argument(depth)?);
        }
        Ok(InstancePath(args))
    }
}

impl<R: Read> StreamDecoder for LithiumDecoder<'_, R> {
    fn stream_node(&mut self, receiver: &mut dyn NodeStreamWriter) -> Result<()> {
        let tag = self.input.read_u8()?;
        self.stream_tag(receiver, tag, 0)
    }

    fn read_qname(&mut self) -> Result<QName> {
        if !self.codes_names() {
            let local_name = self.read_required_string("local name")?;
            let namespace = self.read_required_string("namespace")?;
            let revision = self.read_revision()?;
            let module = self.ctx.interner.module(namespace, revision)?;
            return Ok(self.ctx.interner.qname(module, local_name)?);
        }
        match self.input.read_u8()? {
            token::IS_QNAME_CODE => {
                let code = self.read_code()?;
                Ok(self.ctx.dictionary.qnames.resolve(code)?.clone())
            }
            token::IS_QNAME_VALUE => {
                let local_name = self.read_required_string("local name")?;
                let module = self.read_module()?;
                let qname = self.ctx.interner.qname(module, local_name)?;
                self.ctx.dictionary.qnames.push(qname.clone());
                Ok(qname)
            }
            other => Err(InvalidStream::UnexpectedName(other).into()),
        }
    }

    fn read_path_argument(&mut self) -> Result<PathArgument> {
        self.read_nested_argument(0)
    }

    fn read_instance_path(&mut self) -> Result<InstancePath> {
        self.read_nested_path(0)
    }

    fn read_bool(&mut self) -> Result<bool> {
        self.input.read_bool()
    }
}
