// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use std::collections::BTreeSet;
use std::io::Write;
use std::sync::Arc;

use nodestream_model::{
    AugmentationIdentifier, InstancePath, NodeIdentifier, NodeIdentifierWithPredicates,
    PathArgument, QName, QNameModule, Value,
};
use tracing::trace;

use super::tokens::{node, path, value, Width};
use crate::codec::{check_value_depth, StreamEncoder};
use crate::dictionary::EncodeDictionary;
use crate::error::{EncodingError, Result};
use crate::io::DataOutput;
use crate::stream::NodeStreamWriter;

/// Open-node marker kept by the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StackEntry {
    /// A container-like node whose children are being written.
    Ancestor(PathArgument),
    /// A key leaf whose value is carried by the enclosing entry's predicates.
    KeyLeafMode,
    /// A leaf-like node that closes itself once its value is written.
    SelfTerminating,
}

fn code_len(code: u32) -> usize {
    usize::try_from(code).unwrap_or(usize::MAX)
}

pub(crate) struct MagnesiumEncoder<W> {
    out: DataOutput<W>,
    dictionary: EncodeDictionary,
    stack: Vec<StackEntry>,
    max_depth: usize,
}

impl<W: Write> MagnesiumEncoder<W> {
    pub(crate) fn new(out: DataOutput<W>, dictionary: EncodeDictionary, max_depth: usize) -> Self {
        Self {
            out,
            dictionary,
            stack: Vec::new(),
            max_depth,
        }
    }

    fn parent(&self) -> Option<&PathArgument> {
        match self.stack.last() {
            Some(StackEntry::Ancestor(arg)) => Some(arg),
            _ => None,
        }
    }

    fn inherits(&self, name: &QName) -> bool {
        self.parent().and_then(PathArgument::node_type) == Some(name)
    }

    /// Header byte plus the identifier, as a parent reference, lookup or definition.
    fn write_node_header(&mut self, kind: u8, extra: u8, name: &QName, inheritable: bool) -> Result<()> {
        if inheritable && self.inherits(name) {
            return self.out.write_u8(kind | extra | node::ADDR_PARENT);
        }
        if let Some(code) = self.dictionary.qnames.lookup(name) {
            return match u8::try_from(code) {
                Ok(small) => {
                    self.out.write_u8(kind | extra | node::ADDR_LOOKUP_1B)?;
                    self.out.write_u8(small)
                }
                Err(_) => {
                    self.out.write_u8(kind | extra | node::ADDR_LOOKUP_4B)?;
                    self.out.write_u32(code)
                }
            };
        }
        self.dictionary.qnames.define(name.clone())?;
        self.out.write_u8(kind | extra | node::ADDR_DEFINE)?;
        self.write_qname_definition(name)
    }

    fn open(&mut self, kind: u8, name: &NodeIdentifier, inheritable: bool) -> Result<()> {
        trace!(kind, name = %name.qname(), "start node");
        self.write_node_header(kind, node::PREDICATE_ZERO, name.qname(), inheritable)?;
        self.stack
            .push(StackEntry::Ancestor(PathArgument::NodeIdentifier(name.clone())));
        Ok(())
    }

    fn write_ref(&mut self, code: u32, tokens: [u8; 3]) -> Result<()> {
        match Width::of("reference", code_len(code), 0)? {
            Width::Inline(byte) | Width::Byte(byte) => {
                self.out.write_u8(tokens[0])?;
                self.out.write_u8(byte)
            }
            Width::Short(short) => {
                self.out.write_u8(tokens[1])?;
                self.out.write_u16(short)
            }
            Width::Int(int) => {
                self.out.write_u8(tokens[2])?;
                self.out.write_u32(int)
            }
        }
    }

    /// Dictionary-coded string: empty, back-reference or registered literal.
    fn write_encoded_string(&mut self, text: &Arc<str>) -> Result<()> {
        if text.is_empty() {
            return self.out.write_u8(value::STRING_EMPTY);
        }
        if let Some(code) = self.dictionary.strings.lookup::<str>(text) {
            return self.write_ref(
                code,
                [value::STRING_REF_1B, value::STRING_REF_2B, value::STRING_REF_4B],
            );
        }
        self.dictionary.strings.define(Arc::clone(text))?;
        self.write_string_literal(text)
    }

    fn write_string_literal(&mut self, text: &str) -> Result<()> {
        let len = text.len();
        if let Ok(short) = u8::try_from(len) {
            self.out.write_u8(value::STRING_1B)?;
            self.out.write_u8(short)?;
        } else if let Ok(wide) = u16::try_from(len) {
            self.out.write_u8(value::STRING_2B)?;
            self.out.write_u16(wide)?;
        } else {
            self.out.write_u8(value::STRING_4B)?;
            self.out.write_count("string byte", len)?;
        }
        self.out.write_bytes(text.as_bytes())
    }

    fn write_module(&mut self, module: &QNameModule) -> Result<()> {
        if let Some(code) = self.dictionary.modules.lookup(module) {
            return self.write_ref(code, [value::MODREF_1B, value::MODREF_2B, value::MODREF_4B]);
        }
        self.dictionary.modules.define(module.clone())?;
        self.write_encoded_string(module.namespace_arc())?;
        match module.revision_arc() {
            Some(revision) => self.write_encoded_string(revision),
            None => self.out.write_u8(value::STRING_EMPTY),
        }
    }

    /// Module then local name. The caller has already assigned the code.
    fn write_qname_definition(&mut self, qname: &QName) -> Result<()> {
        self.write_module(qname.module())?;
        self.write_encoded_string(qname.local_name_arc())
    }

    /// QName in value position: definition token or reference.
    fn write_qname_value(&mut self, qname: &QName) -> Result<()> {
        if let Some(code) = self.dictionary.qnames.lookup(qname) {
            return self.write_ref(
                code,
                [value::QNAME_REF_1B, value::QNAME_REF_2B, value::QNAME_REF_4B],
            );
        }
        self.dictionary.qnames.define(qname.clone())?;
        self.out.write_u8(value::QNAME)?;
        self.write_qname_definition(qname)
    }

    fn write_qname_set(&mut self, id: &AugmentationIdentifier) -> Result<()> {
        for qname in id.possible_child_names() {
            self.write_qname_value(qname)?;
        }
        Ok(())
    }

    fn write_predicates(&mut self, id: &NodeIdentifierWithPredicates, depth: usize) -> Result<()> {
        for (key, v) in id.iter() {
            self.write_qname_value(key)?;
            self.write_value(v, depth)?;
        }
        Ok(())
    }

    /// Path-argument header carrying the QName addressing bits, then the QName.
    fn write_path_header(&mut self, base: u8, qname: &QName) -> Result<()> {
        let Some(code) = self.dictionary.qnames.lookup(qname) else {
            self.dictionary.qnames.define(qname.clone())?;
            self.out.write_u8(base | path::QNAME_DEF)?;
            return self.write_qname_definition(qname);
        };
        match Width::of("reference", code_len(code), 0)? {
            Width::Inline(byte) | Width::Byte(byte) => {
                self.out.write_u8(base | path::QNAME_REF_1B)?;
                self.out.write_u8(byte)
            }
            Width::Short(short) => {
                self.out.write_u8(base | path::QNAME_REF_2B)?;
                self.out.write_u16(short)
            }
            Width::Int(int) => {
                self.out.write_u8(base | path::QNAME_REF_4B)?;
                self.out.write_u32(int)
            }
        }
    }

    fn write_trailing(&mut self, width: Width) -> Result<()> {
        match width {
            Width::Inline(_) => Ok(()),
            Width::Byte(byte) => self.out.write_u8(byte),
            Width::Short(short) => self.out.write_u16(short),
            Width::Int(int) => self.out.write_u32(int),
        }
    }

    fn write_string_value(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            self.out.write_u8(value::STRING_EMPTY)
        } else {
            self.write_string_literal(text)
        }
    }

    fn write_binary(&mut self, bytes: &[u8]) -> Result<()> {
        let width = Width::of("binary byte", bytes.len(), value::BINARY_INLINE)?;
        match width {
            Width::Inline(len) => self.out.write_u8(value::BINARY_0 | len)?,
            Width::Byte(_) => self.out.write_u8(value::BINARY_1B)?,
            Width::Short(_) => self.out.write_u8(value::BINARY_2B)?,
            Width::Int(_) => self.out.write_u8(value::BINARY_4B)?,
        }
        self.write_trailing(width)?;
        self.out.write_bytes(bytes)
    }

    fn write_bits(&mut self, bits: &BTreeSet<String>) -> Result<()> {
        let width = Width::of("bit", bits.len(), value::BITS_INLINE)?;
        match width {
            Width::Inline(count) => self.out.write_u8(value::BITS_0 + count)?,
            Width::Byte(_) => self.out.write_u8(value::BITS_1B)?,
            Width::Short(_) => self.out.write_u8(value::BITS_2B)?,
            Width::Int(_) => self.out.write_u8(value::BITS_4B)?,
        }
        self.write_trailing(width)?;
        for bit in bits {
            self.write_encoded_string(&Arc::from(bit.as_str()))?;
        }
        Ok(())
    }

    /// `depth` counts instance paths enclosing this value.
    fn write_value(&mut self, v: &Value, depth: usize) -> Result<()> {
        match v {
            Value::Bool(false) => self.out.write_u8(value::BOOLEAN_FALSE),
            Value::Bool(true) => self.out.write_u8(value::BOOLEAN_TRUE),
            Value::Empty => self.out.write_u8(value::EMPTY),
            Value::Int8(n) => match *n {
                0 => self.out.write_u8(value::INT8_0),
                1 => self.out.write_u8(value::INT8_1),
                i8::MIN => self.out.write_u8(value::INT8_MIN),
                i8::MAX => self.out.write_u8(value::INT8_MAX),
                n => {
                    self.out.write_u8(value::INT8)?;
                    self.out.write_i8(n)
                }
            },
            Value::Int16(n) => match *n {
                0 => self.out.write_u8(value::INT16_0),
                1 => self.out.write_u8(value::INT16_1),
                i16::MIN => self.out.write_u8(value::INT16_MIN),
                i16::MAX => self.out.write_u8(value::INT16_MAX),
                n => {
                    self.out.write_u8(value::INT16)?;
                    self.out.write_i16(n)
                }
            },
            Value::Int32(n) => match *n {
                0 => self.out.write_u8(value::INT32_0),
                1 => self.out.write_u8(value::INT32_1),
                i32::MIN => self.out.write_u8(value::INT32_MIN),
                i32::MAX => self.out.write_u8(value::INT32_MAX),
                n => match u16::try_from(n) {
                    Ok(short) => {
                        self.out.write_u8(value::INT32_2B)?;
                        self.out.write_u16(short)
                    }
                    Err(_) => {
                        self.out.write_u8(value::INT32)?;
                        self.out.write_i32(n)
                    }
                },
            },
            Value::Int64(n) => match *n {
                0 => self.out.write_u8(value::INT64_0),
                1 => self.out.write_u8(value::INT64_1),
                i64::MIN => self.out.write_u8(value::INT64_MIN),
                i64::MAX => self.out.write_u8(value::INT64_MAX),
                n => match u32::try_from(n) {
                    Ok(int) => {
                        self.out.write_u8(value::INT64_4B)?;
                        self.out.write_u32(int)
                    }
                    Err(_) => {
                        self.out.write_u8(value::INT64)?;
                        self.out.write_i64(n)
                    }
                },
            },
            Value::Uint8(n) => match *n {
                0 => self.out.write_u8(value::UINT8_0),
                1 => self.out.write_u8(value::UINT8_1),
                u8::MAX => self.out.write_u8(value::UINT8_MAX),
                n => {
                    self.out.write_u8(value::UINT8)?;
                    self.out.write_u8(n)
                }
            },
            Value::Uint16(n) => match *n {
                0 => self.out.write_u8(value::UINT16_0),
                1 => self.out.write_u8(value::UINT16_1),
                u16::MAX => self.out.write_u8(value::UINT16_MAX),
                n => {
                    self.out.write_u8(value::UINT16)?;
                    self.out.write_u16(n)
                }
            },
            Value::Uint32(n) => match *n {
                0 => self.out.write_u8(value::UINT32_0),
                1 => self.out.write_u8(value::UINT32_1),
                u32::MAX => self.out.write_u8(value::UINT32_MAX),
                n => match u16::try_from(n) {
                    Ok(short) => {
                        self.out.write_u8(value::UINT32_2B)?;
                        self.out.write_u16(short)
                    }
                    Err(_) => {
                        self.out.write_u8(value::UINT32)?;
                        self.out.write_u32(n)
                    }
                },
            },
            Value::Uint64(n) => match *n {
                0 => self.out.write_u8(value::UINT64_0),
                1 => self.out.write_u8(value::UINT64_1),
                u64::MAX => self.out.write_u8(value::UINT64_MAX),
                n => match u32::try_from(n) {
                    Ok(int) => {
                        self.out.write_u8(value::UINT64_4B)?;
                        self.out.write_u32(int)
                    }
                    Err(_) => {
                        self.out.write_u8(value::UINT64)?;
                        self.out.write_u64(n)
                    }
                },
            },
            Value::BigInteger(n) => {
                self.out.write_u8(value::BIGINTEGER)?;
                self.out.write_utf(&n.to_string())
            }
            Value::Decimal(text) => {
                self.out.write_u8(value::BIGDECIMAL)?;
                self.out.write_utf(text)
            }
            Value::String(text) => self.write_string_value(text),
            Value::Binary(bytes) => self.write_binary(bytes),
            Value::QName(qname) => self.write_qname_value(qname),
            Value::Bits(bits) => self.write_bits(bits),
            Value::InstanceIdentifier(p) => self.write_nested_path(p, depth),
        }
    }

    /// Value of the leaf on top of the stack; a no-op for elided key leaves.
    fn scalar_value(&mut self, v: &Value) -> Result<()> {
        match self.stack.last() {
            Some(StackEntry::KeyLeafMode) => {
                trace!("key leaf value elided");
                Ok(())
            }
            _ => self.write_value(v, 0),
        }
    }

    fn end_self_terminating(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(StackEntry::SelfTerminating | StackEntry::KeyLeafMode) => Ok(()),
            _ => Err(EncodingError::UnbalancedEnd.into()),
        }
    }

    fn write_nested_argument(&mut self, arg: &PathArgument, depth: usize) -> Result<()> {
        match arg {
            PathArgument::NodeIdentifier(id) => self.write_path_header(path::NODE_IDENTIFIER, id.qname()),
            PathArgument::WithPredicates(id) => {
                let width = Width::of("predicate", id.len(), path::SIZE_INLINE)?;
                let size = match width {
                    Width::Inline(n) => n,
                    Width::Byte(_) => path::SIZE_1B,
                    Width::Short(_) => path::SIZE_2B,
                    Width::Int(_) => path::SIZE_4B,
                };
                self.write_path_header(
                    path::WITH_PREDICATES | (size << path::SIZE_SHIFT),
                    id.node_type(),
                )?;
                self.write_trailing(width)?;
                self.write_predicates(id, depth + 1)
            }
            PathArgument::WithValue(id) => {
                self.write_path_header(path::WITH_VALUE, &id.node_type)?;
                self.write_value(&id.value, depth + 1)
            }
            PathArgument::Augmentation(id) => {
                let width = Width::of("augmentation child", id.len(), path::AID_COUNT_INLINE)?;
                let count = match width {
                    Width::Inline(n) => n,
                    Width::Byte(_) => path::AID_COUNT_1B,
                    Width::Short(_) => path::AID_COUNT_2B,
                    Width::Int(_) => path::AID_COUNT_4B,
                };
                self.out
                    .write_u8(path::AUGMENTATION | (count << path::AID_COUNT_SHIFT))?;
                self.write_trailing(width)?;
                self.write_qname_set(id)
            }
            PathArgument::MountPoint(qname) => self.write_path_header(path::MOUNTPOINT, qname),
        }
    }

    fn write_nested_path(&mut self, p: &InstancePath, depth: usize) -> Result<()> {
        check_value_depth(depth, self.max_depth)?;
        match u8::try_from(p.len()) {
            Ok(count) if p.len() < value::YIID_INLINE => self.out.write_u8(value::YIID_0 + count)?,
            _ => {
                self.out.write_u8(value::YIID)?;
                self.out.write_count("path argument", p.len())?;
            }
        }
        for arg in p.arguments() {
            self.write_nested_argument(arg, depth)?;
        }
        Ok(())
    }
}

impl<W: Write> NodeStreamWriter for MagnesiumEncoder<W> {
    fn start_container_node(&mut self, name: &NodeIdentifier, _hint: Option<usize>) -> Result<()> {
        self.open(node::CONTAINER, name, false)
    }

    fn start_choice_node(&mut self, name: &NodeIdentifier, _hint: Option<usize>) -> Result<()> {
        self.open(node::CHOICE, name, false)
    }

    fn start_augmentation_node(&mut self, id: &AugmentationIdentifier) -> Result<()> {
        trace!(children = id.len(), "start augmentation");
        if let Some(code) = self.dictionary.augmentations.lookup(id) {
            match u8::try_from(code) {
                Ok(small) => {
                    self.out.write_u8(node::AUGMENTATION | node::ADDR_LOOKUP_1B)?;
                    self.out.write_u8(small)?;
                }
                Err(_) => {
                    self.out.write_u8(node::AUGMENTATION | node::ADDR_LOOKUP_4B)?;
                    self.out.write_u32(code)?;
                }
            }
        } else {
            self.dictionary.augmentations.define(id.clone())?;
            self.out.write_u8(node::AUGMENTATION | node::ADDR_DEFINE)?;
            self.out.write_count("augmentation child", id.len())?;
            self.write_qname_set(id)?;
        }
        self.stack
            .push(StackEntry::Ancestor(PathArgument::Augmentation(id.clone())));
        Ok(())
    }

    fn start_unkeyed_list(&mut self, name: &NodeIdentifier, _hint: Option<usize>) -> Result<()> {
        self.open(node::LIST, name, false)
    }

    fn start_unkeyed_list_item(&mut self, name: &NodeIdentifier, _hint: Option<usize>) -> Result<()> {
        self.open(node::LIST_ENTRY, name, true)
    }

    fn start_map_node(&mut self, name: &NodeIdentifier, _hint: Option<usize>) -> Result<()> {
        self.open(node::MAP, name, false)
    }

    fn start_ordered_map_node(&mut self, name: &NodeIdentifier, _hint: Option<usize>) -> Result<()> {
        self.open(node::MAP_ORDERED, name, false)
    }

    fn start_map_entry_node(
        &mut self,
        id: &NodeIdentifierWithPredicates,
        _hint: Option<usize>,
    ) -> Result<()> {
        trace!(name = %id.node_type(), keys = id.len(), "start map entry");
        let size = id.len();
        let predicates = match size {
            0 => node::PREDICATE_ZERO,
            1 => node::PREDICATE_ONE,
            n if n <= usize::from(u8::MAX) => node::PREDICATE_1B,
            _ => node::PREDICATE_4B,
        };
        self.write_node_header(node::MAP_ENTRY, predicates, id.node_type(), true)?;
        match predicates {
            node::PREDICATE_1B => {
                let count = u8::try_from(size)
                    .map_err(|_| EncodingError::TooLarge { what: "predicate", count: size })?;
                self.out.write_u8(count)?;
            }
            node::PREDICATE_4B => self.out.write_count("predicate", size)?,
            _ => {}
        }
        self.write_predicates(id, 0)?;
        self.stack
            .push(StackEntry::Ancestor(PathArgument::WithPredicates(id.clone())));
        Ok(())
    }

    fn start_leaf_set(&mut self, name: &NodeIdentifier, _hint: Option<usize>) -> Result<()> {
        self.open(node::LEAFSET, name, false)
    }

    fn start_ordered_leaf_set(&mut self, name: &NodeIdentifier, _hint: Option<usize>) -> Result<()> {
        self.open(node::LEAFSET_ORDERED, name, false)
    }

    fn leaf_node(&mut self, name: &NodeIdentifier, v: &Value) -> Result<()> {
        let is_key = matches!(
            self.parent(),
            Some(PathArgument::WithPredicates(entry)) if entry.get(name.qname()) == Some(v)
        );
        trace!(name = %name.qname(), kind = v.type_name(), is_key, "leaf");
        if is_key {
            self.write_node_header(node::LEAF, node::PREDICATE_ONE, name.qname(), false)?;
            self.stack.push(StackEntry::KeyLeafMode);
        } else {
            self.write_node_header(node::LEAF, node::PREDICATE_ZERO, name.qname(), false)?;
            self.stack.push(StackEntry::SelfTerminating);
        }
        self.scalar_value(v)?;
        self.end_self_terminating()
    }

    fn leaf_set_entry_node(&mut self, name: &QName, v: &Value) -> Result<()> {
        self.write_node_header(node::LEAFSET_ENTRY, node::PREDICATE_ZERO, name, true)?;
        self.stack.push(StackEntry::SelfTerminating);
        self.scalar_value(v)?;
        self.end_self_terminating()
    }

    fn anyxml_node(&mut self, name: &NodeIdentifier, body: &str) -> Result<()> {
        self.write_node_header(node::ANYXML, node::PREDICATE_ZERO, name.qname(), false)?;
        self.write_string_value(body)
    }

    fn end_node(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(StackEntry::Ancestor(_)) => self.out.write_u8(node::END),
            Some(other) => {
                self.stack.push(other);
                Err(EncodingError::UnbalancedEnd.into())
            }
            None => Err(EncodingError::UnbalancedEnd.into()),
        }
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()
    }
}

impl<W: Write> StreamEncoder<W> for MagnesiumEncoder<W> {
    fn write_qname(&mut self, qname: &QName) -> Result<()> {
        self.write_qname_value(qname)
    }

    fn write_path_argument(&mut self, arg: &PathArgument) -> Result<()> {
        self.write_nested_argument(arg, 0)
    }

    fn write_instance_path(&mut self, p: &InstancePath) -> Result<()> {
        self.write_nested_path(p, 0)
    }

    fn write_bool(&mut self, v: bool) -> Result<()> {
        self.out.write_bool(v)
    }

    fn bytes_written(&self) -> u64 {
        self.out.bytes_written()
    }

    fn dictionary(&self) -> &EncodeDictionary {
        &self.dictionary
    }

    fn into_parts(self) -> (W, EncodeDictionary) {
        (self.out.into_inner(), self.dictionary)
    }
}
