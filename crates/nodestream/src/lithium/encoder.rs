// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use std::io::Write;
use std::sync::Arc;

use nodestream_model::{
    AugmentationIdentifier, InstancePath, NodeIdentifier, NodeIdentifierWithPredicates,
    PathArgument, QName, QNameModule, Value,
};
use tracing::trace;

use super::tokens::{node, path, token, value};
use crate::codec::{check_value_depth, StreamEncoder};
use crate::dictionary::EncodeDictionary;
use crate::error::{EncodingError, Result, StreamError};
use crate::io::DataOutput;
use crate::stream::NodeStreamWriter;
use crate::StreamVersion;

pub(crate) struct LithiumEncoder<W> {
    out: DataOutput<W>,
    version: StreamVersion,
    dictionary: EncodeDictionary,
    open: usize,
    max_depth: usize,
    // Name of the leaf set being written; its entries omit their name.
    leaf_set: Option<QName>,
}

impl<W: Write> LithiumEncoder<W> {
    pub(crate) fn new(
        out: DataOutput<W>,
        version: StreamVersion,
        dictionary: EncodeDictionary,
        max_depth: usize,
    ) -> Self {
        Self {
            out,
            version,
            dictionary,
            open: 0,
            max_depth,
            leaf_set: None,
        }
    }

    fn codes_names(&self) -> bool {
        self.version != StreamVersion::Lithium
    }

    fn open_node(&mut self, tag: u8, name: &QName, hint: Option<usize>) -> Result<()> {
        trace!(tag, %name, "start node");
        self.out.write_u8(tag)?;
        self.write_qname(name)?;
        self.write_size_hint(hint)?;
        self.open += 1;
        Ok(())
    }

    fn write_size_hint(&mut self, hint: Option<usize>) -> Result<()> {
        if self.version != StreamVersion::SodiumSr1 {
            return Ok(());
        }
        let encoded = hint
            .and_then(|n| u32::try_from(n).ok())
            .and_then(|n| n.checked_add(1))
            .unwrap_or(0);
        self.out.write_varint(encoded)
    }

    fn write_coded_string(&mut self, value: Option<&Arc<str>>) -> Result<()> {
        let Some(value) = value else {
            return self.out.write_u8(token::IS_NULL_VALUE);
        };
        if let Some(code) = self.dictionary.strings.lookup::<str>(value) {
            self.out.write_u8(token::IS_CODE_VALUE)?;
            return self.out.write_u32(code);
        }
        self.dictionary.strings.define(Arc::clone(value))?;
        self.out.write_u8(token::IS_STRING_VALUE)?;
        self.out.write_utf(value)
    }

    fn write_module(&mut self, module: &QNameModule) -> Result<()> {
        if let Some(code) = self.dictionary.modules.lookup(module) {
            self.out.write_u8(token::IS_MODULE_CODE)?;
            return self.out.write_u32(code);
        }
        self.dictionary.modules.define(module.clone())?;
        self.out.write_u8(token::IS_MODULE_VALUE)?;
        self.write_coded_string(Some(module.namespace_arc()))?;
        self.write_coded_string(module.revision_arc())
    }

    fn write_qname_set(&mut self, id: &AugmentationIdentifier) -> Result<()> {
        self.out.write_count("augmentation child", id.len())?;
        for qname in id.possible_child_names() {
            self.write_qname(qname)?;
        }
        Ok(())
    }

    fn write_augmentation_identifier(&mut self, id: &AugmentationIdentifier) -> Result<()> {
        if !self.codes_names() {
            return self.write_qname_set(id);
        }
        if let Some(code) = self.dictionary.augmentations.lookup(id) {
            self.out.write_u8(token::IS_AUGMENT_CODE)?;
            return self.out.write_u32(code);
        }
        self.dictionary.augmentations.define(id.clone())?;
        self.out.write_u8(token::IS_AUGMENT_VALUE)?;
        self.write_qname_set(id)
    }

    fn write_predicates(&mut self, id: &NodeIdentifierWithPredicates, depth: usize) -> Result<()> {
        self.out.write_count("predicate", id.len())?;
        for (key, value) in id.iter() {
            self.write_qname(key)?;
            self.write_value(value, depth)?;
        }
        Ok(())
    }

    fn write_string_value(&mut self, text: &str) -> Result<()> {
        if u16::try_from(text.len()).is_ok() {
            self.out.write_u8(value::STRING)?;
            self.out.write_utf(text)
        } else {
            self.out.write_u8(value::STRING_BYTES)?;
            self.out.write_count("string byte", text.len())?;
            self.out.write_bytes(text.as_bytes())
        }
    }

    /// `depth` counts instance paths enclosing this value.
    fn write_value(&mut self, v: &Value, depth: usize) -> Result<()> {
        let native_unsigned = self.version.has_native_unsigned();
        match v {
            Value::Bool(b) => {
                self.out.write_u8(value::BOOL)?;
                self.out.write_bool(*b)
            }
            Value::Int8(n) => {
                self.out.write_u8(value::BYTE)?;
                self.out.write_i8(*n)
            }
            Value::Int16(n) => {
                self.out.write_u8(value::SHORT)?;
                self.out.write_i16(*n)
            }
            Value::Int32(n) => {
                self.out.write_u8(value::INT)?;
                self.out.write_i32(*n)
            }
            Value::Int64(n) => {
                self.out.write_u8(value::LONG)?;
                self.out.write_i64(*n)
            }
            Value::Uint8(n) if native_unsigned => {
                self.out.write_u8(value::UINT8)?;
                self.out.write_u8(*n)
            }
            Value::Uint16(n) if native_unsigned => {
                self.out.write_u8(value::UINT16)?;
                self.out.write_u16(*n)
            }
            Value::Uint32(n) if native_unsigned => {
                self.out.write_u8(value::UINT32)?;
                self.out.write_u32(*n)
            }
            Value::Uint64(n) if native_unsigned => {
                self.out.write_u8(value::UINT64)?;
                self.out.write_u64(*n)
            }
            // Formats without unsigned types carry the next wider signed type.
            Value::Uint8(n) => {
                self.out.write_u8(value::SHORT)?;
                self.out.write_i16(i16::from(*n))
            }
            Value::Uint16(n) => {
                self.out.write_u8(value::INT)?;
                self.out.write_i32(i32::from(*n))
            }
            Value::Uint32(n) => {
                self.out.write_u8(value::LONG)?;
                self.out.write_i64(i64::from(*n))
            }
            Value::Uint64(n) => {
                self.out.write_u8(value::BIG_INTEGER)?;
                self.out.write_utf(&n.to_string())
            }
            Value::BigInteger(n) => {
                self.out.write_u8(value::BIG_INTEGER)?;
                self.out.write_utf(&n.to_string())
            }
            Value::Decimal(text) => {
                self.out.write_u8(value::DECIMAL)?;
                self.out.write_utf(text)
            }
            Value::String(text) => self.write_string_value(text),
            Value::Binary(bytes) => {
                self.out.write_u8(value::BINARY)?;
                self.out.write_count("binary byte", bytes.len())?;
                self.out.write_bytes(bytes)
            }
            Value::Empty => self.out.write_u8(value::EMPTY),
            Value::QName(qname) => {
                self.out.write_u8(value::QNAME)?;
                self.write_qname(qname)
            }
            Value::Bits(bits) => {
                self.out.write_u8(value::BITS)?;
                self.out.write_count("bit", bits.len())?;
                for bit in bits {
                    self.write_coded_string(Some(&Arc::from(bit.as_str())))?;
                }
                Ok(())
            }
            Value::InstanceIdentifier(p) => {
                self.out.write_u8(value::INSTANCE_PATH)?;
                self.write_nested_path(p, depth)
            }
        }
    }

    fn write_nested_argument(&mut self, arg: &PathArgument, depth: usize) -> Result<()> {
        match arg {
            PathArgument::NodeIdentifier(id) => {
                self.out.write_u8(path::NODE_IDENTIFIER)?;
                self.write_qname(id.qname())
            }
            PathArgument::WithPredicates(id) => {
                self.out.write_u8(path::WITH_PREDICATES)?;
                self.write_qname(id.node_type())?;
                self.write_predicates(id, depth + 1)
            }
            PathArgument::WithValue(id) => {
                self.out.write_u8(path::WITH_VALUE)?;
                self.write_qname(&id.node_type)?;
                self.write_value(&id.value, depth + 1)
            }
            PathArgument::Augmentation(id) => {
                self.out.write_u8(path::AUGMENTATION)?;
                self.write_augmentation_identifier(id)
            }
            PathArgument::MountPoint(_) => Err(StreamError::Unsupported {
                version: self.version,
                operation: "mount point path argument",
            }),
        }
    }

    fn write_nested_path(&mut self, p: &InstancePath, depth: usize) -> Result<()> {
        check_value_depth(depth, self.max_depth)?;
        self.out.write_count("path argument", p.len())?;
        for arg in p.arguments() {
            self.write_nested_argument(arg, depth)?;
        }
        Ok(())
    }
}

impl<W: Write> NodeStreamWriter for LithiumEncoder<W> {
    fn start_container_node(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        self.open_node(node::CONTAINER, name.qname(), hint)
    }

    fn start_choice_node(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        self.open_node(node::CHOICE, name.qname(), hint)
    }

    fn start_augmentation_node(&mut self, id: &AugmentationIdentifier) -> Result<()> {
        trace!(children = id.len(), "start augmentation");
        self.out.write_u8(node::AUGMENTATION)?;
        self.write_augmentation_identifier(id)?;
        self.open += 1;
        Ok(())
    }

    fn start_unkeyed_list(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        self.open_node(node::UNKEYED_LIST, name.qname(), hint)
    }

    fn start_unkeyed_list_item(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        self.open_node(node::UNKEYED_LIST_ITEM, name.qname(), hint)
    }

    fn start_map_node(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        self.open_node(node::MAP, name.qname(), hint)
    }

    fn start_ordered_map_node(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        self.open_node(node::ORDERED_MAP, name.qname(), hint)
    }

    fn start_map_entry_node(
        &mut self,
        id: &NodeIdentifierWithPredicates,
        hint: Option<usize>,
    ) -> Result<()> {
        trace!(name = %id.node_type(), keys = id.len(), "start map entry");
        self.out.write_u8(node::MAP_ENTRY)?;
        self.write_qname(id.node_type())?;
        self.write_predicates(id, 0)?;
        self.write_size_hint(hint)?;
        self.open += 1;
        Ok(())
    }

    fn start_leaf_set(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        self.leaf_set = Some(name.qname().clone());
        self.open_node(node::LEAF_SET, name.qname(), hint)
    }

    fn start_ordered_leaf_set(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        self.leaf_set = Some(name.qname().clone());
        self.open_node(node::ORDERED_LEAF_SET, name.qname(), hint)
    }

    fn leaf_node(&mut self, name: &NodeIdentifier, v: &Value) -> Result<()> {
        trace!(name = %name.qname(), kind = v.type_name(), "leaf");
        self.out.write_u8(node::LEAF)?;
        self.write_qname(name.qname())?;
        self.write_value(v, 0)
    }

    fn leaf_set_entry_node(&mut self, name: &QName, v: &Value) -> Result<()> {
        match &self.leaf_set {
            Some(parent) if parent != name => {
                return Err(EncodingError::LeafSetEntryMismatch {
                    entry: name.to_string(),
                    leaf_set: parent.to_string(),
                }
                .into());
            }
            Some(_) => self.out.write_u8(node::LEAF_SET_ENTRY)?,
            None => {
                self.out.write_u8(node::LEAF_SET_ENTRY)?;
                self.write_qname(name)?;
            }
        }
        self.write_value(v, 0)
    }

    fn anyxml_node(&mut self, name: &NodeIdentifier, body: &str) -> Result<()> {
        self.out.write_u8(node::ANY_XML)?;
        self.write_qname(name.qname())?;
        self.write_string_value(body)
    }

    fn end_node(&mut self) -> Result<()> {
        self.open = self.open.checked_sub(1).ok_or(EncodingError::UnbalancedEnd)?;
        self.leaf_set = None;
        self.out.write_u8(node::END)
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()
    }
}

impl<W: Write> StreamEncoder<W> for LithiumEncoder<W> {
    fn write_qname(&mut self, qname: &QName) -> Result<()> {
        if !self.codes_names() {
            self.write_coded_string(Some(qname.local_name_arc()))?;
            self.write_coded_string(Some(qname.module().namespace_arc()))?;
            return self.write_coded_string(qname.module().revision_arc());
        }
        if let Some(code) = self.dictionary.qnames.lookup(qname) {
            self.out.write_u8(token::IS_QNAME_CODE)?;
            return self.out.write_u32(code);
        }
        self.dictionary.qnames.define(qname.clone())?;
        self.out.write_u8(token::IS_QNAME_VALUE)?;
        self.write_coded_string(Some(qname.local_name_arc()))?;
        self.write_module(qname.module())
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
