//! An in-memory stand-in for a dex file container.
//!
//! The real format is out of scope (§1): this just gives the driver and its
//! tests something with the indexable-table shape a dex-like container has —
//! types, strings, fields, methods, prototypes, class defs and code items —
//! so the pipeline stages have a concrete input to iterate over. An embedder
//! reading real containers would provide its own type with the same shape.

use oat_types::DexFileId;
use std::collections::HashMap;

/// A method or field prototype: return type plus parameter types, all by
/// type index.
#[derive(Debug, Clone, Default)]
pub struct ProtoIdItem {
    pub return_type_idx: u32,
    pub parameter_type_idxs: Vec<u32>,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldIdItem {
    pub class_idx: u32,
    pub type_idx: u32,
    pub name_idx: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct MethodIdItem {
    pub class_idx: u32,
    pub proto_idx: u32,
    pub name_idx: u32,
}

/// A method body's exception-handling metadata, plus its size in code
/// units — everything else about the body (the actual instructions) is
/// irrelevant to the driver.
#[derive(Debug, Clone, Default)]
pub struct CodeItem {
    /// Type indices of exception types named in `catch` clauses.
    pub catch_type_indices: Vec<u32>,
    /// Dex `insns_size` equivalent, used by the small-mode and huge-method
    /// size filters (§4.1 stage 6).
    pub insns_size_code_units: u32,
}

#[derive(Debug, Clone)]
pub struct EncodedMethod {
    pub method_idx: u32,
    pub access_flags: u32,
    pub code: Option<CodeItem>,
}

#[derive(Debug, Clone, Copy)]
pub struct EncodedField {
    pub field_idx: u32,
    pub access_flags: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ClassDefItem {
    pub class_idx: u32,
    pub access_flags: u32,
    pub superclass_idx: Option<u32>,
    pub interface_idxs: Vec<u32>,
    pub direct_methods: Vec<EncodedMethod>,
    pub virtual_methods: Vec<EncodedMethod>,
    pub instance_fields: Vec<EncodedField>,
    pub static_fields: Vec<EncodedField>,
}

impl ClassDefItem {
    pub fn find_method(&self, method_idx: u32) -> Option<&EncodedMethod> {
        self.direct_methods
            .iter()
            .chain(self.virtual_methods.iter())
            .find(|m| m.method_idx == method_idx)
    }
}

/// An in-memory dex file: interned strings/types plus the class defs that
/// reference them. Cheap to share behind an `Arc`; identity is `id()`.
#[derive(Debug, Clone)]
pub struct DexFile {
    id: DexFileId,
    location: String,
    strings: Vec<String>,
    /// type index -> string index (the type's descriptor)
    types: Vec<u32>,
    fields: Vec<FieldIdItem>,
    methods: Vec<MethodIdItem>,
    protos: Vec<ProtoIdItem>,
    class_defs: Vec<ClassDefItem>,
}

impl DexFile {
    pub fn id(&self) -> DexFileId {
        self.id
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// A stable content checksum, the way a real dex file carries one in its
    /// header — used only to give dex files a human-checkable identity.
    pub fn checksum(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(self.location.as_bytes());
        for s in &self.strings {
            hasher.update(s.as_bytes());
        }
        hasher.finalize()
    }

    pub fn string(&self, idx: u32) -> Option<&str> {
        self.strings.get(idx as usize).map(String::as_str)
    }

    pub fn type_descriptor(&self, type_idx: u32) -> Option<&str> {
        let string_idx = *self.types.get(type_idx as usize)?;
        self.string(string_idx)
    }

    pub fn type_idx_for_descriptor(&self, descriptor: &str) -> Option<u32> {
        self.types.iter().position(|&string_idx| {
            self.string(string_idx) == Some(descriptor)
        }).map(|i| i as u32)
    }

    pub fn field_id(&self, idx: u32) -> Option<&FieldIdItem> {
        self.fields.get(idx as usize)
    }

    pub fn method_id(&self, idx: u32) -> Option<&MethodIdItem> {
        self.methods.get(idx as usize)
    }

    pub fn proto(&self, idx: u32) -> Option<&ProtoIdItem> {
        self.protos.get(idx as usize)
    }

    pub fn num_class_defs(&self) -> u32 {
        self.class_defs.len() as u32
    }

    pub fn class_def(&self, idx: u32) -> Option<&ClassDefItem> {
        self.class_defs.get(idx as usize)
    }

    pub fn class_defs(&self) -> impl Iterator<Item = (u32, &ClassDefItem)> {
        self.class_defs.iter().enumerate().map(|(i, c)| (i as u32, c))
    }

    /// All `(method_idx, code_item)` pairs across every class def, for the
    /// image-class closure's catch-type sweep.
    pub fn code_items(&self) -> impl Iterator<Item = (u32, &CodeItem)> {
        self.class_defs.iter().flat_map(|c| {
            c.direct_methods
                .iter()
                .chain(c.virtual_methods.iter())
                .filter_map(|m| m.code.as_ref().map(|code| (m.method_idx, code)))
        })
    }

    /// Find a method in `class_idx` matching `name` and `proto` exactly —
    /// used by the oracle to re-locate a devirtualized target across dex
    /// files by descriptor/name/signature when the resolved dex cache entry
    /// doesn't carry it directly.
    pub fn find_method_by_signature(&self, class_idx: u32, name: &str, proto: &ProtoIdItem) -> Option<u32> {
        let class_def = self.class_defs.iter().find(|c| c.class_idx == class_idx)?;
        class_def
            .direct_methods
            .iter()
            .chain(class_def.virtual_methods.iter())
            .find(|m| {
                let id = match self.method_id(m.method_idx) {
                    Some(id) => id,
                    None => return false,
                };
                self.string(id.name_idx) == Some(name)
                    && self.protos_match(id.proto_idx, proto)
            })
            .map(|m| m.method_idx)
    }

    fn protos_match(&self, proto_idx: u32, other: &ProtoIdItem) -> bool {
        match self.proto(proto_idx) {
            Some(p) => {
                p.return_type_idx == other.return_type_idx
                    && p.parameter_type_idxs == other.parameter_type_idxs
            }
            None => false,
        }
    }
}

/// Builds a [`DexFile`] fixture without hand-indexing every table.
#[derive(Default)]
pub struct DexFileBuilder {
    location: String,
    strings: Vec<String>,
    string_index: HashMap<String, u32>,
    types: Vec<u32>,
    type_index: HashMap<u32, u32>,
    fields: Vec<FieldIdItem>,
    methods: Vec<MethodIdItem>,
    protos: Vec<ProtoIdItem>,
    class_defs: Vec<ClassDefItem>,
}

impl DexFileBuilder {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..Default::default()
        }
    }

    pub fn string(&mut self, s: &str) -> u32 {
        if let Some(&idx) = self.string_index.get(s) {
            return idx;
        }
        let idx = self.strings.len() as u32;
        self.strings.push(s.to_string());
        self.string_index.insert(s.to_string(), idx);
        idx
    }

    pub fn type_id(&mut self, descriptor: &str) -> u32 {
        let string_idx = self.string(descriptor);
        if let Some(&idx) = self.type_index.get(&string_idx) {
            return idx;
        }
        let idx = self.types.len() as u32;
        self.types.push(string_idx);
        self.type_index.insert(string_idx, idx);
        idx
    }

    pub fn proto(&mut self, return_type_idx: u32, parameter_type_idxs: Vec<u32>) -> u32 {
        let idx = self.protos.len() as u32;
        self.protos.push(ProtoIdItem {
            return_type_idx,
            parameter_type_idxs,
        });
        idx
    }

    pub fn field(&mut self, class_idx: u32, type_idx: u32, name: &str) -> u32 {
        let name_idx = self.string(name);
        let idx = self.fields.len() as u32;
        self.fields.push(FieldIdItem {
            class_idx,
            type_idx,
            name_idx,
        });
        idx
    }

    pub fn method(&mut self, class_idx: u32, proto_idx: u32, name: &str) -> u32 {
        let name_idx = self.string(name);
        let idx = self.methods.len() as u32;
        self.methods.push(MethodIdItem {
            class_idx,
            proto_idx,
            name_idx,
        });
        idx
    }

    pub fn add_class_def(&mut self, class_def: ClassDefItem) -> u32 {
        let idx = self.class_defs.len() as u32;
        self.class_defs.push(class_def);
        idx
    }

    pub fn build(self, id: DexFileId) -> DexFile {
        DexFile {
            id,
            location: self.location,
            strings: self.strings,
            types: self.types,
            fields: self.fields,
            methods: self.methods,
            protos: self.protos,
            class_defs: self.class_defs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_round_trips_types_and_strings() {
        let mut b = DexFileBuilder::new("test.dex");
        let object_ty = b.type_id("Ljava/lang/Object;");
        let dex = b.build(DexFileId(0));

        assert_eq!(dex.type_descriptor(object_ty), Some("Ljava/lang/Object;"));
        assert_eq!(dex.type_idx_for_descriptor("Ljava/lang/Object;"), Some(object_ty));
        assert_eq!(dex.type_idx_for_descriptor("Lnot/here;"), None);
    }

    #[test]
    fn code_items_walks_all_methods_with_bodies() {
        let mut b = DexFileBuilder::new("test.dex");
        let class_ty = b.type_id("LA;");
        let void_ty = b.type_id("V");
        let proto = b.proto(void_ty, vec![]);
        let m1 = b.method(class_ty, proto, "f");
        let m2 = b.method(class_ty, proto, "g");
        b.add_class_def(ClassDefItem {
            class_idx: class_ty,
            direct_methods: vec![
                EncodedMethod { method_idx: m1, access_flags: 0, code: Some(CodeItem { catch_type_indices: vec![1], insns_size_code_units: 4 }) },
                EncodedMethod { method_idx: m2, access_flags: 0, code: None },
            ],
            ..Default::default()
        });
        let dex = b.build(DexFileId(0));

        let items: Vec<_> = dex.code_items().collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].0, m1);
    }

    #[test]
    fn checksum_is_stable_for_same_content() {
        let mut b1 = DexFileBuilder::new("x.dex");
        b1.string("hello");
        let mut b2 = DexFileBuilder::new("x.dex");
        b2.string("hello");
        assert_eq!(b1.build(DexFileId(0)).checksum(), b2.build(DexFileId(1)).checksum());
    }
}
