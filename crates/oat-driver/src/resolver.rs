//! The resolver / class-linker interface (§6).
//!
//! This is an external collaborator: the driver only ever calls through
//! this trait. A production embedder backs it with the real managed
//! runtime; tests back it with [`crate::testkit::MockResolver`].

use oat_types::{ClassReference, DexFileId, MethodReference};

use crate::loader::LoaderId;

/// A resolved class descriptor and its shape, as the resolver last saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedClass {
    pub reference: ClassReference,
    pub descriptor: String,
    pub access_flags: u32,
    pub superclass: Option<ClassReference>,
    pub interfaces: Vec<ClassReference>,
    pub array_component: Option<ClassReference>,
    /// `None` for the bootstrap loader — a prerequisite for living in a boot
    /// image and for direct-code/direct-method sharpening.
    pub loader: LoaderId,
    pub vtable: Vec<MethodReference>,
}

impl ResolvedClass {
    pub fn is_final(&self) -> bool {
        crate::access::is_set(self.access_flags, crate::access::ACC_FINAL)
    }

    pub fn is_abstract(&self) -> bool {
        crate::access::is_set(self.access_flags, crate::access::ACC_ABSTRACT)
    }

    pub fn is_interface(&self) -> bool {
        crate::access::is_set(self.access_flags, crate::access::ACC_INTERFACE)
    }

    pub fn is_array(&self) -> bool {
        self.descriptor.starts_with('[')
    }

    /// A "boot class" per §4.4's direct-code helper: defined with no class
    /// loader.
    pub fn is_boot_class(&self) -> bool {
        self.loader.is_boot()
    }
}

/// A resolved instance or static field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedField {
    pub declaring_class: ClassReference,
    pub access_flags: u32,
    pub offset: u32,
    /// Index into the declaring class's dex file's static-storage-base
    /// array; only meaningful for static fields.
    pub ssb_index: u32,
}

impl ResolvedField {
    pub fn is_static(&self) -> bool {
        crate::access::is_set(self.access_flags, crate::access::ACC_STATIC)
    }

    pub fn is_final(&self) -> bool {
        crate::access::is_set(self.access_flags, crate::access::ACC_FINAL)
    }

    pub fn is_volatile(&self) -> bool {
        crate::access::is_set(self.access_flags, crate::access::ACC_VOLATILE)
    }
}

/// A resolved method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedMethod {
    pub reference: MethodReference,
    pub declaring_class: ClassReference,
    pub access_flags: u32,
    /// `Some` for methods that occupy a vtable slot (virtual/interface).
    pub vtable_index: Option<u32>,
}

impl ResolvedMethod {
    pub fn is_static(&self) -> bool {
        crate::access::is_set(self.access_flags, crate::access::ACC_STATIC)
    }

    pub fn is_final(&self) -> bool {
        crate::access::is_set(self.access_flags, crate::access::ACC_FINAL)
    }

    pub fn is_abstract(&self) -> bool {
        crate::access::is_set(self.access_flags, crate::access::ACC_ABSTRACT)
    }

    pub fn is_native(&self) -> bool {
        crate::access::is_set(self.access_flags, crate::access::ACC_NATIVE)
    }
}

/// Resolver / class-linker interface (§6).
///
/// Every query here may "fail" by returning `None`/`false` — per §4.4 that's
/// not an error, it's "not provable"; any pending runtime exception the
/// query raised along the way is understood to be cleared before the call
/// returns (§4.4, §7).
pub trait Resolver: Send + Sync {
    fn resolve_type(&self, dex: DexFileId, type_idx: u32, loader: LoaderId) -> Option<ResolvedClass>;

    fn resolve_field(
        &self,
        dex: DexFileId,
        field_idx: u32,
        loader: LoaderId,
        is_static: bool,
    ) -> Option<ResolvedField>;

    fn resolve_method(
        &self,
        dex: DexFileId,
        method_idx: u32,
        loader: LoaderId,
        referrer: MethodReference,
        invoke_type: oat_types::InvokeType,
    ) -> Option<ResolvedMethod>;

    fn find_class(&self, descriptor: &str, loader: LoaderId) -> Option<ResolvedClass>;

    /// Look up a class already known to the resolver by reference, without
    /// going through a dex file's type table. Used by the image-class
    /// closure's root walk and by the oracle when it already has a
    /// `ClassReference` in hand.
    fn class_info(&self, class: ClassReference) -> Option<ResolvedClass>;

    /// Run `<clinit>` if needed. `can_init_static_fields` mirrors the real
    /// driver's "compiling boot image" gate; `assert_initialized` is a
    /// debug-only sanity check the caller can request.
    fn ensure_initialized(
        &self,
        class: ClassReference,
        assert_initialized: bool,
        can_init_static_fields: bool,
    ) -> bool;

    /// Force the string at `string_idx` into `dex`'s dex cache. Returns
    /// whether resolution succeeded.
    fn resolve_string(&self, dex: DexFileId, string_idx: u32) -> bool;

    fn visit_classes(&self, visit: &mut dyn FnMut(ClassReference));

    /// Is `sub` assignable to `sup` (subtype, including identity)?
    fn is_assignable(&self, sub: ClassReference, sup: ClassReference) -> bool;

    /// Read a class's vtable slot — used to verify super-sharpening and
    /// devirtualization proofs.
    fn vtable_slot(&self, class: ClassReference, slot: u32) -> Option<MethodReference>;
}
