//! The resolution & access oracle (§4.4): the driver's static-analysis
//! heart. Every query here is a tri-state in spirit — fast-path data,
//! "not provable" (`false`/`None`), or a swallowed exception that also
//! collapses to "not provable". Only the vtable-consistency debug assertion
//! below ever returns `Err`.

use oat_types::{
    ClassReference, DexFileId, DirectPtr, DriverError, InstructionSet, InvokeType, MethodReference,
};

use crate::backend::BackendKind;
use crate::dex::DexFile;
use crate::loader::LoaderId;
use crate::registry::Registries;
use crate::resolver::{Resolver, ResolvedClass, ResolvedMethod};
use crate::stats::Statistics;
use crate::verifier::Verifier;

fn package_of(descriptor: &str) -> &str {
    match descriptor.rfind('/') {
        Some(i) => &descriptor[..i],
        None => "",
    }
}

fn is_accessible(access_flags: u32, referrer_descriptor: &str, target_descriptor: &str) -> bool {
    if crate::access::is_set(access_flags, crate::access::ACC_PUBLIC) {
        return true;
    }
    package_of(referrer_descriptor) == package_of(target_descriptor)
}

/// Outcome of a field-access query (§4.4 points 5-6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldAccessInfo {
    pub offset: u32,
    pub volatile: bool,
    pub ssb_index: Option<u32>,
    pub is_referrers_class: bool,
}

/// Outcome of `invoke_info` (§4.4 point 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvokeInfo {
    pub resolved: bool,
    pub invoke_type: InvokeType,
    pub target_method: Option<MethodReference>,
    pub vtable_idx: Option<u32>,
    pub direct_code: DirectPtr,
    pub direct_method: DirectPtr,
}

impl InvokeInfo {
    fn not_provable(invoke_type: InvokeType) -> Self {
        Self {
            resolved: false,
            invoke_type,
            target_method: None,
            vtable_idx: None,
            direct_code: DirectPtr::None,
            direct_method: DirectPtr::None,
        }
    }
}

/// Scoped to a single pipeline run: borrows the resolver, verifier,
/// statistics bag, registries, and the dex files being compiled.
pub struct ResolutionOracle<'a> {
    resolver: &'a dyn Resolver,
    verifier: &'a dyn Verifier,
    stats: &'a Statistics,
    registries: &'a Registries,
    dex_files: &'a [DexFile],
    compiling_image: bool,
    instruction_set: InstructionSet,
    backend_kind: BackendKind,
}

impl<'a> ResolutionOracle<'a> {
    pub fn new(
        resolver: &'a dyn Resolver,
        verifier: &'a dyn Verifier,
        stats: &'a Statistics,
        registries: &'a Registries,
        dex_files: &'a [DexFile],
        compiling_image: bool,
        instruction_set: InstructionSet,
        backend_kind: BackendKind,
    ) -> Self {
        Self {
            resolver,
            verifier,
            stats,
            registries,
            dex_files,
            compiling_image,
            instruction_set,
            backend_kind,
        }
    }

    fn dex(&self, id: DexFileId) -> Option<&DexFile> {
        self.dex_files.iter().find(|d| d.id() == id)
    }

    /// Point 1: true iff compiling an image and the type's descriptor is an
    /// image class.
    pub fn type_in_dex_cache(&self, dex: DexFileId, type_idx: u32, loader: LoaderId, image_classes: &oat_types::DescriptorSet) -> bool {
        if !self.compiling_image {
            return false;
        }
        let Some(resolved) = self.resolver.resolve_type(dex, type_idx, loader) else {
            return false;
        };
        image_classes.contains(&resolved.descriptor)
    }

    /// Point 2: during image compilation, forces string resolution and
    /// returns true; otherwise false.
    pub fn string_in_dex_cache(&self, dex: DexFileId, string_idx: u32) -> bool {
        if !self.compiling_image {
            return false;
        }
        self.resolver.resolve_string(dex, string_idx)
    }

    /// Point 3: both referrer and target must already be resolved, and the
    /// target accessible from the referrer. Reports finality (ignoring
    /// arrays) and abstractness.
    pub fn can_access_type(
        &self,
        referrer_class: ClassReference,
        dex: DexFileId,
        type_idx: u32,
        loader: LoaderId,
    ) -> Option<TypeAccess> {
        let referrer = self.resolver.class_info(referrer_class)?;
        let target = self.resolver.resolve_type(dex, type_idx, loader)?;
        if !is_accessible(target.access_flags, &referrer.descriptor, &target.descriptor) {
            return None;
        }
        Some(TypeAccess {
            type_known_final: target.is_final() && !target.is_array(),
            type_known_abstract: target.is_abstract(),
            equals_referrers_class: target.reference == referrer_class,
        })
    }

    /// Point 4: as `can_access_type`, plus the class must be instantiable.
    pub fn can_access_instantiable_type(
        &self,
        referrer_class: ClassReference,
        dex: DexFileId,
        type_idx: u32,
        loader: LoaderId,
    ) -> bool {
        let Some(target) = self.resolver.resolve_type(dex, type_idx, loader) else {
            return false;
        };
        if target.is_abstract() || target.is_interface() || target.is_array() {
            return false;
        }
        self.can_access_type(referrer_class, dex, type_idx, loader).is_some()
    }

    /// Point 5: resolved field must be non-static, accessible, and not a
    /// `final` write from outside its declaring class.
    pub fn instance_field_info(
        &self,
        referrer_class: ClassReference,
        dex: DexFileId,
        field_idx: u32,
        loader: LoaderId,
        is_put: bool,
    ) -> Option<FieldAccessInfo> {
        let field = self.resolver.resolve_field(dex, field_idx, loader, false)?;
        if field.is_static() {
            return None;
        }
        let referrer = self.resolver.class_info(referrer_class)?;
        let declaring = self.resolver.class_info(field.declaring_class)?;
        if !is_accessible(field.access_flags, &referrer.descriptor, &declaring.descriptor) {
            self.stats.unresolved_instance_fields.increment();
            return None;
        }
        if field.is_final() {
            self.registries.freezing_constructors.mark(field.declaring_class);
        }
        if is_put && field.is_final() && referrer_class != field.declaring_class {
            self.stats.unresolved_instance_fields.increment();
            return None;
        }
        self.stats.resolved_instance_fields.increment();
        Some(FieldAccessInfo {
            offset: field.offset,
            volatile: field.is_volatile(),
            ssb_index: None,
            is_referrers_class: referrer_class == field.declaring_class,
        })
    }

    /// Point 6: resolved field must be static; computes the static-storage-
    /// base index when the declaring class differs from the referrer.
    pub fn static_field_info(
        &self,
        referrer_class: ClassReference,
        referrer_dex: DexFileId,
        field_idx: u32,
        loader: LoaderId,
        is_put: bool,
    ) -> Option<FieldAccessInfo> {
        let field = self.resolver.resolve_field(referrer_dex, field_idx, loader, true)?;
        if !field.is_static() {
            return None;
        }
        if is_put && field.is_final() && referrer_class != field.declaring_class {
            self.stats.unresolved_static_fields.increment();
            return None;
        }

        if field.declaring_class == referrer_class {
            self.stats.resolved_local_static_fields.increment();
            return Some(FieldAccessInfo {
                offset: field.offset,
                volatile: field.is_volatile(),
                ssb_index: None,
                is_referrers_class: true,
            });
        }

        let declaring = self.resolver.class_info(field.declaring_class)?;
        let dex = self.dex(referrer_dex)?;
        let Some(ssb_index) = dex.type_idx_for_descriptor(&declaring.descriptor) else {
            self.stats.unresolved_static_fields.increment();
            return None;
        };
        self.stats.resolved_static_fields.increment();
        Some(FieldAccessInfo {
            offset: field.offset,
            volatile: field.is_volatile(),
            ssb_index: Some(ssb_index),
            is_referrers_class: false,
        })
    }

    /// Point 8: forwards to the verifier; stats-tracked.
    pub fn is_safe_cast(&self, method: MethodReference, dex_pc: u32) -> bool {
        let safe = self.verifier.is_safe_cast(method, dex_pc);
        if safe {
            self.stats.safe_casts.increment();
        } else {
            self.stats.unsafe_casts.increment();
        }
        safe
    }

    /// Point 7: the invoke-site decision. See module docs for the staged
    /// algorithm (final-sharpening, super-sharpening, verifier devirt,
    /// direct-code/direct-method).
    #[allow(clippy::too_many_arguments)]
    pub fn invoke_info(
        &self,
        referrer: MethodReference,
        referrer_class: ClassReference,
        loader: LoaderId,
        dex: DexFileId,
        dex_pc: u32,
        method_idx: u32,
        invoke_type: InvokeType,
        update_stats: bool,
    ) -> Result<InvokeInfo, DriverError> {
        let Some(callee) = self.resolver.resolve_method(dex, method_idx, loader, referrer, invoke_type) else {
            if update_stats {
                self.stats.record_unresolved_method(invoke_type);
            }
            return Ok(InvokeInfo::not_provable(invoke_type));
        };
        let Some(referrer_info) = self.resolver.class_info(referrer_class) else {
            if update_stats {
                self.stats.record_unresolved_method(invoke_type);
            }
            return Ok(InvokeInfo::not_provable(invoke_type));
        };
        let Some(declaring) = self.resolver.class_info(callee.declaring_class) else {
            if update_stats {
                self.stats.record_unresolved_method(invoke_type);
            }
            return Ok(InvokeInfo::not_provable(invoke_type));
        };
        if !is_accessible(declaring.access_flags, &referrer_info.descriptor, &declaring.descriptor)
            || !is_accessible(callee.access_flags, &referrer_info.descriptor, &declaring.descriptor)
        {
            if update_stats {
                self.stats.record_unresolved_method(invoke_type);
            }
            return Ok(InvokeInfo::not_provable(invoke_type));
        }

        if update_stats {
            self.stats.record_resolved_method(invoke_type);
        }

        let mut sharpened_type = invoke_type;
        let mut target_method = callee.reference;

        // (c) final-based sharpening.
        if invoke_type == InvokeType::Virtual && (callee.is_final() || declaring.is_final()) {
            sharpened_type = InvokeType::Direct;
        } else if invoke_type == InvokeType::Super {
            let is_proper_subclass =
                referrer_class != callee.declaring_class && self.resolver.is_assignable(referrer_class, callee.declaring_class);
            if is_proper_subclass {
                if let Some(slot) = callee.vtable_index {
                    if self.resolver.vtable_slot(callee.declaring_class, slot) == Some(callee.reference) {
                        sharpened_type = InvokeType::Direct;
                    }
                }
            }
        }

        // (d) verifier-based devirtualization, only if (c) didn't already sharpen.
        if sharpened_type == invoke_type && matches!(invoke_type, InvokeType::Virtual | InvokeType::Interface) {
            if let Some(devirt_target) = self.verifier.get_devirt_target(referrer, dex_pc) {
                if let Some(referrer_dex) = self.dex(dex) {
                    let (candidate_code, candidate_method) = self.direct_pointers(InvokeType::Direct, &callee, &declaring, referrer_class);
                    let is_sentinel = |p: DirectPtr| matches!(p, DirectPtr::None | DirectPtr::PatchLater);
                    let needs_dex_cache_entry = self.backend_kind == BackendKind::Portable
                        || self.instruction_set != InstructionSet::Thumb2
                        || is_sentinel(candidate_code)
                        || is_sentinel(candidate_method);
                    if devirt_target.dex_file != dex {
                        if needs_dex_cache_entry {
                            if let Some(relocated) = self.relocate_across_dex(referrer_dex, devirt_target) {
                                target_method = relocated;
                                sharpened_type = InvokeType::Direct;
                            }
                        }
                    } else {
                        target_method = devirt_target;
                        sharpened_type = InvokeType::Direct;
                    }
                }
            }
        }

        if update_stats && sharpened_type != invoke_type {
            self.stats.record_virtual_made_direct(invoke_type);
        }

        #[cfg(debug_assertions)]
        if invoke_type == InvokeType::Super && sharpened_type != InvokeType::Direct {
            if let Some(slot) = callee.vtable_index {
                if let Some(resolved_at_slot) = self.resolver.vtable_slot(callee.declaring_class, slot) {
                    if resolved_at_slot != callee.reference {
                        return Err(DriverError::InconsistentVtableSlot {
                            class: callee.declaring_class,
                            slot,
                            expected: callee.reference,
                        });
                    }
                }
            }
        }

        // The final-sharpened/super-sharpened paths still call `callee` itself,
        // but a successful devirt relocate points `target_method` at a
        // different method (possibly in a different class/dex file) — direct
        // code/method must be computed against *that* method, not the
        // originally-resolved one.
        let (direct_code, direct_method) = if target_method == callee.reference {
            self.direct_pointers(sharpened_type, &callee, &declaring, referrer_class)
        } else {
            match self
                .resolver
                .resolve_method(target_method.dex_file, target_method.method_index, loader, referrer, sharpened_type)
                .and_then(|resolved| self.resolver.class_info(resolved.declaring_class).map(|info| (resolved, info)))
            {
                Some((resolved, info)) => self.direct_pointers(sharpened_type, &resolved, &info, referrer_class),
                None => (DirectPtr::None, DirectPtr::None),
            }
        };

        Ok(InvokeInfo {
            resolved: true,
            invoke_type: sharpened_type,
            target_method: Some(target_method),
            vtable_idx: callee.vtable_index,
            direct_code,
            direct_method,
        })
    }

    /// Direct-call pointers for a method referencing itself — a recursive
    /// call, or a class-init trampoline jumping back into the method's own
    /// compiled entry. Same rule as an ordinary direct-sharpened call, with
    /// `referrer_class == declaring_class` so the "is the target already
    /// initialized" gate never applies to a method calling into itself.
    pub fn direct_pointers_for_method(&self, method: MethodReference, loader: LoaderId) -> (DirectPtr, DirectPtr) {
        let Some(callee) = self.resolver.resolve_method(method.dex_file, method.method_index, loader, method, InvokeType::Direct) else {
            return (DirectPtr::None, DirectPtr::None);
        };
        let Some(declaring) = self.resolver.class_info(callee.declaring_class) else {
            return (DirectPtr::None, DirectPtr::None);
        };
        self.direct_pointers(InvokeType::Direct, &callee, &declaring, callee.declaring_class)
    }

    fn relocate_across_dex(&self, referrer_dex: &DexFile, target: MethodReference) -> Option<MethodReference> {
        let target_dex = self.dex(target.dex_file)?;
        let method_id = target_dex.method_id(target.method_index)?;
        let name = target_dex.string(method_id.name_idx)?.to_string();
        let proto = target_dex.proto(method_id.proto_idx)?.clone();
        let class_descriptor = target_dex.type_descriptor(method_id.class_idx)?.to_string();
        let class_idx_in_referrer = referrer_dex.type_idx_for_descriptor(&class_descriptor)?;
        let relocated = referrer_dex.find_method_by_signature(class_idx_in_referrer, &name, &proto)?;
        Some(MethodReference::new(referrer_dex.id(), relocated))
    }

    /// The direct-code/direct-method helper shared by the final-sharp and
    /// devirt paths.
    fn direct_pointers(
        &self,
        sharpened_type: InvokeType,
        callee: &ResolvedMethod,
        declaring: &ResolvedClass,
        referrer_class: ClassReference,
    ) -> (DirectPtr, DirectPtr) {
        let applicable = matches!(sharpened_type, InvokeType::Static | InvokeType::Direct)
            || (sharpened_type == InvokeType::Interface && self.backend_kind.supports_direct_interface_calls());
        if !applicable || !declaring.is_boot_class() {
            return (DirectPtr::None, DirectPtr::None);
        }

        if callee.is_static() && referrer_class != callee.declaring_class {
            let initialized = self
                .registries
                .classes
                .get(callee.declaring_class)
                .map(|c| c.status == oat_types::ClassStatus::Initialized)
                .unwrap_or(false);
            if !initialized {
                return (DirectPtr::None, DirectPtr::None);
            }
        }

        if self.compiling_image {
            return (DirectPtr::PatchLater, DirectPtr::PatchLater);
        }

        // Compiling against an existing boot image: this crate has no
        // image-object arena of its own, so a concrete address is out of
        // scope here — callers compiling against a real boot image source
        // their own `Concrete(addr)` pair from that arena.
        (DirectPtr::None, DirectPtr::None)
    }
}

/// Outcome of `can_access_type` (§4.4 point 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeAccess {
    pub type_known_final: bool,
    pub type_known_abstract: bool,
    pub equals_referrers_class: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dex::{ClassDefItem, DexFileBuilder, EncodedMethod};
    use crate::registry::Registries;
    use crate::resolver::{ResolvedField, ResolvedMethod};
    use crate::testkit::{MockResolver, MockVerifier};
    use oat_types::{ClassStatus, DexFileId};

    fn oracle_scaffold<'a>(
        resolver: &'a MockResolver,
        verifier: &'a MockVerifier,
        stats: &'a Statistics,
        registries: &'a Registries,
        dex_files: &'a [DexFile],
    ) -> ResolutionOracle<'a> {
        ResolutionOracle::new(
            resolver,
            verifier,
            stats,
            registries,
            dex_files,
            false,
            InstructionSet::Arm,
            BackendKind::Quick,
        )
    }

    #[test]
    fn final_method_sharpening() {
        let resolver = MockResolver::new();
        let verifier = MockVerifier::new();
        let stats = Statistics::new();
        let registries = Registries::new();

        let mut builder = DexFileBuilder::new("a.dex");
        let class_a = builder.type_id("La;");
        let void_ty = builder.type_id("V");
        let proto = builder.proto(void_ty, vec![]);
        let f = builder.method(class_a, proto, "f");
        builder.add_class_def(ClassDefItem { class_idx: class_a, ..Default::default() });
        let dex = builder.build(DexFileId(0));

        let a_ref = ClassReference::new(DexFileId(0), 0);
        let f_ref = MethodReference::new(DexFileId(0), f);
        let caller_ref = MethodReference::new(DexFileId(0), 99);

        resolver.register_type(DexFileId(0), class_a, LoaderId::BOOT, a_ref, "La;");
        resolver.register_method(
            DexFileId(0),
            f,
            ResolvedMethod { reference: f_ref, declaring_class: a_ref, access_flags: crate::access::ACC_FINAL, vtable_index: None },
        );

        let dex_files = [dex];
        let oracle = oracle_scaffold(&resolver, &verifier, &stats, &registries, &dex_files);

        let result = oracle
            .invoke_info(caller_ref, a_ref, LoaderId::BOOT, DexFileId(0), 0, f, InvokeType::Virtual, true)
            .unwrap();

        assert!(result.resolved);
        assert_eq!(result.invoke_type, InvokeType::Direct);
        assert_eq!(stats.resolved_methods(InvokeType::Virtual), 1);
        assert_eq!(stats.virtual_made_direct(InvokeType::Virtual), 1);
    }

    #[test]
    fn cross_loader_call_without_devirt_stays_slow() {
        let resolver = MockResolver::new();
        let verifier = MockVerifier::new();
        let stats = Statistics::new();
        let registries = Registries::new();

        let mut builder = DexFileBuilder::new("a.dex");
        let class_boot = builder.type_id("Lboot/B;");
        let void_ty = builder.type_id("V");
        let proto = builder.proto(void_ty, vec![]);
        let g = builder.method(class_boot, proto, "g");
        builder.add_class_def(ClassDefItem { class_idx: class_boot, ..Default::default() });
        let dex = builder.build(DexFileId(0));

        let boot_ref = ClassReference::new(DexFileId(0), 0);
        let g_ref = MethodReference::new(DexFileId(0), g);
        let caller_ref = MethodReference::new(DexFileId(0), 99);
        let caller_class = ClassReference::new(DexFileId(0), 1);

        resolver.register_type(DexFileId(0), class_boot, LoaderId::BOOT, boot_ref, "Lboot/B;");
        resolver.add_class("Lapp/Caller;", LoaderId(1), caller_class);
        resolver.register_method(
            DexFileId(0),
            g,
            ResolvedMethod { reference: g_ref, declaring_class: boot_ref, access_flags: 0, vtable_index: Some(0) },
        );

        let dex_files = [dex];
        let oracle = oracle_scaffold(&resolver, &verifier, &stats, &registries, &dex_files);

        let result = oracle
            .invoke_info(caller_ref, caller_class, LoaderId(1), DexFileId(0), 0, g, InvokeType::Virtual, true)
            .unwrap();

        assert!(result.resolved);
        assert_eq!(result.invoke_type, InvokeType::Virtual);
        assert_eq!(result.direct_code, DirectPtr::None);
        assert_eq!(result.direct_method, DirectPtr::None);
    }

    #[test]
    fn self_direct_pointers_are_patch_later_when_compiling_the_boot_image() {
        let resolver = MockResolver::new();
        let verifier = MockVerifier::new();
        let stats = Statistics::new();
        let registries = Registries::new();

        let mut builder = DexFileBuilder::new("a.dex");
        let class_a = builder.type_id("La;");
        let void_ty = builder.type_id("V");
        let proto = builder.proto(void_ty, vec![]);
        let m = builder.method(class_a, proto, "m");
        builder.add_class_def(ClassDefItem { class_idx: class_a, ..Default::default() });
        let dex = builder.build(DexFileId(0));

        let a_ref = ClassReference::new(DexFileId(0), 0);
        let m_ref = MethodReference::new(DexFileId(0), m);
        resolver.register_type(DexFileId(0), class_a, LoaderId::BOOT, a_ref, "La;");
        resolver.register_method(
            DexFileId(0),
            m,
            ResolvedMethod { reference: m_ref, declaring_class: a_ref, access_flags: crate::access::ACC_STATIC, vtable_index: None },
        );

        let dex_files = [dex];
        let oracle = ResolutionOracle::new(
            &resolver, &verifier, &stats, &registries, &dex_files,
            true, InstructionSet::Arm, BackendKind::Quick,
        );

        let (direct_code, direct_method) = oracle.direct_pointers_for_method(m_ref, LoaderId::BOOT);
        assert_eq!(direct_code, DirectPtr::PatchLater);
        assert_eq!(direct_method, DirectPtr::PatchLater);
    }

    #[test]
    fn self_direct_pointers_are_none_outside_a_boot_image_compile() {
        let resolver = MockResolver::new();
        let verifier = MockVerifier::new();
        let stats = Statistics::new();
        let registries = Registries::new();

        let mut builder = DexFileBuilder::new("a.dex");
        let class_a = builder.type_id("La;");
        let void_ty = builder.type_id("V");
        let proto = builder.proto(void_ty, vec![]);
        let m = builder.method(class_a, proto, "m");
        builder.add_class_def(ClassDefItem { class_idx: class_a, ..Default::default() });
        let dex = builder.build(DexFileId(0));

        let a_ref = ClassReference::new(DexFileId(0), 0);
        let m_ref = MethodReference::new(DexFileId(0), m);
        resolver.register_type(DexFileId(0), class_a, LoaderId::BOOT, a_ref, "La;");
        resolver.register_method(
            DexFileId(0),
            m,
            ResolvedMethod { reference: m_ref, declaring_class: a_ref, access_flags: crate::access::ACC_STATIC, vtable_index: None },
        );

        let dex_files = [dex];
        let oracle = oracle_scaffold(&resolver, &verifier, &stats, &registries, &dex_files);

        let (direct_code, direct_method) = oracle.direct_pointers_for_method(m_ref, LoaderId::BOOT);
        assert_eq!(direct_code, DirectPtr::None);
        assert_eq!(direct_method, DirectPtr::None);
    }

    #[test]
    fn final_instance_field_write_from_subclass_is_rejected() {
        let resolver = MockResolver::new();
        let verifier = MockVerifier::new();
        let stats = Statistics::new();
        let registries = Registries::new();

        let a_ref = ClassReference::new(DexFileId(0), 0);
        let b_ref = ClassReference::new(DexFileId(0), 1);
        resolver.add_class("La;", LoaderId::BOOT, a_ref);
        resolver.add_class("Lb;", LoaderId::BOOT, b_ref);
        resolver.register_field(
            DexFileId(0),
            0,
            ResolvedField { declaring_class: a_ref, access_flags: crate::access::ACC_FINAL, offset: 8, ssb_index: 0 },
        );

        let dex_files: [DexFile; 0] = [];
        let oracle = oracle_scaffold(&resolver, &verifier, &stats, &registries, &dex_files);

        let info = oracle.instance_field_info(b_ref, DexFileId(0), 0, LoaderId::BOOT, true);
        assert!(info.is_none());
        assert_eq!(stats.unresolved_instance_fields.get(), 1);
    }

    #[test]
    fn static_storage_base_via_local_dex_cache() {
        let resolver = MockResolver::new();
        let verifier = MockVerifier::new();
        let stats = Statistics::new();
        let registries = Registries::new();

        let a_ref = ClassReference::new(DexFileId(0), 0);
        resolver.add_class("La;", LoaderId::BOOT, a_ref);
        resolver.register_field(
            DexFileId(0),
            0,
            ResolvedField { declaring_class: a_ref, access_flags: crate::access::ACC_STATIC, offset: 16, ssb_index: 0 },
        );

        let dex_files: [DexFile; 0] = [];
        let oracle = oracle_scaffold(&resolver, &verifier, &stats, &registries, &dex_files);

        let info = oracle
            .static_field_info(a_ref, DexFileId(0), 0, LoaderId::BOOT, false)
            .unwrap();
        assert!(info.is_referrers_class);
        assert_eq!(info.ssb_index, None);
        assert_eq!(stats.resolved_local_static_fields.get(), 1);
    }

    #[test]
    fn verifier_devirt_relocates_target_across_dex_files() {
        let resolver = MockResolver::new();
        let verifier = MockVerifier::new();
        let stats = Statistics::new();
        let registries = Registries::new();

        // Caller dex: class A, plus a dangling method id for `Lb;::g` that
        // the call site resolves against.
        let mut caller_builder = DexFileBuilder::new("caller.dex");
        let class_a = caller_builder.type_id("La;");
        let class_b = caller_builder.type_id("Lb;");
        let void_ty = caller_builder.type_id("V");
        let proto = caller_builder.proto(void_ty, vec![]);
        let call_idx = caller_builder.method(class_a, proto, "call");
        let g_in_caller = caller_builder.method(class_b, proto, "g");
        caller_builder.add_class_def(ClassDefItem { class_idx: class_a, ..Default::default() });
        let caller_dex = caller_builder.build(DexFileId(0));

        // Target dex: class B, where the devirt map actually points.
        let mut target_builder = DexFileBuilder::new("target.dex");
        let class_b_in_target = target_builder.type_id("Lb;");
        let void_ty_target = target_builder.type_id("V");
        let target_proto = target_builder.proto(void_ty_target, vec![]);
        let g_in_target = target_builder.method(class_b_in_target, target_proto, "g");
        target_builder.add_class_def(ClassDefItem { class_idx: class_b_in_target, ..Default::default() });
        let target_dex = target_builder.build(DexFileId(1));

        let a_ref = ClassReference::new(DexFileId(0), 0);
        let b_ref = ClassReference::new(DexFileId(1), 0);
        resolver.register_type(DexFileId(0), class_a, LoaderId::BOOT, a_ref, "La;");
        resolver.register_type(DexFileId(0), class_b, LoaderId::BOOT, b_ref, "Lb;");

        let g_target_ref = MethodReference::new(DexFileId(1), g_in_target);
        resolver.register_method(
            DexFileId(0),
            g_in_caller,
            ResolvedMethod { reference: g_target_ref, declaring_class: b_ref, access_flags: 0, vtable_index: Some(0) },
        );

        let caller_method_ref = MethodReference::new(DexFileId(0), call_idx);
        verifier.set_devirt_target(caller_method_ref, 0, g_target_ref);

        let dex_files = [caller_dex, target_dex];
        let oracle = ResolutionOracle::new(
            &resolver,
            &verifier,
            &stats,
            &registries,
            &dex_files,
            false,
            InstructionSet::Arm,
            BackendKind::Quick,
        );

        let result = oracle
            .invoke_info(caller_method_ref, a_ref, LoaderId::BOOT, DexFileId(0), 0, g_in_caller, InvokeType::Virtual, true)
            .unwrap();

        assert!(result.resolved);
        assert_eq!(result.invoke_type, InvokeType::Direct);
        assert_eq!(result.target_method, Some(MethodReference::new(DexFileId(0), call_idx + 1)));
    }

    #[test]
    fn denylisted_class_is_never_observed_initialized() {
        use crate::denylist::is_denylisted;
        assert!(is_denylisted("Ljava/util/Locale;"));
        let resolver = MockResolver::new();
        let locale_ref = ClassReference::new(DexFileId(0), 0);
        resolver.add_class("Ljava/util/Locale;", LoaderId::BOOT, locale_ref);
        // The initialize stage (init_verify.rs) is the actual gatekeeper;
        // here we assert the oracle layer doesn't itself trigger init.
        assert!(!resolver.is_initialized(locale_ref));
    }
}
