//! Mock `Resolver`/`Verifier`/`Backend` implementations, built on the
//! in-memory [`crate::dex::DexFile`] fixtures, for use in unit and
//! integration tests. Nothing here is exported as the crate's embedding
//! surface — these exist only to let the pipeline's own tests run without a
//! real managed runtime behind the traits.

use std::collections::HashMap;

use oat_types::{ClassReference, DexFileId, DirectPtr, InvokeType, MethodReference, PatchInformation, PatchSite};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::backend::{Backend, BackendKind, CompileRequest, CompiledMethod, JniCompileRequest};
use crate::loader::LoaderId;
use crate::oracle::ResolutionOracle;
use crate::resolver::{Resolver, ResolvedClass, ResolvedField, ResolvedMethod};
use crate::verifier::{VerifyOutcome, Verifier};

/// A hand-populated resolver: everything is set up explicitly by the test
/// via the `register_*`/`add_*` helpers rather than derived from dex bytes.
#[derive(Default)]
pub struct MockResolver {
    classes: Mutex<FxHashMap<ClassReference, ResolvedClass>>,
    by_descriptor: Mutex<HashMap<String, ClassReference>>,
    by_type_idx: Mutex<FxHashMap<(DexFileId, u32), ClassReference>>,
    fields: Mutex<FxHashMap<(DexFileId, u32), ResolvedField>>,
    methods: Mutex<FxHashMap<(DexFileId, u32), ResolvedMethod>>,
    assignable: Mutex<FxHashSet<(ClassReference, ClassReference)>>,
    strings: Mutex<FxHashSet<(DexFileId, u32)>>,
    initialized: Mutex<FxHashSet<ClassReference>>,
    initialize_should_succeed: Mutex<bool>,
}

impl MockResolver {
    pub fn new() -> Self {
        Self {
            initialize_should_succeed: Mutex::new(true),
            ..Default::default()
        }
    }

    /// Register a fully-formed class under `descriptor`, keyed for
    /// `find_class` and `class_info`/`resolve_type` lookups.
    pub fn add_class(&self, descriptor: &str, loader: LoaderId, reference: ClassReference) {
        self.register_reference(reference, descriptor, loader);
    }

    pub fn register_reference(&self, reference: ClassReference, descriptor: &str, loader: LoaderId) {
        let resolved = ResolvedClass {
            reference,
            descriptor: descriptor.to_string(),
            access_flags: 0,
            superclass: None,
            interfaces: Vec::new(),
            array_component: None,
            loader,
            vtable: Vec::new(),
        };
        self.classes.lock().insert(reference, resolved);
        self.by_descriptor.lock().insert(descriptor.to_string(), reference);
    }

    /// Register `reference` as what `(dex, type_idx)` resolves to, for
    /// `resolve_type`.
    pub fn register_type(&self, dex: DexFileId, type_idx: u32, loader: LoaderId, reference: ClassReference, descriptor: &str) {
        self.register_reference(reference, descriptor, loader);
        self.by_type_idx.lock().insert((dex, type_idx), reference);
    }

    pub fn set_access_flags(&self, reference: ClassReference, access_flags: u32) {
        if let Some(class) = self.classes.lock().get_mut(&reference) {
            class.access_flags = access_flags;
        }
    }

    pub fn set_superclass(&self, reference: ClassReference, superclass: ClassReference) {
        if let Some(class) = self.classes.lock().get_mut(&reference) {
            class.superclass = Some(superclass);
        }
        self.make_assignable(reference, superclass);
    }

    pub fn set_vtable(&self, reference: ClassReference, vtable: Vec<MethodReference>) {
        if let Some(class) = self.classes.lock().get_mut(&reference) {
            class.vtable = vtable;
        }
    }

    pub fn register_field(&self, dex: DexFileId, field_idx: u32, field: ResolvedField) {
        self.fields.lock().insert((dex, field_idx), field);
    }

    pub fn register_method(&self, dex: DexFileId, method_idx: u32, method: ResolvedMethod) {
        self.methods.lock().insert((dex, method_idx), method);
    }

    /// Record `sub` as assignable to `sup`. Assignability is reflexive by
    /// construction (`is_assignable` short-circuits on identity) so callers
    /// only need to register proper supertype edges; the mock does not walk
    /// transitive chains beyond what's explicitly registered here plus
    /// whatever `set_superclass` already added.
    pub fn make_assignable(&self, sub: ClassReference, sup: ClassReference) {
        self.assignable.lock().insert((sub, sup));
    }

    pub fn mark_initialized(&self, class: ClassReference) {
        self.initialized.lock().insert(class);
    }

    pub fn is_initialized(&self, class: ClassReference) -> bool {
        self.initialized.lock().contains(&class)
    }

    pub fn set_initialize_outcome(&self, succeeds: bool) {
        *self.initialize_should_succeed.lock() = succeeds;
    }
}

impl Resolver for MockResolver {
    fn resolve_type(&self, dex: DexFileId, type_idx: u32, _loader: LoaderId) -> Option<ResolvedClass> {
        let reference = *self.by_type_idx.lock().get(&(dex, type_idx))?;
        self.classes.lock().get(&reference).cloned()
    }

    fn resolve_field(&self, dex: DexFileId, field_idx: u32, _loader: LoaderId, is_static: bool) -> Option<ResolvedField> {
        let field = *self.fields.lock().get(&(dex, field_idx))?;
        if field.is_static() != is_static {
            return None;
        }
        Some(field)
    }

    fn resolve_method(
        &self,
        dex: DexFileId,
        method_idx: u32,
        _loader: LoaderId,
        _referrer: MethodReference,
        _invoke_type: InvokeType,
    ) -> Option<ResolvedMethod> {
        self.methods.lock().get(&(dex, method_idx)).copied()
    }

    fn find_class(&self, descriptor: &str, _loader: LoaderId) -> Option<ResolvedClass> {
        let reference = *self.by_descriptor.lock().get(descriptor)?;
        self.classes.lock().get(&reference).cloned()
    }

    fn class_info(&self, class: ClassReference) -> Option<ResolvedClass> {
        self.classes.lock().get(&class).cloned()
    }

    fn ensure_initialized(&self, class: ClassReference, _assert_initialized: bool, _can_init_static_fields: bool) -> bool {
        let succeeds = *self.initialize_should_succeed.lock();
        if succeeds {
            self.initialized.lock().insert(class);
        }
        succeeds
    }

    fn resolve_string(&self, dex: DexFileId, string_idx: u32) -> bool {
        self.strings.lock().insert((dex, string_idx));
        true
    }

    fn visit_classes(&self, visit: &mut dyn FnMut(ClassReference)) {
        let refs: Vec<ClassReference> = self.classes.lock().keys().copied().collect();
        for r in refs {
            visit(r);
        }
    }

    fn is_assignable(&self, sub: ClassReference, sup: ClassReference) -> bool {
        if sub == sup {
            return true;
        }
        self.assignable.lock().contains(&(sub, sup))
    }

    fn vtable_slot(&self, class: ClassReference, slot: u32) -> Option<MethodReference> {
        self.classes.lock().get(&class)?.vtable.get(slot as usize).copied()
    }
}

/// A hand-populated verifier: per-class outcomes and a devirt map, both set
/// explicitly by the test.
#[derive(Default)]
pub struct MockVerifier {
    outcomes: Mutex<FxHashMap<(DexFileId, u32), VerifyOutcome>>,
    devirt: Mutex<FxHashMap<(MethodReference, u32), MethodReference>>,
    rejected: Mutex<FxHashSet<ClassReference>>,
    safe_casts: Mutex<FxHashSet<(MethodReference, u32)>>,
}

impl MockVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_outcome(&self, dex: DexFileId, class_def_index: u32, outcome: VerifyOutcome) {
        self.outcomes.lock().insert((dex, class_def_index), outcome);
    }

    pub fn set_devirt_target(&self, caller: MethodReference, dex_pc: u32, target: MethodReference) {
        self.devirt.lock().insert((caller, dex_pc), target);
    }

    pub fn reject_class(&self, class: ClassReference) {
        self.rejected.lock().insert(class);
    }

    pub fn mark_safe_cast(&self, method: MethodReference, dex_pc: u32) {
        self.safe_casts.lock().insert((method, dex_pc));
    }
}

impl Verifier for MockVerifier {
    fn verify_class(&self, dex: DexFileId, _loader: LoaderId, class_def_index: u32) -> VerifyOutcome {
        self.outcomes
            .lock()
            .get(&(dex, class_def_index))
            .copied()
            .unwrap_or(VerifyOutcome::Ok)
    }

    fn structural_verify(&self, dex: DexFileId, loader: LoaderId, class_def_index: u32) -> VerifyOutcome {
        self.verify_class(dex, loader, class_def_index)
    }

    fn is_safe_cast(&self, method: MethodReference, dex_pc: u32) -> bool {
        self.safe_casts.lock().contains(&(method, dex_pc))
    }

    fn get_devirt_target(&self, caller: MethodReference, dex_pc: u32) -> Option<MethodReference> {
        self.devirt.lock().get(&(caller, dex_pc)).copied()
    }

    fn is_class_rejected(&self, class: ClassReference) -> bool {
        self.rejected.lock().contains(&class)
    }
}

/// A backend that "compiles" by recording a deterministic marker, so tests
/// can assert a method was dispatched without caring about real codegen.
pub struct MockBackend {
    kind: BackendKind,
    compiled: Mutex<Vec<MethodReference>>,
}

impl MockBackend {
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            compiled: Mutex::new(Vec::new()),
        }
    }

    pub fn compiled_methods(&self) -> Vec<MethodReference> {
        self.compiled.lock().clone()
    }
}

impl Backend for MockBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn compile_method(&self, request: &CompileRequest, oracle: &ResolutionOracle<'_>) -> Option<CompiledMethod> {
        self.compiled.lock().push(request.method);
        let (direct_code, direct_method) = oracle.direct_pointers_for_method(request.method, request.loader);
        let site = PatchSite { method_index: request.method.method_index, invoke_type: InvokeType::Direct };
        let mut code_patches = Vec::new();
        let mut method_patches = Vec::new();
        if matches!(direct_code, DirectPtr::PatchLater) {
            code_patches.push(PatchInformation::new(request.method.dex_file, site, site, 0));
        }
        if matches!(direct_method, DirectPtr::PatchLater) {
            method_patches.push(PatchInformation::new(request.method.dex_file, site, site, 0));
        }
        Some(CompiledMethod {
            native_code: request.method.dex_file.as_u32().to_le_bytes().to_vec(),
            code_patches,
            method_patches,
        })
    }

    fn compile_jni(&self, request: &JniCompileRequest) -> Option<CompiledMethod> {
        self.compiled.lock().push(request.method);
        Some(CompiledMethod { native_code: vec![0xCA, 0xFE], ..Default::default() })
    }

    fn compile_dex_to_dex(&self, request: &CompileRequest) -> bool {
        self.compiled.lock().push(request.method);
        true
    }
}
