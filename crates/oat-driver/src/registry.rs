//! The compiled-artifact registry and patch ledger (§4.6): four
//! independently locked structures, each with its own mutex held only for
//! the individual insert/lookup.

use dashmap::DashMap;
use oat_types::{ClassReference, ClassStatus, CompiledClass, DriverError, MethodReference, PatchInformation};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::backend::CompiledMethod;

/// `ClassReference -> CompiledClass`. Monotonic in status (§3).
#[derive(Default)]
pub struct ClassRegistry {
    classes: DashMap<ClassReference, CompiledClass, std::hash::BuildHasherDefault<rustc_hash::FxHasher>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, class: ClassReference) -> Option<CompiledClass> {
        self.classes.get(&class).map(|r| *r)
    }

    /// Record `status` for `class`, enforcing monotonic non-regression.
    /// Returns `false` if `status` would regress an existing record.
    pub fn record_status(&self, class: ClassReference, status: ClassStatus) -> bool {
        match self.classes.entry(class) {
            dashmap::mapref::entry::Entry::Vacant(v) => {
                v.insert(CompiledClass::new(status));
                true
            }
            dashmap::mapref::entry::Entry::Occupied(mut o) => o.get_mut().advance_to(status),
        }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// `MethodReference -> CompiledMethod`. Insert-once: a second, differing
/// insert for the same reference is a driver bug, not a swallowable error.
#[derive(Default)]
pub struct MethodRegistry {
    methods: DashMap<MethodReference, CompiledMethod, std::hash::BuildHasherDefault<rustc_hash::FxHasher>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, method: MethodReference) -> Option<CompiledMethod> {
        self.methods.get(&method).map(|r| r.clone())
    }

    pub fn contains(&self, method: MethodReference) -> bool {
        self.methods.contains_key(&method)
    }

    /// Insert `artifact` for `method`. Idempotent if an identical artifact is
    /// already registered; fatal if a *different* one is (§3, §4.6).
    pub fn insert(&self, method: MethodReference, artifact: CompiledMethod) -> Result<(), DriverError> {
        match self.methods.entry(method) {
            dashmap::mapref::entry::Entry::Vacant(v) => {
                v.insert(artifact);
                Ok(())
            }
            dashmap::mapref::entry::Entry::Occupied(o) => {
                if *o.get() == artifact {
                    Ok(())
                } else {
                    Err(DriverError::DuplicateCompiledMethod(method))
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }
}

/// Append-only patch lists, produced by backends during compilation and
/// consumed later by the object-file writer.
#[derive(Default)]
pub struct PatchLedger {
    code_patches: Mutex<Vec<PatchInformation>>,
    method_patches: Mutex<Vec<PatchInformation>>,
}

impl PatchLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_code_patch(&self, patch: PatchInformation) {
        self.code_patches.lock().push(patch);
    }

    pub fn add_method_patch(&self, patch: PatchInformation) {
        self.method_patches.lock().push(patch);
    }

    pub fn code_patches(&self) -> Vec<PatchInformation> {
        self.code_patches.lock().clone()
    }

    pub fn method_patches(&self) -> Vec<PatchInformation> {
        self.method_patches.lock().clone()
    }
}

/// Classes whose constructors require a release fence at return, because a
/// `final` instance field was resolved against them (§4.5).
#[derive(Default)]
pub struct FreezingConstructorClasses {
    classes: Mutex<FxHashSet<ClassReference>>,
}

impl FreezingConstructorClasses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self, class: ClassReference) {
        self.classes.lock().insert(class);
    }

    pub fn requires_barrier(&self, class: ClassReference) -> bool {
        self.classes.lock().contains(&class)
    }

    pub fn len(&self) -> usize {
        self.classes.lock().len()
    }
}

/// Bundles the four registries the rest of the driver shares.
#[derive(Default)]
pub struct Registries {
    pub classes: ClassRegistry,
    pub methods: MethodRegistry,
    pub patches: PatchLedger,
    pub freezing_constructors: FreezingConstructorClasses,
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }
}

// `FxHashMap` stays imported for callers building per-dex caches alongside
// the registries (e.g. the oracle's static-storage-base lookups).
pub type FxMap<K, V> = FxHashMap<K, V>;
