//! Initialization & verification (§4.5): per-class structural/resolver
//! verification, and `<clinit>` driving under the metaclass-then-class lock
//! order, gated by the initialization denylist.

use std::sync::Arc;

use dashmap::DashMap;
use oat_types::{ClassReference, ClassStatus, DescriptorSet, DexFileId};
use parking_lot::Mutex;

use crate::denylist::is_denylisted;
use crate::loader::LoaderId;
use crate::registry::Registries;
use crate::resolver::Resolver;
use crate::stats::Statistics;
use crate::verifier::{VerifyOutcome, Verifier};

/// The `Void` type is hand-initialized so the resolver is never asked to
/// run a `<clinit>` before the runtime is live.
const VOID_DESCRIPTOR: &str = "V";

pub struct InitVerifyStage<'a> {
    resolver: &'a dyn Resolver,
    verifier: &'a dyn Verifier,
    stats: &'a Statistics,
    registries: &'a Registries,
    metaclass_lock: Mutex<()>,
    class_locks: DashMap<ClassReference, Arc<Mutex<()>>>,
}

impl<'a> InitVerifyStage<'a> {
    pub fn new(resolver: &'a dyn Resolver, verifier: &'a dyn Verifier, stats: &'a Statistics, registries: &'a Registries) -> Self {
        Self {
            resolver,
            verifier,
            stats,
            registries,
            metaclass_lock: Mutex::new(()),
            class_locks: DashMap::new(),
        }
    }

    fn class_lock(&self, class: ClassReference) -> Arc<Mutex<()>> {
        self.class_locks.entry(class).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Verify one class. `class_loaded` distinguishes a full verify from the
    /// structural-only fallback used when the class itself failed to load.
    pub fn verify_class(&self, dex: DexFileId, loader: LoaderId, class: ClassReference, class_def_index: u32, class_loaded: bool) -> ClassStatus {
        let outcome = if class_loaded {
            self.verifier.verify_class(dex, loader, class_def_index)
        } else {
            self.verifier.structural_verify(dex, loader, class_def_index)
        };

        let status = match outcome {
            VerifyOutcome::Ok | VerifyOutcome::SoftFail => ClassStatus::Verified,
            VerifyOutcome::HardFail => ClassStatus::Erroneous,
        };

        match status {
            ClassStatus::Verified => self.stats.classes_verified.increment(),
            _ => self.stats.classes_erroneous.increment(),
        }

        self.registries.classes.record_status(class, status);
        status
    }

    /// Drive `<clinit>` for one class, honoring the lock order and the
    /// denylist. Returns the class's status after this attempt; a class
    /// that isn't eligible (unverified, non-boot-image run, denylisted, not
    /// an image class) keeps its prior status unchanged.
    pub fn initialize_class(
        &self,
        class: ClassReference,
        descriptor: &str,
        compiling_boot_image: bool,
        image_classes: &DescriptorSet,
    ) -> ClassStatus {
        let class_lock = self.class_lock(class);
        let _metaclass_guard = self.metaclass_lock.lock();
        let _class_guard = class_lock.lock();

        let current = self
            .registries
            .classes
            .get(class)
            .map(|c| c.status)
            .unwrap_or(ClassStatus::NotReady);

        if descriptor == VOID_DESCRIPTOR {
            self.stats.classes_initialized.increment();
            self.registries.classes.record_status(class, ClassStatus::Initialized);
            return ClassStatus::Initialized;
        }

        if current != ClassStatus::Verified {
            return current;
        }

        if is_denylisted(descriptor) {
            self.stats.classes_denylisted.increment();
            return current;
        }

        if !compiling_boot_image || !image_classes.contains(descriptor) {
            return current;
        }

        let succeeded = self.resolver.ensure_initialized(class, false, compiling_boot_image);
        let status = if succeeded { ClassStatus::Initialized } else { ClassStatus::Erroneous };
        if status == ClassStatus::Initialized {
            self.stats.classes_initialized.increment();
        }
        self.registries.classes.record_status(class, status);
        status
    }
}
