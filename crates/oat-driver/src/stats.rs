//! The statistics bag (§3, §4.4): counters partitioned by decision kind and
//! by [`InvokeType`].
//!
//! Debug builds take a single mutex around every increment so counts are
//! exact; release builds accept unsynchronized, possibly-lossy increments,
//! trading exactness for avoiding lock overhead on the hot compile path.

use std::sync::atomic::{AtomicU64, Ordering};

use oat_types::InvokeType;

#[cfg(debug_assertions)]
use parking_lot::Mutex;

/// A single lossy-outside-debug counter.
#[derive(Default)]
pub struct Counter {
    value: AtomicU64,
    #[cfg(debug_assertions)]
    guard: Mutex<()>,
}

impl Counter {
    pub fn increment(&self) {
        #[cfg(debug_assertions)]
        {
            let _guard = self.guard.lock();
            self.value.fetch_add(1, Ordering::Relaxed);
        }
        #[cfg(not(debug_assertions))]
        {
            self.value.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Per-[`InvokeType`] counters.
#[derive(Default)]
struct ByInvokeType([Counter; InvokeType::COUNT]);

impl ByInvokeType {
    fn increment(&self, invoke_type: InvokeType) {
        self.0[invoke_type.as_index()].increment();
    }

    fn get(&self, invoke_type: InvokeType) -> u64 {
        self.0[invoke_type.as_index()].get()
    }
}

/// The full compile-time decision taxonomy the oracle reports against.
#[derive(Default)]
pub struct Statistics {
    pub resolved_types: Counter,
    pub unresolved_types: Counter,
    pub resolved_strings: Counter,

    pub resolved_instance_fields: Counter,
    pub unresolved_instance_fields: Counter,
    pub resolved_local_static_fields: Counter,
    pub resolved_static_fields: Counter,
    pub unresolved_static_fields: Counter,

    resolved_methods: ByInvokeType,
    unresolved_methods: ByInvokeType,
    virtual_made_direct: ByInvokeType,

    pub safe_casts: Counter,
    pub unsafe_casts: Counter,

    pub classes_verified: Counter,
    pub classes_erroneous: Counter,
    pub classes_initialized: Counter,
    pub classes_denylisted: Counter,

    pub methods_compiled: Counter,
    pub methods_skipped_abstract: Counter,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_resolved_method(&self, invoke_type: InvokeType) {
        self.resolved_methods.increment(invoke_type);
    }

    pub fn record_unresolved_method(&self, invoke_type: InvokeType) {
        self.unresolved_methods.increment(invoke_type);
    }

    pub fn record_virtual_made_direct(&self, invoke_type: InvokeType) {
        self.virtual_made_direct.increment(invoke_type);
    }

    pub fn resolved_methods(&self, invoke_type: InvokeType) -> u64 {
        self.resolved_methods.get(invoke_type)
    }

    pub fn unresolved_methods(&self, invoke_type: InvokeType) -> u64 {
        self.unresolved_methods.get(invoke_type)
    }

    pub fn virtual_made_direct(&self, invoke_type: InvokeType) -> u64 {
        self.virtual_made_direct.get(invoke_type)
    }

    /// A flat, serializable snapshot for the statistics dump (§4.1).
    pub fn snapshot(&self) -> StatisticsSnapshot {
        let mut resolved_by_invoke = [0u64; InvokeType::COUNT];
        let mut unresolved_by_invoke = [0u64; InvokeType::COUNT];
        let mut made_direct_by_invoke = [0u64; InvokeType::COUNT];
        for invoke_type in InvokeType::ALL {
            let i = invoke_type.as_index();
            resolved_by_invoke[i] = self.resolved_methods(invoke_type);
            unresolved_by_invoke[i] = self.unresolved_methods(invoke_type);
            made_direct_by_invoke[i] = self.virtual_made_direct(invoke_type);
        }
        StatisticsSnapshot {
            resolved_types: self.resolved_types.get(),
            unresolved_types: self.unresolved_types.get(),
            resolved_strings: self.resolved_strings.get(),
            resolved_instance_fields: self.resolved_instance_fields.get(),
            unresolved_instance_fields: self.unresolved_instance_fields.get(),
            resolved_local_static_fields: self.resolved_local_static_fields.get(),
            resolved_static_fields: self.resolved_static_fields.get(),
            unresolved_static_fields: self.unresolved_static_fields.get(),
            resolved_methods_by_invoke_type: resolved_by_invoke,
            unresolved_methods_by_invoke_type: unresolved_by_invoke,
            virtual_made_direct_by_invoke_type: made_direct_by_invoke,
            safe_casts: self.safe_casts.get(),
            unsafe_casts: self.unsafe_casts.get(),
            classes_verified: self.classes_verified.get(),
            classes_erroneous: self.classes_erroneous.get(),
            classes_initialized: self.classes_initialized.get(),
            classes_denylisted: self.classes_denylisted.get(),
            methods_compiled: self.methods_compiled.get(),
            methods_skipped_abstract: self.methods_skipped_abstract.get(),
        }
    }
}

/// Plain-data snapshot of [`Statistics`], serialized in the statistics dump.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct StatisticsSnapshot {
    pub resolved_types: u64,
    pub unresolved_types: u64,
    pub resolved_strings: u64,
    pub resolved_instance_fields: u64,
    pub unresolved_instance_fields: u64,
    pub resolved_local_static_fields: u64,
    pub resolved_static_fields: u64,
    pub unresolved_static_fields: u64,
    pub resolved_methods_by_invoke_type: [u64; InvokeType::COUNT],
    pub unresolved_methods_by_invoke_type: [u64; InvokeType::COUNT],
    pub virtual_made_direct_by_invoke_type: [u64; InvokeType::COUNT],
    pub safe_casts: u64,
    pub unsafe_casts: u64,
    pub classes_verified: u64,
    pub classes_erroneous: u64,
    pub classes_initialized: u64,
    pub classes_denylisted: u64,
    pub methods_compiled: u64,
    pub methods_skipped_abstract: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_invoke_type_counters_are_independent() {
        let stats = Statistics::new();
        stats.record_resolved_method(InvokeType::Virtual);
        stats.record_resolved_method(InvokeType::Virtual);
        stats.record_resolved_method(InvokeType::Static);

        assert_eq!(stats.resolved_methods(InvokeType::Virtual), 2);
        assert_eq!(stats.resolved_methods(InvokeType::Static), 1);
        assert_eq!(stats.resolved_methods(InvokeType::Direct), 0);
    }

    #[test]
    fn snapshot_reflects_live_counters() {
        let stats = Statistics::new();
        stats.resolved_types.increment();
        stats.resolved_types.increment();
        stats.record_virtual_made_direct(InvokeType::Virtual);

        let snap = stats.snapshot();
        assert_eq!(snap.resolved_types, 2);
        assert_eq!(snap.virtual_made_direct_by_invoke_type[InvokeType::Virtual.as_index()], 1);
    }
}
