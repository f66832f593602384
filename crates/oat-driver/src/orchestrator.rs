//! The pipeline orchestrator (§4.1): runs the five (plus compile) stages in
//! strict order, owns the timing ledger, and produces the statistics dump.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use oat_types::{ClassReference, ClassStatus, DescriptorSet, DriverError, InstructionSet, InvokeType, MethodReference};
use parking_lot::Mutex;
use serde::Serialize;

use crate::backend::{Backend, CompileRequest, JniCompileRequest};
use crate::dex::{ClassDefItem, DexFile, EncodedMethod};
use crate::image_classes::ImageClassClosure;
use crate::init_verify::InitVerifyStage;
use crate::loader::LoaderId;
use crate::mutator::MutatorLock;
use crate::oracle::ResolutionOracle;
use crate::registry::Registries;
use crate::resolver::Resolver;
use crate::stats::{Statistics, StatisticsSnapshot};
use crate::verifier::Verifier;
use crate::work_engine::WorkerPool;

/// Constructed directly by the embedding CLI; this crate parses none of it
/// itself (§1 non-goal: CLI/configuration parsing is out of scope).
#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub instruction_set: InstructionSet,
    pub thread_count: usize,
    pub compiling_image: bool,
    pub compiling_boot_image: bool,
    pub is_host: bool,
    /// Small-mode gate, plus its own size threshold below
    /// (`huge_method_size_limit` applies regardless of this flag).
    pub small_mode: bool,
    pub small_mode_method_size_limit: usize,
    pub huge_method_size_limit: usize,
    pub dump_stats: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            instruction_set: InstructionSet::Arm,
            thread_count: num_cpus::get(),
            compiling_image: false,
            compiling_boot_image: false,
            is_host: false,
            small_mode: false,
            small_mode_method_size_limit: 160,
            huge_method_size_limit: 100_000,
            dump_stats: false,
        }
    }
}

/// One labeled timing entry, e.g. `"Resolve a.dex Types"`.
#[derive(Debug, Clone, Serialize)]
pub struct TimingEntry {
    pub label: String,
    pub nanos: u128,
}

/// What `compile_all`/`compile_one` hand back on success.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub stats: StatisticsSnapshot,
    pub timings: Vec<TimingEntry>,
    pub total_nanos: u128,
}

struct TimingLedger {
    entries: Vec<TimingEntry>,
}

impl TimingLedger {
    fn new() -> Self {
        Self { entries: Vec::new() }
    }

    fn record(&mut self, label: impl Into<String>, elapsed: Duration) {
        self.entries.push(TimingEntry {
            label: label.into(),
            nanos: elapsed.as_nanos(),
        });
    }

    fn total_nanos(&self) -> u128 {
        self.entries.iter().map(|e| e.nanos).sum()
    }
}

/// Drives the five-stage pipeline (plus compile) over a set of dex files.
pub struct PipelineOrchestrator {
    options: DriverOptions,
    work_engine: WorkerPool,
    mutator: MutatorLock,
    registries: Registries,
    stats: Statistics,
}

impl PipelineOrchestrator {
    pub fn new(options: DriverOptions) -> Self {
        let work_engine = WorkerPool::new(options.thread_count);
        Self {
            options,
            work_engine,
            mutator: MutatorLock::new(),
            registries: Registries::new(),
            stats: Statistics::new(),
        }
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    /// Run the full pipeline over `dex_files` under `class_loader`, with
    /// `image_seeds` as the image-class closure's starting point.
    pub fn compile_all(
        &self,
        class_loader: LoaderId,
        dex_files: &[DexFile],
        image_seeds: DescriptorSet,
        resolver: &dyn Resolver,
        verifier: &dyn Verifier,
        backend: &dyn Backend,
    ) -> Result<PipelineReport, DriverError> {
        let start = Instant::now();
        let mut ledger = TimingLedger::new();

        // Stage 1: load image classes.
        let mut closure = ImageClassClosure::new(image_seeds, class_loader);
        let t0 = Instant::now();
        match closure.close_over_load_and_catch_types(resolver, dex_files) {
            Ok(()) => {}
            Err(DriverError::EmptyImageClassSet) if !self.options.compiling_image => {}
            Err(e) => return Err(e),
        }
        ledger.record("Load image classes", t0.elapsed());

        // Stage 2: resolve (type stage A, member stage B). Each class def's
        // members are independent, so the work engine fans the range out;
        // every task acquires its own runnable hold rather than sharing one
        // across threads, since a `parking_lot` guard can't move between
        // threads without the `send_guard` feature.
        let strides = self.work_engine.thread_count() as u32;
        for dex in dex_files {
            let t = Instant::now();
            self.work_engine.for_all(0, dex.num_class_defs(), strides, |class_def_index| {
                let runnable = self.mutator.enter_runnable();
                resolve_class_members(dex, class_def_index, class_loader, resolver);
                drop(runnable);
            });
            ledger.record(format!("Resolve {} Types", dex.location()), t.elapsed());
        }

        // Stage 3: verify.
        let init_verify = InitVerifyStage::new(resolver, verifier, &self.stats, &self.registries);
        for dex in dex_files {
            let t = Instant::now();
            let class_defs: Vec<(u32, &ClassDefItem)> = dex.class_defs().collect();
            self.work_engine.for_all(0, class_defs.len() as u32, strides, |i| {
                let (class_def_index, class_def) = class_defs[i as usize];
                let class_ref = ClassReference::new(dex.id(), class_def_index);
                let class_loaded = resolver.resolve_type(dex.id(), class_def.class_idx, class_loader).is_some();
                init_verify.verify_class(dex.id(), class_loader, class_ref, class_def_index, class_loaded);
            });
            ledger.record(format!("Verify {}", dex.location()), t.elapsed());
        }

        // Stage 4: initialize.
        let t = Instant::now();
        for dex in dex_files {
            let class_defs: Vec<(u32, &ClassDefItem)> = dex.class_defs().collect();
            self.work_engine.for_all(0, class_defs.len() as u32, strides, |i| {
                let (class_def_index, class_def) = class_defs[i as usize];
                let class_ref = ClassReference::new(dex.id(), class_def_index);
                let Some(descriptor) = dex.type_descriptor(class_def.class_idx) else {
                    return;
                };
                init_verify.initialize_class(class_ref, descriptor, self.options.compiling_boot_image, closure.descriptors());
            });
        }
        ledger.record("Initialize", t.elapsed());

        // Stage 5: update image classes from the live-object graph. This
        // crate has no garbage collector of its own, so "live objects" is
        // approximated as every class this run just drove to `Initialized`.
        let t = Instant::now();
        let live_classes: Vec<ClassReference> = {
            let mut seen = Vec::new();
            for dex in dex_files {
                for (class_def_index, _) in dex.class_defs() {
                    let class_ref = ClassReference::new(dex.id(), class_def_index);
                    if self.registries.classes.get(class_ref).map(|c| c.status) == Some(ClassStatus::Initialized) {
                        seen.push(class_ref);
                    }
                }
            }
            seen
        };
        closure.sweep_live_object_classes(resolver, &live_classes);
        ledger.record("Update image classes", t.elapsed());

        // Stage 6: compile.
        let oracle = ResolutionOracle::new(
            resolver,
            verifier,
            &self.stats,
            &self.registries,
            dex_files,
            self.options.compiling_image,
            self.options.instruction_set,
            backend.kind(),
        );
        for dex in dex_files {
            let t = Instant::now();
            let mut methods: Vec<(u32, &EncodedMethod)> = Vec::new();
            for (class_def_index, class_def) in dex.class_defs() {
                let mut seen_method_indices = HashSet::new();
                for method in class_def.direct_methods.iter().chain(class_def.virtual_methods.iter()) {
                    if seen_method_indices.insert(method.method_idx) {
                        methods.push((class_def_index, method));
                    } // duplicate method index: tolerated, second occurrence skipped
                }
            }

            let first_error: Mutex<Option<DriverError>> = Mutex::new(None);
            self.work_engine.for_all(0, methods.len() as u32, strides, |i| {
                let (class_def_index, method) = methods[i as usize];
                if let Err(e) = self.compile_method(dex, class_def_index, method, class_loader, backend, &oracle) {
                    let mut slot = first_error.lock();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                }
            });
            if let Some(e) = first_error.into_inner() {
                return Err(e);
            }
            ledger.record(format!("Compile {}", dex.location()), t.elapsed());
        }

        let total = start.elapsed();
        let report = PipelineReport {
            stats: self.stats.snapshot(),
            timings: ledger.entries,
            total_nanos: total.as_nanos(),
        };

        if self.options.dump_stats && total > Duration::from_secs(1) {
            if let Ok(json) = serde_json::to_string_pretty(&report) {
                eprintln!("oat-driver: pipeline statistics dump:\n{json}");
            }
        }

        Ok(report)
    }

    /// A minimal pipeline over a single method's dex file, for on-demand
    /// compilation.
    pub fn compile_one(
        &self,
        method: MethodReference,
        dex: &DexFile,
        class_loader: LoaderId,
        resolver: &dyn Resolver,
        verifier: &dyn Verifier,
        backend: &dyn Backend,
    ) -> Result<PipelineReport, DriverError> {
        let start = Instant::now();
        let mut ledger = TimingLedger::new();

        let Some((class_def_index, class_def)) = dex
            .class_defs()
            .find(|(_, def)| def.find_method(method.method_index).is_some())
        else {
            return Ok(PipelineReport {
                stats: self.stats.snapshot(),
                timings: ledger.entries,
                total_nanos: start.elapsed().as_nanos(),
            });
        };

        let init_verify = InitVerifyStage::new(resolver, verifier, &self.stats, &self.registries);
        let class_ref = ClassReference::new(dex.id(), class_def_index);
        let class_loaded = resolver.resolve_type(dex.id(), class_def.class_idx, class_loader).is_some();
        let t = Instant::now();
        init_verify.verify_class(dex.id(), class_loader, class_ref, class_def_index, class_loaded);
        ledger.record(format!("Verify {}", dex.location()), t.elapsed());

        if let Some(descriptor) = dex.type_descriptor(class_def.class_idx) {
            let t = Instant::now();
            init_verify.initialize_class(class_ref, descriptor, self.options.compiling_boot_image, &DescriptorSet::new());
            ledger.record(format!("Initialize {}", dex.location()), t.elapsed());
        }

        let oracle = ResolutionOracle::new(
            resolver,
            verifier,
            &self.stats,
            &self.registries,
            std::slice::from_ref(dex),
            self.options.compiling_image,
            self.options.instruction_set,
            backend.kind(),
        );
        if let Some(encoded) = class_def.find_method(method.method_index) {
            let t = Instant::now();
            self.compile_method(dex, class_def_index, encoded, class_loader, backend, &oracle)?;
            ledger.record(format!("Compile {}", dex.location()), t.elapsed());
        }

        Ok(PipelineReport {
            stats: self.stats.snapshot(),
            timings: ledger.entries,
            total_nanos: start.elapsed().as_nanos(),
        })
    }

    /// Dispatch one method to a backend. `oracle` is threaded through so the
    /// backend can ask for this method's own direct-call pointers and attach
    /// any `PatchLater` fixups to the artifact it returns.
    fn compile_method(
        &self,
        dex: &DexFile,
        class_def_index: u32,
        method: &EncodedMethod,
        class_loader: LoaderId,
        backend: &dyn Backend,
        oracle: &ResolutionOracle<'_>,
    ) -> Result<(), DriverError> {
        let method_ref = MethodReference::new(dex.id(), method.method_idx);

        if crate::access::is_set(method.access_flags, crate::access::ACC_ABSTRACT) {
            self.stats.methods_skipped_abstract.increment();
            return Ok(());
        }

        let artifact = if crate::access::is_set(method.access_flags, crate::access::ACC_NATIVE) {
            backend.compile_jni(&JniCompileRequest {
                method: method_ref,
                access_flags: method.access_flags,
            })
        } else if let Some(code) = &method.code {
            let size = code.insns_size_code_units as usize;
            let too_huge = size > self.options.huge_method_size_limit;
            let rejected_by_small_mode = self.options.small_mode && size > self.options.small_mode_method_size_limit;
            if too_huge || rejected_by_small_mode {
                None
            } else {
                let request = CompileRequest {
                    method: method_ref,
                    access_flags: method.access_flags,
                    invoke_type: InvokeType::Direct,
                    class_def_index,
                    loader: class_loader,
                    code: code.clone(),
                };
                match backend.compile_method(&request, oracle) {
                    Some(artifact) => Some(artifact),
                    None => {
                        backend.compile_dex_to_dex(&request);
                        None
                    }
                }
            }
        } else {
            None
        };

        if let Some(artifact) = artifact {
            for patch in &artifact.code_patches {
                self.registries.patches.add_code_patch(*patch);
            }
            for patch in &artifact.method_patches {
                self.registries.patches.add_method_patch(*patch);
            }
            self.registries.methods.insert(method_ref, artifact)?;
            self.stats.methods_compiled.increment();
        }

        Ok(())
    }
}

fn resolve_class_members(dex: &DexFile, class_def_index: u32, loader: LoaderId, resolver: &dyn Resolver) {
    let Some(class_def) = dex.class_def(class_def_index) else {
        return;
    };
    resolver.resolve_type(dex.id(), class_def.class_idx, loader);
    if let Some(superclass_idx) = class_def.superclass_idx {
        resolver.resolve_type(dex.id(), superclass_idx, loader);
    }
    for &iface_idx in &class_def.interface_idxs {
        resolver.resolve_type(dex.id(), iface_idx, loader);
    }
    let referrer = MethodReference::new(dex.id(), class_def_index);
    for field in class_def.instance_fields.iter() {
        resolver.resolve_field(dex.id(), field.field_idx, loader, false);
    }
    for field in class_def.static_fields.iter() {
        resolver.resolve_field(dex.id(), field.field_idx, loader, true);
    }
    for method in class_def.direct_methods.iter().chain(class_def.virtual_methods.iter()) {
        resolver.resolve_method(dex.id(), method.method_idx, loader, referrer, InvokeType::Direct);
    }
}
