//! The ahead-of-time compiler driver core: a parallel pipeline over
//! dex-like bytecode containers that resolves, verifies, initializes, and
//! compiles every class and method reachable from a class-loading context.
//!
//! This crate is the driver only — the resolver/class-linker, verifier, and
//! code generators it drives are external collaborators, specified here as
//! traits ([`resolver::Resolver`], [`verifier::Verifier`], [`backend::Backend`])
//! and supplied by an embedder. [`orchestrator::PipelineOrchestrator`] is the
//! entry point.

pub mod access;
pub mod backend;
pub mod denylist;
pub mod dex;
pub mod image_classes;
pub mod init_verify;
pub mod loader;
pub mod mutator;
pub mod oracle;
pub mod orchestrator;
pub mod registry;
pub mod resolver;
pub mod stats;
pub mod trampoline;
pub mod verifier;
pub mod work_engine;

pub mod testkit;

pub use backend::{Backend, BackendKind, CompileRequest, CompiledMethod, JniCompileRequest};
pub use init_verify::InitVerifyStage;
pub use image_classes::ImageClassClosure;
pub use loader::LoaderId;
pub use mutator::MutatorLock;
pub use oracle::{FieldAccessInfo, InvokeInfo, ResolutionOracle, TypeAccess};
pub use orchestrator::{DriverOptions, PipelineOrchestrator, PipelineReport, TimingEntry};
pub use registry::Registries;
pub use resolver::{Resolver, ResolvedClass, ResolvedField, ResolvedMethod};
pub use stats::{Statistics, StatisticsSnapshot};
pub use verifier::{VerifyOutcome, Verifier};
