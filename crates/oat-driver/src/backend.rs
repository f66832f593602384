//! The code-generator ("backend") interface (§6).
//!
//! A backend turns one method body into compiled code. It's a pluggable
//! capability, not a concrete implementation — the compile stage (§4.1
//! step 6) dispatches to whichever of the three kinds applies to a method.

use oat_types::{InvokeType, MethodReference, PatchInformation};

use crate::dex::CodeItem;
use crate::loader::LoaderId;
use crate::oracle::ResolutionOracle;

/// Opaque compiled output. The driver never looks inside this — it only
/// stores it in the registry (§4.6) for the object-file writer, plus
/// whatever patches the backend decided this compile needs (§4.6).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompiledMethod {
    pub native_code: Vec<u8>,
    pub code_patches: Vec<PatchInformation>,
    pub method_patches: Vec<PatchInformation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Quick,
    Portable,
}

impl BackendKind {
    /// Quick backends can sharpen straight to a direct interface call;
    /// portable backends cannot (§4.4 direct-code helper).
    pub fn supports_direct_interface_calls(self) -> bool {
        matches!(self, BackendKind::Quick)
    }
}

/// Everything a backend needs to compile one non-native method body.
#[derive(Debug, Clone)]
pub struct CompileRequest {
    pub method: MethodReference,
    pub access_flags: u32,
    pub invoke_type: InvokeType,
    pub class_def_index: u32,
    pub loader: LoaderId,
    pub code: CodeItem,
}

/// Everything a backend needs to compile a JNI stub.
#[derive(Debug, Clone)]
pub struct JniCompileRequest {
    pub method: MethodReference,
    pub access_flags: u32,
}

/// Backend interface (§6): a set of pluggable compile entry points, keyed by
/// `kind()`.
pub trait Backend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn init_context(&self) {}
    fn uninit_context(&self) {}

    /// `oracle` lets the backend ask for this method's own direct-call
    /// pointers (e.g. for a recursive call, or a class-init trampoline that
    /// jumps back into the method's own compiled entry) and attach any
    /// resulting `PatchLater` fixups onto the returned `CompiledMethod`.
    fn compile_method(&self, request: &CompileRequest, oracle: &ResolutionOracle<'_>) -> Option<CompiledMethod>;

    fn compile_jni(&self, request: &JniCompileRequest) -> Option<CompiledMethod>;

    /// Rewrites the method's bytecode in place; emits no native code.
    /// Returns whether the rewrite was applied.
    fn compile_dex_to_dex(&self, request: &CompileRequest) -> bool;
}
