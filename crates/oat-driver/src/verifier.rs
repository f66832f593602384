//! The verifier interface (§6): structural verification, devirtualization
//! hints, and cast-safety.

use oat_types::MethodReference;

/// Result of verifying a single class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Ok,
    /// Class remains compilable; some call sites get throw-verification-error
    /// stubs at runtime.
    SoftFail,
    /// Class is erroneous; code generation for it is skipped.
    HardFail,
}

/// Verifier interface (§6).
pub trait Verifier: Send + Sync {
    fn verify_class(
        &self,
        dex: oat_types::DexFileId,
        loader: crate::loader::LoaderId,
        class_def_index: u32,
    ) -> VerifyOutcome;

    /// Structural-only verification against the raw dex, used when the
    /// class itself failed to load (§4.1 stage 3, §4.5).
    fn structural_verify(
        &self,
        dex: oat_types::DexFileId,
        loader: crate::loader::LoaderId,
        class_def_index: u32,
    ) -> VerifyOutcome;

    fn is_safe_cast(&self, method: MethodReference, dex_pc: u32) -> bool;

    /// The devirtualization map: `(caller, dex_pc) -> refined callee`.
    fn get_devirt_target(&self, caller: MethodReference, dex_pc: u32) -> Option<MethodReference>;

    fn is_class_rejected(&self, class: oat_types::ClassReference) -> bool;
}
