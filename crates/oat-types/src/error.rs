use crate::{ClassReference, InstructionSet, MethodReference};

/// Fatal driver failures — runtime-invariant violations and backend contract
/// breaches (§7 of the design: everything else is absorbed as a statistic,
/// never an `Err`).
#[derive(Debug, Clone, thiserror::Error)]
pub enum DriverError {
    /// The embedder asked for an instruction set this driver has no
    /// trampoline surface for.
    #[error("unknown instruction set: {0:?}")]
    UnknownInstructionSet(InstructionSet),

    /// Image compilation was requested but the seed descriptor set resolved
    /// to nothing after stage 1 (load-image-classes).
    #[error("image-class set is empty after load-image-classes stage")]
    EmptyImageClassSet,

    /// A super-sharpened invoke's vtable slot didn't actually hold the
    /// resolved method — the devirtualization proof was unsound.
    #[error("vtable slot {slot} of {class:?} does not hold the expected method {expected:?}")]
    InconsistentVtableSlot {
        class: ClassReference,
        slot: u32,
        expected: MethodReference,
    },

    /// `compiled_methods` already had an entry for this reference and the
    /// new artifact differs from it.
    #[error("duplicate compiled-method entry for {0:?}")]
    DuplicateCompiledMethod(MethodReference),

    /// A backend returned no artifact while the runtime had a pending
    /// exception — a backend contract violation, not a compile failure.
    #[error("backend produced no artifact for {0:?} while an exception was pending")]
    BackendArtifactMissing(MethodReference),
}
