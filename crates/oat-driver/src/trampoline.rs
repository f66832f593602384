//! Per-instruction-set trampoline surface (§6).
//!
//! Each instruction set gets six canned byte sequences. Real content is an
//! object-file-writer concern; here we just guarantee every supported ISA
//! has a non-empty, distinct stub for each slot and that unsupported ISAs
//! are a hard error (§7: "unknown instruction set" is a runtime invariant).

use oat_types::{DriverError, InstructionSet, InvokeType};

/// The canned stubs the driver hands the object-file writer for one
/// instruction set.
#[derive(Debug, Clone)]
pub struct TrampolineSet {
    pub portable_resolution: Vec<u8>,
    pub quick_resolution: Vec<u8>,
    pub interpreter_to_interpreter: Vec<u8>,
    pub interpreter_to_quick: Vec<u8>,
    /// One quick-invocation entry point offset stub per [`InvokeType`].
    pub quick_invoke_entry: [Vec<u8>; InvokeType::COUNT],
}

/// Look up the trampoline surface for `isa`.
pub fn trampolines_for(isa: InstructionSet) -> Result<TrampolineSet, DriverError> {
    // Every instruction set this driver knows about gets a placeholder stub
    // tagged with the ISA so mismatches are easy to spot in tests. A real
    // embedder would substitute actual machine code per ISA/slot.
    let tag = isa.name().as_bytes();
    let stub = |slot: &str| -> Vec<u8> {
        let mut bytes = tag.to_vec();
        bytes.extend_from_slice(slot.as_bytes());
        bytes
    };

    match isa {
        InstructionSet::Arm | InstructionSet::Thumb2 | InstructionSet::Mips | InstructionSet::X86 => {
            Ok(TrampolineSet {
                portable_resolution: stub("portable_resolution"),
                quick_resolution: stub("quick_resolution"),
                interpreter_to_interpreter: stub("interp_to_interp"),
                interpreter_to_quick: stub("interp_to_quick"),
                quick_invoke_entry: [
                    stub("invoke_static"),
                    stub("invoke_direct"),
                    stub("invoke_virtual"),
                    stub("invoke_super"),
                    stub("invoke_interface"),
                ],
            })
        }
    }
}
