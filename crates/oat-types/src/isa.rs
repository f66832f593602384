/// Target instruction set. Drives trampoline and sharpening-eligibility choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionSet {
    Arm,
    Thumb2,
    Mips,
    X86,
}

impl InstructionSet {
    pub fn name(self) -> &'static str {
        match self {
            InstructionSet::Arm => "arm",
            InstructionSet::Thumb2 => "thumb2",
            InstructionSet::Mips => "mips",
            InstructionSet::X86 => "x86",
        }
    }
}
