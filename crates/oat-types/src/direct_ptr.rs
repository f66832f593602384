/// A direct code or method pointer computed by the resolution oracle.
///
/// Kept as an explicit three-state enum rather than a raw pointer-sized
/// integer with `0`/`-1` sentinels, since those sentinels would just be
/// reinventing this enum by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectPtr {
    /// No direct pointer is available; the call/access must go through the
    /// normal resolution path at runtime.
    None,
    /// A direct pointer is legal but the concrete address isn't known until
    /// the object-file writer lays out the image — recorded in the patch
    /// ledger for later fixup.
    PatchLater,
    /// A concrete, already-known address (e.g. an existing boot image).
    Concrete(usize),
}

impl DirectPtr {
    pub fn is_direct(self) -> bool {
        !matches!(self, DirectPtr::None)
    }
}
