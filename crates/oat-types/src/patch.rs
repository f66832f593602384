use crate::{DexFileId, InvokeType};

/// A call or method site that needs a fixup, identified by dex file and
/// bytecode-level index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchSite {
    pub method_index: u32,
    pub invoke_type: InvokeType,
}

/// A single patch-ledger entry: "the literal at `literal_offset` inside
/// `referrer`'s compiled code must later be rewritten to point at `target`".
///
/// Immutable once constructed; the object-file writer is the only later
/// consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchInformation {
    pub dex_file: DexFileId,
    pub referrer: PatchSite,
    pub target: PatchSite,
    pub literal_offset: u32,
}

impl PatchInformation {
    pub fn new(
        dex_file: DexFileId,
        referrer: PatchSite,
        target: PatchSite,
        literal_offset: u32,
    ) -> Self {
        Self {
            dex_file,
            referrer,
            target,
            literal_offset,
        }
    }
}
