//! Shared data model for the oat AOT compiler driver.
//!
//! These types are value-semantic handles into an external dex-file arena
//! (see `oat-driver`'s `DexFile`) plus the small set of enums and records the
//! driver's components pass between each other. Nothing in this crate owns
//! bytecode or resolves anything — it just gives the rest of the driver a
//! common vocabulary.

mod descriptor;
mod direct_ptr;
mod error;
mod invoke;
mod isa;
mod patch;
mod refs;
mod status;

pub use descriptor::DescriptorSet;
pub use direct_ptr::DirectPtr;
pub use error::DriverError;
pub use invoke::InvokeType;
pub use isa::InstructionSet;
pub use patch::{PatchInformation, PatchSite};
pub use refs::{ClassReference, DexFileId, MethodReference};
pub use status::{ClassStatus, CompiledClass};
