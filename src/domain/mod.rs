//! Pure builder logic: everything here works on decoded metadata and plain
//! values, with no RPC or terminal involvement.

pub mod call;
pub mod form;
pub mod inspect;
pub mod options;

pub use call::{CallArg, CallModel};
pub use form::{FormEvent, FormPhase, FormState, FormSync};
pub use inspect::{HexField, HexSnapshot, InspectError, Inspector};
pub use options::{derive_methods, derive_sections, ArgSpec, MethodDescriptor, SectionOption};
