/// Platform-specific functionality — resolving the owning account of a file.

pub mod owner;

pub use owner::{OwnerResolver, SystemOwnerResolver, UNKNOWN_OWNER};
