mod digest;
mod event_handler;
mod listing;
mod path;
mod record;
mod version;

pub mod engine;
pub mod merge;
pub mod walker;

pub use digest::{Digest, DigestAlgorithm, DigestError};
pub use engine::{ImageMetadata, ImageSource};
pub use event_handler::{EventHandler, NoEventHandler};
pub use listing::{list_files, ListError};
pub use merge::Listing;
pub use path::normalize_path;
pub use record::{mode_string, ChangeKind, FileRecord};
pub use version::{EngineVersion, InvalidVersion};
pub use walker::{classify, ExtendedHeaderKind, LayerPayload};
