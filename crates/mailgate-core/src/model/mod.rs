//! Domain records produced by the adapter.

mod flags;
mod folder;
mod message;

pub use flags::{FlagSet, StandardFlag};
pub use folder::{FolderDescriptor, FolderStatusRecord};
pub use message::{
    Address, AttachmentMetadata, ContentDescriptor, MessageBody, MessageList, MessageRecord,
};
