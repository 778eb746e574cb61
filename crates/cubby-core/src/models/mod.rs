mod credential;
mod file;
mod identity;

pub use credential::AccessCredential;
pub use file::{FileRecord, LinkState, NewFileRecord, PublicFileInfo, ThumbnailTier};
pub use identity::Identity;
