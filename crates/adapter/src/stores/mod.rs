mod account;
mod comments;
mod reader;
mod taxonomy;
mod uploads;

pub use account::AccountStore;
pub use comments::CommentStore;
pub use reader::ReaderStore;
pub use taxonomy::TaxonomyStore;
pub use uploads::UploadStore;
