pub mod error;
pub mod model;

pub use error::{AppError, RemoteErrorKind};
pub use model::{Catalog, EncodingLabel, FormatCatalog, MediaInfo, SavedFile, VideoReference};
