/// Upload tracking module
///
/// The client-side slice of the pipeline: upload raw bytes, keep a local
/// view of every upload in flight, and mirror record changes into that view
/// by matching on the original image URL.
pub mod listener;
pub mod tracker;
pub mod uploader;

pub use listener::ChangeListener;
pub use tracker::{UploadTracker, UploadView};
pub use uploader::Uploader;
