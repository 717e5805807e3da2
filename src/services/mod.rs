pub mod library_service;
pub mod notifier;
pub mod upload_progress;
pub mod upload_service;

pub use library_service::LibraryService;
pub use notifier::{Destination, LogNotifier, Navigator, Notifier, Toast, ToastKind};
pub use upload_progress::{status_message, ProgressBoard};
pub use upload_service::{UploadRequest, UploadService};
