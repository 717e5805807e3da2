pub mod course_client;
pub mod session;
pub mod upload_client;

pub use course_client::{CourseApi, HttpCourseClient};
pub use session::{SessionHandler, TokenManager};
pub use upload_client::{HttpUploader, ProgressCallback, Uploader};
