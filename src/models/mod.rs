pub mod api;
pub mod course;
pub mod loaders;
pub mod upload;

pub use course::{
    Attachment, Chapter, ChapterFields, ChapterPatch, CourseDetails, CourseDraft, CourseLevel,
    CourseMetadata, CoursePatch, CourseStatus, EntityId, LocalId, Module, ModuleFields,
    ModulePatch, ModuleType,
};
pub use loaders::{load_all_manifests, load_course_manifest, CourseManifest};
pub use upload::{FileContent, FileSource, UploadBucket, UploadProgress, UploadedFile};
