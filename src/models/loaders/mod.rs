pub mod toml_loader;

pub use toml_loader::{
    load_all_manifests, load_course_manifest, parse_course_manifest, CourseManifest,
    ManifestChapter, ManifestModule,
};
