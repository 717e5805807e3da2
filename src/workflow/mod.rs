pub mod chapter_step;
pub mod context;
pub mod course_step;
pub mod module_step;
pub mod review_step;
pub mod validation;

pub use chapter_step::ChapterStep;
pub use context::{StepOutcome, WizardContext};
pub use course_step::{CourseForm, CourseStep};
pub use module_step::{ModuleForm, ModuleStep};
pub use review_step::{format_duration, ReviewStep, ReviewSummary};
