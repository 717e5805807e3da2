//! 表单校验
//!
//! 返回空列表表示通过，否则返回可直接展示给用户的错误文本。

use crate::models::course::{ChapterFields, CourseDetails};
use crate::models::upload::FileSource;

pub const TITLE_MIN: usize = 3;
pub const TITLE_MAX: usize = 100;
pub const SHORT_DESCRIPTION_MIN: usize = 10;
pub const SHORT_DESCRIPTION_MAX: usize = 200;
pub const DESCRIPTION_MIN: usize = 20;
pub const DESCRIPTION_MAX: usize = 5000;
pub const MIN_LEARNING_OUTCOMES: usize = 3;

fn char_len(s: &str) -> usize {
    s.trim().chars().count()
}

fn check_length(errors: &mut Vec<String>, label: &str, value: &str, min: usize, max: usize) {
    let len = char_len(value);
    if len == 0 {
        errors.push(format!("{} is required", label));
    } else if len < min {
        errors.push(format!("{} must be at least {} characters", label, min));
    } else if len > max {
        errors.push(format!("{} must be at most {} characters", label, max));
    }
}

/// 非空的学习成果条数
pub fn count_learning_outcomes(details: &CourseDetails) -> usize {
    details
        .metadata
        .learning_outcomes
        .iter()
        .filter(|s| !s.trim().is_empty())
        .count()
}

/// 课程表单校验
pub fn validate_course(details: &CourseDetails, thumbnail: Option<&FileSource>) -> Vec<String> {
    let mut errors = Vec::new();

    check_length(&mut errors, "Title", &details.title, TITLE_MIN, TITLE_MAX);
    check_length(
        &mut errors,
        "Short description",
        &details.short_description,
        SHORT_DESCRIPTION_MIN,
        SHORT_DESCRIPTION_MAX,
    );
    check_length(
        &mut errors,
        "Description",
        &details.description,
        DESCRIPTION_MIN,
        DESCRIPTION_MAX,
    );

    if !details.price.is_finite() || details.price < 0.0 {
        errors.push("Price must be a non-negative number".to_string());
    }

    if details.token_to_pay_with.iter().all(|t| t.trim().is_empty()) {
        errors.push("Please select at least one payment token".to_string());
    }

    if !(0.0..=100.0).contains(&details.affiliate_percentage) {
        errors.push("Affiliate percentage must be between 0 and 100".to_string());
    }

    if details.access_duration == Some(0) {
        errors.push("Access duration must be at least 1 day".to_string());
    }

    match thumbnail {
        Some(file) if !file.is_image() => {
            errors.push("Thumbnail must be an image file".to_string());
        }
        Some(_) => {}
        None if details.thumbnail_url.is_some() => {}
        None => errors.push("Please upload a thumbnail".to_string()),
    }

    let outcomes = count_learning_outcomes(details);
    if outcomes < MIN_LEARNING_OUTCOMES {
        errors.push(format!(
            "Please add at least {} learning outcomes ({} provided)",
            MIN_LEARNING_OUTCOMES, outcomes
        ));
    }

    errors
}

/// 预览视频必须是视频文件
pub fn validate_preview_video(preview: Option<&FileSource>) -> Vec<String> {
    match preview {
        Some(file) if !file.is_video() => vec!["Preview must be a video file".to_string()],
        _ => Vec::new(),
    }
}

/// 章节表单校验
pub fn validate_chapter(fields: &ChapterFields) -> Vec<String> {
    let mut errors = Vec::new();
    if fields.title.trim().is_empty() {
        errors.push("Chapter title is required".to_string());
    }
    if fields.description.trim().is_empty() {
        errors.push("Chapter description is required".to_string());
    }
    errors
}

/// 模块表单校验
pub fn validate_module(
    title: &str,
    duration: i64,
    has_main_file: bool,
    attachment_count: usize,
    max_attachments: usize,
) -> Vec<String> {
    let mut errors = Vec::new();

    check_length(&mut errors, "Module title", title, TITLE_MIN, TITLE_MAX);

    if duration < 0 {
        errors.push("Duration cannot be negative".to_string());
    } else if duration > i64::from(u32::MAX) {
        errors.push("Duration is too large".to_string());
    }

    if !has_main_file {
        errors.push("Please upload the main file for this module".to_string());
    }

    if attachment_count > max_attachments {
        errors.push(format!(
            "You can attach at most {} files ({} selected)",
            max_attachments, attachment_count
        ));
    }

    errors
}
