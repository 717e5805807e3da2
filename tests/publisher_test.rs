mod support;

use std::path::PathBuf;

use course_creation::models::loaders::{load_all_manifests, load_course_manifest};
use course_creation::models::course::ModuleType;
use course_creation::orchestrator::{publish_course, App};
use course_creation::services::Destination;

use support::*;

const MANIFEST: &str = r#"
thumbnail = "cover.png"
preview_video = "trailer.mp4"
review_note = "First release"

[course]
title = "Async Rust in Practice"
short_description = "Learn tokio by building services"
description = "A hands-on course that walks through futures, tasks and channels."
price = 49.0
token_to_pay_with = ["USDC"]

[course.metadata]
learning_outcomes = ["Write async code", "Use tokio", "Test services"]

[[chapters]]
title = "Getting started"
description = "Setting up the toolchain"

[[chapters.modules]]
title = "Installing Rust"
duration = 12
is_preview = true
file = "install.mp4"
attachments = ["install.pdf"]

[[chapters]]
title = "Tasks"
description = "Spawning and joining"

[[chapters.modules]]
title = "Spawning tasks"
duration = 20
file = "spawn.pdf"
"#;

/// 在临时目录中写入清单和它引用的文件
async fn write_fixture(files: &[&str]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("course-manifest-{}", uuid::Uuid::new_v4()));
    tokio::fs::create_dir_all(&dir).await.unwrap();
    for name in files {
        tokio::fs::write(dir.join(name), vec![7u8; 1024]).await.unwrap();
    }
    tokio::fs::write(dir.join("async.toml"), MANIFEST).await.unwrap();
    dir
}

#[tokio::test]
async fn test_publish_course_runs_every_step() {
    let dir = write_fixture(&["cover.png", "trailer.mp4", "install.mp4", "install.pdf", "spawn.pdf"]).await;
    let manifest = load_course_manifest(&dir.join("async.toml")).await.unwrap();
    let h = harness();

    let stats = publish_course(&h.ctx, manifest, 1).await.unwrap();

    assert_eq!(stats.chapters, 2);
    assert_eq!(stats.modules, 2);
    assert_eq!(h.api.call_count("create_course"), 1);
    assert_eq!(h.api.call_count("create_chapter"), 2);
    assert_eq!(h.api.call_count("create_module"), 2);
    assert_eq!(h.api.call_count("submit_for_review"), 1);

    let modules = h.api.module_requests.lock().unwrap().clone();
    assert_eq!(modules[0].module_type, ModuleType::Video);
    assert_eq!(modules[0].attachments.len(), 1);
    assert_eq!(modules[1].module_type, ModuleType::Document);

    let note = h.api.review_requests.lock().unwrap()[0].note.clone();
    assert_eq!(note.as_deref(), Some("First release"));
    assert_eq!(h.ui.redirects(), vec![Destination::MyCourses]);

    tokio::fs::remove_dir_all(dir).await.unwrap();
}

#[tokio::test]
async fn test_missing_module_file_stops_publishing() {
    let dir = write_fixture(&["cover.png", "trailer.mp4"]).await;
    let manifest = load_course_manifest(&dir.join("async.toml")).await.unwrap();
    let h = harness();

    // 课程本身可以创建，模块文件缺失时停止
    let result = publish_course(&h.ctx, manifest, 1).await;

    assert!(result.is_err());
    assert_eq!(h.api.call_count("create_module"), 0);
    assert_eq!(h.api.call_count("submit_for_review"), 0);

    tokio::fs::remove_dir_all(dir).await.unwrap();
}

#[tokio::test]
async fn test_app_counts_success_and_failure() {
    let good = write_fixture(&["cover.png", "trailer.mp4", "install.mp4", "install.pdf", "spawn.pdf"]).await;
    let bad = write_fixture(&[]).await;

    let mut manifests = load_all_manifests(good.to_str().unwrap()).await.unwrap();
    manifests.extend(load_all_manifests(bad.to_str().unwrap()).await.unwrap());
    assert_eq!(manifests.len(), 2);

    let h = harness();
    let summary = App::with_context(h.ctx.clone())
        .publish_all(manifests)
        .await
        .unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(summary.success, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.modules, 2);

    tokio::fs::remove_dir_all(good).await.unwrap();
    tokio::fs::remove_dir_all(bad).await.unwrap();
}
