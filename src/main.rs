use anyhow::Result;
use course_creation::{logger, App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logger::init();

    // 加载配置
    let config = Config::from_env();

    // 初始化并运行应用
    let summary = App::initialize(config)?.run().await?;

    if summary.failed > 0 {
        anyhow::bail!("{} 门课程发布失败", summary.failed);
    }

    Ok(())
}
