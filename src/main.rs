use anyhow::Result;
use shareholder_import::{logger, App, Config};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logger::init();

    // 加载配置：IMPORT_CONFIG 指向 TOML 文件时优先使用
    let config = match std::env::var("IMPORT_CONFIG") {
        Ok(path) => Config::from_toml_file(Path::new(&path))?,
        Err(_) => Config::from_env(),
    };

    // 初始化并运行应用
    let _snapshot = App::initialize(config).await?.run().await?;

    Ok(())
}
