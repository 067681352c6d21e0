use std::path::Path;

use clipfarm_media::check_ffmpeg;
use clipfarm_store::db;
use clipfarm_twitch::TwitchConfig;
use clipfarm_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = WorkerConfig::from_env();

    println!(
        "clipfarm-selfcheck: starting with work_dir={}",
        config.work_dir.display()
    );
    ensure_workdir(&config.work_dir).await?;
    ensure_ffmpeg(&config.ffmpeg_path)?;
    ensure_env_present(&["TWITCH_CLIENT_ID", "TWITCH_CLIENT_SECRET"])?;
    TwitchConfig::from_env()?;
    ensure_database(&config.database_url).await?;

    println!("clipfarm-selfcheck: ok");
    Ok(())
}

async fn ensure_workdir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}

fn ensure_ffmpeg(program: &Path) -> anyhow::Result<()> {
    let resolved = check_ffmpeg(program)?;
    let output = std::process::Command::new(&resolved)
        .arg("-version")
        .output()
        .map_err(|e| anyhow::anyhow!("ffmpeg not available: {}", e))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!(
            "ffmpeg -version failed: {:?}",
            output.status
        ));
    }
    Ok(())
}

fn ensure_env_present(vars: &[&str]) -> anyhow::Result<()> {
    for var in vars {
        if std::env::var(var).is_err() {
            return Err(anyhow::anyhow!("missing required env var {}", var));
        }
    }
    Ok(())
}

async fn ensure_database(url: &str) -> anyhow::Result<()> {
    let pool = db::connect(url, 1).await?;
    db::migrate(&pool).await?;
    pool.close().await;
    Ok(())
}
