use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::cli::{Command, JobsAction};
use crate::config::Config;
use crate::mission::execute_mission;
use crate::scheduler::{JobStore, NewJob, RECURRING_TEMPLATES, start_scheduler};
use crate::types::mission::MissionContext;

/// 读取并校验任务上下文文件
pub fn read_mission_context(path: &Path) -> Result<MissionContext> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read mission file: {:?}", path))?;
    let context: MissionContext =
        serde_json::from_str(&content).context("Failed to parse mission file")?;
    context.validate()?;
    Ok(context)
}

pub async fn execute(command: Command, config: Config) -> Result<()> {
    match command {
        Command::Run { mission, .. } => run(&mission, &config).await,
        Command::Schedule { .. } => schedule(&config).await,
        Command::Jobs { action, .. } => {
            let store = JobStore::new(config.scheduler.jobs_path.clone());
            jobs(action, &store).await
        }
    }
}

async fn run(mission: &Path, config: &Config) -> Result<()> {
    let context = read_mission_context(mission)?;
    let mission_id = Uuid::new_v4().to_string();
    let duration = Duration::from_secs(config.mission.duration_minutes * 60);

    info!(
        "🚀 任务 {} 启动: {} vs {}",
        mission_id,
        context.company.name,
        context.competitors().collect::<Vec<_>>().join(", ")
    );

    let outcome = execute_mission(config, &mission_id, &context, duration).await?;
    match &outcome.report_path {
        Some(path) => println!("📄 Report saved to {}", path.display()),
        None => println!("⚠️ Report was not saved to disk"),
    }
    Ok(())
}

async fn schedule(config: &Config) -> Result<()> {
    tokio::select! {
        result = start_scheduler(config) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("👋 调度器已停止");
            Ok(())
        }
    }
}

pub async fn jobs(action: JobsAction, store: &JobStore) -> Result<()> {
    match action {
        JobsAction::Add {
            user,
            target,
            url,
            template,
            email,
            query,
            frequency,
        } => {
            let job = store
                .create(NewJob {
                    user_id: user,
                    target_name: target,
                    target_url: url,
                    template_id: template,
                    user_email: email,
                    custom_query: query,
                    frequency,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&job)?);
        }
        JobsAction::List { user } => {
            let jobs = store.list_by_user(&user).await?;
            println!("{}", serde_json::to_string_pretty(&jobs)?);
        }
        JobsAction::Remove { id, user } => {
            if store.delete(&id, &user).await? {
                println!("Deleted job {}", id);
            } else {
                anyhow::bail!("Job {} not found for user {}", id, user);
            }
        }
        JobsAction::Templates => {
            for template in RECURRING_TEMPLATES.iter() {
                println!("{:<16} {:<18} {}", template.id, template.name, template.description);
            }
        }
    }
    Ok(())
}
