use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Days, Local, Months, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::mission::execute_mission;
use crate::types::mission::MissionContext;

pub mod store;
pub mod templates;

pub use store::{JobStore, NewJob};
pub use templates::{RECURRING_TEMPLATES, RecurringTemplate, build_mission_context, find_template};

/// 周期任务的执行时刻（本地时间）
const RUN_HOUR: u32 = 9;

/// 周期任务频率
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Frequency {
    #[serde(rename = "DAILY_MORNING")]
    #[default]
    DailyMorning,
    #[serde(rename = "WEEKLY_MONDAY")]
    WeeklyMonday,
    #[serde(rename = "WEEKLY_FRIDAY")]
    WeeklyFriday,
    #[serde(rename = "MONTHLY_1ST")]
    Monthly1st,
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Frequency::DailyMorning => write!(f, "DAILY_MORNING"),
            Frequency::WeeklyMonday => write!(f, "WEEKLY_MONDAY"),
            Frequency::WeeklyFriday => write!(f, "WEEKLY_FRIDAY"),
            Frequency::Monthly1st => write!(f, "MONTHLY_1ST"),
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "DAILY_MORNING" => Ok(Frequency::DailyMorning),
            "WEEKLY_MONDAY" => Ok(Frequency::WeeklyMonday),
            "WEEKLY_FRIDAY" => Ok(Frequency::WeeklyFriday),
            "MONTHLY_1ST" => Ok(Frequency::Monthly1st),
            _ => Err(format!("Unknown frequency: {}", s)),
        }
    }
}

/// 订阅者的周期任务
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecurringJob {
    pub id: String,
    pub user_id: String,
    pub target_name: String,
    pub target_url: String,
    pub template_id: String,
    pub user_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_query: Option<String>,
    pub frequency: Frequency,
    pub next_run: DateTime<chrono::Utc>,
}

impl RecurringJob {
    pub fn mission_id(&self) -> String {
        format!("RECURRING-{}", self.id)
    }
}

/// 距离下一个指定星期几的天数，当天不算（0=周日）
fn days_until(today: u32, target: u32) -> u64 {
    match (target + 7 - today) % 7 {
        0 => 7,
        n => n as u64,
    }
}

fn next_run_date(frequency: Frequency, today: NaiveDate) -> Option<NaiveDate> {
    let weekday = today.weekday().num_days_from_sunday();
    match frequency {
        Frequency::DailyMorning => today.checked_add_days(Days::new(1)),
        Frequency::WeeklyMonday => today.checked_add_days(Days::new(days_until(weekday, 1))),
        Frequency::WeeklyFriday => today.checked_add_days(Days::new(days_until(weekday, 5))),
        Frequency::Monthly1st => today
            .with_day(1)?
            .checked_add_months(Months::new(1)),
    }
}

/// 计算下一次执行的本地时刻（不含时区）
pub fn next_run_naive(frequency: Frequency, now: NaiveDateTime) -> Option<NaiveDateTime> {
    next_run_date(frequency, now.date())?.and_hms_opt(RUN_HOUR, 0, 0)
}

/// 计算下一次执行时刻；本地时间不存在时（夏令时跳变）退回到24小时之后
pub fn next_run_at(frequency: Frequency, now: DateTime<Local>) -> DateTime<Local> {
    next_run_naive(frequency, now.naive_local())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .unwrap_or_else(|| now + chrono::Duration::days(1))
}

/// 下一次执行时刻的 ISO-8601 表示
pub fn calculate_next_run(frequency: Frequency, now: DateTime<Local>) -> String {
    next_run_at(frequency, now).to_rfc3339_opts(SecondsFormat::Millis, false)
}

/// 周期任务的执行入口
#[async_trait]
pub trait MissionLauncher: Send + Sync {
    async fn launch(&self, mission_id: &str, context: MissionContext) -> Result<()>;
}

/// 使用应用配置装配真实服务执行任务
pub struct ConfiguredLauncher {
    config: Config,
}

impl ConfiguredLauncher {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl MissionLauncher for ConfiguredLauncher {
    async fn launch(&self, mission_id: &str, context: MissionContext) -> Result<()> {
        let duration = Duration::from_secs(self.config.mission.duration_minutes * 60);
        let outcome = execute_mission(&self.config, mission_id, &context, duration).await?;
        info!(
            "📨 周期任务 {} 完成: {} 条情报, 已投递: {}",
            mission_id, outcome.findings, outcome.delivered
        );
        Ok(())
    }
}

/// 依次执行所有到期任务，返回成功执行的数量
///
/// 单个任务失败只记录日志，不会重新排期，下次扫描时会再次执行。
pub async fn run_due_jobs(
    store: &JobStore,
    launcher: &dyn MissionLauncher,
    now: DateTime<Local>,
) -> Result<usize> {
    let due = store.due_jobs(now.with_timezone(&chrono::Utc)).await?;
    if due.is_empty() {
        return Ok(0);
    }
    info!("⏰ 发现 {} 个到期的周期任务", due.len());

    let mut completed = 0;
    for job in due {
        let Some(template) = find_template(&job.template_id) else {
            error!("❌ 周期任务 {} 引用了未知模板: {}", job.id, job.template_id);
            continue;
        };

        let context = build_mission_context(&job, template);
        let mission_id = job.mission_id();
        info!("🚀 执行周期任务 {} ({})", mission_id, job.target_name);

        if let Err(e) = launcher.launch(&mission_id, context).await {
            error!("❌ 周期任务 {} 执行失败: {:#}", job.id, e);
            continue;
        }

        let next_run = next_run_at(job.frequency, Local::now());
        if let Err(e) = store
            .update_after_run(&job.id, next_run.with_timezone(&chrono::Utc))
            .await
        {
            warn!("⚠️ 周期任务 {} 更新排期失败: {:#}", job.id, e);
        }
        completed += 1;
    }

    Ok(completed)
}

/// 启动周期任务扫描，直到进程退出
pub async fn start_scheduler(config: &Config) -> Result<()> {
    let store = JobStore::new(config.scheduler.jobs_path.clone());
    let launcher = ConfiguredLauncher::new(config.clone());
    let period = Duration::from_secs(config.scheduler.sweep_interval_seconds.max(1));

    info!(
        "⏰ 调度器已启动，任务文件: {:?}，扫描间隔: {}秒",
        store.path(),
        period.as_secs()
    );

    let mut ticker = tokio::time::interval(period);
    loop {
        ticker.tick().await;
        if let Err(e) = run_due_jobs(&store, &launcher, Local::now()).await {
            error!("❌ 周期任务扫描失败: {:#}", e);
        }
    }
}
