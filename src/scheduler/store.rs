use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::scheduler::{Frequency, RecurringJob, find_template};

const DEFAULT_TARGET_URL: &str = "https://google.com";

/// 新建周期任务的请求
#[derive(Debug, Clone, Default)]
pub struct NewJob {
    pub user_id: String,
    pub target_name: String,
    pub target_url: Option<String>,
    pub template_id: String,
    pub user_email: String,
    pub custom_query: Option<String>,
    pub frequency: Option<Frequency>,
}

/// 新建任务请求的校验错误
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum JobRequestError {
    #[error("Missing required fields: targetName, templateId and userEmail")]
    MissingFields,
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),
}

impl NewJob {
    pub fn validate(&self) -> Result<(), JobRequestError> {
        if [&self.target_name, &self.template_id, &self.user_email]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(JobRequestError::MissingFields);
        }
        if find_template(&self.template_id).is_none() {
            return Err(JobRequestError::UnknownTemplate(self.template_id.clone()));
        }
        Ok(())
    }
}

/// 基于 JSON 文件的周期任务存储
pub struct JobStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JobStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<RecurringJob>> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(Vec::new());
        }
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .context(format!("Failed to read job store: {:?}", self.path))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).context("Failed to parse job store")
    }

    async fn save(&self, jobs: &[RecurringJob]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(jobs)?;
        tokio::fs::write(&self.path, content)
            .await
            .context(format!("Failed to write job store: {:?}", self.path))
    }

    /// 新建任务，首次执行时刻为当前时间
    pub async fn create(&self, request: NewJob) -> Result<RecurringJob> {
        request.validate()?;
        let _guard = self.lock.lock().await;

        let job = RecurringJob {
            id: Uuid::new_v4().to_string(),
            user_id: request.user_id,
            target_name: request.target_name.trim().to_string(),
            target_url: request
                .target_url
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TARGET_URL.to_string()),
            template_id: request.template_id,
            user_email: request.user_email.trim().to_string(),
            custom_query: request.custom_query.filter(|q| !q.trim().is_empty()),
            frequency: request.frequency.unwrap_or_default(),
            next_run: Utc::now(),
        };

        let mut jobs = self.load().await?;
        jobs.push(job.clone());
        self.save(&jobs).await?;
        Ok(job)
    }

    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<RecurringJob>> {
        let _guard = self.lock.lock().await;
        let jobs = self.load().await?;
        Ok(jobs.into_iter().filter(|job| job.user_id == user_id).collect())
    }

    /// 只能删除属于该用户的任务，返回是否删除成功
    pub async fn delete(&self, id: &str, user_id: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut jobs = self.load().await?;
        let before = jobs.len();
        jobs.retain(|job| !(job.id == id && job.user_id == user_id));
        if jobs.len() == before {
            return Ok(false);
        }
        self.save(&jobs).await?;
        Ok(true)
    }

    pub async fn due_jobs(&self, now: DateTime<Utc>) -> Result<Vec<RecurringJob>> {
        let _guard = self.lock.lock().await;
        let jobs = self.load().await?;
        Ok(jobs.into_iter().filter(|job| job.next_run <= now).collect())
    }

    pub async fn update_after_run(&self, id: &str, next_run: DateTime<Utc>) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut jobs = self.load().await?;
        let Some(job) = jobs.iter_mut().find(|job| job.id == id) else {
            anyhow::bail!("Job not found: {}", id);
        };
        job.next_run = next_run;
        self.save(&jobs).await
    }
}
