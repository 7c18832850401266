//! 报告输出 - 落盘与外部投递

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::capability::McpGateway;

pub mod report;

pub use report::ReportCompiler;

/// 报告投递渠道
#[async_trait]
pub trait ReportDelivery: Send + Sync {
    async fn deliver(&self, recipient: &str, subject: &str, html: &str) -> Result<()>;
}

/// 邮件主题
pub fn email_subject(primary_competitor: &str) -> String {
    format!("[SIGNL] Strategic Dossier: {}", primary_competitor)
}

/// 通过网关上的邮件工具投递
pub struct McpEmailDelivery {
    gateway: Arc<McpGateway>,
    tool_name: String,
}

impl McpEmailDelivery {
    pub fn new(gateway: Arc<McpGateway>, tool_name: impl Into<String>) -> Self {
        Self {
            gateway,
            tool_name: tool_name.into(),
        }
    }
}

#[async_trait]
impl ReportDelivery for McpEmailDelivery {
    async fn deliver(&self, recipient: &str, subject: &str, html: &str) -> Result<()> {
        info!("💌 正在发送报告至 {}...", recipient);
        self.gateway
            .call_tool(
                &self.tool_name,
                json!({
                    "to": recipient,
                    "subject": subject,
                    "html": html,
                    "text": "Your SIGNL Report is ready.",
                }),
            )
            .await
            .context("email delivery failed")?;
        info!("✅ 报告已发送");
        Ok(())
    }
}

/// 报告落盘
pub struct DiskOutlet {
    output_dir: PathBuf,
}

impl DiskOutlet {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// 保存为 `{mission_id}.html`，返回文件路径
    pub fn save(&self, mission_id: &str, html: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create output dir: {}", self.output_dir.display())
        })?;
        let path = self.report_path(mission_id);
        fs::write(&path, html)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        info!("💾 已保存报告: {}", path.display());
        Ok(path)
    }

    pub fn report_path(&self, mission_id: &str) -> PathBuf {
        Path::new(&self.output_dir).join(format!("{}.html", mission_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_email_subject() {
        assert_eq!(email_subject("Pinecone"), "[SIGNL] Strategic Dossier: Pinecone");
    }

    #[test]
    fn test_disk_outlet_creates_directory_and_file() {
        let temp_dir = TempDir::new().unwrap();
        let outlet = DiskOutlet::new(temp_dir.path().join("reports"));

        let path = outlet.save("mission-1", "<html></html>").unwrap();

        assert_eq!(path, temp_dir.path().join("reports").join("mission-1.html"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<html></html>");
    }
}
