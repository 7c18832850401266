use crate::config::{Config, LLMProvider};
use crate::scheduler::Frequency;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod commands;

/// 默认配置文件名，位于当前工作目录
pub const DEFAULT_CONFIG_FILE: &str = "signl.toml";

/// Signl - 由Rust驱动的自主竞争情报引擎
#[derive(Parser, Debug)]
#[command(name = "signl")]
#[command(
    about = "Autonomous competitive-intelligence engine. Runs time-boxed research missions against your competitors and compiles a strategic dossier."
)]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// 配置文件路径
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 是否启用详细日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// LLM Provider (openai, deepseek, openrouter, anthropic, ollama)
    #[arg(long, global = true)]
    pub llm_provider: Option<String>,

    /// LLM API基地址
    #[arg(long, global = true)]
    pub llm_api_base_url: Option<String>,

    /// LLM API KEY
    #[arg(long, global = true)]
    pub llm_api_key: Option<String>,

    /// 战略推理模型
    #[arg(long, global = true)]
    pub model: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 执行一次情报任务
    Run {
        /// 任务上下文文件（JSON）
        #[arg(short, long)]
        mission: PathBuf,

        /// 任务时长（分钟）
        #[arg(short, long)]
        duration: Option<u64>,

        /// 报告输出目录
        #[arg(short, long)]
        output_path: Option<PathBuf>,

        /// 不通过邮件投递报告
        #[arg(long)]
        no_email: bool,
    },

    /// 启动周期任务调度器
    Schedule {
        /// 周期任务存储文件
        #[arg(short, long)]
        jobs: Option<PathBuf>,
    },

    /// 管理周期任务
    Jobs {
        /// 周期任务存储文件
        #[arg(short, long)]
        jobs: Option<PathBuf>,

        #[command(subcommand)]
        action: JobsAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum JobsAction {
    /// 新建周期任务
    Add {
        #[arg(short, long, default_value = "default_user")]
        user: String,

        /// 竞争对手名称
        #[arg(short, long)]
        target: String,

        /// 竞争对手网址
        #[arg(long)]
        url: Option<String>,

        /// 模板ID
        #[arg(long)]
        template: String,

        /// 报告接收邮箱
        #[arg(short, long)]
        email: String,

        /// 需要额外验证的问题
        #[arg(short, long)]
        query: Option<String>,

        /// 执行频率 (DAILY_MORNING, WEEKLY_MONDAY, WEEKLY_FRIDAY, MONTHLY_1ST)
        #[arg(short, long)]
        frequency: Option<Frequency>,
    },

    /// 列出用户的周期任务
    List {
        #[arg(short, long, default_value = "default_user")]
        user: String,
    },

    /// 删除周期任务
    Remove {
        id: String,

        #[arg(short, long, default_value = "default_user")]
        user: String,
    },

    /// 列出内置模板
    Templates,
}

/// 加载配置：显式路径优先，其次是工作目录下的默认文件，都没有时使用默认值
pub fn load_config(explicit: Option<&PathBuf>, working_dir: &Path) -> Result<Config> {
    if let Some(path) = explicit {
        return Config::from_file(path)
            .context(format!("无法读取配置文件 {:?}", path));
    }

    let default_path = working_dir.join(DEFAULT_CONFIG_FILE);
    if default_path.exists() {
        Config::from_file(&default_path)
            .context(format!("无法读取默认配置文件 {:?}", default_path))
    } else {
        Ok(Config::default())
    }
}

impl Args {
    /// 将CLI参数转换为配置
    pub fn to_config(&self) -> Result<Config> {
        let working_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let config = load_config(self.config.as_ref(), &working_dir)?;
        Ok(self.apply_overrides(config))
    }

    /// 命令行参数覆盖配置文件中的设置
    pub fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(provider_str) = &self.llm_provider {
            if let Ok(provider) = provider_str.parse::<LLMProvider>() {
                config.llm.provider = provider;
            } else {
                eprintln!(
                    "⚠️ 警告: 未知的provider: {}，使用配置中的provider",
                    provider_str
                );
            }
        }
        if let Some(api_base_url) = &self.llm_api_base_url {
            config.llm.api_base_url = api_base_url.clone();
        }
        if let Some(api_key) = &self.llm_api_key {
            config.llm.api_key = api_key.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if self.verbose {
            config.verbose = true;
        }

        match &self.command {
            Command::Run {
                duration,
                output_path,
                no_email,
                ..
            } => {
                if let Some(minutes) = duration {
                    config.mission.duration_minutes = *minutes;
                }
                if let Some(path) = output_path {
                    config.delivery.output_path = path.clone();
                }
                if *no_email {
                    config.delivery.send_email = false;
                }
            }
            Command::Schedule { jobs } | Command::Jobs { jobs, .. } => {
                if let Some(path) = jobs {
                    config.scheduler.jobs_path = path.clone();
                }
            }
        }

        config
    }
}
