use anyhow::Result;
use chrono::Local;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::capability::{
    CapabilityClient, CapabilityRegistry, GatewayTool, McpGateway, SocialSearchClient,
};
use crate::config::Config;
use crate::llm::client::LLMClient;
use crate::memory::{GraphMemory, KnowledgeGraph, McpGraphMemory};
use crate::mission::analysis::{CriticalPathAnalyzer, RecommendationSynthesizer};
use crate::mission::context::{MissionMetrics, MissionPhase, MissionServices, ResearchState};
use crate::mission::outlet::{
    DiskOutlet, McpEmailDelivery, ReportCompiler, ReportDelivery, email_subject,
};
use crate::mission::research::{DeepResearchOrchestrator, RecencyGate};
use crate::mission::sandbox::{StaticSandboxProvider, with_sandbox};
use crate::types::mission::{MissionContext, MissionError};

/// 阶段计时
pub struct TimingScope {
    start_time: Instant,
    phase_start_times: HashMap<MissionPhase, Instant>,
    phase_durations: Vec<(MissionPhase, Duration)>,
}

impl Default for TimingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingScope {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            phase_start_times: HashMap::new(),
            phase_durations: Vec::new(),
        }
    }

    /// 开始一个新的阶段计时
    pub fn start_phase(&mut self, phase: MissionPhase) {
        self.phase_start_times.insert(phase, Instant::now());
    }

    /// 结束一个阶段的计时
    pub fn end_phase(&mut self, phase: MissionPhase) -> Option<Duration> {
        let duration = self.phase_start_times.remove(&phase)?.elapsed();
        self.phase_durations.push((phase, duration));
        Some(duration)
    }

    /// 获取格式化的执行时间报告
    pub fn generate_timing_report(&self) -> String {
        let mut report = format!(
            "总执行时间: {:.2}秒",
            self.start_time.elapsed().as_secs_f64()
        );
        for (phase, duration) in &self.phase_durations {
            report.push_str(&format!("\n- {}: {:.3}秒", phase, duration.as_secs_f64()));
        }
        report
    }
}

/// 一次任务的结果
#[derive(Debug, Clone)]
pub struct MissionOutcome {
    pub mission_id: String,
    pub html: String,
    /// 落盘失败时为空
    pub report_path: Option<PathBuf>,
    pub findings: usize,
    pub recommendations: Vec<String>,
    pub metrics: MissionMetrics,
    /// 报告是否已成功投递
    pub delivered: bool,
}

/// 在给定服务上执行完整任务：研究 → 分析 → 建议 → 报告
pub async fn run_mission(
    services: &MissionServices,
    config: &Config,
    mission_id: &str,
    context: &MissionContext,
    duration: Duration,
) -> Result<MissionOutcome> {
    context.validate()?;
    info!("🚀 任务 {} 启动（{} 分钟）", mission_id, duration.as_secs() / 60);

    let mut state = ResearchState::new();
    let mut timing = TimingScope::new();
    let graph = KnowledgeGraph::new(services.graph.clone());

    // 研究阶段：按竞争对手依次进行
    timing.start_phase(MissionPhase::Research);
    let competitors: Vec<String> = context.competitors().map(str::to_string).collect();
    let budget = duration / competitors.len() as u32;
    let mut orchestrator = DeepResearchOrchestrator::new(
        services.provider.clone(),
        graph.clone(),
        RecencyGate::new(),
        Duration::from_millis(config.mission.pacing_ms),
    );
    for competitor in &competitors {
        orchestrator
            .run(competitor, &config.mission.initial_focus, budget, &mut state)
            .await?;
    }
    timing.end_phase(MissionPhase::Research);

    // 分析阶段
    state.enter(MissionPhase::Analysis);
    timing.start_phase(MissionPhase::Analysis);
    let analyzer = CriticalPathAnalyzer::new(graph);
    let mut path = analyzer
        .analyze(
            &state.findings,
            &context.targets.specific_questions_for_agent,
            &mut state.metrics,
        )
        .await;
    timing.end_phase(MissionPhase::Analysis);

    // 建议合成
    state.enter(MissionPhase::Synthesis);
    timing.start_phase(MissionPhase::Synthesis);
    let synthesizer = RecommendationSynthesizer::new(
        services.reasoning.clone(),
        services.thinking_available,
        config.mission.max_dialogue_steps,
    );
    path.recommendations = synthesizer
        .synthesize(
            &context.company.name,
            context.primary_competitor(),
            &path.critical_findings,
            &mut state.metrics,
        )
        .await;
    timing.end_phase(MissionPhase::Synthesis);

    // 报告
    state.enter(MissionPhase::Report);
    timing.start_phase(MissionPhase::Report);
    let html = ReportCompiler.compile(context, &path, &state, Local::now().date_naive());
    let report_path = match DiskOutlet::new(&config.delivery.output_path).save(mission_id, &html) {
        Ok(path) => Some(path),
        Err(e) => {
            warn!("⚠️ 报告落盘失败: {:#}", e);
            None
        }
    };
    let delivered = match &services.delivery {
        Some(delivery) => deliver(delivery.as_ref(), context, &html).await,
        None => false,
    };
    timing.end_phase(MissionPhase::Report);

    log_summary(mission_id, &state, &timing);

    Ok(MissionOutcome {
        mission_id: mission_id.to_string(),
        html,
        report_path,
        findings: state.findings.len(),
        recommendations: path.recommendations,
        metrics: state.metrics,
        delivered,
    })
}

/// 投递失败只记录日志，任务仍视为完成
async fn deliver(delivery: &dyn ReportDelivery, context: &MissionContext, html: &str) -> bool {
    let subject = email_subject(context.primary_competitor());
    match delivery
        .deliver(&context.identity.email, &subject, html)
        .await
    {
        Ok(()) => true,
        Err(e) => {
            error!("❌ 报告投递失败: {:#}", e);
            false
        }
    }
}

fn log_summary(mission_id: &str, state: &ResearchState, timing: &TimingScope) {
    let metrics = &state.metrics;
    info!("🏁 任务 {} 完成", mission_id);
    info!(
        "   Finding: {} | 迭代: {} | 能力调用: {} {:?}",
        state.findings.len(),
        state.iteration_count,
        metrics.total_tool_calls,
        metrics.calls_by_capability
    );
    info!(
        "   图谱写入: {} | 图谱读取: {} | 时效过滤: {} | 思考步数: {}",
        metrics.kg_writes, metrics.kg_reads, metrics.recency_filtered, metrics.sequential_thoughts
    );
    for line in timing.generate_timing_report().lines() {
        info!("   ⏱️ {}", line);
    }
}

/// 在独占的执行环境中装配真实服务并执行任务
pub async fn execute_mission(
    config: &Config,
    mission_id: &str,
    context: &MissionContext,
    duration: Duration,
) -> Result<MissionOutcome> {
    let sandbox = StaticSandboxProvider::from_config(&config.capabilities);
    with_sandbox(&sandbox, |handle| async move {
        let call_timeout = Duration::from_secs(config.capabilities.call_timeout_seconds);
        let gateway =
            Arc::new(McpGateway::connect(&handle.gateway_url, &handle.token, call_timeout).await?);
        let discovered = gateway.list_tools().await?;
        info!("🔧 网关发现 {} 个工具", discovered.len());

        let capabilities = &config.capabilities;
        let social = (!capabilities.social_api_key.is_empty()).then(|| {
            SocialSearchClient::new(
                &capabilities.social_base_url,
                &capabilities.social_api_key,
                &capabilities.social_model,
                call_timeout,
            )
        });
        let registry = CapabilityRegistry::from_discovered(&discovered, social.is_some());
        registry.require_all()?;

        let graph: Arc<dyn GraphMemory> = Arc::new(McpGraphMemory::new(gateway.clone()));

        let delivery: Option<Arc<dyn ReportDelivery>> = if config.delivery.send_email {
            registry.tool_name(GatewayTool::SendEmail).map(|name| {
                Arc::new(McpEmailDelivery::new(gateway.clone(), name)) as Arc<dyn ReportDelivery>
            })
        } else {
            None
        };

        let services = MissionServices {
            provider: Arc::new(CapabilityClient::new(gateway.clone(), registry.clone(), social)),
            graph,
            reasoning: Arc::new(LLMClient::new(config.llm.clone())?),
            delivery,
            thinking_available: registry.has_thinking(),
        };

        run_mission(&services, config, mission_id, context, duration).await
    })
    .await
}

/// 校验输入并在后台启动任务，立即返回任务ID
///
/// 供嵌入方（如HTTP服务）调用的库接口，`signl` 命令行直接使用 [`execute_mission`]。
/// 并发任务数没有上限。
pub fn trigger_mission(
    config: Config,
    context: MissionContext,
    duration: Duration,
) -> Result<Uuid, MissionError> {
    context.validate()?;
    let mission_id = Uuid::new_v4();

    tokio::spawn(async move {
        let id = mission_id.to_string();
        if let Err(e) = execute_mission(&config, &id, &context, duration).await {
            error!("❌ 任务 {} 失败: {:#}", id, e);
        }
    });

    Ok(mission_id)
}
