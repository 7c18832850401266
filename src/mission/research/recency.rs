//! 时效闸门 - 为查询附加近期时间窗口，并判断文本是否足够新
//!
//! 判定是纯词法的启发式：只看文本里是否出现近三个月的“月份 年份”，
//! 或同时出现当年年份与 "new"/"launch"。误判风险属于已接受的取舍。

use chrono::{Datelike, Local, Months, NaiveDate};

/// 近期时间窗口，全部相对于“当前”日期计算
#[derive(Debug, Clone, PartialEq)]
pub struct RecencyWindow {
    /// 最近三个月的 "Month YYYY"，由近及远
    pub recent: Vec<String>,
    pub current_year: String,
    /// 三个月前的 "Month YYYY"
    pub cutoff: String,
}

impl RecencyWindow {
    pub fn now() -> Self {
        Self::at(Local::now().date_naive())
    }

    pub fn at(date: NaiveDate) -> Self {
        let month_start = date.with_day(1).unwrap_or(date);
        let label = |months_back: u32| {
            month_start
                .checked_sub_months(Months::new(months_back))
                .unwrap_or(month_start)
                .format("%B %Y")
                .to_string()
        };

        Self {
            recent: (0..3).map(label).collect(),
            current_year: date.year().to_string(),
            cutoff: label(3),
        }
    }

    pub fn cutoff_label(&self) -> String {
        self.cutoff.clone()
    }

    /// 报告中展示的时间范围，如 "August 2026 - October 2026"
    pub fn range_label(&self) -> String {
        format!(
            "{} - {}",
            self.recent.last().map(String::as_str).unwrap_or_default(),
            self.recent.first().map(String::as_str).unwrap_or_default()
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Clock {
    #[default]
    System,
    Fixed(NaiveDate),
}

/// 时效闸门
#[derive(Debug, Clone, Default)]
pub struct RecencyGate {
    clock: Clock,
}

impl RecencyGate {
    /// 使用系统时钟，每次调用时重新计算窗口
    pub fn new() -> Self {
        Self::default()
    }

    /// 固定“当前”日期
    pub fn fixed(date: NaiveDate) -> Self {
        Self {
            clock: Clock::Fixed(date),
        }
    }

    pub fn window(&self) -> RecencyWindow {
        match self.clock {
            Clock::System => RecencyWindow::now(),
            Clock::Fixed(date) => RecencyWindow::at(date),
        }
    }

    /// 为查询追加近期限定与排除条件
    pub fn qualify(&self, query: &str) -> String {
        let window = self.window();
        format!(
            "{} since {} (exclude before {})",
            query, window.recent[0], window.cutoff
        )
    }

    pub fn is_recent(&self, text: &str) -> bool {
        let window = self.window();
        let lower = text.to_lowercase();
        if window
            .recent
            .iter()
            .any(|label| lower.contains(&label.to_lowercase()))
        {
            return true;
        }
        lower.contains(&window.current_year) && (lower.contains("new") || lower.contains("launch"))
    }
}
