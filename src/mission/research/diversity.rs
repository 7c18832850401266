//! 工具多样性约束 - 避免连续重复使用同一能力，并保持使用次数均衡

use crate::capability::CapabilityError;

/// 工具多样性选择器
#[derive(Debug, Clone)]
pub struct ToolDiversityEnforcer<T> {
    /// 按固定枚举顺序保存的（工具, 使用次数）
    usage: Vec<(T, u64)>,
    last_selected: Option<T>,
}

impl<T: Copy + PartialEq> ToolDiversityEnforcer<T> {
    pub fn new(known: impl IntoIterator<Item = T>) -> Self {
        Self {
            usage: known.into_iter().map(|tool| (tool, 0)).collect(),
            last_selected: None,
        }
    }

    /// 选出下一个工具：排除 `exclude` 与上一次选中的工具，取使用次数最少者
    ///
    /// 若排除上一次选中的工具后已无候选，则允许重复；
    /// 若 `exclude` 本身排除了全部工具，返回 [`CapabilityError::Exhausted`]。
    pub fn select_next(&mut self, exclude: &[T]) -> Result<T, CapabilityError> {
        let candidates: Vec<usize> = (0..self.usage.len())
            .filter(|&i| !exclude.contains(&self.usage[i].0))
            .collect();
        let fresh: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&i| Some(self.usage[i].0) != self.last_selected)
            .collect();
        let pool = if fresh.is_empty() { candidates } else { fresh };

        // min_by_key 在并列时返回第一个，即枚举顺序靠前者
        let index = pool
            .into_iter()
            .min_by_key(|&i| self.usage[i].1)
            .ok_or(CapabilityError::Exhausted)?;

        let (tool, count) = &mut self.usage[index];
        *count += 1;
        self.last_selected = Some(*tool);
        Ok(*tool)
    }

    /// 连续选出 `n` 个互不相同的工具
    pub fn select_distinct(&mut self, n: usize) -> Result<Vec<T>, CapabilityError> {
        let mut selected = Vec::with_capacity(n);
        for _ in 0..n {
            let tool = self.select_next(&selected)?;
            selected.push(tool);
        }
        Ok(selected)
    }

    pub fn usage_count(&self, tool: T) -> u64 {
        self.usage
            .iter()
            .find(|(known, _)| *known == tool)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn last_selected(&self) -> Option<T> {
        self.last_selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spread(enforcer: &ToolDiversityEnforcer<&'static str>) -> u64 {
        let counts: Vec<u64> = ["A", "B", "C"]
            .iter()
            .map(|t| enforcer.usage_count(*t))
            .collect();
        counts.iter().max().unwrap() - counts.iter().min().unwrap()
    }

    #[test]
    fn test_growing_exclusions_yield_permutation() {
        let mut enforcer = ToolDiversityEnforcer::new(["A", "B", "C"]);
        let first = enforcer.select_next(&[]).unwrap();
        let second = enforcer.select_next(&[first]).unwrap();
        let third = enforcer.select_next(&[first, second]).unwrap();

        let mut picked = vec![first, second, third];
        picked.sort();
        assert_eq!(picked, vec!["A", "B", "C"]);
        assert_eq!((first, second, third), ("A", "B", "C"));
    }

    #[test]
    fn test_no_immediate_repeat_and_balanced_usage() {
        let mut enforcer = ToolDiversityEnforcer::new(["A", "B", "C"]);
        let mut previous = None;
        for _ in 0..100 {
            let tool = enforcer.select_next(&[]).unwrap();
            assert_ne!(Some(tool), previous);
            previous = Some(tool);
            assert!(spread(&enforcer) <= 1);
        }
    }

    #[test]
    fn test_select_distinct_never_starts_with_previous_choice() {
        let mut enforcer = ToolDiversityEnforcer::new(["A", "B", "C"]);
        for _ in 0..20 {
            let last = enforcer.last_selected();
            let trio = enforcer.select_distinct(3).unwrap();
            assert_ne!(Some(trio[0]), last);
            assert_ne!(trio[0], trio[1]);
            assert_ne!(trio[1], trio[2]);
            assert_ne!(trio[0], trio[2]);
            assert_eq!(spread(&enforcer), 0);
        }
    }

    #[test]
    fn test_exhausted_when_everything_excluded() {
        let mut enforcer = ToolDiversityEnforcer::new(["A", "B"]);
        assert!(matches!(
            enforcer.select_next(&["A", "B"]),
            Err(CapabilityError::Exhausted)
        ));
        assert!(enforcer.select_distinct(3).is_err());
    }

    #[test]
    fn test_single_tool_may_repeat() {
        let mut enforcer = ToolDiversityEnforcer::new(["A"]);
        assert_eq!(enforcer.select_next(&[]).unwrap(), "A");
        assert_eq!(enforcer.select_next(&[]).unwrap(), "A");
        assert_eq!(enforcer.usage_count("A"), 2);
    }
}
