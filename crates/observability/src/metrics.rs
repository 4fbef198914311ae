//! Registry 指标收集模块
//!
//! 基于 Delivery / FlushReport 收集和统计注册表的运行指标。

use contracts::{Delivery, FlushReport};
use metrics::{counter, gauge, histogram};

/// 记录一次批次提交
///
/// 每次 `submit` 返回后调用此函数来记录指标。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_batch_submitted;
///
/// let delivery = registry.submit(batch)?;
/// record_batch_submitted(entries, &delivery);
/// ```
pub fn record_batch_submitted(entries: usize, delivery: &Delivery) {
    counter!(
        "doc_registry_batches_submitted_total",
        "path" => delivery.as_str()
    )
    .increment(1);

    counter!("doc_registry_entries_submitted_total").increment(entries as u64);
    histogram!("doc_registry_batch_entries").record(entries as f64);

    if let Delivery::Buffered { pending } = delivery {
        gauge!("doc_registry_pending_batches").set(*pending as f64);
    }
}

/// 记录 sink 挂载与缓冲区清空
pub fn record_flush(report: &FlushReport) {
    counter!(
        "doc_registry_batches_flushed_total",
        "sink" => report.sink.clone()
    )
    .increment(report.flushed as u64);
    gauge!("doc_registry_pending_batches").set(0.0);
    gauge!("doc_registry_sink_attached").set(1.0);
}

/// 记录 sink 拒收批次
pub fn record_sink_failure(sink_name: &str) {
    counter!(
        "doc_registry_sink_failures_total",
        "sink" => sink_name.to_string()
    )
    .increment(1);
}

/// 记录重复挂载被拒绝
pub fn record_attach_rejected(rejected: &str) {
    counter!(
        "doc_registry_sink_attach_rejected_total",
        "sink" => rejected.to_string()
    )
    .increment(1);
}

/// 注册表指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct RegistryMetricsAggregator {
    /// 提交批次数
    pub total_batches: u64,

    /// 提交条目数
    pub total_entries: u64,

    /// 直接转发的批次
    pub forwarded: u64,

    /// 先缓冲后清空的批次
    pub buffered: u64,

    /// sink 拒收次数
    pub failures: u64,

    /// 片段诊断数
    pub diagnostics: u64,

    /// 每批条目数统计
    pub entries_per_batch: RunningStats,

    /// 挂载时缓冲区深度
    pub pending_at_attach: Option<usize>,
}

impl RegistryMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新提交统计
    pub fn update(&mut self, entries: usize, delivery: &Delivery) {
        self.total_batches += 1;
        self.total_entries += entries as u64;
        self.entries_per_batch.push(entries as f64);

        match delivery {
            Delivery::Forwarded => self.forwarded += 1,
            Delivery::Buffered { .. } => self.buffered += 1,
        }
    }

    /// 更新挂载统计
    pub fn update_flush(&mut self, report: &FlushReport) {
        self.pending_at_attach = Some(report.flushed);
        self.failures += report.failed as u64;
    }

    /// 记录 forward 路径上的拒收
    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    /// 记录片段诊断
    pub fn record_diagnostics(&mut self, count: usize) {
        self.diagnostics += count as u64;
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_batches: self.total_batches,
            total_entries: self.total_entries,
            forwarded: self.forwarded,
            buffered: self.buffered,
            failures: self.failures,
            diagnostics: self.diagnostics,
            buffered_rate: if self.total_batches > 0 {
                self.buffered as f64 / self.total_batches as f64 * 100.0
            } else {
                0.0
            },
            pending_at_attach: self.pending_at_attach,
            entries_per_batch: StatsSummary::from(&self.entries_per_batch),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_batches: u64,
    pub total_entries: u64,
    pub forwarded: u64,
    pub buffered: u64,
    pub failures: u64,
    pub diagnostics: u64,
    pub buffered_rate: f64,
    pub pending_at_attach: Option<usize>,
    pub entries_per_batch: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Registry Metrics Summary ===")?;
        writeln!(f, "Total batches: {}", self.total_batches)?;
        writeln!(f, "Total entries: {}", self.total_entries)?;
        writeln!(
            f,
            "Buffered before attach: {} ({:.2}%)",
            self.buffered, self.buffered_rate
        )?;
        writeln!(f, "Forwarded after attach: {}", self.forwarded)?;
        match self.pending_at_attach {
            Some(pending) => writeln!(f, "Flushed on attach: {}", pending)?,
            None => writeln!(f, "Flushed on attach: (sink never attached)")?,
        }
        writeln!(f, "Sink failures: {}", self.failures)?;
        writeln!(f, "Fragment diagnostics: {}", self.diagnostics)?;
        writeln!(f, "Entries per batch: {}", self.entries_per_batch)?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.0}, max={:.0}, mean={:.2}, std={:.2} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = RegistryMetricsAggregator::new();

        aggregator.update(5, &Delivery::Buffered { pending: 1 });
        aggregator.update(0, &Delivery::Buffered { pending: 2 });
        aggregator.update_flush(&FlushReport {
            sink: "index".to_string(),
            flushed: 2,
            failed: 1,
        });
        aggregator.update(3, &Delivery::Forwarded);
        aggregator.record_diagnostics(2);

        assert_eq!(aggregator.total_batches, 3);
        assert_eq!(aggregator.total_entries, 8);
        assert_eq!(aggregator.buffered, 2);
        assert_eq!(aggregator.forwarded, 1);
        assert_eq!(aggregator.failures, 1);
        assert_eq!(aggregator.diagnostics, 2);
        assert_eq!(aggregator.pending_at_attach, Some(2));
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = RegistryMetricsAggregator::new();
        aggregator.update(5, &Delivery::Buffered { pending: 1 });
        aggregator.update(5, &Delivery::Forwarded);

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Total batches: 2"));
        assert!(output.contains("50.00%"));
        assert!(output.contains("(sink never attached)"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_batch_submitted(1, &Delivery::Forwarded);
        record_sink_failure("index");
        record_attach_rejected("second");
    }
}
