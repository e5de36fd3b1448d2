//! Pipeline performance metrics.
//!
//! Latencies are tracked per stage over a sliding window of recent
//! measurements; counters cover the whole session.

use std::collections::VecDeque;
use std::time::Instant;
use tracing::info;

const DEFAULT_WINDOW_SIZE: usize = 20;

#[derive(Debug, Clone, Default)]
pub struct LatencySummary {
    pub avg_ms: f64,
    pub p95_ms: f64,
    /// Measurements currently in the window.
    pub samples: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub session_duration_secs: f64,
    pub frames_processed: u64,
    pub decisions_made: u64,
    pub low_confidence_count: u64,
    pub llm_fallback_count: u64,
    pub vision: LatencySummary,
    pub policy: LatencySummary,
    pub llm: LatencySummary,
    pub total: LatencySummary,
}

pub struct PerformanceMetrics {
    window_size: usize,
    vision_latency: VecDeque<f64>,
    policy_latency: VecDeque<f64>,
    llm_latency: VecDeque<f64>,
    total_latency: VecDeque<f64>,
    frame_count: u64,
    decision_count: u64,
    low_confidence_count: u64,
    llm_fallback_count: u64,
    session_start: Instant,
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_WINDOW_SIZE)
    }

    pub fn with_window(window_size: usize) -> Self {
        Self {
            window_size,
            vision_latency: VecDeque::with_capacity(window_size),
            policy_latency: VecDeque::with_capacity(window_size),
            llm_latency: VecDeque::with_capacity(window_size),
            total_latency: VecDeque::with_capacity(window_size),
            frame_count: 0,
            decision_count: 0,
            low_confidence_count: 0,
            llm_fallback_count: 0,
            session_start: Instant::now(),
        }
    }

    pub fn record_vision_latency(&mut self, latency_ms: f64) {
        push_bounded(&mut self.vision_latency, latency_ms, self.window_size);
    }

    pub fn record_policy_latency(&mut self, latency_ms: f64) {
        push_bounded(&mut self.policy_latency, latency_ms, self.window_size);
    }

    pub fn record_llm_latency(&mut self, latency_ms: f64) {
        push_bounded(&mut self.llm_latency, latency_ms, self.window_size);
    }

    pub fn record_total_latency(&mut self, latency_ms: f64) {
        push_bounded(&mut self.total_latency, latency_ms, self.window_size);
    }

    pub fn increment_frames(&mut self) {
        self.frame_count += 1;
    }

    pub fn increment_decisions(&mut self) {
        self.decision_count += 1;
    }

    pub fn increment_low_confidence(&mut self) {
        self.low_confidence_count += 1;
    }

    pub fn increment_llm_fallbacks(&mut self) {
        self.llm_fallback_count += 1;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            session_duration_secs: self.session_start.elapsed().as_secs_f64(),
            frames_processed: self.frame_count,
            decisions_made: self.decision_count,
            low_confidence_count: self.low_confidence_count,
            llm_fallback_count: self.llm_fallback_count,
            vision: summarize(&self.vision_latency),
            policy: summarize(&self.policy_latency),
            llm: summarize(&self.llm_latency),
            total: summarize(&self.total_latency),
        }
    }

    pub fn log_summary(&self) {
        let s = self.snapshot();
        info!("=== Performance Metrics ===");
        info!("Session duration: {:.1}s", s.session_duration_secs);
        info!("Frames processed: {}", s.frames_processed);
        info!("Decisions made: {}", s.decisions_made);
        info!("Low confidence: {}", s.low_confidence_count);
        info!("LLM fallbacks: {}", s.llm_fallback_count);
        info!(
            "Latency (avg): Vision={:.0}ms, Policy={:.0}ms, LLM={:.0}ms, Total={:.0}ms",
            s.vision.avg_ms, s.policy.avg_ms, s.llm.avg_ms, s.total.avg_ms
        );
        info!("Latency (p95): Total={:.0}ms", s.total.p95_ms);
    }

    pub fn reset(&mut self) {
        self.vision_latency.clear();
        self.policy_latency.clear();
        self.llm_latency.clear();
        self.total_latency.clear();
        self.frame_count = 0;
        self.decision_count = 0;
        self.low_confidence_count = 0;
        self.llm_fallback_count = 0;
        self.session_start = Instant::now();
    }
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn push_bounded(window: &mut VecDeque<f64>, value: f64, capacity: usize) {
    if window.len() == capacity {
        window.pop_front();
    }
    window.push_back(value);
}

fn summarize(window: &VecDeque<f64>) -> LatencySummary {
    if window.is_empty() {
        return LatencySummary::default();
    }

    let avg_ms = window.iter().sum::<f64>() / window.len() as f64;

    let mut sorted: Vec<f64> = window.iter().copied().collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let idx = ((sorted.len() as f64) * 0.95) as usize;
    let p95_ms = sorted[idx.min(sorted.len() - 1)];

    LatencySummary {
        avg_ms,
        p95_ms,
        samples: window.len(),
    }
}
