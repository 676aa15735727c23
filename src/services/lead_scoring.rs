use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;

use super::ServiceError;
use crate::config::ScoringConfig;
use crate::dispatch::Scope;
use crate::extract::Tag;
use crate::types::TenantId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreCategory {
    Hot,
    Warm,
    Cold,
    Nurture,
}

impl Tag for ScoreCategory {
    const FIELD: &'static str = "category";
    const ALLOWED: &'static [Self] = &[ScoreCategory::Hot, ScoreCategory::Warm, ScoreCategory::Cold, ScoreCategory::Nurture];

    fn as_tag(&self) -> &'static str {
        match self {
            ScoreCategory::Hot => "hot",
            ScoreCategory::Warm => "warm",
            ScoreCategory::Cold => "cold",
            ScoreCategory::Nurture => "nurture",
        }
    }
}

impl ScoreCategory {
    pub fn of(score: f64) -> Self {
        if score >= 75.0 {
            ScoreCategory::Hot
        } else if score >= 50.0 {
            ScoreCategory::Warm
        } else if score >= 25.0 {
            ScoreCategory::Cold
        } else {
            ScoreCategory::Nurture
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadScore {
    pub lead_id: i64,
    pub tenant_id: TenantId,
    pub source_quality_score: f64,
    pub engagement_score: f64,
    pub conversion_probability: f64,
    pub urgency_score: f64,
    pub overall_score: f64,
    pub score_category: ScoreCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_change: Option<f64>,
    pub calculation_method: String,
    pub last_calculated: DateTime<Utc>,
}

#[async_trait]
pub trait LeadScoringService: Send + Sync {
    async fn score(&self, scope: &Scope, tenant: &TenantId, lead_id: i64) -> Result<Option<LeadScore>, ServiceError>;

    async fn calculate(&self, scope: &Scope, tenant: &TenantId, lead_id: i64) -> Result<LeadScore, ServiceError>;

    async fn by_category(&self, scope: &Scope, tenant: &TenantId, category: ScoreCategory, limit: i64) -> Result<Vec<LeadScore>, ServiceError>;

    /// Queue a recalculation of every lead of `tenant`. Must not wait for
    /// the work itself.
    async fn enqueue_batch(&self, scope: &Scope, tenant: &TenantId) -> Result<(), ServiceError>;
}

/// Inputs of the weighted model, each on a 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeadSignals {
    pub source_quality: f64,
    pub engagement: f64,
    pub conversion_probability: f64,
    pub urgency: f64,
}

impl LeadSignals {
    pub fn overall(&self) -> f64 {
        let score = self.source_quality * 0.25 + self.engagement * 0.25 + self.conversion_probability * 0.30 + self.urgency * 0.20;
        (score * 100.0).round() / 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    pub tenant: TenantId,
}

/// Bounded job queue drained by a fixed pool of workers.
#[derive(Debug, Clone)]
pub struct BatchQueue {
    sender: mpsc::Sender<BatchJob>,
}

impl BatchQueue {
    /// Spawn `workers` tasks that run `handler` for every job. Workers exit
    /// once every queue handle has been dropped.
    pub fn start<F, Fut>(capacity: usize, workers: usize, handler: F) -> (Self, Vec<JoinHandle<()>>)
    where
        F: Fn(BatchJob) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel::<BatchJob>(capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let handler = Arc::new(handler);

        let handles = (0..workers.max(1))
            .map(|worker| {
                let receiver = receiver.clone();
                let handler = handler.clone();
                tokio::spawn(async move {
                    loop {
                        let job = receiver.lock().await.recv().await;
                        let Some(job) = job else { break };
                        tracing::debug!(worker, tenant = %job.tenant, "running batch score job");
                        (*handler)(job).await;
                    }
                })
            })
            .collect();

        (Self { sender }, handles)
    }

    /// Non-blocking enqueue; a full queue is reported as unavailable.
    pub fn try_enqueue(&self, job: BatchJob) -> Result<(), ServiceError> {
        self.sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ServiceError::Unavailable("batch queue is full".into()),
            mpsc::error::TrySendError::Closed(_) => ServiceError::Internal("batch workers stopped".into()),
        })
    }
}

#[derive(Debug, Default)]
struct Ledger {
    signals: RwLock<HashMap<(TenantId, i64), LeadSignals>>,
    scores: RwLock<HashMap<(TenantId, i64), LeadScore>>,
}

impl Ledger {
    async fn calculate(&self, tenant: &TenantId, lead_id: i64) -> Result<LeadScore, ServiceError> {
        let key = (tenant.clone(), lead_id);
        let signals = self
            .signals
            .read()
            .await
            .get(&key)
            .copied()
            .ok_or_else(|| ServiceError::NotFound("lead not found".into()))?;

        let overall = signals.overall();
        let mut scores = self.scores.write().await;
        let previous = scores.get(&key).map(|s| s.overall_score);

        let score = LeadScore {
            lead_id,
            tenant_id: tenant.clone(),
            source_quality_score: signals.source_quality,
            engagement_score: signals.engagement,
            conversion_probability: signals.conversion_probability,
            urgency_score: signals.urgency,
            overall_score: overall,
            score_category: ScoreCategory::of(overall),
            previous_score: previous,
            score_change: previous.map(|p| overall - p),
            calculation_method: "weighted".into(),
            last_calculated: Utc::now(),
        };
        scores.insert(key, score.clone());
        Ok(score)
    }

    async fn recalculate_tenant(&self, tenant: &TenantId) {
        let leads: Vec<i64> = self
            .signals
            .read()
            .await
            .keys()
            .filter(|(t, _)| t == tenant)
            .map(|(_, lead)| *lead)
            .collect();

        for lead in &leads {
            if let Err(e) = self.calculate(tenant, *lead).await {
                tracing::warn!(tenant = %tenant, lead, error = %e, "batch score calculation failed");
            }
        }
        tracing::info!(tenant = %tenant, leads = leads.len(), "batch score calculation finished");
    }
}

/// In-memory lead scores using the weighted model, with batch
/// recalculation on a Service-owned worker pool.
pub struct ScoreBook {
    ledger: Arc<Ledger>,
    queue: BatchQueue,
}

impl ScoreBook {
    /// Must be called within a tokio runtime; spawns the batch workers.
    pub fn start(config: &ScoringConfig) -> Self {
        let ledger = Arc::new(Ledger::default());
        let worker_ledger = ledger.clone();
        let (queue, _workers) = BatchQueue::start(config.queue_capacity, config.workers, move |job: BatchJob| {
            let ledger = worker_ledger.clone();
            async move { ledger.recalculate_tenant(&job.tenant).await }
        });

        Self { ledger, queue }
    }

    /// Record model inputs for a lead, e.g. from the CRM sync.
    pub async fn record_signals(&self, tenant: &TenantId, lead_id: i64, signals: LeadSignals) {
        self.ledger.signals.write().await.insert((tenant.clone(), lead_id), signals);
    }
}

#[async_trait]
impl LeadScoringService for ScoreBook {
    async fn score(&self, _scope: &Scope, tenant: &TenantId, lead_id: i64) -> Result<Option<LeadScore>, ServiceError> {
        Ok(self.ledger.scores.read().await.get(&(tenant.clone(), lead_id)).cloned())
    }

    async fn calculate(&self, _scope: &Scope, tenant: &TenantId, lead_id: i64) -> Result<LeadScore, ServiceError> {
        self.ledger.calculate(tenant, lead_id).await
    }

    async fn by_category(&self, _scope: &Scope, tenant: &TenantId, category: ScoreCategory, limit: i64) -> Result<Vec<LeadScore>, ServiceError> {
        let scores = self.ledger.scores.read().await;
        let mut matching: Vec<LeadScore> = scores
            .values()
            .filter(|s| &s.tenant_id == tenant && s.score_category == category)
            .cloned()
            .collect();

        matching.sort_by(|a, b| b.overall_score.total_cmp(&a.overall_score));
        matching.truncate(limit.max(0) as usize);
        Ok(matching)
    }

    async fn enqueue_batch(&self, _scope: &Scope, tenant: &TenantId) -> Result<(), ServiceError> {
        self.queue.try_enqueue(BatchJob { tenant: tenant.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn tenant(id: &str) -> TenantId {
        TenantId::new(id).unwrap()
    }

    fn signals(level: f64) -> LeadSignals {
        LeadSignals {
            source_quality: level,
            engagement: level,
            conversion_probability: level,
            urgency: level,
        }
    }

    #[test]
    fn category_thresholds() {
        assert_eq!(ScoreCategory::of(80.0), ScoreCategory::Hot);
        assert_eq!(ScoreCategory::of(75.0), ScoreCategory::Hot);
        assert_eq!(ScoreCategory::of(60.0), ScoreCategory::Warm);
        assert_eq!(ScoreCategory::of(25.0), ScoreCategory::Cold);
        assert_eq!(ScoreCategory::of(10.0), ScoreCategory::Nurture);
    }

    #[test]
    fn weighted_overall() {
        let s = LeadSignals {
            source_quality: 100.0,
            engagement: 0.0,
            conversion_probability: 50.0,
            urgency: 50.0,
        };
        assert_eq!(s.overall(), 50.0);
    }

    #[tokio::test]
    async fn calculate_tracks_previous_score() {
        let book = ScoreBook::start(&ScoringConfig { queue_capacity: 4, workers: 1 });
        let scope = Scope::detached();
        book.record_signals(&tenant("t1"), 1, signals(80.0)).await;

        let first = book.calculate(&scope, &tenant("t1"), 1).await.unwrap();
        assert_eq!(first.score_category, ScoreCategory::Hot);
        assert!(first.previous_score.is_none());

        book.record_signals(&tenant("t1"), 1, signals(40.0)).await;
        let second = book.calculate(&scope, &tenant("t1"), 1).await.unwrap();
        assert_eq!(second.previous_score, Some(80.0));
        assert_eq!(second.score_change, Some(-40.0));

        assert!(book.score(&scope, &tenant("t2"), 1).await.unwrap().is_none());
        assert!(matches!(book.calculate(&scope, &tenant("t1"), 99).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn by_category_sorts_and_limits() {
        let book = ScoreBook::start(&ScoringConfig { queue_capacity: 4, workers: 1 });
        let scope = Scope::detached();
        for (lead, level) in [(1, 90.0), (2, 95.0), (3, 80.0), (4, 10.0)] {
            book.record_signals(&tenant("t1"), lead, signals(level)).await;
            book.calculate(&scope, &tenant("t1"), lead).await.unwrap();
        }

        let hot = book.by_category(&scope, &tenant("t1"), ScoreCategory::Hot, 2).await.unwrap();
        let ids: Vec<i64> = hot.iter().map(|s| s.lead_id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn batch_runs_on_workers() {
        let book = ScoreBook::start(&ScoringConfig { queue_capacity: 4, workers: 2 });
        let scope = Scope::detached();
        book.record_signals(&tenant("t1"), 7, signals(60.0)).await;

        book.enqueue_batch(&scope, &tenant("t1")).await.unwrap();

        for _ in 0..50 {
            if book.score(&scope, &tenant("t1"), 7).await.unwrap().is_some() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("batch job never ran");
    }

    #[tokio::test]
    async fn full_queue_is_unavailable() {
        let (queue, _workers) = BatchQueue::start(1, 1, |_job| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        // Fill the single slot; the worker may or may not have taken the first job yet.
        let mut results = Vec::new();
        for _ in 0..3 {
            results.push(queue.try_enqueue(BatchJob { tenant: tenant("t1") }));
        }
        assert!(results.iter().any(|r| matches!(r, Err(ServiceError::Unavailable(_)))));
    }
}
