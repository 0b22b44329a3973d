//! End-to-end planning pipeline: normalize, score, place.
//!
//! A [`Pipeline`] holds only configuration. Each call to [`Pipeline::plan`]
//! works on its own batch and keeps nothing afterwards, so independent
//! batches can run through separate pipelines (or the same one) freely.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::intake::parse_batch;
use crate::{
    DayplanConfig, PipelineError, PriorityScorer, PrioritySummary, RankedTasks, RawTask, Schedule,
    TaskNormalizer, TimelineBuilder, ValidationError,
};

/// How validation errors affect the batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// Rejected tasks are reported, the rest are scheduled.
    #[default]
    PartialSuccess,
    /// Any rejected task fails the whole batch.
    AllOrNothing,
}

/// Time anchors for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanContext {
    /// Start of the timeline, with explicit offset.
    pub day_start: DateTime<FixedOffset>,
    /// Reference time for relative deadlines and deadline proximity.
    pub now: DateTime<FixedOffset>,
}

impl PlanContext {
    /// Create a context with explicit anchors.
    pub fn new(day_start: DateTime<FixedOffset>, now: DateTime<FixedOffset>) -> Self {
        Self { day_start, now }
    }

    /// Context whose reference time is the day start itself.
    pub fn starting_at(day_start: DateTime<FixedOffset>) -> Self {
        Self::new(day_start, day_start)
    }
}

/// Everything one run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOutcome {
    /// Start of the timeline.
    pub day_start: DateTime<FixedOffset>,

    /// Reference time used for scoring.
    pub reference_time: DateTime<FixedOffset>,

    /// Scorer output in rank order.
    pub ranked: RankedTasks,

    /// The day's timeline.
    pub schedule: Schedule,

    /// Validation errors from every stage, in the order they were found.
    pub rejected: Vec<ValidationError>,
}

impl PlanOutcome {
    /// Ranking overview.
    pub fn summary(&self) -> PrioritySummary {
        self.ranked.summary(self.reference_time)
    }
}

/// The planning pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: DayplanConfig,
    policy: BatchPolicy,
}

impl Pipeline {
    /// Create a pipeline, validating the configuration.
    pub fn new(config: DayplanConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            config,
            policy: BatchPolicy::default(),
        })
    }

    /// Builder method to set the batch policy.
    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &DayplanConfig {
        &self.config
    }

    /// Parse raw caller input and plan it.
    pub fn plan_text(&self, raw: &str, ctx: &PlanContext) -> Result<PlanOutcome, PipelineError> {
        let batch = parse_batch(raw)?;
        self.plan(&batch, ctx)
    }

    /// Run a batch through normalization, scoring and placement.
    pub fn plan(&self, batch: &[RawTask], ctx: &PlanContext) -> Result<PlanOutcome, PipelineError> {
        info!(
            batch_size = batch.len(),
            day_start = %ctx.day_start.to_rfc3339(),
            policy = ?self.policy,
            "Planning batch"
        );

        let normalized = TaskNormalizer::new(&self.config, ctx.now).normalize_batch(batch);
        let mut rejected = normalized.rejected;
        self.enforce_policy(&rejected)?;

        let ranked = PriorityScorer::new(&self.config, ctx.now).rank(normalized.tasks)?;
        let mut schedule =
            TimelineBuilder::new(&self.config).build(ranked.tasks.clone(), ctx.day_start)?;

        rejected.extend(std::mem::take(&mut schedule.rejected));
        self.enforce_policy(&rejected)?;

        if !rejected.is_empty() {
            warn!(rejected = rejected.len(), "Some tasks were not scheduled");
        }

        info!(
            scheduled = schedule.tasks.len(),
            ends_at = ?schedule.ends_at().map(|t| t.to_rfc3339()),
            "Plan complete"
        );

        Ok(PlanOutcome {
            day_start: ctx.day_start,
            reference_time: ctx.now,
            ranked,
            schedule,
            rejected,
        })
    }

    fn enforce_policy(&self, rejected: &[ValidationError]) -> Result<(), PipelineError> {
        match self.policy {
            BatchPolicy::AllOrNothing if !rejected.is_empty() => {
                Err(PipelineError::Rejected(rejected.to_vec()))
            }
            _ => Ok(()),
        }
    }
}
