//! Rule-based plan grading.
//!
//! Four criteria, each worth up to 25 points:
//! - time efficiency: total work lands in a productive range
//! - priority alignment: high-tier work early, low-tier work not first
//! - feasibility: the day is not overloaded and tasks are not huge
//! - work-life balance: breaks exist and the day is not too long

use std::fmt;

use dayplan_core::{PriorityTier, Schedule};
use serde::{Deserialize, Serialize};

const CRITERION_MAX: f64 = 25.0;

const PRODUCTIVE_MIN_MINUTES: i64 = 360;
const PRODUCTIVE_MAX_MINUTES: i64 = 480;
const MIN_TASK_COUNT: usize = 3;

const HEAVY_DAY_MINUTES: i64 = 480;
const OVERLOADED_DAY_MINUTES: i64 = 540;
const LONG_TASK_MINUTES: i64 = 180;

const EXCESSIVE_DAY_MINUTES: i64 = 600;

/// High-tier tasks placed after this many tasks lose alignment points.
const HIGH_PRIORITY_SLOTS: usize = 3;

/// Letter grade for a total score out of 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_total(total: f64) -> Self {
        match total {
            t if t >= 90.0 => Grade::A,
            t if t >= 80.0 => Grade::B,
            t if t >= 70.0 => Grade::C,
            t if t >= 60.0 => Grade::D,
            _ => Grade::F,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        write!(f, "{}", s)
    }
}

/// Result of grading one schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEvaluation {
    pub time_efficiency: f64,
    pub priority_alignment: f64,
    pub feasibility: f64,
    pub work_life_balance: f64,
    pub total: f64,
    pub grade: Grade,
    pub feedback: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Grade a schedule. `max_work_hours` is the personal daily limit.
pub fn evaluate_plan(schedule: &Schedule, max_work_hours: i64) -> PlanEvaluation {
    let work_minutes = schedule.total_task_minutes();
    let task_count = schedule.tasks.len();

    let time_efficiency = if task_count == 0 {
        0.0
    } else {
        let mut score = CRITERION_MAX;
        if !(PRODUCTIVE_MIN_MINUTES..=PRODUCTIVE_MAX_MINUTES).contains(&work_minutes) {
            score -= 5.0;
        }
        if task_count < MIN_TASK_COUNT {
            score -= 3.0;
        }
        score
    };

    let mut priority_alignment = CRITERION_MAX;
    for (index, entry) in schedule.task_entries().enumerate() {
        let tier = entry
            .task_id
            .as_ref()
            .and_then(|id| schedule.task(id))
            .and_then(|t| t.priority_tier);
        match tier {
            Some(PriorityTier::High) if index >= HIGH_PRIORITY_SLOTS => priority_alignment -= 3.0,
            Some(PriorityTier::Low) if index == 0 => priority_alignment -= 2.0,
            _ => {}
        }
    }
    let priority_alignment = priority_alignment.max(0.0);

    let mut feasibility = CRITERION_MAX;
    if work_minutes > OVERLOADED_DAY_MINUTES {
        feasibility -= 10.0;
    } else if work_minutes > HEAVY_DAY_MINUTES {
        feasibility -= 5.0;
    }
    let long_tasks = schedule
        .tasks
        .iter()
        .filter(|t| t.duration_minutes > LONG_TASK_MINUTES)
        .count();
    feasibility = (feasibility - 2.0 * long_tasks as f64).max(0.0);

    let mut work_life_balance = CRITERION_MAX;
    if task_count > 1 && schedule.break_entries().next().is_none() {
        work_life_balance -= 5.0;
    }
    if work_minutes > EXCESSIVE_DAY_MINUTES {
        work_life_balance -= 10.0;
    }
    if work_minutes > max_work_hours * 60 {
        work_life_balance -= 5.0;
    }
    let work_life_balance = work_life_balance.max(0.0);

    let total = time_efficiency + priority_alignment + feasibility + work_life_balance;

    let mut feedback = Vec::new();
    let mut recommendations = Vec::new();

    if time_efficiency < 15.0 {
        feedback.push("Time allocation could be more efficient".to_string());
        recommendations.push("Group similar tasks together to reduce context switching".to_string());
    }
    if priority_alignment < 20.0 {
        feedback.push("Important tasks are not scheduled early enough".to_string());
        recommendations.push("Move high-priority tasks to the start of the day".to_string());
    }
    if feasibility < 20.0 {
        feedback.push("The plan may be too ambitious for one day".to_string());
        recommendations.push("Split long tasks or move some to another day".to_string());
    }
    if work_life_balance < 20.0 {
        feedback.push("The day leaves little room to recover".to_string());
        recommendations.push("Add breaks and keep the workday within your limit".to_string());
    }
    if feedback.is_empty() {
        feedback.push("Well-balanced plan".to_string());
    }

    PlanEvaluation {
        time_efficiency,
        priority_alignment,
        feasibility,
        work_life_balance,
        total,
        grade: Grade::from_total(total),
        feedback,
        recommendations,
    }
}
