//! Progress accounting
//!
//! A job's percentage is partitioned into equal per-stage bands over 0..80,
//! with 80..100 reserved for aggregation and the terminal write. Within a
//! stage band every (site, hazard type) item carries the same credit, and a
//! failed item books its remaining credit immediately, so the percentage
//! always reaches the aggregation band no matter how many items fail.
//!
//! The tracker itself is plain state; the runner serializes access through
//! a mutex and the SQL layer applies `GREATEST` on top.

/// Percentage where the per-item stage bands end and aggregation begins.
pub const AGGREGATION_START: i32 = 80;

/// Percentage written after aggregation lands but before the terminal
/// transition sets 100.
pub const AGGREGATION_DONE: i32 = 90;

/// Fixed partition of the progress range for one job.
#[derive(Debug, Clone, Copy)]
pub struct ProgressPlan {
    stage_count: usize,
    total_items: usize,
}

impl ProgressPlan {
    /// `stage_count` is the number of per-item stages (4 for assessments,
    /// 2 for precompute jobs); `total_items` the number of
    /// (site, hazard type) units.
    pub fn new(stage_count: usize, total_items: usize) -> ProgressPlan {
        ProgressPlan {
            stage_count: stage_count.max(1),
            total_items: total_items.max(1),
        }
    }

    /// Credit one item earns by finishing one stage.
    fn stage_credit(&self) -> f64 {
        AGGREGATION_START as f64 / (self.stage_count * self.total_items) as f64
    }
}

/// Accumulates stage completions into a monotone percentage.
#[derive(Debug)]
pub struct ProgressTracker {
    plan: ProgressPlan,
    accumulated: f64,
    completed_items: i32,
    failed_items: i32,
}

impl ProgressTracker {
    pub fn new(plan: ProgressPlan) -> ProgressTracker {
        ProgressTracker {
            plan,
            accumulated: 0.0,
            completed_items: 0,
            failed_items: 0,
        }
    }

    /// One item finished one stage.
    pub fn stage_done(&mut self) {
        self.accumulated += self.plan.stage_credit();
    }

    /// One item finished every stage.
    pub fn item_completed(&mut self) {
        self.completed_items += 1;
    }

    /// One item failed after completing `stages_done` stages. Its remaining
    /// stage credit is booked at once so the job still reaches the
    /// aggregation band.
    pub fn item_failed(&mut self, stages_done: usize) {
        let remaining = self.plan.stage_count.saturating_sub(stages_done);
        self.accumulated += remaining as f64 * self.plan.stage_credit();
        self.failed_items += 1;
    }

    /// Current percentage, capped at the aggregation band.
    pub fn percent(&self) -> i32 {
        (self.accumulated.round() as i32).clamp(0, AGGREGATION_START)
    }

    pub fn completed_items(&self) -> i32 {
        self.completed_items
    }

    pub fn failed_items(&self) -> i32 {
        self.failed_items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_run_fills_the_stage_bands_exactly() {
        let plan = ProgressPlan::new(4, 9);
        let mut tracker = ProgressTracker::new(plan);

        let mut last = 0;
        for _item in 0..9 {
            for _stage in 0..4 {
                tracker.stage_done();
                let percent = tracker.percent();
                assert!(percent >= last, "progress went backwards: {last} -> {percent}");
                last = percent;
            }
            tracker.item_completed();
        }

        assert_eq!(tracker.percent(), AGGREGATION_START);
        assert_eq!(tracker.completed_items(), 9);
        assert_eq!(tracker.failed_items(), 0);
    }

    #[test]
    fn failed_item_books_its_remaining_credit() {
        let plan = ProgressPlan::new(4, 9);
        let mut tracker = ProgressTracker::new(plan);

        for item in 0..9 {
            if item == 3 {
                // fails after its first stage
                tracker.stage_done();
                tracker.item_failed(1);
            } else {
                for _stage in 0..4 {
                    tracker.stage_done();
                }
                tracker.item_completed();
            }
        }

        assert_eq!(tracker.percent(), AGGREGATION_START);
        assert_eq!(tracker.completed_items(), 8);
        assert_eq!(tracker.failed_items(), 1);
    }

    #[test]
    fn item_failing_before_any_stage_still_counts_fully() {
        let plan = ProgressPlan::new(4, 2);
        let mut tracker = ProgressTracker::new(plan);

        tracker.item_failed(0);
        assert_eq!(tracker.percent(), 40);

        for _stage in 0..4 {
            tracker.stage_done();
        }
        tracker.item_completed();
        assert_eq!(tracker.percent(), AGGREGATION_START);
    }

    #[test]
    fn percent_never_exceeds_the_aggregation_band() {
        let plan = ProgressPlan::new(2, 3);
        let mut tracker = ProgressTracker::new(plan);

        // Over-report on purpose; the cap holds.
        for _ in 0..20 {
            tracker.stage_done();
        }
        assert_eq!(tracker.percent(), AGGREGATION_START);
    }

    #[test]
    fn two_stage_plan_uses_forty_point_bands() {
        let plan = ProgressPlan::new(2, 4);
        let mut tracker = ProgressTracker::new(plan);

        // All items through their first stage: exactly one band.
        for _ in 0..4 {
            tracker.stage_done();
        }
        assert_eq!(tracker.percent(), 40);
    }

    #[test]
    fn degenerate_plans_are_safe() {
        let plan = ProgressPlan::new(0, 0);
        let mut tracker = ProgressTracker::new(plan);
        tracker.stage_done();
        assert_eq!(tracker.percent(), AGGREGATION_START);
    }
}
