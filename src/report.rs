// 📋 Daily Report - Annotated batch partitioned into TOP_A / TOP_B / TOP_C

use serde::Serialize;

use crate::batch::AnnotatedRecord;
use crate::ranker::Group;

/// Default list length per group
pub const DEFAULT_TOP_N: usize = 30;

#[derive(Debug, Clone, Default, Serialize)]
pub struct DailyReport {
    pub top_a: Vec<AnnotatedRecord>,
    pub top_b: Vec<AnnotatedRecord>,
    pub top_c: Vec<AnnotatedRecord>,
}

impl DailyReport {
    /// Partition by group, highest composite first, at most `top_n` per group
    ///
    /// Sorting is stable, so equal scores keep batch order.
    pub fn build(annotated: &[AnnotatedRecord], top_n: usize) -> Self {
        let mut report = DailyReport::default();

        for record in annotated {
            report.group_mut(record.group).push(record.clone());
        }

        for group in Group::ALL {
            let list = report.group_mut(group);
            list.sort_by(|a, b| b.composite_score.cmp(&a.composite_score));
            list.truncate(top_n);
        }

        report
    }

    pub fn group(&self, group: Group) -> &[AnnotatedRecord] {
        match group {
            Group::TopA => &self.top_a,
            Group::TopB => &self.top_b,
            Group::TopC => &self.top_c,
        }
    }

    fn group_mut(&mut self, group: Group) -> &mut Vec<AnnotatedRecord> {
        match group {
            Group::TopA => &mut self.top_a,
            Group::TopB => &mut self.top_b,
            Group::TopC => &mut self.top_c,
        }
    }

    /// Overall leaders across the three groups
    pub fn overall(&self, top_n: usize) -> Vec<&AnnotatedRecord> {
        // Groups are already in descending score bands
        Group::ALL
            .iter()
            .flat_map(|g| self.group(*g).iter())
            .take(top_n)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.top_a.len() + self.top_b.len() + self.top_c.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
