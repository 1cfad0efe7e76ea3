//! Session definitions: techniques, intervals and resolved plans.
//!
//! A [`SessionPlan`] is the ordered interval sequence the timer runtime plays
//! back. Standard techniques always resolve to a `work` / `rest` pair; custom
//! sessions are fetched from a [`SessionStore`] and played in insertion order.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, Result, ValidationError};
use crate::store::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Technique {
    Pomodoro,
    Timeboxing,
    Flowtime,
    Custom,
}

impl Technique {
    pub const ALL: [Technique; 4] = [
        Technique::Pomodoro,
        Technique::Timeboxing,
        Technique::Flowtime,
        Technique::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Technique::Pomodoro => "pomodoro",
            Technique::Timeboxing => "timeboxing",
            Technique::Flowtime => "flowtime",
            Technique::Custom => "custom",
        }
    }

    pub fn is_standard(&self) -> bool {
        !matches!(self, Technique::Custom)
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Technique {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pomodoro" => Ok(Technique::Pomodoro),
            "timeboxing" => Ok(Technique::Timeboxing),
            "flowtime" => Ok(Technique::Flowtime),
            "custom" => Ok(Technique::Custom),
            _ => Err(ValidationError::UnknownTechnique(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalKind {
    #[default]
    Work,
    Rest,
}

/// One timed phase of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    /// Unique within its session.
    pub id: String,
    pub label: String,
    pub duration_secs: u64,
    #[serde(default)]
    pub kind: IntervalKind,
}

impl Interval {
    /// Build a work interval with a freshly generated id.
    pub fn new(label: impl Into<String>, duration_secs: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            label: label.into(),
            duration_secs,
            kind: IntervalKind::Work,
        }
    }

    pub fn with_kind(mut self, kind: IntervalKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Work and rest lengths for a standard technique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechniqueDurations {
    pub work_secs: u64,
    pub rest_secs: u64,
}

impl TechniqueDurations {
    pub fn from_minutes(work_min: u64, rest_min: u64) -> Self {
        Self {
            work_secs: work_min.saturating_mul(60),
            rest_secs: rest_min.saturating_mul(60),
        }
    }
}

/// Durations for every standard technique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechniqueTable {
    pub pomodoro: TechniqueDurations,
    pub timeboxing: TechniqueDurations,
    pub flowtime: TechniqueDurations,
}

impl TechniqueTable {
    pub fn get(&self, technique: Technique) -> Option<TechniqueDurations> {
        match technique {
            Technique::Pomodoro => Some(self.pomodoro),
            Technique::Timeboxing => Some(self.timeboxing),
            Technique::Flowtime => Some(self.flowtime),
            Technique::Custom => None,
        }
    }
}

impl Default for TechniqueTable {
    fn default() -> Self {
        Self {
            pomodoro: TechniqueDurations::from_minutes(25, 5),
            timeboxing: TechniqueDurations::from_minutes(30, 10),
            flowtime: TechniqueDurations::from_minutes(45, 15),
        }
    }
}

/// A user-authored interval sequence, as kept by a [`SessionStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomSession {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub intervals: Vec<Interval>,
}

impl CustomSession {
    pub fn total_duration_secs(&self) -> u64 {
        self.intervals.iter().map(|i| i.duration_secs).sum()
    }
}

/// Resolved, playable interval sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionPlan {
    pub technique: Technique,
    pub session_id: Option<String>,
    pub name: String,
    intervals: Vec<Interval>,
}

impl SessionPlan {
    /// Two-interval work/rest plan for a standard technique.
    pub fn standard(technique: Technique, durations: TechniqueDurations) -> Result<Self> {
        if !technique.is_standard() {
            return Err(ValidationError::NotStandard.into());
        }
        Ok(Self {
            technique,
            session_id: None,
            name: capitalize(technique.as_str()),
            intervals: vec![
                Interval {
                    id: "work".into(),
                    label: "Work".into(),
                    duration_secs: durations.work_secs,
                    kind: IntervalKind::Work,
                },
                Interval {
                    id: "rest".into(),
                    label: "Rest".into(),
                    duration_secs: durations.rest_secs,
                    kind: IntervalKind::Rest,
                },
            ],
        })
    }

    /// Plan from a custom session; rejects empty sessions and duplicate ids.
    pub fn from_custom(session: CustomSession) -> Result<Self> {
        if session.intervals.is_empty() {
            return Err(ValidationError::EmptySession(session.id).into());
        }
        let mut seen = HashSet::new();
        for interval in &session.intervals {
            if !seen.insert(interval.id.as_str()) {
                return Err(ValidationError::DuplicateIntervalId {
                    session_id: session.id.clone(),
                    interval_id: interval.id.clone(),
                }
                .into());
            }
        }
        Ok(Self {
            technique: Technique::Custom,
            session_id: Some(session.id),
            name: session.name,
            intervals: session.intervals,
        })
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn interval(&self, index: usize) -> Option<&Interval> {
        self.intervals.get(index)
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Never true for a plan built through `standard` or `from_custom`.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn first_duration_secs(&self) -> u64 {
        self.intervals.first().map(|i| i.duration_secs).unwrap_or(0)
    }

    /// Sum of all interval durations. Display only.
    pub fn total_duration_secs(&self) -> u64 {
        self.intervals.iter().map(|i| i.duration_secs).sum()
    }

    /// Seconds in intervals before `index`.
    pub fn cumulative_secs(&self, index: usize) -> u64 {
        self.intervals
            .iter()
            .take(index)
            .map(|i| i.duration_secs)
            .sum()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Turns a technique tag (plus a session id for `custom`) into a plan.
#[derive(Clone)]
pub struct SessionResolver {
    store: Arc<dyn SessionStore>,
    durations: TechniqueTable,
}

impl SessionResolver {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            durations: TechniqueTable::default(),
        }
    }

    pub fn with_durations(mut self, durations: TechniqueTable) -> Self {
        self.durations = durations;
        self
    }

    /// Resolve a plan. Only `custom` reads the store; the id is ignored otherwise.
    ///
    /// # Errors
    /// - [`ValidationError::MissingSessionId`] for `custom` without an id
    /// - [`CoreError::SessionNotFound`] when the store has no such session
    /// - [`CoreError::Store`] when the store read fails
    pub fn resolve(&self, technique: Technique, session_id: Option<&str>) -> Result<SessionPlan> {
        let plan = match self.durations.get(technique) {
            Some(durations) => SessionPlan::standard(technique, durations)?,
            None => {
                let id = session_id.ok_or(ValidationError::MissingSessionId)?;
                let session = self
                    .store
                    .get(id)?
                    .ok_or_else(|| CoreError::SessionNotFound {
                        session_id: id.to_string(),
                    })?;
                SessionPlan::from_custom(session)?
            }
        };
        debug!(
            technique = %plan.technique,
            intervals = plan.len(),
            total_secs = plan.total_duration_secs(),
            "resolved session plan"
        );
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySessionStore;

    fn custom(id: &str, durations: &[u64]) -> CustomSession {
        CustomSession {
            id: id.into(),
            owner_id: "alice".into(),
            name: "Study block".into(),
            intervals: durations
                .iter()
                .enumerate()
                .map(|(i, d)| Interval {
                    id: format!("i{i}"),
                    label: format!("Part {i}"),
                    duration_secs: *d,
                    kind: IntervalKind::Work,
                })
                .collect(),
        }
    }

    #[test]
    fn technique_parses_case_insensitively() {
        assert_eq!("Pomodoro".parse::<Technique>().unwrap(), Technique::Pomodoro);
        assert_eq!(" FLOWTIME ".parse::<Technique>().unwrap(), Technique::Flowtime);
        assert!("tomato".parse::<Technique>().is_err());
    }

    #[test]
    fn standard_durations() {
        let resolver = SessionResolver::new(Arc::new(MemorySessionStore::new()));
        for (technique, work, rest) in [
            (Technique::Pomodoro, 1500, 300),
            (Technique::Timeboxing, 1800, 600),
            (Technique::Flowtime, 2700, 900),
        ] {
            let plan = resolver.resolve(technique, None).unwrap();
            assert_eq!(plan.len(), 2);
            assert_eq!(plan.intervals()[0].duration_secs, work);
            assert_eq!(plan.intervals()[0].kind, IntervalKind::Work);
            assert_eq!(plan.intervals()[1].duration_secs, rest);
            assert_eq!(plan.intervals()[1].kind, IntervalKind::Rest);
            assert_eq!(plan.total_duration_secs(), work + rest);
        }
    }

    #[test]
    fn standard_ignores_session_id() {
        let resolver = SessionResolver::new(Arc::new(MemorySessionStore::new()));
        let plan = resolver
            .resolve(Technique::Pomodoro, Some("whatever"))
            .unwrap();
        assert_eq!(plan.session_id, None);
    }

    #[test]
    fn custom_resolves_in_insertion_order() {
        let store = MemorySessionStore::new();
        store.insert(custom("s1", &[60, 0, 30])).unwrap();
        let resolver = SessionResolver::new(Arc::new(store));
        let plan = resolver.resolve(Technique::Custom, Some("s1")).unwrap();
        let ids: Vec<_> = plan.intervals().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["i0", "i1", "i2"]);
        assert_eq!(plan.total_duration_secs(), 90);
        assert_eq!(plan.session_id.as_deref(), Some("s1"));
    }

    #[test]
    fn custom_missing_session_is_not_found() {
        let resolver = SessionResolver::new(Arc::new(MemorySessionStore::new()));
        let err = resolver.resolve(Technique::Custom, Some("nope")).unwrap_err();
        assert!(matches!(err, CoreError::SessionNotFound { ref session_id } if session_id == "nope"));
    }

    #[test]
    fn custom_without_id_is_rejected() {
        let resolver = SessionResolver::new(Arc::new(MemorySessionStore::new()));
        let err = resolver.resolve(Technique::Custom, None).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MissingSessionId)
        ));
    }

    #[test]
    fn empty_custom_session_is_rejected() {
        let err = SessionPlan::from_custom(custom("empty", &[])).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::EmptySession(_))
        ));
    }

    #[test]
    fn duplicate_interval_ids_are_rejected() {
        let mut session = custom("dup", &[10, 20]);
        session.intervals[1].id = "i0".into();
        let err = SessionPlan::from_custom(session).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::DuplicateIntervalId { .. })
        ));
    }

    #[test]
    fn overridden_durations_are_used() {
        let table = TechniqueTable {
            pomodoro: TechniqueDurations::from_minutes(50, 10),
            ..TechniqueTable::default()
        };
        let resolver =
            SessionResolver::new(Arc::new(MemorySessionStore::new())).with_durations(table);
        let plan = resolver.resolve(Technique::Pomodoro, None).unwrap();
        assert_eq!(plan.first_duration_secs(), 3000);
    }

    #[test]
    fn cumulative_secs() {
        let plan = SessionPlan::from_custom(custom("c", &[60, 0, 30])).unwrap();
        assert_eq!(plan.cumulative_secs(0), 0);
        assert_eq!(plan.cumulative_secs(2), 60);
        assert_eq!(plan.cumulative_secs(3), 90);
    }
}
