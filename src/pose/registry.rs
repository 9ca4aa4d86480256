use crate::{
    error::StreamError,
    types::{ClassificationResult, LandmarkSet},
};

use super::asanas;

pub type PosePredicate = fn(&LandmarkSet) -> bool;

/// A named posture and the geometric rule that recognises it.
#[derive(Clone, Copy, Debug)]
pub struct PoseDefinition {
    name: &'static str,
    predicate: PosePredicate,
}

impl PoseDefinition {
    pub const fn new(name: &'static str, predicate: PosePredicate) -> Self {
        Self { name, predicate }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn matches(&self, landmarks: &LandmarkSet) -> bool {
        (self.predicate)(landmarks)
    }
}

/// Ordered set of pose definitions. Registration order is evaluation and
/// reporting order. Read-only once built, so one instance is shared by all
/// sessions.
#[derive(Clone, Debug, Default)]
pub struct PoseRegistry {
    definitions: Vec<PoseDefinition>,
}

impl PoseRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        Self {
            definitions: asanas::ASANAS.to_vec(),
        }
    }

    pub fn register(&mut self, definition: PoseDefinition) -> Result<(), StreamError> {
        if self.definitions.iter().any(|d| d.name == definition.name) {
            return Err(StreamError::DuplicatePose(definition.name.to_string()));
        }
        self.definitions.push(definition);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.definitions.iter().map(|d| d.name)
    }

    /// Every definition whose predicate holds, in registration order. No
    /// predicate runs when the frame had no detection.
    pub fn classify(&self, landmarks: Option<&LandmarkSet>) -> ClassificationResult {
        let Some(landmarks) = landmarks else {
            return ClassificationResult::empty();
        };

        ClassificationResult::from_matches(
            self.definitions
                .iter()
                .filter(|d| d.matches(landmarks))
                .map(|d| d.name)
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::pose::asanas::tests::standing;

    static CALLS: AtomicUsize = AtomicUsize::new(0);

    fn counting(_: &LandmarkSet) -> bool {
        CALLS.fetch_add(1, Ordering::SeqCst);
        true
    }

    fn always(_: &LandmarkSet) -> bool {
        true
    }

    fn never(_: &LandmarkSet) -> bool {
        false
    }

    #[test]
    fn builtin_has_twenty_one_unique_poses() {
        let registry = PoseRegistry::builtin();
        assert_eq!(registry.len(), 21);
        let mut names: Vec<_> = registry.names().collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 21);
    }

    #[test]
    fn absent_landmarks_skip_every_predicate() {
        let mut registry = PoseRegistry::empty();
        registry
            .register(PoseDefinition::new("Counting", counting))
            .unwrap();
        let before = CALLS.load(Ordering::SeqCst);
        assert!(registry.classify(None).is_empty());
        assert_eq!(CALLS.load(Ordering::SeqCst), before);

        assert!(PoseRegistry::builtin().classify(None).is_empty());
    }

    #[test]
    fn reports_all_matches_in_registration_order() {
        let mut registry = PoseRegistry::empty();
        registry.register(PoseDefinition::new("Zeta", always)).unwrap();
        registry.register(PoseDefinition::new("Skipped", never)).unwrap();
        registry.register(PoseDefinition::new("Alpha", always)).unwrap();

        let result = registry.classify(Some(&standing()));
        assert_eq!(result.names(), &["Zeta", "Alpha"]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = PoseRegistry::builtin();
        let err = registry
            .register(PoseDefinition::new("Tadasana", always))
            .unwrap_err();
        assert!(matches!(err, StreamError::DuplicatePose(name) if name == "Tadasana"));
        assert_eq!(registry.len(), 21);
    }

    #[test]
    fn classification_is_deterministic() {
        let registry = PoseRegistry::builtin();
        let landmarks = standing();
        let first = registry.classify(Some(&landmarks));
        let second = registry.classify(Some(&landmarks));
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
}
