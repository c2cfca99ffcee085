use fxhash::FxHashMap;
use serde::Serialize;

use crate::problem::{stop::StopIdx, vehicle::VehicleIdx};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Stop(StopIdx),
    Vehicle(VehicleIdx),
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// The anchor a stop resolves to through its chain position.
    Vehicle,
    CurrentDemand,
}

/// Receives the before/after bracket around every field the propagator
/// touches, so a score tracker can retract the old contribution and add the
/// new one.
pub trait ChangeNotifier {
    fn before(&mut self, entity: Entity, field: Field);
    fn after(&mut self, entity: Entity, field: Field);
}

impl<N: ChangeNotifier + ?Sized> ChangeNotifier for &mut N {
    fn before(&mut self, entity: Entity, field: Field) {
        (**self).before(entity, field);
    }

    fn after(&mut self, entity: Entity, field: Field) {
        (**self).after(entity, field);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl ChangeNotifier for NoopNotifier {
    #[inline]
    fn before(&mut self, _entity: Entity, _field: Field) {}

    #[inline]
    fn after(&mut self, _entity: Entity, _field: Field) {}
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Before,
    After,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notification {
    pub phase: Phase,
    pub entity: Entity,
    pub field: Field,
}

impl Notification {
    pub fn before(entity: Entity, field: Field) -> Self {
        Notification {
            phase: Phase::Before,
            entity,
            field,
        }
    }

    pub fn after(entity: Entity, field: Field) -> Self {
        Notification {
            phase: Phase::After,
            entity,
            field,
        }
    }
}

/// Keeps every notification in arrival order.
#[derive(Debug, Default, Clone)]
pub struct NotificationLog {
    notifications: Vec<Notification>,
}

impl NotificationLog {
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    /// Number of `Before` notifications on (`entity`, `field`).
    pub fn pairs_for(&self, entity: Entity, field: Field) -> usize {
        self.notifications
            .iter()
            .filter(|n| n.phase == Phase::Before && n.entity == entity && n.field == field)
            .count()
    }

    /// Number of `Before` notifications on `field`, across all entities.
    pub fn pairs_of(&self, field: Field) -> usize {
        self.notifications
            .iter()
            .filter(|n| n.phase == Phase::Before && n.field == field)
            .count()
    }

    pub fn touches(&self, entity: Entity) -> bool {
        self.notifications.iter().any(|n| n.entity == entity)
    }
}

impl ChangeNotifier for NotificationLog {
    fn before(&mut self, entity: Entity, field: Field) {
        self.notifications.push(Notification::before(entity, field));
    }

    fn after(&mut self, entity: Entity, field: Field) {
        self.notifications.push(Notification::after(entity, field));
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketViolation {
    /// A `before` arrived while another bracket on the same entity was open.
    Nested {
        entity: Entity,
        open: Field,
        field: Field,
    },
    /// An `after` arrived with no matching open `before`.
    Unmatched { entity: Entity, field: Field },
}

/// Checks online that every `before` is closed by exactly one `after` on the
/// same (entity, field) before anything else happens to that entity.
/// Notifications are forwarded to the wrapped notifier unchanged.
#[derive(Debug, Default, Clone)]
pub struct BracketChecker<N> {
    inner: N,
    open: FxHashMap<Entity, Field>,
    violations: Vec<BracketViolation>,
    vehicle_pairs: usize,
    demand_pairs: usize,
}

impl<N: ChangeNotifier> BracketChecker<N> {
    pub fn new(inner: N) -> Self {
        BracketChecker {
            inner,
            open: FxHashMap::default(),
            violations: Vec::new(),
            vehicle_pairs: 0,
            demand_pairs: 0,
        }
    }

    pub fn inner(&self) -> &N {
        &self.inner
    }

    pub fn violations(&self) -> &[BracketViolation] {
        &self.violations
    }

    /// No violation recorded and no bracket left open.
    pub fn is_balanced(&self) -> bool {
        self.violations.is_empty() && self.open.is_empty()
    }

    pub fn pairs(&self, field: Field) -> usize {
        match field {
            Field::Vehicle => self.vehicle_pairs,
            Field::CurrentDemand => self.demand_pairs,
        }
    }
}

impl<N: ChangeNotifier> ChangeNotifier for BracketChecker<N> {
    fn before(&mut self, entity: Entity, field: Field) {
        if let Some(&open) = self.open.get(&entity) {
            self.violations.push(BracketViolation::Nested {
                entity,
                open,
                field,
            });
        }
        self.open.insert(entity, field);
        self.inner.before(entity, field);
    }

    fn after(&mut self, entity: Entity, field: Field) {
        match self.open.get(&entity) {
            Some(&open) if open == field => {
                self.open.remove(&entity);
                match field {
                    Field::Vehicle => self.vehicle_pairs += 1,
                    Field::CurrentDemand => self.demand_pairs += 1,
                }
            }
            _ => self
                .violations
                .push(BracketViolation::Unmatched { entity, field }),
        }
        self.inner.after(entity, field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STOP: Entity = Entity::Stop(StopIdx::new(0));
    const VEHICLE: Entity = Entity::Vehicle(VehicleIdx::new(0));

    #[test]
    fn test_log_counts_pairs() {
        let mut log = NotificationLog::default();
        log.before(STOP, Field::Vehicle);
        log.after(STOP, Field::Vehicle);
        log.before(VEHICLE, Field::CurrentDemand);
        log.after(VEHICLE, Field::CurrentDemand);

        assert_eq!(log.len(), 4);
        assert_eq!(log.pairs_for(STOP, Field::Vehicle), 1);
        assert_eq!(log.pairs_for(STOP, Field::CurrentDemand), 0);
        assert_eq!(log.pairs_of(Field::CurrentDemand), 1);
        assert!(log.touches(VEHICLE));
    }

    #[test]
    fn test_checker_accepts_sequential_brackets() {
        let mut checker = BracketChecker::new(NotificationLog::default());
        checker.before(STOP, Field::Vehicle);
        checker.before(VEHICLE, Field::CurrentDemand);
        checker.after(VEHICLE, Field::CurrentDemand);
        checker.after(STOP, Field::Vehicle);

        assert!(checker.is_balanced());
        assert_eq!(checker.pairs(Field::Vehicle), 1);
        assert_eq!(checker.pairs(Field::CurrentDemand), 1);
        assert_eq!(checker.inner().len(), 4);
    }

    #[test]
    fn test_checker_flags_nested_bracket_on_same_entity() {
        let mut checker = BracketChecker::new(NoopNotifier);
        checker.before(VEHICLE, Field::CurrentDemand);
        checker.before(VEHICLE, Field::Vehicle);

        assert_eq!(
            checker.violations(),
            &[BracketViolation::Nested {
                entity: VEHICLE,
                open: Field::CurrentDemand,
                field: Field::Vehicle,
            }]
        );
    }

    #[test]
    fn test_checker_flags_unmatched_after() {
        let mut checker = BracketChecker::new(NoopNotifier);
        checker.after(STOP, Field::Vehicle);
        checker.before(STOP, Field::Vehicle);
        checker.after(STOP, Field::CurrentDemand);

        assert_eq!(checker.violations().len(), 2);
        assert!(!checker.is_balanced());
    }
}
