//! Capability registry: providers, priority groups, strategies and breakers.

use mindloop_domain::{
    BreakerConfig, BreakerSnapshot, BreakerState, CapabilityKind, CapabilityProvider,
    CircuitBreaker, DomainError, ProviderPriority, SelectionStrategy,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Health of one provider, for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderHealth {
    pub name: String,
    pub kind: CapabilityKind,
    pub group: u32,
    pub priority: ProviderPriority,
    pub breaker: BreakerSnapshot,
}

struct Entry {
    provider: CapabilityProvider,
    breaker: CircuitBreaker,
    /// Registration order, the final tie-breaker
    seq: u64,
}

#[derive(Default)]
struct Inner {
    entries: Vec<Entry>,
    strategies: HashMap<(CapabilityKind, u32), SelectionStrategy>,
    rotation: HashMap<(CapabilityKind, u32), usize>,
    next_seq: u64,
}

/// Maps capability requests to ranked providers.
///
/// All state sits behind one lock so resolution, breaker updates and
/// administrative changes are linearizable.
pub struct CapabilityRegistry {
    inner: Mutex<Inner>,
    breaker_config: BreakerConfig,
}

impl CapabilityRegistry {
    pub fn new(breaker_config: BreakerConfig) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            breaker_config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ==================== Registration ====================

    /// Register a provider; names must be unique.
    pub fn register(&self, provider: CapabilityProvider) -> Result<(), DomainError> {
        let mut inner = self.lock();
        if inner.entries.iter().any(|e| e.provider.name == provider.name) {
            return Err(DomainError::ConfigurationError(format!(
                "provider '{}' is already registered",
                provider.name
            )));
        }

        info!(
            provider = %provider.name,
            kind = %provider.kind,
            group = provider.group,
            "Registered capability provider"
        );
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.push(Entry {
            provider,
            breaker: CircuitBreaker::new(self.breaker_config),
            seq,
        });
        Ok(())
    }

    pub fn deregister(&self, name: &str) -> Result<CapabilityProvider, DomainError> {
        let mut inner = self.lock();
        let index = inner
            .entries
            .iter()
            .position(|e| e.provider.name == name)
            .ok_or_else(|| DomainError::UnknownProvider(name.to_string()))?;
        info!(provider = name, "Deregistered capability provider");
        Ok(inner.entries.remove(index).provider)
    }

    pub fn providers(&self, kind: CapabilityKind) -> Vec<CapabilityProvider> {
        let inner = self.lock();
        let mut entries: Vec<&Entry> = inner
            .entries
            .iter()
            .filter(|e| e.provider.kind == kind)
            .collect();
        entries.sort_by_key(|e| (e.provider.group, e.provider.priority, e.seq));
        entries.into_iter().map(|e| e.provider.clone()).collect()
    }

    // ==================== Resolution ====================

    /// Resolve a capability to an ordered provider list.
    ///
    /// Groups are visited in ascending order. Within a group providers are
    /// ranked by priority then registration order, and the group's strategy
    /// decides the starting point (stable for first-available, rotating per
    /// call for round-robin). Providers whose breaker is open are skipped;
    /// if none remain anywhere the result is `NoAvailableProvider`.
    pub fn resolve(
        &self,
        kind: CapabilityKind,
        handler: Option<&str>,
    ) -> Result<Vec<CapabilityProvider>, DomainError> {
        let now = Instant::now();
        let mut inner = self.lock();
        let Inner {
            entries,
            strategies,
            rotation,
            ..
        } = &mut *inner;

        let mut groups: BTreeMap<u32, Vec<&mut Entry>> = BTreeMap::new();
        for entry in entries.iter_mut() {
            if entry.provider.kind == kind && entry.provider.serves(handler) {
                groups.entry(entry.provider.group).or_default().push(entry);
            }
        }

        let mut resolved = Vec::new();
        for (group, mut members) in groups {
            members.sort_by_key(|e| (e.provider.priority, e.seq));
            let mut usable: Vec<CapabilityProvider> = members
                .into_iter()
                .filter_map(|e| (e.breaker.poll(now) != BreakerState::Open).then(|| e.provider.clone()))
                .collect();

            let strategy = strategies.get(&(kind, group)).copied().unwrap_or_default();
            if strategy == SelectionStrategy::RoundRobin && usable.len() > 1 {
                let counter = rotation.entry((kind, group)).or_insert(0);
                let start = *counter % usable.len();
                *counter = counter.wrapping_add(1);
                usable.rotate_left(start);
            }
            resolved.extend(usable);
        }

        if resolved.is_empty() {
            warn!(kind = %kind, handler = ?handler, "No available provider");
            return Err(DomainError::NoAvailableProvider(kind));
        }
        debug!(
            kind = %kind,
            providers = ?resolved.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            "Resolved capability"
        );
        Ok(resolved)
    }

    // ==================== Breaker Feedback ====================

    pub fn record_success(&self, name: &str) {
        let mut inner = self.lock();
        if let Some(entry) = inner.entries.iter_mut().find(|e| e.provider.name == name) {
            entry.breaker.record_success(Instant::now());
        }
    }

    pub fn record_failure(&self, name: &str) {
        let mut inner = self.lock();
        if let Some(entry) = inner.entries.iter_mut().find(|e| e.provider.name == name) {
            let now = Instant::now();
            let before = entry.breaker.poll(now);
            entry.breaker.record_failure(now);
            let after = entry.breaker.poll(now);
            if before != after && after == BreakerState::Open {
                warn!(provider = name, "Provider circuit breaker opened");
            }
        }
    }

    // ==================== Administration ====================

    /// Change a provider's priority and, optionally, its group.
    pub fn update_priority(
        &self,
        name: &str,
        priority: ProviderPriority,
        group: Option<u32>,
    ) -> Result<(), DomainError> {
        let mut inner = self.lock();
        let entry = inner
            .entries
            .iter_mut()
            .find(|e| e.provider.name == name)
            .ok_or_else(|| DomainError::UnknownProvider(name.to_string()))?;
        entry.provider.priority = priority;
        if let Some(group) = group {
            entry.provider.group = group;
        }
        info!(provider = name, priority = %priority, group = entry.provider.group, "Updated provider priority");
        Ok(())
    }

    pub fn set_strategy(&self, kind: CapabilityKind, group: u32, strategy: SelectionStrategy) {
        let mut inner = self.lock();
        inner.strategies.insert((kind, group), strategy);
        inner.rotation.remove(&(kind, group));
        info!(kind = %kind, group, strategy = ?strategy, "Updated selection strategy");
    }

    /// Force a provider's breaker closed.
    pub fn reset_breaker(&self, name: &str) -> Result<(), DomainError> {
        let mut inner = self.lock();
        let entry = inner
            .entries
            .iter_mut()
            .find(|e| e.provider.name == name)
            .ok_or_else(|| DomainError::UnknownProvider(name.to_string()))?;
        entry.breaker.reset();
        info!(provider = name, "Reset provider circuit breaker");
        Ok(())
    }

    pub fn health(&self) -> Vec<ProviderHealth> {
        let now = Instant::now();
        let inner = self.lock();
        let mut entries: Vec<&Entry> = inner.entries.iter().collect();
        entries.sort_by_key(|e| (e.provider.kind.as_str(), e.provider.group, e.provider.priority, e.seq));
        entries
            .into_iter()
            .map(|e| ProviderHealth {
                name: e.provider.name.clone(),
                kind: e.provider.kind,
                group: e.provider.group,
                priority: e.provider.priority,
                breaker: e.breaker.snapshot(now),
            })
            .collect()
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new(BreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn reasoning(name: &str, group: u32) -> CapabilityProvider {
        CapabilityProvider::new(name, CapabilityKind::Reasoning).with_group(group)
    }

    fn names(providers: &[CapabilityProvider]) -> Vec<&str> {
        providers.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_groups_resolve_in_ascending_order() {
        let registry = CapabilityRegistry::default();
        registry.register(reasoning("p2", 1)).unwrap();
        registry.register(reasoning("p1", 0)).unwrap();

        for _ in 0..5 {
            let resolved = registry.resolve(CapabilityKind::Reasoning, None).unwrap();
            assert_eq!(names(&resolved), vec!["p1", "p2"]);
        }
    }

    #[test]
    fn test_priority_then_registration_within_group() {
        let registry = CapabilityRegistry::default();
        registry.register(reasoning("late", 0)).unwrap();
        registry
            .register(reasoning("urgent", 0).with_priority(ProviderPriority::Critical))
            .unwrap();
        registry.register(reasoning("also_late", 0)).unwrap();

        let resolved = registry.resolve(CapabilityKind::Reasoning, None).unwrap();
        assert_eq!(names(&resolved), vec!["urgent", "late", "also_late"]);
    }

    #[test]
    fn test_round_robin_rotates_within_group_only() {
        let registry = CapabilityRegistry::default();
        registry.register(reasoning("a", 0)).unwrap();
        registry.register(reasoning("b", 0)).unwrap();
        registry.register(reasoning("z", 1)).unwrap();
        registry.set_strategy(CapabilityKind::Reasoning, 0, SelectionStrategy::RoundRobin);

        let first = registry.resolve(CapabilityKind::Reasoning, None).unwrap();
        let second = registry.resolve(CapabilityKind::Reasoning, None).unwrap();
        let third = registry.resolve(CapabilityKind::Reasoning, None).unwrap();
        assert_eq!(names(&first), vec!["a", "b", "z"]);
        assert_eq!(names(&second), vec!["b", "a", "z"]);
        assert_eq!(names(&third), vec!["a", "b", "z"]);
    }

    #[test]
    fn test_open_breaker_is_skipped() {
        let registry = CapabilityRegistry::default();
        registry.register(reasoning("p1", 0)).unwrap();
        registry.register(reasoning("p2", 1)).unwrap();
        for _ in 0..3 {
            registry.record_failure("p1");
        }

        let resolved = registry.resolve(CapabilityKind::Reasoning, None).unwrap();
        assert_eq!(names(&resolved), vec!["p2"]);
    }

    #[test]
    fn test_no_available_provider_when_all_open() {
        let registry = CapabilityRegistry::new(
            BreakerConfig::default().with_cooldown(Duration::from_secs(600)),
        );
        registry.register(reasoning("only", 0)).unwrap();
        for _ in 0..3 {
            registry.record_failure("only");
        }

        assert_eq!(
            registry.resolve(CapabilityKind::Reasoning, None),
            Err(DomainError::NoAvailableProvider(CapabilityKind::Reasoning))
        );
        assert_eq!(
            registry.resolve(CapabilityKind::Memory, None),
            Err(DomainError::NoAvailableProvider(CapabilityKind::Memory))
        );
    }

    #[test]
    fn test_reset_breaker_restores_provider() {
        let registry = CapabilityRegistry::default();
        registry.register(reasoning("p1", 0)).unwrap();
        for _ in 0..3 {
            registry.record_failure("p1");
        }
        registry.reset_breaker("p1").unwrap();

        assert_eq!(names(&registry.resolve(CapabilityKind::Reasoning, None).unwrap()), vec!["p1"]);
        let health = registry.health();
        assert_eq!(health[0].breaker.state, BreakerState::Closed);
        assert_eq!(health[0].breaker.transition_count, 2);
        assert!(registry.reset_breaker("ghost").is_err());
    }

    #[test]
    fn test_handler_scoped_providers() {
        let registry = CapabilityRegistry::default();
        registry.register(reasoning("shared", 1)).unwrap();
        registry.register(reasoning("ethics_only", 0).with_handler("ethical")).unwrap();

        let ethical = registry.resolve(CapabilityKind::Reasoning, Some("ethical")).unwrap();
        assert_eq!(names(&ethical), vec!["ethics_only", "shared"]);

        let other = registry.resolve(CapabilityKind::Reasoning, Some("common_sense")).unwrap();
        assert_eq!(names(&other), vec!["shared"]);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let registry = CapabilityRegistry::default();
        registry.register(reasoning("p1", 0)).unwrap();
        assert!(matches!(
            registry.register(reasoning("p1", 2)),
            Err(DomainError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_update_priority_moves_group() {
        let registry = CapabilityRegistry::default();
        registry.register(reasoning("p1", 0)).unwrap();
        registry.register(reasoning("p2", 1)).unwrap();
        registry
            .update_priority("p1", ProviderPriority::Fallback, Some(2))
            .unwrap();

        let resolved = registry.resolve(CapabilityKind::Reasoning, None).unwrap();
        assert_eq!(names(&resolved), vec!["p2", "p1"]);
        assert_eq!(registry.deregister("p2").unwrap().name, "p2");
        assert!(registry.deregister("p2").is_err());
    }
}
