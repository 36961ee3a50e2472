//! Capability resolution and decision-pipeline behaviour through the public
//! API.

mod common;

use common::{RecordingAudit, ScriptedBrain, decision_orchestrator, invoker};
use mindloop_application::{CapabilityRegistry, DecisionParams};
use mindloop_domain::{
    ActionType, AgentState, AuditKind, BreakerConfig, BreakerState, CapabilityKind,
    CapabilityProvider, DecisionSource, EscalationKind, SelectionStrategy, Task, Thought,
    ThoughtContext, ThoughtKind,
};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

fn names(providers: &[CapabilityProvider]) -> Vec<&str> {
    providers.iter().map(|p| p.name.as_str()).collect()
}

fn thought(content: &str) -> (Thought, ThoughtContext) {
    let task = Task::new("answer the operator");
    let thought = Thought::new(&task, ThoughtKind::Seed, content, 1);
    (thought, ThoughtContext::new(task, AgentState::NormalWork, 1))
}

#[test]
fn test_lower_group_always_leads() {
    let registry = CapabilityRegistry::new(BreakerConfig::default());
    // Registered out of order on purpose.
    registry
        .register(CapabilityProvider::new("p2", CapabilityKind::Reasoning).with_group(1))
        .unwrap();
    registry
        .register(CapabilityProvider::new("p1", CapabilityKind::Reasoning).with_group(0))
        .unwrap();

    for _ in 0..5 {
        let resolved = registry.resolve(CapabilityKind::Reasoning, None).unwrap();
        assert_eq!(names(&resolved), vec!["p1", "p2"]);
    }
}

#[test]
fn test_round_robin_rotates_within_a_group_only() {
    let registry = CapabilityRegistry::new(BreakerConfig::default());
    for name in ["a", "b"] {
        registry
            .register(CapabilityProvider::new(name, CapabilityKind::Reasoning))
            .unwrap();
    }
    registry
        .register(CapabilityProvider::new("fallback", CapabilityKind::Reasoning).with_group(1))
        .unwrap();
    registry.set_strategy(CapabilityKind::Reasoning, 0, SelectionStrategy::RoundRobin);

    let first = registry.resolve(CapabilityKind::Reasoning, None).unwrap();
    let second = registry.resolve(CapabilityKind::Reasoning, None).unwrap();
    assert_eq!(names(&first), vec!["a", "b", "fallback"]);
    assert_eq!(names(&second), vec!["b", "a", "fallback"]);
}

#[test]
fn test_open_breaker_removes_provider_until_reset() {
    let registry = CapabilityRegistry::new(BreakerConfig::default());
    registry
        .register(CapabilityProvider::new("p1", CapabilityKind::Reasoning))
        .unwrap();
    registry
        .register(CapabilityProvider::new("p2", CapabilityKind::Reasoning).with_group(1))
        .unwrap();

    for _ in 0..BreakerConfig::default().failure_threshold {
        registry.record_failure("p1");
    }
    let resolved = registry.resolve(CapabilityKind::Reasoning, None).unwrap();
    assert_eq!(names(&resolved), vec!["p2"]);

    let health = registry.health();
    let p1 = health.iter().find(|h| h.name == "p1").unwrap();
    assert_eq!(p1.breaker.state, BreakerState::Open);

    registry.reset_breaker("p1").unwrap();
    let resolved = registry.resolve(CapabilityKind::Reasoning, None).unwrap();
    assert_eq!(names(&resolved), vec!["p1", "p2"]);
}

#[tokio::test]
async fn test_ponder_sentinel_ignores_verdicts() {
    let (invoker, _) = invoker(Arc::new(ScriptedBrain::default()));
    let orchestrator = decision_orchestrator(&invoker, DecisionParams::default(), Arc::new(RecordingAudit::default()));
    let (thought, ctx) = thought("ponder");

    let decision = orchestrator.decide(&thought, &ctx).await;
    assert_eq!(decision.verdicts.len(), 2);
    assert_eq!(decision.action.action_type(), ActionType::Ponder);
    assert_eq!(decision.action.source, DecisionSource::GuardRule);
}

#[tokio::test(start_paused = true)]
async fn test_ethical_breaker_opens_after_three_timeouts() {
    let brain = Arc::new(ScriptedBrain::hanging_ethical());
    let (invoker, _) = invoker(brain.clone());
    let audit = Arc::new(RecordingAudit::default());
    let params = DecisionParams::default()
        .with_module_timeout(Duration::from_secs(30))
        .with_max_attempts(1);
    let orchestrator = decision_orchestrator(&invoker, params, audit.clone());
    let (thought, ctx) = thought("greet the operator");

    for _ in 0..3 {
        let decision = orchestrator.decide(&thought, &ctx).await;
        assert_eq!(decision.escalations.len(), 1);
        assert_eq!(decision.escalations[0].module.as_deref(), Some("ethical"));
    }
    assert_eq!(brain.ethical_calls.load(Ordering::SeqCst), 3);

    let started = tokio::time::Instant::now();
    let decision = orchestrator.decide(&thought, &ctx).await;
    assert!(started.elapsed() < Duration::from_secs(30));
    assert_eq!(brain.ethical_calls.load(Ordering::SeqCst), 3);
    assert_eq!(decision.escalations[0].kind, EscalationKind::DmaFailure);
    assert_eq!(decision.escalations[0].attempts, 0);
    // The remaining module still drives the decision.
    assert_eq!(decision.verdicts.len(), 1);
    assert_eq!(decision.action.action_type(), ActionType::CompleteTask);

    assert_eq!(audit.0.lock().unwrap().iter().filter(|r| r.kind == AuditKind::Escalation).count(), 4);
}
