//! Thought lifecycle: seeding, follow-ups, status transitions, queue
//! population and retention cleanup.

use super::queue::ProcessingQueue;
use super::{LifecycleError, retention_cutoff};
use crate::ports::store::{TaskStore, ThoughtStore};
use mindloop_domain::{
    ActionType, DomainError, QueueItem, Task, TaskId, Thought, ThoughtId, ThoughtKind,
    ThoughtStatus,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub struct ThoughtLifecycleManager {
    thoughts: Arc<dyn ThoughtStore>,
    tasks: Arc<dyn TaskStore>,
    max_rounds: u32,
    /// Tasks known to have a seed; held across the store check so two
    /// concurrent seeders cannot both insert
    seeded: Mutex<HashSet<TaskId>>,
}

impl ThoughtLifecycleManager {
    pub fn new(thoughts: Arc<dyn ThoughtStore>, tasks: Arc<dyn TaskStore>, max_rounds: u32) -> Self {
        Self {
            thoughts,
            tasks,
            max_rounds,
            seeded: Mutex::new(HashSet::new()),
        }
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub async fn get_thought(&self, id: &ThoughtId) -> Result<Thought, LifecycleError> {
        self.thoughts
            .get_thought(id)
            .await?
            .ok_or_else(|| LifecycleError::ThoughtNotFound(id.clone()))
    }

    pub async fn thoughts_for_task(&self, task_id: &TaskId) -> Result<Vec<Thought>, LifecycleError> {
        Ok(self.thoughts.thoughts_for_task(task_id).await?)
    }

    // ==================== Creation ====================

    /// Create the single seed thought for `task`.
    ///
    /// Returns `None` when the task already has one.
    pub async fn seed_thought(&self, task: &Task, round: u64) -> Result<Option<Thought>, LifecycleError> {
        let mut seeded = self.seeded.lock().await;
        if seeded.contains(&task.id) {
            return Ok(None);
        }
        let existing = self.thoughts.thoughts_for_task(&task.id).await?;
        if existing.iter().any(|t| t.kind.is_seed()) {
            seeded.insert(task.id.clone());
            return Ok(None);
        }

        let kind = if task.is_bootstrap() {
            ThoughtKind::Bootstrap
        } else {
            ThoughtKind::Seed
        };
        let thought = Thought::new(task, kind, task.description.clone(), round)
            .with_context_note(format!("from {} ({})", task.origin.requester, task.origin.channel));
        self.thoughts.insert_thought(thought.clone()).await?;
        seeded.insert(task.id.clone());
        debug!(task_id = %task.id, thought_id = %thought.id, kind = kind.as_str(), "Seed thought created");
        Ok(Some(thought))
    }

    /// Insert a thought created outside the seed/follow-up paths.
    pub async fn create_thought(&self, thought: Thought) -> Result<Thought, LifecycleError> {
        self.require_task(&thought.task_id).await?;
        self.thoughts.insert_thought(thought.clone()).await?;
        Ok(thought)
    }

    /// A monitoring or meta thought attached to a system task.
    pub async fn create_system_thought(
        &self,
        task: &Task,
        kind: ThoughtKind,
        content: impl Into<String>,
        round: u64,
    ) -> Result<Thought, LifecycleError> {
        if !kind.is_system() {
            return Err(DomainError::InvariantViolation(format!(
                "'{}' is not a system thought kind",
                kind.as_str()
            ))
            .into());
        }
        self.create_thought(Thought::new(task, kind, content, round)).await
    }

    /// Derive the next thought in a chain.
    ///
    /// Fails with `RoundLimitExceeded` instead of creating a thought past
    /// the configured maximum.
    pub async fn follow_up(
        &self,
        parent: &Thought,
        content: impl Into<String>,
        notes: Vec<String>,
        round: u64,
    ) -> Result<Thought, LifecycleError> {
        if parent.round_count + 1 > self.max_rounds {
            return Err(LifecycleError::RoundLimitExceeded {
                thought: parent.id.clone(),
                max: self.max_rounds,
            });
        }
        self.require_task(&parent.task_id).await?;

        let mut next = parent.follow_up(content, round);
        next.ponder_notes.extend(notes);
        self.thoughts.insert_thought(next.clone()).await?;
        debug!(
            parent = %parent.id,
            thought_id = %next.id,
            round_count = next.round_count,
            "Follow-up thought created"
        );
        Ok(next)
    }

    /// Whether a follow-up of `thought` would stay within the round limit.
    pub fn can_follow_up(&self, thought: &Thought) -> bool {
        thought.round_count < self.max_rounds
    }

    // ==================== Status Transitions ====================

    /// Claim a pending thought for processing.
    pub async fn mark_processing(&self, id: &ThoughtId) -> Result<Thought, LifecycleError> {
        let mut thought = self.get_thought(id).await?;
        if thought.status != ThoughtStatus::Pending {
            return Err(LifecycleError::InvalidStatus {
                record: format!("thought {}", id),
                actual: thought.status.to_string(),
                expected: ThoughtStatus::Pending.to_string(),
            });
        }
        self.check_invariants(&thought).await?;
        thought.set_status(ThoughtStatus::Processing);
        self.thoughts.update_thought(&thought).await?;
        Ok(thought)
    }

    /// Move a thought to a terminal status, recording the action taken.
    pub async fn finish(
        &self,
        id: &ThoughtId,
        status: ThoughtStatus,
        action: Option<(ActionType, String)>,
    ) -> Result<Thought, LifecycleError> {
        let mut thought = self.get_thought(id).await?;
        if thought.status.is_terminal() {
            return Err(LifecycleError::InvalidStatus {
                record: format!("thought {}", id),
                actual: thought.status.to_string(),
                expected: "a non-terminal status".to_string(),
            });
        }
        self.check_invariants(&thought).await?;
        if let Some((action, rationale)) = action {
            thought.record_action(action, rationale);
        }
        thought.set_status(status);
        self.thoughts.update_thought(&thought).await?;
        Ok(thought)
    }

    /// Fail a thought; a thought already terminal is left untouched.
    pub async fn mark_failed(&self, id: &ThoughtId, reason: &str) -> Result<(), LifecycleError> {
        let mut thought = self.get_thought(id).await?;
        if thought.status.is_terminal() {
            return Ok(());
        }
        thought.final_rationale = Some(reason.to_string());
        thought.set_status(ThoughtStatus::Failed);
        self.thoughts.update_thought(&thought).await?;
        warn!(thought_id = %id, reason, "Thought failed");
        Ok(())
    }

    /// Fail every thought still marked processing. Used when a round is
    /// abandoned and nothing will finish those thoughts.
    pub async fn fail_in_flight(&self, reason: &str) -> Result<usize, LifecycleError> {
        let in_flight = self.thoughts.thoughts_by_status(ThoughtStatus::Processing).await?;
        for thought in &in_flight {
            self.mark_failed(&thought.id, reason).await?;
        }
        Ok(in_flight.len())
    }

    /// Parent task exists and the round counter is within bounds.
    async fn check_invariants(&self, thought: &Thought) -> Result<(), LifecycleError> {
        self.require_task(&thought.task_id).await?;
        if thought.round_count > self.max_rounds {
            return Err(DomainError::InvariantViolation(format!(
                "thought {} is at round {} (max {})",
                thought.id, thought.round_count, self.max_rounds
            ))
            .into());
        }
        Ok(())
    }

    async fn require_task(&self, task_id: &TaskId) -> Result<(), LifecycleError> {
        match self.tasks.get_task(task_id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::InvariantViolation(format!(
                "thought refers to missing task {}",
                task_id
            ))
            .into()),
        }
    }

    // ==================== Queries ====================

    /// Actions already taken for a task, oldest first.
    pub async fn prior_actions(&self, task_id: &TaskId) -> Result<Vec<ActionType>, LifecycleError> {
        let mut thoughts = self.thoughts.thoughts_for_task(task_id).await?;
        thoughts.sort_by_key(|t| t.updated_at);
        Ok(thoughts.iter().filter_map(|t| t.final_action).collect())
    }

    /// Pending thoughts that do real work (system thoughts excluded).
    pub async fn pending_work(&self) -> Result<usize, LifecycleError> {
        Ok(self
            .thoughts
            .thoughts_by_status(ThoughtStatus::Pending)
            .await?
            .iter()
            .filter(|t| !t.kind.is_system())
            .count())
    }

    /// Distribution of final actions over thoughts completed since `since_ms`.
    pub async fn action_distribution(&self, since_ms: u64) -> Result<BTreeMap<ActionType, usize>, LifecycleError> {
        let mut distribution = BTreeMap::new();
        for status in [ThoughtStatus::Completed, ThoughtStatus::Deferred] {
            for thought in self.thoughts.thoughts_by_status(status).await? {
                if thought.updated_at >= since_ms
                    && let Some(action) = thought.final_action
                {
                    *distribution.entry(action).or_insert(0) += 1;
                }
            }
        }
        Ok(distribution)
    }

    /// Tasks that still own at least one stored thought.
    pub async fn referenced_tasks(&self) -> Result<HashSet<TaskId>, LifecycleError> {
        let mut referenced = HashSet::new();
        for status in [
            ThoughtStatus::Pending,
            ThoughtStatus::Processing,
            ThoughtStatus::Completed,
            ThoughtStatus::Failed,
            ThoughtStatus::Deferred,
        ] {
            for thought in self.thoughts.thoughts_by_status(status).await? {
                referenced.insert(thought.task_id);
            }
        }
        Ok(referenced)
    }

    pub async fn count(&self, status: ThoughtStatus) -> Result<usize, LifecycleError> {
        Ok(self.thoughts.count_thoughts(status).await?)
    }

    // ==================== Queue Population ====================

    /// Fill `queue` with pending thoughts admitted by `admit`.
    ///
    /// Highest priority first, oldest first within a priority; at most
    /// `capacity` items and never beyond the queue's own room.
    pub async fn populate_queue(
        &self,
        queue: &ProcessingQueue,
        round: u64,
        capacity: usize,
        admit: impl Fn(&Thought) -> bool,
    ) -> Result<usize, LifecycleError> {
        let mut pending: Vec<Thought> = self
            .thoughts
            .thoughts_by_status(ThoughtStatus::Pending)
            .await?
            .into_iter()
            .filter(|t| admit(t) && !queue.contains(&t.id))
            .collect();
        pending.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.created_at.cmp(&b.created_at))
        });

        let room = capacity.min(queue.remaining());
        let mut added = 0;
        for thought in pending.iter().take(room) {
            if queue.push(QueueItem::from_thought(thought, round)).is_err() {
                break;
            }
            added += 1;
        }
        debug!(round, added, available = pending.len(), "Queue populated");
        Ok(added)
    }

    // ==================== Housekeeping ====================

    /// Remove terminal thoughts last updated before the retention window.
    pub async fn cleanup(&self, retention: Duration) -> Result<usize, LifecycleError> {
        let cutoff = retention_cutoff(retention);
        let mut removed = 0;
        for status in [ThoughtStatus::Completed, ThoughtStatus::Failed, ThoughtStatus::Deferred] {
            for thought in self.thoughts.thoughts_by_status(status).await? {
                if thought.updated_at < cutoff && self.thoughts.delete_thought(&thought.id).await? {
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            info!(removed, "Archived terminal thoughts");
        }
        self.prune_seeded().await?;
        Ok(removed)
    }

    /// Forget seed markers of tasks that are gone from the store.
    pub async fn prune_seeded(&self) -> Result<(), LifecycleError> {
        let mut seeded = self.seeded.lock().await;
        let mut gone = Vec::new();
        for task_id in seeded.iter() {
            if self.tasks.get_task(task_id).await?.is_none() {
                gone.push(task_id.clone());
            }
        }
        for task_id in &gone {
            seeded.remove(task_id);
        }
        if !gone.is_empty() {
            debug!(pruned = gone.len(), "Dropped seed markers of archived tasks");
        }
        Ok(())
    }
}
