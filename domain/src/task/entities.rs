//! Task and Thought entities.
//!
//! Both are flat records: every field is a scalar, a string, or a list of
//! strings, so any persistent store can hold them without nested
//! polymorphic blobs.

use super::priority::Priority;
use crate::action::ActionType;
use crate::core::current_timestamp;
use crate::core::ids::{TaskId, ThoughtId};
use serde::{Deserialize, Serialize};

/// Status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created, waiting for activation
    #[default]
    Pending,
    /// Activated; thoughts may be generated for it
    Active,
    /// Finished successfully
    Completed,
    /// Finished unsuccessfully (rejected or fatally misconfigured)
    Failed,
    /// Handed to an external authority
    Deferred,
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Active => "active",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Deferred => "deferred",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Deferred
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a task came from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskOrigin {
    /// Channel the request arrived on (e.g. "cli", "api", "system")
    pub channel: String,
    /// Who asked for it
    pub requester: String,
}

impl TaskOrigin {
    pub fn new(channel: impl Into<String>, requester: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            requester: requester.into(),
        }
    }

    /// Origin for work the runtime schedules for itself.
    pub fn system() -> Self {
        Self::new("system", "mindloop")
    }
}

/// Marks a task as one step of the ordered bootstrap sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapStepRef {
    /// Position in the sequence (0-based)
    pub index: usize,
    /// Step name (e.g. "verify_identity")
    pub name: String,
    /// Whether the step must speak before it may complete
    pub requires_speak: bool,
}

/// A unit of externally or internally originated intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    /// Name of the action profile that bounds what this task may do
    pub profile: String,
    pub origin: TaskOrigin,
    /// Set only for bootstrap sequence tasks
    pub bootstrap_step: Option<BootstrapStepRef>,
    /// Human-readable outcome once terminal
    pub outcome: Option<String>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Task {
    /// Profile used when a task does not name one.
    pub const DEFAULT_PROFILE: &'static str = "default";

    pub fn new(description: impl Into<String>) -> Self {
        let now = current_timestamp();
        Self {
            id: TaskId::generate(),
            description: description.into(),
            status: TaskStatus::Pending,
            priority: Priority::default(),
            profile: Self::DEFAULT_PROFILE.to_string(),
            origin: TaskOrigin::system(),
            bootstrap_step: None,
            outcome: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: impl Into<TaskId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    pub fn with_origin(mut self, origin: TaskOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_bootstrap_step(mut self, step: BootstrapStepRef) -> Self {
        self.bootstrap_step = Some(step);
        self
    }

    pub fn is_bootstrap(&self) -> bool {
        self.bootstrap_step.is_some()
    }

    /// Whether this task is a bootstrap step that must speak before completing.
    pub fn requires_speak(&self) -> bool {
        self.bootstrap_step
            .as_ref()
            .is_some_and(|step| step.requires_speak)
    }

    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
        self.updated_at = current_timestamp();
    }
}

/// Status of a thought
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThoughtStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Deferred,
}

impl ThoughtStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ThoughtStatus::Pending => "pending",
            ThoughtStatus::Processing => "processing",
            ThoughtStatus::Completed => "completed",
            ThoughtStatus::Failed => "failed",
            ThoughtStatus::Deferred => "deferred",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ThoughtStatus::Completed | ThoughtStatus::Failed | ThoughtStatus::Deferred
        )
    }
}

impl std::fmt::Display for ThoughtStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a thought came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThoughtKind {
    /// Created directly for a task by an external caller
    #[default]
    Standard,
    /// The single initial thought for a task
    Seed,
    /// Created after an action was dispatched for a parent thought
    FollowUp,
    /// Seed thought of a bootstrap step task
    Bootstrap,
    /// Emitted by a round that found nothing to do
    Monitoring,
    /// Housekeeping (e.g. memory consistency); preempts normal ordering
    Meta,
}

impl ThoughtKind {
    pub fn as_str(&self) -> &str {
        match self {
            ThoughtKind::Standard => "standard",
            ThoughtKind::Seed => "seed",
            ThoughtKind::FollowUp => "follow_up",
            ThoughtKind::Bootstrap => "bootstrap",
            ThoughtKind::Monitoring => "monitoring",
            ThoughtKind::Meta => "meta",
        }
    }

    /// Seed-like kinds: at most one per task.
    pub fn is_seed(&self) -> bool {
        matches!(self, ThoughtKind::Seed | ThoughtKind::Bootstrap)
    }

    /// Work the runtime generates for itself rather than for a requester.
    pub fn is_system(&self) -> bool {
        matches!(self, ThoughtKind::Monitoring | ThoughtKind::Meta)
    }
}

/// One reasoning step belonging to a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thought {
    pub id: ThoughtId,
    pub task_id: TaskId,
    pub kind: ThoughtKind,
    pub status: ThoughtStatus,
    /// Inherited from the parent task at creation
    pub priority: Priority,
    pub content: String,
    /// Snapshot of the context this thought was created in
    pub context_note: Option<String>,
    /// Reflection accumulated across ponder rounds
    pub ponder_notes: Vec<String>,
    /// Round in which this thought was created
    pub round_created: u64,
    /// Depth of the follow-up chain (0 for seeds)
    pub round_count: u32,
    pub parent_thought: Option<ThoughtId>,
    /// Action finally taken for this thought, once decided
    pub final_action: Option<ActionType>,
    pub final_rationale: Option<String>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Thought {
    pub fn new(task: &Task, kind: ThoughtKind, content: impl Into<String>, round: u64) -> Self {
        let now = current_timestamp();
        Self {
            id: ThoughtId::generate(),
            task_id: task.id.clone(),
            kind,
            status: ThoughtStatus::Pending,
            priority: task.priority,
            content: content.into(),
            context_note: None,
            ponder_notes: Vec::new(),
            round_created: round,
            round_count: 0,
            parent_thought: None,
            final_action: None,
            final_rationale: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_context_note(mut self, note: impl Into<String>) -> Self {
        self.context_note = Some(note.into());
        self
    }

    /// Derive a follow-up: same task, one more round, notes carried over.
    pub fn follow_up(&self, content: impl Into<String>, round: u64) -> Self {
        let now = current_timestamp();
        Self {
            id: ThoughtId::generate(),
            task_id: self.task_id.clone(),
            kind: ThoughtKind::FollowUp,
            status: ThoughtStatus::Pending,
            priority: self.priority,
            content: content.into(),
            context_note: None,
            ponder_notes: self.ponder_notes.clone(),
            round_created: round,
            round_count: self.round_count + 1,
            parent_thought: Some(self.id.clone()),
            final_action: None,
            final_rationale: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_status(&mut self, status: ThoughtStatus) {
        self.status = status;
        self.updated_at = current_timestamp();
    }

    pub fn record_action(&mut self, action: ActionType, rationale: impl Into<String>) {
        self.final_action = Some(action);
        self.final_rationale = Some(rationale.into());
        self.updated_at = current_timestamp();
    }
}
