//! Flow execution engine.
//!
//! Each block moves `Idle -> Executing -> Idle(with result)`. Gateway
//! failures are recorded on the block as [`BlockResult::Failed`] and never
//! escape, so one broken block cannot stop the rest of a run.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::store::FlowStore;
use crate::gateway::{GenerationGateway, GenerationRequest};
use crate::template::resolve;
use crate::types::{BlockId, BlockKind, BlockResult};

/// What a single block execution did.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockOutcome {
    pub block_id: BlockId,
    /// Position of the block when it ran.
    pub index: usize,
    /// The prompt sent to the gateway (Generate blocks only).
    pub resolved_prompt: Option<String>,
    /// What this run produced. A run overtaken by a newer trigger of the same
    /// block reports its result here without storing it.
    pub result: Option<BlockResult>,
}

impl BlockOutcome {
    pub fn is_failure(&self) -> bool {
        self.result.as_ref().is_some_and(BlockResult::is_failure)
    }
}

/// A key press forwarded from whatever surface owns focus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    /// Ctrl+Enter or Cmd/Meta+Enter.
    pub fn is_execute_shortcut(&self) -> bool {
        (self.ctrl || self.meta) && self.key == "Enter"
    }
}

#[derive(Clone)]
pub struct FlowEngine {
    store: Arc<FlowStore>,
    gateway: GenerationGateway,
}

impl FlowEngine {
    pub fn new(store: Arc<FlowStore>, gateway: GenerationGateway) -> Self {
        Self { store, gateway }
    }

    pub fn store(&self) -> &Arc<FlowStore> {
        &self.store
    }

    /// Execute the block currently at `index`. `None` if out of range.
    pub async fn execute_block(&self, index: usize) -> Option<BlockOutcome> {
        let id = self.store.snapshot().blocks.get(index)?.id.clone();
        self.execute_block_id(&id).await
    }

    /// Execute a block by id, wherever it currently sits in the list.
    pub async fn execute_block_id(&self, id: &BlockId) -> Option<BlockOutcome> {
        let snapshot = self.store.snapshot();
        let index = snapshot.index_of(id)?;
        let block = &snapshot.blocks[index];

        match block.kind {
            BlockKind::Input => {
                let result = block.settings.input.clone().map(BlockResult::Text);
                self.store.update_block(id, |b| b.result = result.clone());
                debug!(block = %id, index, "input block passed through");
                Some(BlockOutcome {
                    block_id: id.clone(),
                    index,
                    resolved_prompt: None,
                    result,
                })
            }
            BlockKind::Generate => self.execute_generate(id).await,
        }
    }

    async fn execute_generate(&self, id: &BlockId) -> Option<BlockOutcome> {
        let mut run = 0;
        let started = self.store.update_block(id, |b| {
            b.run += 1;
            b.in_flight += 1;
            b.executing = true;
            run = b.run;
        });
        if !started {
            return None;
        }

        // Resolve against the list as it is now, not as it was when triggered.
        let snapshot = self.store.snapshot();
        let index = snapshot.index_of(id)?;
        let block = &snapshot.blocks[index];
        let template = block.settings.prompt.as_deref().unwrap_or_default();
        let prompt = resolve(template, &snapshot.blocks, index);
        let request = GenerationRequest::from_settings(prompt.clone(), &block.settings);

        info!(block = %id, name = %block.name, index, "executing block");
        let result = match self.gateway.generate(&request).await {
            Ok(output) => output.into_block_result(),
            Err(e) => {
                warn!(block = %id, error = %e, "block execution failed");
                BlockResult::Failed {
                    message: e.to_string(),
                }
            }
        };

        let mut latest = false;
        self.store.update_block(id, |b| {
            b.in_flight = b.in_flight.saturating_sub(1);
            b.executing = b.in_flight > 0;
            latest = b.run == run;
            if latest {
                b.result = Some(result.clone());
            }
        });
        if !latest {
            debug!(block = %id, run, "superseded by a newer run, result discarded");
        }

        Some(BlockOutcome {
            block_id: id.clone(),
            index,
            resolved_prompt: Some(prompt),
            result: Some(result),
        })
    }

    /// Execute every block in order, each one finishing before the next starts.
    ///
    /// The run covers the blocks present when it starts; a block removed
    /// mid-run is skipped.
    pub async fn execute_flow(&self) -> Vec<BlockOutcome> {
        let ids: Vec<BlockId> = self
            .store
            .snapshot()
            .blocks
            .iter()
            .map(|b| b.id.clone())
            .collect();
        info!(blocks = ids.len(), "executing flow");

        let mut outcomes = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.execute_block_id(id).await {
                Some(outcome) => outcomes.push(outcome),
                None => debug!(block = %id, "block removed before its turn"),
            }
        }
        outcomes
    }

    /// Run the focused block on the execute shortcut, if it is a Generate block.
    pub async fn execute_block_by_keyboard(
        &self,
        event: &KeyEvent,
        focused: Option<&BlockId>,
    ) -> bool {
        if !event.is_execute_shortcut() {
            return false;
        }
        let Some(id) = focused else {
            return false;
        };
        let is_generate = self
            .store
            .block(id)
            .map(|b| b.is_generate())
            .unwrap_or(false);
        if !is_generate {
            return false;
        }
        self.execute_block_id(id).await.is_some()
    }
}
