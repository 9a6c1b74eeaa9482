//! Versioned block list.
//!
//! The list is an immutable [`FlowSnapshot`] behind an [`ArcSwap`]. Every
//! mutation is a pure transform from the current blocks to a new list,
//! committed with compare-and-swap and re-run when another writer got there
//! first. Readers never block and never observe a half-applied change.

use arc_swap::{ArcSwap, Guard};
use std::sync::Arc;
use tracing::trace;

use crate::types::{Block, BlockId, BlockKind, SettingsPatch};

/// One committed version of the block list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowSnapshot {
    pub version: u64,
    pub blocks: Vec<Block>,
}

impl FlowSnapshot {
    pub fn index_of(&self, id: &BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| &b.id == id)
    }

    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.id == id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// A mention candidate offered to the block at some index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub id: BlockId,
    pub name: String,
    pub kind: BlockKind,
}

impl Variable {
    /// Markup that resolves to this variable, e.g. `@[seed](block-1)`.
    pub fn mention(&self) -> String {
        format!("@[{}]({})", self.name, self.id)
    }
}

pub struct FlowStore {
    state: ArcSwap<FlowSnapshot>,
}

impl FlowStore {
    pub fn new() -> Self {
        Self::from_blocks(Vec::new())
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self {
            state: ArcSwap::from_pointee(FlowSnapshot { version: 0, blocks }),
        }
    }

    /// Current snapshot. Cheap; holds no lock.
    pub fn snapshot(&self) -> Arc<FlowSnapshot> {
        self.state.load_full()
    }

    pub fn version(&self) -> u64 {
        self.state.load().version
    }

    pub fn blocks(&self) -> Vec<Block> {
        self.state.load().blocks.clone()
    }

    pub fn block(&self, id: &BlockId) -> Option<Block> {
        self.state.load().get(id).cloned()
    }

    /// Commit `transform` against the latest list.
    ///
    /// Returning `None` from the transform leaves the list (and its version)
    /// untouched. On contention the transform runs again on the newer list.
    pub fn apply<F>(&self, mut transform: F) -> Option<Arc<FlowSnapshot>>
    where
        F: FnMut(&[Block]) -> Option<Vec<Block>>,
    {
        let mut current = self.state.load_full();
        loop {
            let blocks = transform(&current.blocks)?;
            let next = Arc::new(FlowSnapshot {
                version: current.version + 1,
                blocks,
            });
            let previous = self.state.compare_and_swap(&current, Arc::clone(&next));
            if Arc::ptr_eq(&*previous, &current) {
                return Some(next);
            }
            trace!(version = current.version, "flow store contention, retrying");
            current = Guard::into_inner(previous);
        }
    }

    /// Apply `f` to the block with `id`. False if no such block exists.
    pub fn update_block<F>(&self, id: &BlockId, mut f: F) -> bool
    where
        F: FnMut(&mut Block),
    {
        self.apply(|blocks| {
            let index = blocks.iter().position(|b| &b.id == id)?;
            let mut next = blocks.to_vec();
            f(&mut next[index]);
            Some(next)
        })
        .is_some()
    }

    /// Append a fresh block with default settings, named after its kind.
    pub fn add_block(&self, kind: BlockKind) -> BlockId {
        self.push_block(Block::new(kind))
    }

    pub fn push_block(&self, block: Block) -> BlockId {
        let id = block.id.clone();
        self.apply(|blocks| {
            let mut next = blocks.to_vec();
            next.push(block.clone());
            Some(next)
        });
        id
    }

    pub fn remove_block(&self, id: &BlockId) -> bool {
        self.apply(|blocks| {
            let index = blocks.iter().position(|b| &b.id == id)?;
            let mut next = blocks.to_vec();
            next.remove(index);
            Some(next)
        })
        .is_some()
    }

    pub fn rename_block(&self, id: &BlockId, name: impl Into<String>) -> bool {
        let name = name.into();
        self.update_block(id, |b| b.name = name.clone())
    }

    /// Merge `patch` into the block's settings.
    pub fn update_settings(&self, id: &BlockId, patch: &SettingsPatch) -> bool {
        self.update_block(id, |b| b.settings.apply(patch))
    }

    pub fn toggle_expanded(&self, id: &BlockId) -> bool {
        self.update_block(id, |b| b.expanded = !b.expanded)
    }

    /// Reorder: take the block at `from` and reinsert it at `to`.
    pub fn move_block(&self, from: usize, to: usize) -> bool {
        self.apply(|blocks| {
            if from >= blocks.len() || to >= blocks.len() || from == to {
                return None;
            }
            let mut next = blocks.to_vec();
            let block = next.remove(from);
            next.insert(to, block);
            Some(next)
        })
        .is_some()
    }

    /// Mention candidates for the block at `index`: only its predecessor.
    pub fn available_variables(&self, index: usize) -> Vec<Variable> {
        let snapshot = self.state.load();
        index
            .checked_sub(1)
            .and_then(|i| snapshot.blocks.get(i))
            .map(|prev| Variable {
                id: prev.id.clone(),
                name: prev.name.clone(),
                kind: prev.kind,
            })
            .into_iter()
            .collect()
    }
}

impl Default for FlowStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GenerationShape;

    fn store() -> FlowStore {
        FlowStore::from_blocks(vec![
            Block::input("seed", "hi").with_id("a"),
            Block::generate("B", "@[seed](a)").with_id("b"),
            Block::generate("C", "@[B](b)").with_id("c"),
        ])
    }

    fn names(store: &FlowStore) -> Vec<String> {
        store.blocks().into_iter().map(|b| b.name).collect()
    }

    #[test]
    fn test_add_block_defaults() {
        let store = FlowStore::new();
        let id = store.add_block(BlockKind::Generate);
        let block = store.block(&id).unwrap();
        assert_eq!(block.name, "Generate");
        assert!(block.expanded);
        assert!(block.result.is_none());
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn test_mutations_bump_version_only_when_applied() {
        let store = store();
        assert!(store.rename_block(&"b".into(), "Draft"));
        assert_eq!(store.version(), 1);

        assert!(!store.rename_block(&"missing".into(), "x"));
        assert!(!store.move_block(0, 7));
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn test_update_settings_is_partial() {
        let store = store();
        let patch = SettingsPatch::new()
            .temperature(0.2)
            .generation_shape(GenerationShape::Object);
        store.update_settings(&"b".into(), &patch);

        let block = store.block(&"b".into()).unwrap();
        assert_eq!(block.settings.temperature, 0.2);
        assert_eq!(block.settings.prompt.as_deref(), Some("@[seed](a)"));
        assert_eq!(block.settings.max_tokens, 1000);
    }

    #[test]
    fn test_move_remove_toggle() {
        let store = store();
        assert!(store.move_block(2, 0));
        assert_eq!(names(&store), vec!["C", "seed", "B"]);

        assert!(store.remove_block(&"a".into()));
        assert_eq!(names(&store), vec!["C", "B"]);

        store.toggle_expanded(&"c".into());
        assert!(!store.block(&"c".into()).unwrap().expanded);
    }

    #[test]
    fn test_available_variables_is_predecessor_only() {
        let store = store();
        assert!(store.available_variables(0).is_empty());

        let vars = store.available_variables(2);
        assert_eq!(vars.len(), 1);
        assert_eq!(vars[0].name, "B");
        assert_eq!(vars[0].kind, BlockKind::Generate);
        assert_eq!(vars[0].mention(), "@[B](b)");
    }

    #[test]
    fn test_snapshot_is_stable_across_writes() {
        let store = store();
        let before = store.snapshot();
        store.rename_block(&"a".into(), "renamed");
        assert_eq!(before.blocks[0].name, "seed");
        assert_eq!(store.snapshot().blocks[0].name, "renamed");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_are_not_lost() {
        let store = Arc::new(store());
        let mut handles = Vec::new();
        for round in 0..50 {
            for id in ["a", "b", "c"] {
                let store = Arc::clone(&store);
                handles.push(tokio::spawn(async move {
                    store.update_block(&id.into(), |b| {
                        b.settings.max_tokens += 1;
                        b.name = format!("{}-{}", id, round);
                    })
                }));
            }
        }
        for result in futures::future::join_all(handles).await {
            assert!(result.unwrap());
        }

        let snapshot = store.snapshot();
        assert_eq!(snapshot.version, 150);
        for block in &snapshot.blocks {
            assert_eq!(block.settings.max_tokens, 1050);
        }
    }
}
