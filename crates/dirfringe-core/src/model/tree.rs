/// Slot arena of directory nodes plus the traversal operations on them.
///
/// Every operation takes the `NodeIndex` of the node it acts on. Finished
/// subtrees give their slots back to a free list, so the arena only ever
/// holds the current descent path, the siblings already discovered along it,
/// and the markers that still need to reach the checkpoint.
use super::entry::RawEntry;
use super::node::{ChildSlot, DirNode, Listing, NodeIndex};
use crate::error::EntryError;
use crate::filter::ExclusionMatcher;
use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;

/// The arena.
#[derive(Debug, Default)]
pub struct DirTree {
    slots: Vec<Option<DirNode>>,
    free: Vec<NodeIndex>,
    live: usize,
}

impl DirTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `node`, reusing a released slot when one is available.
    pub fn add_node(&mut self, node: DirNode) -> NodeIndex {
        self.live += 1;
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx.idx()] = Some(node);
                idx
            }
            None => {
                let idx = NodeIndex::new(self.slots.len());
                self.slots.push(Some(node));
                idx
            }
        }
    }

    /// Get the node at the given index.
    #[inline]
    pub fn node(&self, idx: NodeIndex) -> &DirNode {
        self.slots[idx.idx()].as_ref().expect("stale NodeIndex")
    }

    #[inline]
    fn node_mut(&mut self, idx: NodeIndex) -> &mut DirNode {
        self.slots[idx.idx()].as_mut().expect("stale NodeIndex")
    }

    /// Number of nodes currently held.
    pub fn live_nodes(&self) -> usize {
        self.live
    }

    /// Distance from `idx` to its root, following parent links.
    pub fn depth(&self, idx: NodeIndex) -> usize {
        let mut depth = 0;
        let mut current = self.node(idx).parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.node(parent).parent;
        }
        depth
    }

    /// The deepest node on the active descent path starting at `idx`.
    pub fn deepest_active(&self, idx: NodeIndex) -> NodeIndex {
        let mut at = idx;
        while let Some(child) = self.node(at).current {
            at = child;
        }
        at
    }

    /// Look up `path` among `parent`'s children, deciding it on first sight.
    ///
    /// A new path that matches `matcher` is stored as forbidden; anything else
    /// gets a fresh node whose listing opens lazily.
    pub fn get_or_create_child(
        &mut self,
        parent: NodeIndex,
        path: PathBuf,
        matcher: &ExclusionMatcher,
    ) -> ChildSlot {
        if let Some(slot) = self.node(parent).children.get(&path) {
            return slot;
        }

        let slot = if matcher.matches(&path) {
            ChildSlot::Forbidden
        } else {
            ChildSlot::Node(self.add_node(DirNode::new(path.clone(), Some(parent))))
        };
        self.node_mut(parent).children.insert(path, slot);
        slot
    }

    /// Record `path` under `parent` as forbidden, dropping any live subtree.
    pub fn mark_forbidden(&mut self, parent: NodeIndex, path: PathBuf) {
        let previous = self
            .node_mut(parent)
            .children
            .insert(path, ChildSlot::Forbidden);

        if let Some(ChildSlot::Node(old)) = previous {
            if self.node(parent).current == Some(old) {
                self.node_mut(parent).current = None;
            }
            self.release_subtree(old);
            self.free_slot(old);
        }
    }

    /// Walk `parts` down from `idx`, creating intermediate nodes, and mark the
    /// last segment forbidden at its parent's level.
    ///
    /// Stops silently when an intermediate segment is already forbidden.
    pub fn mark_forbidden_at_relative_path(
        &mut self,
        idx: NodeIndex,
        parts: &[&OsStr],
        matcher: &ExclusionMatcher,
    ) {
        let Some((last, intermediate)) = parts.split_last() else {
            return;
        };

        let mut at = idx;
        for part in intermediate {
            let path = self.node(at).path.join(part);
            match self.get_or_create_child(at, path, matcher) {
                ChildSlot::Node(child) => at = child,
                ChildSlot::Forbidden => return,
            }
        }

        let target = self.node(at).path.join(last);
        self.mark_forbidden(at, target);
    }

    /// Treat `idx` as fully scanned without listing it.
    pub fn mark_done(&mut self, idx: NodeIndex) {
        self.release_subtree(idx);
        let node = self.node_mut(idx);
        node.exhausted = true;
        node.incomplete = false;
    }

    /// Produce the next leaf entry below `idx`, depth-first.
    ///
    /// `None` means the subtree has nothing more to give. Errors are
    /// recoverable: the caller logs them and keeps pulling.
    pub fn next_entry(
        &mut self,
        idx: NodeIndex,
        matcher: &ExclusionMatcher,
    ) -> Option<Result<RawEntry, EntryError>> {
        if self.node(idx).exhausted {
            return None;
        }

        loop {
            if let Some(child) = self.node(idx).current {
                if let Some(item) = self.next_entry(child, matcher) {
                    return Some(item);
                }
                self.finish_child(idx, child);
            }

            let node = self.node_mut(idx);
            if matches!(node.listing, Listing::Pending) {
                match fs::read_dir(&node.path) {
                    Ok(read_dir) => node.listing = Listing::Open(read_dir),
                    Err(source) => {
                        node.listing = Listing::Closed;
                        node.incomplete = true;
                        return Some(Err(EntryError::OpenDir {
                            path: node.path.clone(),
                            source,
                        }));
                    }
                }
            }

            // Closed without being exhausted: the open failed earlier.
            let Listing::Open(read_dir) = &mut node.listing else {
                return None;
            };

            let pulled = read_dir.next();
            let entry = match pulled {
                None => {
                    node.listing = Listing::Closed;
                    node.exhausted = true;
                    return None;
                }
                Some(Err(source)) => {
                    node.incomplete = true;
                    return Some(Err(EntryError::ReadDir {
                        path: node.path.clone(),
                        source,
                    }));
                }
                Some(Ok(entry)) => entry,
            };

            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(source) => {
                    node.incomplete = true;
                    return Some(Err(EntryError::Stat { path, source }));
                }
            };

            if file_type.is_dir() {
                if let ChildSlot::Node(child) = self.get_or_create_child(idx, path, matcher) {
                    if !self.node(child).exhausted {
                        self.node_mut(idx).current = Some(child);
                    }
                }
                continue;
            }

            return match entry.metadata() {
                Ok(metadata) => Some(Ok(RawEntry { path, metadata })),
                Err(source) => {
                    self.node_mut(idx).incomplete = true;
                    Some(Err(EntryError::Stat { path, source }))
                }
            };
        }
    }

    /// Checkpoint lines for the subtree at `idx`, appended to `out`.
    pub fn serialize_into(&self, idx: NodeIndex, out: &mut Vec<PathBuf>) {
        let node = self.node(idx);
        if !node.children.is_empty() {
            for (path, slot) in node.children.iter() {
                match slot {
                    ChildSlot::Node(child) => self.serialize_into(child, out),
                    ChildSlot::Forbidden => out.push(path.clone()),
                }
            }
        } else if node.is_done() {
            out.push(node.path.clone());
        }
    }

    /// Checkpoint lines for the subtree at `idx`.
    pub fn serialize(&self, idx: NodeIndex) -> Vec<PathBuf> {
        let mut out = Vec::new();
        self.serialize_into(idx, &mut out);
        out
    }

    /// The descent into `child` is over.
    ///
    /// A clean child collapses to a single "done" node. An incomplete one
    /// keeps what it knows so the failed entries are retried next run, and
    /// passes the flag up.
    fn finish_child(&mut self, parent: NodeIndex, child: NodeIndex) {
        self.node_mut(parent).current = None;
        if self.node(child).incomplete {
            self.node_mut(child).listing = Listing::Closed;
            self.node_mut(parent).incomplete = true;
        } else {
            self.release_subtree(child);
        }
    }

    /// Close the listing at `idx` and free every node below it.
    fn release_subtree(&mut self, idx: NodeIndex) {
        let node = self.node_mut(idx);
        node.listing = Listing::Closed;
        node.current = None;
        let children = std::mem::take(&mut node.children);

        for (_, slot) in children.iter() {
            if let ChildSlot::Node(child) = slot {
                self.release_subtree(child);
                self.free_slot(child);
            }
        }
    }

    fn free_slot(&mut self, idx: NodeIndex) {
        self.slots[idx.idx()] = None;
        self.free.push(idx);
        self.live -= 1;
    }
}
