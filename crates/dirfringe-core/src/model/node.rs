/// A single directory in the traversal arena.
///
/// Nodes are stored in a slot `Vec` owned by [`DirTree`](super::DirTree).
/// Relationships use `NodeIndex` rather than pointers: the parent link is a
/// plain non-owning index, and children are indices into the same arena.
use std::collections::HashMap;
use std::fs::ReadDir;
use std::path::{Path, PathBuf};

/// Lightweight index into the node arena.
///
/// Uses `u32` to keep slots small — supports up to ~4 billion live
/// directories, far more than a single descent path can ever hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    /// Create a new `NodeIndex` from a `usize`, panicking in debug builds if
    /// it exceeds `u32::MAX`.
    #[inline]
    pub fn new(index: usize) -> Self {
        debug_assert!(index <= u32::MAX as usize, "NodeIndex overflow");
        Self(index as u32)
    }

    /// Return the index as a `usize` for Vec indexing.
    #[inline]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Payload stored for a known child directory.
///
/// A path that is not a key in the map is still undecided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChildSlot {
    /// Descend: the child has its own node.
    Node(NodeIndex),
    /// Never descend, never emit. Terminal.
    Forbidden,
}

/// State of a directory's own listing.
#[derive(Debug, Default)]
pub enum Listing {
    /// Not opened yet; opened on the first pull.
    #[default]
    Pending,
    /// Open OS handle, pulled one entry at a time.
    Open(ReadDir),
    /// Drained, failed to open, or released. Holds no OS resources.
    Closed,
}

/// Insertion-ordered map of child path → slot.
///
/// Order matters: checkpoints list paths in the order they were discovered.
#[derive(Debug, Default)]
pub struct Children {
    order: Vec<PathBuf>,
    slots: HashMap<PathBuf, ChildSlot>,
}

impl Children {
    pub fn get(&self, path: &Path) -> Option<ChildSlot> {
        self.slots.get(path).copied()
    }

    /// Insert or overwrite. Returns the previous payload, if any.
    pub fn insert(&mut self, path: PathBuf, slot: ChildSlot) -> Option<ChildSlot> {
        let previous = self.slots.insert(path.clone(), slot);
        if previous.is_none() {
            self.order.push(path);
        }
        previous
    }

    /// Iterate `(path, slot)` pairs in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, ChildSlot)> + '_ {
        self.order
            .iter()
            .filter_map(move |p| self.slots.get(p).map(|slot| (p, *slot)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drop every entry and give the backing memory back.
    pub fn clear(&mut self) {
        self.order = Vec::new();
        self.slots = HashMap::new();
    }
}

/// One directory of the fringe.
#[derive(Debug)]
pub struct DirNode {
    /// Absolute path of the directory.
    pub path: PathBuf,

    /// Parent node. `None` for roots. Diagnostic only.
    pub parent: Option<NodeIndex>,

    /// Known subdirectories and exclusion markers.
    pub children: Children,

    /// The child currently being drained, if any.
    pub current: Option<NodeIndex>,

    /// Own listing drained and no descent active.
    pub exhausted: bool,

    /// A recoverable error happened somewhere below this node during this
    /// run. Such a node is never reported as done.
    pub incomplete: bool,

    /// Lazy listing cursor.
    pub listing: Listing,
}

impl DirNode {
    /// Create a node whose listing has not been opened yet.
    pub fn new(path: PathBuf, parent: Option<NodeIndex>) -> Self {
        Self {
            path,
            parent,
            children: Children::default(),
            current: None,
            exhausted: false,
            incomplete: false,
            listing: Listing::Pending,
        }
    }

    /// Fully scanned with nothing recorded beneath it.
    pub fn is_done(&self) -> bool {
        self.exhausted && !self.incomplete && self.children.is_empty()
    }
}
