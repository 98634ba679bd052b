/// The fringe: an ordered set of disjoint roots drained one after another.
use super::entry::RawEntry;
use super::node::{DirNode, NodeIndex};
use super::tree::DirTree;
use crate::checkpoint;
use crate::error::{ConfigError, EntryError};
use crate::filter::ExclusionMatcher;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// One configured root and its node.
#[derive(Debug)]
struct Root {
    path: PathBuf,
    node: NodeIndex,
}

/// Snapshot of how much traversal state is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestStats {
    pub live_nodes: usize,
    pub descent_depth: usize,
    pub cursor: usize,
    pub roots: usize,
}

/// Traversal state across every configured root.
#[derive(Debug)]
pub struct Forest {
    tree: DirTree,
    roots: Vec<Root>,
    cursor: usize,
    matcher: ExclusionMatcher,
}

impl Forest {
    /// Validate `roots` and build one lazy node per root.
    ///
    /// Nothing is constructed unless every root is absolute, distinct and
    /// not nested inside another root.
    pub fn new(roots: &[PathBuf], matcher: ExclusionMatcher) -> Result<Self, ConfigError> {
        check_disjoint_roots(roots)?;

        let mut tree = DirTree::new();
        let roots = roots
            .iter()
            .map(|path| Root {
                path: path.clone(),
                node: tree.add_node(DirNode::new(path.clone(), None)),
            })
            .collect();

        Ok(Self {
            tree,
            roots,
            cursor: 0,
            matcher,
        })
    }

    /// Pull the next leaf entry across all roots.
    pub fn next_entry(&mut self) -> Option<Result<RawEntry, EntryError>> {
        while let Some(root) = self.roots.get(self.cursor) {
            if let Some(item) = self.tree.next_entry(root.node, &self.matcher) {
                return Some(item);
            }
            info!(root = %root.path.display(), "Root drained");
            self.cursor += 1;
        }
        None
    }

    /// Checkpoint lines for every root that has started.
    ///
    /// Roots past the cursor contribute nothing.
    pub fn serialize(&self) -> Vec<PathBuf> {
        let mut out = Vec::new();
        let started = (self.cursor + 1).min(self.roots.len());
        for root in &self.roots[..started] {
            self.tree.serialize_into(root.node, &mut out);
        }
        out
    }

    /// Never traverse `path` or anything beneath it.
    ///
    /// Paths outside every root are ignored, and so are paths under a root
    /// already recorded as done. Excluding a root itself is a configuration
    /// error.
    pub fn add_forbidden(&mut self, path: &Path) -> Result<(), ConfigError> {
        let Some(root) = self.roots.iter().find(|r| path.starts_with(&r.path)) else {
            debug!(path = %path.display(), "Exclusion outside every root ignored");
            return Ok(());
        };
        if path != root.path && self.tree.node(root.node).is_done() {
            debug!(path = %path.display(), "Exclusion under a finished root ignored");
            return Ok(());
        }

        // starts_with succeeded, so strip_prefix cannot fail.
        let relative = path.strip_prefix(&root.path).unwrap_or(Path::new(""));
        let mut parts: Vec<&OsStr> = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part),
                Component::CurDir => {}
                _ => {
                    debug!(path = %path.display(), "Exclusion with non-normal component ignored");
                    return Ok(());
                }
            }
        }

        if parts.is_empty() {
            return Err(ConfigError::ExcludesRoot(root.path.clone()));
        }

        self.tree
            .mark_forbidden_at_relative_path(root.node, &parts, &self.matcher);
        Ok(())
    }

    /// Apply [`add_forbidden`](Self::add_forbidden) to each path.
    pub fn exclude_all<I, P>(&mut self, paths: I) -> Result<usize, ConfigError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut count = 0;
        for path in paths {
            self.add_forbidden(path.as_ref())?;
            count += 1;
        }
        Ok(count)
    }

    /// Load an exclusion list (or a previous checkpoint) and apply it.
    ///
    /// A missing file counts as empty.
    pub fn exclude_from_file(&mut self, location: &Path) -> Result<usize, ConfigError> {
        let paths =
            checkpoint::load_if_present(location).map_err(|e| ConfigError::Unreadable {
                path: e.path,
                source: e.source,
            })?;
        let count = self.exclude_all(&paths)?;
        info!(file = %location.display(), paths = count, "Exclusion list applied");
        Ok(count)
    }

    /// Replay a previous checkpoint.
    ///
    /// Unlike a static exclusion list, a checkpoint may name a root: that is
    /// how a childless root records that it was fully listed. Such a root is
    /// marked done and skipped.
    pub fn resume_from<I, P>(&mut self, paths: I) -> Result<usize, ConfigError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut count = 0;
        for path in paths {
            let path = path.as_ref();
            match self.roots.iter().find(|r| r.path == path) {
                Some(root) => {
                    debug!(root = %root.path.display(), "Root already complete");
                    self.tree.mark_done(root.node);
                }
                None => self.add_forbidden(path)?,
            }
            count += 1;
        }
        Ok(count)
    }

    /// Load a checkpoint file and replay it. A missing file counts as empty.
    pub fn resume_from_file(&mut self, location: &Path) -> Result<usize, ConfigError> {
        let paths =
            checkpoint::load_if_present(location).map_err(|e| ConfigError::Unreadable {
                path: e.path,
                source: e.source,
            })?;
        let count = self.resume_from(&paths)?;
        info!(file = %location.display(), paths = count, "Checkpoint replayed");
        Ok(count)
    }

    /// `true` once every root is drained.
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.roots.len()
    }

    /// Configured root paths, in traversal order.
    pub fn root_paths(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(|r| r.path.as_path())
    }

    pub fn stats(&self) -> ForestStats {
        let descent_depth = self
            .roots
            .get(self.cursor)
            .map(|root| self.tree.depth(self.tree.deepest_active(root.node)))
            .unwrap_or(0);

        ForestStats {
            live_nodes: self.tree.live_nodes(),
            descent_depth,
            cursor: self.cursor,
            roots: self.roots.len(),
        }
    }
}

impl Iterator for Forest {
    type Item = Result<RawEntry, EntryError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry()
    }
}

/// Reject root sets that are empty, relative, repeated or nested.
///
/// The check is order-independent: `/a` with `/a/b` fails either way round.
pub fn check_disjoint_roots(roots: &[PathBuf]) -> Result<(), ConfigError> {
    if roots.is_empty() {
        return Err(ConfigError::NoRoots);
    }

    for root in roots {
        if !root.is_absolute() {
            return Err(ConfigError::RelativeRoot(root.clone()));
        }
    }

    for (i, a) in roots.iter().enumerate() {
        for b in &roots[i + 1..] {
            if a == b {
                return Err(ConfigError::DuplicateRoot(a.clone()));
            }
            if b.starts_with(a) {
                return Err(ConfigError::NestedRoots {
                    outer: a.clone(),
                    inner: b.clone(),
                });
            }
            if a.starts_with(b) {
                return Err(ConfigError::NestedRoots {
                    outer: b.clone(),
                    inner: a.clone(),
                });
            }
        }
    }

    Ok(())
}
