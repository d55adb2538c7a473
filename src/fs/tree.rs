use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};

use crate::error::Result;
use crate::fs::size::{format_kb, DirectorySizeResult};

/// Type of filesystem node.
///
/// A symlink whose target is a folder is a `Directory` (with
/// `TreeNode::is_symlink` set); `Symlink` is a link to a file or a dangling link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
    File,
    Directory,
    Symlink,
}

impl NodeType {
    /// Text for the type column. Files are named after their extension.
    pub fn kind_label(&self, name: &str) -> String {
        match self {
            NodeType::Directory => "Folder".to_string(),
            NodeType::Symlink => "Link".to_string(),
            NodeType::File => match Path::new(name).extension() {
                Some(ext) => format!("{} File", ext.to_string_lossy()),
                None => "File".to_string(),
            },
        }
    }
}

/// Text for the date-modified column, in local time.
pub fn format_modified(modified: Option<SystemTime>) -> String {
    modified
        .map(|time| {
            let local: DateTime<Local> = time.into();
            local.format("%Y-%m-%d %H:%M").to_string()
        })
        .unwrap_or_default()
}

/// File metadata for display purposes.
#[derive(Debug, Clone)]
pub struct FileMeta {
    /// Byte length; for symlinks, the length of the target when it resolves.
    pub size: u64,
    pub modified: Option<SystemTime>,
    pub is_hidden: bool,
}

impl FileMeta {
    fn read(path: &Path, metadata: &fs::Metadata, name: &str) -> Self {
        let size = if metadata.is_symlink() {
            fs::metadata(path)
                .map(|m| m.len())
                .unwrap_or_else(|_| metadata.len())
        } else {
            metadata.len()
        };
        Self {
            size,
            modified: metadata.modified().ok(),
            is_hidden: name.starts_with('.'),
        }
    }
}

/// A node in the filesystem tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub path: PathBuf,
    pub node_type: NodeType,
    pub is_symlink: bool,
    pub children: Option<Vec<TreeNode>>,
    pub is_expanded: bool,
    pub depth: usize,
    pub meta: FileMeta,
    /// Folder size from the last probe. `None` until the row is first shown.
    pub dir_size: Option<DirectorySizeResult>,
}

impl TreeNode {
    /// Create a new TreeNode from a filesystem path.
    pub fn new(path: &Path, depth: usize) -> Result<Self> {
        let metadata = fs::symlink_metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        let is_symlink = metadata.is_symlink();
        let node_type = if is_symlink {
            // Folder links are sized and expanded through the link.
            match fs::metadata(path) {
                Ok(target) if target.is_dir() => NodeType::Directory,
                _ => NodeType::Symlink,
            }
        } else if metadata.is_dir() {
            NodeType::Directory
        } else {
            NodeType::File
        };

        let meta = FileMeta::read(path, &metadata, &name);

        Ok(Self {
            name,
            path: path.to_path_buf(),
            node_type,
            is_symlink,
            children: None,
            is_expanded: false,
            depth,
            meta,
            dir_size: None,
        })
    }

    /// Load children for a directory node.
    ///
    /// Sorting is applied separately via `TreeState::sort_children_of`.
    /// Entries that cannot be stat'ed are silently skipped.
    pub fn load_children(&mut self) -> Result<()> {
        if self.node_type != NodeType::Directory {
            return Ok(());
        }

        let mut children = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            match TreeNode::new(&entry.path(), self.depth + 1) {
                Ok(node) => children.push(node),
                Err(_) => continue,
            }
        }

        self.children = Some(children);
        Ok(())
    }

    /// Re-read children while keeping the state of entries that still exist.
    ///
    /// Surviving children keep their expansion, loaded subtree and stored size,
    /// but get fresh metadata. New entries are added unexpanded.
    pub fn reload_children(&mut self) -> Result<()> {
        if self.node_type != NodeType::Directory {
            return Ok(());
        }
        let mut previous: HashMap<PathBuf, TreeNode> = self
            .children
            .take()
            .unwrap_or_default()
            .into_iter()
            .map(|child| (child.path.clone(), child))
            .collect();

        let result = self.load_children();
        if let Some(children) = &mut self.children {
            for child in children.iter_mut() {
                if let Some(old) = previous.remove(&child.path) {
                    if old.node_type == child.node_type {
                        child.children = old.children;
                        child.is_expanded = old.is_expanded;
                        child.dir_size = old.dir_size;
                    }
                }
            }
        }
        result
    }

    /// Re-read every loaded folder from here down and re-probe every stored
    /// folder size.
    pub fn reload_subtree(&mut self) {
        if self.node_type != NodeType::Directory {
            return;
        }
        if self.children.is_some() {
            if let Err(e) = self.reload_children() {
                tracing::debug!(path = %self.path.display(), error = %e, "reload failed");
            }
        }
        if self.dir_size.is_some() {
            self.probe_size();
        }
        if let Some(children) = &mut self.children {
            for child in children.iter_mut() {
                child.reload_subtree();
            }
        }
    }

    /// Run the size probe for a directory and store the result.
    pub fn probe_size(&mut self) -> Option<&DirectorySizeResult> {
        if self.node_type != NodeType::Directory {
            return None;
        }
        self.dir_size = Some(DirectorySizeResult::probe(&self.path));
        self.dir_size.as_ref()
    }

    /// Probe the directory size if it has never been probed.
    fn ensure_size(&mut self) {
        if self.node_type == NodeType::Directory && self.dir_size.is_none() {
            self.probe_size();
        }
    }

    /// Re-read the node's own metadata (size, mtime).
    pub fn restat(&mut self) -> Result<()> {
        let metadata = fs::symlink_metadata(&self.path)?;
        self.meta = FileMeta::read(&self.path, &metadata, &self.name);
        Ok(())
    }

    /// Byte count used for sorting: probed folder size or file length.
    pub fn size_bytes(&self) -> u64 {
        match self.node_type {
            NodeType::Directory => self.dir_size.as_ref().map_or(0, |s| s.size_bytes),
            NodeType::File | NodeType::Symlink => self.meta.size,
        }
    }

    /// Text for the size column.
    pub fn size_column(&self) -> String {
        match self.node_type {
            NodeType::Directory => self
                .dir_size
                .as_ref()
                .map(DirectorySizeResult::display)
                .unwrap_or_default(),
            NodeType::File | NodeType::Symlink => format_kb(self.meta.size),
        }
    }
}

/// A flattened representation of a tree node for rendering.
#[derive(Debug, Clone)]
pub struct FlatItem {
    pub name: String,
    pub path: PathBuf,
    pub node_type: NodeType,
    pub depth: usize,
    pub is_expanded: bool,
    pub is_last_sibling: bool,
    pub is_hidden: bool,
    pub is_symlink: bool,
    /// Size column text, e.g. `"12 KB"`.
    pub size: String,
    /// Type column text, e.g. `"Folder"` or `"txt File"`.
    pub kind: String,
    /// Date-modified column text.
    pub modified: String,
}

impl FlatItem {
    fn from_node(node: &TreeNode, is_expanded: bool, is_last: bool) -> Self {
        Self {
            name: node.name.clone(),
            path: node.path.clone(),
            node_type: node.node_type.clone(),
            depth: node.depth,
            is_expanded,
            is_last_sibling: is_last,
            is_hidden: node.meta.is_hidden,
            is_symlink: node.is_symlink,
            size: node.size_column(),
            kind: node.node_type.kind_label(&node.name),
            modified: format_modified(node.meta.modified),
        }
    }
}

/// Sort criteria for the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortBy {
    /// Alphabetical (case-insensitive), default.
    Name,
    /// By size, largest first. Folders use their probed size.
    Size,
    /// By modification time (newest first).
    Modified,
}

impl SortBy {
    /// Parse sort_by from config string.
    pub fn from_config(s: &str) -> Self {
        match s {
            "size" => SortBy::Size,
            "modified" => SortBy::Modified,
            _ => SortBy::Name,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortBy::Name => "Name",
            SortBy::Size => "Size",
            SortBy::Modified => "Modified",
        }
    }

    /// Cycle to the next sort option.
    pub fn next(&self) -> Self {
        match self {
            SortBy::Name => SortBy::Size,
            SortBy::Size => SortBy::Modified,
            SortBy::Modified => SortBy::Name,
        }
    }
}

/// State for the tree view.
pub struct TreeState {
    pub root: TreeNode,
    pub flat_items: Vec<FlatItem>,
    pub selected_index: usize,
    pub scroll_offset: usize,
    pub show_hidden: bool,
    /// Current filter text (fixed string, case-insensitive).
    pub filter_query: String,
    pub is_filtering: bool,
    pub sort_by: SortBy,
    pub dirs_first: bool,
}

impl TreeState {
    /// Create a new TreeState from a root path, expanding the root directory.
    ///
    /// Hidden entries are shown by default.
    pub fn new(path: &Path) -> Result<Self> {
        let mut root = TreeNode::new(path, 0)?;
        if root.node_type == NodeType::Directory {
            root.load_children()?;
            root.is_expanded = true;
        }

        let mut state = Self {
            root,
            flat_items: Vec::new(),
            selected_index: 0,
            scroll_offset: 0,
            show_hidden: true,
            filter_query: String::new(),
            is_filtering: false,
            sort_by: SortBy::Name,
            dirs_first: true,
        };
        state.sort_all_children();
        state.flatten();
        Ok(state)
    }

    /// Rebuild the flat items list from the tree, respecting `show_hidden`.
    ///
    /// Folder sizes are probed for rows appearing for the first time.
    /// The root node is always included regardless of hidden status.
    pub fn flatten(&mut self) {
        self.flat_items.clear();
        Self::flatten_node(
            &mut self.root,
            &mut self.flat_items,
            self.show_hidden,
            true,
            true,
        );
        self.clamp_selection();
    }

    fn flatten_node(
        node: &mut TreeNode,
        items: &mut Vec<FlatItem>,
        show_hidden: bool,
        is_last: bool,
        is_root: bool,
    ) {
        if !is_root && !show_hidden && node.meta.is_hidden {
            return;
        }

        node.ensure_size();
        items.push(FlatItem::from_node(node, node.is_expanded, is_last));

        if !node.is_expanded {
            return;
        }
        if let Some(children) = &mut node.children {
            let mut visible: Vec<&mut TreeNode> = children
                .iter_mut()
                .filter(|c| show_hidden || !c.meta.is_hidden)
                .collect();
            let count = visible.len();
            for (i, child) in visible.iter_mut().enumerate() {
                Self::flatten_node(child, items, show_hidden, i + 1 == count, false);
            }
        }
    }

    fn clamp_selection(&mut self) {
        if !self.flat_items.is_empty() && self.selected_index >= self.flat_items.len() {
            self.selected_index = self.flat_items.len() - 1;
        }
    }

    /// Rebuild the visible rows, keeping an active filter applied.
    pub fn refresh_view(&mut self) {
        if self.filter_query.is_empty() {
            self.is_filtering = false;
            self.flatten();
        } else {
            self.apply_filter();
        }
    }

    /// The currently selected row, if any.
    pub fn selected_item(&self) -> Option<&FlatItem> {
        self.flat_items.get(self.selected_index)
    }

    /// Expand the currently selected directory node.
    pub fn expand_selected(&mut self) {
        let Some(selected) = self.selected_item() else {
            return;
        };
        if selected.node_type != NodeType::Directory {
            return;
        }
        let path = selected.path.clone();
        let sort_by = self.sort_by.clone();
        let dirs_first = self.dirs_first;
        if let Some(node) = Self::find_node_mut(&mut self.root, &path) {
            if !node.is_expanded {
                // A subtree loaded earlier keeps its expansion and sizes.
                let listed = if node.children.is_some() {
                    node.reload_children()
                } else {
                    node.load_children()
                };
                if let Err(e) = listed {
                    tracing::debug!(path = %path.display(), error = %e, "cannot list directory");
                    node.children = Some(Vec::new());
                }
                Self::sort_children_of(node, &sort_by, dirs_first);
                node.is_expanded = true;
                self.refresh_view();
            }
        }
    }

    /// Collapse the currently selected directory, or jump to parent.
    pub fn collapse_selected(&mut self) {
        let Some(selected) = self.selected_item() else {
            return;
        };
        let path = selected.path.clone();

        if selected.node_type == NodeType::Directory && selected.is_expanded {
            if let Some(node) = Self::find_node_mut(&mut self.root, &path) {
                node.is_expanded = false;
                self.refresh_view();
                return;
            }
        }

        if let Some(parent) = path.parent() {
            if let Some(i) = self.find_index_by_path(parent) {
                self.selected_index = i;
            }
        }
    }

    /// Recompute the size shown for the selected row.
    ///
    /// Folders are re-probed and the stored result overwritten; files are
    /// re-stat'ed. Returns the new folder result, `None` for files.
    pub fn refresh_selected_size(&mut self) -> Option<DirectorySizeResult> {
        let path = self.selected_item()?.path.clone();
        self.refresh_size_of(&path)
    }

    /// Recompute the size of the row at `path`. See [`Self::refresh_selected_size`].
    pub fn refresh_size_of(&mut self, path: &Path) -> Option<DirectorySizeResult> {
        let node = Self::find_node_mut(&mut self.root, path)?;
        let result = match node.node_type {
            NodeType::Directory => node.probe_size().cloned(),
            NodeType::File | NodeType::Symlink => {
                if let Err(e) = node.restat() {
                    tracing::debug!(path = %path.display(), error = %e, "restat failed");
                }
                None
            }
        };
        self.refresh_view();
        result
    }

    /// Find a mutable reference to a node by path.
    pub fn find_node_mut<'a>(node: &'a mut TreeNode, target: &Path) -> Option<&'a mut TreeNode> {
        if node.path == target {
            return Some(node);
        }
        if !target.starts_with(&node.path) {
            return None;
        }
        if let Some(children) = &mut node.children {
            for child in children.iter_mut() {
                if let Some(found) = Self::find_node_mut(child, target) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Update the scroll offset to ensure the selected item is visible.
    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        } else if self.selected_index >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected_index - visible_height + 1;
        }
    }

    /// Re-read a loaded directory after a filesystem change.
    ///
    /// The directory's own size is re-probed. Returns `false` if the directory
    /// is not part of the loaded tree.
    pub fn reload_dir(&mut self, dir_path: &Path) -> bool {
        let sort_by = self.sort_by.clone();
        let dirs_first = self.dirs_first;
        let Some(node) = Self::find_node_mut(&mut self.root, dir_path) else {
            return false;
        };
        if node.node_type != NodeType::Directory {
            return false;
        }
        if node.children.is_some() {
            if let Err(e) = node.reload_children() {
                tracing::debug!(path = %dir_path.display(), error = %e, "reload failed");
            }
            Self::sort_children_of(node, &sort_by, dirs_first);
        }
        if node.dir_size.is_some() {
            node.probe_size();
        }
        self.refresh_view();
        true
    }

    /// Re-read every loaded folder and re-probe every stored size, for when
    /// the individual changes are unknown.
    pub fn reload_tree(&mut self) {
        self.root.reload_subtree();
        self.sort_all_children();
        self.refresh_view();
    }

    /// Folders whose listing or size is on screen: the root, and every folder
    /// row inside an expanded folder.
    pub fn watch_targets(&self) -> HashSet<PathBuf> {
        let mut out = HashSet::new();
        Self::collect_watch_targets(&self.root, &mut out);
        out
    }

    fn collect_watch_targets(node: &TreeNode, out: &mut HashSet<PathBuf>) {
        if node.node_type != NodeType::Directory {
            return;
        }
        out.insert(node.path.clone());
        if !node.is_expanded {
            return;
        }
        if let Some(children) = &node.children {
            for child in children {
                Self::collect_watch_targets(child, out);
            }
        }
    }

    /// Toggle visibility of hidden files and re-flatten.
    pub fn toggle_hidden(&mut self) {
        self.show_hidden = !self.show_hidden;
        self.refresh_view();
    }

    /// Sort a node's children (non-recursive, just immediate children).
    ///
    /// Sorting by size probes any folder child not yet probed.
    fn sort_children_of(node: &mut TreeNode, sort_by: &SortBy, dirs_first: bool) {
        if let Some(children) = &mut node.children {
            if *sort_by == SortBy::Size {
                children.iter_mut().for_each(TreeNode::ensure_size);
            }
            children.sort_by(|a, b| {
                let mut cmp = std::cmp::Ordering::Equal;

                if dirs_first {
                    cmp = matches!(b.node_type, NodeType::Directory)
                        .cmp(&matches!(a.node_type, NodeType::Directory));
                }

                cmp.then_with(|| match sort_by {
                    SortBy::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
                    SortBy::Size => b.size_bytes().cmp(&a.size_bytes()),
                    SortBy::Modified => b.meta.modified.cmp(&a.meta.modified),
                })
            });
        }
    }

    fn sort_all_children_recursive(node: &mut TreeNode, sort_by: &SortBy, dirs_first: bool) {
        Self::sort_children_of(node, sort_by, dirs_first);
        if let Some(children) = &mut node.children {
            for child in children.iter_mut() {
                Self::sort_all_children_recursive(child, sort_by, dirs_first);
            }
        }
    }

    /// Sort all loaded children in the tree. Call `refresh_view` afterwards.
    pub fn sort_all_children(&mut self) {
        let sort_by = self.sort_by.clone();
        let dirs_first = self.dirs_first;
        Self::sort_all_children_recursive(&mut self.root, &sort_by, dirs_first);
    }

    /// Cycle to the next sort mode and re-sort.
    pub fn cycle_sort(&mut self) {
        self.sort_by = self.sort_by.next();
        self.sort_all_children();
        self.refresh_view();
    }

    /// Toggle dirs_first and re-sort.
    pub fn toggle_dirs_first(&mut self) {
        self.dirs_first = !self.dirs_first;
        self.sort_all_children();
        self.refresh_view();
    }

    /// Replace the filter text and rebuild the visible rows.
    ///
    /// Folders holding a match in their loaded subtree are expanded when the
    /// text changes, so collapsing one afterwards sticks until the next edit.
    pub fn set_filter(&mut self, query: &str) {
        if query != self.filter_query && !query.is_empty() {
            Self::reveal_matches(&mut self.root, &query.to_lowercase(), self.show_hidden);
        }
        self.filter_query = query.to_string();
        self.refresh_view();
    }

    /// Expand folders with a matching descendant. Returns whether `node` or
    /// anything below it matches.
    fn reveal_matches(node: &mut TreeNode, query: &str, show_hidden: bool) -> bool {
        let mut below = false;
        if let Some(children) = &mut node.children {
            for child in children
                .iter_mut()
                .filter(|c| show_hidden || !c.meta.is_hidden)
            {
                below |= Self::reveal_matches(child, query, show_hidden);
            }
        }
        if below {
            node.is_expanded = true;
        }
        below || node.name.to_lowercase().contains(query)
    }

    /// Apply the filter: show rows whose name contains the query
    /// (case-insensitive) plus their ancestors. Rows under a collapsed folder
    /// stay hidden. The root is always shown.
    pub fn apply_filter(&mut self) {
        if self.filter_query.is_empty() {
            self.is_filtering = false;
            self.flatten();
            return;
        }

        self.is_filtering = true;
        self.flat_items.clear();

        let query_lower = self.filter_query.to_lowercase();
        Self::flatten_node_filtered(
            &mut self.root,
            &mut self.flat_items,
            self.show_hidden,
            true,
            true,
            &query_lower,
        );
        self.clamp_selection();
    }

    /// Returns true if this subtree contains any matches.
    fn flatten_node_filtered(
        node: &mut TreeNode,
        items: &mut Vec<FlatItem>,
        show_hidden: bool,
        is_last: bool,
        is_root: bool,
        query: &str,
    ) -> bool {
        if !is_root && !show_hidden && node.meta.is_hidden {
            return false;
        }

        let self_matches = node.name.to_lowercase().contains(query);

        let mut child_matches = false;
        let mut child_items = Vec::new();

        if let Some(children) = &mut node.children {
            let mut visible: Vec<&mut TreeNode> = children
                .iter_mut()
                .filter(|c| show_hidden || !c.meta.is_hidden)
                .collect();
            let count = visible.len();
            for (i, child) in visible.iter_mut().enumerate() {
                if Self::flatten_node_filtered(
                    child,
                    &mut child_items,
                    show_hidden,
                    i + 1 == count,
                    false,
                    query,
                ) {
                    child_matches = true;
                }
            }
        }

        if self_matches || child_matches || is_root {
            node.ensure_size();
            items.push(FlatItem::from_node(node, node.is_expanded, is_last));
            if node.is_expanded {
                items.extend(child_items);
            }
            true
        } else {
            false
        }
    }

    /// Find the flat_items index of a node by its path.
    pub fn find_index_by_path(&self, path: &Path) -> Option<usize> {
        self.flat_items.iter().position(|item| item.path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn setup_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("alpha")).unwrap();
        fs::create_dir(dir.path().join("beta")).unwrap();
        fs::write(dir.path().join("file_a.txt"), vec![0u8; 100]).unwrap();
        fs::write(dir.path().join("file_b.rs"), vec![0u8; 3000]).unwrap();
        File::create(dir.path().join(".hidden")).unwrap();
        fs::create_dir(dir.path().join("alpha").join("nested")).unwrap();
        fs::write(dir.path().join("alpha").join("inner.txt"), vec![0u8; 4096]).unwrap();
        dir
    }

    fn names(state: &TreeState) -> Vec<&str> {
        state.flat_items.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn tree_node_creation_file() {
        let dir = setup_test_dir();
        let node = TreeNode::new(&dir.path().join("file_a.txt"), 0).unwrap();
        assert_eq!(node.node_type, NodeType::File);
        assert_eq!(node.name, "file_a.txt");
        assert_eq!(node.meta.size, 100);
        assert!(!node.meta.is_hidden);
        assert!(node.dir_size.is_none());
    }

    #[test]
    fn tree_node_creation_directory() {
        let dir = setup_test_dir();
        let node = TreeNode::new(&dir.path().join("alpha"), 1).unwrap();
        assert_eq!(node.node_type, NodeType::Directory);
        assert_eq!(node.depth, 1);
        assert!(node.children.is_none());
    }

    #[test]
    fn tree_node_hidden_file() {
        let dir = setup_test_dir();
        let node = TreeNode::new(&dir.path().join(".hidden"), 0).unwrap();
        assert!(node.meta.is_hidden);
    }

    #[test]
    fn root_children_loaded_and_sorted_dirs_first() {
        let dir = setup_test_dir();
        let state = TreeState::new(dir.path()).unwrap();
        assert_eq!(
            names(&state)[1..],
            ["alpha", "beta", ".hidden", "file_a.txt", "file_b.rs"]
        );
    }

    #[test]
    fn hidden_entries_shown_by_default() {
        let dir = setup_test_dir();
        let mut state = TreeState::new(dir.path()).unwrap();
        assert!(names(&state).contains(&".hidden"));
        state.toggle_hidden();
        assert!(!names(&state).contains(&".hidden"));
        state.toggle_hidden();
        assert!(names(&state).contains(&".hidden"));
    }

    #[test]
    fn displayed_folders_get_probed_sizes() {
        let dir = setup_test_dir();
        let state = TreeState::new(dir.path()).unwrap();
        let alpha = &state.flat_items[1];
        assert_eq!(alpha.name, "alpha");
        assert_eq!(alpha.size, "4 KB");
        // root: 100 + 3000 + 0 bytes of immediate files
        assert_eq!(state.flat_items[0].size, "3 KB");
        let file_b = state
            .flat_items
            .iter()
            .find(|i| i.name == "file_b.rs")
            .unwrap();
        assert_eq!(file_b.size, "2 KB");
    }

    #[test]
    fn unexpanded_folders_are_not_listed() {
        let dir = setup_test_dir();
        let mut state = TreeState::new(dir.path()).unwrap();
        let alpha = TreeState::find_node_mut(&mut state.root, &dir.path().join("alpha")).unwrap();
        assert!(alpha.children.is_none());
    }

    #[test]
    fn expand_loads_children() {
        let dir = setup_test_dir();
        let mut state = TreeState::new(dir.path()).unwrap();
        state.selected_index = 1;
        state.expand_selected();
        assert!(state.flat_items[1].is_expanded);
        assert_eq!(state.flat_items[2].name, "nested");
        assert_eq!(state.flat_items[2].size, "0 KB");
        assert_eq!(state.flat_items[3].name, "inner.txt");
    }

    #[test]
    fn collapse_expanded_then_jump_to_parent() {
        let dir = setup_test_dir();
        let mut state = TreeState::new(dir.path()).unwrap();
        state.selected_index = 1;
        state.expand_selected();
        state.selected_index = 3; // inner.txt
        state.collapse_selected();
        assert_eq!(state.selected_index, 1);
        state.collapse_selected();
        assert!(!state.flat_items[1].is_expanded);
        assert_eq!(state.flat_items.len(), 6);
    }

    #[test]
    fn refresh_overwrites_stale_folder_size() {
        let dir = setup_test_dir();
        let mut state = TreeState::new(dir.path()).unwrap();
        state.selected_index = 2; // beta, empty
        assert_eq!(state.flat_items[2].size, "0 KB");

        fs::write(dir.path().join("beta").join("new.bin"), vec![0u8; 2048]).unwrap();
        // Stored value stays stale until refreshed.
        state.flatten();
        assert_eq!(state.flat_items[2].size, "0 KB");

        let result = state.refresh_selected_size().unwrap();
        assert_eq!(result.size_bytes, 2048);
        assert_eq!(result.path, dir.path().join("beta"));
        assert_eq!(state.flat_items[2].size, "2 KB");
    }

    #[test]
    fn refresh_on_file_restats() {
        let dir = setup_test_dir();
        let mut state = TreeState::new(dir.path()).unwrap();
        let idx = state
            .find_index_by_path(&dir.path().join("file_a.txt"))
            .unwrap();
        fs::write(dir.path().join("file_a.txt"), vec![0u8; 5000]).unwrap();
        state.selected_index = idx;
        assert!(state.refresh_selected_size().is_none());
        assert_eq!(state.flat_items[idx].size, "4 KB");
    }

    #[test]
    fn refresh_of_deleted_folder_reports_zero() {
        let dir = setup_test_dir();
        let mut state = TreeState::new(dir.path()).unwrap();
        fs::write(dir.path().join("beta").join("x"), vec![0u8; 10]).unwrap();
        fs::remove_dir_all(dir.path().join("beta")).unwrap();
        let result = state.refresh_size_of(&dir.path().join("beta")).unwrap();
        assert_eq!(result.size_bytes, 0);
    }

    #[test]
    fn cycle_sort_changes_mode() {
        let dir = setup_test_dir();
        let mut state = TreeState::new(dir.path()).unwrap();
        assert_eq!(state.sort_by, SortBy::Name);
        state.cycle_sort();
        assert_eq!(state.sort_by, SortBy::Size);
        state.cycle_sort();
        assert_eq!(state.sort_by, SortBy::Modified);
        state.cycle_sort();
        assert_eq!(state.sort_by, SortBy::Name);
    }

    #[test]
    fn sort_by_size_uses_folder_sizes() {
        let dir = setup_test_dir();
        let mut state = TreeState::new(dir.path()).unwrap();
        state.dirs_first = false;
        state.sort_by = SortBy::Size;
        state.sort_all_children();
        state.flatten();
        // alpha (4096) > file_b.rs (3000) > file_a.txt (100) > beta, .hidden (0)
        assert_eq!(names(&state)[1..4], ["alpha", "file_b.rs", "file_a.txt"]);
    }

    #[test]
    fn toggle_dirs_first() {
        let dir = setup_test_dir();
        let mut state = TreeState::new(dir.path()).unwrap();
        state.toggle_dirs_first();
        assert!(!state.dirs_first);
        assert_eq!(names(&state)[1], ".hidden");
    }

    #[test]
    fn is_last_sibling_correctness() {
        let dir = setup_test_dir();
        let state = TreeState::new(dir.path()).unwrap();
        assert!(state.flat_items.last().unwrap().is_last_sibling);
        assert!(!state.flat_items[1].is_last_sibling);
    }

    #[test]
    fn apply_filter_matches_files() {
        let dir = setup_test_dir();
        let mut state = TreeState::new(dir.path()).unwrap();
        state.set_filter("file");
        assert!(state.is_filtering);
        assert_eq!(names(&state)[1..], ["file_a.txt", "file_b.rs"]);
    }

    #[test]
    fn apply_filter_preserves_ancestors() {
        let dir = setup_test_dir();
        let mut state = TreeState::new(dir.path()).unwrap();
        state.selected_index = 1;
        state.expand_selected();
        state.set_filter("inner");
        let shown = names(&state);
        assert!(shown.contains(&"alpha"), "ancestor should be preserved");
        assert!(shown.contains(&"inner.txt"));
        assert!(!shown.contains(&"beta"));
    }

    #[test]
    fn apply_filter_case_insensitive() {
        let dir = setup_test_dir();
        let mut state = TreeState::new(dir.path()).unwrap();
        state.set_filter("FILE_A");
        assert!(names(&state).contains(&"file_a.txt"));
    }

    #[test]
    fn apply_filter_no_matches_shows_root() {
        let dir = setup_test_dir();
        let mut state = TreeState::new(dir.path()).unwrap();
        state.selected_index = 4;
        state.set_filter("zzz_nothing");
        assert_eq!(state.flat_items.len(), 1);
        assert_eq!(state.selected_index, 0);
    }

    #[test]
    fn empty_filter_restores_full_view() {
        let dir = setup_test_dir();
        let mut state = TreeState::new(dir.path()).unwrap();
        let full = state.flat_items.len();
        state.set_filter("alpha");
        assert!(state.flat_items.len() < full);
        state.set_filter("");
        assert!(!state.is_filtering);
        assert_eq!(state.flat_items.len(), full);
    }

    #[test]
    fn filter_survives_refresh() {
        let dir = setup_test_dir();
        let mut state = TreeState::new(dir.path()).unwrap();
        state.set_filter("beta");
        state.selected_index = 1;
        state.refresh_selected_size();
        assert_eq!(names(&state), [state.root.name.as_str(), "beta"]);
    }

    #[test]
    fn reload_dir_picks_up_new_entries_and_keeps_expansion() {
        let dir = setup_test_dir();
        let mut state = TreeState::new(dir.path()).unwrap();
        state.selected_index = 1;
        state.expand_selected();

        fs::write(dir.path().join("gamma.txt"), vec![0u8; 1024]).unwrap();
        assert!(state.reload_dir(dir.path()));

        assert!(names(&state).contains(&"gamma.txt"));
        assert!(state.flat_items[1].is_expanded, "alpha stays expanded");
        assert_eq!(state.flat_items[0].size, "4 KB");
    }

    #[test]
    fn reload_dir_drops_removed_entries() {
        let dir = setup_test_dir();
        let mut state = TreeState::new(dir.path()).unwrap();
        fs::remove_file(dir.path().join("file_a.txt")).unwrap();
        state.reload_dir(dir.path());
        assert!(!names(&state).contains(&"file_a.txt"));
    }

    #[test]
    fn reload_dir_unknown_path_is_noop() {
        let dir = setup_test_dir();
        let mut state = TreeState::new(dir.path()).unwrap();
        assert!(!state.reload_dir(&dir.path().join("alpha").join("nested")));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_folder_is_sized_through_the_link() {
        let dir = setup_test_dir();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("data.bin"), vec![0u8; 10240]).unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("linked")).unwrap();

        let mut state = TreeState::new(dir.path()).unwrap();
        let idx = state.find_index_by_path(&dir.path().join("linked")).unwrap();
        let item = &state.flat_items[idx];
        assert_eq!(item.node_type, NodeType::Directory);
        assert!(item.is_symlink);
        assert_eq!(item.size, "10 KB");
        assert_eq!(item.kind, "Folder");

        state.selected_index = idx;
        state.expand_selected();
        assert!(names(&state).contains(&"data.bin"));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_file_stays_a_leaf() {
        let dir = setup_test_dir();
        std::os::unix::fs::symlink(
            dir.path().join("file_b.rs"),
            dir.path().join("link_b"),
        )
        .unwrap();
        let node = TreeNode::new(&dir.path().join("link_b"), 1).unwrap();
        assert_eq!(node.node_type, NodeType::Symlink);
        assert!(node.is_symlink);
        assert_eq!(node.size_column(), "2 KB");
    }

    #[test]
    fn kind_and_modified_columns() {
        let dir = setup_test_dir();
        let state = TreeState::new(dir.path()).unwrap();
        let kind_of = |name: &str| {
            let item = state.flat_items.iter().find(|i| i.name == name).unwrap();
            item.kind.clone()
        };
        assert_eq!(kind_of("alpha"), "Folder");
        assert_eq!(kind_of("file_b.rs"), "rs File");
        assert_eq!(kind_of(".hidden"), "File");

        // "YYYY-MM-DD HH:MM"
        let modified = &state.flat_items[1].modified;
        assert_eq!(modified.len(), 16);
        assert_eq!(&modified[4..5], "-");
        assert_eq!(format_modified(None), "");
    }

    #[test]
    fn reexpand_keeps_nested_expansion() {
        let dir = setup_test_dir();
        let mut state = TreeState::new(dir.path()).unwrap();
        state.selected_index = 1;
        state.expand_selected();
        state.selected_index = 2; // nested
        state.expand_selected();
        assert!(state.flat_items[2].is_expanded);

        state.selected_index = 1;
        state.collapse_selected();
        state.expand_selected();
        assert_eq!(state.flat_items[2].name, "nested");
        assert!(state.flat_items[2].is_expanded, "nested stays expanded");
    }

    #[test]
    fn filtered_folder_can_collapse_and_expand() {
        let dir = setup_test_dir();
        let mut state = TreeState::new(dir.path()).unwrap();
        state.selected_index = 1;
        state.expand_selected();
        state.selected_index = 2; // nested
        state.expand_selected();
        state.selected_index = 1;
        state.collapse_selected();

        // A match inside a loaded folder opens it.
        state.set_filter("inner");
        assert_eq!(names(&state)[1..], ["alpha", "inner.txt"]);
        assert!(state.flat_items[1].is_expanded);

        state.selected_index = 1;
        state.collapse_selected();
        assert_eq!(names(&state)[1..], ["alpha"]);
        assert!(!state.flat_items[1].is_expanded);

        state.expand_selected();
        assert_eq!(names(&state)[1..], ["alpha", "inner.txt"]);

        state.set_filter("");
        let nested = state.find_index_by_path(&dir.path().join("alpha").join("nested"));
        assert!(state.flat_items[nested.unwrap()].is_expanded);
    }

    #[test]
    fn reload_tree_refreshes_loaded_subfolders() {
        let dir = setup_test_dir();
        let mut state = TreeState::new(dir.path()).unwrap();
        state.selected_index = 1;
        state.expand_selected();

        fs::write(dir.path().join("alpha").join("new.bin"), vec![0u8; 4096]).unwrap();
        fs::write(dir.path().join("beta").join("b.bin"), vec![0u8; 1024]).unwrap();
        state.reload_tree();

        let alpha = &state.flat_items[1];
        assert_eq!(alpha.size, "8 KB");
        assert!(alpha.is_expanded);
        assert!(names(&state).contains(&"new.bin"));
        let beta = state.find_index_by_path(&dir.path().join("beta")).unwrap();
        assert_eq!(state.flat_items[beta].size, "1 KB");
    }

    #[test]
    fn watch_targets_follow_expanded_folders() {
        let dir = setup_test_dir();
        let mut state = TreeState::new(dir.path()).unwrap();
        let root = dir.path().to_path_buf();
        let alpha = root.join("alpha");
        let nested = alpha.join("nested");

        let targets = state.watch_targets();
        assert_eq!(
            targets,
            HashSet::from([root.clone(), alpha.clone(), root.join("beta")])
        );

        state.selected_index = 1;
        state.expand_selected();
        assert!(state.watch_targets().contains(&nested));

        state.collapse_selected();
        let targets = state.watch_targets();
        assert!(!targets.contains(&nested));
        assert!(targets.contains(&alpha));
    }

    #[test]
    fn update_scroll_follows_selection() {
        let dir = setup_test_dir();
        let mut state = TreeState::new(dir.path()).unwrap();
        state.selected_index = 5;
        state.update_scroll(3);
        assert_eq!(state.scroll_offset, 3);
        state.selected_index = 1;
        state.update_scroll(3);
        assert_eq!(state.scroll_offset, 1);
    }
}
