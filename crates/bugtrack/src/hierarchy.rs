//! Category tree construction.
//!
//! Storage only ever returns flat records. [`CategoryTree::build`] assembles
//! them into an arena: categories in input order, an id index and a
//! parent-id index of children (`None` holds the roots). The tree is rebuilt
//! from fresh records after every read and mutation; it is never persisted.
//!
//! Bad references never fail the build. They are collected as
//! [`TreeWarning`]s and logged:
//!
//! - a category whose parent is unknown is in no child list and is not a root
//! - a bug whose category is unknown is attached nowhere
//! - categories whose parent chain loops are kept out of the forest
//! - a repeated category id keeps only its first record

use crate::domain::{Bug, BugId, Category, CategoryId};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::warn;

/// Separator between names in a rendered category path.
pub const PATH_SEPARATOR: &str = " -> ";

/// A problem found while building the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeWarning {
    /// Category's parent id does not resolve
    DanglingParent {
        /// The category
        category_id: CategoryId,
        /// The unresolved parent
        parent_id: CategoryId,
    },
    /// Bug's category id does not resolve
    DanglingBug {
        /// The bug
        bug_id: BugId,
        /// The unresolved category
        category_id: CategoryId,
    },
    /// These categories are their own ancestors
    Cycle {
        /// Members of the loop, ascending
        category_ids: Vec<CategoryId>,
    },
    /// A second record used an id already seen and was ignored
    DuplicateId {
        /// The repeated id
        category_id: CategoryId,
    },
}

impl fmt::Display for TreeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingParent {
                category_id,
                parent_id,
            } => write!(
                f,
                "category {category_id} references missing parent {parent_id}"
            ),
            Self::DanglingBug {
                bug_id,
                category_id,
            } => write!(f, "bug {bug_id} references missing category {category_id}"),
            Self::Cycle { category_ids } => {
                let ids: Vec<String> = category_ids.iter().map(ToString::to_string).collect();
                write!(f, "categories {} form a parent cycle", ids.join(", "))
            }
            Self::DuplicateId { category_id } => {
                write!(f, "duplicate category id {category_id} ignored")
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    category: Category,
    bugs: Vec<Bug>,
}

/// Categories arranged as a forest, with their bugs attached.
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    nodes: Vec<Node>,
    index: HashMap<CategoryId, usize>,
    children: HashMap<Option<CategoryId>, Vec<usize>>,
    cyclic: HashSet<usize>,
    warnings: Vec<TreeWarning>,
}

impl CategoryTree {
    /// Build the forest from flat records.
    ///
    /// Children keep the order the backend returned them in. Runs in
    /// `O(categories + bugs)` apart from cycle detection.
    #[must_use]
    pub fn build(categories: Vec<Category>, bugs: Vec<Bug>) -> Self {
        let mut tree = Self::default();

        for category in categories {
            if tree.index.contains_key(&category.id) {
                tree.warnings.push(TreeWarning::DuplicateId {
                    category_id: category.id,
                });
                continue;
            }
            tree.index.insert(category.id, tree.nodes.len());
            tree.nodes.push(Node {
                category,
                bugs: Vec::new(),
            });
        }

        for (i, node) in tree.nodes.iter().enumerate() {
            match node.category.parent_id {
                Some(parent_id) if !tree.index.contains_key(&parent_id) => {
                    tree.warnings.push(TreeWarning::DanglingParent {
                        category_id: node.category.id,
                        parent_id,
                    });
                }
                parent => tree.children.entry(parent).or_default().push(i),
            }
        }

        tree.detect_cycles();

        for bug in bugs {
            match tree.index.get(&bug.category_id) {
                Some(&i) => tree.nodes[i].bugs.push(bug),
                None => tree.warnings.push(TreeWarning::DanglingBug {
                    bug_id: bug.id,
                    category_id: bug.category_id,
                }),
            }
        }

        for warning in &tree.warnings {
            warn!(%warning, "Category tree");
        }
        tree
    }

    /// Mark every category that sits on a parent loop.
    fn detect_cycles(&mut self) {
        let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(self.nodes.len(), 0);
        let handles: Vec<NodeIndex> = (0..self.nodes.len()).map(|i| graph.add_node(i)).collect();

        for (i, node) in self.nodes.iter().enumerate() {
            if let Some(&parent) = node
                .category
                .parent_id
                .and_then(|parent_id| self.index.get(&parent_id))
            {
                graph.add_edge(handles[i], handles[parent], ());
            }
        }

        for component in tarjan_scc(&graph) {
            let looped = component.len() > 1
                || component
                    .first()
                    .is_some_and(|&n| graph.contains_edge(n, n));
            if !looped {
                continue;
            }

            let mut ids: Vec<CategoryId> = component
                .iter()
                .map(|&n| {
                    let i = graph[n];
                    self.cyclic.insert(i);
                    self.nodes[i].category.id
                })
                .collect();
            ids.sort_unstable();
            self.warnings.push(TreeWarning::Cycle { category_ids: ids });
        }
    }

    /// Root categories, in input order.
    pub fn roots(&self) -> impl Iterator<Item = NodeRef<'_>> {
        self.child_refs(None)
    }

    /// Handle for the category with `id`.
    #[must_use]
    pub fn node(&self, id: CategoryId) -> Option<NodeRef<'_>> {
        self.index
            .get(&id)
            .map(|&index| NodeRef { tree: self, index })
    }

    /// Direct children of `id`; empty for unknown ids and leaves.
    pub fn children(&self, id: CategoryId) -> impl Iterator<Item = NodeRef<'_>> {
        self.child_refs(Some(id))
    }

    /// Bugs filed directly under `id`.
    #[must_use]
    pub fn bugs(&self, id: CategoryId) -> &[Bug] {
        self.index
            .get(&id)
            .map_or(&[], |&i| self.nodes[i].bugs.as_slice())
    }

    /// The category record with `id`.
    #[must_use]
    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.index.get(&id).map(|&i| &self.nodes[i].category)
    }

    /// Number of distinct categories, including unreachable ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no categories were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Problems found during the build.
    #[must_use]
    pub fn warnings(&self) -> &[TreeWarning] {
        &self.warnings
    }

    /// True when `id` sits on a parent loop.
    #[must_use]
    pub fn is_cyclic(&self, id: CategoryId) -> bool {
        self.index.get(&id).is_some_and(|i| self.cyclic.contains(i))
    }

    fn child_refs(&self, parent: Option<CategoryId>) -> impl Iterator<Item = NodeRef<'_>> {
        self.child_indices(parent)
            .iter()
            .map(|&index| NodeRef { tree: self, index })
    }

    /// Owned, fully populated forest reachable from the roots.
    ///
    /// Built bottom-up without recursion, so deep chains cannot overflow
    /// the stack.
    #[must_use]
    pub fn to_branches(&self) -> Vec<CategoryBranch> {
        let mut built: HashMap<usize, CategoryBranch> = HashMap::new();

        // Reverse pre-order visits every child before its parent.
        for (_, i) in self.preorder().into_iter().rev() {
            let node = &self.nodes[i];
            let children = self
                .child_indices(Some(node.category.id))
                .iter()
                .filter_map(|c| built.remove(c))
                .collect();
            built.insert(
                i,
                CategoryBranch {
                    category: node.category.clone(),
                    children,
                    bugs: node.bugs.clone(),
                },
            );
        }

        self.child_indices(None)
            .iter()
            .filter_map(|i| built.remove(i))
            .collect()
    }

    /// Every reachable category with its depth, in pre-order.
    #[must_use]
    pub fn flatten(&self) -> Vec<(usize, &Category)> {
        self.preorder()
            .into_iter()
            .map(|(depth, i)| (depth, &self.nodes[i].category))
            .collect()
    }

    fn preorder(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(usize, usize)> =
            self.child_indices(None).iter().rev().map(|&i| (0, i)).collect();

        while let Some((depth, i)) = stack.pop() {
            out.push((depth, i));
            let children = self.child_indices(Some(self.nodes[i].category.id));
            stack.extend(children.iter().rev().map(|&c| (depth + 1, c)));
        }
        out
    }

    fn child_indices(&self, parent: Option<CategoryId>) -> &[usize] {
        self.children.get(&parent).map_or(&[][..], Vec::as_slice)
    }

    /// Names from the root down to `category_id`, joined by `" -> "`.
    ///
    /// Unknown ids give `""`. A dangling parent ends the walk with the names
    /// gathered so far, and a revisited id (a loop) ends it the same way.
    #[must_use]
    pub fn category_path(&self, category_id: CategoryId) -> String {
        let mut names = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(category_id);

        while let Some(id) = current {
            if !seen.insert(id) {
                break;
            }
            let Some(category) = self.get(id) else {
                break;
            };
            names.push(category.name.as_str());
            current = category.parent_id;
        }

        names.reverse();
        names.join(PATH_SEPARATOR)
    }

    /// Pair each bug with its rendered category path.
    #[must_use]
    pub fn listings(&self, bugs: &[Bug]) -> Vec<BugListing> {
        bugs.iter()
            .map(|bug| BugListing {
                hierarchy: self.category_path(bug.category_id),
                bug: bug.clone(),
            })
            .collect()
    }
}

/// Borrowed view of one category inside a [`CategoryTree`].
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a CategoryTree,
    index: usize,
}

impl<'a> NodeRef<'a> {
    /// The category record.
    #[must_use]
    pub fn category(&self) -> &'a Category {
        &self.tree.nodes[self.index].category
    }

    /// Direct child categories.
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + use<'a> {
        self.tree.child_refs(Some(self.category().id))
    }

    /// Bugs filed directly under this category.
    #[must_use]
    pub fn bugs(&self) -> &'a [Bug] {
        &self.tree.nodes[self.index].bugs
    }

    /// True if the category has no children and no bugs.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.bugs().is_empty() && self.children().next().is_none()
    }
}

/// Owned category with its populated children and bugs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryBranch {
    /// The category record
    #[serde(flatten)]
    pub category: Category,
    /// Child branches
    #[serde(rename = "Children")]
    pub children: Vec<CategoryBranch>,
    /// Bugs filed directly under this category
    #[serde(rename = "Bugs")]
    pub bugs: Vec<Bug>,
}

/// A bug paired with its category path for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BugListing {
    /// The bug
    #[serde(flatten)]
    pub bug: Bug,
    /// Rendered path such as `"Root -> Mid -> Leaf"`
    #[serde(rename = "Hierarchy")]
    pub hierarchy: String,
}
