//! Weighted zone hierarchy.

use std::collections::{BTreeMap, VecDeque};

use hashbrown::{HashMap, HashSet};

use crate::rng::GenRandom;
use crate::zone::{ZoneDef, ZoneFilter, ZoneId, ZoneRegistry};

/// Index into a [`ZoneTree`] arena. Handle 0 is the empty sentinel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneHandle(pub u32);

impl ZoneHandle {
    pub const EMPTY: ZoneHandle = ZoneHandle(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }
}

/// Entries drawn in proportion to their weights; weights need not sum to 1.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeightedList {
    entries: Vec<(ZoneHandle, f32)>,
    total: f32,
}

impl WeightedList {
    pub fn push(&mut self, handle: ZoneHandle, weight: f32) {
        self.entries.push((handle, weight));
        self.total += weight;
    }

    /// First entry whose cumulative weight reaches `next_f32() * total`.
    pub fn get<R: GenRandom + ?Sized>(&self, rng: &mut R) -> Option<ZoneHandle> {
        let (last, _) = *self.entries.last()?;
        let r = rng.next_f32() * self.total;
        let mut acc = 0.0;
        for &(h, w) in &self.entries {
            acc += w;
            if r <= acc {
                return Some(h);
            }
        }
        Some(last)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_weight(&self) -> f32 {
        self.total
    }

    pub fn entries(&self) -> &[(ZoneHandle, f32)] {
        &self.entries
    }

    pub fn normalized(&self) -> Vec<(ZoneHandle, f32)> {
        if self.total <= 0.0 {
            return Vec::new();
        }
        self.entries.iter().map(|&(h, w)| (h, w / self.total)).collect()
    }
}

#[derive(Clone, Debug)]
pub struct ZoneNode {
    pub id: ZoneId,
    pub weight: f32,
    pub parent: Option<ZoneHandle>,
    pub edge: Option<ZoneHandle>,
    pub edge_size: i32,
    /// Sub-variants, with the node itself first at weight 1.0.
    pub children: WeightedList,
    pub attributes: BTreeMap<String, toml::Value>,
}

impl ZoneNode {
    fn new(handle: ZoneHandle, def: &ZoneDef) -> Self {
        let mut children = WeightedList::default();
        children.push(handle, 1.0);
        Self {
            id: def.id.clone(),
            weight: def.weight,
            parent: None,
            edge: None,
            edge_size: def.edge_size.max(0),
            children,
            attributes: def.attributes.clone(),
        }
    }

    fn sentinel() -> Self {
        let mut children = WeightedList::default();
        children.push(ZoneHandle::EMPTY, 1.0);
        Self {
            id: ZoneId::EMPTY,
            weight: 0.0,
            parent: None,
            edge: None,
            edge_size: 0,
            children,
            attributes: BTreeMap::new(),
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&toml::Value> {
        self.attributes.get(key)
    }
}

/// Immutable snapshot of the selectable zones of one category. Produced by
/// [`ZoneTree::rebuild`]; share it behind an `Arc`.
#[derive(Clone, Debug)]
pub struct ZoneTree {
    nodes: Vec<ZoneNode>,
    by_id: HashMap<ZoneId, ZoneHandle>,
    roots: WeightedList,
}

impl Default for ZoneTree {
    fn default() -> Self {
        Self::empty()
    }
}

impl ZoneTree {
    /// Tree holding only the sentinel.
    pub fn empty() -> Self {
        let mut by_id = HashMap::new();
        by_id.insert(ZoneId::EMPTY, ZoneHandle::EMPTY);
        Self {
            nodes: vec![ZoneNode::sentinel()],
            by_id,
            roots: WeightedList::default(),
        }
    }

    /// Builds a fresh tree from a registry snapshot.
    ///
    /// Members are the zones `filter` accepts; their sub-variants and edge
    /// variants are pulled in regardless of category. Zones with a parent are
    /// never top-level, and the sentinel is never selectable. A missing
    /// registry gives the empty tree.
    pub fn rebuild(registry: Option<&ZoneRegistry>, filter: &ZoneFilter) -> ZoneTree {
        let Some(registry) = registry else {
            log::warn!(target: "zones", "zone registry unavailable; using empty zone tree");
            return Self::empty();
        };

        let mut sub_variants: HashMap<&ZoneId, Vec<&ZoneDef>> = HashMap::new();
        for def in registry.iter() {
            if let Some(p) = &def.parent {
                sub_variants.entry(p).or_default().push(def);
            }
        }

        let mut included: HashSet<&ZoneId> = HashSet::new();
        let mut queue: VecDeque<&ZoneDef> = registry.iter().filter(|d| filter.accepts(d)).collect();
        while let Some(def) = queue.pop_front() {
            if def.id.is_empty_sentinel() || !included.insert(&def.id) {
                continue;
            }
            for child in sub_variants.get(&def.id).into_iter().flatten() {
                queue.push_back(child);
            }
            if let Some(edge) = def.edge.as_ref().and_then(|e| registry.get(e)) {
                queue.push_back(edge);
            }
        }

        let mut tree = Self::empty();
        let defs: Vec<&ZoneDef> = registry
            .iter()
            .filter(|d| included.contains(&d.id))
            .collect();
        for def in &defs {
            let handle = ZoneHandle(tree.nodes.len() as u32);
            tree.nodes.push(ZoneNode::new(handle, def));
            tree.by_id.insert(def.id.clone(), handle);
        }

        for def in &defs {
            let handle = tree.by_id[&def.id];
            if let Some(pid) = &def.parent {
                match tree.by_id.get(pid).copied() {
                    Some(parent) if parent != handle => {
                        tree.nodes[handle.index()].parent = Some(parent);
                        tree.nodes[parent.index()].children.push(handle, def.weight);
                    }
                    Some(_) => {
                        log::warn!(target: "zones", "zone {} names itself as parent; ignored", def.id);
                    }
                    None => {
                        log::warn!(target: "zones", "zone {} has parent {} outside the tree; ignored", def.id, pid);
                    }
                }
            }
        }

        for def in &defs {
            let Some(eid) = &def.edge else { continue };
            let handle = tree.by_id[&def.id];
            match tree.by_id.get(eid).copied() {
                Some(edge) if edge != handle => {
                    tree.nodes[handle.index()].edge = Some(edge);
                    let edge_node = &mut tree.nodes[edge.index()];
                    if edge_node.parent.is_none() {
                        edge_node.parent = Some(handle);
                    }
                }
                _ => {
                    log::warn!(target: "zones", "zone {} has unusable edge {}; ignored", def.id, eid);
                }
            }
        }

        for def in &defs {
            let handle = tree.by_id[&def.id];
            // a parent that exists but was filtered out still hides its variant
            let parent_registered = def.parent.as_ref().is_some_and(|p| registry.contains(p));
            if filter.accepts(def) && tree.nodes[handle.index()].parent.is_none() && !parent_registered {
                tree.roots.push(handle, def.weight);
            }
        }

        log::info!(
            target: "zones",
            "zone tree rebuilt: {} zones, {} selectable",
            tree.nodes.len() - 1,
            tree.roots.len()
        );
        tree
    }

    /// Weighted draw over the top-level zones.
    pub fn pick<R: GenRandom + ?Sized>(&self, rng: &mut R) -> ZoneHandle {
        self.roots.get(rng).unwrap_or(ZoneHandle::EMPTY)
    }

    /// Weighted draw over `node`'s sub-variants, the node itself included.
    pub fn select<R: GenRandom + ?Sized>(&self, node: ZoneHandle, rng: &mut R) -> ZoneHandle {
        match self.node(node) {
            Some(n) => n.children.get(rng).unwrap_or(node),
            None => ZoneHandle::EMPTY,
        }
    }

    pub fn resolve_with_ancestry(&self, node: ZoneHandle) -> (ZoneHandle, Option<ZoneHandle>) {
        (node, self.parent(node))
    }

    /// True when `b` is `a` or one of `a`'s direct variants.
    pub fn is_same(&self, a: ZoneHandle, b: ZoneHandle) -> bool {
        a == b || self.parent(b) == Some(a)
    }

    pub fn parent(&self, node: ZoneHandle) -> Option<ZoneHandle> {
        self.node(node).and_then(|n| n.parent)
    }

    pub fn edge(&self, node: ZoneHandle) -> Option<ZoneHandle> {
        self.node(node).and_then(|n| n.edge)
    }

    pub fn children(&self, node: ZoneHandle) -> &[(ZoneHandle, f32)] {
        self.node(node).map(|n| n.children.entries()).unwrap_or(&[])
    }

    pub fn find(&self, id: &ZoneId) -> Option<ZoneHandle> {
        self.by_id.get(id).copied()
    }

    pub fn node(&self, handle: ZoneHandle) -> Option<&ZoneNode> {
        self.nodes.get(handle.index())
    }

    /// Id of `handle`, or the sentinel id for handles outside the tree.
    pub fn id(&self, handle: ZoneHandle) -> &ZoneId {
        self.node(handle).map(|n| &n.id).unwrap_or(&ZoneId::EMPTY)
    }

    /// Top-level zones with weights normalized to sum to 1.
    pub fn selectable(&self) -> Vec<(ZoneHandle, f32)> {
        self.roots.normalized()
    }

    /// Number of nodes, sentinel excluded.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// True when nothing is selectable.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}
