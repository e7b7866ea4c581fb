//! Recording in-memory host used by the unit tests.

use std::collections::{BTreeMap, HashMap, HashSet};

use image::{DynamicImage, Rgba, RgbaImage};

use crate::error::ManipulationResult;
use crate::geometry::{BoxStyle, Size};
use crate::raster::bitmap_from_data_uri;

use super::{
    ChangeSource, EditImageEvent, ElementSpec, Entity, Feature, HostEditor, HostError, HostResult,
    NodeId, SelectionAnchor,
};

#[derive(Debug, Clone)]
enum MockKind {
    Root,
    Image,
    Wrapper { type_tag: String, is_readonly: bool },
    Element(ElementSpec),
}

#[derive(Debug, Clone)]
struct MockNode {
    kind: MockKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: BTreeMap<String, String>,
    transform: String,
    src: String,
    natural: Size,
    display: Size,
    editable: bool,
    box_style: Option<BoxStyle>,
}

impl MockNode {
    fn new(kind: MockKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            attributes: BTreeMap::new(),
            transform: String::new(),
            src: String::new(),
            natural: Size::default(),
            display: Size::default(),
            editable: true,
            box_style: None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct MockHost {
    nodes: HashMap<NodeId, MockNode>,
    root: NodeId,
    next_id: u64,
    /// Upper bound the simulated layout applies to rendered image sizes.
    pub(crate) layout_max: Option<Size>,
    pub(crate) snapshots: usize,
    pub(crate) content_changes: Vec<(ChangeSource, Option<NodeId>)>,
    pub(crate) edit_image_events: Vec<EditImageEvent>,
    pub(crate) edit_image_override: Option<String>,
    pub(crate) selections: Vec<(NodeId, Option<SelectionAnchor>)>,
    pub(crate) features: HashSet<Feature>,
    pub(crate) dark_mode: bool,
    pub(crate) disposed: bool,
}

impl MockHost {
    pub(crate) fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(root, MockNode::new(MockKind::Root));
        Self {
            nodes,
            root,
            next_id: 1,
            layout_max: None,
            snapshots: 0,
            content_changes: Vec::new(),
            edit_image_events: Vec::new(),
            edit_image_override: None,
            selections: Vec::new(),
            features: HashSet::new(),
            dark_mode: false,
            disposed: false,
        }
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    fn allocate(&mut self, node: MockNode) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
    }

    fn detach(&mut self, node: NodeId) {
        let parent = self.nodes.get_mut(&node).and_then(|entry| entry.parent.take());
        if let Some(parent) = parent.and_then(|parent| self.nodes.get_mut(&parent)) {
            parent.children.retain(|child| *child != node);
        }
    }

    fn node(&self, node: NodeId) -> HostResult<&MockNode> {
        self.nodes.get(&node).ok_or(HostError::NodeNotFound(node))
    }

    fn node_mut(&mut self, node: NodeId) -> HostResult<&mut MockNode> {
        self.nodes.get_mut(&node).ok_or(HostError::NodeNotFound(node))
    }

    pub(crate) fn add_image(&mut self, src: &str, natural: Size) -> NodeId {
        let root = self.root;
        self.add_image_to(root, src, natural)
    }

    pub(crate) fn add_image_to(&mut self, parent: NodeId, src: &str, natural: Size) -> NodeId {
        let mut node = MockNode::new(MockKind::Image);
        node.src = src.to_string();
        node.natural = natural;
        node.display = natural;
        let id = self.allocate(node);
        self.append_child(parent, id);
        id
    }

    pub(crate) fn set_editable(&mut self, node: NodeId, editable: bool) {
        if let Some(entry) = self.nodes.get_mut(&node) {
            entry.editable = editable;
        }
    }

    pub(crate) fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node)
            .map(|entry| entry.children.clone())
            .unwrap_or_default()
    }

    pub(crate) fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = self.children(node);
        stack.reverse();
        while let Some(next) = stack.pop() {
            found.push(next);
            let mut children = self.children(next);
            children.reverse();
            stack.extend(children);
        }
        found
    }

    pub(crate) fn spec(&self, node: NodeId) -> Option<&ElementSpec> {
        match &self.nodes.get(&node)?.kind {
            MockKind::Element(spec) => Some(spec),
            _ => None,
        }
    }

    /// Descendants of `within` whose element spec satisfies `predicate`.
    pub(crate) fn elements_where(
        &self,
        within: NodeId,
        predicate: impl Fn(&ElementSpec) -> bool,
    ) -> Vec<NodeId> {
        self.descendants(within)
            .into_iter()
            .filter(|node| self.spec(*node).is_some_and(&predicate))
            .collect()
    }

    pub(crate) fn box_style(&self, node: NodeId) -> Option<BoxStyle> {
        self.nodes.get(&node)?.box_style
    }

    pub(crate) fn display_size(&self, node: NodeId) -> Size {
        self.nodes
            .get(&node)
            .map(|entry| entry.display)
            .unwrap_or_default()
    }

    /// Deep copy of `node` hung under a fresh detached root, as an export clone.
    pub(crate) fn clone_subtree(&mut self, node: NodeId) -> NodeId {
        let clone_root = self.allocate(MockNode::new(MockKind::Root));
        self.copy_into(node, clone_root);
        clone_root
    }

    fn copy_into(&mut self, source: NodeId, parent: NodeId) {
        let Some(mut copy) = self.nodes.get(&source).cloned() else {
            return;
        };
        let children = std::mem::take(&mut copy.children);
        copy.parent = None;
        let id = self.allocate(copy);
        self.append_child(parent, id);
        for child in children {
            self.copy_into(child, id);
        }
    }

    fn is_wrapper_with_tag(&self, node: NodeId, type_tag: &str) -> bool {
        matches!(
            self.nodes.get(&node).map(|entry| &entry.kind),
            Some(MockKind::Wrapper { type_tag: tag, .. }) if tag == type_tag
        )
    }
}

impl HostEditor for MockHost {
    fn contains(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.root {
                return true;
            }
            current = self.nodes.get(&id).and_then(|entry| entry.parent);
        }
        false
    }

    fn select(&mut self, node: NodeId, anchor: Option<SelectionAnchor>) -> HostResult<()> {
        self.node(node)?;
        self.selections.push((node, anchor));
        Ok(())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node)?.parent
    }

    fn insert_before(&mut self, node: NodeId, reference: NodeId) -> HostResult<()> {
        self.node(node)?;
        let parent = self.node(reference)?.parent.ok_or(HostError::Detached(reference))?;
        self.detach(node);
        let entry = self.node_mut(parent)?;
        let index = entry
            .children
            .iter()
            .position(|child| *child == reference)
            .unwrap_or(entry.children.len());
        entry.children.insert(index, node);
        self.node_mut(node)?.parent = Some(parent);
        Ok(())
    }

    fn remove_node(&mut self, node: NodeId) -> HostResult<()> {
        self.node(node)?;
        self.detach(node);
        Ok(())
    }

    fn query_images(&self, root: Option<NodeId>, selector: &str) -> Vec<NodeId> {
        self.descendants(root.unwrap_or(self.root))
            .into_iter()
            .filter(|node| self.matches_selector(*node, selector))
            .collect()
    }

    fn create_element(&mut self, parent: NodeId, spec: &ElementSpec) -> HostResult<NodeId> {
        self.node(parent)?;
        let id = self.allocate(MockNode::new(MockKind::Element(spec.clone())));
        self.append_child(parent, id);
        Ok(id)
    }

    fn set_box(&mut self, node: NodeId, style: &BoxStyle) -> HostResult<()> {
        self.node_mut(node)?.box_style = Some(*style);
        Ok(())
    }

    fn wrap_entity(
        &mut self,
        node: NodeId,
        type_tag: &str,
        _is_block: bool,
        is_readonly: bool,
    ) -> HostResult<Entity> {
        self.node(node)?.parent.ok_or(HostError::Detached(node))?;
        let wrapper = self.allocate(MockNode::new(MockKind::Wrapper {
            type_tag: type_tag.to_string(),
            is_readonly,
        }));
        self.append_child(self.root, wrapper);
        self.insert_before(wrapper, node)?;
        self.detach(node);
        self.append_child(wrapper, node);
        Ok(Entity {
            type_tag: type_tag.to_string(),
            wrapper,
            is_readonly,
        })
    }

    fn entity_of(&self, node: NodeId) -> Option<Entity> {
        match &self.nodes.get(&node)?.kind {
            MockKind::Wrapper {
                type_tag,
                is_readonly,
            } => Some(Entity {
                type_tag: type_tag.clone(),
                wrapper: node,
                is_readonly: *is_readonly,
            }),
            _ => None,
        }
    }

    fn query_entities(&self, type_tag: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|node| self.is_wrapper_with_tag(*node, type_tag))
            .collect()
    }

    fn is_image(&self, node: NodeId) -> bool {
        matches!(
            self.nodes.get(&node).map(|entry| &entry.kind),
            Some(MockKind::Image)
        )
    }

    fn is_content_editable(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|entry| entry.editable)
    }

    fn matches_selector(&self, node: NodeId, selector: &str) -> bool {
        if !self.is_image(node) {
            return false;
        }
        match selector.strip_prefix("img.") {
            Some(class) => self
                .attribute(node, "class")
                .is_some_and(|classes| classes.split_whitespace().any(|token| token == class)),
            None => selector == "img",
        }
    }

    fn client_size(&self, node: NodeId) -> Size {
        let display = self.display_size(node);
        match self.layout_max {
            Some(max) => Size::new(display.width.min(max.width), display.height.min(max.height)),
            None => display,
        }
    }

    fn set_display_size(&mut self, node: NodeId, size: Size) -> HostResult<()> {
        self.node_mut(node)?.display = size;
        Ok(())
    }

    fn transform(&self, node: NodeId) -> String {
        self.nodes
            .get(&node)
            .map(|entry| entry.transform.clone())
            .unwrap_or_default()
    }

    fn set_transform(&mut self, node: NodeId, transform: &str) -> HostResult<()> {
        self.node_mut(node)?.transform = transform.to_string();
        Ok(())
    }

    fn source(&self, node: NodeId) -> String {
        self.nodes
            .get(&node)
            .map(|entry| entry.src.clone())
            .unwrap_or_default()
    }

    fn set_source(&mut self, node: NodeId, src: &str) -> HostResult<()> {
        self.node_mut(node)?.src = src.to_string();
        Ok(())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes.get(&node)?.attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> HostResult<()> {
        self.node_mut(node)?
            .attributes
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> HostResult<()> {
        self.node_mut(node)?.attributes.remove(name);
        Ok(())
    }

    fn natural_bitmap(&self, node: NodeId) -> HostResult<DynamicImage> {
        let entry = self.node(node)?;
        if let Ok(bitmap) = bitmap_from_data_uri(&entry.src) {
            return Ok(bitmap);
        }
        let width = entry.natural.width.max(1.0) as u32;
        let height = entry.natural.height.max(1.0) as u32;
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([40, 80, 120, 255]),
        )))
    }

    fn add_undo_snapshot(&mut self) -> HostResult<()> {
        self.snapshots += 1;
        Ok(())
    }

    fn add_undo_snapshot_with<F>(&mut self, mutation: F) -> ManipulationResult<()>
    where
        F: FnOnce(&mut Self) -> ManipulationResult<()>,
    {
        self.snapshots += 1;
        mutation(self)
    }

    fn trigger_content_changed(
        &mut self,
        source: ChangeSource,
        data: Option<NodeId>,
    ) -> HostResult<()> {
        self.content_changes.push((source, data));
        Ok(())
    }

    fn trigger_edit_image(&mut self, event: &mut EditImageEvent) -> HostResult<()> {
        if let Some(replacement) = &self.edit_image_override {
            event.new_src = replacement.clone();
        }
        self.edit_image_events.push(event.clone());
        Ok(())
    }

    fn is_feature_enabled(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    fn is_dark_mode(&self) -> bool {
        self.dark_mode
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}
