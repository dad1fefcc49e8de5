use crate::ComponentDescriptor;

/// Visitor pattern for traversing descriptor trees immutably
///
/// The default implementation walks the entire tree depth-first, parents
/// before children.
pub trait Visitor: Sized {
    fn visit_descriptor(&mut self, descriptor: &ComponentDescriptor) {
        walk_descriptor(self, descriptor);
    }
}

/// Mutable visitor pattern for transforming descriptor trees
pub trait VisitorMut: Sized {
    fn visit_descriptor_mut(&mut self, descriptor: &mut ComponentDescriptor) {
        walk_descriptor_mut(self, descriptor);
    }
}

pub fn walk_descriptor<V: Visitor>(visitor: &mut V, descriptor: &ComponentDescriptor) {
    for child in &descriptor.children {
        visitor.visit_descriptor(child);
    }
}

pub fn walk_descriptor_mut<V: VisitorMut>(visitor: &mut V, descriptor: &mut ComponentDescriptor) {
    for child in &mut descriptor.children {
        visitor.visit_descriptor_mut(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ComponentType;

    struct TypeCollector(Vec<String>);

    impl Visitor for TypeCollector {
        fn visit_descriptor(&mut self, descriptor: &ComponentDescriptor) {
            self.0.push(descriptor.kind.to_string());
            walk_descriptor(self, descriptor);
        }
    }

    #[test]
    fn test_visitor_walks_depth_first() {
        let tree = ComponentDescriptor::new(ComponentType::SCENARIO).with_child(
            ComponentDescriptor::new(ComponentType::BLOCK)
                .with_child(ComponentDescriptor::new(ComponentType::PAGE)),
        );

        let mut collector = TypeCollector(Vec::new());
        collector.visit_descriptor(&tree);

        assert_eq!(collector.0, vec!["Scenario", "Block", "Page"]);
    }
}
