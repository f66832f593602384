use rustc_hash::FxHashSet;

/// A set of Java-style class descriptor strings (`"Ljava/lang/Object;"`),
/// e.g. the image-class seed/closure set.
#[derive(Debug, Clone, Default)]
pub struct DescriptorSet {
    descriptors: FxHashSet<String>,
}

impl DescriptorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            descriptors: iter.into_iter().collect(),
        }
    }

    /// Insert a descriptor. Returns `true` if it was newly added.
    pub fn insert(&mut self, descriptor: impl Into<String>) -> bool {
        self.descriptors.insert(descriptor.into())
    }

    pub fn contains(&self, descriptor: &str) -> bool {
        self.descriptors.contains(descriptor)
    }

    /// Remove a descriptor, e.g. an image seed that failed to load.
    pub fn remove(&mut self, descriptor: &str) -> bool {
        self.descriptors.remove(descriptor)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_reports_novelty() {
        let mut set = DescriptorSet::new();
        assert!(set.insert("Ljava/lang/Object;"));
        assert!(!set.insert("Ljava/lang/Object;"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn contains_checks_membership() {
        let set = DescriptorSet::from_iter(["Ljava/lang/Object;".to_string()]);
        assert!(set.contains("Ljava/lang/Object;"));
        assert!(!set.contains("Ljava/lang/String;"));
    }
}
