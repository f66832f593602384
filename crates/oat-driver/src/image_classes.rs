//! The image-class closure (§4.3): the transitive set of descriptors that
//! must be present in the emitted ahead-of-time image.

use oat_types::{ClassReference, DescriptorSet, DriverError};

use crate::dex::DexFile;
use crate::loader::LoaderId;
use crate::resolver::{Resolver, ResolvedClass};

/// Owns the evolving image-class set plus the loader it's being built
/// against.
pub struct ImageClassClosure {
    descriptors: DescriptorSet,
    loader: LoaderId,
}

impl ImageClassClosure {
    pub fn new(seeds: DescriptorSet, loader: LoaderId) -> Self {
        Self {
            descriptors: seeds,
            loader,
        }
    }

    pub fn descriptors(&self) -> &DescriptorSet {
        &self.descriptors
    }

    pub fn into_descriptors(self) -> DescriptorSet {
        self.descriptors
    }

    /// Stage 1 (i)+(ii): drop seeds that fail to load, then close under
    /// catch-block exception types reachable from dex files' code items,
    /// iterating to a fixed point. `EmptyImageClassSet` is fatal if the set
    /// is empty once this returns.
    pub fn close_over_load_and_catch_types(
        &mut self,
        resolver: &dyn Resolver,
        dex_files: &[DexFile],
    ) -> Result<(), DriverError> {
        self.prune_unloadable_seeds(resolver);

        loop {
            let mut added_any = false;
            for dex in dex_files {
                for (_method_idx, code) in dex.code_items() {
                    for &catch_type_idx in &code.catch_type_indices {
                        let Some(resolved) = resolver.resolve_type(dex.id(), catch_type_idx, self.loader) else {
                            continue;
                        };
                        if !resolver.is_assignable(resolved.reference, throwable_sentinel()) {
                            #[cfg(debug_assertions)]
                            eprintln!(
                                "oat-driver: catch type {} is not assignable to Throwable, skipping",
                                resolved.descriptor
                            );
                            continue;
                        }
                        if self.descriptors.insert(resolved.descriptor) {
                            added_any = true;
                        }
                    }
                }
            }
            if !added_any {
                break;
            }
        }

        if self.descriptors.is_empty() {
            return Err(DriverError::EmptyImageClassSet);
        }
        Ok(())
    }

    fn prune_unloadable_seeds(&mut self, resolver: &dyn Resolver) {
        let seeds: Vec<String> = self.descriptors.iter().map(str::to_string).collect();
        for descriptor in seeds {
            if resolver.find_class(&descriptor, self.loader).is_none() {
                eprintln!("oat-driver: image seed {descriptor} failed to load, dropping");
                self.descriptors.remove(&descriptor);
            }
        }
    }

    /// Stage 5: sweep the live-object class chain, adding each object's
    /// class and its supertype/interface/array-component closure.
    pub fn sweep_live_object_classes(&mut self, resolver: &dyn Resolver, live_classes: &[ClassReference]) {
        for &class in live_classes {
            self.maybe_add(resolver, class);
        }
    }

    fn maybe_add(&mut self, resolver: &dyn Resolver, class: ClassReference) {
        let Some(info) = resolver.class_info(class) else {
            return;
        };
        if !self.descriptors.insert(info.descriptor.clone()) {
            // Already present; still need to recurse in case this sweep
            // reaches it via a shorter path than a previous call did, but
            // since the set only grows, there's nothing new to find.
            return;
        }
        self.walk_chain(resolver, &info);
    }

    fn walk_chain(&mut self, resolver: &dyn Resolver, info: &ResolvedClass) {
        if let Some(superclass) = info.superclass {
            self.maybe_add(resolver, superclass);
        }
        for &iface in &info.interfaces {
            self.maybe_add(resolver, iface);
        }
        if let Some(component) = info.array_component {
            self.maybe_add(resolver, component);
        }
    }
}

/// `Throwable`'s reference is a fixed well-known class, not one minted by a
/// particular dex file; tests and embedders alike key their mock resolver's
/// `Throwable` entry to this sentinel reference.
pub fn throwable_sentinel() -> ClassReference {
    ClassReference::new(oat_types::DexFileId(u32::MAX), u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dex::{ClassDefItem, CodeItem, DexFileBuilder, EncodedMethod};
    use crate::testkit::MockResolver;
    use oat_types::DexFileId;

    #[test]
    fn prunes_seed_that_fails_to_load() {
        let resolver = MockResolver::new();
        resolver.add_class("La/Known;", LoaderId::BOOT, ClassReference::new(DexFileId(0), 0));
        let mut seeds = DescriptorSet::new();
        seeds.insert("La/Known;".to_string());
        seeds.insert("La/Missing;".to_string());

        let mut closure = ImageClassClosure::new(seeds, LoaderId::BOOT);
        closure.close_over_load_and_catch_types(&resolver, &[]).unwrap();

        assert!(closure.descriptors().contains("La/Known;"));
        assert!(!closure.descriptors().contains("La/Missing;"));
    }

    #[test]
    fn empty_seed_set_after_pruning_is_fatal() {
        let resolver = MockResolver::new();
        let mut seeds = DescriptorSet::new();
        seeds.insert("La/Missing;".to_string());

        let mut closure = ImageClassClosure::new(seeds, LoaderId::BOOT);
        let err = closure.close_over_load_and_catch_types(&resolver, &[]).unwrap_err();
        assert!(matches!(err, DriverError::EmptyImageClassSet));
    }

    #[test]
    fn closes_over_catch_types_to_fixed_point() {
        let resolver = MockResolver::new();
        let throwable = throwable_sentinel();
        resolver.register_reference(throwable, "Ljava/lang/Throwable;", LoaderId::BOOT);

        let mut builder = DexFileBuilder::new("a.dex");
        let class_ty = builder.type_id("La/Seed;");
        let exc_ty = builder.type_id("La/MyException;");
        let void_ty = builder.type_id("V");
        let proto = builder.proto(void_ty, vec![]);
        let m = builder.method(class_ty, proto, "f");
        builder.add_class_def(ClassDefItem {
            class_idx: class_ty,
            direct_methods: vec![EncodedMethod {
                method_idx: m,
                access_flags: 0,
                code: Some(CodeItem { catch_type_indices: vec![exc_ty], insns_size_code_units: 2 }),
            }],
            ..Default::default()
        });
        let dex = builder.build(DexFileId(0));

        let exc_ref = ClassReference::new(DexFileId(0), 99);
        resolver.register_type(DexFileId(0), exc_ty, LoaderId::BOOT, exc_ref, "La/MyException;");
        resolver.make_assignable(exc_ref, throwable);

        let mut seeds = DescriptorSet::new();
        seeds.insert("La/Seed;".to_string());
        resolver.add_class("La/Seed;", LoaderId::BOOT, ClassReference::new(DexFileId(0), 0));

        let mut closure = ImageClassClosure::new(seeds, LoaderId::BOOT);
        closure.close_over_load_and_catch_types(&resolver, &[dex]).unwrap();

        assert!(closure.descriptors().contains("La/MyException;"));
    }
}
