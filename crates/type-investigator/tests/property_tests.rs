//! # Property-Based Tests
//!
//! Hierarchy queries over generated class chains.

use proptest::prelude::*;
use type_investigator::{
    ClassDefinition, ClassRegistry, FieldDefinition, Investigator, MethodDefinition, TypeInfo,
    Value,
};

/// Register `gen.C0 <- gen.C1 <- ... <- gen.C{depth-1}`, each declaring one
/// field `f{i}` and one method `level{i}` returning `i`
fn chain(registry: &mut ClassRegistry, depth: usize) -> usize {
    let mut parent = None;
    for i in 0..depth {
        let level = i as i32;
        let mut def = ClassDefinition::new(&format!("gen.C{}", i))
            .field(FieldDefinition::new(&format!("f{}", i), TypeInfo::Int))
            .method(
                MethodDefinition::new(&format!("level{}", i), TypeInfo::Int)
                    .body(move |_| Ok(Value::Int(level))),
            );
        if let Some(id) = parent {
            def = def.extends(id);
        }
        parent = Some(registry.define_class(def).expect("define"));
    }
    parent.expect("depth is at least 1")
}

proptest! {
    /// The chain lists every generated class from the top down.
    #[test]
    fn inheritance_chain_lists_every_level(depth in 1usize..8) {
        let mut registry = ClassRegistry::new();
        let leaf = chain(&mut registry, depth);
        let investigator = Investigator::for_type(&registry, leaf).expect("investigator");

        let expected: Vec<String> = (0..depth).map(|i| format!("C{}", i)).collect();
        prop_assert_eq!(investigator.inheritance_chain(",").expect("chain"), expected.join(","));
        prop_assert_eq!(investigator.is_extending(), depth > 1);
    }

    /// Every level contributes its field; the root contributes nothing.
    #[test]
    fn field_names_cover_every_level(depth in 1usize..8) {
        let mut registry = ClassRegistry::new();
        let leaf = chain(&mut registry, depth);
        let investigator = Investigator::for_type(&registry, leaf).expect("investigator");

        let names = investigator.field_names_in_hierarchy().expect("fields");
        prop_assert_eq!(names.len(), depth);
        for i in 0..depth {
            let name = format!("f{}", i);
            prop_assert!(names.contains(&name));
        }
        prop_assert_eq!(investigator.field_count(), 1);
    }

    /// A method declared at any level is reachable from a leaf instance.
    #[test]
    fn inherited_methods_are_invocable(depth in 1usize..8, pick in 0usize..8) {
        let pick = pick % depth;
        let mut registry = ClassRegistry::new();
        let leaf = chain(&mut registry, depth);
        let instance = registry.instantiate(leaf, &[]).expect("instance");

        let mut investigator = Investigator::new(&registry).expect("investigator");
        investigator.load(instance).expect("load");

        let method = format!("level{}", pick);
        prop_assert_eq!(investigator.invoke_method_returning_int(&method, &[]), Ok(pick as i32));
        prop_assert_eq!(investigator.invoke_int_or_zero("missing", &[Value::Int(1)]), 0);
    }
}
