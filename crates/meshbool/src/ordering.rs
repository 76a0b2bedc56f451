//! Modifier-stack ordering rules.
//!
//! Boolean entries form one contiguous block. New booleans bubble up from
//! the bottom of the stack until they sit directly after an existing
//! boolean, or at the top when there is none. Local mirrors bubble the same
//! way and also stop behind an earlier local mirror, so they land after the
//! boolean block and before everything else.

use meshbool_scene::Operation;

fn bubble_up(stack: &mut [Operation], mut index: usize, stop: impl Fn(&Operation) -> bool) -> usize {
    while index > 0 && !stop(&stack[index - 1]) {
        stack.swap(index - 1, index);
        index -= 1;
    }
    index
}

/// `base`, or `base.001`, `base.002`, … if another entry already uses it.
pub fn unique_operation_name(stack: &[Operation], base: &str) -> String {
    let taken = |name: &str| stack.iter().any(|op| op.name == name);
    if !taken(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{base}.{n:03}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

fn push_unique(stack: &mut Vec<Operation>, mut op: Operation) -> usize {
    op.name = unique_operation_name(stack, &op.name);
    stack.push(op);
    stack.len() - 1
}

/// Insert a boolean after the existing boolean block. Returns its index.
pub fn insert_boolean(stack: &mut Vec<Operation>, op: Operation) -> usize {
    let index = push_unique(stack, op);
    bubble_up(stack, index, Operation::is_boolean)
}

/// Insert a local mirror after the booleans and earlier local mirrors.
pub fn insert_local_mirror(stack: &mut Vec<Operation>, op: Operation) -> usize {
    let index = push_unique(stack, op);
    bubble_up(stack, index, |prev| prev.is_boolean() || prev.is_local_mirror())
}

/// Insert at the very top of the stack, evaluated first.
pub fn insert_top(stack: &mut Vec<Operation>, mut op: Operation) -> usize {
    op.name = unique_operation_name(stack, &op.name);
    stack.insert(0, op);
    0
}

/// Append at the bottom of the stack.
pub fn insert_bottom(stack: &mut Vec<Operation>, op: Operation) -> usize {
    push_unique(stack, op)
}

/// Number of leading entries Apply bakes: through the last boolean.
pub fn apply_count(stack: &[Operation]) -> usize {
    stack
        .iter()
        .rposition(Operation::is_boolean)
        .map_or(0, |last| last + 1)
}

/// Whether the booleans form one uninterrupted run.
pub fn booleans_contiguous(stack: &[Operation]) -> bool {
    let first = stack.iter().position(Operation::is_boolean);
    let last = stack.iter().rposition(Operation::is_boolean);
    match (first, last) {
        (Some(first), Some(last)) => stack[first..=last].iter().all(Operation::is_boolean),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshbool_scene::{Axis, BooleanOperator, EntityId, OperationKind};

    fn boolean(name: &str) -> Operation {
        Operation::boolean(name, BooleanOperator::Difference, EntityId::default())
    }

    fn other(name: &str) -> Operation {
        Operation::new(
            name,
            OperationKind::Other {
                label: "BEVEL".into(),
            },
        )
    }

    fn local_mirror() -> Operation {
        Operation::new(
            "dc_local_mirror",
            OperationKind::Mirror {
                axis: Axis::X,
                bisect: true,
                flip: false,
                local: true,
                mirror_object: None,
            },
        )
    }

    fn names(stack: &[Operation]) -> Vec<&str> {
        stack.iter().map(|op| op.name.as_str()).collect()
    }

    #[test]
    fn test_boolean_into_empty_stack() {
        let mut stack = Vec::new();
        assert_eq!(insert_boolean(&mut stack, boolean("a")), 0);
        assert_eq!(apply_count(&stack), 1);
    }

    #[test]
    fn test_boolean_bubbles_above_non_booleans() {
        let mut stack = vec![other("bevel"), other("weld")];
        assert_eq!(insert_boolean(&mut stack, boolean("a")), 0);
        assert_eq!(insert_boolean(&mut stack, boolean("b")), 1);
        assert_eq!(names(&stack), ["a", "b", "bevel", "weld"]);
        assert!(booleans_contiguous(&stack));
    }

    #[test]
    fn test_boolean_stops_after_existing_block() {
        let mut stack = vec![other("mirror"), boolean("a"), other("weld")];
        assert_eq!(insert_boolean(&mut stack, boolean("b")), 2);
        assert_eq!(names(&stack), ["mirror", "a", "b", "weld"]);
        assert_eq!(apply_count(&stack), 3);
    }

    #[test]
    fn test_duplicate_names_get_suffix() {
        let mut stack = Vec::new();
        insert_boolean(&mut stack, boolean("dc_bool_obj"));
        insert_boolean(&mut stack, boolean("dc_bool_obj"));
        insert_top(&mut stack, boolean("dc_bool_obj"));
        assert_eq!(
            names(&stack),
            ["dc_bool_obj.002", "dc_bool_obj", "dc_bool_obj.001"]
        );
    }

    #[test]
    fn test_local_mirror_placement() {
        let mut stack = vec![boolean("a"), other("bevel")];
        assert_eq!(insert_local_mirror(&mut stack, local_mirror()), 1);
        assert_eq!(insert_local_mirror(&mut stack, local_mirror()), 2);
        assert_eq!(
            names(&stack),
            ["a", "dc_local_mirror", "dc_local_mirror.001", "bevel"]
        );

        // A later boolean still joins the block above the mirrors.
        insert_boolean(&mut stack, boolean("b"));
        assert_eq!(names(&stack)[..2], ["a", "b"]);
        assert!(booleans_contiguous(&stack));
    }

    #[test]
    fn test_apply_count_and_contiguity() {
        assert_eq!(apply_count(&[]), 0);
        assert_eq!(apply_count(&[other("x")]), 0);
        assert_eq!(apply_count(&[other("m"), boolean("a"), boolean("b")]), 3);

        assert!(booleans_contiguous(&[other("x")]));
        assert!(!booleans_contiguous(&[boolean("a"), other("x"), boolean("b")]));
    }
}
