//! End-to-end behaviour of live booleans, apply and modal operators.

use meshbool::{
    drive, ordering, BoolConfig, BoolContext, BooleanParams, Command, CommandStatus,
    EvaluationError, GeometryKernel, GroupReclaim, HistoryKernel, InputEvent, MirrorParams,
    ModalState, Operand, RadialArray,
};
use meshbool_scene::{
    Axis, BooleanOperator, EntityId, GroupPurpose, MeshData, Operation, OperationKind, Scene,
    Transform,
};
use nalgebra::Vector3;

fn cube(size: f64) -> MeshData {
    MeshData::cuboid(Vector3::new(size, size, size))
}

fn other(label: &str) -> Operation {
    Operation::new(
        label,
        OperationKind::Other {
            label: label.to_uppercase(),
        },
    )
}

fn live_add<K: GeometryKernel>(ctx: &mut BoolContext<K>, ids: &[EntityId], op: BooleanOperator) {
    ctx.scene.select(ids);
    let status = ctx
        .execute(Command::LiveAdd(BooleanParams::new(op)))
        .unwrap();
    assert_eq!(status, CommandStatus::Finished);
}

fn apply<K: GeometryKernel>(ctx: &mut BoolContext<K>, ids: &[EntityId]) -> meshbool::ApplyReport {
    ctx.scene.select(ids);
    ctx.apply().unwrap()
}

/// Fails the n-th boolean it is asked to bake (1-based).
struct FailNth {
    n: usize,
    seen: usize,
    inner: HistoryKernel,
}

impl FailNth {
    fn new(n: usize) -> Self {
        Self {
            n,
            seen: 0,
            inner: HistoryKernel,
        }
    }
}

impl GeometryKernel for FailNth {
    fn apply_operation(
        &mut self,
        target: &mut MeshData,
        placement: &Transform,
        kind: &OperationKind,
        source: Option<Operand<'_>>,
    ) -> Result<(), EvaluationError> {
        if matches!(kind, OperationKind::Boolean { .. }) {
            self.seen += 1;
            if self.seen == self.n {
                return Err(EvaluationError::Degenerate("injected".into()));
            }
        }
        self.inner.apply_operation(target, placement, kind, source)
    }

    fn intersect_selected(
        &mut self,
        mesh: &mut MeshData,
        operator: BooleanOperator,
    ) -> Result<(), EvaluationError> {
        self.inner.intersect_selected(mesh, operator)
    }
}

#[test]
fn test_stack_stays_contiguous() {
    let mut scene = Scene::new();
    let target = scene.add_mesh("Target", cube(4.0));
    scene.get_mut(target).unwrap().stack.push(other("Bevel"));
    let cutters: Vec<_> = (0..4)
        .map(|i| scene.add_mesh(&format!("Cutter{i}"), cube(1.0)))
        .collect();
    let mut ctx = BoolContext::with_scene(scene);

    for (i, &cutter) in cutters.iter().enumerate() {
        live_add(&mut ctx, &[target, cutter], BooleanOperator::Difference);
        let stack = &ctx.scene.get(target).unwrap().stack;
        assert!(ordering::booleans_contiguous(stack), "after cutter {i}: {stack:?}");
        assert!(stack[0].is_boolean());

        // Interleave other entries between adds.
        if i % 2 == 0 {
            ctx.scene.select(&[target]);
            ctx.add_mirror(MirrorParams {
                local: true,
                axis: Axis::X,
                negative: false,
            })
            .unwrap();
        } else {
            ctx.scene.get_mut(target).unwrap().stack.push(other("Weld"));
        }
        assert!(ordering::booleans_contiguous(
            &ctx.scene.get(target).unwrap().stack
        ));
    }

    let stack = &ctx.scene.get(target).unwrap().stack;
    assert_eq!(stack.iter().filter(|op| op.is_boolean()).count(), 4);
    assert_eq!(ordering::apply_count(stack), 4);
}

#[test]
fn test_shared_cutter_renamed_once() {
    let mut scene = Scene::new();
    let a = scene.add_mesh("A", cube(2.0));
    let b = scene.add_mesh("B", cube(2.0));
    let c = scene.add_mesh("C", cube(1.0));
    let mut ctx = BoolContext::with_scene(scene);

    live_add(&mut ctx, &[a, c], BooleanOperator::Difference);
    live_add(&mut ctx, &[b, c], BooleanOperator::Union);

    assert_eq!(ctx.scene.get(c).unwrap().name, "dc_bool_obj");
    assert!(ctx.scene.find("dc_bool_obj.001").is_none());

    let boolean_groups: Vec<_> = ctx
        .scene
        .groups()
        .filter(|(_, g)| g.purpose == GroupPurpose::Boolean)
        .collect();
    assert_eq!(boolean_groups.len(), 1);
    let groups = &ctx.scene.get(c).unwrap().groups;
    assert_eq!(groups.len(), 1);
    assert!(groups.contains(&boolean_groups[0].0));
    assert_eq!(ctx.scene.boolean_references(c), 2);
}

#[test]
fn test_apply_is_prefix_collapse() {
    let mut scene = Scene::new();
    let t = scene.add_mesh("T", cube(4.0));
    let s = scene.add_mesh("S", cube(1.0));
    let mut ctx = BoolContext::with_scene(scene);
    live_add(&mut ctx, &[t, s], BooleanOperator::Difference);
    ctx.scene.get_mut(t).unwrap().stack.push(other("Bevel"));

    let report = apply(&mut ctx, &[t]);
    assert_eq!(report.baked, 1);
    let entity = ctx.scene.get(t).unwrap();
    assert_eq!(entity.stack.len(), 1);
    assert_eq!(entity.stack[0].name, "Bevel");
    assert!(entity.mesh.history.iter().all(|b| b.label != "BEVEL"));
}

#[test]
fn test_orphan_reference_counting() {
    let mut scene = Scene::new();
    let a = scene.add_mesh("A", cube(2.0));
    let b = scene.add_mesh("B", cube(2.0));
    let c = scene.add_mesh("C", cube(1.0));
    let mut ctx = BoolContext::with_scene(scene);
    live_add(&mut ctx, &[a, b, c], BooleanOperator::Difference);

    let report = apply(&mut ctx, &[a]);
    assert!(ctx.scene.contains(c));
    assert_eq!(report.kept, vec![c]);
    assert_eq!(report.group, Some(GroupReclaim::Kept { remaining: 1 }));

    let report = apply(&mut ctx, &[a, b]);
    assert!(!ctx.scene.contains(c));
    assert_eq!(report.deleted, vec!["dc_bool_obj".to_string()]);
    assert_eq!(report.group, Some(GroupReclaim::Deleted));
    assert_eq!(ctx.current_boolean_group(), None);
}

#[test]
fn test_partial_failure_drops_only_failing_entry() {
    let mut scene = Scene::new();
    let t = scene.add_mesh("T", cube(4.0));
    let cutters: Vec<_> = (0..3)
        .map(|i| scene.add_mesh(&format!("S{i}"), cube(1.0)))
        .collect();
    let mut ctx = BoolContext::new(scene, FailNth::new(2), BoolConfig::default());
    for &cutter in &cutters {
        live_add(&mut ctx, &[t, cutter], BooleanOperator::Difference);
    }
    let second = ctx.scene.get(t).unwrap().stack[1].name.clone();

    let report = apply(&mut ctx, &[t]);
    assert_eq!(report.baked, 2);
    assert_eq!(report.dropped, vec![second]);

    let entity = ctx.scene.get(t).unwrap();
    assert!(entity.stack.is_empty());
    let booleans = entity
        .mesh
        .history
        .iter()
        .filter(|b| b.operator.is_some())
        .count();
    assert_eq!(booleans, 2);
    for cutter in cutters {
        assert!(!ctx.scene.contains(cutter));
    }
}

#[test]
fn test_group_reclamation_keeps_foreign_entity() {
    let mut scene = Scene::new();
    let t = scene.add_mesh("T", cube(4.0));
    let s = scene.add_mesh("S", cube(1.0));
    let foreign = scene.add_mesh("Prop", cube(1.0));
    let mut ctx = BoolContext::with_scene(scene);
    live_add(&mut ctx, &[t, s], BooleanOperator::Difference);

    let group = ctx.current_boolean_group().unwrap();
    ctx.scene.link_entity(group, foreign).unwrap();
    ctx.scene.group_mut(group).unwrap().hide_viewport = true;

    let report = apply(&mut ctx, &[t]);
    assert!(!ctx.scene.contains(s));
    assert_eq!(report.group, Some(GroupReclaim::Kept { remaining: 1 }));
    let g = ctx.scene.group(group).unwrap();
    assert!(g.hide_viewport);
    assert!(g.contains(foreign));
}

#[test]
fn test_group_deleted_after_last_reference() {
    let mut scene = Scene::new();
    let t = scene.add_mesh("T", cube(4.0));
    let s = scene.add_mesh("S", cube(1.0));
    let mut ctx = BoolContext::with_scene(scene);
    live_add(&mut ctx, &[t, s], BooleanOperator::Difference);
    let group = ctx.current_boolean_group().unwrap();
    ctx.scene.group_mut(group).unwrap().hide_viewport = true;

    apply(&mut ctx, &[t]);
    assert!(ctx.scene.group(group).is_none());
    assert!(ctx.scene.find_group("DC_booleans").is_none());

    // A later add creates a fresh group.
    let s2 = ctx.scene.add_mesh("S2", cube(1.0));
    live_add(&mut ctx, &[t, s2], BooleanOperator::Union);
    assert!(ctx.current_boolean_group().is_some());
}

#[test]
fn test_mirror_before_booleans_is_baked() {
    let mut scene = Scene::new();
    let t1 = scene.add_mesh("T1", cube(4.0));
    let s1 = scene.add_mesh("S1", cube(1.0));
    let s2 = scene.add_mesh("S2", cube(1.0));
    {
        let stack = &mut scene.get_mut(t1).unwrap().stack;
        stack.push(Operation::new(
            "Mirror",
            OperationKind::Mirror {
                axis: Axis::X,
                bisect: false,
                flip: false,
                local: false,
                mirror_object: None,
            },
        ));
        stack.push(Operation::boolean("S1", BooleanOperator::Union, s1));
        stack.push(Operation::boolean("S2", BooleanOperator::Difference, s2));
    }
    let mut ctx = BoolContext::with_scene(scene);

    let report = apply(&mut ctx, &[t1]);
    assert_eq!(report.baked, 3);
    assert!(ctx.scene.get(t1).unwrap().stack.is_empty());
    let labels: Vec<_> = ctx
        .scene
        .get(t1)
        .unwrap()
        .mesh
        .history
        .iter()
        .map(|b| b.label.as_str())
        .collect();
    assert_eq!(labels, ["MIRROR", "BOOLEAN", "BOOLEAN"]);
    assert!(!ctx.scene.contains(s1));
    assert!(!ctx.scene.contains(s2));
    assert_eq!(report.group, None);
}

#[test]
fn test_radial_cancel_restores_scene() {
    let mut scene = Scene::new();
    let blade = scene.add_mesh("Blade", cube(1.0));
    scene.get_mut(blade).unwrap().stack.push(other("Bevel"));
    scene.select(&[blade]);
    let mut ctx = BoolContext::with_scene(scene);

    let entities = ctx.scene.entity_count();
    let groups = ctx.scene.groups().count();
    let stack = ctx.scene.get(blade).unwrap().stack.clone();

    let mut op = RadialArray::invoke(&mut ctx).unwrap();
    let state = drive(
        &mut op,
        &mut ctx,
        [
            InputEvent::PointerMove {
                x: 0.0,
                ctrl: true,
                shift: false,
            },
            InputEvent::PointerMove {
                x: 30.0,
                ctrl: true,
                shift: false,
            },
            InputEvent::WheelUp,
            InputEvent::KeyRelease(Axis::Y),
            InputEvent::Cancel,
            InputEvent::LeftClick,
        ],
    )
    .unwrap();

    assert_eq!(state, ModalState::Cancelled);
    assert_eq!(ctx.scene.entity_count(), entities);
    assert_eq!(ctx.scene.groups().count(), groups);
    assert_eq!(ctx.scene.get(blade).unwrap().stack, stack);
    assert!(ctx.scene.validate().is_ok());
}

#[test]
fn test_nested_user_group_blocks_reclaim() {
    let mut scene = Scene::new();
    let t = scene.add_mesh("T", cube(4.0));
    let s = scene.add_mesh("S", cube(1.0));
    let prop = scene.add_mesh("Prop", cube(1.0));
    let mut ctx = BoolContext::with_scene(scene);
    live_add(&mut ctx, &[t, s], BooleanOperator::Difference);

    let group = ctx.current_boolean_group().unwrap();
    let sub = ctx
        .scene
        .create_group("UserSub", GroupPurpose::User, Some(group))
        .unwrap();
    ctx.scene.move_to_group(prop, sub).unwrap();

    let report = apply(&mut ctx, &[t]);
    assert!(!ctx.scene.contains(s));
    assert_eq!(report.group, Some(GroupReclaim::Kept { remaining: 1 }));
    assert!(ctx.scene.group(group).is_some());
    assert_eq!(ctx.scene.group(sub).unwrap().parent, Some(group));
    assert!(ctx.scene.get(prop).unwrap().groups.contains(&sub));
}
