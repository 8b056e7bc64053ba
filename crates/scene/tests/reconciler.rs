//! Integration tests for the reconciler against the in-memory scene graph.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use scene::{
    colors, Attr, DrawLayer, FrameOutcome, Hooks, NodeId, PropKind, Reconciler, RetainedScene,
    SceneGraph, Status, TextureId, TextureSource, VisOptions, ZIndexUpdate,
};
use sim_core::{Agent, AgentId, AgentKind, CellRect, GridSettings, Simulation};

type Vis = Reconciler<NodeId, TextureId>;

fn grid() -> Simulation {
    Simulation::new(GridSettings::new(40.0, 40.0, 10.0)).unwrap()
}

fn set_z(sim: &mut Simulation, id: AgentId, z: Option<f64>) {
    sim.get_mut(AgentKind::Actor, id).unwrap().z_index = z;
}

fn node(vis: &Vis, kind: AgentKind, id: AgentId) -> NodeId {
    vis.record(kind, id).unwrap().node
}

fn set_up(options: VisOptions, sim: &mut Simulation) -> (Vis, RetainedScene) {
    let mut scene = RetainedScene::new();
    let mut vis = Vis::new(options);
    vis.setup(sim, &mut scene);
    (vis, scene)
}

/// Only agents with a usable draw-order key get a display object.
#[test]
fn test_setup_tracks_included_agents() {
    let mut sim = grid();
    sim.add_zone(CellRect::new(0, 1, 0, 1)).unwrap();
    let visible = sim.add_actor(5.0, 5.0, 2.0).unwrap();
    let hidden = sim.add_actor(15.0, 5.0, 2.0).unwrap();
    let nan = sim.add_actor(25.0, 5.0, 2.0).unwrap();
    set_z(&mut sim, hidden, None);
    set_z(&mut sim, nan, Some(f64::NAN));

    let (vis, scene) = set_up(VisOptions::default(), &mut sim);
    let layers = vis.layers().unwrap();

    assert_eq!(vis.status(), Status::Running);
    assert_eq!(vis.tracked(AgentKind::Square), 16);
    assert_eq!(vis.tracked(AgentKind::Zone), 1);
    assert_eq!(vis.tracked(AgentKind::Actor), 1);
    assert!(vis.record(AgentKind::Actor, visible).is_some());
    assert!(vis.record(AgentKind::Actor, hidden).is_none());
    assert!(vis.record(AgentKind::Actor, nan).is_none());

    assert_eq!(scene.children(layers.back).len(), 17);
    assert_eq!(scene.children(layers.middle).len(), 1);
    assert!(scene.children(layers.front).is_empty());
    assert_eq!(scene.children(scene.root()), &[layers.back, layers.middle, layers.front]);
}

/// Removed agents lose their display object on the next frame.
#[test]
fn test_removal_detaches_display_object() {
    let mut sim = grid();
    let actor = sim.add_actor(5.0, 5.0, 2.0).unwrap();
    let zone = sim.add_zone(CellRect::new(0, 0, 0, 0)).unwrap();
    let (mut vis, mut scene) = set_up(VisOptions::default(), &mut sim);
    let actor_node = node(&vis, AgentKind::Actor, actor);
    let zone_node = node(&vis, AgentKind::Zone, zone);

    sim.remove(AgentKind::Actor, actor).unwrap();
    sim.remove(AgentKind::Zone, zone).unwrap();
    assert_eq!(vis.frame(&mut sim, &mut scene), FrameOutcome::Ticked);

    assert!(vis.record(AgentKind::Actor, actor).is_none());
    assert!(vis.record(AgentKind::Zone, zone).is_none());
    assert!(!scene.contains(actor_node));
    assert!(!scene.contains(zone_node));
    assert_eq!(vis.stats().removed, 2);
}

/// Agents added by the step function or a hook are picked up the same frame.
#[test]
fn test_addition_creates_one_record() {
    let mut sim = grid();
    sim.on_tick(|sim| {
        if sim.tick_index() == 0 {
            sim.add_actor(20.0, 20.0, 3.0).unwrap();
        }
    });
    let hooks = Hooks::<NodeId, TextureId>::default().before_tick(|sim, _scene| {
        if sim.tick_index() == 0 {
            sim.add_zone(CellRect::new(1, 2, 1, 2)).unwrap();
        }
    });
    let mut scene = RetainedScene::new();
    let mut vis = Vis::new(VisOptions::default()).with_hooks(hooks);
    vis.setup(&mut sim, &mut scene);
    assert_eq!(vis.tracked(AgentKind::Actor), 0);

    vis.frame(&mut sim, &mut scene);
    let layers = vis.layers().unwrap();

    assert_eq!(vis.tracked(AgentKind::Actor), 1);
    assert_eq!(vis.tracked(AgentKind::Zone), 1);
    let (actor, record) = vis.records(AgentKind::Actor).next().unwrap();
    assert_eq!(scene.parent(record.node), Some(layers.middle));
    assert_eq!(record.layer, DrawLayer::Middle);
    let sprite = scene.node(record.node).unwrap();
    assert_eq!((sprite.x, sprite.y), (20.0, 20.0));
    assert_eq!((sprite.width, sprite.anchor), (6.0, (0.5, 0.5)));
    assert!(sim.get(AgentKind::Actor, *actor).is_some());
}

/// Reconciling the same state again creates nothing new.
#[test]
fn test_reconcile_is_idempotent() {
    let mut sim = grid();
    sim.add_actor(5.0, 5.0, 2.0).unwrap();
    let (mut vis, mut scene) = set_up(VisOptions::default(), &mut sim);
    sim.add_actor(25.0, 25.0, 2.0).unwrap();
    vis.frame(&mut sim, &mut scene);

    let nodes = scene.live_nodes();
    let created = vis.stats().created;
    vis.reconcile(&sim, &mut scene);
    vis.reconcile(&sim, &mut scene);

    assert_eq!(scene.live_nodes(), nodes);
    assert_eq!(vis.stats().created, created);
    assert_eq!(vis.tracked(AgentKind::Actor), 2);
}

/// Constant styles are applied once; derived ones every frame.
#[test]
fn test_constant_tint_is_never_rewritten() {
    let mut sim = grid();
    let actor = sim.add_actor(5.0, 5.0, 2.0).unwrap();
    let mut options = VisOptions::default();
    options.actor.tint = Attr::Constant(colors::RED);
    options.square.tint = Attr::derived(|a: &Agent| if a.var("lit") > 0.0 { colors::KIWI } else { colors::WHITE });
    let (mut vis, mut scene) = set_up(options, &mut sim);
    let actor_node = node(&vis, AgentKind::Actor, actor);
    let square = sim.squares().next().unwrap().id;
    let square_node = node(&vis, AgentKind::Square, square);

    for _ in 0..5 {
        vis.frame(&mut sim, &mut scene);
    }

    assert_eq!(scene.node(actor_node).unwrap().tint, colors::RED);
    assert_eq!(scene.write_count(actor_node, PropKind::Tint), 0);
    assert_eq!(scene.write_count(actor_node, PropKind::Position), 5);
    assert_eq!(scene.write_count(square_node, PropKind::Tint), 5);
}

/// A derived tint with its toggle off is evaluated once at creation only.
#[test]
fn test_update_toggle_off_skips_refresh() {
    let mut sim = grid();
    let actor = sim.add_actor(5.0, 5.0, 2.0).unwrap();
    let mut options = VisOptions::default();
    options.actor.tint = Attr::derived(|a: &Agent| colors::palette(a.id.0 as usize));
    options.update.tint = false;
    let (mut vis, mut scene) = set_up(options, &mut sim);
    let actor_node = node(&vis, AgentKind::Actor, actor);

    vis.frame(&mut sim, &mut scene);
    assert_eq!(scene.write_count(actor_node, PropKind::Tint), 0);
    assert_eq!(scene.node(actor_node).unwrap().tint, colors::palette(actor.0 as usize));
}

/// Keys -inf, finite and +inf land in back, middle and front.
#[test]
fn test_keys_select_layers() {
    let mut sim = grid();
    let back = sim.add_actor(5.0, 5.0, 2.0).unwrap();
    let middle = sim.add_actor(15.0, 5.0, 2.0).unwrap();
    let front = sim.add_actor(25.0, 5.0, 2.0).unwrap();
    set_z(&mut sim, back, Some(f64::NEG_INFINITY));
    set_z(&mut sim, front, Some(f64::INFINITY));

    let (vis, scene) = set_up(VisOptions::default(), &mut sim);
    let layers = vis.layers().unwrap();

    assert_eq!(scene.parent(node(&vis, AgentKind::Actor, back)), Some(layers.back));
    assert_eq!(scene.parent(node(&vis, AgentKind::Actor, middle)), Some(layers.middle));
    assert_eq!(scene.parent(node(&vis, AgentKind::Actor, front)), Some(layers.front));

    let order = scene.draw_order();
    let position = |id| order.iter().position(|n| *n == node(&vis, AgentKind::Actor, id)).unwrap();
    assert!(position(back) < position(middle));
    assert!(position(middle) < position(front));
}

/// The middle layer is sorted at setup and re-sorted when keys change.
#[test]
fn test_middle_layer_resort() {
    let mut sim = grid();
    let a = sim.add_actor(5.0, 5.0, 2.0).unwrap();
    let b = sim.add_actor(15.0, 5.0, 2.0).unwrap();
    set_z(&mut sim, a, Some(5.0));
    set_z(&mut sim, b, Some(2.0));

    let mut options = VisOptions::default();
    options.update.z_index = ZIndexUpdate::Always;
    let (mut vis, mut scene) = set_up(options, &mut sim);
    let layers = vis.layers().unwrap();
    let (na, nb) = (node(&vis, AgentKind::Actor, a), node(&vis, AgentKind::Actor, b));
    assert_eq!(scene.children(layers.middle), &[nb, na]);

    set_z(&mut sim, a, Some(1.0));
    vis.frame(&mut sim, &mut scene);
    assert_eq!(scene.children(layers.middle), &[na, nb]);
    assert_eq!(scene.node(na).unwrap().draw_key, 1.0);
}

/// New middle-layer agents are sorted in even without key updates.
#[test]
fn test_added_agents_are_sorted_in() {
    let mut sim = grid();
    let a = sim.add_actor(5.0, 5.0, 2.0).unwrap();
    set_z(&mut sim, a, Some(5.0));
    let (mut vis, mut scene) = set_up(VisOptions::default(), &mut sim);
    let layers = vis.layers().unwrap();

    let b = sim.add_actor(15.0, 5.0, 2.0).unwrap();
    vis.frame(&mut sim, &mut scene);

    let (na, nb) = (node(&vis, AgentKind::Actor, a), node(&vis, AgentKind::Actor, b));
    assert_eq!(scene.children(layers.middle), &[nb, na]);
}

/// Agents added with a missing or NaN key never get a display object.
#[test]
fn test_added_agents_without_key_are_skipped() {
    let mut sim = grid();
    let (mut vis, mut scene) = set_up(VisOptions::default(), &mut sim);
    let nodes = scene.live_nodes();

    let unkeyed = sim.add_actor(5.0, 5.0, 2.0).unwrap();
    let nan = sim.add_actor(15.0, 5.0, 2.0).unwrap();
    let keyed = sim.add_actor(25.0, 5.0, 2.0).unwrap();
    set_z(&mut sim, unkeyed, None);
    set_z(&mut sim, nan, Some(f64::NAN));
    assert_eq!(vis.frame(&mut sim, &mut scene), FrameOutcome::Ticked);

    assert_eq!(sim.added(AgentKind::Actor), &[unkeyed, nan, keyed]);
    assert!(vis.record(AgentKind::Actor, unkeyed).is_none());
    assert!(vis.record(AgentKind::Actor, nan).is_none());
    assert!(vis.record(AgentKind::Actor, keyed).is_some());
    assert_eq!(vis.tracked(AgentKind::Actor), 1);
    assert_eq!(scene.live_nodes(), nodes + 1);
}

/// Key updates move records between layers.
#[test]
fn test_key_change_moves_layer() {
    let mut sim = grid();
    let actor = sim.add_actor(5.0, 5.0, 2.0).unwrap();
    let mut options = VisOptions::default();
    options.update.z_index = ZIndexUpdate::when(|sim| sim.tick_index() % 2 == 0);
    let (mut vis, mut scene) = set_up(options, &mut sim);
    let layers = vis.layers().unwrap();
    let actor_node = node(&vis, AgentKind::Actor, actor);

    set_z(&mut sim, actor, Some(f64::INFINITY));
    vis.frame(&mut sim, &mut scene);
    assert_eq!(scene.parent(actor_node), Some(layers.middle), "tick 1 does not re-key");

    vis.frame(&mut sim, &mut scene);
    assert_eq!(scene.parent(actor_node), Some(layers.front));
    assert_eq!(vis.record(AgentKind::Actor, actor).unwrap().layer, DrawLayer::Front);
}

/// A key turning NaN drops the record when key updates are on.
#[test]
fn test_key_becoming_nan_drops_record() {
    let mut sim = grid();
    let actor = sim.add_actor(5.0, 5.0, 2.0).unwrap();
    set_z(&mut sim, actor, Some(3.0));
    let mut options = VisOptions::default();
    options.update.z_index = ZIndexUpdate::Always;
    let (mut vis, mut scene) = set_up(options, &mut sim);
    let actor_node = node(&vis, AgentKind::Actor, actor);

    set_z(&mut sim, actor, Some(f64::NAN));
    vis.frame(&mut sim, &mut scene);

    assert!(vis.record(AgentKind::Actor, actor).is_none());
    assert!(!scene.contains(actor_node));
    assert_eq!(vis.stats().excluded, 1);
}

/// Without key updates a NaN key goes unnoticed, without failing.
#[test]
fn test_key_becoming_nan_without_updates() {
    let mut sim = grid();
    let actor = sim.add_actor(5.0, 5.0, 2.0).unwrap();
    set_z(&mut sim, actor, Some(3.0));
    let (mut vis, mut scene) = set_up(VisOptions::default(), &mut sim);

    set_z(&mut sim, actor, Some(f64::NAN));
    for _ in 0..3 {
        assert_eq!(vis.frame(&mut sim, &mut scene), FrameOutcome::Ticked);
    }
    assert!(vis.record(AgentKind::Actor, actor).is_some());
}

/// Agents that vanish without a removal delta are pruned.
#[test]
fn test_missing_agents_are_pruned() {
    let mut sim = grid();
    let actor = sim.add_actor(5.0, 5.0, 2.0).unwrap();
    let (mut vis, mut scene) = set_up(VisOptions::default(), &mut sim);
    let actor_node = node(&vis, AgentKind::Actor, actor);

    sim.remove(AgentKind::Actor, actor).unwrap();
    vis.reconcile(&sim, &mut scene);

    assert!(vis.record(AgentKind::Actor, actor).is_none());
    assert!(!scene.contains(actor_node));
    assert_eq!(vis.stats().pruned, 1);
}

/// Identical shapes share one generated texture.
#[test]
fn test_shape_textures_are_shared() {
    let mut sim = grid();
    for i in 0..10 {
        sim.add_actor(2.0 + i as f64 * 3.0, 5.0, 1.0 + (i % 2) as f64).unwrap();
    }
    let mut options = VisOptions::default();
    options.zone.advanced = Attr::Constant(true);
    sim.add_zone(CellRect::new(0, 1, 0, 1)).unwrap();
    sim.add_zone(CellRect::new(2, 3, 2, 3)).unwrap();
    let (vis, scene) = set_up(options, &mut sim);

    // One basic circle for every actor, one rect for both same-sized zones.
    assert_eq!(vis.shape_textures(), 2);
    assert_eq!(scene.generated_shapes(), 2);

    let square = sim.squares().next().unwrap().id;
    let record = vis.record(AgentKind::Square, square).unwrap();
    assert_eq!(scene.texture(record.texture), &TextureSource::White);
}

/// Advanced actors get one texture per distinct radius.
#[test]
fn test_advanced_actor_textures_per_radius() {
    let mut sim = grid();
    sim.add_actor(5.0, 5.0, 2.0).unwrap();
    sim.add_actor(15.0, 5.0, 2.0).unwrap();
    sim.add_actor(25.0, 5.0, 3.0).unwrap();
    let mut options = VisOptions::default();
    options.actor.advanced = Attr::Constant(true);
    let (vis, _scene) = set_up(options, &mut sim);

    assert_eq!(vis.shape_textures(), 2);
}

/// A dynamic fill regenerates the texture only when the shape changes.
#[test]
fn test_dynamic_shape_regenerates_on_change() {
    let mut sim = grid();
    let actor = sim.add_actor(5.0, 5.0, 2.0).unwrap();
    let mut options = VisOptions::default();
    options.actor.advanced = Attr::Constant(true);
    options.actor.fill_color = Attr::derived(|a: &Agent| if a.var("hot") > 0.0 { colors::RED } else { colors::BLUE });
    options.update.shape = true;
    let (mut vis, mut scene) = set_up(options, &mut sim);
    let actor_node = node(&vis, AgentKind::Actor, actor);

    vis.frame(&mut sim, &mut scene);
    assert_eq!(scene.write_count(actor_node, PropKind::Texture), 0);

    sim.get_mut(AgentKind::Actor, actor).unwrap().set_var("hot", 1.0);
    vis.frame(&mut sim, &mut scene);
    vis.frame(&mut sim, &mut scene);
    assert_eq!(scene.write_count(actor_node, PropKind::Texture), 1);
    assert_eq!(vis.shape_textures(), 1);
}

/// A fill that changes every frame keeps one live texture, none once removed.
#[test]
fn test_changing_fill_does_not_accumulate_textures() {
    let mut sim = grid();
    let actor = sim.add_actor(5.0, 5.0, 2.0).unwrap();
    let mut options = VisOptions::default();
    options.actor.advanced = Attr::Constant(true);
    options.actor.fill_color = Attr::derived(|a: &Agent| colors::mix(colors::BLUE, colors::RED, a.var("heat")));
    options.update.shape = true;
    let (mut vis, mut scene) = set_up(options, &mut sim);
    let actor_node = node(&vis, AgentKind::Actor, actor);

    for step in 1..=50 {
        sim.get_mut(AgentKind::Actor, actor).unwrap().set_var("heat", step as f64 / 50.0);
        vis.frame(&mut sim, &mut scene);
        assert_eq!(vis.shape_textures(), 1);
    }
    assert_eq!(scene.write_count(actor_node, PropKind::Texture), 50);

    sim.remove(AgentKind::Actor, actor).unwrap();
    vis.frame(&mut sim, &mut scene);
    assert!(vis.record(AgentKind::Actor, actor).is_none());
    assert_eq!(vis.shape_textures(), 0);
}

/// Image changes swap the texture once; no image falls back to the shape.
#[test]
fn test_image_swap() {
    let mut sim = grid();
    let actor = sim.add_actor(5.0, 5.0, 2.0).unwrap();
    let mut options = VisOptions::default();
    options.actor.image = Attr::derived(|a: &Agent| (a.var("boat") > 0.0).then(|| "img/boat.png".to_owned()));
    let (mut vis, mut scene) = set_up(options, &mut sim);
    let actor_node = node(&vis, AgentKind::Actor, actor);
    let record = vis.record(AgentKind::Actor, actor).unwrap();
    assert!(matches!(scene.texture(record.texture), TextureSource::Shape(_)));

    sim.get_mut(AgentKind::Actor, actor).unwrap().set_var("boat", 1.0);
    vis.frame(&mut sim, &mut scene);
    vis.frame(&mut sim, &mut scene);

    let record = vis.record(AgentKind::Actor, actor).unwrap();
    assert_eq!(scene.texture(record.texture), &TextureSource::Image("img/boat.png".into()));
    assert_eq!(scene.write_count(actor_node, PropKind::Texture), 1);
}

/// Labels appear when text first becomes non-empty and are blanked after.
#[test]
fn test_labels_are_created_lazily() {
    let mut sim = grid();
    let actor = sim.add_actor(5.0, 5.0, 2.0).unwrap();
    let mut options = VisOptions::default();
    options.actor.text = Attr::derived(|a: &Agent| (a.var("score") > 0.0).then(|| format!("{}", a.var("score"))));
    options.update.text = true;
    let (mut vis, mut scene) = set_up(options, &mut sim);
    let actor_node = node(&vis, AgentKind::Actor, actor);
    assert!(vis.record(AgentKind::Actor, actor).unwrap().label.is_none());

    vis.frame(&mut sim, &mut scene);
    assert!(vis.record(AgentKind::Actor, actor).unwrap().label.is_none());

    sim.get_mut(AgentKind::Actor, actor).unwrap().set_var("score", 7.0);
    vis.frame(&mut sim, &mut scene);
    let label = vis.record(AgentKind::Actor, actor).unwrap().label.clone().unwrap();
    assert_eq!(label.content, "7");
    assert_eq!(scene.parent(label.node), Some(actor_node));

    sim.get_mut(AgentKind::Actor, actor).unwrap().set_var("score", 0.0);
    vis.frame(&mut sim, &mut scene);
    let record = vis.record(AgentKind::Actor, actor).unwrap();
    assert!(!record.has_text());
    assert_eq!(scene.node(label.node).unwrap().text.as_ref().unwrap().content, "");
}

/// Zone labels are placed inside the zone box.
#[test]
fn test_zone_label_placement() {
    let mut sim = grid();
    let zone = sim.add_zone(CellRect::new(0, 1, 0, 0)).unwrap();
    let mut options = VisOptions::default();
    options.zone.text = Attr::Constant(Some("Harbour".to_owned()));
    let (vis, scene) = set_up(options, &mut sim);

    let label = vis.record(AgentKind::Zone, zone).unwrap().label.clone().unwrap();
    let node = scene.node(label.node).unwrap();
    assert_eq!((node.x, node.y), (10.0, 5.0));
    assert_eq!(node.text.as_ref().unwrap().max_width, 14.0);
}

/// Actor labels stay upright unless asked to rotate.
#[test]
fn test_actor_label_counter_rotates() {
    let mut sim = grid();
    let actor = sim.add_actor(5.0, 5.0, 2.0).unwrap();
    let mut options = VisOptions::default();
    options.actor.text = Attr::Constant(Some("A".to_owned()));
    options.update.pointing = true;
    let (mut vis, mut scene) = set_up(options, &mut sim);

    sim.get_mut(AgentKind::Actor, actor).unwrap().pointing = Some(1.0);
    vis.frame(&mut sim, &mut scene);

    let record = vis.record(AgentKind::Actor, actor).unwrap();
    let label = record.label.as_ref().unwrap();
    assert_eq!(scene.node(record.node).unwrap().rotation, 1.0);
    assert_eq!(scene.node(label.node).unwrap().rotation, -1.0);
}

/// A late label cancels the rotation the sprite was drawn with, not the agent's current one.
#[test]
fn test_late_label_matches_sprite_rotation() {
    let mut sim = grid();
    let actor = sim.add_actor(5.0, 5.0, 2.0).unwrap();
    sim.get_mut(AgentKind::Actor, actor).unwrap().pointing = Some(0.5);
    let mut options = VisOptions::default();
    options.actor.text = Attr::derived(|a: &Agent| (a.var("named") > 0.0).then(|| "A".to_owned()));
    options.update.text = true;
    let (mut vis, mut scene) = set_up(options, &mut sim);

    let agent = sim.get_mut(AgentKind::Actor, actor).unwrap();
    agent.pointing = Some(1.5);
    agent.set_var("named", 1.0);
    vis.frame(&mut sim, &mut scene);

    let record = vis.record(AgentKind::Actor, actor).unwrap();
    let label = record.label.as_ref().unwrap();
    assert_eq!(record.rotation, 0.5);
    assert_eq!(scene.node(record.node).unwrap().rotation, 0.5);
    assert_eq!(scene.node(label.node).unwrap().rotation, -0.5);
}

/// The finished hook runs once and cleanup tears the scene down.
#[test]
fn test_finished_hook_runs_once() {
    let mut sim = grid().with_max_ticks(2);
    sim.add_actor(5.0, 5.0, 2.0).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let hooks = Hooks::<NodeId, TextureId>::default().finished(move |_sim, _scene| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let mut options = VisOptions::default();
    options.cleanup = true;
    let mut scene = RetainedScene::new();
    let mut vis = Vis::new(options).with_hooks(hooks);
    vis.setup(&mut sim, &mut scene);

    assert_eq!(vis.frame(&mut sim, &mut scene), FrameOutcome::Ticked);
    assert_eq!(vis.frame(&mut sim, &mut scene), FrameOutcome::Ticked);
    assert_eq!(vis.frame(&mut sim, &mut scene), FrameOutcome::Finished);
    assert_eq!(vis.frame(&mut sim, &mut scene), FrameOutcome::Finished);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(vis.status(), Status::Finished);
    assert_eq!(sim.tick_index(), 2);
    assert_eq!(scene.live_nodes(), 1);
    assert_eq!(vis.tracked(AgentKind::Square), 0);
}

/// Paused frames leave both the simulation and the scene alone.
#[test]
fn test_paused_frame_is_a_no_op() {
    let mut sim = grid();
    sim.add_actor(5.0, 5.0, 2.0).unwrap();
    let (mut vis, mut scene) = set_up(VisOptions::default(), &mut sim);
    scene.clear_writes();

    sim.pause();
    assert_eq!(vis.frame(&mut sim, &mut scene), FrameOutcome::Paused);
    assert_eq!(sim.tick_index(), 0);
    assert!(scene.writes().is_empty());

    sim.resume();
    assert_eq!(vis.frame(&mut sim, &mut scene), FrameOutcome::Ticked);
    assert_eq!(sim.tick_index(), 1);
}

/// Frames before setup, or with running disabled, do nothing.
#[test]
fn test_idle_frames() {
    let mut sim = grid();
    let mut scene = RetainedScene::new();
    let mut vis = Vis::new(VisOptions::default());
    assert_eq!(vis.frame(&mut sim, &mut scene), FrameOutcome::Idle);

    let mut options = VisOptions::default();
    options.run = false;
    let (mut vis, mut scene) = set_up(options, &mut sim);
    assert_eq!(vis.frame(&mut sim, &mut scene), FrameOutcome::Idle);
    assert_eq!(sim.tick_index(), 0);
}

/// A second setup call changes nothing.
#[test]
fn test_setup_twice_is_ignored() {
    let mut sim = grid();
    sim.add_actor(5.0, 5.0, 2.0).unwrap();
    let (mut vis, mut scene) = set_up(VisOptions::default(), &mut sim);
    let nodes = scene.live_nodes();

    vis.setup(&mut sim, &mut scene);
    assert_eq!(scene.live_nodes(), nodes);
    assert_eq!(vis.tracked(AgentKind::Actor), 1);
}

/// Setup hooks run around scene construction.
#[test]
fn test_setup_hooks_order() {
    let mut sim = grid();
    let seen = Arc::new(AtomicUsize::new(0));
    let before = Arc::clone(&seen);
    let after = Arc::clone(&seen);
    let hooks = Hooks::<NodeId, TextureId>::default()
        .before_setup(move |sim, scene| {
            sim.add_actor(5.0, 5.0, 2.0).unwrap();
            assert_eq!(scene.root(), NodeId(0));
            before.store(1, Ordering::SeqCst);
        })
        .after_setup(move |_sim, _scene| {
            assert_eq!(after.load(Ordering::SeqCst), 1);
            after.store(2, Ordering::SeqCst);
        });
    let mut scene = RetainedScene::new();
    let mut vis = Vis::new(VisOptions::default()).with_hooks(hooks);
    vis.setup(&mut sim, &mut scene);

    assert_eq!(seen.load(Ordering::SeqCst), 2);
    assert_eq!(vis.tracked(AgentKind::Actor), 1, "agents added before setup are drawn");
}

/// The background sits under the layers and follows simulation state.
#[test]
fn test_background_follows_simulation() {
    let mut sim = grid();
    let mut options = VisOptions::default();
    options.background.enabled = true;
    options.background.tile = true;
    options.background.tint = Attr::derived(|sim: &Simulation| {
        colors::mix(colors::WHITE, colors::BLUE, sim.vars.get("night").copied().unwrap_or(0.0))
    });
    let (mut vis, mut scene) = set_up(options, &mut sim);
    let background = vis.background_node().unwrap();

    assert_eq!(scene.children(scene.root())[0], background);
    let node = scene.node(background).unwrap();
    assert_eq!((node.width, node.height, node.tile), (40.0, 40.0, Some(10.0)));

    sim.vars.insert("night".into(), 1.0);
    vis.frame(&mut sim, &mut scene);
    assert_eq!(scene.node(background).unwrap().tint, colors::BLUE);
}
