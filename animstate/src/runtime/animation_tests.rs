use crate::{
    Animation, BoneData, BoneTimeline, Curve, Event, EventTimeline, IGNORE_LAST_TIME,
    RotateFrame, RotateTimeline, ScaleTimeline, Skeleton, SkeletonData, TranslateTimeline,
    Vec2Frame,
};
use std::sync::Arc;

fn assert_approx(actual: f32, expected: f32) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-4,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

fn skeleton_with_root(setup_x: f32, setup_y: f32, setup_rotation: f32) -> Skeleton {
    let mut root = BoneData::new("root", None);
    root.x = setup_x;
    root.y = setup_y;
    root.rotation = setup_rotation;
    root.scale_x = 2.0;
    root.scale_y = 4.0;
    Skeleton::new(Arc::new(SkeletonData {
        name: None,
        bones: vec![root],
        events: Vec::new(),
        animations: Vec::new(),
    }))
}

fn vec2(time: f32, x: f32, y: f32, curve: Curve) -> Vec2Frame {
    Vec2Frame {
        time,
        x,
        y,
        curve: [curve; 2],
    }
}

fn translate_animation(frames: Vec<Vec2Frame>) -> Animation {
    let mut animation = Animation::new("move", 1.0);
    animation.bone_timelines = vec![BoneTimeline::Translate(TranslateTimeline {
        bone_index: 0,
        frames,
    })];
    animation
}

fn event(time: f32, name: &str) -> Event {
    Event {
        time,
        name: name.to_string(),
        int_value: 0,
        float_value: 0.0,
        string: String::new(),
    }
}

fn event_animation(duration: f32, events: Vec<Event>) -> Animation {
    let mut animation = Animation::new("events", duration);
    animation.event_timeline = Some(EventTimeline { events });
    animation
}

fn names(events: &[Event]) -> Vec<&str> {
    events.iter().map(|e| e.name.as_str()).collect()
}

#[test]
fn translate_timeline_interpolates() {
    let mut skeleton = skeleton_with_root(2.0, 3.0, 0.0);
    let animation = translate_animation(vec![
        vec2(0.0, 0.0, 0.0, Curve::Linear),
        vec2(1.0, 10.0, 0.0, Curve::Linear),
    ]);

    animation.apply(&mut skeleton, 0.0, 0.5, false, None);
    assert_approx(skeleton.bones[0].x, 7.0);
    assert_approx(skeleton.bones[0].y, 3.0);
}

#[test]
fn mix_moves_toward_pose_by_alpha() {
    let mut skeleton = skeleton_with_root(0.0, 0.0, 0.0);
    let animation = translate_animation(vec![vec2(0.0, 10.0, -4.0, Curve::Linear)]);

    animation.mix(&mut skeleton, 0.0, 0.5, false, None, 0.25);
    assert_approx(skeleton.bones[0].x, 2.5);
    assert_approx(skeleton.bones[0].y, -1.0);

    animation.mix(&mut skeleton, 0.0, 0.5, false, None, 1.0);
    assert_approx(skeleton.bones[0].x, 10.0);
    assert_approx(skeleton.bones[0].y, -4.0);
}

#[test]
fn timeline_leaves_bone_untouched_before_first_frame() {
    let mut skeleton = skeleton_with_root(0.0, 0.0, 0.0);
    skeleton.bones[0].x = 42.0;
    let animation = translate_animation(vec![
        vec2(0.5, 10.0, 0.0, Curve::Linear),
        vec2(1.0, 20.0, 0.0, Curve::Linear),
    ]);

    animation.apply(&mut skeleton, 0.0, 0.25, false, None);
    assert_approx(skeleton.bones[0].x, 42.0);
}

#[test]
fn stepped_curve_holds_previous_value() {
    let mut skeleton = skeleton_with_root(0.0, 0.0, 0.0);
    let animation = translate_animation(vec![
        vec2(0.0, 1.0, 0.0, Curve::Stepped),
        vec2(1.0, 9.0, 0.0, Curve::Linear),
    ]);

    animation.apply(&mut skeleton, 0.0, 0.99, false, None);
    assert_approx(skeleton.bones[0].x, 1.0);
    animation.apply(&mut skeleton, 0.0, 1.0, false, None);
    assert_approx(skeleton.bones[0].x, 9.0);
}

#[test]
fn bezier_with_collinear_handles_is_linear() {
    let mut skeleton = skeleton_with_root(0.0, 0.0, 0.0);
    let curve = Curve::Bezier {
        cx1: 1.0 / 3.0,
        cy1: 10.0 / 3.0,
        cx2: 2.0 / 3.0,
        cy2: 20.0 / 3.0,
    };
    let animation = translate_animation(vec![
        Vec2Frame {
            time: 0.0,
            x: 0.0,
            y: 0.0,
            curve: [curve, Curve::Linear],
        },
        vec2(1.0, 10.0, 0.0, Curve::Linear),
    ]);

    for (time, expected) in [(0.05, 0.5), (0.25, 2.5), (0.5, 5.0), (0.9, 9.0)] {
        animation.apply(&mut skeleton, 0.0, time, false, None);
        assert_approx(skeleton.bones[0].x, expected);
    }
}

#[test]
fn scale_timeline_multiplies_setup_scale() {
    let mut skeleton = skeleton_with_root(0.0, 0.0, 0.0);
    let mut animation = Animation::new("grow", 1.0);
    animation.bone_timelines = vec![BoneTimeline::Scale(ScaleTimeline {
        bone_index: 0,
        frames: vec![vec2(0.0, 1.5, 0.5, Curve::Linear)],
    })];

    animation.apply(&mut skeleton, 0.0, 0.5, false, None);
    assert_approx(skeleton.bones[0].scale_x, 3.0);
    assert_approx(skeleton.bones[0].scale_y, 2.0);
}

#[test]
fn rotate_takes_shortest_arc() {
    let mut skeleton = skeleton_with_root(0.0, 0.0, 0.0);
    skeleton.bones[0].rotation = 170.0;
    let mut animation = Animation::new("turn", 1.0);
    animation.bone_timelines = vec![BoneTimeline::Rotate(RotateTimeline {
        bone_index: 0,
        frames: vec![RotateFrame {
            time: 0.0,
            angle: -170.0,
            curve: Curve::Linear,
        }],
    })];

    animation.mix(&mut skeleton, 0.0, 0.0, false, None, 0.5);
    assert_approx(skeleton.bones[0].rotation, 180.0);
}

#[test]
fn events_fire_in_half_open_window() {
    let mut skeleton = skeleton_with_root(0.0, 0.0, 0.0);
    let animation = event_animation(
        1.0,
        vec![event(0.0, "a"), event(0.5, "b"), event(1.0, "c")],
    );

    let mut fired = Vec::new();
    animation.apply(&mut skeleton, 0.0, 0.5, false, Some(&mut fired));
    assert_eq!(names(&fired), ["b"]);

    fired.clear();
    animation.apply(&mut skeleton, 0.5, 1.0, false, Some(&mut fired));
    assert_eq!(names(&fired), ["c"]);

    fired.clear();
    animation.apply(&mut skeleton, -1.0, 0.25, false, Some(&mut fired));
    assert_eq!(names(&fired), ["a"]);
}

#[test]
fn events_sharing_a_frame_all_fire() {
    let mut skeleton = skeleton_with_root(0.0, 0.0, 0.0);
    let animation = event_animation(
        1.0,
        vec![event(0.5, "a"), event(0.5, "b"), event(0.75, "c")],
    );

    let mut fired = Vec::new();
    animation.apply(&mut skeleton, 0.25, 0.5, false, Some(&mut fired));
    assert_eq!(names(&fired), ["a", "b"]);

    fired.clear();
    animation.apply(&mut skeleton, 0.5, 0.75, false, Some(&mut fired));
    assert_eq!(names(&fired), ["c"]);
}

#[test]
fn looping_wrap_fires_tail_then_head() {
    let mut skeleton = skeleton_with_root(0.0, 0.0, 0.0);
    let animation = event_animation(
        1.0,
        vec![event(0.0, "start"), event(0.25, "a"), event(0.9, "b")],
    );

    let mut fired = Vec::new();
    animation.apply(&mut skeleton, 0.75, 1.5, true, Some(&mut fired));
    assert_eq!(names(&fired), ["b", "start", "a"]);
}

#[test]
fn without_sink_pose_still_applies() {
    let mut skeleton = skeleton_with_root(0.0, 0.0, 0.0);
    let mut animation = translate_animation(vec![vec2(0.0, 3.0, 0.0, Curve::Linear)]);
    animation.event_timeline = Some(EventTimeline {
        events: vec![event(0.5, "a")],
    });

    animation.apply(&mut skeleton, IGNORE_LAST_TIME, 0.75, true, None);
    assert_approx(skeleton.bones[0].x, 3.0);
}

#[test]
fn set_to_setup_pose_restores_bones() {
    let mut skeleton = skeleton_with_root(1.0, 2.0, 30.0);
    let animation = translate_animation(vec![vec2(0.0, 10.0, 10.0, Curve::Linear)]);
    animation.apply(&mut skeleton, 0.0, 0.5, false, None);
    assert_approx(skeleton.bones[0].x, 11.0);

    skeleton.set_to_setup_pose();
    assert_approx(skeleton.bones[0].x, 1.0);
    assert_approx(skeleton.bones[0].y, 2.0);
    assert_approx(skeleton.bones[0].rotation, 30.0);
    assert!(skeleton.find_bone("root").is_some());
    assert!(skeleton.find_bone("missing").is_none());
}
