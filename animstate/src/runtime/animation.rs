use crate::{
    Animation, BoneTimeline, Curve, Event, EventTimeline, RotateFrame, RotateTimeline,
    ScaleTimeline, ShearTimeline, Skeleton, TranslateTimeline, Vec2Frame,
};

/// Last-time value for applying a pose without a meaningful event window.
///
/// Only paired with a `None` event sink: the pose is sampled at `time` and nothing is reported
/// for the (empty) window, so a blending-out track never re-fires events or completions.
pub const IGNORE_LAST_TIME: f32 = f32::MAX;

impl Animation {
    /// Poses the skeleton at `time`, replacing the current bone values.
    ///
    /// Events keyed in `(last_time, time]` are appended to `events` when a sink is given. For
    /// looping animations both times are wrapped by the duration first, and a wrap
    /// (`last_time > time`) reports the tail of the timeline before its start.
    pub fn apply(
        &self,
        skeleton: &mut Skeleton,
        last_time: f32,
        time: f32,
        looped: bool,
        events: Option<&mut Vec<Event>>,
    ) {
        self.mix(skeleton, last_time, time, looped, events, 1.0);
    }

    /// Like [`Animation::apply`], but moves each keyed property toward this animation's pose by
    /// `alpha` instead of replacing it.
    pub fn mix(
        &self,
        skeleton: &mut Skeleton,
        last_time: f32,
        time: f32,
        looped: bool,
        events: Option<&mut Vec<Event>>,
        alpha: f32,
    ) {
        let (mut last_time, mut time) = (last_time, time);
        if looped && self.duration > 0.0 {
            time %= self.duration;
            last_time %= self.duration;
        }

        for timeline in &self.bone_timelines {
            match timeline {
                BoneTimeline::Rotate(t) => apply_rotate(t, skeleton, time, alpha),
                BoneTimeline::Translate(t) => apply_translate(t, skeleton, time, alpha),
                BoneTimeline::Scale(t) => apply_scale(t, skeleton, time, alpha),
                BoneTimeline::Shear(t) => apply_shear(t, skeleton, time, alpha),
            }
        }

        if let (Some(timeline), Some(out)) = (self.event_timeline.as_ref(), events) {
            collect_events(timeline, last_time, time, out);
        }
    }
}

fn collect_events(
    timeline: &EventTimeline,
    last_time: f32,
    time: f32,
    out: &mut Vec<Event>,
) {
    if timeline.events.is_empty() {
        return;
    }
    if last_time > time {
        // Wrapped: finish the previous pass, then fire from the start including frame 0.
        fire_range(&timeline.events, last_time, f32::INFINITY, out);
        fire_range(&timeline.events, -1.0, time, out);
    } else {
        fire_range(&timeline.events, last_time, time, out);
    }
}

fn fire_range(events: &[Event], after: f32, until: f32, out: &mut Vec<Event>) {
    let start = events.partition_point(|e| e.time <= after);
    out.extend(
        events[start..]
            .iter()
            .take_while(|e| e.time <= until)
            .cloned(),
    );
}

fn apply_rotate(
    timeline: &RotateTimeline,
    skeleton: &mut Skeleton,
    time: f32,
    alpha: f32,
) {
    let Some(bone) = skeleton.bones.get_mut(timeline.bone_index) else {
        return;
    };
    let Some(first) = timeline.frames.first() else {
        return;
    };
    if time < first.time {
        return;
    }

    let setup = skeleton
        .data
        .bones
        .get(timeline.bone_index)
        .map(|b| b.rotation)
        .unwrap_or(0.0);

    let mut amount = setup + sample_rotate(&timeline.frames, time) - bone.rotation;
    amount -= ((amount / 360.0 - 0.5).ceil()) * 360.0;
    bone.rotation += amount * alpha;
}

fn apply_translate(
    timeline: &TranslateTimeline,
    skeleton: &mut Skeleton,
    time: f32,
    alpha: f32,
) {
    let Some(bone) = skeleton.bones.get_mut(timeline.bone_index) else {
        return;
    };
    let Some(first) = timeline.frames.first() else {
        return;
    };
    if time < first.time {
        return;
    }

    let setup = skeleton
        .data
        .bones
        .get(timeline.bone_index)
        .map(|b| (b.x, b.y))
        .unwrap_or((0.0, 0.0));

    let (x, y) = sample_vec2(&timeline.frames, time);
    bone.x += (setup.0 + x - bone.x) * alpha;
    bone.y += (setup.1 + y - bone.y) * alpha;
}

fn apply_scale(timeline: &ScaleTimeline, skeleton: &mut Skeleton, time: f32, alpha: f32) {
    let Some(bone) = skeleton.bones.get_mut(timeline.bone_index) else {
        return;
    };
    let Some(first) = timeline.frames.first() else {
        return;
    };
    if time < first.time {
        return;
    }

    let setup = skeleton
        .data
        .bones
        .get(timeline.bone_index)
        .map(|b| (b.scale_x, b.scale_y))
        .unwrap_or((1.0, 1.0));

    let (x, y) = sample_vec2(&timeline.frames, time);
    bone.scale_x += (setup.0 * x - bone.scale_x) * alpha;
    bone.scale_y += (setup.1 * y - bone.scale_y) * alpha;
}

fn apply_shear(timeline: &ShearTimeline, skeleton: &mut Skeleton, time: f32, alpha: f32) {
    let Some(bone) = skeleton.bones.get_mut(timeline.bone_index) else {
        return;
    };
    let Some(first) = timeline.frames.first() else {
        return;
    };
    if time < first.time {
        return;
    }

    let setup = skeleton
        .data
        .bones
        .get(timeline.bone_index)
        .map(|b| (b.shear_x, b.shear_y))
        .unwrap_or((0.0, 0.0));

    let (x, y) = sample_vec2(&timeline.frames, time);
    bone.shear_x += (setup.0 + x - bone.shear_x) * alpha;
    bone.shear_y += (setup.1 + y - bone.shear_y) * alpha;
}

fn sample_rotate(frames: &[RotateFrame], time: f32) -> f32 {
    let index = frames.partition_point(|f| f.time <= time);
    if index == 0 {
        return frames[0].angle;
    }
    if index >= frames.len() {
        return frames[frames.len() - 1].angle;
    }
    let prev = &frames[index - 1];
    let next = &frames[index];
    curve_value(
        prev.curve, time, prev.time, prev.angle, next.time, next.angle,
    )
}

fn sample_vec2(frames: &[Vec2Frame], time: f32) -> (f32, f32) {
    let index = frames.partition_point(|f| f.time <= time);
    if index == 0 {
        let f = &frames[0];
        return (f.x, f.y);
    }
    if index >= frames.len() {
        let f = &frames[frames.len() - 1];
        return (f.x, f.y);
    }
    let prev = &frames[index - 1];
    let next = &frames[index];
    (
        curve_value(prev.curve[0], time, prev.time, prev.x, next.time, next.x),
        curve_value(prev.curve[1], time, prev.time, prev.y, next.time, next.y),
    )
}

fn curve_value(curve: Curve, time: f32, time1: f32, value1: f32, time2: f32, value2: f32) -> f32 {
    let denom = time2 - time1;
    if denom.abs() <= 1.0e-12 {
        return value2;
    }

    match curve {
        Curve::Linear => value1 + (value2 - value1) * ((time - time1) / denom),
        Curve::Stepped => value1,
        Curve::Bezier { cx1, cy1, cx2, cy2 } => {
            bezier_value(time, [time1, value1], [cx1, cy1], [cx2, cy2], [time2, value2])
        }
    }
}

/// Evaluates the cubic bezier through `p1`, `c1`, `c2`, `p2` at x = `time` using forward
/// differencing over a fixed number of segments.
fn bezier_value(time: f32, p1: [f32; 2], c1: [f32; 2], c2: [f32; 2], p2: [f32; 2]) -> f32 {
    const SEGMENTS: usize = 9;

    let tmp = [
        (p1[0] - c1[0] * 2.0 + c2[0]) * 0.03,
        (p1[1] - c1[1] * 2.0 + c2[1]) * 0.03,
    ];
    let ddd = [
        ((c1[0] - c2[0]) * 3.0 - p1[0] + p2[0]) * 0.006,
        ((c1[1] - c2[1]) * 3.0 - p1[1] + p2[1]) * 0.006,
    ];
    let mut dd = [tmp[0] * 2.0 + ddd[0], tmp[1] * 2.0 + ddd[1]];
    let mut d = [
        (c1[0] - p1[0]) * 0.3 + tmp[0] + ddd[0] * 0.16666667,
        (c1[1] - p1[1]) * 0.3 + tmp[1] + ddd[1] * 0.16666667,
    ];

    let mut prev = p1;
    let mut point = [p1[0] + d[0], p1[1] + d[1]];
    for _ in 0..SEGMENTS {
        if point[0] >= time {
            return lerp_segment(time, prev, point);
        }
        prev = point;
        d[0] += dd[0];
        d[1] += dd[1];
        dd[0] += ddd[0];
        dd[1] += ddd[1];
        point[0] += d[0];
        point[1] += d[1];
    }
    lerp_segment(time, prev, p2)
}

fn lerp_segment(time: f32, from: [f32; 2], to: [f32; 2]) -> f32 {
    let denom = to[0] - from[0];
    if denom.abs() <= 1.0e-12 {
        return from[1];
    }
    from[1] + (time - from[0]) / denom * (to[1] - from[1])
}
