use animstate::{
    Animation, AnimationState, AnimationStateData, BoneData, BoneTimeline, Curve, Skeleton,
    SkeletonData, TranslateTimeline, Vec2Frame,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

fn built_in_skeleton_data() -> SkeletonData {
    let slide = |name: &str, to: f32| {
        let mut animation = Animation::new(name, 1.0);
        animation.bone_timelines = vec![BoneTimeline::Translate(TranslateTimeline {
            bone_index: 0,
            frames: vec![
                Vec2Frame {
                    time: 0.0,
                    x: 0.0,
                    y: 0.0,
                    curve: [Curve::Linear; 2],
                },
                Vec2Frame {
                    time: 1.0,
                    x: to,
                    y: 0.0,
                    curve: [Curve::Linear; 2],
                },
            ],
        })];
        animation
    };
    SkeletonData {
        name: Some("demo".to_string()),
        bones: vec![BoneData::new("root", None)],
        events: Vec::new(),
        animations: vec![slide("walk", 10.0), slide("run", 40.0)],
    }
}

fn load_skeleton_data(path: Option<&PathBuf>) -> Arc<SkeletonData> {
    let Some(path) = path else {
        return Arc::new(built_in_skeleton_data());
    };
    let json = std::fs::read_to_string(path).expect("read json");
    Arc::new(serde_json::from_str(&json).expect("parse json"))
}

/// Usage: pose_dump [skeleton.json] [from] [to] [mix] [frames] [dt]
fn main() {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let path = args.first().filter(|a| a.as_str() != "-").map(PathBuf::from);
    let from = args.get(1).cloned().unwrap_or_else(|| "walk".to_string());
    let to = args.get(2).cloned().unwrap_or_else(|| "run".to_string());
    let mix: f32 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0.5);
    let frames: usize = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(30);
    let dt: f32 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(1.0 / 30.0);

    let data = load_skeleton_data(path.as_ref());
    let mut state_data = AnimationStateData::new(data.clone());
    state_data.set_mix(&from, &to, mix).expect("set mix");

    let mut skeleton = Skeleton::new(data);
    let mut state = AnimationState::new(Arc::new(state_data));

    let notes = Arc::new(Mutex::new(Vec::<String>::new()));
    let n = notes.clone();
    state.on_start(move |s| n.lock().unwrap().push(format!("start {s}")));
    let n = notes.clone();
    state.on_end(move |s| n.lock().unwrap().push(format!("end {s}")));
    let n = notes.clone();
    state.on_event(move |_, e| n.lock().unwrap().push(format!("event {}", e.name)));
    let n = notes.clone();
    state.on_complete(move |s, c| {
        n.lock()
            .unwrap()
            .push(format!("complete {s} loop {}", c.loop_count))
    });

    state.set_animation(&from, true).expect("set animation");
    state.add_animation(&to, true, 0.0).expect("add animation");

    let mut dump = Vec::with_capacity(frames);
    for frame in 0..frames {
        state.update(dt);
        skeleton.set_to_setup_pose();
        state.apply(&mut skeleton);

        let bones = skeleton
            .bones
            .iter()
            .map(|b| {
                json!({
                    "x": b.x,
                    "y": b.y,
                    "rotation": b.rotation,
                    "scaleX": b.scale_x,
                    "scaleY": b.scale_y,
                })
            })
            .collect::<Vec<_>>();
        let notifications = std::mem::take(&mut *notes.lock().unwrap());
        dump.push(json!({
            "frame": frame,
            "animation": state.to_string(),
            "time": state.time(),
            "previous": state.previous_animation().map(|a| a.name.clone()),
            "mixTime": state.mix_time(),
            "bones": bones,
            "notifications": notifications,
        }));
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&dump).expect("serialize dump")
    );
}
