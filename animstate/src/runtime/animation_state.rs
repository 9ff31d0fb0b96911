use super::animation::IGNORE_LAST_TIME;
use crate::{Animation, Error, Event, Skeleton, SkeletonData};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

/// Cross-fade durations between pairs of animations.
#[derive(Clone, Debug)]
pub struct AnimationStateData {
    pub skeleton_data: Arc<SkeletonData>,
    /// Mix duration used for pairs without an explicit entry.
    pub default_mix: f32,
    mixes: HashMap<(usize, usize), f32>,
}

impl AnimationStateData {
    pub fn new(skeleton_data: Arc<SkeletonData>) -> Self {
        Self {
            skeleton_data,
            default_mix: 0.0,
            mixes: HashMap::new(),
        }
    }

    pub fn set_mix(&mut self, from: &str, to: &str, duration: f32) -> Result<(), Error> {
        if duration.is_nan() || duration < 0.0 {
            return Err(Error::InvalidValue {
                message: "mix duration must be finite and >= 0".to_string(),
            });
        }
        let Some((from_index, _)) = self.skeleton_data.animation(from) else {
            return Err(Error::UnknownAnimation {
                name: from.to_string(),
            });
        };
        let Some((to_index, _)) = self.skeleton_data.animation(to) else {
            return Err(Error::UnknownAnimation {
                name: to.to_string(),
            });
        };
        self.mixes.insert((from_index, to_index), duration);
        Ok(())
    }

    /// Cross-fade duration when switching from `from_index` to `to_index`. Zero means no blend.
    pub fn mix(&self, from_index: usize, to_index: usize) -> f32 {
        self.mixes
            .get(&(from_index, to_index))
            .copied()
            .unwrap_or(self.default_mix)
    }
}

/// Payload of a loop-completion notification.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LoopComplete {
    /// `floor(time / duration)` of the current track when it passed its end.
    pub loop_count: i32,
}

type StateListener = Box<dyn FnMut(&AnimationState) + Send>;
type EventListener = Box<dyn FnMut(&AnimationState, &Event) + Send>;
type CompleteListener = Box<dyn FnMut(&AnimationState, LoopComplete) + Send>;

#[derive(Default)]
struct Listeners {
    start: Vec<StateListener>,
    end: Vec<StateListener>,
    event: Vec<EventListener>,
    complete: Vec<CompleteListener>,
}

impl Listeners {
    fn start(&mut self, state: &AnimationState) {
        for listener in &mut self.start {
            listener(state);
        }
    }

    fn end(&mut self, state: &AnimationState) {
        for listener in &mut self.end {
            listener(state);
        }
    }

    fn event(&mut self, state: &AnimationState, event: &Event) {
        for listener in &mut self.event {
            listener(state, event);
        }
    }

    fn complete(&mut self, state: &AnimationState, complete: LoopComplete) {
        for listener in &mut self.complete {
            listener(state, complete);
        }
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("start", &self.start.len())
            .field("end", &self.end.len())
            .field("event", &self.event.len())
            .field("complete", &self.complete.len())
            .finish()
    }
}

/// A pending animation change. Once it activates it stays alive as the owner of the current
/// track, so its listeners keep receiving that track's notifications.
#[derive(Debug)]
pub struct QueueEntry {
    id: u64,
    animation_index: Option<usize>,
    looped: bool,
    delay: f32,
    listeners: Listeners,
}

impl QueueEntry {
    pub fn animation_index(&self) -> Option<usize> {
        self.animation_index
    }

    pub fn looped(&self) -> bool {
        self.looped
    }

    /// Time on the current track's clock at which this entry activates.
    pub fn delay(&self) -> f32 {
        self.delay
    }
}

/// Refers to a [`QueueEntry`] owned by an [`AnimationState`].
///
/// Once the entry is discarded (cleared from the queue, or replaced as the current track's owner)
/// the handle no longer resolves and its methods do nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QueueEntryHandle {
    id: u64,
}

impl QueueEntryHandle {
    fn with_entry_mut(&self, state: &mut AnimationState, f: impl FnOnce(&mut QueueEntry)) {
        if let Some(entry) = state.entry_mut(self.id) {
            f(entry);
        }
    }

    pub fn entry<'a>(&self, state: &'a AnimationState) -> Option<&'a QueueEntry> {
        state
            .current_entry
            .iter()
            .chain(state.queue.iter())
            .find(|e| e.id == self.id)
    }

    /// Whether this entry owns the current track.
    pub fn is_current(&self, state: &AnimationState) -> bool {
        state.current_entry.as_ref().is_some_and(|e| e.id == self.id)
    }

    pub fn on_start<F>(&self, state: &mut AnimationState, listener: F)
    where
        F: FnMut(&AnimationState) + Send + 'static,
    {
        self.with_entry_mut(state, |entry| entry.listeners.start.push(Box::new(listener)));
    }

    pub fn on_end<F>(&self, state: &mut AnimationState, listener: F)
    where
        F: FnMut(&AnimationState) + Send + 'static,
    {
        self.with_entry_mut(state, |entry| entry.listeners.end.push(Box::new(listener)));
    }

    pub fn on_event<F>(&self, state: &mut AnimationState, listener: F)
    where
        F: FnMut(&AnimationState, &Event) + Send + 'static,
    {
        self.with_entry_mut(state, |entry| entry.listeners.event.push(Box::new(listener)));
    }

    pub fn on_complete<F>(&self, state: &mut AnimationState, listener: F)
    where
        F: FnMut(&AnimationState, LoopComplete) + Send + 'static,
    {
        self.with_entry_mut(state, |entry| {
            entry.listeners.complete.push(Box::new(listener))
        });
    }
}

/// Plays one animation at a time, cross-fading out of the previous one and activating queued
/// animations when their delay elapses.
///
/// Drive it once per frame with [`AnimationState::update`] followed by
/// [`AnimationState::apply`]. Listeners run synchronously and observe the state read-only; queue
/// follow-up changes after the call that notified them returns.
pub struct AnimationState {
    data: Arc<AnimationStateData>,

    current: Option<usize>,
    current_time: f32,
    current_last_time: f32,
    current_loop: bool,
    current_entry: Option<QueueEntry>,

    previous: Option<usize>,
    previous_time: f32,
    previous_loop: bool,

    mix_time: f32,
    mix_duration: f32,

    queue: VecDeque<QueueEntry>,
    next_entry_id: u64,

    events: Vec<Event>,
    listeners: Listeners,
}

impl fmt::Debug for AnimationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationState")
            .field("current", &self.current)
            .field("current_time", &self.current_time)
            .field("current_last_time", &self.current_last_time)
            .field("current_loop", &self.current_loop)
            .field("current_entry", &self.current_entry)
            .field("previous", &self.previous)
            .field("previous_time", &self.previous_time)
            .field("previous_loop", &self.previous_loop)
            .field("mix_time", &self.mix_time)
            .field("mix_duration", &self.mix_duration)
            .field("queue", &self.queue)
            .field("listeners", &self.listeners)
            .finish()
    }
}

impl fmt::Display for AnimationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.animation_name(self.current))
    }
}

impl AnimationState {
    pub fn new(data: Arc<AnimationStateData>) -> Self {
        Self {
            data,
            current: None,
            current_time: 0.0,
            current_last_time: 0.0,
            current_loop: false,
            current_entry: None,
            previous: None,
            previous_time: 0.0,
            previous_loop: false,
            mix_time: 0.0,
            mix_duration: 0.0,
            queue: VecDeque::new(),
            next_entry_id: 0,
            events: Vec::new(),
            listeners: Listeners::default(),
        }
    }

    pub fn data(&self) -> &AnimationStateData {
        &self.data
    }

    pub fn on_start<F>(&mut self, listener: F)
    where
        F: FnMut(&AnimationState) + Send + 'static,
    {
        self.listeners.start.push(Box::new(listener));
    }

    pub fn on_end<F>(&mut self, listener: F)
    where
        F: FnMut(&AnimationState) + Send + 'static,
    {
        self.listeners.end.push(Box::new(listener));
    }

    pub fn on_event<F>(&mut self, listener: F)
    where
        F: FnMut(&AnimationState, &Event) + Send + 'static,
    {
        self.listeners.event.push(Box::new(listener));
    }

    pub fn on_complete<F>(&mut self, listener: F)
    where
        F: FnMut(&AnimationState, LoopComplete) + Send + 'static,
    {
        self.listeners.complete.push(Box::new(listener));
    }

    /// The current animation, if any.
    pub fn animation(&self) -> Option<&Animation> {
        self.animation_at(self.current)
    }

    pub fn animation_index(&self) -> Option<usize> {
        self.current
    }

    /// The animation being faded out, if a cross-fade is in progress.
    pub fn previous_animation(&self) -> Option<&Animation> {
        self.animation_at(self.previous)
    }

    pub fn time(&self) -> f32 {
        self.current_time
    }

    /// Moves the current track's clock. The next [`AnimationState::apply`] reports events
    /// between the last applied time and `time`.
    pub fn set_time(&mut self, time: f32) {
        self.current_time = time;
    }

    /// Current track time at the end of the last [`AnimationState::apply`].
    pub fn last_time(&self) -> f32 {
        self.current_last_time
    }

    pub fn previous_time(&self) -> f32 {
        self.previous_time
    }

    pub fn looped(&self) -> bool {
        self.current_loop
    }

    pub fn set_loop(&mut self, looped: bool) {
        self.current_loop = looped;
    }

    pub fn mix_time(&self) -> f32 {
        self.mix_time
    }

    pub fn mix_duration(&self) -> f32 {
        self.mix_duration
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// The queue entry that activated the current track. `None` when it was set directly.
    pub fn current_entry(&self) -> Option<&QueueEntry> {
        self.current_entry.as_ref()
    }

    /// Events fired by the last [`AnimationState::apply`], in timeline order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// True when nothing is playing or the current track has reached its duration. Looping
    /// tracks report completion once their clock has passed the first end, although they keep
    /// playing.
    pub fn is_complete(&self) -> bool {
        self.animation()
            .is_none_or(|animation| self.current_time >= animation.duration)
    }

    pub fn update(&mut self, delta: f32) {
        self.current_time += delta;
        self.previous_time += delta;
        self.mix_time += delta;

        if let Some(duration) = self.animation().map(|a| a.duration) {
            if self.passed_end(duration) {
                let complete = LoopComplete {
                    loop_count: (self.current_time / duration).floor() as i32,
                };
                log::trace!(
                    "animation '{}' complete (loop {})",
                    self.animation_name(self.current),
                    complete.loop_count
                );
                self.notify(|listeners, state| listeners.complete(state, complete));
            }
        }

        // One activation per update. A second due entry is checked against the new, reset clock.
        let due = self
            .queue
            .front()
            .is_some_and(|entry| self.current_time >= entry.delay);
        if due {
            if let Some(entry) = self.queue.pop_front() {
                log::debug!(
                    "activating queued animation '{}' at {}",
                    self.animation_name(entry.animation_index),
                    self.current_time
                );
                self.set_animation_internal(entry.animation_index, entry.looped, Some(entry));
            }
        }
    }

    /// Poses the skeleton and dispatches the timeline events crossed since the last apply.
    pub fn apply(&mut self, skeleton: &mut Skeleton) {
        let data = self.data.clone();
        let animations = &data.skeleton_data.animations;
        let Some(current) = self.current.and_then(|i| animations.get(i)) else {
            return;
        };

        self.events.clear();
        if let Some(previous) = self.previous.and_then(|i| animations.get(i)) {
            previous.apply(
                skeleton,
                IGNORE_LAST_TIME,
                self.previous_time,
                self.previous_loop,
                None,
            );
            let mut alpha = self.mix_time / self.mix_duration;
            if alpha >= 1.0 {
                alpha = 1.0;
                self.previous = None;
            }
            current.mix(
                skeleton,
                self.current_last_time,
                self.current_time,
                self.current_loop,
                Some(&mut self.events),
                alpha,
            );
        } else {
            current.apply(
                skeleton,
                self.current_last_time,
                self.current_time,
                self.current_loop,
                Some(&mut self.events),
            );
        }

        let events = std::mem::take(&mut self.events);
        for event in &events {
            log::trace!("animation '{}' fired event '{}'", current.name, event.name);
            self.notify(|listeners, state| listeners.event(state, event));
        }
        self.events = events;

        self.current_last_time = self.current_time;
    }

    /// Discards the queue and plays the named animation from its start.
    pub fn set_animation(&mut self, animation_name: &str, looped: bool) -> Result<(), Error> {
        let index = self.find_animation(animation_name)?;
        self.set_animation_index(Some(index), looped)
    }

    /// Discards the queue and plays the animation at `animation_index`, or nothing when `None`.
    pub fn set_animation_index(
        &mut self,
        animation_index: Option<usize>,
        looped: bool,
    ) -> Result<(), Error> {
        self.check_animation_index(animation_index)?;
        self.queue.clear();
        self.set_animation_internal(animation_index, looped, None);
        Ok(())
    }

    /// Queues the named animation. See [`AnimationState::add_animation_index`].
    pub fn add_animation(
        &mut self,
        animation_name: &str,
        looped: bool,
        delay: f32,
    ) -> Result<QueueEntryHandle, Error> {
        let index = self.find_animation(animation_name)?;
        self.add_animation_index(Some(index), looped, delay)
    }

    /// Queues an animation to play after `delay` seconds of the current track's clock.
    ///
    /// A `delay <= 0` is relative to the end of whatever precedes the new entry (the last queued
    /// entry, or the current track when the queue is empty), shortened by the cross-fade between
    /// the two. The delay is resolved once, here.
    pub fn add_animation_index(
        &mut self,
        animation_index: Option<usize>,
        looped: bool,
        delay: f32,
    ) -> Result<QueueEntryHandle, Error> {
        self.check_animation_index(animation_index)?;

        let delay = if delay <= 0.0 {
            let preceding = match self.queue.back() {
                Some(entry) => entry.animation_index,
                None => self.current,
            };
            match preceding.zip(self.animation_at(preceding)) {
                Some((preceding_index, preceding)) => {
                    let mix = animation_index
                        .map(|to| self.data.mix(preceding_index, to))
                        .unwrap_or(0.0);
                    preceding.duration - mix + delay
                }
                None => 0.0,
            }
        } else {
            delay
        };

        let id = self.next_entry_id;
        self.next_entry_id += 1;
        log::debug!(
            "queued animation '{}' with delay {}",
            self.animation_name(animation_index),
            delay
        );
        self.queue.push_back(QueueEntry {
            id,
            animation_index,
            looped,
            delay,
            listeners: Listeners::default(),
        });
        Ok(QueueEntryHandle { id })
    }

    /// Stops playback and discards the queue without notifying listeners.
    pub fn clear_animation(&mut self) {
        log::debug!(
            "clearing animation '{}' and {} queued entries",
            self.animation_name(self.current),
            self.queue.len()
        );
        self.previous = None;
        self.current = None;
        self.current_entry = None;
        self.queue.clear();
    }

    fn set_animation_internal(
        &mut self,
        animation_index: Option<usize>,
        looped: bool,
        entry: Option<QueueEntry>,
    ) {
        self.previous = None;
        if self.current.is_some() {
            self.notify(|listeners, state| listeners.end(state));
        }

        self.mix_duration = 0.0;
        if let (Some(from), Some(to)) = (self.current, animation_index) {
            self.mix_duration = self.data.mix(from, to);
            if self.mix_duration > 0.0 {
                self.mix_time = 0.0;
                self.previous = Some(from);
                self.previous_time = self.current_time;
                self.previous_loop = self.current_loop;
            }
        }

        self.current = animation_index;
        self.current_loop = looped;
        self.current_time = 0.0;
        self.current_last_time = 0.0;
        self.current_entry = entry;

        self.notify(|listeners, state| listeners.start(state));
    }

    /// Zero-length tracks never report completion.
    fn passed_end(&self, duration: f32) -> bool {
        if duration.is_nan() || duration <= 0.0 {
            return false;
        }
        if self.current_loop {
            self.current_last_time % duration > self.current_time % duration
        } else {
            self.current_last_time < duration && self.current_time >= duration
        }
    }

    /// Runs `f` for the current entry's listeners, then for the state's listeners.
    fn notify(&mut self, mut f: impl FnMut(&mut Listeners, &AnimationState)) {
        if let Some(mut listeners) = self
            .current_entry
            .as_mut()
            .map(|entry| std::mem::take(&mut entry.listeners))
        {
            f(&mut listeners, &*self);
            if let Some(entry) = self.current_entry.as_mut() {
                entry.listeners = listeners;
            }
        }

        let mut listeners = std::mem::take(&mut self.listeners);
        f(&mut listeners, &*self);
        self.listeners = listeners;
    }

    fn entry_mut(&mut self, id: u64) -> Option<&mut QueueEntry> {
        self.current_entry
            .iter_mut()
            .chain(self.queue.iter_mut())
            .find(|e| e.id == id)
    }

    fn find_animation(&self, name: &str) -> Result<usize, Error> {
        self.data
            .skeleton_data
            .animation(name)
            .map(|(index, _)| index)
            .ok_or_else(|| Error::UnknownAnimation {
                name: name.to_string(),
            })
    }

    fn check_animation_index(&self, animation_index: Option<usize>) -> Result<(), Error> {
        match animation_index {
            Some(index) if index >= self.data.skeleton_data.animations.len() => {
                Err(Error::InvalidAnimationIndex { index })
            }
            _ => Ok(()),
        }
    }

    fn animation_at(&self, animation_index: Option<usize>) -> Option<&Animation> {
        self.data.skeleton_data.animations.get(animation_index?)
    }

    fn animation_name(&self, animation_index: Option<usize>) -> &str {
        self.animation_at(animation_index)
            .map_or("<none>", |a| a.name.as_str())
    }
}
