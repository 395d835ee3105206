//! A small property tweening timeline.
//!
//! A [`Tween`] interpolates a set of indexed `f32` properties of a [`TweenTarget`]
//! towards fixed end values. Tweens are grouped into a [`Timeline`] that owns a
//! clock; the [`Animator`] drives any number of timelines at once and drops them
//! when they are done.
//!
//! Start values are captured lazily: a property reads its current value the first
//! time its tween renders, i.e. after its delay has elapsed. Tweens that overlap on
//! the same property therefore compose instead of snapping back.

/// Easing curves mapping linear progress in `[0, 1]` to eased progress.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Ease {
    /// Quadratic ease-out, `1 - (1 - t)^2`.
    #[default]
    Power1Out,
}

impl Ease {
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Power1Out => 1.0 - (1.0 - t) * (1.0 - t),
        }
    }
}

/// Anything exposing a flat array of animatable floats.
pub trait TweenTarget {
    fn property_count(&self) -> usize;

    fn property(&self, index: usize) -> Option<f32>;

    /// Writes a property. Returns `false` if `index` is out of range.
    fn set_property(&mut self, index: usize, value: f32) -> bool;
}

impl TweenTarget for [f32] {
    fn property_count(&self) -> usize {
        self.len()
    }

    fn property(&self, index: usize) -> Option<f32> {
        self.get(index).copied()
    }

    fn set_property(&mut self, index: usize, value: f32) -> bool {
        match self.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

impl TweenTarget for Vec<f32> {
    fn property_count(&self) -> usize {
        self.as_slice().property_count()
    }

    fn property(&self, index: usize) -> Option<f32> {
        self.as_slice().property(index)
    }

    fn set_property(&mut self, index: usize, value: f32) -> bool {
        self.as_mut_slice().set_property(index, value)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PropertyTween {
    index: usize,
    to: f32,
    from: Option<f32>,
}

impl PropertyTween {
    pub fn new(index: usize, to: f32) -> Self {
        Self {
            index,
            to,
            from: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn to(&self) -> f32 {
        self.to
    }

    /// The captured start value, `None` until the owning tween first renders.
    pub fn from(&self) -> Option<f32> {
        self.from
    }
}

#[derive(Clone, Debug)]
pub struct Tween {
    properties: Vec<PropertyTween>,
    delay: f32,
    duration: f32,
    repeat: u32,
    yoyo: bool,
    ease: Ease,
    completed: bool,
}

impl Tween {
    pub fn to(properties: Vec<PropertyTween>, duration: f32) -> Self {
        Self {
            properties,
            delay: 0.0,
            duration: duration.max(0.0),
            repeat: 0,
            yoyo: false,
            ease: Ease::default(),
            completed: false,
        }
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    /// Number of additional iterations after the first one.
    pub fn with_repeat(mut self, repeat: u32) -> Self {
        self.repeat = repeat;
        self
    }

    /// Every odd iteration runs backwards.
    pub fn with_yoyo(mut self, yoyo: bool) -> Self {
        self.yoyo = yoyo;
        self
    }

    pub fn properties(&self) -> &[PropertyTween] {
        &self.properties
    }

    pub fn delay(&self) -> f32 {
        self.delay
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn repeat(&self) -> u32 {
        self.repeat
    }

    pub fn yoyo(&self) -> bool {
        self.yoyo
    }

    pub fn ease(&self) -> Ease {
        self.ease
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Delay plus all iterations.
    pub fn end_time(&self) -> f32 {
        self.delay + self.duration * (self.repeat + 1) as f32
    }

    /// Eased progress in `[0, 1]` at `local` seconds after the delay, and whether that
    /// is the final state.
    fn progress(&self, local: f32) -> (f32, bool) {
        let total = self.duration * (self.repeat + 1) as f32;
        let (iteration, linear, finished) = if local >= total || self.duration == 0.0 {
            (self.repeat, 1.0, true)
        } else {
            let iteration = (local / self.duration).floor() as u32;
            let linear = (local - iteration as f32 * self.duration) / self.duration;
            (iteration, linear, false)
        };
        let eased = if self.yoyo && iteration % 2 == 1 {
            self.ease.apply(1.0 - linear)
        } else {
            self.ease.apply(linear)
        };
        (eased, finished)
    }

    /// Renders the tween at timeline time `time`. Returns whether any property was
    /// written.
    pub fn render<T: TweenTarget + ?Sized>(&mut self, time: f32, target: &mut T) -> bool {
        if self.completed {
            return false;
        }
        let local = time - self.delay;
        if local < 0.0 {
            return false;
        }
        let (eased, finished) = self.progress(local);
        let mut written = false;
        for property in self.properties.iter_mut() {
            let from = match property.from {
                Some(from) => from,
                None => match target.property(property.index) {
                    Some(current) => *property.from.insert(current),
                    None => continue,
                },
            };
            let value = from + (property.to - from) * eased;
            written |= target.set_property(property.index, value);
        }
        self.completed = finished;
        written
    }
}

/// A set of tweens sharing one clock.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    tweens: Vec<Tween>,
    time: f32,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tween: Tween) {
        self.tweens.push(tween);
    }

    pub fn tweens(&self) -> &[Tween] {
        &self.tweens
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn duration(&self) -> f32 {
        self.tweens
            .iter()
            .map(Tween::end_time)
            .fold(0.0, f32::max)
    }

    /// Advances the clock by `dt` seconds and renders every active tween. Returns
    /// whether the target was written to.
    pub fn advance<T: TweenTarget + ?Sized>(&mut self, dt: f32, target: &mut T) -> bool {
        self.time += dt.max(0.0);
        let time = self.time;
        self.tweens
            .iter_mut()
            .fold(false, |written, tween| tween.render(time, target) || written)
    }

    pub fn is_finished(&self) -> bool {
        self.tweens.iter().all(Tween::is_completed)
    }
}

/// Runs independent timelines side by side.
#[derive(Clone, Debug, Default)]
pub struct Animator {
    timelines: Vec<Timeline>,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, timeline: Timeline) {
        self.timelines.push(timeline);
    }

    pub fn active(&self) -> usize {
        self.timelines.len()
    }

    pub fn is_idle(&self) -> bool {
        self.timelines.is_empty()
    }

    pub fn advance<T: TweenTarget + ?Sized>(&mut self, dt: f32, target: &mut T) -> bool {
        let written = self
            .timelines
            .iter_mut()
            .fold(false, |written, timeline| {
                timeline.advance(dt, target) || written
            });
        self.timelines.retain(|timeline| !timeline.is_finished());
        written
    }
}
