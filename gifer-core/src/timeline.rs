//! Layered timeline: registration, scheduling and compositing

use crate::codec::ImageCodec;
use crate::frame::{DynamicFrame, Frame, Size, SizeSpec};
use crate::layer::{LayerKind, LayerOptions};
use crate::schedule::Schedule;
use crate::{Error, Result};
use image::{DynamicImage, RgbaImage};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Timeline-wide configuration
#[derive(Debug, Clone)]
pub struct TimelineConfig {
    /// Cut the output to the length of the first registered layer
    pub trim_to_base: bool,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self { trim_to_base: true }
    }
}

/// Outcome of a successful render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSummary {
    /// Number of encoded frames
    pub frames: usize,
    /// Total playback length in milliseconds
    pub duration_ms: u64,
}

/// Merges still images and animations into a single animation
///
/// Layers are registered in draw order with [`Timeline::add_image`] and
/// [`Timeline::add_animation`]; [`Timeline::render`] then resamples every layer
/// onto one sequence of breakpoints and composites each of them.
pub struct Timeline<C> {
    codec: C,
    config: TimelineConfig,
    /// Next automatically assigned layer; never decreases
    layer_counter: u32,
    /// Number of registered layers, used as a tie-breaker between equal layers
    registered: usize,
    /// Arena of every placed animation sub-image
    frames: Vec<DynamicFrame>,
    /// Instant -> indices into `frames` of sub-images starting exactly there
    instant_map: BTreeMap<u64, Vec<usize>>,
    static_frames: Vec<Frame>,
    base_duration: Option<u64>,
    max_bound: Option<u64>,
    /// Furthest instant reached by any layer, used when not trimming to the base
    content_end: u64,
}

impl<C: ImageCodec> Timeline<C> {
    /// Creates an empty timeline with the default configuration
    pub fn new(codec: C) -> Self {
        Self::with_config(codec, TimelineConfig::default())
    }

    /// Creates an empty timeline
    pub fn with_config(codec: C, config: TimelineConfig) -> Self {
        Self {
            codec,
            config,
            layer_counter: 0,
            registered: 0,
            frames: Vec::new(),
            instant_map: BTreeMap::new(),
            static_frames: Vec::new(),
            base_duration: None,
            max_bound: None,
            content_end: 0,
        }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// Next layer number that would be assigned automatically
    pub fn layer_counter(&self) -> u32 {
        self.layer_counter
    }

    /// Length of the base layer, once established
    pub fn base_duration(&self) -> Option<u64> {
        self.base_duration
    }

    /// Ceiling on instants placed by layers registered after the base
    pub fn max_bound(&self) -> Option<u64> {
        self.max_bound
    }

    pub fn static_frames(&self) -> &[Frame] {
        &self.static_frames
    }

    /// Every placed animation sub-image, loop replicas included
    pub fn dynamic_frames(&self) -> &[DynamicFrame] {
        &self.frames
    }

    /// Sub-images placed exactly at `instant`, before expansion
    pub fn placed_at(&self, instant: u64) -> Vec<&DynamicFrame> {
        self.instant_map
            .get(&instant)
            .into_iter()
            .flatten()
            .map(|&id| &self.frames[id])
            .collect()
    }

    /// Instant at which the output ends
    pub fn terminal_instant(&self) -> u64 {
        match self.base_duration {
            Some(base) if self.config.trim_to_base => base,
            _ => self.content_end,
        }
    }

    /// Registers a layer of the given kind; returns the assigned layer
    pub fn register(&mut self, path: impl AsRef<Path>, kind: LayerKind, options: LayerOptions) -> Result<u32> {
        match kind {
            LayerKind::Still => self.add_image(path, options),
            LayerKind::Animation => self.add_animation(path, options),
        }
    }

    /// Registers a still image layer; returns the assigned layer
    pub fn add_image(&mut self, path: impl AsRef<Path>, options: LayerOptions) -> Result<u32> {
        let path = path.as_ref();
        let establishes_base = self.establishes_base();
        options.validate(LayerKind::Still, establishes_base)?;
        if options.looped {
            warn!(path = %path.display(), "loop has no effect on still images");
        }

        let image = self.codec.decode_still(path)?;
        let image = Arc::new(self.fit(image, &options.size));

        let layer = self.assign_layer(options.layer);
        let order = self.next_order();
        let window = options.window();
        let frame = Frame::new(image, layer, options.position, window, order);

        if let Some(end) = window.end {
            self.content_end = self.content_end.max(end);
            if establishes_base {
                self.establish_base(end);
            }
        }

        info!(
            path = %path.display(),
            layer,
            width = frame.size.width,
            height = frame.size.height,
            "registered still layer"
        );
        self.static_frames.push(frame);

        Ok(layer)
    }

    /// Registers an animation layer; returns the assigned layer
    pub fn add_animation(&mut self, path: impl AsRef<Path>, options: LayerOptions) -> Result<u32> {
        let path = path.as_ref();
        let establishes_base = self.establishes_base();
        options.validate(LayerKind::Animation, establishes_base)?;

        let decoded = self.codec.decode_animation(path)?;
        if decoded.is_empty() {
            return Err(Error::decode(path, "animation has no frames"));
        }

        let layer = self.assign_layer(options.layer);
        let order = self.next_order();
        let window = options.window();
        let loop_duration: u64 = decoded.iter().map(|(_, duration)| duration).sum();

        let base_length = establishes_base.then(|| match options.end {
            Some(end) if options.looped => end,
            Some(end) => end.min(loop_duration),
            None => loop_duration,
        });
        let bound = base_length.or(self.max_bound);
        let replicate_until = if options.looped {
            let until = match (bound, options.end) {
                (Some(bound), Some(end)) => Some(bound.min(end.saturating_add(1))),
                (bound, end) => bound.or(end.map(|end| end.saturating_add(1))),
            };
            if until.is_none() {
                warn!(path = %path.display(), "unbounded loop plays a single pass");
            }
            until.filter(|_| loop_duration > 0)
        } else {
            None
        };

        let placed_before = self.frames.len();
        let mut t = options.start;
        for (image, duration) in decoded {
            let past_end = options.end.is_some_and(|end| t > end);
            if past_end || bound.is_some_and(|bound| t > bound) {
                debug!(layer, instant = t, "stopped placing sub-images");
                break;
            }

            let image = Arc::new(self.fit(image, &options.size));
            let frame = Frame::new(image, layer, options.position.clone(), window, order);
            self.place(DynamicFrame::new(frame.clone(), t, duration));

            if let Some(until) = replicate_until {
                let mut replica = t.saturating_add(loop_duration);
                while replica < until {
                    self.place(DynamicFrame::new(frame.clone(), replica, duration));
                    replica = replica.saturating_add(loop_duration);
                }
            }

            t = t.saturating_add(duration);
        }

        if let Some(length) = base_length {
            self.establish_base(length);
        }

        info!(
            path = %path.display(),
            layer,
            loop_duration,
            placed = self.frames.len() - placed_before,
            "registered animation layer"
        );

        Ok(layer)
    }

    /// Computes breakpoints and expands frames across them
    pub fn schedule(&self) -> Schedule<'_> {
        Schedule::build(
            &self.frames,
            &self.instant_map,
            self.terminal_instant(),
            !self.static_frames.is_empty(),
        )
    }

    /// Composites every output frame without encoding
    ///
    /// Returns (canvas, duration in seconds) pairs in playback order.
    pub fn compose(&self) -> Result<Vec<(RgbaImage, f64)>> {
        self.compose_schedule(&self.schedule())
    }

    /// Composites every output frame and encodes them to `output`
    #[tracing::instrument(skip(self, output), fields(output = %output.as_ref().display()))]
    pub fn render(&self, output: impl AsRef<Path>) -> Result<RenderSummary> {
        let schedule = self.schedule();
        let frames = self.compose_schedule(&schedule)?;
        self.codec.encode_sequence(output.as_ref(), &frames)?;

        let summary = RenderSummary {
            frames: frames.len(),
            duration_ms: schedule.durations_ms().iter().sum(),
        };
        info!(frames = summary.frames, duration_ms = summary.duration_ms, "rendered timeline");

        Ok(summary)
    }

    fn compose_schedule(&self, schedule: &Schedule<'_>) -> Result<Vec<(RgbaImage, f64)>> {
        if schedule.frame_count() == 0 {
            return Err(Error::EmptyTimeline);
        }

        let durations = schedule.durations();
        let mut output = Vec::with_capacity(durations.len());
        for (index, (&instant, duration)) in schedule.instants().iter().zip(durations).enumerate() {
            let canvas = self.composite_at(instant, schedule.bucket_at(index))?;
            output.push((canvas, duration));
        }

        Ok(output)
    }

    /// Flattens the bucket and the static layers showing at `instant` into one canvas
    fn composite_at<'f>(
        &'f self,
        instant: u64,
        bucket: impl Iterator<Item = &'f DynamicFrame>,
    ) -> Result<RgbaImage> {
        let mut candidates: Vec<Candidate<'f>> = bucket
            .map(Candidate::Dynamic)
            .chain(self.static_frames.iter().map(Candidate::Static))
            .collect();
        candidates.sort_by_key(|candidate| {
            let frame = candidate.frame();
            (frame.layer, frame.order)
        });

        let (base, overlays) = candidates.split_first().ok_or(Error::EmptyTimeline)?;
        let mut canvas = self.codec.to_fixed_alpha(&base.frame().image);
        let base_snapshot = canvas.clone();

        for candidate in overlays {
            if !candidate.is_visible(instant) {
                continue;
            }

            let frame = candidate.frame();
            let Some(at) = frame.position.resolve(&canvas, &base_snapshot, instant)? else {
                debug!(layer = frame.layer, instant, "resolver skipped overlay");
                continue;
            };
            self.codec.alpha_composite(&mut canvas, &frame.image, at);
        }

        Ok(canvas)
    }

    fn establishes_base(&self) -> bool {
        self.config.trim_to_base && self.layer_counter == 0
    }

    fn establish_base(&mut self, length: u64) {
        debug!(length, "established base layer");
        self.base_duration = Some(length);
        self.max_bound = Some(length);
    }

    fn assign_layer(&mut self, requested: Option<u32>) -> u32 {
        let layer = requested.unwrap_or(self.layer_counter);
        self.layer_counter = layer.saturating_add(1).max(self.layer_counter.saturating_add(1));
        layer
    }

    fn next_order(&mut self) -> usize {
        let order = self.registered;
        self.registered += 1;
        order
    }

    /// Applies the layer's size spec, resizing only when the size changes
    fn fit(&self, image: DynamicImage, spec: &SizeSpec) -> DynamicImage {
        let natural = Size::of(&image);
        let target = spec.resolve(natural);
        if target == natural {
            image
        } else {
            self.codec.resize(&image, target)
        }
    }

    fn place(&mut self, frame: DynamicFrame) {
        self.content_end = self.content_end.max(frame.end_time());
        let id = self.frames.len();
        self.instant_map.entry(frame.local_time).or_default().push(id);
        self.frames.push(frame);
    }
}

/// A layer competing for one output instant
enum Candidate<'a> {
    Static(&'a Frame),
    Dynamic(&'a DynamicFrame),
}

impl Candidate<'_> {
    fn frame(&self) -> &Frame {
        match self {
            Candidate::Static(frame) => frame,
            Candidate::Dynamic(dynamic) => &dynamic.frame,
        }
    }

    /// Static layers obey their window; dynamic ones are governed by bucket membership
    fn is_visible(&self, instant: u64) -> bool {
        match self {
            Candidate::Static(frame) => frame.window.contains(instant),
            Candidate::Dynamic(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::mock::{solid, MockCodec};
    use crate::frame::{Point, Resolver};
    use image::Rgba;
    use std::sync::Mutex;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const GREEN: [u8; 4] = [0, 255, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];

    fn layers_at(timeline: &Timeline<&MockCodec>, layer: u32) -> Vec<u64> {
        let mut instants: Vec<u64> = timeline
            .dynamic_frames()
            .iter()
            .filter(|f| f.layer() == layer)
            .map(|f| f.local_time)
            .collect();
        instants.sort_unstable();
        instants
    }

    #[test]
    fn test_automatic_layers() {
        let codec = MockCodec::new().with_still("a.png", solid(4, 4, RED));
        let mut timeline = Timeline::with_config(&codec, TimelineConfig { trim_to_base: false });

        let layers: Vec<u32> = (0..3)
            .map(|_| timeline.add_image("a.png", LayerOptions::new()).unwrap())
            .collect();
        assert_eq!(layers, vec![0, 1, 2]);
    }

    #[test]
    fn test_explicit_layer_moves_counter_forward() {
        let codec = MockCodec::new().with_still("a.png", solid(4, 4, RED));
        let mut timeline = Timeline::with_config(&codec, TimelineConfig { trim_to_base: false });

        assert_eq!(timeline.add_image("a.png", LayerOptions::new().layer(5)).unwrap(), 5);
        assert_eq!(timeline.add_image("a.png", LayerOptions::new()).unwrap(), 6);
        // an explicit lower layer never drags the counter back
        assert_eq!(timeline.add_image("a.png", LayerOptions::new().layer(1)).unwrap(), 1);
        assert_eq!(timeline.add_image("a.png", LayerOptions::new()).unwrap(), 8);
    }

    #[test]
    fn test_highest_layer_saturates_counter() {
        let codec = MockCodec::new().with_still("a.png", solid(4, 4, RED));
        let mut timeline = Timeline::with_config(&codec, TimelineConfig { trim_to_base: false });

        assert_eq!(timeline.add_image("a.png", LayerOptions::new().layer(u32::MAX)).unwrap(), u32::MAX);
        assert_eq!(timeline.layer_counter(), u32::MAX);
        assert_eq!(timeline.add_image("a.png", LayerOptions::new()).unwrap(), u32::MAX);
        assert_eq!(timeline.layer_counter(), u32::MAX);
    }

    #[test]
    fn test_still_base_needs_bounded_window() {
        let codec = MockCodec::new().with_still("bg.png", solid(8, 8, RED));
        let mut timeline = Timeline::new(&codec);

        let err = timeline.add_image("bg.png", LayerOptions::new()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert_eq!(codec.decode_calls.get(), 0);
        assert_eq!(timeline.layer_counter(), 0);

        assert_eq!(timeline.add_image("bg.png", LayerOptions::new().end(500)).unwrap(), 0);
        assert_eq!(timeline.base_duration(), Some(500));
        assert_eq!(timeline.max_bound(), Some(500));
    }

    #[test]
    fn test_base_rules_only_apply_to_first_layer() {
        let codec = MockCodec::new()
            .with_still("bg.png", solid(8, 8, RED))
            .with_animation("spin.gif", 4, &[(GREEN, 100)]);
        let mut timeline = Timeline::new(&codec);

        assert!(timeline
            .add_animation("spin.gif", LayerOptions::new().looped(true))
            .is_err());
        timeline.add_image("bg.png", LayerOptions::new().end(400)).unwrap();
        timeline.add_image("bg.png", LayerOptions::new().start(50)).unwrap();
        timeline
            .add_animation("spin.gif", LayerOptions::new().looped(true))
            .unwrap();

        assert_eq!(timeline.base_duration(), Some(400));
        assert_eq!(layers_at(&timeline, 2), vec![0, 100, 200, 300]);
    }

    #[test]
    fn test_decode_failure_leaves_timeline_untouched() {
        let codec = MockCodec::new();
        let mut timeline = Timeline::new(&codec);

        let err = timeline.add_animation("missing.gif", LayerOptions::new()).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
        assert_eq!(timeline.layer_counter(), 0);
        assert!(timeline.dynamic_frames().is_empty());
        assert_eq!(timeline.base_duration(), None);
    }

    #[test]
    fn test_looped_animation_replicates_until_base_length() {
        let codec = MockCodec::new()
            .with_still("bg.png", solid(8, 8, RED))
            .with_animation("blink.gif", 4, &[(GREEN, 100), (BLUE, 150), (GREEN, 50)]);
        let mut timeline = Timeline::new(&codec);

        timeline.add_image("bg.png", LayerOptions::new().end(1000)).unwrap();
        timeline
            .add_animation("blink.gif", LayerOptions::new().looped(true))
            .unwrap();

        assert_eq!(
            layers_at(&timeline, 1),
            vec![0, 100, 250, 300, 400, 550, 600, 700, 850, 900]
        );
        assert!(timeline.dynamic_frames().iter().all(|f| f.local_time < 1000));
    }

    #[test]
    fn test_loop_replicas_share_pixels() {
        let codec = MockCodec::new()
            .with_still("bg.png", solid(8, 8, RED))
            .with_animation("blink.gif", 4, &[(GREEN, 100), (BLUE, 100)]);
        let mut timeline = Timeline::new(&codec);

        timeline.add_image("bg.png", LayerOptions::new().end(1000)).unwrap();
        timeline
            .add_animation("blink.gif", LayerOptions::new().looped(true))
            .unwrap();

        let first = &timeline.placed_at(0)[0].frame.image;
        let replica = &timeline.placed_at(800)[0].frame.image;
        assert!(Arc::ptr_eq(first, replica));
        assert_eq!(codec.decode_calls.get(), 2);
    }

    #[test]
    fn test_loop_respects_layer_end() {
        let codec = MockCodec::new()
            .with_still("bg.png", solid(8, 8, RED))
            .with_animation("blink.gif", 4, &[(GREEN, 100), (BLUE, 100)]);
        let mut timeline = Timeline::new(&codec);

        timeline.add_image("bg.png", LayerOptions::new().end(1000)).unwrap();
        timeline
            .add_animation("blink.gif", LayerOptions::new().start(100).end(500).looped(true))
            .unwrap();

        assert_eq!(layers_at(&timeline, 1), vec![100, 200, 300, 400, 500]);
    }

    #[test]
    fn test_loop_with_farthest_end_stops_at_base() {
        let codec = MockCodec::new()
            .with_still("bg.png", solid(8, 8, RED))
            .with_animation("blink.gif", 4, &[(GREEN, 100), (BLUE, 100)]);
        let mut timeline = Timeline::new(&codec);

        timeline.add_image("bg.png", LayerOptions::new().end(500)).unwrap();
        timeline
            .add_animation("blink.gif", LayerOptions::new().end(u64::MAX).looped(true))
            .unwrap();

        assert_eq!(layers_at(&timeline, 1), vec![0, 100, 200, 300, 400]);
        assert_eq!(timeline.schedule().terminal(), 500);
    }

    #[test]
    fn test_placement_stops_at_layer_end() {
        let codec = MockCodec::new()
            .with_animation("base.gif", 8, &[(RED, 1000)])
            .with_animation("walk.gif", 4, &[(GREEN, 300), (BLUE, 300), (GREEN, 300)]);
        let mut timeline = Timeline::new(&codec);

        timeline.add_animation("base.gif", LayerOptions::new()).unwrap();
        timeline
            .add_animation("walk.gif", LayerOptions::new().start(200).end(600))
            .unwrap();

        assert_eq!(layers_at(&timeline, 1), vec![200, 500]);
        let placed = timeline.placed_at(200);
        assert_eq!(placed[0].frame.window.end, Some(600));
    }

    #[test]
    fn test_expansion_carries_long_frames() {
        let codec = MockCodec::new()
            .with_still("bg.png", solid(8, 8, RED))
            .with_animation("slow.gif", 4, &[(GREEN, 250)])
            .with_animation("fast.gif", 4, &[(BLUE, 100), (GREEN, 200), (BLUE, 700)]);
        let mut timeline = Timeline::new(&codec);

        timeline.add_image("bg.png", LayerOptions::new().end(1000)).unwrap();
        timeline.add_animation("slow.gif", LayerOptions::new()).unwrap();
        timeline.add_animation("fast.gif", LayerOptions::new()).unwrap();

        assert!(timeline.placed_at(100).iter().all(|f| f.layer() == 2));

        let schedule = timeline.schedule();
        assert_eq!(schedule.breakpoints(), &[0, 100, 300, 1000]);

        let at_100: Vec<u32> = schedule.bucket(100).unwrap().iter().map(|f| f.layer()).collect();
        assert!(at_100.contains(&1));

        let at_300: Vec<u32> = schedule.bucket(300).unwrap().iter().map(|f| f.layer()).collect();
        assert_eq!(at_300, vec![2]);
    }

    #[test]
    fn test_frame_count_and_total_duration() {
        let codec = MockCodec::new()
            .with_animation("base.gif", 8, &[(RED, 400), (GREEN, 600)])
            .with_animation("blink.gif", 4, &[(BLUE, 70), (GREEN, 130)]);
        let mut timeline = Timeline::new(&codec);

        timeline.add_animation("base.gif", LayerOptions::new()).unwrap();
        timeline
            .add_animation("blink.gif", LayerOptions::new().looped(true))
            .unwrap();

        let schedule = timeline.schedule();
        let frames = timeline.compose().unwrap();
        assert_eq!(frames.len(), schedule.breakpoints().len() - 1);

        let total: f64 = frames.iter().map(|(_, duration)| duration).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_static_window_at_composite_time() {
        let codec = MockCodec::new()
            .with_animation("base.gif", 8, &[(RED, 100), (RED, 1), (RED, 99), (RED, 1), (RED, 99)])
            .with_still("logo.png", solid(2, 2, BLUE));
        let mut timeline = Timeline::new(&codec);

        timeline.add_animation("base.gif", LayerOptions::new()).unwrap();
        timeline
            .add_image("logo.png", LayerOptions::new().start(100).end(200))
            .unwrap();

        let schedule = timeline.schedule();
        assert_eq!(schedule.instants(), &[0, 100, 101, 200, 201]);

        let visible: Vec<bool> = timeline
            .compose()
            .unwrap()
            .iter()
            .map(|(canvas, _)| *canvas.get_pixel(0, 0) == Rgba(BLUE))
            .collect();
        assert_eq!(visible, vec![false, false, true, true, false]);
    }

    #[test]
    fn test_end_to_end_base_with_static_overlay() {
        let codec = MockCodec::new()
            .with_animation("base.gif", 40, &[(RED, 500), (GREEN, 500)])
            .with_still("dot.png", solid(5, 5, BLUE));
        let mut timeline = Timeline::new(&codec);

        timeline
            .add_animation("base.gif", LayerOptions::new().end(1000))
            .unwrap();
        timeline.add_image("dot.png", LayerOptions::new().at(10, 10)).unwrap();

        let summary = timeline.render("out.gif").unwrap();
        assert_eq!(
            summary,
            RenderSummary {
                frames: 2,
                duration_ms: 1000
            }
        );

        let encoded = codec.last_encoded();
        assert_eq!(encoded.len(), 2);
        for ((canvas, duration), background) in encoded.iter().zip([RED, GREEN]) {
            assert_eq!(*duration, 0.5);
            assert_eq!(*canvas.get_pixel(10, 10), Rgba(BLUE));
            assert_eq!(*canvas.get_pixel(14, 14), Rgba(BLUE));
            assert_eq!(*canvas.get_pixel(9, 9), Rgba(background));
            assert_eq!(*canvas.get_pixel(15, 15), Rgba(background));
        }
    }

    #[test]
    fn test_layer_order_beats_registration_order() {
        let codec = MockCodec::new()
            .with_animation("base.gif", 8, &[(RED, 100)])
            .with_still("top.png", solid(8, 8, BLUE))
            .with_still("middle.png", solid(8, 8, GREEN));
        let mut timeline = Timeline::new(&codec);

        timeline.add_animation("base.gif", LayerOptions::new()).unwrap();
        timeline.add_image("top.png", LayerOptions::new().layer(3)).unwrap();
        timeline.add_image("middle.png", LayerOptions::new().layer(2)).unwrap();

        let frames = timeline.compose().unwrap();
        assert_eq!(*frames[0].0.get_pixel(4, 4), Rgba(BLUE));
    }

    #[test]
    fn test_resolver_placement() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        let resolver = Resolver::new(move |canvas, base, instant| {
            recorder.lock().unwrap().push(instant);
            assert_eq!(*base.get_pixel(0, 0), Rgba(RED));
            assert_eq!(canvas.dimensions(), (8, 8));
            Ok((instant > 0).then_some(Point::new(4, 4)))
        });

        let codec = MockCodec::new()
            .with_animation("base.gif", 8, &[(RED, 100), (RED, 100)])
            .with_still("eye.png", solid(2, 2, BLUE));
        let mut timeline = Timeline::new(&codec);

        timeline.add_animation("base.gif", LayerOptions::new()).unwrap();
        timeline
            .add_image("eye.png", LayerOptions::new().resolved_by(resolver))
            .unwrap();

        let frames = timeline.compose().unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![0, 100]);
        assert_eq!(*frames[0].0.get_pixel(4, 4), Rgba(RED));
        assert_eq!(*frames[1].0.get_pixel(4, 4), Rgba(BLUE));
    }

    #[test]
    fn test_resolver_error_aborts_render() {
        let codec = MockCodec::new()
            .with_animation("base.gif", 8, &[(RED, 100)])
            .with_still("eye.png", solid(2, 2, BLUE));
        let mut timeline = Timeline::new(&codec);

        timeline.add_animation("base.gif", LayerOptions::new()).unwrap();
        timeline
            .add_image(
                "eye.png",
                LayerOptions::new().resolved_by(Resolver::new(|_, _, _| Err("detector crashed".into()))),
            )
            .unwrap();

        let err = timeline.render("out.gif").unwrap_err();
        assert!(matches!(err, Error::Resolver { instant: 0, .. }));
        assert!(codec.encoded.borrow().is_empty());
    }

    #[test]
    fn test_ratio_resizes_once() {
        let codec = MockCodec::new()
            .with_still("bg.png", solid(100, 100, RED))
            .with_still("logo.png", solid(50, 20, BLUE));
        let mut timeline = Timeline::new(&codec);

        timeline.add_image("bg.png", LayerOptions::new().end(100)).unwrap();
        timeline.add_image("logo.png", LayerOptions::new().ratio(0.2)).unwrap();
        timeline.add_image("logo.png", LayerOptions::new().size(7, 3)).unwrap();

        let sizes: Vec<Size> = timeline.static_frames().iter().map(|f| f.size).collect();
        assert_eq!(sizes, vec![Size::new(100, 100), Size::new(10, 4), Size::new(7, 3)]);
    }

    #[test]
    fn test_static_only_timeline_renders() {
        let codec = MockCodec::new()
            .with_still("bg.png", solid(8, 8, RED))
            .with_still("logo.png", solid(2, 2, BLUE));
        let mut timeline = Timeline::new(&codec);

        timeline.add_image("bg.png", LayerOptions::new().end(800)).unwrap();
        timeline.add_image("logo.png", LayerOptions::new()).unwrap();

        let frames = timeline.compose().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].1, 0.8);
        assert_eq!(*frames[0].0.get_pixel(0, 0), Rgba(BLUE));
    }

    #[test]
    fn test_untrimmed_timeline_spans_all_layers() {
        let codec = MockCodec::new()
            .with_animation("short.gif", 8, &[(RED, 300)])
            .with_animation("late.gif", 4, &[(BLUE, 200), (GREEN, 200)]);
        let mut timeline = Timeline::with_config(&codec, TimelineConfig { trim_to_base: false });

        timeline.add_animation("short.gif", LayerOptions::new()).unwrap();
        timeline
            .add_animation("late.gif", LayerOptions::new().start(500))
            .unwrap();

        assert_eq!(timeline.base_duration(), None);
        assert_eq!(timeline.terminal_instant(), 900);
        assert_eq!(timeline.schedule().breakpoints(), &[0, 500, 700, 900]);
    }

    #[test]
    fn test_empty_timeline_fails() {
        let codec = MockCodec::new();
        let timeline = Timeline::new(&codec);

        assert!(matches!(timeline.render("out.gif"), Err(Error::EmptyTimeline)));
    }
}
