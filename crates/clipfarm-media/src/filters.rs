//! Fade transition filters.

/// Fade-in/fade-out timing for one clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadePlan {
    /// Length of each fade in seconds
    pub duration: f64,
    /// Start of the fade-out in seconds
    pub out_start: f64,
}

impl FadePlan {
    /// Plan fades for a clip, clamping the fade to half the clip length.
    ///
    /// Timings are whole milliseconds rounded down, so the rendered fade-out
    /// never ends past the clip. Returns `None` when the clamped fade is
    /// zero, in which case no fade filters are applied.
    pub fn for_clip(clip_duration: f64, requested_fade: f64) -> Option<Self> {
        let clip_ms = floor_millis(clip_duration);
        let fade_ms = floor_millis(requested_fade).min((clip_ms / 2.0).floor());
        if fade_ms <= 0.0 {
            return None;
        }

        Some(Self {
            duration: fade_ms / 1000.0,
            out_start: (clip_ms - fade_ms) / 1000.0,
        })
    }

    /// Video filter chain: fade in at 0, fade out before the end.
    pub fn video_filter(&self) -> String {
        format!(
            "fade=t=in:st=0:d={d:.3},fade=t=out:st={s:.3}:d={d:.3}",
            d = self.duration,
            s = self.out_start
        )
    }

    /// Audio filter chain mirroring [`video_filter`](Self::video_filter).
    pub fn audio_filter(&self) -> String {
        format!(
            "afade=t=in:st=0:d={d:.3},afade=t=out:st={s:.3}:d={d:.3}",
            d = self.duration,
            s = self.out_start
        )
    }
}

/// Seconds to whole milliseconds, tolerating binary representation error.
fn floor_millis(seconds: f64) -> f64 {
    (seconds.max(0.0) * 1000.0 + 1e-6).floor()
}
