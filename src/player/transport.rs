use std::time::Instant;

use log::debug;

use crate::player::process::{PlayerProcess, STOP_TIMEOUT};
use crate::types::playback_state::PlaybackState;
use crate::types::track::Track;

/// Transport controller: owns the playback clock, the slider position and the
/// active player segment.
pub struct Transport {
    track: Track,
    state: PlaybackState,
    player: Option<PlayerProcess>,
    seeking: bool,
    /// Slider value shown in the UI, in seconds. The slider widget mutates
    /// this directly while dragging; `resume` adopts it as the start offset
    /// when it was positioned by hand.
    pub slider_pos: f64,
}

impl Transport {
    pub fn new(track: Track) -> Self {
        Transport {
            track,
            state: PlaybackState::new(),
            player: None,
            seeking: false,
            slider_pos: 0.0,
        }
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn is_seeking(&self) -> bool {
        self.seeking
    }

    pub fn elapsed(&self) -> f64 {
        self.state.elapsed(Instant::now())
    }

    /// Replace the current track, stopping any active segment.
    pub fn load(&mut self, track: Track) {
        self.stop_player();
        self.state = PlaybackState::new();
        self.seeking = false;
        self.slider_pos = 0.0;
        self.track = track;
    }

    pub fn toggle_play_pause(&mut self) {
        if self.track.is_empty() {
            return;
        }
        if self.state.is_playing() {
            self.pause();
        } else {
            self.resume();
        }
    }

    pub fn resume(&mut self) {
        self.resume_at(Instant::now());
    }

    pub fn pause(&mut self) {
        self.pause_at(Instant::now());
    }

    /// Freeze position tracking and suspend the player while the user drags
    /// the slider. Works from both Playing and Paused.
    pub fn seek_begin(&mut self) {
        self.seek_begin_at(Instant::now());
    }

    /// Restart playback at `target` seconds.
    pub fn seek_end(&mut self, target: f64) {
        self.seek_end_at(target, Instant::now());
    }

    /// Periodic position update. Returns the elapsed seconds to display, or
    /// None while paused or seeking.
    pub fn tick(&mut self) -> Option<f64> {
        self.tick_at(Instant::now())
    }

    fn resume_at(&mut self, now: Instant) {
        if self.player.as_ref().is_some_and(PlayerProcess::is_alive) {
            return;
        }
        // A slider positioned by hand before playback becomes the start
        // offset.
        if !self.state.is_playing() && self.slider_pos > 0.0 {
            self.state.ts_start = self.slider_pos;
        }
        debug!(
            "starting segment at {:.1}s of {}",
            self.state.ts_start,
            self.track.path.display()
        );
        self.player = Some(PlayerProcess::start(&self.track.path, self.state.ts_start));
        self.state.resume(now);
    }

    fn pause_at(&mut self, now: Instant) {
        self.state.pause(now);
        self.stop_player();
        self.slider_pos = self.state.ts_start;
    }

    fn seek_begin_at(&mut self, now: Instant) {
        self.seeking = true;
        // Like pause, but the slider stays wherever the user is dragging it.
        self.state.pause(now);
        self.stop_player();
    }

    fn seek_end_at(&mut self, target: f64, now: Instant) {
        self.state.pause_at(target);
        self.slider_pos = self.state.ts_start;
        self.seeking = false;
        self.resume_at(now);
    }

    fn tick_at(&mut self, now: Instant) -> Option<f64> {
        if self.seeking || !self.state.is_playing() {
            return None;
        }
        let mut elapsed = self.state.elapsed(now);
        if self.track.duration > 0.0 && elapsed >= self.track.duration {
            // End of track: clamp and fall back to Paused.
            elapsed = self.track.duration;
            self.state.pause_at(elapsed);
            self.stop_player();
        }
        self.slider_pos = elapsed;
        Some(elapsed)
    }

    fn stop_player(&mut self) {
        if let Some(mut player) = self.player.take() {
            player.stop(STOP_TIMEOUT);
        }
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.stop_player();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn test_track(duration: f64) -> Track {
        Track {
            path: PathBuf::from("/music/test.mp3"),
            duration,
            title: Some("Test".to_string()),
            artist: None,
            cover_path: None,
        }
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn test_resume_then_tick_reports_elapsed() {
        let mut transport = Transport::new(test_track(180.0));
        let t0 = Instant::now();
        transport.resume_at(t0);
        assert!(transport.is_playing());
        let got = transport.tick_at(t0 + secs(50.0)).unwrap();
        assert!((got - 50.0).abs() < 0.5);
        assert!((transport.slider_pos - 50.0).abs() < 0.5);
    }

    #[test]
    fn test_pause_freezes_position_and_stops_player() {
        let mut transport = Transport::new(test_track(180.0));
        let t0 = Instant::now();
        transport.resume_at(t0);
        transport.pause_at(t0 + secs(50.0));
        assert!(!transport.is_playing());
        assert!((transport.state.ts_start - 50.0).abs() < 0.5);
        assert!(transport.player.is_none());
        // Paused: further ticks are no-ops.
        assert_eq!(transport.tick_at(t0 + secs(60.0)), None);
        assert!((transport.elapsed() - 50.0).abs() < 0.5);
    }

    #[test]
    fn test_elapsed_monotonic_while_playing() {
        let mut transport = Transport::new(test_track(600.0));
        let t0 = Instant::now();
        transport.resume_at(t0);
        let mut last = 0.0;
        for i in 1..=10 {
            let elapsed = transport.tick_at(t0 + secs(i as f64 * 3.0)).unwrap();
            assert!(elapsed >= last);
            last = elapsed;
        }
    }

    #[test]
    fn test_seek_round_trip() {
        let mut transport = Transport::new(test_track(180.0));
        let t0 = Instant::now();
        transport.resume_at(t0);
        transport.seek_begin_at(t0 + secs(10.0));
        assert!(transport.is_seeking());
        assert!(!transport.is_playing());
        assert_eq!(transport.tick_at(t0 + secs(10.1)), None);

        transport.seek_end_at(120.0, t0 + secs(12.0));
        assert!(!transport.is_seeking());
        assert!(transport.is_playing());
        let got = transport.tick_at(t0 + secs(12.3)).unwrap();
        assert!((got - 120.0).abs() < 0.5);
    }

    #[test]
    fn test_tick_clamps_to_duration_and_pauses() {
        let mut transport = Transport::new(test_track(180.0));
        let t0 = Instant::now();
        transport.resume_at(t0);
        let got = transport.tick_at(t0 + secs(200.0)).unwrap();
        assert_eq!(got, 180.0);
        assert!(!transport.is_playing());
        assert_eq!(transport.state.ts_start, 180.0);
        assert_eq!(transport.slider_pos, 180.0);
        assert_eq!(transport.tick_at(t0 + secs(201.0)), None);
    }

    #[test]
    fn test_zero_duration_track_never_clamps() {
        let mut transport = Transport::new(test_track(0.0));
        let t0 = Instant::now();
        transport.resume_at(t0);
        let got = transport.tick_at(t0 + secs(1000.0)).unwrap();
        assert!((got - 1000.0).abs() < 0.5);
        assert!(transport.is_playing());
    }

    #[test]
    fn test_resume_adopts_manual_slider_position() {
        let mut transport = Transport::new(test_track(180.0));
        transport.slider_pos = 42.0;
        transport.resume_at(Instant::now());
        assert!((transport.state.ts_start - 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_toggle_is_a_noop_without_a_file() {
        let mut transport = Transport::new(Track::empty());
        transport.toggle_play_pause();
        assert!(!transport.is_playing());
        assert!(transport.player.is_none());
    }

    #[test]
    fn test_load_resets_state() {
        let mut transport = Transport::new(test_track(180.0));
        let t0 = Instant::now();
        transport.resume_at(t0);
        transport.slider_pos = 99.0;
        transport.load(test_track(60.0));
        assert!(!transport.is_playing());
        assert_eq!(transport.state.ts_start, 0.0);
        assert_eq!(transport.slider_pos, 0.0);
        assert!(transport.player.is_none());
        assert_eq!(transport.track().duration, 60.0);
    }
}
