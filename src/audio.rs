//! Audio system using Web Audio API
//!
//! Procedurally generated cues and background loop - no external files
//! needed. Every failure path degrades to silence; the simulation never
//! waits on audio.

use web_sys::{AudioContext, AudioContextState, GainNode, OscillatorNode, OscillatorType};

use crate::Settings;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Player impulse (flap)
    Impulse,
    /// Finish marker reached
    Win,
    /// Hit a gate or left the field
    Lose,
}

/// Background loop melody (Hz), one note per beat
const MUSIC_NOTES: [f32; 8] = [
    261.63, 329.63, 392.0, 329.63, 293.66, 349.23, 440.0, 349.23,
];
/// Seconds per music note
const MUSIC_BEAT: f64 = 0.25;
/// How far ahead of the audio clock music notes are scheduled
const MUSIC_LOOKAHEAD: f64 = 1.0;

/// Looping music voice, rescheduled a bar at a time from the frame loop
struct MusicVoice {
    osc: OscillatorNode,
    gain: GainNode,
    /// Audio-clock time up to which notes are scheduled
    scheduled_until: f64,
    next_note: usize,
}

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    music_volume: f32,
    sfx_volume: f32,
    music: Option<MusicVoice>,
    /// Cue oscillators that may still be sounding, with their stop time
    voices: Vec<(OscillatorNode, f64)>,
}

impl AudioManager {
    pub fn new(settings: &Settings) -> Self {
        // Try to create audio context (may fail if not in secure context)
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            music_volume: settings.music_gain(),
            sfx_volume: settings.sfx_gain(),
            music: None,
            voices: Vec::new(),
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        let Some(ctx) = &self.ctx else { return };
        if ctx.state() == AudioContextState::Suspended {
            if let Err(e) = ctx.resume() {
                log::warn!("Audio playback blocked until user interaction: {:?}", e);
            }
        }
    }

    /// Play a one-shot cue
    pub fn play(&mut self, effect: SoundEffect) {
        let vol = self.sfx_volume;
        if vol <= 0.0 {
            return;
        }
        self.resume();
        let Some(ctx) = self.ctx.clone() else { return };

        match effect {
            SoundEffect::Impulse => self.play_impulse(&ctx, vol),
            SoundEffect::Win => self.play_win(&ctx, vol),
            SoundEffect::Lose => self.play_lose(&ctx, vol),
        }
    }

    /// Start the background loop from its first note
    pub fn start_music(&mut self) {
        self.stop_music();
        if self.music_volume <= 0.0 {
            return;
        }
        self.resume();
        let Some(ctx) = self.ctx.clone() else { return };
        let Some((osc, gain)) = create_osc(&ctx, MUSIC_NOTES[0], OscillatorType::Triangle) else {
            log::warn!("Could not create music voice");
            return;
        };
        let t = ctx.current_time();
        gain.gain().set_value_at_time(self.music_volume * 0.15, t).ok();
        if osc.start().is_err() {
            log::warn!("Music playback refused");
            return;
        }
        self.music = Some(MusicVoice {
            osc,
            gain,
            scheduled_until: t,
            next_note: 0,
        });
        self.update();
    }

    /// Keep the music loop scheduled ahead and forget finished cues
    ///
    /// Call once per frame.
    pub fn update(&mut self) {
        let Some(ctx) = &self.ctx else { return };
        let now = ctx.current_time();

        self.voices.retain(|(_, end)| *end > now);

        if let Some(music) = &mut self.music {
            // Clock may have run ahead while the tab was suspended
            if music.scheduled_until < now {
                music.scheduled_until = now;
            }
            while music.scheduled_until < now + MUSIC_LOOKAHEAD {
                let freq = MUSIC_NOTES[music.next_note % MUSIC_NOTES.len()];
                music
                    .osc
                    .frequency()
                    .set_value_at_time(freq, music.scheduled_until)
                    .ok();
                music.scheduled_until += MUSIC_BEAT;
                music.next_note += 1;
            }
        }
    }

    fn stop_music(&mut self) {
        if let Some(music) = self.music.take() {
            music.osc.stop().ok();
            music.gain.disconnect().ok();
        }
    }

    /// Silence the music and every cue still sounding
    pub fn stop_all(&mut self) {
        self.stop_music();
        for (osc, _) in self.voices.drain(..) {
            osc.stop().ok();
        }
    }

    // === Sound generators ===

    fn track(&mut self, osc: OscillatorNode, end: f64) {
        if osc.start().is_ok() && osc.stop_with_when(end).is_ok() {
            self.voices.push((osc, end));
        }
    }

    /// Impulse - quick rising chirp
    fn play_impulse(&mut self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = create_osc(ctx, 400.0, OscillatorType::Sine) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.15, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.001, t + 0.12)
            .ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(800.0, t + 0.08)
            .ok();

        self.track(osc, t + 0.12);
    }

    /// Win - ascending major arpeggio
    fn play_win(&mut self, ctx: &AudioContext, vol: f32) {
        const NOTES: [f32; 4] = [523.25, 659.25, 783.99, 1046.5];
        let t = ctx.current_time();

        for (i, freq) in NOTES.iter().enumerate() {
            let Some((osc, gain)) = create_osc(ctx, *freq, OscillatorType::Triangle) else {
                continue;
            };
            let start = t + i as f64 * 0.12;
            let len = if i == NOTES.len() - 1 { 0.6 } else { 0.15 };

            gain.gain().set_value_at_time(0.0, t).ok();
            gain.gain().set_value_at_time(vol * 0.3, start).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.001, start + len)
                .ok();

            if osc.start_with_when(start).is_ok() && osc.stop_with_when(start + len).is_ok() {
                self.voices.push((osc, start + len));
            }
        }
    }

    /// Lose - falling sawtooth
    fn play_lose(&mut self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = create_osc(ctx, 400.0, OscillatorType::Sawtooth) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.15, t).ok();
        gain.gain().linear_ramp_to_value_at_time(0.0, t + 0.5).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(80.0, t + 0.4)
            .ok();

        self.track(osc, t + 0.5);
    }
}

/// Create an oscillator routed through its own gain node
fn create_osc(
    ctx: &AudioContext,
    freq: f32,
    osc_type: OscillatorType,
) -> Option<(OscillatorNode, GainNode)> {
    let osc = ctx.create_oscillator().ok()?;
    let gain = ctx.create_gain().ok()?;

    osc.set_type(osc_type);
    osc.frequency().set_value(freq);
    osc.connect_with_audio_node(&gain).ok()?;
    gain.connect_with_audio_node(&ctx.destination()).ok()?;

    Some((osc, gain))
}
