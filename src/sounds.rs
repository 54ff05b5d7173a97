use std::collections::HashMap;

use wasm_bindgen::JsCast;
use web_sys::HtmlAudioElement;

use lastspike_core::{CommitCue, PhaseKind, TrackChangeKind};

const DEFAULT_VOLUME: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Sound {
    Dice,
    Slide1,
    Slide2,
    Slide3,
    Slide4,
    Build,
    Riot,
    Cash,
    Bell,
}

impl Sound {
    fn src(self) -> &'static str {
        match self {
            Sound::Dice => "/sounds/dice.mp3",
            Sound::Slide1 => "/sounds/slide1.mp3",
            Sound::Slide2 => "/sounds/slide2.mp3",
            Sound::Slide3 => "/sounds/slide3.mp3",
            Sound::Slide4 => "/sounds/slide4.mp3",
            Sound::Build => "/sounds/build.mp3",
            Sound::Riot => "/sounds/riot.mp3",
            Sound::Cash => "/sounds/cash.mp3",
            Sound::Bell => "/sounds/bell.mp3",
        }
    }

    const ALL: [Sound; 9] = [
        Sound::Dice,
        Sound::Slide1,
        Sound::Slide2,
        Sound::Slide3,
        Sound::Slide4,
        Sound::Build,
        Sound::Riot,
        Sound::Cash,
        Sound::Bell,
    ];

    const SLIDES: [Sound; 4] = [Sound::Slide1, Sound::Slide2, Sound::Slide3, Sound::Slide4];
}

/// Owns every preloaded audio element. Playback clones the element so the
/// same sound can overlap itself without cutting off.
pub(crate) struct SoundBank {
    elements: HashMap<Sound, HtmlAudioElement>,
    slide_cursor: usize,
}

impl SoundBank {
    pub(crate) fn new() -> Self {
        let mut elements = HashMap::new();
        for sound in Sound::ALL {
            if let Ok(element) = HtmlAudioElement::new_with_src(sound.src()) {
                element.set_volume(DEFAULT_VOLUME);
                element.load();
                elements.insert(sound, element);
            }
        }
        Self {
            elements,
            slide_cursor: 0,
        }
    }

    pub(crate) fn play(&self, sound: Sound) {
        let Some(original) = self.elements.get(&sound) else {
            gloo::console::warn!("sound not loaded", sound.src());
            return;
        };
        let Ok(clone) = original.clone_node() else {
            return;
        };
        let Ok(audio) = clone.dyn_into::<HtmlAudioElement>() else {
            return;
        };
        audio.set_volume(original.volume());
        // Autoplay rejection before the first user gesture is expected.
        let _ = audio.play();
    }

    /// Token hops rotate through the slide samples.
    pub(crate) fn play_slide(&mut self) {
        let sound = Sound::SLIDES[self.slide_cursor % Sound::SLIDES.len()];
        self.slide_cursor = self.slide_cursor.wrapping_add(1);
        self.play(sound);
    }

    pub(crate) fn on_phase(&mut self, kind: &PhaseKind) {
        match kind {
            PhaseKind::DiceReveal { .. } => self.play(Sound::Dice),
            PhaseKind::TokenMove(_) => self.play_slide(),
            PhaseKind::Commit(_) => {}
        }
    }

    pub(crate) fn on_cue(&mut self, cue: &CommitCue) {
        match cue {
            CommitCue::TrackChange(delta) => match delta.kind {
                TrackChangeKind::Built => self.play(Sound::Build),
                TrackChangeKind::Removed => self.play(Sound::Riot),
            },
            CommitCue::MoneyChange { .. } => self.play(Sound::Cash),
            CommitCue::TradeEvent(_) => self.play(Sound::Cash),
            CommitCue::PlayerRemoved(_) => {}
            CommitCue::GameOver => self.play(Sound::Bell),
        }
    }
}
