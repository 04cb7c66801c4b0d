// Composer configuration.
//
// `ComposerConfig` gathers every knob the `generate` binary exposes: genre,
// complexity, melody strategy, key, vocal range, grid resolution, seed, and
// optionally an explicit song template and progression style. It is loaded
// from JSON; every field has a default so partial files work.
//
// `build_song` turns a config into a `SongState` plus the chosen style. That
// is the only place a progression style is drawn at random, so a fixed seed
// (or a fixed `style_index`) reproduces the whole song.
//
// See also: `song.rs` for `SongTemplate::standard`, `progression.rs` for the
// style library, `main.rs` for flag overrides applied on top of a file.

use crate::error::{MusicError, MusicResult};
use crate::melody::MelodyStrategy;
use crate::progression::{ProgressionStyle, pick_style, styles_for};
use crate::song::{Complexity, Genre, STEPS_PER_BAR, SongState, SongTemplate};
use crate::theory::{ScaleKind, VocalRange};
use serde::{Deserialize, Serialize};
use songweaver_prng::RandomSource;
use std::path::Path;

/// Everything needed to compose a song.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    pub genre: Genre,
    pub complexity: Complexity,
    pub melody_strategy: MelodyStrategy,
    pub vocal_range: VocalRange,
    /// Key root, 0 = C through 11 = B.
    pub root_pitch_class: u8,
    /// Overrides the progression style's preferred scale.
    pub scale: Option<ScaleKind>,
    pub steps_per_bar: usize,
    /// `None` seeds from the clock.
    pub seed: Option<u64>,
    /// `None` uses the genre's standard template.
    pub template: Option<SongTemplate>,
    /// Index into the genre's style list; `None` picks one at random.
    pub style_index: Option<usize>,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        ComposerConfig {
            genre: Genre::Pop,
            complexity: Complexity::Medium,
            melody_strategy: MelodyStrategy::Smooth,
            vocal_range: VocalRange::Tenor,
            root_pitch_class: 0,
            scale: None,
            steps_per_bar: STEPS_PER_BAR,
            seed: None,
            template: None,
            style_index: None,
        }
    }
}

impl ComposerConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> MusicResult<Self> {
        let config: ComposerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: &Path) -> MusicResult<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> MusicResult<()> {
        if self.steps_per_bar == 0 {
            return Err(MusicError::InvalidConfig(
                "steps_per_bar must be at least 1".to_string(),
            ));
        }
        if self.root_pitch_class > 11 {
            return Err(MusicError::InvalidConfig(format!(
                "root_pitch_class {} is not in 0..=11",
                self.root_pitch_class
            )));
        }
        if let Some(index) = self.style_index {
            let count = styles_for(self.genre).len();
            if index >= count {
                return Err(MusicError::InvalidConfig(format!(
                    "style_index {index} out of range; {} has {count} styles",
                    self.genre.name()
                )));
            }
        }
        Ok(())
    }

    /// The template to expand, with zero-length sections dropped.
    pub fn song_template(&self) -> SongTemplate {
        let mut template = self
            .template
            .clone()
            .unwrap_or_else(|| SongTemplate::standard(self.genre));
        template.sections.retain(|run| {
            if run.length_in_bars == 0 {
                log::debug!("dropping zero-length {:?} section", run.section);
            }
            run.length_in_bars > 0
        });
        template
    }

    /// Progression style for this config: the configured index, or a random
    /// draw from the genre's styles.
    pub fn style<R: RandomSource + ?Sized>(&self, rng: &mut R) -> &'static ProgressionStyle {
        let styles = styles_for(self.genre);
        match self.style_index.and_then(|i| styles.get(i)) {
            Some(style) => style,
            None => pick_style(self.genre, rng),
        }
    }

    /// Build the song state and report which style shaped it.
    pub fn build_song<R: RandomSource + ?Sized>(
        &self,
        rng: &mut R,
    ) -> (SongState, &'static ProgressionStyle) {
        let style = self.style(rng);
        let scale = self.scale.unwrap_or(style.preferred_scale);
        let mut state = SongState::from_template(
            &self.song_template(),
            self.root_pitch_class,
            scale,
            style,
            self.vocal_range,
        );
        state.steps_per_bar = self.steps_per_bar.max(1);
        (state, style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::{SectionSpec, SectionType};
    use songweaver_prng::SongRng;

    #[test]
    fn default_config_serializes() {
        let config = ComposerConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let restored: ComposerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = ComposerConfig::from_json(
            r#"{ "genre": "Techno", "melody_strategy": "Markov", "seed": 42 }"#,
        )
        .unwrap();
        assert_eq!(config.genre, Genre::Techno);
        assert_eq!(config.melody_strategy, MelodyStrategy::Markov);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.steps_per_bar, STEPS_PER_BAR);
        assert_eq!(config.vocal_range, VocalRange::Tenor);
    }

    #[test]
    fn bad_values_are_rejected() {
        let zero_steps = ComposerConfig::from_json(r#"{ "steps_per_bar": 0 }"#);
        assert!(matches!(zero_steps, Err(MusicError::InvalidConfig(_))));
        let bad_root = ComposerConfig::from_json(r#"{ "root_pitch_class": 12 }"#);
        assert!(matches!(bad_root, Err(MusicError::InvalidConfig(_))));
        let bad_style = ComposerConfig::from_json(r#"{ "genre": "Pop", "style_index": 99 }"#);
        assert!(matches!(bad_style, Err(MusicError::InvalidConfig(_))));
        let not_json = ComposerConfig::from_json("{ genre: ");
        assert!(matches!(not_json, Err(MusicError::Json(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = ComposerConfig::load(Path::new("/nonexistent/songweaver.json"));
        assert!(matches!(result, Err(MusicError::Io(_))));
    }

    #[test]
    fn zero_length_sections_are_dropped() {
        let config = ComposerConfig {
            template: Some(SongTemplate {
                genre: Genre::Pop,
                bpm: 100,
                sections: vec![
                    SectionSpec::new(SectionType::Verse, 4),
                    SectionSpec::new(SectionType::Bridge, 0),
                    SectionSpec::new(SectionType::Chorus, 4),
                ],
            }),
            ..Default::default()
        };
        let template = config.song_template();
        assert_eq!(template.sections.len(), 2);
        assert_eq!(template.total_bars(), 8);
    }

    #[test]
    fn fixed_style_index_and_scale_override() {
        let config = ComposerConfig {
            genre: Genre::LoFi,
            style_index: Some(0),
            scale: Some(ScaleKind::Minor),
            root_pitch_class: 2,
            steps_per_bar: 8,
            ..Default::default()
        };
        let (state, style) = config.build_song(&mut SongRng::new(1));
        assert_eq!(style.name, styles_for(Genre::LoFi)[0].name);
        assert_eq!(state.scale, ScaleKind::Minor);
        assert_eq!(state.root_pitch_class, 2);
        assert_eq!(state.steps_per_bar, 8);
        assert_eq!(
            state.total_bars(),
            SongTemplate::standard(Genre::LoFi).total_bars()
        );
    }

    #[test]
    fn preferred_scale_used_without_override() {
        let config = ComposerConfig {
            genre: Genre::Rock,
            style_index: Some(0),
            ..Default::default()
        };
        let (state, style) = config.build_song(&mut SongRng::new(1));
        assert_eq!(state.scale, style.preferred_scale);
    }
}
