//! Background track behind a small capability interface.
//!
//! Everything outside this module sees the track only through
//! [`AudioLinkState`] and [`AudioLinkEvent`] messages; toggling goes through
//! [`ToggleAudio`].

use super::GlobeScene;
use super::flash::{Flash, FlashKind};
use crate::AppScreen;
use crate::config::AudioSettings;
use app::LOG_AUDIO;
use bevy::audio::{AudioSinkPlayback, Volume};
use bevy::prelude::*;
use settings::SettingsArc;

pub struct AudioLinkPlugin;

impl Plugin for AudioLinkPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<ToggleAudio>()
            .add_message::<AudioLinkEvent>()
            .init_resource::<AudioLinkState>()
            .add_systems(OnEnter(AppScreen::Globe), (reset_link, spawn_track))
            .add_systems(
                Update,
                (toggle_track, watch_track, react_to_link)
                    .chain()
                    .run_if(in_state(AppScreen::Globe)),
            );
    }
}

/// What the visual layer needs from an audio player.
pub trait AudioLink {
    fn is_ready(&self) -> bool;
    fn is_playing(&self) -> bool;
    fn toggle(&mut self);
    fn set_volume(&mut self, volume: f32);

    /// Playback ran to the end of the track.
    fn is_finished(&self) -> bool {
        false
    }
}

/// [`AudioLink`] over the sink Bevy attaches once the track is decoded.
pub struct SinkAudioLink<'a> {
    sink: Option<Mut<'a, AudioSink>>,
}

impl<'a> SinkAudioLink<'a> {
    pub fn new(sink: Option<Mut<'a, AudioSink>>) -> Self {
        Self { sink }
    }
}

impl AudioLink for SinkAudioLink<'_> {
    fn is_ready(&self) -> bool {
        self.sink.is_some()
    }

    fn is_playing(&self) -> bool {
        self.sink
            .as_ref()
            .is_some_and(|sink| !sink.is_paused() && !sink.empty())
    }

    fn toggle(&mut self) {
        if let Some(sink) = &self.sink {
            sink.toggle_playback();
        }
    }

    fn set_volume(&mut self, volume: f32) {
        if let Some(sink) = &mut self.sink {
            sink.set_volume(Volume::Linear(volume.clamp(0.0, 1.0)));
        }
    }

    fn is_finished(&self) -> bool {
        self.sink.as_ref().is_some_and(|sink| sink.empty())
    }
}

#[derive(Message, Debug, Default, Clone, Copy)]
pub struct ToggleAudio;

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioLinkEvent {
    Ready,
    Play,
    Pause,
    Finish,
}

/// Last observed link state; the visualizer reads `playing`.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AudioLinkState {
    pub ready: bool,
    pub playing: bool,
}

/// Flips playback if the link is ready. Returns whether anything happened.
pub fn toggle_link(link: &mut impl AudioLink) -> bool {
    if !link.is_ready() {
        return false;
    }
    link.toggle();
    true
}

/// Diffs the link against the last observed state, in the order the
/// notifications would arrive.
pub fn poll_link(link: &impl AudioLink, state: &mut AudioLinkState) -> Vec<AudioLinkEvent> {
    let mut events = Vec::with_capacity(2);
    let ready = link.is_ready();
    if ready && !state.ready {
        events.push(AudioLinkEvent::Ready);
    }
    state.ready = ready;

    let playing = link.is_playing();
    if playing != state.playing {
        events.push(match (playing, link.is_finished()) {
            (true, _) => AudioLinkEvent::Play,
            (false, true) => AudioLinkEvent::Finish,
            (false, false) => AudioLinkEvent::Pause,
        });
    }
    state.playing = playing;
    events
}

#[derive(Component)]
struct AudioTrack;

fn reset_link(mut state: ResMut<AudioLinkState>) {
    *state = AudioLinkState::default();
}

fn track(asset_server: &AssetServer, settings: &AudioSettings) -> impl Bundle {
    (
        AudioPlayer::new(asset_server.load(settings.track.clone())),
        PlaybackSettings::ONCE.paused(),
        AudioTrack,
        GlobeScene,
        Name::new("Audio Track"),
    )
}

fn spawn_track(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    settings: Res<SettingsArc<AudioSettings>>,
) {
    commands.spawn(track(&asset_server, &settings));
}

fn toggle_track(
    mut toggles: MessageReader<ToggleAudio>,
    mut sinks: Query<&mut AudioSink, With<AudioTrack>>,
) {
    for _ in toggles.read() {
        let mut link = SinkAudioLink::new(sinks.single_mut().ok());
        if !toggle_link(&mut link) {
            debug!(target: LOG_AUDIO, "Audio link not ready, toggle ignored");
        }
    }
}

fn watch_track(
    mut commands: Commands,
    mut state: ResMut<AudioLinkState>,
    mut sinks: Query<(Entity, &mut AudioSink), With<AudioTrack>>,
    mut events: MessageWriter<AudioLinkEvent>,
    asset_server: Res<AssetServer>,
    settings: Res<SettingsArc<AudioSettings>>,
) {
    let (entity, sink) = match sinks.single_mut() {
        Ok((entity, sink)) => (Some(entity), Some(sink)),
        Err(_) => (None, None),
    };
    let link = SinkAudioLink::new(sink);
    let observed = poll_link(&link, &mut state);
    let finished = observed.contains(&AudioLinkEvent::Finish);
    events.write_batch(observed);

    // A finished sink cannot be rewound; queue a fresh paused copy.
    if let (true, Some(entity)) = (finished, entity) {
        commands.entity(entity).despawn();
        state.ready = false;
        commands.spawn(track(&asset_server, &settings));
    }
}

/// Volume on ready, a flash once playback starts.
pub fn react_to_event(
    event: AudioLinkEvent,
    link: &mut impl AudioLink,
    volume: f32,
) -> Option<Flash> {
    match event {
        AudioLinkEvent::Ready => {
            link.set_volume(volume);
            None
        }
        AudioLinkEvent::Play => Some(Flash(FlashKind::Single)),
        AudioLinkEvent::Pause | AudioLinkEvent::Finish => None,
    }
}

fn react_to_link(
    mut events: MessageReader<AudioLinkEvent>,
    mut sinks: Query<&mut AudioSink, With<AudioTrack>>,
    mut flash: MessageWriter<Flash>,
    settings: Res<SettingsArc<AudioSettings>>,
) {
    for event in events.read() {
        info!(target: LOG_AUDIO, "Audio link {event:?}");
        let mut link = SinkAudioLink::new(sinks.single_mut().ok());
        if let Some(request) = react_to_event(*event, &mut link, settings.volume) {
            flash.write(request);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeLink {
        ready: bool,
        playing: bool,
        finished: bool,
        volume: Option<f32>,
        toggles: usize,
    }

    impl AudioLink for FakeLink {
        fn is_ready(&self) -> bool {
            self.ready
        }

        fn is_playing(&self) -> bool {
            self.playing
        }

        fn toggle(&mut self) {
            self.toggles += 1;
            self.playing = !self.playing;
        }

        fn set_volume(&mut self, volume: f32) {
            self.volume = Some(volume);
        }

        fn is_finished(&self) -> bool {
            self.finished
        }
    }

    #[test]
    fn toggle_waits_for_ready() {
        let mut link = FakeLink::default();
        assert!(!toggle_link(&mut link));
        assert_eq!(link.toggles, 0);

        link.ready = true;
        assert!(toggle_link(&mut link));
        assert!(link.is_playing());
    }

    #[test]
    fn polling_reports_each_transition_once() {
        let mut link = FakeLink::default();
        let mut state = AudioLinkState::default();
        assert!(poll_link(&link, &mut state).is_empty());

        link.ready = true;
        assert_eq!(poll_link(&link, &mut state), vec![AudioLinkEvent::Ready]);
        assert!(poll_link(&link, &mut state).is_empty());

        toggle_link(&mut link);
        assert_eq!(poll_link(&link, &mut state), vec![AudioLinkEvent::Play]);
        assert!(state.playing);

        toggle_link(&mut link);
        assert_eq!(poll_link(&link, &mut state), vec![AudioLinkEvent::Pause]);

        toggle_link(&mut link);
        poll_link(&link, &mut state);
        link.playing = false;
        link.finished = true;
        assert_eq!(poll_link(&link, &mut state), vec![AudioLinkEvent::Finish]);
        assert!(!state.playing);
    }

    #[test]
    fn ready_and_play_can_arrive_together() {
        let link = FakeLink {
            ready: true,
            playing: true,
            ..default()
        };
        let mut state = AudioLinkState::default();
        assert_eq!(
            poll_link(&link, &mut state),
            vec![AudioLinkEvent::Ready, AudioLinkEvent::Play]
        );
    }

    #[test]
    fn ready_applies_the_configured_volume_and_play_flashes() {
        let volume = AudioSettings::default().volume;
        let mut link = FakeLink {
            ready: true,
            ..default()
        };

        assert_eq!(react_to_event(AudioLinkEvent::Ready, &mut link, volume), None);
        assert_eq!(link.volume, Some(0.6));

        link.volume = None;
        assert_eq!(
            react_to_event(AudioLinkEvent::Play, &mut link, volume),
            Some(Flash(FlashKind::Single))
        );
        for quiet in [AudioLinkEvent::Pause, AudioLinkEvent::Finish] {
            assert_eq!(react_to_event(quiet, &mut link, volume), None);
        }
        assert_eq!(link.volume, None, "only readiness touches the volume");
        assert_eq!(link.toggles, 0);
    }
}
