//! Chat assistant: keyword commands that steer the camera and a pluggable
//! backend for everything else.

use super::GlobeScene;
use super::camera::FocusRequest;
use super::flash::{Flash, FlashKind};
use crate::AppScreen;
use crate::ui::{ACCENT, TEXT, WARNING, label, themed_button};
use app::LOG_CHAT;
use bevy::input::keyboard::{Key, KeyboardInput};
use bevy::prelude::*;
use std::time::Duration;
use thiserror::Error;

pub struct ChatPlugin;

impl Plugin for ChatPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<ToggleChat>()
            .add_message::<SendChat>()
            .init_resource::<ChatSession>()
            .insert_resource(ChatAssistant::new(PlaceholderBackend))
            .add_systems(OnEnter(AppScreen::Globe), (reset_session, spawn_panel).chain())
            .add_systems(
                Update,
                (
                    toggle_panel,
                    handle_panel_buttons,
                    capture_chat_keys,
                    deliver_replies,
                    send_messages,
                    refresh_panel.run_if(resource_changed::<ChatSession>),
                )
                    .chain()
                    .run_if(in_state(AppScreen::Globe)),
            );
    }
}

pub const GREETING: &str =
    "Hello! I am your Global Connect guide. Ask me to \"Show Europe\" or \"Analyze US Networks\".";
pub const OFFLINE_REPLY: &str = "Systems offline. Check API Protocol.";
/// Fake retrieval time after a camera command.
pub const COMMAND_DELAY: Duration = Duration::from_millis(1200);
const VISIBLE_MESSAGES: usize = 8;

struct CommandEntry {
    keywords: &'static [&'static str],
    target: Option<Vec3>,
    reply: &'static str,
}

const COMMANDS: &[CommandEntry] = &[
    CommandEntry {
        keywords: &["europe", "germany", "france"],
        target: Some(Vec3::new(2.5, 5.0, 4.0)),
        reply: "Focusing optics on European Sector...",
    },
    CommandEntry {
        keywords: &["usa", "america", "states"],
        target: Some(Vec3::new(-4.0, 3.0, 6.0)),
        reply: "Re-aligning satellites to North America...",
    },
    CommandEntry {
        keywords: &["asia", "china", "japan"],
        target: Some(Vec3::new(-6.0, 3.0, -4.0)),
        reply: "Scanning Asian Network Hubs...",
    },
    CommandEntry {
        keywords: &["africa"],
        target: Some(Vec3::new(2.0, -1.0, 7.0)),
        reply: "Targeting African Continent...",
    },
    CommandEntry {
        keywords: &["global", "world"],
        target: None,
        reply: "Resetting to global orbital view.",
    },
];

/// A recognized camera command. `target: None` resets to the orbital view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusCommand {
    pub target: Option<Vec3>,
    pub reply: &'static str,
}

/// First table entry with a keyword contained in `text`, ignoring case.
pub fn parse_command(text: &str) -> Option<FocusCommand> {
    let lower = text.to_lowercase();
    COMMANDS
        .iter()
        .find(|entry| entry.keywords.iter().any(|keyword| lower.contains(keyword)))
        .map(|entry| FocusCommand {
            target: entry.target,
            reply: entry.reply,
        })
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat backend unavailable: {0}")]
    Unavailable(String),
}

/// Answers free text that is not a camera command.
pub trait ChatBackend: Send + Sync + 'static {
    fn respond(&self, prompt: &str) -> Result<String, ChatError>;
}

/// Stand-in until a language model is wired up.
pub struct PlaceholderBackend;

impl ChatBackend for PlaceholderBackend {
    fn respond(&self, _prompt: &str) -> Result<String, ChatError> {
        Ok("AI Chat system initializing... (Google AI integration pending)".to_string())
    }
}

#[derive(Resource)]
pub struct ChatAssistant(Box<dyn ChatBackend>);

impl ChatAssistant {
    pub fn new(backend: impl ChatBackend) -> Self {
        Self(Box::new(backend))
    }

    pub fn backend(&self) -> &dyn ChatBackend {
        self.0.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }
}

#[derive(Debug)]
struct PendingReply {
    timer: Timer,
    text: String,
}

#[derive(Resource, Debug)]
pub struct ChatSession {
    pub open: bool,
    pub input: String,
    messages: Vec<ChatMessage>,
    pending: Option<PendingReply>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self {
            open: false,
            input: String::new(),
            messages: vec![ChatMessage::assistant(GREETING)],
            pending: None,
        }
    }
}

impl ChatSession {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_processing(&self) -> bool {
        self.pending.is_some()
    }

    /// Sends the current input. Returns `None` when nothing was sent,
    /// otherwise the camera command it carried, if any.
    pub fn send(&mut self, backend: &dyn ChatBackend) -> Option<Option<FocusCommand>> {
        let text = self.input.trim().to_string();
        if text.is_empty() || self.is_processing() {
            return None;
        }
        self.input.clear();

        let command = parse_command(&text);
        let (delay, reply) = match command {
            Some(command) => (COMMAND_DELAY, format!("{} Data retrieved.", command.reply)),
            None => (
                Duration::ZERO,
                backend.respond(&text).unwrap_or_else(|err| {
                    warn!(target: LOG_CHAT, "{err}");
                    OFFLINE_REPLY.to_string()
                }),
            ),
        };

        self.messages.push(ChatMessage {
            role: ChatRole::User,
            text,
        });
        self.pending = Some(PendingReply {
            timer: Timer::new(delay, TimerMode::Once),
            text: reply,
        });
        Some(command)
    }

    /// Delivers the pending reply once its delay has passed.
    pub fn tick(&mut self, delta: Duration) -> bool {
        let Some(pending) = &mut self.pending else {
            return false;
        };
        if !pending.timer.tick(delta).just_finished() {
            return false;
        }
        let text = std::mem::take(&mut pending.text);
        self.pending = None;
        self.messages.push(ChatMessage::assistant(text));
        true
    }
}

#[derive(Message, Debug, Default, Clone, Copy)]
pub struct ToggleChat;

#[derive(Message, Debug, Default, Clone, Copy)]
pub struct SendChat;

#[derive(Component)]
struct ChatPanel;

#[derive(Component)]
struct ChatLog;

#[derive(Component)]
struct ChatInputLine;

#[derive(Component, Clone, Copy)]
enum ChatButton {
    Close,
    Send,
}

fn reset_session(mut session: ResMut<ChatSession>) {
    *session = ChatSession::default();
}

fn spawn_panel(mut commands: Commands) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                right: Val::Px(24.0),
                bottom: Val::Px(280.0),
                width: Val::Px(360.0),
                flex_direction: FlexDirection::Column,
                border: UiRect::all(Val::Px(1.0)),
                display: Display::None,
                ..default()
            },
            BackgroundColor(Color::srgba(0.06, 0.09, 0.16, 0.9)),
            BorderColor::all(Color::srgba(1.0, 1.0, 1.0, 0.1)),
            BorderRadius::all(Val::Px(16.0)),
            ChatPanel,
            GlobeScene,
            Name::new("Chat Panel"),
        ))
        .with_children(|panel| {
            panel
                .spawn((
                    Node {
                        justify_content: JustifyContent::SpaceBetween,
                        align_items: AlignItems::Center,
                        padding: UiRect::all(Val::Px(12.0)),
                        ..default()
                    },
                    BackgroundColor(Color::srgba(0.12, 0.16, 0.23, 0.8)),
                ))
                .with_children(|header| {
                    header.spawn(label("SYSTEM GUIDE", 14.0, TEXT));
                    header
                        .spawn((themed_button(Val::Px(28.0), Val::Px(28.0)), ChatButton::Close))
                        .with_children(|button| {
                            button.spawn(label("X", 14.0, TEXT));
                        });
                });

            panel.spawn((
                Node {
                    height: Val::Px(256.0),
                    flex_direction: FlexDirection::Column,
                    justify_content: JustifyContent::FlexEnd,
                    row_gap: Val::Px(8.0),
                    padding: UiRect::all(Val::Px(12.0)),
                    overflow: Overflow::clip(),
                    ..default()
                },
                ChatLog,
            ));

            panel
                .spawn(Node {
                    column_gap: Val::Px(8.0),
                    padding: UiRect::all(Val::Px(10.0)),
                    align_items: AlignItems::Center,
                    ..default()
                })
                .with_children(|row| {
                    row.spawn((
                        Node {
                            flex_grow: 1.0,
                            padding: UiRect::axes(Val::Px(12.0), Val::Px(8.0)),
                            ..default()
                        },
                        BackgroundColor(Color::srgba(0.01, 0.02, 0.05, 0.5)),
                        BorderRadius::all(Val::Px(10.0)),
                    ))
                    .with_children(|field| {
                        field.spawn((input_text(""), ChatInputLine));
                    });
                    row.spawn((themed_button(Val::Px(56.0), Val::Px(34.0)), ChatButton::Send))
                        .with_children(|button| {
                            button.spawn(label("SEND", 12.0, ACCENT));
                        });
                });
        });
}

fn input_text(input: &str) -> impl Bundle {
    if input.is_empty() {
        label(String::from("Enter command..."), 13.0, TEXT.with_alpha(0.4))
    } else {
        label(format!("{input}_"), 13.0, TEXT)
    }
}

fn toggle_panel(mut toggles: MessageReader<ToggleChat>, mut session: ResMut<ChatSession>) {
    if toggles.read().count() % 2 == 1 {
        session.open = !session.open;
        debug!(target: LOG_CHAT, "Chat panel {}", if session.open { "opened" } else { "closed" });
    }
}

fn handle_panel_buttons(
    buttons: Query<(&Interaction, &ChatButton), Changed<Interaction>>,
    mut session: ResMut<ChatSession>,
    mut send: MessageWriter<SendChat>,
) {
    for (interaction, button) in &buttons {
        if *interaction != Interaction::Pressed {
            continue;
        }
        match button {
            ChatButton::Close => session.open = false,
            ChatButton::Send => {
                send.write(SendChat);
            }
        }
    }
}

fn capture_chat_keys(
    mut keys: MessageReader<KeyboardInput>,
    mut session: ResMut<ChatSession>,
    mut send: MessageWriter<SendChat>,
) {
    if !session.open {
        keys.clear();
        return;
    }
    for event in keys.read() {
        if !event.state.is_pressed() {
            continue;
        }
        match &event.logical_key {
            Key::Character(text) => {
                session.input.extend(text.chars().filter(|ch| !ch.is_control()));
            }
            Key::Space => session.input.push(' '),
            Key::Backspace => {
                session.input.pop();
            }
            Key::Enter => {
                send.write(SendChat);
            }
            _ => {}
        }
    }
}

fn deliver_replies(time: Res<Time>, mut session: ResMut<ChatSession>) {
    // Avoid tripping change detection every frame while idle.
    if !session.is_processing() {
        return;
    }
    if session.tick(time.delta()) {
        debug!(target: LOG_CHAT, "Assistant replied");
    }
}

fn send_messages(
    mut requests: MessageReader<SendChat>,
    mut session: ResMut<ChatSession>,
    assistant: Res<ChatAssistant>,
    mut focus: ResMut<FocusRequest>,
    mut flash: MessageWriter<Flash>,
) {
    for _ in requests.read() {
        let Some(command) = session.send(assistant.backend()) else {
            continue;
        };
        flash.write(Flash(FlashKind::Single));
        if let Some(command) = command {
            info!(target: LOG_CHAT, "Camera command: {}", command.reply);
            focus.0 = command.target;
        }
    }
}

fn refresh_panel(
    mut commands: Commands,
    session: Res<ChatSession>,
    mut panels: Query<&mut Node, With<ChatPanel>>,
    logs: Query<Entity, With<ChatLog>>,
    inputs: Query<Entity, With<ChatInputLine>>,
) {
    for mut node in &mut panels {
        node.display = if session.open {
            Display::Flex
        } else {
            Display::None
        };
    }

    for input in &inputs {
        commands.entity(input).insert(input_text(&session.input));
    }

    let start = session.messages().len().saturating_sub(VISIBLE_MESSAGES);
    for log in &logs {
        commands.entity(log).despawn_related::<Children>();
        commands.entity(log).with_children(|log| {
            for message in &session.messages()[start..] {
                spawn_bubble(log, message);
            }
            if session.is_processing() {
                log.spawn(label("PROCESSING...", 10.0, WARNING));
            }
        });
    }
}

fn spawn_bubble(log: &mut ChildSpawnerCommands, message: &ChatMessage) {
    let (align, fill) = match message.role {
        ChatRole::User => (AlignSelf::FlexEnd, Color::srgba(0.45, 0.25, 0.85, 0.9)),
        ChatRole::Assistant => (AlignSelf::FlexStart, Color::srgba(0.2, 0.25, 0.33, 0.6)),
    };
    log.spawn((
        Node {
            align_self: align,
            max_width: Val::Percent(85.0),
            padding: UiRect::axes(Val::Px(12.0), Val::Px(8.0)),
            ..default()
        },
        BackgroundColor(fill),
        BorderRadius::all(Val::Px(12.0)),
    ))
    .with_children(|bubble| {
        bubble.spawn(label(message.text.clone(), 13.0, TEXT));
    });
}
