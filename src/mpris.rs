use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use async_io::block_on;
use tracing::{debug, info, warn};
use zbus::object_server::SignalEmitter;
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::library::Track;
use crate::playback::PlayerStatus;

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";

/// Transport requests coming from the desktop media session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
    /// Relative seek in microseconds.
    Seek(i64),
    /// Absolute position in microseconds.
    SetPosition(i64),
}

#[derive(Debug, Default)]
struct SharedState {
    status: PlayerStatus,
    position_us: i64,
    can_go_next: bool,
    can_go_previous: bool,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    url: Option<String>,
    art_url: Option<String>,
    length_micros: Option<i64>,
    track_id: Option<OwnedObjectPath>,
}

fn lock(state: &Mutex<SharedState>) -> MutexGuard<'_, SharedState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Writes published MPRIS state. Property changes are announced on the bus
/// from the MPRIS thread.
pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
}

impl MprisHandle {
    /// A handle that is not attached to any bus.
    pub fn detached() -> Self {
        let (notify, _) = mpsc::channel();
        Self {
            state: Arc::new(Mutex::new(SharedState::default())),
            notify,
        }
    }

    pub fn set_track_metadata(&self, track: Option<&Track>) {
        {
            let mut s = lock(&self.state);
            match track {
                Some(t) => {
                    s.title = Some(t.title.clone());
                    s.artist = vec![t.artist.clone()];
                    s.album = Some(t.album.clone());
                    s.url = Some(file_url(&t.locator));
                    s.art_url = t
                        .thumbnail_path
                        .as_ref()
                        .map(|p| file_url(&p.to_string_lossy()));
                    s.length_micros = (t.duration_ms > 0).then(|| micros(t.duration_ms));
                    s.track_id =
                        OwnedObjectPath::try_from(format!("{OBJECT_PATH}/track/{}", t.id)).ok();
                }
                None => {
                    s.title = None;
                    s.artist.clear();
                    s.album = None;
                    s.url = None;
                    s.art_url = None;
                    s.length_micros = None;
                    s.track_id = None;
                }
            }
        }
        let _ = self.notify.send(());
    }

    pub fn set_playback(&self, status: PlayerStatus) {
        lock(&self.state).status = status;
        let _ = self.notify.send(());
    }

    pub fn set_navigation(&self, can_go_next: bool, can_go_previous: bool) {
        {
            let mut s = lock(&self.state);
            s.can_go_next = can_go_next;
            s.can_go_previous = can_go_previous;
        }
        let _ = self.notify.send(());
    }

    /// Position is polled by clients; no change signal is sent.
    pub fn set_position_ms(&self, position_ms: u64) {
        lock(&self.state).position_us = micros(position_ms);
    }
}

fn micros(ms: u64) -> i64 {
    i64::try_from(ms.saturating_mul(1000)).unwrap_or(i64::MAX)
}

fn file_url(path: &str) -> String {
    if path.contains("://") {
        path.to_string()
    } else {
        format!("file://{path}")
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
    identity: String,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {}

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> String {
        self.identity.clone()
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    fn seek(&self, offset: i64) {
        let _ = self.tx.send(ControlCmd::Seek(offset));
    }

    /// Ignored unless `track_id` names the current track.
    fn set_position(&self, track_id: ObjectPath<'_>, position: i64) {
        let current = lock(&self.state)
            .track_id
            .as_ref()
            .is_some_and(|id| id.as_str() == track_id.as_str());
        if current && position >= 0 {
            let _ = self.tx.send(ControlCmd::SetPosition(position));
        }
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        match lock(&self.state).status {
            PlayerStatus::Playing => "Playing",
            PlayerStatus::Paused => "Paused",
            PlayerStatus::Idle | PlayerStatus::Loaded => "Stopped",
        }
    }

    #[zbus(property(emits_changed_signal = "false"))]
    fn position(&self) -> i64 {
        lock(&self.state).position_us
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        lock(&self.state).track_id.is_some()
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        lock(&self.state).track_id.is_some()
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        lock(&self.state).track_id.is_some()
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        lock(&self.state).can_go_next
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        lock(&self.state).can_go_previous
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let s = lock(&self.state);
        let mut map = HashMap::new();

        if let Some(id) = s.track_id.as_ref() {
            put(&mut map, "mpris:trackid", Value::from(ObjectPath::clone(&**id)));
        }
        if let Some(title) = s.title.as_deref() {
            put(&mut map, "xesam:title", Value::from(title));
        }
        if !s.artist.is_empty() {
            put(&mut map, "xesam:artist", Value::from(s.artist.clone()));
        }
        if let Some(album) = s.album.as_deref() {
            put(&mut map, "xesam:album", Value::from(album));
        }
        if let Some(url) = s.url.as_deref() {
            put(&mut map, "xesam:url", Value::from(url));
        }
        if let Some(art) = s.art_url.as_deref() {
            put(&mut map, "mpris:artUrl", Value::from(art));
        }
        if let Some(len) = s.length_micros {
            put(&mut map, "mpris:length", Value::from(len));
        }
        map
    }
}

fn put(map: &mut HashMap<String, OwnedValue>, key: &str, value: Value<'_>) {
    if let Ok(v) = OwnedValue::try_from(value) {
        map.insert(key.to_string(), v);
    }
}

/// Register `org.mpris.MediaPlayer2.<identity>` on the session bus from a
/// background thread. Bus failures are logged; the returned handle still
/// accepts updates.
pub fn spawn_mpris(identity: &str, tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify, notify_rx) = mpsc::channel::<()>();

    let state_for_thread = state.clone();
    let identity = identity.to_string();
    let spawned = thread::Builder::new()
        .name("musico-mpris".into())
        .spawn(move || {
            let Some(connection) = block_on(register(&identity, tx, state_for_thread)) else {
                return;
            };
            info!(identity = %identity, "MPRIS service registered");
            announce_changes(&connection, notify_rx);
        });
    if let Err(e) = spawned {
        warn!(error = %e, "MPRIS: failed to start thread");
    }

    MprisHandle { state, notify }
}

async fn register(
    identity: &str,
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
) -> Option<Connection> {
    let connection = match Connection::session().await {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "MPRIS: failed to connect to session bus");
            return None;
        }
    };

    let bus_name = format!("org.mpris.MediaPlayer2.{identity}");
    if let Err(e) = connection.request_name(bus_name.as_str()).await {
        warn!(error = %e, name = %bus_name, "MPRIS: failed to acquire name");
        return None;
    }

    let object_server = connection.object_server();
    let root = RootIface {
        tx: tx.clone(),
        identity: identity.to_string(),
    };
    if let Err(e) = object_server.at(OBJECT_PATH, root).await {
        warn!(error = %e, "MPRIS: failed to register root iface");
        return None;
    }
    if let Err(e) = object_server.at(OBJECT_PATH, PlayerIface { tx, state }).await {
        warn!(error = %e, "MPRIS: failed to register player iface");
        return None;
    }

    Some(connection)
}

/// Emit `PropertiesChanged` after each burst of handle updates. Returns when
/// the handle is dropped.
fn announce_changes(connection: &Connection, notify_rx: Receiver<()>) {
    while notify_rx.recv().is_ok() {
        while notify_rx.try_recv().is_ok() {}
        if let Err(e) = block_on(emit_player_changed(connection)) {
            debug!(error = %e, "MPRIS: failed to emit property change");
        }
    }
}

async fn emit_player_changed(connection: &Connection) -> zbus::Result<()> {
    let iface_ref = connection
        .object_server()
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await?;
    let iface = iface_ref.get().await;
    let emitter: &SignalEmitter<'_> = iface_ref.signal_emitter();
    iface.playback_status_changed(emitter).await?;
    iface.metadata_changed(emitter).await?;
    iface.can_go_next_changed(emitter).await?;
    iface.can_go_previous_changed(emitter).await?;
    Ok(())
}
