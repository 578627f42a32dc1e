use musico::mpris::{ControlCmd, MprisHandle};
use musico::playback::{PlaybackState, PlayerCmd};

/// Publish the full playback state to the media session.
pub fn update_mpris(mpris: &MprisHandle, state: &PlaybackState, playlist_len: usize) {
    mpris.set_track_metadata(state.current_track.as_ref());
    mpris.set_playback(state.status);
    mpris.set_position_ms(state.position_ms);

    let (can_next, can_prev) = match state.current_index {
        Some(i) => (i + 1 < playlist_len, i > 0),
        None => (false, false),
    };
    mpris.set_navigation(can_next, can_prev);
}

/// Translate a media-session request into a player command. `Quit` is handled
/// by the event loop and maps to `None`.
pub fn player_cmd(cmd: &ControlCmd) -> Option<PlayerCmd> {
    let cmd = match *cmd {
        ControlCmd::Quit => return None,
        ControlCmd::Play => PlayerCmd::Resume,
        ControlCmd::Pause => PlayerCmd::Pause,
        ControlCmd::PlayPause => PlayerCmd::Toggle,
        ControlCmd::Stop => PlayerCmd::Stop,
        ControlCmd::Next => PlayerCmd::Next,
        ControlCmd::Prev => PlayerCmd::Previous,
        ControlCmd::Seek(offset_us) => PlayerCmd::SeekBy(offset_us / 1000),
        ControlCmd::SetPosition(position_us) => {
            PlayerCmd::Seek(u64::try_from(position_us / 1000).unwrap_or(0))
        }
    };
    Some(cmd)
}
