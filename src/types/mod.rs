pub mod playback_state;
pub mod track;
