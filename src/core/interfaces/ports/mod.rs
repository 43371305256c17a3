mod player_handle;

pub use player_handle::PlayerHandle;
