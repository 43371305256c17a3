mod clock_player;

pub use clock_player::ClockPlayerHandle;
