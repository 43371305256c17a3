use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::core::interfaces::ports::PlayerHandle;

/// Identity of one pool entry, used to key pending captures. Keying by value
/// avoids the reference-identity comparisons the busy map would otherwise
/// need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(Uuid);

impl SlotId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full = self.0.simple().to_string();
        write!(f, "{}", &full[..8])
    }
}

/// Playback state remembered when a slot is rotated out, so it can pick up
/// where it left off when it becomes current again.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResumeState {
    pub was_playing: bool,
    pub position: f64,
}

/// One pool entry wrapping a single player/capture resource.
pub struct PlayerSlot {
    pub id: SlotId,
    pub handle: Arc<dyn PlayerHandle>,
    pub visible: bool,
    pub resume_state: ResumeState,
}

impl PlayerSlot {
    pub fn wrap(handle: Arc<dyn PlayerHandle>) -> Self {
        Self {
            id: SlotId::generate(),
            handle,
            visible: false,
            resume_state: ResumeState::default(),
        }
    }
}

impl fmt::Debug for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerSlot")
            .field("id", &self.id)
            .field("visible", &self.visible)
            .field("resume_state", &self.resume_state)
            .finish()
    }
}
