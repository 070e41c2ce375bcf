use anyhow::bail;
use hexline_protocol::Color;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::store::SessionStore;

pub mod keys {
    pub const MY_COLOR: &str = "myColor";
    pub const FOLLOW_COLOR: &str = "followColor";
    pub const INIT_MARKER: &str = "_color_init";
    pub const COOKIE: &str = "cookie";
}

/// The two identity choices of the local participant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalIdentity {
    pub my_color: Option<Color>,
    /// Color whose move hands the turn to us.
    pub follow_color: Option<Color>,
}

/// Local identity backed by session storage.
///
/// `my_color` may be overwritten by the server's binding; `follow_color` is
/// purely local.
pub struct IdentityStore {
    store: Arc<dyn SessionStore>,
    current: Mutex<LocalIdentity>,
}

impl IdentityStore {
    /// Loads identity for this session. The first start of a session wipes
    /// any stale colors and drops a marker so later restarts keep them.
    pub fn init(store: Arc<dyn SessionStore>) -> anyhow::Result<Self> {
        let identity = if store.get(keys::INIT_MARKER)?.is_none() {
            store.remove(keys::MY_COLOR)?;
            store.remove(keys::FOLLOW_COLOR)?;
            store.set(keys::INIT_MARKER, "1")?;
            LocalIdentity::default()
        } else {
            LocalIdentity {
                my_color: store.get(keys::MY_COLOR)?.map(Color),
                follow_color: store.get(keys::FOLLOW_COLOR)?.map(Color),
            }
        };
        Ok(Self {
            store,
            current: Mutex::new(identity),
        })
    }

    pub fn current(&self) -> LocalIdentity {
        self.current.lock().clone()
    }

    pub fn my_color(&self) -> Option<Color> {
        self.current.lock().my_color.clone()
    }

    pub fn follow_color(&self) -> Option<Color> {
        self.current.lock().follow_color.clone()
    }

    /// Persists a locally chosen own color. `players` must contain it.
    pub fn choose_my_color(&self, color: &Color, players: &[Color]) -> anyhow::Result<()> {
        ensure_player(color, players)?;
        self.store.set(keys::MY_COLOR, color.as_str())?;
        self.current.lock().my_color = Some(color.clone());
        Ok(())
    }

    pub fn choose_follow_color(&self, color: &Color, players: &[Color]) -> anyhow::Result<()> {
        ensure_player(color, players)?;
        self.store.set(keys::FOLLOW_COLOR, color.as_str())?;
        self.current.lock().follow_color = Some(color.clone());
        Ok(())
    }

    /// Applies the color the server has bound to this session. Returns true
    /// when the local value changed.
    pub fn merge_server_color(&self, color: &Color) -> anyhow::Result<bool> {
        self.store.set(keys::MY_COLOR, color.as_str())?;
        let mut current = self.current.lock();
        let changed = current.my_color.as_ref() != Some(color);
        current.my_color = Some(color.clone());
        Ok(changed)
    }

    pub fn cookie(&self) -> anyhow::Result<Option<String>> {
        self.store.get(keys::COOKIE)
    }

    pub fn save_cookie(&self, cookie: &str) -> anyhow::Result<()> {
        self.store.set(keys::COOKIE, cookie)
    }
}

fn ensure_player(color: &Color, players: &[Color]) -> anyhow::Result<()> {
    if !players.contains(color) {
        bail!("unknown color {color}");
    }
    Ok(())
}
