//! Guest carts persisted as JSON files, one directory per device session.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::aggregates::CartLine;
use crate::ports::{GuestCartStore, StoreResult};

/// Fixed storage key of the guest cart.
pub const GUEST_CART_KEY: &str = "standease-cart";

pub struct FileGuestCart {
    path: PathBuf,
}

impl FileGuestCart {
    /// `session` must already be a safe path component; see [`sanitize_session_key`].
    pub fn new(root: &Path, session: &str) -> Self {
        Self { path: root.join(session).join(format!("{GUEST_CART_KEY}.json")) }
    }
}

impl GuestCartStore for FileGuestCart {
    fn load(&self) -> StoreResult<Vec<CartLine>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, lines: &[CartLine]) -> StoreResult<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        // Whole-file replace: write aside, then rename over the old cart.
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, serde_json::to_vec(lines)?)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    fn discard(&self) -> StoreResult<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Keeps only characters that are safe in a single path component.
pub fn sanitize_session_key(raw: &str) -> Option<String> {
    let key: String = raw.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_').collect();
    (!key.is_empty() && key.len() == raw.len() && key.len() <= 128).then_some(key)
}
