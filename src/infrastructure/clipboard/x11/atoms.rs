//! Protocol atoms used by the X11 clipboard backend
//!
//! Interned once per connection and passed around by value.

x11rb::atom_manager! {
    pub Atoms: AtomsCookie {
        CLIPBOARD,
        CLIPBOARD_MANAGER,
        UTF8_STRING,
        STRING,
        TARGETS,
        SAVE_TARGETS,
        CLIPKEEP_STORE,
    }
}

impl Atoms {
    /// Formats advertised in answer to a TARGETS request, in this order
    pub fn supported_targets(&self) -> [u32; 3] {
        [self.UTF8_STRING, self.STRING, self.SAVE_TARGETS]
    }
}
