use std::sync::Arc;

use aboutme_wire::LAYER_COUNT;
use parking_lot::RwLock;

use crate::settings::types::KeywordMode;

/// Keywords currently on display.
#[derive(Debug, Clone, PartialEq)]
pub enum KeywordSet {
    /// One list shared by the whole canvas.
    Flat(Vec<String>),
    /// Layer 0 is the bottom band (colors), layer 3 the top (most specific).
    Layered([Vec<String>; LAYER_COUNT]),
}

impl KeywordSet {
    pub fn empty(mode: KeywordMode) -> Self {
        match mode {
            KeywordMode::Flat => KeywordSet::Flat(Vec::new()),
            KeywordMode::Layered => KeywordSet::Layered(Default::default()),
        }
    }

    /// Keywords for a grid row at baseline `y` on a canvas of `height`.
    pub fn for_row(&self, y: f32, height: f32) -> &[String] {
        match self {
            KeywordSet::Flat(words) => words,
            KeywordSet::Layered(layers) => &layers[layer_for_row(y, height)],
        }
    }
}

/// Map a row to its layer: the canvas is split into four horizontal
/// quarters, bottom quarter first.
pub fn layer_for_row(y: f32, height: f32) -> usize {
    let quarter = height / LAYER_COUNT as f32;
    if y >= quarter * 3.0 {
        0
    } else if y >= quarter * 2.0 {
        1
    } else if y >= quarter {
        2
    } else {
        3
    }
}

/// Immutable view handed to the paint loop.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardSnapshot {
    /// False until the first refresh cycle begins.
    pub started: bool,
    pub keywords: KeywordSet,
    /// Bumped on every change.
    pub revision: u64,
}

/// Shared keyword state.
///
/// Readers take an `Arc` snapshot; writers copy-on-write, so a paint cycle
/// never holds the lock while it lays out glyphs.
pub struct KeywordBoard {
    mode: KeywordMode,
    current: RwLock<Arc<BoardSnapshot>>,
}

impl KeywordBoard {
    pub fn new(mode: KeywordMode) -> Self {
        Self {
            mode,
            current: RwLock::new(Arc::new(BoardSnapshot {
                started: false,
                keywords: KeywordSet::empty(mode),
                revision: 0,
            })),
        }
    }

    pub fn snapshot(&self) -> Arc<BoardSnapshot> {
        Arc::clone(&self.current.read())
    }

    fn update(&self, apply: impl FnOnce(&mut BoardSnapshot)) {
        let mut guard = self.current.write();
        let snapshot = Arc::make_mut(&mut guard);
        apply(snapshot);
        snapshot.revision += 1;
    }

    /// Flip to started and clear any keywords. Returns false if already
    /// started.
    pub fn mark_started(&self) -> bool {
        if self.current.read().started {
            return false;
        }
        let mode = self.mode;
        let mut newly = false;
        self.update(|snap| {
            newly = !snap.started;
            snap.started = true;
            snap.keywords = KeywordSet::empty(mode);
        });
        newly
    }

    /// Replace the flat list wholesale.
    pub fn set_flat(&self, words: Vec<String>) {
        self.update(|snap| snap.keywords = KeywordSet::Flat(words));
    }

    /// Replace one layer, leaving the others as they are.
    pub fn set_layer(&self, index: usize, words: Vec<String>) {
        if index >= LAYER_COUNT {
            return;
        }
        self.update(|snap| {
            if let KeywordSet::Flat(_) = snap.keywords {
                snap.keywords = KeywordSet::Layered(Default::default());
            }
            if let KeywordSet::Layered(layers) = &mut snap.keywords {
                layers[index] = words;
            }
        });
    }

    /// Replace all layers at once.
    pub fn set_layers(&self, layers: [Vec<String>; LAYER_COUNT]) {
        self.update(|snap| snap.keywords = KeywordSet::Layered(layers));
    }
}
