//! crates/freeplotter_core/src/outline.rs
//!
//! The outline draft: title, summary, genre, chapter count and an ordered,
//! reorderable list of plot points that feed one generation request.

use crate::domain::{GeneratedOutline, OutlineDocument, OutlineRequest, PlotId, PlotItem};
use crate::ports::{PortError, PortResult};

pub const PLOT_LIMIT: usize = 50;
pub const PLOT_CONTEXT_LIMIT: usize = 100;
pub const TITLE_LIMIT: usize = 200;
pub const MIN_PLOTS: usize = 5;
pub const MIN_CHAPTERS: u8 = 1;
pub const MAX_CHAPTERS: u8 = 50;
pub const DEFAULT_CHAPTERS: u8 = 30;
pub const DEFAULT_GENRE: &str = "Fantasy";
pub const INVALID_FORM_MESSAGE: &str = "Please add at least a title or 5 plot points.";

pub const GENRES: [&str; 50] = [
    "Adventure",
    "Alternate History",
    "Apocalyptic Fiction",
    "Chick Lit",
    "Children's Fiction",
    "Classic Literature",
    "Comedy/Humor",
    "Coming of Age",
    "Contemporary Fiction",
    "Crime",
    "Cyberpunk",
    "Dark Fantasy",
    "Dieselpunk",
    "Dystopian",
    "Epic Fantasy",
    "Fairy Tales",
    "Fantasy",
    "Gothic Fiction",
    "Grimdark",
    "Hard Science Fiction",
    "Heroic Fantasy",
    "Historical Fiction",
    "Horror",
    "Legal Thriller",
    "LGBTQ+ Fiction",
    "Light Novel",
    "Literary Fiction",
    "Magical Realism",
    "Military Science Fiction",
    "Mystery",
    "Mythology",
    "New Adult",
    "Paranormal",
    "Philosophical Fiction",
    "Political Fiction",
    "Portal Fantasy",
    "Psychological Fiction",
    "Psychological Thriller",
    "Romance",
    "Romantic Comedy",
    "Science Fantasy",
    "Science Fiction",
    "Slapstick Comedy",
    "Space Opera",
    "Steampunk",
    "Superhero Fiction",
    "Suspense",
    "Thriller",
    "Urban Fantasy",
    "Young Adult (YA)",
];

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

//=========================================================================================
// Plot list
//=========================================================================================

/// Ordered plot points. The first entry is pinned and never removed, so the
/// list is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotList {
    items: Vec<PlotItem>,
}

impl Default for PlotList {
    fn default() -> Self {
        Self::new()
    }
}

impl PlotList {
    pub fn new() -> Self {
        Self {
            items: vec![PlotItem {
                id: PlotId::generate(),
                context: String::new(),
            }],
        }
    }

    pub fn items(&self) -> &[PlotItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= PLOT_LIMIT
    }

    fn position(&self, id: PlotId) -> PortResult<usize> {
        self.items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| PortError::NotFound(format!("Plot {} not found", id)))
    }

    /// Appends an empty plot point.
    pub fn add(&mut self) -> PortResult<PlotId> {
        if self.is_full() {
            return Err(PortError::Validation(format!(
                "An outline can have at most {} plot points.",
                PLOT_LIMIT
            )));
        }
        let id = PlotId::generate();
        self.items.push(PlotItem {
            id,
            context: String::new(),
        });
        Ok(id)
    }

    /// Replaces a plot point's text, truncated to [`PLOT_CONTEXT_LIMIT`] characters.
    pub fn update(&mut self, id: PlotId, context: &str) -> PortResult<()> {
        let index = self.position(id)?;
        self.items[index].context = truncate_chars(context, PLOT_CONTEXT_LIMIT);
        Ok(())
    }

    pub fn remove(&mut self, id: PlotId) -> PortResult<PlotItem> {
        let index = self.position(id)?;
        if index == 0 {
            return Err(PortError::Validation(
                "The first plot point cannot be removed.".to_string(),
            ));
        }
        Ok(self.items.remove(index))
    }

    /// Moves `from` to the position currently held by `to`; everything else
    /// keeps its relative order.
    pub fn reorder(&mut self, from: PlotId, to: PlotId) -> PortResult<()> {
        let old_index = self.position(from)?;
        let new_index = self.position(to)?;
        if old_index != new_index {
            let item = self.items.remove(old_index);
            self.items.insert(new_index, item);
        }
        Ok(())
    }

    pub fn contexts(&self) -> Vec<String> {
        self.items.iter().map(|item| item.context.clone()).collect()
    }
}

//=========================================================================================
// Outline draft
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct OutlineDraft {
    title: String,
    summary: String,
    genre: String,
    num_chapters: u8,
    plots: PlotList,
}

impl Default for OutlineDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl OutlineDraft {
    pub fn new() -> Self {
        Self {
            title: String::new(),
            summary: String::new(),
            genre: DEFAULT_GENRE.to_string(),
            num_chapters: DEFAULT_CHAPTERS,
            plots: PlotList::new(),
        }
    }

    /// Starts over with a blank draft.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }

    pub fn num_chapters(&self) -> u8 {
        self.num_chapters
    }

    pub fn plots(&self) -> &PlotList {
        &self.plots
    }

    pub fn plots_mut(&mut self) -> &mut PlotList {
        &mut self.plots
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = truncate_chars(title, TITLE_LIMIT);
    }

    pub fn set_summary(&mut self, summary: &str) {
        self.summary = summary.to_string();
    }

    pub fn set_genre(&mut self, genre: &str) -> PortResult<()> {
        if !GENRES.contains(&genre) {
            return Err(PortError::Validation(format!("Unknown genre '{}'", genre)));
        }
        self.genre = genre.to_string();
        Ok(())
    }

    pub fn set_num_chapters(&mut self, num_chapters: u8) -> PortResult<()> {
        if !(MIN_CHAPTERS..=MAX_CHAPTERS).contains(&num_chapters) {
            return Err(PortError::Validation(format!(
                "Number of chapters must be between {} and {}",
                MIN_CHAPTERS, MAX_CHAPTERS
            )));
        }
        self.num_chapters = num_chapters;
        Ok(())
    }

    /// Builds the generation request. A blank title or fewer than
    /// [`MIN_PLOTS`] plot points rejects the draft before any network call.
    pub fn outline_request(&self) -> PortResult<OutlineRequest> {
        if self.title.trim().is_empty() || self.plots.len() < MIN_PLOTS {
            return Err(PortError::Validation(INVALID_FORM_MESSAGE.to_string()));
        }

        let summary = self.summary.trim();
        Ok(OutlineRequest {
            title: self.title.clone(),
            summary: (!summary.is_empty()).then(|| summary.to_string()),
            genre: self.genre.clone(),
            num_chapters: self.num_chapters,
            plots: self.plots.contexts(),
        })
    }
}

impl OutlineDocument {
    /// Combines the submitted request with the generator's answer.
    pub fn assemble(request: &OutlineRequest, generated: GeneratedOutline) -> Self {
        Self {
            title: request.title.clone(),
            summary: request.summary.clone(),
            premise: generated.premise,
            sections: generated.outline,
        }
    }
}
