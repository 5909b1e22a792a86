// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// quire-store — An immutable, in-memory implementation of the collaborator
// traits, built programmatically or loaded from a JSON snapshot.
//
// Snapshot layout:
//
//   {
//     "stories":    [{"id": 1, "title": "..."}],
//     "chapters":   [{"id": 7, "story_id": 1, "title": "...", "content": "..."}],
//     "characters": [{"id": 3, "name": "..."}],
//     "items":      [...],
//     "locations":  [...],
//     "lore":       [...]
//   }
//
// Every key is optional.

use std::collections::HashMap;
use std::path::Path;

use quire_core::error::{QuireError, Result};
use quire_core::traits::{ChapterStore, EntityLookup};
use quire_core::types::{Chapter, ChapterId, EntityKind, Story, StoryId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// A named world-building entity as stored in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: u64,
    pub name: String,
}

/// On-disk snapshot format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub stories: Vec<Story>,
    pub chapters: Vec<Chapter>,
    pub characters: Vec<EntityRecord>,
    pub items: Vec<EntityRecord>,
    pub locations: Vec<EntityRecord>,
    pub lore: Vec<EntityRecord>,
}

/// Stories, chapters and entity names held in memory.
///
/// Chapters keep insertion order, which is the "store order" reported by
/// `chapters_by_story`. Inserting an id that already exists replaces the
/// earlier record in place.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    stories: HashMap<StoryId, Story>,
    chapters: Vec<Chapter>,
    entities: HashMap<(EntityKind, u64), String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Builders -------------------------------------------------------------

    pub fn with_story(mut self, id: u64, title: impl Into<String>) -> Self {
        self.insert_story(Story {
            id: StoryId(id),
            title: title.into(),
        });
        self
    }

    pub fn with_chapter(mut self, chapter: Chapter) -> Self {
        self.insert_chapter(chapter);
        self
    }

    pub fn with_entity(mut self, kind: EntityKind, id: u64, name: impl Into<String>) -> Self {
        self.entities.insert((kind, id), name.into());
        self
    }

    fn insert_story(&mut self, story: Story) {
        self.stories.insert(story.id, story);
    }

    fn insert_chapter(&mut self, chapter: Chapter) {
        match self.chapters.iter_mut().find(|c| c.id == chapter.id) {
            Some(existing) => *existing = chapter,
            None => self.chapters.push(chapter),
        }
    }

    // -- Snapshots ------------------------------------------------------------

    /// Build a store from a snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut store = Self::new();
        for story in snapshot.stories {
            store.insert_story(story);
        }
        for chapter in snapshot.chapters {
            store.insert_chapter(chapter);
        }
        let groups = [
            (EntityKind::Character, snapshot.characters),
            (EntityKind::Item, snapshot.items),
            (EntityKind::Location, snapshot.locations),
            (EntityKind::Lore, snapshot.lore),
        ];
        for (kind, records) in groups {
            for record in records {
                store.entities.insert((kind, record.id), record.name);
            }
        }
        store
    }

    /// Parse a JSON snapshot.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)
            .map_err(|err| QuireError::Store(format!("invalid store snapshot: {err}")))?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Load a JSON snapshot from disk.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let store = Self::from_json_str(&json)?;
        info!(
            stories = store.stories.len(),
            chapters = store.chapters.len(),
            entities = store.entities.len(),
            "store snapshot loaded"
        );
        Ok(store)
    }

    pub fn story_count(&self) -> usize {
        self.stories.len()
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }
}

impl EntityLookup for MemoryStore {
    fn display_name(&self, kind: EntityKind, id: u64) -> Option<String> {
        let name = self.entities.get(&(kind, id)).cloned();
        if name.is_none() {
            debug!(kind = kind.keyword(), id, "entity not in store");
        }
        name
    }
}

impl ChapterStore for MemoryStore {
    fn chapters_by_story(&self, story_id: StoryId) -> Vec<Chapter> {
        self.chapters
            .iter()
            .filter(|chapter| chapter.story_id == Some(story_id))
            .cloned()
            .collect()
    }

    fn chapter_by_id(&self, id: ChapterId) -> Option<Chapter> {
        self.chapters.iter().find(|chapter| chapter.id == id).cloned()
    }

    fn story_by_id(&self, id: StoryId) -> Option<Story> {
        self.stories.get(&id).cloned()
    }
}
