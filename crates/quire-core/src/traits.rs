// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Collaborator traits. The entity store that owns stories, chapters and
// world-building entities lives outside the export pipeline; these traits are
// the only way the pipeline reads from it.
//
// Lookups are synchronous and infallible from the pipeline's point of view:
// a store that cannot answer reports "not found" and the pipeline degrades
// to a placeholder or omits the item.

use crate::types::{Chapter, ChapterId, EntityKind, Story, StoryId};

/// Resolves shortcode targets to display names.
pub trait EntityLookup {
    /// Display name of entity `id` of the given kind, if it exists.
    fn display_name(&self, kind: EntityKind, id: u64) -> Option<String>;
}

/// Read access to stories and chapters.
pub trait ChapterStore {
    /// All chapters belonging to a story, in store order.
    fn chapters_by_story(&self, story_id: StoryId) -> Vec<Chapter>;

    /// A single chapter by id.
    fn chapter_by_id(&self, id: ChapterId) -> Option<Chapter>;

    /// A story by id.
    fn story_by_id(&self, id: StoryId) -> Option<Story>;
}

impl<T: EntityLookup + ?Sized> EntityLookup for &T {
    fn display_name(&self, kind: EntityKind, id: u64) -> Option<String> {
        (**self).display_name(kind, id)
    }
}

impl<T: ChapterStore + ?Sized> ChapterStore for &T {
    fn chapters_by_story(&self, story_id: StoryId) -> Vec<Chapter> {
        (**self).chapters_by_story(story_id)
    }

    fn chapter_by_id(&self, id: ChapterId) -> Option<Chapter> {
        (**self).chapter_by_id(id)
    }

    fn story_by_id(&self, id: StoryId) -> Option<Story> {
        (**self).story_by_id(id)
    }
}
