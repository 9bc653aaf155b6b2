//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `migrations/` exactly. `diesel print-schema`
//! against a migrated database regenerates them.

diesel::table! {
    /// Platform users. The ledger only references them.
    users (id) {
        id -> Uuid,
        username -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Stories in the publishing catalogue.
    stories (id) {
        id -> Int8,
        author_id -> Uuid,
        title -> Varchar,
        description -> Nullable<Text>,
        cover_url -> Nullable<Text>,
        /// `draft` or `published`, enforced by `stories_status_check`.
        status -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Ordered chapters of a story.
    chapters (id) {
        id -> Int8,
        story_id -> Int8,
        title -> Varchar,
        chapter_order -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per (user, chapter) vote.
    votes (user_id, chapter_id) {
        user_id -> Uuid,
        chapter_id -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Last-read position per (user, story).
    reading_history (user_id, story_id) {
        user_id -> Uuid,
        story_id -> Int8,
        last_chapter_id -> Nullable<Int8>,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only read events.
    story_reads (id) {
        id -> Int8,
        user_id -> Uuid,
        story_id -> Int8,
        chapter_id -> Nullable<Int8>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(stories -> users (author_id));
diesel::joinable!(chapters -> stories (story_id));
diesel::joinable!(votes -> chapters (chapter_id));
diesel::joinable!(votes -> users (user_id));
diesel::joinable!(reading_history -> stories (story_id));
diesel::joinable!(reading_history -> users (user_id));
diesel::joinable!(story_reads -> stories (story_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    stories,
    chapters,
    votes,
    reading_history,
    story_reads,
);
