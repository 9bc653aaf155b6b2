//! Catalogue seeding for adapter suites.

use engagement_ledger::domain::{ChapterId, StoryId, UserId};
use postgres::{Client, NoTls};

use super::format_postgres_error;

/// Seeds users, stories and chapters through a plain client.
pub struct Seeder {
    client: Client,
}

impl Seeder {
    /// Connect to `url`.
    pub fn connect(url: &str) -> Result<Self, String> {
        let client = Client::connect(url, NoTls).map_err(|err| format_postgres_error(&err))?;
        Ok(Self { client })
    }

    /// Insert a user with a generated username.
    pub fn user(&mut self) -> UserId {
        let id = UserId::random();
        let username = format!("reader-{}", id.as_uuid().simple());
        self.client
            .execute(
                "INSERT INTO users (id, username) VALUES ($1, $2)",
                &[id.as_uuid(), &username],
            )
            .map_err(|err| format_postgres_error(&err))
            .expect("insert user");
        id
    }

    /// Insert a story with the given status and `chapters` chapters ordered
    /// from 1; returns the story and its chapter ids in order.
    pub fn story(
        &mut self,
        author: &UserId,
        title: &str,
        status: &str,
        chapters: i32,
    ) -> (StoryId, Vec<ChapterId>) {
        let row = self
            .client
            .query_one(
                "INSERT INTO stories (author_id, title, status) VALUES ($1, $2, $3) RETURNING id",
                &[author.as_uuid(), &title, &status],
            )
            .map_err(|err| format_postgres_error(&err))
            .expect("insert story");
        let story_id: i64 = row.get(0);

        let chapter_ids = (1..=chapters)
            .map(|order| {
                let chapter_title = format!("{title} #{order}");
                let chapter = self
                    .client
                    .query_one(
                        concat!(
                            "INSERT INTO chapters (story_id, title, chapter_order) ",
                            "VALUES ($1, $2, $3) RETURNING id"
                        ),
                        &[&story_id, &chapter_title, &order],
                    )
                    .map_err(|err| format_postgres_error(&err))
                    .expect("insert chapter");
                ChapterId::new(chapter.get::<_, i64>(0)).expect("generated chapter id")
            })
            .collect();

        (StoryId::new(story_id).expect("generated story id"), chapter_ids)
    }

    /// Delete a chapter, as the publishing platform would.
    pub fn delete_chapter(&mut self, chapter_id: ChapterId) {
        self.client
            .execute("DELETE FROM chapters WHERE id = $1", &[&chapter_id.get()])
            .map_err(|err| format_postgres_error(&err))
            .expect("delete chapter");
    }

    /// Number of read events stored for a story.
    pub fn read_events(&mut self, story_id: StoryId) -> i64 {
        self.client
            .query_one(
                "SELECT COUNT(*) FROM story_reads WHERE story_id = $1",
                &[&story_id.get()],
            )
            .map_err(|err| format_postgres_error(&err))
            .expect("count read events")
            .get(0)
    }

    /// Number of history rows stored for a reader and story.
    pub fn history_rows(&mut self, user: &UserId, story_id: StoryId) -> i64 {
        self.client
            .query_one(
                "SELECT COUNT(*) FROM reading_history WHERE user_id = $1 AND story_id = $2",
                &[user.as_uuid(), &story_id.get()],
            )
            .map_err(|err| format_postgres_error(&err))
            .expect("count history rows")
            .get(0)
    }
}
