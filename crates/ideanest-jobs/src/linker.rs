//! Relation linking between ideas that share tags.

use tracing::{debug, trace};
use uuid::Uuid;

use ideanest_core::{defaults, IdeaRepository, Origin, RelationRepository, Result};
use ideanest_db::Database;

/// Counts reported by one linking pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkOutcome {
    /// Targets linked in this pass, oldest first.
    pub targets: Vec<Uuid>,
    pub created: usize,
    pub updated: usize,
}

/// Links an idea to other ideas carrying any of its tags.
#[derive(Clone)]
pub struct RelationLinker {
    db: Database,
    limit: i64,
    strength: f64,
}

impl RelationLinker {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            limit: defaults::RELATION_LINK_LIMIT,
            strength: defaults::AUTO_RELATION_STRENGTH,
        }
    }

    /// Maximum number of targets per pass.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Strength written on each automated relation.
    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }

    /// Upsert `source_id -> target` for up to `limit` non-archived ideas
    /// sharing at least one of `tags`.
    ///
    /// An empty tag set links nothing and does not touch the store.
    pub async fn link(&self, source_id: Uuid, tags: &[String]) -> Result<LinkOutcome> {
        if tags.is_empty() {
            debug!(
                subsystem = "jobs",
                component = "linker",
                idea_id = %source_id,
                "No tags, skipping relation search"
            );
            return Ok(LinkOutcome::default());
        }

        let candidates = self
            .db
            .ideas
            .find_by_tags_excluding(tags, source_id, self.limit)
            .await?;

        let mut outcome = LinkOutcome::default();
        for target in candidates {
            let upsert = self
                .db
                .relations
                .upsert(source_id, target.id, self.strength, Origin::Automated)
                .await?;
            trace!(
                idea_id = %source_id,
                target_id = %target.id,
                created = upsert.created,
                "Relation upserted"
            );
            if upsert.created {
                outcome.created += 1;
            } else {
                outcome.updated += 1;
            }
            outcome.targets.push(target.id);
        }

        debug!(
            subsystem = "jobs",
            component = "linker",
            op = "link",
            idea_id = %source_id,
            created = outcome.created,
            updated = outcome.updated,
            "Relations linked"
        );
        Ok(outcome)
    }
}
