//! Handler for `analyze_idea` tasks.
//!
//! One run extracts keywords from the idea, tags it, links it to ideas
//! sharing those tags and appends an automated summary.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, trace};
use uuid::Uuid;

use ideanest_core::{
    compose_summary, AnalyzeIdeaPayload, Error, IdeaRepository, KeywordVocabulary, Origin, Result,
    SummaryRepository, TagRepository, TaskKind,
};
use ideanest_db::Database;

use crate::handler::{TaskContext, TaskHandler, TaskResult};
use crate::linker::RelationLinker;

/// Result payload recorded on a completed `analyze_idea` task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub tags: Vec<String>,
    pub relations_created: usize,
    pub relations_updated: usize,
    pub summary_id: Uuid,
}

/// Enriches a single idea.
pub struct AnalyzeIdeaHandler {
    db: Database,
    vocabulary: Arc<KeywordVocabulary>,
    linker: RelationLinker,
}

impl AnalyzeIdeaHandler {
    /// Create a handler using the built-in vocabulary.
    pub fn new(db: Database) -> Self {
        Self::with_vocabulary(db, KeywordVocabulary::default())
    }

    pub fn with_vocabulary(db: Database, vocabulary: KeywordVocabulary) -> Self {
        Self {
            linker: RelationLinker::new(db.clone()),
            db,
            vocabulary: Arc::new(vocabulary),
        }
    }

    /// Replace the relation linker (e.g. to change its limit).
    pub fn with_linker(mut self, linker: RelationLinker) -> Self {
        self.linker = linker;
        self
    }

    /// Run the enrichment pipeline for one idea.
    pub async fn analyze(&self, idea_id: Uuid) -> Result<AnalysisOutcome> {
        let idea = self
            .db
            .ideas
            .get(idea_id)
            .await?
            .ok_or(Error::IdeaNotFound(idea_id))?;

        let tags = self.vocabulary.extract(&idea.content);
        trace!(idea_id = %idea_id, ?tags, "Keywords extracted");

        for name in &tags {
            let tag = self.db.tags.resolve(name).await?;
            self.db
                .tags
                .attach(idea.id, tag.id, Origin::Automated)
                .await?;
        }

        let links = self.linker.link(idea.id, &tags).await?;

        let summary = self
            .db
            .summaries
            .append(idea.id, &compose_summary(&tags), Origin::Automated)
            .await?;

        Ok(AnalysisOutcome {
            tags,
            relations_created: links.created,
            relations_updated: links.updated,
            summary_id: summary.id,
        })
    }
}

#[async_trait]
impl TaskHandler for AnalyzeIdeaHandler {
    fn kind(&self) -> TaskKind {
        TaskKind::AnalyzeIdea
    }

    #[instrument(
        skip(self, ctx),
        fields(
            subsystem = "jobs",
            component = "analyze",
            op = "analyze_idea",
            task_id = %ctx.task_id(),
        )
    )]
    async fn execute(&self, ctx: TaskContext) -> TaskResult {
        let start = Instant::now();

        let result = async {
            let payload: AnalyzeIdeaPayload = ctx.parse_payload()?;
            let outcome = self.analyze(payload.idea_id).await?;

            info!(
                idea_id = %payload.idea_id,
                result_count = outcome.tags.len(),
                relations_created = outcome.relations_created,
                relations_updated = outcome.relations_updated,
                duration_ms = start.elapsed().as_millis() as u64,
                "Idea enriched"
            );
            Ok::<_, Error>(serde_json::to_value(&outcome)?)
        }
        .await;

        TaskResult::from(result)
    }
}
