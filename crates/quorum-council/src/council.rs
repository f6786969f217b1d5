use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use quorum_ai::{ChatMessage, ModelClient, QuorumAiError};

use crate::aggregate::calculate_aggregate_rankings;
use crate::config::CouncilConfig;
use crate::executor::query_models_parallel;
use crate::prompts::{build_chairman_prompt, build_ranking_prompt, build_title_prompt};
use crate::ranking::parse_ranking_from_text;
use crate::types::{
    CouncilMetadata, CouncilOutcome, Stage1Response, Stage2Ranking, Stage3Response,
};

const TITLE_MAX_CHARS: usize = 50;

#[derive(Debug, Error)]
/// Fatal council-run failures. Per-model degradation inside a stage never
/// surfaces here; these are the all-or-nothing conditions.
pub enum CouncilError {
    #[error("all council models failed to respond")]
    NoCouncilResponses,
    #[error("chairman synthesis failed: {0}")]
    ChairmanFailed(#[source] QuorumAiError),
    #[error("title generation failed: {0}")]
    TitleGenerationFailed(#[source] QuorumAiError),
    #[error("council run cancelled")]
    Cancelled,
}

/// Runs the three-stage council deliberation over a shared model client.
///
/// The engine is stateless between runs: labels, rankings, and aggregates are
/// derived fresh for every query and returned as one atomic
/// [`CouncilOutcome`].
pub struct Council {
    client: Arc<dyn ModelClient>,
    config: CouncilConfig,
}

impl Council {
    pub fn new(client: Arc<dyn ModelClient>, config: CouncilConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &CouncilConfig {
        &self.config
    }

    /// Runs Stage 1 (independent answers), Stage 2 (anonymized peer ranking),
    /// and Stage 3 (chairman synthesis) strictly in sequence.
    ///
    /// Stage 1 with zero respondents and any Stage-3 failure are fatal; a
    /// Stage 2 with zero rankers is not, because the individual answers are
    /// still worth synthesizing.
    pub async fn run(
        &self,
        user_query: &str,
        cancel: &CancellationToken,
    ) -> Result<CouncilOutcome, CouncilError> {
        let stage1 = self.collect_responses(user_query, cancel).await;
        if cancel.is_cancelled() {
            return Err(CouncilError::Cancelled);
        }
        if stage1.is_empty() {
            return Err(CouncilError::NoCouncilResponses);
        }
        tracing::debug!(responses = stage1.len(), "stage 1 complete");

        let (stage2, label_to_model) = self.collect_rankings(user_query, &stage1, cancel).await;
        if cancel.is_cancelled() {
            return Err(CouncilError::Cancelled);
        }
        tracing::debug!(rankings = stage2.len(), "stage 2 complete");

        let aggregate_rankings = calculate_aggregate_rankings(&stage2, &label_to_model);

        let stage3 = self
            .synthesize_final(user_query, &stage1, &stage2, cancel)
            .await?;
        tracing::debug!(chairman = %stage3.model, "stage 3 complete");

        Ok(CouncilOutcome {
            stage1,
            stage2,
            stage3,
            metadata: CouncilMetadata {
                label_to_model,
                aggregate_rankings,
            },
        })
    }

    /// Stage 1: every council model answers the raw query independently.
    async fn collect_responses(
        &self,
        user_query: &str,
        cancel: &CancellationToken,
    ) -> Vec<Stage1Response> {
        let messages = [ChatMessage::user(user_query)];
        query_models_parallel(
            Arc::clone(&self.client),
            &self.config.council_models,
            &messages,
            self.config.model_query_timeout,
            cancel,
        )
        .await
    }

    /// Stage 2: the same council ranks the anonymized Stage-1 answers.
    ///
    /// Labels are assigned in Stage-1 collection order and the resulting
    /// bijection is returned for later de-anonymization; the rankers
    /// themselves only ever see labels.
    async fn collect_rankings(
        &self,
        user_query: &str,
        stage1_results: &[Stage1Response],
        cancel: &CancellationToken,
    ) -> (Vec<Stage2Ranking>, BTreeMap<String, String>) {
        let mut label_to_model = BTreeMap::new();
        let mut responses_text = String::new();
        for (index, result) in stage1_results.iter().enumerate() {
            let letter = char::from_u32('A' as u32 + index as u32).unwrap_or('?');
            label_to_model.insert(format!("Response {letter}"), result.model.clone());
            responses_text.push_str(&format!("Response {letter}:\n{}\n\n", result.response));
        }

        let prompt = build_ranking_prompt(user_query, &responses_text);
        let messages = [ChatMessage::user(prompt)];
        let replies = query_models_parallel(
            Arc::clone(&self.client),
            &self.config.council_models,
            &messages,
            self.config.model_query_timeout,
            cancel,
        )
        .await;

        let rankings = replies
            .into_iter()
            .map(|reply| {
                let parsed_ranking = parse_ranking_from_text(&reply.response);
                Stage2Ranking {
                    model: reply.model,
                    ranking: reply.response,
                    parsed_ranking,
                }
            })
            .collect();

        (rankings, label_to_model)
    }

    /// Stage 3: one chairman invocation over the full, de-anonymized context.
    async fn synthesize_final(
        &self,
        user_query: &str,
        stage1_results: &[Stage1Response],
        stage2_results: &[Stage2Ranking],
        cancel: &CancellationToken,
    ) -> Result<Stage3Response, CouncilError> {
        let prompt = build_chairman_prompt(user_query, stage1_results, stage2_results);
        let messages = [ChatMessage::user(prompt)];

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(CouncilError::Cancelled),
            result = self.client.complete(
                &self.config.chairman_model,
                &messages,
                self.config.model_query_timeout,
            ) => result.map_err(CouncilError::ChairmanFailed)?,
        };

        Ok(Stage3Response {
            model: self.config.chairman_model.clone(),
            response,
        })
    }

    /// Generates a short conversation title for the query with the fast
    /// title model. Surrounding whitespace and quotes are stripped and long
    /// titles are truncated.
    pub async fn generate_title(&self, user_query: &str) -> Result<String, CouncilError> {
        let prompt = build_title_prompt(user_query);
        let messages = [ChatMessage::user(prompt)];
        let response = self
            .client
            .complete(&self.config.title_model, &messages, self.config.title_timeout)
            .await
            .map_err(CouncilError::TitleGenerationFailed)?;

        Ok(clean_title(&response))
    }
}

fn clean_title(raw: &str) -> String {
    let title = raw.trim().trim_matches(|c| c == '"' || c == '\'');
    if title.chars().count() > TITLE_MAX_CHARS {
        let truncated: String = title.chars().take(TITLE_MAX_CHARS - 3).collect();
        return format!("{truncated}...");
    }
    title.to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    use quorum_ai::{ChatMessage, ModelClient, QuorumAiError};

    use super::{clean_title, Council, CouncilError};
    use crate::config::CouncilConfig;

    /// Scripted client that routes on the prompt text to tell the three
    /// stages (and title generation) apart. Models without a scripted reply
    /// for the requested stage fail with an upstream error.
    struct StageScriptedClient {
        answers: HashMap<String, String>,
        rankings: HashMap<String, String>,
        synthesis: Option<String>,
        title: Option<String>,
    }

    impl StageScriptedClient {
        fn new() -> Self {
            Self {
                answers: HashMap::new(),
                rankings: HashMap::new(),
                synthesis: None,
                title: None,
            }
        }

        fn with_answer(mut self, model: &str, text: &str) -> Self {
            self.answers.insert(model.to_string(), text.to_string());
            self
        }

        fn with_ranking(mut self, model: &str, text: &str) -> Self {
            self.rankings.insert(model.to_string(), text.to_string());
            self
        }

        fn with_synthesis(mut self, text: &str) -> Self {
            self.synthesis = Some(text.to_string());
            self
        }

        fn with_title(mut self, text: &str) -> Self {
            self.title = Some(text.to_string());
            self
        }
    }

    fn scripted_failure() -> QuorumAiError {
        QuorumAiError::HttpStatus {
            status: 500,
            body: "scripted failure".to_string(),
        }
    }

    #[async_trait]
    impl ModelClient for StageScriptedClient {
        async fn complete(
            &self,
            model: &str,
            messages: &[ChatMessage],
            _timeout: Duration,
        ) -> Result<String, QuorumAiError> {
            let prompt = messages
                .last()
                .map(|message| message.content.as_str())
                .unwrap_or_default();

            let reply = if prompt.contains("You are the Chairman") {
                self.synthesis.clone()
            } else if prompt.contains("You are evaluating different responses") {
                self.rankings.get(model).cloned()
            } else if prompt.contains("Generate a very short title") {
                self.title.clone()
            } else {
                self.answers.get(model).cloned()
            };

            reply.ok_or_else(scripted_failure)
        }
    }

    fn test_config() -> CouncilConfig {
        CouncilConfig {
            council_models: vec!["test/model1".to_string(), "test/model2".to_string()],
            chairman_model: "test/chairman".to_string(),
            title_model: "test/title".to_string(),
            model_query_timeout: Duration::from_secs(5),
            title_timeout: Duration::from_secs(5),
        }
    }

    fn council(client: StageScriptedClient) -> Council {
        Council::new(Arc::new(client), test_config())
    }

    #[tokio::test]
    async fn functional_full_run_produces_all_stage_outputs() {
        let ranking_text = "Response B is stronger.\n\nFINAL RANKING:\n1. Response B\n2. Response A";
        let client = StageScriptedClient::new()
            .with_answer("test/model1", "answer one")
            .with_answer("test/model2", "answer two")
            .with_ranking("test/model1", ranking_text)
            .with_ranking("test/model2", ranking_text)
            .with_synthesis("the synthesized answer");

        let outcome = council(client)
            .run("What is Go?", &CancellationToken::new())
            .await
            .expect("run must succeed");

        assert_eq!(outcome.stage1.len(), 2);
        assert_eq!(outcome.stage2.len(), 2);
        for ranking in &outcome.stage2 {
            assert_eq!(
                ranking.parsed_ranking,
                vec!["Response B".to_string(), "Response A".to_string()]
            );
        }
        assert_eq!(outcome.stage3.model, "test/chairman");
        assert_eq!(outcome.stage3.response, "the synthesized answer");

        let aggregate = &outcome.metadata.aggregate_rankings;
        assert_eq!(aggregate.len(), 2);
        assert!(aggregate[0].average_rank <= aggregate[1].average_rank);
        assert_eq!(aggregate[0].model, "test/model2");
        assert_eq!(aggregate[0].average_rank, 1.0);
        assert_eq!(aggregate[0].rankings_count, 2);
    }

    #[tokio::test]
    async fn unit_labels_follow_stage1_collection_order() {
        let client = StageScriptedClient::new()
            .with_answer("test/model1", "answer one")
            .with_answer("test/model2", "answer two")
            .with_ranking("test/model1", "FINAL RANKING:\n1. Response A\n2. Response B")
            .with_synthesis("final");

        let outcome = council(client)
            .run("What is Go?", &CancellationToken::new())
            .await
            .expect("run must succeed");

        let labels = &outcome.metadata.label_to_model;
        assert_eq!(labels.len(), 2);
        assert_eq!(labels.get("Response A").map(String::as_str), Some("test/model1"));
        assert_eq!(labels.get("Response B").map(String::as_str), Some("test/model2"));
    }

    #[tokio::test]
    async fn regression_stage1_total_failure_is_fatal() {
        let client = StageScriptedClient::new().with_synthesis("unused");
        let error = council(client)
            .run("What is Go?", &CancellationToken::new())
            .await
            .expect_err("run must fail");

        assert!(matches!(error, CouncilError::NoCouncilResponses));
    }

    #[tokio::test]
    async fn functional_stage2_total_failure_still_reaches_synthesis() {
        // No rankings scripted: every Stage-2 invocation fails, which is
        // survivable because the Stage-1 answers alone are worth
        // synthesizing.
        let client = StageScriptedClient::new()
            .with_answer("test/model1", "answer one")
            .with_answer("test/model2", "answer two")
            .with_synthesis("synthesized without rankings");

        let outcome = council(client)
            .run("What is Go?", &CancellationToken::new())
            .await
            .expect("run must succeed");

        assert_eq!(outcome.stage1.len(), 2);
        assert!(outcome.stage2.is_empty());
        assert!(outcome.metadata.aggregate_rankings.is_empty());
        assert_eq!(outcome.stage3.response, "synthesized without rankings");
    }

    #[tokio::test]
    async fn functional_partial_stage1_failure_degrades_gracefully() {
        let client = StageScriptedClient::new()
            .with_answer("test/model2", "only answer")
            .with_ranking("test/model1", "FINAL RANKING:\n1. Response A")
            .with_ranking("test/model2", "FINAL RANKING:\n1. Response A")
            .with_synthesis("final");

        let outcome = council(client)
            .run("What is Go?", &CancellationToken::new())
            .await
            .expect("run must succeed");

        assert_eq!(outcome.stage1.len(), 1);
        assert_eq!(outcome.stage1[0].model, "test/model2");
        // The sole survivor is labeled Response A.
        assert_eq!(
            outcome.metadata.label_to_model.get("Response A").map(String::as_str),
            Some("test/model2")
        );
    }

    #[tokio::test]
    async fn regression_chairman_failure_discards_prior_stage_results() {
        let client = StageScriptedClient::new()
            .with_answer("test/model1", "answer one")
            .with_answer("test/model2", "answer two")
            .with_ranking("test/model1", "FINAL RANKING:\n1. Response A\n2. Response B");

        let error = council(client)
            .run("What is Go?", &CancellationToken::new())
            .await
            .expect_err("run must fail");

        assert!(matches!(error, CouncilError::ChairmanFailed(_)));
    }

    #[tokio::test]
    async fn regression_cancelled_run_reports_cancellation_not_failure() {
        let client = StageScriptedClient::new()
            .with_answer("test/model1", "answer one")
            .with_answer("test/model2", "answer two");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let error = council(client)
            .run("What is Go?", &cancel)
            .await
            .expect_err("run must fail");

        assert!(matches!(error, CouncilError::Cancelled));
    }

    #[tokio::test]
    async fn functional_generate_title_trims_quotes_and_whitespace() {
        let client = StageScriptedClient::new().with_title("  \"Goroutines Explained\"  ");
        let title = council(client)
            .generate_title("How do goroutines work?")
            .await
            .expect("title must generate");
        assert_eq!(title, "Goroutines Explained");
    }

    #[tokio::test]
    async fn regression_generate_title_failure_is_typed() {
        let client = StageScriptedClient::new();
        let error = council(client)
            .generate_title("How do goroutines work?")
            .await
            .expect_err("title must fail");
        assert!(matches!(error, CouncilError::TitleGenerationFailed(_)));
    }

    #[test]
    fn unit_clean_title_truncates_long_titles_with_ellipsis() {
        let long = "x".repeat(60);
        let cleaned = clean_title(&long);
        assert_eq!(cleaned.chars().count(), 50);
        assert!(cleaned.ends_with("..."));

        assert_eq!(clean_title("short title"), "short title");
    }
}
